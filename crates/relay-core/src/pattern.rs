//! Route template compilation and matching.
//!
//! A template is a literal string optionally containing `<name>` parameter
//! markers, e.g. `/chat/<uid>/`. [`Pattern::compile`] turns a template into a
//! matcher; [`Pattern::matches`] runs it against a concrete path or message
//! and extracts the named parameters.
//!
//! # Matching rules
//!
//! - A template with no markers matches by exact string equality.
//! - Each `<name>` marker matches one or more characters excluding the path
//!   separator (`/`), so an empty segment never satisfies a parameter.
//! - Matching is anchored at both ends and case-sensitive.
//!
//! # Compile-time rejections
//!
//! Ambiguity is rejected when the template is compiled, not papered over at
//! match time: adjacent markers with no separating literal, duplicate
//! parameter names, and names that are not plain identifiers all fail with a
//! [`PatternError`].

use regex::Regex;

use crate::error::PatternError;

/// Parameters extracted from a matched input.
///
/// Pairs are stored in template order, so iteration yields parameters in the
/// order their markers appear. An empty set means the route was static.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PathParams {
    pairs: Vec<(String, String)>,
}

impl PathParams {
    /// Creates an empty parameter set.
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn push(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.pairs.push((name.into(), value.into()));
    }

    /// Looks up a parameter value by name.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    /// Number of extracted parameters.
    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    /// Returns `true` if no parameters were extracted.
    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// Iterates `(name, value)` pairs in template order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.pairs.iter().map(|(n, v)| (n.as_str(), v.as_str()))
    }

    /// Iterates values in template order.
    pub fn values(&self) -> impl Iterator<Item = &str> {
        self.pairs.iter().map(|(_, v)| v.as_str())
    }
}

impl FromIterator<(String, String)> for PathParams {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Self {
            pairs: iter.into_iter().collect(),
        }
    }
}

/// One piece of a tokenized template.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Token {
    Literal(String),
    Param(String),
}

/// How a compiled pattern matches its input.
#[derive(Debug, Clone)]
enum Matcher {
    /// Exact string equality against the normalized template.
    Exact,
    /// Anchored regex with one capture group per parameter marker.
    Captures { regex: Regex, names: Vec<String> },
}

/// A compiled route template.
#[derive(Debug, Clone)]
pub struct Pattern {
    template: String,
    matcher: Matcher,
}

impl Pattern {
    /// Compiles a template into a matcher.
    ///
    /// The template is taken verbatim; any normalization (trailing separator,
    /// trimming) is the caller's concern and must be applied consistently to
    /// the inputs handed to [`matches`](Self::matches).
    pub fn compile(template: &str) -> Result<Self, PatternError> {
        let tokens = tokenize(template)?;

        let has_params = tokens.iter().any(|t| matches!(t, Token::Param(_)));
        if !has_params {
            return Ok(Self {
                template: template.to_string(),
                matcher: Matcher::Exact,
            });
        }

        let mut source = String::from("^");
        let mut names = Vec::new();
        for token in &tokens {
            match token {
                Token::Literal(lit) => source.push_str(&regex::escape(lit)),
                Token::Param(name) => {
                    source.push_str("([^/]+)");
                    names.push(name.clone());
                }
            }
        }
        source.push('$');

        let regex = Regex::new(&source).map_err(|e| PatternError::Compile {
            template: template.to_string(),
            reason: e.to_string(),
        })?;

        Ok(Self {
            template: template.to_string(),
            matcher: Matcher::Captures { regex, names },
        })
    }

    /// The template this pattern was compiled from.
    pub fn template(&self) -> &str {
        &self.template
    }

    /// Returns `true` if the template contains no parameter markers.
    pub fn is_static(&self) -> bool {
        matches!(self.matcher, Matcher::Exact)
    }

    /// Parameter names in the order their markers appear.
    pub fn param_names(&self) -> &[String] {
        match &self.matcher {
            Matcher::Exact => &[],
            Matcher::Captures { names, .. } => names,
        }
    }

    /// Runs the pattern against an input.
    ///
    /// Returns the extracted parameters on a full match, `None` otherwise.
    /// Static patterns yield an empty parameter set.
    pub fn matches(&self, input: &str) -> Option<PathParams> {
        match &self.matcher {
            Matcher::Exact => (self.template == input).then(PathParams::new),
            Matcher::Captures { regex, names } => {
                let caps = regex.captures(input)?;
                let mut params = PathParams::new();
                for (i, name) in names.iter().enumerate() {
                    // Group 0 is the whole match; parameter groups start at 1.
                    params.push(name.clone(), caps.get(i + 1)?.as_str());
                }
                Some(params)
            }
        }
    }
}

/// Splits a template into literal and parameter tokens, validating marker
/// syntax, parameter names, uniqueness, and marker adjacency.
fn tokenize(template: &str) -> Result<Vec<Token>, PatternError> {
    let mut tokens = Vec::new();
    let mut seen = Vec::new();
    let mut rest = template;

    while let Some(open) = rest.find('<') {
        let (literal, tail) = rest.split_at(open);
        let Some(close) = tail.find('>') else {
            return Err(PatternError::UnclosedMarker {
                template: template.to_string(),
            });
        };
        let name = &tail[1..close];

        if !is_valid_param_name(name) {
            return Err(PatternError::InvalidParamName {
                template: template.to_string(),
                name: name.to_string(),
            });
        }
        if seen.contains(&name) {
            return Err(PatternError::DuplicateParam {
                template: template.to_string(),
                name: name.to_string(),
            });
        }
        if literal.is_empty() && matches!(tokens.last(), Some(Token::Param(_))) {
            return Err(PatternError::AdjacentParams {
                template: template.to_string(),
            });
        }

        if !literal.is_empty() {
            tokens.push(Token::Literal(literal.to_string()));
        }
        tokens.push(Token::Param(name.to_string()));
        seen.push(name);
        rest = &tail[close + 1..];
    }

    if !rest.is_empty() {
        tokens.push(Token::Literal(rest.to_string()));
    }

    Ok(tokens)
}

/// Parameter names must be plain identifiers: `[A-Za-z_][A-Za-z0-9_]*`.
fn is_valid_param_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn static_template_matches_itself() {
        let pattern = Pattern::compile("/chat/dingtalk/").unwrap();
        assert!(pattern.is_static());

        let params = pattern.matches("/chat/dingtalk/").unwrap();
        assert!(params.is_empty());
    }

    #[test]
    fn static_template_rejects_other_inputs() {
        let pattern = Pattern::compile("/chat/dingtalk/").unwrap();
        assert!(pattern.matches("/chat/dingtalk").is_none());
        assert!(pattern.matches("/chat/Dingtalk/").is_none()); // case-sensitive
        assert!(pattern.matches("/chat/dingtalk/extra/").is_none());
    }

    #[test]
    fn single_param_is_extracted() {
        let pattern = Pattern::compile("/users/<id>/").unwrap();
        assert!(!pattern.is_static());

        let params = pattern.matches("/users/42/").unwrap();
        assert_eq!(params.get("id"), Some("42"));
        assert_eq!(params.len(), 1);
    }

    #[test]
    fn param_must_not_be_empty() {
        let pattern = Pattern::compile("/users/<id>/").unwrap();
        assert!(pattern.matches("/users//").is_none());
        assert!(pattern.matches("/users/").is_none());
    }

    #[test]
    fn param_excludes_separator() {
        let pattern = Pattern::compile("/users/<id>/").unwrap();
        assert!(pattern.matches("/users/1/2/").is_none());
    }

    #[test]
    fn params_preserve_template_order() {
        let pattern = Pattern::compile("/chat/<group>/<uid>/").unwrap();
        let params = pattern.matches("/chat/ops/alice/").unwrap();

        let pairs: Vec<_> = params.iter().collect();
        assert_eq!(pairs, vec![("group", "ops"), ("uid", "alice")]);
    }

    #[test]
    fn literal_between_params_backtracks_like_a_regex() {
        let pattern = Pattern::compile("/tag/<a>-<b>/").unwrap();
        let params = pattern.matches("/tag/x-y-z/").unwrap();
        // Greedy first group, same as the regex-based matcher it replaces.
        assert_eq!(params.get("a"), Some("x-y"));
        assert_eq!(params.get("b"), Some("z"));
    }

    #[test]
    fn message_style_template() {
        let pattern = Pattern::compile("/weather <city>").unwrap();
        let params = pattern.matches("/weather tokyo").unwrap();
        assert_eq!(params.get("city"), Some("tokyo"));
    }

    #[test]
    fn literal_regex_metacharacters_are_escaped() {
        let pattern = Pattern::compile("/v1.0/<id>/").unwrap();
        assert!(pattern.matches("/v1x0/7/").is_none());
        assert_eq!(pattern.matches("/v1.0/7/").unwrap().get("id"), Some("7"));
    }

    #[test]
    fn adjacent_params_are_rejected() {
        let err = Pattern::compile("/a/<x><y>/").unwrap_err();
        assert!(matches!(err, PatternError::AdjacentParams { .. }));
    }

    #[test]
    fn duplicate_param_names_are_rejected() {
        let err = Pattern::compile("/a/<x>/<x>/").unwrap_err();
        assert!(matches!(err, PatternError::DuplicateParam { .. }));
    }

    #[test]
    fn invalid_param_names_are_rejected() {
        assert!(matches!(
            Pattern::compile("/a/<>/").unwrap_err(),
            PatternError::InvalidParamName { .. }
        ));
        assert!(matches!(
            Pattern::compile("/a/<1x>/").unwrap_err(),
            PatternError::InvalidParamName { .. }
        ));
        assert!(matches!(
            Pattern::compile("/a/<x-y>/").unwrap_err(),
            PatternError::InvalidParamName { .. }
        ));
    }

    #[test]
    fn unclosed_marker_is_rejected() {
        let err = Pattern::compile("/a/<x/").unwrap_err();
        assert!(matches!(err, PatternError::UnclosedMarker { .. }));
    }

    #[test]
    fn param_names_accessor() {
        let pattern = Pattern::compile("/a/<x>/<y>/").unwrap();
        assert_eq!(pattern.param_names(), ["x", "y"]);
    }
}
