/// Path pattern compiler
///
/// Compiles a route template into a regular expression plus the ordered list of
/// parameter keys it captures, and fills templates back into concrete paths.
///
/// ```text
/// "/users/:id(\\d+)"
///     → parser.rs (tokenize)
///     → [Static("/users"), Param { name: "id", pattern: "\\d+" }]
///     → ^/users/((?:\d+))(?:/)?$   + keys ["id"]
/// ```

use std::collections::HashMap;
use std::fmt::Write as _;

use regex::{Regex, RegexBuilder};
use thiserror::Error;

pub mod parser;

pub use parser::{tokenize, ParamToken, Token, UNNAMED_PARAM};

/// Route parameters, keyed by parameter name
pub type Params = HashMap<String, String>;

/// Errors produced while compiling or filling a template
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PatternError {
    /// The template produced a regex the engine rejects
    #[error("invalid route pattern {template:?}: {reason}")]
    Invalid { template: String, reason: String },

    /// A required parameter was not supplied while filling
    #[error("missing param for {template:?}: expected \"{param}\" to be defined")]
    MissingParam { template: String, param: String },

    /// A supplied value does not satisfy the parameter pattern
    #[error("expected \"{param}\" to match \"{pattern}\", but received \"{value}\"")]
    InvalidParam {
        param: String,
        pattern: String,
        value: String,
    },
}

/// Compiler switches, mirroring route config options
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PatternOptions {
    /// Match case-sensitively
    pub sensitive: bool,
    /// Do not accept an optional trailing slash
    pub strict: bool,
}

/// Metadata of one captured parameter
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatternKey {
    pub name: String,
    pub optional: bool,
    pub repeat: bool,
}

/// A compiled template: matcher regex, capture keys and fill metadata
#[derive(Debug, Clone)]
pub struct CompiledPattern {
    source: String,
    regex: Regex,
    tokens: Vec<Token>,
    keys: Vec<PatternKey>,
    /// Per-token value validators used by [`CompiledPattern::fill`]
    validators: Vec<Option<Regex>>,
}

impl CompiledPattern {
    /// Compiles `template` with the given options
    ///
    /// # Examples
    ///
    /// ```
    /// use rhtmx_navigator::pattern::{CompiledPattern, PatternOptions};
    ///
    /// let pattern = CompiledPattern::compile("/users/:id", PatternOptions::default()).unwrap();
    /// let params = pattern.captures("/users/42/").unwrap();
    /// assert_eq!(params.get("id"), Some(&"42".to_string()));
    /// assert!(pattern.captures("/users").is_none());
    /// ```
    pub fn compile(template: &str, options: PatternOptions) -> Result<Self, PatternError> {
        let tokens = tokenize(template);
        let invalid = |err: regex::Error| PatternError::Invalid {
            template: template.to_string(),
            reason: err.to_string(),
        };

        let mut route = String::new();
        let mut keys = Vec::new();
        let mut validators = Vec::with_capacity(tokens.len());

        for token in &tokens {
            match token {
                Token::Static(text) => {
                    route.push_str(&regex::escape(text));
                    validators.push(None);
                }
                Token::Param(param) => {
                    route.push_str(&param_source(param));
                    keys.push(PatternKey {
                        name: param.name.clone(),
                        optional: param.optional,
                        repeat: param.repeat,
                    });
                    let validator = RegexBuilder::new(&format!("^(?:{})$", param.pattern))
                        .case_insensitive(!options.sensitive)
                        .build()
                        .map_err(invalid)?;
                    validators.push(Some(validator));
                }
            }
        }

        if !options.strict {
            let trimmed = route.strip_suffix('/').unwrap_or(&route);
            route = format!("{}(?:/)?", trimmed);
        }

        let regex = RegexBuilder::new(&format!("^{}$", route))
            .case_insensitive(!options.sensitive)
            .build()
            .map_err(invalid)?;

        Ok(Self {
            source: template.to_string(),
            regex,
            tokens,
            keys,
            validators,
        })
    }

    /// The template this pattern was compiled from
    pub fn source(&self) -> &str {
        &self.source
    }

    /// The compiled matcher
    pub fn regex(&self) -> &Regex {
        &self.regex
    }

    /// Captured parameter keys in template order
    pub fn keys(&self) -> &[PatternKey] {
        &self.keys
    }

    /// Parameter names that appear more than once in the template
    pub fn duplicate_keys(&self) -> Vec<&str> {
        let mut seen = HashMap::new();
        self.keys
            .iter()
            .filter_map(|key| {
                let count = seen.entry(key.name.as_str()).or_insert(0usize);
                *count += 1;
                (*count == 2).then_some(key.name.as_str())
            })
            .collect()
    }

    /// Checks whether `path` matches this pattern
    pub fn is_match(&self, path: &str) -> bool {
        self.regex.is_match(path)
    }

    /// Matches `path` and returns the decoded parameters
    ///
    /// Optional parameters that did not participate in the match are absent.
    pub fn captures(&self, path: &str) -> Option<Params> {
        let caps = self.regex.captures(path)?;

        Some(
            self.keys
                .iter()
                .enumerate()
                .filter_map(|(i, key)| {
                    caps.get(i + 1)
                        .map(|value| (key.name.clone(), decode_param(value.as_str())))
                })
                .collect(),
        )
    }

    /// Fills the template with `params`, producing a concrete path
    ///
    /// Values are percent-encoded (keeping readable characters such as `@` or `:`)
    /// and validated against their parameter pattern.
    ///
    /// # Examples
    ///
    /// ```
    /// use rhtmx_navigator::pattern::{CompiledPattern, PatternOptions, Params};
    ///
    /// let pattern = CompiledPattern::compile("/item/:id/:tab?", PatternOptions::default()).unwrap();
    /// let mut params = Params::new();
    /// params.insert("id".to_string(), "2".to_string());
    /// assert_eq!(pattern.fill(&params).unwrap(), "/item/2");
    /// ```
    pub fn fill(&self, params: &Params) -> Result<String, PatternError> {
        let mut path = String::new();

        for (token, validator) in self.tokens.iter().zip(&self.validators) {
            let param = match token {
                Token::Static(text) => {
                    path.push_str(text);
                    continue;
                }
                Token::Param(param) => param,
            };

            let Some(value) = params.get(&param.name) else {
                if param.optional {
                    if param.partial {
                        path.push_str(&param.prefix);
                    }
                    continue;
                }
                return Err(PatternError::MissingParam {
                    template: self.source.clone(),
                    param: param.name.clone(),
                });
            };

            let segment = encode_segment(value, param.asterisk);
            if let Some(validator) = validator {
                if !validator.is_match(&segment) {
                    return Err(PatternError::InvalidParam {
                        param: param.name.clone(),
                        pattern: param.pattern.clone(),
                        value: segment,
                    });
                }
            }

            path.push_str(&param.prefix);
            path.push_str(&segment);
        }

        Ok(path)
    }
}

/// Regex source for one parameter token
fn param_source(param: &ParamToken) -> String {
    let prefix = regex::escape(&param.prefix);
    let mut capture = format!("(?:{})", param.pattern);

    if param.repeat {
        capture = format!("{capture}(?:{prefix}{capture})*");
    }

    match (param.optional, param.partial) {
        (true, false) => format!("(?:{prefix}({capture}))?"),
        (true, true) => format!("{prefix}({capture})?"),
        (false, _) => format!("{prefix}({capture})"),
    }
}

/// Percent-decodes a captured value, keeping the raw text when it is malformed
fn decode_param(raw: &str) -> String {
    match urlencoding::decode(raw) {
        Ok(decoded) => decoded.into_owned(),
        Err(_) => {
            tracing::warn!(param = raw, "Error decoding route param, keeping raw value");
            raw.to_string()
        }
    }
}

/// Percent-encodes a parameter value for a path segment
///
/// Keeps the characters `encodeURI` leaves readable, but always escapes `?`
/// and `#`. `/` is escaped unless the value fills a `*` wildcard.
fn encode_segment(value: &str, keep_slash: bool) -> String {
    const READABLE: &[u8] = b"-_.!~*'();:@&=+$,";

    value.bytes().fold(String::with_capacity(value.len()), |mut out, byte| {
        if byte.is_ascii_alphanumeric() || READABLE.contains(&byte) || (keep_slash && byte == b'/') {
            out.push(byte as char);
        } else {
            let _ = write!(out, "%{:02X}", byte);
        }
        out
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn compile(template: &str) -> CompiledPattern {
        CompiledPattern::compile(template, PatternOptions::default()).unwrap()
    }

    fn params(pairs: &[(&str, &str)]) -> Params {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_static_pattern_trailing_slash() {
        let pattern = compile("/about");
        assert!(pattern.is_match("/about"));
        assert!(pattern.is_match("/about/"));
        assert!(!pattern.is_match("/about/team"));
    }

    #[test]
    fn test_strict_pattern_rejects_trailing_slash() {
        let pattern = CompiledPattern::compile(
            "/about",
            PatternOptions { strict: true, sensitive: false },
        )
        .unwrap();
        assert!(pattern.is_match("/about"));
        assert!(!pattern.is_match("/about/"));
    }

    #[test]
    fn test_case_sensitivity() {
        assert!(compile("/About").is_match("/about"));

        let sensitive = CompiledPattern::compile(
            "/About",
            PatternOptions { sensitive: true, strict: false },
        )
        .unwrap();
        assert!(!sensitive.is_match("/about"));
    }

    #[test]
    fn test_empty_template_matches_root() {
        let pattern = compile("");
        assert!(pattern.is_match("/"));
        assert!(pattern.is_match(""));
        assert!(!pattern.is_match("/a"));
    }

    #[test]
    fn test_custom_param_pattern() {
        let pattern = compile("/foo/:id(\\d+)");
        assert_eq!(pattern.captures("/foo/123"), Some(params(&[("id", "123")])));
        assert!(pattern.captures("/foo/abc").is_none());
    }

    #[test]
    fn test_optional_param_absent() {
        let pattern = compile("/posts/:id?");
        assert_eq!(pattern.captures("/posts"), Some(Params::new()));
        assert_eq!(pattern.captures("/posts/7"), Some(params(&[("id", "7")])));
    }

    #[test]
    fn test_wildcard_captures_rest() {
        let pattern = compile("*");
        assert_eq!(
            pattern.captures("/any/where"),
            Some(params(&[(UNNAMED_PARAM, "/any/where")]))
        );

        let pattern = compile("/docs/*");
        assert_eq!(
            pattern.captures("/docs/guide/intro"),
            Some(params(&[(UNNAMED_PARAM, "guide/intro")]))
        );
    }

    #[test]
    fn test_repeat_param() {
        let pattern = compile("/files/:path+");
        assert_eq!(
            pattern.captures("/files/a/b/c"),
            Some(params(&[("path", "a/b/c")]))
        );
        assert!(pattern.captures("/files").is_none());
    }

    #[test]
    fn test_captures_are_decoded() {
        let pattern = compile("/search/:term");
        assert_eq!(
            pattern.captures("/search/caf%C3%A9"),
            Some(params(&[("term", "café")]))
        );
    }

    #[test]
    fn test_duplicate_keys() {
        let pattern = compile("/:id/:other/:id");
        assert_eq!(pattern.duplicate_keys(), vec!["id"]);
        assert!(compile("/:a/:b").duplicate_keys().is_empty());
    }

    #[test]
    fn test_fill_encodes_values() {
        let pattern = compile("/search/:term");
        assert_eq!(
            pattern.fill(&params(&[("term", "a b/c")])).unwrap(),
            "/search/a%20b%2Fc"
        );
        assert_eq!(
            pattern.fill(&params(&[("term", "user@host")])).unwrap(),
            "/search/user@host"
        );
    }

    #[test]
    fn test_fill_wildcard_keeps_slashes() {
        let pattern = compile("/docs/*");
        assert_eq!(
            pattern.fill(&params(&[(UNNAMED_PARAM, "guide/intro")])).unwrap(),
            "/docs/guide/intro"
        );
    }

    #[test]
    fn test_fill_missing_required_param() {
        let err = compile("/users/:id").fill(&Params::new()).unwrap_err();
        assert!(matches!(err, PatternError::MissingParam { ref param, .. } if param == "id"));
    }

    #[test]
    fn test_fill_validates_pattern() {
        let err = compile("/foo/:id(\\d+)")
            .fill(&params(&[("id", "abc")]))
            .unwrap_err();
        assert!(matches!(err, PatternError::InvalidParam { .. }));
    }
}
