/// Tokenizer for path templates
///
/// Pure functional parsing of templates such as `/users/:id(\\d+)/*` into typed tokens.
/// All functions are **pure**: same input → same output, no side effects.
///
/// # Supported syntax
///
/// - `:name` required parameter (one segment)
/// - `:name?` optional, `:name+` one or more, `:name*` zero or more
/// - `:name(\\d+)` parameter with a custom pattern
/// - `(\\d+)` unnamed group, `*` unnamed wildcard
/// - `\\:` escapes a special character

use once_cell::sync::Lazy;
use regex::Regex;

static TOKEN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(\\.)|([/.])?(?:(?::(\w+)(?:\(((?:\\.|[^\\()])+)\))?|\(((?:\\.|[^\\()])+)\))([+*?])?|(\*))",
    )
    .expect("static token pattern is valid")
});

/// Parameter name given to the first unnamed capture (`*` or a bare group)
pub const UNNAMED_PARAM: &str = "pathMatch";

/// One piece of a parsed template
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    /// Literal text, matched verbatim
    Static(String),
    /// A capturing parameter
    Param(ParamToken),
}

/// A capturing template parameter
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParamToken {
    /// Parameter name (`pathMatch`, `1`, `2`, ... for unnamed captures)
    pub name: String,
    /// Separator written before the value (`/`, `.` or empty)
    pub prefix: String,
    /// Segment delimiter the default pattern stops at
    pub delimiter: char,
    pub optional: bool,
    pub repeat: bool,
    /// The parameter is followed by literal text inside the same segment
    pub partial: bool,
    /// Produced by a bare `*`
    pub asterisk: bool,
    /// Regex source for a single value
    pub pattern: String,
}

/// Splits a template into static text and parameter tokens
///
/// # Examples
///
/// ```
/// use rhtmx_navigator::pattern::parser::{tokenize, Token};
///
/// let tokens = tokenize("/users/:id");
/// assert_eq!(tokens.len(), 2);
/// assert_eq!(tokens[0], Token::Static("/users".to_string()));
/// assert!(matches!(&tokens[1], Token::Param(p) if p.name == "id" && p.prefix == "/"));
/// ```
pub fn tokenize(template: &str) -> Vec<Token> {
    let mut tokens = Vec::new();
    let mut literal = String::new();
    let mut unnamed = 0usize;
    let mut index = 0usize;

    for caps in TOKEN.captures_iter(template) {
        let Some(whole) = caps.get(0) else { continue };

        literal.push_str(&template[index..whole.start()]);
        index = whole.end();

        // escaped character, e.g. `\\:`
        if let Some(escaped) = caps.get(1) {
            literal.push_str(&escaped.as_str()[1..]);
            continue;
        }

        let next = template[index..].chars().next();
        let prefix = caps.get(2).map(|m| m.as_str());
        let modifier = caps.get(6).map(|m| m.as_str());
        let asterisk = caps.get(7).is_some();

        if !literal.is_empty() {
            tokens.push(Token::Static(std::mem::take(&mut literal)));
        }

        let delimiter = prefix.and_then(|p| p.chars().next()).unwrap_or('/');
        let partial = matches!((prefix, next), (Some(p), Some(n)) if !p.starts_with(n));

        let pattern = caps
            .get(4)
            .or_else(|| caps.get(5))
            .map(|group| escape_group(group.as_str()))
            .unwrap_or_else(|| {
                if asterisk {
                    ".*".to_string()
                } else {
                    format!("[^{}]+?", regex::escape(&delimiter.to_string()))
                }
            });

        let name = match caps.get(3) {
            Some(name) => name.as_str().to_string(),
            None => {
                let key = unnamed;
                unnamed += 1;
                if key == 0 {
                    UNNAMED_PARAM.to_string()
                } else {
                    key.to_string()
                }
            }
        };

        tokens.push(Token::Param(ParamToken {
            name,
            prefix: prefix.unwrap_or_default().to_string(),
            delimiter,
            optional: matches!(modifier, Some("?") | Some("*")),
            repeat: matches!(modifier, Some("+") | Some("*")),
            partial,
            asterisk,
            pattern,
        }));
    }

    if index < template.len() {
        literal.push_str(&template[index..]);
    }
    if !literal.is_empty() {
        tokens.push(Token::Static(literal));
    }

    tokens
}

/// Escapes grouping characters inside a custom parameter pattern
///
/// Nested groups would shift capture indices, so `(` and `)` become literals.
fn escape_group(group: &str) -> String {
    group.chars().fold(String::with_capacity(group.len()), |mut out, c| {
        if matches!(c, '(' | ')' | '$') {
            out.push('\\');
        }
        out.push(c);
        out
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn param(token: &Token) -> &ParamToken {
        match token {
            Token::Param(p) => p,
            Token::Static(s) => panic!("expected param, found static {s:?}"),
        }
    }

    #[test]
    fn test_tokenize_static_only() {
        assert_eq!(tokenize("/about/team"), vec![Token::Static("/about/team".to_string())]);
    }

    #[test]
    fn test_tokenize_modifiers() {
        let tokens = tokenize("/a/:opt?/:many+/:any*");
        let opt = param(&tokens[1]);
        assert!(opt.optional && !opt.repeat);
        let many = param(&tokens[2]);
        assert!(!many.optional && many.repeat);
        let any = param(&tokens[3]);
        assert!(any.optional && any.repeat);
    }

    #[test]
    fn test_tokenize_custom_pattern() {
        let tokens = tokenize("/foo/:id(\\d+)");
        let id = param(&tokens[1]);
        assert_eq!(id.name, "id");
        assert_eq!(id.pattern, "\\d+");
    }

    #[test]
    fn test_tokenize_unnamed_captures() {
        let tokens = tokenize("/files/*");
        let wildcard = param(&tokens[1]);
        assert_eq!(wildcard.name, UNNAMED_PARAM);
        assert!(wildcard.asterisk);
        assert_eq!(wildcard.pattern, ".*");

        let tokens = tokenize("/(a|b)/(\\d+)");
        assert_eq!(param(&tokens[0]).name, UNNAMED_PARAM);
        assert_eq!(param(&tokens[1]).name, "1");
    }

    #[test]
    fn test_tokenize_partial_segment() {
        let tokens = tokenize("/:file.:ext");
        let file = param(&tokens[0]);
        assert!(file.partial);
        let ext = param(&tokens[1]);
        assert_eq!(ext.prefix, ".");
        assert!(!ext.partial);
    }

    #[test]
    fn test_tokenize_escaped_colon() {
        assert_eq!(
            tokenize("/time\\:now"),
            vec![Token::Static("/time:now".to_string())]
        );
    }
}
