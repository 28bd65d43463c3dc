/// Query string parsing and serialization
///
/// Queries are kept in a [`BTreeMap`] so that serialization order (and therefore
/// `full_path`) is deterministic.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// A single query value
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum QueryValue {
    /// Key present without a value (`?flag`)
    Null,
    Single(String),
    /// Key repeated (`?a=1&a=2`)
    List(Vec<String>),
}

impl QueryValue {
    /// The first value, if any
    pub fn as_str(&self) -> Option<&str> {
        match self {
            QueryValue::Null => None,
            QueryValue::Single(value) => Some(value),
            QueryValue::List(values) => values.first().map(String::as_str),
        }
    }

    fn push(&mut self, value: Option<String>) {
        let value = match value {
            Some(v) => v,
            None => return,
        };
        *self = match std::mem::replace(self, QueryValue::Null) {
            QueryValue::Null => QueryValue::Single(value),
            QueryValue::Single(first) => QueryValue::List(vec![first, value]),
            QueryValue::List(mut values) => {
                values.push(value);
                QueryValue::List(values)
            }
        };
    }
}

impl From<&str> for QueryValue {
    fn from(value: &str) -> Self {
        QueryValue::Single(value.to_string())
    }
}

impl From<String> for QueryValue {
    fn from(value: String) -> Self {
        QueryValue::Single(value)
    }
}

impl From<Vec<String>> for QueryValue {
    fn from(values: Vec<String>) -> Self {
        QueryValue::List(values)
    }
}

impl fmt::Display for QueryValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QueryValue::Null => Ok(()),
            QueryValue::Single(value) => f.write_str(value),
            QueryValue::List(values) => f.write_str(&values.join(",")),
        }
    }
}

/// Parsed query dictionary
pub type Query = BTreeMap<String, QueryValue>;

/// Custom query parser, replacing [`parse_query`]
pub type QueryParser = Arc<dyn Fn(&str) -> Query + Send + Sync>;

/// Custom query serializer, replacing [`stringify_query`]
pub type QueryStringifier = Arc<dyn Fn(&Query) -> String + Send + Sync>;

/// Parses a query string (with or without the leading `?`)
///
/// # Examples
///
/// ```
/// use rhtmx_navigator::query::{parse_query, QueryValue};
///
/// let query = parse_query("?page=2&tag=a&tag=b&flag");
/// assert_eq!(query["page"], QueryValue::Single("2".into()));
/// assert_eq!(query["tag"], QueryValue::List(vec!["a".into(), "b".into()]));
/// assert_eq!(query["flag"], QueryValue::Null);
/// ```
pub fn parse_query(raw: &str) -> Query {
    let mut query = Query::new();
    let trimmed = raw.trim().trim_start_matches(['?', '#', '&']);

    for pair in trimmed.split('&').filter(|pair| !pair.is_empty()) {
        let (key, value) = match pair.split_once('=') {
            Some((key, value)) => (decode(key), Some(decode(value))),
            None => (decode(pair), None),
        };

        match query.get_mut(&key) {
            Some(existing) => existing.push(value),
            None => {
                let value = value.map_or(QueryValue::Null, QueryValue::Single);
                query.insert(key, value);
            }
        }
    }

    query
}

/// Serializes a query, producing `""` or `"?k=v&..."`
///
/// # Examples
///
/// ```
/// use rhtmx_navigator::query::{stringify_query, Query, QueryValue};
///
/// let mut query = Query::new();
/// query.insert("q".into(), QueryValue::from("a b"));
/// query.insert("ids".into(), QueryValue::from("1,2"));
/// assert_eq!(stringify_query(&query), "?ids=1,2&q=a%20b");
/// assert_eq!(stringify_query(&Query::new()), "");
/// ```
pub fn stringify_query(query: &Query) -> String {
    let pairs: Vec<String> = query
        .iter()
        .filter_map(|(key, value)| match value {
            QueryValue::Null => Some(encode(key)),
            QueryValue::Single(v) => Some(format!("{}={}", encode(key), encode(v))),
            QueryValue::List(values) if values.is_empty() => None,
            QueryValue::List(values) => Some(
                values
                    .iter()
                    .map(|v| format!("{}={}", encode(key), encode(v)))
                    .collect::<Vec<_>>()
                    .join("&"),
            ),
        })
        .collect();

    if pairs.is_empty() {
        String::new()
    } else {
        format!("?{}", pairs.join("&"))
    }
}

/// Parses `raw` and overlays `extra`; keys from `extra` win
pub fn resolve_query(raw: &str, extra: Option<&Query>, parser: Option<&QueryParser>) -> Query {
    let mut query = match parser {
        Some(parse) => parse(raw),
        None => parse_query(raw),
    };

    if let Some(extra) = extra {
        for (key, value) in extra {
            query.insert(key.clone(), value.clone());
        }
    }

    query
}

fn encode(value: &str) -> String {
    urlencoding::encode(value).replace("%2C", ",")
}

fn decode(value: &str) -> String {
    let spaced = value.replace('+', " ");
    match urlencoding::decode(&spaced) {
        Ok(decoded) => decoded.into_owned(),
        Err(_) => {
            tracing::warn!(value, "Error decoding query component, keeping raw value");
            value.to_string()
        }
    }
}
