//! Query-string construction.
//!
//! # Design
//! `QueryParams` is an insertion-ordered list of `key -> Option<QueryValue>`.
//! `build_url` renders it after a path:
//! - `None` values are dropped entirely, never rendered as `key=`.
//! - list values expand to one `key[]=item` pair per item, in order.
//! - everything else renders once as `key=value`.
//!
//! Keys and values are percent-encoded; the `[]` list marker is not. When
//! nothing survives, the path comes back unchanged with no trailing `?`.

use std::borrow::Cow;
use std::fmt;

/// An element of a list-valued query parameter.
#[derive(Debug, Clone, PartialEq)]
pub enum QueryScalar {
    Str(String),
    Int(i64),
    Float(f64),
}

/// A single query parameter value.
#[derive(Debug, Clone, PartialEq)]
pub enum QueryValue {
    Str(String),
    Int(i64),
    Float(f64),
    Bool(bool),
    List(Vec<QueryScalar>),
}

/// Textual form of a float, matching what a browser prints for numbers.
fn float_text(value: f64) -> Cow<'static, str> {
    if value.is_infinite() {
        if value > 0.0 {
            Cow::Borrowed("Infinity")
        } else {
            Cow::Borrowed("-Infinity")
        }
    } else {
        Cow::Owned(value.to_string())
    }
}

impl fmt::Display for QueryScalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QueryScalar::Str(s) => f.write_str(s),
            QueryScalar::Int(n) => write!(f, "{n}"),
            QueryScalar::Float(n) => f.write_str(&float_text(*n)),
        }
    }
}

macro_rules! impl_from_int {
    ($($t:ty),*) => {$(
        impl From<$t> for QueryScalar {
            fn from(n: $t) -> Self {
                QueryScalar::Int(n as i64)
            }
        }
        impl From<$t> for QueryValue {
            fn from(n: $t) -> Self {
                QueryValue::Int(n as i64)
            }
        }
    )*};
}

impl_from_int!(i32, i64, u32, u16, u8);

impl From<f64> for QueryScalar {
    fn from(n: f64) -> Self {
        QueryScalar::Float(n)
    }
}

impl From<&str> for QueryScalar {
    fn from(s: &str) -> Self {
        QueryScalar::Str(s.to_string())
    }
}

impl From<String> for QueryScalar {
    fn from(s: String) -> Self {
        QueryScalar::Str(s)
    }
}

impl From<f64> for QueryValue {
    fn from(n: f64) -> Self {
        QueryValue::Float(n)
    }
}

impl From<bool> for QueryValue {
    fn from(b: bool) -> Self {
        QueryValue::Bool(b)
    }
}

impl From<&str> for QueryValue {
    fn from(s: &str) -> Self {
        QueryValue::Str(s.to_string())
    }
}

impl From<String> for QueryValue {
    fn from(s: String) -> Self {
        QueryValue::Str(s)
    }
}

impl<T: Into<QueryScalar>> From<Vec<T>> for QueryValue {
    fn from(items: Vec<T>) -> Self {
        QueryValue::List(items.into_iter().map(Into::into).collect())
    }
}

/// Insertion-ordered query parameters.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryParams {
    entries: Vec<(String, Option<QueryValue>)>,
}

impl QueryParams {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a present value.
    pub fn push(mut self, key: impl Into<String>, value: impl Into<QueryValue>) -> Self {
        self.entries.push((key.into(), Some(value.into())));
        self
    }

    /// Append a value that may be absent. Absent values never reach the URL.
    pub fn push_opt<V: Into<QueryValue>>(mut self, key: impl Into<String>, value: Option<V>) -> Self {
        self.entries.push((key.into(), value.map(Into::into)));
        self
    }

    pub fn entries(&self) -> &[(String, Option<QueryValue>)] {
        &self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K: Into<String>> FromIterator<(K, Option<QueryValue>)> for QueryParams {
    fn from_iter<I: IntoIterator<Item = (K, Option<QueryValue>)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }
}

/// Render the encoded query string (without the leading `?`).
pub fn encode_query(params: &QueryParams) -> String {
    let mut pairs: Vec<String> = Vec::new();

    for (key, value) in &params.entries {
        let Some(value) = value else { continue };
        let key = urlencoding::encode(key);
        match value {
            QueryValue::List(items) => {
                for item in items {
                    pairs.push(format!("{key}[]={}", urlencoding::encode(&item.to_string())));
                }
            }
            QueryValue::Str(s) => pairs.push(format!("{key}={}", urlencoding::encode(s))),
            QueryValue::Int(n) => pairs.push(format!("{key}={n}")),
            QueryValue::Float(n) => {
                pairs.push(format!("{key}={}", urlencoding::encode(&float_text(*n))))
            }
            QueryValue::Bool(b) => pairs.push(format!("{key}={b}")),
        }
    }

    pairs.join("&")
}

/// Append `params` to `path`. Returns `path` unchanged when no parameter
/// survives.
pub fn build_url(path: &str, params: &QueryParams) -> String {
    let query = encode_query(params);
    if query.is_empty() {
        path.to_string()
    } else {
        format!("{path}?{query}")
    }
}
