//! Attribute values as they appear in Splunk feeds.

use std::collections::BTreeMap;
use std::fmt;

use crate::error::{Result, SplunkError};

/// Attribute map keyed by field name.
pub type Attributes = BTreeMap<String, Value>;

/// A single attribute value.
///
/// Feed entries encode every attribute as text, so typed reads go through
/// the coercion helpers below rather than through distinct variants.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    /// Plain text, including numbers and booleans as the server sends them.
    Scalar(String),
    /// An `<s:list>` of items.
    List(Vec<String>),
    /// A nested `<s:dict>`.
    Map(BTreeMap<String, Value>),
}

impl Value {
    /// Borrow the text of a scalar.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Scalar(s) => Some(s),
            _ => None,
        }
    }

    /// Borrow a nested map.
    pub fn as_map(&self) -> Option<&BTreeMap<String, Value>> {
        match self {
            Value::Map(m) => Some(m),
            _ => None,
        }
    }

    /// Parse a scalar as an integer.
    pub fn to_int(&self) -> Option<i64> {
        self.as_str().and_then(|s| s.trim().parse().ok())
    }

    /// Parse a scalar as a boolean.
    ///
    /// Splunk reports booleans as `0`/`1` but accepts `true`/`false` on
    /// input, so both spellings (and `yes`/`no`, `on`/`off`) are recognised.
    pub fn to_bool(&self) -> Option<bool> {
        match self.as_str()?.trim().to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Some(true),
            "0" | "false" | "no" | "off" => Some(false),
            _ => None,
        }
    }

    /// Read a value as a list of strings.
    ///
    /// Lists are returned as-is; scalars are split on commas with blank
    /// entries dropped. Maps have no list form.
    pub fn to_string_list(&self) -> Option<Vec<String>> {
        match self {
            Value::List(items) => Some(items.clone()),
            Value::Scalar(s) => Some(
                s.split(',')
                    .map(str::trim)
                    .filter(|part| !part.is_empty())
                    .map(String::from)
                    .collect(),
            ),
            Value::Map(_) => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Scalar(s) => f.write_str(s),
            Value::List(items) => f.write_str(&items.join(",")),
            Value::Map(map) => {
                write!(f, "{{")?;
                for (i, (k, v)) in map.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{k}: {v}")?;
                }
                write!(f, "}}")
            }
        }
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Scalar(s)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Scalar(s.to_string())
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Scalar(n.to_string())
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Scalar(n.to_string())
    }
}

impl From<u32> for Value {
    fn from(n: u32) -> Self {
        Value::Scalar(n.to_string())
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Scalar(b.to_string())
    }
}

impl From<Vec<String>> for Value {
    fn from(items: Vec<String>) -> Self {
        Value::List(items)
    }
}

impl From<Vec<&str>> for Value {
    fn from(items: Vec<&str>) -> Self {
        Value::List(items.into_iter().map(String::from).collect())
    }
}

impl From<&[&str]> for Value {
    fn from(items: &[&str]) -> Self {
        Value::List(items.iter().map(|s| s.to_string()).collect())
    }
}

/// Builder for an explicit attribute set, used for creates and full-replace
/// updates.
///
/// ```
/// use splunk_client::{Args, Value};
///
/// let args = Args::new().add("sourcetype", "sdk-tests").add("rcvbuf", 1024);
/// let attrs = args.into_attributes();
/// assert_eq!(attrs["rcvbuf"], Value::from("1024"));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Args(Attributes);

impl Args {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add (or overwrite) a field.
    pub fn add(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.0.insert(key.into(), value.into());
        self
    }

    pub fn into_attributes(self) -> Attributes {
        self.0
    }
}

impl From<Args> for Attributes {
    fn from(args: Args) -> Self {
        args.0
    }
}

/// Flatten attributes into form fields for a POST body.
///
/// Lists become repeated keys. Nested maps have no form encoding and are
/// rejected before anything is sent.
pub(crate) fn form_fields(attrs: &Attributes) -> Result<Vec<(String, String)>> {
    let mut fields = Vec::with_capacity(attrs.len());
    for (key, value) in attrs {
        match value {
            Value::Scalar(s) => fields.push((key.clone(), s.clone())),
            Value::List(items) => {
                fields.extend(items.iter().map(|item| (key.clone(), item.clone())));
            }
            Value::Map(_) => {
                return Err(SplunkError::InvalidValue {
                    key: key.clone(),
                    expected: "a scalar or list",
                });
            }
        }
    }
    Ok(fields)
}
