use crate::error::{AccessError, AccessResult};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Maximum identifier length, matching the `sysname` limit of SQL engines.
pub const MAX_IDENTIFIER_LEN: usize = 128;

static IDENTIFIER_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_$#@]*$").expect("identifier regex is valid"));

/// How deep in the schema tree a securable sits.
///
/// Ordering follows specificity: a column is more specific than an object,
/// which is more specific than a schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Specificity {
    Schema,
    Object,
    Column,
}

impl fmt::Display for Specificity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Specificity::Schema => f.write_str("schema"),
            Specificity::Object => f.write_str("object"),
            Specificity::Column => f.write_str("column"),
        }
    }
}

/// Address of a schema, an object inside a schema, or a column inside an
/// object. Written `schema`, `schema.object` or `schema.object.column`.
///
/// A column always has an object parent, so the fields stay private and every
/// constructor validates.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SecurablePath {
    schema: String,
    object: Option<String>,
    column: Option<String>,
}

impl SecurablePath {
    pub fn schema(schema: &str) -> AccessResult<Self> {
        Ok(Self {
            schema: validate_identifier(schema)?,
            object: None,
            column: None,
        })
    }

    pub fn object(schema: &str, object: &str) -> AccessResult<Self> {
        Ok(Self {
            schema: validate_identifier(schema)?,
            object: Some(validate_identifier(object)?),
            column: None,
        })
    }

    pub fn column(schema: &str, object: &str, column: &str) -> AccessResult<Self> {
        Ok(Self {
            schema: validate_identifier(schema)?,
            object: Some(validate_identifier(object)?),
            column: Some(validate_identifier(column)?),
        })
    }

    pub fn schema_name(&self) -> &str {
        &self.schema
    }

    pub fn object_name(&self) -> Option<&str> {
        self.object.as_deref()
    }

    pub fn column_name(&self) -> Option<&str> {
        self.column.as_deref()
    }

    pub fn specificity(&self) -> Specificity {
        match (&self.object, &self.column) {
            (_, Some(_)) => Specificity::Column,
            (Some(_), None) => Specificity::Object,
            (None, None) => Specificity::Schema,
        }
    }

    /// True when permissions recorded on `self` are inherited by `other`.
    pub fn is_ancestor_or_self_of(&self, other: &SecurablePath) -> bool {
        if self.schema != other.schema {
            return false;
        }
        match (&self.object, &other.object) {
            (None, _) => true,
            (Some(a), Some(b)) if a == b => match (&self.column, &other.column) {
                (None, _) => true,
                (Some(a), Some(b)) => a == b,
                (Some(_), None) => false,
            },
            _ => false,
        }
    }

    /// Column path `self.column` for an object path.
    pub fn child_column(&self, column: &str) -> AccessResult<SecurablePath> {
        match (&self.object, &self.column) {
            (Some(object), None) => SecurablePath::column(&self.schema, object, column),
            _ => Err(AccessError::InvalidRequest(format!(
                "'{}' is not an object; columns can only be addressed inside an object",
                self
            ))),
        }
    }
}

fn validate_identifier(name: &str) -> AccessResult<String> {
    if name.is_empty() {
        return Err(AccessError::InvalidRequest(
            "securable path contains an empty segment".to_string(),
        ));
    }
    if name.len() > MAX_IDENTIFIER_LEN {
        return Err(AccessError::InvalidRequest(format!(
            "identifier '{}' exceeds {} characters",
            name, MAX_IDENTIFIER_LEN
        )));
    }
    if !IDENTIFIER_RE.is_match(name) {
        return Err(AccessError::InvalidRequest(format!(
            "invalid identifier '{}'",
            name
        )));
    }
    Ok(name.to_string())
}

impl FromStr for SecurablePath {
    type Err = AccessError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let segments: Vec<&str> = s.trim().split('.').collect();
        match segments.as_slice() {
            [schema] => SecurablePath::schema(schema),
            [schema, object] => SecurablePath::object(schema, object),
            [schema, object, column] => SecurablePath::column(schema, object, column),
            _ => Err(AccessError::InvalidRequest(format!(
                "securable path '{}' must have one to three segments",
                s
            ))),
        }
    }
}

impl TryFrom<String> for SecurablePath {
    type Error = AccessError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<SecurablePath> for String {
    fn from(path: SecurablePath) -> Self {
        path.to_string()
    }
}

impl fmt::Display for SecurablePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.schema)?;
        if let Some(object) = &self.object {
            write!(f, ".{}", object)?;
        }
        if let Some(column) = &self.column {
            write!(f, ".{}", column)?;
        }
        Ok(())
    }
}
