use crate::error::{AccessError, AccessResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Data-access actions a policy fact can govern.
///
/// Serialized as the uppercase name; deserialization goes through [`FromStr`]
/// so policy files may also spell READ as `SELECT`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Action {
    Read,
    Insert,
    Update,
    Delete,
}

impl Action {
    pub const ALL: [Action; 4] = [Action::Read, Action::Insert, Action::Update, Action::Delete];

    pub fn as_str(&self) -> &'static str {
        match self {
            Action::Read => "READ",
            Action::Insert => "INSERT",
            Action::Update => "UPDATE",
            Action::Delete => "DELETE",
        }
    }

    /// Parses a comma-separated action list such as `SELECT, INSERT, UPDATE`.
    ///
    /// Duplicates are collapsed while keeping first-seen order. An empty list
    /// is rejected.
    pub fn parse_list(input: &str) -> AccessResult<Vec<Action>> {
        let mut actions = Vec::new();
        for part in input.split(',') {
            let action: Action = part.parse()?;
            if !actions.contains(&action) {
                actions.push(action);
            }
        }
        Ok(actions)
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<String> for Action {
    type Error = AccessError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Action> for String {
    fn from(action: Action) -> Self {
        action.as_str().to_string()
    }
}

impl FromStr for Action {
    type Err = AccessError;

    /// Case-insensitive; `SELECT` is accepted as the SQL spelling of `READ`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "READ" | "SELECT" => Ok(Action::Read),
            "INSERT" => Ok(Action::Insert),
            "UPDATE" => Ok(Action::Update),
            "DELETE" => Ok(Action::Delete),
            "" => Err(AccessError::InvalidRequest("empty action".to_string())),
            other => Err(AccessError::InvalidRequest(format!(
                "unsupported action '{}'",
                other
            ))),
        }
    }
}
