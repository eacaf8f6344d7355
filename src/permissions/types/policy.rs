use super::{Action, SecurablePath, Specificity};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Effect {
    #[serde(alias = "GRANT", alias = "allow", alias = "grant")]
    Allow,
    #[serde(alias = "deny")]
    Deny,
}

impl fmt::Display for Effect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Effect::Allow => f.write_str("ALLOW"),
            Effect::Deny => f.write_str("DENY"),
        }
    }
}

/// A single GRANT or DENY record.
///
/// Facts are never mutated after they are recorded. `sequence` is assigned by
/// the policy store and increases with every grant, so it orders facts by
/// recency even when timestamps collide.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicyFact {
    pub id: Uuid,
    pub principal: String,
    pub action: Action,
    pub securable: SecurablePath,
    pub effect: Effect,
    pub sequence: u64,
    pub recorded_at: DateTime<Utc>,
}

impl PolicyFact {
    pub fn new(
        principal: &str,
        action: Action,
        securable: SecurablePath,
        effect: Effect,
        sequence: u64,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            principal: principal.to_string(),
            action,
            securable,
            effect,
            sequence,
            recorded_at: Utc::now(),
        }
    }

    pub fn specificity(&self) -> Specificity {
        self.securable.specificity()
    }

    /// Exact (principal, action, securable) match, ignoring effect.
    pub fn matches_key(&self, principal: &str, action: Action, securable: &SecurablePath) -> bool {
        self.principal == principal && self.action == action && &self.securable == securable
    }
}

impl fmt::Display for PolicyFact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let verb = match self.effect {
            Effect::Allow => "GRANT",
            Effect::Deny => "DENY",
        };
        write!(
            f,
            "{} {} ON {} TO {} (#{})",
            verb, self.action, self.securable, self.principal, self.sequence
        )
    }
}
