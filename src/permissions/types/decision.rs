use super::{Effect, PolicyFact, Specificity};
use crate::error::{AccessError, AccessResult};
use serde::{Deserialize, Serialize};

/// Informational record attached to a decision when facts at more than one
/// specificity level applied to the request. Never an error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicyConflictAudit {
    /// Distinct levels that contributed, most specific first
    pub levels: Vec<Specificity>,
    /// Every applicable fact, most specific first then most recent first
    pub contributing_facts: Vec<PolicyFact>,
}

/// Outcome of one access evaluation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Decision {
    pub effect: Effect,
    /// The fact that determined the outcome; `None` means the fail-closed default
    pub matched_fact: Option<PolicyFact>,
    pub audit: Option<PolicyConflictAudit>,
}

impl Decision {
    /// DENY with no supporting fact.
    pub fn default_deny() -> Self {
        Self {
            effect: Effect::Deny,
            matched_fact: None,
            audit: None,
        }
    }

    pub fn is_allowed(&self) -> bool {
        self.effect == Effect::Allow
    }

    pub fn is_default(&self) -> bool {
        self.matched_fact.is_none()
    }

    /// Human readable account of the decision, used by the CLI and logs.
    pub fn reason(&self) -> String {
        match &self.matched_fact {
            Some(fact) => format!("{} by {}", self.effect, fact),
            None => format!("{} (no applicable permission)", self.effect),
        }
    }

    /// Converts a DENY into [`AccessError::AccessDenied`] for request layers
    /// that reject the attempt outright.
    pub fn into_result(self) -> AccessResult<Decision> {
        if self.is_allowed() {
            Ok(self)
        } else {
            Err(AccessError::AccessDenied(self.reason()))
        }
    }
}

/// Per-column result of checking several columns of one object.
#[derive(Debug, Clone)]
pub struct ColumnPermissionResult {
    pub column_name: String,
    pub allowed: bool,
    pub decision: Option<Decision>,
    pub error: Option<String>,
}
