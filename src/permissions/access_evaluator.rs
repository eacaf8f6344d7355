use crate::error::{AccessError, AccessResult};
use crate::permissions::policy_store::PolicyStore;
use crate::permissions::principal_directory::PrincipalDirectory;
use crate::permissions::types::{
    Action, ColumnPermissionResult, Decision, Effect, PolicyConflictAudit, PolicyFact,
    SecurablePath, Specificity,
};
use crate::{log_evaluator_debug, log_evaluator_warn};
use serde::{Deserialize, Serialize};

/// A validated access request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessRequest {
    pub identity: String,
    pub action: Action,
    pub securable: SecurablePath,
}

impl AccessRequest {
    /// Validates raw request fields. A malformed action or path fails with
    /// [`AccessError::InvalidRequest`] before any evaluation happens.
    pub fn parse(identity: &str, action: &str, securable: &str) -> AccessResult<Self> {
        if identity.trim().is_empty() {
            return Err(AccessError::InvalidRequest(
                "identity cannot be empty".to_string(),
            ));
        }
        Ok(Self {
            identity: identity.to_string(),
            action: action.parse()?,
            securable: securable.parse()?,
        })
    }
}

/// Decides whether an identity may perform an action on a securable.
///
/// The evaluator only reads from the directory and the store, so it can run
/// on any consistent snapshot of them.
///
/// Precedence:
/// 1. A DENY at any level wins over an ALLOW at any level.
/// 2. Otherwise an ALLOW at any level grants access.
/// 3. With no applicable fact the answer is DENY.
///
/// Specificity (column > object > schema) never changes the outcome; it only
/// selects which fact is reported as the reason.
pub struct AccessEvaluator<'a> {
    directory: &'a PrincipalDirectory,
    store: &'a PolicyStore,
}

impl<'a> AccessEvaluator<'a> {
    pub fn new(directory: &'a PrincipalDirectory, store: &'a PolicyStore) -> Self {
        Self { directory, store }
    }

    pub fn evaluate(
        &self,
        identity: &str,
        action: Action,
        securable: &SecurablePath,
    ) -> AccessResult<Decision> {
        let mut principals = self.directory.resolve_effective_roles(identity)?;
        principals.insert(identity.to_string());

        // find_applicable already covers every ancestor of the securable
        let applicable = self.store.find_applicable(&principals, action, securable);
        let decision = decide(applicable);

        log_evaluator_debug!(
            "{} {} ON {}: {}",
            identity,
            action,
            securable,
            decision.reason()
        );
        Ok(decision)
    }

    pub fn evaluate_request(&self, request: &AccessRequest) -> AccessResult<Decision> {
        self.evaluate(&request.identity, request.action, &request.securable)
    }

    /// Evaluates each column of `object` separately.
    ///
    /// An unknown identity fails the whole call; a malformed column name only
    /// fails that column's entry.
    pub fn check_columns(
        &self,
        identity: &str,
        action: Action,
        object: &SecurablePath,
        columns: &[String],
    ) -> AccessResult<Vec<ColumnPermissionResult>> {
        if object.specificity() != Specificity::Object {
            return Err(AccessError::InvalidRequest(format!(
                "'{}' is not an object path",
                object
            )));
        }
        if !self.directory.contains_identity(identity) {
            return Err(AccessError::UnknownIdentity(identity.to_string()));
        }

        columns
            .iter()
            .map(|column_name| {
                let result = match object.child_column(column_name) {
                    Ok(path) => {
                        let decision = self.evaluate(identity, action, &path)?;
                        ColumnPermissionResult {
                            column_name: column_name.clone(),
                            allowed: decision.is_allowed(),
                            error: if decision.is_allowed() {
                                None
                            } else {
                                Some(format!("{} access denied for column {}", action, path))
                            },
                            decision: Some(decision),
                        }
                    }
                    Err(e) => {
                        log_evaluator_warn!("Skipping column {:?}: {}", column_name, e);
                        ColumnPermissionResult {
                            column_name: column_name.clone(),
                            allowed: false,
                            decision: None,
                            error: Some(e.to_string()),
                        }
                    }
                };
                Ok(result)
            })
            .collect()
    }
}

/// Applies the precedence rules to facts ordered most specific first, then
/// most recent first.
fn decide(applicable: Vec<PolicyFact>) -> Decision {
    let winning_effect = if applicable.iter().any(|f| f.effect == Effect::Deny) {
        Effect::Deny
    } else if applicable.is_empty() {
        return Decision::default_deny();
    } else {
        Effect::Allow
    };

    // Ordering puts the most specific, most recent fact of each effect first
    let matched_fact = applicable
        .iter()
        .find(|f| f.effect == winning_effect)
        .cloned();

    let mut levels: Vec<Specificity> = applicable.iter().map(PolicyFact::specificity).collect();
    levels.dedup();
    let audit = (levels.len() > 1).then(|| PolicyConflictAudit {
        levels,
        contributing_facts: applicable,
    });

    Decision {
        effect: winning_effect,
        matched_fact,
        audit,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn path(s: &str) -> SecurablePath {
        s.parse().unwrap()
    }

    fn setup() -> (PrincipalDirectory, PolicyStore) {
        let mut dir = PrincipalDirectory::new();
        dir.create_identity("HRManagerUser").unwrap();
        dir.create_identity("SalesRepUser").unwrap();
        dir.create_identity("Intern").unwrap();
        dir.create_role("HRRole").unwrap();
        dir.create_role("SalesRole").unwrap();
        dir.add_membership("HRManagerUser", "HRRole").unwrap();
        dir.add_membership("SalesRepUser", "SalesRole").unwrap();
        (dir, PolicyStore::new())
    }

    #[test]
    fn fails_closed_without_facts() {
        let (dir, store) = setup();
        let evaluator = AccessEvaluator::new(&dir, &store);
        for action in Action::ALL {
            let decision = evaluator
                .evaluate("Intern", action, &path("GA1.EmployeeData.Salary"))
                .unwrap();
            assert_eq!(decision.effect, Effect::Deny);
            assert!(decision.is_default());
            assert!(decision.audit.is_none());
        }
    }

    #[test]
    fn unknown_identity_is_reported() {
        let (dir, store) = setup();
        let evaluator = AccessEvaluator::new(&dir, &store);
        assert!(matches!(
            evaluator.evaluate("Ghost", Action::Read, &path("GA1")),
            Err(AccessError::UnknownIdentity(_))
        ));
    }

    #[test]
    fn column_deny_beats_object_allow() {
        let (dir, mut store) = setup();
        let allow = store.grant("SalesRole", Action::Read, path("GA1.EmployeeData"), Effect::Allow);
        let deny = store.grant(
            "SalesRole",
            Action::Read,
            path("GA1.EmployeeData.Salary"),
            Effect::Deny,
        );
        let evaluator = AccessEvaluator::new(&dir, &store);

        let salary = evaluator
            .evaluate("SalesRepUser", Action::Read, &path("GA1.EmployeeData.Salary"))
            .unwrap();
        assert_eq!(salary.effect, Effect::Deny);
        assert_eq!(salary.matched_fact.as_ref().map(|f| f.id), Some(deny.id));
        let audit = salary.audit.expect("two levels contributed");
        assert_eq!(audit.levels, vec![Specificity::Column, Specificity::Object]);
        assert_eq!(audit.contributing_facts.len(), 2);

        let name = evaluator
            .evaluate("SalesRepUser", Action::Read, &path("GA1.EmployeeData.Name"))
            .unwrap();
        assert_eq!(name.effect, Effect::Allow);
        assert_eq!(name.matched_fact.map(|f| f.id), Some(allow.id));
    }

    #[test]
    fn object_deny_beats_column_allow() {
        let (dir, mut store) = setup();
        store.grant("SalesRole", Action::Update, path("GA1.EmployeeData.Name"), Effect::Allow);
        store.grant("SalesRole", Action::Update, path("GA1.EmployeeData"), Effect::Deny);
        let evaluator = AccessEvaluator::new(&dir, &store);
        let decision = evaluator
            .evaluate("SalesRepUser", Action::Update, &path("GA1.EmployeeData.Name"))
            .unwrap();
        assert_eq!(decision.effect, Effect::Deny);
    }

    #[test]
    fn user_and_role_conflict_at_same_level_denies() {
        let (dir, mut store) = setup();
        store.grant("HRManagerUser", Action::Delete, path("GA1.EmployeeData"), Effect::Allow);
        store.grant("HRRole", Action::Delete, path("GA1.EmployeeData"), Effect::Deny);
        let evaluator = AccessEvaluator::new(&dir, &store);
        let decision = evaluator
            .evaluate("HRManagerUser", Action::Delete, &path("GA1.EmployeeData"))
            .unwrap();
        assert_eq!(decision.effect, Effect::Deny);
        assert!(decision.audit.is_none());
    }

    #[test]
    fn most_specific_allow_is_reported() {
        let (dir, mut store) = setup();
        store.grant("HRRole", Action::Read, path("GA1"), Effect::Allow);
        let column = store.grant(
            "HRManagerUser",
            Action::Read,
            path("GA1.EmployeeData.Salary"),
            Effect::Allow,
        );
        let evaluator = AccessEvaluator::new(&dir, &store);
        let decision = evaluator
            .evaluate("HRManagerUser", Action::Read, &path("GA1.EmployeeData.Salary"))
            .unwrap();
        assert!(decision.is_allowed());
        assert_eq!(decision.matched_fact.map(|f| f.id), Some(column.id));
    }

    #[test]
    fn actions_do_not_leak() {
        let (dir, mut store) = setup();
        store.grant("HRRole", Action::Read, path("GA1"), Effect::Allow);
        let evaluator = AccessEvaluator::new(&dir, &store);
        let decision = evaluator
            .evaluate("HRManagerUser", Action::Delete, &path("GA1.EmployeeData"))
            .unwrap();
        assert!(!decision.is_allowed());
    }

    #[test]
    fn evaluation_is_repeatable() {
        let (dir, mut store) = setup();
        store.grant("SalesRole", Action::Read, path("GA1.EmployeeData"), Effect::Allow);
        store.grant("SalesRole", Action::Read, path("GA1.EmployeeData.Salary"), Effect::Deny);
        let evaluator = AccessEvaluator::new(&dir, &store);
        let target = path("GA1.EmployeeData.Salary");
        let first = evaluator.evaluate("SalesRepUser", Action::Read, &target).unwrap();
        for _ in 0..10 {
            assert_eq!(
                evaluator.evaluate("SalesRepUser", Action::Read, &target).unwrap(),
                first
            );
        }
    }

    #[test]
    fn request_parsing_rejects_malformed_input() {
        assert!(matches!(
            AccessRequest::parse("HRManagerUser", "EXECUTE", "GA1"),
            Err(AccessError::InvalidRequest(_))
        ));
        assert!(matches!(
            AccessRequest::parse("HRManagerUser", "SELECT", "GA1..Salary"),
            Err(AccessError::InvalidRequest(_))
        ));
        let request = AccessRequest::parse("HRManagerUser", "select", "GA1.EmployeeData").unwrap();
        assert_eq!(request.action, Action::Read);
    }

    #[test]
    fn check_columns_reports_each_column() {
        let (dir, mut store) = setup();
        store.grant("SalesRole", Action::Read, path("GA1.EmployeeData"), Effect::Allow);
        store.grant("SalesRole", Action::Read, path("GA1.EmployeeData.Salary"), Effect::Deny);
        let evaluator = AccessEvaluator::new(&dir, &store);
        let columns = vec![
            "EmployeeID".to_string(),
            "Salary".to_string(),
            "bad column".to_string(),
        ];
        let results = evaluator
            .check_columns("SalesRepUser", Action::Read, &path("GA1.EmployeeData"), &columns)
            .unwrap();
        assert!(results[0].allowed);
        assert!(!results[1].allowed);
        assert!(results[1].decision.is_some());
        assert!(!results[2].allowed);
        assert!(results[2].decision.is_none());

        assert!(evaluator
            .check_columns("SalesRepUser", Action::Read, &path("GA1"), &columns)
            .is_err());
    }
}
