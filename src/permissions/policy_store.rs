use crate::permissions::types::{Action, Effect, PolicyFact, SecurablePath};
use crate::{log_policy_debug, log_policy_info};
use std::cmp::Reverse;
use std::collections::BTreeSet;

/// Append-only record of GRANT and DENY facts.
///
/// The store does not deduplicate: granting the same permission twice records
/// two facts, and a single `revoke` removes both.
#[derive(Debug, Clone, Default)]
pub struct PolicyStore {
    facts: Vec<PolicyFact>,
    next_sequence: u64,
}

impl PolicyStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuilds a store from persisted facts. Sequence numbers continue after
    /// the highest one loaded.
    pub fn from_facts(mut facts: Vec<PolicyFact>) -> Self {
        facts.sort_by_key(|f| f.sequence);
        let next_sequence = facts.last().map_or(0, |f| f.sequence + 1);
        Self {
            facts,
            next_sequence,
        }
    }

    /// Records a fact and returns it.
    pub fn grant(
        &mut self,
        principal: &str,
        action: Action,
        securable: SecurablePath,
        effect: Effect,
    ) -> PolicyFact {
        let fact = PolicyFact::new(principal, action, securable, effect, self.next_sequence);
        self.next_sequence += 1;
        log_policy_info!("Recorded {}", fact);
        self.facts.push(fact.clone());
        fact
    }

    /// Removes every fact matching (principal, action, securable) regardless
    /// of effect. Returns the removed facts; an empty result is not an error.
    pub fn revoke(
        &mut self,
        principal: &str,
        action: Action,
        securable: &SecurablePath,
    ) -> Vec<PolicyFact> {
        let (removed, kept): (Vec<_>, Vec<_>) = std::mem::take(&mut self.facts)
            .into_iter()
            .partition(|f| f.matches_key(principal, action, securable));
        self.facts = kept;
        if removed.is_empty() {
            log_policy_debug!(
                "Revoke {} ON {} FROM {} matched nothing",
                action,
                securable,
                principal
            );
        } else {
            log_policy_info!(
                "Revoked {} fact(s) for {} ON {} FROM {}",
                removed.len(),
                action,
                securable,
                principal
            );
        }
        removed
    }

    /// Removes every fact held by `principal`, used when the principal is
    /// dropped from the directory.
    pub fn remove_principal(&mut self, principal: &str) -> usize {
        let before = self.facts.len();
        self.facts.retain(|f| f.principal != principal);
        before - self.facts.len()
    }

    /// Facts held by any principal in `principals` for `action` on `securable`
    /// or one of its ancestors. Most specific first, then most recent first.
    pub fn find_applicable(
        &self,
        principals: &BTreeSet<String>,
        action: Action,
        securable: &SecurablePath,
    ) -> Vec<PolicyFact> {
        let mut applicable: Vec<PolicyFact> = self
            .facts
            .iter()
            .filter(|f| {
                f.action == action
                    && principals.contains(&f.principal)
                    && f.securable.is_ancestor_or_self_of(securable)
            })
            .cloned()
            .collect();
        applicable.sort_by_key(|f| (Reverse(f.specificity()), Reverse(f.sequence)));
        applicable
    }

    pub fn facts_for_principal(&self, principal: &str) -> Vec<&PolicyFact> {
        self.facts.iter().filter(|f| f.principal == principal).collect()
    }

    /// All facts in recording order.
    pub fn facts(&self) -> &[PolicyFact] {
        &self.facts
    }

    pub fn len(&self) -> usize {
        self.facts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.facts.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::permissions::types::Specificity;

    fn path(s: &str) -> SecurablePath {
        s.parse().unwrap()
    }

    fn principals(names: &[&str]) -> BTreeSet<String> {
        names.iter().map(|n| n.to_string()).collect()
    }

    #[test]
    fn revoke_of_missing_fact_is_a_no_op() {
        let mut store = PolicyStore::new();
        store.grant("HRRole", Action::Read, path("GA1"), Effect::Allow);
        let removed = store.revoke("HRRole", Action::Delete, &path("GA1"));
        assert!(removed.is_empty());
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn revoke_removes_every_effect_for_the_key() {
        let mut store = PolicyStore::new();
        let salary = path("GA1.EmployeeData.Salary");
        store.grant("SalesRole", Action::Read, salary.clone(), Effect::Allow);
        store.grant("SalesRole", Action::Read, salary.clone(), Effect::Deny);
        store.grant("SalesRole", Action::Read, salary.clone(), Effect::Deny);
        store.grant("SalesRole", Action::Update, salary.clone(), Effect::Deny);
        assert_eq!(store.revoke("SalesRole", Action::Read, &salary).len(), 3);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn find_applicable_walks_ancestors_only() {
        let mut store = PolicyStore::new();
        store.grant("HRRole", Action::Read, path("GA1"), Effect::Allow);
        store.grant("HRRole", Action::Read, path("GA1.EmployeeData"), Effect::Allow);
        store.grant("HRRole", Action::Read, path("GA1.EmployeeData.Salary"), Effect::Deny);
        store.grant("HRRole", Action::Read, path("GA1.EmployeeData.Name"), Effect::Deny);
        store.grant("HRRole", Action::Read, path("GA2"), Effect::Allow);
        store.grant("HRRole", Action::Insert, path("GA1"), Effect::Allow);
        store.grant("Other", Action::Read, path("GA1"), Effect::Allow);

        let found = store.find_applicable(
            &principals(&["HRManagerUser", "HRRole"]),
            Action::Read,
            &path("GA1.EmployeeData.Salary"),
        );
        let levels: Vec<Specificity> = found.iter().map(|f| f.specificity()).collect();
        assert_eq!(
            levels,
            vec![Specificity::Column, Specificity::Object, Specificity::Schema]
        );

        let for_object =
            store.find_applicable(&principals(&["HRRole"]), Action::Read, &path("GA1.EmployeeData"));
        assert_eq!(for_object.len(), 2);
    }

    #[test]
    fn most_recent_first_within_a_level() {
        let mut store = PolicyStore::new();
        let first = store.grant("A", Action::Read, path("GA1"), Effect::Allow);
        let second = store.grant("B", Action::Read, path("GA1"), Effect::Allow);
        let found = store.find_applicable(&principals(&["A", "B"]), Action::Read, &path("GA1.T"));
        assert_eq!(found[0].id, second.id);
        assert_eq!(found[1].id, first.id);
    }

    #[test]
    fn from_facts_continues_sequence() {
        let mut store = PolicyStore::new();
        store.grant("A", Action::Read, path("GA1"), Effect::Allow);
        store.grant("A", Action::Insert, path("GA1"), Effect::Allow);
        let mut reloaded = PolicyStore::from_facts(store.facts().to_vec());
        let fact = reloaded.grant("A", Action::Delete, path("GA1"), Effect::Deny);
        assert_eq!(fact.sequence, 2);
    }

    #[test]
    fn remove_principal_drops_its_facts() {
        let mut store = PolicyStore::new();
        store.grant("A", Action::Read, path("GA1"), Effect::Allow);
        store.grant("B", Action::Read, path("GA1"), Effect::Allow);
        store.grant("A", Action::Update, path("GA1.T"), Effect::Deny);
        assert_eq!(store.remove_principal("A"), 2);
        assert_eq!(store.facts_for_principal("B").len(), 1);
    }
}
