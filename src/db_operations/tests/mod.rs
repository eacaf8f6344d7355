use super::DbOperations;
use crate::permissions::access_state::{AccessSnapshot, AccessState};
use crate::permissions::types::{Action, Effect};

fn sample_state() -> AccessState {
    let mut state = AccessState::default();
    state.directory.create_identity("HRManagerUser").unwrap();
    state.directory.create_role("HRRole").unwrap();
    state
        .directory
        .add_membership("HRManagerUser", "HRRole")
        .unwrap();
    state.policies.grant(
        "HRRole",
        Action::Read,
        "GA1".parse().unwrap(),
        Effect::Allow,
    );
    state
}

#[test]
fn empty_database_loads_empty_snapshot() {
    let db = DbOperations::temporary().unwrap();
    assert_eq!(db.load_snapshot().unwrap(), AccessSnapshot::default());
}

#[test]
fn write_changes_round_trips() {
    let db = DbOperations::temporary().unwrap();
    let snapshot = sample_state().to_snapshot();
    db.write_changes(&AccessSnapshot::default(), &snapshot).unwrap();

    let loaded = db.load_snapshot().unwrap();
    assert_eq!(loaded, snapshot);
    assert!(db.get_identity("HRManagerUser").unwrap().is_some());
    assert!(db.get_role("HRRole").unwrap().is_some());
    assert_eq!(db.get_stats()["policy_facts"], 1);
}

#[test]
fn write_changes_applies_removals() {
    let db = DbOperations::temporary().unwrap();
    let mut state = sample_state();
    let before = state.to_snapshot();
    db.write_changes(&AccessSnapshot::default(), &before).unwrap();

    state.policies.revoke("HRRole", Action::Read, &"GA1".parse().unwrap());
    state.directory.drop_role("HRRole").unwrap();
    let after = state.to_snapshot();
    db.write_changes(&before, &after).unwrap();

    let loaded = db.load_snapshot().unwrap();
    assert!(loaded.roles.is_empty());
    assert!(loaded.facts.is_empty());
    assert!(loaded.identities[0].roles.is_empty());
}

#[test]
fn replace_snapshot_overwrites_existing_data() {
    let db = DbOperations::temporary().unwrap();
    db.replace_snapshot(&sample_state().to_snapshot()).unwrap();

    let mut other = AccessState::default();
    other.directory.create_identity("SalesRepUser").unwrap();
    let snapshot = other.to_snapshot();
    db.replace_snapshot(&snapshot).unwrap();

    assert_eq!(db.load_snapshot().unwrap(), snapshot);
}

#[test]
fn facts_load_in_recording_order() {
    let db = DbOperations::temporary().unwrap();
    let mut state = AccessState::default();
    state.directory.create_role("R").unwrap();
    for _ in 0..12 {
        state
            .policies
            .grant("R", Action::Update, "GA1.T".parse().unwrap(), Effect::Deny);
    }
    db.replace_snapshot(&state.to_snapshot()).unwrap();
    let sequences: Vec<u64> = db.list_facts().unwrap().iter().map(|f| f.sequence).collect();
    assert_eq!(sequences, (0..12).collect::<Vec<u64>>());
}

#[test]
fn new_database_is_stamped_with_format_version() {
    let db = DbOperations::temporary().unwrap();
    assert_eq!(db.format_version().unwrap(), Some(1));
    assert_eq!(db.get_stats()["metadata"], 1);
}

#[test]
fn unknown_format_version_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    {
        let db = DbOperations::open(dir.path()).unwrap();
        db.store_in_tree(&db.metadata_tree, "format_version", &99u32)
            .unwrap();
    }
    assert!(matches!(
        DbOperations::open(dir.path()),
        Err(crate::error::AccessError::Database(_))
    ));
}

#[test]
fn committed_changes_survive_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let snapshot = sample_state().to_snapshot();
    {
        let db = DbOperations::open(dir.path()).unwrap();
        db.write_changes(&AccessSnapshot::default(), &snapshot).unwrap();
    }
    let db = DbOperations::open(dir.path()).unwrap();
    assert_eq!(db.load_snapshot().unwrap(), snapshot);
}
