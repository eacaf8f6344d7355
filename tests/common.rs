//! Shared fixtures for the access control integration tests

#![allow(dead_code)]

use fold_access::{AccessManager, PolicyScript, SecurablePath};

/// Provisioning script mirroring the GA1/EmployeeData walkthrough
pub const GA1_SCRIPT: &str = include_str!("../demos/ga1_employee_data.json");

pub const EMPLOYEE_COLUMNS: [&str; 5] = ["EmployeeID", "FirstName", "LastName", "Department", "Salary"];

pub fn path(s: &str) -> SecurablePath {
    s.parse().expect("valid securable path")
}

/// Manager with the GA1 walkthrough applied
pub fn ga1_manager() -> AccessManager {
    let manager = AccessManager::in_memory();
    apply_ga1(&manager);
    manager
}

pub fn apply_ga1(manager: &AccessManager) {
    let script = PolicyScript::from_json(GA1_SCRIPT).expect("demo script parses");
    manager.apply_script(&script).expect("demo script applies");
}

pub fn columns() -> Vec<String> {
    EMPLOYEE_COLUMNS.iter().map(|c| c.to_string()).collect()
}
