use super::args::{Cli, Commands, OutputFormat};
use crate::config::load_access_config;
use crate::error::AccessResult;
use crate::log_cli_info;
use crate::logging::{LoggingError, LoggingSystem};
use crate::permissions::{
    AccessManager, AccessRequest, Action, Decision, Effect, PolicyScript, SecurablePath,
};
use colored::Colorize;
use std::io::Write;

/// Loads configuration, opens the manager and runs one command against
/// standard output.
pub fn run(cli: Cli) -> AccessResult<()> {
    let mut config = load_access_config(cli.config.as_deref())?;
    if let Some(storage) = cli.storage {
        config.storage_path = Some(storage);
    }

    match LoggingSystem::init_with_config(config.logging.clone()) {
        Ok(()) | Err(LoggingError::AlreadyInitialized) => {}
        Err(e) => return Err(e.into()),
    }

    let manager = AccessManager::open(&config)?;
    if !manager.is_persistent() {
        log::warn!("No storage path configured; changes will not be saved");
    }

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    execute(&manager, cli.command, &mut out)
}

/// Runs a single command, writing human-facing output to `out`.
pub fn execute<W: Write>(manager: &AccessManager, command: Commands, out: &mut W) -> AccessResult<()> {
    match command {
        Commands::CreateIdentity { name } => {
            manager.create_identity(&name)?;
            writeln!(out, "Created identity {}", name)?;
        }
        Commands::DropIdentity { name } => {
            manager.drop_identity(&name)?;
            writeln!(out, "Dropped identity {}", name)?;
        }
        Commands::CreateRole { name } => {
            manager.create_role(&name)?;
            writeln!(out, "Created role {}", name)?;
        }
        Commands::DropRole { name } => {
            manager.drop_role(&name)?;
            writeln!(out, "Dropped role {}", name)?;
        }
        Commands::AddMember { identity, role } => {
            if manager.add_membership(&identity, &role)? {
                writeln!(out, "Added {} to {}", identity, role)?;
            } else {
                writeln!(out, "{} is already a member of {}", identity, role)?;
            }
        }
        Commands::RemoveMember { identity, role } => {
            if manager.remove_membership(&identity, &role)? {
                writeln!(out, "Removed {} from {}", identity, role)?;
            } else {
                writeln!(out, "{} is not a member of {}", identity, role)?;
            }
        }
        Commands::Grant {
            actions,
            securable,
            principal,
        } => record(manager, &actions, &securable, &principal, Effect::Allow, out)?,
        Commands::Deny {
            actions,
            securable,
            principal,
        } => record(manager, &actions, &securable, &principal, Effect::Deny, out)?,
        Commands::Revoke {
            actions,
            securable,
            principal,
        } => {
            let actions = Action::parse_list(&actions)?;
            let securable: SecurablePath = securable.parse()?;
            let mut removed = 0;
            for action in actions {
                removed += manager.revoke(&principal, action, &securable)?;
            }
            writeln!(out, "Revoked {} fact(s)", removed)?;
        }
        Commands::Check {
            identity,
            action,
            securable,
            format,
        } => {
            let request = AccessRequest::parse(&identity, &action, &securable)?;
            let decision = manager.evaluate_request(&request)?;
            log_cli_info!(
                "{} {} ON {}: {}",
                request.identity,
                request.action,
                request.securable,
                decision.effect
            );
            match format {
                OutputFormat::Pretty => print_decision(&request, &decision, out)?,
                OutputFormat::Json => {
                    serde_json::to_writer_pretty(&mut *out, &decision)?;
                    writeln!(out)?;
                }
            }
        }
        Commands::CheckColumns {
            identity,
            action,
            object,
            columns,
        } => {
            let action: Action = action.parse()?;
            let object: SecurablePath = object.parse()?;
            let results = manager.check_columns(&identity, action, &object, &columns)?;
            for result in results {
                let verdict = if result.allowed {
                    "ALLOW".green()
                } else {
                    "DENY".red()
                };
                match (&result.decision, &result.error) {
                    (Some(decision), _) => {
                        writeln!(out, "{:<24} {}  {}", result.column_name, verdict, decision.reason())?
                    }
                    (None, Some(error)) => {
                        writeln!(out, "{:<24} {}  {}", result.column_name, verdict, error)?
                    }
                    (None, None) => writeln!(out, "{:<24} {}", result.column_name, verdict)?,
                }
            }
        }
        Commands::Roles { identity } => {
            let roles = manager.resolve_effective_roles(&identity)?;
            if roles.is_empty() {
                writeln!(out, "{} has no roles", identity)?;
            }
            for role in roles {
                writeln!(out, "{}", role)?;
            }
        }
        Commands::ListFacts { principal } => {
            let snapshot = manager.snapshot()?;
            for fact in snapshot.policies.facts() {
                if principal.as_deref().map_or(true, |p| p == fact.principal) {
                    writeln!(out, "{}", fact)?;
                }
            }
        }
        Commands::Apply { path } => {
            let script = PolicyScript::from_file(&path)?;
            let changes = manager.apply_script(&script)?;
            writeln!(out, "Applied {} ({} change(s))", path.display(), changes)?;
        }
        Commands::Export => {
            let snapshot = manager.export_snapshot()?;
            serde_json::to_writer_pretty(&mut *out, &snapshot)?;
            writeln!(out)?;
        }
    }
    Ok(())
}

fn record<W: Write>(
    manager: &AccessManager,
    actions: &str,
    securable: &str,
    principal: &str,
    effect: Effect,
    out: &mut W,
) -> AccessResult<()> {
    let actions = Action::parse_list(actions)?;
    let securable: SecurablePath = securable.parse()?;
    let facts = manager.record_all(principal, &actions, &securable, effect)?;
    for fact in facts {
        writeln!(out, "Recorded {}", fact)?;
    }
    Ok(())
}

fn print_decision<W: Write>(
    request: &AccessRequest,
    decision: &Decision,
    out: &mut W,
) -> AccessResult<()> {
    let verdict = if decision.is_allowed() {
        "ALLOW".green().bold()
    } else {
        "DENY".red().bold()
    };
    writeln!(
        out,
        "{} {} {} ON {}",
        verdict, request.identity, request.action, request.securable
    )?;
    match &decision.matched_fact {
        Some(fact) => writeln!(out, "  matched: {}", fact)?,
        None => writeln!(out, "  matched: no applicable permission (default deny)")?,
    }
    if let Some(audit) = &decision.audit {
        let levels: Vec<String> = audit.levels.iter().map(|l| l.to_string()).collect();
        writeln!(out, "  contributing levels: {}", levels.join(", "))?;
        for fact in &audit.contributing_facts {
            writeln!(out, "    {}", fact)?;
        }
    }
    Ok(())
}

