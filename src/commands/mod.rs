//! Command implementations
//!
//! Each command works on an already-loaded [`AppConfig`], so the CLI and the
//! interactive menu share the same code paths.

pub mod group;
pub mod menu;
pub mod projects;
pub mod vm;

use anyhow::{Context, Result};
use armkit::{ArmClient, DefaultCredential};
use colored::Colorize;
use provision::{ProviderError, ProvisionError, Provisioner, RollbackReport, RollbackStatus};
use serde::Serialize;

use crate::Context as AppContext;
use crate::config::{self, AppConfig};
use crate::ui;

/// Provisioner bound to a live Resource Manager client
pub type Session = Provisioner<ArmClient>;

/// Load the config selected by `--config` / `--project`
pub fn load_config(ctx: &AppContext) -> Result<AppConfig> {
    let path = config::resolve(ctx.config.as_deref(), ctx.project.as_deref())?;
    log::info!("Using config {}", path.display());
    AppConfig::load(&path)
}

/// Authenticate and build a client for the config's subscription
pub fn connect(config: &AppConfig) -> Result<Session> {
    let settings = config.azure.client_settings();
    let subscription_id = config.subscription_id.clone();
    Provisioner::connect(&DefaultCredential::new(), |credential| {
        ArmClient::new(subscription_id, credential, settings)
    })
    .map_err(explain)
    .context("Could not authenticate with Azure")
}

/// Print a JSON document to stdout
pub fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Print category advice for a provider error
pub fn advise(error: &ProviderError) {
    ui::dim(&format!(
        "{}: {}",
        error.category.description(),
        error.category.advice()
    ));
}

/// Print advice for a failed single operation, passing the error through
pub fn explain(error: ProvisionError) -> anyhow::Error {
    match &error {
        ProvisionError::Credential(e) | ProvisionError::Provider { source: e, .. } => advise(e),
        ProvisionError::Configuration { .. } => {}
    }
    error.into()
}

/// Print every rollback entry so the operator can finish cleanup by hand
pub fn print_report(title: &str, report: &RollbackReport) {
    ui::section(title);
    if report.is_empty() {
        ui::dim("nothing to clean up");
        return;
    }

    for entry in &report.entries {
        let what = format!("{} {}", entry.kind.display_name(), entry.name.bold());
        match &entry.status {
            RollbackStatus::Deleted => println!("  {} {:<14} {what}", "✓".green(), "deleted"),
            RollbackStatus::AlreadyAbsent => {
                println!("  {} {:<14} {what}", "✓".green(), "already gone");
            }
            RollbackStatus::Skipped { reason } => {
                println!("  {} {:<14} {what} ({reason})", "-".dimmed(), "skipped");
            }
            RollbackStatus::Failed { error } => {
                println!("  {} {:<14} {what}: {error}", "✗".red(), "FAILED".red().bold());
            }
        }
    }

    if let Err(partial) = report.check() {
        println!();
        ui::warn(&format!(
            "{} resource(s) may still exist and keep billing; delete them in the portal or re-run 'azprov vm delete'",
            partial.leftovers.len()
        ));
    }
}
