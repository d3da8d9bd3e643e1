//! Resource group commands

use anyhow::Result;

use crate::cli::ConfirmArgs;
use crate::commands::{connect, explain};
use crate::config::AppConfig;
use crate::ui;

pub fn create(config: &AppConfig) -> Result<()> {
    let rg = &config.resource_group;
    ui::header(&format!("Resource group '{}'", rg.name));
    ui::kv("location", &rg.location);
    ui::kv("subscription", &config.subscription_id);

    let session = connect(config)?;
    let handle = session
        .ensure_resource_group(&rg.name, &rg.location)
        .map_err(explain)?;

    ui::success(&format!("Resource group '{}' is ready", rg.name));
    ui::kv("id", &handle.id);
    Ok(())
}

pub fn delete(config: &AppConfig, args: ConfirmArgs) -> Result<()> {
    let rg = &config.resource_group;
    ui::header(&format!("Delete resource group '{}'", rg.name));
    ui::warn("Every resource in the group will be deleted, not only the VM stack.");

    let prompt = format!("Delete resource group '{}' and all its contents?", rg.name);
    if !ui::confirm(&prompt, args.yes)? {
        ui::info("Cancelled");
        return Ok(());
    }

    let session = connect(config)?;
    session.delete_resource_group(&rg.name).map_err(explain)?;
    ui::success(&format!("Resource group '{}' deleted", rg.name));
    Ok(())
}
