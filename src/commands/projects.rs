//! Project listing

use anyhow::Result;
use colored::Colorize;

use crate::config::{AppConfig, discover_projects};
use crate::{paths, ui};

pub fn list() -> Result<()> {
    let dir = paths::config_dir()?;
    let projects = discover_projects(&dir)?;

    ui::header("Projects");
    ui::kv("config dir", &dir.display().to_string());
    println!();

    if projects.is_empty() {
        ui::dim("No project configs found (add <name>.json or <name>.toml)");
        return Ok(());
    }

    for project in &projects {
        match AppConfig::load(&project.path) {
            Ok(config) => {
                let vm = config
                    .vm
                    .as_ref()
                    .map_or_else(|| "no vm".dimmed().to_string(), |vm| vm.name.clone());
                println!(
                    "  {} {} {} {}",
                    "•".cyan(),
                    project.name.bold(),
                    format!("{} ({})", config.resource_group.name, config.resource_group.location)
                        .dimmed(),
                    vm
                );
            }
            Err(e) => println!(
                "  {} {} {}",
                "✗".red(),
                project.name.bold(),
                format!("{e:#}").red()
            ),
        }
    }
    Ok(())
}
