//! Interactive menu
//!
//! Pick a project, then run actions against it until "Quit". A failing
//! action is reported and the menu comes back.

use anyhow::{Result, bail};
use std::fmt;

use crate::Context as AppContext;
use crate::cli::{ConfirmArgs, OutputArgs};
use crate::commands::{group, vm};
use crate::config::{self, AppConfig, discover_projects};
use crate::{paths, ui};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Action {
    CreateGroup,
    DeleteGroup,
    CreateVm,
    PlanVm,
    DeleteVm,
    StopVm,
    DeallocateVm,
    DeleteAll,
    Quit,
}

impl Action {
    const ALL: [Self; 9] = [
        Self::CreateGroup,
        Self::DeleteGroup,
        Self::CreateVm,
        Self::PlanVm,
        Self::DeleteVm,
        Self::StopVm,
        Self::DeallocateVm,
        Self::DeleteAll,
        Self::Quit,
    ];

    fn needs_vm(self) -> bool {
        matches!(
            self,
            Self::CreateVm | Self::PlanVm | Self::DeleteVm | Self::StopVm | Self::DeallocateVm
        )
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::CreateGroup => "Create resource group",
            Self::DeleteGroup => "Delete resource group",
            Self::CreateVm => "Create virtual machine",
            Self::PlanVm => "Show VM creation plan",
            Self::DeleteVm => "Delete virtual machine stack",
            Self::StopVm => "Stop virtual machine",
            Self::DeallocateVm => "Deallocate virtual machine (stop compute billing)",
            Self::DeleteAll => "Delete everything",
            Self::Quit => "Quit",
        };
        f.write_str(label)
    }
}

pub fn run(ctx: &AppContext) -> Result<()> {
    let config = choose_project(ctx)?;
    ui::header(&format!(
        "{} ({})",
        config.resource_group.name, config.resource_group.location
    ));

    loop {
        println!();
        let action = Action::ALL[ui::select("Select action", &Action::ALL)?];
        if action == Action::Quit {
            return Ok(());
        }
        if action.needs_vm() && config.vm.is_none() {
            ui::warn("This project has no [vm] section");
            continue;
        }
        if let Err(e) = perform(ctx, &config, action) {
            ui::error(&format!("{e:#}"));
        }
    }
}

fn perform(ctx: &AppContext, config: &AppConfig, action: Action) -> Result<()> {
    let prompt = ConfirmArgs::default();
    let output = OutputArgs::default();
    match action {
        Action::CreateGroup => group::create(config),
        Action::DeleteGroup => group::delete(config, prompt),
        Action::CreateVm => vm::create(ctx, config, output),
        Action::PlanVm => vm::plan(config, output),
        Action::DeleteVm => vm::delete(ctx, config, prompt, output),
        Action::StopVm => vm::stop(config),
        Action::DeallocateVm => vm::deallocate(config, prompt),
        Action::DeleteAll => delete_all(ctx, config),
        Action::Quit => Ok(()),
    }
}

/// Tear down the VM stack (if configured), then the resource group
fn delete_all(ctx: &AppContext, config: &AppConfig) -> Result<()> {
    let rg = &config.resource_group.name;
    let prompt = format!("Delete the VM stack and resource group '{rg}'?");
    if !ui::confirm(&prompt, false)? {
        ui::info("Cancelled");
        return Ok(());
    }

    let confirmed = ConfirmArgs { yes: true };
    let has_vm = config.vm.is_some();
    delete_in_order(
        || {
            if has_vm {
                vm::delete(ctx, config, confirmed, OutputArgs::default())
            } else {
                Ok(())
            }
        },
        || group::delete(config, confirmed),
    )
}

/// Run the stack teardown, then the group delete even if the teardown left
/// resources behind; the group delete removes them
fn delete_in_order(
    stack: impl FnOnce() -> Result<()>,
    group: impl FnOnce() -> Result<()>,
) -> Result<()> {
    if let Err(e) = stack() {
        ui::warn(&format!("{e:#}"));
        ui::info("Continuing with the resource group delete");
    }
    group()
}

fn choose_project(ctx: &AppContext) -> Result<AppConfig> {
    if ctx.config.is_some() || ctx.project.is_some() {
        let path = config::resolve(ctx.config.as_deref(), ctx.project.as_deref())?;
        return AppConfig::load(&path);
    }

    let dir = paths::config_dir()?;
    let projects = discover_projects(&dir)?;
    let project = match projects.as_slice() {
        [] => bail!(
            "No project configs in {}; add one or pass --config <file>",
            dir.display()
        ),
        [only] => only,
        many => {
            let names: Vec<_> = many.iter().map(|p| p.name.as_str()).collect();
            &many[ui::select("Select project", &names)?]
        }
    };
    ui::info(&format!("Project: {}", project.name));
    AppConfig::load(&project.path)
}
