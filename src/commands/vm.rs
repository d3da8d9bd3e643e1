//! Virtual machine commands

use anyhow::{Result, bail};
use colored::Colorize;
use provision::{ProvisionOutcome, ProvisionRequest, ResourceKind, plan as plan_steps};
use serde::Serialize;

use crate::Context as AppContext;
use crate::cli::{ConfirmArgs, OutputArgs};
use crate::commands::{advise, connect, explain, print_json, print_report};
use crate::config::AppConfig;
use crate::progress::Spinners;
use crate::ui;

/// Create the VM stack as one transaction
pub fn create(ctx: &AppContext, config: &AppConfig, output: OutputArgs) -> Result<()> {
    let request = config.to_request()?;
    // Reject bad input before authenticating
    request.validate()?;

    if !output.json {
        print_request(&request);
    }

    let session = connect(config)?;
    let mut progress = Spinners::new(ctx.quiet || output.json);
    let outcome = session.provision(&request, &mut progress)?;

    if output.json {
        print_json(&outcome)?;
    }

    match outcome {
        ProvisionOutcome::Success { vm, .. } => {
            if !output.json {
                println!();
                ui::success(&format!("VM '{}' is ready", vm.name));
                ui::kv("id", &vm.id);
                ui::dim(&format!(
                    "Connect with: ssh {}@<address of public IP '{}'>",
                    request.admin_username, request.names.public_ip
                ));
            }
            Ok(())
        }
        ProvisionOutcome::Failure { failure, rollback } => {
            if !output.json {
                println!();
                ui::error(&failure.to_string());
                advise(&failure.error);
                print_report("Cleanup", &rollback);
            }
            bail!("VM provisioning failed: {}", failure.error)
        }
    }
}

/// Delete the VM stack, newest resource first
pub fn delete(
    ctx: &AppContext,
    config: &AppConfig,
    args: ConfirmArgs,
    output: OutputArgs,
) -> Result<()> {
    let names = config.names()?;
    let rg = &config.resource_group.name;

    if !output.json {
        ui::header(&format!("Delete VM stack '{}'", names.vm));
        ui::kv("resource group", rg);
    }

    let prompt = format!("Delete VM '{}' and its network resources?", names.vm);
    if !ui::confirm(&prompt, args.yes)? {
        ui::info("Cancelled");
        return Ok(());
    }

    let session = connect(config)?;
    let mut progress = Spinners::new(ctx.quiet || output.json);
    let report = session
        .teardown(rg, &names, &mut progress)
        .map_err(explain)?;

    if output.json {
        print_json(&report)?;
    } else {
        print_report("Summary", &report);
    }

    if let Err(partial) = report.check() {
        bail!("{partial}");
    }
    if !output.json {
        ui::success(&format!("VM stack '{}' deleted", names.vm));
    }
    Ok(())
}

pub fn stop(config: &AppConfig) -> Result<()> {
    let vm = config.vm_name()?;
    ui::info(&format!("Powering off VM '{vm}' (compute stays allocated)"));

    let session = connect(config)?;
    session
        .stop_vm(&config.resource_group.name, vm)
        .map_err(explain)?;

    ui::success(&format!("VM '{vm}' stopped"));
    ui::dim("Run 'azprov vm deallocate' to stop compute billing");
    Ok(())
}

pub fn deallocate(config: &AppConfig, args: ConfirmArgs) -> Result<()> {
    let vm = config.vm_name()?;
    let prompt = format!("Deallocate VM '{vm}'? Its dynamic public IP will be released.");
    if !ui::confirm(&prompt, args.yes)? {
        ui::info("Cancelled");
        return Ok(());
    }

    let session = connect(config)?;
    session
        .deallocate_vm(&config.resource_group.name, vm)
        .map_err(explain)?;

    ui::success(&format!("VM '{vm}' deallocated"));
    Ok(())
}

#[derive(Serialize)]
struct PlannedStep<'a> {
    index: usize,
    kind: ResourceKind,
    name: &'a str,
    depends_on: &'a [ResourceKind],
}

/// Show the creation steps without touching Azure
pub fn plan(config: &AppConfig, output: OutputArgs) -> Result<()> {
    let request = config.to_request()?;
    let steps = plan_steps(&request)?;

    let planned: Vec<_> = steps
        .iter()
        .enumerate()
        .map(|(i, step)| PlannedStep {
            index: i + 1,
            kind: step.kind,
            name: &step.name,
            depends_on: step.depends_on,
        })
        .collect();

    if output.json {
        return print_json(&planned);
    }

    print_request(&request);
    ui::section("Steps");
    for step in &planned {
        let deps = if step.depends_on.is_empty() {
            String::new()
        } else {
            let labels: Vec<_> = step.depends_on.iter().map(ResourceKind::label).collect();
            format!(" (after {})", labels.join(", ")).dimmed().to_string()
        };
        ui::step(
            step.index,
            planned.len(),
            &format!("{} {}{deps}", step.kind.display_name(), step.name.bold()),
        );
    }
    println!();
    ui::dim("On failure, created resources are deleted in reverse order.");
    Ok(())
}

fn print_request(request: &ProvisionRequest) {
    ui::header(&format!("VM '{}'", request.names.vm));
    ui::kv("resource group", &request.resource_group);
    ui::kv("location", &request.location);
    ui::kv("size", &request.vm_size);
    ui::kv(
        "image",
        &format!(
            "{}:{}:{}:{}",
            request.image.publisher, request.image.offer, request.image.sku, request.image.version
        ),
    );
    ui::kv("admin", &request.admin_username);
}
