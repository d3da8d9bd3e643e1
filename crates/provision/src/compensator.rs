//! Compensator - unwinds created resources in reverse dependency order

use crate::cloud::CloudApi;
use crate::context::ProgressCallback;
use crate::outcome::{CommittedStep, RollbackEntry, RollbackReport, RollbackStatus};
use crate::planner::teardown_targets;
use crate::types::{ResourceKind, ResourceNames, ResourceRef};

/// Why subnets never get an explicit delete
pub const SUBNET_SKIP_REASON: &str = "deleted together with its virtual network";

/// Undo committed steps, last created first
///
/// Every entry is attempted even if an earlier delete failed; the report
/// records each result independently.
pub fn rollback<C, P>(
    cloud: &C,
    resource_group: &str,
    committed: &[CommittedStep],
    progress: &mut P,
) -> RollbackReport
where
    C: CloudApi + ?Sized,
    P: ProgressCallback + ?Sized,
{
    unwind(
        cloud,
        resource_group,
        committed.iter().map(|c| &c.target),
        progress,
    )
}

/// Delete a whole VM stack by name, VM first and virtual network last
pub fn teardown<C, P>(
    cloud: &C,
    resource_group: &str,
    names: &ResourceNames,
    progress: &mut P,
) -> RollbackReport
where
    C: CloudApi + ?Sized,
    P: ProgressCallback + ?Sized,
{
    let targets = teardown_targets(names);
    unwind(cloud, resource_group, targets.iter(), progress)
}

/// Delete `targets` (given in creation order) in reverse
fn unwind<'a, C, P, I>(
    cloud: &C,
    resource_group: &str,
    targets: I,
    progress: &mut P,
) -> RollbackReport
where
    C: CloudApi + ?Sized,
    P: ProgressCallback + ?Sized,
    I: DoubleEndedIterator<Item = &'a ResourceRef> + ExactSizeIterator,
{
    let mut report = RollbackReport::default();
    progress.on_rollback_start(targets.len());

    for target in targets.rev() {
        let status = if target.kind == ResourceKind::Subnet {
            log::debug!("Skipping subnet '{}': {SUBNET_SKIP_REASON}", target.name);
            RollbackStatus::Skipped {
                reason: SUBNET_SKIP_REASON.to_string(),
            }
        } else {
            progress.on_delete_start(target.kind, &target.name);
            log::info!("Deleting {} '{}'", target.kind, target.name);
            delete_one(cloud, resource_group, target)
        };

        let entry = RollbackEntry {
            kind: target.kind,
            name: target.name.clone(),
            status,
        };
        progress.on_rollback_entry(&entry);
        report.push(entry);
    }

    if report.is_clean() {
        log::info!("Rollback complete");
    } else {
        log::warn!(
            "Rollback finished with {} leftover resource(s)",
            report.failed().count()
        );
    }

    report
}

fn delete_one<C: CloudApi + ?Sized>(
    cloud: &C,
    resource_group: &str,
    target: &ResourceRef,
) -> RollbackStatus {
    match cloud.delete(resource_group, target) {
        Ok(()) => RollbackStatus::Deleted,
        Err(error) if error.is_not_found() => {
            log::debug!("{} '{}' was already gone", target.kind, target.name);
            RollbackStatus::AlreadyAbsent
        }
        Err(error) => {
            log::warn!("Failed to delete {} '{}': {error}", target.kind, target.name);
            RollbackStatus::Failed { error }
        }
    }
}
