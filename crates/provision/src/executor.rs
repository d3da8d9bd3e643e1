//! Step executor - runs the planned steps forward, one at a time

use crate::cloud::CloudApi;
use crate::compensator::rollback;
use crate::context::ProgressCallback;
use crate::error::ProviderError;
use crate::outcome::{CommittedStep, ProvisionOutcome, RollbackReport, StepFailure};
use crate::planner::{Outputs, Step};
use crate::types::ResourceKind;

/// Execute the steps against the cloud
///
/// Ensures the resource group exists, then creates each step's resource in
/// order. The first failure stops the run: nothing after it is attempted and
/// every committed step is handed to the compensator. The resource group
/// itself is never part of the rollback chain.
///
/// # Arguments
/// * `cloud` - Management API to call
/// * `resource_group` - Group that holds every resource
/// * `location` - Location used when the group has to be created
/// * `steps` - Output of [`plan`](crate::planner::plan)
/// * `progress` - Progress callback
pub fn execute<C, P>(
    cloud: &C,
    resource_group: &str,
    location: &str,
    steps: &[Step<'_>],
    progress: &mut P,
) -> ProvisionOutcome
where
    C: CloudApi + ?Sized,
    P: ProgressCallback + ?Sized,
{
    log::info!("Ensuring resource group '{resource_group}' exists in {location}");
    if let Err(error) = cloud.ensure_resource_group(resource_group, location) {
        log::error!("Resource group '{resource_group}' could not be ensured: {error}");
        return ProvisionOutcome::Failure {
            failure: StepFailure {
                kind: ResourceKind::ResourceGroup,
                name: resource_group.to_string(),
                error,
            },
            rollback: RollbackReport::default(),
        };
    }

    let total = steps.len();
    let mut outputs = Outputs::new();
    let mut committed: Vec<CommittedStep> = Vec::with_capacity(total);

    for (index, step) in steps.iter().enumerate() {
        progress.on_step_start(index + 1, total, step.kind, &step.name);
        log::info!("[{}/{}] Creating {} '{}'", index + 1, total, step.kind, step.name);

        let created = step.build(&outputs).and_then(|spec| {
            cloud
                .create_or_update(resource_group, &spec)
                .map(|handle| (spec.target(), handle))
        });

        match created {
            Ok((target, handle)) => {
                progress.on_step_complete(step.kind, &step.name, Ok(&handle));
                log::debug!("Committed {} '{}' as {}", step.kind, step.name, handle.id);

                outputs.insert(step.kind, handle.clone());
                committed.push(CommittedStep {
                    kind: step.kind,
                    name: step.name.clone(),
                    target,
                    handle,
                });
            }
            Err(error) => {
                progress.on_step_complete(step.kind, &step.name, Err(&error));
                log::error!("Creating {} '{}' failed: {error}", step.kind, step.name);
                log::warn!("Rolling back {} committed resource(s)", committed.len());

                let report = rollback(cloud, resource_group, &committed, progress);

                return ProvisionOutcome::Failure {
                    failure: StepFailure {
                        kind: step.kind,
                        name: step.name.clone(),
                        error,
                    },
                    rollback: report,
                };
            }
        }
    }

    match committed.last() {
        Some(last) if last.kind == ResourceKind::VirtualMachine => ProvisionOutcome::Success {
            vm: last.handle.clone(),
            committed,
        },
        _ => {
            // A plan without a trailing VM step is a caller bug; unwind it too.
            let report = rollback(cloud, resource_group, &committed, progress);
            ProvisionOutcome::Failure {
                failure: StepFailure {
                    kind: ResourceKind::VirtualMachine,
                    name: String::new(),
                    error: ProviderError::new(
                        "ConfigurationError",
                        "plan does not end with a virtual machine step",
                    ),
                },
                rollback: report,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::NoProgress;
    use crate::planner::plan;
    use crate::types::tests::sample_request;
    use crate::types::{Handle, ResourceRef, ResourceSpec};
    use std::cell::RefCell;

    /// Cloud whose resource group call always fails
    struct NoGroupCloud {
        creates: RefCell<usize>,
    }

    impl CloudApi for NoGroupCloud {
        fn ensure_resource_group(&self, _: &str, _: &str) -> Result<Handle, ProviderError> {
            Err(ProviderError::new("AuthorizationFailed", "no access"))
        }
        fn delete_resource_group(&self, _: &str) -> Result<(), ProviderError> {
            Ok(())
        }
        fn create_or_update(&self, _: &str, spec: &ResourceSpec) -> Result<Handle, ProviderError> {
            *self.creates.borrow_mut() += 1;
            Ok(Handle::new(spec.name(), spec.name()))
        }
        fn delete(&self, _: &str, _: &ResourceRef) -> Result<(), ProviderError> {
            Ok(())
        }
        fn power_off(&self, _: &str, _: &str) -> Result<(), ProviderError> {
            Ok(())
        }
        fn deallocate(&self, _: &str, _: &str) -> Result<(), ProviderError> {
            Ok(())
        }
    }

    #[test]
    fn test_resource_group_failure_creates_nothing() {
        let request = sample_request();
        let steps = plan(&request).unwrap();
        let cloud = NoGroupCloud {
            creates: RefCell::new(0),
        };

        let outcome = execute(&cloud, "rg", "eastus", &steps, &mut NoProgress);

        assert_eq!(*cloud.creates.borrow(), 0);
        match outcome {
            ProvisionOutcome::Failure { failure, rollback } => {
                assert_eq!(failure.kind, ResourceKind::ResourceGroup);
                assert_eq!(failure.error.code, "AuthorizationFailed");
                assert!(rollback.is_empty());
            }
            ProvisionOutcome::Success { .. } => panic!("expected failure"),
        }
    }

    #[test]
    fn test_truncated_plan_is_unwound() {
        let request = sample_request();
        let mut steps = plan(&request).unwrap();
        steps.truncate(1);
        let cloud = crate::compensator::tests::RecordingCloud::default();

        let outcome = execute(&cloud, "rg", "eastus", &steps, &mut NoProgress);

        assert!(!outcome.is_success());
        assert_eq!(cloud.deletes(), vec!["vnet-mlops".to_string()]);
    }
}
