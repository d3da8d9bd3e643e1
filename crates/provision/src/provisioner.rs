//! Entry points tying credentials, planning and execution together

use crate::cloud::CloudApi;
use crate::compensator;
use crate::context::ProgressCallback;
use crate::credential::{Credential, CredentialProvider};
use crate::error::{ProvisionError, Result};
use crate::executor;
use crate::outcome::{ProvisionOutcome, RollbackReport};
use crate::planner::plan;
use crate::types::{Handle, ProvisionRequest, ResourceNames, check_name};

/// Provisioning operations bound to one cloud client
pub struct Provisioner<C> {
    cloud: C,
}

impl<C: CloudApi> Provisioner<C> {
    /// Wrap an already-authenticated client
    pub fn new(cloud: C) -> Self {
        Self { cloud }
    }

    /// Acquire a credential, then build the client with it
    ///
    /// A credential failure aborts here, before any resource is touched.
    pub fn connect<P, F>(credentials: &P, build: F) -> Result<Self>
    where
        P: CredentialProvider + ?Sized,
        F: FnOnce(Credential) -> C,
    {
        let credential = credentials
            .get_credential()
            .map_err(ProvisionError::Credential)?;
        log::debug!("Acquired credential {credential:?}");
        Ok(Self::new(build(credential)))
    }

    pub fn cloud(&self) -> &C {
        &self.cloud
    }

    /// Run the VM provisioning transaction
    ///
    /// `Err` means nothing was attempted (invalid request). Creation failures
    /// come back as [`ProvisionOutcome::Failure`] after rollback.
    pub fn provision<P>(
        &self,
        request: &ProvisionRequest,
        progress: &mut P,
    ) -> Result<ProvisionOutcome>
    where
        P: ProgressCallback + ?Sized,
    {
        let steps = plan(request)?;
        Ok(executor::execute(
            &self.cloud,
            &request.resource_group,
            &request.location,
            &steps,
            progress,
        ))
    }

    /// Delete a VM stack by name, in reverse dependency order
    pub fn teardown<P>(
        &self,
        resource_group: &str,
        names: &ResourceNames,
        progress: &mut P,
    ) -> Result<RollbackReport>
    where
        P: ProgressCallback + ?Sized,
    {
        check_name("resource_group.name", resource_group)?;
        names.validate()?;
        Ok(compensator::teardown(&self.cloud, resource_group, names, progress))
    }

    /// Create the resource group if missing (idempotent)
    pub fn ensure_resource_group(&self, name: &str, location: &str) -> Result<Handle> {
        check_name("resource_group.name", name)?;
        if location.trim().is_empty() {
            return Err(ProvisionError::config(
                "resource_group.location",
                "must not be empty",
            ));
        }
        log::info!("Ensuring resource group '{name}' in {location}");
        self.cloud
            .ensure_resource_group(name, location)
            .map_err(|e| ProvisionError::provider(format!("create resource group '{name}'"), e))
    }

    /// Delete the resource group and everything in it
    pub fn delete_resource_group(&self, name: &str) -> Result<()> {
        check_name("resource_group.name", name)?;
        log::info!("Deleting resource group '{name}'");
        self.cloud
            .delete_resource_group(name)
            .map_err(|e| ProvisionError::provider(format!("delete resource group '{name}'"), e))
    }

    /// Power off a VM (graceful shutdown, compute stays allocated)
    pub fn stop_vm(&self, resource_group: &str, vm: &str) -> Result<()> {
        check_name("resource_group.name", resource_group)?;
        check_name("vm.name", vm)?;
        log::info!("Powering off VM '{vm}'");
        self.cloud
            .power_off(resource_group, vm)
            .map_err(|e| ProvisionError::provider(format!("stop VM '{vm}'"), e))
    }

    /// Deallocate a VM (releases compute, stops billing)
    pub fn deallocate_vm(&self, resource_group: &str, vm: &str) -> Result<()> {
        check_name("resource_group.name", resource_group)?;
        check_name("vm.name", vm)?;
        log::info!("Deallocating VM '{vm}'");
        self.cloud
            .deallocate(resource_group, vm)
            .map_err(|e| ProvisionError::provider(format!("deallocate VM '{vm}'"), e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compensator::tests::RecordingCloud;
    use crate::context::NoProgress;
    use crate::error::ProviderError;
    use crate::types::tests::sample_request;

    #[test]
    fn test_credential_failure_aborts_before_build() {
        let provider = || -> std::result::Result<Credential, ProviderError> {
            Err(ProviderError::new("CredentialUnavailable", "no login found"))
        };
        let mut built = false;

        let result = Provisioner::connect(&provider, |_| {
            built = true;
            RecordingCloud::default()
        });

        assert!(matches!(result, Err(ProvisionError::Credential(_))));
        assert!(!built);
    }

    #[test]
    fn test_invalid_request_is_config_error() {
        let provisioner = Provisioner::new(RecordingCloud::default());
        let mut request = sample_request();
        request.ssh_public_key = String::new();

        let err = provisioner
            .provision(&request, &mut NoProgress)
            .unwrap_err();
        assert!(matches!(err, ProvisionError::Configuration { .. }));
        assert!(provisioner.cloud().deletes().is_empty());
    }

    #[test]
    fn test_provision_success() {
        let provisioner = Provisioner::new(RecordingCloud::default());
        let outcome = provisioner
            .provision(&sample_request(), &mut NoProgress)
            .unwrap();
        let vm = outcome.into_result().unwrap();
        assert_eq!(vm.name, "vm-mlops");
    }

    #[test]
    fn test_ensure_resource_group_validates_location() {
        let provisioner = Provisioner::new(RecordingCloud::default());
        assert!(provisioner.ensure_resource_group("rg", " ").is_err());
        assert!(provisioner.ensure_resource_group("rg", "eastus").is_ok());
    }
}
