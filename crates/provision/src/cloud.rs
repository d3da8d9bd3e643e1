//! Cloud management API seam
//!
//! The transaction only talks to the provider through [`CloudApi`], so the
//! execute-forward / compensate-backward protocol can be exercised against an
//! in-memory fake as easily as against Azure Resource Manager.

use crate::error::ProviderError;
use crate::types::{Handle, ResourceRef, ResourceSpec};

/// Management operations the provisioning transaction needs
///
/// Every method blocks until the provider reports a terminal state for the
/// underlying long-running operation.
pub trait CloudApi {
    /// Create or update a resource group. Idempotent: repeating the call with
    /// the same parameters returns the same handle.
    fn ensure_resource_group(&self, name: &str, location: &str) -> Result<Handle, ProviderError>;

    /// Delete a resource group and everything in it
    fn delete_resource_group(&self, name: &str) -> Result<(), ProviderError>;

    /// Create or update one resource inside a resource group
    fn create_or_update(
        &self,
        resource_group: &str,
        spec: &ResourceSpec,
    ) -> Result<Handle, ProviderError>;

    /// Delete one resource inside a resource group
    fn delete(&self, resource_group: &str, target: &ResourceRef) -> Result<(), ProviderError>;

    /// Power off a virtual machine (compute still allocated)
    fn power_off(&self, resource_group: &str, vm: &str) -> Result<(), ProviderError>;

    /// Deallocate a virtual machine (compute released, billing stops)
    fn deallocate(&self, resource_group: &str, vm: &str) -> Result<(), ProviderError>;
}

impl<T: CloudApi + ?Sized> CloudApi for &T {
    fn ensure_resource_group(&self, name: &str, location: &str) -> Result<Handle, ProviderError> {
        (**self).ensure_resource_group(name, location)
    }

    fn delete_resource_group(&self, name: &str) -> Result<(), ProviderError> {
        (**self).delete_resource_group(name)
    }

    fn create_or_update(
        &self,
        resource_group: &str,
        spec: &ResourceSpec,
    ) -> Result<Handle, ProviderError> {
        (**self).create_or_update(resource_group, spec)
    }

    fn delete(&self, resource_group: &str, target: &ResourceRef) -> Result<(), ProviderError> {
        (**self).delete(resource_group, target)
    }

    fn power_off(&self, resource_group: &str, vm: &str) -> Result<(), ProviderError> {
        (**self).power_off(resource_group, vm)
    }

    fn deallocate(&self, resource_group: &str, vm: &str) -> Result<(), ProviderError> {
        (**self).deallocate(resource_group, vm)
    }
}
