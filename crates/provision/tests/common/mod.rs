//! In-memory cloud used by the integration tests

#![allow(dead_code)]

use provision::{
    CloudApi, Handle, ImageReference, ProviderError, ProvisionRequest, ResourceKind,
    ResourceNames, ResourceRef, ResourceSpec, DEFAULT_OS_DISK_TYPE,
};
use std::cell::RefCell;
use std::collections::{BTreeMap, HashMap};

/// A call observed by the fake
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    EnsureGroup(String),
    Create(ResourceKind, String),
    Delete(ResourceKind, String),
}

/// Fake management API
///
/// Keeps created resources in a map so repeated group ensures return the
/// same handle, and can be told to fail a create by kind or a delete by name.
#[derive(Default)]
pub struct FakeCloud {
    calls: RefCell<Vec<Call>>,
    groups: RefCell<BTreeMap<String, Handle>>,
    resources: RefCell<BTreeMap<(ResourceKind, String), Handle>>,
    fail_create: HashMap<ResourceKind, ProviderError>,
    fail_delete: HashMap<String, ProviderError>,
}

impl FakeCloud {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_create(mut self, kind: ResourceKind, error: ProviderError) -> Self {
        self.fail_create.insert(kind, error);
        self
    }

    pub fn fail_delete(mut self, name: &str, error: ProviderError) -> Self {
        self.fail_delete.insert(name.to_string(), error);
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.borrow().clone()
    }

    pub fn creates(&self) -> Vec<ResourceKind> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::Create(kind, _) => Some(kind),
                _ => None,
            })
            .collect()
    }

    pub fn deletes(&self) -> Vec<ResourceKind> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::Delete(kind, _) => Some(kind),
                _ => None,
            })
            .collect()
    }

    /// Resources that still exist
    pub fn live(&self) -> Vec<ResourceKind> {
        self.resources.borrow().keys().map(|(k, _)| *k).collect()
    }

    pub fn group_count(&self) -> usize {
        self.groups.borrow().len()
    }
}

impl CloudApi for FakeCloud {
    fn ensure_resource_group(&self, name: &str, _location: &str) -> Result<Handle, ProviderError> {
        self.calls.borrow_mut().push(Call::EnsureGroup(name.to_string()));
        let handle = self
            .groups
            .borrow_mut()
            .entry(name.to_string())
            .or_insert_with(|| {
                Handle::new(format!("/subscriptions/sub/resourceGroups/{name}"), name)
            })
            .clone();
        Ok(handle)
    }

    fn delete_resource_group(&self, name: &str) -> Result<(), ProviderError> {
        match self.groups.borrow_mut().remove(name) {
            Some(_) => Ok(()),
            None => Err(ProviderError::new("ResourceGroupNotFound", name)),
        }
    }

    fn create_or_update(
        &self,
        resource_group: &str,
        spec: &ResourceSpec,
    ) -> Result<Handle, ProviderError> {
        let kind = spec.kind();
        self.calls
            .borrow_mut()
            .push(Call::Create(kind, spec.name().to_string()));

        if let Some(err) = self.fail_create.get(&kind) {
            return Err(err.clone());
        }

        let handle = Handle::new(
            format!("/subscriptions/sub/resourceGroups/{resource_group}/{kind}/{}", spec.name()),
            spec.name(),
        );
        self.resources
            .borrow_mut()
            .insert((kind, spec.name().to_string()), handle.clone());
        Ok(handle)
    }

    fn delete(&self, _resource_group: &str, target: &ResourceRef) -> Result<(), ProviderError> {
        self.calls
            .borrow_mut()
            .push(Call::Delete(target.kind, target.name.clone()));

        if let Some(err) = self.fail_delete.get(&target.name) {
            return Err(err.clone());
        }

        let removed = self
            .resources
            .borrow_mut()
            .remove(&(target.kind, target.name.clone()));

        if target.kind == ResourceKind::VirtualNetwork {
            // Subnets go away with their parent network
            self.resources.borrow_mut().retain(|(kind, _), _| *kind != ResourceKind::Subnet);
        }

        match removed {
            Some(_) => Ok(()),
            None => Err(ProviderError::new("ResourceNotFound", target.name.clone())),
        }
    }

    fn power_off(&self, _resource_group: &str, _vm: &str) -> Result<(), ProviderError> {
        Ok(())
    }

    fn deallocate(&self, _resource_group: &str, _vm: &str) -> Result<(), ProviderError> {
        Ok(())
    }
}

pub fn request() -> ProvisionRequest {
    ProvisionRequest {
        subscription_id: "sub".into(),
        resource_group: "rg-test".into(),
        location: "eastus".into(),
        vm_size: "Standard_B1s".into(),
        admin_username: "azureuser".into(),
        ssh_public_key: "ssh-ed25519 AAAAC3NzaC1lZDI1NTE5AAAAITest test@example".into(),
        names: ResourceNames {
            virtual_network: "vnet-test".into(),
            subnet: "snet-test".into(),
            security_group: "nsg-test".into(),
            public_ip: "pip-test".into(),
            network_interface: "nic-test".into(),
            vm: "vm-test".into(),
        },
        image: ImageReference::default(),
        os_disk_type: DEFAULT_OS_DISK_TYPE.into(),
    }
}
