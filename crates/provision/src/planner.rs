//! Provisioning planner - the fixed, ordered step list for one VM

use crate::error::{ProviderError, ProvisionError};
use crate::types::{
    Handle, IpAllocation, ProvisionRequest, ResourceKind, ResourceNames, ResourceRef,
    ResourceSpec, SecurityRule, VmSpec,
};
use std::collections::BTreeMap;
use std::fmt;

/// Address space of the virtual network
pub const VNET_ADDRESS_SPACE: &str = "10.0.0.0/16";
/// Address prefix of the subnet inside the virtual network
pub const SUBNET_ADDRESS_PREFIX: &str = "10.0.0.0/24";
/// Name of the NIC's single IP configuration
pub const IP_CONFIG_NAME: &str = "ipconfig1";

/// Creation order of the VM stack
pub const STEP_ORDER: [ResourceKind; 6] = [
    ResourceKind::VirtualNetwork,
    ResourceKind::Subnet,
    ResourceKind::SecurityGroup,
    ResourceKind::PublicIp,
    ResourceKind::NetworkInterface,
    ResourceKind::VirtualMachine,
];

/// Handles returned by committed steps, keyed by kind
#[derive(Debug, Default, Clone)]
pub struct Outputs {
    handles: BTreeMap<ResourceKind, Handle>,
}

impl Outputs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, kind: ResourceKind, handle: Handle) {
        self.handles.insert(kind, handle);
    }

    pub fn get(&self, kind: ResourceKind) -> Option<&Handle> {
        self.handles.get(&kind)
    }

    /// Handle of a dependency, or an error if that step has not committed
    pub fn require(&self, kind: ResourceKind) -> Result<&Handle, ProviderError> {
        self.get(kind).ok_or_else(|| {
            ProviderError::new(
                "MissingDependency",
                format!("no {} has been created yet", kind.display_name().to_lowercase()),
            )
        })
    }
}

type BuildFn<'a> = Box<dyn Fn(&Outputs) -> Result<ResourceSpec, ProviderError> + 'a>;

/// One unit of provisioning work
pub struct Step<'a> {
    pub kind: ResourceKind,
    pub name: String,
    /// Kinds whose handles `build` reads
    pub depends_on: &'static [ResourceKind],
    build: BuildFn<'a>,
}

impl<'a> Step<'a> {
    pub fn new(
        kind: ResourceKind,
        name: impl Into<String>,
        depends_on: &'static [ResourceKind],
        build: impl Fn(&Outputs) -> Result<ResourceSpec, ProviderError> + 'a,
    ) -> Self {
        Self {
            kind,
            name: name.into(),
            depends_on,
            build: Box::new(build),
        }
    }

    /// Build the creation properties from prior outputs
    pub fn build(&self, outputs: &Outputs) -> Result<ResourceSpec, ProviderError> {
        (self.build)(outputs)
    }
}

impl fmt::Debug for Step<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Step")
            .field("kind", &self.kind)
            .field("name", &self.name)
            .field("depends_on", &self.depends_on)
            .finish_non_exhaustive()
    }
}

/// Build the six steps for a VM stack
///
/// Validates the request first; a shape error is returned before anything
/// touches the cloud.
pub fn plan(request: &ProvisionRequest) -> Result<Vec<Step<'_>>, ProvisionError> {
    request.validate()?;

    let names = &request.names;
    let location = request.location.as_str();

    let vnet = Step::new(
        ResourceKind::VirtualNetwork,
        &names.virtual_network,
        &[],
        move |_| {
            Ok(ResourceSpec::VirtualNetwork {
                name: names.virtual_network.clone(),
                location: location.to_string(),
                address_prefixes: vec![VNET_ADDRESS_SPACE.to_string()],
            })
        },
    );

    let subnet = Step::new(
        ResourceKind::Subnet,
        &names.subnet,
        &[ResourceKind::VirtualNetwork],
        move |out| {
            let vnet = out.require(ResourceKind::VirtualNetwork)?;
            Ok(ResourceSpec::Subnet {
                name: names.subnet.clone(),
                virtual_network: vnet.name.clone(),
                address_prefix: SUBNET_ADDRESS_PREFIX.to_string(),
            })
        },
    );

    let nsg = Step::new(
        ResourceKind::SecurityGroup,
        &names.security_group,
        &[],
        move |_| {
            Ok(ResourceSpec::SecurityGroup {
                name: names.security_group.clone(),
                location: location.to_string(),
                rules: vec![SecurityRule::allow_ssh()],
            })
        },
    );

    let public_ip = Step::new(ResourceKind::PublicIp, &names.public_ip, &[], move |_| {
        Ok(ResourceSpec::PublicIp {
            name: names.public_ip.clone(),
            location: location.to_string(),
            allocation: IpAllocation::Dynamic,
        })
    });

    let nic = Step::new(
        ResourceKind::NetworkInterface,
        &names.network_interface,
        &[
            ResourceKind::Subnet,
            ResourceKind::PublicIp,
            ResourceKind::SecurityGroup,
        ],
        move |out| {
            Ok(ResourceSpec::NetworkInterface {
                name: names.network_interface.clone(),
                location: location.to_string(),
                ip_config_name: IP_CONFIG_NAME.to_string(),
                subnet_id: out.require(ResourceKind::Subnet)?.id.clone(),
                public_ip_id: out.require(ResourceKind::PublicIp)?.id.clone(),
                security_group_id: out.require(ResourceKind::SecurityGroup)?.id.clone(),
            })
        },
    );

    let vm = Step::new(
        ResourceKind::VirtualMachine,
        &names.vm,
        &[ResourceKind::NetworkInterface],
        move |out| {
            let nic = out.require(ResourceKind::NetworkInterface)?;
            Ok(ResourceSpec::VirtualMachine(Box::new(VmSpec {
                name: names.vm.clone(),
                location: location.to_string(),
                size: request.vm_size.clone(),
                admin_username: request.admin_username.clone(),
                ssh_public_key: request.ssh_public_key.trim().to_string(),
                authorized_keys_path: request.authorized_keys_path(),
                image: request.image.clone(),
                os_disk_type: request.os_disk_type.clone(),
                nic_id: nic.id.clone(),
            })))
        },
    );

    Ok(vec![vnet, subnet, nsg, public_ip, nic, vm])
}

/// Every resource of a VM stack in creation order
///
/// Used to tear down a stack that was not created in this process.
pub fn teardown_targets(names: &ResourceNames) -> Vec<ResourceRef> {
    vec![
        ResourceRef::new(ResourceKind::VirtualNetwork, &names.virtual_network),
        ResourceRef::child(ResourceKind::Subnet, &names.subnet, &names.virtual_network),
        ResourceRef::new(ResourceKind::SecurityGroup, &names.security_group),
        ResourceRef::new(ResourceKind::PublicIp, &names.public_ip),
        ResourceRef::new(ResourceKind::NetworkInterface, &names.network_interface),
        ResourceRef::new(ResourceKind::VirtualMachine, &names.vm),
    ]
}
