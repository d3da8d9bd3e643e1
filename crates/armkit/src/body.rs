//! Request bodies for create-or-update calls.

use provision::{ResourceSpec, SecurityRule, VmSpec};
use serde_json::{Value, json};

pub fn resource_group(location: &str) -> Value {
    json!({ "location": location })
}

/// PUT body for one resource
pub fn resource(spec: &ResourceSpec) -> Value {
    match spec {
        ResourceSpec::VirtualNetwork {
            location,
            address_prefixes,
            ..
        } => json!({
            "location": location,
            "properties": {
                "addressSpace": { "addressPrefixes": address_prefixes }
            }
        }),
        ResourceSpec::Subnet { address_prefix, .. } => json!({
            "properties": { "addressPrefix": address_prefix }
        }),
        ResourceSpec::SecurityGroup {
            location, rules, ..
        } => json!({
            "location": location,
            "properties": {
                "securityRules": rules.iter().map(security_rule).collect::<Vec<_>>()
            }
        }),
        ResourceSpec::PublicIp {
            location,
            allocation,
            ..
        } => json!({
            "location": location,
            "properties": { "publicIPAllocationMethod": allocation.as_str() }
        }),
        ResourceSpec::NetworkInterface {
            location,
            ip_config_name,
            subnet_id,
            public_ip_id,
            security_group_id,
            ..
        } => json!({
            "location": location,
            "properties": {
                "ipConfigurations": [{
                    "name": ip_config_name,
                    "properties": {
                        "subnet": { "id": subnet_id },
                        "publicIPAddress": { "id": public_ip_id }
                    }
                }],
                "networkSecurityGroup": { "id": security_group_id }
            }
        }),
        ResourceSpec::VirtualMachine(vm) => virtual_machine(vm),
    }
}

fn security_rule(rule: &SecurityRule) -> Value {
    json!({
        "name": rule.name,
        "properties": {
            "protocol": rule.protocol,
            "direction": rule.direction,
            "access": rule.access,
            "priority": rule.priority,
            "sourceAddressPrefix": rule.source_address_prefix,
            "destinationAddressPrefix": rule.destination_address_prefix,
            "sourcePortRange": rule.source_port_range,
            "destinationPortRange": rule.destination_port_range
        }
    })
}

// Password login is disabled; the SSH key is the only way in.
fn virtual_machine(vm: &VmSpec) -> Value {
    json!({
        "location": vm.location,
        "properties": {
            "hardwareProfile": { "vmSize": vm.size },
            "storageProfile": {
                "imageReference": {
                    "publisher": vm.image.publisher,
                    "offer": vm.image.offer,
                    "sku": vm.image.sku,
                    "version": vm.image.version
                },
                "osDisk": {
                    "createOption": "FromImage",
                    "deleteOption": "Delete",
                    "managedDisk": { "storageAccountType": vm.os_disk_type }
                }
            },
            "osProfile": {
                "computerName": vm.name,
                "adminUsername": vm.admin_username,
                "linuxConfiguration": {
                    "disablePasswordAuthentication": true,
                    "ssh": {
                        "publicKeys": [{
                            "path": vm.authorized_keys_path,
                            "keyData": vm.ssh_public_key
                        }]
                    }
                }
            },
            "networkProfile": {
                "networkInterfaces": [{
                    "id": vm.nic_id,
                    "properties": { "primary": true }
                }]
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use provision::{DEFAULT_OS_DISK_TYPE, ImageReference, IpAllocation};

    #[test]
    fn test_vnet_body() {
        let body = resource(&ResourceSpec::VirtualNetwork {
            name: "vnet".into(),
            location: "eastus".into(),
            address_prefixes: vec!["10.0.0.0/16".into()],
        });
        assert_eq!(body["location"], "eastus");
        assert_eq!(
            body["properties"]["addressSpace"]["addressPrefixes"][0],
            "10.0.0.0/16"
        );
    }

    #[test]
    fn test_subnet_has_no_location() {
        let body = resource(&ResourceSpec::Subnet {
            name: "snet".into(),
            virtual_network: "vnet".into(),
            address_prefix: "10.0.0.0/24".into(),
        });
        assert!(body.get("location").is_none());
        assert_eq!(body["properties"]["addressPrefix"], "10.0.0.0/24");
    }

    #[test]
    fn test_nsg_ssh_rule() {
        let body = resource(&ResourceSpec::SecurityGroup {
            name: "nsg".into(),
            location: "eastus".into(),
            rules: vec![SecurityRule::allow_ssh()],
        });
        let rule = &body["properties"]["securityRules"][0];
        assert_eq!(rule["properties"]["destinationPortRange"], "22");
        assert_eq!(rule["properties"]["priority"], 1000);
        assert_eq!(rule["properties"]["protocol"], "Tcp");
    }

    #[test]
    fn test_public_ip_allocation() {
        let body = resource(&ResourceSpec::PublicIp {
            name: "pip".into(),
            location: "eastus".into(),
            allocation: IpAllocation::Dynamic,
        });
        assert_eq!(body["properties"]["publicIPAllocationMethod"], "Dynamic");
    }

    #[test]
    fn test_nic_wires_dependencies() {
        let body = resource(&ResourceSpec::NetworkInterface {
            name: "nic".into(),
            location: "eastus".into(),
            ip_config_name: "ipconfig1".into(),
            subnet_id: "/subnet".into(),
            public_ip_id: "/pip".into(),
            security_group_id: "/nsg".into(),
        });
        let ip = &body["properties"]["ipConfigurations"][0];
        assert_eq!(ip["name"], "ipconfig1");
        assert_eq!(ip["properties"]["subnet"]["id"], "/subnet");
        assert_eq!(ip["properties"]["publicIPAddress"]["id"], "/pip");
        assert_eq!(body["properties"]["networkSecurityGroup"]["id"], "/nsg");
    }

    #[test]
    fn test_vm_body() {
        let body = resource(&ResourceSpec::VirtualMachine(Box::new(VmSpec {
            name: "vm".into(),
            location: "eastus".into(),
            size: "Standard_B1s".into(),
            admin_username: "azureuser".into(),
            ssh_public_key: "ssh-ed25519 AAAA".into(),
            authorized_keys_path: "/home/azureuser/.ssh/authorized_keys".into(),
            image: ImageReference::default(),
            os_disk_type: DEFAULT_OS_DISK_TYPE.into(),
            nic_id: "/nic".into(),
        })));
        let props = &body["properties"];
        assert_eq!(props["hardwareProfile"]["vmSize"], "Standard_B1s");
        assert_eq!(props["storageProfile"]["imageReference"]["sku"], "22_04-lts-gen2");
        assert_eq!(
            props["storageProfile"]["osDisk"]["managedDisk"]["storageAccountType"],
            "StandardSSD_LRS"
        );
        let linux = &props["osProfile"]["linuxConfiguration"];
        assert_eq!(linux["disablePasswordAuthentication"], true);
        assert_eq!(
            linux["ssh"]["publicKeys"][0]["path"],
            "/home/azureuser/.ssh/authorized_keys"
        );
        assert_eq!(props["networkProfile"]["networkInterfaces"][0]["id"], "/nic");
    }
}
