use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ── Virtual guests ──────────────────────────────────────────────────

/// Order template accepted by `SoftLayer_Virtual_Guest::createObject`.
///
/// Exactly one of `block_device_template_group` and
/// `operating_system_reference_code` is expected to be set.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VirtualGuestTemplate {
    pub hostname: String,
    pub domain: String,
    pub hourly_billing_flag: bool,
    pub datacenter: Datacenter,
    pub start_cpus: u32,
    pub max_memory: u32,
    pub network_components: Vec<NetworkComponent>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub block_devices: Vec<BlockDevice>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub block_device_template_group: Option<BlockDeviceTemplateGroup>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub operating_system_reference_code: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub user_data: Vec<UserData>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub ssh_keys: Vec<SshKeyRef>,
}

/// A virtual guest as returned by `getObject` and sent back to `editObject`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VirtualGuest {
    pub id: i64,
    #[serde(default)]
    pub hostname: String,
    #[serde(default)]
    pub domain: String,
    #[serde(default)]
    pub start_cpus: u32,
    #[serde(default)]
    pub max_memory: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub datacenter: Option<Datacenter>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub network_components: Vec<NetworkComponent>,
    /// Empty until the provider has assigned a public address.
    #[serde(default)]
    pub primary_ip_address: String,
    #[serde(default)]
    pub primary_backend_ip_address: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub user_data: Vec<UserData>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Datacenter {
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworkComponent {
    pub max_speed: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockDevice {
    /// Device slot. Slot "1" is reserved by the provider for swap.
    pub device: String,
    pub disk_image: DiskImage,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiskImage {
    /// Capacity in GB.
    pub capacity: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockDeviceTemplateGroup {
    pub global_identifier: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserData {
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SshKeyRef {
    pub id: i64,
}

// ── Transactions ────────────────────────────────────────────────────

/// A provisioning operation the provider is still running against a guest.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    pub id: i64,
    #[serde(default)]
    pub create_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub transaction_status: Option<TransactionStatus>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransactionStatus {
    pub name: String,
}

// ── Envelopes ───────────────────────────────────────────────────────

/// Request body wrapper used by every SoftLayer REST method with arguments.
#[derive(Debug, Clone, Serialize)]
pub(crate) struct Parameters<T: Serialize> {
    pub parameters: T,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn template() -> VirtualGuestTemplate {
        VirtualGuestTemplate {
            hostname: "web01".into(),
            domain: "example.com".into(),
            hourly_billing_flag: true,
            datacenter: Datacenter {
                name: "ams01".into(),
            },
            start_cpus: 1,
            max_memory: 1024,
            network_components: vec![NetworkComponent { max_speed: 1000 }],
            block_devices: vec![],
            block_device_template_group: None,
            operating_system_reference_code: Some("UBUNTU_64".into()),
            user_data: vec![],
            ssh_keys: vec![],
        }
    }

    #[test]
    fn template_uses_provider_field_names() {
        let json = serde_json::to_value(template()).unwrap();

        assert_eq!(json["hostname"], "web01");
        assert_eq!(json["hourlyBillingFlag"], true);
        assert_eq!(json["startCpus"], 1);
        assert_eq!(json["maxMemory"], 1024);
        assert_eq!(json["datacenter"]["name"], "ams01");
        assert_eq!(json["networkComponents"][0]["maxSpeed"], 1000);
        assert_eq!(json["operatingSystemReferenceCode"], "UBUNTU_64");
    }

    #[test]
    fn empty_collections_are_omitted() {
        let json = serde_json::to_value(template()).unwrap();
        let obj = json.as_object().unwrap();

        assert!(!obj.contains_key("blockDevices"));
        assert!(!obj.contains_key("userData"));
        assert!(!obj.contains_key("sshKeys"));
        assert!(!obj.contains_key("blockDeviceTemplateGroup"));
    }

    #[test]
    fn guest_without_public_address_deserializes_empty() {
        let guest: VirtualGuest = serde_json::from_str(
            r#"{
                "id": 42,
                "hostname": "web01",
                "domain": "example.com",
                "startCpus": 2,
                "maxMemory": 2048,
                "datacenter": {"name": "ams01"},
                "networkComponents": [{"maxSpeed": 100}],
                "primaryBackendIpAddress": "10.0.0.5"
            }"#,
        )
        .unwrap();

        assert_eq!(guest.id, 42);
        assert_eq!(guest.primary_ip_address, "");
        assert_eq!(guest.primary_backend_ip_address, "10.0.0.5");
        assert_eq!(guest.network_components[0].max_speed, 100);
    }

    #[test]
    fn transaction_parses_status_and_date() {
        let tx: Transaction = serde_json::from_str(
            r#"{
                "id": 7,
                "createDate": "2024-03-01T10:00:00Z",
                "transactionStatus": {"name": "CLOUD_CONFIGURE"}
            }"#,
        )
        .unwrap();

        assert_eq!(tx.id, 7);
        assert!(tx.create_date.is_some());
        assert_eq!(tx.transaction_status.unwrap().name, "CLOUD_CONFIGURE");
    }
}
