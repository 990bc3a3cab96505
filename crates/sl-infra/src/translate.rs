//! Mapping from an [`InstanceSpec`] to the provider's request shapes.
//!
//! Nothing here talks to the network; every cast and validation of the
//! declarative attributes happens in this module.

use softlayer_api::{
    BlockDevice, BlockDeviceTemplateGroup, Datacenter, DiskImage, NetworkComponent, SshKeyRef,
    UserData, VirtualGuest, VirtualGuestTemplate,
};

use crate::types::{ImageType, InstanceSpec};
use crate::{Error, Result};

/// Build the `createObject` order for `spec`.
///
/// Fails with [`crate::Error::Validation`] when `image_type` is not one of
/// the two supported modes.
pub fn guest_template(spec: &InstanceSpec) -> Result<VirtualGuestTemplate> {
    let image_type: ImageType = spec.image_type.parse()?;
    validate_tags(&spec.tags)?;

    let (block_device_template_group, operating_system_reference_code) = match image_type {
        ImageType::TemplateId => (
            Some(BlockDeviceTemplateGroup {
                global_identifier: spec.image.clone(),
            }),
            None,
        ),
        ImageType::OsCode => (None, Some(spec.image.clone())),
    };

    Ok(VirtualGuestTemplate {
        hostname: spec.name.clone(),
        domain: spec.domain.clone(),
        hourly_billing_flag: true,
        datacenter: Datacenter {
            name: spec.region.clone(),
        },
        start_cpus: spec.cpu,
        max_memory: spec.ram,
        network_components: vec![NetworkComponent {
            max_speed: spec.public_network_speed,
        }],
        block_devices: block_devices(&spec.disks),
        block_device_template_group,
        operating_system_reference_code,
        user_data: user_data(&spec.user_data),
        ssh_keys: ssh_keys(&spec.ssh_keys),
    })
}

/// Tags are sent to the provider as one comma-separated string, so a tag
/// containing a comma would silently turn into two.
pub fn validate_tags(tags: &[String]) -> Result<()> {
    match tags.iter().find(|tag| tag.contains(',')) {
        Some(tag) => Err(Error::Validation {
            field: "tags",
            reason: format!("'{tag}' contains a comma, which separates tags"),
        }),
        None => Ok(()),
    }
}

/// Device slot for the `index`-th disk. Slot "1" belongs to swap, so the
/// sequence runs 0, 2, 3, 4, ...
pub fn device_slot(index: usize) -> String {
    match index {
        0 => "0".to_string(),
        i => (i + 1).to_string(),
    }
}

pub fn block_devices(disks: &[u32]) -> Vec<BlockDevice> {
    disks
        .iter()
        .enumerate()
        .map(|(i, &capacity)| BlockDevice {
            device: device_slot(i),
            disk_image: DiskImage { capacity },
        })
        .collect()
}

pub fn ssh_keys(ids: &[i64]) -> Vec<SshKeyRef> {
    ids.iter().map(|&id| SshKeyRef { id }).collect()
}

/// An empty string is never sent as a zero-length payload.
pub fn user_data(value: &str) -> Vec<UserData> {
    if value.is_empty() {
        Vec::new()
    } else {
        vec![UserData {
            value: value.to_string(),
        }]
    }
}

/// Overwrite the mutable attributes of a fetched guest with the desired ones.
///
/// Image, region and disks are left alone; changing those means replacing
/// the guest.
pub fn apply_mutable_fields(guest: &mut VirtualGuest, spec: &InstanceSpec) {
    guest.hostname = spec.name.clone();
    guest.domain = spec.domain.clone();
    guest.start_cpus = spec.cpu;
    guest.max_memory = spec.ram;

    match guest.network_components.first_mut() {
        Some(nc) => nc.max_speed = spec.public_network_speed,
        None => guest.network_components.push(NetworkComponent {
            max_speed: spec.public_network_speed,
        }),
    }

    let user_data = user_data(&spec.user_data);
    if !user_data.is_empty() {
        guest.user_data = user_data;
    }
}
