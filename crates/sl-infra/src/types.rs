use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use softlayer_api::VirtualGuest;

use crate::{Error, Result};

/// Provider-assigned virtual guest identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GuestId(pub i64);

impl fmt::Display for GuestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for GuestId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        s.trim()
            .parse::<i64>()
            .map(GuestId)
            .map_err(|_| Error::InvalidId(s.to_string()))
    }
}

/// How the `image` attribute is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageType {
    /// Stock operating system reference code, e.g. `UBUNTU_64`.
    OsCode,
    /// Global identifier of a block device template group.
    TemplateId,
}

impl ImageType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::OsCode => "os_code",
            Self::TemplateId => "template_id",
        }
    }
}

impl fmt::Display for ImageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ImageType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "os_code" => Ok(Self::OsCode),
            "template_id" => Ok(Self::TemplateId),
            other => Err(Error::Validation {
                field: "image_type",
                reason: format!("must be either 'os_code' or 'template_id', got '{other}'"),
            }),
        }
    }
}

/// Desired state of a virtual guest, assembled once per apply.
///
/// `image_type` is kept as written so that it is validated together with the
/// rest of the request in [`crate::translate`].
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct InstanceSpec {
    pub name: String,
    pub domain: String,
    pub image: String,
    #[serde(default = "default_image_type")]
    pub image_type: String,
    pub region: String,
    pub cpu: u32,
    pub ram: u32,
    #[serde(default)]
    pub disks: Vec<u32>,
    #[serde(default = "default_network_speed")]
    pub public_network_speed: u32,
    #[serde(default)]
    pub ssh_keys: Vec<i64>,
    #[serde(default)]
    pub user_data: String,
    #[serde(default)]
    pub tags: Vec<String>,
}

fn default_image_type() -> String {
    ImageType::OsCode.as_str().to_string()
}

fn default_network_speed() -> u32 {
    1000
}

/// Guest attributes as last read from the provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObservedState {
    pub hostname: String,
    pub domain: String,
    pub region: Option<String>,
    pub public_network_speed: Option<u32>,
    pub cpu: u32,
    pub ram: u32,
    pub ipv4_address: String,
    pub ipv4_address_private: String,
}

impl ObservedState {
    pub fn has_public_ip(&self) -> bool {
        !self.ipv4_address.is_empty()
    }

    pub fn connection_info(&self) -> ConnectionInfo {
        let host = if self.has_public_ip() {
            self.ipv4_address.clone()
        } else {
            self.ipv4_address_private.clone()
        };
        ConnectionInfo {
            kind: "ssh".into(),
            host,
        }
    }
}

impl From<&VirtualGuest> for ObservedState {
    fn from(guest: &VirtualGuest) -> Self {
        Self {
            hostname: guest.hostname.clone(),
            domain: guest.domain.clone(),
            region: guest.datacenter.as_ref().map(|dc| dc.name.clone()),
            public_network_speed: guest.network_components.first().map(|nc| nc.max_speed),
            cpu: guest.start_cpus,
            ram: guest.max_memory,
            ipv4_address: guest.primary_ip_address.clone(),
            ipv4_address_private: guest.primary_backend_ip_address.clone(),
        }
    }
}

/// How a provisioner (or a human) reaches the guest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionInfo {
    #[serde(rename = "type")]
    pub kind: String,
    pub host: String,
}

/// Where a tracked guest is in its lifecycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    #[default]
    Absent,
    Creating,
    Converging,
    Tagging,
    Ready,
    Updating,
    Deleting,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Absent => "absent",
            Self::Creating => "creating",
            Self::Converging => "converging",
            Self::Tagging => "tagging",
            Self::Ready => "ready",
            Self::Updating => "updating",
            Self::Deleting => "deleting",
        };
        f.write_str(s)
    }
}

/// Tracked attributes of one virtual guest resource.
///
/// `id` is the correlation key for every remote call; `None` means the guest
/// was never created or has been destroyed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VirtualServer {
    pub id: Option<GuestId>,
    pub phase: Phase,
    pub observed: Option<ObservedState>,
    pub connection: Option<ConnectionInfo>,
}

impl VirtualServer {
    /// A guest that already exists remotely, e.g. restored by the host from its own state.
    pub fn existing(id: GuestId) -> Self {
        Self {
            id: Some(id),
            phase: Phase::Ready,
            ..Self::default()
        }
    }

    pub(crate) fn forget(&mut self) {
        *self = Self::default();
    }
}
