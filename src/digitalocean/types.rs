//! Wire types of the DigitalOcean v1 API.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::resource::{Placement, ReferenceEntry, Resource, ResourceFlags, ResourceId};

/// Status DigitalOcean reports once a droplet has booted.
pub const STATUS_ACTIVE: &str = "active";

/// Droplet as returned by `droplets/` and `droplets/{id}`.
///
/// The create endpoint returns a partial droplet, so every field except the
/// id defaults when absent.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq)]
pub struct Droplet {
    /// Droplet identifier.
    pub id: u64,
    /// Droplet name.
    #[serde(default)]
    pub name: String,
    /// Image the droplet was built from.
    #[serde(default)]
    pub image_id: u64,
    /// Size identifier.
    #[serde(default)]
    pub size_id: u64,
    /// Region identifier.
    #[serde(default)]
    pub region_id: u64,
    /// Whether automatic backups are enabled.
    #[serde(default)]
    pub backups_active: bool,
    /// Public IPv4 address.
    #[serde(default)]
    pub ip_address: Option<String>,
    /// Private IPv4 address.
    #[serde(default)]
    pub private_ip_address: Option<String>,
    /// True while an event is being processed.
    #[serde(default)]
    pub locked: bool,
    /// Raw status string; empty on freshly created droplets.
    #[serde(default)]
    pub status: String,
    /// Creation time.
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

impl From<Droplet> for Resource {
    fn from(droplet: Droplet) -> Self {
        let status = if droplet.status.is_empty() {
            String::from("new")
        } else {
            droplet.status
        };
        Self {
            id: ResourceId(droplet.id),
            name: droplet.name,
            flags: ResourceFlags {
                locked: droplet.locked,
                running: status == STATUS_ACTIVE,
                frozen: false,
            },
            status: status.into(),
            public_ip: droplet.ip_address.filter(|ip| !ip.is_empty()),
            created_at: droplet.created_at,
            placement: Placement::Droplet {
                region_id: droplet.region_id,
                size_id: droplet.size_id,
                image_id: droplet.image_id,
            },
        }
    }
}

#[derive(Debug, Deserialize)]
pub(super) struct DropletList {
    pub(super) droplets: Vec<Droplet>,
}

#[derive(Debug, Deserialize)]
pub(super) struct SingleDroplet {
    pub(super) droplet: Droplet,
}

/// Acknowledgement of an asynchronous droplet event.
#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, PartialEq)]
pub struct EventAck {
    /// Identifier of the queued event, when reported.
    #[serde(default)]
    pub event_id: Option<u64>,
}

/// Entry of the region, size, or image catalogue.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq)]
pub struct CatalogueEntry {
    /// Numeric identifier.
    pub id: u64,
    /// Display name.
    pub name: String,
    /// Short machine name, when the catalogue has one.
    #[serde(default)]
    pub slug: Option<String>,
    /// Distribution family (images only).
    #[serde(default)]
    pub distribution: Option<String>,
}

impl From<CatalogueEntry> for ReferenceEntry {
    fn from(entry: CatalogueEntry) -> Self {
        Self::new(entry.id, entry.name)
    }
}

#[derive(Debug, Deserialize)]
pub(super) struct Catalogue {
    #[serde(alias = "regions", alias = "sizes", alias = "images")]
    pub(super) entries: Vec<CatalogueEntry>,
}

/// Parameters for `droplets/new`.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct DropletSpec {
    /// Name of the new droplet.
    pub name: String,
    /// Size identifier.
    pub size_id: u64,
    /// Image identifier.
    pub image_id: u64,
    /// Region identifier.
    pub region_id: u64,
    /// SSH key to install.
    #[serde(rename = "ssh_key_ids", skip_serializing_if = "Option::is_none")]
    pub ssh_key_id: Option<u64>,
}
