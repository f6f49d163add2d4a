//! Wire types of the JiffyBox v1.0 API.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::resource::{Placement, ReferenceEntry, Resource, ResourceFlags, ResourceId};

/// Status JiffyBox reports for a box that is ready for use.
pub const STATUS_READY: &str = "READY";
/// Status JiffyBox reports for a frozen box.
pub const STATUS_FROZEN: &str = "FROZEN";

/// Hours used to turn an hourly price into a monthly one: 365 days of
/// 24 hours spread over 12 months.
pub const HOURS_PER_MONTH: f64 = 730.0;

pub(super) fn timestamp(seconds: Option<i64>) -> Option<DateTime<Utc>> {
    seconds.and_then(|secs| DateTime::from_timestamp(secs, 0))
}

/// Tariff plan.
#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
pub struct Plan {
    /// Plan identifier.
    pub id: u64,
    /// Display name.
    #[serde(default)]
    pub name: String,
    /// Number of virtual CPUs.
    #[serde(default)]
    pub cpus: u32,
    /// Memory in megabytes.
    #[serde(default, rename = "ramInMB")]
    pub ram_in_mb: u64,
    /// Disk size in megabytes.
    #[serde(default, rename = "diskSizeInMB")]
    pub disk_size_in_mb: u64,
    /// Price per running hour in euros.
    #[serde(default, rename = "pricePerHour")]
    pub price_per_hour: f64,
    /// Price per frozen hour in euros.
    #[serde(default, rename = "pricePerHourFrozen")]
    pub price_per_hour_frozen: f64,
}

impl Plan {
    /// Price of a month of uptime.
    #[must_use]
    #[expect(clippy::float_arithmetic, reason = "prices are only displayed")]
    pub fn price_per_month(&self) -> f64 {
        self.price_per_hour * HOURS_PER_MONTH
    }
}

/// Boot profile of a box.
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq)]
pub struct Profile {
    /// Profile name.
    #[serde(default)]
    pub name: String,
    /// Kernel the profile boots.
    #[serde(default)]
    pub kernel: String,
}

/// A JiffyBox server.
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct JiffyBox {
    /// Box identifier.
    pub id: u64,
    /// Box name.
    #[serde(default)]
    pub name: String,
    /// Raw status string, for example `READY` or `FROZEN`.
    #[serde(default)]
    pub status: String,
    /// Addresses keyed by network (`public`, `private`).
    #[serde(default)]
    pub ips: BTreeMap<String, Vec<String>>,
    /// Creation time as a Unix timestamp.
    #[serde(default)]
    pub created: Option<i64>,
    /// Host machine name.
    #[serde(default)]
    pub host: String,
    /// True while the box is powered on.
    #[serde(default)]
    pub running: bool,
    /// True while the box is booted into recovery mode.
    #[serde(default)]
    pub recoverymode_active: bool,
    /// True while the box is the source of a clone.
    #[serde(default)]
    pub is_being_copied: bool,
    /// True while a manual backup is in progress.
    #[serde(default)]
    pub manual_backup_running: bool,
    /// Plan the box runs on.
    #[serde(default)]
    pub plan: Plan,
    /// Boot profile, when one is active.
    #[serde(default)]
    pub active_profile: Option<Profile>,
}

impl JiffyBox {
    /// First public address.
    #[must_use]
    pub fn public_ip(&self) -> Option<&str> {
        self.ips
            .get("public")
            .and_then(|ips| ips.first())
            .map(String::as_str)
    }

    /// Creation time.
    #[must_use]
    pub fn created_at(&self) -> Option<DateTime<Utc>> {
        timestamp(self.created)
    }
}

impl From<JiffyBox> for Resource {
    fn from(jiffybox: JiffyBox) -> Self {
        Self {
            id: ResourceId(jiffybox.id),
            public_ip: jiffybox.public_ip().map(str::to_owned),
            created_at: jiffybox.created_at(),
            flags: ResourceFlags {
                locked: jiffybox.is_being_copied || jiffybox.manual_backup_running,
                running: jiffybox.running,
                frozen: jiffybox.status == STATUS_FROZEN,
            },
            status: jiffybox.status.into(),
            placement: Placement::Plan {
                plan_id: jiffybox.plan.id,
                distribution: None,
            },
            name: jiffybox.name,
        }
    }
}

impl From<Plan> for ReferenceEntry {
    fn from(plan: Plan) -> Self {
        Self::new(plan.id, plan.name)
    }
}

/// Installable distribution.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Distribution {
    /// Distribution key, for example `ubuntu_12_4_lts_64bit`.
    pub key: String,
    /// Display name.
    pub name: String,
    /// Minimum disk size in megabytes.
    pub min_disk_size_mb: u64,
    /// Kernel booted by default.
    pub default_kernel: String,
}

#[derive(Debug, Deserialize)]
pub(super) struct DistributionBody {
    #[serde(default)]
    pub(super) name: String,
    #[serde(default, rename = "minDiskSizeMB")]
    pub(super) min_disk_size_mb: u64,
    #[serde(default, rename = "defaultKernel")]
    pub(super) default_kernel: String,
}

impl From<Distribution> for ReferenceEntry {
    fn from(distribution: Distribution) -> Self {
        Self::new(distribution.key, distribution.name)
    }
}

/// One stored backup of a box.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Backup {
    /// Backup identifier.
    pub id: String,
    /// Box the backup belongs to.
    pub box_id: u64,
    /// Rotation slot: `daily`, `weekly`, or `biweekly`.
    pub key: String,
    /// Time the backup was taken.
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
pub(super) struct BackupSlot {
    pub(super) id: String,
    #[serde(default)]
    pub(super) created: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub(super) struct BackupSlots {
    #[serde(default)]
    pub(super) daily: Option<BackupSlot>,
    #[serde(default)]
    pub(super) weekly: Option<BackupSlot>,
    #[serde(default)]
    pub(super) biweekly: Option<BackupSlot>,
}

impl BackupSlots {
    pub(super) fn into_backups(self, box_id: u64) -> impl Iterator<Item = Backup> {
        [
            ("daily", self.daily),
            ("weekly", self.weekly),
            ("biweekly", self.biweekly),
        ]
        .into_iter()
        .filter_map(move |(key, slot)| {
            slot.map(|slot| Backup {
                id: slot.id,
                box_id,
                key: key.to_owned(),
                created_at: timestamp(slot.created),
            })
        })
    }
}

/// Parameters for creating a box.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct BoxSpec {
    /// Name of the new box.
    pub name: String,
    /// Plan identifier.
    #[serde(rename = "planid")]
    pub plan_id: u64,
    /// Distribution key.
    pub distribution: String,
    /// Root password.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    /// Install the account's SSH key.
    #[serde(rename = "useSSHKey")]
    pub use_ssh_key: bool,
}

/// Parameters for cloning a box.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct CloneSpec {
    /// Name of the clone.
    pub name: String,
    /// Plan for the clone.
    #[serde(rename = "planid")]
    pub plan_id: u64,
    /// Root password.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
}
