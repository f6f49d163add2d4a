//! Provider-neutral resource snapshots and the vocabulary shared by the
//! lifecycle orchestrator and the provider backends.

use std::fmt;
use std::ops::Deref;

use chrono::{DateTime, Utc};

/// Opaque numeric identifier assigned by the provider.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct ResourceId(pub u64);

impl ResourceId {
    /// Returns the raw numeric identifier.
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl From<u64> for ResourceId {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

impl fmt::Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

macro_rules! string_newtype {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Debug, Eq, Hash, PartialEq)]
        pub struct $name(String);

        impl $name {
            /// Wraps a raw value.
            #[must_use]
            pub fn new(value: impl Into<String>) -> Self {
                Self(value.into())
            }

            /// Borrows the raw value.
            #[must_use]
            pub const fn as_str(&self) -> &str {
                self.0.as_str()
            }
        }

        impl From<String> for $name {
            fn from(value: String) -> Self {
                Self(value)
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self(value.to_owned())
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                self.as_str()
            }
        }

        impl Deref for $name {
            type Target = str;
            fn deref(&self) -> &Self::Target {
                self.as_str()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }
    };
}

string_newtype!(
    /// Status string reported by a provider. The vocabulary is open and
    /// provider-defined (`new`, `active`, `off`, `READY`, `FROZEN`, ...).
    ResourceStatus
);

string_newtype!(
    /// Identifier of a reference-data entry. DigitalOcean uses numeric ids,
    /// JiffyBox distributions use string keys.
    ReferenceId
);

impl From<u64> for ReferenceId {
    fn from(value: u64) -> Self {
        Self(value.to_string())
    }
}

/// Boolean state flags reported alongside the status string.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct ResourceFlags {
    /// The provider is processing an event and rejects further changes.
    pub locked: bool,
    /// The machine is currently powered on.
    pub running: bool,
    /// The machine is frozen (JiffyBox only).
    pub frozen: bool,
}

/// The catalogue entries a resource was provisioned from.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Placement {
    /// DigitalOcean droplet placement.
    Droplet {
        /// Region identifier.
        region_id: u64,
        /// Size identifier.
        size_id: u64,
        /// Image identifier.
        image_id: u64,
    },
    /// JiffyBox plan-based placement.
    Plan {
        /// Plan identifier.
        plan_id: u64,
        /// Distribution key when known.
        distribution: Option<String>,
    },
}

/// Snapshot of a remote resource as last reported by its provider.
///
/// Snapshots are never updated locally; every observation is a fresh fetch.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Resource {
    /// Provider identifier.
    pub id: ResourceId,
    /// Display name.
    pub name: String,
    /// Raw status string.
    pub status: ResourceStatus,
    /// Locked/running/frozen flags.
    pub flags: ResourceFlags,
    /// Public address, once the provider has assigned one.
    pub public_ip: Option<String>,
    /// Creation time when reported.
    pub created_at: Option<DateTime<Utc>>,
    /// Catalogue references used to build the resource.
    pub placement: Placement,
}

/// Condition a poll loop waits for.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum WaitGoal {
    /// The resource is reachable and usable.
    Ready,
    /// The resource has been archived, powered off for good, or removed.
    Archived,
}

impl fmt::Display for WaitGoal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Ready => "ready",
            Self::Archived => "archived",
        })
    }
}

/// Kinds of lifecycle transition a backend may support.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum TransitionKind {
    /// Provision a new resource.
    Create,
    /// Destroy a resource.
    Destroy,
    /// Reinstall a resource from an image.
    Rebuild,
    /// Power a resource off.
    Shutdown,
    /// Power a resource on with a plan.
    Start,
    /// Freeze a stopped resource.
    Freeze,
    /// Thaw a frozen resource onto a plan.
    Thaw,
    /// Clone a resource.
    Clone,
}

impl TransitionKind {
    /// Lower-case name used in logs and error messages.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Create => "create",
            Self::Destroy => "destroy",
            Self::Rebuild => "rebuild",
            Self::Shutdown => "shutdown",
            Self::Start => "start",
            Self::Freeze => "freeze",
            Self::Thaw => "thaw",
            Self::Clone => "clone",
        }
    }
}

impl fmt::Display for TransitionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Reference-data catalogues served by providers.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum ReferenceKind {
    /// DigitalOcean regions.
    Region,
    /// DigitalOcean droplet sizes.
    Size,
    /// DigitalOcean images.
    Image,
    /// JiffyBox plans.
    Plan,
    /// JiffyBox distributions.
    Distribution,
}

impl ReferenceKind {
    /// Plural catalogue name, for example `regions`.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Region => "regions",
            Self::Size => "sizes",
            Self::Image => "images",
            Self::Plan => "plans",
            Self::Distribution => "distributions",
        }
    }
}

impl fmt::Display for ReferenceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One entry of a reference-data catalogue.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ReferenceEntry {
    /// Catalogue identifier.
    pub id: ReferenceId,
    /// Human-readable name.
    pub name: String,
}

impl ReferenceEntry {
    /// Builds an entry.
    #[must_use]
    pub fn new(id: impl Into<ReferenceId>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }
}
