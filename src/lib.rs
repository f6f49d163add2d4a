//! Core library for the boxctl cloud server tool.
//!
//! The crate drives DigitalOcean droplets and JiffyBox servers through one
//! [`Backend`] capability trait. A [`Session`] carries the configured backend
//! and caches reference catalogues; the lifecycle [`Orchestrator`] performs
//! transitions and polls until a resource is ready or destroyed.

pub mod backend;
pub mod commands;
pub mod config;
pub mod digitalocean;
pub mod jiffybox;
pub mod lifecycle;
pub mod output;
pub mod resource;
pub mod session;
pub mod test_support;

pub use backend::{ApiError, Backend, BackendFuture};
pub use config::{ConfigError, DigitalOceanConfig, JiffyBoxConfig};
pub use digitalocean::{DigitalOceanBackend, DigitalOceanError, DropletOverrides};
pub use jiffybox::{JiffyBoxBackend, JiffyBoxError};
pub use lifecycle::{
    DestroyReport, LifecycleError, LifecycleOutcome, LifecycleRequest, Orchestrator, PollPolicy,
    ReadyResource,
};
pub use output::Table;
pub use resource::{
    Placement, ReferenceEntry, ReferenceKind, Resource, ResourceFlags, ResourceId, ResourceStatus,
    TransitionKind, WaitGoal,
};
pub use session::Session;
