//! Command-line interface definitions for the `boxctl` binary.
//!
//! This module centralises the clap parser structures so both the main binary
//! and the build script can reuse them when generating the manual page.

use clap::{Parser, Subcommand};

/// Top-level CLI for the `boxctl` binary.
#[derive(Debug, Parser)]
#[command(
    name = "boxctl",
    about = "Manage DigitalOcean droplets and JiffyBox servers",
    arg_required_else_help = true
)]
pub(crate) struct Cli {
    /// Log debug output, including every status poll.
    #[arg(short, long, global = true)]
    pub(crate) verbose: bool,
    #[command(subcommand)]
    pub(crate) provider: Provider,
}

/// Provider namespaces.
#[derive(Debug, Subcommand)]
pub(crate) enum Provider {
    /// DigitalOcean droplets and catalogues.
    #[command(name = "do", arg_required_else_help = true)]
    DigitalOcean {
        #[command(subcommand)]
        resource: DigitalOceanResource,
    },
    /// JiffyBox servers, catalogues, and backups.
    #[command(name = "jb", arg_required_else_help = true)]
    JiffyBox {
        #[command(subcommand)]
        resource: JiffyBoxResource,
    },
}

/// Resources under `boxctl do`.
#[derive(Debug, Subcommand)]
pub(crate) enum DigitalOceanResource {
    /// Manage droplets.
    #[command(arg_required_else_help = true)]
    Droplet {
        #[command(subcommand)]
        action: DropletAction,
    },
    /// Datacenter regions.
    Region {
        #[command(subcommand)]
        action: CatalogueAction,
    },
    /// Droplet sizes.
    Size {
        #[command(subcommand)]
        action: CatalogueAction,
    },
    /// Images droplets can boot from.
    Image {
        #[command(subcommand)]
        action: CatalogueAction,
    },
}

/// Actions on droplets.
#[derive(Debug, Subcommand)]
pub(crate) enum DropletAction {
    /// List droplets.
    List,
    /// Show one droplet.
    Info {
        /// Droplet id.
        id: u64,
    },
    /// Create a droplet and wait until it is active.
    Create {
        /// Name of the new droplet.
        name: String,
        /// Image id; defaults to the configured image.
        #[arg(short = 'i', long, value_name = "ID")]
        image_id: Option<u64>,
        /// Region id; defaults to the configured region.
        #[arg(short = 'r', long, value_name = "ID")]
        region_id: Option<u64>,
        /// Size id; defaults to the configured size.
        #[arg(short = 's', long, value_name = "ID")]
        size_id: Option<u64>,
        /// SSH key id; defaults to the configured key.
        #[arg(short = 'k', long, value_name = "ID")]
        ssh_key_id: Option<u64>,
    },
    /// Rename a droplet.
    Rename {
        /// Droplet id.
        id: u64,
        /// New name.
        name: String,
    },
    /// Destroy droplets and wait until each is archived.
    Destroy {
        /// Droplet ids, processed in order.
        #[arg(required = true)]
        ids: Vec<u64>,
    },
    /// Rebuild a droplet from an image and wait until it is active.
    Rebuild {
        /// Droplet id.
        id: u64,
        /// Image to rebuild from.
        image_id: u64,
    },
    /// Power a droplet off.
    Shutdown {
        /// Droplet id.
        id: u64,
    },
}

/// Read-only catalogue listing.
#[derive(Debug, Subcommand)]
pub(crate) enum CatalogueAction {
    /// List catalogue entries.
    List,
}

/// Resources under `boxctl jb`.
#[derive(Debug, Subcommand)]
pub(crate) enum JiffyBoxResource {
    /// Manage servers.
    #[command(arg_required_else_help = true)]
    Servers {
        #[command(subcommand)]
        action: ServerAction,
    },
    /// Tariff plans.
    Plans {
        #[command(subcommand)]
        action: CatalogueAction,
    },
    /// Installable distributions.
    Distributions {
        #[command(subcommand)]
        action: CatalogueAction,
    },
    /// Box backups.
    #[command(arg_required_else_help = true)]
    Backups {
        #[command(subcommand)]
        action: BackupAction,
    },
}

/// Actions on JiffyBox servers.
#[derive(Debug, Subcommand)]
pub(crate) enum ServerAction {
    /// List servers.
    List,
    /// Show one server.
    Show {
        /// Box id.
        id: u64,
    },
    /// Create a server and wait until it is ready.
    Create {
        /// Name of the new box.
        name: String,
        /// Plan id; defaults to the configured plan.
        #[arg(short = 'p', long, value_name = "ID")]
        plan_id: Option<u64>,
        /// Distribution key; defaults to the configured distribution.
        #[arg(short = 'd', long, value_name = "KEY")]
        distribution: Option<String>,
    },
    /// Delete servers and wait until each is gone.
    Delete {
        /// Box ids, processed in order.
        #[arg(required = true)]
        ids: Vec<u64>,
    },
    /// Power a server off.
    Shutdown {
        /// Box id.
        id: u64,
    },
    /// Power a server on.
    Start {
        /// Box id.
        id: u64,
        /// Plan to start on; defaults to the configured plan.
        #[arg(short = 'p', long, value_name = "ID")]
        plan_id: Option<u64>,
    },
    /// Freeze a stopped server.
    Freeze {
        /// Box id.
        id: u64,
    },
    /// Thaw a frozen server.
    Thaw {
        /// Box id.
        id: u64,
        /// Plan to thaw onto; defaults to the configured plan.
        #[arg(short = 'p', long, value_name = "ID")]
        plan_id: Option<u64>,
    },
    /// Clone a server that is not frozen.
    Clone {
        /// Source box id.
        id: u64,
        /// Name of the copy.
        name: String,
        /// Plan of the copy; defaults to the configured plan.
        #[arg(short = 'p', long, value_name = "ID")]
        plan_id: Option<u64>,
    },
}

/// Backup actions.
#[derive(Debug, Subcommand)]
pub(crate) enum BackupAction {
    /// List backups of all servers.
    List,
    /// Start a manual backup of a server.
    Create {
        /// Box id.
        id: u64,
    },
}
