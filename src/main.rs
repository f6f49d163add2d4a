//! Binary entry point for the boxctl CLI.

use std::io::{self, Write};
use std::process;

use clap::Parser;
use thiserror::Error;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use boxctl::commands::{self, CommandError, digitalocean, jiffybox};
use boxctl::{
    ConfigError, DigitalOceanBackend, DigitalOceanError, DropletOverrides, JiffyBoxBackend,
    JiffyBoxError, ReferenceKind, ResourceId, Session,
};

mod cli;

use cli::{
    BackupAction, CatalogueAction, Cli, DigitalOceanResource, DropletAction, JiffyBoxResource,
    Provider, ServerAction,
};

#[cfg(test)]
mod test_helpers;

#[derive(Debug, Error)]
enum CliError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error(transparent)]
    DigitalOcean(#[from] CommandError<DigitalOceanError>),
    #[error(transparent)]
    JiffyBox(#[from] CommandError<JiffyBoxError>),
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let exit_code = match dispatch(cli, &mut io::stdout()).await {
        Ok(()) => 0,
        Err(err) => {
            report_error(&err);
            1
        }
    };

    process::exit(exit_code);
}

fn init_logging(verbose: bool) {
    let directive = filter_directive(verbose, std::env::var("RUST_LOG").ok());
    let filter = EnvFilter::try_new(directive).unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(io::stderr),
        )
        .init();
}

fn filter_directive(verbose: bool, rust_log: Option<String>) -> String {
    if verbose {
        return String::from("info,boxctl=debug");
    }
    rust_log
        .filter(|value| !value.trim().is_empty())
        .unwrap_or_else(|| String::from("info"))
}

async fn dispatch(cli: Cli, out: &mut impl Write) -> Result<(), CliError> {
    match cli.provider {
        Provider::DigitalOcean { resource } => {
            let session = Session::<DigitalOceanBackend>::resolve()?;
            run_digitalocean(&session, resource, out).await?;
        }
        Provider::JiffyBox { resource } => {
            let session = Session::<JiffyBoxBackend>::resolve()?;
            run_jiffybox(&session, resource, out).await?;
        }
    }
    Ok(())
}

async fn run_digitalocean(
    session: &Session<DigitalOceanBackend>,
    resource: DigitalOceanResource,
    out: &mut impl Write,
) -> Result<(), CommandError<DigitalOceanError>> {
    let action = match resource {
        DigitalOceanResource::Droplet { action } => action,
        DigitalOceanResource::Region {
            action: CatalogueAction::List,
        } => return commands::list_catalogue(session, ReferenceKind::Region, out).await,
        DigitalOceanResource::Size {
            action: CatalogueAction::List,
        } => return commands::list_catalogue(session, ReferenceKind::Size, out).await,
        DigitalOceanResource::Image {
            action: CatalogueAction::List,
        } => return commands::list_catalogue(session, ReferenceKind::Image, out).await,
    };

    match action {
        DropletAction::List => digitalocean::list_droplets(session, out).await,
        DropletAction::Info { id } => {
            digitalocean::droplet_info(session, ResourceId(id), out).await
        }
        DropletAction::Create {
            name,
            image_id,
            region_id,
            size_id,
            ssh_key_id,
        } => {
            let spec = session.backend().droplet_spec(
                name,
                DropletOverrides {
                    region_id,
                    size_id,
                    image_id,
                    ssh_key_id,
                },
            );
            digitalocean::create_droplet(session, &spec, out).await
        }
        DropletAction::Rename { id, name } => {
            digitalocean::rename_droplet(session, ResourceId(id), &name).await
        }
        DropletAction::Destroy { ids } => {
            commands::destroy(session, &resource_ids(&ids), out).await
        }
        DropletAction::Rebuild { id, image_id } => {
            digitalocean::rebuild_droplet(session, ResourceId(id), image_id, out).await
        }
        DropletAction::Shutdown { id } => {
            digitalocean::shutdown_droplet(session, ResourceId(id), out).await
        }
    }
}

async fn run_jiffybox(
    session: &Session<JiffyBoxBackend>,
    resource: JiffyBoxResource,
    out: &mut impl Write,
) -> Result<(), CommandError<JiffyBoxError>> {
    let action = match resource {
        JiffyBoxResource::Servers { action } => action,
        JiffyBoxResource::Plans {
            action: CatalogueAction::List,
        } => return jiffybox::list_plans(session, out).await,
        JiffyBoxResource::Distributions {
            action: CatalogueAction::List,
        } => return jiffybox::list_distributions(session, out).await,
        JiffyBoxResource::Backups {
            action: BackupAction::List,
        } => return jiffybox::list_backups(session, out).await,
        JiffyBoxResource::Backups {
            action: BackupAction::Create { id },
        } => return jiffybox::create_backup(session, ResourceId(id)).await,
    };

    let backend = session.backend();
    match action {
        ServerAction::List => jiffybox::list_boxes(session, out).await,
        ServerAction::Show { id } => jiffybox::show_box(session, ResourceId(id), out).await,
        ServerAction::Create {
            name,
            plan_id,
            distribution,
        } => {
            let spec = backend.box_spec(name, plan_id, distribution);
            jiffybox::create_box(session, &spec, out).await
        }
        ServerAction::Delete { ids } => commands::destroy(session, &resource_ids(&ids), out).await,
        ServerAction::Shutdown { id } => jiffybox::shutdown(session, ResourceId(id), out).await,
        ServerAction::Start { id, plan_id } => {
            let plan = plan_id.unwrap_or_else(|| backend.default_plan_id());
            jiffybox::start(session, ResourceId(id), plan, out).await
        }
        ServerAction::Freeze { id } => jiffybox::freeze(session, ResourceId(id), out).await,
        ServerAction::Thaw { id, plan_id } => {
            let plan = plan_id.unwrap_or_else(|| backend.default_plan_id());
            jiffybox::thaw(session, ResourceId(id), plan, out).await
        }
        ServerAction::Clone { id, name, plan_id } => {
            let options = backend.clone_spec(name, plan_id);
            jiffybox::clone_box(session, ResourceId(id), &options, out).await
        }
    }
}

fn resource_ids(ids: &[u64]) -> Vec<ResourceId> {
    ids.iter().copied().map(ResourceId).collect()
}

fn report_error(err: &CliError) {
    write_error(io::stderr(), err);
}

fn write_error(mut target: impl Write, err: &CliError) {
    writeln!(target, "error: {err}").ok();
}
