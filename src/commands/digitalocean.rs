//! DigitalOcean droplet commands.

use std::io::Write;

use tracing::{debug, info};

use crate::backend::Backend;
use crate::digitalocean::{DigitalOceanBackend, DigitalOceanError, DropletSpec};
use crate::lifecycle::Orchestrator;
use crate::output::Table;
use crate::resource::{Placement, ReferenceKind, Resource, ResourceId};
use crate::session::Session;

use super::{CommandError, emit, format_time, resource_detail};

/// Timestamp layout of droplet tables.
pub const DROPLET_TIME_FORMAT: &str = "%Y-%m-%dT%H:%M";

/// Lists droplets with their region, size, and image names.
///
/// # Errors
///
/// Returns [`CommandError::Provider`] when listing droplets or a catalogue
/// fails.
pub async fn list_droplets<B: Backend>(
    session: &Session<B>,
    out: &mut impl Write,
) -> Result<(), CommandError<B::Error>> {
    debug!("listing droplets");
    let droplets = session
        .backend()
        .list_resources()
        .await
        .map_err(CommandError::Provider)?;

    let mut table = Table::new();
    if droplets.is_empty() {
        table.push(["no droplets found"]);
        emit(out, &table)?;
        return Ok(());
    }

    table.push([
        "Id", "Created", "Status", "Locked", "Name", "IPAddress", "Region", "Size", "Image",
    ]);
    for droplet in &droplets {
        let (region, size, image) = placement_labels(session, droplet)
            .await
            .map_err(CommandError::Provider)?;
        table.push([
            droplet.id.to_string(),
            format_time(droplet.created_at, DROPLET_TIME_FORMAT),
            droplet.status.to_string(),
            droplet.flags.locked.to_string(),
            droplet.name.clone(),
            droplet.public_ip.clone().unwrap_or_default(),
            region,
            size,
            image,
        ]);
    }
    emit(out, &table)?;
    Ok(())
}

async fn placement_labels<B: Backend>(
    session: &Session<B>,
    droplet: &Resource,
) -> Result<(String, String, String), B::Error> {
    let Placement::Droplet {
        region_id,
        size_id,
        image_id,
    } = droplet.placement
    else {
        return Ok((String::new(), String::new(), String::new()));
    };
    Ok((
        session.labelled(ReferenceKind::Region, region_id).await?,
        session.labelled(ReferenceKind::Size, size_id).await?,
        session.labelled(ReferenceKind::Image, image_id).await?,
    ))
}

/// Shows one droplet.
///
/// # Errors
///
/// Returns [`CommandError::Provider`] when the droplet cannot be fetched.
pub async fn droplet_info<B: Backend>(
    session: &Session<B>,
    id: ResourceId,
    out: &mut impl Write,
) -> Result<(), CommandError<B::Error>> {
    let droplet = session
        .backend()
        .get_resource(id)
        .await
        .map_err(CommandError::Provider)?;
    emit(out, &resource_detail(&droplet, DROPLET_TIME_FORMAT))?;
    Ok(())
}

/// Creates a droplet and waits until it is active.
///
/// # Errors
///
/// Returns [`CommandError::Lifecycle`] when creation fails or times out.
pub async fn create_droplet(
    session: &Session<DigitalOceanBackend>,
    spec: &DropletSpec,
    out: &mut impl Write,
) -> Result<(), CommandError<DigitalOceanError>> {
    info!(
        name = %spec.name,
        region_id = spec.region_id,
        size_id = spec.size_id,
        image_id = spec.image_id,
        "creating droplet"
    );
    let ready = Orchestrator::new(session).create(spec).await?;
    emit(out, &resource_detail(&ready.resource, DROPLET_TIME_FORMAT))?;
    Ok(())
}

/// Renames a droplet.
///
/// # Errors
///
/// Returns [`CommandError::Provider`] when the API rejects the rename.
pub async fn rename_droplet(
    session: &Session<DigitalOceanBackend>,
    id: ResourceId,
    name: &str,
) -> Result<(), CommandError<DigitalOceanError>> {
    info!(droplet_id = %id, name, "renaming droplet");
    session
        .backend()
        .client()
        .rename_droplet(id.get(), name)
        .await
        .map_err(CommandError::Provider)?;
    info!(droplet_id = %id, name, "renamed droplet");
    Ok(())
}

/// Rebuilds a droplet from an image and waits until it is active again.
///
/// # Errors
///
/// Returns [`CommandError::Lifecycle`] when the rebuild fails or times out.
pub async fn rebuild_droplet<B: Backend>(
    session: &Session<B>,
    id: ResourceId,
    image_id: u64,
    out: &mut impl Write,
) -> Result<(), CommandError<B::Error>> {
    let ready = Orchestrator::new(session).rebuild(id, image_id).await?;
    info!(
        droplet_id = %id,
        total_secs = format_args!("{:.1}", ready.elapsed.as_secs_f64()),
        "rebuilt droplet"
    );
    emit(out, &resource_detail(&ready.resource, DROPLET_TIME_FORMAT))?;
    Ok(())
}

/// Powers a droplet off and shows its refreshed state.
///
/// # Errors
///
/// Returns [`CommandError::Lifecycle`] when the shutdown call fails.
pub async fn shutdown_droplet<B: Backend>(
    session: &Session<B>,
    id: ResourceId,
    out: &mut impl Write,
) -> Result<(), CommandError<B::Error>> {
    info!(droplet_id = %id, "shutting down droplet");
    let droplet = Orchestrator::new(session).shutdown(id).await?;
    emit(out, &resource_detail(&droplet, DROPLET_TIME_FORMAT))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use super::*;
    use crate::resource::{ReferenceEntry, TransitionKind};
    use crate::test_support::{ScriptedBackend, resource};

    fn session_with_catalogues() -> Session<ScriptedBackend> {
        let backend = ScriptedBackend::new();
        backend.set_references(
            ReferenceKind::Region,
            vec![ReferenceEntry::new(2_u64, "Amsterdam 1")],
        );
        backend.set_references(ReferenceKind::Size, vec![ReferenceEntry::new(66_u64, "512MB")]);
        backend.set_references(ReferenceKind::Image, Vec::new());
        Session::new(backend)
    }

    #[tokio::test]
    async fn empty_account_prints_placeholder() {
        let session = session_with_catalogues();
        let mut out = Vec::new();

        list_droplets(&session, &mut out).await.expect("list");

        assert_eq!(String::from_utf8(out).expect("utf8"), "no droplets found\n");
    }

    #[tokio::test]
    async fn droplet_rows_resolve_catalogue_names() {
        let session = session_with_catalogues();
        let mut droplet = resource(7, "active");
        droplet.name = String::from("web-1");
        droplet.created_at = Utc.with_ymd_and_hms(2013, 5, 1, 10, 0, 0).single();
        session.backend().push_resource(droplet);
        session.backend().push_status(8, "new");
        let mut out = Vec::new();

        list_droplets(&session, &mut out).await.expect("list");

        let rendered = String::from_utf8(out).expect("utf8");
        let mut lines = rendered.lines();
        let header = lines.next().expect("header");
        assert!(header.starts_with("Id  Created"), "{header}");
        let first = lines.next().expect("row");
        assert!(first.starts_with("7   2013-05-01T10:00  active  false"), "{first}");
        for cell in ["web-1", "192.0.2.10", "Amsterdam 1 (2)", "512MB (66)", "350076 (350076)"] {
            assert!(first.contains(cell), "{cell} missing from {first}");
        }
        assert!(lines.next().is_some_and(|row| row.starts_with("8 ")));
        assert_eq!(session.backend().reference_calls(ReferenceKind::Region), 1);
    }

    #[tokio::test]
    async fn info_renders_detail_table() {
        let session = session_with_catalogues();
        session.backend().push_status(7, "off");
        let mut out = Vec::new();

        droplet_info(&session, ResourceId(7), &mut out)
            .await
            .expect("info");

        let rendered = String::from_utf8(out).expect("utf8");
        assert!(rendered.contains("Status   off"), "{rendered}");
        assert!(rendered.contains("Locked   false"), "{rendered}");
    }

    #[tokio::test]
    async fn shutdown_renders_the_refreshed_droplet() {
        let session = session_with_catalogues();
        session.backend().push_status(7, "off");
        let mut out = Vec::new();

        shutdown_droplet(&session, ResourceId(7), &mut out)
            .await
            .expect("shutdown");

        assert_eq!(session.backend().calls(TransitionKind::Shutdown), 1);
        let rendered = String::from_utf8(out).expect("utf8");
        assert!(rendered.contains("Status   off"), "{rendered}");
    }
}
