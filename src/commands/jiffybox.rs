//! JiffyBox server, catalogue, and backup commands.

use std::io::Write;

use tracing::info;

use crate::backend::Backend;
use crate::jiffybox::{
    Backup, BoxSpec, Distribution, JiffyBox, JiffyBoxBackend, JiffyBoxError, Plan,
};
use crate::lifecycle::Orchestrator;
use crate::output::Table;
use crate::resource::ResourceId;
use crate::session::Session;

use super::{CommandError, emit, format_time, resource_detail};

/// Timestamp layout of box tables.
pub const BOX_TIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// Renders the box overview table.
#[must_use]
pub fn render_boxes(boxes: &[JiffyBox]) -> Table {
    let mut table = Table::new();
    if boxes.is_empty() {
        table.push(["no boxes found"]);
        return table;
    }
    table.push([
        "Created", "Id", "Status", "Running", "Name", "Cpu", "RAM", "Ip",
    ]);
    for jiffybox in boxes {
        table.push([
            format_time(jiffybox.created_at(), BOX_TIME_FORMAT),
            jiffybox.id.to_string(),
            jiffybox.status.clone(),
            jiffybox.running.to_string(),
            jiffybox.name.clone(),
            jiffybox.plan.cpus.to_string(),
            jiffybox.plan.ram_in_mb.to_string(),
            jiffybox.public_ip().unwrap_or_default().to_owned(),
        ]);
    }
    table
}

/// Renders every detail of one box, including its addresses.
#[must_use]
pub fn render_box(jiffybox: &JiffyBox) -> Table {
    let mut table = Table::new();
    table.field("Id", jiffybox.id);
    table.field("Name", &jiffybox.name);
    table.field("Status", &jiffybox.status);
    table.field("Created", format_time(jiffybox.created_at(), BOX_TIME_FORMAT));
    table.field("Host", &jiffybox.host);
    table.field("Running", jiffybox.running);
    table.field("RecoverymodeActive", jiffybox.recoverymode_active);
    table.field("Plan", jiffybox.plan.id);
    table.field("Cpu", jiffybox.plan.cpus);
    table.field("RAM", jiffybox.plan.ram_in_mb);
    table.field("IsBeingCopied", jiffybox.is_being_copied);
    table.field("ManualBackupRunning", jiffybox.manual_backup_running);
    if let Some(profile) = &jiffybox.active_profile {
        table.field("Profile Name", &profile.name);
        table.field("Profile Kernel", &profile.kernel);
    }
    for (index, (network, addresses)) in jiffybox.ips.iter().enumerate() {
        let key = if index == 0 { "Ips" } else { "" };
        table.field(key, format!("{network}: {}", addresses.join(", ")));
    }
    table
}

/// Renders plans with hourly and monthly prices.
#[must_use]
pub fn render_plans(plans: &[Plan]) -> Table {
    let mut table = Table::new();
    table.push([
        "Id",
        "Name",
        "Cpu",
        "Ram",
        "Disk",
        "Price/Hour",
        "Price/Month",
    ]);
    for plan in plans {
        table.push([
            plan.id.to_string(),
            plan.name.clone(),
            plan.cpus.to_string(),
            plan.ram_in_mb.to_string(),
            plan.disk_size_in_mb.to_string(),
            format!("{:.2} €", plan.price_per_hour),
            format!("{:.2} €", plan.price_per_month()),
        ]);
    }
    table
}

/// Renders installable distributions.
#[must_use]
pub fn render_distributions(distributions: &[Distribution]) -> Table {
    let mut table = Table::new();
    table.push(["Key", "Name", "Min Disk Size", "Default Kernel"]);
    for distribution in distributions {
        table.push([
            distribution.key.clone(),
            distribution.name.clone(),
            distribution.min_disk_size_mb.to_string(),
            distribution.default_kernel.clone(),
        ]);
    }
    table
}

/// Renders stored backups, one row per rotation slot.
#[must_use]
pub fn render_backups(backups: &[Backup]) -> Table {
    let mut table = Table::new();
    table.push(["Id", "Box", "Key", "Created"]);
    for backup in backups {
        table.push([
            backup.id.clone(),
            backup.box_id.to_string(),
            backup.key.clone(),
            format_time(backup.created_at, BOX_TIME_FORMAT),
        ]);
    }
    table
}

fn provider<T>(result: Result<T, JiffyBoxError>) -> Result<T, CommandError<JiffyBoxError>> {
    result.map_err(CommandError::Provider)
}

/// Lists all boxes.
///
/// # Errors
///
/// Returns [`CommandError::Provider`] when the API call fails.
pub async fn list_boxes(
    session: &Session<JiffyBoxBackend>,
    out: &mut impl Write,
) -> Result<(), CommandError<JiffyBoxError>> {
    let boxes = provider(session.backend().client().boxes().await)?;
    emit(out, &render_boxes(&boxes))?;
    Ok(())
}

/// Shows one box.
///
/// # Errors
///
/// Returns [`CommandError::Provider`] when the box cannot be fetched.
pub async fn show_box(
    session: &Session<JiffyBoxBackend>,
    id: ResourceId,
    out: &mut impl Write,
) -> Result<(), CommandError<JiffyBoxError>> {
    let jiffybox = provider(session.backend().client().jiffybox(id.get()).await)?;
    emit(out, &render_box(&jiffybox))?;
    Ok(())
}

/// Creates a box, waits until it is ready, and shows it.
///
/// # Errors
///
/// Returns [`CommandError::Lifecycle`] when creation fails or times out.
pub async fn create_box(
    session: &Session<JiffyBoxBackend>,
    spec: &BoxSpec,
    out: &mut impl Write,
) -> Result<(), CommandError<JiffyBoxError>> {
    info!(
        name = %spec.name,
        plan_id = spec.plan_id,
        distribution = %spec.distribution,
        "creating box"
    );
    let ready = Orchestrator::new(session).create(spec).await?;
    let jiffybox = provider(
        session
            .backend()
            .client()
            .jiffybox(ready.resource.id.get())
            .await,
    )?;
    emit(out, &render_box(&jiffybox))?;
    Ok(())
}

/// Powers a box off and shows its new state.
///
/// # Errors
///
/// Returns [`CommandError::Lifecycle`] when the transition fails.
pub async fn shutdown<B: Backend>(
    session: &Session<B>,
    id: ResourceId,
    out: &mut impl Write,
) -> Result<(), CommandError<B::Error>> {
    let resource = Orchestrator::new(session).shutdown(id).await?;
    emit(out, &resource_detail(&resource, BOX_TIME_FORMAT))?;
    Ok(())
}

/// Powers a box on with the given plan.
///
/// # Errors
///
/// Returns [`CommandError::Lifecycle`] when the transition fails.
pub async fn start<B: Backend>(
    session: &Session<B>,
    id: ResourceId,
    plan_id: u64,
    out: &mut impl Write,
) -> Result<(), CommandError<B::Error>> {
    let resource = Orchestrator::new(session).start(id, plan_id).await?;
    emit(out, &resource_detail(&resource, BOX_TIME_FORMAT))?;
    Ok(())
}

/// Freezes a stopped box.
///
/// # Errors
///
/// Returns [`CommandError::Lifecycle`] when the box is running or the
/// transition fails.
pub async fn freeze<B: Backend>(
    session: &Session<B>,
    id: ResourceId,
    out: &mut impl Write,
) -> Result<(), CommandError<B::Error>> {
    let resource = Orchestrator::new(session).freeze(id).await?;
    emit(out, &resource_detail(&resource, BOX_TIME_FORMAT))?;
    Ok(())
}

/// Thaws a frozen box onto a plan.
///
/// # Errors
///
/// Returns [`CommandError::Lifecycle`] when the transition fails.
pub async fn thaw<B: Backend>(
    session: &Session<B>,
    id: ResourceId,
    plan_id: u64,
    out: &mut impl Write,
) -> Result<(), CommandError<B::Error>> {
    let resource = Orchestrator::new(session).thaw(id, plan_id).await?;
    emit(out, &resource_detail(&resource, BOX_TIME_FORMAT))?;
    Ok(())
}

/// Clones a box that is not frozen and shows the copy.
///
/// # Errors
///
/// Returns [`CommandError::Lifecycle`] when the source is frozen or the
/// transition fails.
pub async fn clone_box<B: Backend>(
    session: &Session<B>,
    id: ResourceId,
    options: &B::CloneSpec,
    out: &mut impl Write,
) -> Result<(), CommandError<B::Error>> {
    let resource = Orchestrator::new(session).clone_resource(id, options).await?;
    emit(out, &resource_detail(&resource, BOX_TIME_FORMAT))?;
    Ok(())
}

/// Lists plans with prices.
///
/// # Errors
///
/// Returns [`CommandError::Provider`] when the API call fails.
pub async fn list_plans(
    session: &Session<JiffyBoxBackend>,
    out: &mut impl Write,
) -> Result<(), CommandError<JiffyBoxError>> {
    let plans = provider(session.backend().client().plans().await)?;
    emit(out, &render_plans(&plans))?;
    Ok(())
}

/// Lists distributions.
///
/// # Errors
///
/// Returns [`CommandError::Provider`] when the API call fails.
pub async fn list_distributions(
    session: &Session<JiffyBoxBackend>,
    out: &mut impl Write,
) -> Result<(), CommandError<JiffyBoxError>> {
    let distributions = provider(session.backend().client().distributions().await)?;
    emit(out, &render_distributions(&distributions))?;
    Ok(())
}

/// Lists backups of all boxes.
///
/// # Errors
///
/// Returns [`CommandError::Provider`] when the API call fails.
pub async fn list_backups(
    session: &Session<JiffyBoxBackend>,
    out: &mut impl Write,
) -> Result<(), CommandError<JiffyBoxError>> {
    let backups = provider(session.backend().client().backups().await)?;
    emit(out, &render_backups(&backups))?;
    Ok(())
}

/// Starts a manual backup of a box.
///
/// # Errors
///
/// Returns [`CommandError::Provider`] when the API rejects the request.
pub async fn create_backup(
    session: &Session<JiffyBoxBackend>,
    id: ResourceId,
) -> Result<(), CommandError<JiffyBoxError>> {
    provider(session.backend().client().create_backup(id.get()).await)?;
    info!(box_id = %id, "requested manual backup");
    Ok(())
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;
    use crate::lifecycle::LifecycleError;
    use crate::resource::TransitionKind;
    use crate::test_support::{ScriptedBackend, resource};

    fn parse_box(json: &str) -> JiffyBox {
        serde_json::from_str(json).expect("box json")
    }

    #[test]
    fn empty_box_list_prints_placeholder() {
        assert_eq!(render_boxes(&[]).to_string(), "no boxes found\n");
    }

    #[test]
    fn box_overview_uses_second_precision() {
        let jiffybox = parse_box(
            r#"{"id":7,"name":"web","status":"READY","running":true,"created":1370000000,
                "ips":{"public":["198.51.100.4"]},"plan":{"id":20,"cpus":2,"ramInMB":1024}}"#,
        );

        let rendered = render_boxes(&[jiffybox]).to_string();
        let row = rendered.lines().nth(1).expect("row");

        assert!(row.starts_with("2013-05-31T11:33:20  7"), "{row}");
        assert!(row.ends_with("web   2    1024  198.51.100.4"), "{row}");
    }

    #[test]
    fn box_detail_lists_profile_and_addresses() {
        let jiffybox = parse_box(
            r#"{"id":7,"name":"web","status":"READY","plan":{"id":20},
                "activeProfile":{"name":"Standard","kernel":"xen-current"},
                "ips":{"private":["10.0.0.4"],"public":["198.51.100.4","198.51.100.5"]}}"#,
        );

        let rendered = render_box(&jiffybox).to_string();

        assert!(rendered.contains("Profile Kernel       xen-current\n"), "{rendered}");
        assert!(rendered.contains("Ips                  private: 10.0.0.4\n"), "{rendered}");
        assert!(
            rendered.ends_with("\n                     public: 198.51.100.4, 198.51.100.5\n"),
            "{rendered}"
        );
    }

    #[test]
    fn plans_show_monthly_price() {
        let plans = vec![Plan {
            id: 20,
            name: String::from("CloudLevel 1"),
            cpus: 1,
            ram_in_mb: 1024,
            disk_size_in_mb: 51_200,
            price_per_hour: 0.02,
            price_per_hour_frozen: 0.005,
        }];

        let rendered = render_plans(&plans).to_string();

        assert!(
            rendered.ends_with("20  CloudLevel 1  1    1024  51200  0.02 €      14.60 €\n"),
            "{rendered}"
        );
    }

    #[test]
    fn distributions_render_all_columns() {
        let rendered = render_distributions(&[Distribution {
            key: String::from("centos_6_64bit"),
            name: String::from("CentOS 6"),
            min_disk_size_mb: 1_024,
            default_kernel: String::from("xen-current-x86_64"),
        }])
        .to_string();

        assert!(rendered.starts_with("Key             Name      Min Disk Size"));
        assert!(rendered.contains("centos_6_64bit  CentOS 6  1024           xen-current-x86_64"));
    }

    #[test]
    fn backups_render_one_row_per_slot() {
        let backups = vec![
            Backup {
                id: String::from("a1b2"),
                box_id: 7,
                key: String::from("daily"),
                created_at: chrono::DateTime::from_timestamp(1_370_000_000, 0),
            },
            Backup {
                id: String::from("c3d4"),
                box_id: 7,
                key: String::from("weekly"),
                created_at: None,
            },
        ];

        let rendered = render_backups(&backups).to_string();

        assert_eq!(
            rendered,
            "Id    Box  Key     Created\n\
             a1b2  7    daily   2013-05-31T11:33:20\n\
             c3d4  7    weekly\n"
        );
    }

    #[rstest]
    #[case::shutdown(TransitionKind::Shutdown)]
    #[case::start(TransitionKind::Start)]
    #[case::thaw(TransitionKind::Thaw)]
    #[tokio::test]
    async fn transitions_render_the_new_state(#[case] kind: TransitionKind) {
        let session = Session::new(ScriptedBackend::new());
        session.backend().push_status(7, "READY");
        let mut out = Vec::new();
        let id = ResourceId(7);

        match kind {
            TransitionKind::Shutdown => shutdown(&session, id, &mut out).await,
            TransitionKind::Start => start(&session, id, 20, &mut out).await,
            _ => thaw(&session, id, 20, &mut out).await,
        }
        .expect("transition");

        assert_eq!(session.backend().calls(kind), 1);
        let rendered = String::from_utf8(out).expect("utf8");
        assert!(rendered.starts_with("Id       7\n"), "{rendered}");
    }

    #[tokio::test]
    async fn freezing_a_running_box_is_refused() {
        let session = Session::new(ScriptedBackend::new());
        let mut running = resource(7, "READY");
        running.flags.running = true;
        session.backend().push_resource(running);
        let mut out = Vec::new();

        let err = freeze(&session, ResourceId(7), &mut out)
            .await
            .expect_err("running");

        assert!(matches!(
            err,
            CommandError::Lifecycle(LifecycleError::Precondition { .. })
        ));
        assert!(out.is_empty());
        assert_eq!(session.backend().calls(TransitionKind::Freeze), 0);
    }

    #[tokio::test]
    async fn clone_renders_the_copy() {
        let session = Session::new(ScriptedBackend::new());
        session.backend().push_status(7, "READY");
        let mut out = Vec::new();

        clone_box(&session, ResourceId(7), &String::from("copy"), &mut out)
            .await
            .expect("clone");

        assert_eq!(session.backend().calls(TransitionKind::Clone), 1);
        assert!(!out.is_empty());
    }
}
