//! Command handlers invoked by the binary.
//!
//! Each handler runs one action against a resolved [`Session`], renders the
//! outcome as a [`Table`], and writes it to the supplied sink. Progress and
//! diagnostics go through `tracing`; only results are written to the sink.

pub mod digitalocean;
pub mod jiffybox;

use std::io::{self, Write};

use thiserror::Error;

use crate::backend::Backend;
use crate::lifecycle::{DestroyReport, DestroyStatus, LifecycleError, Orchestrator};
use crate::output::Table;
use crate::resource::{ReferenceKind, Resource, ResourceId};
use crate::session::Session;

/// Errors surfaced by command handlers.
#[derive(Debug, Error)]
pub enum CommandError<E>
where
    E: std::error::Error + 'static,
{
    /// A lifecycle transition failed.
    #[error(transparent)]
    Lifecycle(#[from] LifecycleError<E>),
    /// A direct provider call failed.
    #[error(transparent)]
    Provider(E),
    /// Writing the rendered output failed.
    #[error("failed to write output: {0}")]
    Output(#[from] io::Error),
    /// Some ids of a destroy batch were not confirmed destroyed.
    #[error("not confirmed destroyed: {}", join_ids(.failed))]
    BatchIncomplete {
        /// Ids that were skipped or timed out.
        failed: Vec<ResourceId>,
    },
}

fn join_ids(ids: &[ResourceId]) -> String {
    ids.iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Writes a table to the sink.
///
/// # Errors
///
/// Returns the I/O error raised by the sink.
pub fn emit(out: &mut impl Write, table: &Table) -> io::Result<()> {
    write!(out, "{table}")
}

/// Renders a destroy report, one row per requested id.
#[must_use]
pub fn render_destroy_report(report: &DestroyReport) -> Table {
    let mut table = Table::new();
    table.push(["Id", "Result", "Polls", "Detail"]);
    for outcome in &report.outcomes {
        let (result, detail) = match &outcome.status {
            DestroyStatus::Archived { elapsed } => {
                ("destroyed", format!("{:.1}s", elapsed.as_secs_f64()))
            }
            DestroyStatus::TimedOut { last_status } => (
                "timed out",
                last_status
                    .as_ref()
                    .map_or_else(String::new, |status| format!("last status {status}")),
            ),
            DestroyStatus::LookupFailed { message } => ("skipped", message.clone()),
        };
        table.push([
            outcome.id.to_string(),
            result.to_owned(),
            outcome.polls.to_string(),
            detail,
        ]);
    }
    table
}

/// Destroys each id in turn and renders the per-id outcome.
///
/// # Errors
///
/// Returns [`CommandError::Lifecycle`] when a destroy call fails and
/// [`CommandError::BatchIncomplete`] after the batch when any id was not
/// confirmed destroyed.
pub async fn destroy<B: Backend>(
    session: &Session<B>,
    ids: &[ResourceId],
    out: &mut impl Write,
) -> Result<(), CommandError<B::Error>> {
    let report = Orchestrator::new(session).destroy(ids).await?;
    emit(out, &render_destroy_report(&report))?;
    if report.is_complete() {
        Ok(())
    } else {
        Err(CommandError::BatchIncomplete {
            failed: report.failed_ids(),
        })
    }
}

/// Lists a reference catalogue as an `Id Name` table.
///
/// # Errors
///
/// Returns [`CommandError::Provider`] when the catalogue cannot be loaded.
pub async fn list_catalogue<B: Backend>(
    session: &Session<B>,
    kind: ReferenceKind,
    out: &mut impl Write,
) -> Result<(), CommandError<B::Error>> {
    let entries = session
        .references(kind)
        .await
        .map_err(CommandError::Provider)?;
    let mut table = Table::new();
    table.push(["Id", "Name"]);
    for entry in entries.iter() {
        table.push([entry.id.to_string(), entry.name.clone()]);
    }
    emit(out, &table)?;
    Ok(())
}

pub(crate) fn format_time(
    at: Option<chrono::DateTime<chrono::Utc>>,
    pattern: &str,
) -> String {
    at.map(|at| at.format(pattern).to_string())
        .unwrap_or_default()
}

/// Key/value view of a resource snapshot.
pub(crate) fn resource_detail(resource: &Resource, time_format: &str) -> Table {
    let mut table = Table::new();
    table.field("Id", resource.id);
    table.field("Name", &resource.name);
    table.field("Status", &resource.status);
    table.field("Created", format_time(resource.created_at, time_format));
    table.field("Locked", resource.flags.locked);
    table.field("Running", resource.flags.running);
    table.field("Ip", resource.public_ip.as_deref().unwrap_or_default());
    table
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::lifecycle::DestroyOutcome;
    use crate::resource::ReferenceEntry;
    use crate::test_support::{ScriptedBackend, ScriptedError};

    #[test]
    fn destroy_report_lists_each_outcome() {
        let report = DestroyReport {
            outcomes: vec![
                DestroyOutcome {
                    id: ResourceId(1),
                    polls: 0,
                    status: DestroyStatus::LookupFailed {
                        message: String::from("resource 1 not found"),
                    },
                },
                DestroyOutcome {
                    id: ResourceId(2),
                    polls: 3,
                    status: DestroyStatus::Archived {
                        elapsed: Duration::from_millis(2_000),
                    },
                },
            ],
        };

        assert_eq!(
            render_destroy_report(&report).to_string(),
            "Id  Result     Polls  Detail\n\
             1   skipped    0      resource 1 not found\n\
             2   destroyed  3      2.0s\n"
        );
    }

    #[tokio::test(start_paused = true)]
    async fn incomplete_batch_is_an_error_after_rendering() {
        let session = Session::new(ScriptedBackend::new());
        session.backend().push_statuses(2, &["active", "off"]);
        let mut out = Vec::new();

        let err = destroy(&session, &[ResourceId(1), ResourceId(2)], &mut out)
            .await
            .expect_err("id 1 is unknown");

        assert!(
            matches!(
                err,
                CommandError::BatchIncomplete { ref failed } if failed == &[ResourceId(1)]
            ),
            "{err}"
        );
        assert_eq!(err.to_string(), "not confirmed destroyed: 1");
        let rendered = String::from_utf8(out).expect("utf8");
        assert!(rendered.contains("destroyed"), "{rendered}");
    }

    #[tokio::test]
    async fn catalogue_lists_entries_in_provider_order() {
        let backend = ScriptedBackend::new();
        backend.set_references(
            ReferenceKind::Size,
            vec![
                ReferenceEntry::new(66_u64, "512MB"),
                ReferenceEntry::new(63_u64, "1GB"),
            ],
        );
        let session = Session::new(backend);
        let mut out = Vec::new();

        list_catalogue(&session, ReferenceKind::Size, &mut out)
            .await
            .expect("list");

        assert_eq!(
            String::from_utf8(out).expect("utf8"),
            "Id  Name\n66  512MB\n63  1GB\n"
        );
    }

    #[tokio::test]
    async fn catalogue_failure_is_provider_error() {
        let backend = ScriptedBackend::new();
        backend.fail_reference_list(ReferenceKind::Image);
        let session = Session::new(backend);

        let err = list_catalogue(&session, ReferenceKind::Image, &mut Vec::new())
            .await
            .expect_err("list fails");

        assert!(matches!(err, CommandError::Provider(ScriptedError::Remote(_))));
    }
}
