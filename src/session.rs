//! Per-invocation account context and its reference-data cache.
//!
//! A [`Session`] is built once per command from validated configuration and
//! passed by reference to every operation. Reference catalogues are fetched
//! on first use and kept for the lifetime of the session.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::debug;

use crate::backend::Backend;
use crate::resource::{ReferenceEntry, ReferenceId, ReferenceKind};

/// Account context: the provider backend plus memoised reference data.
#[derive(Debug)]
pub struct Session<B> {
    backend: B,
    references: Mutex<HashMap<ReferenceKind, Arc<[ReferenceEntry]>>>,
}

impl<B: Backend> Session<B> {
    /// Wraps an already configured backend.
    #[must_use]
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            references: Mutex::new(HashMap::new()),
        }
    }

    /// Borrows the provider backend.
    #[must_use]
    pub const fn backend(&self) -> &B {
        &self.backend
    }

    /// Returns the catalogue for `kind`, fetching it on first access.
    ///
    /// Failed fetches are not cached, so a later call retries.
    ///
    /// # Errors
    ///
    /// Returns the backend error when the remote list call fails.
    pub async fn references(
        &self,
        kind: ReferenceKind,
    ) -> Result<Arc<[ReferenceEntry]>, B::Error> {
        let mut cache = self.references.lock().await;
        if let Some(entries) = cache.get(&kind) {
            return Ok(Arc::clone(entries));
        }

        debug!(
            provider = self.backend.provider_name(),
            kind = %kind,
            "loading reference data"
        );
        let entries: Arc<[ReferenceEntry]> =
            self.backend.list_reference_data(kind).await?.into();
        cache.insert(kind, Arc::clone(&entries));
        Ok(entries)
    }

    /// Resolves the display name for a catalogue id, falling back to the raw
    /// id when the catalogue has no matching entry.
    ///
    /// # Errors
    ///
    /// Returns the backend error when the catalogue cannot be loaded.
    pub async fn name_for(
        &self,
        kind: ReferenceKind,
        id: &ReferenceId,
    ) -> Result<String, B::Error> {
        let entries = self.references(kind).await?;
        Ok(entries
            .iter()
            .find(|entry| entry.id == *id)
            .map_or_else(|| id.to_string(), |entry| entry.name.clone()))
    }

    /// Renders `name (id)` for tables.
    ///
    /// # Errors
    ///
    /// Returns the backend error when the catalogue cannot be loaded.
    pub async fn labelled(&self, kind: ReferenceKind, id: u64) -> Result<String, B::Error> {
        let name = self.name_for(kind, &ReferenceId::from(id)).await?;
        Ok(format!("{name} ({id})"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{ScriptedBackend, ScriptedError};

    fn session_with_regions() -> Session<ScriptedBackend> {
        let backend = ScriptedBackend::new();
        backend.set_references(
            ReferenceKind::Region,
            vec![
                ReferenceEntry::new(1_u64, "New York 1"),
                ReferenceEntry::new(2_u64, "Amsterdam 1"),
            ],
        );
        Session::new(backend)
    }

    #[tokio::test]
    async fn repeated_lookups_issue_one_list_call() {
        let session = session_with_regions();

        for _ in 0..5 {
            let name = session
                .name_for(ReferenceKind::Region, &ReferenceId::from(2_u64))
                .await
                .expect("lookup should succeed");
            assert_eq!(name, "Amsterdam 1");
        }
        session
            .references(ReferenceKind::Region)
            .await
            .expect("list should succeed");

        assert_eq!(
            session
                .backend()
                .reference_calls(ReferenceKind::Region),
            1
        );
    }

    #[tokio::test]
    async fn unknown_id_renders_raw_value() {
        let session = session_with_regions();
        let label = session
            .labelled(ReferenceKind::Region, 99)
            .await
            .expect("lookup should succeed");
        assert_eq!(label, "99 (99)");
    }

    #[tokio::test]
    async fn kinds_are_cached_independently() {
        let session = session_with_regions();
        session
            .backend()
            .set_references(ReferenceKind::Size, vec![ReferenceEntry::new(66_u64, "512MB")]);

        let region = session
            .name_for(ReferenceKind::Region, &ReferenceId::from(1_u64))
            .await
            .expect("region");
        let size = session
            .name_for(ReferenceKind::Size, &ReferenceId::from(66_u64))
            .await
            .expect("size");

        assert_eq!((region.as_str(), size.as_str()), ("New York 1", "512MB"));
        assert_eq!(session.backend().reference_calls(ReferenceKind::Size), 1);
    }

    #[tokio::test]
    async fn failed_list_is_returned_and_not_cached() {
        let session = session_with_regions();
        session.backend().fail_reference_list(ReferenceKind::Region);

        let err = session
            .references(ReferenceKind::Region)
            .await
            .expect_err("list should fail");
        assert_eq!(err, ScriptedError::Remote(String::from("regions")));

        session.backend().clear_failures();
        session
            .references(ReferenceKind::Region)
            .await
            .expect("retry should succeed");
        assert_eq!(
            session
                .backend()
                .reference_calls(ReferenceKind::Region),
            2
        );
    }
}
