//! Once-per-session automatic sync

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use super::ListSyncEngine;
use crate::config::BackendConfig;
use crate::models::{ListDefinition, SyncReport};
use crate::repository::ListRepository;

/// Startup trigger that runs a sync at most once per session.
///
/// The first call waits for the configured delay, then syncs; every later call
/// returns `None` immediately.
#[derive(Debug)]
pub struct SessionSync {
    delay: Duration,
    fired: AtomicBool,
}

impl SessionSync {
    pub const fn new(delay: Duration) -> Self {
        Self {
            delay,
            fired: AtomicBool::new(false),
        }
    }

    pub const fn from_config(config: &BackendConfig) -> Self {
        Self::new(config.startup_delay)
    }

    pub fn has_fired(&self) -> bool {
        self.fired.load(Ordering::Acquire)
    }

    pub async fn run_once<R: ListRepository>(
        &self,
        engine: &ListSyncEngine<R>,
        definitions: &[ListDefinition],
    ) -> Option<SyncReport> {
        if self.fired.swap(true, Ordering::AcqRel) {
            tracing::debug!("Startup sync already ran this session");
            return None;
        }

        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        Some(engine.auto_sync(definitions).await)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ListTarget;
    use crate::repository::MemoryListRepository;

    #[tokio::test]
    async fn runs_only_once() {
        let engine = ListSyncEngine::new(MemoryListRepository::new(ListTarget::System));
        let session = SessionSync::new(Duration::ZERO);
        let definitions = vec![ListDefinition::new("formats", "Formats")];

        let first = session.run_once(&engine, &definitions).await.unwrap();
        assert_eq!(first.created, 1);
        assert!(session.has_fired());

        assert!(session.run_once(&engine, &definitions).await.is_none());
        assert_eq!(engine.repository().write_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn waits_for_startup_delay() {
        let engine = ListSyncEngine::new(MemoryListRepository::new(ListTarget::System));
        let session = SessionSync::new(Duration::from_secs(2));
        let started = tokio::time::Instant::now();

        let report = session
            .run_once(&engine, &[ListDefinition::new("formats", "Formats")])
            .await
            .unwrap();

        assert_eq!(report.created, 1);
        assert!(started.elapsed() >= Duration::from_secs(2));
    }
}
