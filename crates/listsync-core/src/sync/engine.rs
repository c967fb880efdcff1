//! The list synchronization engine

use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Instant;

use chrono::{DateTime, Utc};

use super::diff::ListDiff;
use super::plan::{PlanAction, PlanItem, SyncPlan};
use crate::error::{Error, Result};
use crate::models::{ListDefinition, ListTarget, NewList, SyncReport};
use crate::repository::ListRepository;

type SyncListener = Arc<dyn Fn(&SyncReport) + Send + Sync>;

/// Handle returned by [`ListSyncEngine::add_sync_listener`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Outcome {
    Created,
    Updated,
    Skipped,
}

/// Reconciles list definitions with a repository.
///
/// Definitions are processed sequentially in input order. A failing
/// definition is recorded in the report and never aborts the batch, so
/// `auto_sync` always returns a report. The engine holds no lock on the
/// backend: concurrent runs are allowed and resolve last-write-wins.
pub struct ListSyncEngine<R> {
    repository: R,
    running: AtomicUsize,
    last_sync: Mutex<Option<DateTime<Utc>>>,
    listeners: Mutex<Vec<(ListenerId, SyncListener)>>,
    next_listener: AtomicU64,
}

impl<R: ListRepository> ListSyncEngine<R> {
    pub fn new(repository: R) -> Self {
        Self {
            repository,
            running: AtomicUsize::new(0),
            last_sync: Mutex::new(None),
            listeners: Mutex::new(Vec::new()),
            next_listener: AtomicU64::new(0),
        }
    }

    pub const fn repository(&self) -> &R {
        &self.repository
    }

    pub fn target(&self) -> ListTarget {
        self.repository.target()
    }

    /// Advisory flag for UIs; not a mutual-exclusion guarantee
    pub fn is_sync_in_progress(&self) -> bool {
        self.running.load(Ordering::Acquire) > 0
    }

    /// Completion time of the most recent run
    pub fn last_sync_time(&self) -> Option<DateTime<Utc>> {
        *lock(&self.last_sync)
    }

    /// Register a callback invoked with the report after every completed run
    pub fn add_sync_listener<F>(&self, listener: F) -> ListenerId
    where
        F: Fn(&SyncReport) + Send + Sync + 'static,
    {
        let id = ListenerId(self.next_listener.fetch_add(1, Ordering::Relaxed));
        lock(&self.listeners).push((id, Arc::new(listener)));
        id
    }

    /// Returns `false` when the listener was not registered
    pub fn remove_sync_listener(&self, id: ListenerId) -> bool {
        let mut listeners = lock(&self.listeners);
        let before = listeners.len();
        listeners.retain(|(listener_id, _)| *listener_id != id);
        listeners.len() != before
    }

    /// Bring the repository in line with `definitions`.
    pub async fn auto_sync(&self, definitions: &[ListDefinition]) -> SyncReport {
        let _running = RunningGuard::enter(&self.running);
        let started = Instant::now();
        let mut report = SyncReport::new(self.target(), Utc::now().timestamp_millis());
        tracing::debug!(
            "Syncing {} {} list definitions",
            definitions.len(),
            report.target
        );

        let mut seen = HashSet::with_capacity(definitions.len());
        for definition in definitions {
            let result = match admit(definition, &mut seen) {
                Ok(()) => self.sync_definition(definition).await,
                Err(error) => Err(error),
            };

            match result {
                Ok(Outcome::Created) => report.created += 1,
                Ok(Outcome::Updated) => report.updated += 1,
                Ok(Outcome::Skipped) => report.skipped += 1,
                Err(error) => {
                    tracing::warn!("Failed to sync list '{}': {}", definition.code, error);
                    report.record_failure(definition.code.clone(), error.to_string());
                }
            }
        }

        report.duration_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
        *lock(&self.last_sync) = Some(Utc::now());
        tracing::info!("Sync finished: {}", report.summary());

        self.notify(&report);
        report
    }

    /// Compute what `auto_sync` would do without writing anything
    pub async fn check(&self, definitions: &[ListDefinition]) -> SyncPlan {
        let mut items = Vec::with_capacity(definitions.len());
        let mut seen = HashSet::with_capacity(definitions.len());

        for definition in definitions {
            let item = match admit(definition, &mut seen) {
                Ok(()) => self.plan_definition(definition).await,
                Err(error) => Err(error),
            };

            items.push(item.unwrap_or_else(|error| PlanItem {
                code: definition.code.clone(),
                action: PlanAction::Failed {
                    message: error.to_string(),
                },
                stale_values: 0,
            }));
        }

        SyncPlan {
            target: self.target(),
            items,
        }
    }

    async fn sync_definition(&self, definition: &ListDefinition) -> Result<Outcome> {
        let Some(stored) = self.repository.find_by_code(&definition.code).await? else {
            self.repository.insert(&NewList::from(definition)).await?;
            tracing::debug!("Created list '{}'", definition.code);
            return Ok(Outcome::Created);
        };

        let diff = ListDiff::compute(definition, &stored);
        if diff.stale_values > 0 {
            tracing::debug!(
                "List '{}' keeps {} values missing from its definition",
                definition.code,
                diff.stale_values
            );
        }
        if !diff.has_changes() {
            return Ok(Outcome::Skipped);
        }

        let changes = diff.describe();
        self.repository
            .update(&diff.into_update(definition, &stored))
            .await?;
        tracing::debug!(
            "Updated list '{}': {}",
            definition.code,
            changes.join(", ")
        );
        Ok(Outcome::Updated)
    }

    async fn plan_definition(&self, definition: &ListDefinition) -> Result<PlanItem> {
        let item = match self.repository.find_by_code(&definition.code).await? {
            None => PlanItem {
                code: definition.code.clone(),
                action: PlanAction::Create {
                    values: definition.options.len(),
                },
                stale_values: 0,
            },
            Some(stored) => {
                let diff = ListDiff::compute(definition, &stored);
                let action = if diff.has_changes() {
                    PlanAction::Update {
                        changes: diff.describe(),
                    }
                } else {
                    PlanAction::Unchanged
                };
                PlanItem {
                    code: definition.code.clone(),
                    action,
                    stale_values: diff.stale_values,
                }
            }
        };
        Ok(item)
    }

    fn notify(&self, report: &SyncReport) {
        let listeners = lock(&self.listeners)
            .iter()
            .map(|(_, listener)| Arc::clone(listener))
            .collect::<Vec<_>>();
        for listener in listeners {
            listener(report);
        }
    }
}

/// Reject invalid definitions and repeated codes before any backend call.
///
/// The first occurrence of a code wins; later ones fail.
fn admit<'a>(definition: &'a ListDefinition, seen: &mut HashSet<&'a str>) -> Result<()> {
    definition.validate()?;
    if seen.insert(definition.code.as_str()) {
        Ok(())
    } else {
        Err(Error::InvalidDefinition(format!(
            "duplicate list code '{}'",
            definition.code
        )))
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Keeps the in-progress counter raised while a run is alive, including runs
/// whose future is dropped before completion.
struct RunningGuard<'a>(&'a AtomicUsize);

impl<'a> RunningGuard<'a> {
    fn enter(counter: &'a AtomicUsize) -> Self {
        counter.fetch_add(1, Ordering::AcqRel);
        Self(counter)
    }
}

impl Drop for RunningGuard<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::AcqRel);
    }
}
