//! Engine object with an explicit lifecycle.
//!
//! Nothing starts by itself: the caller constructs the engine, drives
//! `sync()` directly (deterministic tests), or calls `start()` to spawn
//! the interval loop and `stop()` to tear it down. Scheduled and manual
//! cycles serialize through one mutex, so two syncs never overlap.

use crate::cases::CaseRepository;
use crate::config::EngineConfig;
use crate::error::{EngineError, Result};
use crate::linker::Linker;
use crate::poller::{PollCycle, SyncReport};
use dossier_protocol::{CaseRef, DocSlot, Suggestion, SuggestionStatus};
use dossier_remote::RemoteStore;
use dossier_store::{AuditLog, SuggestionStore};
use sqlx::{Pool, Sqlite};
use std::sync::{Arc, Mutex as StdMutex};
use std::time::Duration;
use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;
use tracing::{info, warn};

pub struct Engine {
    remote: Arc<dyn RemoteStore>,
    cases: Arc<dyn CaseRepository>,
    store: SuggestionStore,
    audit: AuditLog,
    config: EngineConfig,
    sync_lock: Mutex<()>,
    shutdown_tx: watch::Sender<bool>,
    poll_task: StdMutex<Option<JoinHandle<()>>>,
}

impl Engine {
    pub fn new(
        config: EngineConfig,
        remote: Arc<dyn RemoteStore>,
        cases: Arc<dyn CaseRepository>,
        pool: Pool<Sqlite>,
    ) -> Self {
        let (shutdown_tx, _) = watch::channel(false);
        Self {
            remote,
            cases,
            store: SuggestionStore::new(pool.clone()),
            audit: AuditLog::new(pool),
            config,
            sync_lock: Mutex::new(()),
            shutdown_tx,
            poll_task: StdMutex::new(None),
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn store(&self) -> &SuggestionStore {
        &self.store
    }

    pub fn audit(&self) -> &AuditLog {
        &self.audit
    }

    /// Run one sync cycle, waiting if another is in flight.
    pub async fn sync(&self) -> Result<SyncReport> {
        let _guard = self.sync_lock.lock().await;
        self.run_cycle().await
    }

    /// On-demand sync. Rejected when a cycle is already running rather
    /// than queueing a second one.
    pub async fn sync_now(&self) -> Result<SyncReport> {
        let _guard = self
            .sync_lock
            .try_lock()
            .map_err(|_| EngineError::SyncInProgress)?;
        self.run_cycle().await
    }

    async fn run_cycle(&self) -> Result<SyncReport> {
        let known_cases = self.cases.list_cases().await?;
        PollCycle {
            remote: self.remote.as_ref(),
            store: &self.store,
            known_cases: &known_cases,
            config: &self.config,
        }
        .run()
        .await
    }

    /// Spawn the interval loop: one immediate cycle, then one per
    /// configured interval. No-op if already started.
    pub fn start(self: &Arc<Self>) {
        let mut slot = match self.poll_task.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        if slot.is_some() {
            warn!("polling already started");
            return;
        }

        let engine = Arc::clone(self);
        let mut shutdown_rx = self.shutdown_tx.subscribe();
        let interval = Duration::from_secs(self.config.poll_interval_secs.max(1));
        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            info!(interval_secs = interval.as_secs(), "polling started");
            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        // A failed cycle must never kill the loop; the next
                        // tick retries.
                        if let Err(e) = engine.sync().await {
                            warn!(error = %e, "sync cycle failed");
                        }
                    }
                    _ = shutdown_rx.changed() => break,
                }
            }
            info!("polling stopped");
        });
        *slot = Some(handle);
    }

    /// Cancel the interval loop and wait for any in-flight cycle to
    /// finish. Partial upserts are harmless - they are idempotent.
    pub async fn stop(&self) {
        let _ = self.shutdown_tx.send(true);
        let handle = {
            let mut slot = match self.poll_task.lock() {
                Ok(guard) => guard,
                Err(poisoned) => poisoned.into_inner(),
            };
            slot.take()
        };
        if let Some(handle) = handle {
            let _ = handle.await;
        }
    }

    /// Attach a pending suggestion to a case slot. See [`EngineError::SlotConflict`]
    /// for the occupied-slot contract.
    pub async fn link(
        &self,
        suggestion_id: &str,
        case_id: &str,
        slot: DocSlot,
        actor: &str,
        overwrite: bool,
    ) -> Result<()> {
        self.linker()
            .link(suggestion_id, case_id, slot, actor, overwrite)
            .await
    }

    /// Dismiss a pending suggestion with a reason.
    pub async fn ignore(&self, suggestion_id: &str, reason: &str, actor: &str) -> Result<()> {
        self.linker().ignore(suggestion_id, reason, actor).await
    }

    /// Create a case and link the suggestion into it in one step.
    pub async fn link_as_new_case(
        &self,
        suggestion_id: &str,
        case_name: &str,
        slot: DocSlot,
        actor: &str,
    ) -> Result<CaseRef> {
        self.linker()
            .link_as_new_case(suggestion_id, case_name, slot, actor)
            .await
    }

    /// All pending suggestions, newest first.
    pub async fn pending(&self) -> Result<Vec<Suggestion>> {
        Ok(self.store.list_by_status(SuggestionStatus::Pending).await?)
    }

    /// Pending suggestions guessed to belong to one case.
    pub async fn pending_for_case(&self, case_id: &str) -> Result<Vec<Suggestion>> {
        Ok(self.store.pending_for_case(case_id).await?)
    }

    fn linker(&self) -> Linker<'_> {
        Linker {
            store: &self.store,
            audit: &self.audit,
            cases: self.cases.as_ref(),
        }
    }
}
