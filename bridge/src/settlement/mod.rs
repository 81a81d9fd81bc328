// Copyright (c) Hedera Bridge Contributors
// SPDX-License-Identifier: Apache-2.0

//! Settlement of queued transfers.
//!
//! Every event id follows `Initial -> Submitted -> {Completed | Failed}`:
//!
//! 1. the record is created; on a duplicate id the stored record decides: a terminal
//!    record stops processing, an `Initial` one starts over and a `Submitted` one only
//!    waits for the outcome again,
//! 2. a scheduled transaction is submitted; when another validator already created the
//!    identical schedule this node signs it instead and converges on its ids,
//! 3. the record is marked `Submitted` with the schedule and transaction ids,
//! 4. a finalisation task waits for the ledger outcome and records the terminal status.
//!
//! Finalisation tasks run on a shared [`TaskTracker`] so shutdown can drain them.

use crate::hedera::{
    AccountId, ScheduleRequest, ScheduleStatus, ScheduledLedger, TransactionWatcher, TxOutcome,
};
use crate::metrics::BridgeMetrics;
use crate::storage::{EventStore, StoreError};
use crate::types::{EventKind, EventRecord, EventStatus};
use std::collections::HashSet;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio_util::task::TaskTracker;
use tracing::{error, info, warn};

pub mod burn;
pub mod lock;
pub mod read_only;
pub mod transfer;

pub use burn::BurnEventService;
pub use lock::LockEventService;
pub use read_only::ReadOnlyService;
pub use transfer::TransferService;

#[derive(Debug, Clone)]
pub struct HederaAccounts {
    pub bridge_account: AccountId,
    pub payer_account: AccountId,
    pub members: Vec<AccountId>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Submitted {
    pub schedule_id: Option<String>,
    pub transaction_id: String,
}

/// Where a delivered event continues.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Progress {
    /// New record, or one an interrupted run left `Initial`.
    Start,
    /// Submitted by an earlier run that never saw the outcome.
    Resume(Submitted),
}

/// State machine steps shared by all settlement services.
pub struct Scheduler {
    ledger: Arc<dyn ScheduledLedger>,
    watcher: Arc<dyn TransactionWatcher>,
    store: Arc<dyn EventStore>,
    tracker: TaskTracker,
    metrics: Arc<BridgeMetrics>,
    // ids settling in this process
    active: Mutex<HashSet<String>>,
    pub(crate) accounts: HederaAccounts,
}

impl Scheduler {
    pub fn new(
        ledger: Arc<dyn ScheduledLedger>,
        watcher: Arc<dyn TransactionWatcher>,
        store: Arc<dyn EventStore>,
        tracker: TaskTracker,
        metrics: Arc<BridgeMetrics>,
        accounts: HederaAccounts,
    ) -> Self {
        Self {
            ledger,
            watcher,
            store,
            tracker,
            metrics,
            active: Mutex::new(HashSet::new()),
            accounts,
        }
    }

    pub(crate) fn ledger(&self) -> &Arc<dyn ScheduledLedger> {
        &self.ledger
    }

    /// Persists the record with `Initial` status, or picks up the stored one. Returns
    /// `None` when processing must stop.
    pub(crate) async fn create_record(&self, record: &EventRecord) -> Option<Progress> {
        if !self.active.lock().await.insert(record.id.clone()) {
            info!(
                "[Settlement:{}] Event {} is already being settled, skipping",
                record.kind, record.id
            );
            return None;
        }
        let progress = match self.store.create(record).await {
            Ok(()) => {
                self.observe(record.kind, EventStatus::Initial);
                Some(Progress::Start)
            }
            Err(StoreError::AlreadyExists(_)) => self.recorded_progress(record).await,
            Err(e) => {
                error!(
                    "[Settlement:{}] Failed to create record for {}: {}",
                    record.kind, record.id, e
                );
                None
            }
        };
        if progress.is_none() {
            self.release(&record.id).await;
        }
        progress
    }

    async fn recorded_progress(&self, record: &EventRecord) -> Option<Progress> {
        let existing = match self.store.get(&record.id).await {
            Ok(Some(existing)) => existing,
            Ok(None) => {
                error!(
                    "[Settlement:{}] Record {} reported as duplicate but not found",
                    record.kind, record.id
                );
                return None;
            }
            Err(e) => {
                error!(
                    "[Settlement:{}] Failed to load record {}: {}",
                    record.kind, record.id, e
                );
                return None;
            }
        };
        match (existing.status, existing.transaction_id) {
            (EventStatus::Submitted, Some(transaction_id)) => {
                info!(
                    "[Settlement:{}] Resuming finalisation of {} with {}",
                    record.kind, record.id, transaction_id
                );
                Some(Progress::Resume(Submitted {
                    schedule_id: existing.schedule_id,
                    transaction_id,
                }))
            }
            (EventStatus::Initial, _) | (EventStatus::Submitted, None) => {
                info!(
                    "[Settlement:{}] Restarting interrupted settlement of {}",
                    record.kind, record.id
                );
                Some(Progress::Start)
            }
            (status, _) => {
                info!(
                    "[Settlement:{}] Event {} already {}, skipping",
                    record.kind, record.id, status
                );
                None
            }
        }
    }

    pub(crate) async fn release(&self, id: &str) {
        self.active.lock().await.remove(id);
    }

    /// Submits a schedule and marks the record `Submitted`. Returns `None` after marking the
    /// record `Failed`.
    pub(crate) async fn submit_schedule(
        &self,
        id: &str,
        kind: EventKind,
        request: ScheduleRequest,
    ) -> Option<Submitted> {
        let submission = match self.ledger.submit_schedule(request).await {
            Ok(submission) => submission,
            Err(e) => {
                error!("[Settlement:{}] Failed to submit schedule for {}: {}", kind, id, e);
                self.fail(id, kind).await;
                return None;
            }
        };
        match submission.status {
            ScheduleStatus::Success => {
                info!(
                    "[Settlement:{}] Created schedule {} for {}",
                    kind, submission.schedule_id, id
                );
            }
            ScheduleStatus::IdenticalScheduleAlreadyCreated => {
                info!(
                    "[Settlement:{}] Schedule {} for {} already created, signing it",
                    kind, submission.schedule_id, id
                );
                if let Err(e) = self.ledger.sign_schedule(&submission.schedule_id).await {
                    error!(
                        "[Settlement:{}] Failed to sign schedule {} for {}: {}",
                        kind, submission.schedule_id, id, e
                    );
                    self.fail(id, kind).await;
                    return None;
                }
            }
            ScheduleStatus::Other => {
                error!(
                    "[Settlement:{}] Schedule for {} rejected by the ledger",
                    kind, id
                );
                self.fail(id, kind).await;
                return None;
            }
        }
        let submitted = Submitted {
            schedule_id: Some(submission.schedule_id),
            transaction_id: submission.transaction_id,
        };
        self.mark_submitted(id, kind, &submitted).await;
        Some(submitted)
    }

    pub(crate) async fn mark_submitted(&self, id: &str, kind: EventKind, submitted: &Submitted) {
        match self
            .store
            .update_submitted(
                id,
                submitted.schedule_id.as_deref(),
                &submitted.transaction_id,
            )
            .await
        {
            Ok(()) => self.observe(kind, EventStatus::Submitted),
            // finalisation still records the terminal status
            Err(e) => error!(
                "[Settlement:{}] Failed to mark {} submitted with {}: {}",
                kind, id, submitted.transaction_id, e
            ),
        }
    }

    /// Waits for the ledger outcome of `transaction_id`. `None` when the watch was abandoned;
    /// the record of `id` then stays `Submitted` for a later delivery to resume.
    pub(crate) async fn await_outcome(&self, id: &str, transaction_id: &str) -> Option<TxOutcome> {
        self.metrics.settlements_in_flight.inc();
        let outcome = self.watcher.watch(transaction_id).await;
        self.metrics.settlements_in_flight.dec();
        match outcome {
            Ok(outcome) => Some(outcome),
            Err(_) => {
                warn!(
                    "[Settlement] Stopped waiting for {}, record {} stays submitted",
                    transaction_id, id
                );
                self.release(id).await;
                None
            }
        }
    }

    pub(crate) async fn finish(&self, id: &str, kind: EventKind, outcome: TxOutcome) {
        let status = match outcome {
            TxOutcome::Success => {
                info!("[Settlement:{}] Event {} completed", kind, id);
                EventStatus::Completed
            }
            TxOutcome::Failed(reason) => {
                warn!("[Settlement:{}] Event {} failed on ledger: {}", kind, id, reason);
                EventStatus::Failed
            }
        };
        self.set_status(id, kind, status).await;
    }

    pub(crate) async fn fail(&self, id: &str, kind: EventKind) {
        self.set_status(id, kind, EventStatus::Failed).await;
    }

    async fn set_status(&self, id: &str, kind: EventKind, status: EventStatus) {
        match self.store.update_status(id, status).await {
            Ok(()) => self.observe(kind, status),
            Err(e) => error!(
                "[Settlement:{}] Failed to set {} on {}: {}",
                kind, status, id, e
            ),
        }
        self.release(id).await;
    }

    /// Waits for `submitted` and records the terminal status.
    pub(crate) async fn finalize(&self, id: &str, kind: EventKind, submitted: &Submitted) {
        if let Some(outcome) = self.await_outcome(id, &submitted.transaction_id).await {
            self.finish(id, kind, outcome).await;
        }
    }

    pub(crate) fn spawn_finalize(self: &Arc<Self>, id: String, kind: EventKind, submitted: Submitted) {
        let scheduler = self.clone();
        self.tracker.spawn(async move {
            scheduler.finalize(&id, kind, &submitted).await;
        });
    }

    pub(crate) fn spawn<F>(&self, task: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        self.tracker.spawn(task);
    }

    fn observe(&self, kind: EventKind, status: EventStatus) {
        self.metrics
            .settlement_transitions
            .with_label_values(&[kind.as_ref(), status.as_ref()])
            .inc();
    }
}
