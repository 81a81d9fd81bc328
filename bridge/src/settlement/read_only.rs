// Copyright (c) Hedera Bridge Contributors
// SPDX-License-Identifier: Apache-2.0

//! Historical events: other validators settled them, this node only records the result.

use super::{Progress, Scheduler, Submitted};
use crate::hedera::LedgerError;
use crate::retry_with_max_elapsed_time;
use crate::types::{EventKind, EventRecord, Transfer};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

pub struct ReadOnlyService {
    scheduler: Arc<Scheduler>,
    lookup_timeout: Duration,
}

impl ReadOnlyService {
    pub fn new(scheduler: Arc<Scheduler>, lookup_timeout: Duration) -> Self {
        Self {
            scheduler,
            lookup_timeout,
        }
    }

    /// Records the transfer. The ledger lookup runs on the settlement tracker, off the
    /// topic consumer.
    pub async fn process_transfer(&self, transfer: Transfer) {
        let id = transfer.transaction_id.clone();
        let record = EventRecord::initial(EventKind::ReadOnly, &transfer, &transfer.target_asset);
        let Some(progress) = self.scheduler.create_record(&record).await else {
            return;
        };

        let scheduler = self.scheduler.clone();
        let lookup_timeout = self.lookup_timeout;
        self.scheduler.spawn(async move {
            let submitted = match progress {
                Progress::Resume(submitted) => submitted,
                Progress::Start => match settlement_of(&scheduler, &id, lookup_timeout).await {
                    Some(submitted) => submitted,
                    None => return,
                },
            };
            scheduler
                .finalize(&id, EventKind::ReadOnly, &submitted)
                .await;
        });
    }
}

/// Finds the transaction other validators settled `id` with and marks the record
/// `Submitted`. Marks it `Failed` when nothing shows up within `lookup_timeout`.
async fn settlement_of(
    scheduler: &Scheduler,
    id: &str,
    lookup_timeout: Duration,
) -> Option<Submitted> {
    let transaction_id = match retry_with_max_elapsed_time!(lookup(scheduler, id), lookup_timeout) {
        Ok(Ok(transaction_id)) => transaction_id,
        Ok(Err(e)) | Err(e) => {
            warn!(
                "[Settlement:read_only] No settlement found for {} within {:?}: {}",
                id, lookup_timeout, e
            );
            scheduler.fail(id, EventKind::ReadOnly).await;
            return None;
        }
    };
    info!(
        "[Settlement:read_only] Event {} settled by {}",
        id, transaction_id
    );

    let submitted = Submitted {
        schedule_id: None,
        transaction_id,
    };
    scheduler
        .mark_submitted(id, EventKind::ReadOnly, &submitted)
        .await;
    Some(submitted)
}

async fn lookup(scheduler: &Scheduler, id: &str) -> Result<String, LedgerError> {
    scheduler
        .ledger()
        .find_transfer_transaction(id)
        .await?
        .ok_or_else(|| LedgerError::NotFound(id.to_string()))
}
