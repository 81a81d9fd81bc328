// Copyright (c) Hedera Bridge Contributors
// SPDX-License-Identifier: Apache-2.0

//! Authorises transfers towards EVM chains through the Hedera message topic.

use super::{Progress, Scheduler, Submitted};
use crate::hedera::MessageSubmitter;
use crate::types::{EventKind, EventRecord, Transfer};
use std::sync::Arc;
use tracing::{error, info};

pub struct TransferService {
    scheduler: Arc<Scheduler>,
    submitter: Arc<dyn MessageSubmitter>,
}

impl TransferService {
    pub fn new(scheduler: Arc<Scheduler>, submitter: Arc<dyn MessageSubmitter>) -> Self {
        Self {
            scheduler,
            submitter,
        }
    }

    pub async fn process_transfer(&self, transfer: Transfer) {
        let id = transfer.transaction_id.clone();
        let record = EventRecord::initial(EventKind::Transfer, &transfer, &transfer.target_asset);
        match self.scheduler.create_record(&record).await {
            Some(Progress::Start) => {}
            Some(Progress::Resume(submitted)) => {
                self.scheduler
                    .spawn_finalize(id, EventKind::Transfer, submitted);
                return;
            }
            None => return,
        }

        let transaction_id = match self.submitter.submit_message(&transfer).await {
            Ok(transaction_id) => transaction_id,
            Err(e) => {
                error!(
                    "[Settlement:transfer] Failed to submit authorisation for {}: {}",
                    id, e
                );
                self.scheduler.fail(&id, EventKind::Transfer).await;
                return;
            }
        };
        info!(
            "[Settlement:transfer] Submitted authorisation {} for {} to chain {}",
            transaction_id, id, transfer.target_chain_id
        );

        let submitted = Submitted {
            schedule_id: None,
            transaction_id,
        };
        self.scheduler
            .mark_submitted(&id, EventKind::Transfer, &submitted)
            .await;
        self.scheduler
            .spawn_finalize(id, EventKind::Transfer, submitted);
    }
}
