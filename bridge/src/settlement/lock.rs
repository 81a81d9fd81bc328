// Copyright (c) Hedera Bridge Contributors
// SPDX-License-Identifier: Apache-2.0

//! Mints the wrapped token on Hedera and transfers it to the receiver.

use super::{Progress, Scheduler};
use crate::assets::fee::ledger_amount;
use crate::error::{BridgeError, BridgeResult};
use crate::hedera::{AccountAmount, AccountId, ScheduleRequest, ScheduledTransaction, TxOutcome};
use crate::types::{EventKind, EventRecord, LockEvent, Transfer};
use std::str::FromStr;
use std::sync::Arc;
use tracing::{error, info, warn};

pub struct LockEventService {
    scheduler: Arc<Scheduler>,
}

struct LockSchedules {
    mint: ScheduleRequest,
    transfer: ScheduleRequest,
}

impl LockEventService {
    pub fn new(scheduler: Arc<Scheduler>) -> Self {
        Self { scheduler }
    }

    pub async fn process_event(&self, event: LockEvent) {
        let transfer = event.transfer;
        let id = transfer.transaction_id.clone();
        let record = EventRecord::initial(EventKind::Lock, &transfer, &transfer.target_asset);
        let Some(progress) = self.scheduler.create_record(&record).await else {
            return;
        };

        let schedules = match self.schedules(&transfer) {
            Ok(schedules) => schedules,
            Err(e) => {
                error!("[Settlement:lock] Cannot build schedules for {}: {}", id, e);
                self.scheduler.fail(&id, EventKind::Lock).await;
                return;
            }
        };
        // a resumed record holds the ids of either the mint or the transfer
        let (recorded, resumed) = match progress {
            Progress::Start => {
                let Some(mint) = self
                    .scheduler
                    .submit_schedule(&id, EventKind::Lock, schedules.mint)
                    .await
                else {
                    return;
                };
                (mint, false)
            }
            Progress::Resume(submitted) => (submitted, true),
        };

        let scheduler = self.scheduler.clone();
        let transfer_request = schedules.transfer;
        self.scheduler.spawn(async move {
            match scheduler.await_outcome(&id, &recorded.transaction_id).await {
                Some(TxOutcome::Success) => {}
                Some(failed) => {
                    scheduler.finish(&id, EventKind::Lock, failed).await;
                    return;
                }
                None => return,
            }
            if resumed && transfer_executed(&scheduler, &id, &recorded.transaction_id).await {
                scheduler
                    .finish(&id, EventKind::Lock, TxOutcome::Success)
                    .await;
                return;
            }
            info!(
                "[Settlement:lock] Mint {} of {} executed",
                recorded.transaction_id, id
            );
            if let Some(transfer) = scheduler
                .submit_schedule(&id, EventKind::Lock, transfer_request)
                .await
            {
                scheduler.finalize(&id, EventKind::Lock, &transfer).await;
            }
        });
    }

    fn schedules(&self, transfer: &Transfer) -> BridgeResult<LockSchedules> {
        let accounts = &self.scheduler.accounts;
        let receiver = AccountId::from_str(&transfer.receiver)
            .map_err(|e| BridgeError::InvalidReceiver(e.to_string()))?;
        let amount = ledger_amount(&transfer.amount)?;
        let token = transfer.target_asset.clone();

        let request = |transaction| ScheduleRequest {
            memo: transfer.transaction_id.clone(),
            payer: accounts.payer_account,
            transaction,
        };
        Ok(LockSchedules {
            mint: request(ScheduledTransaction::TokenMint {
                token: token.clone(),
                amount,
            }),
            transfer: request(ScheduledTransaction::Transfer {
                token,
                transfers: vec![
                    AccountAmount {
                        account: accounts.bridge_account,
                        amount: -amount,
                    },
                    AccountAmount {
                        account: receiver,
                        amount,
                    },
                ],
            }),
        })
    }
}

/// Whether the ledger reports `transaction_id` as the transfer that settled `id`.
async fn transfer_executed(scheduler: &Scheduler, id: &str, transaction_id: &str) -> bool {
    match scheduler.ledger().find_transfer_transaction(id).await {
        Ok(found) => found.as_deref() == Some(transaction_id),
        Err(e) => {
            warn!("[Settlement:lock] Cannot look up transfer of {}: {}", id, e);
            false
        }
    }
}
