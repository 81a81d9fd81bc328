// Copyright (c) Hedera Bridge Contributors
// SPDX-License-Identifier: Apache-2.0

//! Releases Hedera native assets after their wrapped version was burned on an EVM chain.

use super::{Progress, Scheduler};
use crate::assets::fee::{fee_transfers, ledger_amount};
use crate::assets::AssetRegistry;
use crate::error::{BridgeError, BridgeResult};
use crate::hedera::{AccountId, ScheduleRequest, ScheduledTransaction};
use crate::types::{BurnEvent, EventKind, EventRecord, Transfer};
use std::str::FromStr;
use std::sync::Arc;
use tracing::{error, info};

pub struct BurnEventService {
    scheduler: Arc<Scheduler>,
    assets: Arc<AssetRegistry>,
}

impl BurnEventService {
    pub fn new(scheduler: Arc<Scheduler>, assets: Arc<AssetRegistry>) -> Self {
        Self { scheduler, assets }
    }

    pub async fn process_event(&self, event: BurnEvent) {
        let transfer = event.transfer;
        let id = transfer.transaction_id.clone();
        let record = EventRecord::initial(EventKind::Burn, &transfer, &transfer.source_asset);
        match self.scheduler.create_record(&record).await {
            Some(Progress::Start) => {}
            Some(Progress::Resume(submitted)) => {
                self.scheduler.spawn_finalize(id, EventKind::Burn, submitted);
                return;
            }
            None => return,
        }

        let request = match self.schedule_request(&transfer) {
            Ok(request) => request,
            Err(e) => {
                error!("[Settlement:burn] Cannot build schedule for {}: {}", id, e);
                self.scheduler.fail(&id, EventKind::Burn).await;
                return;
            }
        };
        let Some(submitted) = self
            .scheduler
            .submit_schedule(&id, EventKind::Burn, request)
            .await
        else {
            return;
        };

        info!(
            "[Settlement:burn] Waiting for {} of event {}",
            submitted.transaction_id, id
        );
        self.scheduler.spawn_finalize(id, EventKind::Burn, submitted);
    }

    fn schedule_request(&self, transfer: &Transfer) -> BridgeResult<ScheduleRequest> {
        let accounts = &self.scheduler.accounts;
        let receiver = AccountId::from_str(&transfer.receiver)
            .map_err(|e| BridgeError::InvalidReceiver(e.to_string()))?;

        let transaction = if transfer.is_nft {
            let serial_num = transfer.serial_num.ok_or_else(|| {
                BridgeError::InternalError(format!(
                    "nft transfer {} without serial number",
                    transfer.transaction_id
                ))
            })?;
            ScheduledTransaction::NftTransfer {
                token: transfer.native_asset.clone(),
                serial_num,
                sender: accounts.bridge_account,
                receiver,
            }
        } else {
            let native = self
                .assets
                .fungible_native_asset(transfer.native_chain_id, &transfer.native_asset)
                .ok_or_else(|| BridgeError::UnsupportedAsset {
                    chain_id: transfer.native_chain_id,
                    asset: transfer.native_asset.clone(),
                })?;
            let amount = ledger_amount(&transfer.amount)?;
            ScheduledTransaction::Transfer {
                token: transfer.native_asset.clone(),
                transfers: fee_transfers(
                    amount,
                    native.fee_percentage,
                    accounts.bridge_account,
                    receiver,
                    &accounts.members,
                )?,
            }
        };

        Ok(ScheduleRequest {
            memo: transfer.transaction_id.clone(),
            payer: accounts.payer_account,
            transaction,
        })
    }
}
