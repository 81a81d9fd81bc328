// Copyright (c) Hedera Bridge Contributors
// SPDX-License-Identifier: Apache-2.0

//! Router log watcher, one per EVM chain.
//!
//! The watcher scans confirmed blocks in bounded windows starting at the persisted
//! watermark. Every recognised log is validated, converted into a [`Transfer`] and pushed
//! to the dispatch queue. The watermark moves to `to + 1` only after the whole window was
//! handled, so a crash re-delivers at most one window.

use crate::assets::fee::convert_decimals;
use crate::assets::{AssetRegistry, PricingService};
use crate::error::{BridgeError, BridgeResult};
use crate::evm::abi::{BurnErc721Filter, BurnFilter, LockFilter};
use crate::evm::{log_transfer_id, ChainLogSource, FilterConfig, RouterEvent};
use crate::hedera::AccountId;
use crate::metrics::BridgeMetrics;
use crate::queue::{Message, Publisher, Topic};
use crate::storage::{StatusStore, StoreError};
use crate::types::{BurnEvent, LockEvent, Payload, Transfer};
use ethers::types::{Address, Bytes, Log, H256, U256};
use std::sync::Arc;
use std::time::Duration;
use tap::TapFallible;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

mod members;

pub use members::GovernanceMembers;

#[derive(Debug, Clone)]
pub struct WatcherConfig {
    /// Status store key, `<chainId>-<router>`.
    pub db_identifier: String,
    pub router: Address,
    pub start_block: Option<u64>,
    pub validator: bool,
    pub polling_interval: Duration,
    pub max_block_span: u64,
    pub hedera_network_id: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollOutcome {
    /// No new confirmed blocks.
    Idle,
    /// `[from, to]` was handled and the watermark moved to `to + 1`.
    Processed { from: u64, to: u64, more: bool },
}

pub struct Watcher {
    config: WatcherConfig,
    source: Arc<dyn ChainLogSource>,
    status: Arc<dyn StatusStore>,
    assets: Arc<AssetRegistry>,
    pricing: Arc<PricingService>,
    members: Arc<GovernanceMembers>,
    metrics: Arc<BridgeMetrics>,
    filter: FilterConfig,
    target_block: u64,
    chain_label: String,
}

impl Watcher {
    /// Resolves the starting watermark. A store failure here is fatal to the node.
    pub async fn new(
        config: WatcherConfig,
        source: Arc<dyn ChainLogSource>,
        status: Arc<dyn StatusStore>,
        assets: Arc<AssetRegistry>,
        pricing: Arc<PricingService>,
        members: Arc<GovernanceMembers>,
        metrics: Arc<BridgeMetrics>,
    ) -> BridgeResult<Self> {
        let chain_id = source.chain_id();
        let head = source.current_block().await?;
        let target_block = head.saturating_sub(source.required_confirmations());

        let id = &config.db_identifier;
        let watermark = match config.start_block {
            Some(start_block) => {
                info!(
                    "[{}] Forcing watermark of {} to block {}",
                    chain_id, id, start_block
                );
                match status.update(id, start_block as i64).await {
                    Err(StoreError::NotFound) => status.create(id, start_block as i64).await?,
                    other => other?,
                }
                start_block
            }
            None => match status.get(id).await {
                Ok(block) => block as u64,
                Err(StoreError::NotFound) => {
                    info!(
                        "[{}] First run of {}, starting at block {}",
                        chain_id, id, target_block
                    );
                    status.create(id, target_block as i64).await?;
                    target_block
                }
                Err(e) => return Err(e.into()),
            },
        };
        info!(
            "[{}] Watcher {} resumes at block {} (target block {})",
            chain_id, id, watermark, target_block
        );

        let filter = FilterConfig::router(config.router);
        Ok(Self {
            config,
            source,
            status,
            assets,
            pricing,
            members,
            metrics,
            filter,
            target_block,
            chain_label: chain_id.to_string(),
        })
    }

    pub fn target_block(&self) -> u64 {
        self.target_block
    }

    /// Spawns the polling loop and returns immediately.
    pub fn watch(self, queue: Arc<dyn Publisher>, cancel: CancellationToken) -> JoinHandle<()> {
        tokio::spawn(async move { self.run(queue, cancel).await })
    }

    async fn run(self, queue: Arc<dyn Publisher>, cancel: CancellationToken) {
        let chain_id = self.source.chain_id();
        info!(
            "[{}] Starting watcher {}",
            chain_id, self.config.db_identifier
        );
        loop {
            // A window abandoned mid-push is refetched on restart since the watermark only
            // moves after the whole window is queued.
            let polled = tokio::select! {
                _ = cancel.cancelled() => break,
                polled = self.poll_once(queue.as_ref()) => polled,
            };
            let more = match polled {
                Ok(PollOutcome::Processed { more, .. }) => more,
                Ok(PollOutcome::Idle) => false,
                Err(e) => {
                    warn!("[{}] Poll failed, retrying: {}", chain_id, e);
                    false
                }
            };
            if cancel.is_cancelled() {
                break;
            }
            if more {
                continue;
            }
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = tokio::time::sleep(self.config.polling_interval) => {}
            }
        }
        info!(
            "[{}] Watcher {} cancelled",
            chain_id, self.config.db_identifier
        );
    }

    /// Handles one window. Nothing is persisted when fetching or queueing fails.
    pub async fn poll_once(&self, queue: &dyn Publisher) -> BridgeResult<PollOutcome> {
        let id = &self.config.db_identifier;
        let from = self.status.get(id).await? as u64;
        let head = self.source.current_block().await?;
        let Some(confirmed) = head.checked_sub(self.source.required_confirmations()) else {
            return Ok(PollOutcome::Idle);
        };
        if from > confirmed {
            return Ok(PollOutcome::Idle);
        }
        let to = confirmed.min(from.saturating_add(self.config.max_block_span));

        let logs = self.source.filter_logs(&self.filter, from, to).await?;
        debug!(
            "[{}] Fetched {} logs in blocks {}-{}",
            self.chain_label,
            logs.len(),
            from,
            to
        );

        for log in &logs {
            match self.process_log(log, queue).await {
                Ok(()) => {}
                Err(e) if e.is_rejection() => {
                    warn!(
                        "[{}] Dropping log {:?} of tx {:?}: {}",
                        self.chain_label, log.log_index, log.transaction_hash, e
                    );
                    self.metrics
                        .watcher_rejected_events
                        .with_label_values(&[&self.chain_label, e.error_type()])
                        .inc();
                }
                // the window is retried as a whole
                Err(e) => return Err(e),
            }
        }

        self.status
            .update(id, (to + 1) as i64)
            .await
            .tap_err(|e| {
                error!(
                    "[{}] Failed to persist watermark {} for {}: {}",
                    self.chain_label,
                    to + 1,
                    id,
                    e
                )
            })?;
        self.metrics
            .last_processed_block
            .with_label_values(&[id])
            .set(to as i64);
        Ok(PollOutcome::Processed {
            from,
            to,
            more: to < confirmed,
        })
    }

    pub async fn process_log(&self, log: &Log, queue: &dyn Publisher) -> BridgeResult<()> {
        if log.removed == Some(true) {
            return Err(BridgeError::RemovedLog);
        }
        let Some(event) = RouterEvent::decode(log)? else {
            debug!("[{}] Ignoring untracked log {:?}", self.chain_label, log.topics.first());
            return Ok(());
        };
        self.metrics
            .watcher_received_events
            .with_label_values(&[&self.chain_label, event.name()])
            .inc();

        match event {
            RouterEvent::Lock(lock) => {
                let context = LogContext::of(log)?;
                let message = self.handle_lock(lock, &context).await?;
                self.push(queue, message).await
            }
            RouterEvent::Burn(burn) => {
                let context = LogContext::of(log)?;
                let message = self.handle_burn(burn, &context).await?;
                self.push(queue, message).await
            }
            RouterEvent::BurnErc721(burn) => {
                let context = LogContext::of(log)?;
                let message = self.handle_burn_nft(burn, &context).await?;
                self.push(queue, message).await
            }
            RouterEvent::Mint(mint) => {
                self.confirmation("mint", &mint.transaction_id, mint.source_chain);
                Ok(())
            }
            RouterEvent::Unlock(unlock) => {
                self.confirmation("unlock", &unlock.transaction_id, unlock.source_chain);
                Ok(())
            }
            RouterEvent::MemberUpdated(update) => {
                info!(
                    "[{}] Member {:#x} updated (active: {}), reloading members",
                    self.chain_label, update.member, update.status
                );
                self.spawn_members_reload();
                Ok(())
            }
        }
    }

    async fn handle_lock(&self, lock: LockFilter, context: &LogContext) -> BridgeResult<Message> {
        let source_chain = self.source.chain_id();
        let target_chain = target_chain_id(source_chain, lock.target_chain)?;
        let receiver = self.receiver(target_chain, &lock.receiver)?;
        if target_chain == source_chain {
            return Err(BridgeError::UnsupportedRoute {
                source: source_chain,
                target: target_chain,
            });
        }

        let token = format!("{:#x}", lock.token);
        let wrapped = self
            .assets
            .native_to_wrapped(&token, source_chain, target_chain)
            .ok_or_else(|| BridgeError::UnsupportedAsset {
                chain_id: source_chain,
                asset: token.clone(),
            })?
            .to_string();

        let amount = lock.amount.saturating_sub(lock.service_fee);
        if amount.is_zero() {
            return Err(BridgeError::ZeroAmount(format!(
                "lock of {} with service fee {}",
                lock.amount, lock.service_fee
            )));
        }
        let target_amount = self
            .target_amount(source_chain, &token, target_chain, &wrapped, amount)
            .await?;
        let originator = self.originator(context.tx_hash).await?;

        let live = self.is_live(context.block_number);
        let transfer = Transfer {
            transaction_id: context.transfer_id.clone(),
            source_chain_id: source_chain,
            target_chain_id: target_chain,
            native_chain_id: source_chain,
            source_asset: token.clone(),
            target_asset: wrapped,
            native_asset: token,
            receiver,
            amount: target_amount.to_string(),
            originator,
            timestamp: self.timestamp(live, context.block_number).await?,
            is_nft: false,
            serial_num: None,
        };
        let to_ledger = target_chain == self.config.hedera_network_id;
        Ok(match (live, to_ledger) {
            (true, true) => Message {
                payload: Payload::Lock(LockEvent { transfer }),
                topic: Topic::HederaMintHtsTransfer,
            },
            (true, false) => Message {
                payload: Payload::Transfer(transfer),
                topic: Topic::MessageSubmission,
            },
            (false, true) => Message {
                payload: Payload::Transfer(transfer),
                topic: Topic::ReadOnlyHederaMintHtsTransfer,
            },
            (false, false) => Message {
                payload: Payload::Transfer(transfer),
                topic: Topic::ReadOnlyTransferSave,
            },
        })
    }

    async fn handle_burn(&self, burn: BurnFilter, context: &LogContext) -> BridgeResult<Message> {
        let source_chain = self.source.chain_id();
        let target_chain = target_chain_id(source_chain, burn.target_chain)?;
        let receiver = self.receiver(target_chain, &burn.receiver)?;

        let token = format!("{:#x}", burn.token);
        let native = self
            .assets
            .wrapped_to_native(&token, source_chain)
            .ok_or_else(|| BridgeError::UnsupportedAsset {
                chain_id: source_chain,
                asset: token.clone(),
            })?
            .clone();
        // wrapped-to-wrapped
        if native.chain_id != target_chain {
            return Err(BridgeError::UnsupportedRoute {
                source: source_chain,
                target: target_chain,
            });
        }

        let target_amount = self
            .target_amount(source_chain, &token, target_chain, &native.asset, burn.amount)
            .await?;
        let originator = self.originator(context.tx_hash).await?;

        let live = self.is_live(context.block_number);
        let transfer = Transfer {
            transaction_id: context.transfer_id.clone(),
            source_chain_id: source_chain,
            target_chain_id: target_chain,
            native_chain_id: native.chain_id,
            source_asset: token,
            target_asset: native.asset.clone(),
            native_asset: native.asset,
            receiver,
            amount: target_amount.to_string(),
            originator,
            timestamp: self.timestamp(live, context.block_number).await?,
            is_nft: false,
            serial_num: None,
        };
        let to_ledger = target_chain == self.config.hedera_network_id;
        Ok(match (live, to_ledger) {
            (true, true) => Message {
                payload: Payload::Burn(BurnEvent { transfer }),
                topic: Topic::HederaFeeTransfer,
            },
            (true, false) => Message {
                payload: Payload::Transfer(transfer),
                topic: Topic::MessageSubmission,
            },
            (false, true) => Message {
                payload: Payload::Transfer(transfer),
                topic: Topic::ReadOnlyHederaFeeTransfer,
            },
            (false, false) => Message {
                payload: Payload::Transfer(transfer),
                topic: Topic::ReadOnlyTransferSave,
            },
        })
    }

    async fn handle_burn_nft(
        &self,
        burn: BurnErc721Filter,
        context: &LogContext,
    ) -> BridgeResult<Message> {
        let source_chain = self.source.chain_id();
        let target_chain = target_chain_id(source_chain, burn.target_chain)?;
        if target_chain != self.config.hedera_network_id {
            return Err(BridgeError::UnsupportedRoute {
                source: source_chain,
                target: target_chain,
            });
        }
        let receiver = self.receiver(target_chain, &burn.receiver)?;

        let token = format!("{:#x}", burn.wrapped_token);
        let native = self
            .assets
            .wrapped_to_native(&token, source_chain)
            .filter(|_| self.assets.is_non_fungible(source_chain, &token))
            .ok_or_else(|| BridgeError::UnsupportedAsset {
                chain_id: source_chain,
                asset: token.clone(),
            })?
            .clone();
        if native.chain_id != target_chain {
            return Err(BridgeError::UnsupportedRoute {
                source: source_chain,
                target: target_chain,
            });
        }
        let serial_num = i64::try_from(burn.token_id)
            .map_err(|_| BridgeError::AmountOverflow(format!("serial number {}", burn.token_id)))?;
        let originator = self.originator(context.tx_hash).await?;

        let live = self.is_live(context.block_number);
        let transfer = Transfer {
            transaction_id: context.transfer_id.clone(),
            source_chain_id: source_chain,
            target_chain_id: target_chain,
            native_chain_id: native.chain_id,
            source_asset: token,
            target_asset: native.asset.clone(),
            native_asset: native.asset,
            receiver,
            amount: "1".to_string(),
            originator,
            timestamp: self.timestamp(live, context.block_number).await?,
            is_nft: true,
            serial_num: Some(serial_num),
        };
        Ok(if live {
            Message {
                payload: Payload::Burn(BurnEvent { transfer }),
                topic: Topic::HederaNftTransfer,
            }
        } else {
            Message {
                payload: Payload::Transfer(transfer),
                topic: Topic::ReadOnlyHederaNftTransfer,
            }
        })
    }

    /// Checks the fee-inclusive minimum in source units, then converts to target decimals.
    async fn target_amount(
        &self,
        source_chain: u64,
        source_asset: &str,
        target_chain: u64,
        target_asset: &str,
        amount: U256,
    ) -> BridgeResult<U256> {
        let price = self
            .pricing
            .token_price_info(source_chain, source_asset)
            .await
            .ok_or_else(|| BridgeError::MissingPriceInfo {
                chain_id: source_chain,
                asset: source_asset.to_string(),
            })?;
        if amount < price.min_amount_with_fee {
            return Err(BridgeError::BelowMinimumAmount {
                amount: amount.to_string(),
                minimum: price.min_amount_with_fee.to_string(),
            });
        }

        let decimals = |chain_id: u64, asset: &str| {
            self.assets
                .fungible_asset_info(chain_id, asset)
                .map(|info| info.decimals)
                .ok_or_else(|| BridgeError::UnsupportedAsset {
                    chain_id,
                    asset: asset.to_string(),
                })
        };
        convert_decimals(
            amount,
            decimals(source_chain, source_asset)?,
            decimals(target_chain, target_asset)?,
        )
    }

    fn receiver(&self, target_chain: u64, receiver: &Bytes) -> BridgeResult<String> {
        if receiver.is_empty() {
            return Err(BridgeError::EmptyReceiver);
        }
        if target_chain == self.config.hedera_network_id {
            return AccountId::from_protobuf_bytes(receiver)
                .map(|account| account.to_string())
                .map_err(|e| BridgeError::InvalidReceiver(e.to_string()));
        }
        if receiver.len() != Address::len_bytes() {
            return Err(BridgeError::InvalidReceiver(format!(
                "expected a 20 byte address, got 0x{}",
                hex::encode(receiver)
            )));
        }
        Ok(ethers::utils::to_checksum(
            &Address::from_slice(receiver),
            None,
        ))
    }

    async fn originator(&self, tx_hash: H256) -> BridgeResult<String> {
        let sender = self.source.await_transaction(tx_hash).await?;
        Ok(format!("{:#x}", sender))
    }

    async fn timestamp(&self, live: bool, block_number: u64) -> BridgeResult<Option<u64>> {
        if live {
            return Ok(None);
        }
        Ok(Some(self.source.block_timestamp(block_number).await?))
    }

    fn is_live(&self, block_number: u64) -> bool {
        self.config.validator && block_number >= self.target_block
    }

    fn confirmation(&self, event: &str, transaction_id: &Bytes, source_chain: U256) {
        info!(
            "[{}] {} of {} from chain {} confirmed",
            self.chain_label,
            event,
            String::from_utf8_lossy(transaction_id),
            source_chain
        );
        self.metrics
            .watcher_confirmation_events
            .with_label_values(&[&self.chain_label, event])
            .inc();
    }

    fn spawn_members_reload(&self) {
        let source = self.source.clone();
        let members = self.members.clone();
        let metrics = self.metrics.clone();
        let router = self.config.router;
        let chain = self.chain_label.clone();
        tokio::spawn(async move {
            match source.governance_members(router).await {
                Ok(list) => {
                    metrics
                        .governance_members
                        .with_label_values(&[&chain])
                        .set(list.len() as i64);
                    members
                        .set(list.iter().map(|m| format!("{:#x}", m)).collect())
                        .await;
                    info!("[{}] Reloaded {} governance members", chain, list.len());
                }
                Err(e) => error!("[{}] Failed to reload governance members: {}", chain, e),
            }
        });
    }

    async fn push(&self, queue: &dyn Publisher, message: Message) -> BridgeResult<()> {
        info!(
            "[{}] Queueing {} on {}",
            self.chain_label,
            message.payload.transfer().transaction_id,
            message.topic
        );
        queue.push(message).await
    }
}

struct LogContext {
    block_number: u64,
    tx_hash: H256,
    transfer_id: String,
}

impl LogContext {
    fn of(log: &Log) -> BridgeResult<Self> {
        let missing = |field: &str| {
            BridgeError::ProviderError(format!("Provider returns log without {field}"))
        };
        Ok(Self {
            block_number: log.block_number.ok_or_else(|| missing("block_number"))?.as_u64(),
            tx_hash: log.transaction_hash.ok_or_else(|| missing("transaction_hash"))?,
            transfer_id: log_transfer_id(log).ok_or_else(|| missing("log_index"))?,
        })
    }
}

fn target_chain_id(source_chain: u64, value: U256) -> BridgeResult<u64> {
    u64::try_from(value).map_err(|_| BridgeError::UnsupportedRoute {
        source: source_chain,
        target: u64::MAX,
    })
}
