// Copyright (c) Hedera Bridge Contributors
// SPDX-License-Identifier: Apache-2.0

use crate::assets::pricing::{CoinGeckoSource, PriceIds};
use crate::assets::{AssetRegistry, PricingService, PricingSource};
use crate::config::{BridgeNodeConfig, DatabaseConfig, NativeAssetConfig};
use crate::evm::client::{EvmClient, EvmMetadata};
use crate::evm::ChainLogSource;
use crate::handler::{EventHandler, SettlementServices};
use crate::hedera::HederaGatewayClient;
use crate::metrics::BridgeMetrics;
use crate::queue::{Publisher, QueueBuilder, Topic};
use crate::retry_with_max_elapsed_time;
use crate::settlement::{
    BurnEventService, HederaAccounts, LockEventService, ReadOnlyService, Scheduler,
    TransferService,
};
use crate::storage::{
    EventStore, InMemoryEventStore, InMemoryStatusStore, PgEventStore, PgStatusStore, StatusStore,
};
use crate::watcher::{GovernanceMembers, Watcher, WatcherConfig};
use anyhow::anyhow;
use hedera_bridge_pg_db::{Db, DbArgs};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use strum::IntoEnumIterator;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::{error, info, warn};

/// How long bootstrap keeps retrying an unreachable EVM endpoint.
const BOOTSTRAP_RPC_TIMEOUT: Duration = Duration::from_secs(120);
const BOOTSTRAP_PRICE_TIMEOUT: Duration = Duration::from_secs(120);

/// Running node. Cancel the token passed to [`run_bridge_node`], then call
/// [`NodeHandle::shutdown`].
pub struct NodeHandle {
    watchers: Vec<JoinHandle<()>>,
    consumers: Vec<JoinHandle<()>>,
    background: Vec<JoinHandle<()>>,
    settlements: TaskTracker,
    ledger_cancel: CancellationToken,
    drain_timeout: Duration,
}

impl NodeHandle {
    /// Joins the watchers, then gives queued and in-flight settlements the drain timeout to
    /// finish. Settlements still waiting after that keep their `Submitted` record.
    pub async fn shutdown(self) {
        let NodeHandle {
            watchers,
            consumers,
            background,
            settlements,
            ledger_cancel,
            drain_timeout,
        } = self;

        for watcher in watchers {
            if let Err(e) = watcher.await {
                error!("[Node] Watcher task failed: {}", e);
            }
        }
        info!("[Node] Watchers stopped, draining settlements");

        let drain = async {
            // consumers exit once every publisher is gone
            for consumer in consumers {
                let _ = consumer.await;
            }
            settlements.close();
            settlements.wait().await;
        };
        if tokio::time::timeout(drain_timeout, drain).await.is_err() {
            warn!(
                "[Node] {} settlements still in flight after {:?}",
                settlements.len(),
                drain_timeout
            );
        }
        ledger_cancel.cancel();

        for task in background {
            let _ = task.await;
        }
        info!("[Node] Shutdown complete");
    }
}

pub async fn run_bridge_node(
    config: BridgeNodeConfig,
    registry: &prometheus::Registry,
    cancel: CancellationToken,
) -> anyhow::Result<NodeHandle> {
    config.validate()?;
    let metrics = Arc::new(BridgeMetrics::new(registry));
    let (status_store, event_store) = build_stores(config.database.as_ref()).await?;

    let mut clients = HashMap::new();
    for chain in &config.evm {
        let client = retry_with_max_elapsed_time!(
            EvmClient::new(chain, metrics.clone()),
            BOOTSTRAP_RPC_TIMEOUT
        )
        .map_err(|e| anyhow!("Cannot connect to chain {}: {:?}", chain.chain_id, e))??;
        clients.insert(chain.chain_id, Arc::new(client));
    }

    let assets = Arc::new(
        AssetRegistry::load(&config.assets, &EvmMetadata::new(clients.clone())).await?,
    );

    let mut background = Vec::new();
    let mut sources: Vec<Arc<dyn PricingSource>> = Vec::new();
    if let Some(pricing) = &config.pricing {
        sources.push(Arc::new(CoinGeckoSource::new(pricing.coin_gecko_url.clone())));
    }
    let pricing = Arc::new(PricingService::new(
        assets.clone(),
        price_ids(&config.assets),
        sources,
        metrics.clone(),
    ));
    if let Some(pricing_config) = &config.pricing {
        load_initial_prices(&pricing, BOOTSTRAP_PRICE_TIMEOUT).await;
        background.push(tokio::spawn(
            pricing.clone().run(pricing_config.refresh_interval, cancel.clone()),
        ));
    }

    let ledger_cancel = CancellationToken::new();
    let gateway = Arc::new(HederaGatewayClient::new(
        config.hedera.gateway_url.clone(),
        config.hedera.finality_poll_interval,
        metrics.clone(),
        ledger_cancel.clone(),
    ));
    let settlements = TaskTracker::new();
    let scheduler = Arc::new(Scheduler::new(
        gateway.clone(),
        gateway.clone(),
        event_store,
        settlements.clone(),
        metrics.clone(),
        HederaAccounts {
            bridge_account: config.hedera.bridge_account,
            payer_account: config.hedera.payer_account,
            members: config.hedera.members.clone(),
        },
    ));
    let services = SettlementServices {
        burn: Arc::new(BurnEventService::new(scheduler.clone(), assets.clone())),
        lock: Arc::new(LockEventService::new(scheduler.clone())),
        transfers: Arc::new(TransferService::new(scheduler.clone(), gateway.clone())),
        read_only: Arc::new(ReadOnlyService::new(
            scheduler,
            config.hedera.read_only_lookup_timeout,
        )),
    };

    let mut builder = QueueBuilder::new(config.queue_capacity);
    for topic in Topic::iter() {
        builder = builder.subscribe(topic, Arc::new(EventHandler::new(topic, services.clone())))?;
    }
    let (queue, consumers) = builder.start(metrics.clone());
    let queue: Arc<dyn Publisher> = Arc::new(queue);

    let mut watchers = Vec::new();
    for chain in &config.evm {
        let client = clients
            .get(&chain.chain_id)
            .cloned()
            .ok_or_else(|| anyhow!("No client for chain {}", chain.chain_id))?;
        let router = chain.router()?;

        let members = Arc::new(GovernanceMembers::default());
        match client.governance_members(router).await {
            Ok(list) => {
                metrics
                    .governance_members
                    .with_label_values(&[&chain.chain_id.to_string()])
                    .set(list.len() as i64);
                members
                    .set(list.iter().map(|m| format!("{:#x}", m)).collect())
                    .await;
            }
            Err(e) => warn!(
                "[{}] Cannot load governance members, waiting for the next update: {}",
                chain.chain_id, e
            ),
        }

        let watcher = Watcher::new(
            WatcherConfig {
                db_identifier: chain.db_identifier(),
                router,
                start_block: chain.start_block,
                validator: config.validator,
                polling_interval: chain.polling_interval,
                max_block_span: chain.max_logs_blocks,
                hedera_network_id: config.hedera.network_id,
            },
            client,
            status_store.clone(),
            assets.clone(),
            pricing.clone(),
            members,
            metrics.clone(),
        )
        .await?;
        watchers.push(watcher.watch(queue.clone(), cancel.clone()));
    }
    info!(
        "[Node] Bridge node started with {} watchers (validator: {})",
        watchers.len(),
        config.validator
    );

    Ok(NodeHandle {
        watchers,
        consumers,
        background,
        settlements,
        ledger_cancel,
        drain_timeout: config.shutdown_drain_timeout,
    })
}

async fn build_stores(
    database: Option<&DatabaseConfig>,
) -> anyhow::Result<(Arc<dyn StatusStore>, Arc<dyn EventStore>)> {
    let Some(database) = database else {
        warn!("[Node] No database configured, watermarks and events are kept in memory");
        return Ok((
            Arc::new(InMemoryStatusStore::new()),
            Arc::new(InMemoryEventStore::new()),
        ));
    };
    let db = Db::for_write(
        database.url.clone(),
        DbArgs {
            db_connection_pool_size: database.pool_size,
            db_connection_timeout_ms: database.connection_timeout_ms,
            db_statement_timeout_ms: database.statement_timeout_ms,
        },
    )
    .await?;
    let applied = db.run_migrations().await?;
    info!("[Node] Applied {} migrations", applied.len());
    Ok((
        Arc::new(PgStatusStore::new(db.clone())),
        Arc::new(PgEventStore::new(db)),
    ))
}

/// Retries the first refresh before the watchers start. Watchers hold back windows with
/// priced events until prices land, so giving up here only delays them.
async fn load_initial_prices(pricing: &PricingService, timeout: Duration) -> bool {
    match retry_with_max_elapsed_time!(pricing.refresh(), timeout) {
        Ok(Ok(())) => {
            info!("[Node] Loaded initial prices");
            true
        }
        Ok(Err(e)) | Err(e) => {
            warn!(
                "[Node] No prices after {:?}, priced events wait for the next refresh: {}",
                timeout, e
            );
            false
        }
    }
}

/// CoinGecko ids of every native asset that declares one.
fn price_ids(assets: &[NativeAssetConfig]) -> PriceIds {
    let mut ids = PriceIds::new();
    for asset in assets {
        if let Some(id) = &asset.coin_gecko_id {
            ids.entry(asset.chain_id)
                .or_default()
                .insert(asset.asset.clone(), id.clone());
        }
    }
    ids
}
