// Copyright (c) Hedera Bridge Contributors
// SPDX-License-Identifier: Apache-2.0

use crate::assets::fee::{FEE_MAX_PERCENTAGE, MAX_DECIMALS};
use crate::hedera::AccountId;
use anyhow::{anyhow, bail};
use ethers::types::Address as EthAddress;
use hedera_bridge_config::Config;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_with::{serde_as, DurationSeconds};
use std::collections::{BTreeMap, HashSet};
use std::time::Duration;
use tracing::info;
use url::Url;

pub const DEFAULT_HEDERA_NETWORK_ID: u64 = 0;

#[serde_as]
#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct EvmChainConfig {
    pub chain_id: u64,
    pub rpc_url: String,
    // Router contract emitting Lock/Burn/Mint/Unlock events.
    pub router_address: String,
    // Forces the watermark to this block on startup.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_block: Option<u64>,
    #[serde_as(as = "DurationSeconds<u64>")]
    #[serde(default = "default_polling_interval", rename = "polling-interval-secs")]
    pub polling_interval: Duration,
    // Maximum span of a single eth_getLogs request.
    #[serde(default = "default_max_logs_blocks")]
    pub max_logs_blocks: u64,
    #[serde(default = "default_block_confirmations")]
    pub block_confirmations: u64,
}

impl EvmChainConfig {
    pub fn router(&self) -> anyhow::Result<EthAddress> {
        self.router_address
            .parse()
            .map_err(|e| anyhow!("Invalid router address {}: {e}", self.router_address))
    }

    /// Status store key of the watcher for this chain.
    pub fn db_identifier(&self) -> String {
        format!("{}-{}", self.chain_id, self.router_address.to_lowercase())
    }
}

#[serde_as]
#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct HederaConfig {
    #[serde(default)]
    pub network_id: u64,
    // Threshold account holding locked native assets.
    pub bridge_account: AccountId,
    // Account paying for scheduled transactions.
    pub payer_account: AccountId,
    // Governance members receiving fee shares.
    pub members: Vec<AccountId>,
    pub gateway_url: Url,
    #[serde_as(as = "DurationSeconds<u64>")]
    #[serde(default = "default_finality_poll", rename = "finality-poll-interval-secs")]
    pub finality_poll_interval: Duration,
    #[serde_as(as = "DurationSeconds<u64>")]
    #[serde(default = "default_lookup_timeout", rename = "read-only-lookup-timeout-secs")]
    pub read_only_lookup_timeout: Duration,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct WrappedAssetConfig {
    pub asset: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub decimals: Option<u8>,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct NativeAssetConfig {
    pub chain_id: u64,
    pub asset: String,
    // Read from the chain when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub decimals: Option<u8>,
    #[serde(default)]
    pub non_fungible: bool,
    // Thousandths of a percent, see FEE_MAX_PERCENTAGE.
    #[serde(default)]
    pub fee_percentage: u64,
    #[serde(default)]
    pub min_fee_amount_in_usd: Decimal,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub coin_gecko_id: Option<String>,
    #[serde(default)]
    pub wrapped: BTreeMap<u64, WrappedAssetConfig>,
}

#[serde_as]
#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct PricingConfig {
    pub coin_gecko_url: Url,
    #[serde_as(as = "DurationSeconds<u64>")]
    #[serde(default = "default_price_refresh", rename = "refresh-interval-secs")]
    pub refresh_interval: Duration,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct DatabaseConfig {
    pub url: Url,
    #[serde(default = "default_pool_size")]
    pub pool_size: u32,
    #[serde(default = "default_connection_timeout_ms")]
    pub connection_timeout_ms: u64,
    // Applied to every pooled connection when set.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub statement_timeout_ms: Option<u64>,
}

#[serde_as]
#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct BridgeNodeConfig {
    // Validators actively settle live events, others only record them.
    #[serde(default)]
    pub validator: bool,
    pub metrics_port: u16,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub database: Option<DatabaseConfig>,
    pub hedera: HederaConfig,
    pub evm: Vec<EvmChainConfig>,
    pub assets: Vec<NativeAssetConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pricing: Option<PricingConfig>,
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,
    #[serde_as(as = "DurationSeconds<u64>")]
    #[serde(default = "default_drain_timeout", rename = "shutdown-drain-timeout-secs")]
    pub shutdown_drain_timeout: Duration,
}

fn default_polling_interval() -> Duration {
    Duration::from_secs(5)
}

fn default_max_logs_blocks() -> u64 {
    1000
}

fn default_block_confirmations() -> u64 {
    5
}

fn default_finality_poll() -> Duration {
    Duration::from_secs(2)
}

fn default_lookup_timeout() -> Duration {
    Duration::from_secs(300)
}

fn default_price_refresh() -> Duration {
    Duration::from_secs(300)
}

fn default_pool_size() -> u32 {
    10
}

fn default_connection_timeout_ms() -> u64 {
    30_000
}

fn default_queue_capacity() -> usize {
    64
}

fn default_drain_timeout() -> Duration {
    Duration::from_secs(30)
}

impl Config for BridgeNodeConfig {}

impl BridgeNodeConfig {
    pub fn validate(&self) -> anyhow::Result<()> {
        info!("Starting config validation");
        if self.evm.is_empty() {
            bail!("At least one EVM chain must be configured");
        }
        let mut chain_ids = HashSet::new();
        chain_ids.insert(self.hedera.network_id);
        for chain in &self.evm {
            if !chain_ids.insert(chain.chain_id) {
                bail!(
                    "Chain id {} is configured more than once (hedera network id is {})",
                    chain.chain_id,
                    self.hedera.network_id
                );
            }
            if chain.max_logs_blocks == 0 {
                bail!("max-logs-blocks of chain {} must be positive", chain.chain_id);
            }
            chain.router()?;
        }
        if self.hedera.members.is_empty() {
            bail!("Hedera members list must not be empty");
        }
        for asset in &self.assets {
            if !chain_ids.contains(&asset.chain_id) {
                bail!(
                    "Asset {} references unknown chain {}",
                    asset.asset,
                    asset.chain_id
                );
            }
            if asset.fee_percentage > FEE_MAX_PERCENTAGE {
                bail!(
                    "Fee percentage {} of {} exceeds {}",
                    asset.fee_percentage,
                    asset.asset,
                    FEE_MAX_PERCENTAGE
                );
            }
            if asset.min_fee_amount_in_usd.is_sign_negative() {
                bail!("Minimum fee of {} must not be negative", asset.asset);
            }
            let priced = !asset.non_fungible
                && asset.fee_percentage > 0
                && !asset.min_fee_amount_in_usd.is_zero();
            if priced && (asset.coin_gecko_id.is_none() || self.pricing.is_none()) {
                bail!(
                    "Asset {} charges a minimum fee and needs a coin-gecko-id and a pricing section",
                    asset.asset
                );
            }
            let too_precise = std::iter::once(asset.decimals)
                .chain(asset.wrapped.values().map(|w| w.decimals))
                .flatten()
                .any(|d| usize::from(d) > MAX_DECIMALS);
            if too_precise {
                bail!("Decimals of {} exceed {}", asset.asset, MAX_DECIMALS);
            }
            for target in asset.wrapped.keys() {
                if *target == asset.chain_id {
                    bail!(
                        "Asset {} cannot be wrapped on its native chain {}",
                        asset.asset,
                        target
                    );
                }
                if !chain_ids.contains(target) {
                    bail!(
                        "Wrapped asset of {} references unknown chain {}",
                        asset.asset,
                        target
                    );
                }
            }
        }
        info!("Config validation complete");
        Ok(())
    }
}
