// Copyright (c) Hedera Bridge Contributors
// SPDX-License-Identifier: Apache-2.0

//! USD prices and fee-inclusive minimum amounts per asset.

use super::fee::min_amount_with_fee;
use super::{normalize_asset, AssetRegistry, NativeAsset};
use crate::error::{BridgeError, BridgeResult};
use crate::metrics::BridgeMetrics;
use async_trait::async_trait;
use ethers::types::U256;
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use url::Url;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenPriceInfo {
    pub usd_price: Decimal,
    pub min_amount_with_fee: U256,
}

/// `chain id -> asset -> price feed id`
pub type PriceIds = HashMap<u64, HashMap<String, String>>;
/// `chain id -> asset -> usd price`
pub type UsdPrices = HashMap<u64, HashMap<String, Decimal>>;

#[async_trait]
pub trait PricingSource: Send + Sync {
    fn name(&self) -> &str;

    /// Returns a price for every requested asset or fails as a whole.
    async fn get_usd_prices(&self, ids: &PriceIds) -> BridgeResult<UsdPrices>;
}

pub struct PricingService {
    assets: Arc<AssetRegistry>,
    price_ids: PriceIds,
    sources: Vec<Arc<dyn PricingSource>>,
    prices: RwLock<HashMap<(u64, String), TokenPriceInfo>>,
    metrics: Arc<BridgeMetrics>,
}

impl PricingService {
    pub fn new(
        assets: Arc<AssetRegistry>,
        price_ids: PriceIds,
        sources: Vec<Arc<dyn PricingSource>>,
        metrics: Arc<BridgeMetrics>,
    ) -> Self {
        let mut prices = HashMap::new();
        // Assets without a minimum fee never need a price to pass the minimum amount gate.
        for native in assets.native_assets() {
            if native.min_fee_amount_in_usd.is_zero() || native.fee_percentage == 0 {
                let free = TokenPriceInfo {
                    usd_price: Decimal::ZERO,
                    min_amount_with_fee: U256::zero(),
                };
                prices.insert(price_key(native.chain_id, &native.asset), free.clone());
                for (chain_id, asset) in assets.wrapped_assets_of(native) {
                    prices.insert(price_key(chain_id, &asset), free.clone());
                }
            }
        }
        Self {
            assets,
            price_ids,
            sources,
            prices: RwLock::new(prices),
            metrics,
        }
    }

    pub async fn token_price_info(&self, chain_id: u64, asset: &str) -> Option<TokenPriceInfo> {
        self.prices
            .read()
            .await
            .get(&price_key(chain_id, asset))
            .cloned()
    }

    /// Queries the sources in order and applies the first complete batch.
    pub async fn refresh(&self) -> BridgeResult<()> {
        if self.price_ids.is_empty() {
            return Ok(());
        }
        for source in &self.sources {
            match source.get_usd_prices(&self.price_ids).await {
                Ok(prices) => match self.compute(&prices) {
                    Ok(updated) => {
                        let count = updated.len();
                        self.prices.write().await.extend(updated);
                        debug!("[Pricing] Applied {} prices from {}", count, source.name());
                        return Ok(());
                    }
                    Err(e) => warn!("[Pricing] Discarding batch from {}: {}", source.name(), e),
                },
                Err(e) => warn!("[Pricing] Source {} failed: {}", source.name(), e),
            }
        }
        self.metrics.price_refresh_failures.inc();
        Err(BridgeError::Generic(
            "no pricing source returned a complete batch".into(),
        ))
    }

    fn compute(&self, prices: &UsdPrices) -> BridgeResult<Vec<((u64, String), TokenPriceInfo)>> {
        let mut updated = Vec::new();
        for (chain_id, ids) in &self.price_ids {
            for asset in ids.keys() {
                let price = prices
                    .get(chain_id)
                    .and_then(|p| p.get(asset))
                    .copied()
                    .ok_or_else(|| BridgeError::MissingPriceInfo {
                        chain_id: *chain_id,
                        asset: asset.clone(),
                    })?;
                let native = self
                    .assets
                    .fungible_native_asset(*chain_id, asset)
                    .ok_or_else(|| BridgeError::UnsupportedAsset {
                        chain_id: *chain_id,
                        asset: asset.clone(),
                    })?;
                updated.push(self.price_entry(native, native.chain_id, &native.asset, price)?);
                for (wrapped_chain, wrapped_asset) in self.assets.wrapped_assets_of(native) {
                    updated.push(self.price_entry(native, wrapped_chain, &wrapped_asset, price)?);
                }
            }
        }
        Ok(updated)
    }

    fn price_entry(
        &self,
        native: &NativeAsset,
        chain_id: u64,
        asset: &str,
        usd_price: Decimal,
    ) -> BridgeResult<((u64, String), TokenPriceInfo)> {
        let decimals = self
            .assets
            .fungible_asset_info(chain_id, asset)
            .map(|info| info.decimals)
            .ok_or_else(|| BridgeError::UnsupportedAsset {
                chain_id,
                asset: asset.to_string(),
            })?;
        let min_amount_with_fee = min_amount_with_fee(
            native.min_fee_amount_in_usd,
            usd_price,
            decimals,
            native.fee_percentage,
        )?;
        Ok((
            price_key(chain_id, asset),
            TokenPriceInfo {
                usd_price,
                min_amount_with_fee,
            },
        ))
    }

    pub async fn run(self: Arc<Self>, interval: Duration, cancel: CancellationToken) {
        info!("[Pricing] Starting price refresh every {:?}", interval);
        let mut ticker = tokio::time::interval(interval);
        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    info!("[Pricing] Price refresh task cancelled");
                    break;
                }
                _ = ticker.tick() => {
                    if let Err(e) = self.refresh().await {
                        warn!("[Pricing] Keeping previous prices: {}", e);
                    }
                }
            }
        }
    }
}

fn price_key(chain_id: u64, asset: &str) -> (u64, String) {
    (chain_id, normalize_asset(asset))
}

/// CoinGecko `simple/price` client.
pub struct CoinGeckoSource {
    http: reqwest::Client,
    base_url: Url,
}

impl CoinGeckoSource {
    pub fn new(base_url: Url) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url,
        }
    }
}

#[async_trait]
impl PricingSource for CoinGeckoSource {
    fn name(&self) -> &str {
        "coingecko"
    }

    async fn get_usd_prices(&self, ids: &PriceIds) -> BridgeResult<UsdPrices> {
        let joined = ids
            .values()
            .flat_map(|assets| assets.values().cloned())
            .collect::<Vec<_>>()
            .join(",");
        let mut url = self
            .base_url
            .join("simple/price")
            .map_err(|e| BridgeError::Generic(e.to_string()))?;
        url.query_pairs_mut()
            .append_pair("ids", &joined)
            .append_pair("vs_currencies", "usd");

        let body: HashMap<String, HashMap<String, Decimal>> = self
            .http
            .get(url)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| BridgeError::Generic(format!("coingecko request failed: {e}")))?
            .json()
            .await
            .map_err(|e| BridgeError::Generic(format!("coingecko response invalid: {e}")))?;

        let mut prices = UsdPrices::new();
        for (chain_id, assets) in ids {
            for (asset, id) in assets {
                let price = body
                    .get(id)
                    .and_then(|p| p.get("usd"))
                    .copied()
                    .ok_or_else(|| BridgeError::MissingPriceInfo {
                        chain_id: *chain_id,
                        asset: asset.clone(),
                    })?;
                prices.entry(*chain_id).or_default().insert(asset.clone(), price);
            }
        }
        Ok(prices)
    }
}
