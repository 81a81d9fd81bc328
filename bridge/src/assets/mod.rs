// Copyright (c) Hedera Bridge Contributors
// SPDX-License-Identifier: Apache-2.0

//! Native/wrapped asset mappings, built once at startup and read-only afterwards.

use crate::config::NativeAssetConfig;
use crate::error::{BridgeError, BridgeResult};
use async_trait::async_trait;
use rust_decimal::Decimal;
use std::collections::HashMap;
use tracing::info;

pub mod fee;
pub mod pricing;

pub use pricing::{PricingService, PricingSource, TokenPriceInfo};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NativeAsset {
    pub chain_id: u64,
    pub asset: String,
    pub min_fee_amount_in_usd: Decimal,
    pub fee_percentage: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FungibleAssetInfo {
    pub name: String,
    pub symbol: String,
    pub decimals: u8,
}

/// Reads token metadata from the chain an asset lives on.
#[async_trait]
pub trait AssetMetadataSource: Send + Sync {
    async fn fungible_info(&self, chain_id: u64, asset: &str) -> BridgeResult<FungibleAssetInfo>;
}

type AssetKey = (u64, String);

/// EVM addresses compare case-insensitively, Hedera ids verbatim.
pub fn normalize_asset(asset: &str) -> String {
    if asset.starts_with("0x") || asset.starts_with("0X") {
        asset.to_lowercase()
    } else {
        asset.to_string()
    }
}

fn key(chain_id: u64, asset: &str) -> AssetKey {
    (chain_id, normalize_asset(asset))
}

#[derive(Debug, Default)]
pub struct AssetRegistry {
    native_assets: HashMap<AssetKey, NativeAsset>,
    native_to_wrapped: HashMap<AssetKey, HashMap<u64, String>>,
    wrapped_to_native: HashMap<AssetKey, NativeAsset>,
    fungible_info: HashMap<AssetKey, FungibleAssetInfo>,
    non_fungible: HashMap<AssetKey, bool>,
}

impl AssetRegistry {
    /// Builds the registry from configuration, reading missing decimals through `metadata`.
    pub async fn load(
        assets: &[NativeAssetConfig],
        metadata: &dyn AssetMetadataSource,
    ) -> BridgeResult<Self> {
        let mut registry = AssetRegistry::default();
        for config in assets {
            let native = NativeAsset {
                chain_id: config.chain_id,
                asset: config.asset.clone(),
                min_fee_amount_in_usd: config.min_fee_amount_in_usd,
                fee_percentage: config.fee_percentage,
            };
            let native_key = key(config.chain_id, &config.asset);
            if registry.native_assets.contains_key(&native_key) {
                return Err(BridgeError::InvalidConfig(format!(
                    "native asset {} on chain {} is configured twice",
                    config.asset, config.chain_id
                )));
            }

            if !config.non_fungible {
                let info = registry_info(metadata, config.chain_id, &config.asset, config.decimals)
                    .await?;
                registry.fungible_info.insert(native_key.clone(), info);
            }
            registry
                .non_fungible
                .insert(native_key.clone(), config.non_fungible);

            let mut wrapped_assets = HashMap::new();
            for (chain_id, wrapped) in &config.wrapped {
                let wrapped_key = key(*chain_id, &wrapped.asset);
                if !config.non_fungible {
                    let info =
                        registry_info(metadata, *chain_id, &wrapped.asset, wrapped.decimals)
                            .await?;
                    registry.fungible_info.insert(wrapped_key.clone(), info);
                }
                registry
                    .non_fungible
                    .insert(wrapped_key.clone(), config.non_fungible);
                registry
                    .wrapped_to_native
                    .insert(wrapped_key, native.clone());
                wrapped_assets.insert(*chain_id, wrapped.asset.clone());
            }
            registry
                .native_to_wrapped
                .insert(native_key.clone(), wrapped_assets);
            registry.native_assets.insert(native_key, native);
        }
        info!(
            "[Assets] Loaded {} native and {} wrapped assets",
            registry.native_assets.len(),
            registry.wrapped_to_native.len()
        );
        Ok(registry)
    }

    pub fn native_to_wrapped(
        &self,
        asset: &str,
        native_chain_id: u64,
        target_chain_id: u64,
    ) -> Option<&str> {
        self.native_to_wrapped
            .get(&key(native_chain_id, asset))
            .and_then(|wrapped| wrapped.get(&target_chain_id))
            .map(String::as_str)
    }

    pub fn wrapped_to_native(&self, asset: &str, chain_id: u64) -> Option<&NativeAsset> {
        self.wrapped_to_native.get(&key(chain_id, asset))
    }

    pub fn fungible_native_asset(&self, chain_id: u64, asset: &str) -> Option<&NativeAsset> {
        let key = key(chain_id, asset);
        match self.non_fungible.get(&key) {
            Some(false) => self.native_assets.get(&key),
            _ => None,
        }
    }

    pub fn fungible_asset_info(&self, chain_id: u64, asset: &str) -> Option<&FungibleAssetInfo> {
        self.fungible_info.get(&key(chain_id, asset))
    }

    pub fn is_native(&self, chain_id: u64, asset: &str) -> bool {
        self.native_assets.contains_key(&key(chain_id, asset))
    }

    pub fn is_non_fungible(&self, chain_id: u64, asset: &str) -> bool {
        self.non_fungible
            .get(&key(chain_id, asset))
            .copied()
            .unwrap_or(false)
    }

    /// Counterpart of `asset` (living on `chain_b`) on `chain_a`, whichever side is native.
    pub fn opposite_asset(&self, chain_a: u64, chain_b: u64, asset: &str) -> Option<String> {
        if let Some(wrapped) = self.native_to_wrapped(asset, chain_b, chain_a) {
            return Some(wrapped.to_string());
        }
        if let Some(native) = self.wrapped_to_native(asset, chain_b) {
            if native.chain_id == chain_a {
                return Some(native.asset.clone());
            }
            return self
                .native_to_wrapped(&native.asset, native.chain_id, chain_a)
                .map(str::to_string);
        }
        None
    }

    pub fn native_assets(&self) -> impl Iterator<Item = &NativeAsset> {
        self.native_assets.values()
    }

    /// `(chain_id, asset)` pairs of every wrapped version of a native asset.
    pub fn wrapped_assets_of(&self, native: &NativeAsset) -> Vec<(u64, String)> {
        self.native_to_wrapped
            .get(&key(native.chain_id, &native.asset))
            .map(|wrapped| {
                wrapped
                    .iter()
                    .map(|(chain_id, asset)| (*chain_id, asset.clone()))
                    .collect()
            })
            .unwrap_or_default()
    }
}

async fn registry_info(
    metadata: &dyn AssetMetadataSource,
    chain_id: u64,
    asset: &str,
    configured_decimals: Option<u8>,
) -> BridgeResult<FungibleAssetInfo> {
    match configured_decimals {
        Some(decimals) => Ok(FungibleAssetInfo {
            name: asset.to_string(),
            symbol: asset.to_string(),
            decimals,
        }),
        None => metadata.fungible_info(chain_id, asset).await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::WrappedAssetConfig;
    use crate::test_utils::StaticMetadata;
    use rust_decimal_macros::dec;
    use std::collections::BTreeMap;

    fn configs() -> Vec<NativeAssetConfig> {
        vec![
            NativeAssetConfig {
                chain_id: 0,
                asset: "HBAR".into(),
                decimals: Some(8),
                non_fungible: false,
                fee_percentage: 10_000,
                min_fee_amount_in_usd: dec!(1),
                coin_gecko_id: None,
                wrapped: BTreeMap::from([
                    (
                        80001,
                        WrappedAssetConfig {
                            asset: "0x00000000000000000000000000000000000000AA".into(),
                            decimals: None,
                        },
                    ),
                    (
                        5,
                        WrappedAssetConfig {
                            asset: "0x00000000000000000000000000000000000000bb".into(),
                            decimals: Some(18),
                        },
                    ),
                ]),
            },
            NativeAssetConfig {
                chain_id: 80001,
                asset: "0x00000000000000000000000000000000000000cc".into(),
                decimals: None,
                non_fungible: false,
                fee_percentage: 0,
                min_fee_amount_in_usd: dec!(0),
                coin_gecko_id: None,
                wrapped: BTreeMap::from([(
                    0,
                    WrappedAssetConfig {
                        asset: "0.0.4".into(),
                        decimals: Some(6),
                    },
                )]),
            },
        ]
    }

    #[tokio::test]
    async fn test_registry_lookups() {
        let metadata = StaticMetadata::with_decimals(18);
        let registry = AssetRegistry::load(&configs(), &metadata).await.unwrap();

        assert_eq!(
            registry.native_to_wrapped("HBAR", 0, 80001),
            Some("0x00000000000000000000000000000000000000AA")
        );
        assert_eq!(registry.native_to_wrapped("HBAR", 0, 296), None);

        let native = registry
            .wrapped_to_native("0x00000000000000000000000000000000000000aa", 80001)
            .unwrap();
        assert_eq!(native.asset, "HBAR");
        assert_eq!(native.fee_percentage, 10_000);

        assert_eq!(registry.fungible_asset_info(0, "HBAR").unwrap().decimals, 8);
        assert_eq!(
            registry
                .fungible_asset_info(80001, "0x00000000000000000000000000000000000000aa")
                .unwrap()
                .decimals,
            18
        );
        assert!(registry.is_native(0, "HBAR"));
        assert!(!registry.is_native(5, "0x00000000000000000000000000000000000000bb"));
    }

    #[tokio::test]
    async fn test_opposite_asset_tries_both_directions() {
        let registry = AssetRegistry::load(&configs(), &StaticMetadata::with_decimals(18))
            .await
            .unwrap();

        // native -> wrapped
        assert_eq!(
            registry.opposite_asset(0, 80001, "0x00000000000000000000000000000000000000cc"),
            Some("0.0.4".to_string())
        );
        // wrapped -> native
        assert_eq!(
            registry.opposite_asset(0, 80001, "0x00000000000000000000000000000000000000aa"),
            Some("HBAR".to_string())
        );
        // wrapped -> wrapped through the native asset
        assert_eq!(
            registry.opposite_asset(5, 80001, "0x00000000000000000000000000000000000000aa"),
            Some("0x00000000000000000000000000000000000000bb".to_string())
        );
        assert_eq!(registry.opposite_asset(5, 80001, "0xdead"), None);
    }

    #[tokio::test]
    async fn test_duplicate_native_asset_rejected() {
        let mut assets = configs();
        assets.push(assets[0].clone());
        let err = AssetRegistry::load(&assets, &StaticMetadata::with_decimals(18))
            .await
            .unwrap_err();
        assert_eq!(err.error_type(), "invalid_config");
    }
}
