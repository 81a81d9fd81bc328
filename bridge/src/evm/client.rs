// Copyright (c) Hedera Bridge Contributors
// SPDX-License-Identifier: Apache-2.0

use super::abi::{BridgeRouter, Erc20Token};
use super::metered_provider::{new_metered_eth_provider, MeteredEthHttpProvider};
use super::{ChainLogSource, FilterConfig};
use crate::assets::{AssetMetadataSource, FungibleAssetInfo};
use crate::config::EvmChainConfig;
use crate::error::{BridgeError, BridgeResult};
use crate::metrics::BridgeMetrics;
use crate::retry_with_max_elapsed_time;
use async_trait::async_trait;
use ethers::providers::{JsonRpcClient, Middleware, Provider};
use ethers::types::{Address, Filter, Log, H256, U256};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tap::TapFallible;

/// How long `await_transaction` keeps polling for a receipt.
const TX_MINING_TIMEOUT: Duration = Duration::from_secs(600);

pub struct EvmClient<P> {
    provider: Arc<Provider<P>>,
    chain_id: u64,
    confirmations: u64,
}

impl EvmClient<MeteredEthHttpProvider> {
    pub async fn new(config: &EvmChainConfig, metrics: Arc<BridgeMetrics>) -> anyhow::Result<Self> {
        let provider = new_metered_eth_provider(&config.rpc_url, config.chain_id, metrics)?;
        let client = Self::from_provider(provider, config.chain_id, config.block_confirmations);
        client.describe().await?;
        Ok(client)
    }
}

impl<P> EvmClient<P>
where
    P: JsonRpcClient + 'static,
{
    pub fn from_provider(provider: Provider<P>, chain_id: u64, confirmations: u64) -> Self {
        Self {
            provider: Arc::new(provider),
            chain_id,
            confirmations,
        }
    }

    // Validates the chain id and logs connection info
    async fn describe(&self) -> anyhow::Result<()> {
        let chain_id = self.provider.get_chainid().await?.as_u64();
        let block_number = self.provider.get_block_number().await?;
        if chain_id != self.chain_id {
            anyhow::bail!(
                "Chain id mismatch: configured {}, provider reports {}",
                self.chain_id,
                chain_id
            );
        }
        tracing::info!(
            "[{}] EvmClient connected, current block: {}",
            self.chain_id,
            block_number
        );
        Ok(())
    }

    async fn receipt_sender(&self, tx_hash: H256) -> BridgeResult<Address> {
        self.provider
            .get_transaction_receipt(tx_hash)
            .await?
            .map(|receipt| receipt.from)
            .ok_or_else(|| {
                BridgeError::TransientProviderError(format!("{:#x} is not mined yet", tx_hash))
            })
    }

    pub async fn fungible_info(&self, asset: &str) -> BridgeResult<FungibleAssetInfo> {
        let address: Address = asset
            .parse()
            .map_err(|e| BridgeError::InvalidConfig(format!("invalid token {asset}: {e}")))?;
        let token = Erc20Token::new(address, self.provider.clone());
        let contract_error = |e: ethers::contract::ContractError<Provider<P>>| {
            BridgeError::ProviderError(format!("token {asset}: {e}"))
        };
        Ok(FungibleAssetInfo {
            name: token.name().call().await.map_err(contract_error)?,
            symbol: token.symbol().call().await.map_err(contract_error)?,
            decimals: token.decimals().call().await.map_err(contract_error)?,
        })
    }
}

#[async_trait]
impl<P> ChainLogSource for EvmClient<P>
where
    P: JsonRpcClient + 'static,
{
    fn chain_id(&self) -> u64 {
        self.chain_id
    }

    fn required_confirmations(&self) -> u64 {
        self.confirmations
    }

    async fn current_block(&self) -> BridgeResult<u64> {
        Ok(self.provider.get_block_number().await?.as_u64())
    }

    // Note: query may fail if range is too big. The watcher clamps the window.
    async fn filter_logs(
        &self,
        filter: &FilterConfig,
        from_block: u64,
        to_block: u64,
    ) -> BridgeResult<Vec<Log>> {
        let query = Filter::new()
            .from_block(from_block)
            .to_block(to_block)
            .address(filter.addresses.clone())
            .topic0(filter.topics.clone());
        let logs = self
            .provider
            .get_logs(&query)
            .await
            .map_err(BridgeError::from)
            .tap_err(|e| {
                tracing::error!(
                    "[{}] filter_logs failed. Filter: {:?}. Error {:?}",
                    self.chain_id,
                    query,
                    e
                )
            })?;

        // Safeguard check that all events are emitted from requested contract addresses
        if let Some(log) = logs.iter().find(|log| !filter.addresses.contains(&log.address)) {
            return Err(BridgeError::ProviderError(format!(
                "Provider returns log from unexpected address {:?}",
                log.address
            )));
        }
        Ok(logs)
    }

    async fn block_timestamp(&self, block_number: u64) -> BridgeResult<u64> {
        let block = self
            .provider
            .get_block(block_number)
            .await?
            .ok_or_else(|| {
                BridgeError::ProviderError(format!("Provider cannot find block {block_number}"))
            })?;
        Ok(block.timestamp.as_u64())
    }

    async fn await_transaction(&self, tx_hash: H256) -> BridgeResult<Address> {
        match retry_with_max_elapsed_time!(self.receipt_sender(tx_hash), TX_MINING_TIMEOUT) {
            Ok(Ok(sender)) => Ok(sender),
            Ok(Err(e)) | Err(e) => Err(e),
        }
    }

    async fn governance_members(&self, router: Address) -> BridgeResult<Vec<Address>> {
        let contract = BridgeRouter::new(router, self.provider.clone());
        let contract_error = |e: ethers::contract::ContractError<Provider<P>>| {
            BridgeError::ProviderError(format!("router {router:?}: {e}"))
        };
        let count = contract
            .members_count()
            .call()
            .await
            .map_err(contract_error)?;
        let mut members = Vec::new();
        for index in 0..count.as_u64() {
            members.push(
                contract
                    .member_at(U256::from(index))
                    .call()
                    .await
                    .map_err(contract_error)?,
            );
        }
        Ok(members)
    }
}

/// Token metadata read from the EVM chains the node is connected to.
pub struct EvmMetadata<P> {
    clients: HashMap<u64, Arc<EvmClient<P>>>,
}

impl<P> EvmMetadata<P> {
    pub fn new(clients: HashMap<u64, Arc<EvmClient<P>>>) -> Self {
        Self { clients }
    }
}

#[async_trait]
impl<P> AssetMetadataSource for EvmMetadata<P>
where
    P: JsonRpcClient + 'static,
{
    async fn fungible_info(&self, chain_id: u64, asset: &str) -> BridgeResult<FungibleAssetInfo> {
        let client = self.clients.get(&chain_id).ok_or_else(|| {
            BridgeError::InvalidConfig(format!(
                "decimals of {asset} on chain {chain_id} must be configured"
            ))
        })?;
        client.fungible_info(asset).await
    }
}
