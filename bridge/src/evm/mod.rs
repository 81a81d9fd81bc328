// Copyright (c) Hedera Bridge Contributors
// SPDX-License-Identifier: Apache-2.0

//! EVM side of the bridge: router ABI, the log source seam and its ethers implementation.

use crate::error::BridgeResult;
use async_trait::async_trait;
use ethers::contract::EthEvent;
use ethers::types::{Address, Log, H256};

pub mod abi;
pub mod client;
pub mod metered_provider;

pub use abi::RouterEvent;
pub use client::{EvmClient, EvmMetadata};

/// Addresses and topic0 values a watcher queries logs for. Compiled once at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterConfig {
    pub addresses: Vec<Address>,
    pub topics: Vec<H256>,
}

impl FilterConfig {
    pub fn router(router: Address) -> Self {
        Self {
            addresses: vec![router],
            topics: RouterEvent::signatures(),
        }
    }
}

/// Read access to one EVM chain.
#[async_trait]
pub trait ChainLogSource: Send + Sync {
    fn chain_id(&self) -> u64;

    /// Blocks a log must be buried under before the watcher processes it.
    fn required_confirmations(&self) -> u64;

    async fn current_block(&self) -> BridgeResult<u64>;

    /// Logs in `[from_block, to_block]`, both inclusive.
    async fn filter_logs(
        &self,
        filter: &FilterConfig,
        from_block: u64,
        to_block: u64,
    ) -> BridgeResult<Vec<Log>>;

    async fn block_timestamp(&self, block_number: u64) -> BridgeResult<u64>;

    /// Waits until `tx_hash` is mined and returns its sender.
    async fn await_transaction(&self, tx_hash: H256) -> BridgeResult<Address>;

    async fn governance_members(&self, router: Address) -> BridgeResult<Vec<Address>>;
}

/// `<txHash>-<logIndex>` id of the Lock or Burn emitted by `router` in a transaction.
///
/// With several matching logs the last one wins. `BurnERC721` logs never match.
pub fn transfer_id_from_receipt(tx_hash: H256, logs: &[Log], router: Address) -> Option<String> {
    let lock = abi::LockFilter::signature();
    let burn = abi::BurnFilter::signature();
    let index = logs
        .iter()
        .filter(|log| log.address == router)
        .filter(|log| matches!(log.topics.first(), Some(t) if *t == lock || *t == burn))
        .filter_map(|log| log.log_index)
        .last()?;
    Some(format!("{:#x}-{}", tx_hash, index))
}

/// Log id used as the transfer id of router events.
pub fn log_transfer_id(log: &Log) -> Option<String> {
    let tx_hash = log.transaction_hash?;
    let index = log.log_index?;
    Some(format!("{:#x}-{}", tx_hash, index))
}
