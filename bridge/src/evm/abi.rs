// Copyright (c) Hedera Bridge Contributors
// SPDX-License-Identifier: Apache-2.0

use crate::error::{BridgeError, BridgeResult};
use ethers::abi::RawLog;
use ethers::contract::{abigen, EthEvent};
use ethers::types::{Address, Bytes, Log, H256, U256};

abigen!(
    BridgeRouter,
    r#"[
        function membersCount() external view returns (uint256)
        function memberAt(uint256 index) external view returns (address)
    ]"#,
);

abigen!(
    Erc20Token,
    r#"[
        function name() external view returns (string)
        function symbol() external view returns (string)
        function decimals() external view returns (uint8)
    ]"#,
);

#[derive(Clone, Debug, PartialEq, Eq, EthEvent)]
#[ethevent(name = "Lock")]
pub struct LockFilter {
    pub target_chain: U256,
    pub token: Address,
    pub receiver: Bytes,
    pub amount: U256,
    pub service_fee: U256,
}

#[derive(Clone, Debug, PartialEq, Eq, EthEvent)]
#[ethevent(name = "Burn")]
pub struct BurnFilter {
    pub target_chain: U256,
    pub token: Address,
    pub receiver: Bytes,
    pub amount: U256,
}

#[derive(Clone, Debug, PartialEq, Eq, EthEvent)]
#[ethevent(name = "BurnERC721")]
pub struct BurnErc721Filter {
    pub target_chain: U256,
    pub wrapped_token: Address,
    pub token_id: U256,
    pub payment_token: Address,
    pub fee: U256,
    pub receiver: Bytes,
}

#[derive(Clone, Debug, PartialEq, Eq, EthEvent)]
#[ethevent(name = "Mint")]
pub struct MintFilter {
    pub source_chain: U256,
    pub token: Address,
    pub transaction_id: Bytes,
    pub receiver: Address,
    pub amount: U256,
}

#[derive(Clone, Debug, PartialEq, Eq, EthEvent)]
#[ethevent(name = "Unlock")]
pub struct UnlockFilter {
    pub source_chain: U256,
    pub token: Address,
    pub transaction_id: Bytes,
    pub receiver: Address,
    pub amount: U256,
    pub service_fee: U256,
}

#[derive(Clone, Debug, PartialEq, Eq, EthEvent)]
#[ethevent(name = "MemberUpdated")]
pub struct MemberUpdatedFilter {
    pub member: Address,
    pub status: bool,
}

/// Router events the watcher subscribes to.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RouterEvent {
    Lock(LockFilter),
    Burn(BurnFilter),
    BurnErc721(BurnErc721Filter),
    Mint(MintFilter),
    Unlock(UnlockFilter),
    MemberUpdated(MemberUpdatedFilter),
}

impl RouterEvent {
    /// topic0 of every subscribed event.
    pub fn signatures() -> Vec<H256> {
        vec![
            LockFilter::signature(),
            BurnFilter::signature(),
            BurnErc721Filter::signature(),
            MintFilter::signature(),
            UnlockFilter::signature(),
            MemberUpdatedFilter::signature(),
        ]
    }

    /// Decodes a router log. `Ok(None)` for events the watcher does not track.
    pub fn decode(log: &Log) -> BridgeResult<Option<Self>> {
        let Some(topic) = log.topics.first() else {
            return Ok(None);
        };
        let raw = RawLog {
            topics: log.topics.clone(),
            data: log.data.to_vec(),
        };
        let undecodable = |e: ethers::abi::Error| BridgeError::UndecodableLog(e.to_string());
        let event = if *topic == LockFilter::signature() {
            RouterEvent::Lock(LockFilter::decode_log(&raw).map_err(undecodable)?)
        } else if *topic == BurnFilter::signature() {
            RouterEvent::Burn(BurnFilter::decode_log(&raw).map_err(undecodable)?)
        } else if *topic == BurnErc721Filter::signature() {
            RouterEvent::BurnErc721(BurnErc721Filter::decode_log(&raw).map_err(undecodable)?)
        } else if *topic == MintFilter::signature() {
            RouterEvent::Mint(MintFilter::decode_log(&raw).map_err(undecodable)?)
        } else if *topic == UnlockFilter::signature() {
            RouterEvent::Unlock(UnlockFilter::decode_log(&raw).map_err(undecodable)?)
        } else if *topic == MemberUpdatedFilter::signature() {
            RouterEvent::MemberUpdated(MemberUpdatedFilter::decode_log(&raw).map_err(undecodable)?)
        } else {
            return Ok(None);
        };
        Ok(Some(event))
    }

    pub fn name(&self) -> &'static str {
        match self {
            RouterEvent::Lock(_) => "lock",
            RouterEvent::Burn(_) => "burn",
            RouterEvent::BurnErc721(_) => "burn_erc721",
            RouterEvent::Mint(_) => "mint",
            RouterEvent::Unlock(_) => "unlock",
            RouterEvent::MemberUpdated(_) => "member_updated",
        }
    }
}
