// Copyright (c) Hedera Bridge Contributors
// SPDX-License-Identifier: Apache-2.0

use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

/// Chain agnostic description of a single cross-chain transfer.
///
/// `amount` is always expressed in the decimals of `target_asset`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transfer {
    /// `<txHash>-<logIndex>` for EVM sourced events.
    pub transaction_id: String,
    pub source_chain_id: u64,
    pub target_chain_id: u64,
    pub native_chain_id: u64,
    pub source_asset: String,
    pub target_asset: String,
    pub native_asset: String,
    pub receiver: String,
    pub amount: String,
    pub originator: String,
    /// Source block timestamp, set only for read-only processing.
    pub timestamp: Option<u64>,
    pub is_nft: bool,
    pub serial_num: Option<i64>,
}

impl Transfer {
    pub fn transfer_id(&self) -> &str {
        &self.transaction_id
    }
}

/// Wrapped asset burned on an EVM chain, native asset released on Hedera.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BurnEvent {
    pub transfer: Transfer,
}

/// Native asset locked on an EVM chain, wrapped asset minted on Hedera.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LockEvent {
    pub transfer: Transfer,
}

/// Everything that can travel through the dispatch queue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Payload {
    Transfer(Transfer),
    Burn(BurnEvent),
    Lock(LockEvent),
}

impl Payload {
    pub fn transfer(&self) -> &Transfer {
        match self {
            Payload::Transfer(t) => t,
            Payload::Burn(e) => &e.transfer,
            Payload::Lock(e) => &e.transfer,
        }
    }
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, AsRefStr,
)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum EventStatus {
    Initial,
    Submitted,
    Completed,
    Failed,
}

impl EventStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, EventStatus::Completed | EventStatus::Failed)
    }
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, AsRefStr,
)]
#[strum(serialize_all = "snake_case")]
pub enum EventKind {
    Burn,
    Lock,
    Transfer,
    ReadOnly,
}

/// Persisted settlement record, one per event id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventRecord {
    pub id: String,
    pub kind: EventKind,
    pub amount: String,
    pub recipient: String,
    pub native_asset: String,
    pub wrapped_asset: String,
    pub status: EventStatus,
    pub schedule_id: Option<String>,
    pub transaction_id: Option<String>,
}

impl EventRecord {
    pub fn initial(kind: EventKind, transfer: &Transfer, wrapped_asset: &str) -> Self {
        Self {
            id: transfer.transaction_id.clone(),
            kind,
            amount: transfer.amount.clone(),
            recipient: transfer.receiver.clone(),
            native_asset: transfer.native_asset.clone(),
            wrapped_asset: wrapped_asset.to_string(),
            status: EventStatus::Initial,
            schedule_id: None,
            transaction_id: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_status_string_forms() {
        assert_eq!(EventStatus::Submitted.to_string(), "SUBMITTED");
        assert_eq!(
            EventStatus::from_str("COMPLETED").unwrap(),
            EventStatus::Completed
        );
        assert!(EventStatus::from_str("unknown").is_err());
        assert_eq!(EventKind::ReadOnly.as_ref(), "read_only");
        assert!(EventStatus::Failed.is_terminal());
        assert!(!EventStatus::Submitted.is_terminal());
    }
}
