// Copyright (c) Hedera Bridge Contributors
// SPDX-License-Identifier: Apache-2.0

//! Hedera side capabilities consumed by the settlement services.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_with::{DeserializeFromStr, SerializeDisplay};
use std::fmt;
use std::str::FromStr;
use tokio::sync::oneshot;

pub mod gateway;

pub use gateway::HederaGatewayClient;

/// `shard.realm.num` account identifier.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, SerializeDisplay, DeserializeFromStr,
)]
pub struct AccountId {
    pub shard: u64,
    pub realm: u64,
    pub num: u64,
}

impl AccountId {
    pub const fn new(shard: u64, realm: u64, num: u64) -> Self {
        Self { shard, realm, num }
    }

    /// Decodes the protobuf `AccountID` message carried in router `receiver` fields.
    pub fn from_protobuf_bytes(bytes: &[u8]) -> Result<Self, AccountIdError> {
        if bytes.is_empty() {
            return Err(AccountIdError::Empty);
        }
        let mut id = AccountId::new(0, 0, 0);
        let mut seen_num = false;
        let mut cursor = bytes;
        while !cursor.is_empty() {
            let key = read_varint(&mut cursor)?;
            let field = key >> 3;
            let wire_type = key & 0x7;
            if wire_type != 0 {
                return Err(AccountIdError::Malformed(format!(
                    "unexpected wire type {wire_type} for field {field}"
                )));
            }
            let value = read_varint(&mut cursor)?;
            match field {
                1 => id.shard = value,
                2 => id.realm = value,
                3 => {
                    id.num = value;
                    seen_num = true;
                }
                other => {
                    return Err(AccountIdError::Malformed(format!("unknown field {other}")));
                }
            }
        }
        if !seen_num {
            return Err(AccountIdError::Malformed("missing account number".into()));
        }
        Ok(id)
    }

    pub fn to_protobuf_bytes(&self) -> Vec<u8> {
        let mut out = Vec::new();
        for (field, value) in [(1u64, self.shard), (2, self.realm), (3, self.num)] {
            // proto3 omits default values, the account number is always written
            if value == 0 && field != 3 {
                continue;
            }
            write_varint(&mut out, field << 3);
            write_varint(&mut out, value);
        }
        out
    }
}

fn read_varint(cursor: &mut &[u8]) -> Result<u64, AccountIdError> {
    let mut value = 0u64;
    for shift in (0..64).step_by(7) {
        let (&byte, rest) = cursor
            .split_first()
            .ok_or_else(|| AccountIdError::Malformed("truncated varint".into()))?;
        *cursor = rest;
        value |= u64::from(byte & 0x7f) << shift;
        if byte & 0x80 == 0 {
            return Ok(value);
        }
    }
    Err(AccountIdError::Malformed("varint too long".into()))
}

fn write_varint(out: &mut Vec<u8>, mut value: u64) {
    while value >= 0x80 {
        out.push((value as u8 & 0x7f) | 0x80);
        value >>= 7;
    }
    out.push(value as u8);
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.shard, self.realm, self.num)
    }
}

impl FromStr for AccountId {
    type Err = AccountIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.split('.').collect();
        if parts.len() != 3 {
            return Err(AccountIdError::Malformed(format!("expected shard.realm.num: {s}")));
        }
        let parse = |p: &str| {
            p.parse::<u64>()
                .map_err(|e| AccountIdError::Malformed(format!("{s}: {e}")))
        };
        Ok(AccountId::new(
            parse(parts[0])?,
            parse(parts[1])?,
            parse(parts[2])?,
        ))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AccountIdError {
    #[error("empty account id")]
    Empty,
    #[error("malformed account id: {0}")]
    Malformed(String),
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LedgerError {
    #[error("transport error: {0}")]
    Transport(String),
    #[error("unexpected response: {0}")]
    Response(String),
    #[error("transaction not found: {0}")]
    NotFound(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountAmount {
    pub account: AccountId,
    pub amount: i64,
}

/// Inner transaction wrapped by a schedule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ScheduledTransaction {
    Transfer {
        token: String,
        transfers: Vec<AccountAmount>,
    },
    TokenMint {
        token: String,
        amount: i64,
    },
    NftTransfer {
        token: String,
        serial_num: i64,
        sender: AccountId,
        receiver: AccountId,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleRequest {
    /// Transfer id, used as the schedule memo so identical submissions collide.
    pub memo: String,
    pub payer: AccountId,
    pub transaction: ScheduledTransaction,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ScheduleStatus {
    Success,
    IdenticalScheduleAlreadyCreated,
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleSubmission {
    pub status: ScheduleStatus,
    pub schedule_id: String,
    /// Id of the scheduled (inner) transaction.
    pub transaction_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TxOutcome {
    Success,
    Failed(String),
}

#[async_trait]
pub trait ScheduledLedger: Send + Sync {
    async fn submit_schedule(
        &self,
        request: ScheduleRequest,
    ) -> Result<ScheduleSubmission, LedgerError>;

    /// Adds this node's signature to an existing schedule.
    async fn sign_schedule(&self, schedule_id: &str) -> Result<(), LedgerError>;

    /// Looks up the ledger transaction that settled `transfer_id`, if any.
    async fn find_transfer_transaction(
        &self,
        transfer_id: &str,
    ) -> Result<Option<String>, LedgerError>;
}

/// Resolves once a ledger transaction reaches finality.
pub trait TransactionWatcher: Send + Sync {
    fn watch(&self, transaction_id: &str) -> oneshot::Receiver<TxOutcome>;
}

/// Publishes signed transfer authorisations for EVM destinations.
#[async_trait]
pub trait MessageSubmitter: Send + Sync {
    async fn submit_message(&self, transfer: &crate::types::Transfer) -> Result<String, LedgerError>;
}
