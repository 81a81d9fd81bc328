// Copyright (c) Hedera Bridge Contributors
// SPDX-License-Identifier: Apache-2.0

use crate::hedera::LedgerError;
use crate::storage::StoreError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BridgeError {
    // Log was dropped from the canonical chain by a reorg
    RemovedLog,
    // Event carries an empty receiver
    EmptyReceiver,
    // Receiver bytes cannot be decoded for the target chain
    InvalidReceiver(String),
    // Asset has no counterpart on the requested chain
    UnsupportedAsset { chain_id: u64, asset: String },
    // Route between chains is not supported (e.g. wrapped-to-wrapped)
    UnsupportedRoute { source: u64, target: u64 },
    // Converted amount underflows to zero
    ZeroAmount(String),
    // Amount does not fit the target representation
    AmountOverflow(String),
    // Amount is below the minimum that covers the bridge fee
    BelowMinimumAmount { amount: String, minimum: String },
    // No price information is known for the asset yet
    MissingPriceInfo { chain_id: u64, asset: String },
    // Log could not be decoded into a router event
    UndecodableLog(String),
    // Transient EVM provider error
    TransientProviderError(String),
    // EVM provider error
    ProviderError(String),
    // Ledger gateway error
    LedgerError(String),
    // Dispatch queue has no consumer for the topic or is closed
    QueueError(String),
    // Storage error
    StorageError(String),
    // Invalid configuration
    InvalidConfig(String),
    // Internal bridge error
    InternalError(String),
    // Uncategorized error
    Generic(String),
}

impl BridgeError {
    /// Returns a short string identifying the error type for metrics labels
    pub fn error_type(&self) -> &'static str {
        match self {
            BridgeError::RemovedLog => "removed_log",
            BridgeError::EmptyReceiver => "empty_receiver",
            BridgeError::InvalidReceiver(_) => "invalid_receiver",
            BridgeError::UnsupportedAsset { .. } => "unsupported_asset",
            BridgeError::UnsupportedRoute { .. } => "unsupported_route",
            BridgeError::ZeroAmount(_) => "zero_amount",
            BridgeError::AmountOverflow(_) => "amount_overflow",
            BridgeError::BelowMinimumAmount { .. } => "below_minimum_amount",
            BridgeError::MissingPriceInfo { .. } => "missing_price_info",
            BridgeError::UndecodableLog(_) => "undecodable_log",
            BridgeError::TransientProviderError(_) => "transient_provider_error",
            BridgeError::ProviderError(_) => "provider_error",
            BridgeError::LedgerError(_) => "ledger_error",
            BridgeError::QueueError(_) => "queue_error",
            BridgeError::StorageError(_) => "storage_error",
            BridgeError::InvalidConfig(_) => "invalid_config",
            BridgeError::InternalError(_) => "internal_error",
            BridgeError::Generic(_) => "generic",
        }
    }

    /// Whether the error is a policy or validation rejection of the event itself.
    pub fn is_rejection(&self) -> bool {
        matches!(
            self,
            BridgeError::RemovedLog
                | BridgeError::EmptyReceiver
                | BridgeError::InvalidReceiver(_)
                | BridgeError::UnsupportedAsset { .. }
                | BridgeError::UnsupportedRoute { .. }
                | BridgeError::ZeroAmount(_)
                | BridgeError::AmountOverflow(_)
                | BridgeError::BelowMinimumAmount { .. }
                | BridgeError::UndecodableLog(_)
        )
    }
}

impl std::fmt::Display for BridgeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BridgeError::RemovedLog => write!(f, "log removed by chain reorganisation"),
            BridgeError::EmptyReceiver => write!(f, "empty receiver"),
            BridgeError::InvalidReceiver(e) => write!(f, "invalid receiver: {e}"),
            BridgeError::UnsupportedAsset { chain_id, asset } => {
                write!(f, "asset {asset} on chain {chain_id} is not supported")
            }
            BridgeError::UnsupportedRoute { source, target } => {
                write!(f, "route {source} -> {target} is not supported")
            }
            BridgeError::ZeroAmount(e) => write!(f, "amount converts to zero: {e}"),
            BridgeError::AmountOverflow(e) => write!(f, "amount overflow: {e}"),
            BridgeError::BelowMinimumAmount { amount, minimum } => {
                write!(f, "amount {amount} is below minimum {minimum}")
            }
            BridgeError::MissingPriceInfo { chain_id, asset } => {
                write!(f, "no price info for {asset} on chain {chain_id}")
            }
            BridgeError::UndecodableLog(e) => write!(f, "undecodable log: {e}"),
            BridgeError::TransientProviderError(e) => write!(f, "transient provider error: {e}"),
            BridgeError::ProviderError(e) => write!(f, "provider error: {e}"),
            BridgeError::LedgerError(e) => write!(f, "ledger error: {e}"),
            BridgeError::QueueError(e) => write!(f, "queue error: {e}"),
            BridgeError::StorageError(e) => write!(f, "storage error: {e}"),
            BridgeError::InvalidConfig(e) => write!(f, "invalid config: {e}"),
            BridgeError::InternalError(e) => write!(f, "internal error: {e}"),
            BridgeError::Generic(e) => write!(f, "{e}"),
        }
    }
}

impl std::error::Error for BridgeError {}

impl From<ethers::providers::ProviderError> for BridgeError {
    fn from(e: ethers::providers::ProviderError) -> Self {
        BridgeError::ProviderError(e.to_string())
    }
}

impl From<StoreError> for BridgeError {
    fn from(e: StoreError) -> Self {
        BridgeError::StorageError(e.to_string())
    }
}

impl From<LedgerError> for BridgeError {
    fn from(e: LedgerError) -> Self {
        BridgeError::LedgerError(e.to_string())
    }
}

pub type BridgeResult<T> = Result<T, BridgeError>;
