// Copyright (c) Hedera Bridge Contributors
// SPDX-License-Identifier: Apache-2.0

//! Durable state of the node: watcher watermarks and settlement records.

use crate::types::{EventRecord, EventStatus};
use async_trait::async_trait;

pub mod memory;
pub mod pg;

pub use memory::{InMemoryEventStore, InMemoryStatusStore};
pub use pg::{PgEventStore, PgStatusStore};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    #[error("record not found")]
    NotFound,

    #[error("record already exists: {0}")]
    AlreadyExists(String),

    #[error("database error: {0}")]
    Database(String),
}

impl From<anyhow::Error> for StoreError {
    fn from(e: anyhow::Error) -> Self {
        StoreError::Database(e.to_string())
    }
}

/// Watermark store keyed by watcher identifier (`<chainId>-<contractAddress>`).
#[async_trait]
pub trait StatusStore: Send + Sync {
    async fn get(&self, id: &str) -> Result<i64, StoreError>;

    async fn create(&self, id: &str, value: i64) -> Result<(), StoreError>;

    async fn update(&self, id: &str, value: i64) -> Result<(), StoreError>;
}

/// Settlement records keyed by event id.
#[async_trait]
pub trait EventStore: Send + Sync {
    /// Inserts a new record. Fails with [`StoreError::AlreadyExists`] if the id is known.
    async fn create(&self, record: &EventRecord) -> Result<(), StoreError>;

    async fn update_submitted(
        &self,
        id: &str,
        schedule_id: Option<&str>,
        transaction_id: &str,
    ) -> Result<(), StoreError>;

    async fn update_status(&self, id: &str, status: EventStatus) -> Result<(), StoreError>;

    async fn get(&self, id: &str) -> Result<Option<EventRecord>, StoreError>;
}
