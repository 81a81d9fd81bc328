// Copyright (c) Hedera Bridge Contributors
// SPDX-License-Identifier: Apache-2.0

//! Topic addressed in-process queue between watchers and handlers.
//!
//! Every topic owns one bounded channel and exactly one consumer task, wired once at
//! startup. `push` waits for capacity, so a slow consumer applies backpressure to the
//! watchers instead of dropping events.

use crate::error::{BridgeError, BridgeResult};
use crate::metrics::BridgeMetrics;
use crate::types::Payload;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use strum_macros::{Display, EnumIter};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{info, warn};

pub const TOPIC_MESSAGE_SUBMISSION: &str = "message_submission";
pub const TOPIC_HEDERA_MINT_HTS_TRANSFER: &str = "hedera_mint_hts_transfer";
pub const TOPIC_HEDERA_FEE_TRANSFER: &str = "hedera_fee_transfer";
pub const TOPIC_HEDERA_NFT_TRANSFER: &str = "hedera_nft_transfer";
pub const TOPIC_READ_ONLY_TRANSFER_SAVE: &str = "read_only_transfer_save";
pub const TOPIC_READ_ONLY_HEDERA_MINT_HTS_TRANSFER: &str = "read_only_hedera_mint_hts_transfer";
pub const TOPIC_READ_ONLY_HEDERA_FEE_TRANSFER: &str = "read_only_hedera_fee_transfer";
pub const TOPIC_READ_ONLY_HEDERA_NFT_TRANSFER: &str = "read_only_hedera_nft_transfer";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter)]
pub enum Topic {
    #[strum(serialize = "message_submission")]
    MessageSubmission,
    #[strum(serialize = "hedera_mint_hts_transfer")]
    HederaMintHtsTransfer,
    #[strum(serialize = "hedera_fee_transfer")]
    HederaFeeTransfer,
    #[strum(serialize = "hedera_nft_transfer")]
    HederaNftTransfer,
    #[strum(serialize = "read_only_transfer_save")]
    ReadOnlyTransferSave,
    #[strum(serialize = "read_only_hedera_mint_hts_transfer")]
    ReadOnlyHederaMintHtsTransfer,
    #[strum(serialize = "read_only_hedera_fee_transfer")]
    ReadOnlyHederaFeeTransfer,
    #[strum(serialize = "read_only_hedera_nft_transfer")]
    ReadOnlyHederaNftTransfer,
}

impl Topic {
    pub fn name(&self) -> &'static str {
        match self {
            Topic::MessageSubmission => TOPIC_MESSAGE_SUBMISSION,
            Topic::HederaMintHtsTransfer => TOPIC_HEDERA_MINT_HTS_TRANSFER,
            Topic::HederaFeeTransfer => TOPIC_HEDERA_FEE_TRANSFER,
            Topic::HederaNftTransfer => TOPIC_HEDERA_NFT_TRANSFER,
            Topic::ReadOnlyTransferSave => TOPIC_READ_ONLY_TRANSFER_SAVE,
            Topic::ReadOnlyHederaMintHtsTransfer => TOPIC_READ_ONLY_HEDERA_MINT_HTS_TRANSFER,
            Topic::ReadOnlyHederaFeeTransfer => TOPIC_READ_ONLY_HEDERA_FEE_TRANSFER,
            Topic::ReadOnlyHederaNftTransfer => TOPIC_READ_ONLY_HEDERA_NFT_TRANSFER,
        }
    }

    pub fn is_read_only(&self) -> bool {
        matches!(
            self,
            Topic::ReadOnlyTransferSave
                | Topic::ReadOnlyHederaMintHtsTransfer
                | Topic::ReadOnlyHederaFeeTransfer
                | Topic::ReadOnlyHederaNftTransfer
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub payload: Payload,
    pub topic: Topic,
}

/// Consumer of one topic.
#[async_trait]
pub trait Handler: Send + Sync {
    async fn handle(&self, payload: Payload);
}

/// Producer side of the queue, shared by every watcher.
#[async_trait]
pub trait Publisher: Send + Sync {
    async fn push(&self, message: Message) -> BridgeResult<()>;
}

pub struct Queue {
    senders: HashMap<Topic, mpsc::Sender<Payload>>,
    metrics: Arc<BridgeMetrics>,
}

pub struct QueueBuilder {
    capacity: usize,
    handlers: HashMap<Topic, Arc<dyn Handler>>,
}

impl QueueBuilder {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            handlers: HashMap::new(),
        }
    }

    /// Registers the single consumer of `topic`.
    pub fn subscribe(mut self, topic: Topic, handler: Arc<dyn Handler>) -> BridgeResult<Self> {
        if self.handlers.insert(topic, handler).is_some() {
            return Err(BridgeError::QueueError(format!(
                "topic {topic} already has a handler"
            )));
        }
        Ok(self)
    }

    /// Spawns one consumer task per topic. The tasks exit once the queue is dropped.
    pub fn start(self, metrics: Arc<BridgeMetrics>) -> (Queue, Vec<JoinHandle<()>>) {
        let mut senders = HashMap::new();
        let mut handles = Vec::new();
        for (topic, handler) in self.handlers {
            let (tx, mut rx) = mpsc::channel::<Payload>(self.capacity.max(1));
            senders.insert(topic, tx);
            handles.push(tokio::spawn(async move {
                info!("[Queue] Consumer for {} started", topic);
                while let Some(payload) = rx.recv().await {
                    handler.handle(payload).await;
                }
                info!("[Queue] Consumer for {} stopped", topic);
            }));
        }
        (Queue { senders, metrics }, handles)
    }
}

#[async_trait]
impl Publisher for Queue {
    async fn push(&self, message: Message) -> BridgeResult<()> {
        let sender = self.senders.get(&message.topic).ok_or_else(|| {
            BridgeError::QueueError(format!("no handler for topic {}", message.topic))
        })?;
        let id = message.payload.transfer().transaction_id.clone();
        sender.send(message.payload).await.map_err(|_| {
            warn!("[Queue] Consumer of {} is gone, dropping {}", message.topic, id);
            BridgeError::QueueError(format!("topic {} is closed", message.topic))
        })?;
        self.metrics
            .queued_transfers
            .with_label_values(&[message.topic.name()])
            .inc();
        Ok(())
    }
}
