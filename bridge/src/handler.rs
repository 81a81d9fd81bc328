// Copyright (c) Hedera Bridge Contributors
// SPDX-License-Identifier: Apache-2.0

use crate::queue::{Handler, Topic};
use crate::settlement::{BurnEventService, LockEventService, ReadOnlyService, TransferService};
use crate::types::Payload;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::debug;

/// Settlement services a handler forwards payloads to.
#[derive(Clone)]
pub struct SettlementServices {
    pub burn: Arc<BurnEventService>,
    pub lock: Arc<LockEventService>,
    pub transfers: Arc<TransferService>,
    pub read_only: Arc<ReadOnlyService>,
}

/// Consumer of a single topic, dispatching by payload variant.
pub struct EventHandler {
    topic: Topic,
    services: SettlementServices,
}

impl EventHandler {
    pub fn new(topic: Topic, services: SettlementServices) -> Self {
        Self { topic, services }
    }
}

#[async_trait]
impl Handler for EventHandler {
    async fn handle(&self, payload: Payload) {
        debug!(
            "[Handler:{}] Handling {}",
            self.topic,
            payload.transfer().transaction_id
        );
        match payload {
            Payload::Transfer(transfer) if self.topic.is_read_only() => {
                self.services.read_only.process_transfer(transfer).await
            }
            Payload::Transfer(transfer) => self.services.transfers.process_transfer(transfer).await,
            Payload::Lock(event) => self.services.lock.process_event(event).await,
            Payload::Burn(event) => self.services.burn.process_event(event).await,
        }
    }
}
