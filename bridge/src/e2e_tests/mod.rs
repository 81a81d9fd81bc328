// Copyright (c) Hedera Bridge Contributors
// SPDX-License-Identifier: Apache-2.0

//! Watcher, queue, handlers and settlement wired together over in-memory stores.

use crate::handler::{EventHandler, SettlementServices};
use crate::queue::{Queue, QueueBuilder, Topic};
use crate::storage::{EventStore, InMemoryStatusStore};
use crate::test_utils::{
    test_pricing, MockChainSource, SettlementHarness, EVM_CHAIN, HEDERA,
};
use crate::types::EventRecord;
use crate::watcher::{GovernanceMembers, PollOutcome, Watcher, WatcherConfig};
use ethers::types::{Address, H256};
use rust_decimal_macros::dec;
use std::sync::Arc;
use std::time::Duration;
use strum::IntoEnumIterator;
use tokio::task::JoinHandle;


pub const ROUTER: Address = Address::repeat_byte(0x11);
pub const DB_ID: &str = "80001-router";

pub struct Pipeline {
    pub settlement: SettlementHarness,
    pub source: Arc<MockChainSource>,
    pub status: Arc<InMemoryStatusStore>,
    pub watcher: Watcher,
    queue: Queue,
    _consumers: Vec<JoinHandle<()>>,
}

impl Pipeline {
    /// Validator pipeline whose watcher resumes at `start_block`, chain head at 100.
    pub async fn new(start_block: Option<u64>) -> Self {
        let settlement = SettlementHarness::new().await;
        let services = SettlementServices {
            burn: Arc::new(settlement.burn_service()),
            lock: Arc::new(settlement.lock_service()),
            transfers: Arc::new(settlement.transfer_service()),
            read_only: Arc::new(settlement.read_only_service(Duration::from_millis(500))),
        };
        let mut builder = QueueBuilder::new(16);
        for topic in Topic::iter() {
            builder = builder
                .subscribe(topic, Arc::new(EventHandler::new(topic, services.clone())))
                .unwrap();
        }
        let (queue, consumers) = builder.start(settlement.metrics.clone());

        let source = Arc::new(MockChainSource::new(EVM_CHAIN, 5));
        source.set_head(100);
        let status = Arc::new(InMemoryStatusStore::new());
        let pricing = test_pricing(
            settlement.assets.clone(),
            dec!(0.05),
            settlement.metrics.clone(),
        )
        .await;
        let watcher = Watcher::new(
            WatcherConfig {
                db_identifier: DB_ID.to_string(),
                router: ROUTER,
                start_block,
                validator: true,
                polling_interval: Duration::from_millis(10),
                max_block_span: 1000,
                hedera_network_id: HEDERA,
            },
            source.clone(),
            status.clone(),
            settlement.assets.clone(),
            pricing,
            Arc::new(GovernanceMembers::default()),
            settlement.metrics.clone(),
        )
        .await
        .unwrap();

        Self {
            settlement,
            source,
            status,
            watcher,
            queue,
            _consumers: consumers,
        }
    }

    pub async fn poll(&self) -> PollOutcome {
        self.watcher.poll_once(&self.queue).await.unwrap()
    }

    /// Waits until the record of `id` reaches a terminal status.
    pub async fn settled(&self, id: &str) -> EventRecord {
        let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
        loop {
            if let Some(record) = self.settlement.store.get(id).await.unwrap() {
                if record.status.is_terminal() {
                    return record;
                }
            }
            assert!(
                tokio::time::Instant::now() < deadline,
                "{id} did not settle in time"
            );
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    }
}

/// Transfer id of the first log of the mock transaction at `block`.
pub fn log_id(block: u64) -> String {
    format!("{:#x}-0", H256::from_low_u64_be(0xabc0_0000 + block))
}
