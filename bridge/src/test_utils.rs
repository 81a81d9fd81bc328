// Copyright (c) Hedera Bridge Contributors
// SPDX-License-Identifier: Apache-2.0

use crate::assets::pricing::{PricingSource, UsdPrices};
use crate::assets::{AssetMetadataSource, AssetRegistry, FungibleAssetInfo, PricingService};
use crate::assets::pricing::PriceIds;
use crate::config::{NativeAssetConfig, WrappedAssetConfig};
use crate::error::{BridgeError, BridgeResult};
use crate::evm::abi::{
    BurnErc721Filter, BurnFilter, LockFilter, MemberUpdatedFilter, MintFilter,
};
use crate::evm::{ChainLogSource, FilterConfig};
use crate::hedera::{
    AccountId, LedgerError, MessageSubmitter, ScheduleRequest, ScheduleStatus,
    ScheduleSubmission, ScheduledLedger, TransactionWatcher, TxOutcome,
};
use crate::metrics::BridgeMetrics;
use crate::queue::{Handler, Message, Publisher};
use crate::settlement::{
    BurnEventService, HederaAccounts, LockEventService, ReadOnlyService, Scheduler,
    TransferService,
};
use crate::storage::{InMemoryEventStore, InMemoryStatusStore, StatusStore, StoreError};
use crate::types::{Payload, Transfer};
use async_trait::async_trait;
use ethers::abi::Token;
use ethers::contract::EthEvent;
use ethers::types::{Address, Log, H256, U256};
use rust_decimal::Decimal;
use std::collections::{BTreeMap, HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tokio::sync::{oneshot, watch};
use tokio_util::task::TaskTracker;

pub const HEDERA: u64 = 0;
pub const EVM_CHAIN: u64 = 80001;
pub const OTHER_EVM_CHAIN: u64 = 5;

/// Wrapped HBAR on `EVM_CHAIN`.
pub const WRAPPED_HBAR: &str = "0x00000000000000000000000000000000000000aa";
/// Wrapped Hedera NFT collection on `EVM_CHAIN`.
pub const WRAPPED_NFT: &str = "0x00000000000000000000000000000000000000bb";
/// ERC20 native to `EVM_CHAIN`.
pub const NATIVE_TOKEN: &str = "0x00000000000000000000000000000000000000cc";
pub const NATIVE_NFT: &str = "0.0.7007";
pub const WRAPPED_TOKEN_ON_HEDERA: &str = "0.0.4004";
pub const WRAPPED_TOKEN_ON_OTHER_EVM: &str = "0x00000000000000000000000000000000000000dd";

pub const BRIDGE_ACCOUNT: AccountId = AccountId::new(0, 0, 1001);
pub const PAYER_ACCOUNT: AccountId = AccountId::new(0, 0, 1002);
pub const RECEIVER_ACCOUNT: AccountId = AccountId::new(0, 0, 2002);

/// Metadata source answering every lookup with the same decimals.
pub struct StaticMetadata {
    decimals: u8,
}

impl StaticMetadata {
    pub fn with_decimals(decimals: u8) -> Self {
        Self { decimals }
    }
}

#[async_trait]
impl AssetMetadataSource for StaticMetadata {
    async fn fungible_info(&self, _chain_id: u64, asset: &str) -> BridgeResult<FungibleAssetInfo> {
        Ok(FungibleAssetInfo {
            name: asset.to_string(),
            symbol: asset.to_string(),
            decimals: self.decimals,
        })
    }
}

/// Returns the scripted results in order, then fails.
pub struct ScriptedPricingSource {
    results: Mutex<VecDeque<BridgeResult<UsdPrices>>>,
}

impl ScriptedPricingSource {
    pub fn new(results: Vec<BridgeResult<UsdPrices>>) -> Self {
        Self {
            results: Mutex::new(results.into()),
        }
    }
}

#[async_trait]
impl PricingSource for ScriptedPricingSource {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn get_usd_prices(&self, _ids: &PriceIds) -> BridgeResult<UsdPrices> {
        self.results
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(BridgeError::Generic("script exhausted".into())))
    }
}

/// Assets used by the settlement and watcher tests.
///
/// - HBAR, native on Hedera (8 decimals, 1% fee), wrapped on `EVM_CHAIN` (18 decimals)
/// - an ERC20 native on `EVM_CHAIN` (18 decimals, no fee), wrapped on Hedera (8 decimals)
///   and on `OTHER_EVM_CHAIN`
/// - an NFT collection native on Hedera, wrapped on `EVM_CHAIN`
pub fn test_asset_configs() -> Vec<NativeAssetConfig> {
    vec![
        NativeAssetConfig {
            chain_id: HEDERA,
            asset: "HBAR".into(),
            decimals: Some(8),
            non_fungible: false,
            fee_percentage: 1000,
            min_fee_amount_in_usd: Decimal::ONE,
            coin_gecko_id: Some("hedera-hashgraph".into()),
            wrapped: BTreeMap::from([(
                EVM_CHAIN,
                WrappedAssetConfig {
                    asset: WRAPPED_HBAR.into(),
                    decimals: Some(18),
                },
            )]),
        },
        NativeAssetConfig {
            chain_id: EVM_CHAIN,
            asset: NATIVE_TOKEN.into(),
            decimals: Some(18),
            non_fungible: false,
            fee_percentage: 0,
            min_fee_amount_in_usd: Decimal::ZERO,
            coin_gecko_id: None,
            wrapped: BTreeMap::from([
                (
                    HEDERA,
                    WrappedAssetConfig {
                        asset: WRAPPED_TOKEN_ON_HEDERA.into(),
                        decimals: Some(8),
                    },
                ),
                (
                    OTHER_EVM_CHAIN,
                    WrappedAssetConfig {
                        asset: WRAPPED_TOKEN_ON_OTHER_EVM.into(),
                        decimals: Some(18),
                    },
                ),
            ]),
        },
        NativeAssetConfig {
            chain_id: HEDERA,
            asset: NATIVE_NFT.into(),
            decimals: None,
            non_fungible: true,
            fee_percentage: 0,
            min_fee_amount_in_usd: Decimal::ZERO,
            coin_gecko_id: None,
            wrapped: BTreeMap::from([(
                EVM_CHAIN,
                WrappedAssetConfig {
                    asset: WRAPPED_NFT.into(),
                    decimals: None,
                },
            )]),
        },
    ]
}

pub async fn test_registry() -> Arc<AssetRegistry> {
    Arc::new(
        AssetRegistry::load(&test_asset_configs(), &StaticMetadata::with_decimals(18))
            .await
            .unwrap(),
    )
}

/// HBAR price ids of [`test_asset_configs`].
pub fn test_price_ids() -> PriceIds {
    HashMap::from([(
        HEDERA,
        HashMap::from([("HBAR".to_string(), "hedera-hashgraph".to_string())]),
    )])
}

/// Pricing service with HBAR at `hbar_usd`.
pub async fn test_pricing(
    assets: Arc<AssetRegistry>,
    hbar_usd: Decimal,
    metrics: Arc<BridgeMetrics>,
) -> Arc<PricingService> {
    let prices = HashMap::from([(HEDERA, HashMap::from([("HBAR".to_string(), hbar_usd)]))]);
    let source = Arc::new(ScriptedPricingSource::new(vec![Ok(prices)]));
    let pricing = PricingService::new(assets, test_price_ids(), vec![source], metrics);
    pricing.refresh().await.unwrap();
    Arc::new(pricing)
}

/// EVM to EVM transfer of the `EVM_CHAIN` native token.
pub fn sample_transfer(id: &str) -> Transfer {
    Transfer {
        transaction_id: id.to_string(),
        source_chain_id: EVM_CHAIN,
        target_chain_id: OTHER_EVM_CHAIN,
        native_chain_id: EVM_CHAIN,
        source_asset: NATIVE_TOKEN.into(),
        target_asset: WRAPPED_TOKEN_ON_OTHER_EVM.into(),
        native_asset: NATIVE_TOKEN.into(),
        receiver: "0x000000000000000000000000000000000000bEEF".into(),
        amount: "1000".into(),
        originator: "0x9999999999999999999999999999999999999999".into(),
        timestamp: None,
        is_nft: false,
        serial_num: None,
    }
}

/// Wrapped HBAR burned on `EVM_CHAIN`, released on Hedera.
pub fn burn_transfer(id: &str, amount: &str) -> Transfer {
    Transfer {
        transaction_id: id.to_string(),
        source_chain_id: EVM_CHAIN,
        target_chain_id: HEDERA,
        native_chain_id: HEDERA,
        source_asset: WRAPPED_HBAR.into(),
        target_asset: "HBAR".into(),
        native_asset: "HBAR".into(),
        receiver: RECEIVER_ACCOUNT.to_string(),
        amount: amount.to_string(),
        originator: "0x9999999999999999999999999999999999999999".into(),
        timestamp: None,
        is_nft: false,
        serial_num: None,
    }
}

/// `EVM_CHAIN` native token locked, wrapped version minted on Hedera.
pub fn lock_transfer(id: &str, amount: &str) -> Transfer {
    Transfer {
        transaction_id: id.to_string(),
        source_chain_id: EVM_CHAIN,
        target_chain_id: HEDERA,
        native_chain_id: EVM_CHAIN,
        source_asset: NATIVE_TOKEN.into(),
        target_asset: WRAPPED_TOKEN_ON_HEDERA.into(),
        native_asset: NATIVE_TOKEN.into(),
        receiver: RECEIVER_ACCOUNT.to_string(),
        amount: amount.to_string(),
        originator: "0x9999999999999999999999999999999999999999".into(),
        timestamp: None,
        is_nft: false,
        serial_num: None,
    }
}

/// Handler recording every payload. A blocked handler waits for [`RecordingHandler::release`].
pub struct RecordingHandler {
    received: tokio::sync::Mutex<Vec<Payload>>,
    gate: watch::Sender<bool>,
}

impl Default for RecordingHandler {
    fn default() -> Self {
        Self {
            received: Default::default(),
            gate: watch::channel(true).0,
        }
    }
}

impl RecordingHandler {
    pub fn blocked() -> Self {
        Self {
            received: Default::default(),
            gate: watch::channel(false).0,
        }
    }

    pub fn release(&self) {
        self.gate.send_replace(true);
    }

    pub async fn received(&self) -> Vec<Payload> {
        self.received.lock().await.clone()
    }

    /// Waits until `count` payloads arrived or `timeout` elapsed.
    pub async fn wait_for(&self, count: usize, timeout: Duration) -> Vec<Payload> {
        let deadline = Instant::now() + timeout;
        loop {
            let received = self.received().await;
            if received.len() >= count || Instant::now() >= deadline {
                return received;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    }
}

#[async_trait]
impl Handler for RecordingHandler {
    async fn handle(&self, payload: Payload) {
        let mut gate = self.gate.subscribe();
        let _ = gate.wait_for(|open| *open).await;
        self.received.lock().await.push(payload);
    }
}

/// Publisher keeping every pushed message. It can refuse every push, or stall on it the
/// way a full queue does.
#[derive(Default)]
pub struct RecordingPublisher {
    messages: Mutex<Vec<Message>>,
    failing: AtomicBool,
    stalled: AtomicBool,
}

impl RecordingPublisher {
    pub fn failing() -> Self {
        let publisher = Self::default();
        publisher.failing.store(true, Ordering::SeqCst);
        publisher
    }

    pub fn stalled() -> Self {
        let publisher = Self::default();
        publisher.stalled.store(true, Ordering::SeqCst);
        publisher
    }

    pub fn messages(&self) -> Vec<Message> {
        self.messages.lock().unwrap().clone()
    }
}

#[async_trait]
impl Publisher for RecordingPublisher {
    async fn push(&self, message: Message) -> BridgeResult<()> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(BridgeError::QueueError("closed".into()));
        }
        if self.stalled.load(Ordering::SeqCst) {
            std::future::pending::<()>().await;
        }
        self.messages.lock().unwrap().push(message);
        Ok(())
    }
}

/// Schedule service keyed by request: identical requests resolve to the same schedule.
#[derive(Default)]
pub struct MockLedger {
    state: Mutex<MockLedgerState>,
}

#[derive(Default)]
struct MockLedgerState {
    requests: Vec<ScheduleRequest>,
    schedules: Vec<(ScheduleRequest, ScheduleSubmission)>,
    forced_status: Option<ScheduleStatus>,
    signatures: Vec<String>,
    settled: HashMap<String, String>,
}

impl MockLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn requests(&self) -> Vec<ScheduleRequest> {
        self.state.lock().unwrap().requests.clone()
    }

    pub async fn signatures(&self) -> Vec<String> {
        self.state.lock().unwrap().signatures.clone()
    }

    /// Every following submission reports `status`.
    pub async fn force_status(&self, status: ScheduleStatus) {
        self.state.lock().unwrap().forced_status = Some(status);
    }

    pub async fn add_settled_transfer(&self, transfer_id: &str, transaction_id: &str) {
        self.state
            .lock()
            .unwrap()
            .settled
            .insert(transfer_id.to_string(), transaction_id.to_string());
    }
}

#[async_trait]
impl ScheduledLedger for MockLedger {
    async fn submit_schedule(
        &self,
        request: ScheduleRequest,
    ) -> Result<ScheduleSubmission, LedgerError> {
        let mut state = self.state.lock().unwrap();
        state.requests.push(request.clone());
        let existing = state
            .schedules
            .iter()
            .find(|(known, _)| *known == request)
            .map(|(_, submission)| submission.clone());
        let mut submission = match existing {
            Some(submission) => ScheduleSubmission {
                status: ScheduleStatus::IdenticalScheduleAlreadyCreated,
                ..submission
            },
            None => {
                let schedule_id = format!("0.0.{}", 9000 + state.schedules.len());
                let submission = ScheduleSubmission {
                    status: ScheduleStatus::Success,
                    transaction_id: format!("{schedule_id}@tx"),
                    schedule_id,
                };
                state.schedules.push((request, submission.clone()));
                submission
            }
        };
        if let Some(status) = &state.forced_status {
            submission.status = status.clone();
        }
        Ok(submission)
    }

    async fn sign_schedule(&self, schedule_id: &str) -> Result<(), LedgerError> {
        self.state
            .lock()
            .unwrap()
            .signatures
            .push(schedule_id.to_string());
        Ok(())
    }

    async fn find_transfer_transaction(
        &self,
        transfer_id: &str,
    ) -> Result<Option<String>, LedgerError> {
        Ok(self.state.lock().unwrap().settled.get(transfer_id).cloned())
    }
}

/// Resolves watched transactions immediately, successfully unless told otherwise.
#[derive(Default)]
pub struct MockTxWatcher {
    failures: Mutex<HashMap<String, String>>,
    abandoned: AtomicBool,
    watched: Mutex<Vec<String>>,
}

impl MockTxWatcher {
    pub async fn fail_transaction(&self, transaction_id: &str, reason: &str) {
        self.failures
            .lock()
            .unwrap()
            .insert(transaction_id.to_string(), reason.to_string());
    }

    /// Following watches never resolve, as on shutdown.
    pub fn abandon_all(&self) {
        self.abandoned.store(true, Ordering::SeqCst);
    }

    pub fn watched(&self) -> Vec<String> {
        self.watched.lock().unwrap().clone()
    }
}

impl TransactionWatcher for MockTxWatcher {
    fn watch(&self, transaction_id: &str) -> oneshot::Receiver<TxOutcome> {
        self.watched
            .lock()
            .unwrap()
            .push(transaction_id.to_string());
        let (tx, rx) = oneshot::channel();
        if self.abandoned.load(Ordering::SeqCst) {
            return rx;
        }
        let outcome = match self.failures.lock().unwrap().get(transaction_id) {
            Some(reason) => TxOutcome::Failed(reason.clone()),
            None => TxOutcome::Success,
        };
        let _ = tx.send(outcome);
        rx
    }
}

#[derive(Default)]
pub struct MockMessageSubmitter {
    submitted: Mutex<Vec<Transfer>>,
    fail_next: AtomicBool,
}

impl MockMessageSubmitter {
    pub async fn submitted(&self) -> Vec<Transfer> {
        self.submitted.lock().unwrap().clone()
    }

    pub async fn fail_next(&self) {
        self.fail_next.store(true, Ordering::SeqCst);
    }
}

#[async_trait]
impl MessageSubmitter for MockMessageSubmitter {
    async fn submit_message(&self, transfer: &Transfer) -> Result<String, LedgerError> {
        if self.fail_next.swap(false, Ordering::SeqCst) {
            return Err(LedgerError::Transport("topic unavailable".into()));
        }
        self.submitted.lock().unwrap().push(transfer.clone());
        Ok(format!("0.0.5005@{}", transfer.transaction_id))
    }
}

pub fn test_accounts() -> HederaAccounts {
    HederaAccounts {
        bridge_account: BRIDGE_ACCOUNT,
        payer_account: PAYER_ACCOUNT,
        members: vec![AccountId::new(0, 0, 3001), AccountId::new(0, 0, 3002)],
    }
}

/// Settlement services over in-memory stores and mocked Hedera capabilities.
pub struct SettlementHarness {
    pub store: Arc<InMemoryEventStore>,
    pub ledger: Arc<MockLedger>,
    pub watcher: Arc<MockTxWatcher>,
    pub messages: Arc<MockMessageSubmitter>,
    pub assets: Arc<AssetRegistry>,
    pub metrics: Arc<BridgeMetrics>,
    pub tracker: TaskTracker,
    pub scheduler: Arc<Scheduler>,
}

impl SettlementHarness {
    pub async fn new() -> Self {
        Self::with_ledger(Arc::new(MockLedger::new())).await
    }

    /// Harness with its own store, sharing `ledger` with other harnesses.
    pub async fn with_ledger(ledger: Arc<MockLedger>) -> Self {
        Self::assemble(
            Arc::new(InMemoryEventStore::new()),
            ledger,
            Arc::new(MockMessageSubmitter::default()),
            test_registry().await,
        )
    }

    /// Same store and ledger after a node restart: new scheduler, watcher and tracker.
    pub fn restarted(&self) -> Self {
        Self::assemble(
            self.store.clone(),
            self.ledger.clone(),
            self.messages.clone(),
            self.assets.clone(),
        )
    }

    fn assemble(
        store: Arc<InMemoryEventStore>,
        ledger: Arc<MockLedger>,
        messages: Arc<MockMessageSubmitter>,
        assets: Arc<AssetRegistry>,
    ) -> Self {
        let watcher = Arc::new(MockTxWatcher::default());
        let metrics = Arc::new(BridgeMetrics::new_for_testing());
        let tracker = TaskTracker::new();
        let scheduler = Arc::new(Scheduler::new(
            ledger.clone(),
            watcher.clone(),
            store.clone(),
            tracker.clone(),
            metrics.clone(),
            test_accounts(),
        ));
        Self {
            store,
            ledger,
            watcher,
            messages,
            assets,
            metrics,
            tracker,
            scheduler,
        }
    }

    pub fn burn_service(&self) -> BurnEventService {
        BurnEventService::new(self.scheduler.clone(), self.assets.clone())
    }

    pub fn lock_service(&self) -> LockEventService {
        LockEventService::new(self.scheduler.clone())
    }

    pub fn transfer_service(&self) -> TransferService {
        TransferService::new(self.scheduler.clone(), self.messages.clone())
    }

    pub fn read_only_service(&self, lookup_timeout: Duration) -> ReadOnlyService {
        ReadOnlyService::new(self.scheduler.clone(), lookup_timeout)
    }

    /// Waits for every spawned finalisation task.
    pub async fn drain(&self) {
        self.tracker.close();
        tokio::time::timeout(Duration::from_secs(5), self.tracker.wait())
            .await
            .expect("settlement tasks did not finish");
        self.tracker.reopen();
    }
}

/// Scripted chain: a head, a set of logs and members, optional fetch failures.
pub struct MockChainSource {
    chain_id: u64,
    confirmations: u64,
    state: Mutex<MockChainState>,
}

#[derive(Default)]
struct MockChainState {
    head: u64,
    logs: Vec<Log>,
    failing_fetches: usize,
    fetches: Vec<(u64, u64)>,
    members: Vec<Address>,
}

pub const MOCK_ORIGINATOR: Address = Address::repeat_byte(0x99);

impl MockChainSource {
    pub fn new(chain_id: u64, confirmations: u64) -> Self {
        Self {
            chain_id,
            confirmations,
            state: Mutex::new(MockChainState::default()),
        }
    }

    pub fn set_head(&self, head: u64) {
        self.state.lock().unwrap().head = head;
    }

    pub fn add_log(&self, log: Log) {
        self.state.lock().unwrap().logs.push(log);
    }

    pub fn fail_fetches(&self, count: usize) {
        self.state.lock().unwrap().failing_fetches = count;
    }

    /// `(from, to)` of every log query.
    pub fn fetches(&self) -> Vec<(u64, u64)> {
        self.state.lock().unwrap().fetches.clone()
    }

    pub fn set_members(&self, members: Vec<Address>) {
        self.state.lock().unwrap().members = members;
    }
}

#[async_trait]
impl ChainLogSource for MockChainSource {
    fn chain_id(&self) -> u64 {
        self.chain_id
    }

    fn required_confirmations(&self) -> u64 {
        self.confirmations
    }

    async fn current_block(&self) -> BridgeResult<u64> {
        Ok(self.state.lock().unwrap().head)
    }

    async fn filter_logs(
        &self,
        filter: &FilterConfig,
        from_block: u64,
        to_block: u64,
    ) -> BridgeResult<Vec<Log>> {
        let mut state = self.state.lock().unwrap();
        state.fetches.push((from_block, to_block));
        if state.failing_fetches > 0 {
            state.failing_fetches -= 1;
            return Err(BridgeError::TransientProviderError("timeout".into()));
        }
        Ok(state
            .logs
            .iter()
            .filter(|log| filter.addresses.contains(&log.address))
            .filter(|log| {
                let block = log.block_number.map(|b| b.as_u64()).unwrap_or_default();
                (from_block..=to_block).contains(&block)
            })
            .cloned()
            .collect())
    }

    async fn block_timestamp(&self, block_number: u64) -> BridgeResult<u64> {
        Ok(1_700_000_000 + block_number)
    }

    async fn await_transaction(&self, _tx_hash: H256) -> BridgeResult<Address> {
        Ok(MOCK_ORIGINATOR)
    }

    async fn governance_members(&self, _router: Address) -> BridgeResult<Vec<Address>> {
        Ok(self.state.lock().unwrap().members.clone())
    }
}

/// Status store counting writes.
#[derive(Default)]
pub struct CountingStatusStore {
    inner: InMemoryStatusStore,
    writes: AtomicUsize,
}

impl CountingStatusStore {
    pub fn writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl StatusStore for CountingStatusStore {
    async fn get(&self, id: &str) -> Result<i64, StoreError> {
        self.inner.get(id).await
    }

    async fn create(&self, id: &str, value: i64) -> Result<(), StoreError> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        self.inner.create(id, value).await
    }

    async fn update(&self, id: &str, value: i64) -> Result<(), StoreError> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        self.inner.update(id, value).await
    }
}

/// Protobuf encoded Hedera account, as carried in router `receiver` fields.
pub fn hedera_receiver(account: AccountId) -> Vec<u8> {
    account.to_protobuf_bytes()
}

/// Router log at `block`, transaction hash derived from the block, log index 0.
pub fn router_log(router: Address, block: u64, topic: H256, tokens: &[Token]) -> Log {
    Log {
        address: router,
        topics: vec![topic],
        data: ethers::abi::encode(tokens).into(),
        block_hash: Some(H256::from_low_u64_be(block)),
        block_number: Some(block.into()),
        transaction_hash: Some(H256::from_low_u64_be(0xabc0_0000 + block)),
        log_index: Some(U256::zero()),
        removed: Some(false),
        ..Default::default()
    }
}

pub fn lock_log_for(
    router: Address,
    block: u64,
    token: Address,
    target_chain: u64,
    amount: u64,
    service_fee: u64,
    receiver: &[u8],
) -> Log {
    router_log(
        router,
        block,
        LockFilter::signature(),
        &[
            Token::Uint(target_chain.into()),
            Token::Address(token),
            Token::Bytes(receiver.to_vec()),
            Token::Uint(amount.into()),
            Token::Uint(service_fee.into()),
        ],
    )
}

/// Lock of the zero address token without service fee.
pub fn lock_log(
    router: Address,
    block: u64,
    target_chain: u64,
    amount: u64,
    receiver: &[u8],
) -> Log {
    lock_log_for(router, block, Address::zero(), target_chain, amount, 0, receiver)
}

/// Burn of wrapped HBAR.
pub fn burn_log(
    router: Address,
    block: u64,
    target_chain: u64,
    amount: u64,
    receiver: &[u8],
) -> Log {
    burn_log_for(router, block, address(WRAPPED_HBAR), target_chain, amount.into(), receiver)
}

pub fn burn_log_for(
    router: Address,
    block: u64,
    token: Address,
    target_chain: u64,
    amount: U256,
    receiver: &[u8],
) -> Log {
    router_log(
        router,
        block,
        BurnFilter::signature(),
        &[
            Token::Uint(target_chain.into()),
            Token::Address(token),
            Token::Bytes(receiver.to_vec()),
            Token::Uint(amount),
        ],
    )
}

/// Burn of a wrapped NFT.
pub fn burn_nft_log(
    router: Address,
    block: u64,
    target_chain: u64,
    token_id: u64,
    receiver: &[u8],
) -> Log {
    router_log(
        router,
        block,
        BurnErc721Filter::signature(),
        &[
            Token::Uint(target_chain.into()),
            Token::Address(address(WRAPPED_NFT)),
            Token::Uint(token_id.into()),
            Token::Address(Address::zero()),
            Token::Uint(U256::zero()),
            Token::Bytes(receiver.to_vec()),
        ],
    )
}

pub fn mint_log(router: Address, block: u64, transaction_id: &str) -> Log {
    router_log(
        router,
        block,
        MintFilter::signature(),
        &[
            Token::Uint(HEDERA.into()),
            Token::Address(address(WRAPPED_HBAR)),
            Token::Bytes(transaction_id.as_bytes().to_vec()),
            Token::Address(Address::repeat_byte(0x42)),
            Token::Uint(100u64.into()),
        ],
    )
}

pub fn member_updated_log(router: Address, block: u64, member: Address, status: bool) -> Log {
    router_log(
        router,
        block,
        MemberUpdatedFilter::signature(),
        &[Token::Address(member), Token::Bool(status)],
    )
}

pub fn address(hex: &str) -> Address {
    hex.parse().unwrap()
}
