// Copyright (c) Hedera Bridge Contributors
// SPDX-License-Identifier: Apache-2.0

use prometheus::{
    register_histogram_vec_with_registry, register_int_counter_vec_with_registry,
    register_int_counter_with_registry, register_int_gauge_vec_with_registry,
    register_int_gauge_with_registry, HistogramVec, IntCounter, IntCounterVec, IntGauge,
    IntGaugeVec, Registry,
};

const FINE_GRAINED_LATENCY_SEC_BUCKETS: &[f64] = &[
    0.001, 0.005, 0.01, 0.05, 0.1, 0.15, 0.2, 0.25, 0.3, 0.4, 0.5, 0.7, 1.0, 1.5, 2.0, 3.0, 5.0,
    7.5, 10., 15., 20., 30., 60.,
];

#[derive(Clone, Debug)]
pub struct BridgeMetrics {
    pub(crate) watcher_received_events: IntCounterVec,
    pub(crate) watcher_rejected_events: IntCounterVec,
    pub(crate) watcher_confirmation_events: IntCounterVec,
    pub(crate) last_processed_block: IntGaugeVec,

    pub(crate) queued_transfers: IntCounterVec,
    pub(crate) settlement_transitions: IntCounterVec,
    pub(crate) settlements_in_flight: IntGauge,

    pub(crate) eth_rpc_queries: IntCounterVec,
    pub(crate) eth_rpc_queries_latency: HistogramVec,
    pub(crate) eth_rpc_errors: IntCounterVec,
    pub(crate) ledger_requests: IntCounterVec,

    pub(crate) governance_members: IntGaugeVec,
    pub(crate) price_refresh_failures: IntCounter,
}

impl BridgeMetrics {
    pub fn new(registry: &Registry) -> Self {
        Self {
            watcher_received_events: register_int_counter_vec_with_registry!(
                "bridge_watcher_received_events",
                "Total number of router events received by the watchers",
                &["chain", "event"],
                registry,
            )
            .unwrap(),
            watcher_rejected_events: register_int_counter_vec_with_registry!(
                "bridge_watcher_rejected_events",
                "Total number of router events rejected before queueing",
                &["chain", "reason"],
                registry,
            )
            .unwrap(),
            watcher_confirmation_events: register_int_counter_vec_with_registry!(
                "bridge_watcher_confirmation_events",
                "Total number of mint/unlock confirmations observed",
                &["chain", "event"],
                registry,
            )
            .unwrap(),
            last_processed_block: register_int_gauge_vec_with_registry!(
                "bridge_last_processed_block",
                "Last block fully processed per watcher",
                &["watcher"],
                registry,
            )
            .unwrap(),
            queued_transfers: register_int_counter_vec_with_registry!(
                "bridge_queued_transfers",
                "Total number of transfers pushed to the dispatch queue",
                &["topic"],
                registry,
            )
            .unwrap(),
            settlement_transitions: register_int_counter_vec_with_registry!(
                "bridge_settlement_transitions",
                "Settlement record status transitions",
                &["kind", "status"],
                registry,
            )
            .unwrap(),
            settlements_in_flight: register_int_gauge_with_registry!(
                "bridge_settlements_in_flight",
                "Settlements waiting for ledger finality",
                registry,
            )
            .unwrap(),
            eth_rpc_queries: register_int_counter_vec_with_registry!(
                "bridge_eth_rpc_queries",
                "Total number of queries issued to eth provider, by request type",
                &["type"],
                registry,
            )
            .unwrap(),
            eth_rpc_queries_latency: register_histogram_vec_with_registry!(
                "bridge_eth_rpc_queries_latency",
                "Latency of queries issued to eth provider, by request type",
                &["type"],
                FINE_GRAINED_LATENCY_SEC_BUCKETS.to_vec(),
                registry,
            )
            .unwrap(),
            eth_rpc_errors: register_int_counter_vec_with_registry!(
                "bridge_eth_rpc_errors",
                "Failed eth provider calls made by the watchers",
                &["chain"],
                registry,
            )
            .unwrap(),
            ledger_requests: register_int_counter_vec_with_registry!(
                "bridge_ledger_requests",
                "Requests sent to the ledger gateway",
                &["method", "result"],
                registry,
            )
            .unwrap(),
            governance_members: register_int_gauge_vec_with_registry!(
                "bridge_governance_members",
                "Number of governance members reported by the router",
                &["chain"],
                registry,
            )
            .unwrap(),
            price_refresh_failures: register_int_counter_with_registry!(
                "bridge_price_refresh_failures",
                "Price refresh cycles that kept the previous prices",
                registry,
            )
            .unwrap(),
        }
    }

    pub fn new_for_testing() -> Self {
        let registry = Registry::new();
        Self::new(&registry)
    }
}
