// Copyright (c) Hedera Bridge Contributors
// SPDX-License-Identifier: Apache-2.0

use crate::metrics::BridgeMetrics;
use ethers::providers::{Http, HttpClientError, JsonRpcClient, Provider};
use serde::{de::DeserializeOwned, Serialize};
use std::fmt::Debug;
use std::sync::Arc;
use url::{ParseError, Url};

/// Http transport that records per-method query counts and latency.
#[derive(Debug, Clone)]
pub struct MeteredEthHttpProvider {
    inner: Http,
    chain_id: u64,
    metrics: Arc<BridgeMetrics>,
}

#[async_trait::async_trait]
impl JsonRpcClient for MeteredEthHttpProvider {
    type Error = HttpClientError;

    async fn request<T: Serialize + Send + Sync + Debug, R: DeserializeOwned + Send>(
        &self,
        method: &str,
        params: T,
    ) -> Result<R, HttpClientError> {
        self.metrics
            .eth_rpc_queries
            .with_label_values(&[method])
            .inc();
        let _guard = self
            .metrics
            .eth_rpc_queries_latency
            .with_label_values(&[method])
            .start_timer();

        let result = self.inner.request(method, params).await;
        if result.is_err() {
            self.metrics
                .eth_rpc_errors
                .with_label_values(&[&self.chain_id.to_string()])
                .inc();
        }
        result
    }
}

impl MeteredEthHttpProvider {
    pub fn new(url: impl Into<Url>, chain_id: u64, metrics: Arc<BridgeMetrics>) -> Self {
        Self {
            inner: Http::new(url),
            chain_id,
            metrics,
        }
    }
}

pub fn new_metered_eth_provider(
    url: &str,
    chain_id: u64,
    metrics: Arc<BridgeMetrics>,
) -> Result<Provider<MeteredEthHttpProvider>, ParseError> {
    let http_provider = MeteredEthHttpProvider::new(Url::parse(url)?, chain_id, metrics);
    Ok(Provider::new(http_provider))
}
