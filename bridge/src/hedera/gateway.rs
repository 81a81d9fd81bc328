// Copyright (c) Hedera Bridge Contributors
// SPDX-License-Identifier: Apache-2.0

//! JSON/HTTP client for the signing gateway that fronts the Hedera network.

use super::{
    LedgerError, MessageSubmitter, ScheduleRequest, ScheduleSubmission, ScheduledLedger,
    TransactionWatcher, TxOutcome,
};
use crate::metrics::BridgeMetrics;
use crate::types::Transfer;
use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::oneshot;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};
use url::Url;

#[derive(Debug, Deserialize)]
struct TransactionIdResponse {
    transaction_id: String,
}

#[derive(Debug, Deserialize)]
struct TransactionStatusResponse {
    status: String,
    #[serde(default)]
    result: Option<String>,
}

#[derive(Clone)]
pub struct HederaGatewayClient {
    http: reqwest::Client,
    base_url: Url,
    poll_interval: Duration,
    metrics: Arc<BridgeMetrics>,
    cancel: CancellationToken,
}

impl HederaGatewayClient {
    pub fn new(
        base_url: Url,
        poll_interval: Duration,
        metrics: Arc<BridgeMetrics>,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url,
            poll_interval,
            metrics,
            cancel,
        }
    }

    fn endpoint(&self, path: &str) -> Result<Url, LedgerError> {
        self.base_url
            .join(path)
            .map_err(|e| LedgerError::Transport(format!("invalid gateway path {path}: {e}")))
    }

    fn observe(&self, method: &str, ok: bool) {
        self.metrics
            .ledger_requests
            .with_label_values(&[method, if ok { "ok" } else { "error" }])
            .inc();
    }

    async fn transaction_status(&self, transaction_id: &str) -> Result<Option<TxOutcome>, LedgerError> {
        let url = self.endpoint(&format!("transactions/{transaction_id}"))?;
        let response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| LedgerError::Transport(e.to_string()))?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let body: TransactionStatusResponse = response
            .error_for_status()
            .map_err(|e| LedgerError::Response(e.to_string()))?
            .json()
            .await
            .map_err(|e| LedgerError::Response(e.to_string()))?;
        Ok(match body.status.as_str() {
            "PENDING" => None,
            "SUCCESS" => Some(TxOutcome::Success),
            other => Some(TxOutcome::Failed(
                body.result.unwrap_or_else(|| other.to_string()),
            )),
        })
    }
}

#[async_trait]
impl ScheduledLedger for HederaGatewayClient {
    async fn submit_schedule(
        &self,
        request: ScheduleRequest,
    ) -> Result<ScheduleSubmission, LedgerError> {
        let url = self.endpoint("schedules")?;
        let result = async {
            self.http
                .post(url)
                .json(&request)
                .send()
                .await
                .map_err(|e| LedgerError::Transport(e.to_string()))?
                .error_for_status()
                .map_err(|e| LedgerError::Response(e.to_string()))?
                .json::<ScheduleSubmission>()
                .await
                .map_err(|e| LedgerError::Response(e.to_string()))
        }
        .await;
        self.observe("submit_schedule", result.is_ok());
        result
    }

    async fn sign_schedule(&self, schedule_id: &str) -> Result<(), LedgerError> {
        let url = self.endpoint(&format!("schedules/{schedule_id}/signatures"))?;
        let result = async {
            self.http
                .post(url)
                .send()
                .await
                .map_err(|e| LedgerError::Transport(e.to_string()))?
                .error_for_status()
                .map_err(|e| LedgerError::Response(e.to_string()))?;
            Ok(())
        }
        .await;
        self.observe("sign_schedule", result.is_ok());
        result
    }

    async fn find_transfer_transaction(
        &self,
        transfer_id: &str,
    ) -> Result<Option<String>, LedgerError> {
        let url = self.endpoint(&format!("transfers/{transfer_id}"))?;
        let response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| LedgerError::Transport(e.to_string()))?;
        if response.status() == StatusCode::NOT_FOUND {
            self.observe("find_transfer", true);
            return Ok(None);
        }
        let result = response
            .error_for_status()
            .map_err(|e| LedgerError::Response(e.to_string()))?
            .json::<TransactionIdResponse>()
            .await
            .map(|r| Some(r.transaction_id))
            .map_err(|e| LedgerError::Response(e.to_string()));
        self.observe("find_transfer", result.is_ok());
        result
    }
}

#[async_trait]
impl MessageSubmitter for HederaGatewayClient {
    async fn submit_message(&self, transfer: &Transfer) -> Result<String, LedgerError> {
        let url = self.endpoint("messages")?;
        let result = async {
            self.http
                .post(url)
                .json(transfer)
                .send()
                .await
                .map_err(|e| LedgerError::Transport(e.to_string()))?
                .error_for_status()
                .map_err(|e| LedgerError::Response(e.to_string()))?
                .json::<TransactionIdResponse>()
                .await
                .map(|r| r.transaction_id)
                .map_err(|e| LedgerError::Response(e.to_string()))
        }
        .await;
        self.observe("submit_message", result.is_ok());
        result
    }
}

impl TransactionWatcher for HederaGatewayClient {
    fn watch(&self, transaction_id: &str) -> oneshot::Receiver<TxOutcome> {
        let (tx, rx) = oneshot::channel();
        let client = self.clone();
        let transaction_id = transaction_id.to_string();
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(client.poll_interval);
            loop {
                tokio::select! {
                    _ = client.cancel.cancelled() => {
                        debug!("[Gateway] Stopped watching {}", transaction_id);
                        return;
                    }
                    _ = interval.tick() => {}
                }
                match client.transaction_status(&transaction_id).await {
                    Ok(Some(outcome)) => {
                        let _ = tx.send(outcome);
                        return;
                    }
                    Ok(None) => {}
                    Err(e) => {
                        warn!("[Gateway] Failed to query status of {}: {}", transaction_id, e);
                    }
                }
            }
        });
        rx
    }
}
