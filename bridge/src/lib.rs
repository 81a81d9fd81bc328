// Copyright (c) Hedera Bridge Contributors
// SPDX-License-Identifier: Apache-2.0

#![allow(clippy::too_many_arguments)]

pub mod assets;
pub mod config;
pub mod error;
pub mod evm;
pub mod handler;
pub mod hedera;
pub mod metrics;
pub mod node;
pub mod queue;
pub mod server;
pub mod settlement;
pub mod storage;
pub mod types;
pub mod watcher;

#[cfg(test)]
pub mod test_utils;

#[cfg(test)]
pub mod e2e_tests;

#[macro_export]
macro_rules! retry_with_max_elapsed_time {
    ($func:expr, $max_elapsed_time:expr) => {{
        // The following delay sequence (in secs) will be used, applied with jitter
        // 0.4, 0.8, 1.6, 3.2, 6.4, 12.8, 25.6, 30, 60, 120, 120 ...
        let backoff = backoff::ExponentialBackoff {
            initial_interval: Duration::from_millis(400),
            randomization_factor: 0.1,
            multiplier: 2.0,
            max_interval: Duration::from_secs(120),
            max_elapsed_time: Some($max_elapsed_time),
            ..Default::default()
        };
        backoff::future::retry(backoff, || {
            let fut = async {
                let result = $func.await;
                match result {
                    Ok(_) => {
                        return Ok(result);
                    }
                    Err(e) => {
                        // every error counts as transient until max_elapsed_time runs out
                        tracing::debug!("Retrying due to error: {:?}", e);
                        return Err(backoff::Error::transient(e));
                    }
                }
            };
            std::boxed::Box::pin(fut)
        })
        .await
    }};
}
