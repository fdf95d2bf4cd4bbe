/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::Instant;

/// Token bucket used for limiting source read throughput.
///
/// NOTE: 1 token = 1 byte. Workers acquire a part's byte cost before reading
/// it from the source, so the aggregate read rate across all workers stays
/// at or below the configured rate. The bucket starts full, holding one
/// second of budget.
#[derive(Debug)]
pub(crate) struct TokenBucket {
    state: Mutex<BucketState>,
    /// tokens added per second
    rate: u64,
    /// bucket capacity
    burst: u64,
}

#[derive(Debug)]
struct BucketState {
    available: f64,
    last_refill: Instant,
}

impl TokenBucket {
    /// Create a new token bucket refilled at `bytes_per_sec`.
    pub(crate) fn new(bytes_per_sec: u64) -> Self {
        let rate = bytes_per_sec.max(1);
        Self {
            state: Mutex::new(BucketState {
                available: rate as f64,
                last_refill: Instant::now(),
            }),
            rate,
            burst: rate,
        }
    }

    /// Wait until `cost` tokens are available and take them.
    pub(crate) async fn acquire(&self, cost: u64) {
        // a single part can be larger than one second of budget; cap the
        // cost at the bucket capacity so the acquire still completes
        let cost = cost.min(self.burst) as f64;
        loop {
            let wait = {
                let mut state = self.state.lock().await;
                let now = Instant::now();
                let elapsed = now.duration_since(state.last_refill).as_secs_f64();
                state.available =
                    (state.available + elapsed * self.rate as f64).min(self.burst as f64);
                state.last_refill = now;

                if state.available >= cost {
                    state.available -= cost;
                    return;
                }
                Duration::from_secs_f64((cost - state.available) / self.rate as f64)
            };
            tokio::time::sleep(wait).await;
        }
    }
}
