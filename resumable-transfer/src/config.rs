/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

use crate::executor::RequestExecutor;
use crate::types::{ConcurrencySetting, PartSize};
use crate::KIBIBYTE;
use std::cmp;
use std::sync::Arc;

/// Minimum part size in bytes
pub(crate) const MIN_PART_SIZE_BYTES: u64 = 100 * KIBIBYTE;

/// Configuration for a [`Client`](crate::client::Client)
#[derive(Debug, Clone)]
pub struct Config {
    part_size: PartSize,
    concurrency: ConcurrencySetting,
    throughput_limit: Option<u64>,
    executor: Arc<dyn RequestExecutor>,
}

impl Config {
    /// Create a new `Config` builder
    pub fn builder() -> Builder {
        Builder::default()
    }

    /// Returns a reference to the target part size to use for transfer operations
    pub fn part_size(&self) -> &PartSize {
        &self.part_size
    }

    /// Returns the concurrency setting to use for individual transfer operations.
    pub fn concurrency(&self) -> &ConcurrencySetting {
        &self.concurrency
    }

    /// Returns the source read throughput limit in bytes per second, if one was set.
    pub fn throughput_limit(&self) -> Option<u64> {
        self.throughput_limit
    }

    /// The executor instance that will be used to send signed requests to the
    /// remote service.
    pub fn executor(&self) -> &Arc<dyn RequestExecutor> {
        &self.executor
    }
}

/// Fluent style builder for [Config]
#[derive(Debug, Clone, Default)]
pub struct Builder {
    part_size: PartSize,
    concurrency: ConcurrencySetting,
    throughput_limit: Option<u64>,
    executor: Option<Arc<dyn RequestExecutor>>,
}

impl Builder {
    /// The target size of each part of a transfer.
    ///
    /// The minimum part size is 100 KiB, any part size less than that will be
    /// rounded up.
    ///
    /// NOTE: The actual part size used may be larger than the configured part
    /// size if the current value would result in more than 10,000 parts for
    /// a transfer request.
    ///
    /// Default is [PartSize::Auto]
    pub fn part_size(self, part_size: PartSize) -> Self {
        let part_size = match part_size {
            PartSize::Target(explicit) => {
                PartSize::Target(cmp::max(explicit, MIN_PART_SIZE_BYTES))
            }
            tps => tps,
        };

        self.set_part_size(part_size)
    }

    /// Target part size for a transfer.
    ///
    /// NOTE: This does not validate the setting and is meant for internal use only.
    pub(crate) fn set_part_size(mut self, part_size: PartSize) -> Self {
        self.part_size = part_size;
        self
    }

    /// Set the concurrency level this component is allowed to use.
    ///
    /// This sets the number of logical workers pulling part tasks, and with
    /// it the maximum number of concurrent in-flight requests.
    /// Default is [ConcurrencySetting::Auto].
    pub fn concurrency(mut self, concurrency: ConcurrencySetting) -> Self {
        self.concurrency = concurrency;
        self
    }

    /// Limit the rate at which bytes are read from the source, in bytes per
    /// second. Unset by default.
    pub fn throughput_limit(mut self, bytes_per_sec: u64) -> Self {
        self.throughput_limit = Some(bytes_per_sec);
        self
    }

    /// Set the executor used to send signed requests to the remote service.
    pub fn executor(mut self, executor: impl RequestExecutor + 'static) -> Self {
        self.executor = Some(Arc::new(executor));
        self
    }

    /// Consumes the builder and constructs a [`Config`](crate::config::Config)
    pub fn build(self) -> Config {
        Config {
            part_size: self.part_size,
            concurrency: self.concurrency,
            throughput_limit: self.throughput_limit,
            executor: self.executor.expect("executor set"),
        }
    }
}
