/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

use std::sync::Arc;

use crate::executor::RequestExecutor;
use crate::operation::transfer::builders::TransferFluentBuilder;
use crate::runtime::token_bucket::TokenBucket;
use crate::types::{ConcurrencySetting, PartSize};
use crate::{Config, DEFAULT_CONCURRENCY, MEBIBYTE};

/// Transfer engine client for a remote object-storage service.
#[derive(Debug, Clone)]
pub struct Client {
    pub(crate) handle: Arc<Handle>,
}

/// Whatever is needed to carry out operations, e.g. config, throttle, env details, etc
#[derive(Debug)]
pub(crate) struct Handle {
    pub(crate) config: Config,
    pub(crate) throttle: Option<TokenBucket>,
}

impl Handle {
    /// Get the concrete number of workers to use based on the concurrency setting.
    pub(crate) fn num_workers(&self) -> usize {
        match self.config.concurrency() {
            ConcurrencySetting::Explicit(concurrency) => (*concurrency).max(1),
            ConcurrencySetting::Auto => DEFAULT_CONCURRENCY,
        }
    }

    /// Get the concrete target part size to use for transfers.
    pub(crate) fn part_size_bytes(&self) -> u64 {
        match self.config.part_size() {
            PartSize::Auto => 8 * MEBIBYTE,
            PartSize::Target(explicit) => *explicit,
        }
    }

    /// The executor to use for signed requests against the remote service.
    pub(crate) fn executor(&self) -> &Arc<dyn RequestExecutor> {
        self.config.executor()
    }
}

impl Client {
    /// Creates a new client from a transfer engine config.
    pub fn new(config: Config) -> Client {
        let throttle = config.throughput_limit().map(TokenBucket::new);
        let handle = Arc::new(Handle { config, throttle });
        Client { handle }
    }

    /// Returns the client's configuration
    pub fn config(&self) -> &Config {
        &self.handle.config
    }

    /// Transfer a single object to the remote service.
    ///
    /// Constructs a fluent builder for the
    /// [`Transfer`](crate::operation::transfer::builders::TransferFluentBuilder) operation.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use std::error::Error;
    /// use std::path::Path;
    /// use resumable_transfer::checkpoint::Checkpoint;
    /// use resumable_transfer::io::InputStream;
    ///
    /// async fn transfer_file(
    ///     client: &resumable_transfer::Client,
    ///     path: impl AsRef<Path>
    /// ) -> Result<(), Box<dyn Error>> {
    ///     let stream = InputStream::from_path(path)?;
    ///     let handle = client.transfer()
    ///         .resource_key("my-key")
    ///         .source(stream)
    ///         .checkpoint(Checkpoint::FilePath("my-key.checkpoint".into()))
    ///         .initiate()?;
    ///
    ///     // initiate() will return before the transfer is complete.
    ///     // Call the `join()` method on the returned handle to drive the transfer to completion.
    ///     // The handle can also be used to pause or cancel the transfer, etc.
    ///     let response = handle.join().await?;
    ///     // ... do something with response
    ///     Ok(())
    /// }
    /// ```
    pub fn transfer(&self) -> TransferFluentBuilder {
        TransferFluentBuilder::new(self.handle.clone())
    }
}
