/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

use std::fmt;
use std::sync::Arc;

use crate::checkpoint::Checkpoint;
use crate::error;
use crate::io::InputStream;
use crate::types::{AbortPolicy, TransferEvent};

use super::{TransferHandle, TransferInputBuilder};

/// Fluent builder for constructing a single object transfer
pub struct TransferFluentBuilder {
    handle: Arc<crate::client::Handle>,
    inner: TransferInputBuilder,
}

impl TransferFluentBuilder {
    pub(crate) fn new(handle: Arc<crate::client::Handle>) -> Self {
        Self {
            handle,
            inner: ::std::default::Default::default(),
        }
    }

    /// Key of the remote object to assemble. Required.
    pub fn resource_key(mut self, resource_key: impl Into<String>) -> Self {
        self.inner = self.inner.resource_key(resource_key);
        self
    }

    /// The bytes to transfer. Required.
    pub fn source(mut self, source: impl Into<InputStream>) -> Self {
        self.inner = self.inner.source(source);
        self
    }

    /// Explicit part size for this transfer, overriding the client
    /// configuration. Rounded up to the 100 KiB floor.
    pub fn part_size(mut self, part_size: u64) -> Self {
        self.inner = self.inner.part_size(part_size);
        self
    }

    /// Number of logical workers for this transfer, overriding the client
    /// configuration.
    pub fn concurrency(mut self, concurrency: usize) -> Self {
        self.inner = self.inner.concurrency(concurrency);
        self
    }

    /// Where this transfer's checkpoint lives.
    pub fn checkpoint(mut self, checkpoint: Checkpoint) -> Self {
        self.inner = self.inner.checkpoint(checkpoint);
        self
    }

    /// What happens to the remote transfer when the caller aborts.
    pub fn abort_policy(mut self, policy: AbortPolicy) -> Self {
        self.inner = self.inner.abort_policy(policy);
        self
    }

    /// Progress callback, invoked with the fraction of source bytes
    /// confirmed so far.
    pub fn on_progress(mut self, callback: impl Fn(f64) + Send + Sync + 'static) -> Self {
        self.inner = self.inner.on_progress(callback);
        self
    }

    /// Event callback, invoked synchronously for every lifecycle event.
    pub fn on_event(mut self, callback: impl Fn(&TransferEvent) + Send + Sync + 'static) -> Self {
        self.inner = self.inner.on_event(callback);
        self
    }

    /// Initiate the transfer.
    ///
    /// Returns before the transfer is complete; await
    /// [`join`](TransferHandle::join) on the returned handle to drive it to
    /// completion.
    pub fn initiate(self) -> Result<TransferHandle, error::Error> {
        let input = self.inner.build()?;
        crate::operation::transfer::Transfer::orchestrate(self.handle, input)
    }
}

impl fmt::Debug for TransferFluentBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransferFluentBuilder")
            .field("inner", &self.inner)
            .finish_non_exhaustive()
    }
}
