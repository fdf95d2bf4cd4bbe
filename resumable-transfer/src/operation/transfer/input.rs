/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

use std::fmt;
use std::sync::Arc;

use crate::checkpoint::Checkpoint;
use crate::config::MIN_PART_SIZE_BYTES;
use crate::error;
use crate::io::InputStream;
use crate::operation::transfer::TransferHandle;
use crate::progress::{EventFn, ProgressFn};
use crate::types::{AbortPolicy, TransferEvent};

/// Input type for transferring a single object
#[non_exhaustive]
pub struct TransferInput {
    pub(crate) resource_key: Option<String>,
    pub(crate) source: Option<InputStream>,
    pub(crate) part_size: Option<u64>,
    pub(crate) concurrency: Option<usize>,
    pub(crate) checkpoint: Option<Checkpoint>,
    pub(crate) abort_policy: AbortPolicy,
    pub(crate) on_progress: Option<Arc<ProgressFn>>,
    pub(crate) on_event: Option<Arc<EventFn>>,
}

impl TransferInput {
    /// Create a new builder
    pub fn builder() -> TransferInputBuilder {
        TransferInputBuilder::default()
    }

    /// Key of the remote object to assemble
    pub fn resource_key(&self) -> Option<&str> {
        self.resource_key.as_deref()
    }

    /// Explicit per-request part size, when one was given
    pub fn part_size(&self) -> Option<u64> {
        self.part_size
    }

    /// Explicit per-request concurrency, when one was given
    pub fn concurrency(&self) -> Option<usize> {
        self.concurrency
    }

    /// What happens to the remote transfer when the caller aborts
    pub fn abort_policy(&self) -> &AbortPolicy {
        &self.abort_policy
    }

    /// Take the source, leaving the rest of the input intact
    pub(crate) fn take_source(&mut self) -> Option<InputStream> {
        self.source.take()
    }

    /// Take the checkpoint location, leaving the rest of the input intact
    pub(crate) fn take_checkpoint(&mut self) -> Option<Checkpoint> {
        self.checkpoint.take()
    }
}

// callbacks have no useful Debug representation; everything else does
impl fmt::Debug for TransferInput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransferInput")
            .field("resource_key", &self.resource_key)
            .field("source", &self.source)
            .field("part_size", &self.part_size)
            .field("concurrency", &self.concurrency)
            .field("checkpoint", &self.checkpoint)
            .field("abort_policy", &self.abort_policy)
            .finish_non_exhaustive()
    }
}

/// Builder for [`TransferInput`]
#[derive(Default)]
pub struct TransferInputBuilder {
    resource_key: Option<String>,
    source: Option<InputStream>,
    part_size: Option<u64>,
    concurrency: Option<usize>,
    checkpoint: Option<Checkpoint>,
    abort_policy: AbortPolicy,
    on_progress: Option<Arc<ProgressFn>>,
    on_event: Option<Arc<EventFn>>,
}

impl TransferInputBuilder {
    /// Key of the remote object to assemble. Required.
    pub fn resource_key(mut self, resource_key: impl Into<String>) -> Self {
        self.resource_key = Some(resource_key.into());
        self
    }

    /// The bytes to transfer. Required.
    pub fn source(mut self, source: impl Into<InputStream>) -> Self {
        self.source = Some(source.into());
        self
    }

    /// Explicit part size for this transfer, overriding the client
    /// configuration.
    ///
    /// The minimum part size is 100 KiB, any part size less than that will
    /// be rounded up. Resuming a checkpoint recorded with a different part
    /// size while this override is set fails with an invalid parameter
    /// error; drop the override to adopt the checkpoint's part size.
    pub fn part_size(self, part_size: u64) -> Self {
        self.set_part_size(std::cmp::max(part_size, MIN_PART_SIZE_BYTES))
    }

    /// Explicit part size for this transfer.
    ///
    /// NOTE: This does not validate the setting and is meant for internal use only.
    pub(crate) fn set_part_size(mut self, part_size: u64) -> Self {
        self.part_size = Some(part_size);
        self
    }

    /// Number of logical workers for this transfer, overriding the client
    /// configuration.
    pub fn concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = Some(concurrency.max(1));
        self
    }

    /// Where this transfer's checkpoint lives.
    ///
    /// Without a checkpoint the transfer still tracks its progress in
    /// memory, but nothing survives the invocation and nothing can be
    /// resumed.
    pub fn checkpoint(mut self, checkpoint: Checkpoint) -> Self {
        self.checkpoint = Some(checkpoint);
        self
    }

    /// What happens to the remote transfer when the caller aborts.
    /// Default is [AbortPolicy::Retain].
    pub fn abort_policy(mut self, policy: AbortPolicy) -> Self {
        self.abort_policy = policy;
        self
    }

    /// Progress callback, invoked with the fraction of source bytes
    /// confirmed so far (`1.0` exactly once, after finalize succeeds).
    pub fn on_progress(mut self, callback: impl Fn(f64) + Send + Sync + 'static) -> Self {
        self.on_progress = Some(Arc::new(callback));
        self
    }

    /// Event callback, invoked synchronously for every lifecycle event.
    pub fn on_event(mut self, callback: impl Fn(&TransferEvent) + Send + Sync + 'static) -> Self {
        self.on_event = Some(Arc::new(callback));
        self
    }

    /// Consume the builder and return the input.
    pub fn build(self) -> Result<TransferInput, error::Error> {
        match self.resource_key.as_deref() {
            Some(key) if !key.is_empty() => {}
            _ => return Err(error::invalid_input("resource key is required")),
        }
        if self.source.is_none() {
            return Err(error::invalid_input("transfer source is required"));
        }

        Ok(TransferInput {
            resource_key: self.resource_key,
            source: self.source,
            part_size: self.part_size,
            concurrency: self.concurrency,
            checkpoint: self.checkpoint,
            abort_policy: self.abort_policy,
            on_progress: self.on_progress,
            on_event: self.on_event,
        })
    }

    /// Initiate a transfer with this input using the given client.
    pub fn initiate_with(self, client: &crate::Client) -> Result<TransferHandle, error::Error> {
        let input = self.build()?;
        crate::operation::transfer::Transfer::orchestrate(client.handle.clone(), input)
    }
}

impl fmt::Debug for TransferInputBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransferInputBuilder")
            .field("resource_key", &self.resource_key)
            .field("source", &self.source)
            .field("part_size", &self.part_size)
            .field("concurrency", &self.concurrency)
            .field("checkpoint", &self.checkpoint)
            .field("abort_policy", &self.abort_policy)
            .finish_non_exhaustive()
    }
}
