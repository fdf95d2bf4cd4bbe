/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

use tokio::task::JoinHandle;

use crate::checkpoint::CheckpointRecord;
use crate::error;
use crate::operation::transfer::context::TransferContext;
use crate::operation::transfer::TransferOutput;
use crate::types::{AbortPolicy, TransferPhase};

/// Response type for a single transfer request.
///
/// # Cancellation
///
/// Calling [`Self::abort`] raises the shared cancellation signal. Workers
/// stop claiming new parts once they observe it, but parts already in
/// flight run to completion and their outcomes are recorded, so the
/// retained checkpoint holds every part that was confirmed before the
/// signal was raised. The remote transfer is kept for resume by default;
/// with [`AbortPolicy::AbortRemote`] the executor's abort operation is
/// invoked instead.
///
/// If the transfer already completed before the signal was observed, the
/// assembled remote object is left in place.
#[derive(Debug)]
#[non_exhaustive]
pub struct TransferHandle {
    /// The task driving the transfer to completion
    pub(crate) driver: JoinHandle<Result<TransferOutput, error::Error>>,
    /// The context used to drive the transfer to completion
    pub(crate) ctx: TransferContext,
}

impl TransferHandle {
    pub(crate) fn new(
        ctx: TransferContext,
        driver: JoinHandle<Result<TransferOutput, error::Error>>,
    ) -> Self {
        Self { driver, ctx }
    }

    /// Consume the handle and wait for the transfer to complete
    #[tracing::instrument(skip_all, level = "debug", name = "join-transfer")]
    pub async fn join(self) -> Result<TransferOutput, error::Error> {
        self.driver.await?
    }

    /// Pause or cancel the transfer.
    ///
    /// Returns once all in-flight parts have settled. The returned
    /// [`AbortedTransfer`] carries the checkpoint record so the caller can
    /// resume later, including when no durable checkpoint location was
    /// configured.
    #[tracing::instrument(skip_all, level = "debug", name = "abort-transfer")]
    pub async fn abort(mut self) -> Result<AbortedTransfer, error::Error> {
        self.ctx.cancel.cancel();
        let driver_result = (&mut self.driver).await?;

        match driver_result {
            Ok(output) => {
                // the transfer won the race against the cancel signal; the
                // assembled object stays and there is nothing to resume
                Ok(AbortedTransfer {
                    transfer_id: Some(output.transfer_id().to_owned()),
                    checkpoint: None,
                })
            }
            Err(_) => {
                let checkpoint = self.ctx.checkpoint.snapshot().await;
                let transfer_id = checkpoint.as_ref().map(|r| r.transfer_id.clone());

                if let AbortPolicy::AbortRemote = self.ctx.request.abort_policy() {
                    if let Some(transfer_id) = &transfer_id {
                        if let Err(err) = self.ctx.executor().abort_transfer(transfer_id).await {
                            // the local checkpoint is intact either way
                            tracing::error!(error = %err, "failed to abort remote transfer");
                        }
                    }
                }

                Ok(AbortedTransfer {
                    transfer_id,
                    checkpoint,
                })
            }
        }
    }

    /// Snapshot of the current checkpoint record
    pub async fn checkpoint(&self) -> Option<CheckpointRecord> {
        self.ctx.checkpoint.snapshot().await
    }

    /// Current lifecycle phase of the transfer
    pub fn phase(&self) -> TransferPhase {
        self.ctx.phase()
    }
}

/// Result of aborting an in-progress transfer.
#[derive(Debug, Clone)]
#[non_exhaustive]
pub struct AbortedTransfer {
    /// The remote transfer ID, when one had been assigned
    pub transfer_id: Option<String>,
    /// The checkpoint record as of the abort; pass it back via
    /// [`Checkpoint::InMemory`](crate::checkpoint::Checkpoint::InMemory)
    /// to resume
    pub checkpoint: Option<CheckpointRecord>,
}
