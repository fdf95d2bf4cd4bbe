/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

use std::sync::{Arc, Mutex, OnceLock};

use tokio_util::sync::CancellationToken;

use crate::checkpoint::CheckpointStore;
use crate::io::PartReader;
use crate::operation::transfer::TransferInput;
use crate::progress::ProgressTracker;
use crate::types::TransferPhase;

/// Internal context used to drive a single transfer operation
#[derive(Debug, Clone)]
pub(crate) struct TransferContext {
    /// reference to client handle used to do actual work
    pub(crate) handle: Arc<crate::client::Handle>,
    /// the original request (NOTE: the source will have been taken for processing, only the other fields remain)
    pub(crate) request: Arc<TransferInput>,
    /// validated key of the remote object
    pub(crate) resource_key: Arc<str>,
    /// random-access reader over the transfer source
    pub(crate) reader: Arc<PartReader>,
    /// single-writer store over the checkpoint record
    pub(crate) checkpoint: Arc<CheckpointStore>,
    /// progress/event delivery to the caller
    pub(crate) progress: Arc<ProgressTracker>,
    /// shared cooperative cancellation signal
    pub(crate) cancel: CancellationToken,
    /// total size of the source in bytes
    pub(crate) total_size: u64,
    phase: Arc<Mutex<TransferPhase>>,
    /// the remote transfer ID, resolved during planning
    transfer_id: Arc<OnceLock<String>>,
}

impl TransferContext {
    pub(crate) fn new(
        handle: Arc<crate::client::Handle>,
        request: TransferInput,
        resource_key: String,
        reader: PartReader,
        checkpoint: CheckpointStore,
        progress: ProgressTracker,
        total_size: u64,
    ) -> Self {
        Self {
            handle,
            request: Arc::new(request),
            resource_key: Arc::from(resource_key),
            reader: Arc::new(reader),
            checkpoint: Arc::new(checkpoint),
            progress: Arc::new(progress),
            cancel: CancellationToken::new(),
            total_size,
            phase: Arc::new(Mutex::new(TransferPhase::Planning)),
            transfer_id: Arc::new(OnceLock::new()),
        }
    }

    /// The executor to use for signed requests
    pub(crate) fn executor(&self) -> &Arc<dyn crate::executor::RequestExecutor> {
        self.handle.executor()
    }

    pub(crate) fn resource_key(&self) -> &str {
        &self.resource_key
    }

    /// Set the remote transfer ID once planning resolved it
    pub(crate) fn set_transfer_id(&self, transfer_id: String) {
        let _ = self.transfer_id.set(transfer_id);
    }

    pub(crate) fn transfer_id(&self) -> &str {
        self.transfer_id.get().expect("transfer id resolved")
    }

    pub(crate) fn set_phase(&self, phase: TransferPhase) {
        *self.phase.lock().expect("lock valid") = phase;
    }

    pub(crate) fn phase(&self) -> TransferPhase {
        *self.phase.lock().expect("lock valid")
    }
}
