/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

/// Operation builders
pub mod builders;

mod context;
mod handle;
mod input;
mod output;
mod planner;
mod service;

use std::sync::Arc;

use tracing::Instrument;

use crate::checkpoint::{CheckpointRecord, CheckpointStore, SourceFingerprint};
use crate::checksum;
use crate::error;
use crate::executor::{FinalizeRequest, FinalizedPart};
use crate::io::PartReader;
use crate::progress::ProgressTracker;
use crate::runtime::worker_pool;
use crate::types::{PartInfo, TransferPhase};
use context::TransferContext;
pub use handle::{AbortedTransfer, TransferHandle};
/// Request type for transfers to the remote service
pub use input::{TransferInput, TransferInputBuilder};
/// Response type for transfers to the remote service
pub use output::TransferOutput;
use planner::PartTask;

/// Operation struct for a single object transfer
#[derive(Clone, Default, Debug)]
pub(crate) struct Transfer;

impl Transfer {
    /// Execute a single `Transfer` operation
    pub(crate) fn orchestrate(
        handle: Arc<crate::client::Handle>,
        mut input: TransferInput,
    ) -> Result<TransferHandle, error::Error> {
        let resource_key = match input.resource_key() {
            Some(key) if !key.is_empty() => key.to_owned(),
            _ => return Err(error::invalid_input("resource key is required")),
        };
        let source = input
            .take_source()
            .ok_or_else(|| error::invalid_input("transfer source is required"))?;

        let total_size = source.size();
        let fingerprint = source.fingerprint();
        let reader = PartReader::new(source);
        let store = CheckpointStore::new(input.take_checkpoint());
        let progress = ProgressTracker::new(
            total_size,
            input.on_progress.clone(),
            input.on_event.clone(),
        );

        let ctx = TransferContext::new(
            handle,
            input,
            resource_key.clone(),
            reader,
            store,
            progress,
            total_size,
        );

        let driver = tokio::spawn(
            execute_transfer(ctx.clone(), fingerprint)
                .instrument(tracing::debug_span!("transfer", resource_key = %resource_key)),
        );

        Ok(TransferHandle::new(ctx, driver))
    }
}

/// Drive the transfer through its lifecycle and settle the final phase.
async fn execute_transfer(
    ctx: TransferContext,
    fingerprint: SourceFingerprint,
) -> Result<TransferOutput, error::Error> {
    match run_transfer(&ctx, fingerprint).await {
        Ok(output) => {
            ctx.set_phase(TransferPhase::Completed);
            Ok(output)
        }
        Err(err) => {
            let phase = match err.kind() {
                error::ErrorKind::Cancelled => TransferPhase::Aborted,
                _ => TransferPhase::Failed,
            };
            ctx.set_phase(phase);
            Err(err)
        }
    }
}

async fn run_transfer(
    ctx: &TransferContext,
    fingerprint: SourceFingerprint,
) -> Result<TransferOutput, error::Error> {
    // Planning: resolve/validate the checkpoint and compute the task list
    ctx.set_phase(TransferPhase::Planning);

    let resumed = match ctx.checkpoint.load().await {
        Some(record) if record.matches_source(ctx.resource_key(), &fingerprint) => {
            if let Some(explicit) = ctx.request.part_size() {
                if explicit != record.part_size {
                    // the caller must resolve this: either drop the override
                    // or discard the checkpoint; nothing is mutated here
                    return Err(error::invalid_input(format!(
                        "checkpoint was recorded with part size {} but part size {explicit} was explicitly requested",
                        record.part_size
                    )));
                }
            }
            tracing::debug!(transfer_id = %record.transfer_id, "resuming from checkpoint");
            Some(record)
        }
        Some(record) => {
            tracing::debug!(
                transfer_id = %record.transfer_id,
                "source no longer matches checkpoint fingerprint, restarting from scratch"
            );
            ctx.checkpoint.discard().await;
            None
        }
        None => None,
    };

    let record = match resumed {
        Some(record) => record,
        None => initiate_fresh(ctx, fingerprint).await?,
    };
    ctx.set_transfer_id(record.transfer_id.clone());

    let plan = planner::plan(ctx.total_size, record.part_size);
    let completed = record.completed_parts();
    // already-confirmed bytes count toward the reported percentage
    ctx.progress.record_bytes(record.completed_bytes());
    let remaining: Vec<PartTask> = plan
        .tasks
        .iter()
        .filter(|task| !completed.contains(&task.part_number))
        .cloned()
        .collect();
    tracing::debug!(
        total_parts = plan.tasks.len(),
        remaining_parts = remaining.len(),
        part_size = plan.part_size,
        "task list resolved"
    );

    // InProgress: hand the remaining tasks to the worker pool
    ctx.set_phase(TransferPhase::InProgress);
    let concurrency = ctx
        .request
        .concurrency()
        .unwrap_or_else(|| ctx.handle.num_workers());
    let pool = worker_pool::run(
        remaining,
        concurrency,
        ctx.cancel.clone(),
        service::part_executor(ctx.clone()),
    )
    .await;

    for task in &pool.skipped {
        ctx.progress.part_aborted(PartInfo::from(task));
    }
    tracing::debug!(
        completed_this_run = pool.outcomes.len(),
        cancelled = pool.cancelled,
        "worker pool finished"
    );
    if pool.cancelled {
        // a deliberate pause, not a failure; parts confirmed before the
        // signal are already in the checkpoint
        return Err(error::operation_cancelled());
    }
    if let Some(first_error) = pool.first_error {
        return Err(first_error);
    }

    // Completing: fold checksums in part-number order and finalize
    ctx.set_phase(TransferPhase::Completing);
    finalize(ctx, plan.tasks.len()).await
}

/// Register a fresh transfer with the remote service and persist the
/// initial checkpoint record.
async fn initiate_fresh(
    ctx: &TransferContext,
    fingerprint: SourceFingerprint,
) -> Result<CheckpointRecord, error::Error> {
    let part_size = ctx
        .request
        .part_size()
        .unwrap_or_else(|| ctx.handle.part_size_bytes());

    let transfer_id = match ctx
        .executor()
        .initiate_transfer(ctx.resource_key())
        .instrument(tracing::debug_span!("send-initiate-transfer"))
        .await
    {
        Ok(transfer_id) => transfer_id,
        Err(err) => {
            ctx.progress.initiate_failed(err.to_string());
            return Err(error::initiate_failed(err));
        }
    };
    tracing::debug!(transfer_id = %transfer_id, "transfer initiated");
    ctx.progress.initiate_succeeded(&transfer_id);

    let record = CheckpointRecord::new(
        ctx.resource_key().to_owned(),
        part_size,
        transfer_id,
        fingerprint,
    );
    ctx.checkpoint.initialize(record.clone()).await?;
    Ok(record)
}

async fn finalize(
    ctx: &TransferContext,
    expected_parts: usize,
) -> Result<TransferOutput, error::Error> {
    let record = ctx.checkpoint.snapshot().await.ok_or_else(|| {
        error::Error::new(
            error::ErrorKind::RuntimeError,
            "checkpoint record missing at finalize",
        )
    })?;

    let mut parts = record.parts;
    if parts.len() != expected_parts {
        return Err(error::Error::new(
            error::ErrorKind::RuntimeError,
            format!(
                "the number of recorded parts must match the planned number of parts: recorded {}, planned {expected_parts}",
                parts.len()
            ),
        ));
    }

    // parts complete in arbitrary order; folding and finalize both walk
    // them in part-number order
    parts.sort_by_key(|p| p.part_number);
    let folded = checksum::fold(parts.iter().map(|p| (p.checksum, p.size())));

    let request = FinalizeRequest {
        resource_key: ctx.resource_key().to_owned(),
        transfer_id: record.transfer_id.clone(),
        parts: parts
            .iter()
            .map(|p| FinalizedPart {
                part_number: p.part_number,
                remote_tag: p.remote_tag.clone(),
            })
            .collect(),
    };

    let response = match ctx
        .executor()
        .finalize_transfer(request)
        .instrument(tracing::debug_span!("send-finalize-transfer"))
        .await
    {
        Ok(response) => response,
        Err(err) => {
            // checkpoint retained for diagnosis and a later finalize retry
            ctx.progress.finalize_failed(err.to_string());
            return Err(error::finalize_failed(err));
        }
    };

    if let Some(remote_checksum) = response.checksum {
        if remote_checksum != folded {
            let err = error::integrity_mismatch(folded, remote_checksum);
            ctx.progress.finalize_failed(err.to_string());
            return Err(err);
        }
    }
    ctx.progress.finalize_succeeded(response.remote_tag.clone());

    if let Err(err) = ctx.checkpoint.remove().await {
        // the object assembled fine; a stale checkpoint file is only a
        // nuisance for the next invocation, not a transfer failure
        tracing::warn!(error = %err, "failed to remove checkpoint after successful transfer");
    }
    ctx.progress.complete();
    tracing::trace!("transfer completed successfully");

    Ok(TransferOutput {
        transfer_id: record.transfer_id,
        remote_tag: response.remote_tag,
        checksum: folded,
        bytes_transferred: ctx.total_size,
        part_count: parts.len() as u64,
    })
}

#[cfg(test)]
mod test {
    use std::collections::HashMap;
    use std::sync::{Arc, Mutex};

    use async_trait::async_trait;
    use bytes::Bytes;

    use crate::checksum::Crc64;
    use crate::error::{BoxError, ErrorKind};
    use crate::executor::{
        FinalizeRequest, FinalizeResponse, PartRequest, PartResponse, RequestExecutor,
    };
    use crate::operation::transfer::TransferInput;
    use crate::types::{ConcurrencySetting, PartSize, TransferPhase};

    #[derive(Debug, Default)]
    struct RemoteState {
        parts: HashMap<u64, Bytes>,
        initiate_calls: u32,
        finalize_calls: u32,
    }

    /// Minimal in-memory remote: stores part bodies and reports the real
    /// combined checksum at finalize.
    #[derive(Debug, Clone, Default)]
    struct FakeRemote {
        state: Arc<Mutex<RemoteState>>,
    }

    impl FakeRemote {
        fn assembled_checksum(&self) -> u64 {
            let state = self.state.lock().unwrap();
            let mut part_numbers: Vec<u64> = state.parts.keys().copied().collect();
            part_numbers.sort_unstable();
            let mut crc = Crc64::new();
            for part_number in part_numbers {
                crc.update(&state.parts[&part_number]);
            }
            crc.finalize()
        }
    }

    #[async_trait]
    impl RequestExecutor for FakeRemote {
        async fn initiate_transfer(&self, _resource_key: &str) -> Result<String, BoxError> {
            let mut state = self.state.lock().unwrap();
            state.initiate_calls += 1;
            Ok(format!("transfer-{}", state.initiate_calls))
        }

        async fn transfer_part(&self, request: PartRequest) -> Result<PartResponse, BoxError> {
            let mut state = self.state.lock().unwrap();
            state.parts.insert(request.part_number, request.body);
            Ok(PartResponse {
                remote_tag: format!("tag-{}", request.part_number),
                checksum: None,
            })
        }

        async fn finalize_transfer(
            &self,
            _request: FinalizeRequest,
        ) -> Result<FinalizeResponse, BoxError> {
            self.state.lock().unwrap().finalize_calls += 1;
            Ok(FinalizeResponse {
                remote_tag: Some("final-tag".to_owned()),
                checksum: Some(self.assembled_checksum()),
            })
        }

        async fn abort_transfer(&self, _transfer_id: &str) -> Result<(), BoxError> {
            Ok(())
        }
    }

    fn test_client(remote: FakeRemote, part_size: u64) -> crate::Client {
        let config = crate::Config::builder()
            .concurrency(ConcurrencySetting::Explicit(2))
            .set_part_size(PartSize::Target(part_size))
            .executor(remote)
            .build();
        crate::Client::new(config)
    }

    #[tokio::test]
    async fn test_basic_transfer() {
        let remote = FakeRemote::default();
        let client = test_client(remote.clone(), 10);

        let body = Bytes::from_static(b"every adolescent dog goes bonkers early");
        let handle = client
            .transfer()
            .resource_key("test-key")
            .source(body.clone())
            .initiate()
            .unwrap();

        let output = handle.join().await.unwrap();
        assert_eq!("transfer-1", output.transfer_id());
        assert_eq!(Some("final-tag"), output.remote_tag());
        assert_eq!(body.len() as u64, output.bytes_transferred());
        assert_eq!(4, output.part_count());

        let state = remote.state.lock().unwrap();
        assert_eq!(4, state.parts.len());
        assert_eq!(1, state.finalize_calls);
    }

    #[tokio::test]
    async fn test_zero_size_source_sends_one_empty_part() {
        let remote = FakeRemote::default();
        let client = test_client(remote.clone(), 1024);

        let handle = client
            .transfer()
            .resource_key("empty-key")
            .source(Bytes::new())
            .initiate()
            .unwrap();

        let output = handle.join().await.unwrap();
        assert_eq!(1, output.part_count());
        assert_eq!(0, output.bytes_transferred());

        let state = remote.state.lock().unwrap();
        assert_eq!(1, state.parts.len());
        assert!(state.parts[&1].is_empty());
        assert_eq!(1, state.finalize_calls);
    }

    #[tokio::test]
    async fn test_missing_resource_key_is_rejected() {
        let remote = FakeRemote::default();
        let client = test_client(remote, 1024);

        let err = client
            .transfer()
            .source(Bytes::from_static(b"data"))
            .initiate()
            .unwrap_err();
        assert_eq!(&ErrorKind::InvalidParameter, err.kind());
    }

    #[tokio::test]
    async fn test_missing_source_is_rejected() {
        let remote = FakeRemote::default();
        let client = test_client(remote, 1024);

        let err = client
            .transfer()
            .resource_key("test-key")
            .initiate()
            .unwrap_err();
        assert_eq!(&ErrorKind::InvalidParameter, err.kind());
    }

    #[tokio::test]
    async fn test_phase_reaches_completed() {
        let remote = FakeRemote::default();
        let client = test_client(remote, 1024);

        let handle = TransferInput::builder()
            .resource_key("test-key")
            .source(Bytes::from_static(b"some data"))
            .initiate_with(&client)
            .unwrap();

        let ctx = handle.ctx.clone();
        handle.join().await.unwrap();
        assert_eq!(TransferPhase::Completed, ctx.phase());
    }
}
