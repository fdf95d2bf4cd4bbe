/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

use futures_util::future::BoxFuture;
use futures_util::FutureExt;
use tracing::Instrument;

use crate::checkpoint::PartOutcome;
use crate::checksum::Crc64;
use crate::error;
use crate::executor::PartRequest;
use crate::operation::transfer::context::TransferContext;
use crate::operation::transfer::planner::PartTask;
use crate::types::PartInfo;
use crate::KIBIBYTE;

/// Block size used when feeding part bytes through the checksum accumulator
const CHECKSUM_CHUNK_SIZE: usize = 64 * KIBIBYTE as usize;

/// Build the per-part execution function handed to the worker pool.
pub(super) fn part_executor(
    ctx: TransferContext,
) -> impl Fn(PartTask) -> BoxFuture<'static, Result<PartOutcome, error::Error>> + Send + Sync + 'static
{
    move |task| {
        let ctx = ctx.clone();
        let span = tracing::debug_span!("transfer-part", part_number = task.part_number);
        transfer_part(ctx, task).instrument(span).boxed()
    }
}

/// Transfer one part: read its byte range, checksum it as it flows, hand it
/// to the executor, and durably record the outcome before acknowledging it.
async fn transfer_part(
    ctx: TransferContext,
    task: PartTask,
) -> Result<PartOutcome, error::Error> {
    let part = PartInfo::from(&task);

    // source reads wait for throughput budget when a limit is configured
    if let Some(throttle) = &ctx.handle.throttle {
        throttle.acquire(task.size).await;
    }

    let data = match ctx.reader.read(task.offset, task.size).await {
        Ok(data) => data,
        Err(err) => {
            ctx.progress.part_failed(part, err.to_string());
            return Err(err);
        }
    };

    let mut crc = Crc64::new();
    for chunk in data.chunks(CHECKSUM_CHUNK_SIZE) {
        crc.update(chunk);
    }
    let checksum = crc.finalize();
    ctx.progress.record_bytes(task.size);

    let request = PartRequest {
        resource_key: ctx.resource_key().to_owned(),
        transfer_id: ctx.transfer_id().to_owned(),
        part_number: task.part_number,
        range_start: task.range_start(),
        range_end: task.range_end(),
        body: data,
    };

    let response = match ctx
        .executor()
        .transfer_part(request)
        .instrument(tracing::debug_span!("send-transfer-part"))
        .await
    {
        Ok(response) => response,
        Err(err) => {
            // un-count this request's bytes; the range is counted again when
            // a resumed invocation re-drives the part
            ctx.progress.rollback(task.size);
            ctx.progress.part_failed(part, err.to_string());
            return Err(error::part_failed(task.part_number, err));
        }
    };

    if let Some(remote_checksum) = response.checksum {
        if remote_checksum != checksum {
            ctx.progress.rollback(task.size);
            let message = format!(
                "part {} checksum mismatch: computed {checksum}, remote service reported {remote_checksum}",
                task.part_number
            );
            ctx.progress.part_failed(part, message.clone());
            return Err(error::part_failed(task.part_number, message));
        }
    }

    let outcome = PartOutcome {
        part_number: task.part_number,
        range_start: task.range_start(),
        range_end: task.range_end(),
        checksum,
        remote_tag: response.remote_tag,
        completed: true,
    };

    // durability precedes acknowledgment: the outcome is flushed to the
    // checkpoint before the success event fires
    ctx.checkpoint.record_outcome(outcome.clone()).await?;
    ctx.progress.part_succeeded(part);

    tracing::trace!("completed transfer of part number {}", task.part_number);
    Ok(outcome)
}
