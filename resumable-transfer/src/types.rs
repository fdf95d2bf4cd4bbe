/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

/// The target part size for a transfer request.
#[derive(Debug, Clone, Default)]
pub enum PartSize {
    /// Automatically configure an optimal target part size based on the execution environment.
    #[default]
    Auto,

    /// Target part size explicitly given.
    ///
    /// NOTE: This is a suggestion and will be used if possible but may be adjusted for an individual request
    /// as required by the underlying API (the part count for a single transfer is bounded).
    Target(u64),
}

/// The concurrency settings to use for a single transfer request.
#[derive(Debug, Clone, Default)]
pub enum ConcurrencySetting {
    /// Automatically configure an optimal concurrency setting based on the execution environment.
    #[default]
    Auto,

    /// Explicitly configured concurrency setting.
    Explicit(usize),
}

/// Policy for what happens to the remote side of a transfer when the caller aborts it.
#[derive(Debug, Clone, Default)]
pub enum AbortPolicy {
    /// Leave the remote transfer in place so it can be resumed later.
    #[default]
    Retain,

    /// Invoke the executor's abort operation, discarding parts already
    /// received by the remote service. The local checkpoint is retained
    /// either way.
    AbortRemote,
}

/// Lifecycle states of a single transfer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferPhase {
    /// Resolving/validating the checkpoint and computing the task list
    Planning,
    /// Parts are being transferred by the worker pool
    InProgress,
    /// All parts succeeded; finalizing and verifying the combined checksum
    Completing,
    /// Finalize succeeded and the checkpoint was removed
    Completed,
    /// Cancellation was observed; the checkpoint is retained
    Aborted,
    /// A part, finalize, or integrity failure occurred; the checkpoint is retained
    Failed,
}

/// Identifying details of a single planned part.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartInfo {
    /// 1-based part number
    pub part_number: u64,
    /// Byte offset of this part within the source
    pub offset: u64,
    /// Size of this part in bytes
    pub size: u64,
}

/// Events reported to the caller-supplied event callback.
///
/// Events fire synchronously from the worker or orchestrator task that
/// produced them, in order of detection. A part's outcome is durably
/// recorded in the checkpoint before its success event fires.
#[derive(Debug, Clone)]
#[non_exhaustive]
pub enum TransferEvent {
    /// A fresh transfer was registered with the remote service
    InitiateSucceeded {
        /// The remote transfer ID
        transfer_id: String,
    },
    /// Registering the transfer with the remote service failed
    InitiateFailed {
        /// Failure detail
        message: String,
    },
    /// A part was transferred and its outcome persisted
    PartSucceeded {
        /// The part that succeeded
        part: PartInfo,
    },
    /// A part transfer failed; remaining parts are still attempted
    PartFailed {
        /// The part that failed
        part: PartInfo,
        /// Failure detail
        message: String,
    },
    /// A claimed part was skipped because cancellation was observed
    PartAborted {
        /// The part that was skipped
        part: PartInfo,
    },
    /// The remote service assembled the parts into a complete object
    FinalizeSucceeded {
        /// Tag of the assembled remote object, when reported
        remote_tag: Option<String>,
    },
    /// The finalize call failed; the checkpoint is retained for diagnosis
    FinalizeFailed {
        /// Failure detail
        message: String,
    },
}
