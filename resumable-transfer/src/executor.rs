/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

//! The signed request executor seam.
//!
//! The engine never talks to the network itself. Every remote operation goes
//! through a caller-supplied [`RequestExecutor`], which owns request signing,
//! transport, per-request timeouts, and retry policy. The engine calls each
//! part operation exactly once per attempt; resuming after a failure is done
//! by re-invoking the transfer with the retained checkpoint, not by retrying
//! inside the engine.

use std::fmt;

use async_trait::async_trait;
use bytes::Bytes;

use crate::error::BoxError;

/// One part transfer request handed to the executor.
#[derive(Debug, Clone)]
#[non_exhaustive]
pub struct PartRequest {
    /// Key of the remote object being assembled
    pub resource_key: String,
    /// Remote transfer ID from the initiate operation
    pub transfer_id: String,
    /// 1-based part number
    pub part_number: u64,
    /// First byte offset covered by this part (inclusive)
    pub range_start: u64,
    /// One past the last byte offset covered by this part
    pub range_end: u64,
    /// The part's bytes
    pub body: Bytes,
}

/// Result of one part transfer.
#[derive(Debug, Clone)]
pub struct PartResponse {
    /// Tag assigned to the part by the remote service
    pub remote_tag: String,
    /// Checksum of the part as computed by the remote service, when reported.
    /// If present it is compared against the locally computed checksum.
    pub checksum: Option<u64>,
}

/// One previously transferred part, referenced during finalize.
#[derive(Debug, Clone)]
pub struct FinalizedPart {
    /// 1-based part number
    pub part_number: u64,
    /// Tag the remote service assigned to the part
    pub remote_tag: String,
}

/// Request to assemble all transferred parts into the complete remote object.
#[derive(Debug, Clone)]
#[non_exhaustive]
pub struct FinalizeRequest {
    /// Key of the remote object being assembled
    pub resource_key: String,
    /// Remote transfer ID from the initiate operation
    pub transfer_id: String,
    /// All parts in ascending part-number order
    pub parts: Vec<FinalizedPart>,
}

/// Result of the finalize operation.
#[derive(Debug, Clone)]
pub struct FinalizeResponse {
    /// Tag of the assembled remote object, when reported
    pub remote_tag: Option<String>,
    /// Object-level checksum as computed by the remote service, when
    /// reported. Compared against the locally folded per-part checksums.
    pub checksum: Option<u64>,
}

/// Executes signed requests against the remote object-storage service.
///
/// Implementations must be safe to call from multiple worker tasks
/// concurrently.
#[async_trait]
pub trait RequestExecutor: fmt::Debug + Send + Sync {
    /// Register a new multipart transfer and return its remote transfer ID.
    async fn initiate_transfer(&self, resource_key: &str) -> Result<String, BoxError>;

    /// Transfer a single part.
    async fn transfer_part(&self, request: PartRequest) -> Result<PartResponse, BoxError>;

    /// Assemble previously transferred parts into one complete remote object.
    async fn finalize_transfer(&self, request: FinalizeRequest) -> Result<FinalizeResponse, BoxError>;

    /// Discard an in-progress remote transfer and any parts it holds.
    async fn abort_transfer(&self, transfer_id: &str) -> Result<(), BoxError>;
}
