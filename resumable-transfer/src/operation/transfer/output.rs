/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

/// Output type for a completed transfer
#[derive(Debug, Clone)]
#[non_exhaustive]
pub struct TransferOutput {
    pub(crate) transfer_id: String,
    pub(crate) remote_tag: Option<String>,
    pub(crate) checksum: u64,
    pub(crate) bytes_transferred: u64,
    pub(crate) part_count: u64,
}

impl TransferOutput {
    /// The remote transfer ID the object was assembled under
    pub fn transfer_id(&self) -> &str {
        &self.transfer_id
    }

    /// Tag of the assembled remote object, when the service reported one
    pub fn remote_tag(&self) -> Option<&str> {
        self.remote_tag.as_deref()
    }

    /// CRC-64/NVME of the full object, folded from the per-part checksums
    pub fn checksum(&self) -> u64 {
        self.checksum
    }

    /// Total size of the transferred object in bytes
    pub fn bytes_transferred(&self) -> u64 {
        self.bytes_transferred
    }

    /// Number of parts the object was assembled from
    pub fn part_count(&self) -> u64 {
        self.part_count
    }
}
