/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

//! Checkpoint records describing which parts of a transfer have completed.
//!
//! A checkpoint can live in a file between process invocations or be carried
//! in memory by the caller. Either way all mutation goes through
//! [`CheckpointStore`], which serializes the in-memory update and the
//! persistence flush under a single lock: part *execution* is parallel, but
//! there is only ever one checkpoint writer at a time.

use std::collections::HashSet;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use crate::error;

/// Identity of the source object a checkpoint was recorded against.
///
/// A checkpoint is only valid for resume while the source still matches the
/// fingerprint; a changed size or modification marker means the recorded
/// parts describe bytes that no longer exist.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceFingerprint {
    /// Total size of the source in bytes
    pub size: u64,
    /// Modification marker (e.g. mtime in milliseconds) when known
    pub modified: Option<String>,
    /// Content tag (e.g. an ETag) when known
    pub tag: Option<String>,
}

impl SourceFingerprint {
    /// Fingerprint consisting of only a size, for sources without a
    /// modification marker (e.g. in-memory buffers).
    pub fn from_size(size: u64) -> Self {
        Self {
            size,
            modified: None,
            tag: None,
        }
    }
}

/// The durable outcome of one part transfer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartOutcome {
    /// 1-based part number
    pub part_number: u64,
    /// First byte offset covered by this part (inclusive)
    pub range_start: u64,
    /// One past the last byte offset covered by this part
    pub range_end: u64,
    /// CRC-64/NVME of the part's bytes
    pub checksum: u64,
    /// Tag assigned to the part by the remote service
    pub remote_tag: String,
    /// Whether the part transfer completed
    pub completed: bool,
}

impl PartOutcome {
    /// Size of the part's byte range
    pub fn size(&self) -> u64 {
        self.range_end - self.range_start
    }
}

/// Persistent record of one transfer's progress.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckpointRecord {
    /// Key of the remote object being assembled
    pub resource_key: String,
    /// Part size the task list was planned with
    pub part_size: u64,
    /// Remote transfer ID returned by the initiate operation
    pub transfer_id: String,
    /// Identity of the source at the time the transfer started
    pub fingerprint: SourceFingerprint,
    /// Outcomes recorded so far, in completion order
    pub parts: Vec<PartOutcome>,
}

impl CheckpointRecord {
    pub(crate) fn new(
        resource_key: String,
        part_size: u64,
        transfer_id: String,
        fingerprint: SourceFingerprint,
    ) -> Self {
        Self {
            resource_key,
            part_size,
            transfer_id,
            fingerprint,
            parts: Vec::new(),
        }
    }

    /// Whether this record was taken against the given source.
    pub(crate) fn matches_source(&self, resource_key: &str, fingerprint: &SourceFingerprint) -> bool {
        self.resource_key == resource_key && self.fingerprint == *fingerprint
    }

    /// Numbers of the parts recorded as completed.
    pub(crate) fn completed_parts(&self) -> HashSet<u64> {
        self.parts
            .iter()
            .filter(|p| p.completed)
            .map(|p| p.part_number)
            .collect()
    }

    /// Total bytes covered by completed parts.
    pub(crate) fn completed_bytes(&self) -> u64 {
        self.parts
            .iter()
            .filter(|p| p.completed)
            .map(|p| p.size())
            .sum()
    }

    fn upsert(&mut self, outcome: PartOutcome) {
        match self
            .parts
            .iter_mut()
            .find(|p| p.part_number == outcome.part_number)
        {
            Some(existing) => *existing = outcome,
            None => self.parts.push(outcome),
        }
    }
}

/// Where a transfer's checkpoint lives.
#[derive(Debug, Clone)]
pub enum Checkpoint {
    /// JSON file at the given path. Loaded on start when present; flushed
    /// after every recorded outcome; removed on success.
    FilePath(PathBuf),
    /// A record the caller carried over from a previous invocation. No
    /// persistence is performed; the updated record is available from the
    /// transfer handle.
    InMemory(CheckpointRecord),
}

#[derive(Debug)]
enum Strategy {
    File(PathBuf),
    Noop,
}

#[derive(Debug)]
struct StoreInner {
    strategy: Strategy,
    record: Option<CheckpointRecord>,
}

/// Single-writer store over the transfer's checkpoint record.
#[derive(Debug)]
pub(crate) struct CheckpointStore {
    inner: Mutex<StoreInner>,
}

impl CheckpointStore {
    pub(crate) fn new(checkpoint: Option<Checkpoint>) -> Self {
        let (strategy, record) = match checkpoint {
            Some(Checkpoint::FilePath(path)) => (Strategy::File(path), None),
            Some(Checkpoint::InMemory(record)) => (Strategy::Noop, Some(record)),
            None => (Strategy::Noop, None),
        };

        Self {
            inner: Mutex::new(StoreInner { strategy, record }),
        }
    }

    /// Load the existing record, if any.
    ///
    /// A missing file is a fresh start. An unreadable or undecodable file is
    /// treated the same way: the recorded outcomes are unusable, so they are
    /// discarded rather than surfaced as an error.
    pub(crate) async fn load(&self) -> Option<CheckpointRecord> {
        let mut inner = self.inner.lock().await;
        if inner.record.is_some() {
            return inner.record.clone();
        }

        let path = match &inner.strategy {
            Strategy::File(path) => path.clone(),
            Strategy::Noop => return None,
        };

        match tokio::fs::read(&path).await {
            Ok(raw) => match serde_json::from_slice::<CheckpointRecord>(&raw) {
                Ok(record) => {
                    inner.record = Some(record);
                    inner.record.clone()
                }
                Err(err) => {
                    tracing::warn!(path = %path.display(), error = %err, "discarding undecodable checkpoint");
                    None
                }
            },
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => None,
            Err(err) => {
                tracing::warn!(path = %path.display(), error = %err, "discarding unreadable checkpoint");
                None
            }
        }
    }

    /// Replace the record with a freshly planned one and flush it.
    pub(crate) async fn initialize(&self, record: CheckpointRecord) -> Result<(), error::Error> {
        let mut inner = self.inner.lock().await;
        inner.record = Some(record);
        flush(&inner).await
    }

    /// Record one part outcome: the in-memory mutation and the persistence
    /// flush happen under the same lock hold.
    pub(crate) async fn record_outcome(&self, outcome: PartOutcome) -> Result<(), error::Error> {
        let mut inner = self.inner.lock().await;
        let record = inner
            .record
            .as_mut()
            .ok_or_else(|| error::Error::new(error::ErrorKind::RuntimeError, "checkpoint record not initialized"))?;
        record.upsert(outcome);
        flush(&inner).await
    }

    /// Clone of the current record, for resume-by-value and diagnostics.
    pub(crate) async fn snapshot(&self) -> Option<CheckpointRecord> {
        self.inner.lock().await.record.clone()
    }

    /// Drop an invalidated record without touching persistence; the next
    /// [`initialize`](Self::initialize) overwrites it.
    pub(crate) async fn discard(&self) {
        self.inner.lock().await.record = None;
    }

    /// Remove the checkpoint after a successful transfer so a later
    /// invocation cannot resume into an already-finished transfer.
    pub(crate) async fn remove(&self) -> Result<(), error::Error> {
        let mut inner = self.inner.lock().await;
        inner.record = None;
        if let Strategy::File(path) = &inner.strategy {
            match tokio::fs::remove_file(path).await {
                Ok(()) => {}
                Err(err) if err.kind() == std::io::ErrorKind::NotFound => {}
                Err(err) => return Err(err.into()),
            }
        }
        Ok(())
    }
}

async fn flush(inner: &StoreInner) -> Result<(), error::Error> {
    let path = match &inner.strategy {
        Strategy::File(path) => path,
        Strategy::Noop => return Ok(()),
    };
    let record = inner
        .record
        .as_ref()
        .ok_or_else(|| error::Error::new(error::ErrorKind::RuntimeError, "nothing to flush"))?;

    let json = serde_json::to_vec_pretty(record)?;

    // write-then-rename so a crash mid-flush never leaves a torn file
    let tmp = path.with_extension("tmp");
    tokio::fs::write(&tmp, &json).await?;
    tokio::fs::rename(&tmp, path).await?;
    tracing::trace!(path = %path.display(), parts = record.parts.len(), "checkpoint flushed");
    Ok(())
}
