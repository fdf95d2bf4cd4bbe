/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

/* Automatically managed default lints */
#![cfg_attr(docsrs, feature(doc_auto_cfg))]
/* End of automatically managed default lints */

//! Resumable multipart transfer engine.
//!
//! Moves large objects to a remote object-storage service in fixed-size
//! parts, concurrently, with checkpoint-based pause/resume. The signed
//! request layer is pluggable via [`executor::RequestExecutor`]; this crate
//! owns part planning, checkpoint persistence, the bounded-concurrency
//! worker pool, progress/event emission, and streaming checksum validation.

#![warn(
    missing_debug_implementations,
    missing_docs,
    rustdoc::missing_crate_level_docs,
    unreachable_pub,
    rust_2018_idioms
)]

pub(crate) const KIBIBYTE: u64 = 1024;

pub(crate) const MEBIBYTE: u64 = 1024 * 1024;

/// Number of logical workers used when no explicit concurrency is configured.
pub(crate) const DEFAULT_CONCURRENCY: usize = 1;

/// Error types emitted by `resumable-transfer`
pub mod error;

/// Common types used by `resumable-transfer`
pub mod types;

/// Checkpoint records and persistence
pub mod checkpoint;

/// Streaming, combinable CRC-64/NVME checksums
pub mod checksum;

/// The signed request executor seam
pub mod executor;

/// Types and helpers for I/O
pub mod io;

/// Transfer engine client
pub mod client;

/// Transfer engine configuration
mod config;

/// Transfer engine operations
pub mod operation;

pub(crate) mod progress;

pub(crate) mod runtime;

pub use client::Client;
pub use config::{Builder as ConfigBuilder, Config};
