/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

//! Progress and event delivery to the caller.
//!
//! Callbacks fire synchronously from the worker or orchestrator task that
//! produced the event; there is no queuing beyond per-part in-order-of-
//! detection delivery. The consumed byte counter is monotonically
//! non-decreasing except for [`ProgressTracker::rollback`], which subtracts
//! a failed request's partially counted bytes before the range is counted
//! again on a later attempt.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crate::types::{PartInfo, TransferEvent};

pub(crate) type ProgressFn = dyn Fn(f64) + Send + Sync;
pub(crate) type EventFn = dyn Fn(&TransferEvent) + Send + Sync;

pub(crate) struct ProgressTracker {
    total_size: u64,
    consumed: AtomicU64,
    on_progress: Option<Arc<ProgressFn>>,
    on_event: Option<Arc<EventFn>>,
}

impl ProgressTracker {
    pub(crate) fn new(
        total_size: u64,
        on_progress: Option<Arc<ProgressFn>>,
        on_event: Option<Arc<EventFn>>,
    ) -> Self {
        Self {
            total_size,
            consumed: AtomicU64::new(0),
            on_progress,
            on_event,
        }
    }

    /// Count bytes that flowed out of the source.
    pub(crate) fn record_bytes(&self, bytes: u64) {
        self.consumed.fetch_add(bytes, Ordering::SeqCst);
    }

    /// Un-count bytes of a request that failed after its range was counted.
    pub(crate) fn rollback(&self, bytes: u64) {
        let _ = self
            .consumed
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |current| {
                Some(current.saturating_sub(bytes))
            });
    }

    pub(crate) fn consumed(&self) -> u64 {
        self.consumed.load(Ordering::SeqCst)
    }

    pub(crate) fn initiate_succeeded(&self, transfer_id: &str) {
        self.emit(&TransferEvent::InitiateSucceeded {
            transfer_id: transfer_id.to_owned(),
        });
    }

    pub(crate) fn initiate_failed(&self, message: String) {
        self.emit(&TransferEvent::InitiateFailed { message });
    }

    pub(crate) fn part_succeeded(&self, part: PartInfo) {
        self.emit(&TransferEvent::PartSucceeded { part });
        self.emit_part_progress();
    }

    pub(crate) fn part_failed(&self, part: PartInfo, message: String) {
        self.emit(&TransferEvent::PartFailed { part, message });
    }

    pub(crate) fn part_aborted(&self, part: PartInfo) {
        self.emit(&TransferEvent::PartAborted { part });
    }

    pub(crate) fn finalize_succeeded(&self, remote_tag: Option<String>) {
        self.emit(&TransferEvent::FinalizeSucceeded { remote_tag });
    }

    pub(crate) fn finalize_failed(&self, message: String) {
        self.emit(&TransferEvent::FinalizeFailed { message });
    }

    /// Report completion. This is the only place `1.0` is ever reported:
    /// the object only becomes observable once finalize succeeded remotely,
    /// so the last part landing is not completion.
    pub(crate) fn complete(&self) {
        if let Some(on_progress) = &self.on_progress {
            (on_progress)(1.0);
        }
    }

    fn emit_part_progress(&self) {
        let Some(on_progress) = &self.on_progress else {
            return;
        };
        if self.total_size == 0 {
            return;
        }
        let consumed = self.consumed();
        if consumed < self.total_size {
            (on_progress)(consumed as f64 / self.total_size as f64);
        }
    }

    fn emit(&self, event: &TransferEvent) {
        if let Some(on_event) = &self.on_event {
            (on_event)(event);
        }
    }
}

impl fmt::Debug for ProgressTracker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProgressTracker")
            .field("total_size", &self.total_size)
            .field("consumed", &self.consumed)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use super::ProgressTracker;
    use crate::types::{PartInfo, TransferEvent};

    fn part(part_number: u64, size: u64) -> PartInfo {
        PartInfo {
            part_number,
            offset: (part_number - 1) * size,
            size,
        }
    }

    #[test]
    fn test_percentages_and_single_completion() {
        let reported: Arc<Mutex<Vec<f64>>> = Arc::new(Mutex::new(Vec::new()));
        let sink = reported.clone();
        let tracker = ProgressTracker::new(
            100,
            Some(Arc::new(move |pct| sink.lock().unwrap().push(pct))),
            None,
        );

        tracker.record_bytes(25);
        tracker.part_succeeded(part(1, 25));
        tracker.record_bytes(25);
        tracker.part_succeeded(part(2, 25));
        tracker.record_bytes(50);
        // the last part landing must not report 100%
        tracker.part_succeeded(part(3, 50));
        tracker.complete();

        let reported = reported.lock().unwrap();
        assert_eq!(vec![0.25, 0.50, 1.0], *reported);
        assert_eq!(1, reported.iter().filter(|pct| **pct == 1.0).count());
    }

    #[test]
    fn test_rollback_uncounts_failed_request() {
        let tracker = ProgressTracker::new(100, None, None);
        tracker.record_bytes(40);
        tracker.rollback(15);
        assert_eq!(25, tracker.consumed());

        // rollback never goes below zero
        tracker.rollback(1000);
        assert_eq!(0, tracker.consumed());
    }

    #[test]
    fn test_zero_size_transfer_reports_only_completion() {
        let reported: Arc<Mutex<Vec<f64>>> = Arc::new(Mutex::new(Vec::new()));
        let sink = reported.clone();
        let tracker = ProgressTracker::new(
            0,
            Some(Arc::new(move |pct| sink.lock().unwrap().push(pct))),
            None,
        );

        tracker.part_succeeded(part(1, 0));
        tracker.complete();
        assert_eq!(vec![1.0], *reported.lock().unwrap());
    }

    #[test]
    fn test_events_delivered_in_order() {
        let events: Arc<Mutex<Vec<String>>> = Arc::new(Mutex::new(Vec::new()));
        let sink = events.clone();
        let tracker = ProgressTracker::new(
            10,
            None,
            Some(Arc::new(move |event: &TransferEvent| {
                let label = match event {
                    TransferEvent::InitiateSucceeded { .. } => "initiate",
                    TransferEvent::PartSucceeded { part } => {
                        return sink.lock().unwrap().push(format!("part-{}", part.part_number))
                    }
                    TransferEvent::FinalizeSucceeded { .. } => "finalize",
                    _ => "other",
                };
                sink.lock().unwrap().push(label.to_owned());
            })),
        );

        tracker.initiate_succeeded("id-1");
        tracker.record_bytes(5);
        tracker.part_succeeded(part(1, 5));
        tracker.record_bytes(5);
        tracker.part_succeeded(part(2, 5));
        tracker.finalize_succeeded(Some("tag".to_owned()));

        assert_eq!(
            vec!["initiate", "part-1", "part-2", "finalize"],
            *events.lock().unwrap()
        );
    }
}
