/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

//! Pure part planning: `(total size, requested part size)` in, task list out.
//! No I/O, no side effects.

use crate::types::PartInfo;

/// Maximum number of parts that a single transfer supports
pub(crate) const MAX_PARTS: u64 = 10_000;

/// One contiguous byte range transferred as a single request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct PartTask {
    /// 1-based part number
    pub(crate) part_number: u64,
    /// Byte offset of this part within the source
    pub(crate) offset: u64,
    /// Size of this part in bytes
    pub(crate) size: u64,
}

impl PartTask {
    pub(crate) fn range_start(&self) -> u64 {
        self.offset
    }

    /// One past the last byte offset covered by this part
    pub(crate) fn range_end(&self) -> u64 {
        self.offset + self.size
    }
}

impl From<&PartTask> for PartInfo {
    fn from(task: &PartTask) -> Self {
        PartInfo {
            part_number: task.part_number,
            offset: task.offset,
            size: task.size,
        }
    }
}

/// The resolved layout for one transfer.
#[derive(Debug, Clone)]
pub(crate) struct PartPlan {
    /// The part size actually used; may exceed the requested size to keep
    /// the part count within bounds
    pub(crate) part_size: u64,
    /// Tasks covering `[0, total_size)` exactly once, in part-number order
    pub(crate) tasks: Vec<PartTask>,
}

/// Compute the task list for a source of `total_size` bytes.
///
/// The requested part size is raised when it would produce more than
/// [`MAX_PARTS`] tasks. A zero-size source still yields exactly one
/// (empty) task because the remote protocol requires at least one part.
pub(crate) fn plan(total_size: u64, requested_part_size: u64) -> PartPlan {
    let part_size = std::cmp::max(requested_part_size.max(1), total_size.div_ceil(MAX_PARTS));

    if total_size == 0 {
        return PartPlan {
            part_size,
            tasks: vec![PartTask {
                part_number: 1,
                offset: 0,
                size: 0,
            }],
        };
    }

    let mut tasks = Vec::with_capacity(total_size.div_ceil(part_size) as usize);
    let mut offset = 0;
    while offset < total_size {
        let size = std::cmp::min(part_size, total_size - offset);
        tasks.push(PartTask {
            part_number: tasks.len() as u64 + 1,
            offset,
            size,
        });
        offset += size;
    }

    PartPlan { part_size, tasks }
}

#[cfg(test)]
mod tests {
    use super::{plan, MAX_PARTS};

    // tasks must cover [0, total) contiguously with 1-based numbering and
    // only the final task short
    fn assert_valid_plan(total_size: u64, requested_part_size: u64) {
        let plan = plan(total_size, requested_part_size);
        assert!(plan.tasks.len() as u64 <= MAX_PARTS);

        let mut expected_offset = 0;
        for (i, task) in plan.tasks.iter().enumerate() {
            assert_eq!(i as u64 + 1, task.part_number);
            assert_eq!(expected_offset, task.offset);
            if i < plan.tasks.len() - 1 {
                assert_eq!(plan.part_size, task.size);
            } else {
                assert!(task.size <= plan.part_size);
            }
            expected_offset = task.range_end();
        }
        assert_eq!(total_size, expected_offset);
    }

    #[test]
    fn test_covers_source_exactly_once() {
        for total_size in [1, 9, 10, 11, 23, 100, 1024, 99_999, 1_000_000] {
            for requested in [1, 7, 10, 4096, 1_000_000] {
                assert_valid_plan(total_size, requested);
            }
        }
    }

    #[test]
    fn test_example_layout() {
        let plan = plan(23, 10);
        assert_eq!(10, plan.part_size);
        let ranges: Vec<(u64, u64)> = plan
            .tasks
            .iter()
            .map(|t| (t.range_start(), t.range_end()))
            .collect();
        assert_eq!(vec![(0, 10), (10, 20), (20, 23)], ranges);
    }

    #[test]
    fn test_part_size_raised_to_respect_part_count_bound() {
        let plan = plan(50_000_000_000, 1_000_000);
        assert_eq!(5_000_000, plan.part_size);
        assert_eq!(MAX_PARTS, plan.tasks.len() as u64);
    }

    #[test]
    fn test_exact_division_has_no_short_tail() {
        let plan = plan(100, 10);
        assert_eq!(10, plan.tasks.len());
        assert!(plan.tasks.iter().all(|t| t.size == 10));
    }

    #[test]
    fn test_zero_size_source_still_yields_one_task() {
        let plan = plan(0, 1024);
        assert_eq!(1, plan.tasks.len());
        assert_eq!(0, plan.tasks[0].size);
        assert_eq!(1, plan.tasks[0].part_number);
    }

    #[test]
    fn test_single_part_when_source_smaller_than_part_size() {
        let plan = plan(100, 1024);
        assert_eq!(1, plan.tasks.len());
        assert_eq!(100, plan.tasks[0].size);
    }
}
