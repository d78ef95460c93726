//! Kernel-global aggregate and the work-group merge
//!
//! One [`KernelAggregate`] exists per kernel invocation. Completed
//! work-group trackers fold into it under the characterizer's single merge
//! lock: histograms sum elementwise by key, sequences append, scalar
//! counters add. The fold is commutative for every quantity the summarizer
//! derives; inter-work-group sequence order is unspecified and no
//! published statistic depends on it.

use std::collections::HashMap;

use crate::workgroup::WorkGroupTracker;

/// Kernel-global accumulator: the union of all merged work-group state.
#[derive(Debug, Clone, Default)]
pub struct KernelAggregate {
    /// Name of the kernel invocation in flight, `None` when idle
    pub kernel_name: Option<String>,
    /// Executions per opcode name
    pub compute_ops: HashMap<String, u64>,
    /// Raw addresses of all non-private accesses
    pub memory_ops: Vec<u64>,
    /// Outcome sequence per branch source line
    pub branch_ops: HashMap<u32, Vec<bool>>,
    /// Instructions between consecutive barrier hits
    pub instructions_to_barrier: Vec<u64>,
    /// Instructions per result vector width
    pub instruction_width: HashMap<u32, u64>,
    /// Instructions executed by each work-item
    pub instructions_per_work_item: Vec<u64>,
    /// Instructions between consecutive load/store operations
    pub instructions_between_mem_ops: Vec<u64>,
    /// Access count per named load operand
    pub load_labels: HashMap<String, u64>,
    /// Access count per named store operand
    pub store_labels: HashMap<String, u64>,
    /// Total work-items invoked
    pub threads_invoked: u64,
    /// Total barrier hits
    pub barriers_hit: u64,
    /// Local-space accesses
    pub local_accesses: u64,
    /// Global-space accesses
    pub global_accesses: u64,
    /// Constant-space accesses
    pub constant_accesses: u64,
}

impl KernelAggregate {
    /// Create an idle aggregate
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Begin a new kernel invocation: drop all history, stamp the name
    pub fn reset(&mut self, kernel_name: &str) {
        *self = Self::default();
        self.kernel_name = Some(kernel_name.to_string());
    }

    /// Return to idle, dropping all history
    pub fn clear(&mut self) {
        *self = Self::default();
    }

    /// Fold a completed work-group tracker into this aggregate.
    ///
    /// Commutative: merging any permutation of trackers yields identical
    /// histograms and counters, and sequence contents that are equal as
    /// multisets.
    pub fn merge(&mut self, tracker: WorkGroupTracker) {
        for (opcode, count) in tracker.compute_ops {
            *self.compute_ops.entry(opcode).or_insert(0) += count;
        }
        self.memory_ops.extend(tracker.memory_ops);
        for (line, outcomes) in tracker.branch_ops {
            self.branch_ops.entry(line).or_default().extend(outcomes);
        }
        self.instructions_to_barrier
            .extend(tracker.instructions_to_barrier);
        for (width, count) in tracker.instruction_width {
            *self.instruction_width.entry(width).or_insert(0) += count;
        }
        self.instructions_per_work_item
            .extend(tracker.instructions_per_work_item);
        self.instructions_between_mem_ops
            .extend(tracker.instructions_between_mem_ops);
        for (label, count) in tracker.load_labels {
            *self.load_labels.entry(label).or_insert(0) += count;
        }
        for (label, count) in tracker.store_labels {
            *self.store_labels.entry(label).or_insert(0) += count;
        }
        self.threads_invoked += tracker.threads_invoked;
        self.barriers_hit += tracker.barriers_hit;
        self.local_accesses += tracker.local_accesses;
        self.global_accesses += tracker.global_accesses;
        self.constant_accesses += tracker.constant_accesses;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::{AddressSpace, BlockId, InstructionEvent};

    fn tracker_with(opcodes: &[&str], addresses: &[u64]) -> WorkGroupTracker {
        let mut t = WorkGroupTracker::new();
        t.work_item_begin();
        for op in opcodes {
            t.instruction(&InstructionEvent::new(op, BlockId(0))).unwrap();
        }
        for &addr in addresses {
            t.memory_load(AddressSpace::Global, addr, 4, "buf");
        }
        t.work_item_complete();
        t
    }

    #[test]
    fn test_merge_sums_histograms() {
        let mut agg = KernelAggregate::new();
        agg.reset("k");
        agg.merge(tracker_with(&["add", "add"], &[]));
        agg.merge(tracker_with(&["add", "mul"], &[]));
        assert_eq!(agg.compute_ops["add"], 3);
        assert_eq!(agg.compute_ops["mul"], 1);
        assert_eq!(agg.threads_invoked, 2);
    }

    #[test]
    fn test_merge_is_commutative_over_histograms() {
        let mut forward = KernelAggregate::new();
        forward.merge(tracker_with(&["add"], &[1, 2]));
        forward.merge(tracker_with(&["mul", "mul"], &[2, 3]));

        let mut backward = KernelAggregate::new();
        backward.merge(tracker_with(&["mul", "mul"], &[2, 3]));
        backward.merge(tracker_with(&["add"], &[1, 2]));

        assert_eq!(forward.compute_ops, backward.compute_ops);
        assert_eq!(forward.instruction_width, backward.instruction_width);
        assert_eq!(forward.threads_invoked, backward.threads_invoked);
        assert_eq!(forward.global_accesses, backward.global_accesses);

        let mut f_addrs = forward.memory_ops.clone();
        let mut b_addrs = backward.memory_ops.clone();
        f_addrs.sort_unstable();
        b_addrs.sort_unstable();
        assert_eq!(f_addrs, b_addrs);
    }

    #[test]
    fn test_branch_order_preserved_within_contribution() {
        let mut t = WorkGroupTracker::new();
        t.work_item_begin();
        let br = InstructionEvent::new("br", BlockId(0))
            .at_line(7)
            .with_branch(BlockId(1), BlockId(2));
        t.instruction(&br).unwrap();
        t.instruction(&InstructionEvent::new("add", BlockId(1))).unwrap();
        t.instruction(&br).unwrap();
        t.instruction(&InstructionEvent::new("add", BlockId(2))).unwrap();

        let mut agg = KernelAggregate::new();
        agg.merge(t);
        assert_eq!(agg.branch_ops[&7], vec![true, false]);
    }

    #[test]
    fn test_reset_stamps_name_and_clears() {
        let mut agg = KernelAggregate::new();
        agg.merge(tracker_with(&["add"], &[1]));
        agg.reset("vecadd");
        assert_eq!(agg.kernel_name.as_deref(), Some("vecadd"));
        assert!(agg.compute_ops.is_empty());
        assert!(agg.memory_ops.is_empty());
        assert_eq!(agg.threads_invoked, 0);
    }

    #[test]
    fn test_clear_returns_to_idle() {
        let mut agg = KernelAggregate::new();
        agg.reset("k");
        agg.clear();
        assert!(agg.kernel_name.is_none());
    }
}
