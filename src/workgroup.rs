//! Per-work-group scratch accumulator
//!
//! One [`WorkGroupTracker`] is owned by each concurrently-executing
//! work-group context. All accumulation is lock-free because the tracker is
//! exclusively owned; the only synchronization in the whole design happens
//! later, when a completed tracker is merged into the kernel-global
//! aggregate.
//!
//! No metric is finalized here. The tracker only records raw observations:
//! histograms, address logs, outcome sequences, and running counters that
//! the summarizer turns into published statistics at kernel end.

use std::collections::HashMap;

use crate::error::{CaracterizarError, Result};
use crate::event::{AddressSpace, BranchTargets, InstructionEvent};

/// A conditional branch waiting for its next-block observation
#[derive(Debug, Clone, Copy)]
struct PendingBranch {
    targets: BranchTargets,
    line: u32,
}

/// Scratch state local to one work-group's execution.
///
/// Created by [`Characterizer::begin_work_group`] and consumed by
/// [`Characterizer::complete_work_group`], which merges it into the
/// kernel-global aggregate.
///
/// Hook ordering contract: for a load or store instruction, call
/// [`instruction`] first and the matching [`memory_load`]/[`memory_store`]
/// second, so the instruction itself is included in the gap pushed into the
/// inter-memory-op distance sequence.
///
/// [`Characterizer::begin_work_group`]: crate::Characterizer::begin_work_group
/// [`Characterizer::complete_work_group`]: crate::Characterizer::complete_work_group
/// [`instruction`]: WorkGroupTracker::instruction
/// [`memory_load`]: WorkGroupTracker::memory_load
/// [`memory_store`]: WorkGroupTracker::memory_store
#[derive(Debug, Clone, Default)]
pub struct WorkGroupTracker {
    /// Executions per opcode name
    pub(crate) compute_ops: HashMap<String, u64>,
    /// Raw addresses of non-private accesses, in observation order
    pub(crate) memory_ops: Vec<u64>,
    /// Taken/not-taken outcome sequence per branch source line
    pub(crate) branch_ops: HashMap<u32, Vec<bool>>,
    /// Instructions executed between consecutive barrier hits
    pub(crate) instructions_to_barrier: Vec<u64>,
    /// Instructions per result vector width
    pub(crate) instruction_width: HashMap<u32, u64>,
    /// Instructions executed by each completed work-item
    pub(crate) instructions_per_work_item: Vec<u64>,
    /// Instructions between consecutive load/store operations
    pub(crate) instructions_between_mem_ops: Vec<u64>,
    /// Access count per named load operand
    pub(crate) load_labels: HashMap<String, u64>,
    /// Access count per named store operand
    pub(crate) store_labels: HashMap<String, u64>,
    /// Work-items started in this group
    pub(crate) threads_invoked: u64,
    /// Barrier hits in this group
    pub(crate) barriers_hit: u64,
    /// Local-space accesses
    pub(crate) local_accesses: u64,
    /// Global-space accesses
    pub(crate) global_accesses: u64,
    /// Constant-space accesses
    pub(crate) constant_accesses: u64,

    // Transient counters, reset at work-item and barrier boundaries
    instruction_count: u64,
    work_item_instruction_count: u64,
    ops_since_mem_op: u64,
    pending_branch: Option<PendingBranch>,
}

impl WorkGroupTracker {
    /// Create an empty tracker
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A work-item started executing in this group
    pub fn work_item_begin(&mut self) {
        self.threads_invoked += 1;
        self.instruction_count = 0;
        self.work_item_instruction_count = 0;
        self.ops_since_mem_op = 0;
    }

    /// A work-item finished: close out the trailing barrier segment and
    /// record the item's total instruction count
    pub fn work_item_complete(&mut self) {
        self.instructions_to_barrier.push(self.instruction_count);
        self.instructions_per_work_item
            .push(self.work_item_instruction_count);
    }

    /// A work-item hit a barrier
    pub fn barrier(&mut self) {
        self.barriers_hit += 1;
        self.instructions_to_barrier.push(self.instruction_count);
        self.instruction_count = 0;
    }

    /// A work-item resumed past a cleared barrier. Resets the running
    /// counter without recording a data point.
    pub fn barrier_cleared(&mut self) {
        self.instruction_count = 0;
    }

    /// Record one dynamic instruction.
    ///
    /// Resolves a pending conditional branch against the instruction's
    /// block, arms a new pending branch when the instruction is a
    /// conditional branch, and advances the opcode, width, and distance
    /// bookkeeping.
    ///
    /// # Errors
    ///
    /// [`CaracterizarError::BranchTargetMismatch`] when a pending branch's
    /// successor set does not contain this instruction's block. The
    /// control-flow model has desynchronized from the simulator and the
    /// fault is unrecoverable.
    pub fn instruction(&mut self, event: &InstructionEvent<'_>) -> Result<()> {
        *self
            .compute_ops
            .entry(event.opcode.to_string())
            .or_insert(0) += 1;

        if let Some(pending) = self.pending_branch.take() {
            let outcome = if event.block == pending.targets.taken {
                true
            } else if event.block == pending.targets.not_taken {
                false
            } else {
                return Err(CaracterizarError::BranchTargetMismatch {
                    line: pending.line,
                    observed: event.block,
                    taken: pending.targets.taken,
                    not_taken: pending.targets.not_taken,
                });
            };
            self.branch_ops.entry(pending.line).or_default().push(outcome);
        }

        if let Some(targets) = event.branch {
            self.pending_branch = Some(PendingBranch {
                targets,
                line: event.line,
            });
        }

        self.instruction_count += 1;
        self.work_item_instruction_count += 1;
        self.ops_since_mem_op += 1;
        *self
            .instruction_width
            .entry(event.result_width)
            .or_insert(0) += 1;

        Ok(())
    }

    /// Record a load: address log + space counter (non-private only),
    /// operand label histogram, and the inter-memory-op distance
    pub fn memory_load(&mut self, space: AddressSpace, address: u64, _size: u64, label: &str) {
        self.record_access(space, address);
        *self.load_labels.entry(label.to_string()).or_insert(0) += 1;
        self.close_mem_gap();
    }

    /// Record a store: address log + space counter (non-private only),
    /// operand label histogram, and the inter-memory-op distance
    pub fn memory_store(&mut self, space: AddressSpace, address: u64, _size: u64, label: &str) {
        self.record_access(space, address);
        *self.store_labels.entry(label.to_string()).or_insert(0) += 1;
        self.close_mem_gap();
    }

    /// Record an atomic access. Atomics contribute to the address log (and
    /// footprint/entropy) but carry no operand label and do not close the
    /// inter-memory-op gap.
    pub fn memory_atomic(&mut self, space: AddressSpace, address: u64, _size: u64) {
        if space.is_counted() {
            self.memory_ops.push(address);
        }
    }

    fn record_access(&mut self, space: AddressSpace, address: u64) {
        match space {
            AddressSpace::Private => {}
            AddressSpace::Local => {
                self.local_accesses += 1;
                self.memory_ops.push(address);
            }
            AddressSpace::Global => {
                self.global_accesses += 1;
                self.memory_ops.push(address);
            }
            AddressSpace::Constant => {
                self.constant_accesses += 1;
                self.memory_ops.push(address);
            }
        }
    }

    fn close_mem_gap(&mut self) {
        self.instructions_between_mem_ops.push(self.ops_since_mem_op);
        self.ops_since_mem_op = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::BlockId;

    fn arith(block: u64) -> InstructionEvent<'static> {
        InstructionEvent::new("add", BlockId(block))
    }

    // ========================================================================
    // Work-item lifecycle
    // ========================================================================

    #[test]
    fn test_work_item_begin_counts_threads() {
        let mut t = WorkGroupTracker::new();
        t.work_item_begin();
        t.work_item_begin();
        assert_eq!(t.threads_invoked, 2);
    }

    #[test]
    fn test_work_item_complete_records_both_sequences() {
        let mut t = WorkGroupTracker::new();
        t.work_item_begin();
        for _ in 0..3 {
            t.instruction(&arith(0)).unwrap();
        }
        t.work_item_complete();
        assert_eq!(t.instructions_to_barrier, vec![3]);
        assert_eq!(t.instructions_per_work_item, vec![3]);
    }

    #[test]
    fn test_barrier_splits_segments() {
        let mut t = WorkGroupTracker::new();
        t.work_item_begin();
        t.instruction(&arith(0)).unwrap();
        t.instruction(&arith(0)).unwrap();
        t.barrier();
        t.barrier_cleared();
        t.instruction(&arith(0)).unwrap();
        t.work_item_complete();
        assert_eq!(t.barriers_hit, 1);
        // 2 before the barrier, 1 trailing at completion
        assert_eq!(t.instructions_to_barrier, vec![2, 1]);
        // per-item count spans the barrier
        assert_eq!(t.instructions_per_work_item, vec![3]);
    }

    #[test]
    fn test_barrier_cleared_does_not_record() {
        let mut t = WorkGroupTracker::new();
        t.work_item_begin();
        t.instruction(&arith(0)).unwrap();
        t.barrier_cleared();
        assert!(t.instructions_to_barrier.is_empty());
        t.work_item_complete();
        // counter was reset by the clear
        assert_eq!(t.instructions_to_barrier, vec![0]);
    }

    // ========================================================================
    // Instruction classification
    // ========================================================================

    #[test]
    fn test_opcode_and_width_histograms() {
        let mut t = WorkGroupTracker::new();
        t.work_item_begin();
        t.instruction(&arith(0)).unwrap();
        t.instruction(&arith(0)).unwrap();
        t.instruction(&InstructionEvent::new("fmul", BlockId(0)).with_width(4))
            .unwrap();
        assert_eq!(t.compute_ops["add"], 2);
        assert_eq!(t.compute_ops["fmul"], 1);
        assert_eq!(t.instruction_width[&1], 2);
        assert_eq!(t.instruction_width[&4], 1);
    }

    #[test]
    fn test_branch_taken_and_not_taken() {
        let mut t = WorkGroupTracker::new();
        t.work_item_begin();
        let br = InstructionEvent::new("br", BlockId(0))
            .at_line(10)
            .with_branch(BlockId(1), BlockId(2));
        t.instruction(&br).unwrap();
        t.instruction(&arith(1)).unwrap(); // taken
        t.instruction(&br).unwrap();
        t.instruction(&arith(2)).unwrap(); // not taken
        assert_eq!(t.branch_ops[&10], vec![true, false]);
    }

    #[test]
    fn test_branch_mismatch_is_fatal() {
        let mut t = WorkGroupTracker::new();
        t.work_item_begin();
        let br = InstructionEvent::new("br", BlockId(0))
            .at_line(10)
            .with_branch(BlockId(1), BlockId(2));
        t.instruction(&br).unwrap();
        let err = t.instruction(&arith(9)).unwrap_err();
        assert!(matches!(
            err,
            CaracterizarError::BranchTargetMismatch { line: 10, .. }
        ));
    }

    #[test]
    fn test_degenerate_branch_resolves_as_taken() {
        let mut t = WorkGroupTracker::new();
        t.work_item_begin();
        let br = InstructionEvent::new("br", BlockId(0))
            .at_line(3)
            .with_branch(BlockId(1), BlockId(1));
        t.instruction(&br).unwrap();
        t.instruction(&arith(1)).unwrap();
        assert_eq!(t.branch_ops[&3], vec![true]);
    }

    // ========================================================================
    // Memory accesses
    // ========================================================================

    #[test]
    fn test_private_accesses_excluded() {
        let mut t = WorkGroupTracker::new();
        t.work_item_begin();
        t.instruction(&InstructionEvent::new("load", BlockId(0))).unwrap();
        t.memory_load(AddressSpace::Private, 0x100, 4, "stack");
        assert!(t.memory_ops.is_empty());
        assert_eq!(t.local_accesses + t.global_accesses + t.constant_accesses, 0);
        // label and gap bookkeeping still happen
        assert_eq!(t.load_labels["stack"], 1);
        assert_eq!(t.instructions_between_mem_ops, vec![1]);
    }

    #[test]
    fn test_space_counters() {
        let mut t = WorkGroupTracker::new();
        t.work_item_begin();
        t.memory_load(AddressSpace::Global, 0x10, 4, "a");
        t.memory_store(AddressSpace::Local, 0x20, 4, "scratch");
        t.memory_load(AddressSpace::Constant, 0x30, 4, "lut");
        assert_eq!(t.global_accesses, 1);
        assert_eq!(t.local_accesses, 1);
        assert_eq!(t.constant_accesses, 1);
        assert_eq!(t.memory_ops, vec![0x10, 0x20, 0x30]);
    }

    #[test]
    fn test_inter_mem_op_gap_includes_the_memory_instruction() {
        let mut t = WorkGroupTracker::new();
        t.work_item_begin();
        t.instruction(&arith(0)).unwrap();
        t.instruction(&arith(0)).unwrap();
        t.instruction(&InstructionEvent::new("load", BlockId(0))).unwrap();
        t.memory_load(AddressSpace::Global, 0x10, 4, "a");
        // two arithmetic ops plus the load itself
        assert_eq!(t.instructions_between_mem_ops, vec![3]);
        t.instruction(&InstructionEvent::new("store", BlockId(0))).unwrap();
        t.memory_store(AddressSpace::Global, 0x18, 4, "b");
        assert_eq!(t.instructions_between_mem_ops, vec![3, 1]);
    }

    #[test]
    fn test_atomic_logs_address_only() {
        let mut t = WorkGroupTracker::new();
        t.work_item_begin();
        t.memory_atomic(AddressSpace::Global, 0x40, 4);
        t.memory_atomic(AddressSpace::Private, 0x50, 4);
        assert_eq!(t.memory_ops, vec![0x40]);
        assert_eq!(t.global_accesses, 0);
        assert!(t.instructions_between_mem_ops.is_empty());
    }
}
