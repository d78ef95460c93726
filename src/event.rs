//! Observation vocabulary reported by the host simulator
//!
//! The host simulator drives the characterizer with one event per dynamic
//! instruction plus separate memory-access notifications. These types are
//! the shared vocabulary of those hooks: address spaces, stable basic-block
//! identities, conditional-branch successor pairs, and the per-instruction
//! descriptor itself.
//!
//! Branch outcomes are resolved structurally: a conditional branch records
//! the [`BlockId`]s of its two successors, and the block of the next
//! executed instruction decides taken/not-taken by identity comparison.

use serde::{Deserialize, Serialize};

/// Address space of a memory access, OpenCL-style.
///
/// Private accesses are never logged or counted; only local, global, and
/// constant traffic contributes to footprint and entropy metrics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AddressSpace {
    /// Per-work-item private memory (excluded from all metrics)
    Private,
    /// Work-group shared local memory
    Local,
    /// Device-wide global memory
    Global,
    /// Read-only constant memory
    Constant,
}

impl AddressSpace {
    /// Whether accesses in this space contribute to memory metrics
    #[must_use]
    pub fn is_counted(self) -> bool {
        self != Self::Private
    }
}

/// Stable structural identity of a basic block.
///
/// The host simulator assigns each basic block an identifier that is stable
/// for the lifetime of the kernel invocation. Branch successor matching
/// compares these identifiers, never a printed representation of the block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BlockId(pub u64);

/// The two successor blocks of a conditional branch.
///
/// If both successors name the same block the branch resolves as taken:
/// under identity comparison the `taken` arm is checked first, and a
/// degenerate branch with one unique successor has only one outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BranchTargets {
    /// Successor executed when the condition holds
    pub taken: BlockId,
    /// Successor executed when the condition does not hold
    pub not_taken: BlockId,
}

/// One dynamic instruction, as reported by the host simulator.
///
/// `result_width` is the vector width of the instruction's result; a scalar
/// result uses width 1. `block` is the basic block the instruction belongs
/// to, used to resolve a pending conditional branch. `line` keys branch
/// outcome sequences by source location.
#[derive(Debug, Clone, Copy)]
pub struct InstructionEvent<'a> {
    /// Opcode name (e.g. "add", "load", "br")
    pub opcode: &'a str,
    /// Vector width of the result (1 = scalar)
    pub result_width: u32,
    /// Enclosing basic block
    pub block: BlockId,
    /// Source line from debug info (0 if unknown)
    pub line: u32,
    /// Successor pair when this is a two-target conditional branch
    pub branch: Option<BranchTargets>,
}

impl<'a> InstructionEvent<'a> {
    /// Create a scalar, non-branching instruction event
    #[must_use]
    pub fn new(opcode: &'a str, block: BlockId) -> Self {
        Self {
            opcode,
            result_width: 1,
            block,
            line: 0,
            branch: None,
        }
    }

    /// Set the result vector width
    #[must_use]
    pub fn with_width(mut self, width: u32) -> Self {
        self.result_width = width;
        self
    }

    /// Set the source line
    #[must_use]
    pub fn at_line(mut self, line: u32) -> Self {
        self.line = line;
        self
    }

    /// Mark this instruction as a conditional branch with two successors
    #[must_use]
    pub fn with_branch(mut self, taken: BlockId, not_taken: BlockId) -> Self {
        self.branch = Some(BranchTargets { taken, not_taken });
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_private_space_is_not_counted() {
        assert!(!AddressSpace::Private.is_counted());
        assert!(AddressSpace::Local.is_counted());
        assert!(AddressSpace::Global.is_counted());
        assert!(AddressSpace::Constant.is_counted());
    }

    #[test]
    fn test_event_builder_defaults() {
        let ev = InstructionEvent::new("add", BlockId(3));
        assert_eq!(ev.opcode, "add");
        assert_eq!(ev.result_width, 1);
        assert_eq!(ev.block, BlockId(3));
        assert_eq!(ev.line, 0);
        assert!(ev.branch.is_none());
    }

    #[test]
    fn test_event_builder_branch() {
        let ev = InstructionEvent::new("br", BlockId(0))
            .at_line(12)
            .with_branch(BlockId(1), BlockId(2));
        let targets = ev.branch.unwrap();
        assert_eq!(targets.taken, BlockId(1));
        assert_eq!(targets.not_taken, BlockId(2));
        assert_eq!(ev.line, 12);
    }

    #[test]
    fn test_block_id_identity() {
        assert_eq!(BlockId(5), BlockId(5));
        assert_ne!(BlockId(5), BlockId(6));
    }
}
