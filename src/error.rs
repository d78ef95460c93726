//! Error types for characterization operations

use crate::event::BlockId;
use thiserror::Error;

/// Error type for characterization operations
#[derive(Debug, Error)]
pub enum CaracterizarError {
    /// The control-flow model desynchronized from the host simulator: the
    /// block executed after a conditional branch matched neither recorded
    /// successor. This is an internal-consistency fault, not an input
    /// error; the host must treat it as fatal.
    #[error(
        "branch at line {line} jumped to block {observed:?}, \
         expected {taken:?} (taken) or {not_taken:?} (not taken)"
    )]
    BranchTargetMismatch {
        /// Source line of the armed conditional branch
        line: u32,
        /// Block the next instruction actually executed in
        observed: BlockId,
        /// Recorded taken successor
        taken: BlockId,
        /// Recorded not-taken successor
        not_taken: BlockId,
    },

    /// Kernel lifecycle violation: summarization requested with no
    /// invocation in flight
    #[error("no kernel invocation in progress")]
    NoActiveKernel,

    /// Report file I/O failure
    #[error("report I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for characterization operations
pub type Result<T> = std::result::Result<T, CaracterizarError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_branch_mismatch_display_names_all_blocks() {
        let err = CaracterizarError::BranchTargetMismatch {
            line: 42,
            observed: BlockId(7),
            taken: BlockId(1),
            not_taken: BlockId(2),
        };
        let msg = err.to_string();
        assert!(msg.contains("line 42"));
        assert!(msg.contains("BlockId(7)"));
        assert!(msg.contains("BlockId(1)"));
        assert!(msg.contains("BlockId(2)"));
    }

    #[test]
    fn test_io_error_converts() {
        let io = std::io::Error::new(std::io::ErrorKind::AlreadyExists, "exists");
        let err: CaracterizarError = io.into();
        assert!(matches!(err, CaracterizarError::Io(_)));
    }
}
