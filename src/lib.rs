//! # Caracterizar
//!
//! Architecture-independent workload characterization for simulated
//! many-core kernels.
//!
//! Caracterizar (Spanish: "to characterize") observes every instruction,
//! memory access, barrier, and branch a host simulator reports while
//! executing a compute kernel, and reduces them to a stable set of
//! architecture-independent metrics: instruction mix and coverage, memory
//! footprint and entropy at multiple spatial granularities, parallelism
//! and SIMD-width statistics, and branch predictability.
//!
//! ## Design
//!
//! - **Ownership over locking**: each concurrently-executing work-group
//!   accumulates into its own [`WorkGroupTracker`]; the only shared
//!   mutable state is the kernel aggregate, entered once per work-group
//!   completion.
//! - **Total statistics**: degenerate input (no branches, no memory
//!   traffic, no work-items) produces 0 in every report field, never NaN.
//! - **Stable reports**: CSV files are suffix-probed, an existing report
//!   is never overwritten.
//!
//! ## Example
//!
//! ```rust
//! use caracterizar::{Characterizer, InstructionEvent, BlockId};
//!
//! let characterizer = Characterizer::new();
//! characterizer.kernel_begin("vecadd");
//!
//! let mut group = characterizer.begin_work_group();
//! group.work_item_begin();
//! group.instruction(&InstructionEvent::new("fadd", BlockId(0))).unwrap();
//! group.work_item_complete();
//! characterizer.complete_work_group(group);
//!
//! let report = characterizer.kernel_end().unwrap();
//! assert_eq!(report.total_instruction_count, 1);
//! assert_eq!(report.work_items, 1);
//! ```
//!
//! ## Reference
//!
//! Johnston, B. & Milthorpe, J. (2018). "AIWC: OpenCL-based
//! Architecture-Independent Workload Characterization." LLVM-HPC.

#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::cast_precision_loss)] // u64 -> f64 for statistics is deliberate
#![allow(clippy::missing_errors_doc)] // error conditions documented on the error type
#![allow(clippy::float_cmp)] // exact zero checks are intentional

/// Kernel-global accumulator and the work-group merge
pub mod aggregate;
/// Hook surface driven by the host simulator
pub mod characterize;
pub mod error;
/// Observation vocabulary: address spaces, block identities, instruction
/// events
pub mod event;
/// Report rendering and collision-safe CSV emission
pub mod report;
/// Degenerate-input-safe statistical helpers (coverage, entropy, moments)
pub mod stats;
/// Kernel statistical summarizer producing the published report
pub mod summary;
/// Process-lifetime host-device transfer tracking
pub mod transfer;
/// Per-work-group scratch accumulator
pub mod workgroup;

// Re-exports for convenience
pub use characterize::Characterizer;
pub use error::{CaracterizarError, Result};
pub use event::{AddressSpace, BlockId, BranchTargets, InstructionEvent};
pub use summary::KernelReport;
pub use transfer::TransferReport;
pub use workgroup::WorkGroupTracker;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
