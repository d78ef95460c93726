//! Kernel statistical summarizer
//!
//! Consumes a complete [`KernelAggregate`] at kernel end and derives every
//! published metric: instruction-mix coverage, reorder freedom, resource
//! pressure, parallelism distributions, SIMD-width moments, memory
//! footprint and entropy at eleven address granularities, memory
//! diversity, branch coverage, and branch-history entropy.
//!
//! Reference: Johnston, B. & Milthorpe, J. (2018). "AIWC: OpenCL-based
//! Architecture-Independent Workload Characterization." LLVM-HPC.

use serde::Serialize;
use std::collections::HashMap;

use crate::aggregate::KernelAggregate;
use crate::stats;

/// Number of address-granularity levels: raw addresses plus 1..=10 low
/// bits discarded
pub const FOOTPRINT_SHIFTS: usize = 11;

/// One row of the sorted opcode table
#[derive(Debug, Clone, Serialize)]
pub struct OpcodeCount {
    /// Opcode name
    pub opcode: String,
    /// Dynamic executions
    pub count: u64,
}

/// One row of the sorted branch-site table
#[derive(Debug, Clone, Serialize)]
pub struct BranchSiteCount {
    /// Source line of the branch
    pub line: u32,
    /// Dynamic hits (taken and not taken)
    pub count: u64,
}

/// The published characterization of one kernel invocation.
///
/// Every field is finite: degenerate inputs (no instructions, no memory
/// traffic, no branches, no work-items) produce 0, never NaN.
#[derive(Debug, Clone, Serialize)]
pub struct KernelReport {
    /// Kernel name
    pub kernel_name: String,

    // Compute
    /// Opcode table, descending by execution count
    pub opcode_counts: Vec<OpcodeCount>,
    /// Distinct opcodes needed to cover 90% of dynamic instructions
    pub opcodes_to_cover_90: usize,
    /// The covering opcode names, most frequent first
    pub covering_opcodes: Vec<String>,
    /// Total dynamic instruction count
    pub total_instruction_count: u64,

    // Utilization
    /// Mean instructions between consecutive load/store operations
    pub freedom_to_reorder: f64,
    /// (load-label accesses + store-label accesses) per work-item
    pub resource_pressure: f64,

    // Thread-level parallelism
    /// Work-items invoked
    pub work_items: u64,
    /// 1 / work-items
    pub granularity: f64,
    /// Total barrier hits
    pub barriers_hit: u64,
    /// Minimum instructions between barriers
    pub itb_min: u64,
    /// Maximum instructions between barriers
    pub itb_max: u64,
    /// Median instructions between barriers
    pub itb_median: f64,
    /// (barriers hit + work-items) / total instructions
    pub barriers_per_instruction: f64,

    // Work distribution
    /// Minimum instructions executed by a work-item
    pub ipwi_min: u64,
    /// Maximum instructions executed by a work-item
    pub ipwi_max: u64,
    /// Median instructions executed by a work-item
    pub ipwi_median: f64,

    // Data parallelism
    /// Smallest result vector width observed
    pub simd_width_min: u32,
    /// Largest result vector width observed
    pub simd_width_max: u32,
    /// Count-weighted mean result vector width
    pub simd_width_mean: f64,
    /// Population standard deviation of result vector width
    pub simd_width_stdev: f64,
    /// Σ width × count over all instructions
    pub operand_sum: u64,
    /// Total instructions / operand sum
    pub instructions_per_operand: f64,

    // Memory
    /// Non-private memory accesses observed
    pub memory_access_count: u64,
    /// Unique addresses touched (raw, no bits discarded)
    pub total_footprint: usize,
    /// Unique addresses covering 90% of accesses
    pub footprint_90: usize,
    /// Shannon entropy of the raw address distribution
    pub global_entropy: f64,
    /// Entropy with 1..=10 low address bits discarded
    pub local_entropy: Vec<f64>,
    /// Global-space accesses
    pub global_accesses: u64,
    /// Local-space accesses
    pub local_accesses: u64,
    /// Constant-space accesses
    pub constant_accesses: u64,
    /// Local accesses as a percentage of all counted accesses
    pub local_access_pct: f64,
    /// Constant accesses as a percentage of all counted accesses
    pub constant_access_pct: f64,

    // Control
    /// Branch-site table, descending by dynamic hit count
    pub branch_sites: Vec<BranchSiteCount>,
    /// Distinct conditional branch sites observed
    pub unique_branches: usize,
    /// Branch sites covering 90% of dynamic branch hits
    pub branches_to_cover_90: usize,
    /// Occurrence-weighted Yokota branch entropy
    pub yokota_entropy: f64,
    /// Yokota branch entropy per distinct history pattern
    pub yokota_entropy_per_workload: f64,
    /// Average linear branch entropy
    pub linear_entropy: f64,
}

/// Derive the published metrics from a complete kernel aggregate.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn summarize(aggregate: &KernelAggregate) -> KernelReport {
    let kernel_name = aggregate.kernel_name.clone().unwrap_or_default();

    // Compute: sorted opcode table and 90% coverage
    let mut opcode_counts: Vec<OpcodeCount> = aggregate
        .compute_ops
        .iter()
        .map(|(opcode, &count)| OpcodeCount {
            opcode: opcode.clone(),
            count,
        })
        .collect();
    opcode_counts.sort_by(|a, b| b.count.cmp(&a.count));

    let total_instruction_count: u64 = opcode_counts.iter().map(|entry| entry.count).sum();
    let counts: Vec<u64> = opcode_counts.iter().map(|entry| entry.count).collect();
    let opcodes_to_cover_90 = stats::coverage_cutoff(&counts);
    let covering_opcodes = opcode_counts
        .iter()
        .take(opcodes_to_cover_90)
        .map(|entry| entry.opcode.clone())
        .collect();

    // Utilization
    let freedom_to_reorder = stats::mean(&aggregate.instructions_between_mem_ops);
    let label_accesses: u64 = aggregate.load_labels.values().sum::<u64>()
        + aggregate.store_labels.values().sum::<u64>();
    let resource_pressure = ratio(label_accesses as f64, aggregate.threads_invoked as f64);

    // Thread-level parallelism
    let granularity = ratio(1.0, aggregate.threads_invoked as f64);
    let (itb_min, itb_max) = stats::min_max(&aggregate.instructions_to_barrier);
    let itb_median = stats::median(&aggregate.instructions_to_barrier);
    let barriers_per_instruction = ratio(
        (aggregate.barriers_hit + aggregate.threads_invoked) as f64,
        total_instruction_count as f64,
    );

    // Work distribution
    let (ipwi_min, ipwi_max) = stats::min_max(&aggregate.instructions_per_work_item);
    let ipwi_median = stats::median(&aggregate.instructions_per_work_item);

    // Data parallelism
    let width = stats::width_moments(&aggregate.instruction_width);
    let instructions_per_operand =
        ratio(total_instruction_count as f64, width.operand_sum as f64);

    // Memory footprint at decreasing spatial granularity
    let mut shifted_counts: Vec<HashMap<u64, u64>> = vec![HashMap::new(); FOOTPRINT_SHIFTS];
    for &address in &aggregate.memory_ops {
        for (shift, histogram) in shifted_counts.iter_mut().enumerate() {
            *histogram.entry(address >> shift).or_insert(0) += 1;
        }
    }
    let memory_access_count = aggregate.memory_ops.len() as u64;
    let raw = &shifted_counts[0];
    let total_footprint = raw.len();
    let raw_counts: Vec<u64> = raw.values().copied().collect();
    let footprint_90 = stats::coverage_cutoff(&raw_counts);
    let global_entropy = stats::shannon_entropy(raw.values(), memory_access_count);
    let local_entropy: Vec<f64> = shifted_counts[1..]
        .iter()
        .map(|histogram| stats::shannon_entropy(histogram.values(), memory_access_count))
        .collect();

    // Memory diversity
    let counted_accesses =
        aggregate.local_accesses + aggregate.global_accesses + aggregate.constant_accesses;
    let local_access_pct = ratio(
        aggregate.local_accesses as f64 * 100.0,
        counted_accesses as f64,
    );
    let constant_access_pct = ratio(
        aggregate.constant_accesses as f64 * 100.0,
        counted_accesses as f64,
    );

    // Control
    let mut branch_sites: Vec<BranchSiteCount> = aggregate
        .branch_ops
        .iter()
        .map(|(&line, outcomes)| BranchSiteCount {
            line,
            count: outcomes.len() as u64,
        })
        .collect();
    branch_sites.sort_by(|a, b| b.count.cmp(&a.count));
    let branch_counts: Vec<u64> = branch_sites.iter().map(|site| site.count).collect();
    let branches_to_cover_90 = stats::coverage_cutoff(&branch_counts);
    let entropy = stats::branch_entropy(&aggregate.branch_ops);

    KernelReport {
        kernel_name,
        unique_branches: branch_sites.len(),
        opcode_counts,
        opcodes_to_cover_90,
        covering_opcodes,
        total_instruction_count,
        freedom_to_reorder,
        resource_pressure,
        work_items: aggregate.threads_invoked,
        granularity,
        barriers_hit: aggregate.barriers_hit,
        itb_min,
        itb_max,
        itb_median,
        barriers_per_instruction,
        ipwi_min,
        ipwi_max,
        ipwi_median,
        simd_width_min: width.min,
        simd_width_max: width.max,
        simd_width_mean: width.mean,
        simd_width_stdev: width.stdev,
        operand_sum: width.operand_sum,
        instructions_per_operand,
        memory_access_count,
        total_footprint,
        footprint_90,
        global_entropy,
        local_entropy,
        global_accesses: aggregate.global_accesses,
        local_accesses: aggregate.local_accesses,
        constant_accesses: aggregate.constant_accesses,
        local_access_pct,
        constant_access_pct,
        branch_sites,
        branches_to_cover_90,
        yokota_entropy: entropy.yokota,
        yokota_entropy_per_workload: entropy.yokota_per_workload,
        linear_entropy: entropy.linear,
    }
}

/// Division that reports "no data" as 0 instead of NaN or infinity
fn ratio(numerator: f64, denominator: f64) -> f64 {
    if denominator == 0.0 {
        0.0
    } else {
        numerator / denominator
    }
}
