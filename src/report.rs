//! Report rendering and emission
//!
//! Renders a [`KernelReport`] as a human-readable Markdown summary and as
//! CSV, and writes the process-lifetime transfer report. Report files are
//! named with an incrementing numeric suffix probed until an unused name
//! is found, so an existing report is never overwritten.

use std::fmt::Write as _;
use std::fs::OpenOptions;
use std::io::Write as _;
use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::stats::BRANCH_HISTORY_WINDOW;
use crate::summary::KernelReport;
use crate::transfer::TransferReport;

/// Render the kernel report in the Markdown layout of the console summary.
#[must_use]
#[allow(clippy::missing_panics_doc)] // writing to a String cannot fail
pub fn render_markdown(report: &KernelReport) -> String {
    let mut out = String::new();

    writeln!(
        out,
        "# Architecture-Independent Workload Characterization of kernel: {}\n",
        report.kernel_name
    )
    .unwrap();

    writeln!(out, "## Compute\n").unwrap();
    writeln!(out, "|{:<20}|{:>12}|", "Opcode", "count").unwrap();
    writeln!(out, "|--------------------|-----------:|").unwrap();
    for entry in &report.opcode_counts {
        writeln!(out, "|{:<20}|{:>12}|", entry.opcode, entry.count).unwrap();
    }
    writeln!(
        out,
        "\nunique opcodes required to cover 90% of dynamic instructions: {}",
        report.covering_opcodes.join(", ")
    )
    .unwrap();
    writeln!(
        out,
        "num unique opcodes required to cover 90% of dynamic instructions: {}",
        report.opcodes_to_cover_90
    )
    .unwrap();
    writeln!(
        out,
        "Total Instruction Count: {}\n",
        report.total_instruction_count
    )
    .unwrap();

    writeln!(out, "## Parallelism\n").unwrap();
    writeln!(out, "Freedom to Reorder: {:.2}", report.freedom_to_reorder).unwrap();
    writeln!(out, "Resource Pressure: {:.2}\n", report.resource_pressure).unwrap();
    writeln!(out, "Work-items: {}", report.work_items).unwrap();
    writeln!(out, "Granularity: {}", report.granularity).unwrap();
    writeln!(out, "Total Barriers Hit: {}", report.barriers_hit).unwrap();
    writeln!(
        out,
        "Instructions to Barrier (min/max/median): {}/{}/{}",
        report.itb_min, report.itb_max, report.itb_median
    )
    .unwrap();
    writeln!(
        out,
        "Barriers per Instruction: {}",
        report.barriers_per_instruction
    )
    .unwrap();
    writeln!(
        out,
        "Instructions per Thread (min/max/median): {}/{}/{}",
        report.ipwi_min, report.ipwi_max, report.ipwi_median
    )
    .unwrap();
    writeln!(
        out,
        "SIMD Width (min/max/mean/stdev): {}/{}/{}/{}",
        report.simd_width_min, report.simd_width_max, report.simd_width_mean, report.simd_width_stdev
    )
    .unwrap();
    writeln!(
        out,
        "Instructions per Operand: {}\n",
        report.instructions_per_operand
    )
    .unwrap();

    writeln!(out, "## Memory\n").unwrap();
    writeln!(out, "num memory accesses: {}", report.memory_access_count).unwrap();
    writeln!(
        out,
        "Total Memory Footprint -- num unique memory addresses accessed: {}",
        report.total_footprint
    )
    .unwrap();
    writeln!(
        out,
        "90% Memory Footprint -- num unique memory addresses that cover 90% of memory accesses: {}",
        report.footprint_90
    )
    .unwrap();
    writeln!(
        out,
        "Global Memory Address Entropy: {}\n",
        report.global_entropy
    )
    .unwrap();
    writeln!(out, "|{:>12}|{:>8}|", "LSBs skipped", "Entropy").unwrap();
    writeln!(out, "|-----------:|-------:|").unwrap();
    for (index, entropy) in report.local_entropy.iter().enumerate() {
        writeln!(out, "|{:>12}|{:>8.4}|", index + 1, entropy).unwrap();
    }
    writeln!(
        out,
        "\nnum global memory accesses: {}",
        report.global_accesses
    )
    .unwrap();
    writeln!(out, "num local memory accesses: {}", report.local_accesses).unwrap();
    writeln!(
        out,
        "num constant memory accesses: {}",
        report.constant_accesses
    )
    .unwrap();
    writeln!(
        out,
        "% local memory accesses (local/total): {:.2}",
        report.local_access_pct
    )
    .unwrap();
    writeln!(
        out,
        "% constant memory accesses (constant/total): {:.2}\n",
        report.constant_access_pct
    )
    .unwrap();

    writeln!(out, "## Control\n").unwrap();
    writeln!(out, "|{:<14}|{:>23}|", "Branch At Line", "Count (hit and miss)").unwrap();
    writeln!(out, "|--------------|----------------------:|").unwrap();
    for site in &report.branch_sites {
        writeln!(out, "|{:<14}|{:>23}|", site.line, site.count).unwrap();
    }
    writeln!(
        out,
        "\nNumber of unique branches that cover 90% of all branch instructions: {}",
        report.branches_to_cover_90
    )
    .unwrap();
    writeln!(out, "Using a branch history of {BRANCH_HISTORY_WINDOW}").unwrap();
    writeln!(out, "Yokota Branch Entropy: {}", report.yokota_entropy).unwrap();
    writeln!(
        out,
        "Yokota Branch Entropy per Workload: {}",
        report.yokota_entropy_per_workload
    )
    .unwrap();
    writeln!(
        out,
        "Average Linear Branch Entropy: {}",
        report.linear_entropy
    )
    .unwrap();

    out
}

/// Write the kernel report as `aiwc_<kernel>_<n>.csv` under `dir`, probing
/// n = 0, 1, … until an unused name is found.
///
/// # Errors
///
/// Propagates filesystem failures other than name collisions.
pub fn write_kernel_csv(report: &KernelReport, dir: &Path) -> Result<PathBuf> {
    let base = format!("aiwc_{}", report.kernel_name);
    let (path, mut file) = create_probed(dir, &base)?;
    file.write_all(kernel_csv(report).as_bytes())?;
    Ok(path)
}

/// Write the transfer report as `aiwc_memory_transfers_<n>.csv` under
/// `dir`, probing for an unused suffix.
///
/// # Errors
///
/// Propagates filesystem failures other than name collisions.
pub fn write_transfer_csv(report: &TransferReport, dir: &Path) -> Result<PathBuf> {
    let (path, mut file) = create_probed(dir, "aiwc_memory_transfers")?;
    let mut out = String::from("metric,kernel,count\n");
    for entry in &report.host_to_device {
        writeln!(out, "transfer: host to device,{},{}", entry.kernel, entry.count).unwrap();
    }
    for entry in &report.device_to_host {
        writeln!(out, "transfer: device to host,{},{}", entry.kernel, entry.count).unwrap();
    }
    file.write_all(out.as_bytes())?;
    Ok(path)
}

/// The CSV body for a kernel report, `metric,count` rows
#[must_use]
#[allow(clippy::missing_panics_doc)] // writing to a String cannot fail
pub fn kernel_csv(report: &KernelReport) -> String {
    let mut out = String::from("metric,count\n");
    let mut row = |metric: &str, value: String| {
        writeln!(out, "{metric},{value}").unwrap();
    };

    row("opcode", report.opcodes_to_cover_90.to_string());
    row(
        "total instruction count",
        report.total_instruction_count.to_string(),
    );
    row("freedom to reorder", report.freedom_to_reorder.to_string());
    row("resource pressure", report.resource_pressure.to_string());
    row("workitems", report.work_items.to_string());
    row("operand sum", report.operand_sum.to_string());
    row("total # of barriers hit", report.barriers_hit.to_string());
    row("min instructions to barrier", report.itb_min.to_string());
    row("max instructions to barrier", report.itb_max.to_string());
    row("median instructions to barrier", report.itb_median.to_string());
    row(
        "min instructions executed by a work-item",
        report.ipwi_min.to_string(),
    );
    row(
        "max instructions executed by a work-item",
        report.ipwi_max.to_string(),
    );
    row(
        "median instructions executed by a work-item",
        report.ipwi_median.to_string(),
    );
    row("max simd width", report.simd_width_max.to_string());
    row("mean simd width", report.simd_width_mean.to_string());
    row("stdev simd width", report.simd_width_stdev.to_string());
    row("granularity", report.granularity.to_string());
    row(
        "barriers per instruction",
        report.barriers_per_instruction.to_string(),
    );
    row(
        "instructions per operand",
        report.instructions_per_operand.to_string(),
    );
    row("total memory footprint", report.total_footprint.to_string());
    row("90% memory footprint", report.footprint_90.to_string());
    row(
        "global memory address entropy",
        report.global_entropy.to_string(),
    );
    for (index, entropy) in report.local_entropy.iter().enumerate() {
        writeln!(
            out,
            "local memory address entropy -- {} LSBs skipped,{entropy}",
            index + 1
        )
        .unwrap();
    }
    writeln!(out, "total global memory accessed,{}", report.global_accesses).unwrap();
    writeln!(out, "total local memory accessed,{}", report.local_accesses).unwrap();
    writeln!(
        out,
        "total constant memory accessed,{}",
        report.constant_accesses
    )
    .unwrap();
    writeln!(out, "relative local memory usage,{}", report.local_access_pct).unwrap();
    writeln!(
        out,
        "relative constant memory usage,{}",
        report.constant_access_pct
    )
    .unwrap();
    writeln!(
        out,
        "total unique branch instructions,{}",
        report.unique_branches
    )
    .unwrap();
    writeln!(out, "90% branch instructions,{}", report.branches_to_cover_90).unwrap();
    writeln!(
        out,
        "branch entropy (yokota),{}",
        report.yokota_entropy_per_workload
    )
    .unwrap();
    writeln!(out, "branch entropy (average linear),{}", report.linear_entropy).unwrap();

    out
}

/// Open `<dir>/<base>_<n>.csv` for writing with the smallest unused n.
///
/// `create_new` makes the existence check and the creation one atomic
/// operation, so concurrent writers cannot clobber each other.
fn create_probed(dir: &Path, base: &str) -> Result<(PathBuf, std::fs::File)> {
    let mut suffix = 0u32;
    loop {
        let path = dir.join(format!("{base}_{suffix}.csv"));
        match OpenOptions::new().write(true).create_new(true).open(&path) {
            Ok(file) => return Ok((path, file)),
            Err(err) if err.kind() == std::io::ErrorKind::AlreadyExists => {
                suffix += 1;
            }
            Err(err) => return Err(err.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::KernelAggregate;
    use crate::summary::summarize;

    fn empty_report(name: &str) -> KernelReport {
        let mut aggregate = KernelAggregate::new();
        aggregate.reset(name);
        summarize(&aggregate)
    }

    #[test]
    fn test_csv_header_and_key_rows() {
        let csv = kernel_csv(&empty_report("k"));
        assert!(csv.starts_with("metric,count\n"));
        assert!(csv.contains("opcode,0\n"));
        assert!(csv.contains("total instruction count,0\n"));
        assert!(csv.contains("local memory address entropy -- 10 LSBs skipped,0\n"));
        assert!(csv.contains("branch entropy (average linear),0\n"));
    }

    #[test]
    fn test_csv_has_stable_row_count() {
        // 1 header + 22 scalar rows before the entropy table + 10 entropy
        // rows + 9 trailing rows
        let csv = kernel_csv(&empty_report("k"));
        assert_eq!(csv.lines().count(), 42);
    }

    #[test]
    fn test_markdown_mentions_kernel_and_sections() {
        let md = render_markdown(&empty_report("vecadd"));
        assert!(md.contains("kernel: vecadd"));
        assert!(md.contains("## Compute"));
        assert!(md.contains("## Parallelism"));
        assert!(md.contains("## Memory"));
        assert!(md.contains("## Control"));
    }

    #[test]
    fn test_probing_never_overwrites() {
        let dir = tempfile::tempdir().unwrap();
        let report = empty_report("probe");
        let first = write_kernel_csv(&report, dir.path()).unwrap();
        let second = write_kernel_csv(&report, dir.path()).unwrap();
        assert!(first.ends_with("aiwc_probe_0.csv"));
        assert!(second.ends_with("aiwc_probe_1.csv"));
        assert!(first.exists() && second.exists());
    }

    #[test]
    fn test_transfer_csv_rows() {
        use crate::transfer::TransferLog;

        let mut log = TransferLog::new();
        log.host_store();
        log.kernel_named("a");
        log.host_load();

        let dir = tempfile::tempdir().unwrap();
        let path = write_transfer_csv(&log.summary(), dir.path()).unwrap();
        let body = std::fs::read_to_string(path).unwrap();
        assert!(body.starts_with("metric,kernel,count\n"));
        assert!(body.contains("transfer: host to device,a,1\n"));
        assert!(body.contains("transfer: device to host,a,1\n"));
    }
}
