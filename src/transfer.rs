//! Host-device transfer tracking
//!
//! Transfers happen outside kernel execution windows, so they are tracked
//! separately from the per-kernel pipeline and never reset: the log spans
//! the whole process lifetime.
//!
//! A host-to-device copy usually precedes the kernel that consumes it, so
//! copies recorded before a kernel is named are retroactively relabeled
//! with that kernel's name once it begins. Device-to-host copies are
//! attributed to the most recently named kernel (the one that produced the
//! data).

use serde::Serialize;

/// Process-lifetime log of host↔device copies, keyed by kernel name.
#[derive(Debug, Default)]
pub struct TransferLog {
    host_to_device: Vec<String>,
    device_to_host: Vec<String>,
    pending_unnamed: usize,
    current_kernel: String,
}

/// Per-kernel transfer counts for one direction
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct KernelTransferCount {
    /// Kernel name (empty when no kernel was ever named)
    pub kernel: String,
    /// Copies attributed to that kernel
    pub count: u64,
}

/// Aggregated transfer counts over the whole run
#[derive(Debug, Clone, Serialize)]
pub struct TransferReport {
    /// Host-to-device copies per kernel, in first-appearance order
    pub host_to_device: Vec<KernelTransferCount>,
    /// Device-to-host copies per kernel, in first-appearance order
    pub device_to_host: Vec<KernelTransferCount>,
}

impl TransferLog {
    /// Create an empty log
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a host-side store (host-to-device copy)
    pub fn host_store(&mut self) {
        self.host_to_device.push(self.current_kernel.clone());
        self.pending_unnamed += 1;
    }

    /// Record a host-side load (device-to-host copy)
    pub fn host_load(&mut self) {
        self.device_to_host.push(self.current_kernel.clone());
    }

    /// A kernel invocation began: relabel every host-to-device copy made
    /// since the previous invocation with the new kernel's name
    pub fn kernel_named(&mut self, name: &str) {
        let start = self.host_to_device.len() - self.pending_unnamed;
        for entry in &mut self.host_to_device[start..] {
            *entry = name.to_string();
        }
        self.pending_unnamed = 0;
        self.current_kernel = name.to_string();
    }

    /// Aggregate per-kernel counts for both directions
    #[must_use]
    pub fn summary(&self) -> TransferReport {
        TransferReport {
            host_to_device: count_by_kernel(&self.host_to_device),
            device_to_host: count_by_kernel(&self.device_to_host),
        }
    }
}

fn count_by_kernel(log: &[String]) -> Vec<KernelTransferCount> {
    let mut counts: Vec<KernelTransferCount> = Vec::new();
    for name in log {
        match counts.iter_mut().find(|entry| &entry.kernel == name) {
            Some(entry) => entry.count += 1,
            None => counts.push(KernelTransferCount {
                kernel: name.clone(),
                count: 1,
            }),
        }
    }
    counts
}
