//! Characterizer front: the hook surface driven by the host simulator
//!
//! One [`Characterizer`] lives for the whole simulated process. It owns
//! the two pieces of state that outlive a work-group: the mutex-guarded
//! kernel aggregate and the process-lifetime transfer log.
//!
//! Work-group accumulation is lock-free by ownership: every concurrently
//! executing context obtains its own [`WorkGroupTracker`] from
//! [`begin_work_group`] and drives the per-item hooks on it directly.
//! [`complete_work_group`] is the single serialization point: it takes the
//! aggregate lock once and folds the finished tracker in. The host
//! simulator guarantees all completions are merged before
//! [`kernel_end`] runs.
//!
//! [`begin_work_group`]: Characterizer::begin_work_group
//! [`complete_work_group`]: Characterizer::complete_work_group
//! [`kernel_end`]: Characterizer::kernel_end

use std::sync::Mutex;

use crate::aggregate::KernelAggregate;
use crate::error::{CaracterizarError, Result};
use crate::summary::{summarize, KernelReport};
use crate::transfer::{TransferLog, TransferReport};
use crate::workgroup::WorkGroupTracker;

/// Kernel lifecycle driver and owner of all cross-work-group state.
#[derive(Debug, Default)]
pub struct Characterizer {
    aggregate: Mutex<KernelAggregate>,
    transfers: Mutex<TransferLog>,
}

impl Characterizer {
    /// Create an idle characterizer
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A kernel invocation began: reset all per-kernel history, stamp the
    /// kernel name, and backfill pending host-to-device transfer entries
    pub fn kernel_begin(&self, name: &str) {
        self.aggregate.lock().unwrap().reset(name);
        self.transfers.lock().unwrap().kernel_named(name);
    }

    /// The kernel invocation completed: summarize the merged aggregate,
    /// reset it, and return the published report.
    ///
    /// # Errors
    ///
    /// [`CaracterizarError::NoActiveKernel`] when no invocation is in
    /// flight.
    pub fn kernel_end(&self) -> Result<KernelReport> {
        let mut aggregate = self.aggregate.lock().unwrap();
        if aggregate.kernel_name.is_none() {
            return Err(CaracterizarError::NoActiveKernel);
        }
        let report = summarize(&aggregate);
        aggregate.clear();
        Ok(report)
    }

    /// Hand out a fresh accumulator for one work-group's execution context
    #[must_use]
    pub fn begin_work_group(&self) -> WorkGroupTracker {
        WorkGroupTracker::new()
    }

    /// A work-group finished: fold its tracker into the kernel aggregate.
    /// This is the only synchronization point in the pipeline; the
    /// critical section is bounded by the size of one tracker.
    pub fn complete_work_group(&self, tracker: WorkGroupTracker) {
        self.aggregate.lock().unwrap().merge(tracker);
    }

    /// Host-side read of device memory (device-to-host copy)
    pub fn host_memory_load(&self, _address: u64, _size: u64) {
        self.transfers.lock().unwrap().host_load();
    }

    /// Host-side write of device memory (host-to-device copy)
    pub fn host_memory_store(&self, _address: u64, _size: u64) {
        self.transfers.lock().unwrap().host_store();
    }

    /// Aggregate per-kernel transfer counts over the whole run
    #[must_use]
    pub fn transfer_summary(&self) -> TransferReport {
        self.transfers.lock().unwrap().summary()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::{BlockId, InstructionEvent};

    #[test]
    fn test_kernel_end_without_begin_is_an_error() {
        let characterizer = Characterizer::new();
        assert!(matches!(
            characterizer.kernel_end(),
            Err(CaracterizarError::NoActiveKernel)
        ));
    }

    #[test]
    fn test_kernel_end_resets_to_idle() {
        let characterizer = Characterizer::new();
        characterizer.kernel_begin("k");
        characterizer.kernel_end().unwrap();
        assert!(matches!(
            characterizer.kernel_end(),
            Err(CaracterizarError::NoActiveKernel)
        ));
    }

    #[test]
    fn test_second_invocation_starts_clean() {
        let characterizer = Characterizer::new();

        characterizer.kernel_begin("first");
        let mut tracker = characterizer.begin_work_group();
        tracker.work_item_begin();
        tracker
            .instruction(&InstructionEvent::new("add", BlockId(0)))
            .unwrap();
        tracker.work_item_complete();
        characterizer.complete_work_group(tracker);
        let first = characterizer.kernel_end().unwrap();
        assert_eq!(first.total_instruction_count, 1);

        characterizer.kernel_begin("second");
        let second = characterizer.kernel_end().unwrap();
        assert_eq!(second.kernel_name, "second");
        assert_eq!(second.total_instruction_count, 0);
    }

    #[test]
    fn test_concurrent_work_group_completion() {
        use std::sync::Arc;

        let characterizer = Arc::new(Characterizer::new());
        characterizer.kernel_begin("parallel");

        let mut handles = Vec::new();
        for _ in 0..8 {
            let shared = Arc::clone(&characterizer);
            handles.push(std::thread::spawn(move || {
                let mut tracker = shared.begin_work_group();
                for _ in 0..4 {
                    tracker.work_item_begin();
                    for _ in 0..10 {
                        tracker
                            .instruction(&InstructionEvent::new("fadd", BlockId(0)))
                            .unwrap();
                    }
                    tracker.work_item_complete();
                }
                shared.complete_work_group(tracker);
            }));
        }
        for handle in handles {
            handle.join().unwrap();
        }

        let report = characterizer.kernel_end().unwrap();
        assert_eq!(report.work_items, 32);
        assert_eq!(report.total_instruction_count, 320);
        assert_eq!(report.ipwi_min, 10);
        assert_eq!(report.ipwi_max, 10);
    }

    #[test]
    fn test_transfer_hooks_feed_the_log() {
        let characterizer = Characterizer::new();
        characterizer.host_memory_store(0x1000, 64);
        characterizer.kernel_begin("k");
        characterizer.host_memory_load(0x1000, 64);

        let report = characterizer.transfer_summary();
        assert_eq!(report.host_to_device[0].kernel, "k");
        assert_eq!(report.device_to_host[0].kernel, "k");
    }
}
