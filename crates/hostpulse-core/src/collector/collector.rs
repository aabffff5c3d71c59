//! Sweep orchestration: reads every category in order and publishes it to the store.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::{debug, warn};

use crate::collector::procfs::{ProcessCollector, SystemCollector};
use crate::collector::traits::FileSystem;
use crate::models::CpuSnapshot;
use crate::rates;
use crate::store::Store;

/// Collector settings.
#[derive(Debug, Clone)]
pub struct CollectorConfig {
    /// Root of the process table, usually `/proc`.
    pub proc_path: PathBuf,
    /// Time between sweeps; also the window process CPU% is expressed over.
    pub poll_interval: Duration,
    /// Kernel clock ticks per second.
    pub clk_tck: u64,
}

impl Default for CollectorConfig {
    fn default() -> Self {
        Self {
            proc_path: PathBuf::from("/proc"),
            poll_interval: Duration::from_millis(1000),
            clk_tck: 100,
        }
    }
}

/// Timing information for each sweep phase.
#[derive(Debug, Clone, Default)]
pub struct SweepTiming {
    pub total: Duration,
    pub uptime: Duration,
    pub cpu: Duration,
    pub meminfo: Duration,
    pub processes: Duration,
}

/// Outcome of one sweep.
#[derive(Debug, Clone, Default)]
pub struct SweepReport {
    pub timing: SweepTiming,
    /// CPU rows written to the store.
    pub cpus: usize,
    /// Malformed CPU rows dropped.
    pub cpu_rows_skipped: usize,
    /// Processes written to the store.
    pub processes: usize,
    /// Per-entry parse failures.
    pub warnings: usize,
    /// Phases whose source file could not be read; their categories kept the
    /// previous generation.
    pub failed_phases: Vec<&'static str>,
}

/// Reads the process table and publishes derived snapshots into a [`Store`].
///
/// Owns the filesystem; the system and process readers borrow it per sweep.
pub struct Collector<F: FileSystem> {
    fs: F,
    store: Arc<Store>,
    config: CollectorConfig,
    system: SystemCollector,
    process: ProcessCollector,
}

impl<F: FileSystem> Collector<F> {
    pub fn new(fs: F, store: Arc<Store>, config: CollectorConfig) -> Self {
        let system = SystemCollector::new(&config.proc_path);
        let process =
            ProcessCollector::new(&config.proc_path, config.clk_tck, config.poll_interval);
        Self {
            fs,
            store,
            config,
            system,
            process,
        }
    }

    pub fn config(&self) -> &CollectorConfig {
        &self.config
    }

    pub fn poll_interval(&self) -> Duration {
        self.config.poll_interval
    }

    pub fn store(&self) -> &Arc<Store> {
        &self.store
    }

    /// Mutable access to the filesystem, used to stage changes between sweeps.
    pub fn fs_mut(&mut self) -> &mut F {
        &mut self.fs
    }

    /// Performs one sweep: uptime, CPU rows, meminfo, processes.
    ///
    /// Malformed entries are logged and skipped. A phase whose file cannot be
    /// read is logged and its category is left untouched.
    pub fn sweep(&self) -> SweepReport {
        let total_start = Instant::now();
        let mut report = SweepReport::default();

        // Uptime
        let start = Instant::now();
        match self.system.uptime(&self.fs) {
            Ok(uptime) => self.store.set_uptime(uptime),
            Err(e) => {
                warn!(error = %e, "uptime phase failed");
                report.failed_phases.push("uptime");
            }
        }
        report.timing.uptime = start.elapsed();

        // CPU rows, diffed against the previous generation
        let start = Instant::now();
        self.sweep_cpus(&mut report);
        report.timing.cpu = start.elapsed();

        // System memory
        let start = Instant::now();
        match self.system.meminfo(&self.fs) {
            Ok(reading) => {
                for issue in &reading.issues {
                    warn!(error = %issue, "malformed meminfo field");
                }
                report.warnings += reading.issues.len();
                self.store.set_memory(reading.value);
            }
            Err(e) => {
                warn!(error = %e, "meminfo phase failed");
                report.failed_phases.push("meminfo");
            }
        }
        report.timing.meminfo = start.elapsed();

        // Processes, relative to the memory total just published
        let start = Instant::now();
        let system_total_kb = self.store.memory().total_kb;
        match self.process.collect_all_processes(&self.fs, system_total_kb) {
            Ok(reading) => {
                for issue in &reading.issues {
                    warn!(error = %issue, "malformed process field");
                }
                report.warnings += reading.issues.len();
                report.processes = reading.value.len();
                self.store.store_process_snapshots(reading.value);
            }
            Err(e) => {
                warn!(error = %e, "process phase failed");
                report.failed_phases.push("processes");
            }
        }
        report.timing.processes = start.elapsed();

        report.timing.total = total_start.elapsed();
        debug!(
            cpus = report.cpus,
            processes = report.processes,
            warnings = report.warnings,
            elapsed_us = report.timing.total.as_micros() as u64,
            "sweep complete"
        );
        report
    }

    fn sweep_cpus(&self, report: &mut SweepReport) {
        let rows = match self.system.cpu_times(&self.fs) {
            Ok(rows) => rows,
            Err(e) => {
                warn!(error = %e, "cpu phase failed");
                report.failed_phases.push("cpu");
                return;
            }
        };

        let mut snapshots = Vec::with_capacity(rows.len());
        for row in rows {
            match row {
                Ok(times) => {
                    let prev = self.store.cpu_snapshot(&times.id);
                    let usage_percent =
                        rates::cpu_usage_percent(prev.as_ref(), times.idle, times.total);
                    snapshots.push(CpuSnapshot {
                        id: times.id,
                        idle_jiffies: times.idle,
                        total_jiffies: times.total,
                        usage_percent,
                    });
                }
                Err(e) => {
                    warn!(error = %e, "skipping malformed cpu row");
                    report.cpu_rows_skipped += 1;
                    report.warnings += 1;
                }
            }
        }

        report.cpus = snapshots.len();
        self.store.store_cpu_snapshots(snapshots);
    }
}
