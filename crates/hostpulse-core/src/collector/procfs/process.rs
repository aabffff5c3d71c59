//! Per-process readings from `/proc/[pid]/`.

use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::collector::procfs::parser::{
    ParseError, parse_cmdline, parse_dictionary, parse_field, parse_kb_value,
    parse_proc_stat_times,
};
use crate::collector::procfs::{CollectError, Reading};
use crate::collector::traits::FileSystem;
use crate::models::ProcessSnapshot;
use crate::rates;

/// Collects process information from `/proc/[pid]/` files.
#[derive(Debug, Clone)]
pub struct ProcessCollector {
    proc_path: PathBuf,
    /// Clock ticks per second (USER_HZ).
    clk_tck: u64,
    poll_interval: Duration,
}

impl ProcessCollector {
    /// # Arguments
    /// * `proc_path` - Base path to proc filesystem (usually "/proc")
    /// * `clk_tck` - Kernel clock ticks per second, 100 on practically every Linux build
    /// * `poll_interval` - Sweep period the CPU rate is expressed against
    pub fn new(proc_path: impl Into<PathBuf>, clk_tck: u64, poll_interval: Duration) -> Self {
        Self {
            proc_path: proc_path.into(),
            clk_tck,
            poll_interval,
        }
    }

    /// Lists live pids, ascending.
    ///
    /// An entry counts only if its name is all digits and its `status` file
    /// is still there, which filters out processes already being torn down.
    pub fn discover_pids<F: FileSystem>(&self, fs: &F) -> Result<Vec<i32>, CollectError> {
        let entries = fs
            .read_dir(&self.proc_path)
            .map_err(|source| CollectError::Read {
                path: self.proc_path.display().to_string(),
                source,
            })?;

        let mut pids: Vec<i32> = entries
            .iter()
            .filter_map(|entry| {
                let name = entry.file_name()?.to_str()?;
                if name.is_empty() || !name.bytes().all(|b| b.is_ascii_digit()) {
                    return None;
                }
                let pid = name.parse().ok()?;
                fs.exists(&entry.join("status")).then_some(pid)
            })
            .collect();
        pids.sort_unstable();
        Ok(pids)
    }

    /// Collects one process.
    ///
    /// Fails with [`CollectError::ProcessGone`] only when `status` is
    /// unreadable. Missing `stat` or `cmdline` leave the matching fields at
    /// their defaults; malformed fields are reported in `issues`.
    pub fn collect_process<F: FileSystem>(
        &self,
        fs: &F,
        pid: i32,
        system_total_kb: u64,
    ) -> Result<Reading<ProcessSnapshot>, CollectError> {
        let proc_dir = self.proc_path.join(pid.to_string());

        let status_content = fs
            .read_to_string(&proc_dir.join("status"))
            .map_err(|_| CollectError::ProcessGone(pid))?;

        let mut reading = Reading::new(ProcessSnapshot {
            pid,
            ..Default::default()
        });
        self.read_status(&status_content, system_total_kb, &mut reading);
        self.read_stat(fs, &proc_dir, &mut reading);
        if let Ok(cmdline) = fs.read_to_string(&proc_dir.join("cmdline")) {
            reading.value.command = parse_cmdline(&cmdline);
        }

        Ok(reading)
    }

    fn read_status(
        &self,
        content: &str,
        system_total_kb: u64,
        reading: &mut Reading<ProcessSnapshot>,
    ) {
        let fields = parse_dictionary(content);

        if let Some(Some(pid)) = reading.check(parse_field::<i32>(&fields, "Pid")) {
            reading.value.pid = pid;
        }
        if let Some(Some(ppid)) = reading.check(parse_field::<i32>(&fields, "PPid")) {
            reading.value.ppid = ppid;
        }
        if let Some(name) = fields.get("Name") {
            reading.value.name = name.clone();
        }
        if let Some(raw) = fields.get("VmSize")
            && let Some(kb) = reading.check(parse_kb_value(raw))
        {
            reading.value.mem_usage_kb = kb;
            reading.value.mem_usage_percent = rates::process_memory_percent(kb, system_total_kb);
        }
    }

    fn read_stat<F: FileSystem>(
        &self,
        fs: &F,
        proc_dir: &Path,
        reading: &mut Reading<ProcessSnapshot>,
    ) {
        let Ok(content) = fs.read_to_string(&proc_dir.join("stat")) else {
            return;
        };
        if let Some(times) = reading.check(parse_proc_stat_times(&content)) {
            reading.value.utime = times.utime;
            reading.value.stime = times.stime;
            reading.value.cpu_usage_percent = rates::process_cpu_percent(
                times.utime,
                times.stime,
                self.clk_tck,
                self.poll_interval,
            );
        }
    }

    /// Collects every live process.
    ///
    /// Processes that disappear during collection are silently skipped.
    /// Field-level failures come back in `issues`, prefixed with the pid.
    pub fn collect_all_processes<F: FileSystem>(
        &self,
        fs: &F,
        system_total_kb: u64,
    ) -> Result<Reading<Vec<ProcessSnapshot>>, CollectError> {
        let pids = self.discover_pids(fs)?;
        let mut all = Reading::new(Vec::with_capacity(pids.len()));

        for pid in pids {
            match self.collect_process(fs, pid, system_total_kb) {
                Ok(reading) => {
                    all.issues.extend(
                        reading
                            .issues
                            .into_iter()
                            .map(|e| ParseError::new(format!("pid {}: {}", pid, e.message))),
                    );
                    all.value.push(reading.value);
                }
                Err(CollectError::ProcessGone(_)) => continue,
                Err(e) => all
                    .issues
                    .push(ParseError::new(format!("pid {}: {}", pid, e))),
            }
        }

        Ok(all)
    }
}
