//! System-wide readings: `/proc/uptime`, `/proc/stat`, `/proc/meminfo`.

use std::path::{Path, PathBuf};

use crate::collector::procfs::parser::{
    CpuTimes, ParseError, parse_cpu_lines, parse_dictionary, parse_kb_value, parse_uptime,
};
use crate::collector::procfs::{CollectError, Reading};
use crate::collector::traits::FileSystem;
use crate::models::{MemorySnapshot, UptimeSnapshot};
use crate::rates;

/// Reads global system files below a proc root.
#[derive(Debug, Clone)]
pub struct SystemCollector {
    proc_path: PathBuf,
}

impl SystemCollector {
    /// # Arguments
    /// * `proc_path` - Base path to proc filesystem (usually "/proc")
    pub fn new(proc_path: impl Into<PathBuf>) -> Self {
        Self {
            proc_path: proc_path.into(),
        }
    }

    fn read<F: FileSystem>(&self, fs: &F, name: &str) -> Result<String, CollectError> {
        let path = self.proc_path.join(name);
        read_file(fs, &path)
    }

    /// Reads `/proc/uptime`.
    pub fn uptime<F: FileSystem>(&self, fs: &F) -> Result<UptimeSnapshot, CollectError> {
        let content = self.read(fs, "uptime")?;
        let total_seconds = parse_uptime(&content)?;
        Ok(UptimeSnapshot::from_total_seconds(total_seconds))
    }

    /// Reads the `cpu`/`cpuN` rows of `/proc/stat`, one result per row.
    pub fn cpu_times<F: FileSystem>(
        &self,
        fs: &F,
    ) -> Result<Vec<Result<CpuTimes, ParseError>>, CollectError> {
        let content = self.read(fs, "stat")?;
        Ok(parse_cpu_lines(&content))
    }

    /// Reads `MemTotal` and `MemFree` from `/proc/meminfo`.
    ///
    /// Either value missing or malformed is left at 0.
    pub fn meminfo<F: FileSystem>(&self, fs: &F) -> Result<Reading<MemorySnapshot>, CollectError> {
        let content = self.read(fs, "meminfo")?;
        let fields = parse_dictionary(&content);

        let mut reading = Reading::new(MemorySnapshot::default());
        if let Some(raw) = fields.get("MemTotal")
            && let Some(kb) = reading.check(parse_kb_value(raw))
        {
            reading.value.total_kb = kb;
        }
        if let Some(raw) = fields.get("MemFree")
            && let Some(kb) = reading.check(parse_kb_value(raw))
        {
            reading.value.free_kb = kb;
        }
        reading.value.usage_percent =
            rates::memory_usage_percent(reading.value.total_kb, reading.value.free_kb);

        Ok(reading)
    }
}

pub(crate) fn read_file<F: FileSystem>(fs: &F, path: &Path) -> Result<String, CollectError> {
    fs.read_to_string(path).map_err(|source| CollectError::Read {
        path: path.display().to_string(),
        source,
    })
}
