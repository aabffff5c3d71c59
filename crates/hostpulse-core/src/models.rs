//! Snapshot types held by the [`Store`](crate::Store).
//!
//! Each type is recomputed wholesale on every collector sweep; nothing here
//! carries history beyond the single previous CPU sample kept in the store.

use serde::{Deserialize, Serialize};

/// System uptime from `/proc/uptime`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UptimeSnapshot {
    /// Seconds since boot, including the fractional part.
    pub total_seconds: f64,
    pub hours: u32,
    pub minutes: u8,
    pub seconds: u8,
}

impl UptimeSnapshot {
    /// Builds the hours/minutes/seconds breakdown from the raw uptime value.
    ///
    /// The fractional part only survives in `total_seconds`.
    pub fn from_total_seconds(total_seconds: f64) -> Self {
        let whole = if total_seconds.is_finite() && total_seconds > 0.0 {
            total_seconds as u64
        } else {
            0
        };
        Self {
            total_seconds,
            hours: (whole / 3600).min(u32::MAX as u64) as u32,
            minutes: ((whole % 3600) / 60) as u8,
            seconds: (whole % 60) as u8,
        }
    }

    /// Renders the breakdown as `HH:MM:SS`.
    pub fn formatted(&self) -> String {
        format!("{:02}:{:02}:{:02}", self.hours, self.minutes, self.seconds)
    }
}

/// System memory from `/proc/meminfo`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MemorySnapshot {
    pub total_kb: u64,
    pub free_kb: u64,
    /// Used share of total memory, `[0, 100]`. Zero when `total_kb` is unknown.
    pub usage_percent: f32,
}

/// One `cpu`/`cpuN` row of `/proc/stat`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CpuSnapshot {
    /// Row identifier: `"cpu"` for the aggregate, `"cpu0"`, `"cpu1"`, ... per core.
    pub id: String,
    /// Cumulative idle jiffies since boot.
    pub idle_jiffies: u64,
    /// Cumulative jiffies across the first seven columns.
    pub total_jiffies: u64,
    /// Busy share since the previous sample of the same row, `[0, 100]`.
    pub usage_percent: f32,
}

impl CpuSnapshot {
    /// Core index for `cpuN` rows, `None` for the aggregate row.
    pub fn core_index(&self) -> Option<u32> {
        self.id.strip_prefix("cpu").and_then(|n| n.parse().ok())
    }
}

/// One process from `/proc/[pid]/{status,stat,cmdline}`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProcessSnapshot {
    pub pid: i32,
    pub ppid: i32,
    pub name: String,
    pub command: String,
    /// `VmSize` in kB.
    pub mem_usage_kb: u64,
    pub mem_usage_percent: f32,
    /// Cumulative user-mode clock ticks.
    pub utime: u64,
    /// Cumulative kernel-mode clock ticks.
    pub stime: u64,
    pub cpu_usage_percent: f32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_uptime_breakdown() {
        let uptime = UptimeSnapshot::from_total_seconds(3723.75);
        assert_eq!(uptime.hours, 1);
        assert_eq!(uptime.minutes, 2);
        assert_eq!(uptime.seconds, 3);
        assert!((uptime.total_seconds - 3723.75).abs() < f64::EPSILON);
        assert_eq!(uptime.formatted(), "01:02:03");
    }

    #[test]
    fn test_uptime_long_running_host() {
        // 5 days, 0h 0m 59s
        let uptime = UptimeSnapshot::from_total_seconds(432_059.0);
        assert_eq!(uptime.hours, 120);
        assert_eq!(uptime.minutes, 0);
        assert_eq!(uptime.seconds, 59);
        assert_eq!(uptime.formatted(), "120:00:59");
    }

    #[test]
    fn test_uptime_negative_or_nan_is_zero() {
        assert_eq!(UptimeSnapshot::from_total_seconds(-5.0).formatted(), "00:00:00");
        assert_eq!(UptimeSnapshot::from_total_seconds(f64::NAN).hours, 0);
    }

    #[test]
    fn test_cpu_core_index() {
        let aggregate = CpuSnapshot {
            id: "cpu".into(),
            ..Default::default()
        };
        let core = CpuSnapshot {
            id: "cpu12".into(),
            ..Default::default()
        };
        assert_eq!(aggregate.core_index(), None);
        assert_eq!(core.core_index(), Some(12));
    }
}
