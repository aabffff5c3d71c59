//! Percentage derivation for every snapshot category.
//!
//! All collector math lives here so the sweep code only moves data around.
//! Every function returns a value clamped to `[0, 100]`.

use std::time::Duration;

use crate::models::CpuSnapshot;

/// Compute u64 delta, returning `None` on counter regression.
pub fn du64(curr: u64, prev: u64) -> Option<u64> {
    curr.checked_sub(prev)
}

/// Clamps a raw percentage into `[0, 100]`; NaN becomes 0.
pub fn clamp_percent(value: f64) -> f32 {
    if value.is_nan() {
        return 0.0;
    }
    value.clamp(0.0, 100.0) as f32
}

/// Busy share of a CPU row since `prev`.
///
/// `active = Δtotal - Δidle`, `usage = 100 * active / Δtotal`.
/// Returns 0 without a previous sample, and when the total counter did not
/// advance (no elapsed jiffies or a counter reset).
pub fn cpu_usage_percent(prev: Option<&CpuSnapshot>, idle: u64, total: u64) -> f32 {
    let Some(prev) = prev else {
        return 0.0;
    };
    let total_delta = match du64(total, prev.total_jiffies) {
        Some(d) if d > 0 => d,
        _ => return 0.0,
    };
    let idle_delta = idle.saturating_sub(prev.idle_jiffies);
    let active = total_delta.saturating_sub(idle_delta);
    clamp_percent(100.0 * active as f64 / total_delta as f64)
}

/// Used share of system memory. Zero when the total is unknown.
pub fn memory_usage_percent(total_kb: u64, free_kb: u64) -> f32 {
    if total_kb == 0 {
        return 0.0;
    }
    clamp_percent(100.0 - 100.0 * free_kb as f64 / total_kb as f64)
}

/// Share of system memory attributed to one process.
pub fn process_memory_percent(mem_kb: u64, system_total_kb: u64) -> f32 {
    if system_total_kb == 0 {
        return 0.0;
    }
    clamp_percent(100.0 * mem_kb as f64 / system_total_kb as f64)
}

/// CPU share of a process over one poll interval.
///
/// Scheduled seconds are `(utime + stime) / clk_tck`; the result is that
/// figure relative to the interval length.
pub fn process_cpu_percent(utime: u64, stime: u64, clk_tck: u64, poll_interval: Duration) -> f32 {
    let interval_secs = poll_interval.as_secs_f64();
    if clk_tck == 0 || interval_secs <= 0.0 {
        return 0.0;
    }
    let scheduled_secs = utime.saturating_add(stime) as f64 / clk_tck as f64;
    clamp_percent(100.0 * scheduled_secs / interval_secs)
}
