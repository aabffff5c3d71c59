//! Latest-sample store shared between the collector and HTTP sessions.
//!
//! Each category sits behind its own mutex so a reader of one category never
//! waits on the collector writing another. Writers replace a whole category
//! in one locked step; readers always get owned copies.
//!
//! There is no cross-category consistency: a reader can see uptime from one
//! sweep and CPU rows from the previous one while a sweep is in flight.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::models::{CpuSnapshot, MemorySnapshot, ProcessSnapshot, UptimeSnapshot};

/// Per-category locked snapshot store.
#[derive(Debug, Default)]
pub struct Store {
    uptime: Mutex<UptimeSnapshot>,
    memory: Mutex<MemorySnapshot>,
    cpus: Mutex<HashMap<String, CpuSnapshot>>,
    processes: Mutex<BTreeMap<i32, ProcessSnapshot>>,
}

/// A panicked writer must not wedge readers; the data is plain values.
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Aggregate row first, then cores by numeric index, then anything else by id.
fn cpu_order(a: &CpuSnapshot, b: &CpuSnapshot) -> std::cmp::Ordering {
    let rank = |s: &CpuSnapshot| match (s.id.as_str(), s.core_index()) {
        ("cpu", _) => (0, 0),
        (_, Some(idx)) => (1, idx),
        _ => (2, 0),
    };
    rank(a).cmp(&rank(b)).then_with(|| a.id.cmp(&b.id))
}

impl Store {
    pub fn new() -> Self {
        Self::default()
    }

    // ------------------------------------------------------------------
    // Uptime
    // ------------------------------------------------------------------

    pub fn uptime(&self) -> UptimeSnapshot {
        lock(&self.uptime).clone()
    }

    pub fn set_uptime(&self, uptime: UptimeSnapshot) {
        *lock(&self.uptime) = uptime;
    }

    // ------------------------------------------------------------------
    // Memory
    // ------------------------------------------------------------------

    pub fn memory(&self) -> MemorySnapshot {
        lock(&self.memory).clone()
    }

    pub fn set_memory(&self, memory: MemorySnapshot) {
        *lock(&self.memory) = memory;
    }

    // ------------------------------------------------------------------
    // CPU rows, keyed by id
    // ------------------------------------------------------------------

    pub fn cpu_ids(&self) -> Vec<String> {
        self.cpu_snapshots().into_iter().map(|s| s.id).collect()
    }

    pub fn cpu_snapshots(&self) -> Vec<CpuSnapshot> {
        let mut snapshots: Vec<CpuSnapshot> = lock(&self.cpus).values().cloned().collect();
        snapshots.sort_by(cpu_order);
        snapshots
    }

    pub fn cpu_snapshot(&self, id: &str) -> Option<CpuSnapshot> {
        lock(&self.cpus).get(id).cloned()
    }

    /// Replaces every CPU row with `snapshots`.
    ///
    /// Duplicate ids keep the last entry.
    pub fn store_cpu_snapshots(&self, snapshots: Vec<CpuSnapshot>) {
        let mut cpus = lock(&self.cpus);
        cpus.clear();
        for snapshot in snapshots {
            cpus.insert(snapshot.id.clone(), snapshot);
        }
    }

    // ------------------------------------------------------------------
    // Processes, keyed by pid
    // ------------------------------------------------------------------

    pub fn pids(&self) -> Vec<i32> {
        lock(&self.processes).keys().copied().collect()
    }

    pub fn process_snapshots(&self) -> Vec<ProcessSnapshot> {
        lock(&self.processes).values().cloned().collect()
    }

    pub fn process_snapshot(&self, pid: i32) -> Option<ProcessSnapshot> {
        lock(&self.processes).get(&pid).cloned()
    }

    /// Replaces every process entry with `snapshots`.
    ///
    /// Processes absent from `snapshots` disappear from the store.
    pub fn store_process_snapshots(&self, snapshots: Vec<ProcessSnapshot>) {
        let mut processes = lock(&self.processes);
        processes.clear();
        for snapshot in snapshots {
            processes.insert(snapshot.pid, snapshot);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::thread;

    fn cpu(id: &str, usage: f32) -> CpuSnapshot {
        CpuSnapshot {
            id: id.into(),
            usage_percent: usage,
            ..Default::default()
        }
    }

    fn process(pid: i32, name: &str) -> ProcessSnapshot {
        ProcessSnapshot {
            pid,
            name: name.into(),
            ..Default::default()
        }
    }

    #[test]
    fn test_empty_store_defaults() {
        let store = Store::new();
        assert_eq!(store.uptime(), UptimeSnapshot::default());
        assert_eq!(store.memory(), MemorySnapshot::default());
        assert!(store.cpu_snapshots().is_empty());
        assert!(store.pids().is_empty());
        assert_eq!(store.cpu_snapshot("cpu"), None);
    }

    #[test]
    fn test_set_uptime_and_memory() {
        let store = Store::new();
        store.set_uptime(UptimeSnapshot::from_total_seconds(61.0));
        store.set_memory(MemorySnapshot {
            total_kb: 100,
            free_kb: 25,
            usage_percent: 75.0,
        });
        assert_eq!(store.uptime().minutes, 1);
        assert_eq!(store.memory().free_kb, 25);
    }

    #[test]
    fn test_cpu_ordering() {
        let store = Store::new();
        store.store_cpu_snapshots(vec![
            cpu("cpu10", 1.0),
            cpu("cpu2", 2.0),
            cpu("cpu", 3.0),
            cpu("cpu0", 4.0),
        ]);
        assert_eq!(store.cpu_ids(), vec!["cpu", "cpu0", "cpu2", "cpu10"]);
    }

    #[test]
    fn test_store_cpu_replaces_whole_category() {
        let store = Store::new();
        store.store_cpu_snapshots(vec![cpu("cpu", 1.0), cpu("cpu0", 1.0), cpu("cpu1", 1.0)]);
        store.store_cpu_snapshots(vec![cpu("cpu", 2.0), cpu("cpu0", 2.0)]);

        assert_eq!(store.cpu_ids(), vec!["cpu", "cpu0"]);
        assert_eq!(store.cpu_snapshot("cpu1"), None);
        assert_eq!(store.cpu_snapshot("cpu0").map(|c| c.usage_percent), Some(2.0));
    }

    #[test]
    fn test_store_processes_drops_exited() {
        let store = Store::new();
        store.store_process_snapshots(vec![process(1, "init"), process(42, "bash")]);
        store.store_process_snapshots(vec![process(1, "init"), process(7, "sshd")]);

        assert_eq!(store.pids(), vec![1, 7]);
        assert_eq!(store.process_snapshot(42), None);
        assert_eq!(
            store.process_snapshot(7).map(|p| p.name),
            Some("sshd".to_string())
        );
    }

    #[test]
    fn test_duplicate_ids_keep_last() {
        let store = Store::new();
        store.store_cpu_snapshots(vec![cpu("cpu", 1.0), cpu("cpu", 9.0)]);
        assert_eq!(store.cpu_snapshots().len(), 1);
        assert_eq!(store.cpu_snapshot("cpu").map(|c| c.usage_percent), Some(9.0));
    }

    #[test]
    fn test_concurrent_replace_is_atomic_per_category() {
        // Every generation writes rows that all carry the same usage value and
        // a generation-specific row count; readers must never see a mix.
        let store = Arc::new(Store::new());
        let done = Arc::new(AtomicBool::new(false));

        let writer = {
            let store = store.clone();
            let done = done.clone();
            thread::spawn(move || {
                for generation in 1..=500u32 {
                    let rows = 2 + (generation % 6) as usize;
                    let snapshots = (0..rows)
                        .map(|i| cpu(&format!("cpu{i}"), generation as f32))
                        .collect();
                    store.store_cpu_snapshots(snapshots);
                }
                done.store(true, Ordering::SeqCst);
            })
        };

        let readers: Vec<_> = (0..4)
            .map(|_| {
                let store = store.clone();
                let done = done.clone();
                thread::spawn(move || {
                    while !done.load(Ordering::SeqCst) {
                        let rows = store.cpu_snapshots();
                        if let Some(first) = rows.first() {
                            let generation = first.usage_percent as u32;
                            assert!(rows.iter().all(|r| r.usage_percent == first.usage_percent));
                            assert_eq!(rows.len(), 2 + (generation % 6) as usize);
                        }
                    }
                })
            })
            .collect();

        writer.join().unwrap();
        for reader in readers {
            reader.join().unwrap();
        }
        assert_eq!(store.cpu_snapshots().len(), 2 + (500 % 6) as usize);
    }

    #[test]
    fn test_categories_lock_independently() {
        let store = Arc::new(Store::new());
        let guard = lock(&store.cpus);

        // Memory and uptime stay reachable while the CPU lock is held.
        let other = store.clone();
        let handle = thread::spawn(move || {
            other.set_memory(MemorySnapshot {
                total_kb: 1,
                free_kb: 1,
                usage_percent: 0.0,
            });
            other.uptime()
        });
        let uptime = handle.join().unwrap();
        drop(guard);

        assert_eq!(uptime, UptimeSnapshot::default());
        assert_eq!(store.memory().total_kb, 1);
    }
}
