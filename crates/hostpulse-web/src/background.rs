//! Background collection: sleep, sweep, repeat.

use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, error, info, warn};

use hostpulse_core::collector::{Collector, FileSystem};

/// Runs the collector forever.
///
/// Each sweep reads the filesystem synchronously, so it runs on the
/// blocking pool rather than a runtime worker.
pub async fn collect_loop<F: FileSystem + 'static>(collector: Arc<Collector<F>>) {
    let interval = collector.poll_interval();
    let mut sweep_count: u64 = 0;

    loop {
        tokio::time::sleep(interval).await;

        let collector_clone = collector.clone();
        let t0 = Instant::now();
        let result = tokio::task::spawn_blocking(move || collector_clone.sweep()).await;
        let elapsed = t0.elapsed();

        let report = match result {
            Ok(report) => report,
            Err(e) => {
                error!(error = %e, "sweep panicked in spawn_blocking");
                continue;
            }
        };

        sweep_count += 1;
        if sweep_count == 1 {
            info!(
                duration_ms = elapsed.as_millis() as u64,
                cpus = report.cpus,
                processes = report.processes,
                "first sweep completed"
            );
        } else {
            debug!(
                duration_ms = elapsed.as_millis() as u64,
                sweep_count,
                processes = report.processes,
                warnings = report.warnings,
                "sweep completed"
            );
        }

        if elapsed > interval / 2 {
            warn!(
                duration_ms = elapsed.as_millis() as u64,
                interval_ms = interval.as_millis() as u64,
                "sweep exceeded 50% of interval"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use hostpulse_core::Store;
    use hostpulse_core::collector::{CollectorConfig, MockFs};

    #[tokio::test]
    async fn test_loop_populates_store() {
        let store = Arc::new(Store::new());
        let config = CollectorConfig {
            poll_interval: Duration::from_millis(10),
            ..Default::default()
        };
        let collector = Arc::new(Collector::new(MockFs::typical_system(), store.clone(), config));

        let handle = tokio::spawn(collect_loop(collector));
        for _ in 0..200 {
            if !store.pids().is_empty() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        handle.abort();

        assert_eq!(store.pids(), vec![1, 1000, 1001]);
        assert_eq!(store.uptime().formatted(), "03:25:45");
    }
}
