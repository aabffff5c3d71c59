//! Host metrics collector for Linux.
//!
//! Reads the `/proc` process table through the [`FileSystem`] trait so the
//! whole pipeline can run against [`MockFs`] on any host.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │                        Collector                         │
//! │  ┌────────────────────┐   ┌───────────────────────────┐  │
//! │  │  ProcessCollector  │   │     SystemCollector       │  │
//! │  │  - /proc/[pid]/*   │   │  - /proc/uptime           │  │
//! │  └─────────┬──────────┘   │  - /proc/stat             │  │
//! │            │              │  - /proc/meminfo          │  │
//! │            │              └─────────────┬─────────────┘  │
//! │            └─────────────┬──────────────┘                │
//! │                   ┌──────▼──────┐        ┌───────────┐   │
//! │                   │  FileSystem │        │   Store   │◄──┼── sweep()
//! │                   └──────┬──────┘        └───────────┘   │
//! └──────────────────────────┼───────────────────────────────┘
//!                  ┌─────────┴─────────┐
//!           ┌──────▼──────┐     ┌──────▼──────┐
//!           │   RealFs    │     │   MockFs    │
//!           └─────────────┘     └─────────────┘
//! ```
//!
//! # Usage
//!
//! ```
//! use std::sync::Arc;
//! use hostpulse_core::Store;
//! use hostpulse_core::collector::{Collector, CollectorConfig, MockFs};
//!
//! let store = Arc::new(Store::new());
//! let collector = Collector::new(MockFs::typical_system(), store.clone(), CollectorConfig::default());
//! let report = collector.sweep();
//! assert_eq!(report.processes, 3);
//! assert_eq!(store.uptime().formatted(), "03:25:45");
//! ```

#[allow(clippy::module_inception)]
mod collector;
pub mod mock;
pub mod procfs;
pub mod traits;

pub use collector::{Collector, CollectorConfig, SweepReport, SweepTiming};
pub use mock::MockFs;
pub use procfs::{CollectError, ParseError};
pub use traits::{FileSystem, RealFs};
