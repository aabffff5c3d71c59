//! hostpulse-core: sampling and storage half of the hostpulse agent.
//!
//! Provides:
//! - `collector`: periodic sweep over the kernel's `/proc` accounting files
//! - `models`: point-in-time snapshot types (uptime, memory, CPU, process)
//! - `rates`: percentage derivation from cumulative kernel counters
//! - `store`: per-category locked snapshot store shared with HTTP readers

pub mod collector;
pub mod models;
pub mod rates;
pub mod store;

pub use store::Store;

/// Crate version, reported by the binary at startup.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
