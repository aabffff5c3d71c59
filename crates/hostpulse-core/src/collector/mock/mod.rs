//! In-memory `/proc` for tests and non-Linux hosts.

mod filesystem;
mod scenarios;

pub use filesystem::MockFs;
#[cfg(test)]
pub(crate) use scenarios::stat_line;
