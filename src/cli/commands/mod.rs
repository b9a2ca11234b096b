//! CLI command implementations.

pub mod area;
pub mod compat;
pub mod init;
pub mod profile;
pub mod session;
pub mod stats;
