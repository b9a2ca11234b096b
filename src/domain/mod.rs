//! Domain layer for the user profiling service
//!
//! This module contains the core models, the scoring vocabulary and the
//! repository ports that adapters implement.

pub mod errors;
pub mod models;
pub mod ports;

pub use errors::{DomainError, DomainResult};
