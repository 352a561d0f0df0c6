//! Genesim Core Library
//!
//! This crate provides the core functionality for genesim, a benchmark of
//! bulk-loading strategies for gene similarity data:
//! - Models (genes and directed, per-metric similarities)
//! - Storage (SQLite, versioned migrations, bulk copy)
//! - Similarity sources (table-files and synthetic matrices)
//! - Loaders (baseline, bulk-create, copy-from, copy-from-file) and timing reports
//! - Configuration

pub mod config;
pub mod error;
pub mod loader;
pub mod matrix;
pub mod models;
pub mod storage;

pub use error::{Error, Result};

/// Re-export commonly used types
pub mod prelude {
    pub use crate::config::Config;
    pub use crate::error::{Error, Result};
    pub use crate::loader::{LoadReport, LoadRequest, LoadStrategy, StrategyKind};
    pub use crate::storage::Database;
}
