//! Storage layer - SQLite
//!
//! Provides database management, migrations, and bulk copy for genesim.
//!
//! # Architecture
//!
//! - `database`: Connection pool management and initialization
//! - `migrations`: Schema versioning and automatic migration
//! - `copy`: Tab-delimited bulk ingestion that bypasses model validation
//!
//! # Usage
//!
//! ```ignore
//! use genesim_core::storage::Database;
//!
//! // Create an in-memory database for testing
//! let db = Database::in_memory().await?;
//! ```

pub mod copy;
pub mod database;
pub mod migrations;

// Re-export commonly used types
pub use copy::{CopyTarget, NULL_MARKER, copy_from, copy_writer};
pub use database::{Database, DatabaseConfig, MAX_BIND_PARAMETERS, default_database_path};
pub use migrations::{CURRENT_VERSION, MigrationStatus, migration_status, run_migrations};
