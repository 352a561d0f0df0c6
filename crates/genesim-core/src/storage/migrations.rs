//! Database migrations
//!
//! This module manages SQLite schema migrations for genesim.
//! Migrations are versioned and applied automatically on database connection.

use chrono::NaiveDateTime;
use sqlx::SqlitePool;

/// Current schema version
pub const CURRENT_VERSION: i32 = 2;

/// SQL for creating the migrations tracking table
const CREATE_MIGRATIONS_TABLE: &str = r#"
    CREATE TABLE IF NOT EXISTS _migrations (
        version INTEGER PRIMARY KEY NOT NULL,
        applied_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
    );
"#;

/// Migration 1: Genes and directed similarities
const MIGRATION_V1: &str = r#"
    CREATE TABLE IF NOT EXISTS genes (
        id INTEGER PRIMARY KEY NOT NULL,
        systematic_name TEXT NOT NULL UNIQUE CHECK (length(systematic_name) <= 50),
        common_name TEXT CHECK (length(common_name) <= 50)
    );

    CREATE TABLE IF NOT EXISTS gene_similarities (
        id INTEGER PRIMARY KEY NOT NULL,
        gene1_id INTEGER NOT NULL REFERENCES genes(id) ON DELETE CASCADE,
        gene2_id INTEGER NOT NULL REFERENCES genes(id) ON DELETE CASCADE,
        metric TEXT NOT NULL CHECK (length(metric) <= 50),
        score REAL NOT NULL,
        UNIQUE (gene1_id, gene2_id, metric)
    );

    CREATE INDEX IF NOT EXISTS idx_gene_similarities_gene2_id ON gene_similarities(gene2_id);
"#;

/// Migration 2: Optional p-values and score ordering
const MIGRATION_V2: &str = r#"
    ALTER TABLE gene_similarities ADD COLUMN pvalue REAL;

    CREATE INDEX IF NOT EXISTS idx_gene_similarities_score ON gene_similarities(score);
"#;

/// Get the current schema version from the database
async fn get_current_version(pool: &SqlitePool) -> anyhow::Result<i32> {
    // Ensure migrations table exists
    sqlx::raw_sql(CREATE_MIGRATIONS_TABLE).execute(pool).await?;

    let (version,): (Option<i32>,) = sqlx::query_as("SELECT MAX(version) FROM _migrations")
        .fetch_one(pool)
        .await?;

    Ok(version.unwrap_or(0))
}

/// Record that a migration has been applied
async fn record_migration(pool: &SqlitePool, version: i32) -> anyhow::Result<()> {
    sqlx::query("INSERT INTO _migrations (version) VALUES (?)")
        .bind(version)
        .execute(pool)
        .await?;
    Ok(())
}

/// Run all pending migrations
pub async fn run_migrations(pool: &SqlitePool) -> anyhow::Result<()> {
    let current_version = get_current_version(pool).await?;

    tracing::info!(
        current_version = current_version,
        target_version = CURRENT_VERSION,
        "Checking database migrations"
    );

    if current_version >= CURRENT_VERSION {
        tracing::debug!("Database is up to date");
        return Ok(());
    }

    if current_version < 1 {
        tracing::info!("Applying migration v1: Genes and similarities");
        sqlx::raw_sql(MIGRATION_V1).execute(pool).await?;
        record_migration(pool, 1).await?;
    }

    if current_version < 2 {
        tracing::info!("Applying migration v2: Similarity p-values");
        sqlx::raw_sql(MIGRATION_V2).execute(pool).await?;
        record_migration(pool, 2).await?;
    }

    tracing::info!("Database migrations completed");
    Ok(())
}

/// Get migration status information
pub async fn migration_status(pool: &SqlitePool) -> anyhow::Result<MigrationStatus> {
    let current_version = get_current_version(pool).await?;
    let (last_applied_at,): (Option<NaiveDateTime>,) =
        sqlx::query_as("SELECT MAX(applied_at) FROM _migrations")
            .fetch_one(pool)
            .await?;

    Ok(MigrationStatus {
        current_version,
        target_version: CURRENT_VERSION,
        needs_migration: current_version < CURRENT_VERSION,
        last_applied_at,
    })
}

/// Migration status information
#[derive(Debug, Clone)]
pub struct MigrationStatus {
    /// Current schema version in the database
    pub current_version: i32,
    /// Target schema version (latest)
    pub target_version: i32,
    /// Whether migrations need to be run
    pub needs_migration: bool,
    /// When the most recent migration was applied
    pub last_applied_at: Option<NaiveDateTime>,
}
