//! Genes
//!
//! Provides the gene store: unique systematic names with an optional common
//! name, plus the per-gene ranking of similarities.

use crate::models::similarity::{Similarity, row_to_similarity};
use crate::storage::{Database, MAX_BIND_PARAMETERS};
use crate::Result;
use serde::{Deserialize, Serialize};
use sqlx::{QueryBuilder, Row, Sqlite};
use std::collections::HashMap;
use tracing::info;

/// Columns bound per row by `bulk_create`
const GENE_COLUMNS: usize = 2;

/// A stored gene
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Gene {
    pub id: i64,
    pub systematic_name: String,
    pub common_name: Option<String>,
}

impl std::fmt::Display for Gene {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "<{}>", self.systematic_name)
    }
}

/// A gene that has not been written yet
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewGene {
    pub systematic_name: String,
    pub common_name: Option<String>,
}

impl NewGene {
    pub fn new(systematic_name: impl Into<String>) -> Self {
        Self {
            systematic_name: systematic_name.into(),
            common_name: None,
        }
    }

}

/// Gene repository for database operations
pub struct GeneRepository<'a> {
    db: &'a Database,
}

impl<'a> GeneRepository<'a> {
    /// Create a new gene repository
    pub fn new(db: &'a Database) -> Self {
        Self { db }
    }

    /// Delete every gene, cascading to every similarity.
    ///
    /// Returns the number of genes removed.
    pub async fn reset(&self) -> Result<u64> {
        let deleted = sqlx::query("DELETE FROM genes")
            .execute(self.db.pool())
            .await?
            .rows_affected();

        info!(deleted, "Reset gene store");
        Ok(deleted)
    }

    /// Return the gene with this name, creating it first if absent.
    ///
    /// The boolean is true when the gene was created by this call.
    pub async fn ensure_present(&self, systematic_name: &str) -> Result<(Gene, bool)> {
        let result = sqlx::query(
            "INSERT INTO genes (systematic_name) VALUES (?) ON CONFLICT(systematic_name) DO NOTHING",
        )
        .bind(systematic_name)
        .execute(self.db.pool())
        .await?;

        let gene = self
            .get_by_name(systematic_name)
            .await?
            .ok_or_else(|| crate::Error::GeneNotFound(systematic_name.to_string()))?;

        Ok((gene, result.rows_affected() == 1))
    }

    /// Insert genes without checking for existing names.
    ///
    /// Written in one transaction, `batch_size` rows per statement up to the
    /// bind-parameter limit. A name that already exists fails the whole call.
    pub async fn bulk_create(&self, genes: &[NewGene], batch_size: usize) -> Result<u64> {
        let mut inserted = 0;
        let mut tx = self.db.pool().begin().await?;

        let rows_per_statement = batch_size.clamp(1, MAX_BIND_PARAMETERS / GENE_COLUMNS);
        for chunk in genes.chunks(rows_per_statement) {
            let mut builder: QueryBuilder<Sqlite> =
                QueryBuilder::new("INSERT INTO genes (systematic_name, common_name) ");
            builder.push_values(chunk, |mut row, gene| {
                row.push_bind(gene.systematic_name.as_str())
                    .push_bind(gene.common_name.as_deref());
            });
            inserted += builder.build().execute(&mut *tx).await?.rows_affected();
        }

        tx.commit().await?;
        Ok(inserted)
    }

    /// Get a gene by systematic name
    pub async fn get_by_name(&self, systematic_name: &str) -> Result<Option<Gene>> {
        let row = sqlx::query(
            "SELECT id, systematic_name, common_name FROM genes WHERE systematic_name = ?",
        )
        .bind(systematic_name)
        .fetch_optional(self.db.pool())
        .await?;

        Ok(row.map(|r| self.row_to_gene(r)))
    }

    /// List all genes ordered by id
    pub async fn list(&self) -> Result<Vec<Gene>> {
        let rows = sqlx::query("SELECT id, systematic_name, common_name FROM genes ORDER BY id")
            .fetch_all(self.db.pool())
            .await?;

        Ok(rows.into_iter().map(|r| self.row_to_gene(r)).collect())
    }

    /// Map every systematic name to its id
    pub async fn id_map(&self) -> Result<HashMap<String, i64>> {
        let rows: Vec<(String, i64)> = sqlx::query_as("SELECT systematic_name, id FROM genes")
            .fetch_all(self.db.pool())
            .await?;

        Ok(rows.into_iter().collect())
    }

    /// Count all genes
    pub async fn count(&self) -> Result<i64> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM genes")
            .fetch_one(self.db.pool())
            .await?;
        Ok(count)
    }

    /// Every similarity touching `gene` on either side, ordered by score.
    pub async fn ranked_similar(&self, gene: &Gene, descending: bool) -> Result<Vec<Similarity>> {
        let sql = if descending {
            "SELECT id, gene1_id, gene2_id, metric, score, pvalue FROM gene_similarities WHERE gene1_id = ? OR gene2_id = ? ORDER BY score DESC, id"
        } else {
            "SELECT id, gene1_id, gene2_id, metric, score, pvalue FROM gene_similarities WHERE gene1_id = ? OR gene2_id = ? ORDER BY score ASC, id"
        };

        let rows = sqlx::query(sql)
            .bind(gene.id)
            .bind(gene.id)
            .fetch_all(self.db.pool())
            .await?;

        Ok(rows.into_iter().map(row_to_similarity).collect())
    }

    /// Convert a database row to a Gene
    fn row_to_gene(&self, row: sqlx::sqlite::SqliteRow) -> Gene {
        Gene {
            id: row.get("id"),
            systematic_name: row.get("systematic_name"),
            common_name: row.get("common_name"),
        }
    }
}
