//! Directed gene similarities
//!
//! A similarity row links `gene1 -> gene2` under a named metric. Symmetric
//! measures are stored as two directed rows with the same score.

use crate::storage::{Database, MAX_BIND_PARAMETERS};
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use sqlx::{QueryBuilder, Row, Sqlite};

/// Longest metric name the store accepts
pub const MAX_METRIC_LENGTH: usize = 50;

/// Columns bound per row by `bulk_create`
const SIMILARITY_COLUMNS: usize = 5;

/// Scores are fixed-point with 10 digits, 3 of them decimals
pub const SCORE_LIMIT: f64 = 10_000_000.0;

/// A stored similarity row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Similarity {
    pub id: i64,
    pub gene1_id: i64,
    pub gene2_id: i64,
    pub metric: String,
    pub score: f64,
    pub pvalue: Option<f64>,
}

/// A similarity row that has not been written yet
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewSimilarity {
    pub gene1_id: i64,
    pub gene2_id: i64,
    pub metric: String,
    /// `None` models a missing score; the validated write path rejects it
    pub score: Option<f64>,
    pub pvalue: Option<f64>,
}

impl NewSimilarity {
    pub fn new(gene1_id: i64, gene2_id: i64, metric: impl Into<String>, score: f64) -> Self {
        Self {
            gene1_id,
            gene2_id,
            metric: metric.into(),
            score: Some(score),
            pvalue: None,
        }
    }

    pub fn with_pvalue(mut self, pvalue: Option<f64>) -> Self {
        self.pvalue = pvalue;
        self
    }

    /// The same row pointing the other way
    pub fn mirrored(&self) -> Self {
        Self {
            gene1_id: self.gene2_id,
            gene2_id: self.gene1_id,
            ..self.clone()
        }
    }

    /// Model-level validation run before a validated write
    pub fn validate(&self) -> Result<()> {
        if self.metric.is_empty() {
            return Err(Error::Validation("metric must not be empty".to_string()));
        }
        if self.metric.chars().count() > MAX_METRIC_LENGTH {
            return Err(Error::Validation(format!(
                "metric '{}' exceeds {} characters",
                self.metric, MAX_METRIC_LENGTH
            )));
        }

        match self.score {
            None => Err(Error::Validation(format!(
                "score is required for similarity {} -> {} ({})",
                self.gene1_id, self.gene2_id, self.metric
            ))),
            Some(score) if !score.is_finite() => Err(Error::Validation(format!(
                "score must be a finite number, got {}",
                score
            ))),
            Some(score) if score.abs() >= SCORE_LIMIT => Err(Error::Validation(format!(
                "score {} does not fit the stored precision",
                score
            ))),
            Some(_) => Ok(()),
        }
    }
}

/// Similarity repository for database operations
pub struct SimilarityRepository<'a> {
    db: &'a Database,
}

impl<'a> SimilarityRepository<'a> {
    /// Create a new similarity repository
    pub fn new(db: &'a Database) -> Self {
        Self { db }
    }

    /// Validate and write a similarity unless one already exists for
    /// `(gene1, gene2, metric)`. Returns the stored row and whether it was created.
    pub async fn get_or_create(&self, similarity: &NewSimilarity) -> Result<(Similarity, bool)> {
        similarity.validate()?;

        let result = sqlx::query(
            r#"
            INSERT INTO gene_similarities (gene1_id, gene2_id, metric, score, pvalue)
            VALUES (?, ?, ?, ?, ?)
            ON CONFLICT(gene1_id, gene2_id, metric) DO NOTHING
            "#,
        )
        .bind(similarity.gene1_id)
        .bind(similarity.gene2_id)
        .bind(&similarity.metric)
        .bind(similarity.score)
        .bind(similarity.pvalue)
        .execute(self.db.pool())
        .await?;

        let stored = self
            .get(similarity.gene1_id, similarity.gene2_id, &similarity.metric)
            .await?
            .ok_or_else(|| {
                Error::Other(format!(
                    "similarity {} -> {} vanished after insert",
                    similarity.gene1_id, similarity.gene2_id
                ))
            })?;

        Ok((stored, result.rows_affected() == 1))
    }

    /// Insert a batch of similarities without lookups or model validation.
    ///
    /// The batch is split into statements of at most `batch_size` rows, fewer
    /// if needed to stay under the bind-parameter limit, and written in one
    /// transaction. Any pre-existing row for the same
    /// `(gene1, gene2, metric)` fails the whole batch.
    pub async fn bulk_create(&self, similarities: &[NewSimilarity], batch_size: usize) -> Result<u64> {
        let mut inserted = 0;
        let mut tx = self.db.pool().begin().await?;

        let rows_per_statement = batch_size.clamp(1, MAX_BIND_PARAMETERS / SIMILARITY_COLUMNS);
        for chunk in similarities.chunks(rows_per_statement) {
            let mut builder: QueryBuilder<Sqlite> = QueryBuilder::new(
                "INSERT INTO gene_similarities (gene1_id, gene2_id, metric, score, pvalue) ",
            );
            builder.push_values(chunk, |mut row, sim| {
                row.push_bind(sim.gene1_id)
                    .push_bind(sim.gene2_id)
                    .push_bind(sim.metric.as_str())
                    .push_bind(sim.score)
                    .push_bind(sim.pvalue);
            });
            inserted += builder.build().execute(&mut *tx).await?.rows_affected();
        }

        tx.commit().await?;
        Ok(inserted)
    }

    /// Get the similarity for an ordered pair and metric
    pub async fn get(&self, gene1_id: i64, gene2_id: i64, metric: &str) -> Result<Option<Similarity>> {
        let row = sqlx::query(
            "SELECT id, gene1_id, gene2_id, metric, score, pvalue FROM gene_similarities WHERE gene1_id = ? AND gene2_id = ? AND metric = ?",
        )
        .bind(gene1_id)
        .bind(gene2_id)
        .bind(metric)
        .fetch_optional(self.db.pool())
        .await?;

        Ok(row.map(row_to_similarity))
    }

    /// Count all similarity rows
    pub async fn count(&self) -> Result<i64> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM gene_similarities")
            .fetch_one(self.db.pool())
            .await?;
        Ok(count)
    }
}

/// Convert a database row to a Similarity
pub(crate) fn row_to_similarity(row: sqlx::sqlite::SqliteRow) -> Similarity {
    Similarity {
        id: row.get("id"),
        gene1_id: row.get("gene1_id"),
        gene2_id: row.get("gene2_id"),
        metric: row.get("metric"),
        score: row.get("score"),
        pvalue: row.get("pvalue"),
    }
}
