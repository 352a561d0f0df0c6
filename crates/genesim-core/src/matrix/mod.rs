//! Similarity sources
//!
//! A similarity source is a labeled score matrix plus optional p-values,
//! loaded from a table-file or synthesized for benchmarking.
//!
//! - `table`: the labeled matrix type, NaN marks absent cells
//! - `store`: JSON table-file container
//! - `synthetic`: seedable random matrices

pub mod store;
pub mod synthetic;
pub mod table;

pub use store::TableStore;
pub use synthetic::{GeneratorKind, generate, rng_for};
pub use table::SimilarityMatrix;

use crate::{Error, Result};
use std::path::PathBuf;
use tracing::{info, warn};

/// Decimal places kept for scores
pub const SCORE_DECIMALS: i32 = 3;

/// Decimal places kept for p-values
pub const PVALUE_DECIMALS: i32 = 6;

/// Name of the p-value table in a table-file
pub const PVALUES_TABLE: &str = "pvals";

/// Round to a fixed number of decimal places
pub fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    (value * factor).round() / factor
}

pub fn round_score(value: f64) -> f64 {
    round_to(value, SCORE_DECIMALS)
}

pub fn round_pvalue(value: f64) -> f64 {
    round_to(value, PVALUE_DECIMALS)
}

/// Where a run gets its similarity values
#[derive(Debug, Clone, PartialEq)]
pub enum MatrixSource {
    /// A table-file holding a scores table and optionally `pvals`
    File(PathBuf),
    /// Random values over the loaded gene names
    Synthetic {
        kind: GeneratorKind,
        seed: Option<u64>,
    },
}

impl MatrixSource {
    /// Load or generate the similarity values.
    ///
    /// `labels` only matters for synthetic sources; file sources carry their own.
    pub fn resolve(&self, labels: &[String], metric: &str) -> Result<SimilaritySource> {
        match self {
            MatrixSource::File(path) => {
                let mut store = TableStore::open(path)?;
                SimilaritySource::from_store(&mut store, metric)
            }
            MatrixSource::Synthetic { kind, seed } => {
                info!(kind = kind.as_str(), genes = labels.len(), "Generating synthetic similarities");
                let scores = generate(labels, *kind, &mut rng_for(*seed));
                Ok(SimilaritySource::new(scores, None))
            }
        }
    }
}

/// Scores and optional p-values addressed by gene-name pairs
#[derive(Debug, Clone)]
pub struct SimilaritySource {
    scores: SimilarityMatrix,
    pvalues: Option<SimilarityMatrix>,
}

impl SimilaritySource {
    pub fn new(scores: SimilarityMatrix, pvalues: Option<SimilarityMatrix>) -> Self {
        Self { scores, pvalues }
    }

    /// Take the `metric` scores table and the p-value table out of a store
    pub fn from_store(store: &mut TableStore, metric: &str) -> Result<Self> {
        let scores = store
            .take(metric)
            .ok_or_else(|| Error::TableNotFound(metric.to_string()))?;
        let (rows, columns) = scores.shape();
        info!(
            table = metric,
            rows,
            columns,
            absent = scores.absent_count(),
            "Loaded scores"
        );

        let pvalues = store.take(PVALUES_TABLE);
        if pvalues.is_none() {
            warn!(table = PVALUES_TABLE, "No p-value table, p-values will be empty");
        }

        Ok(Self::new(scores, pvalues))
    }

    /// Row labels of the scores table, the iteration order of every loader
    pub fn labels(&self) -> &[String] {
        self.scores.rows()
    }

    /// Rounded score, `None` for absent cells
    pub fn score(&self, gene1: &str, gene2: &str) -> Option<f64> {
        self.scores.get(gene1, gene2).map(round_score)
    }

    /// Rounded `(gene1, gene2)` score, `None` when either direction of the
    /// pair is absent
    pub fn pair_score(&self, gene1: &str, gene2: &str) -> Option<f64> {
        self.scores.get(gene2, gene1)?;
        self.score(gene1, gene2)
    }

    /// Rounded p-value, `None` when absent or no p-value table exists
    pub fn pvalue(&self, gene1: &str, gene2: &str) -> Option<f64> {
        self.pvalues
            .as_ref()
            .and_then(|p| p.get(gene1, gene2))
            .map(round_pvalue)
    }
}
