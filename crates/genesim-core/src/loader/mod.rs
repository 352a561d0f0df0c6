//! Bulk loaders
//!
//! Four interchangeable strategies populate the gene and similarity stores
//! from a gene list and a similarity source, timing each phase. They exist to
//! be compared against each other, so each keeps its own write path:
//!
//! - `baseline`: get-or-create per gene and per pair
//! - `bulk`: batched inserts, one call per matrix row
//! - `copy_from`: bulk copy from in-memory buffers, one per matrix row
//! - `copy_from_file`: bulk copy of every similarity from one spooled file
//!
//! # Usage
//!
//! ```ignore
//! use genesim_core::loader::{self, LoadRequest, StrategyKind};
//!
//! let request = LoadRequest::synthetic("genes.json", "report.csv", config.generator, Some(7));
//! let strategy = StrategyKind::CopyFrom.strategy();
//! let report = loader::run(&db, strategy.as_ref(), &request, &config).await?;
//! ```

pub mod baseline;
pub mod bulk;
pub mod copy_from;
pub mod copy_from_file;
pub mod report;

pub use baseline::BaselineLoader;
pub use bulk::BulkCreateLoader;
pub use copy_from::CopyFromLoader;
pub use copy_from_file::CopyFromFileLoader;
pub use report::{LoadReport, PhaseMetric};

use crate::config::LoaderConfig;
use crate::matrix::{GeneratorKind, MatrixSource, SimilaritySource};
use crate::models::GeneRepository;
use crate::storage::Database;
use crate::{Error, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use tracing::info;

/// Which loader to run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StrategyKind {
    Baseline,
    BulkCreate,
    CopyFrom,
    CopyFromFile,
}

impl StrategyKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            StrategyKind::Baseline => "baseline",
            StrategyKind::BulkCreate => "bulk-create",
            StrategyKind::CopyFrom => "copy-from",
            StrategyKind::CopyFromFile => "copy-from-file",
        }
    }

    /// Build the loader with its default options
    pub fn strategy(self) -> Box<dyn LoadStrategy> {
        match self {
            StrategyKind::Baseline => Box::new(BaselineLoader::default()),
            StrategyKind::BulkCreate => Box::new(BulkCreateLoader),
            StrategyKind::CopyFrom => Box::new(CopyFromLoader),
            StrategyKind::CopyFromFile => Box::new(CopyFromFileLoader),
        }
    }
}

/// A way of loading genes and similarities
#[async_trait]
pub trait LoadStrategy: Send + Sync {
    fn kind(&self) -> StrategyKind;

    /// Run both ingestion steps against an empty store
    async fn load(&self, ctx: &LoadContext<'_>) -> Result<LoadReport>;
}

/// Deduplicated gene names in first-seen order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneList {
    names: Vec<String>,
}

impl GeneList {
    /// Build from names, dropping repeats. Fails on an empty list or a blank name.
    pub fn new<I, S>(names: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut seen = HashSet::new();
        let mut unique = Vec::new();
        for name in names {
            let name = name.into();
            if name.trim().is_empty() {
                return Err(Error::InvalidInput("gene names must not be blank".to_string()));
            }
            if seen.insert(name.clone()) {
                unique.push(name);
            }
        }

        if unique.is_empty() {
            return Err(Error::InvalidInput("gene list is empty".to_string()));
        }
        Ok(Self { names: unique })
    }

    /// Read a JSON array of gene names
    pub fn read(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(Error::MissingInput(format!("gene list {}", path.display())));
        }
        let file = File::open(path)?;
        let names: Vec<String> = serde_json::from_reader(BufReader::new(file))?;
        Self::new(names)
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

/// Inputs of one load run
#[derive(Debug, Clone, PartialEq)]
pub struct LoadRequest {
    pub genes_json: PathBuf,
    pub output: PathBuf,
    pub source: MatrixSource,
}

impl LoadRequest {
    /// Similarities read from a table-file
    pub fn from_table_file(
        genes_json: impl Into<PathBuf>,
        output: impl Into<PathBuf>,
        table_file: impl Into<PathBuf>,
    ) -> Self {
        Self {
            genes_json: genes_json.into(),
            output: output.into(),
            source: MatrixSource::File(table_file.into()),
        }
    }

    /// Similarities generated over the gene list
    pub fn synthetic(
        genes_json: impl Into<PathBuf>,
        output: impl Into<PathBuf>,
        kind: GeneratorKind,
        seed: Option<u64>,
    ) -> Self {
        Self {
            genes_json: genes_json.into(),
            output: output.into(),
            source: MatrixSource::Synthetic { kind, seed },
        }
    }

    /// Check that every required input location is present
    pub fn validate(&self) -> Result<()> {
        if self.output.as_os_str().is_empty() {
            return Err(Error::MissingInput("output file path".to_string()));
        }
        if !self.genes_json.exists() {
            return Err(Error::MissingInput(format!(
                "gene list {}",
                self.genes_json.display()
            )));
        }
        if let MatrixSource::File(path) = &self.source {
            if !path.exists() {
                return Err(Error::MissingInput(format!("table-file {}", path.display())));
            }
        }
        Ok(())
    }
}

/// Everything a strategy needs for one run
pub struct LoadContext<'a> {
    pub db: &'a Database,
    pub genes: &'a GeneList,
    pub source: &'a MatrixSource,
    pub config: &'a LoaderConfig,
}

impl LoadContext<'_> {
    /// Load or generate the similarity values for this run
    pub fn similarities(&self) -> Result<SimilaritySource> {
        self.source.resolve(self.genes.names(), &self.config.metric)
    }

    /// Heartbeat for long outer loops
    pub fn progress(&self, index: usize, total: usize) {
        if index % self.config.progress_interval.max(1) == 0 {
            info!("Parsing gene {} of {}...", index, total);
        }
    }
}

/// Reset the store, then load it with `strategy` and write the report.
pub async fn run(
    db: &Database,
    strategy: &dyn LoadStrategy,
    request: &LoadRequest,
    config: &LoaderConfig,
) -> Result<LoadReport> {
    // Every run starts from an empty store, even one that fails validation
    GeneRepository::new(db).reset().await?;

    request.validate()?;
    if config.batch_size == 0 || config.progress_interval == 0 {
        return Err(Error::ConfigError(
            "loader.batch_size and loader.progress_interval must be at least 1".to_string(),
        ));
    }

    let genes = GeneList::read(&request.genes_json)?;
    info!(
        strategy = strategy.kind().as_str(),
        genes = genes.len(),
        "Starting load"
    );

    let ctx = LoadContext {
        db,
        genes: &genes,
        source: &request.source,
        config,
    };
    let report = strategy.load(&ctx).await?;

    report.write_csv(&request.output)?;
    info!(output = %request.output.display(), "Wrote load report");
    Ok(report)
}

/// Pairs visited by the triangle strategies: strictly ordered names only
pub(crate) fn upper_triangle(gene1: &str, gene2: &str) -> bool {
    gene1 < gene2
}

pub(crate) fn gene_id(ids: &HashMap<String, i64>, name: &str) -> Result<i64> {
    ids.get(name)
        .copied()
        .ok_or_else(|| Error::GeneNotFound(name.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_gene_list_dedupes_in_order() {
        let list = GeneList::new(["B", "A", "B", "C", "A"]).unwrap();
        assert_eq!(list.names(), ["B", "A", "C"]);
        assert_eq!(list.len(), 3);
    }

    #[test]
    fn test_gene_list_rejects_empty_and_blank() {
        assert!(GeneList::new(Vec::<String>::new()).is_err());
        assert!(GeneList::new(["A", " "]).is_err());
    }

    #[test]
    fn test_gene_list_read() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"["YAL001C", "YAL002W"]"#).unwrap();

        let list = GeneList::read(file.path()).unwrap();
        assert_eq!(list.len(), 2);

        let err = GeneList::read(Path::new("/nonexistent/genes.json")).unwrap_err();
        assert_eq!(err.code(), "E100");
    }

    #[test]
    fn test_gene_list_read_rejects_non_strings() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "[1, 2]").unwrap();
        let err = GeneList::read(file.path()).unwrap_err();
        assert_eq!(err.code(), "E800");
    }

    #[test]
    fn test_request_validation() {
        let dir = tempfile::tempdir().unwrap();
        let genes = dir.path().join("genes.json");
        std::fs::write(&genes, "[\"A\"]").unwrap();

        let ok = LoadRequest::synthetic(&genes, dir.path().join("out.csv"), GeneratorKind::Normal, None);
        ok.validate().unwrap();

        let no_table = LoadRequest::from_table_file(&genes, dir.path().join("out.csv"), dir.path().join("missing.json"));
        assert!(matches!(no_table.validate(), Err(Error::MissingInput(_))));

        let no_output = LoadRequest::synthetic(&genes, "", GeneratorKind::Normal, None);
        assert!(matches!(no_output.validate(), Err(Error::MissingInput(_))));
    }

    #[test]
    fn test_upper_triangle() {
        assert!(upper_triangle("A", "B"));
        assert!(!upper_triangle("B", "A"));
        assert!(!upper_triangle("A", "A"));
    }

    #[test]
    fn test_strategy_kinds() {
        for kind in [
            StrategyKind::Baseline,
            StrategyKind::BulkCreate,
            StrategyKind::CopyFrom,
            StrategyKind::CopyFromFile,
        ] {
            assert_eq!(kind.strategy().kind(), kind);
        }
    }
}
