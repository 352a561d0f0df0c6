//! Copy-from-file loader: every off-diagonal similarity is spooled to a
//! temporary file first, then ingested with a single bulk copy.
//!
//! Writing the spool and ingesting it are timed as separate phases.

use super::copy_from::{copy_diagonal, copy_genes, write_similarity};
use super::{LoadContext, LoadReport, LoadStrategy, StrategyKind, gene_id, upper_triangle};
use crate::Result;
use crate::models::{GeneRepository, SimilarityRepository};
use crate::storage::{CopyTarget, copy_from, copy_writer};
use async_trait::async_trait;
use std::io::{Seek, SeekFrom};
use std::time::Instant;
use tempfile::SpooledTempFile;
use tracing::{debug, info};

#[derive(Debug, Clone, Copy, Default)]
pub struct CopyFromFileLoader;

#[async_trait]
impl LoadStrategy for CopyFromFileLoader {
    fn kind(&self) -> StrategyKind {
        StrategyKind::CopyFromFile
    }

    async fn load(&self, ctx: &LoadContext<'_>) -> Result<LoadReport> {
        let genes = GeneRepository::new(ctx.db);
        let sims = SimilarityRepository::new(ctx.db);
        let metric = ctx.config.metric.as_str();
        let mut report = LoadReport::new();

        info!("Creating {} genes...", ctx.genes.len());
        let start = Instant::now();
        copy_genes(ctx).await?;
        let elapsed = start.elapsed();
        let total_genes = genes.count().await?;
        info!(genes = total_genes, seconds = elapsed.as_secs_f64(), "Created genes");
        report.record("copyfromfile_create_genes", elapsed, Some(total_genes as u64));

        let source = ctx.similarities()?;
        let labels = source.labels();

        info!("Creating diagonals...");
        let start = Instant::now();
        let ids = genes.id_map().await?;
        let diagonal = copy_diagonal(ctx, labels, &ids).await?;
        report.record("copyfromfile_create_diagonal_sims", start.elapsed(), Some(diagonal));

        info!("Writing to file...");
        let start = Instant::now();
        let mut spool = SpooledTempFile::new(ctx.config.spool_threshold_bytes);
        let mut written = 0u64;
        {
            let mut writer = copy_writer(&mut spool);
            for (i, name1) in labels.iter().enumerate() {
                ctx.progress(i, labels.len());
                let gene1 = gene_id(&ids, name1)?;

                for name2 in labels {
                    if !upper_triangle(name1, name2) {
                        continue;
                    }
                    let Some(score) = source.pair_score(name1, name2) else {
                        continue;
                    };
                    let gene2 = gene_id(&ids, name2)?;

                    write_similarity(&mut writer, gene1, gene2, metric, score)?;
                    write_similarity(&mut writer, gene2, gene1, metric, score)?;
                    written += 2;
                }
            }
            writer.flush()?;
        }
        spool.seek(SeekFrom::Start(0))?;
        debug!(rows = written, on_disk = spool.is_rolled(), "Spooled similarities");
        report.record("copyfromfile_write_sims_file", start.elapsed(), Some(written));

        info!("Creating similarities...");
        let start = Instant::now();
        copy_from(ctx.db, spool, CopyTarget::Similarities).await?;
        let elapsed = start.elapsed();
        let total_sims = sims.count().await?;
        info!(
            similarities = total_sims,
            seconds = elapsed.as_secs_f64(),
            "Created gene similarities"
        );
        report.record("copyfromfile_create_sims", elapsed, Some(total_sims as u64));

        Ok(report)
    }
}
