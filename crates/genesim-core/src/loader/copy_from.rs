//! Copy-from loader: bulk copy from in-memory buffers.
//!
//! Genes go in with one copy, similarities with one copy per matrix row. Model
//! validation is bypassed; only storage constraints apply.

use super::{LoadContext, LoadReport, LoadStrategy, StrategyKind, gene_id, upper_triangle};
use crate::models::{GeneRepository, SimilarityRepository};
use crate::storage::{CopyTarget, copy_from, copy_writer};
use crate::{Error, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use std::io::{Cursor, Write};
use std::time::Instant;
use tracing::info;

#[derive(Debug, Clone, Copy, Default)]
pub struct CopyFromLoader;

/// Write one `(gene1, gene2, metric, score)` copy row
pub(super) fn write_similarity<W: Write>(
    writer: &mut csv::Writer<W>,
    gene1: i64,
    gene2: i64,
    metric: &str,
    score: f64,
) -> Result<()> {
    writer.serialize((gene1, gene2, metric, score))?;
    Ok(())
}

/// Finish an in-memory copy buffer
pub(super) fn into_buffer(writer: csv::Writer<Vec<u8>>) -> Result<Cursor<Vec<u8>>> {
    let buffer = writer
        .into_inner()
        .map_err(|e| Error::Io(e.into_error()))?;
    Ok(Cursor::new(buffer))
}

/// Copy every gene, using its name as the common name too
pub(super) async fn copy_genes(ctx: &LoadContext<'_>) -> Result<u64> {
    let mut writer = copy_writer(Vec::new());
    for name in ctx.genes.names() {
        writer.write_record([name, name])?;
    }
    copy_from(ctx.db, into_buffer(writer)?, CopyTarget::Genes).await
}

/// Copy a unit-score self pair for every label
pub(super) async fn copy_diagonal(
    ctx: &LoadContext<'_>,
    labels: &[String],
    ids: &HashMap<String, i64>,
) -> Result<u64> {
    let mut writer = copy_writer(Vec::new());
    for name in labels {
        let id = gene_id(ids, name)?;
        write_similarity(&mut writer, id, id, &ctx.config.metric, 1.0)?;
    }
    copy_from(ctx.db, into_buffer(writer)?, CopyTarget::Similarities).await
}

#[async_trait]
impl LoadStrategy for CopyFromLoader {
    fn kind(&self) -> StrategyKind {
        StrategyKind::CopyFrom
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
        report.record("copyfrom_create_genes", elapsed, Some(total_genes as u64));

        let source = ctx.similarities()?;
        let labels = source.labels();

        let start = Instant::now();
        let ids = genes.id_map().await?;

        info!("Creating diagonals...");
        copy_diagonal(ctx, labels, &ids).await?;

        info!("Creating similarities...");
        for (i, name1) in labels.iter().enumerate() {
            ctx.progress(i, labels.len());
            let gene1 = gene_id(&ids, name1)?;

            // One stream per gene1 covering its whole row
            let mut writer = copy_writer(Vec::new());
            let mut rows = 0usize;
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
                rows += 2;
            }

            if rows > 0 {
                copy_from(ctx.db, into_buffer(writer)?, CopyTarget::Similarities).await?;
            }
        }
        let elapsed = start.elapsed();
        let total_sims = sims.count().await?;
        info!(
            similarities = total_sims,
            seconds = elapsed.as_secs_f64(),
            "Created gene similarities"
        );
        report.record("copyfrom_create_sims", elapsed, Some(total_sims as u64));

        Ok(report)
    }
}
