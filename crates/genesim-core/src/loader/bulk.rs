//! Bulk-create loader: batched inserts with no existence checks.
//!
//! Correctness depends on the store being empty: a name or pair that already
//! exists fails its whole batch.

use super::{LoadContext, LoadReport, LoadStrategy, StrategyKind, gene_id, upper_triangle};
use crate::Result;
use crate::models::{GeneRepository, NewGene, NewSimilarity, SimilarityRepository};
use async_trait::async_trait;
use std::time::Instant;
use tracing::info;

#[derive(Debug, Clone, Copy, Default)]
pub struct BulkCreateLoader;

#[async_trait]
impl LoadStrategy for BulkCreateLoader {
    fn kind(&self) -> StrategyKind {
        StrategyKind::BulkCreate
    }

    async fn load(&self, ctx: &LoadContext<'_>) -> Result<LoadReport> {
        let genes = GeneRepository::new(ctx.db);
        let sims = SimilarityRepository::new(ctx.db);
        let metric = ctx.config.metric.as_str();
        let batch_size = ctx.config.batch_size;
        let mut report = LoadReport::new();

        info!("Creating {} genes...", ctx.genes.len());
        let start = Instant::now();
        let listing: Vec<NewGene> = ctx.genes.names().iter().map(NewGene::new).collect();
        genes.bulk_create(&listing, batch_size).await?;
        let elapsed = start.elapsed();
        let total_genes = genes.count().await?;
        info!(genes = total_genes, seconds = elapsed.as_secs_f64(), "Created genes");
        report.record("bulk_create_genes", elapsed, Some(total_genes as u64));

        let source = ctx.similarities()?;
        let labels = source.labels();

        let start = Instant::now();
        let ids = genes.id_map().await?;

        info!("Creating diagonals...");
        let mut diagonal = Vec::with_capacity(labels.len());
        for name in labels {
            let id = gene_id(&ids, name)?;
            diagonal.push(NewSimilarity::new(id, id, metric, 1.0));
        }
        sims.bulk_create(&diagonal, batch_size).await?;

        info!("Creating similarities...");
        for (i, name1) in labels.iter().enumerate() {
            ctx.progress(i, labels.len());
            let gene1 = gene_id(&ids, name1)?;

            let mut listing = Vec::new();
            for name2 in labels {
                if !upper_triangle(name1, name2) {
                    continue;
                }
                let Some(score) = source.pair_score(name1, name2) else {
                    continue;
                };
                let gene2 = gene_id(&ids, name2)?;

                let similarity = NewSimilarity::new(gene1, gene2, metric, score)
                    .with_pvalue(source.pvalue(name1, name2));
                listing.push(similarity.mirrored());
                listing.push(similarity);
            }

            // One batch per matrix row
            sims.bulk_create(&listing, batch_size).await?;
        }
        let elapsed = start.elapsed();
        let total_sims = sims.count().await?;
        info!(
            similarities = total_sims,
            seconds = elapsed.as_secs_f64(),
            "Created gene similarities"
        );
        report.record("bulk_create_sims", elapsed, Some(total_sims as u64));

        Ok(report)
    }
}
