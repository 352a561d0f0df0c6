//! Baseline loader: one get-or-create round trip per gene and per pair.

use super::{LoadContext, LoadReport, LoadStrategy, StrategyKind, upper_triangle};
use crate::Result;
use crate::models::{GeneRepository, NewSimilarity, SimilarityRepository};
use async_trait::async_trait;
use std::time::Instant;
use tracing::info;

/// Row-by-row loader.
///
/// Walks the full name x name matrix and writes both directions of every
/// pair whose cells are present both ways, through the validated write path.
/// With `triangle` set only ordered pairs and the diagonal are visited, each
/// writing its mirror explicitly.
#[derive(Debug, Clone, Copy, Default)]
pub struct BaselineLoader {
    pub triangle: bool,
}

impl BaselineLoader {
    pub fn triangle() -> Self {
        Self { triangle: true }
    }
}

#[async_trait]
impl LoadStrategy for BaselineLoader {
    fn kind(&self) -> StrategyKind {
        StrategyKind::Baseline
    }

    async fn load(&self, ctx: &LoadContext<'_>) -> Result<LoadReport> {
        let genes = GeneRepository::new(ctx.db);
        let sims = SimilarityRepository::new(ctx.db);
        let metric = ctx.config.metric.as_str();
        let mut report = LoadReport::new();

        info!("Creating {} genes...", ctx.genes.len());
        let start = Instant::now();
        for name in ctx.genes.names() {
            genes.ensure_present(name).await?;
        }
        let elapsed = start.elapsed();
        let total_genes = genes.count().await?;
        info!(genes = total_genes, seconds = elapsed.as_secs_f64(), "Created genes");
        report.record("baseline_genes_create", elapsed, Some(total_genes as u64));

        let source = ctx.similarities()?;
        let labels = source.labels();

        info!("Creating similarities...");
        let start = Instant::now();
        for (i, name1) in labels.iter().enumerate() {
            ctx.progress(i, labels.len());
            let (gene1, _) = genes.ensure_present(name1).await?;

            for name2 in labels {
                if self.triangle && name1 != name2 && !upper_triangle(name1, name2) {
                    continue;
                }
                let (gene2, _) = genes.ensure_present(name2).await?;

                // Self pairs are always written at 1.0, whatever the cell holds
                let diagonal = gene1.id == gene2.id;
                let score = if diagonal {
                    1.0
                } else {
                    let Some(score) = source.pair_score(name1, name2) else {
                        continue;
                    };
                    score
                };

                let similarity = NewSimilarity::new(gene1.id, gene2.id, metric, score)
                    .with_pvalue(source.pvalue(name1, name2));
                sims.get_or_create(&similarity).await?;
                if !diagonal {
                    sims.get_or_create(&similarity.mirrored()).await?;
                }
            }
        }
        let elapsed = start.elapsed();
        let total_sims = sims.count().await?;
        info!(
            similarities = total_sims,
            seconds = elapsed.as_secs_f64(),
            "Created gene similarities"
        );
        report.record("baseline_sims_create", elapsed, Some(total_sims as u64));

        Ok(report)
    }
}
