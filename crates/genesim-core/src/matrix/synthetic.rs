//! Random similarity matrices for benchmarking

use super::table::SimilarityMatrix;
use rand::prelude::*;
use rand_distr::{StandardNormal, Uniform};
use serde::{Deserialize, Serialize};

/// How synthetic values are drawn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GeneratorKind {
    /// Uniform on [-1, 1], symmetrized, unit diagonal
    #[default]
    Symmetric,
    /// Independent standard normal draws. Not real similarity values.
    Normal,
}

impl GeneratorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            GeneratorKind::Symmetric => "symmetric",
            GeneratorKind::Normal => "normal",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "symmetric" => Some(GeneratorKind::Symmetric),
            "normal" => Some(GeneratorKind::Normal),
            _ => None,
        }
    }
}

/// Seeded generator when `seed` is set, entropy otherwise
pub fn rng_for(seed: Option<u64>) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    }
}

/// Square matrix over `labels`, in label order on both axes
pub fn generate<R: Rng>(labels: &[String], kind: GeneratorKind, rng: &mut R) -> SimilarityMatrix {
    let n = labels.len();
    let values: Vec<f64> = match kind {
        GeneratorKind::Normal => (0..n * n).map(|_| rng.sample(StandardNormal)).collect(),
        GeneratorKind::Symmetric => {
            let uniform = Uniform::new_inclusive(-1.0, 1.0);
            let raw: Vec<f64> = (0..n * n).map(|_| rng.sample(uniform)).collect();

            let mut values = vec![0.0; n * n];
            for i in 0..n {
                for j in 0..n {
                    values[i * n + j] = if i == j {
                        1.0
                    } else {
                        (raw[i * n + j] + raw[j * n + i]) / 2.0
                    };
                }
            }
            values
        }
    };

    SimilarityMatrix::from_parts(labels.to_vec(), labels.to_vec(), values)
}
