//! Relational models: genes and the directed similarities between them

pub mod gene;
pub mod similarity;

pub use gene::{Gene, GeneRepository, NewGene};
pub use similarity::{NewSimilarity, Similarity, SimilarityRepository};
