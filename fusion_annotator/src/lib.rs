//! Annotation of gene fusions: candidate isoform pairs, spliced fusion
//! sequences, protein domains carried across the junction, and diagrams.

pub mod annotation_store;
pub mod config;
pub mod error;
pub mod export;
pub mod fusion;
pub mod models;
pub mod parsers;
pub mod pipeline;
pub mod render;

#[cfg(test)]
mod test_fixtures;
