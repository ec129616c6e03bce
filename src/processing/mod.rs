//! Canonicalization, scoring and sequencing

pub mod analyzer;
pub mod canonicalizer;
pub mod embeddings;
pub mod gap_scorer;
pub mod sequencer;
pub mod vector_index;
