//! Explanation generation

pub mod generator;
pub mod prompts;
