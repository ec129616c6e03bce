//! Error handling for the skill gap engine

use thiserror::Error;

#[derive(Error, Debug)]
pub enum SkillGapError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Provider unavailable: {0}")]
    ProviderUnavailable(String),

    #[error("Request timed out after {0}ms")]
    Timeout(u64),

    #[error("Embedding dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("Skill already exists: {0}")]
    DuplicateSkill(String),

    #[error("Alias '{alias}' already refers to skill {existing}")]
    AliasConflict { alias: String, existing: u64 },

    #[error("Unknown skill id: {0}")]
    UnknownSkill(u64),

    #[error("Unknown merge proposal: {0}")]
    UnknownMerge(u64),

    #[error("Merge proposal {0} is no longer pending")]
    MergeNotPending(u64),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Output formatting error: {0}")]
    OutputFormatting(String),
}

impl SkillGapError {
    /// Whether the error is the provider-side failure a caller may retry.
    pub fn is_provider_failure(&self) -> bool {
        matches!(self, SkillGapError::ProviderUnavailable(_) | SkillGapError::Timeout(_))
    }
}

pub type Result<T> = std::result::Result<T, SkillGapError>;

/// Provider adapters (model loading, inference) report through anyhow
impl From<anyhow::Error> for SkillGapError {
    fn from(err: anyhow::Error) -> Self {
        SkillGapError::ProviderUnavailable(format!("{:#}", err))
    }
}
