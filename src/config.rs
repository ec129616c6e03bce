//! Configuration management for the skill gap engine

use crate::error::{Result, SkillGapError};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub embedding: EmbeddingConfig,
    pub matching: MatchingConfig,
    pub scoring: ScoringConfig,
    pub roadmap: RoadmapConfig,
    pub engine: EngineConfig,
    pub output: OutputConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingConfig {
    /// Local model directory or Hugging Face repo id of a Model2Vec model
    pub model: String,
    pub enable_caching: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchingConfig {
    /// Minimum cosine similarity for a fuzzy match to be accepted
    pub acceptance_threshold: f32,
    /// Scores within this distance of the best neighbor count as a tie
    pub tie_epsilon: f32,
    pub merge_suggestion_threshold: f32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoringConfig {
    /// How many of the largest gaps are handed to the explanation generator
    pub max_explained_gaps: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoadmapConfig {
    pub max_resources_per_skill: usize,
    /// Below this confidence/weight ratio beginner material is preferred
    pub beginner_ratio: f32,
    /// At or above this confidence/weight ratio advanced material is preferred
    pub advanced_ratio: f32,
    pub weekly_hours: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    pub request_timeout_ms: u64,
    pub max_concurrent_embeddings: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    pub format: OutputFormat,
    pub detailed: bool,
    pub color_output: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OutputFormat {
    Console,
    Json,
    Markdown,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            embedding: EmbeddingConfig {
                model: "minishlab/potion-base-8M".to_string(),
                enable_caching: true,
            },
            matching: MatchingConfig {
                acceptance_threshold: 0.82,
                tie_epsilon: 1e-6,
                merge_suggestion_threshold: 0.92,
            },
            scoring: ScoringConfig {
                max_explained_gaps: 3,
            },
            roadmap: RoadmapConfig {
                max_resources_per_skill: 3,
                beginner_ratio: 0.34,
                advanced_ratio: 0.67,
                weekly_hours: 10,
            },
            engine: EngineConfig {
                request_timeout_ms: 30_000,
                max_concurrent_embeddings: 8,
            },
            output: OutputConfig {
                format: OutputFormat::Console,
                detailed: false,
                color_output: true,
            },
        }
    }
}

impl Config {
    /// Load from the default location, writing defaults on first use
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path())
    }

    pub fn load_from(config_path: &Path) -> Result<Self> {
        if config_path.exists() {
            let content = std::fs::read_to_string(config_path)?;
            let config: Config = toml::from_str(&content)
                .map_err(|e| SkillGapError::Configuration(format!("Failed to parse config: {}", e)))?;
            config.validate()?;
            Ok(config)
        } else {
            let config = Self::default();
            config.save_to(config_path)?;
            Ok(config)
        }
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path())
    }

    pub fn save_to(&self, config_path: &Path) -> Result<()> {
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)
            .map_err(|e| SkillGapError::Configuration(format!("Failed to serialize config: {}", e)))?;

        std::fs::write(config_path, content)?;
        Ok(())
    }

    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| dirs::home_dir().unwrap_or_else(|| PathBuf::from(".")))
            .join("skill-gap")
            .join("config.toml")
    }

    pub fn validate(&self) -> Result<()> {
        let unit = |name: &str, value: f32| {
            if (0.0..=1.0).contains(&value) {
                Ok(())
            } else {
                Err(SkillGapError::Configuration(format!(
                    "{} must be within [0, 1], got {}",
                    name, value
                )))
            }
        };

        unit("matching.acceptance_threshold", self.matching.acceptance_threshold)?;
        unit("matching.merge_suggestion_threshold", self.matching.merge_suggestion_threshold)?;
        unit("roadmap.beginner_ratio", self.roadmap.beginner_ratio)?;
        unit("roadmap.advanced_ratio", self.roadmap.advanced_ratio)?;

        if !self.matching.tie_epsilon.is_finite() || self.matching.tie_epsilon < 0.0 {
            return Err(SkillGapError::Configuration(format!(
                "matching.tie_epsilon must be a non-negative number, got {}",
                self.matching.tie_epsilon
            )));
        }
        if self.roadmap.beginner_ratio > self.roadmap.advanced_ratio {
            return Err(SkillGapError::Configuration(
                "roadmap.beginner_ratio must not exceed roadmap.advanced_ratio".to_string(),
            ));
        }
        if self.roadmap.max_resources_per_skill == 0 {
            return Err(SkillGapError::Configuration(
                "roadmap.max_resources_per_skill must be positive".to_string(),
            ));
        }
        if self.roadmap.weekly_hours == 0 {
            return Err(SkillGapError::Configuration(
                "roadmap.weekly_hours must be positive".to_string(),
            ));
        }
        if self.engine.max_concurrent_embeddings == 0 {
            return Err(SkillGapError::Configuration(
                "engine.max_concurrent_embeddings must be positive".to_string(),
            ));
        }
        Ok(())
    }

    /// Set a single scalar value by its dotted key, e.g. `matching.acceptance_threshold`
    pub fn set_value(&mut self, key: &str, value: &str) -> Result<()> {
        fn parse<T: std::str::FromStr>(key: &str, value: &str) -> Result<T> {
            value.parse::<T>().map_err(|_| {
                SkillGapError::Configuration(format!("Invalid value '{}' for {}", value, key))
            })
        }

        let mut next = self.clone();
        match key {
            "embedding.model" => next.embedding.model = value.to_string(),
            "embedding.enable_caching" => next.embedding.enable_caching = parse(key, value)?,
            "matching.acceptance_threshold" => next.matching.acceptance_threshold = parse(key, value)?,
            "matching.tie_epsilon" => next.matching.tie_epsilon = parse(key, value)?,
            "matching.merge_suggestion_threshold" => {
                next.matching.merge_suggestion_threshold = parse(key, value)?
            }
            "scoring.max_explained_gaps" => next.scoring.max_explained_gaps = parse(key, value)?,
            "roadmap.max_resources_per_skill" => {
                next.roadmap.max_resources_per_skill = parse(key, value)?
            }
            "roadmap.beginner_ratio" => next.roadmap.beginner_ratio = parse(key, value)?,
            "roadmap.advanced_ratio" => next.roadmap.advanced_ratio = parse(key, value)?,
            "roadmap.weekly_hours" => next.roadmap.weekly_hours = parse(key, value)?,
            "engine.request_timeout_ms" => next.engine.request_timeout_ms = parse(key, value)?,
            "engine.max_concurrent_embeddings" => {
                next.engine.max_concurrent_embeddings = parse(key, value)?
            }
            "output.format" => {
                next.output.format = parse_output_format(value).map_err(SkillGapError::Configuration)?
            }
            "output.detailed" => next.output.detailed = parse(key, value)?,
            "output.color_output" => next.output.color_output = parse(key, value)?,
            _ => {
                return Err(SkillGapError::Configuration(format!(
                    "Unknown configuration key: {}",
                    key
                )))
            }
        }

        next.validate()?;
        *self = next;
        Ok(())
    }
}

/// Parse and validate output format
pub fn parse_output_format(format: &str) -> std::result::Result<OutputFormat, String> {
    match format.to_lowercase().as_str() {
        "console" => Ok(OutputFormat::Console),
        "json" => Ok(OutputFormat::Json),
        "markdown" | "md" => Ok(OutputFormat::Markdown),
        _ => Err(format!(
            "Invalid output format: {}. Supported: console, json, markdown",
            format
        )),
    }
}
