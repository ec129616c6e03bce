//! CLI interface for the skill gap engine

use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "skill-gap")]
#[command(about = "Match skill mentions to a canonical vocabulary and plan how to close job gaps")]
#[command(long_about = "Resolve free-text skill mentions to canonical skills with embeddings, score them against job requirements, and sequence learning resources into a roadmap")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Configuration file path
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Score mentions against jobs and build learning roadmaps
    Analyze {
        /// Mentions file (JSON array, or one `name[: confidence]` per line)
        #[arg(short, long)]
        mentions: PathBuf,

        /// Catalog directory holding skills.json, jobs.json, resources.json
        #[arg(long)]
        catalog: PathBuf,

        /// Only assess these job ids (default: every job in the catalog)
        #[arg(short, long)]
        job: Vec<String>,

        /// Only assess jobs whose title contains this role (case-insensitive)
        #[arg(short, long)]
        role: Option<String>,

        /// Output format: console, json, markdown
        #[arg(short, long)]
        format: Option<String>,

        /// Include surplus skills, resource links and the weekly schedule
        #[arg(short, long)]
        detailed: bool,

        /// Save output to file
        #[arg(short, long)]
        save: Option<PathBuf>,

        /// Print the explanation prompt for the best-fit job
        #[arg(long)]
        prompt: bool,

        /// Command that turns the explanation prompt into text (reads stdin)
        #[arg(long)]
        explain_with: Option<String>,

        /// Candidate summary used in the explanation
        #[arg(long)]
        summary: Option<String>,

        /// Target roadmap duration used in the explanation
        #[arg(long)]
        duration: Option<String>,
    },

    /// Canonicalize mentions without scoring
    Resolve {
        #[arg(short, long)]
        mentions: PathBuf,

        #[arg(long)]
        catalog: PathBuf,

        #[arg(short, long)]
        format: Option<String>,
    },

    /// Review merges between canonical skills
    Merges {
        #[arg(long)]
        catalog: PathBuf,

        #[command(subcommand)]
        action: MergeAction,
    },

    /// Manage canonical skills
    Skills {
        #[arg(long)]
        catalog: PathBuf,

        #[command(subcommand)]
        action: SkillAction,
    },

    /// Show configuration
    Config {
        #[command(subcommand)]
        action: Option<ConfigAction>,
    },
}

#[derive(Subcommand)]
pub enum MergeAction {
    /// Queue near-duplicate skill pairs for review
    Suggest {
        /// Similarity threshold (default from configuration)
        #[arg(short, long)]
        threshold: Option<f32>,
    },

    /// List merge proposals
    List {
        /// Show only pending proposals
        #[arg(long)]
        pending: bool,
    },

    /// Accept a pending merge
    Confirm { id: u64 },

    /// Reject a pending merge
    Reject { id: u64 },
}

#[derive(Subcommand)]
pub enum SkillAction {
    /// Append a new canonical skill
    Add {
        name: String,

        /// Alternative names that should match exactly
        #[arg(short, long)]
        alias: Vec<String>,
    },

    /// List canonical skills
    List,
}

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Reset configuration to defaults
    Reset,

    /// Set a configuration value
    Set {
        /// Configuration key (e.g., "matching.acceptance_threshold")
        key: String,

        /// Configuration value
        value: String,
    },
}

/// Validate file extension
pub fn validate_file_extension(path: &Path, allowed_extensions: &[&str]) -> Result<(), String> {
    match path.extension().and_then(|ext| ext.to_str()) {
        Some(ext) => {
            if allowed_extensions.contains(&ext.to_lowercase().as_str()) {
                Ok(())
            } else {
                Err(format!(
                    "Unsupported file extension: .{}. Allowed: {}",
                    ext,
                    allowed_extensions.join(", ")
                ))
            }
        }
        None => Err("File has no extension".to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_analyze_arguments() {
        let cli = Cli::try_parse_from([
            "skill-gap",
            "analyze",
            "--mentions",
            "mentions.txt",
            "--catalog",
            "catalog",
            "--job",
            "data",
            "--job",
            "ops",
            "--role",
            "data engineer",
            "--prompt",
        ])
        .unwrap();

        match cli.command {
            Commands::Analyze {
                job,
                role,
                prompt,
                format,
                ..
            } => {
                assert_eq!(job, vec!["data".to_string(), "ops".to_string()]);
                assert_eq!(role.as_deref(), Some("data engineer"));
                assert!(prompt);
                assert!(format.is_none());
            }
            _ => panic!("expected analyze"),
        }
    }

    #[test]
    fn test_merge_confirm_arguments() {
        let cli = Cli::try_parse_from(["skill-gap", "merges", "--catalog", "c", "confirm", "7"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Merges {
                action: MergeAction::Confirm { id: 7 },
                ..
            }
        ));
    }

    #[test]
    fn test_validate_file_extension() {
        assert!(validate_file_extension(Path::new("a.JSON"), &["json", "txt"]).is_ok());
        assert!(validate_file_extension(Path::new("a.pdf"), &["json", "txt"]).is_err());
        assert!(validate_file_extension(Path::new("mentions"), &["json"]).is_err());
    }
}
