//! skill-gap: resolve skill mentions, score job gaps and plan learning roadmaps

use clap::Parser;
use colored::Colorize;
use log::{error, info};
use skill_gap::catalog::reconciliation::{MergeProposal, MergeStatus};
use skill_gap::catalog::registry::SkillRegistry;
use skill_gap::catalog::skill::{normalize, SkillMention};
use skill_gap::catalog::snapshot::CatalogSnapshot;
use skill_gap::catalog::store::{CatalogStore, JsonCatalogStore};
use skill_gap::cli::{self, Cli, Commands, ConfigAction, MergeAction, SkillAction};
use skill_gap::config::{parse_output_format, Config, OutputFormat};
use skill_gap::input::MentionReader;
use skill_gap::llm::generator::{role_summary, CommandGenerator, ExplanationService};
use skill_gap::llm::prompts::PromptTemplates;
use skill_gap::output::formatter::{save_report_to_file, ReportGenerator};
use skill_gap::output::report::AnalysisReport;
use skill_gap::processing::analyzer::{GapAnalysisEngine, GapRequest};
use skill_gap::processing::embeddings::{CachedEmbedder, Embedder, Model2VecEmbedder};
use skill_gap::{Result, SkillGapError};
use std::path::{Path, PathBuf};
use std::process;
use std::sync::Arc;

const MENTION_EXTENSIONS: &[&str] = &["json", "txt", "md", "csv"];

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let log_level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level)).init();

    let config_path = cli.config.clone().unwrap_or_else(Config::config_path);
    let config = match Config::load_from(&config_path) {
        Ok(config) => config,
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            process::exit(1);
        }
    };

    if let Err(e) = run_command(cli.command, config, config_path).await {
        error!("Command failed: {}", e);
        process::exit(1);
    }
}

async fn run_command(command: Commands, mut config: Config, config_path: PathBuf) -> Result<()> {
    match command {
        Commands::Analyze {
            mentions,
            catalog,
            job,
            role,
            format,
            detailed,
            save,
            prompt,
            explain_with,
            summary,
            duration,
        } => {
            let format = resolve_format(format.as_deref(), &config)?;
            let mentions = read_mentions(&mentions).await?;
            let (_, embedder, snapshot) = open_catalog(&catalog, &config).await?;

            let jobs = snapshot.select_jobs(&job, role.as_deref())?;
            let summary = summary.or_else(|| role.as_deref().map(role_summary));

            let engine = GapAnalysisEngine::new(
                snapshot.registry.clone(),
                embedder.clone(),
                snapshot.resources.clone(),
                &config,
            );
            let resolution = engine.analyze(&GapRequest { mentions, jobs }).await?;
            let mut report = AnalysisReport::from_resolution(
                &resolution,
                &snapshot.registry,
                config.roadmap.weekly_hours,
                embedder.model_name(),
            );

            if let Some(best) = resolution.best() {
                if prompt {
                    let params = ExplanationService::build_params(
                        &snapshot.registry,
                        best,
                        summary.as_deref(),
                        duration.as_deref(),
                        config.scoring.max_explained_gaps,
                    );
                    let text = PromptTemplates::default().render_explanation(&params);
                    println!("{}\n{}\n", "Explanation prompt:".cyan().bold(), text);
                }

                if let Some(command_line) = explain_with.as_deref() {
                    let generator = CommandGenerator::from_command_line(command_line)?;
                    let service =
                        ExplanationService::new(Arc::new(generator), config.scoring.max_explained_gaps);
                    let explanation = service
                        .explain(&snapshot.registry, best, summary.as_deref(), duration.as_deref())
                        .await?;
                    info!("Explanation generated in {}ms", explanation.generation_time_ms);
                    report = report.with_explanation(explanation);
                }
            }

            emit_report(&report, format, detailed || config.output.detailed, &config, save.as_deref())?;
        }

        Commands::Resolve {
            mentions,
            catalog,
            format,
        } => {
            let format = resolve_format(format.as_deref(), &config)?;
            let mentions = read_mentions(&mentions).await?;
            let (_, embedder, snapshot) = open_catalog(&catalog, &config).await?;

            let engine = GapAnalysisEngine::new(
                snapshot.registry.clone(),
                embedder.clone(),
                snapshot.resources.clone(),
                &config,
            );
            let resolution = engine.resolve(&mentions).await?;
            let report =
                AnalysisReport::from_mentions(&resolution, &snapshot.registry, embedder.model_name());
            emit_report(&report, format, config.output.detailed, &config, None)?;
        }

        Commands::Merges { catalog, action } => {
            let (store, _, snapshot) = open_catalog(&catalog, &config).await?;
            let registry = &snapshot.registry;

            match action {
                MergeAction::Suggest { threshold } => {
                    let threshold = threshold.unwrap_or(config.matching.merge_suggestion_threshold);
                    let added = registry.suggest_merges(threshold);
                    store.save_merges(&registry.merge_proposals()).await?;

                    if added.is_empty() {
                        println!("No new merge candidates at similarity ≥ {:.2}", threshold);
                    } else {
                        println!("Queued {} merge proposals for review:\n", added.len());
                        for proposal in &added {
                            print_proposal(registry, proposal);
                        }
                    }
                }

                MergeAction::List { pending } => {
                    let proposals: Vec<MergeProposal> = registry
                        .merge_proposals()
                        .into_iter()
                        .filter(|p| !pending || p.status == MergeStatus::PendingMerge)
                        .collect();
                    if proposals.is_empty() {
                        println!("No merge proposals");
                    }
                    for proposal in &proposals {
                        print_proposal(registry, proposal);
                    }
                }

                MergeAction::Confirm { id } => {
                    let proposal = registry.confirm_merge(id)?;
                    store.save_merges(&registry.merge_proposals()).await?;
                    println!(
                        "{} {} now resolves to {}",
                        "✓".green(),
                        registry.name_of(proposal.absorbed),
                        registry.name_of(proposal.survivor)
                    );
                }

                MergeAction::Reject { id } => {
                    let proposal = registry.reject_merge(id)?;
                    store.save_merges(&registry.merge_proposals()).await?;
                    println!(
                        "{} {} and {} stay separate",
                        "✗".red(),
                        registry.name_of(proposal.survivor),
                        registry.name_of(proposal.absorbed)
                    );
                }
            }
        }

        Commands::Skills { catalog, action } => {
            let (store, embedder, snapshot) = open_catalog(&catalog, &config).await?;
            let registry = &snapshot.registry;

            match action {
                SkillAction::Add { name, alias } => {
                    let embedding = embedder.embed(&normalize(&name)).await?;
                    let skill = registry.append_skill(&name, embedding, alias)?;
                    store.append_skill(&skill).await?;
                    println!("{} Added {} ({})", "✓".green(), skill.name, skill.id);
                }

                SkillAction::List => {
                    for skill in registry.skills() {
                        let canonical = registry.canonical_id(skill.id);
                        let mut line = format!("{:>6}  {}", skill.id.to_string(), skill.name);
                        if !skill.aliases.is_empty() {
                            let aliases: Vec<&str> = skill.aliases.iter().map(String::as_str).collect();
                            line.push_str(&format!(" ({})", aliases.join(", ")));
                        }
                        if canonical != skill.id {
                            line.push_str(&format!(" → {}", registry.name_of(canonical)));
                        }
                        println!("{}", line);
                    }
                }
            }
        }

        Commands::Config { action } => match action {
            Some(ConfigAction::Show) | None => {
                println!("Configuration file: {}\n", config_path.display());
                let content = toml::to_string_pretty(&config).map_err(|e| {
                    SkillGapError::Configuration(format!("Failed to serialize config: {}", e))
                })?;
                println!("{}", content);
            }

            Some(ConfigAction::Reset) => {
                Config::default().save_to(&config_path)?;
                println!("{} Configuration reset to defaults", "✓".green());
            }

            Some(ConfigAction::Set { key, value }) => {
                config.set_value(&key, &value)?;
                config.save_to(&config_path)?;
                println!("{} {} = {}", "✓".green(), key, value);
            }
        },
    }

    Ok(())
}

fn resolve_format(format: Option<&str>, config: &Config) -> Result<OutputFormat> {
    match format {
        Some(format) => parse_output_format(format).map_err(SkillGapError::InvalidInput),
        None => Ok(config.output.format),
    }
}

async fn read_mentions(path: &Path) -> Result<Vec<SkillMention>> {
    cli::validate_file_extension(path, MENTION_EXTENSIONS)
        .map_err(|e| SkillGapError::InvalidInput(format!("Mentions file: {}", e)))?;
    MentionReader::new()?.read_file(path).await
}

/// Load the embedder and a catalog snapshot from a directory
async fn open_catalog(
    dir: &Path,
    config: &Config,
) -> Result<(JsonCatalogStore, Arc<dyn Embedder>, CatalogSnapshot)> {
    let store = JsonCatalogStore::new(dir);

    info!("Loading embedding model {}", config.embedding.model);
    let model = Model2VecEmbedder::load(&config.embedding.model)?;
    let embedder: Arc<dyn Embedder> = if config.embedding.enable_caching {
        Arc::new(CachedEmbedder::new(model))
    } else {
        Arc::new(model)
    };

    let snapshot = CatalogSnapshot::load(&store, embedder.as_ref(), true).await?;
    Ok((store, embedder, snapshot))
}

fn emit_report(
    report: &AnalysisReport,
    format: OutputFormat,
    detailed: bool,
    config: &Config,
    save: Option<&Path>,
) -> Result<()> {
    let generator = ReportGenerator::with_options(config.output.color_output, detailed, true, true);
    println!("{}", generator.generate_report(report, format)?);

    if let Some(path) = save {
        let plain = ReportGenerator::with_options(false, detailed, true, true);
        save_report_to_file(&plain.generate_report(report, format)?, path)?;
        println!("{} Report saved to {}", "✓".green(), path.display());
    }
    Ok(())
}

fn print_proposal(registry: &SkillRegistry, proposal: &MergeProposal) {
    let status = match proposal.status {
        MergeStatus::PendingMerge => "pending".yellow(),
        MergeStatus::Confirmed => "confirmed".green(),
        MergeStatus::Rejected => "rejected".red(),
    };
    println!(
        "[{}] {} ← {}  similarity {:.3}  {}",
        proposal.id,
        registry.name_of(proposal.survivor),
        registry.name_of(proposal.absorbed),
        proposal.similarity,
        status
    );
}
