//! Output formatters: console, JSON and Markdown renderings of a report

use crate::catalog::skill::MatchKind;
use crate::config::OutputFormat;
use crate::error::Result;
use crate::output::report::*;
use colored::{Color, Colorize};
use std::path::Path;

/// Trait for formatting analysis reports
pub trait OutputFormatter {
    fn format_report(&self, report: &AnalysisReport) -> Result<String>;
    fn supports_format(&self) -> OutputFormat;
}

/// Console formatter with colors
pub struct ConsoleFormatter {
    use_colors: bool,
    detailed: bool,
}

pub struct JsonFormatter {
    pretty: bool,
}

pub struct MarkdownFormatter {
    include_metadata: bool,
}

/// Report generator that coordinates the formatters
pub struct ReportGenerator {
    console_formatter: ConsoleFormatter,
    json_formatter: JsonFormatter,
    markdown_formatter: MarkdownFormatter,
}

impl ConsoleFormatter {
    pub fn new(use_colors: bool, detailed: bool) -> Self {
        Self { use_colors, detailed }
    }

    fn colorize(&self, text: &str, color: Color) -> String {
        if self.use_colors {
            text.color(color).to_string()
        } else {
            text.to_string()
        }
    }

    fn format_header(&self, title: &str, level: u8) -> String {
        let prefix = match level {
            1 => "█",
            2 => "▓",
            3 => "▒",
            _ => "░",
        };

        let color = match level {
            1 => Color::Blue,
            2 => Color::Green,
            3 => Color::Yellow,
            _ => Color::White,
        };

        if self.use_colors {
            format!("\n{} {}\n", prefix.color(color).bold(), title.color(color).bold())
        } else {
            format!("\n{} {}\n", prefix, title)
        }
    }

    fn format_fit_badge(&self, fit: u8) -> String {
        let (badge, color) = match fit {
            100 => ("QUALIFIED", Color::Green),
            80..=99 => ("STRONG", Color::BrightGreen),
            60..=79 => ("GOOD", Color::Yellow),
            40..=59 => ("PARTIAL", Color::BrightYellow),
            _ => ("GAPS", Color::Red),
        };

        if self.use_colors {
            format!("[{}]", badge.color(color).bold())
        } else {
            format!("[{}]", badge)
        }
    }

    fn format_match(&self, mention: &MentionView) -> String {
        let target = mention.skill.as_deref().unwrap_or("-");
        match (mention.match_kind, mention.similarity) {
            (MatchKind::Fuzzy, Some(similarity)) => format!(
                "{} → {} {}",
                mention.mention,
                self.colorize(target, Color::Cyan),
                self.colorize(&format!("(fuzzy {:.2})", similarity), Color::BrightBlack)
            ),
            (MatchKind::Unresolved, Some(similarity)) => format!(
                "{} {}",
                self.colorize(&mention.mention, Color::Red),
                self.colorize(&format!("(best {:.2})", similarity), Color::BrightBlack)
            ),
            (MatchKind::Unresolved, None) => self.colorize(&mention.mention, Color::Red),
            _ => format!("{} → {}", mention.mention, self.colorize(target, Color::Green)),
        }
    }

    fn format_job(&self, job: &JobView) -> String {
        let mut output = String::new();

        output.push_str(&self.format_header(
            &format!("#{} {} ({})", job.rank, job.job_title, job.job_id),
            2,
        ));
        if job.no_requirements {
            output.push_str(&self.colorize("This job lists no requirements.\n", Color::Yellow));
            return output;
        }
        output.push_str(&format!(
            "Fit: {}% {} | Aggregate gap: {:.3}\n",
            job.fit_percentage,
            self.format_fit_badge(job.fit_percentage),
            job.aggregate_gap
        ));

        output.push_str(&self.format_header("Gaps", 3));
        for gap in &job.gaps {
            let line = format!(
                "  • {} needs {:.2}, has {:.2}, gap {:.2}\n",
                gap.skill, gap.required_weight, gap.candidate_confidence, gap.gap
            );
            if gap.gap > 0.0 {
                output.push_str(&self.colorize(&line, Color::Yellow));
            } else {
                output.push_str(&self.colorize(&line, Color::Green));
            }
        }

        if self.detailed && !job.surplus_skills.is_empty() {
            output.push_str(&format!("Also knows: {}\n", job.surplus_skills.join(", ")));
        }

        if job.roadmap.is_empty() {
            output.push_str(&self.colorize("\nNothing to learn for this role.\n", Color::Green));
        } else {
            output.push_str(&self.format_header(
                &format!("Roadmap ({} hours)", job.total_hours),
                3,
            ));
            for step in &job.roadmap {
                output.push_str(&format!(
                    "{}. {} {}\n",
                    step.position,
                    self.colorize(&step.skill, Color::White),
                    self.colorize(&format!("(gap {:.2}, {}h)", step.gap, step.hours), Color::BrightBlack)
                ));
                if step.unserviceable {
                    output.push_str(&format!(
                        "   {}\n",
                        self.colorize("No learning resources available", Color::Red)
                    ));
                }
                for resource in &step.resources {
                    output.push_str(&format!(
                        "   - {} [{}, {}h]\n",
                        resource.title, resource.difficulty, resource.hours
                    ));
                    if self.detailed {
                        output.push_str(&format!("     {}\n", self.colorize(&resource.url, Color::Blue)));
                    }
                }
            }
        }

        if self.detailed && !job.schedule.is_empty() {
            output.push_str(&self.format_header("Weekly Schedule", 3));
            for week in &job.schedule {
                output.push_str(&format!("{} ({}h): {}\n", week.label, week.hours, week.items.join("; ")));
            }
        }

        if let Some(explanation) = &job.explanation {
            output.push_str(&self.format_header("Coach's Explanation", 3));
            output.push_str(explanation);
            output.push('\n');
        }

        output
    }
}

impl OutputFormatter for ConsoleFormatter {
    fn format_report(&self, report: &AnalysisReport) -> Result<String> {
        let mut output = String::new();

        output.push_str(&self.format_header("SKILL GAP ANALYSIS", 1));
        output.push_str(&format!(
            "Generated: {} | Processing time: {}ms\n",
            report.metadata.generated_at.format("%Y-%m-%d %H:%M:%S UTC"),
            report.metadata.processing_time_ms
        ));

        output.push_str(&self.format_header("Summary", 2));
        output.push_str(&format!(
            "Mentions: {} resolved, {} unresolved | Canonical skills: {}\n",
            report.summary.resolved_mentions,
            report.summary.unresolved_mentions,
            report.summary.canonical_skills
        ));
        if report.summary.jobs_assessed > 0 {
            output.push_str(&format!("Jobs assessed: {}\n", report.summary.jobs_assessed));
            output.push_str(&format!(
                "Verdict: {}\n",
                self.colorize(&report.summary.verdict, Color::Cyan)
            ));
        }

        output.push_str(&self.format_header("Skills", 2));
        for mention in &report.mentions {
            output.push_str(&format!("  • {}\n", self.format_match(mention)));
        }
        if !report.unresolved.is_empty() {
            output.push_str(&self.format_header("Unresolved", 3));
            for mention in &report.unresolved {
                output.push_str(&format!("  • {}\n", self.format_match(mention)));
            }
        }

        for job in &report.jobs {
            output.push_str(&self.format_job(job));
        }

        output.push_str(&format!(
            "\n{} Generated by skill-gap v{} | Embeddings: {}\n",
            self.colorize("ℹ", Color::Blue),
            report.metadata.tool_version,
            report.metadata.embedding_model
        ));

        Ok(output)
    }

    fn supports_format(&self) -> OutputFormat {
        OutputFormat::Console
    }
}

impl JsonFormatter {
    pub fn new(pretty: bool) -> Self {
        Self { pretty }
    }
}

impl OutputFormatter for JsonFormatter {
    fn format_report(&self, report: &AnalysisReport) -> Result<String> {
        if self.pretty {
            Ok(serde_json::to_string_pretty(report)?)
        } else {
            Ok(serde_json::to_string(report)?)
        }
    }

    fn supports_format(&self) -> OutputFormat {
        OutputFormat::Json
    }
}

impl MarkdownFormatter {
    pub fn new(include_metadata: bool) -> Self {
        Self { include_metadata }
    }

    fn markdown_fit_badge(fit: u8) -> &'static str {
        match fit {
            100 => "🟢 Qualified",
            80..=99 => "🟢 Strong",
            60..=79 => "🟡 Good",
            40..=59 => "🟠 Partial",
            _ => "🔴 Gaps",
        }
    }

    fn format_markdown_job(job: &JobView) -> String {
        let mut output = format!("## {}. {} (`{}`)\n\n", job.rank, job.job_title, job.job_id);
        if job.no_requirements {
            output.push_str("_This job lists no requirements._\n\n");
            return output;
        }

        output.push_str(&format!(
            "**Fit:** {}% {} | **Aggregate gap:** {:.3}\n\n",
            job.fit_percentage,
            Self::markdown_fit_badge(job.fit_percentage),
            job.aggregate_gap
        ));

        output.push_str("| Skill | Required | Has | Gap |\n|---|---|---|---|\n");
        for gap in &job.gaps {
            output.push_str(&format!(
                "| {} | {:.2} | {:.2} | {:.2} |\n",
                gap.skill, gap.required_weight, gap.candidate_confidence, gap.gap
            ));
        }
        output.push('\n');

        if !job.surplus_skills.is_empty() {
            output.push_str(&format!("**Also knows:** {}\n\n", job.surplus_skills.join(", ")));
        }

        if !job.roadmap.is_empty() {
            output.push_str(&format!("### Roadmap ({} hours)\n\n", job.total_hours));
            for step in &job.roadmap {
                output.push_str(&format!("{}. **{}** (gap {:.2})\n", step.position, step.skill, step.gap));
                if step.unserviceable {
                    output.push_str("   - _No learning resources available_\n");
                }
                for resource in &step.resources {
                    output.push_str(&format!(
                        "   - [{}]({}) ({}, {}h)\n",
                        resource.title, resource.url, resource.difficulty, resource.hours
                    ));
                }
            }
            output.push('\n');
        }

        if !job.schedule.is_empty() {
            output.push_str("### Weekly Schedule\n\n");
            for week in &job.schedule {
                output.push_str(&format!("- **{}** ({}h): {}\n", week.label, week.hours, week.items.join("; ")));
            }
            output.push('\n');
        }

        if let Some(explanation) = &job.explanation {
            output.push_str("### Explanation\n\n");
            output.push_str(explanation);
            output.push_str("\n\n");
        }

        output
    }
}

impl OutputFormatter for MarkdownFormatter {
    fn format_report(&self, report: &AnalysisReport) -> Result<String> {
        let mut output = String::from("# Skill Gap Analysis\n\n");

        output.push_str(&format!("**Verdict:** {}\n\n", report.summary.verdict));
        output.push_str(&format!(
            "**Mentions:** {} resolved, {} unresolved\n\n",
            report.summary.resolved_mentions, report.summary.unresolved_mentions
        ));

        output.push_str("## Skills\n\n| Mention | Skill | Match | Confidence |\n|---|---|---|---|\n");
        for mention in report.mentions.iter().chain(report.unresolved.iter()) {
            output.push_str(&format!(
                "| {} | {} | {} | {:.2} |\n",
                mention.mention,
                mention.skill.as_deref().unwrap_or("-"),
                mention.match_kind,
                mention.confidence
            ));
        }
        output.push('\n');

        for job in &report.jobs {
            output.push_str(&Self::format_markdown_job(job));
        }

        if self.include_metadata {
            output.push_str("---\n\n");
            output.push_str(&format!(
                "*Generated by skill-gap v{} using {} on {}*\n",
                report.metadata.tool_version,
                report.metadata.embedding_model,
                report.metadata.generated_at.format("%Y-%m-%d %H:%M UTC")
            ));
        }

        Ok(output)
    }

    fn supports_format(&self) -> OutputFormat {
        OutputFormat::Markdown
    }
}

impl ReportGenerator {
    pub fn new() -> Self {
        Self {
            console_formatter: ConsoleFormatter::new(true, false),
            json_formatter: JsonFormatter::new(true),
            markdown_formatter: MarkdownFormatter::new(true),
        }
    }

    pub fn with_options(use_colors: bool, detailed: bool, pretty_json: bool, include_metadata: bool) -> Self {
        Self {
            console_formatter: ConsoleFormatter::new(use_colors, detailed),
            json_formatter: JsonFormatter::new(pretty_json),
            markdown_formatter: MarkdownFormatter::new(include_metadata),
        }
    }

    pub fn generate_report(&self, report: &AnalysisReport, format: OutputFormat) -> Result<String> {
        match format {
            OutputFormat::Console => self.console_formatter.format_report(report),
            OutputFormat::Json => self.json_formatter.format_report(report),
            OutputFormat::Markdown => self.markdown_formatter.format_report(report),
        }
    }
}

impl Default for ReportGenerator {
    fn default() -> Self {
        Self::new()
    }
}

pub fn save_report_to_file(content: &str, file_path: &Path) -> Result<()> {
    use std::fs;
    if let Some(parent) = file_path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(file_path, content)?;
    Ok(())
}

pub fn suggest_filename(format: OutputFormat, stem: &str, timestamp: bool) -> String {
    let base_name = Path::new(stem)
        .file_stem()
        .unwrap_or_default()
        .to_string_lossy();

    let timestamp_suffix = if timestamp {
        format!("_{}", chrono::Utc::now().format("%Y%m%d_%H%M%S"))
    } else {
        String::new()
    };

    match format {
        OutputFormat::Console => format!("{}_gaps{}.txt", base_name, timestamp_suffix),
        OutputFormat::Json => format!("{}_gaps{}.json", base_name, timestamp_suffix),
        OutputFormat::Markdown => format!("{}_gaps{}.md", base_name, timestamp_suffix),
    }
}
