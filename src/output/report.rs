//! Presentation view of a gap resolution, with skill names resolved

use crate::catalog::registry::SkillRegistry;
use crate::catalog::skill::{MatchKind, ResolvedSkill};
use crate::llm::generator::Explanation;
use crate::processing::analyzer::{GapResolution, JobAssessment, MentionResolution};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisReport {
    pub summary: ReportSummary,
    pub mentions: Vec<MentionView>,
    pub unresolved: Vec<MentionView>,
    /// Best fit first
    pub jobs: Vec<JobView>,
    pub metadata: ReportMetadata,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportSummary {
    pub resolved_mentions: usize,
    pub unresolved_mentions: usize,
    pub canonical_skills: usize,
    pub jobs_assessed: usize,
    pub best_job: Option<String>,
    pub best_fit_percentage: Option<u8>,
    pub verdict: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MentionView {
    pub mention: String,
    pub skill: Option<String>,
    pub match_kind: MatchKind,
    pub confidence: f32,
    pub similarity: Option<f32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobView {
    pub rank: usize,
    pub job_id: String,
    pub job_title: String,
    pub aggregate_gap: f32,
    pub fit_percentage: u8,
    pub no_requirements: bool,
    pub gaps: Vec<GapView>,
    pub surplus_skills: Vec<String>,
    pub roadmap: Vec<RoadmapStepView>,
    pub total_hours: u32,
    pub schedule: Vec<ScheduleWeekView>,
    pub explanation: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GapView {
    pub skill: String,
    pub required_weight: f32,
    pub candidate_confidence: f32,
    pub gap: f32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoadmapStepView {
    pub position: usize,
    pub skill: String,
    pub gap: f32,
    pub unserviceable: bool,
    pub hours: u32,
    pub resources: Vec<ResourceView>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResourceView {
    pub title: String,
    pub url: String,
    pub difficulty: String,
    pub hours: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleWeekView {
    pub label: String,
    pub hours: u32,
    pub items: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportMetadata {
    pub generated_at: DateTime<Utc>,
    pub processing_time_ms: u64,
    pub embedding_model: String,
    pub tool_version: String,
}

impl AnalysisReport {
    pub fn from_resolution(
        resolution: &GapResolution,
        registry: &SkillRegistry,
        weekly_hours: u32,
        embedding_model: &str,
    ) -> Self {
        let jobs: Vec<JobView> = resolution
            .assessments
            .iter()
            .map(|assessment| Self::job_view(assessment, registry, weekly_hours))
            .collect();

        let mut report = Self::from_mentions(&resolution.mentions, registry, embedding_model);
        report.summary.canonical_skills = resolution.candidate.len();
        report.summary.jobs_assessed = jobs.len();
        report.summary.best_job = jobs.first().map(|j| j.job_title.clone());
        report.summary.best_fit_percentage = jobs.first().map(|j| j.fit_percentage);
        report.summary.verdict = Self::verdict(jobs.first());
        report.jobs = jobs;
        report.metadata.generated_at = resolution.generated_at;
        report.metadata.processing_time_ms = resolution.processing_time_ms;
        report
    }

    /// Canonicalization-only report with no job section
    pub fn from_mentions(
        mentions: &MentionResolution,
        registry: &SkillRegistry,
        embedding_model: &str,
    ) -> Self {
        let resolved: Vec<MentionView> = mentions
            .resolved
            .iter()
            .map(|m| Self::mention_view(m, registry))
            .collect();
        let unresolved: Vec<MentionView> = mentions
            .unresolved
            .iter()
            .map(|m| Self::mention_view(m, registry))
            .collect();

        let mut canonical: Vec<_> = mentions.resolved.iter().filter_map(|m| m.skill).collect();
        canonical.dedup();

        Self {
            summary: ReportSummary {
                resolved_mentions: resolved.len(),
                unresolved_mentions: unresolved.len(),
                canonical_skills: canonical.len(),
                jobs_assessed: 0,
                best_job: None,
                best_fit_percentage: None,
                verdict: "No jobs assessed".to_string(),
            },
            mentions: resolved,
            unresolved,
            jobs: Vec::new(),
            metadata: ReportMetadata {
                generated_at: Utc::now(),
                processing_time_ms: 0,
                embedding_model: embedding_model.to_string(),
                tool_version: env!("CARGO_PKG_VERSION").to_string(),
            },
        }
    }

    /// Attach generated text to the job it explains
    pub fn with_explanation(mut self, explanation: Explanation) -> Self {
        if let Some(job) = self.jobs.iter_mut().find(|j| j.job_id == explanation.job_id) {
            job.explanation = Some(explanation.text);
        }
        self
    }

    fn mention_view(resolved: &ResolvedSkill, registry: &SkillRegistry) -> MentionView {
        MentionView {
            mention: resolved.mention.clone(),
            skill: resolved.skill.map(|id| registry.name_of(id)),
            match_kind: resolved.match_kind,
            confidence: resolved.confidence,
            similarity: resolved.similarity,
        }
    }

    fn job_view(assessment: &JobAssessment, registry: &SkillRegistry, weekly_hours: u32) -> JobView {
        let report = &assessment.report;
        let roadmap = &assessment.roadmap;

        let gaps = report
            .entries
            .iter()
            .map(|entry| GapView {
                skill: registry.name_of(entry.skill),
                required_weight: entry.required_weight,
                candidate_confidence: entry.candidate_confidence,
                gap: entry.gap,
            })
            .collect();

        let steps = roadmap
            .items
            .iter()
            .map(|item| RoadmapStepView {
                position: item.sequence_position,
                skill: registry.name_of(item.skill),
                gap: item.gap,
                unserviceable: item.unserviceable,
                hours: item.total_hours(),
                resources: item
                    .chosen_resources
                    .iter()
                    .map(|r| ResourceView {
                        title: r.title.clone(),
                        url: r.url.clone(),
                        difficulty: r.difficulty.to_string(),
                        hours: r.estimated_hours,
                    })
                    .collect(),
            })
            .collect();

        let schedule = roadmap
            .schedule(weekly_hours)
            .into_iter()
            .map(|period| ScheduleWeekView {
                label: period.label,
                hours: period.hours,
                items: period
                    .entries
                    .iter()
                    .map(|e| format!("{}: {}", registry.name_of(e.skill), e.resource.title))
                    .collect(),
            })
            .collect();

        JobView {
            rank: assessment.rank,
            job_id: report.job_id.clone(),
            job_title: report.job_title.clone(),
            aggregate_gap: report.aggregate_gap,
            fit_percentage: report.fit_percentage(),
            no_requirements: report.no_requirements,
            gaps,
            surplus_skills: report
                .surplus_skills
                .iter()
                .map(|id| registry.name_of(*id))
                .collect(),
            roadmap: steps,
            total_hours: roadmap.total_hours(),
            schedule,
            explanation: None,
        }
    }

    fn verdict(best: Option<&JobView>) -> String {
        match best {
            None => "No jobs assessed".to_string(),
            Some(job) if job.no_requirements => {
                format!("{} lists no requirements", job.job_title)
            }
            Some(job) => {
                let fit = match job.fit_percentage {
                    100 => "Fully qualified",
                    80..=99 => "Strong fit",
                    60..=79 => "Good fit",
                    40..=59 => "Partial fit",
                    _ => "Significant gaps",
                };
                format!("{} for {}", fit, job.job_title)
            }
        }
    }
}
