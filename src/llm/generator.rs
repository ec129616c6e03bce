//! Natural-language explanations of a job's roadmap

use crate::catalog::registry::SkillRegistry;
use crate::catalog::skill::SkillId;
use crate::error::{Result, SkillGapError};
use crate::llm::prompts::{PromptGap, PromptParams, PromptTemplates};
use crate::processing::analyzer::JobAssessment;
use async_trait::async_trait;
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::process::Stdio;
use std::sync::Arc;
use std::time::Instant;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

pub const DEFAULT_DURATION: &str = "90 days";

/// Candidate summary used when none is supplied
pub fn role_summary(role: &str) -> String {
    format!("A user targeting the role of {}", role.trim())
}

/// Turns a prompt into free text. The output is never parsed.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<String>;
}

/// Pipes the prompt to an external program's stdin and returns its stdout,
/// e.g. `ollama run llama3`
#[derive(Debug, Clone)]
pub struct CommandGenerator {
    program: String,
    args: Vec<String>,
}

impl CommandGenerator {
    pub fn from_command_line(command_line: &str) -> Result<Self> {
        let mut parts = command_line.split_whitespace().map(str::to_string);
        let program = parts.next().ok_or_else(|| {
            SkillGapError::Configuration("Generator command is empty".to_string())
        })?;
        Ok(Self {
            program,
            args: parts.collect(),
        })
    }

    fn command_string(&self) -> String {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

#[async_trait]
impl TextGenerator for CommandGenerator {
    async fn generate(&self, prompt: &str) -> Result<String> {
        let command = self.command_string();
        debug!("Running generator: {}", command);

        let mut child = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                SkillGapError::ProviderUnavailable(format!("Failed to start '{}': {}", command, e))
            })?;

        if let Some(mut stdin) = child.stdin.take() {
            stdin.write_all(prompt.as_bytes()).await.map_err(|e| {
                SkillGapError::ProviderUnavailable(format!("Failed to send prompt: {}", e))
            })?;
        }

        let output = child.wait_with_output().await.map_err(|e| {
            SkillGapError::ProviderUnavailable(format!("Generator '{}' failed: {}", command, e))
        })?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(SkillGapError::ProviderUnavailable(format!(
                "Generator '{}' exited with {}: {}",
                command,
                output.status,
                stderr.trim()
            )));
        }

        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Explanation {
    pub job_id: String,
    pub prompt: String,
    pub text: String,
    /// Skills the prompt covered, in roadmap order
    pub explained_skills: Vec<SkillId>,
    pub generation_time_ms: u64,
}

pub struct ExplanationService {
    generator: Arc<dyn TextGenerator>,
    templates: PromptTemplates,
    max_explained_gaps: usize,
}

impl ExplanationService {
    pub fn new(generator: Arc<dyn TextGenerator>, max_explained_gaps: usize) -> Self {
        Self {
            generator,
            templates: PromptTemplates::default(),
            max_explained_gaps,
        }
    }

    pub fn with_templates(mut self, templates: PromptTemplates) -> Self {
        self.templates = templates;
        self
    }

    /// Prompt parameters for the largest gaps of one assessed job
    pub fn build_params(
        registry: &SkillRegistry,
        assessment: &JobAssessment,
        summary: Option<&str>,
        duration: Option<&str>,
        max_explained_gaps: usize,
    ) -> PromptParams {
        let job_title = assessment.report.job_title.clone();
        let candidate_summary = summary
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| role_summary(&job_title));

        let gaps = assessment
            .roadmap
            .items
            .iter()
            .take(max_explained_gaps)
            .map(|item| PromptGap {
                skill_name: registry.name_of(item.skill),
                importance: item.required_weight,
                gap: item.gap,
                resources: item
                    .chosen_resources
                    .iter()
                    .map(|r| format!("{} ({}, {}h): {}", r.title, r.difficulty, r.estimated_hours, r.url))
                    .collect(),
            })
            .collect();

        PromptParams {
            candidate_summary,
            job_title,
            duration: duration
                .map(str::trim)
                .filter(|d| !d.is_empty())
                .unwrap_or(DEFAULT_DURATION)
                .to_string(),
            gaps,
        }
    }

    pub fn build_prompt(
        &self,
        registry: &SkillRegistry,
        assessment: &JobAssessment,
        summary: Option<&str>,
        duration: Option<&str>,
    ) -> String {
        let params =
            Self::build_params(registry, assessment, summary, duration, self.max_explained_gaps);
        self.templates.render_explanation(&params)
    }

    pub async fn explain(
        &self,
        registry: &SkillRegistry,
        assessment: &JobAssessment,
        summary: Option<&str>,
        duration: Option<&str>,
    ) -> Result<Explanation> {
        let started = Instant::now();
        let prompt = self.build_prompt(registry, assessment, summary, duration);
        let explained_skills = assessment
            .roadmap
            .items
            .iter()
            .take(self.max_explained_gaps)
            .map(|item| item.skill)
            .collect();

        info!("Generating explanation for job '{}'", assessment.report.job_id);
        let text = self.generator.generate(&prompt).await?;

        Ok(Explanation {
            job_id: assessment.report.job_id.clone(),
            prompt,
            text,
            explained_skills,
            generation_time_ms: started.elapsed().as_millis() as u64,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::jobs::JobProfile;
    use crate::catalog::resources::{Difficulty, LearningResource, ResourceCatalog};
    use crate::catalog::skill::{ResolvedSkill, Skill, SkillMention};
    use crate::config::Config;
    use crate::processing::gap_scorer::{CandidateProfile, GapScorer};
    use crate::processing::sequencer::RoadmapSequencer;
    use parking_lot::Mutex;

    /// Records every prompt and answers with a fixed reply
    struct RecordingGenerator {
        prompts: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl TextGenerator for RecordingGenerator {
        async fn generate(&self, prompt: &str) -> Result<String> {
            self.prompts.lock().push(prompt.to_string());
            Ok("Start with containers.".to_string())
        }
    }

    struct DownGenerator;

    #[async_trait]
    impl TextGenerator for DownGenerator {
        async fn generate(&self, _prompt: &str) -> Result<String> {
            Err(SkillGapError::ProviderUnavailable("generator offline".to_string()))
        }
    }

    fn registry() -> SkillRegistry {
        SkillRegistry::from_skills(
            1,
            vec![
                Skill::new(SkillId(1), "Python", vec![1.0]),
                Skill::new(SkillId(2), "SQL", vec![1.0]),
                Skill::new(SkillId(3), "Docker", vec![1.0]),
                Skill::new(SkillId(4), "Kubernetes", vec![1.0]),
            ],
        )
        .unwrap()
    }

    fn assessment() -> JobAssessment {
        let job = JobProfile::new("platform", "Platform Engineer")
            .with_requirement(SkillId(1), 0.4)
            .with_requirement(SkillId(2), 0.5)
            .with_requirement(SkillId(3), 0.9)
            .with_requirement(SkillId(4), 0.8);
        let resolved = vec![ResolvedSkill::exact(&SkillMention::new("python", 0.2), SkillId(1))];
        let report = GapScorer::score(&CandidateProfile::from_resolved(&resolved), &job);

        let catalog = ResourceCatalog::from_resources(vec![LearningResource {
            skill: SkillId(3),
            title: "Docker Basics".to_string(),
            url: "https://learn.example.com/docker".to_string(),
            difficulty: Difficulty::Beginner,
            estimated_hours: 6,
        }]);
        let roadmap = RoadmapSequencer::from_config(&Config::default().roadmap).sequence(&report, &catalog);

        JobAssessment {
            rank: 1,
            report,
            roadmap,
        }
    }

    #[test]
    fn test_params_take_largest_gaps_with_defaults() {
        let params = ExplanationService::build_params(&registry(), &assessment(), None, None, 3);
        assert_eq!(params.candidate_summary, "A user targeting the role of Platform Engineer");
        assert_eq!(params.duration, "90 days");

        let names: Vec<&str> = params.gaps.iter().map(|g| g.skill_name.as_str()).collect();
        assert_eq!(names, vec!["Docker", "Kubernetes", "SQL"]);
        assert_eq!(
            params.gaps[0].resources,
            vec!["Docker Basics (beginner, 6h): https://learn.example.com/docker".to_string()]
        );
        assert!(params.gaps[1].resources.is_empty());
    }

    #[test]
    fn test_requested_role_drives_summary() {
        let summary = role_summary(" platform ");
        assert_eq!(summary, "A user targeting the role of platform");

        let params = ExplanationService::build_params(&registry(), &assessment(), Some(&summary), None, 3);
        assert_eq!(params.candidate_summary, "A user targeting the role of platform");
        assert_eq!(params.job_title, "Platform Engineer");
    }

    #[tokio::test]
    async fn test_explain_passes_output_through() {
        let generator = Arc::new(RecordingGenerator {
            prompts: Mutex::new(Vec::new()),
        });
        let service = ExplanationService::new(generator.clone(), 2);

        let explanation = service
            .explain(&registry(), &assessment(), Some("Backend developer"), Some("6 weeks"))
            .await
            .unwrap();

        assert_eq!(explanation.text, "Start with containers.");
        assert_eq!(explanation.explained_skills, vec![SkillId(3), SkillId(4)]);
        let prompts = generator.prompts.lock();
        assert_eq!(prompts.len(), 1);
        assert!(prompts[0].contains("Backend developer"));
        assert!(prompts[0].contains("6 weeks"));
        assert!(!prompts[0].contains("SQL"));
    }

    #[tokio::test]
    async fn test_generator_failure_is_reported() {
        let service = ExplanationService::new(Arc::new(DownGenerator), 3);
        let result = service.explain(&registry(), &assessment(), None, None).await;
        assert!(matches!(result, Err(SkillGapError::ProviderUnavailable(_))));
    }

    #[test]
    fn test_empty_generator_command_is_rejected() {
        assert!(CommandGenerator::from_command_line("   ").is_err());
        let generator = CommandGenerator::from_command_line("ollama run llama3").unwrap();
        assert_eq!(generator.command_string(), "ollama run llama3");
    }
}
