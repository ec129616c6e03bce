//! Gap-resolution engine: canonicalize mentions, score jobs, sequence roadmaps

use crate::catalog::jobs::JobProfile;
use crate::catalog::registry::SkillRegistry;
use crate::catalog::resources::ResourceCatalog;
use crate::catalog::skill::{normalize, ResolvedSkill, SkillMention};
use crate::config::Config;
use crate::error::{Result, SkillGapError};
use crate::processing::canonicalizer::SkillCanonicalizer;
use crate::processing::embeddings::Embedder;
use crate::processing::gap_scorer::{CandidateProfile, GapScorer, JobGapReport};
use crate::processing::sequencer::{Roadmap, RoadmapSequencer};
use chrono::{DateTime, Utc};
use futures::stream::{self, StreamExt, TryStreamExt};
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// One gap-resolution request
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GapRequest {
    pub mentions: Vec<SkillMention>,
    pub jobs: Vec<JobProfile>,
}

/// Canonicalization outcome split by whether a skill was found
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MentionResolution {
    /// Ordered by skill id, then mention text
    pub resolved: Vec<ResolvedSkill>,
    /// Ordered by normalized mention text
    pub unresolved: Vec<ResolvedSkill>,
}

impl MentionResolution {
    fn from_outcomes(outcomes: Vec<ResolvedSkill>) -> Self {
        let (mut resolved, mut unresolved): (Vec<_>, Vec<_>) =
            outcomes.into_iter().partition(ResolvedSkill::is_resolved);

        resolved.sort_by(|a, b| {
            a.skill
                .cmp(&b.skill)
                .then_with(|| normalize(&a.mention).cmp(&normalize(&b.mention)))
                .then_with(|| b.confidence.total_cmp(&a.confidence))
        });
        unresolved.sort_by(|a, b| {
            normalize(&a.mention)
                .cmp(&normalize(&b.mention))
                .then_with(|| a.mention.cmp(&b.mention))
        });

        Self {
            resolved,
            unresolved,
        }
    }

    pub fn candidate(&self) -> CandidateProfile {
        CandidateProfile::from_resolved(&self.resolved)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobAssessment {
    /// 1 = best fit
    pub rank: usize,
    pub report: JobGapReport,
    pub roadmap: Roadmap,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GapResolution {
    pub mentions: MentionResolution,
    pub candidate: CandidateProfile,
    /// Best fit first
    pub assessments: Vec<JobAssessment>,
    pub processing_time_ms: u64,
    pub generated_at: DateTime<Utc>,
}

impl GapResolution {
    pub fn best(&self) -> Option<&JobAssessment> {
        self.assessments.first()
    }

    pub fn assessment(&self, job_id: &str) -> Option<&JobAssessment> {
        self.assessments.iter().find(|a| a.report.job_id == job_id)
    }
}

/// Coordinates the canonicalizer, gap scorer and roadmap sequencer for one
/// request at a time; any number of requests may share one engine.
pub struct GapAnalysisEngine {
    canonicalizer: SkillCanonicalizer,
    resources: Arc<ResourceCatalog>,
    sequencer: RoadmapSequencer,
    request_timeout: Option<Duration>,
    max_concurrent_embeddings: usize,
}

impl GapAnalysisEngine {
    pub fn new(
        registry: Arc<SkillRegistry>,
        embedder: Arc<dyn Embedder>,
        resources: Arc<ResourceCatalog>,
        config: &Config,
    ) -> Self {
        let request_timeout = match config.engine.request_timeout_ms {
            0 => None,
            ms => Some(Duration::from_millis(ms)),
        };

        Self {
            canonicalizer: SkillCanonicalizer::new(registry, embedder, &config.matching),
            resources,
            sequencer: RoadmapSequencer::from_config(&config.roadmap),
            request_timeout,
            max_concurrent_embeddings: config.engine.max_concurrent_embeddings.max(1),
        }
    }

    /// Canonicalize mentions only, under the request timeout
    pub async fn resolve(&self, mentions: &[SkillMention]) -> Result<MentionResolution> {
        self.with_timeout(self.resolve_mentions(mentions)).await
    }

    /// Run a full request. Either every job is assessed or an error is
    /// returned; a timeout drops all in-flight provider calls.
    pub async fn analyze(&self, request: &GapRequest) -> Result<GapResolution> {
        let started = Instant::now();
        info!(
            "Analyzing {} mentions against {} jobs",
            request.mentions.len(),
            request.jobs.len()
        );

        let mentions = self.with_timeout(self.resolve_mentions(&request.mentions)).await?;
        let candidate = mentions.candidate();
        debug!(
            "Candidate holds {} canonical skills, {} mentions unresolved",
            candidate.len(),
            mentions.unresolved.len()
        );

        let reports: Vec<JobGapReport> = request
            .jobs
            .iter()
            .map(|job| GapScorer::score(&candidate, job))
            .collect();

        let assessments: Vec<JobAssessment> = GapScorer::rank(reports)
            .into_iter()
            .enumerate()
            .map(|(index, report)| {
                let roadmap = self.sequencer.sequence(&report, &self.resources);
                JobAssessment {
                    rank: index + 1,
                    report,
                    roadmap,
                }
            })
            .collect();

        let processing_time_ms = started.elapsed().as_millis() as u64;
        info!("Analysis completed in {}ms", processing_time_ms);

        Ok(GapResolution {
            mentions,
            candidate,
            assessments,
            processing_time_ms,
            generated_at: Utc::now(),
        })
    }

    /// Resolve every mention with at most `max_concurrent_embeddings` provider
    /// calls in flight. The first provider failure aborts the rest.
    async fn resolve_mentions(&self, mentions: &[SkillMention]) -> Result<MentionResolution> {
        let canonicalizer = &self.canonicalizer;
        let outcomes: Vec<ResolvedSkill> = stream::iter(mentions)
            .map(|mention| canonicalizer.resolve(mention))
            .buffer_unordered(self.max_concurrent_embeddings)
            .try_collect()
            .await?;

        Ok(MentionResolution::from_outcomes(outcomes))
    }

    async fn with_timeout<T>(&self, work: impl Future<Output = Result<T>>) -> Result<T> {
        match self.request_timeout {
            Some(limit) => match tokio::time::timeout(limit, work).await {
                Ok(result) => result,
                Err(_) => {
                    warn!("Request exceeded {}ms, abandoning", limit.as_millis());
                    Err(SkillGapError::Timeout(limit.as_millis() as u64))
                }
            },
            None => work.await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::resources::{Difficulty, LearningResource};
    use crate::catalog::skill::{MatchKind, Skill, SkillId};
    use async_trait::async_trait;
    use std::collections::HashMap;

    /// Looks vectors up in a table, sleeping a per-text delay first
    struct SlowTableEmbedder {
        table: HashMap<String, (Vec<f32>, u64)>,
    }

    #[async_trait]
    impl Embedder for SlowTableEmbedder {
        async fn embed(&self, text: &str) -> Result<Vec<f32>> {
            let (vector, delay_ms) = self
                .table
                .get(text)
                .cloned()
                .ok_or_else(|| SkillGapError::ProviderUnavailable(format!("no vector for {}", text)))?;
            tokio::time::sleep(Duration::from_millis(delay_ms)).await;
            Ok(vector)
        }

        fn dimension(&self) -> usize {
            3
        }

        fn model_name(&self) -> &str {
            "slow-table"
        }
    }

    fn registry() -> Arc<SkillRegistry> {
        Arc::new(
            SkillRegistry::from_skills(
                3,
                vec![
                    Skill::new(SkillId(1), "Python", vec![1.0, 0.0, 0.0]),
                    Skill::new(SkillId(2), "SQL", vec![0.0, 1.0, 0.0]),
                    Skill::new(SkillId(3), "Docker", vec![0.0, 0.0, 1.0]),
                ],
            )
            .unwrap(),
        )
    }

    fn embedder(slow_ms: u64) -> Arc<dyn Embedder> {
        let similar = 0.88_f32;
        let table = HashMap::from([
            (
                "pyhton".to_string(),
                (vec![similar, (1.0 - similar * similar).sqrt(), 0.0], slow_ms),
            ),
            ("structured query".to_string(), (vec![0.1, 0.99, 0.0], 1)),
            ("knitting".to_string(), (vec![0.5, 0.5, 0.5], 2)),
        ]);
        Arc::new(SlowTableEmbedder { table })
    }

    fn resources() -> Arc<ResourceCatalog> {
        let resource = |skill: u64, title: &str, hours: u32| LearningResource {
            skill: SkillId(skill),
            title: title.to_string(),
            url: format!("https://learn.example.com/{}", skill),
            difficulty: Difficulty::Beginner,
            estimated_hours: hours,
        };
        Arc::new(ResourceCatalog::from_resources(vec![
            resource(1, "Python Deep Dive", 12),
            resource(3, "Docker Basics", 6),
        ]))
    }

    fn engine(config: &Config, slow_ms: u64) -> GapAnalysisEngine {
        GapAnalysisEngine::new(registry(), embedder(slow_ms), resources(), config)
    }

    fn data_job() -> JobProfile {
        JobProfile::new("data", "Data Engineer")
            .with_requirement(SkillId(1), 1.0)
            .with_requirement(SkillId(2), 0.5)
            .with_requirement(SkillId(3), 0.6)
    }

    #[tokio::test]
    async fn test_analyze_worked_example() {
        let engine = engine(&Config::default(), 1);
        let request = GapRequest {
            mentions: vec![SkillMention::new("Pyhton", 0.9), SkillMention::new("sql", 0.8)],
            jobs: vec![data_job()],
        };

        let resolution = engine.analyze(&request).await.unwrap();
        assert_eq!(resolution.mentions.resolved.len(), 2);
        assert!(resolution.mentions.unresolved.is_empty());
        assert_eq!(resolution.mentions.resolved[0].skill, Some(SkillId(1)));
        assert_eq!(resolution.mentions.resolved[0].match_kind, MatchKind::Fuzzy);
        assert_eq!(resolution.mentions.resolved[1].match_kind, MatchKind::Exact);

        let best = resolution.best().unwrap();
        assert_eq!(best.rank, 1);
        assert!((best.report.aggregate_gap - 0.385).abs() < 1e-3);
        let order: Vec<SkillId> = best.roadmap.items.iter().map(|i| i.skill).collect();
        assert_eq!(order, vec![SkillId(3), SkillId(1)]);
    }

    #[tokio::test]
    async fn test_resolved_order_ignores_completion_order() {
        let mut config = Config::default();
        config.engine.max_concurrent_embeddings = 4;
        // the Python mention finishes last
        let engine = engine(&config, 40);
        let mentions = vec![
            SkillMention::new("Knitting", 1.0),
            SkillMention::new("Docker", 1.0),
            SkillMention::new("Structured Query", 1.0),
            SkillMention::new("Pyhton", 1.0),
        ];

        let resolution = engine.resolve(&mentions).await.unwrap();
        let ids: Vec<Option<SkillId>> = resolution.resolved.iter().map(|r| r.skill).collect();
        assert_eq!(ids, vec![Some(SkillId(1)), Some(SkillId(2)), Some(SkillId(3))]);
        assert_eq!(resolution.unresolved.len(), 1);
        assert_eq!(resolution.unresolved[0].mention, "Knitting");
    }

    #[tokio::test]
    async fn test_timeout_returns_no_partial_result() {
        let mut config = Config::default();
        config.engine.request_timeout_ms = 20;
        let engine = engine(&config, 5_000);
        let request = GapRequest {
            mentions: vec![SkillMention::new("sql", 1.0), SkillMention::new("Pyhton", 1.0)],
            jobs: vec![data_job()],
        };

        let result = engine.analyze(&request).await;
        assert!(matches!(result, Err(SkillGapError::Timeout(20))));
    }

    #[tokio::test]
    async fn test_provider_failure_aborts_request() {
        let engine = engine(&Config::default(), 1);
        let request = GapRequest {
            mentions: vec![SkillMention::new("sql", 1.0), SkillMention::new("Haskell", 1.0)],
            jobs: vec![data_job()],
        };

        let result = engine.analyze(&request).await;
        assert!(matches!(result, Err(SkillGapError::ProviderUnavailable(_))));
    }

    #[tokio::test]
    async fn test_jobs_ranked_best_fit_first() {
        let engine = engine(&Config::default(), 1);
        let request = GapRequest {
            mentions: vec![SkillMention::new("docker", 1.0)],
            jobs: vec![
                data_job(),
                JobProfile::new("ops", "Platform Engineer").with_requirement(SkillId(3), 0.8),
                JobProfile::new("greeter", "Greeter"),
            ],
        };

        let resolution = engine.analyze(&request).await.unwrap();
        let ranked: Vec<(&str, usize)> = resolution
            .assessments
            .iter()
            .map(|a| (a.report.job_id.as_str(), a.rank))
            .collect();
        // both fully qualified: ops covers more weight than the empty job
        assert_eq!(ranked, vec![("ops", 1), ("greeter", 2), ("data", 3)]);
        assert!(resolution.assessment("greeter").unwrap().report.no_requirements);
        assert!(resolution.assessment("ops").unwrap().roadmap.is_empty());
    }
}
