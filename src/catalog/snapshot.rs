//! Assemble the shared registry and read catalogs from a store

use crate::catalog::jobs::JobProfile;
use crate::catalog::registry::SkillRegistry;
use crate::catalog::resources::ResourceCatalog;
use crate::catalog::skill::{normalize, Skill};
use crate::catalog::store::{CatalogStore, SkillRecord};
use crate::error::{Result, SkillGapError};
use crate::processing::embeddings::Embedder;
use indicatif::{ProgressBar, ProgressStyle};
use log::{info, warn};
use std::sync::Arc;

/// Everything a gap-resolution request reads, loaded once per process
pub struct CatalogSnapshot {
    pub registry: Arc<SkillRegistry>,
    pub jobs: Vec<JobProfile>,
    pub resources: Arc<ResourceCatalog>,
}

impl CatalogSnapshot {
    pub async fn load(
        store: &dyn CatalogStore,
        embedder: &dyn Embedder,
        show_progress: bool,
    ) -> Result<Self> {
        let records = store.load_skills().await?;
        let skills = materialize_skills(records, embedder, show_progress).await?;

        let registry = SkillRegistry::from_skills(embedder.dimension(), skills)?;
        registry.restore_merges(store.load_merges().await?);

        let jobs = store.load_jobs().await?;
        for job in &jobs {
            for requirement in &job.requirements {
                if registry.skill(requirement.skill).is_none() {
                    warn!(
                        "Job '{}' requires unknown skill {}",
                        job.id, requirement.skill
                    );
                }
            }
        }

        let resources = ResourceCatalog::from_resources(store.load_resources().await?);
        info!(
            "Catalog loaded: {} skills, {} jobs, {} resources",
            registry.len(),
            jobs.len(),
            resources.len()
        );

        Ok(Self {
            registry: Arc::new(registry),
            jobs,
            resources: Arc::new(resources),
        })
    }

    pub fn job(&self, id: &str) -> Option<&JobProfile> {
        self.jobs.iter().find(|job| job.id == id)
    }

    /// Jobs to assess: the listed ids (every job when none are listed),
    /// narrowed to titles containing `role`. Selecting nothing is an error.
    pub fn select_jobs(&self, ids: &[String], role: Option<&str>) -> Result<Vec<JobProfile>> {
        let mut jobs = if ids.is_empty() {
            self.jobs.clone()
        } else {
            ids.iter()
                .map(|id| {
                    self.job(id).cloned().ok_or_else(|| {
                        SkillGapError::InvalidInput(format!("Unknown job id: {}", id))
                    })
                })
                .collect::<Result<Vec<_>>>()?
        };

        if let Some(role) = role {
            jobs.retain(|job| job.matches_role(role));
            if jobs.is_empty() {
                return Err(SkillGapError::InvalidInput(format!(
                    "No jobs match role '{}'",
                    role
                )));
            }
            info!("Role '{}' matched {} jobs", role, jobs.len());
        }

        if jobs.is_empty() {
            return Err(SkillGapError::InvalidInput("Catalog has no jobs".to_string()));
        }
        Ok(jobs)
    }
}

/// Turn stored rows into skills, embedding the names of rows stored without a
/// vector. Rows whose stored vector has the wrong length are skipped.
pub async fn materialize_skills(
    records: Vec<SkillRecord>,
    embedder: &dyn Embedder,
    show_progress: bool,
) -> Result<Vec<Skill>> {
    let missing = records.iter().filter(|r| r.embedding.is_none()).count();
    let progress = if show_progress && missing > 0 {
        let bar = ProgressBar::new(missing as u64);
        if let Ok(style) = ProgressStyle::with_template("{msg} [{bar:40}] {pos}/{len}") {
            bar.set_style(style);
        }
        bar.set_message("Embedding skills");
        bar
    } else {
        ProgressBar::hidden()
    };

    let mut skills = Vec::with_capacity(records.len());
    for record in records {
        let embedding = match record.embedding {
            Some(embedding) => embedding,
            None => {
                // same text form the canonicalizer embeds mentions in
                let embedding = embedder.embed(&normalize(&record.name)).await?;
                progress.inc(1);
                embedding
            }
        };

        if embedding.len() != embedder.dimension() {
            warn!(
                "Skill '{}' has a {}-dimensional embedding, expected {}; skipping",
                record.name,
                embedding.len(),
                embedder.dimension()
            );
            continue;
        }

        skills.push(Skill {
            id: record.id,
            name: record.name,
            embedding,
            aliases: record.aliases,
        });
    }
    progress.finish_and_clear();

    Ok(skills)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::skill::SkillId;
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use std::collections::BTreeSet;

    /// Records every text it is asked to embed
    #[derive(Default)]
    struct RecordingEmbedder {
        seen: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl Embedder for RecordingEmbedder {
        async fn embed(&self, text: &str) -> Result<Vec<f32>> {
            self.seen.lock().push(text.to_string());
            if text == "cobol" {
                return Err(SkillGapError::ProviderUnavailable("cobol is down".to_string()));
            }
            Ok(vec![0.6, 0.8])
        }

        fn dimension(&self) -> usize {
            2
        }

        fn model_name(&self) -> &str {
            "recording"
        }
    }

    fn record(id: u64, name: &str, embedding: Option<Vec<f32>>) -> SkillRecord {
        SkillRecord {
            id: SkillId(id),
            name: name.to_string(),
            aliases: BTreeSet::new(),
            embedding,
        }
    }

    #[tokio::test]
    async fn test_names_are_embedded_normalized() {
        let embedder = RecordingEmbedder::default();
        let skills = materialize_skills(
            vec![
                record(1, "Python", Some(vec![1.0, 0.0])),
                record(2, "  Machine   Learning ", None),
            ],
            &embedder,
            false,
        )
        .await
        .unwrap();

        assert_eq!(skills.len(), 2);
        assert_eq!(skills[1].embedding, vec![0.6, 0.8]);
        assert_eq!(skills[1].name, "  Machine   Learning ");
        assert_eq!(*embedder.seen.lock(), vec!["machine learning".to_string()]);
    }

    #[tokio::test]
    async fn test_wrong_dimension_rows_dropped_and_provider_failure_propagates() {
        let embedder = RecordingEmbedder::default();
        let skills = materialize_skills(
            vec![record(1, "Python", Some(vec![1.0, 0.0, 0.0])), record(2, "SQL", None)],
            &embedder,
            false,
        )
        .await
        .unwrap();
        assert_eq!(skills.iter().map(|s| s.id).collect::<Vec<_>>(), vec![SkillId(2)]);

        let result = materialize_skills(vec![record(3, "COBOL", None)], &embedder, false).await;
        assert!(matches!(result, Err(SkillGapError::ProviderUnavailable(_))));
    }
}
