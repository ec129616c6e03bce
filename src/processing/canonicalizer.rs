//! Resolve free-text skill mentions to canonical skills

use crate::catalog::registry::SkillRegistry;
use crate::catalog::skill::{ResolvedSkill, SkillMention};
use crate::config::MatchingConfig;
use crate::error::Result;
use crate::processing::embeddings::Embedder;
use log::debug;
use std::sync::Arc;

/// Three tiers: exact name/alias match, embedding nearest neighbor above the
/// acceptance threshold, or unresolved.
pub struct SkillCanonicalizer {
    registry: Arc<SkillRegistry>,
    embedder: Arc<dyn Embedder>,
    acceptance_threshold: f32,
    tie_epsilon: f32,
}

impl SkillCanonicalizer {
    pub fn new(
        registry: Arc<SkillRegistry>,
        embedder: Arc<dyn Embedder>,
        config: &MatchingConfig,
    ) -> Self {
        Self {
            registry,
            embedder,
            acceptance_threshold: config.acceptance_threshold,
            tie_epsilon: config.tie_epsilon,
        }
    }

    pub fn acceptance_threshold(&self) -> f32 {
        self.acceptance_threshold
    }

    /// Resolve one mention. Only a provider failure is an error.
    pub async fn resolve(&self, mention: &SkillMention) -> Result<ResolvedSkill> {
        let normalized = mention.normalized();
        if normalized.is_empty() {
            debug!("Empty mention, leaving unresolved");
            return Ok(ResolvedSkill::unresolved(mention, None));
        }

        if let Some(skill) = self.registry.lookup_exact(&normalized) {
            debug!("'{}' matched {} exactly", mention.raw_text, skill);
            return Ok(ResolvedSkill::exact(mention, skill));
        }

        // no registry lock is held across this call
        let vector = self.embedder.embed(&normalized).await?;
        let nearest = self.registry.index().nearest(&vector, self.tie_epsilon)?;

        match nearest {
            Some(neighbor) if neighbor.similarity >= self.acceptance_threshold => {
                let skill = self.registry.canonical_id(neighbor.skill);
                let similarity = neighbor.similarity.min(1.0);
                debug!(
                    "'{}' fuzzy-matched {} at {:.3}",
                    mention.raw_text, skill, similarity
                );
                Ok(ResolvedSkill::fuzzy(mention, skill, similarity))
            }
            nearest => {
                let best = nearest.map(|n| n.similarity);
                debug!(
                    "'{}' unresolved (best similarity {:?}, threshold {})",
                    mention.raw_text, best, self.acceptance_threshold
                );
                Ok(ResolvedSkill::unresolved(mention, best))
            }
        }
    }
}
