//! Process-wide skill vocabulary and vector index, shared by every request

use crate::catalog::reconciliation::{MergeProposal, MergeQueue, MergeStatus};
use crate::catalog::skill::{normalize, Skill, SkillId};
use crate::catalog::vocabulary::SkillVocabulary;
use crate::error::{Result, SkillGapError};
use crate::processing::embeddings::cosine_similarity;
use crate::processing::vector_index::VectorIndex;
use log::{info, warn};
use parking_lot::{Mutex, RwLock};
use std::sync::Arc;

/// Read-mostly state consulted by the canonicalizer.
///
/// Built explicitly at startup and handed to components as an `Arc`.
/// Writers take the vocabulary lock before the index lock; readers never hold
/// both, and no lock outlives a single call.
#[derive(Debug)]
pub struct SkillRegistry {
    vocabulary: RwLock<SkillVocabulary>,
    index: VectorIndex,
    merges: Mutex<MergeQueue>,
}

impl SkillRegistry {
    pub fn new(dimension: usize) -> Self {
        Self {
            vocabulary: RwLock::new(SkillVocabulary::new()),
            index: VectorIndex::new(dimension),
            merges: Mutex::new(MergeQueue::new()),
        }
    }

    pub fn from_skills(dimension: usize, skills: Vec<Skill>) -> Result<Self> {
        let registry = Self::new(dimension);
        registry.reload(skills)?;
        Ok(registry)
    }

    /// Replace vocabulary and index from a fresh skill snapshot.
    ///
    /// Confirmed merges already in the queue are re-applied to the new vocabulary.
    pub fn reload(&self, skills: Vec<Skill>) -> Result<usize> {
        let mut fresh = SkillVocabulary::from_skills(skills);
        let confirmed: Vec<MergeProposal> = self.merges.lock().confirmed().cloned().collect();
        for proposal in &confirmed {
            if let Err(e) = fresh.redirect(proposal.absorbed, proposal.survivor) {
                warn!("Skipping confirmed merge {}: {}", proposal.id, e);
            }
        }

        let mut vocabulary = self.vocabulary.write();
        let searchable: Vec<&Skill> = fresh
            .iter()
            .filter(|s| !fresh.is_merged(s.id))
            .map(|s| s.as_ref())
            .collect();
        let count = self.index.rebuild(searchable)?;
        *vocabulary = fresh;

        info!("Skill registry loaded: {} skills, {} indexed", vocabulary.len(), count);
        Ok(count)
    }

    /// Add a new canonical skill with the next free identity
    pub fn append_skill(
        &self,
        name: &str,
        embedding: Vec<f32>,
        aliases: impl IntoIterator<Item = String>,
    ) -> Result<Arc<Skill>> {
        let mut vocabulary = self.vocabulary.write();
        let mut skill = Skill::new(vocabulary.next_id(), name.trim(), embedding);
        skill.aliases.extend(aliases);
        self.insert_locked(&mut vocabulary, skill)
    }

    /// Add a skill with a caller-chosen identity
    pub fn insert(&self, skill: Skill) -> Result<Arc<Skill>> {
        let mut vocabulary = self.vocabulary.write();
        self.insert_locked(&mut vocabulary, skill)
    }

    fn insert_locked(&self, vocabulary: &mut SkillVocabulary, skill: Skill) -> Result<Arc<Skill>> {
        if skill.embedding.len() != self.index.dimension() {
            return Err(SkillGapError::DimensionMismatch {
                expected: self.index.dimension(),
                actual: skill.embedding.len(),
            });
        }
        let skill = vocabulary.insert(skill)?;
        self.index.insert_skill(&skill)?;
        info!("Added canonical skill '{}' ({})", skill.name, skill.id);
        Ok(skill)
    }

    pub fn add_alias(&self, id: SkillId, alias: &str) -> Result<()> {
        self.vocabulary.write().add_alias(id, alias)
    }

    /// Exact name/alias match of raw text
    pub fn lookup_exact(&self, text: &str) -> Option<SkillId> {
        self.vocabulary.read().lookup_exact(&normalize(text))
    }

    pub fn skill(&self, id: SkillId) -> Option<Arc<Skill>> {
        self.vocabulary.read().get(id).cloned()
    }

    pub fn name_of(&self, id: SkillId) -> String {
        self.vocabulary
            .read()
            .name_of(id)
            .map(str::to_string)
            .unwrap_or_else(|| id.to_string())
    }

    pub fn canonical_id(&self, id: SkillId) -> SkillId {
        self.vocabulary.read().canonical_id(id)
    }

    pub fn skills(&self) -> Vec<Arc<Skill>> {
        self.vocabulary.read().iter().cloned().collect()
    }

    pub fn index(&self) -> &VectorIndex {
        &self.index
    }

    pub fn dimension(&self) -> usize {
        self.index.dimension()
    }

    pub fn len(&self) -> usize {
        self.vocabulary.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.vocabulary.read().is_empty()
    }

    /// Queue every indexed pair at or above `threshold` for review
    pub fn suggest_merges(&self, threshold: f32) -> Vec<MergeProposal> {
        let pairs = self.index.similar_pairs(threshold);
        let mut queue = self.merges.lock();
        let mut added = Vec::new();
        for (a, b, similarity) in pairs {
            if let Some(proposal) = queue.propose(a, b, similarity) {
                added.push(proposal.clone());
            }
        }
        if !added.is_empty() {
            info!("Queued {} merge proposals for review", added.len());
        }
        added
    }

    /// Queue one specific pair for review, scoring it by embedding similarity
    pub fn propose_merge(&self, a: SkillId, b: SkillId) -> Result<Option<MergeProposal>> {
        let (left, right) = {
            let vocabulary = self.vocabulary.read();
            let left = vocabulary.get(a).cloned().ok_or(SkillGapError::UnknownSkill(a.0))?;
            let right = vocabulary.get(b).cloned().ok_or(SkillGapError::UnknownSkill(b.0))?;
            (left, right)
        };
        let similarity = cosine_similarity(&left.embedding, &right.embedding)?;
        Ok(self.merges.lock().propose(a, b, similarity).cloned())
    }

    /// Accept a pending merge: lookups of the absorbed skill now resolve to
    /// the survivor and the absorbed vector leaves the index. The absorbed
    /// skill itself stays in the vocabulary.
    pub fn confirm_merge(&self, id: u64) -> Result<MergeProposal> {
        let mut queue = self.merges.lock();
        let proposal = queue.get(id).cloned().ok_or(SkillGapError::UnknownMerge(id))?;
        if proposal.status != MergeStatus::PendingMerge {
            return Err(SkillGapError::MergeNotPending(id));
        }

        self.vocabulary
            .write()
            .redirect(proposal.absorbed, proposal.survivor)?;
        self.index.remove(proposal.absorbed);
        let confirmed = queue.confirm(id)?;

        info!(
            "Merged {} into {} (proposal {})",
            confirmed.absorbed, confirmed.survivor, confirmed.id
        );
        Ok(confirmed)
    }

    pub fn reject_merge(&self, id: u64) -> Result<MergeProposal> {
        self.merges.lock().reject(id)
    }

    pub fn merge_proposals(&self) -> Vec<MergeProposal> {
        self.merges.lock().all().to_vec()
    }

    /// Install a persisted queue and re-apply its confirmed merges. A merge
    /// naming a skill that is no longer loaded stays in the queue but is not
    /// applied.
    pub fn restore_merges(&self, proposals: Vec<MergeProposal>) {
        let queue = MergeQueue::from_proposals(proposals);
        {
            let mut vocabulary = self.vocabulary.write();
            for proposal in queue.confirmed() {
                match vocabulary.redirect(proposal.absorbed, proposal.survivor) {
                    Ok(()) => {
                        self.index.remove(proposal.absorbed);
                    }
                    Err(e) => warn!("Skipping confirmed merge {}: {}", proposal.id, e),
                }
            }
        }
        *self.merges.lock() = queue;
    }
}
