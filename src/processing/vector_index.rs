//! Exact cosine-similarity index over canonical skill embeddings

use crate::catalog::skill::{Skill, SkillId};
use crate::error::{Result, SkillGapError};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Neighbor {
    pub skill: SkillId,
    pub similarity: f32,
}

/// Brute-force nearest-neighbor search.
///
/// Vectors are stored unit-normalized so a query is one dot product per
/// entry. Every write replaces a whole entry under the write lock, so a
/// concurrent reader sees a skill either fully inserted or not at all.
#[derive(Debug)]
pub struct VectorIndex {
    dimension: usize,
    entries: RwLock<BTreeMap<SkillId, Arc<[f32]>>>,
}

impl VectorIndex {
    pub fn new(dimension: usize) -> Self {
        Self {
            dimension,
            entries: RwLock::new(BTreeMap::new()),
        }
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }

    /// Add or replace the vector for `skill`
    pub fn insert(&self, skill: SkillId, embedding: &[f32]) -> Result<()> {
        let unit = self.prepare(embedding)?;
        self.entries.write().insert(skill, unit);
        Ok(())
    }

    pub fn insert_skill(&self, skill: &Skill) -> Result<()> {
        self.insert(skill.id, &skill.embedding)
    }

    pub fn remove(&self, skill: SkillId) -> bool {
        self.entries.write().remove(&skill).is_some()
    }

    /// Replace the whole index contents. Nothing changes if any vector is invalid.
    pub fn rebuild<'a>(&self, skills: impl IntoIterator<Item = &'a Skill>) -> Result<usize> {
        let mut fresh = BTreeMap::new();
        for skill in skills {
            fresh.insert(skill.id, self.prepare(&skill.embedding)?);
        }
        let count = fresh.len();
        *self.entries.write() = fresh;
        Ok(count)
    }

    /// The `k` most similar skills, best first, equal scores by lowest id
    pub fn query(&self, vector: &[f32], k: usize) -> Result<Vec<Neighbor>> {
        let mut scored = self.score_all(vector)?;
        scored.sort_by(|a, b| {
            b.similarity
                .total_cmp(&a.similarity)
                .then_with(|| a.skill.cmp(&b.skill))
        });
        scored.truncate(k);
        Ok(scored)
    }

    /// Top-1 neighbor; scores within `tie_epsilon` of the best go to the lowest id
    pub fn nearest(&self, vector: &[f32], tie_epsilon: f32) -> Result<Option<Neighbor>> {
        let scored = self.score_all(vector)?;
        let best = scored
            .iter()
            .map(|n| n.similarity)
            .fold(f32::NEG_INFINITY, f32::max);

        // score_all yields ascending ids, so the first hit is the lowest
        Ok(scored
            .into_iter()
            .find(|n| n.similarity >= best - tie_epsilon))
    }

    /// Every unordered pair of indexed skills with similarity at or above `threshold`
    pub fn similar_pairs(&self, threshold: f32) -> Vec<(SkillId, SkillId, f32)> {
        let entries: Vec<(SkillId, Arc<[f32]>)> = self
            .entries
            .read()
            .iter()
            .map(|(id, v)| (*id, Arc::clone(v)))
            .collect();

        let mut pairs = Vec::new();
        for (i, (left_id, left)) in entries.iter().enumerate() {
            for (right_id, right) in &entries[i + 1..] {
                let similarity = dot(left, right);
                if similarity >= threshold {
                    pairs.push((*left_id, *right_id, similarity));
                }
            }
        }
        pairs
    }

    pub fn contains(&self, skill: SkillId) -> bool {
        self.entries.read().contains_key(&skill)
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    fn score_all(&self, vector: &[f32]) -> Result<Vec<Neighbor>> {
        let query = self.prepare(vector)?;
        let entries = self.entries.read();
        Ok(entries
            .iter()
            .map(|(skill, unit)| Neighbor {
                skill: *skill,
                similarity: dot(&query, unit),
            })
            .collect())
    }

    fn prepare(&self, embedding: &[f32]) -> Result<Arc<[f32]>> {
        if embedding.len() != self.dimension {
            return Err(SkillGapError::DimensionMismatch {
                expected: self.dimension,
                actual: embedding.len(),
            });
        }
        Ok(unit_vector(embedding).into())
    }
}

/// Scale to unit length; zero or non-finite vectors become all zeros
pub fn unit_vector(v: &[f32]) -> Vec<f32> {
    let norm = v.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm == 0.0 || !norm.is_finite() {
        return vec![0.0; v.len()];
    }
    v.iter().map(|x| x / norm).collect()
}

fn dot(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}
