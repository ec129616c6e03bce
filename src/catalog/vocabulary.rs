//! Name and alias lookup over the canonical skill table

use crate::catalog::skill::{normalize, Skill, SkillId};
use crate::error::{Result, SkillGapError};
use log::warn;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

/// Canonical skills keyed by identity, with a normalized name/alias lookup.
///
/// Skills are never removed. A confirmed merge only redirects lookups of the
/// absorbed skill to its survivor, so earlier resolutions keep pointing at a
/// skill that still exists.
#[derive(Debug, Default, Clone)]
pub struct SkillVocabulary {
    skills: BTreeMap<SkillId, Arc<Skill>>,
    lookup: HashMap<String, SkillId>,
    redirects: HashMap<SkillId, SkillId>,
}

impl SkillVocabulary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from stored rows. A row that collides with an earlier one, or
    /// has an empty name, is skipped with a warning.
    pub fn from_skills(skills: impl IntoIterator<Item = Skill>) -> Self {
        let mut vocabulary = Self::new();
        for skill in skills {
            let (id, name) = (skill.id, skill.name.clone());
            if let Err(e) = vocabulary.insert(skill) {
                warn!("Skipping skill '{}' ({}): {}", name, id, e);
            }
        }
        vocabulary
    }

    /// Add a skill; its name and aliases must not collide with another skill
    pub fn insert(&mut self, skill: Skill) -> Result<Arc<Skill>> {
        if self.skills.contains_key(&skill.id) {
            return Err(SkillGapError::DuplicateSkill(format!(
                "{} ({})",
                skill.name, skill.id
            )));
        }

        let keys = skill.lookup_keys();
        if keys[0].is_empty() {
            return Err(SkillGapError::InvalidInput(format!(
                "Skill {} has an empty name",
                skill.id
            )));
        }
        if self.lookup.contains_key(&keys[0]) {
            return Err(SkillGapError::DuplicateSkill(skill.name.clone()));
        }
        for key in &keys[1..] {
            if let Some(existing) = self.lookup.get(key) {
                return Err(SkillGapError::AliasConflict {
                    alias: key.clone(),
                    existing: existing.0,
                });
            }
        }

        for key in keys {
            self.lookup.insert(key, skill.id);
        }
        let skill = Arc::new(skill);
        self.skills.insert(skill.id, Arc::clone(&skill));
        Ok(skill)
    }

    pub fn add_alias(&mut self, id: SkillId, alias: &str) -> Result<()> {
        let key = normalize(alias);
        if key.is_empty() {
            return Err(SkillGapError::InvalidInput("Alias must not be empty".to_string()));
        }
        let current = self.skills.get(&id).ok_or(SkillGapError::UnknownSkill(id.0))?;

        match self.lookup.get(&key) {
            Some(existing) if *existing == id => return Ok(()),
            Some(existing) => {
                return Err(SkillGapError::AliasConflict {
                    alias: key,
                    existing: existing.0,
                })
            }
            None => {}
        }

        let mut updated = Skill::clone(current);
        updated.aliases.insert(alias.trim().to_string());
        self.skills.insert(id, Arc::new(updated));
        self.lookup.insert(key, id);
        Ok(())
    }

    /// Exact lookup of an already-normalized mention, following merge redirects
    pub fn lookup_exact(&self, normalized: &str) -> Option<SkillId> {
        self.lookup.get(normalized).map(|id| self.canonical_id(*id))
    }

    /// Follow confirmed merges to the surviving identity
    pub fn canonical_id(&self, mut id: SkillId) -> SkillId {
        while let Some(next) = self.redirects.get(&id) {
            id = *next;
        }
        id
    }

    pub fn redirect(&mut self, absorbed: SkillId, survivor: SkillId) -> Result<()> {
        if !self.skills.contains_key(&absorbed) {
            return Err(SkillGapError::UnknownSkill(absorbed.0));
        }
        if !self.skills.contains_key(&survivor) {
            return Err(SkillGapError::UnknownSkill(survivor.0));
        }
        if self.canonical_id(survivor) == absorbed {
            return Err(SkillGapError::InvalidInput(format!(
                "Merging {} into {} would create a cycle",
                absorbed, survivor
            )));
        }
        self.redirects.insert(absorbed, survivor);
        Ok(())
    }

    pub fn is_merged(&self, id: SkillId) -> bool {
        self.redirects.contains_key(&id)
    }

    pub fn get(&self, id: SkillId) -> Option<&Arc<Skill>> {
        self.skills.get(&id)
    }

    pub fn name_of(&self, id: SkillId) -> Option<&str> {
        self.skills.get(&id).map(|s| s.name.as_str())
    }

    pub fn next_id(&self) -> SkillId {
        SkillId(self.skills.keys().next_back().map_or(1, |id| id.0 + 1))
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<Skill>> {
        self.skills.values()
    }

    pub fn len(&self) -> usize {
        self.skills.len()
    }

    pub fn is_empty(&self) -> bool {
        self.skills.is_empty()
    }
}
