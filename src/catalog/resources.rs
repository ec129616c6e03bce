//! Learning resources grouped by the skill they teach

use crate::catalog::skill::SkillId;
use log::warn;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Difficulty {
    Beginner,
    Intermediate,
    Advanced,
}

impl Difficulty {
    pub fn rank(self) -> u8 {
        match self {
            Difficulty::Beginner => 0,
            Difficulty::Intermediate => 1,
            Difficulty::Advanced => 2,
        }
    }

    pub fn distance(self, other: Difficulty) -> u8 {
        self.rank().abs_diff(other.rank())
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Difficulty::Beginner => "beginner",
            Difficulty::Intermediate => "intermediate",
            Difficulty::Advanced => "advanced",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LearningResource {
    pub skill: SkillId,
    pub title: String,
    pub url: String,
    pub difficulty: Difficulty,
    pub estimated_hours: u32,
}

/// Read snapshot of the learning resource catalog
#[derive(Debug, Default, Clone)]
pub struct ResourceCatalog {
    by_skill: BTreeMap<SkillId, Vec<LearningResource>>,
}

impl ResourceCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from raw rows; rows without a positive hour estimate are skipped
    pub fn from_resources(resources: impl IntoIterator<Item = LearningResource>) -> Self {
        let mut catalog = Self::new();
        for resource in resources {
            catalog.add(resource);
        }
        catalog
    }

    pub fn add(&mut self, resource: LearningResource) -> bool {
        if resource.estimated_hours == 0 {
            warn!(
                "Resource '{}' for skill {} has no hour estimate, skipping",
                resource.title, resource.skill
            );
            return false;
        }
        self.by_skill.entry(resource.skill).or_default().push(resource);
        true
    }

    pub fn for_skill(&self, skill: SkillId) -> &[LearningResource] {
        self.by_skill.get(&skill).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn skill_count(&self) -> usize {
        self.by_skill.len()
    }

    pub fn len(&self) -> usize {
        self.by_skill.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.by_skill.is_empty()
    }
}
