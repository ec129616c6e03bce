//! Canonical skills, raw mentions and resolution outcomes

use log::warn;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// Stable identity of a canonical skill
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SkillId(pub u64);

impl fmt::Display for SkillId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Skill {
    pub id: SkillId,
    pub name: String,
    pub embedding: Vec<f32>,
    #[serde(default)]
    pub aliases: BTreeSet<String>,
}

impl Skill {
    pub fn new(id: SkillId, name: impl Into<String>, embedding: Vec<f32>) -> Self {
        Self {
            id,
            name: name.into(),
            embedding,
            aliases: BTreeSet::new(),
        }
    }

    pub fn with_alias(mut self, alias: impl Into<String>) -> Self {
        self.aliases.insert(alias.into());
        self
    }

    /// Normalized name followed by every normalized alias
    pub fn lookup_keys(&self) -> Vec<String> {
        let mut keys = vec![normalize(&self.name)];
        for alias in &self.aliases {
            let key = normalize(alias);
            if !key.is_empty() && !keys.contains(&key) {
                keys.push(key);
            }
        }
        keys
    }
}

/// Case-fold, trim and collapse internal whitespace
pub fn normalize(text: &str) -> String {
    text.split_whitespace()
        .map(|word| word.to_lowercase())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Raw skill reference produced by upstream extraction
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SkillMention {
    #[serde(alias = "text", alias = "skill")]
    pub raw_text: String,
    #[serde(default = "full_confidence")]
    pub confidence: f32,
}

fn full_confidence() -> f32 {
    1.0
}

impl SkillMention {
    pub fn new(raw_text: impl Into<String>, confidence: f32) -> Self {
        Self {
            raw_text: raw_text.into(),
            confidence,
        }
        .sanitized()
    }

    /// Clamp confidence into [0, 1]; NaN becomes 0
    pub fn sanitized(mut self) -> Self {
        if self.confidence.is_nan() {
            warn!("Mention '{}' has NaN confidence, using 0", self.raw_text);
            self.confidence = 0.0;
        } else if !(0.0..=1.0).contains(&self.confidence) {
            warn!(
                "Mention '{}' confidence {} outside [0, 1], clamping",
                self.raw_text, self.confidence
            );
            self.confidence = self.confidence.clamp(0.0, 1.0);
        }
        self
    }

    pub fn normalized(&self) -> String {
        normalize(&self.raw_text)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchKind {
    Exact,
    Fuzzy,
    Unresolved,
}

impl fmt::Display for MatchKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            MatchKind::Exact => "exact",
            MatchKind::Fuzzy => "fuzzy",
            MatchKind::Unresolved => "unresolved",
        };
        f.write_str(label)
    }
}

/// Outcome of canonicalizing one mention
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResolvedSkill {
    pub mention: String,
    pub skill: Option<SkillId>,
    pub confidence: f32,
    pub match_kind: MatchKind,
    /// Cosine similarity of the nearest neighbor, when the index was consulted
    pub similarity: Option<f32>,
}

impl ResolvedSkill {
    pub fn exact(mention: &SkillMention, skill: SkillId) -> Self {
        Self {
            mention: mention.raw_text.clone(),
            skill: Some(skill),
            confidence: mention.confidence,
            match_kind: MatchKind::Exact,
            similarity: None,
        }
    }

    pub fn fuzzy(mention: &SkillMention, skill: SkillId, similarity: f32) -> Self {
        Self {
            mention: mention.raw_text.clone(),
            skill: Some(skill),
            confidence: mention.confidence * similarity,
            match_kind: MatchKind::Fuzzy,
            similarity: Some(similarity),
        }
    }

    pub fn unresolved(mention: &SkillMention, best_similarity: Option<f32>) -> Self {
        Self {
            mention: mention.raw_text.clone(),
            skill: None,
            confidence: 0.0,
            match_kind: MatchKind::Unresolved,
            similarity: best_similarity,
        }
    }

    pub fn is_resolved(&self) -> bool {
        self.skill.is_some()
    }
}
