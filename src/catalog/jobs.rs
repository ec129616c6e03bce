//! Job profiles and their weighted skill requirements

use crate::catalog::skill::{normalize, SkillId};
use log::warn;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct JobRequirement {
    pub skill: SkillId,
    /// Importance in (0, 1]; weights of one job need not sum to 1
    pub weight: f32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobProfile {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub requirements: Vec<JobRequirement>,
}

impl JobProfile {
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            requirements: Vec::new(),
        }
    }

    pub fn with_requirement(mut self, skill: SkillId, weight: f32) -> Self {
        self.requirements.push(JobRequirement { skill, weight });
        self
    }

    /// Case-insensitive substring match of a free-text role against the title.
    /// A blank role matches every job.
    pub fn matches_role(&self, role: &str) -> bool {
        let role = normalize(role);
        role.is_empty() || normalize(&self.title).contains(&role)
    }

    /// Requirements with one row per skill, ordered by skill id.
    ///
    /// Non-positive or NaN weights are dropped, weights above 1 are capped,
    /// and a skill listed twice keeps its largest weight.
    pub fn normalized_requirements(&self) -> Vec<JobRequirement> {
        let mut by_skill: BTreeMap<SkillId, f32> = BTreeMap::new();

        for requirement in &self.requirements {
            let weight = requirement.weight;
            if weight.is_nan() || weight <= 0.0 {
                warn!(
                    "Job '{}' requirement {} has weight {}, ignoring",
                    self.id, requirement.skill, weight
                );
                continue;
            }
            if weight > 1.0 {
                warn!(
                    "Job '{}' requirement {} has weight {}, capping at 1",
                    self.id, requirement.skill, weight
                );
            }
            let weight = weight.min(1.0);
            by_skill
                .entry(requirement.skill)
                .and_modify(|existing| *existing = existing.max(weight))
                .or_insert(weight);
        }

        by_skill
            .into_iter()
            .map(|(skill, weight)| JobRequirement { skill, weight })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalized_requirements() {
        let job = JobProfile::new("data-eng", "Data Engineer")
            .with_requirement(SkillId(3), 0.6)
            .with_requirement(SkillId(1), 1.0)
            .with_requirement(SkillId(3), 0.8)
            .with_requirement(SkillId(5), 0.0)
            .with_requirement(SkillId(6), f32::NAN)
            .with_requirement(SkillId(2), 1.7);

        let requirements = job.normalized_requirements();
        let pairs: Vec<(u64, f32)> = requirements.iter().map(|r| (r.skill.0, r.weight)).collect();
        assert_eq!(pairs, vec![(1, 1.0), (2, 1.0), (3, 0.8)]);
    }

    #[test]
    fn test_role_matches_title_substring() {
        let job = JobProfile::new("data", "Senior  Data Engineer");
        assert!(job.matches_role("data engineer"));
        assert!(job.matches_role("  DATA   Engineer "));
        assert!(job.matches_role("engineer"));
        assert!(job.matches_role(""));
        assert!(!job.matches_role("analyst"));
        assert!(!job.matches_role("ml engineer"));
    }

    #[test]
    fn test_job_deserializes_without_requirements() {
        let job: JobProfile = serde_json::from_str(r#"{"id": "j1", "title": "Intern"}"#).unwrap();
        assert!(job.requirements.is_empty());
    }
}
