//! Compare a candidate's canonical skills against job requirements

use crate::catalog::jobs::JobProfile;
use crate::catalog::skill::{ResolvedSkill, SkillId};
use log::debug;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeMap;

/// Candidate skills deduplicated by identity, keeping the highest confidence
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CandidateProfile {
    skills: BTreeMap<SkillId, f32>,
}

impl CandidateProfile {
    pub fn from_resolved<'a>(resolved: impl IntoIterator<Item = &'a ResolvedSkill>) -> Self {
        let mut skills: BTreeMap<SkillId, f32> = BTreeMap::new();
        for entry in resolved {
            if let Some(skill) = entry.skill {
                skills
                    .entry(skill)
                    .and_modify(|c| *c = c.max(entry.confidence))
                    .or_insert(entry.confidence);
            }
        }
        Self { skills }
    }

    pub fn confidence(&self, skill: SkillId) -> f32 {
        self.skills.get(&skill).copied().unwrap_or(0.0)
    }

    pub fn has(&self, skill: SkillId) -> bool {
        self.confidence(skill) > 0.0
    }

    pub fn iter(&self) -> impl Iterator<Item = (SkillId, f32)> + '_ {
        self.skills.iter().map(|(id, c)| (*id, *c))
    }

    pub fn len(&self) -> usize {
        self.skills.len()
    }

    pub fn is_empty(&self) -> bool {
        self.skills.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GapEntry {
    pub skill: SkillId,
    pub required_weight: f32,
    pub candidate_confidence: f32,
    /// Always within [0, required_weight]
    pub gap: f32,
}

impl GapEntry {
    pub fn new(skill: SkillId, required_weight: f32, candidate_confidence: f32) -> Self {
        let gap = (required_weight - candidate_confidence).clamp(0.0, required_weight);
        Self {
            skill,
            required_weight,
            candidate_confidence,
            gap,
        }
    }

    pub fn is_met(&self) -> bool {
        self.gap <= 0.0
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobGapReport {
    pub job_id: String,
    pub job_title: String,
    /// One entry per required skill, largest gap first, then by skill id
    pub entries: Vec<GapEntry>,
    /// Candidate skills the job does not ask for; reported, never scored
    pub surplus_skills: Vec<SkillId>,
    /// Σ gap / Σ weight, 0 = fully qualified
    pub aggregate_gap: f32,
    pub total_weight: f32,
    /// Σ weight of required skills the candidate holds at all
    pub covered_weight: f32,
    /// Set when the job has no usable requirement rows
    pub no_requirements: bool,
}

impl JobGapReport {
    pub fn unmet(&self) -> impl Iterator<Item = &GapEntry> {
        self.entries.iter().filter(|e| !e.is_met())
    }

    pub fn is_fully_qualified(&self) -> bool {
        self.aggregate_gap <= 0.0
    }

    /// Fit as a whole percentage, 100 = no gap
    pub fn fit_percentage(&self) -> u8 {
        ((1.0 - self.aggregate_gap).clamp(0.0, 1.0) * 100.0).round() as u8
    }
}

pub struct GapScorer;

impl GapScorer {
    pub fn score(candidate: &CandidateProfile, job: &JobProfile) -> JobGapReport {
        let requirements = job.normalized_requirements();

        let mut entries: Vec<GapEntry> = requirements
            .iter()
            .map(|r| GapEntry::new(r.skill, r.weight, candidate.confidence(r.skill)))
            .collect();
        entries.sort_by(|a, b| b.gap.total_cmp(&a.gap).then_with(|| a.skill.cmp(&b.skill)));

        let surplus_skills: Vec<SkillId> = candidate
            .iter()
            .map(|(skill, _)| skill)
            .filter(|skill| !requirements.iter().any(|r| r.skill == *skill))
            .collect();

        let total_weight: f32 = entries.iter().map(|e| e.required_weight).sum();
        let total_gap: f32 = entries.iter().map(|e| e.gap).sum();
        let covered_weight: f32 = entries
            .iter()
            .filter(|e| candidate.has(e.skill))
            .map(|e| e.required_weight)
            .sum();

        let no_requirements = entries.is_empty();
        let aggregate_gap = if no_requirements || total_weight <= 0.0 {
            0.0
        } else {
            (total_gap / total_weight).clamp(0.0, 1.0)
        };

        debug!(
            "Job '{}': {} requirements, aggregate gap {:.3}",
            job.id,
            entries.len(),
            aggregate_gap
        );

        JobGapReport {
            job_id: job.id.clone(),
            job_title: job.title.clone(),
            entries,
            surplus_skills,
            aggregate_gap,
            total_weight,
            covered_weight,
            no_requirements,
        }
    }

    /// Best fit first: lowest aggregate gap, then more covered weight, then job id
    pub fn rank(mut reports: Vec<JobGapReport>) -> Vec<JobGapReport> {
        reports.sort_by(Self::compare);
        reports
    }

    pub fn compare(a: &JobGapReport, b: &JobGapReport) -> Ordering {
        a.aggregate_gap
            .total_cmp(&b.aggregate_gap)
            .then_with(|| b.covered_weight.total_cmp(&a.covered_weight))
            .then_with(|| a.job_id.cmp(&b.job_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::skill::SkillMention;

    const PYTHON: SkillId = SkillId(1);
    const SQL: SkillId = SkillId(2);
    const DOCKER: SkillId = SkillId(3);
    const EXCEL: SkillId = SkillId(4);

    fn candidate(skills: &[(SkillId, f32)]) -> CandidateProfile {
        let resolved: Vec<ResolvedSkill> = skills
            .iter()
            .map(|(id, c)| ResolvedSkill::exact(&SkillMention::new("x", *c), *id))
            .collect();
        CandidateProfile::from_resolved(&resolved)
    }

    fn data_job() -> JobProfile {
        JobProfile::new("data", "Data Engineer")
            .with_requirement(PYTHON, 1.0)
            .with_requirement(SQL, 0.5)
            .with_requirement(DOCKER, 0.6)
    }

    #[test]
    fn test_worked_example() {
        let candidate = candidate(&[(PYTHON, 0.9 * 0.88), (SQL, 0.8)]);
        let report = GapScorer::score(&candidate, &data_job());

        let gaps: Vec<(SkillId, f32)> = report.entries.iter().map(|e| (e.skill, e.gap)).collect();
        assert_eq!(gaps[0].0, DOCKER);
        assert!((gaps[0].1 - 0.6).abs() < 1e-6);
        assert_eq!(gaps[1].0, PYTHON);
        assert!((gaps[1].1 - 0.208).abs() < 1e-5);
        assert_eq!(gaps[2], (SQL, 0.0));

        assert!((report.aggregate_gap - 0.808 / 2.1).abs() < 1e-4);
        assert!((report.total_weight - 2.1).abs() < 1e-6);
        assert!((report.covered_weight - 1.5).abs() < 1e-6);
        assert_eq!(report.unmet().count(), 2);
        assert_eq!(report.fit_percentage(), 62);
    }

    #[test]
    fn test_duplicates_keep_max_confidence() {
        let candidate = candidate(&[(PYTHON, 0.3), (PYTHON, 0.7), (PYTHON, 0.5)]);
        assert_eq!(candidate.len(), 1);
        assert_eq!(candidate.confidence(PYTHON), 0.7);
    }

    #[test]
    fn test_fully_qualified_candidate_scores_zero() {
        let candidate = candidate(&[(PYTHON, 1.0), (SQL, 0.9), (DOCKER, 0.6)]);
        let report = GapScorer::score(&candidate, &data_job());
        assert_eq!(report.aggregate_gap, 0.0);
        assert!(report.is_fully_qualified());
        assert!(report.entries.iter().all(|e| e.gap == 0.0));
    }

    #[test]
    fn test_empty_requirement_set() {
        let candidate = candidate(&[(PYTHON, 1.0)]);
        let report = GapScorer::score(&candidate, &JobProfile::new("empty", "Greeter"));
        assert!(report.no_requirements);
        assert_eq!(report.aggregate_gap, 0.0);
        assert!(report.entries.is_empty());
        assert_eq!(report.surplus_skills, vec![PYTHON]);
    }

    #[test]
    fn test_surplus_skills_are_not_scored() {
        let candidate = candidate(&[(PYTHON, 1.0), (EXCEL, 0.9)]);
        let report = GapScorer::score(&candidate, &data_job());
        assert_eq!(report.surplus_skills, vec![EXCEL]);
        assert_eq!(report.entries.len(), 3);
    }

    #[test]
    fn test_gap_bounded_by_weight() {
        let entry = GapEntry::new(PYTHON, 0.4, 0.0);
        assert_eq!(entry.gap, 0.4);
        let entry = GapEntry::new(PYTHON, 0.4, 0.9);
        assert_eq!(entry.gap, 0.0);
        assert!(entry.is_met());
    }

    #[test]
    fn test_rank_breaks_ties_by_covered_weight() {
        let candidate = candidate(&[(PYTHON, 0.5)]);
        let narrow = JobProfile::new("a-narrow", "Narrow").with_requirement(DOCKER, 0.5);
        let broad = JobProfile::new("b-broad", "Broad")
            .with_requirement(PYTHON, 1.0)
            .with_requirement(EXCEL, 0.0001);
        let easy = JobProfile::new("c-easy", "Easy").with_requirement(PYTHON, 0.5);

        let mut reports: Vec<JobGapReport> = [&narrow, &broad, &easy]
            .iter()
            .map(|job| GapScorer::score(&candidate, job))
            .collect();
        // force an exact tie between the first two
        reports[0].aggregate_gap = 0.5;
        reports[1].aggregate_gap = 0.5;

        let ranked = GapScorer::rank(reports);
        let order: Vec<&str> = ranked.iter().map(|r| r.job_id.as_str()).collect();
        assert_eq!(order, vec!["c-easy", "b-broad", "a-narrow"]);
    }
}
