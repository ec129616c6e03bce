//! Turn a job's unmet gaps into an ordered learning roadmap

use crate::catalog::resources::{Difficulty, LearningResource, ResourceCatalog};
use crate::catalog::skill::SkillId;
use crate::config::RoadmapConfig;
use crate::processing::gap_scorer::{GapEntry, JobGapReport};
use log::{debug, warn};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoadmapItem {
    pub skill: SkillId,
    pub gap: f32,
    pub required_weight: f32,
    pub candidate_confidence: f32,
    /// Difficulty ascending, then hours ascending
    pub chosen_resources: Vec<LearningResource>,
    /// 1-based
    pub sequence_position: usize,
    /// The catalog has nothing that teaches this skill
    pub unserviceable: bool,
}

impl RoadmapItem {
    pub fn total_hours(&self) -> u32 {
        self.chosen_resources
            .iter()
            .fold(0u32, |total, r| total.saturating_add(r.estimated_hours))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Roadmap {
    pub job_id: String,
    pub items: Vec<RoadmapItem>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduledResource {
    pub skill: SkillId,
    pub resource: LearningResource,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanPeriod {
    pub week: u32,
    pub label: String,
    pub entries: Vec<ScheduledResource>,
    pub hours: u32,
}

impl Roadmap {
    pub fn total_hours(&self) -> u32 {
        self.items
            .iter()
            .fold(0u32, |total, item| total.saturating_add(item.total_hours()))
    }

    pub fn unserviceable_count(&self) -> usize {
        self.items.iter().filter(|i| i.unserviceable).count()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Lay resources out week by week in roadmap order. A resource belongs to
    /// the week in which it starts, so weeks covered entirely by a long
    /// resource get no period of their own.
    pub fn schedule(&self, weekly_hours: u32) -> Vec<PlanPeriod> {
        let weekly_hours = weekly_hours.max(1);
        let mut periods: Vec<PlanPeriod> = Vec::new();
        let mut elapsed = 0u32;

        for item in &self.items {
            for resource in &item.chosen_resources {
                let week = elapsed / weekly_hours + 1;
                if periods.last().map(|p| p.week) != Some(week) {
                    periods.push(PlanPeriod {
                        week,
                        label: format!("Week {}", week),
                        entries: Vec::new(),
                        hours: 0,
                    });
                }
                if let Some(period) = periods.last_mut() {
                    period.entries.push(ScheduledResource {
                        skill: item.skill,
                        resource: resource.clone(),
                    });
                    period.hours = period.hours.saturating_add(resource.estimated_hours);
                }
                elapsed = elapsed.saturating_add(resource.estimated_hours);
            }
        }

        periods
    }
}

#[derive(Debug, Clone)]
pub struct RoadmapSequencer {
    max_resources_per_skill: usize,
    beginner_ratio: f32,
    advanced_ratio: f32,
}

impl RoadmapSequencer {
    pub fn from_config(config: &RoadmapConfig) -> Self {
        Self {
            max_resources_per_skill: config.max_resources_per_skill.max(1),
            beginner_ratio: config.beginner_ratio,
            advanced_ratio: config.advanced_ratio,
        }
    }

    /// Level to aim for given how much of the required weight the candidate
    /// already covers
    pub fn preferred_difficulty(&self, entry: &GapEntry) -> Difficulty {
        let ratio = if entry.required_weight > 0.0 {
            entry.candidate_confidence / entry.required_weight
        } else {
            0.0
        };

        if ratio < self.beginner_ratio {
            Difficulty::Beginner
        } else if ratio >= self.advanced_ratio {
            Difficulty::Advanced
        } else {
            Difficulty::Intermediate
        }
    }

    /// Pick the resources closest to the preferred level, then emit them
    /// easiest first
    pub fn select_resources(
        &self,
        entry: &GapEntry,
        available: &[LearningResource],
    ) -> Vec<LearningResource> {
        let preferred = self.preferred_difficulty(entry);

        let mut ranked: Vec<&LearningResource> = available.iter().collect();
        ranked.sort_by(|a, b| {
            a.difficulty
                .distance(preferred)
                .cmp(&b.difficulty.distance(preferred))
                .then_with(|| a.difficulty.cmp(&b.difficulty))
                .then_with(|| a.estimated_hours.cmp(&b.estimated_hours))
                .then_with(|| a.title.cmp(&b.title))
                .then_with(|| a.url.cmp(&b.url))
        });
        ranked.truncate(self.max_resources_per_skill);

        ranked.sort_by(|a, b| {
            a.difficulty
                .cmp(&b.difficulty)
                .then_with(|| a.estimated_hours.cmp(&b.estimated_hours))
                .then_with(|| a.title.cmp(&b.title))
                .then_with(|| a.url.cmp(&b.url))
        });
        ranked.into_iter().cloned().collect()
    }

    pub fn sequence(&self, report: &JobGapReport, catalog: &ResourceCatalog) -> Roadmap {
        let mut items: Vec<RoadmapItem> = report
            .unmet()
            .map(|entry| {
                let available = catalog.for_skill(entry.skill);
                if available.is_empty() {
                    warn!(
                        "No learning resources for {} (job '{}')",
                        entry.skill, report.job_id
                    );
                }
                RoadmapItem {
                    skill: entry.skill,
                    gap: entry.gap,
                    required_weight: entry.required_weight,
                    candidate_confidence: entry.candidate_confidence,
                    chosen_resources: self.select_resources(entry, available),
                    sequence_position: 0,
                    unserviceable: available.is_empty(),
                }
            })
            .collect();

        items.sort_by(|a, b| {
            b.gap
                .total_cmp(&a.gap)
                .then_with(|| a.total_hours().cmp(&b.total_hours()))
                .then_with(|| a.skill.cmp(&b.skill))
        });
        for (position, item) in items.iter_mut().enumerate() {
            item.sequence_position = position + 1;
        }

        debug!(
            "Roadmap for '{}': {} items, {} unserviceable",
            report.job_id,
            items.len(),
            items.iter().filter(|i| i.unserviceable).count()
        );

        Roadmap {
            job_id: report.job_id.clone(),
            items,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::jobs::JobProfile;
    use crate::catalog::skill::{ResolvedSkill, SkillMention};
    use crate::config::Config;
    use crate::processing::gap_scorer::{CandidateProfile, GapScorer};

    const PYTHON: SkillId = SkillId(1);
    const SQL: SkillId = SkillId(2);
    const DOCKER: SkillId = SkillId(3);
    const RUST: SkillId = SkillId(4);

    fn resource(skill: SkillId, title: &str, difficulty: Difficulty, hours: u32) -> LearningResource {
        LearningResource {
            skill,
            title: title.to_string(),
            url: format!("https://learn.example.com/{}", title.to_lowercase().replace(' ', "-")),
            difficulty,
            estimated_hours: hours,
        }
    }

    fn catalog() -> ResourceCatalog {
        ResourceCatalog::from_resources(vec![
            resource(DOCKER, "Docker Basics", Difficulty::Beginner, 6),
            resource(DOCKER, "Compose in Practice", Difficulty::Intermediate, 8),
            resource(DOCKER, "Container Internals", Difficulty::Advanced, 12),
            resource(DOCKER, "Docker Crash Course", Difficulty::Beginner, 3),
            resource(PYTHON, "Python Idioms", Difficulty::Intermediate, 10),
            resource(PYTHON, "Python Performance", Difficulty::Advanced, 14),
            resource(PYTHON, "Python for Beginners", Difficulty::Beginner, 20),
            resource(SQL, "SQL Joins", Difficulty::Beginner, 4),
        ])
    }

    fn sequencer() -> RoadmapSequencer {
        RoadmapSequencer::from_config(&Config::default().roadmap)
    }

    fn report(skills: &[(SkillId, f32)], job: &JobProfile) -> JobGapReport {
        let resolved: Vec<ResolvedSkill> = skills
            .iter()
            .map(|(id, c)| ResolvedSkill::exact(&SkillMention::new("x", *c), *id))
            .collect();
        GapScorer::score(&CandidateProfile::from_resolved(&resolved), job)
    }

    fn data_job() -> JobProfile {
        JobProfile::new("data", "Data Engineer")
            .with_requirement(PYTHON, 1.0)
            .with_requirement(SQL, 0.5)
            .with_requirement(DOCKER, 0.6)
    }

    #[test]
    fn test_largest_gap_comes_first() {
        let report = report(&[(PYTHON, 0.792), (SQL, 0.8)], &data_job());
        let roadmap = sequencer().sequence(&report, &catalog());

        let order: Vec<SkillId> = roadmap.items.iter().map(|i| i.skill).collect();
        assert_eq!(order, vec![DOCKER, PYTHON]);
        assert_eq!(roadmap.items[0].sequence_position, 1);
        assert_eq!(roadmap.items[1].sequence_position, 2);
        assert!(roadmap.items.iter().all(|i| !i.unserviceable));
    }

    #[test]
    fn test_preferred_difficulty_follows_confidence_ratio() {
        let sequencer = sequencer();
        let novice = GapEntry::new(DOCKER, 0.6, 0.0);
        let partial = GapEntry::new(DOCKER, 0.6, 0.3);
        let nearly = GapEntry::new(PYTHON, 1.0, 0.792);

        assert_eq!(sequencer.preferred_difficulty(&novice), Difficulty::Beginner);
        assert_eq!(sequencer.preferred_difficulty(&partial), Difficulty::Intermediate);
        assert_eq!(sequencer.preferred_difficulty(&nearly), Difficulty::Advanced);
    }

    #[test]
    fn test_selection_is_capped_and_ordered_easiest_first() {
        let sequencer = sequencer();
        let catalog = catalog();
        let novice = GapEntry::new(DOCKER, 0.6, 0.0);
        let chosen = sequencer.select_resources(&novice, catalog.for_skill(DOCKER));

        let titles: Vec<&str> = chosen.iter().map(|r| r.title.as_str()).collect();
        assert_eq!(
            titles,
            vec!["Docker Crash Course", "Docker Basics", "Compose in Practice"]
        );

        let nearly = GapEntry::new(PYTHON, 1.0, 0.792);
        let mut config = Config::default().roadmap;
        config.max_resources_per_skill = 1;
        let chosen = RoadmapSequencer::from_config(&config)
            .select_resources(&nearly, catalog.for_skill(PYTHON));
        assert_eq!(chosen.len(), 1);
        assert_eq!(chosen[0].difficulty, Difficulty::Advanced);
    }

    #[test]
    fn test_unserviceable_skill_still_listed_once() {
        let job = data_job().with_requirement(RUST, 0.6);
        let report = report(&[(PYTHON, 0.792), (SQL, 0.8)], &job);
        let roadmap = sequencer().sequence(&report, &catalog());

        assert_eq!(roadmap.items.len(), report.unmet().count());
        let rust: Vec<&RoadmapItem> = roadmap.items.iter().filter(|i| i.skill == RUST).collect();
        assert_eq!(rust.len(), 1);
        assert!(rust[0].unserviceable);
        assert!(rust[0].chosen_resources.is_empty());
        assert_eq!(roadmap.unserviceable_count(), 1);

        // equal gaps: fewer hours first, so the empty item precedes Docker
        let order: Vec<SkillId> = roadmap.items.iter().map(|i| i.skill).collect();
        assert_eq!(order, vec![RUST, DOCKER, PYTHON]);
    }

    #[test]
    fn test_sequence_is_deterministic() {
        let report = report(&[(PYTHON, 0.2)], &data_job());
        let first = sequencer().sequence(&report, &catalog());
        let second = sequencer().sequence(&report, &catalog());

        let describe = |roadmap: &Roadmap| -> Vec<(SkillId, Vec<String>)> {
            roadmap
                .items
                .iter()
                .map(|i| (i.skill, i.chosen_resources.iter().map(|r| r.title.clone()).collect()))
                .collect()
        };
        assert_eq!(describe(&first), describe(&second));
    }

    #[test]
    fn test_no_unmet_gaps_gives_empty_roadmap() {
        let report = report(&[(PYTHON, 1.0), (SQL, 1.0), (DOCKER, 1.0)], &data_job());
        let roadmap = sequencer().sequence(&report, &catalog());
        assert!(roadmap.is_empty());
        assert!(roadmap.schedule(10).is_empty());
    }

    #[test]
    fn test_weekly_schedule() {
        let report = report(&[(PYTHON, 0.792), (SQL, 0.8)], &data_job());
        let roadmap = sequencer().sequence(&report, &catalog());
        // Docker: 3 + 6 + 8 hours, Python: 20 + 10 + 14 hours
        assert_eq!(roadmap.total_hours(), 61);

        let periods = roadmap.schedule(10);
        let weeks: Vec<u32> = periods.iter().map(|p| p.week).collect();
        assert_eq!(weeks, vec![1, 2, 4, 5]);
        assert_eq!(periods[0].label, "Week 1");
        assert_eq!(periods[0].entries.len(), 3);
        assert_eq!(periods[0].hours, 17);
        assert_eq!(periods[1].entries[0].resource.title, "Python for Beginners");
        assert_eq!(periods[2].entries[0].resource.title, "Python Idioms");
        assert_eq!(periods[3].entries[0].resource.title, "Python Performance");
        assert_eq!(periods[3].label, "Week 5");
    }

    #[test]
    fn test_huge_hour_estimates_saturate() {
        let catalog = ResourceCatalog::from_resources(vec![
            resource(DOCKER, "Docker Forever", Difficulty::Beginner, u32::MAX),
            resource(DOCKER, "Docker Basics", Difficulty::Beginner, 6),
            resource(PYTHON, "Python Forever", Difficulty::Beginner, u32::MAX),
        ]);
        let report = report(&[], &data_job());
        let roadmap = sequencer().sequence(&report, &catalog);

        assert_eq!(roadmap.items[0].total_hours(), u32::MAX);
        assert_eq!(roadmap.total_hours(), u32::MAX);
        let periods = roadmap.schedule(10);
        assert_eq!(periods.iter().map(|p| p.entries.len()).sum::<usize>(), 3);
    }

    #[test]
    fn test_zero_resource_cap_still_selects_one() {
        let mut config = Config::default().roadmap;
        config.max_resources_per_skill = 0;
        let job = JobProfile::new("ops", "Platform Engineer").with_requirement(SQL, 0.5);
        let roadmap = RoadmapSequencer::from_config(&config).sequence(&report(&[], &job), &catalog());

        assert_eq!(roadmap.items.len(), 1);
        assert_eq!(roadmap.items[0].chosen_resources.len(), 1);
        assert!(!roadmap.items[0].unserviceable);
    }
}
