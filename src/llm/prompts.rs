//! Prompt template for roadmap explanations

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone)]
pub struct PromptTemplates {
    pub explanation: String,
}

impl Default for PromptTemplates {
    fn default() -> Self {
        Self {
            explanation: EXPLANATION_TEMPLATE.to_string(),
        }
    }
}

/// One gap the explanation should cover
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PromptGap {
    pub skill_name: String,
    pub importance: f32,
    pub gap: f32,
    pub resources: Vec<String>,
}

/// Parameters for prompt template substitution
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PromptParams {
    pub candidate_summary: String,
    pub job_title: String,
    pub duration: String,
    pub gaps: Vec<PromptGap>,
}

impl PromptTemplates {
    pub fn render_explanation(&self, params: &PromptParams) -> String {
        self.explanation
            .replace("{summary}", &params.candidate_summary)
            .replace("{job}", &params.job_title)
            .replace("{duration}", &params.duration)
            .replace("{skills}", &render_gaps(&params.gaps))
    }
}

fn render_gaps(gaps: &[PromptGap]) -> String {
    if gaps.is_empty() {
        return "(none: the candidate already meets every requirement)".to_string();
    }

    gaps.iter()
        .enumerate()
        .map(|(i, gap)| {
            let mut line = format!(
                "{}. {} (Importance Score: {:.2}, Gap: {:.2})",
                i + 1,
                gap.skill_name,
                gap.importance,
                gap.gap
            );
            for resource in &gap.resources {
                line.push_str("\n   - ");
                line.push_str(resource);
            }
            line
        })
        .collect::<Vec<_>>()
        .join("\n")
}

const EXPLANATION_TEMPLATE: &str = r#"You are a practical and motivating career coach. Explain the learning roadmap below to a user who wants to close their skill gaps for a target role. The total duration for this roadmap is {duration}.

**User's Goal:** {summary}
**Target Role:** {job}

**Skills to Learn, most important first:**
{skills}

Break the plan into logical periods (weekly for shorter plans, bi-weekly for longer ones). For each period give a clear focus and 2-3 actionable goals, referring to the listed resources where they fit.

**Constraints:**
- The plan must be realistic for the given duration.
- Prioritize foundational knowledge first.
- Only discuss the skills listed above."#;

#[cfg(test)]
mod tests {
    use super::*;

    fn params(gaps: Vec<PromptGap>) -> PromptParams {
        PromptParams {
            candidate_summary: "A user targeting the role of Data Engineer".to_string(),
            job_title: "Data Engineer".to_string(),
            duration: "90 days".to_string(),
            gaps,
        }
    }

    #[test]
    fn test_explanation_rendering() {
        let templates = PromptTemplates::default();
        let prompt = templates.render_explanation(&params(vec![PromptGap {
            skill_name: "Docker".to_string(),
            importance: 0.6,
            gap: 0.6,
            resources: vec!["Docker Basics (beginner, 6h)".to_string()],
        }]));

        assert!(prompt.contains("The total duration for this roadmap is 90 days."));
        assert!(prompt.contains("**Target Role:** Data Engineer"));
        assert!(prompt.contains("1. Docker (Importance Score: 0.60, Gap: 0.60)"));
        assert!(prompt.contains("   - Docker Basics (beginner, 6h)"));
        assert!(!prompt.contains("{skills}"));
    }

    #[test]
    fn test_no_gaps_placeholder() {
        let prompt = PromptTemplates::default().render_explanation(&params(Vec::new()));
        assert!(prompt.contains("already meets every requirement"));
    }
}
