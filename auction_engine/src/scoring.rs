//! Skill match scoring.
//!
//! [`SkillMatchScorer`] compares each required skill against the candidate's skill of the same name (ignoring case).
//! A matched skill scores `candidate_weight / required_weight * 100`, capped at 100. Unmatched skills score zero.
//! The overall score is the mean over all required skills, expressed as a percentage and rounded to one decimal place.
use crate::{
    db_types::{CandidateSkill, SkillRequirement},
    traits::SkillScorer,
};

#[derive(Debug, Clone, Copy, Default)]
pub struct SkillMatchScorer;

impl SkillMatchScorer {
    pub fn new() -> Self {
        Self
    }
}

impl SkillScorer for SkillMatchScorer {
    fn score(&self, required: &[SkillRequirement], candidate: &[CandidateSkill]) -> f64 {
        if required.is_empty() {
            return 0.0;
        }
        let total = required
            .iter()
            .filter_map(|req| {
                candidate
                    .iter()
                    .find(|c| c.name.to_lowercase() == req.name.to_lowercase())
                    .map(|c| (c.proficiency_level.weight() / req.level.weight() * 100.0).min(100.0))
            })
            .sum::<f64>();
        let max_possible = required.len() as f64 * 100.0;
        (total / max_possible * 1000.0).round() / 10.0
    }
}
