use crate::db_types::{CandidateSkill, SkillRequirement};

/// Maps a post's skill requirements and a candidate's skills to a match score in the range `[0, 100]`.
///
/// Scoring is pure and synchronous. Implementations must be deterministic for the same inputs.
pub trait SkillScorer: Send + Sync {
    fn score(&self, required: &[SkillRequirement], candidate: &[CandidateSkill]) -> f64;
}
