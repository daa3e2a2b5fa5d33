use serde::Serialize;

use super::weights::ScoringWeights;
use crate::duration::parse_candidate_duration;
use crate::{Candidate, QueryContext, TestType};

/// Per-candidate signal breakdown. Exposed for explainability only; the
/// numbers move whenever the weight constants are retuned.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ScoreBreakdown {
    pub semantic_score: f64,
    /// Raw (uncapped) keyword points.
    pub keyword_score: f64,
    pub metadata_score: f64,
    pub final_score: f64,
}

/// A pool candidate with scores attached for one ranking call.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredCandidate<'a> {
    pub candidate: &'a Candidate,
    pub scores: ScoreBreakdown,
}

impl ScoredCandidate<'_> {
    pub fn identifier(&self) -> &str {
        &self.candidate.identifier
    }

    pub fn final_score(&self) -> f64 {
        self.scores.final_score
    }
}

#[derive(Debug, Clone, Default)]
pub struct SignalScorer {
    weights: ScoringWeights,
}

impl SignalScorer {
    pub fn new(weights: ScoringWeights) -> Self {
        Self { weights }
    }

    pub fn weights(&self) -> &ScoringWeights {
        &self.weights
    }

    pub fn score<'a>(&self, candidate: &'a Candidate, ctx: &QueryContext) -> ScoredCandidate<'a> {
        let semantic_score = candidate.semantic_similarity;
        let keyword_score = self.score_keywords(candidate, ctx);
        let metadata_score = self.score_metadata(candidate, ctx);

        let blend = self.weights.blend;
        let cap = self.weights.keyword_cap;
        let final_score = blend.semantic * semantic_score
            + blend.keyword * (keyword_score.min(cap) / cap)
            + blend.metadata * metadata_score;

        ScoredCandidate {
            candidate,
            scores: ScoreBreakdown {
                semantic_score,
                keyword_score,
                metadata_score,
                final_score,
            },
        }
    }

    fn score_keywords(&self, candidate: &Candidate, ctx: &QueryContext) -> f64 {
        let w = self.weights.keyword;
        let name = candidate.name.to_lowercase();
        let description = candidate.description.to_lowercase();
        let skills: Vec<String> = candidate
            .skills
            .iter()
            .map(|s| s.trim().to_lowercase())
            .collect();

        let mut score = 0.0;
        for skill in &ctx.expanded_skills {
            if name.contains(skill.as_str()) {
                score += w.name_match;
            } else if skills.iter().any(|s| s == skill) {
                score += w.skill_match;
            } else if description.contains(skill.as_str()) {
                score += w.description_match;
            }
        }

        // Repeated role tokens each count.
        if let Some(role) = ctx.role.as_deref() {
            let role = role.to_lowercase();
            for token in role
                .split_whitespace()
                .filter(|t| t.chars().count() >= w.min_role_token_chars)
            {
                if name.contains(token) {
                    score += w.role_token_match;
                }
            }
        }

        score
    }

    fn score_metadata(&self, candidate: &Candidate, ctx: &QueryContext) -> f64 {
        let w = self.weights.metadata;
        let mut score = 0.0;

        let declares_primary = candidate.has_test_type(TestType::Knowledge)
            || candidate.has_test_type(TestType::Personality);
        let any_required = candidate
            .test_types
            .iter()
            .any(|tag| ctx.required_categories.contains(tag));

        if declares_primary {
            score += w.primary_category;
            if any_required {
                score += w.primary_required_bonus;
            }
        } else if any_required {
            score += w.other_required_category;
        }

        if let Some(level) = ctx
            .job_level
            .as_deref()
            .map(|l| l.trim().to_lowercase())
            .filter(|l| !l.is_empty())
        {
            if candidate.job_level.to_lowercase().contains(&level) {
                score += w.job_level_match;
            }
        }

        if let Some(limit) = ctx.duration_limit_minutes.filter(|m| *m > 0) {
            let duration = f64::from(parse_candidate_duration(&candidate.duration));
            if duration <= f64::from(limit) * w.duration_tolerance {
                score += w.duration_fit;
            }
        }

        score
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use super::*;
    use crate::skill_expander::expand_skills;

    fn candidate() -> Candidate {
        Candidate {
            identifier: "https://example.com/java-8".into(),
            name: "Java 8 (New)".into(),
            description: "Multi-choice test measuring Java knowledge".into(),
            skills: vec!["Java".into(), " Spring ".into()],
            test_types: BTreeSet::from([TestType::Knowledge]),
            job_level: "Mid-Professional, Professional Individual Contributor".into(),
            category: "Information Technology".into(),
            duration: "Approximate Completion Time in minutes = 18 (18 minutes)".into(),
            semantic_similarity: 0.7,
        }
    }

    fn context() -> QueryContext {
        QueryContext {
            search_text: "java".into(),
            expanded_skills: BTreeSet::new(),
            role: None,
            job_level: None,
            required_categories: BTreeSet::from([TestType::Knowledge, TestType::Personality]),
            duration_limit_minutes: None,
        }
    }

    fn scorer() -> SignalScorer {
        SignalScorer::default()
    }

    #[test]
    fn keyword_tiers_take_only_best_match_per_skill() {
        let mut ctx = context();
        // java → name (1.8)
        // spring → skills (1.2)
        // j2ee → nowhere
        ctx.expanded_skills = expand_skills(["java"]);
        let c = candidate();
        let scored = scorer().score(&c, &ctx);
        assert!((scored.scores.keyword_score - 3.0).abs() < 1e-9);

        ctx.expanded_skills = BTreeSet::from(["multi-choice".to_string()]);
        let c = candidate();
        let scored = scorer().score(&c, &ctx);
        assert!((scored.scores.keyword_score - 0.6).abs() < 1e-9);
    }

    #[test]
    fn role_tokens_accumulate_and_skip_short_tokens() {
        let mut c = candidate();
        c.name = "Java Developer Test".into();
        let mut ctx = context();
        ctx.role = Some("Senior Developer".into());
        let scored = scorer().score(&c, &ctx);
        assert!((scored.scores.keyword_score - 0.9).abs() < 1e-9);

        ctx.role = Some("dev developer developer".into());
        let scored = scorer().score(&c, &ctx);
        assert!((scored.scores.keyword_score - 1.8).abs() < 1e-9);
    }

    #[test]
    fn metadata_rewards_primary_and_required_categories() {
        let ctx = context();
        let c = candidate();
        let scored = scorer().score(&c, &ctx);
        assert!((scored.scores.metadata_score - 0.5).abs() < 1e-9);

        let mut ability = candidate();
        ability.test_types = BTreeSet::from([TestType::Ability]);
        let scored = scorer().score(&ability, &ctx);
        assert_eq!(scored.scores.metadata_score, 0.0);

        let mut ctx_a = context();
        ctx_a.required_categories = BTreeSet::from([TestType::Ability]);
        let scored = scorer().score(&ability, &ctx_a);
        assert!((scored.scores.metadata_score - 0.2).abs() < 1e-9);
    }

    #[test]
    fn job_level_is_case_insensitive_substring() {
        let mut ctx = context();
        ctx.job_level = Some("Mid-Professional".into());
        let c = candidate();
        let scored = scorer().score(&c, &ctx);
        assert!((scored.scores.metadata_score - 0.8).abs() < 1e-9);

        ctx.job_level = Some("   ".into());
        let c = candidate();
        let scored = scorer().score(&c, &ctx);
        assert!((scored.scores.metadata_score - 0.5).abs() < 1e-9);
    }

    #[test]
    fn duration_fit_allows_twenty_percent_slack() {
        let mut c = candidate();
        c.duration = "35 minutes".into();
        let mut ctx = context();
        ctx.duration_limit_minutes = Some(30);
        let scored = scorer().score(&c, &ctx);
        assert!((scored.scores.metadata_score - 0.9).abs() < 1e-9);

        c.duration = "37 minutes".into();
        let scored = scorer().score(&c, &ctx);
        assert!((scored.scores.metadata_score - 0.5).abs() < 1e-9);
    }

    #[test]
    fn unknown_duration_never_fits() {
        let mut c = candidate();
        c.duration = String::new();
        let mut ctx = context();
        ctx.duration_limit_minutes = Some(60);
        let scored = scorer().score(&c, &ctx);
        assert!((scored.scores.metadata_score - 0.5).abs() < 1e-9);
    }

    #[test]
    fn keyword_points_are_capped_in_final_score() {
        let mut ctx = context();
        ctx.expanded_skills = ["java", "8", "new", "(new)"]
            .into_iter()
            .map(String::from)
            .collect();
        let c = candidate();
        let scored = scorer().score(&c, &ctx);
        assert!(scored.scores.keyword_score > KEYWORD_CAP_FOR_TEST);
        let expected = 0.35 * 0.7 + 0.45 + 0.20 * 0.5;
        assert!((scored.scores.final_score - expected).abs() < 1e-9);
    }

    const KEYWORD_CAP_FOR_TEST: f64 = crate::ranking::weights::KEYWORD_SCORE_CAP;

    #[test]
    fn empty_context_is_pure_semantic_plus_categories() {
        let mut ctx = context();
        ctx.required_categories = BTreeSet::from([TestType::Simulations]);
        let mut c = candidate();
        c.test_types = BTreeSet::new();
        let scored = scorer().score(&c, &ctx);
        assert_eq!(scored.scores.keyword_score, 0.0);
        assert_eq!(scored.scores.metadata_score, 0.0);
        assert!((scored.scores.final_score - 0.35 * 0.7).abs() < 1e-12);
    }
}
