/// Raw keyword points above this are ignored before normalisation.
pub const KEYWORD_SCORE_CAP: f64 = 3.5;

/// Blend of the three signals into the final score.
/// Keeps any single signal from dominating when many skills match.
pub const BLEND_WEIGHTS: BlendWeights = BlendWeights {
    semantic: 0.35,
    keyword: 0.45,
    metadata: 0.20,
};

/// Per-match keyword points. Only the best tier per skill counts
/// (name > skills > description).
pub const KEYWORD_WEIGHTS: KeywordWeights = KeywordWeights {
    name_match: 1.8,
    skill_match: 1.2,
    description_match: 0.6,
    role_token_match: 0.9,
    min_role_token_chars: 4,
};

pub const METADATA_WEIGHTS: MetadataWeights = MetadataWeights {
    primary_category: 0.3,
    primary_required_bonus: 0.2,
    other_required_category: 0.2,
    job_level_match: 0.3,
    duration_fit: 0.4,
    duration_tolerance: 1.2,
};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BlendWeights {
    pub semantic: f64,
    pub keyword: f64,
    pub metadata: f64,
}

impl BlendWeights {
    pub fn sum(&self) -> f64 {
        self.semantic + self.keyword + self.metadata
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KeywordWeights {
    pub name_match: f64,
    pub skill_match: f64,
    pub description_match: f64,
    pub role_token_match: f64,
    /// Role tokens shorter than this are ignored.
    pub min_role_token_chars: usize,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MetadataWeights {
    /// Candidate declares Knowledge or Personality.
    pub primary_category: f64,
    /// ...and at least one of its tags is required by the query.
    pub primary_required_bonus: f64,
    /// Candidate without a primary tag, but with a required one.
    pub other_required_category: f64,
    pub job_level_match: f64,
    pub duration_fit: f64,
    /// Multiplier on the query's duration limit (1.2 = 20% slack).
    pub duration_tolerance: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoringWeights {
    pub blend: BlendWeights,
    pub keyword: KeywordWeights,
    pub metadata: MetadataWeights,
    pub keyword_cap: f64,
}

impl ScoringWeights {
    pub const DEFAULT: ScoringWeights = ScoringWeights {
        blend: BLEND_WEIGHTS,
        keyword: KEYWORD_WEIGHTS,
        metadata: METADATA_WEIGHTS,
        keyword_cap: KEYWORD_SCORE_CAP,
    };
}

impl Default for ScoringWeights {
    fn default() -> Self {
        Self::DEFAULT
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blend_weights_sum_to_one() {
        assert!((BLEND_WEIGHTS.sum() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn keyword_tiers_are_ordered() {
        let w = KEYWORD_WEIGHTS;
        assert!(w.name_match > w.skill_match);
        assert!(w.skill_match > w.description_match);
    }

    #[test]
    fn duration_tolerance_is_never_stricter_than_exact() {
        assert!(METADATA_WEIGHTS.duration_tolerance >= 1.0);
    }
}
