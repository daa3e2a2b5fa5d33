pub mod balance;
pub mod pipeline;
pub mod scoring;
pub mod weights;

pub use balance::{BalanceMode, balance};
pub use pipeline::{RankingEngine, RecommendationResult, rank};
pub use scoring::{ScoreBreakdown, ScoredCandidate, SignalScorer};
pub use weights::ScoringWeights;
