use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use strum::AsRefStr;

/// Assessment test-type tag (fixed SHL alphabet).
///
/// `as_ref()` / `Display` yield the one-letter code, which is also the serde
/// representation. K and P are the two primary categories used by the
/// category balancer.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, AsRefStr,
)]
pub enum TestType {
    #[serde(rename = "A")]
    #[strum(serialize = "A")]
    Ability,
    #[serde(rename = "B")]
    #[strum(serialize = "B")]
    Biodata,
    #[serde(rename = "C")]
    #[strum(serialize = "C")]
    Competencies,
    #[serde(rename = "D")]
    #[strum(serialize = "D")]
    Development,
    #[serde(rename = "E")]
    #[strum(serialize = "E")]
    Exercises,
    #[serde(rename = "K")]
    #[strum(serialize = "K")]
    Knowledge,
    #[serde(rename = "P")]
    #[strum(serialize = "P")]
    Personality,
    #[serde(rename = "S")]
    #[strum(serialize = "S")]
    Simulations,
}

impl TestType {
    pub const ALL: [TestType; 8] = [
        TestType::Ability,
        TestType::Biodata,
        TestType::Competencies,
        TestType::Development,
        TestType::Exercises,
        TestType::Knowledge,
        TestType::Personality,
        TestType::Simulations,
    ];

    pub fn label(self) -> &'static str {
        match self {
            TestType::Ability => "Ability & Aptitude",
            TestType::Biodata => "Biodata & Situational Judgement",
            TestType::Competencies => "Competencies",
            TestType::Development => "Development & 360",
            TestType::Exercises => "Assessment Exercises",
            TestType::Knowledge => "Knowledge & Skills",
            TestType::Personality => "Personality & Behaviour",
            TestType::Simulations => "Simulations",
        }
    }

    /// Knowledge or Personality.
    pub fn is_primary(self) -> bool {
        matches!(self, TestType::Knowledge | TestType::Personality)
    }
}

impl fmt::Display for TestType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_ref())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown test type tag: {0:?}")]
pub struct UnknownTestType(pub String);

impl FromStr for TestType {
    type Err = UnknownTestType;

    /// Accepts the one-letter code or the full label, case-insensitive.
    /// "Behavior" (US spelling) is accepted for Personality.
    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let trimmed = raw.trim();
        let lowered = trimmed.to_lowercase();

        TestType::ALL
            .into_iter()
            .find(|tag| {
                tag.as_ref().eq_ignore_ascii_case(trimmed) || tag.label().to_lowercase() == lowered
            })
            .or_else(|| (lowered == "personality & behavior").then_some(TestType::Personality))
            .ok_or_else(|| UnknownTestType(raw.to_string()))
    }
}

/// Required categories used when the classifier yields none: {K, P}.
pub fn default_required_categories() -> BTreeSet<TestType> {
    BTreeSet::from([TestType::Knowledge, TestType::Personality])
}

/// Parses tags leniently, dropping anything outside the alphabet.
pub fn parse_test_types<I, S>(raw: I) -> BTreeSet<TestType>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    raw.into_iter()
        .filter_map(|tag| tag.as_ref().parse().ok())
        .collect()
}
