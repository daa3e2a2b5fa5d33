use std::collections::{BTreeSet, HashSet};

use once_cell::sync::Lazy;
use regex::Regex;

use super::{AnalyzerError, QueryAnalysis, QueryAnalyzer};
use crate::category::TestType;
use crate::skill_expander::known_aliases;

static WORD: Lazy<Regex> = Lazy::new(|| Regex::new(r"[\w+#.]+").unwrap());

/// (label, terms) checked in order; the first level with a hit wins.
static JOB_LEVEL_TERMS: &[(&str, &[&str])] = &[
    ("Entry Level", &["entry level", "entry-level", "graduate", "graduates", "new grad"]),
    ("Senior Level", &["senior", "lead", "principal"]),
    ("Mid Level", &["mid level", "mid-level", "intermediate"]),
    ("Executive", &["executive", "ceo", "coo", "cfo", "cto", "vp", "director"]),
];

static TEST_TYPE_TERMS: &[(TestType, &[&str])] = &[
    (
        TestType::Knowledge,
        &["java", "python", "sql", "programming", "technical", "coding"],
    ),
    (
        TestType::Personality,
        &[
            "personality",
            "behavioral",
            "behavioural",
            "teamwork",
            "collaboration",
            "collaborate",
            "communication",
            "interpersonal",
            "leadership",
            "cultural",
            "culturally",
        ],
    ),
    (
        TestType::Ability,
        &["problem solving", "problem-solving", "analytical", "reasoning", "aptitude"],
    ),
];

static TECHNICAL_SKILLS: &[&str] = &[
    "java", "python", "javascript", "typescript", "sql", "c++", "c#", "php", "ruby", "swift",
    "kotlin", "golang", "rust", "scala", "matlab", "perl", "bash", "powershell", "html", "css",
    "react", "angular", "vue", "node", "django", "flask", "spring", "hibernate", ".net", "excel",
    "selenium", "tableau", "aws", "docker",
];

static SOFT_SKILLS: &[&str] = &[
    "communication", "leadership", "teamwork", "collaboration", "interpersonal",
    "problem-solving", "analytical", "creative", "adaptability", "flexibility", "sales",
    "negotiation", "customer service",
];

static ROLE_NOUNS: &[&str] = &[
    "developer", "engineer", "analyst", "manager", "director", "ceo", "coo", "cfo", "cto",
    "architect", "consultant", "specialist", "administrator", "coordinator", "intern",
    "associate", "executive", "officer", "designer", "tester", "programmer", "assistant",
    "representative", "accountant",
];

/// Deterministic rule-based classifier. It never fails, so it is also the
/// offline analyzer used for evaluation.
#[derive(Debug, Clone, Default)]
pub struct KeywordQueryAnalyzer;

impl KeywordQueryAnalyzer {
    pub fn new() -> Self {
        Self
    }
}

struct QueryText {
    lowered: String,
    words: Vec<String>,
    word_set: HashSet<String>,
}

impl QueryText {
    fn new(query: &str) -> Self {
        let lowered = query.to_lowercase();
        let words: Vec<String> = WORD
            .find_iter(&lowered)
            .map(|m| m.as_str().trim_end_matches('.').to_string())
            .filter(|w| !w.is_empty())
            .collect();
        let word_set = words.iter().cloned().collect();
        Self {
            lowered,
            words,
            word_set,
        }
    }

    /// Multi-word terms match as substrings, single words as whole words.
    fn mentions(&self, term: &str) -> bool {
        if term.contains(' ') {
            self.lowered.contains(term)
        } else {
            self.word_set.contains(term)
        }
    }
}

fn singular(word: &str) -> &str {
    word.strip_suffix('s').filter(|w| w.len() > 2).unwrap_or(word)
}

fn detect_job_level(text: &QueryText) -> Option<String> {
    JOB_LEVEL_TERMS
        .iter()
        .find(|(_, terms)| terms.iter().any(|term| text.mentions(term)))
        .map(|(label, _)| label.to_string())
}

fn detect_test_types(text: &QueryText) -> Vec<String> {
    TEST_TYPE_TERMS
        .iter()
        .filter(|(_, terms)| terms.iter().any(|term| text.mentions(term)))
        .map(|(tag, _)| tag.as_ref().to_string())
        .collect()
}

fn detect_skills(text: &QueryText) -> Vec<String> {
    let mut found = BTreeSet::new();
    for term in TECHNICAL_SKILLS
        .iter()
        .chain(SOFT_SKILLS)
        .copied()
        .chain(known_aliases())
    {
        // single letters and two-letter aliases are too ambiguous in prose
        if term.len() < 3 && !term.contains(['+', '#']) {
            continue;
        }
        if text.mentions(term) {
            found.insert(term.to_string());
        }
    }
    found.into_iter().collect()
}

/// "<qualifier> <role noun>", e.g. "java developer" from "Java developers".
fn detect_role(text: &QueryText) -> Option<String> {
    let position = text
        .words
        .iter()
        .position(|w| ROLE_NOUNS.contains(&singular(w)))?;
    let noun = singular(&text.words[position]);
    let qualifier = position
        .checked_sub(1)
        .map(|i| text.words[i].as_str())
        .filter(|w| w.len() > 2 && !crate::retrieval::tokenizer::is_stop_word(w))
        .filter(|w| !matches!(*w, "hire" | "hiring" | "need" | "want" | "looking"));

    Some(match qualifier {
        Some(q) => format!("{q} {noun}"),
        None => noun.to_string(),
    })
}

impl QueryAnalyzer for KeywordQueryAnalyzer {
    fn name(&self) -> &'static str {
        "keyword"
    }

    fn analyze(&self, query: &str) -> Result<QueryAnalysis, AnalyzerError> {
        let text = QueryText::new(query);
        let required_skills = detect_skills(&text);

        let search_query = if required_skills.is_empty() {
            query.trim().to_string()
        } else {
            format!("{} {}", query.trim(), required_skills.join(" "))
        };

        Ok(QueryAnalysis {
            job_level: detect_job_level(&text),
            required_test_types: detect_test_types(&text),
            role: detect_role(&text),
            search_query: Some(search_query),
            key_requirements: Vec::new(),
            required_skills,
        })
    }
}
