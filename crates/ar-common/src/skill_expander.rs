use std::collections::BTreeSet;

use unicode_normalization::UnicodeNormalization;

/// Synonym groups: canonical name → aliases (the canonical name is listed
/// among its own aliases). Groups are activated by alias membership.
pub static SKILL_SYNONYMS: &[(&str, &[&str])] = &[
    ("python", &["python", "py", "python3"]),
    ("java", &["java", "j2ee", "spring"]),
    (
        "javascript",
        &["javascript", "js", "node", "nodejs", "react", "angular", "vue"],
    ),
    ("sql", &["sql", "mysql", "postgresql", "database", "db"]),
    ("data", &["data", "analytics", "analysis"]),
    ("excel", &["excel", "spreadsheet", "ms excel"]),
    (
        "communication",
        &["communication", "verbal", "written", "presentation"],
    ),
    ("leadership", &["leadership", "management", "manager", "lead"]),
    (
        "teamwork",
        &["teamwork", "collaboration", "team", "collaborative"],
    ),
];

/// NFKC + lowercase + trim.
pub fn fold_skill(skill: &str) -> String {
    skill.nfkc().collect::<String>().to_lowercase().trim().to_string()
}

fn groups_containing(skill: &str) -> impl Iterator<Item = &'static [&'static str]> + '_ {
    SKILL_SYNONYMS
        .iter()
        .filter(move |(_, aliases)| aliases.contains(&skill))
        .map(|(_, aliases)| *aliases)
}

/// Expands literal skill terms with every synonym group they belong to.
///
/// Inputs are folded with [`fold_skill`]; blank inputs are dropped. Newly
/// added aliases are expanded as well, so the result is a fixed point:
/// `expand_skills(expand_skills(s)) == expand_skills(s)`.
pub fn expand_skills<I, S>(skills: I) -> BTreeSet<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut expanded = BTreeSet::new();
    let mut pending: Vec<String> = skills
        .into_iter()
        .map(|skill| fold_skill(skill.as_ref()))
        .filter(|skill| !skill.is_empty())
        .collect();

    while let Some(skill) = pending.pop() {
        if !expanded.insert(skill.clone()) {
            continue;
        }
        for group in groups_containing(&skill) {
            pending.extend(
                group
                    .iter()
                    .filter(|alias| !expanded.contains(**alias))
                    .map(|alias| alias.to_string()),
            );
        }
    }

    expanded
}

/// Every alias in the synonym table, used as extraction vocabulary.
pub fn known_aliases() -> impl Iterator<Item = &'static str> {
    SKILL_SYNONYMS
        .iter()
        .flat_map(|(_, aliases)| aliases.iter().copied())
}
