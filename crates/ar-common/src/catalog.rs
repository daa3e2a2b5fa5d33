use std::collections::HashSet;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::Candidate;
use crate::category::TestType;

#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("failed to read catalog {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse catalog {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// One crawled assessment product.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CatalogEntry {
    pub name: String,
    pub url: String,
    #[serde(default)]
    pub description: String,
    /// Codes or full labels; the crawler writes this as `test_type`.
    #[serde(default, alias = "test_type")]
    pub test_types: Vec<String>,
    #[serde(default)]
    pub job_level: String,
    #[serde(default)]
    pub skills: Vec<String>,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub duration: String,
}

impl CatalogEntry {
    /// Tags outside the alphabet are dropped.
    pub fn tags(&self) -> impl Iterator<Item = TestType> + '_ {
        self.test_types.iter().filter_map(|raw| raw.parse().ok())
    }

    pub fn to_candidate(&self, semantic_similarity: f64) -> Candidate {
        Candidate {
            identifier: self.url.trim().to_string(),
            name: self.name.clone(),
            description: self.description.clone(),
            skills: self.skills.clone(),
            test_types: self.tags().collect(),
            job_level: self.job_level.clone(),
            category: self.category.clone(),
            duration: self.duration.clone(),
            semantic_similarity,
        }
    }
}

/// Reads the crawler's JSON array.
///
/// Entries without a URL are skipped, and so is any later entry whose URL
/// was already seen.
pub fn load_catalog(path: impl AsRef<Path>) -> Result<Vec<CatalogEntry>, CatalogError> {
    let path = path.as_ref();
    let raw = std::fs::read_to_string(path).map_err(|source| CatalogError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let entries = parse_catalog(&raw).map_err(|source| CatalogError::Parse {
        path: path.to_path_buf(),
        source,
    })?;
    info!(path = %path.display(), entries = entries.len(), "catalog loaded");
    Ok(entries)
}

pub fn parse_catalog(raw: &str) -> Result<Vec<CatalogEntry>, serde_json::Error> {
    let parsed: Vec<CatalogEntry> = serde_json::from_str(raw)?;
    let mut seen: HashSet<String> = HashSet::with_capacity(parsed.len());
    let mut entries = Vec::with_capacity(parsed.len());

    for (position, entry) in parsed.into_iter().enumerate() {
        let url = entry.url.trim();
        if url.is_empty() {
            warn!(position, name = %entry.name, "catalog entry without url skipped");
            continue;
        }
        if !seen.insert(url.to_string()) {
            warn!(position, url, "duplicate catalog url skipped");
            continue;
        }
        let unknown = entry
            .test_types
            .iter()
            .filter(|raw| raw.parse::<TestType>().is_err())
            .count();
        if unknown > 0 {
            warn!(url, unknown, "unrecognised test types dropped");
        }
        entries.push(entry);
    }

    Ok(entries)
}
