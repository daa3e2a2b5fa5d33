//! Offline quality measurement against labelled query sets.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::recommend::Recommender;
use crate::run_id;

/// One `(query, relevant url)` pair in long format.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabelledRow {
    #[serde(rename = "Query", alias = "query")]
    pub query: String,
    #[serde(rename = "Assessment_url", alias = "assessment_url", alias = "url")]
    pub assessment_url: String,
}

/// Unlabelled query, as found in a test set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryRow {
    #[serde(rename = "Query", alias = "query")]
    pub query: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LabelledQuery {
    pub query: String,
    pub relevant: Vec<String>,
}

/// Prediction output in long format, one row per recommended url.
pub type PredictionRow = LabelledRow;

/// Groups long-format rows by query, keeping first-seen order of queries
/// and urls. Blank urls are ignored.
pub fn group_labelled_rows(rows: &[LabelledRow]) -> Vec<LabelledQuery> {
    let mut grouped: Vec<LabelledQuery> = Vec::new();

    for row in rows {
        let url = row.assessment_url.trim();
        let position = match grouped.iter().position(|q| q.query == row.query) {
            Some(position) => position,
            None => {
                grouped.push(LabelledQuery {
                    query: row.query.clone(),
                    relevant: Vec::new(),
                });
                grouped.len() - 1
            }
        };
        let relevant = &mut grouped[position].relevant;
        if !url.is_empty() && !relevant.iter().any(|u| u == url) {
            relevant.push(url.to_string());
        }
    }

    grouped
}

/// `|top-k ∩ relevant| / |relevant|`, 0 when nothing is relevant.
pub fn recall_at_k<P, R>(predicted: &[P], relevant: &[R], k: usize) -> f64
where
    P: AsRef<str>,
    R: AsRef<str>,
{
    let relevant: HashSet<&str> = relevant.iter().map(|s| s.as_ref()).collect();
    if relevant.is_empty() {
        return 0.0;
    }
    let hits: HashSet<&str> = predicted
        .iter()
        .take(k)
        .map(|s| s.as_ref())
        .filter(|url| relevant.contains(url))
        .collect();
    hits.len() as f64 / relevant.len() as f64
}

/// Precision at each hit rank within top-k, averaged over
/// `min(k, |relevant|)`.
pub fn average_precision_at_k<P, R>(predicted: &[P], relevant: &[R], k: usize) -> f64
where
    P: AsRef<str>,
    R: AsRef<str>,
{
    let relevant: HashSet<&str> = relevant.iter().map(|s| s.as_ref()).collect();
    let denominator = k.min(relevant.len());
    if denominator == 0 {
        return 0.0;
    }

    let mut seen = HashSet::new();
    let mut hits = 0usize;
    let mut sum = 0.0;
    for (rank, url) in predicted.iter().take(k).map(|s| s.as_ref()).enumerate() {
        if relevant.contains(url) && seen.insert(url) {
            hits += 1;
            sum += hits as f64 / (rank + 1) as f64;
        }
    }
    sum / denominator as f64
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QueryEvaluation {
    pub query: String,
    pub relevant: Vec<String>,
    pub predicted: Vec<String>,
    pub recall: f64,
    pub average_precision: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EvaluationReport {
    pub run_id: String,
    pub generated_at: DateTime<Utc>,
    pub k: usize,
    pub evaluated: usize,
    pub skipped: usize,
    pub mean_recall: f64,
    pub mean_average_precision: f64,
    pub queries: Vec<QueryEvaluation>,
}

fn mean(values: impl Iterator<Item = f64>) -> f64 {
    let (sum, count) = values.fold((0.0, 0usize), |(s, c), v| (s + v, c + 1));
    if count == 0 { 0.0 } else { sum / count as f64 }
}

/// Runs every labelled query through `recommender` and scores the top `k`.
/// Queries without relevant urls or whose recommendation fails are skipped.
pub fn evaluate(recommender: &Recommender, queries: &[LabelledQuery], k: usize) -> EvaluationReport {
    let mut results = Vec::with_capacity(queries.len());
    let mut skipped = 0;

    for (index, labelled) in queries.iter().enumerate() {
        if labelled.relevant.is_empty() {
            skipped += 1;
            continue;
        }
        match recommender.recommend(&labelled.query, k) {
            Ok(recommendation) => {
                let predicted: Vec<String> = recommendation
                    .identifiers()
                    .into_iter()
                    .map(String::from)
                    .collect();
                let recall = recall_at_k(&predicted, &labelled.relevant, k);
                let average_precision = average_precision_at_k(&predicted, &labelled.relevant, k);
                info!(
                    query_index = index,
                    relevant = labelled.relevant.len(),
                    recall,
                    "query evaluated"
                );
                results.push(QueryEvaluation {
                    query: labelled.query.clone(),
                    relevant: labelled.relevant.clone(),
                    predicted,
                    recall,
                    average_precision,
                });
            }
            Err(err) => {
                warn!(query_index = index, error = %err, "query skipped");
                skipped += 1;
            }
        }
    }

    let report = EvaluationReport {
        run_id: run_id::get().to_string(),
        generated_at: Utc::now(),
        k,
        evaluated: results.len(),
        skipped,
        mean_recall: mean(results.iter().map(|r| r.recall)),
        mean_average_precision: mean(results.iter().map(|r| r.average_precision)),
        queries: results,
    };
    info!(
        run_id = %report.run_id,
        k,
        evaluated = report.evaluated,
        skipped = report.skipped,
        mean_recall = report.mean_recall,
        "evaluation finished"
    );
    report
}

/// Top-`n` urls for each query in long format. Failing queries produce no
/// rows.
pub fn predict<S: AsRef<str>>(recommender: &Recommender, queries: &[S], n: usize) -> Vec<PredictionRow> {
    let mut rows = Vec::new();
    for (index, query) in queries.iter().enumerate() {
        let query = query.as_ref();
        match recommender.recommend(query, n) {
            Ok(recommendation) => rows.extend(
                recommendation
                    .identifiers()
                    .into_iter()
                    .filter(|url| !url.is_empty())
                    .map(|url| PredictionRow {
                        query: query.to_string(),
                        assessment_url: url.to_string(),
                    }),
            ),
            Err(err) => warn!(query_index = index, error = %err, "prediction skipped"),
        }
    }
    rows
}
