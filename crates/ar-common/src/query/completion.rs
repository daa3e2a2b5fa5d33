use super::{AnalyzerError, QueryAnalysis, QueryAnalyzer};

/// Text-completion service behind [`CompletionAnalyzer`].
pub trait CompletionBackend: Send + Sync {
    fn model(&self) -> &str;

    fn complete(&self, prompt: &str) -> Result<String, AnalyzerError>;
}

/// Query analyzer backed by a completion model prompted for a JSON object.
///
/// No backend ships in this workspace: binaries use
/// [`KeywordQueryAnalyzer`](super::KeywordQueryAnalyzer), and a hosted model
/// client plugs in here by implementing [`CompletionBackend`].
pub struct CompletionAnalyzer<B> {
    backend: B,
}

impl<B: CompletionBackend> CompletionAnalyzer<B> {
    pub fn new(backend: B) -> Self {
        Self { backend }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }
}

impl<B: CompletionBackend> QueryAnalyzer for CompletionAnalyzer<B> {
    fn name(&self) -> &'static str {
        "completion"
    }

    fn analyze(&self, query: &str) -> Result<QueryAnalysis, AnalyzerError> {
        let prompt = build_analysis_prompt(query);
        tracing::debug!(model = self.backend.model(), prompt_chars = prompt.len(), "analyzing query");
        let reply = self.backend.complete(&prompt)?;
        parse_analysis_response(&reply)
    }
}

const PROMPT_HEADER: &str = r#"You are an HR analyst extracting literal keywords for a keyword-focused assessment search engine. Reply with a single JSON object and nothing else.

Fields:
- job_level: "Entry Level", "Mid Level", "Senior Level" or "Executive" when the text says so, otherwise null.
- required_skills: every literal technical skill, soft skill and constraint, e.g. "Java", "communication", "SQL", "40 minutes".
- required_test_types: codes of the test types needed. K = Knowledge & Skills (technical, programming, tools), P = Personality & Behaviour (soft skills, teamwork), A = Ability & Aptitude (problem solving, analytical). Other codes: B, C, D, E, S.
- role: the role being hired for.
- key_requirements: short phrases summarising the requirements.
- search_query: the full original text followed by the extracted skills. Do not add synonyms.

Include both K and P when the role needs technical and soft skills.

Example
Query: "I am hiring for Java developers who can also collaborate effectively with my business teams, tests within 40 minutes."
JSON: {"job_level": null, "required_skills": ["Java", "collaboration", "40 minutes"], "required_test_types": ["K", "P"], "role": "Java Developer", "key_requirements": ["Java skills", "collaboration", "40 minute limit"], "search_query": "I am hiring for Java developers who can also collaborate effectively with my business teams, tests within 40 minutes. Java collaboration 40 minutes"}
"#;

pub fn build_analysis_prompt(query: &str) -> String {
    let quoted = serde_json::Value::String(query.to_string());
    format!("{PROMPT_HEADER}\nQuery: {quoted}\nJSON:")
}

/// Strips an optional Markdown code fence and parses the JSON object.
pub fn parse_analysis_response(reply: &str) -> Result<QueryAnalysis, AnalyzerError> {
    let trimmed = reply.trim();
    let body = trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
        .map(|rest| rest.trim_end().trim_end_matches("```"))
        .unwrap_or(trimmed)
        .trim();

    serde_json::from_str(body).map_err(|err| AnalyzerError::MalformedResponse(err.to_string()))
}
