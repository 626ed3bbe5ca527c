use serde::Deserialize;
use std::fs;
use std::sync::Arc;
use log::info;
use thiserror::Error;

use crate::models::chat::Turn;
use crate::models::document::RetrievedDocument;

/// Separator placed on its own line between formatted sources.
pub const SOURCE_SEPARATOR: &str = "=================";

pub const DEFAULT_GROUNDED_PROMPT: &str =
    "You are an AI assistant that helps users learn from the information found in the source material.
Answer the query using only the sources provided below.
Use bullets if the answer has multiple points.
If the answer is longer than 3 sentences, provide a summary.
Answer ONLY with the facts listed in the list of sources below. Cite your source when you answer the question
If there isn't enough information below, say you don't know.
Do not generate answers that don't use the sources below.
Chat History:
{history}
Query: {query}
Sources:
{sources}
";

const REQUIRED_PLACEHOLDERS: [&str; 2] = ["query", "sources"];

#[derive(Debug, Error)]
pub enum PromptError {
    #[error("Prompt template is missing the '{{{0}}}' placeholder")]
    PlaceholderMissing(String),
    #[error("Prompt file IO error: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Prompt JSON parsing error: {0}")]
    JsonError(#[from] serde_json::Error),
}

#[derive(Deserialize, Debug, Clone)]
pub struct PromptConfig {
    pub grounded_answer: String,
}

impl Default for PromptConfig {
    fn default() -> Self {
        Self {
            grounded_answer: DEFAULT_GROUNDED_PROMPT.to_string(),
        }
    }
}

impl PromptConfig {
    fn validate(&self) -> Result<(), PromptError> {
        for name in REQUIRED_PLACEHOLDERS {
            if !self.grounded_answer.contains(&format!("{{{}}}", name)) {
                return Err(PromptError::PlaceholderMissing(name.to_string()));
            }
        }
        Ok(())
    }
}

pub fn load_prompts(path: Option<&str>) -> Result<Arc<PromptConfig>, PromptError> {
    let config = match path {
        Some(path) => {
            let file_content = fs::read_to_string(path)?;
            let config: PromptConfig = serde_json::from_str(&file_content)?;
            info!("Loaded grounded answer template from: {}", path);
            config
        }
        None => PromptConfig::default(),
    };
    config.validate()?;
    Ok(Arc::new(config))
}

pub fn format_history(history: &[Turn]) -> String {
    history
        .iter()
        .map(|turn| format!("User: {}\nAssistant: {}", turn.query, turn.response))
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn format_sources(documents: &[RetrievedDocument]) -> String {
    documents
        .iter()
        .map(|doc| format!("TITLE: {}, CONTENT: {}, LOCATIONS: {}", doc.title, doc.chunk, doc.locations))
        .collect::<Vec<_>>()
        .join(&format!("\n{}\n", SOURCE_SEPARATOR))
}

/// Builds the full grounding prompt for one request.
pub fn assemble(
    config: &PromptConfig,
    query: &str,
    history: &[Turn],
    documents: &[RetrievedDocument]
) -> String {
    let history_text = format_history(history);
    let sources_text = format_sources(documents);

    render(
        &config.grounded_answer,
        &[
            ("history", history_text.as_str()),
            ("query", query),
            ("sources", sources_text.as_str()),
        ]
    )
}

/// Substitutes `{name}` placeholders in one pass. Substituted values are never
/// scanned again, and unknown `{...}` sequences are copied through untouched.
fn render(template: &str, values: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];

        let substituted = after.find('}').and_then(|close| {
            let name = &after[..close];
            values
                .iter()
                .find(|(key, _)| *key == name)
                .map(|(_, value)| (*value, close))
        });

        match substituted {
            Some((value, close)) => {
                out.push_str(value);
                rest = &after[close + 1..];
            }
            None => {
                out.push('{');
                rest = after;
            }
        }
    }
    out.push_str(rest);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report_a() -> RetrievedDocument {
        RetrievedDocument::new("Report A", "X occurred on day 1", "Site 1")
    }

    #[test]
    fn assemble_embeds_query_and_formatted_source() {
        let prompt = assemble(&PromptConfig::default(), "What is incident X?", &[], &[report_a()]);

        assert!(prompt.contains("TITLE: Report A, CONTENT: X occurred on day 1, LOCATIONS: Site 1"));
        assert!(prompt.contains("Query: What is incident X?"));
        assert!(prompt.contains("Chat History:\n\nQuery:"));
    }

    #[test]
    fn assemble_is_deterministic() {
        let config = PromptConfig::default();
        let history = vec![Turn::new("q1", "a1")];
        let docs = vec![report_a(), RetrievedDocument::new("Report B", "Y", "Site 2")];

        let first = assemble(&config, "q2", &history, &docs);
        let second = assemble(&config, "q2", &history, &docs);
        assert_eq!(first.as_bytes(), second.as_bytes());
    }

    #[test]
    fn sources_keep_backend_order_and_separator_lines() {
        let docs = vec![
            RetrievedDocument::new("First", "1", "a"),
            RetrievedDocument::new("Second", "2", "b"),
            RetrievedDocument::new("Third", "3", "c"),
        ];

        let text = format_sources(&docs);
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(
            lines,
            vec![
                "TITLE: First, CONTENT: 1, LOCATIONS: a",
                SOURCE_SEPARATOR,
                "TITLE: Second, CONTENT: 2, LOCATIONS: b",
                SOURCE_SEPARATOR,
                "TITLE: Third, CONTENT: 3, LOCATIONS: c",
            ]
        );
    }

    #[test]
    fn history_is_chronological_user_assistant_pairs() {
        let history = vec![Turn::new("first?", "one"), Turn::new("second?", "two")];

        assert_eq!(
            format_history(&history),
            "User: first?\nAssistant: one\nUser: second?\nAssistant: two"
        );
        assert_eq!(format_history(&[]), "");
    }

    #[test]
    fn placeholders_in_user_text_are_not_expanded() {
        let prompt = assemble(&PromptConfig::default(), "tell me {sources}", &[], &[report_a()]);

        assert!(prompt.contains("Query: tell me {sources}\n"));
        assert_eq!(prompt.matches("TITLE: Report A").count(), 1);
    }

    #[test]
    fn render_leaves_unknown_braces_alone() {
        let out = render("a {b} {c", &[("x", "y")]);
        assert_eq!(out, "a {b} {c");
    }

    #[test]
    fn validate_rejects_template_without_sources() {
        let config = PromptConfig {
            grounded_answer: "Query: {query}".to_string(),
        };
        match config.validate() {
            Err(PromptError::PlaceholderMissing(name)) => assert_eq!(name, "sources"),
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn load_prompts_defaults_without_path() {
        let config = load_prompts(None).unwrap();
        assert_eq!(config.grounded_answer, DEFAULT_GROUNDED_PROMPT);
    }

    #[test]
    fn load_prompts_reads_json_file() {
        let path = std::env::temp_dir().join(format!("grounded-prompt-{}.json", uuid::Uuid::new_v4()));
        fs::write(&path, r#"{"grounded_answer": "Q={query}\nS={sources}"}"#).unwrap();

        let config = load_prompts(path.to_str()).unwrap();
        let prompt = assemble(&config, "why", &[], &[report_a()]);
        assert_eq!(prompt, "Q=why\nS=TITLE: Report A, CONTENT: X occurred on day 1, LOCATIONS: Site 1");

        fs::remove_file(&path).unwrap();
    }
}
