//! Recovery chain for model output that should be a `StructuredAnswer`.
//!
//! Each state tries exactly one strategy and falls through on failure;
//! the terminal state always succeeds, so parsing can never raise.

use once_cell::sync::Lazy;
use quarry_core::models::StructuredAnswer;
use quarry_core::traits::LlmProvider;
use regex::Regex;
use tracing::debug;

use crate::prompts;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ParseState {
    RawParse,
    StripFenceParse,
    RepairModelParse,
    LiteralFallback,
}

static FENCE_OPEN: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)^\s*```(?:json)?").unwrap());
static FENCE_CLOSE: Lazy<Regex> = Lazy::new(|| Regex::new(r"```\s*$").unwrap());

/// Coerce `raw` into a `StructuredAnswer`, consulting `llm` once for
/// the repair pass if the local strategies fail.
pub async fn parse_structured(raw: &str, llm: &dyn LlmProvider) -> StructuredAnswer {
    let mut state = ParseState::RawParse;
    loop {
        state = match state {
            ParseState::RawParse => match try_parse(raw) {
                Some(answer) => return answer,
                None => ParseState::StripFenceParse,
            },
            ParseState::StripFenceParse => match try_parse(&strip_fences(raw)) {
                Some(answer) => return answer,
                None => ParseState::RepairModelParse,
            },
            ParseState::RepairModelParse => {
                match llm.complete(&prompts::repair_prompt(raw)).await {
                    Ok(repaired) => match try_parse(&strip_fences(&repaired)) {
                        Some(answer) => return answer,
                        None => ParseState::LiteralFallback,
                    },
                    Err(err) => {
                        debug!("repair pass failed: {err}");
                        ParseState::LiteralFallback
                    }
                }
            }
            ParseState::LiteralFallback => return StructuredAnswer::fallback(raw),
        };
    }
}

fn try_parse(text: &str) -> Option<StructuredAnswer> {
    serde_json::from_str::<StructuredAnswer>(text.trim()).ok()
}

/// Remove a leading ```/```json fence and a trailing ``` fence.
pub fn strip_fences(text: &str) -> String {
    let stripped = FENCE_OPEN.replace(text.trim(), "");
    let stripped = FENCE_CLOSE.replace(&stripped, "");
    stripped.trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use quarry_context::mock::{FailingLlm, MockLlm};

    #[tokio::test]
    async fn well_formed_json_parses_directly() {
        let llm = FailingLlm::new();
        let answer =
            parse_structured(r#"{"answer": "yes", "sources": ["a.rs"]}"#, &llm).await;
        assert_eq!(answer.answer, "yes");
        assert_eq!(answer.sources, vec!["a.rs"]);
    }

    #[tokio::test]
    async fn fenced_json_is_recovered() {
        let llm = FailingLlm::new();
        let raw = "```json\n{\"answer\": \"fenced\", \"sources\": []}\n```";
        let answer = parse_structured(raw, &llm).await;
        assert_eq!(answer.answer, "fenced");
    }

    #[tokio::test]
    async fn bare_fence_is_recovered() {
        let llm = FailingLlm::new();
        let raw = "```\n{\"answer\": \"bare\", \"sources\": [\"x\"]}\n```";
        let answer = parse_structured(raw, &llm).await;
        assert_eq!(answer.answer, "bare");
        assert_eq!(answer.sources, vec!["x"]);
    }

    #[tokio::test]
    async fn repair_pass_fixes_prose_wrapped_json() {
        // The local strategies cannot handle prose; the repair model
        // returns the coerced shape.
        let llm = MockLlm::returning(r#"{"answer": "repaired", "sources": ["b.rs"]}"#);
        let raw = "Sure! Here is the JSON you asked for: answer is repaired.";
        let answer = parse_structured(raw, &llm).await;
        assert_eq!(answer.answer, "repaired");
        assert_eq!(answer.sources, vec!["b.rs"]);
    }

    #[tokio::test]
    async fn irrecoverable_text_falls_back_to_literal() {
        let llm = MockLlm::returning("still not json");
        let raw = "The model rambled on without structure.";
        let answer = parse_structured(raw, &llm).await;
        assert_eq!(answer.answer, raw);
        assert!(answer.sources.is_empty());
    }

    #[tokio::test]
    async fn repair_model_being_down_still_falls_back() {
        let llm = FailingLlm::new();
        let raw = "garbage output";
        let answer = parse_structured(raw, &llm).await;
        assert_eq!(answer.answer, raw);
        assert!(answer.sources.is_empty());
    }

    #[test]
    fn strip_fences_handles_both_forms() {
        assert_eq!(strip_fences("```json\n{}\n```"), "{}");
        assert_eq!(strip_fences("```\n{}\n```"), "{}");
        assert_eq!(strip_fences("{}"), "{}");
    }
}
