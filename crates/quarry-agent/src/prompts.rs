use quarry_core::models::ScoredChunk;

pub const SYSTEM_PROMPT: &str = r#"You are an API that returns *only* JSON.

The JSON must look like:
{ "answer": string, "sources": string[] }

If unsure, use { "answer": "I don't know.", "sources": [] }.

DO NOT wrap the JSON in markdown or prose."#;

/// What ask paths say when the model itself is unreachable.
pub const APOLOGY: &str = "Sorry, I hit an error while generating this answer.";

/// The full question prompt: system rules, the question, and every
/// retrieved chunk prefixed by its file path.
pub fn qa_prompt(question: &str, candidates: &[ScoredChunk]) -> String {
    let context = candidates
        .iter()
        .map(|c| format!("\u{2022} {}\n{}", c.chunk.file_path, c.chunk.content))
        .collect::<Vec<_>>()
        .join("\n\n");

    format!(
        "{SYSTEM_PROMPT}\n\n<question>{question}</question>\n\n<context>\n{context}\n</context>\n\nJSON:"
    )
}

/// One-shot repair pass: ask the model to coerce arbitrary text into
/// the required shape.
pub fn repair_prompt(raw: &str) -> String {
    format!(
        "The following text was supposed to be a JSON object of the shape \
{{ \"answer\": string, \"sources\": string[] }} but is not valid JSON.\n\
Rewrite it into exactly that JSON object, keeping the original meaning. \
Output only the JSON object, nothing else.\n\n{raw}"
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use quarry_core::models::Chunk;
    use std::collections::BTreeSet;

    #[test]
    fn qa_prompt_embeds_question_and_paths() {
        let candidates = vec![ScoredChunk {
            score: 0.9,
            chunk: Chunk {
                content: "fn alpha() {}".into(),
                file_path: "src/alpha.rs".into(),
                complexity: 1,
                anti_patterns: vec![],
                authors: BTreeSet::new(),
                embedding: None,
            },
        }];
        let prompt = qa_prompt("What does alpha do?", &candidates);
        assert!(prompt.contains("<question>What does alpha do?</question>"));
        assert!(prompt.contains("\u{2022} src/alpha.rs\nfn alpha() {}"));
        assert!(prompt.ends_with("JSON:"));
    }
}
