use anyhow::Result;
use console::style;
use quarry_agent::Synthesizer;
use quarry_core::models::AnswerEvent;
use std::io::Write;
use std::path::Path;
use tokio_stream::StreamExt;

use super::{load_config, resolve_collection};

pub async fn handle_ask(
    question: String,
    filter: Option<String>,
    stream: bool,
    collection: Option<String>,
    config_path: Option<&Path>,
) -> Result<()> {
    let config = load_config(config_path)?;
    let collection = resolve_collection(&config, collection)?;
    let embedder = quarry_context::select_embedder(&config.embedding)?;
    let llm = quarry_context::select_llm(&config.llm)?;

    let synthesizer = Synthesizer::open(&config, &collection, embedder, llm).await?;

    if stream {
        let mut events = synthesizer.answer_stream(question, filter);
        let mut stdout = std::io::stdout();
        while let Some(event) = events.next().await {
            match event {
                AnswerEvent::Token { text } => {
                    write!(stdout, "{text}")?;
                    stdout.flush()?;
                }
                AnswerEvent::Sources { sources } => {
                    writeln!(stdout)?;
                    if let Some(first) = sources.first() {
                        println!(
                            "\n{} {:.2}",
                            style("confidence").dim(),
                            first.confidence
                        );
                    }
                    for source in sources {
                        println!("{} {}", style("source").dim(), source.file_path);
                    }
                }
            }
        }
        return Ok(());
    }

    let envelope = synthesizer.answer(&question, filter.as_deref()).await?;
    println!("{}", envelope.text);
    println!(
        "\n{} {:.2}",
        style("confidence").dim(),
        envelope.confidence
    );
    for source in &envelope.sources {
        println!("{} {}", style("source").dim(), source);
    }
    Ok(())
}
