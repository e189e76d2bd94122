//! Incremental variant of the ask path.
//!
//! A producer task runs the model invocation and forwards each token
//! into a bounded queue; the caller drains the queue as a stream. The
//! sequence is finite and ordered: tokens, then exactly one terminal
//! sources event, even when the model dies mid-generation. Dropping
//! the receiver ends the producer at its next send.

use futures::StreamExt;
use quarry_core::models::{AnswerEvent, SourceAttribution};
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tracing::warn;

use crate::prompts;
use crate::synthesizer::{apply_filter, compile_filter, Synthesizer};

const CHANNEL_CAPACITY: usize = 64;

impl Synthesizer {
    pub fn answer_stream(
        &self,
        question: String,
        filter: Option<String>,
    ) -> ReceiverStream<AnswerEvent> {
        let (tx, rx) = mpsc::channel(CHANNEL_CAPACITY);
        let synthesizer = self.clone();
        tokio::spawn(async move {
            synthesizer.stream_task(question, filter, tx).await;
        });
        ReceiverStream::new(rx)
    }

    async fn stream_task(
        self,
        question: String,
        filter: Option<String>,
        tx: mpsc::Sender<AnswerEvent>,
    ) {
        let candidates = match self.retriever().retrieve(&question).await {
            Ok(candidates) => candidates,
            Err(err) => {
                warn!("retrieval failed mid-stream: {err}");
                let _ = tx.send(AnswerEvent::Sources { sources: vec![] }).await;
                return;
            }
        };

        let prompt = prompts::qa_prompt(&question, &candidates);
        let mut failed = false;

        match self.llm.complete_stream(&prompt).await {
            Ok(mut tokens) => {
                while let Some(item) = tokens.next().await {
                    match item {
                        Ok(text) => {
                            if tx.send(AnswerEvent::Token { text }).await.is_err() {
                                // Consumer abandoned the sequence.
                                return;
                            }
                        }
                        Err(err) => {
                            warn!("model stream failed mid-generation: {err}");
                            failed = true;
                            break;
                        }
                    }
                }
            }
            Err(err) => {
                warn!("model stream invocation failed: {err}");
                failed = true;
            }
        }

        // Terminal event. A failed generation reports the empty
        // candidate set; a bad filter degrades the same way instead of
        // escaping the stream boundary.
        let docs = if failed {
            Vec::new()
        } else {
            match compile_filter(filter.as_deref()) {
                Ok(filter) => apply_filter(&candidates, filter.as_ref()),
                Err(err) => {
                    warn!("{err}");
                    Vec::new()
                }
            }
        };

        let confidence = self.confidence(&question, &docs).await;
        let sources = docs
            .iter()
            .map(|d| SourceAttribution::from_chunk(&d.chunk, confidence))
            .collect();
        let _ = tx.send(AnswerEvent::Sources { sources }).await;
    }
}
