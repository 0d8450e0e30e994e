//! Session-scoped result cache: video summaries and chat transcripts.
//!
//! Entries are created lazily and never expire while the session lives.
//! Transcript entries are immutable once created, except for a trailing
//! pending entry, which is replaced exactly once when its answer arrives.

use crate::error::{Result, SnipError};
use std::collections::HashMap;
use std::future::Future;
use std::time::Duration;
use tracing::{debug, warn};

/// Identifies one chat transcript: a video within an index.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TranscriptKey {
    pub index_id: String,
    pub video_id: String,
}

impl TranscriptKey {
    pub fn new(index_id: &str, video_id: &str) -> Self {
        Self {
            index_id: index_id.to_string(),
            video_id: video_id.to_string(),
        }
    }
}

/// State of a chat answer.
#[derive(Debug, Clone, PartialEq)]
pub enum Answer {
    /// The question was submitted and the answer is not yet known.
    Pending,
    Answered { text: String, latency: Duration },
    Failed { message: String },
}

impl Answer {
    pub fn is_pending(&self) -> bool {
        matches!(self, Answer::Pending)
    }
}

/// One question and its answer.
#[derive(Debug, Clone, PartialEq)]
pub struct ChatEntry {
    pub question: String,
    pub answer: Answer,
}

/// Per-session cache of generated content.
#[derive(Debug, Default)]
pub struct ResultCache {
    /// `None` records a failed generation, distinct from a missing key.
    summaries: HashMap<String, Option<String>>,
    transcripts: HashMap<TranscriptKey, Vec<ChatEntry>>,
}

impl ResultCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// The cached summary state: `None` if never attempted, `Some(None)` if
    /// generation failed.
    pub fn summary(&self, video_id: &str) -> Option<Option<&str>> {
        self.summaries.get(video_id).map(|s| s.as_deref())
    }

    /// Return the cached summary, generating it on first access.
    ///
    /// `generator` runs at most once per video for the life of the cache. A
    /// failure is stored as `None` and is not retried.
    pub async fn get_or_create_summary<F, Fut>(
        &mut self,
        video_id: &str,
        generator: F,
    ) -> Option<String>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<String>>,
    {
        if let Some(cached) = self.summaries.get(video_id) {
            debug!("Summary cache hit for {}", video_id);
            return cached.clone();
        }

        let generated = match generator().await {
            Ok(text) => Some(text),
            Err(e) => {
                warn!("Summary generation failed for {}: {}", video_id, e);
                None
            }
        };

        self.summaries
            .insert(video_id.to_string(), generated.clone());
        generated
    }

    /// Entries of a transcript in insertion order.
    pub fn transcript(&self, key: &TranscriptKey) -> &[ChatEntry] {
        self.transcripts
            .get(key)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// The question awaiting an answer, if any.
    pub fn pending_question(&self, key: &TranscriptKey) -> Option<&str> {
        self.transcript(key)
            .last()
            .filter(|entry| entry.answer.is_pending())
            .map(|entry| entry.question.as_str())
    }

    /// Append a question with a pending answer.
    ///
    /// Rejected when the question is blank or an answer is still pending.
    pub fn append_question(&mut self, key: &TranscriptKey, question: &str) -> Result<()> {
        let question = question.trim();
        if question.is_empty() {
            return Err(SnipError::InvalidInput("question is empty".to_string()));
        }
        if self.pending_question(key).is_some() {
            return Err(SnipError::InvalidInput(
                "the previous question is still being answered".to_string(),
            ));
        }

        self.transcripts
            .entry(key.clone())
            .or_default()
            .push(ChatEntry {
                question: question.to_string(),
                answer: Answer::Pending,
            });
        Ok(())
    }

    /// Store the answer to the pending question.
    ///
    /// Returns false, changing nothing, when the last entry is not pending.
    pub fn resolve_pending(
        &mut self,
        key: &TranscriptKey,
        answer: &str,
        latency: Duration,
    ) -> bool {
        self.replace_pending(
            key,
            Answer::Answered {
                text: answer.to_string(),
                latency,
            },
        )
    }

    /// Record that answering the pending question failed.
    pub fn fail_pending(&mut self, key: &TranscriptKey, message: &str) -> bool {
        self.replace_pending(
            key,
            Answer::Failed {
                message: message.to_string(),
            },
        )
    }

    // Only mutation point for existing transcript entries.
    fn replace_pending(&mut self, key: &TranscriptKey, answer: Answer) -> bool {
        match self.transcripts.get_mut(key).and_then(|t| t.last_mut()) {
            Some(entry) if entry.answer.is_pending() => {
                entry.answer = answer;
                true
            }
            _ => false,
        }
    }

    /// Empty a transcript.
    pub fn clear(&mut self, key: &TranscriptKey) {
        self.transcripts.remove(key);
    }

    /// Plain-text export of a transcript.
    pub fn export_transcript(&self, key: &TranscriptKey) -> String {
        self.transcript(key)
            .iter()
            .map(|entry| {
                let answer = match &entry.answer {
                    Answer::Pending => "(waiting for answer)".to_string(),
                    Answer::Answered { text, .. } => text.clone(),
                    Answer::Failed { message } => format!("Error: {}", message),
                };
                format!("Q: {}\nA: {}", entry.question, answer)
            })
            .collect::<Vec<_>>()
            .join("\n\n")
    }

    /// Prompt for `question` carrying up to `turns` previous answered exchanges.
    ///
    /// With no usable history, or `turns == 0`, the bare question is returned.
    pub fn context_prompt(&self, key: &TranscriptKey, question: &str, turns: usize) -> String {
        if turns == 0 {
            return question.to_string();
        }

        let answered: Vec<String> = self
            .transcript(key)
            .iter()
            .filter_map(|entry| match &entry.answer {
                Answer::Answered { text, .. } => {
                    Some(format!("Q: {}\nA: {}", entry.question, text))
                }
                _ => None,
            })
            .collect();

        if answered.is_empty() {
            return question.to_string();
        }

        let recent = &answered[answered.len().saturating_sub(turns)..];
        format!(
            "Previous conversation context:\n{}\n\nCurrent question: {}",
            recent.join("\n"),
            question
        )
    }
}
