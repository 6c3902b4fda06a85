use tracing::warn;

use crate::api::StreamChunk;
use crate::core::error::{summarize_error_value, ChatError};

/// Result of folding one decoded line into the running reply.
#[derive(Debug, PartialEq, Eq)]
pub enum Folded<'a> {
    /// The record parsed; `content` is the running total after its delta.
    Delta { content: &'a str, done: bool },
    /// The line was not a record and was dropped.
    Skipped,
}

/// Running assistant reply for one turn.
///
/// This is deliberately separate from the transcript entry it feeds: the
/// session copies [`content`](Self::content) into the open message after each
/// fold instead of appending deltas to the displayed text.
#[derive(Debug, Default)]
pub struct StreamAccumulator {
    content: String,
    records: usize,
    malformed: usize,
    max_malformed: Option<usize>,
}

impl StreamAccumulator {
    /// `max_malformed` of `None` or `Some(0)` never escalates.
    pub fn new(max_malformed: Option<usize>) -> Self {
        Self {
            max_malformed: max_malformed.filter(|limit| *limit > 0),
            ..Self::default()
        }
    }

    /// Parse `line` as a [`StreamChunk`] and append its delta.
    ///
    /// Lines that are not valid records are logged and skipped. They only
    /// become an error once `max_malformed` of them have been seen in this
    /// turn. A record carrying an `error` field fails the turn.
    pub fn fold_line(&mut self, line: &str) -> Result<Folded<'_>, ChatError> {
        let chunk = match serde_json::from_str::<StreamChunk>(line) {
            Ok(chunk) => chunk,
            Err(err) => {
                self.malformed += 1;
                warn!(
                    line = %line,
                    error = %err,
                    malformed = self.malformed,
                    "Failed to parse stream chunk"
                );
                if let Some(limit) = self.max_malformed {
                    if self.malformed >= limit {
                        return Err(ChatError::Protocol(format!(
                            "{} malformed stream chunks",
                            self.malformed
                        )));
                    }
                }
                return Ok(Folded::Skipped);
            }
        };

        if let Some(error) = chunk.error.as_ref() {
            return Err(ChatError::Protocol(summarize_error_value(error)));
        }

        self.records += 1;
        self.content.push_str(chunk.delta());
        Ok(Folded::Delta {
            content: &self.content,
            done: chunk.is_done(),
        })
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn records(&self) -> usize {
        self.records
    }

    pub fn malformed(&self) -> usize {
        self.malformed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(content: &str) -> String {
        serde_json::json!({ "message": { "role": "assistant", "content": content } }).to_string()
    }

    #[test]
    fn concatenates_deltas_in_order() {
        let mut acc = StreamAccumulator::new(None);
        let parts = ["The ", "quick ", "", "brown\n", "fox"];
        for part in parts {
            acc.fold_line(&record(part)).expect("fold");
        }
        assert_eq!(acc.content(), parts.concat());
        assert_eq!(acc.records(), parts.len());
    }

    #[test]
    fn returns_running_total_and_done_flag() {
        let mut acc = StreamAccumulator::new(None);
        assert_eq!(
            acc.fold_line(r#"{"message":{"content":"He"}}"#),
            Ok(Folded::Delta {
                content: "He",
                done: false
            })
        );
        assert_eq!(
            acc.fold_line(r#"{"message":{"content":"llo"}}"#),
            Ok(Folded::Delta {
                content: "Hello",
                done: false
            })
        );
        assert_eq!(
            acc.fold_line(r#"{"done":true}"#),
            Ok(Folded::Delta {
                content: "Hello",
                done: true
            })
        );
    }

    #[test]
    fn malformed_line_between_records_is_skipped() {
        let mut with_noise = StreamAccumulator::new(None);
        with_noise.fold_line(&record("a")).expect("fold");
        assert_eq!(with_noise.fold_line("{\"message\":"), Ok(Folded::Skipped));
        with_noise.fold_line(&record("b")).expect("fold");

        let mut clean = StreamAccumulator::new(None);
        clean.fold_line(&record("a")).expect("fold");
        clean.fold_line(&record("b")).expect("fold");

        assert_eq!(with_noise.content(), clean.content());
        assert_eq!(with_noise.malformed(), 1);
    }

    #[test]
    fn malformed_limit_escalates_to_protocol_error() {
        let mut acc = StreamAccumulator::new(Some(2));
        assert_eq!(acc.fold_line("not json"), Ok(Folded::Skipped));
        let err = acc.fold_line("still not json").expect_err("limit reached");
        assert!(matches!(err, ChatError::Protocol(_)));
    }

    #[test]
    fn server_error_record_fails_the_turn() {
        let mut acc = StreamAccumulator::new(None);
        acc.fold_line(&record("partial")).expect("fold");
        let err = acc
            .fold_line(r#"{"error":"model runner has unexpectedly stopped"}"#)
            .expect_err("error record");
        assert_eq!(
            err,
            ChatError::Protocol("model runner has unexpectedly stopped".into())
        );
    }

    #[test]
    fn zero_malformed_limit_never_escalates() {
        let mut acc = StreamAccumulator::new(Some(0));
        for _ in 0..3 {
            assert_eq!(acc.fold_line("not json"), Ok(Folded::Skipped));
        }
        assert_eq!(acc.malformed(), 3);
    }

    #[test]
    fn nested_error_object_fails_the_turn() {
        let mut acc = StreamAccumulator::new(None);
        acc.fold_line(&record("partial")).expect("fold");
        let err = acc
            .fold_line(r#"{"error":{"message":"CUDA out of memory","type":"server_error"}}"#)
            .expect_err("error record");
        assert_eq!(err, ChatError::Protocol("CUDA out of memory".into()));
        assert_eq!(acc.malformed(), 0);
    }
}
