//! One chat turn at a time against a streaming chat endpoint.
//!
//! A turn appends the user message and an empty assistant placeholder to the
//! transcript, posts the whole conversation, and rewrites the placeholder with
//! the running reply as newline-delimited records arrive. It ends in one of
//! three ways:
//!
//! - completed: the body ended or a record said `done`;
//! - stopped: the user triggered the stop handle, and the partial reply is
//!   kept with a marker appended;
//! - failed: anything else went wrong, and the reply is replaced by a fixed
//!   placeholder.
//!
//! Whatever the ending, the session is idle again afterwards.

use std::future::Future;
use std::time::Duration;

use futures_util::{Stream, StreamExt};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::api::models::{fetch_models, first_model, ModelsError};
use crate::api::ChatRequest;
use crate::core::accumulator::{Folded, StreamAccumulator};
use crate::core::cancel::CancellationController;
use crate::core::constants::{ERROR_PLACEHOLDER, STOPPED_MARKER};
use crate::core::decoder::ChunkDecoder;
use crate::core::error::{summarize_error_body, ChatError};
use crate::core::message::{HistoryEdit, Message, TranscriptSink};
use crate::utils::url::{construct_api_url, CHAT_ENDPOINT};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionOptions {
    /// Fail the turn when no bytes arrive for this long. `None` waits forever.
    pub idle_timeout: Option<Duration>,
    /// Fail the turn once this many lines could not be parsed.
    pub max_malformed_chunks: Option<usize>,
    pub stopped_marker: String,
    pub error_placeholder: String,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            idle_timeout: None,
            max_malformed_chunks: None,
            stopped_marker: STOPPED_MARKER.to_string(),
            error_placeholder: ERROR_PLACEHOLDER.to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnState {
    Idle,
    Sending,
    Streaming,
    Stopped,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TurnOutcome {
    Completed,
    Stopped,
    Failed(ChatError),
}

pub struct ChatSession {
    client: reqwest::Client,
    base_url: String,
    model: Option<String>,
    options: SessionOptions,
    controller: CancellationController,
    state: TurnState,
}

impl ChatSession {
    pub fn new(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
            model: None,
            options: SessionOptions::default(),
            controller: CancellationController::new(),
            state: TurnState::Idle,
        }
    }

    pub fn with_options(mut self, options: SessionOptions) -> Self {
        self.options = options;
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.set_model(Some(model.into()));
        self
    }

    pub fn set_model(&mut self, model: Option<String>) {
        self.model = model.filter(|name| !name.trim().is_empty());
    }

    pub fn model(&self) -> Option<&str> {
        self.model.as_deref()
    }

    pub fn client(&self) -> &reqwest::Client {
        &self.client
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Idle whenever no turn holds the stop handle, including after a `send`
    /// future was dropped mid-turn.
    pub fn state(&self) -> TurnState {
        if self.controller.is_active() {
            self.state
        } else {
            TurnState::Idle
        }
    }

    /// A handle the front-end can keep to stop the turn in flight.
    pub fn stop_handle(&self) -> CancellationController {
        self.controller.clone()
    }

    /// Stop the turn in flight. Does nothing when idle.
    pub fn stop(&self) -> bool {
        self.controller.trigger()
    }

    /// Select the first model the server lists when none is selected yet.
    pub async fn ensure_model(&mut self) -> Result<Option<&str>, ModelsError> {
        if self.model.is_none() {
            let listing = fetch_models(&self.client, &self.base_url).await?;
            self.set_model(first_model(&listing.models));
            debug!(model = ?self.model, "selected default model");
        }
        Ok(self.model.as_deref())
    }

    /// Run one turn for `input`, writing into `transcript` as the reply streams.
    ///
    /// Returns `None` without touching the transcript when the input is blank,
    /// no model is selected, or another turn still holds the stop handle.
    pub async fn send<S>(&mut self, transcript: &mut S, input: &str) -> Option<TurnOutcome>
    where
        S: TranscriptSink + ?Sized,
    {
        if input.trim().is_empty() {
            debug!("ignoring blank input");
            return None;
        }
        let Some(model) = self.model.clone() else {
            debug!("ignoring send without a selected model");
            return None;
        };
        let (token, turn_id) = match self.controller.begin() {
            Ok(handle) => handle,
            Err(busy) => {
                debug!(error = %busy, "ignoring send while a turn is in flight");
                return None;
            }
        };
        let mut turn = TurnGuard {
            transcript,
            controller: self.controller.clone(),
            turn_id,
            stopped_marker: self.options.stopped_marker.clone(),
            settled: false,
        };

        self.transition(TurnState::Sending, turn_id);

        let user_message = Message::user(input);
        let mut messages: Vec<_> = turn
            .transcript
            .messages()
            .iter()
            .map(Message::to_api)
            .collect();
        messages.push(user_message.to_api());
        turn.transcript.apply(HistoryEdit::Append(user_message));
        turn.transcript.apply(HistoryEdit::Append(Message::assistant("")));

        let request = ChatRequest {
            model,
            messages,
            stream: true,
        };
        let mut accumulator = StreamAccumulator::new(self.options.max_malformed_chunks);
        let result = self
            .stream_reply(&mut *turn.transcript, &request, &mut accumulator, &token, turn_id)
            .await;
        let outcome = self.settle(&mut *turn.transcript, result, &accumulator, turn_id);

        turn.settled = true;
        drop(turn);
        self.transition(TurnState::Idle, turn_id);
        Some(outcome)
    }

    async fn stream_reply<S>(
        &mut self,
        transcript: &mut S,
        request: &ChatRequest,
        accumulator: &mut StreamAccumulator,
        token: &CancellationToken,
        turn_id: u64,
    ) -> Result<(), ChatError>
    where
        S: TranscriptSink + ?Sized,
    {
        let url = construct_api_url(&self.base_url, CHAT_ENDPOINT);
        debug!(
            turn_id,
            url = %url,
            model = %request.model,
            messages = request.messages.len(),
            "sending chat request"
        );

        let idle_timeout = self.options.idle_timeout;
        let pending = self.client.post(url).json(request).send();
        let response = until_cancelled(token, within(idle_timeout, pending)).await???;

        if !response.status().is_success() {
            let status = response.status();
            let body = until_cancelled(token, within(idle_timeout, response.text()))
                .await??
                .unwrap_or_else(|_| "<no body>".to_string());
            return Err(ChatError::Transport(format!(
                "API request failed with status {status}: {}",
                summarize_error_body(&body)
            )));
        }

        self.transition(TurnState::Streaming, turn_id);

        let mut body = std::pin::pin!(response.bytes_stream());
        let mut decoder = ChunkDecoder::new();

        while let Some(fragment) =
            until_cancelled(token, next_fragment(&mut body, idle_timeout)).await??
        {
            for line in decoder.push(&fragment) {
                if fold_into(transcript, accumulator, &line)? {
                    return Ok(());
                }
                if token.is_cancelled() {
                    return Err(ChatError::Cancelled);
                }
            }
        }

        if let Some(line) = decoder.finish() {
            fold_into(transcript, accumulator, &line)?;
        }
        Ok(())
    }

    fn settle<S>(
        &mut self,
        transcript: &mut S,
        result: Result<(), ChatError>,
        accumulator: &StreamAccumulator,
        turn_id: u64,
    ) -> TurnOutcome
    where
        S: TranscriptSink + ?Sized,
    {
        match result {
            Ok(()) => {
                debug!(
                    turn_id,
                    records = accumulator.records(),
                    malformed = accumulator.malformed(),
                    "turn completed"
                );
                TurnOutcome::Completed
            }
            Err(ChatError::Cancelled) => {
                self.transition(TurnState::Stopped, turn_id);
                let content = format!("{}{}", accumulator.content(), self.options.stopped_marker);
                transcript.apply(HistoryEdit::ReplaceLast(content));
                TurnOutcome::Stopped
            }
            Err(err) => {
                self.transition(TurnState::Failed, turn_id);
                warn!(turn_id, error = %err, "chat turn failed");
                transcript.apply(HistoryEdit::ReplaceLast(
                    self.options.error_placeholder.clone(),
                ));
                TurnOutcome::Failed(err)
            }
        }
    }

    fn transition(&mut self, next: TurnState, turn_id: u64) {
        debug!(turn_id, from = ?self.state, to = ?next, "turn state");
        self.state = next;
    }
}

/// Fold one line and copy the running total into the open message.
/// Returns `true` once the server has signalled the end of the turn.
fn fold_into<S>(
    transcript: &mut S,
    accumulator: &mut StreamAccumulator,
    line: &str,
) -> Result<bool, ChatError>
where
    S: TranscriptSink + ?Sized,
{
    if line.is_empty() {
        return Ok(false);
    }
    match accumulator.fold_line(line)? {
        Folded::Delta { content, done } => {
            transcript.apply(HistoryEdit::ReplaceLast(content.to_string()));
            Ok(done)
        }
        Folded::Skipped => Ok(false),
    }
}

/// Race `fut` against the turn's token; dropping `fut` aborts the request.
async fn until_cancelled<F: Future>(
    token: &CancellationToken,
    fut: F,
) -> Result<F::Output, ChatError> {
    tokio::select! {
        biased;
        _ = token.cancelled() => Err(ChatError::Cancelled),
        output = fut => Ok(output),
    }
}

/// Await `fut`, failing the turn if it takes longer than `limit`.
async fn within<F: Future>(limit: Option<Duration>, fut: F) -> Result<F::Output, ChatError> {
    match limit {
        Some(limit) => tokio::time::timeout(limit, fut).await.map_err(|_| {
            ChatError::Transport(format!("stream idle for {}s", limit.as_secs_f32()))
        }),
        None => Ok(fut.await),
    }
}

async fn next_fragment<B, T>(
    body: &mut B,
    idle_timeout: Option<Duration>,
) -> Result<Option<T>, ChatError>
where
    B: Stream<Item = Result<T, reqwest::Error>> + Unpin,
{
    within(idle_timeout, body.next())
        .await?
        .transpose()
        .map_err(ChatError::from)
}

/// Holds the stop handle and the transcript for the length of one turn.
///
/// When the `send` future is dropped before the turn settles, the open reply
/// is closed as stopped and the handle is released so a new turn can start.
struct TurnGuard<'a, S: TranscriptSink + ?Sized> {
    transcript: &'a mut S,
    controller: CancellationController,
    turn_id: u64,
    stopped_marker: String,
    settled: bool,
}

impl<S: TranscriptSink + ?Sized> Drop for TurnGuard<'_, S> {
    fn drop(&mut self) {
        if !self.settled {
            warn!(turn_id = self.turn_id, "turn dropped before it settled");
            let partial = self
                .transcript
                .messages()
                .last()
                .filter(|message| message.role.is_assistant())
                .map(|message| format!("{}{}", message.content, self.stopped_marker));
            if let Some(content) = partial {
                self.transcript.apply(HistoryEdit::ReplaceLast(content));
            }
        }
        self.controller.release(self.turn_id);
    }
}
