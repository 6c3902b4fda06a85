//! Non-interactive single turn

use std::error::Error;
use std::io;

use crate::cli::chat::{run_turn, TerminalTranscript};
use crate::core::message::TranscriptSink;
use crate::core::session::{ChatSession, TurnOutcome};
use crate::utils::logging::LoggingState;

pub async fn run_say(
    mut session: ChatSession,
    logging: LoggingState,
    prompt: Vec<String>,
) -> Result<(), Box<dyn Error>> {
    let prompt = prompt.join(" ");
    if prompt.trim().is_empty() {
        return Err("Usage: streamchat say <prompt>".into());
    }

    let mut transcript = TerminalTranscript::new(io::stdout());
    let outcome = run_turn(&mut session, &mut transcript, &prompt).await?;
    println!();

    if let Err(err) = logging.log_turn(transcript.history().messages()) {
        tracing::warn!(error = %err, "failed to write transcript log");
    }

    match outcome {
        Some(TurnOutcome::Completed) | Some(TurnOutcome::Stopped) => Ok(()),
        Some(TurnOutcome::Failed(err)) => Err(err.into()),
        None => Err(
            "No model selected. Pass -m <model> or run 'streamchat set default-model <model>'."
                .into(),
        ),
    }
}
