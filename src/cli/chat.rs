//! Line-oriented chat front-end.

use std::error::Error;
use std::io::{self, Write};

use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::warn;

use crate::api::models::fetch_models;
use crate::core::message::{ConversationHistory, HistoryEdit, Message, TranscriptSink};
use crate::core::session::{ChatSession, TurnOutcome};
use crate::utils::logging::LoggingState;

/// Prints the reply as it streams while keeping the transcript.
///
/// The session always hands over the full text of the open message; only
/// the part not yet on screen is written. When the new text does not extend
/// what was shown (the failure placeholder), it goes on a fresh line.
pub struct TerminalTranscript<W: Write> {
    history: ConversationHistory,
    out: W,
    shown: String,
}

impl<W: Write> TerminalTranscript<W> {
    pub fn new(out: W) -> Self {
        Self {
            history: ConversationHistory::new(),
            out,
            shown: String::new(),
        }
    }

    pub fn history(&self) -> &ConversationHistory {
        &self.history
    }

    pub fn clear(&mut self) {
        self.history = ConversationHistory::new();
        self.shown.clear();
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn render(&mut self, edit: &HistoryEdit) -> io::Result<()> {
        match edit {
            HistoryEdit::Append(message) => {
                if message.role.is_assistant() {
                    self.shown.clear();
                    write!(self.out, "{}", message.content)?;
                    self.shown.push_str(&message.content);
                }
            }
            HistoryEdit::ReplaceLast(content) => match content.strip_prefix(self.shown.as_str()) {
                Some(rest) => {
                    write!(self.out, "{rest}")?;
                    self.shown.push_str(rest);
                }
                None => {
                    if !self.shown.is_empty() {
                        writeln!(self.out)?;
                    }
                    write!(self.out, "{content}")?;
                    self.shown = content.clone();
                }
            },
        }
        self.out.flush()
    }
}

impl<W: Write> TranscriptSink for TerminalTranscript<W> {
    fn messages(&self) -> &[Message] {
        self.history.messages()
    }

    fn apply(&mut self, edit: HistoryEdit) {
        if let Err(err) = self.render(&edit) {
            warn!(error = %err, "failed to write reply to terminal");
        }
        self.history.apply(edit);
    }
}

#[derive(Debug, PartialEq, Eq)]
pub enum ReplCommand {
    Quit,
    Clear,
    Models,
    Model(Option<String>),
    Log(Option<String>),
    Help,
    Unknown(String),
}

/// Parse a `/command` line. Anything else is a chat message.
pub fn parse_repl_command(line: &str) -> Option<ReplCommand> {
    let rest = line.trim().strip_prefix('/')?;
    let (name, arg) = match rest.split_once(char::is_whitespace) {
        Some((name, arg)) => (name, Some(arg.trim().to_string()).filter(|a| !a.is_empty())),
        None => (rest, None),
    };
    let command = match name {
        "quit" | "exit" => ReplCommand::Quit,
        "clear" => ReplCommand::Clear,
        "models" => ReplCommand::Models,
        "model" => ReplCommand::Model(arg),
        "log" => ReplCommand::Log(arg),
        "help" => ReplCommand::Help,
        other => ReplCommand::Unknown(other.to_string()),
    };
    Some(command)
}

const HELP: &str = "Commands:\n  /model [NAME]  Show or switch the model\n  /models        List models on the server\n  /clear         Start a new conversation\n  /log [FILE]    Log to FILE, or toggle logging\n  /quit          Leave\nCtrl-C stops a reply; Ctrl-C or Ctrl-D at the prompt leaves.";

pub async fn run_chat(
    mut session: ChatSession,
    mut logging: LoggingState,
) -> Result<(), Box<dyn Error>> {
    println!(
        "💬 {} @ {} (type /help for commands)",
        session.model().unwrap_or("(no model)"),
        session.base_url()
    );

    let mut transcript = TerminalTranscript::new(io::stdout());
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        print!("> ");
        io::stdout().flush()?;

        let line = tokio::select! {
            line = lines.next_line() => line?,
            _ = tokio::signal::ctrl_c() => None,
        };
        let Some(line) = line else {
            println!();
            break;
        };

        if let Some(command) = parse_repl_command(&line) {
            match command {
                ReplCommand::Quit => break,
                ReplCommand::Clear => {
                    transcript.clear();
                    println!("Started a new conversation.");
                }
                ReplCommand::Models => {
                    match fetch_models(session.client(), session.base_url()).await {
                        Ok(listing) => {
                            for name in listing.model_names() {
                                let current = Some(name.as_str()) == session.model();
                                println!(" {} {name}", if current { "*" } else { " " });
                            }
                        }
                        Err(err) => eprintln!("❌ {err}"),
                    }
                }
                ReplCommand::Model(None) => {
                    println!("Model: {}", session.model().unwrap_or("(none)"));
                }
                ReplCommand::Model(Some(name)) => {
                    session.set_model(Some(name));
                    println!("Model: {}", session.model().unwrap_or("(none)"));
                }
                ReplCommand::Log(Some(path)) => match logging.set_log_file(path) {
                    Ok(message) => println!("{message}"),
                    Err(err) => eprintln!("❌ Failed to open log file: {err}"),
                },
                ReplCommand::Log(None) => match logging.toggle_logging() {
                    Ok(message) => println!("{message}"),
                    Err(err) => eprintln!("⚠️  {err}. Use /log <file> first."),
                },
                ReplCommand::Help => println!("{HELP}"),
                ReplCommand::Unknown(name) => eprintln!("⚠️  Unknown command: /{name}"),
            }
            continue;
        }

        let Some(outcome) = run_turn(&mut session, &mut transcript, &line).await? else {
            continue;
        };
        println!();
        if let TurnOutcome::Failed(err) = &outcome {
            eprintln!("❌ {err}");
        }

        let messages = transcript.history().messages();
        let turn = &messages[messages.len().saturating_sub(2)..];
        if let Err(err) = logging.log_turn(turn) {
            warn!(error = %err, "failed to write transcript log");
        }
    }

    Ok(())
}

/// Drive one turn, turning Ctrl-C into a stop request.
pub async fn run_turn<S>(
    session: &mut ChatSession,
    transcript: &mut S,
    input: &str,
) -> io::Result<Option<TurnOutcome>>
where
    S: TranscriptSink + ?Sized,
{
    let stop = session.stop_handle();
    let turn = session.send(transcript, input);
    tokio::pin!(turn);

    loop {
        tokio::select! {
            outcome = &mut turn => return Ok(outcome),
            signal = tokio::signal::ctrl_c() => {
                signal?;
                stop.trigger();
            }
        }
    }
}
