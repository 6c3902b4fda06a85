use crate::core::message::Message;
use std::fs::OpenOptions;
use std::io::{self, BufWriter, Write};

/// Plain-text transcript log. User lines are prefixed with `You:`, assistant
/// replies are written as-is, and each message is followed by a blank line.
#[derive(Debug, Default)]
pub struct LoggingState {
    file_path: Option<String>,
    is_active: bool,
}

impl LoggingState {
    pub fn new(log_file: Option<String>) -> Self {
        let is_active = log_file.is_some();
        LoggingState {
            file_path: log_file,
            is_active,
        }
    }

    pub fn set_log_file(&mut self, path: String) -> io::Result<String> {
        // Fail early if the file cannot be created
        OpenOptions::new().create(true).append(true).open(&path)?;

        self.file_path = Some(path.clone());
        self.is_active = true;

        Ok(format!("Logging enabled to: {path}"))
    }

    pub fn toggle_logging(&mut self) -> Result<String, String> {
        match &self.file_path {
            Some(path) => {
                self.is_active = !self.is_active;
                if self.is_active {
                    Ok(format!("Logging resumed to: {path}"))
                } else {
                    Ok(format!("Logging paused (file: {path})"))
                }
            }
            None => Err("No log file specified".to_string()),
        }
    }

    /// Append the messages of one finished turn.
    pub fn log_turn(&self, messages: &[Message]) -> io::Result<()> {
        let Some(file_path) = self.file_path.as_deref().filter(|_| self.is_active) else {
            return Ok(());
        };

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(file_path)?;
        let mut writer = BufWriter::new(file);

        for message in messages {
            if message.role.is_user() {
                for line in format!("You: {}", message.content).lines() {
                    writeln!(writer, "{line}")?;
                }
            } else {
                for line in message.content.lines() {
                    writeln!(writer, "{line}")?;
                }
            }
            writeln!(writer)?;
        }

        writer.flush()
    }
}
