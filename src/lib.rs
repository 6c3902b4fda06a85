//! streamchat is a terminal chat client for LLM inference servers that stream
//! replies as newline-delimited JSON.
//!
//! The crate is organized around a small set of collaborating layers:
//! - [`core`] owns the streaming turn: line decoding, reply accumulation,
//!   cancellation, and the [`core::session::ChatSession`] that ties them
//!   together, plus configuration.
//! - [`api`] defines the chat and model-listing payloads exchanged with the
//!   server.
//! - [`cli`] parses arguments and runs the interactive and one-shot
//!   front-ends on top of [`core::session`].
//! - [`utils`] holds URL helpers and the transcript log.

pub mod api;
pub mod cli;
pub mod core;
pub mod utils;
