pub mod accumulator;
pub mod cancel;
pub mod config;
pub mod constants;
pub mod decoder;
pub mod error;
pub mod message;
pub mod session;
