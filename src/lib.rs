pub mod backoff;
pub mod cancel;
pub mod cli;
pub mod command;
pub mod error;
pub mod retry;
