//! Quill CLI library.
//!
//! - `cli/` - argument parsing and the conversion command
//! - `output` - terminal rendering of session snapshots
//! - `samples` - built-in sample transcripts

pub mod cli;
pub mod output;
pub mod samples;
