//! CLI argument structures and parsing.

use std::path::PathBuf;

use clap::Parser;

use crate::samples::Sample;

/// Log verbosity level for CLI output.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum LogLevel {
    /// Only show errors
    Error,
    /// Show warnings and errors (default)
    #[default]
    Warn,
    /// Show informational messages, warnings, and errors
    Info,
    /// Show debug messages and above
    Debug,
    /// Show all messages including trace-level details
    Trace,
}

impl LogLevel {
    /// Convert to tracing filter string.
    pub fn as_filter_str(&self) -> &'static str {
        match self {
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        }
    }

    /// Parse from string (case-insensitive).
    pub fn from_str_loose(s: &str) -> Option<LogLevel> {
        match s.to_lowercase().as_str() {
            "error" => Some(LogLevel::Error),
            "warn" | "warning" => Some(LogLevel::Warn),
            "info" => Some(LogLevel::Info),
            "debug" => Some(LogLevel::Debug),
            "trace" => Some(LogLevel::Trace),
            _ => None,
        }
    }
}

/// Quill - turn a dialogue transcript into narrative text
///
/// Reads the transcript from the arguments, a file, a built-in sample, or
/// stdin, streams it through the conversion service, and types the result
/// out as it arrives. Progress goes to stderr; the text goes to stdout.
#[derive(Debug, Parser)]
#[command(name = "quill")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Transcript text (reads stdin when empty and no other source is given)
    #[arg(trailing_var_arg = true, conflicts_with_all = ["file", "example"])]
    pub text: Vec<String>,

    /// Read the transcript from a file
    #[arg(long, short = 'f', value_name = "PATH", conflicts_with = "example")]
    pub file: Option<PathBuf>,

    /// Use a built-in sample transcript
    #[arg(long, short = 'e', value_enum)]
    pub example: Option<Sample>,

    /// JSON file with conversion rules to send along
    #[arg(long, value_name = "PATH")]
    pub rule_config: Option<PathBuf>,

    /// Conversion stream endpoint
    #[arg(long, env = "QUILL_ENDPOINT", help_heading = "Connection")]
    pub endpoint: Option<String>,

    /// Fail if no data arrives for this many seconds (0 disables)
    #[arg(long, value_name = "SECS", help_heading = "Connection")]
    pub idle_timeout: Option<u64>,

    /// Delay between typed characters
    #[arg(long, value_name = "MS", help_heading = "Output")]
    pub interval_ms: Option<u64>,

    /// Print text as soon as it arrives
    #[arg(long, help_heading = "Output")]
    pub no_typewriter: bool,

    /// Save the final text to a file
    #[arg(long, short = 'o', value_name = "PATH", help_heading = "Output")]
    pub output: Option<PathBuf>,

    /// Print the final session as JSON instead of typing the text
    #[arg(long, help_heading = "Output")]
    pub json: bool,

    /// Suppress status lines
    #[arg(long, short = 'q', help_heading = "Output")]
    pub quiet: bool,

    /// Config file (defaults to ~/.quill/config.toml)
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Set log verbosity level (error, warn, info, debug, trace)
    #[arg(
        long = "log-level",
        short = 'L',
        value_enum,
        default_value = "warn",
        help_heading = "Debugging"
    )]
    pub log_level: LogLevel,

    /// Enable verbose output (same as --log-level debug)
    #[arg(long = "verbose", short = 'v', help_heading = "Debugging")]
    pub verbose: bool,

    /// Write trace-level logs to ./quill-debug.log
    #[arg(long = "debug", help_heading = "Debugging")]
    pub debug: bool,
}

impl Cli {
    /// Effective log level: `-v`, then `QUILL_LOG_LEVEL`, then `--log-level`.
    pub fn effective_log_level(&self, env_level: Option<&str>) -> LogLevel {
        if self.verbose {
            return LogLevel::Debug;
        }
        env_level
            .and_then(LogLevel::from_str_loose)
            .unwrap_or(self.log_level)
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_parse_text_and_flags() {
        let cli = Cli::try_parse_from([
            "quill",
            "--interval-ms",
            "10",
            "--quiet",
            "A:",
            "hello",
        ])
        .unwrap();
        assert_eq!(cli.text, vec!["A:", "hello"]);
        assert_eq!(cli.interval_ms, Some(10));
        assert!(cli.quiet);
        assert_eq!(cli.log_level, LogLevel::Warn);
    }

    #[test]
    fn test_example_and_file_conflict() {
        let result = Cli::try_parse_from(["quill", "--example", "legal", "--file", "t.txt"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_example_value() {
        let cli = Cli::try_parse_from(["quill", "-e", "medical"]).unwrap();
        assert_eq!(cli.example, Some(Sample::Medical));
    }

    #[test]
    fn test_log_level_precedence() {
        let cli = Cli::try_parse_from(["quill", "--log-level", "error"]).unwrap();
        assert_eq!(cli.effective_log_level(None), LogLevel::Error);
        assert_eq!(cli.effective_log_level(Some("INFO")), LogLevel::Info);
        assert_eq!(cli.effective_log_level(Some("nonsense")), LogLevel::Error);

        let cli = Cli::try_parse_from(["quill", "-v"]).unwrap();
        assert_eq!(cli.effective_log_level(Some("error")), LogLevel::Debug);
    }

    #[test]
    fn test_from_str_loose() {
        assert_eq!(LogLevel::from_str_loose("Warning"), Some(LogLevel::Warn));
        assert_eq!(LogLevel::from_str_loose("loud"), None);
        assert_eq!(LogLevel::Trace.as_filter_str(), "trace");
    }
}
