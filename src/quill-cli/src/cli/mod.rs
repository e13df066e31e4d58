//! CLI parsing and the conversion command.

pub mod args;

pub use args::{Cli, LogLevel};

use std::io::{IsTerminal, Read};
use std::path::Path;
use std::process::ExitCode;

use anyhow::{Context, Result, bail};
use quill_engine::{ConversionRequest, ConversionSession, Converter, EngineConfig, SessionState};
use tracing::{debug, info, warn};

use crate::output::Renderer;

/// Exit status for a cancelled conversion (128 + SIGINT).
const EXIT_CANCELLED: u8 = 130;

/// Run one conversion as described by the command line.
pub async fn run(cli: Cli) -> Result<ExitCode> {
    let config = build_config(&cli)?;
    let text = read_input(&cli)?;

    let mut request = ConversionRequest::new(text);
    if let Some(path) = &cli.rule_config {
        request = request.with_rule_config(read_rule_config(path)?);
    }

    let mut converter = Converter::from_config(config).context("Failed to create HTTP client")?;
    info!(endpoint = %converter.config().endpoint, "Starting conversion");
    let mut updates = converter.start(request).await?;

    if let Some(token) = converter.cancellation_token() {
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                debug!("Interrupt received");
                token.cancel();
            }
        });
    }

    let mut renderer = Renderer::stdio(!cli.json, !cli.quiet);
    while updates.changed().await.is_ok() {
        let snapshot = updates.borrow_and_update().clone();
        renderer.update(&snapshot)?;
        if snapshot.is_settled() {
            break;
        }
    }

    let session = match converter.wait().await {
        Some(session) => session,
        None => updates.borrow().clone(),
    };
    renderer.finish(&session)?;

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&session)?);
    }
    if let Some(path) = &cli.output {
        save_output(path, &session)?;
    }

    Ok(exit_code(&session))
}

/// Load the config file and apply command-line overrides.
pub fn build_config(cli: &Cli) -> Result<EngineConfig> {
    let mut config =
        EngineConfig::load(cli.config.as_deref()).context("Failed to load configuration")?;

    if let Some(endpoint) = &cli.endpoint {
        config.endpoint = endpoint.clone();
    }
    if let Some(ms) = cli.interval_ms {
        config.render_interval_ms = ms;
    }
    if let Some(secs) = cli.idle_timeout {
        config.idle_timeout_secs = secs;
    }
    if cli.no_typewriter {
        config.typewriter = false;
    }

    config.validate()?;
    Ok(config)
}

/// Transcript from arguments, `--file`, `--example`, or stdin.
pub fn read_input(cli: &Cli) -> Result<String> {
    if !cli.text.is_empty() {
        return Ok(cli.text.join(" "));
    }
    if let Some(path) = &cli.file {
        return std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()));
    }
    if let Some(sample) = cli.example {
        debug!(sample = sample.title(), "Using sample transcript");
        return Ok(sample.text().to_string());
    }

    let stdin = std::io::stdin();
    if stdin.is_terminal() {
        bail!("No transcript given. Pass text, --file <PATH>, --example <NAME>, or pipe it on stdin.");
    }
    let mut text = String::new();
    stdin
        .lock()
        .read_to_string(&mut text)
        .context("Failed to read stdin")?;
    Ok(text)
}

fn read_rule_config(path: &Path) -> Result<serde_json::Value> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let value: serde_json::Value = serde_json::from_str(&raw)
        .with_context(|| format!("{} is not valid JSON", path.display()))?;
    if !value.is_object() {
        bail!("{} must contain a JSON object", path.display());
    }
    Ok(value)
}

/// Write the final text. Only a completed conversion is saved.
pub fn save_output(path: &Path, session: &ConversionSession) -> Result<()> {
    if session.state != SessionState::Completed {
        warn!(state = %session.state, "Not saving output of an unfinished conversion");
        return Ok(());
    }
    std::fs::write(path, &session.final_content)
        .with_context(|| format!("Failed to write {}", path.display()))?;
    info!(path = %path.display(), "Saved converted text");
    Ok(())
}

pub fn exit_code(session: &ConversionSession) -> ExitCode {
    match session.state {
        SessionState::Completed => ExitCode::SUCCESS,
        SessionState::Cancelled => ExitCode::from(EXIT_CANCELLED),
        _ => ExitCode::FAILURE,
    }
}

#[cfg(test)]
mod tests {
    use clap::Parser;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("quill").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn test_text_arguments_are_joined() {
        let cli = parse(&["A:", "hi"]);
        assert_eq!(read_input(&cli).unwrap(), "A: hi");
    }

    #[test]
    fn test_file_input() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("transcript.txt");
        std::fs::write(&path, "Q: ok?\nA: fine").unwrap();

        let cli = parse(&["--file", path.to_str().unwrap()]);
        assert_eq!(read_input(&cli).unwrap(), "Q: ok?\nA: fine");
    }

    #[test]
    fn test_sample_input() {
        let cli = parse(&["--example", "interview"]);
        assert!(read_input(&cli).unwrap().starts_with("面试官"));
    }

    #[test]
    fn test_cli_overrides_config_file() {
        let dir = TempDir::new().unwrap();
        let config_path = dir.path().join("config.toml");
        std::fs::write(&config_path, "render_interval_ms = 50\nidle_timeout_secs = 30\n").unwrap();

        let cli = parse(&[
            "--config",
            config_path.to_str().unwrap(),
            "--endpoint",
            "http://127.0.0.1:9000/stream",
            "--idle-timeout",
            "5",
            "--no-typewriter",
            "text",
        ]);
        let config = build_config(&cli).unwrap();
        assert_eq!(config.endpoint, "http://127.0.0.1:9000/stream");
        assert_eq!(config.render_interval_ms, 50);
        assert_eq!(config.idle_timeout_secs, 5);
        assert!(!config.typewriter);
    }

    #[test]
    fn test_zero_interval_is_rejected() {
        let dir = TempDir::new().unwrap();
        let cli = parse(&[
            "--config",
            dir.path().join("missing.toml").to_str().unwrap(),
            "--interval-ms",
            "0",
            "text",
        ]);
        assert!(build_config(&cli).is_err());
    }

    #[test]
    fn test_rule_config_must_be_object() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("rules.json");
        std::fs::write(&path, "[1, 2]").unwrap();
        assert!(read_rule_config(&path).is_err());

        std::fs::write(&path, r#"{"tone": "formal"}"#).unwrap();
        assert_eq!(read_rule_config(&path).unwrap()["tone"], "formal");
    }

    #[test]
    fn test_save_output_only_when_completed() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("out.txt");

        let failed = ConversionSession {
            state: SessionState::Failed,
            final_content: "partial".to_string(),
            ..Default::default()
        };
        save_output(&path, &failed).unwrap();
        assert!(!path.exists());

        let done = ConversionSession {
            state: SessionState::Completed,
            final_content: "Final text.".to_string(),
            ..Default::default()
        };
        save_output(&path, &done).unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "Final text.");
    }

    #[test]
    fn test_exit_codes() {
        let code = |state| {
            format!(
                "{:?}",
                exit_code(&ConversionSession {
                    state,
                    ..Default::default()
                })
            )
        };
        assert_eq!(code(SessionState::Completed), format!("{:?}", ExitCode::SUCCESS));
        assert_eq!(code(SessionState::Failed), format!("{:?}", ExitCode::FAILURE));
        assert_eq!(code(SessionState::Cancelled), format!("{:?}", ExitCode::from(130)));
    }
}
