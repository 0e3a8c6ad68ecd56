// src/main.rs

use clap::Parser;
use codetrack::console::{self, ConsoleNotifier, ConsolePanel};
use codetrack::constants::LOG_FILE_NAME;
use codetrack::{
    CliCommand, CommandLineInput, FileSettingsStore, NotionHttpClient, PendingQueue,
    SessionOrchestrator, SettingsAction, TrackerConfig,
};
use log::LevelFilter;
use log4rs::{
    append::console::{ConsoleAppender, Target},
    append::file::FileAppender,
    config::{Appender, Root},
    encode::pattern::PatternEncoder,
    filter::threshold::ThresholdFilter,
    Config,
};
use std::fs;
use std::sync::Arc;

/// Sets up logging configuration.
fn setup_logging(verbose: bool) -> anyhow::Result<()> {
    let log_level = if verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Warn
    };

    let log_file_path = std::env::temp_dir().join(LOG_FILE_NAME);
    if let Some(parent) = log_file_path.parent() {
        fs::create_dir_all(parent)?;
    }

    let pattern = if verbose {
        "{d(%Y-%m-%d %H:%M:%S)} [{l}] - {m}{n}"
    } else {
        "[CodeTrack] {m}{n}"
    };

    // Console output shares the terminal with the prompt, so logs go to stderr.
    let stderr_appender = ConsoleAppender::builder()
        .target(Target::Stderr)
        .encoder(Box::new(PatternEncoder::new(pattern)))
        .build();

    let file_appender = FileAppender::builder()
        .encoder(Box::new(PatternEncoder::new(
            "{d(%Y-%m-%d %H:%M:%S)} [{l}] - {m}{n}",
        )))
        .build(&log_file_path)?;

    let config = Config::builder()
        .appender(
            Appender::builder()
                .filter(Box::new(ThresholdFilter::new(log_level)))
                .build("stderr", Box::new(stderr_appender)),
        )
        .appender(Appender::builder().build("file", Box::new(file_appender)))
        .build(
            Root::builder()
                .appender("stderr")
                .appender("file")
                .build(LevelFilter::Debug),
        )?;

    log4rs::init_config(config)?;
    log::info!("Logging initialized. Log file: {}", log_file_path.display());
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = CommandLineInput::parse();

    setup_logging(cli.verbose)?;

    let config = TrackerConfig::resolve(&cli);
    let state_path = cli
        .state_file
        .clone()
        .unwrap_or_else(FileSettingsStore::default_path);
    log::debug!("Settings file: {}", state_path.display());

    let panel = PendingQueue::new(Box::new(ConsolePanel));
    let mut orchestrator = SessionOrchestrator::new(
        Arc::new(NotionHttpClient::new()?),
        Arc::new(FileSettingsStore::new(state_path)),
        Arc::new(ConsoleNotifier),
        panel.clone(),
        config,
    )
    .await;

    let command = cli.command.clone().unwrap_or(CliCommand::Console);
    let succeeded = match command {
        CliCommand::Console => {
            println!("codetrack - type 'help' for commands");
            panel.mark_ready();
            let stdin = tokio::io::BufReader::new(tokio::io::stdin());
            console::run_console(&mut orchestrator, stdin).await?;
            true
        }
        CliCommand::Properties => {
            panel.mark_ready();
            orchestrator.open_settings_panel().await.is_ok()
        }
        CliCommand::Projects => {
            panel.mark_ready();
            orchestrator.refresh_projects().await.is_ok()
        }
        CliCommand::Settings { action } => {
            panel.mark_ready();
            match action {
                SettingsAction::Show => {
                    for line in console::status_lines(&orchestrator).into_iter().skip(1) {
                        println!("{}", line);
                    }
                    true
                }
                SettingsAction::Save {
                    time_property,
                    project_property,
                } => orchestrator
                    .save_settings(project_property.as_deref(), Some(time_property.as_str()))
                    .await
                    .is_ok(),
                SettingsAction::Clear => orchestrator.clear_settings().await.is_ok(),
            }
        }
    };

    if !succeeded {
        std::process::exit(1);
    }
    Ok(())
}
