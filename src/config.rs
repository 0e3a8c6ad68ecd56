// src/config.rs
use crate::error::SessionError;
use crate::types::{ApiKey, NotionId};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

const SECRET_ENV: &str = "NOTION_API_KEY";
const DATABASE_ENV: &str = "CODETRACK_DATABASE_URL";
const AUTO_START_ENV: &str = "CODETRACK_AUTO_START";

/// Parsed command-line input.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct CommandLineInput {
    #[command(subcommand)]
    pub command: Option<CliCommand>,

    /// Notion integration secret (falls back to $NOTION_API_KEY)
    #[arg(long, global = true)]
    pub notion_secret: Option<String>,

    /// URL or ID of the database sessions are recorded in (falls back to $CODETRACK_DATABASE_URL)
    #[arg(long = "database", global = true)]
    pub tracking_database_url: Option<String>,

    /// Start a session as soon as the console opens
    #[arg(long, global = true, default_value_t = false)]
    pub auto_start: bool,

    /// Enable verbose logging (debug level)
    #[arg(short, long, global = true, default_value_t = false)]
    pub verbose: bool,

    /// File holding the selected property names (defaults to the user config dir)
    #[arg(long, global = true)]
    pub state_file: Option<PathBuf>,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum CliCommand {
    /// Interactive console: start and end sessions (default)
    Console,
    /// List the database properties that can be selected in the settings
    Properties,
    /// List the projects available through the project property
    Projects,
    /// Show, save, or clear the selected property names
    Settings {
        #[command(subcommand)]
        action: SettingsAction,
    },
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum SettingsAction {
    Show,
    Save {
        /// Date property that receives the session start and end
        #[arg(long)]
        time_property: String,
        /// Relation property that links the session to a project
        #[arg(long)]
        project_property: Option<String>,
    },
    Clear,
}

/// External configuration. Read-only to the orchestrator.
///
/// Values are kept raw: a missing or malformed secret or URL is reported by
/// each session operation, not at startup.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TrackerConfig {
    pub notion_secret: String,
    pub tracking_database_url: String,
    pub auto_start: bool,
    /// Name of the directory being worked in; the default project.
    pub workspace_name: Option<String>,
}

/// Validated credentials for one operation.
#[derive(Debug, Clone)]
pub struct Credentials {
    pub api_key: ApiKey,
    pub database_id: NotionId,
}

impl TrackerConfig {
    /// Resolves configuration from CLI flags, then the environment.
    pub fn resolve(cli: &CommandLineInput) -> Self {
        let notion_secret = cli
            .notion_secret
            .clone()
            .or_else(|| std::env::var(SECRET_ENV).ok())
            .unwrap_or_default();

        let tracking_database_url = cli
            .tracking_database_url
            .clone()
            .or_else(|| std::env::var(DATABASE_ENV).ok())
            .unwrap_or_default();

        let auto_start = cli.auto_start
            || std::env::var(AUTO_START_ENV)
                .map(|value| matches!(value.trim(), "1" | "true" | "yes"))
                .unwrap_or(false);

        let workspace_name = std::env::current_dir()
            .ok()
            .and_then(|dir| dir.file_name().map(|name| name.to_string_lossy().into_owned()));

        Self {
            notion_secret,
            tracking_database_url,
            auto_start,
            workspace_name,
        }
    }

    /// Validates the secret and database URL.
    pub fn credentials(&self) -> Result<Credentials, SessionError> {
        if self.notion_secret.trim().is_empty() {
            return Err(SessionError::Configuration(format!(
                "Notion secret is not set (use --notion-secret or ${})",
                SECRET_ENV
            )));
        }
        if self.tracking_database_url.trim().is_empty() {
            return Err(SessionError::Configuration(format!(
                "tracking database is not set (use --database or ${})",
                DATABASE_ENV
            )));
        }

        Ok(Credentials {
            api_key: ApiKey::new(self.notion_secret.as_str())?,
            database_id: NotionId::parse(&self.tracking_database_url)?,
        })
    }
}
