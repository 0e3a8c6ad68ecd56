// src/console.rs
//! Interactive terminal front end: the sidebar buttons and settings panel
//! rendered as a line-oriented prompt.

use crate::model::SessionState;
use crate::orchestrator::{format_duration, SessionOrchestrator};
use crate::ui::{MessageSink, Notice, NoticeLevel, Notifier, PanelMessage};
use chrono::Local;
use std::collections::HashMap;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};

pub const HELP: &str = "\
Commands:
  start [title] [--project NAME]   start a session (title defaults to the current time)
  end [title]                      end the session, optionally renaming it
  status                           show the current session
  settings                         list selectable properties and the current selection
  save --time NAME [--project NAME]  select the date and project properties
  clear                            forget the selected properties
  projects                         refresh and list projects
  help                             show this help
  quit                             leave (ends a running session first)";

/// One line typed at the console.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConsoleCommand {
    Start {
        title: Option<String>,
        project: Option<String>,
    },
    End {
        title: Option<String>,
    },
    Status,
    Settings,
    Save {
        time_property: Option<String>,
        project_property: Option<String>,
    },
    Clear,
    Projects,
    Help,
    Quit,
}

impl ConsoleCommand {
    /// Parses a console line. Empty lines are `Ok(None)`.
    pub fn parse(line: &str) -> Result<Option<Self>, String> {
        let mut words = line.split_whitespace();
        let Some(verb) = words.next() else {
            return Ok(None);
        };
        let args = Arguments::parse(words)?;

        let command = match verb.to_ascii_lowercase().as_str() {
            "start" => {
                args.only_flags(&["project"])?;
                Self::Start {
                    title: args.positional.clone(),
                    project: args.flag("project"),
                }
            }
            "end" | "stop" => {
                args.only_flags(&[])?;
                Self::End {
                    title: args.positional.clone(),
                }
            }
            "save" => {
                args.only_flags(&["time", "project"])?;
                if args.positional.is_some() {
                    return Err("usage: save --time NAME [--project NAME]".to_string());
                }
                Self::Save {
                    time_property: args.flag("time"),
                    project_property: args.flag("project"),
                }
            }
            "status" => Self::Status,
            "settings" => Self::Settings,
            "clear" => Self::Clear,
            "projects" => Self::Projects,
            "help" | "?" => Self::Help,
            "quit" | "exit" => Self::Quit,
            other => return Err(format!("unknown command '{}' (try 'help')", other)),
        };
        Ok(Some(command))
    }
}

/// Words before the first `--flag`, and the words following each flag.
struct Arguments {
    positional: Option<String>,
    flags: HashMap<String, String>,
}

impl Arguments {
    fn parse<'a>(words: impl Iterator<Item = &'a str>) -> Result<Self, String> {
        let mut positional = Vec::new();
        let mut flags: HashMap<String, Vec<&str>> = HashMap::new();
        let mut current: Option<String> = None;

        for word in words {
            if let Some(name) = word.strip_prefix("--") {
                if name.is_empty() {
                    return Err("empty flag '--'".to_string());
                }
                flags.entry(name.to_string()).or_default();
                current = Some(name.to_string());
            } else if let Some(name) = &current {
                flags.entry(name.clone()).or_default().push(word);
            } else {
                positional.push(word);
            }
        }

        let mut joined = HashMap::new();
        for (name, values) in flags {
            if values.is_empty() {
                return Err(format!("--{} needs a value", name));
            }
            joined.insert(name, values.join(" "));
        }

        Ok(Self {
            positional: (!positional.is_empty()).then(|| positional.join(" ")),
            flags: joined,
        })
    }

    fn flag(&self, name: &str) -> Option<String> {
        self.flags.get(name).cloned()
    }

    fn only_flags(&self, allowed: &[&str]) -> Result<(), String> {
        match self.flags.keys().find(|name| !allowed.contains(&name.as_str())) {
            Some(name) => Err(format!("unknown flag --{}", name)),
            None => Ok(()),
        }
    }
}

/// Prints notices: info to stdout, warnings and errors to stderr.
pub struct ConsoleNotifier;

impl Notifier for ConsoleNotifier {
    fn notify(&self, notice: Notice) {
        match notice.level {
            NoticeLevel::Info => println!("{}", notice),
            NoticeLevel::Warning | NoticeLevel::Error => eprintln!("{}", notice),
        }
    }
}

/// Renders panel messages as plain text.
pub struct ConsolePanel;

impl MessageSink for ConsolePanel {
    fn deliver(&mut self, message: &PanelMessage) {
        for line in render_panel_message(message) {
            println!("{}", line);
        }
    }
}

/// Text form of a panel message.
pub fn render_panel_message(message: &PanelMessage) -> Vec<String> {
    match message {
        PanelMessage::UpdatePropertySettings {
            properties,
            selected_project_property,
            selected_time_property,
        } => {
            let mut lines = vec!["Properties:".to_string()];
            for (name, kind) in properties {
                let marker = if Some(name) == selected_time_property.as_ref() {
                    " (time)"
                } else if Some(name) == selected_project_property.as_ref() {
                    " (project)"
                } else {
                    ""
                };
                lines.push(format!("  {:<24} {}{}", name, kind, marker));
            }
            lines
        }
        PanelMessage::UpdateProjects {
            projects,
            workspace_name,
        } => {
            if projects.is_empty() {
                return vec!["No projects available".to_string()];
            }
            let mut lines = vec![format!("Projects ({}):", projects.len())];
            for name in projects.names() {
                let marker = if Some(name) == workspace_name.as_deref() {
                    " (default)"
                } else {
                    ""
                };
                lines.push(format!("  {}{}", name, marker));
            }
            lines
        }
        PanelMessage::UpdatePlaceholder { title } if title.is_empty() => Vec::new(),
        PanelMessage::UpdatePlaceholder { title } => vec![format!("Tracking: {}", title)],
    }
}

/// Reads commands until `quit`, end of input, or Ctrl-C.
pub async fn run_console<R>(orchestrator: &mut SessionOrchestrator, input: R) -> anyhow::Result<()>
where
    R: AsyncBufRead + Unpin,
{
    if orchestrator.config().auto_start {
        log::info!("Auto-start enabled");
        let _ = orchestrator.start_session(None, None).await;
    }

    let mut lines = input.lines();
    loop {
        let line = tokio::select! {
            line = lines.next_line() => line?,
            _ = tokio::signal::ctrl_c() => {
                println!();
                None
            }
        };
        let Some(line) = line else {
            break;
        };

        let command = match ConsoleCommand::parse(&line) {
            Ok(Some(command)) => command,
            Ok(None) => continue,
            Err(message) => {
                eprintln!("{}", message);
                continue;
            }
        };

        if command == ConsoleCommand::Quit {
            break;
        }
        dispatch(orchestrator, command).await;
    }

    if orchestrator.state() == SessionState::Active {
        let _ = orchestrator.end_session(None).await;
    }
    Ok(())
}

/// Runs one console command. Failures are already reported as notices.
pub async fn dispatch(orchestrator: &mut SessionOrchestrator, command: ConsoleCommand) {
    match command {
        ConsoleCommand::Start { title, project } => {
            let _ = orchestrator
                .start_session(title.as_deref(), project.as_deref())
                .await;
        }
        ConsoleCommand::End { title } => {
            let _ = orchestrator.end_session(title.as_deref()).await;
        }
        ConsoleCommand::Status => {
            for line in status_lines(orchestrator) {
                println!("{}", line);
            }
        }
        ConsoleCommand::Settings => {
            let _ = orchestrator.open_settings_panel().await;
        }
        ConsoleCommand::Save {
            time_property,
            project_property,
        } => {
            let _ = orchestrator
                .save_settings(project_property.as_deref(), time_property.as_deref())
                .await;
        }
        ConsoleCommand::Clear => {
            let _ = orchestrator.clear_settings().await;
        }
        ConsoleCommand::Projects => {
            let _ = orchestrator.refresh_projects().await;
        }
        ConsoleCommand::Help => println!("{}", HELP),
        ConsoleCommand::Quit => {}
    }
}

/// Summary printed by `status`.
pub fn status_lines(orchestrator: &SessionOrchestrator) -> Vec<String> {
    let session = orchestrator.session();
    let settings = orchestrator.settings();
    let mut lines = vec![format!("Session: {}", orchestrator.state())];

    if let Some(title) = &session.title {
        lines.push(format!("  title:   {}", title));
    }
    if let Some(project) = &session.project {
        lines.push(format!("  project: {}", project));
    }
    if let Some(elapsed) = session.elapsed(Local::now()) {
        lines.push(format!("  elapsed: {}", format_duration(elapsed)));
    }
    lines.push(format!(
        "Time property:    {}",
        settings.time_property_name.as_deref().unwrap_or("(not set)")
    ));
    lines.push(format!(
        "Project property: {}",
        settings.project_property_name.as_deref().unwrap_or("(not set)")
    ));
    lines
}
