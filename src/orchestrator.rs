// src/orchestrator.rs
//! Session lifecycle: the only place session state and settings change.
//!
//! ```text
//! Idle ──start──▶ Starting ──page configured──▶ Active ──end──▶ Ending ──patched──▶ Idle
//!                    │                                             │
//!                    └─ any failure after create: trash page, Idle └─ failure: back to Active
//! ```
//!
//! Every mutator takes `&mut self` and awaits its network calls in sequence,
//! so a state check and the transition that follows it can never interleave
//! with another operation.

use crate::api::NotionGateway;
use crate::config::{Credentials, TrackerConfig};
use crate::constants::{STATUS_DONE, STATUS_IN_PROGRESS, STATUS_PROPERTY};
use crate::error::SessionError;
use crate::model::{
    filter_database_properties, filter_projects, find_title_key, DatabaseSchema, ProjectIndex,
    PropertyKind, PropertyPatch, Session, SessionState,
};
use crate::settings::{Settings, SettingsStore};
use crate::types::{NotionId, PageId, SessionTitle};
use crate::ui::{Notice, Notifier, PanelMessage, PendingQueue};
use chrono::Local;
use indexmap::IndexMap;
use std::sync::Arc;

/// Owns the session, the settings, and every collaborator they talk to.
pub struct SessionOrchestrator {
    gateway: Arc<dyn NotionGateway>,
    store: Arc<dyn SettingsStore>,
    notifier: Arc<dyn Notifier>,
    panel: PendingQueue,
    config: TrackerConfig,
    settings: Settings,
    session: Session,
    state: SessionState,
    projects: ProjectIndex,
}

impl SessionOrchestrator {
    /// Builds the orchestrator and loads the persisted settings.
    pub async fn new(
        gateway: Arc<dyn NotionGateway>,
        store: Arc<dyn SettingsStore>,
        notifier: Arc<dyn Notifier>,
        panel: PendingQueue,
        config: TrackerConfig,
    ) -> Self {
        let settings = store.load().await;
        log::debug!("Loaded settings: {:?}", settings);
        Self {
            gateway,
            store,
            notifier,
            panel,
            config,
            settings,
            session: Session::default(),
            state: SessionState::Idle,
            projects: ProjectIndex::default(),
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn projects(&self) -> &ProjectIndex {
        &self.projects
    }

    pub fn config(&self) -> &TrackerConfig {
        &self.config
    }

    /// Replaces the external configuration. An in-flight session is kept.
    pub fn reload_config(&mut self, config: TrackerConfig) {
        log::info!("Configuration reloaded");
        self.config = config;
    }

    // -----------------------------------------------------------------------
    // Session lifecycle
    // -----------------------------------------------------------------------

    /// Starts a session: creates the page, then fills in its properties.
    ///
    /// If anything fails once the page exists, the page is moved to the trash
    /// and the session stays `Idle`.
    pub async fn start_session(
        &mut self,
        title: Option<&str>,
        project: Option<&str>,
    ) -> Result<PageId, SessionError> {
        let result = self.try_start(title, project).await;
        self.surface(result, |_| "Started tracking your coding session".to_string())
    }

    async fn try_start(
        &mut self,
        title: Option<&str>,
        project: Option<&str>,
    ) -> Result<PageId, SessionError> {
        let creds = self.config.credentials()?;

        if self.state != SessionState::Idle {
            return Err(SessionError::AlreadyActive);
        }

        let time_key = self.settings.time_property_name.clone().ok_or_else(|| {
            SessionError::Configuration(
                "no time property selected; save settings first".to_string(),
            )
        })?;

        let title = match non_blank(title) {
            Some(title) => SessionTitle::new(title)?,
            None => SessionTitle::default_for(Local::now()),
        };

        let project = self.requested_project(project)?;

        self.state = SessionState::Starting;
        log::info!("Starting session '{}'", title);

        let page_id = match self
            .gateway
            .create_page(&creds.api_key, &creds.database_id, &title)
            .await
        {
            Ok(page_id) => page_id,
            Err(err) => {
                self.state = SessionState::Idle;
                return Err(SessionError::request_failed("create the session page", err));
            }
        };

        let started = Local::now();
        match self
            .configure_started_page(&creds, &page_id, &time_key, project.as_deref(), started)
            .await
        {
            Ok(session) => {
                self.session = Session {
                    title: Some(title.clone()),
                    ..session
                };
                self.state = SessionState::Active;
                self.panel.post(PanelMessage::UpdatePlaceholder {
                    title: title.as_str().to_string(),
                });
                Ok(page_id)
            }
            Err(err) => {
                self.roll_back(&creds, &page_id).await;
                self.session.reset();
                self.state = SessionState::Idle;
                Err(err)
            }
        }
    }

    /// Explicit project, else the workspace name when it names a known project.
    fn requested_project(&self, project: Option<&str>) -> Result<Option<String>, SessionError> {
        let project = non_blank(project).map(str::to_string).or_else(|| {
            self.config
                .workspace_name
                .as_deref()
                .filter(|name| self.projects.contains(name))
                .map(str::to_string)
        });

        if project.is_some() && self.settings.project_property_name.is_none() {
            return Err(SessionError::Configuration(
                "a project was given but no project property is selected".to_string(),
            ));
        }
        Ok(project)
    }

    /// Schema → project list → property patch for a freshly created page.
    async fn configure_started_page(
        &mut self,
        creds: &Credentials,
        page_id: &PageId,
        time_key: &str,
        project: Option<&str>,
        started: chrono::DateTime<Local>,
    ) -> Result<Session, SessionError> {
        let schema = self
            .gateway
            .retrieve_database(&creds.api_key, &creds.database_id)
            .await
            .map_err(|err| SessionError::request_failed("read the database schema", err))?;

        match schema.get(time_key).map(|property| &property.kind) {
            Some(PropertyKind::Date) => {}
            Some(other) => {
                return Err(SessionError::Configuration(format!(
                    "time property '{}' is a {} property, not a date",
                    time_key, other
                )))
            }
            None => {
                return Err(SessionError::Configuration(format!(
                    "time property '{}' does not exist in the tracking database",
                    time_key
                )))
            }
        }

        let status_field = schema.status_field(STATUS_PROPERTY);
        let mut patch = PropertyPatch::new()
            .dates(time_key, Some(started), None)?
            .status(status_field.as_ref(), STATUS_IN_PROGRESS);

        let mut linked_project = None;
        if let (Some(project), Some(project_key)) =
            (project, self.settings.project_property_name.clone())
        {
            let index_built = match self.load_projects(creds, &schema, &project_key).await {
                Ok(index) => {
                    self.projects = index;
                    true
                }
                Err(err) => {
                    log::warn!("{}", err);
                    self.notifier.notify(Notice::warning(err.to_string()));
                    self.projects = ProjectIndex::default();
                    false
                }
            };
            match self.projects.get(project) {
                Some(project_id) => {
                    patch = patch.relation(&project_key, project_id);
                    linked_project = Some(project.to_string());
                }
                // Already reported: the index itself could not be built.
                None if !index_built => {}
                None => {
                    log::warn!("Project '{}' not found, session is not linked", project);
                    self.notifier.notify(Notice::warning(format!(
                        "Project '{}' not found; the session is not linked to a project",
                        project
                    )));
                }
            }
        }

        self.gateway
            .update_page(&creds.api_key, page_id, patch)
            .await
            .map_err(|err| SessionError::request_failed("set the session properties", err))?;

        Ok(Session {
            title: None,
            project: linked_project,
            start_time: Some(started),
            end_time: None,
            remote_page_id: Some(page_id.clone()),
            title_key: find_title_key(&schema),
            date_key: time_key.to_string(),
            status_field,
        })
    }

    /// Moves a half-configured page to the trash. Called once per failed start.
    async fn roll_back(&self, creds: &Credentials, page_id: &PageId) {
        match self.gateway.trash_page(&creds.api_key, page_id).await {
            Ok(()) => log::info!("Rolled back session page {}", page_id),
            Err(err) => log::error!("Could not trash session page {}: {}", page_id, err),
        }
    }

    /// Ends the session: writes the end time and status, optionally renames.
    ///
    /// A failed patch leaves the session `Active` and the remote page as it
    /// was; nothing is rolled back.
    pub async fn end_session(&mut self, title: Option<&str>) -> Result<chrono::Duration, SessionError> {
        let result = self.try_end(title).await;
        self.surface(result, |elapsed| {
            format!(
                "Ended tracking your coding session ({})",
                format_duration(*elapsed)
            )
        })
    }

    async fn try_end(&mut self, title: Option<&str>) -> Result<chrono::Duration, SessionError> {
        let creds = self.config.credentials()?;

        if self.state != SessionState::Active {
            return Err(SessionError::NotActive);
        }
        let page_id = self
            .session
            .remote_page_id
            .clone()
            .ok_or(SessionError::NotActive)?;

        let ended = Local::now();
        let mut patch = PropertyPatch::new()
            .dates(&self.session.date_key, self.session.start_time, Some(ended))?
            .status(self.session.status_field.as_ref(), STATUS_DONE);
        if let Some(title) = non_blank(title) {
            patch = patch.title(&self.session.title_key, &SessionTitle::new(title)?);
        }

        self.state = SessionState::Ending;
        if let Err(err) = self
            .gateway
            .update_page(&creds.api_key, &page_id, patch)
            .await
        {
            self.state = SessionState::Active;
            return Err(SessionError::request_failed("update the session page", err));
        }

        self.session.end_time = Some(ended);
        let elapsed = self
            .session
            .elapsed(ended)
            .unwrap_or_else(chrono::Duration::zero);
        log::info!("Session page {} closed after {}", page_id, format_duration(elapsed));

        self.session.reset();
        self.state = SessionState::Idle;
        self.panel.post(PanelMessage::UpdatePlaceholder {
            title: String::new(),
        });
        Ok(elapsed)
    }

    // -----------------------------------------------------------------------
    // Settings panel
    // -----------------------------------------------------------------------

    /// Sends the selectable properties and the current selection to the panel,
    /// then refreshes the project list.
    pub async fn open_settings_panel(
        &mut self,
    ) -> Result<IndexMap<String, PropertyKind>, SessionError> {
        let result = self.try_open_settings_panel().await;
        self.surface(result, |properties| {
            format!("Loaded {} selectable properties", properties.len())
        })
    }

    async fn try_open_settings_panel(
        &mut self,
    ) -> Result<IndexMap<String, PropertyKind>, SessionError> {
        let creds = self.config.credentials()?;
        let schema = self.fetch_schema(&creds).await?;

        let properties = filter_database_properties(&schema);
        log::debug!("Sending property settings: {:?}", properties);
        self.panel.post(PanelMessage::UpdatePropertySettings {
            properties: properties.clone(),
            selected_project_property: self.settings.project_property_name.clone(),
            selected_time_property: self.settings.time_property_name.clone(),
        });

        if let Err(err) = self.rebuild_projects(&creds, &schema).await {
            self.notifier.notify(Notice::warning(err.to_string()));
        }
        Ok(properties)
    }

    /// Persists the selection, reloads it, and refreshes the project list.
    pub async fn save_settings(
        &mut self,
        project_property: Option<&str>,
        time_property: Option<&str>,
    ) -> Result<Settings, SessionError> {
        let result = self.try_save_settings(project_property, time_property).await;
        self.surface(result, |_| "Settings saved".to_string())
    }

    async fn try_save_settings(
        &mut self,
        project_property: Option<&str>,
        time_property: Option<&str>,
    ) -> Result<Settings, SessionError> {
        let settings = Settings::new(project_property, time_property);
        self.store
            .save(&settings)
            .await
            .map_err(SessionError::Storage)?;
        self.settings = self.store.load().await;
        log::info!("Settings saved: {:?}", self.settings);

        // Without credentials there is nothing to refresh yet.
        if let Ok(creds) = self.config.credentials() {
            let refreshed = match self.fetch_schema(&creds).await {
                Ok(schema) => self.rebuild_projects(&creds, &schema).await,
                Err(err) => Err(err),
            };
            if let Err(err) = refreshed {
                self.notifier.notify(Notice::warning(err.to_string()));
            }
        }
        Ok(self.settings.clone())
    }

    /// Forgets both selected property names.
    pub async fn clear_settings(&mut self) -> Result<(), SessionError> {
        let result = self
            .store
            .clear()
            .await
            .map_err(SessionError::Storage)
            .map(|()| {
                self.settings = Settings::default();
                self.projects = ProjectIndex::default();
            });
        self.surface(result, |_| "Settings cleared".to_string())
    }

    /// Rebuilds the project index and sends it to the view.
    pub async fn refresh_projects(&mut self) -> Result<&ProjectIndex, SessionError> {
        let result = match self.config.credentials() {
            Ok(creds) => match self.fetch_schema(&creds).await {
                Ok(schema) => self.rebuild_projects(&creds, &schema).await,
                Err(err) => Err(err),
            },
            Err(err) => Err(err),
        };
        self.surface(result, |_| "Project list refreshed".to_string())?;
        Ok(&self.projects)
    }

    async fn fetch_schema(&self, creds: &Credentials) -> Result<DatabaseSchema, SessionError> {
        self.gateway
            .retrieve_database(&creds.api_key, &creds.database_id)
            .await
            .map_err(|err| SessionError::request_failed("read the database schema", err))
    }

    /// Replaces the project index; an unresolvable relation leaves it empty.
    async fn rebuild_projects(
        &mut self,
        creds: &Credentials,
        schema: &DatabaseSchema,
    ) -> Result<(), SessionError> {
        let result = match self.settings.project_property_name.clone() {
            Some(project_key) => self.load_projects(creds, schema, &project_key).await,
            None => Ok(ProjectIndex::default()),
        };
        let (index, outcome) = match result {
            Ok(index) => (index, Ok(())),
            Err(err) => (ProjectIndex::default(), Err(err)),
        };
        log::info!("Project index holds {} projects", index.len());
        self.projects = index;
        self.panel.post(PanelMessage::UpdateProjects {
            projects: self.projects.clone(),
            workspace_name: self.config.workspace_name.clone(),
        });
        outcome
    }

    async fn load_projects(
        &self,
        creds: &Credentials,
        schema: &DatabaseSchema,
        project_key: &str,
    ) -> Result<ProjectIndex, SessionError> {
        let target = schema
            .relation_target(project_key)
            .and_then(|id| NotionId::parse(id).ok())
            .ok_or_else(|| SessionError::AmbiguousConfig(project_key.to_string()))?;
        let pages = self.gateway.query_database(&creds.api_key, &target).await;
        Ok(filter_projects(&pages))
    }

    /// Reports the outcome of a user-facing operation as a notice.
    fn surface<T>(
        &self,
        result: Result<T, SessionError>,
        success: impl FnOnce(&T) -> String,
    ) -> Result<T, SessionError> {
        match &result {
            Ok(value) => self.notifier.notify(Notice::info(success(value))),
            Err(err) if err.is_precondition() => {
                log::warn!("{}", err);
                self.notifier.notify(Notice::warning(err.to_string()));
            }
            Err(err) => {
                log::error!("{}", err);
                self.notifier.notify(Notice::error(err.to_string()));
            }
        }
        result
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|value| !value.is_empty())
}

/// `1h 05m` / `12m 30s`.
pub fn format_duration(elapsed: chrono::Duration) -> String {
    let seconds = elapsed.num_seconds().max(0);
    let (hours, minutes, seconds) = (seconds / 3600, (seconds % 3600) / 60, seconds % 60);
    if hours > 0 {
        format!("{}h {:02}m", hours, minutes)
    } else {
        format!("{}m {:02}s", minutes, seconds)
    }
}
