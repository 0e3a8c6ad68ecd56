// tests/common/mod.rs
//! Shared fakes for the orchestrator tests: a scripted Notion gateway and
//! recorders for notices and panel messages.

#![allow(dead_code)]

use codetrack::api::responses::{DatabaseResponse, PageResponse, PaginatedResponse};
use codetrack::{
    ApiKey, AppError, DatabaseSchema, MemorySettingsStore, MessageSink, NotionErrorCode,
    NotionGateway, NotionId, Notice, NoticeLevel, Notifier, PageId, PanelMessage, PendingQueue,
    PropertyPatch, SessionOrchestrator, SessionTitle, Settings, TrackerConfig,
};
use parking_lot::Mutex;
use serde_json::Value;
use std::sync::Arc;

pub const TEST_SECRET: &str = "secret_abcdefghijklmnopqrstuvwxyz";
pub const TEST_DATABASE_URL: &str =
    "https://www.notion.so/acme/Coding-Sessions-8f3c2b1a9d7e4f60a1b2c3d4e5f60718?v=1";
pub const TRACKING_DATABASE_ID: &str = "8f3c2b1a-9d7e-4f60-a1b2-c3d4e5f60718";
pub const PROJECTS_DATABASE_ID: &str = "3c1d9e2a-7b4f-4e8a-9c6d-5f2e1a0b3c4d";
pub const CODETRACK_PROJECT_ID: &str = "5b0e4c1f-2a3d-4e6f-8a9b-0c1d2e3f4a5b";
pub const CREATED_PAGE_ID: &str = "abc123";

/// Every gateway call, with the arguments that matter to assertions.
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    CreatePage { database: String, title: String },
    UpdatePage { page: String, body: Value },
    TrashPage { page: String },
    RetrieveDatabase { database: String },
    QueryDatabase { database: String },
}

/// Knobs a test flips to script failures.
#[derive(Debug, Default)]
pub struct Script {
    pub fail_create: bool,
    pub fail_update: bool,
    pub fail_retrieve: bool,
    pub schema: DatabaseSchema,
    pub project_pages: Vec<PageResponse>,
}

/// In-memory stand-in for the Notion API.
pub struct FakeNotion {
    calls: Mutex<Vec<Call>>,
    script: Mutex<Script>,
}

impl FakeNotion {
    pub fn new() -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            script: Mutex::new(Script {
                schema: tracking_schema(),
                project_pages: project_pages(),
                ..Script::default()
            }),
        }
    }

    pub fn script(&self, edit: impl FnOnce(&mut Script)) {
        edit(&mut self.script.lock());
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().len()
    }

    pub fn trashed(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                Call::TrashPage { page } => Some(page),
                _ => None,
            })
            .collect()
    }

    pub fn updates(&self) -> Vec<Value> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                Call::UpdatePage { body, .. } => Some(body),
                _ => None,
            })
            .collect()
    }

    fn record(&self, call: Call) {
        self.calls.lock().push(call);
    }
}

fn rejected(message: &str) -> AppError {
    AppError::NotionService {
        code: NotionErrorCode::ValidationFailed,
        message: message.to_string(),
        status: Some(400),
    }
}

#[async_trait::async_trait]
impl NotionGateway for FakeNotion {
    async fn create_page(
        &self,
        _auth: &ApiKey,
        database: &NotionId,
        title: &SessionTitle,
    ) -> Result<PageId, AppError> {
        self.record(Call::CreatePage {
            database: database.to_hyphenated(),
            title: title.as_str().to_string(),
        });
        if self.script.lock().fail_create {
            return Err(rejected("create rejected"));
        }
        Ok(PageId::new(CREATED_PAGE_ID))
    }

    async fn update_page(
        &self,
        _auth: &ApiKey,
        page: &PageId,
        patch: PropertyPatch,
    ) -> Result<(), AppError> {
        self.record(Call::UpdatePage {
            page: page.as_str().to_string(),
            body: patch.into_body(),
        });
        if self.script.lock().fail_update {
            return Err(rejected("patch rejected"));
        }
        Ok(())
    }

    async fn trash_page(&self, _auth: &ApiKey, page: &PageId) -> Result<(), AppError> {
        self.record(Call::TrashPage {
            page: page.as_str().to_string(),
        });
        Ok(())
    }

    async fn retrieve_database(
        &self,
        _auth: &ApiKey,
        database: &NotionId,
    ) -> Result<DatabaseSchema, AppError> {
        self.record(Call::RetrieveDatabase {
            database: database.to_hyphenated(),
        });
        let script = self.script.lock();
        if script.fail_retrieve {
            return Err(AppError::NotionService {
                code: NotionErrorCode::ObjectNotFound,
                message: "database not shared".to_string(),
                status: Some(404),
            });
        }
        Ok(script.schema.clone())
    }

    async fn query_database(&self, _auth: &ApiKey, database: &NotionId) -> Vec<PageResponse> {
        self.record(Call::QueryDatabase {
            database: database.to_hyphenated(),
        });
        self.script.lock().project_pages.clone()
    }
}

/// Collects every notice.
#[derive(Default)]
pub struct RecordingNotifier {
    notices: Mutex<Vec<Notice>>,
}

impl RecordingNotifier {
    pub fn notices(&self) -> Vec<Notice> {
        self.notices.lock().clone()
    }

    pub fn last(&self) -> Option<Notice> {
        self.notices.lock().last().cloned()
    }

    pub fn count(&self, level: NoticeLevel) -> usize {
        self.notices
            .lock()
            .iter()
            .filter(|notice| notice.level == level)
            .count()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, notice: Notice) {
        self.notices.lock().push(notice);
    }
}

/// Collects delivered panel messages. Clones share the log.
#[derive(Clone, Default)]
pub struct RecordingSink {
    delivered: Arc<Mutex<Vec<PanelMessage>>>,
}

impl RecordingSink {
    pub fn delivered(&self) -> Vec<PanelMessage> {
        self.delivered.lock().clone()
    }
}

impl MessageSink for RecordingSink {
    fn deliver(&mut self, message: &PanelMessage) {
        self.delivered.lock().push(message.clone());
    }
}

pub fn tracking_schema() -> DatabaseSchema {
    let response: DatabaseResponse = serde_json::from_str(include_str!(
        "../fixtures/api_responses/tracking_database.json"
    ))
    .expect("tracking database fixture should parse");
    DatabaseSchema::from_response(response)
}

pub fn project_pages() -> Vec<PageResponse> {
    let response: PaginatedResponse<PageResponse> = serde_json::from_str(include_str!(
        "../fixtures/api_responses/project_pages.json"
    ))
    .expect("project pages fixture should parse");
    response.results
}

pub fn valid_config() -> TrackerConfig {
    TrackerConfig {
        notion_secret: TEST_SECRET.to_string(),
        tracking_database_url: TEST_DATABASE_URL.to_string(),
        auto_start: false,
        workspace_name: None,
    }
}

pub fn selected_settings() -> Settings {
    Settings::new(Some("Project"), Some("Time"))
}

/// An orchestrator wired to fakes, with the panel already marked ready.
pub struct Harness {
    pub orchestrator: SessionOrchestrator,
    pub notion: Arc<FakeNotion>,
    pub notices: Arc<RecordingNotifier>,
    pub panel: RecordingSink,
    pub queue: PendingQueue,
    pub store: Arc<MemorySettingsStore>,
}

impl Harness {
    pub async fn new(config: TrackerConfig, settings: Settings) -> Self {
        let harness = Self::unready(config, settings).await;
        harness.queue.mark_ready();
        harness
    }

    /// Same as [`Harness::new`] but the panel has not reported ready.
    pub async fn unready(config: TrackerConfig, settings: Settings) -> Self {
        let notion = Arc::new(FakeNotion::new());
        let notices = Arc::new(RecordingNotifier::default());
        let panel = RecordingSink::default();
        let queue = PendingQueue::new(Box::new(panel.clone()));
        let store = Arc::new(MemorySettingsStore::with(settings));

        let orchestrator = SessionOrchestrator::new(
            notion.clone(),
            store.clone(),
            notices.clone(),
            queue.clone(),
            config,
        )
        .await;

        Self {
            orchestrator,
            notion,
            notices,
            panel,
            queue,
            store,
        }
    }

    pub async fn ready() -> Self {
        Self::new(valid_config(), selected_settings()).await
    }
}
