// tests/settings_panel.rs
//! Settings panel, project list, and persisted property selection.

mod common;

use codetrack::{
    AppError, NoticeLevel, PanelMessage, PendingQueue, PropertyKind, SessionError,
    SessionOrchestrator, Settings, SettingsStore, TrackerConfig,
};
use common::*;
use pretty_assertions::assert_eq;
use serde_json::json;
use std::sync::Arc;

#[tokio::test]
async fn panel_lists_only_selectable_properties() {
    let mut h = Harness::ready().await;

    let properties = h.orchestrator.open_settings_panel().await.unwrap();

    let names: Vec<&str> = properties.keys().map(String::as_str).collect();
    assert_eq!(names, vec!["Session", "Time", "Project", "Status", "Notes"]);
    assert_eq!(properties["Time"], PropertyKind::Date);
    assert_eq!(properties["Project"], PropertyKind::Relation);

    let delivered = h.panel.delivered();
    assert_eq!(delivered.len(), 2);
    assert_eq!(
        serde_json::to_value(&delivered[0]).unwrap(),
        json!({
            "command": "updatePropertySettings",
            "properties": {
                "Session": "title",
                "Time": "date",
                "Project": "relation",
                "Status": "status",
                "Notes": "rich_text"
            },
            "selectedProjectProperty": "Project",
            "selectedTimeProperty": "Time"
        })
    );
    match &delivered[1] {
        PanelMessage::UpdateProjects { projects, .. } => {
            let names: Vec<&str> = projects.names().collect();
            assert_eq!(names, vec!["codetrack", "Website Redesign", "Unnamed Project"]);
        }
        other => panic!("expected project list, got {:?}", other),
    }
}

#[tokio::test]
async fn panel_messages_wait_until_view_is_ready() {
    let mut h = Harness::unready(valid_config(), selected_settings()).await;

    h.orchestrator.open_settings_panel().await.unwrap();

    assert!(h.panel.delivered().is_empty());
    assert_eq!(h.queue.pending_len(), 2);

    h.queue.mark_ready();

    let delivered = h.panel.delivered();
    assert_eq!(delivered.len(), 2);
    assert!(matches!(delivered[0], PanelMessage::UpdatePropertySettings { .. }));
    assert!(matches!(delivered[1], PanelMessage::UpdateProjects { .. }));
    assert_eq!(h.queue.pending_len(), 0);
}

#[tokio::test]
async fn panel_without_secret_makes_no_requests() {
    let config = TrackerConfig {
        notion_secret: String::new(),
        ..valid_config()
    };
    let mut h = Harness::new(config, selected_settings()).await;

    let err = h.orchestrator.open_settings_panel().await.unwrap_err();

    assert!(matches!(err, SessionError::Configuration(_)));
    assert_eq!(h.notion.call_count(), 0);
    assert!(h.panel.delivered().is_empty());
    assert_eq!(h.notices.count(NoticeLevel::Error), 1);
}

#[tokio::test]
async fn unresolvable_project_relation_degrades_to_empty_list() {
    // "Time" is a date property, so it has no related database.
    let mut h = Harness::new(valid_config(), Settings::new(Some("Time"), Some("Time"))).await;

    let err = h.orchestrator.refresh_projects().await.unwrap_err();

    assert!(matches!(err, SessionError::AmbiguousConfig(ref name) if name == "Time"));
    assert!(h.orchestrator.projects().is_empty());
    assert!(!h
        .notion
        .calls()
        .iter()
        .any(|call| matches!(call, Call::QueryDatabase { .. })));
    assert!(matches!(
        h.panel.delivered().last(),
        Some(PanelMessage::UpdateProjects { projects, .. }) if projects.is_empty()
    ));
}

#[tokio::test]
async fn panel_still_opens_when_project_relation_is_unresolvable() {
    let mut h = Harness::new(
        valid_config(),
        Settings::new(Some("Missing"), Some("Time")),
    )
    .await;

    let properties = h.orchestrator.open_settings_panel().await.unwrap();

    assert_eq!(properties.len(), 5);
    assert!(h
        .notices
        .notices()
        .iter()
        .any(|n| n.level == NoticeLevel::Warning && n.text.contains("Missing")));
}

#[tokio::test]
async fn duplicate_project_names_keep_the_later_page() {
    let mut h = Harness::ready().await;
    h.notion.script(|s| {
        let mut duplicate = s.project_pages[0].clone();
        duplicate.id = "9f4c8a5d-6e7b-4c0d-8e3f-4a5b6c7d8e9f".to_string();
        s.project_pages.push(duplicate);
    });

    let projects = h.orchestrator.refresh_projects().await.unwrap();

    assert_eq!(projects.len(), 3);
    assert_eq!(
        projects.get("codetrack").map(|id| id.as_str()),
        Some("9f4c8a5d-6e7b-4c0d-8e3f-4a5b6c7d8e9f")
    );
    assert_eq!(projects.names().next(), Some("codetrack"));
}

#[tokio::test]
async fn save_persists_and_refreshes_projects() {
    let mut h = Harness::new(valid_config(), Settings::default()).await;

    let saved = h
        .orchestrator
        .save_settings(Some("Project"), Some("Time"))
        .await
        .unwrap();

    assert_eq!(saved, selected_settings());
    assert_eq!(h.store.load().await, selected_settings());
    assert_eq!(h.orchestrator.settings(), &selected_settings());
    assert_eq!(h.orchestrator.projects().len(), 3);
    assert!(matches!(
        h.panel.delivered().last(),
        Some(PanelMessage::UpdateProjects { .. })
    ));
}

#[tokio::test]
async fn save_treats_blank_project_property_as_unset() {
    let mut h = Harness::ready().await;

    let saved = h
        .orchestrator
        .save_settings(Some("  "), Some("Time"))
        .await
        .unwrap();

    assert_eq!(saved.project_property_name, None);
    assert_eq!(saved.time_property_name.as_deref(), Some("Time"));
    assert!(h.orchestrator.projects().is_empty());
}

#[tokio::test]
async fn save_without_credentials_only_persists() {
    let config = TrackerConfig {
        notion_secret: String::new(),
        ..valid_config()
    };
    let mut h = Harness::new(config, Settings::default()).await;

    h.orchestrator
        .save_settings(Some("Project"), Some("Time"))
        .await
        .unwrap();

    assert_eq!(h.store.load().await, selected_settings());
    assert_eq!(h.notion.call_count(), 0);
}

#[tokio::test]
async fn clear_forgets_selection_and_projects() {
    let mut h = Harness::ready().await;
    h.orchestrator.refresh_projects().await.unwrap();

    h.orchestrator.clear_settings().await.unwrap();

    assert_eq!(h.orchestrator.settings(), &Settings::default());
    assert_eq!(h.store.load().await, Settings::default());
    assert!(h.orchestrator.projects().is_empty());
}

struct BrokenStore;

#[async_trait::async_trait]
impl SettingsStore for BrokenStore {
    async fn load(&self) -> Settings {
        Settings::default()
    }

    async fn save(&self, _settings: &Settings) -> Result<(), AppError> {
        Err(AppError::Io(std::io::Error::new(
            std::io::ErrorKind::PermissionDenied,
            "read-only",
        )))
    }

    async fn clear(&self) -> Result<(), AppError> {
        Err(AppError::Io(std::io::Error::new(
            std::io::ErrorKind::PermissionDenied,
            "read-only",
        )))
    }
}

#[tokio::test]
async fn storage_failure_is_reported() {
    let notion = Arc::new(FakeNotion::new());
    let notices = Arc::new(RecordingNotifier::default());
    let queue = PendingQueue::new(Box::new(RecordingSink::default()));
    let mut orchestrator = SessionOrchestrator::new(
        notion.clone(),
        Arc::new(BrokenStore),
        notices.clone(),
        queue,
        valid_config(),
    )
    .await;

    let err = orchestrator
        .save_settings(Some("Project"), Some("Time"))
        .await
        .unwrap_err();
    assert!(matches!(err, SessionError::Storage(_)));
    assert_eq!(orchestrator.settings(), &Settings::default());

    let err = orchestrator.clear_settings().await.unwrap_err();
    assert!(matches!(err, SessionError::Storage(_)));
    assert_eq!(notion.call_count(), 0);
    assert_eq!(notices.count(NoticeLevel::Error), 2);
}
