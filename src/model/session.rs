// src/model/session.rs
//! In-memory session state and the property patches written to the session page.

use super::schema::StatusField;
use crate::error::SessionError;
use crate::types::{PageId, SessionTitle};
use chrono::{DateTime, Local, SecondsFormat};
use serde_json::{json, Map, Value};
use std::fmt;

/// Lifecycle of the tracked session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionState {
    #[default]
    Idle,
    Starting,
    Active,
    Ending,
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Idle => "idle",
            Self::Starting => "starting",
            Self::Active => "active",
            Self::Ending => "ending",
        };
        f.write_str(label)
    }
}

/// The session being tracked. Lives only as long as the process.
#[derive(Debug, Clone, Default)]
pub struct Session {
    pub title: Option<SessionTitle>,
    pub project: Option<String>,
    pub start_time: Option<DateTime<Local>>,
    pub end_time: Option<DateTime<Local>>,
    pub remote_page_id: Option<PageId>,
    /// Schema facts captured at start, needed again at end.
    pub title_key: String,
    pub date_key: String,
    pub status_field: Option<StatusField>,
}

impl Session {
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Time from start to end, or to `now` while the session runs.
    pub fn elapsed(&self, now: DateTime<Local>) -> Option<chrono::Duration> {
        self.start_time
            .map(|start| self.end_time.unwrap_or(now) - start)
    }
}

/// `properties` body of a `PATCH /v1/pages/{id}` request.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PropertyPatch {
    properties: Map<String, Value>,
}

impl PropertyPatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn title(mut self, key: &str, title: &SessionTitle) -> Self {
        self.properties.insert(
            key.to_string(),
            json!({ "title": [{ "text": { "content": title.as_str() } }] }),
        );
        self
    }

    /// Date range: a start, or a start and an end.
    pub fn dates(
        mut self,
        key: &str,
        start: Option<DateTime<Local>>,
        end: Option<DateTime<Local>>,
    ) -> Result<Self, SessionError> {
        let value = match (start, end) {
            (Some(start), None) => json!({ "date": { "start": timestamp(start) } }),
            (Some(start), Some(end)) => json!({
                "date": { "start": timestamp(start), "end": timestamp(end) }
            }),
            (None, Some(_)) => {
                return Err(SessionError::Configuration(
                    "an end date requires a start date".to_string(),
                ))
            }
            (None, None) => {
                return Err(SessionError::Configuration(
                    "a date update needs at least a start date".to_string(),
                ))
            }
        };
        self.properties.insert(key.to_string(), value);
        Ok(self)
    }

    pub fn status(mut self, field: Option<&StatusField>, option: &str) -> Self {
        match field {
            Some(StatusField::Status(key)) => {
                self.properties
                    .insert(key.clone(), json!({ "status": { "name": option } }));
            }
            Some(StatusField::Select(key)) => {
                self.properties
                    .insert(key.clone(), json!({ "select": { "name": option } }));
            }
            None => {}
        }
        self
    }

    pub fn relation(mut self, key: &str, page: &PageId) -> Self {
        self.properties.insert(
            key.to_string(),
            json!({ "relation": [{ "id": page.as_str() }] }),
        );
        self
    }

    pub fn into_body(self) -> Value {
        json!({ "properties": Value::Object(self.properties) })
    }
}

fn timestamp(at: DateTime<Local>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Secs, false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;

    fn at(hour: u32) -> DateTime<Local> {
        Local.with_ymd_and_hms(2026, 5, 2, hour, 0, 0).unwrap()
    }

    #[test]
    fn start_only_patch() {
        let body = PropertyPatch::new()
            .dates("Time", Some(at(9)), None)
            .unwrap()
            .into_body();
        assert_eq!(body["properties"]["Time"]["date"]["start"], timestamp(at(9)));
        assert!(body["properties"]["Time"]["date"].get("end").is_none());
    }

    #[test]
    fn start_and_end_patch() {
        let body = PropertyPatch::new()
            .dates("Time", Some(at(9)), Some(at(11)))
            .unwrap()
            .into_body();
        assert_eq!(body["properties"]["Time"]["date"]["end"], timestamp(at(11)));
    }

    #[test]
    fn end_without_start_is_rejected() {
        assert!(matches!(
            PropertyPatch::new().dates("Time", None, Some(at(11))),
            Err(SessionError::Configuration(_))
        ));
        assert!(matches!(
            PropertyPatch::new().dates("Time", None, None),
            Err(SessionError::Configuration(_))
        ));
    }

    #[test]
    fn status_follows_field_kind() {
        let status = StatusField::Status("Status".to_string());
        let select = StatusField::Select("Stage".to_string());
        let body = PropertyPatch::new()
            .status(Some(&status), "Done")
            .status(Some(&select), "Done")
            .into_body();
        assert_eq!(
            body["properties"],
            json!({
                "Status": { "status": { "name": "Done" } },
                "Stage": { "select": { "name": "Done" } }
            })
        );
        assert_eq!(
            PropertyPatch::new().status(None, "Done").into_body(),
            json!({ "properties": {} })
        );
    }

    #[test]
    fn title_and_relation_shapes() {
        let title = SessionTitle::new("Refactor parser").unwrap();
        let body = PropertyPatch::new()
            .title("Name", &title)
            .relation("Project", &PageId::new("proj-1"))
            .into_body();
        assert_eq!(
            body["properties"]["Name"]["title"][0]["text"]["content"],
            "Refactor parser"
        );
        assert_eq!(body["properties"]["Project"]["relation"][0]["id"], "proj-1");
    }

    #[test]
    fn elapsed_stops_at_end_time() {
        let session = Session {
            start_time: Some(at(9)),
            end_time: Some(at(11)),
            ..Session::default()
        };
        assert_eq!(session.elapsed(at(15)), Some(chrono::Duration::hours(2)));
        assert_eq!(Session::default().elapsed(at(15)), None);
    }

    #[test]
    fn reset_clears_everything() {
        let mut session = Session {
            remote_page_id: Some(PageId::new("abc")),
            start_time: Some(at(9)),
            ..Session::default()
        };
        assert_eq!(session.elapsed(at(10)), Some(chrono::Duration::hours(1)));
        session.end_time = Some(at(10));
        session.reset();
        assert!(session.end_time.is_none());
        assert!(session.remote_page_id.is_none());
        assert!(session.start_time.is_none());
    }
}
