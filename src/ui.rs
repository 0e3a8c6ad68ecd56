// src/ui.rs
//! What the orchestrator tells the user interface.
//!
//! Two channels: transient [`Notice`]s for the user, and [`PanelMessage`]s
//! for the settings/sidebar view. Panel messages wait in a [`PendingQueue`]
//! until the view reports it is ready.

use crate::model::{ProjectIndex, PropertyKind};
use indexmap::IndexMap;
use parking_lot::Mutex;
use serde::Serialize;
use std::fmt;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Warning,
    Error,
}

/// A transient message for the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub text: String,
}

impl Notice {
    pub fn info(text: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Info,
            text: text.into(),
        }
    }

    pub fn warning(text: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Warning,
            text: text.into(),
        }
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Error,
            text: text.into(),
        }
    }
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let marker = match self.level {
            NoticeLevel::Info => "✓",
            NoticeLevel::Warning => "⚠️ ",
            NoticeLevel::Error => "✗",
        };
        write!(f, "{} {}", marker, self.text)
    }
}

/// Receives user notices.
pub trait Notifier: Send + Sync {
    fn notify(&self, notice: Notice);
}

/// Messages for the settings panel and sidebar view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "command", rename_all = "camelCase")]
pub enum PanelMessage {
    #[serde(rename_all = "camelCase")]
    UpdatePropertySettings {
        properties: IndexMap<String, PropertyKind>,
        selected_project_property: Option<String>,
        selected_time_property: Option<String>,
    },
    #[serde(rename_all = "camelCase")]
    UpdateProjects {
        projects: ProjectIndex,
        workspace_name: Option<String>,
    },
    UpdatePlaceholder { title: String },
}

/// Destination of panel messages once the view is ready.
pub trait MessageSink: Send {
    fn deliver(&mut self, message: &PanelMessage);
}

struct QueueState {
    ready: bool,
    pending: Vec<PanelMessage>,
    sink: Box<dyn MessageSink>,
}

/// Buffers panel messages until [`PendingQueue::mark_ready`], then flushes
/// them in arrival order. Clones share the same queue.
#[derive(Clone)]
pub struct PendingQueue {
    state: Arc<Mutex<QueueState>>,
}

impl PendingQueue {
    pub fn new(sink: Box<dyn MessageSink>) -> Self {
        Self {
            state: Arc::new(Mutex::new(QueueState {
                ready: false,
                pending: Vec::new(),
                sink,
            })),
        }
    }

    pub fn post(&self, message: PanelMessage) {
        let mut state = self.state.lock();
        if state.ready {
            state.sink.deliver(&message);
        } else {
            log::debug!("View not ready, queueing message");
            state.pending.push(message);
        }
    }

    /// Flushes everything queued so far. Later calls are no-ops.
    pub fn mark_ready(&self) {
        let mut state = self.state.lock();
        if state.ready {
            return;
        }
        state.ready = true;
        let pending = std::mem::take(&mut state.pending);
        if !pending.is_empty() {
            log::debug!("Sending {} pending messages", pending.len());
        }
        for message in &pending {
            state.sink.deliver(message);
        }
    }

    pub fn pending_len(&self) -> usize {
        self.state.lock().pending.len()
    }
}
