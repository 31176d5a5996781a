use serde::{Deserialize, Serialize};

/// Everything a workflow tells the presentation layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "camelCase")]
pub enum ReportEvent {
    Log { line: String },
    Progress { percent: u8 },
    Error { title: String, message: String },
    Info { title: String, message: String },
}

impl ReportEvent {
    /// One JSON object per line.
    pub fn to_json_line(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|e| {
            format!(r#"{{"event":"log","line":"unserializable event: {}"}}"#, e)
        })
    }

    /// Plain-text rendering for a terminal.
    pub fn to_text(&self) -> String {
        match self {
            ReportEvent::Log { line } => line.clone(),
            ReportEvent::Progress { percent } => format!("progress: {}%", percent),
            ReportEvent::Error { title, message } => format!("{}: {}", title, message),
            ReportEvent::Info { title, message } => format!("{}\n{}", title, message),
        }
    }
}
