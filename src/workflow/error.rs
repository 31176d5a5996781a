use thiserror::Error;

use super::Role;
use crate::editor::EditError;
use crate::props::TableError;
use crate::report::{Reporter, Stage, Tracker};
use crate::vcs::VcsError;

#[derive(Debug, Error)]
pub enum WorkflowError {
    #[error("{role} depot path must start with //: {path}")]
    InvalidPath { role: Role, path: String },
    #[error("{role} depot path is required.")]
    MissingPath { role: Role },
    #[error("{role} depot path does not exist: {path}\n{role} path is mandatory for the operation.")]
    MandatoryPathNotFound { role: Role, path: String },
    #[error("{role} depot path does not exist: {path}")]
    PathNotFound { role: Role, path: String },
    #[error("Neither BENI nor FLUMEN paths are valid. At least one target path is required.")]
    NoValidTargets,
    #[error("At least one valid depot path is required.")]
    NoValidPaths,
    #[error("{role} file does not contain LMKD or Chimera properties")]
    PropertiesNotFound { role: Role },
    #[error("No files were updated.")]
    UpdateFailed,
    #[error("{0}")]
    Table(#[from] TableError),
    #[error(transparent)]
    Vcs(#[from] VcsError),
    #[error(transparent)]
    Edit(#[from] EditError),
}

impl WorkflowError {
    /// Dialog title; process errors take the workflow's own title.
    pub fn title(&self) -> Option<&'static str> {
        match self {
            WorkflowError::InvalidPath { .. } | WorkflowError::MissingPath { .. } => Some("Invalid Path"),
            WorkflowError::MandatoryPathNotFound { .. } | WorkflowError::PathNotFound { .. } => {
                Some("Path Not Found")
            }
            WorkflowError::NoValidTargets => Some("No Valid Targets"),
            WorkflowError::NoValidPaths => Some("No Valid Paths"),
            WorkflowError::PropertiesNotFound { .. } => Some("Properties Not Found"),
            WorkflowError::UpdateFailed => Some("Update Failed"),
            WorkflowError::Table(_) => Some("Invalid Property"),
            WorkflowError::Vcs(_) | WorkflowError::Edit(_) => None,
        }
    }
}

/// Run a workflow body and funnel any failure to the reporter: one
/// `[ERROR]` log line, exactly one error notification, progress back to 0.
/// Nothing propagates past this point.
pub fn run_reported<T>(
    reporter: &mut dyn Reporter,
    process_title: &str,
    body: impl FnOnce(&mut Tracker<'_>) -> Result<T, WorkflowError>,
) -> Option<T> {
    let mut tracker = Tracker::new(reporter);
    match body(&mut tracker) {
        Ok(value) => Some(value),
        Err(err) => {
            let message = err.to_string();
            tracker.log(Stage::Error, &message);
            tracker.error(err.title().unwrap_or(process_title), &message);
            tracker.reset_progress();
            None
        }
    }
}
