mod p4;
mod workspace;

use std::io;
use std::path::PathBuf;

use thiserror::Error;

pub use p4::{fill_change_description, parse_change_number, remap_client_view, P4Client};
pub use workspace::WorkspaceConfig;

#[derive(Debug, Error)]
pub enum VcsError {
    #[error("Workspace root not initialized. Please check P4 configuration.")]
    NotConfigured,
    #[error("invalid p4 command line: {0}")]
    InvalidCommand(String),
    #[error("Command could not be started: {command}: {source}")]
    Spawn { command: String, source: io::Error },
    #[error("Command failed: {command}\n{stderr}")]
    CommandFailed { command: String, stderr: String },
    #[error("Unexpected output from {command}: {detail}")]
    UnexpectedOutput { command: String, detail: String },
    #[error("not a depot path: {0}")]
    InvalidDepotPath(String),
}

/// The version-control operations the workflows rely on.
pub trait VersionControl {
    /// Whether the depot path names an existing file. Failures count as "no".
    fn path_exists(&mut self, depot_path: &str) -> bool;
    /// Create a pending changelist and return its number.
    fn create_changelist(&mut self, description: &str) -> Result<String, VcsError>;
    /// Make sure the client view maps each depot path.
    fn map_workspace_paths(&mut self, depot_paths: &[&str]) -> Result<(), VcsError>;
    fn sync(&mut self, depot_path: &str) -> Result<(), VcsError>;
    fn checkout_for_edit(&mut self, depot_path: &str, changelist: &str) -> Result<(), VcsError>;
    /// Local file backing a depot path.
    fn local_path(&self, depot_path: &str) -> Result<PathBuf, VcsError>;
    /// Client identity in use, when one is configured.
    fn workspace(&self) -> Option<&WorkspaceConfig> {
        None
    }
}
