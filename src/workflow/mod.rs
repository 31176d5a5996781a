mod bringup;
mod error;
mod tuning;

use std::fmt;
use std::path::PathBuf;

use serde::Serialize;

pub use bringup::run_bringup;
pub use error::{run_reported, WorkflowError};
pub use tuning::{apply_tuning, load_properties, run_tuning};

use crate::report::{Stage, Tracker};
use crate::vcs::VersionControl;

pub const DEFAULT_BRINGUP_DESCRIPTION: &str = "Auto changelist - Sync and update LMKD/Chimera";
pub const DEFAULT_TUNING_DESCRIPTION: &str = "Apply tuning changes to LMKD/Chimera properties";

/// The part each file plays: VINCE is the reference, BENI and FLUMEN are
/// the targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Role {
    #[serde(rename = "VINCE")]
    Vince,
    #[serde(rename = "BENI")]
    Beni,
    #[serde(rename = "FLUMEN")]
    Flumen,
}

impl Role {
    pub fn name(self) -> &'static str {
        match self {
            Role::Vince => "VINCE",
            Role::Beni => "BENI",
            Role::Flumen => "FLUMEN",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BringupRequest {
    pub vince: String,
    pub beni: Option<String>,
    pub flumen: Option<String>,
    pub description: String,
}

impl BringupRequest {
    pub fn new(vince: &str) -> Self {
        Self {
            vince: vince.to_string(),
            beni: None,
            flumen: None,
            description: DEFAULT_BRINGUP_DESCRIPTION.to_string(),
        }
    }

    pub fn beni(mut self, path: &str) -> Self {
        self.beni = Some(path.to_string());
        self
    }

    pub fn flumen(mut self, path: &str) -> Self {
        self.flumen = Some(path.to_string());
        self
    }
}

/// BENI and/or FLUMEN depot paths for the tuning workflows.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TuningTargets {
    pub beni: Option<String>,
    pub flumen: Option<String>,
}

impl TuningTargets {
    pub fn new(beni: Option<&str>, flumen: Option<&str>) -> Self {
        Self {
            beni: beni.map(str::to_string),
            flumen: flumen.map(str::to_string),
        }
    }

    /// Provided (non-blank) paths in BENI, FLUMEN order.
    fn provided(&self) -> Vec<(Role, &str)> {
        provided_targets(self.beni.as_deref(), self.flumen.as_deref())
    }
}

/// A target file that was rewritten.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UpdatedFile {
    pub role: Role,
    pub depot_path: String,
    pub local_path: PathBuf,
    pub backup: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WorkflowSummary {
    pub changelist: String,
    pub updated: Vec<UpdatedFile>,
}

impl WorkflowSummary {
    pub fn role_names(&self) -> String {
        join_roles(self.updated.iter().map(|f| f.role))
    }
}

fn provided_targets<'a>(beni: Option<&'a str>, flumen: Option<&'a str>) -> Vec<(Role, &'a str)> {
    [(Role::Beni, beni), (Role::Flumen, flumen)]
        .into_iter()
        .filter_map(|(role, path)| {
            path.map(str::trim)
                .filter(|p| !p.is_empty())
                .map(|p| (role, p))
        })
        .collect()
}

fn is_depot_path(path: &str) -> bool {
    path.starts_with("//")
}

fn require_depot_path(role: Role, path: &str) -> Result<(), WorkflowError> {
    if is_depot_path(path) {
        Ok(())
    } else {
        Err(WorkflowError::InvalidPath {
            role,
            path: path.to_string(),
        })
    }
}

fn join_roles(roles: impl IntoIterator<Item = Role>) -> String {
    roles
        .into_iter()
        .map(Role::name)
        .collect::<Vec<_>>()
        .join(", ")
}

fn log_workspace(vcs: &dyn VersionControl, tracker: &mut Tracker<'_>) {
    if let Some(ws) = vcs.workspace() {
        tracker.log(Stage::Config, format!("Using P4 Client: {}", ws.client_name));
        tracker.log(Stage::Config, format!("Using Workspace: {}", ws.root().display()));
    }
}

/// Resolve every depot path up front so a missing workspace fails before
/// any Perforce state is created.
fn resolve_locals(
    vcs: &dyn VersionControl,
    paths: &[(Role, &str)],
) -> Result<Vec<PathBuf>, WorkflowError> {
    paths
        .iter()
        .map(|(_, depot)| vcs.local_path(depot).map_err(WorkflowError::from))
        .collect()
}
