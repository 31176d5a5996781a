use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

use crate::vcs::{P4Client, VcsError, WorkspaceConfig};
use crate::workflow::{DEFAULT_BRINGUP_DESCRIPTION, DEFAULT_TUNING_DESCRIPTION};

pub const CONFIG_FILE_NAME: &str = "prop-tuner.json";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Reading {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Parsing {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
}

/// Optional settings from `prop-tuner.json`. Every field may be omitted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AppConfig {
    /// Perforce command line prefix, e.g. `p4 -p ssl:perforce:1666`.
    pub p4_command: Option<String>,
    pub client_name: Option<String>,
    pub workspace_root: Option<PathBuf>,
    pub bringup_description: Option<String>,
    pub tuning_description: Option<String>,
    pub log_file: Option<PathBuf>,
}

impl AppConfig {
    /// Load from an explicit path, or from the first default location that
    /// exists. No file at a default location yields the defaults.
    pub fn load(explicit: Option<&Path>) -> Result<(Self, Option<PathBuf>), ConfigError> {
        let path = match explicit {
            Some(p) => Some(p.to_path_buf()),
            None => default_candidates().into_iter().find(|p| p.exists()),
        };
        match path {
            Some(path) => {
                let cfg = Self::from_file(&path)?;
                Ok((cfg, Some(path)))
            }
            None => Ok((Self::default(), None)),
        }
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let bytes = fs::read(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_slice(&bytes).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn p4_command(&self) -> &str {
        self.p4_command
            .as_deref()
            .filter(|c| !c.trim().is_empty())
            .unwrap_or("p4")
    }

    pub fn bringup_description(&self) -> &str {
        self.bringup_description
            .as_deref()
            .unwrap_or(DEFAULT_BRINGUP_DESCRIPTION)
    }

    pub fn tuning_description(&self) -> &str {
        self.tuning_description
            .as_deref()
            .unwrap_or(DEFAULT_TUNING_DESCRIPTION)
    }

    /// Client identity when both halves are configured.
    pub fn workspace(&self) -> Option<WorkspaceConfig> {
        match (&self.client_name, &self.workspace_root) {
            (Some(client), Some(root)) => Some(WorkspaceConfig::new(client.clone(), root.clone())),
            _ => None,
        }
    }

    /// A Perforce client using the configured identity, or the one reported
    /// by `p4 client -o` otherwise.
    pub fn build_client(&self) -> Result<P4Client, VcsError> {
        match self.workspace() {
            Some(ws) => P4Client::new(self.p4_command(), Some(ws)),
            None => P4Client::discover(self.p4_command()),
        }
    }
}

fn default_candidates() -> Vec<PathBuf> {
    let mut candidates = Vec::new();
    if let Ok(exe) = std::env::current_exe() {
        if let Some(dir) = exe.parent() {
            candidates.push(dir.join(CONFIG_FILE_NAME));
        }
    }
    if let Ok(cwd) = std::env::current_dir() {
        candidates.push(cwd.join(CONFIG_FILE_NAME));
    }
    candidates
}
