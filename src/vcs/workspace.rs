use std::path::{Path, PathBuf};

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use super::VcsError;

static CLIENT_FIELD: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?m)^Client:\s+(\S.*?)\s*$").unwrap());
static ROOT_FIELD: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?m)^Root:\s+(\S.*?)\s*$").unwrap());

/// Client identity used to map depot paths into the local workspace.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkspaceConfig {
    pub client_name: String,
    pub workspace_root: PathBuf,
}

impl WorkspaceConfig {
    pub fn new(client_name: impl Into<String>, workspace_root: impl Into<PathBuf>) -> Self {
        Self {
            client_name: client_name.into(),
            workspace_root: workspace_root.into(),
        }
    }

    /// Build the identity from `p4 client -o` output. The `Root:` field wins;
    /// without it the root follows the `C:\Users\<user>\Perforce\<client>`
    /// layout, `<user>` being the client name up to its first `_`.
    pub fn from_client_spec(spec: &str) -> Result<Self, VcsError> {
        let client_name = CLIENT_FIELD
            .captures(spec)
            .map(|c| c[1].to_string())
            .ok_or_else(|| VcsError::UnexpectedOutput {
                command: "p4 client -o".to_string(),
                detail: "could not find Client name in client spec".to_string(),
            })?;

        if let Some(root) = ROOT_FIELD.captures(spec) {
            return Ok(Self::new(client_name, &root[1]));
        }

        let user = client_name
            .split('_')
            .next()
            .filter(|u| !u.is_empty())
            .ok_or_else(|| VcsError::UnexpectedOutput {
                command: "p4 client -o".to_string(),
                detail: format!("could not extract username from client name: {}", client_name),
            })?
            .to_string();
        let root = PathBuf::from(r"C:\Users")
            .join(user)
            .join("Perforce")
            .join(&client_name);
        Ok(Self::new(client_name, root))
    }

    /// `//depot/a/b.mk` -> `<workspace_root>/depot/a/b.mk`.
    pub fn depot_to_local(&self, depot_path: &str) -> Result<PathBuf, VcsError> {
        let rest = depot_path
            .strip_prefix("//")
            .ok_or_else(|| VcsError::InvalidDepotPath(depot_path.to_string()))?;
        let mut local = self.workspace_root.clone();
        for part in rest.split('/').filter(|p| !p.is_empty()) {
            local.push(part);
        }
        Ok(local)
    }

    /// View line mapping `depot_path` into this client.
    pub fn view_line(&self, depot_path: &str) -> String {
        let rest = depot_path.strip_prefix("//").unwrap_or(depot_path);
        format!("\t{}\t//{}/{}", depot_path, self.client_name, rest)
    }

    pub fn root(&self) -> &Path {
        &self.workspace_root
    }
}
