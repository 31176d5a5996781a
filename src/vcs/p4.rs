use std::io::Write;
use std::path::PathBuf;
use std::process::{Command, Stdio};

use once_cell::sync::Lazy;
use regex::Regex;

use super::workspace::WorkspaceConfig;
use super::{VcsError, VersionControl};

const DESCRIPTION_PLACEHOLDER: &str = "<enter description here>";

static CHANGE_NUMBER: Lazy<Regex> = Lazy::new(|| Regex::new(r"Change (\d+)").unwrap());

/// `VersionControl` backed by the `p4` command line client.
pub struct P4Client {
    program: Vec<String>,
    workspace: Option<WorkspaceConfig>,
}

impl P4Client {
    /// `command` is the shell-style prefix used for every call, e.g.
    /// `p4` or `p4 -p ssl:perforce:1666 -u builder`.
    pub fn new(command: &str, workspace: Option<WorkspaceConfig>) -> Result<Self, VcsError> {
        let program = shlex::split(command)
            .filter(|parts| !parts.is_empty())
            .ok_or_else(|| VcsError::InvalidCommand(command.to_string()))?;
        Ok(Self { program, workspace })
    }

    /// Create a client and read the workspace identity from `p4 client -o`.
    pub fn discover(command: &str) -> Result<Self, VcsError> {
        let mut client = Self::new(command, None)?;
        let spec = client.run(&["client", "-o"], None)?;
        let workspace = WorkspaceConfig::from_client_spec(&spec)?;
        tracing::info!(
            client = %workspace.client_name,
            root = %workspace.workspace_root.display(),
            "workspace discovered"
        );
        client.workspace = Some(workspace);
        Ok(client)
    }

    fn configured(&self) -> Result<&WorkspaceConfig, VcsError> {
        self.workspace.as_ref().ok_or(VcsError::NotConfigured)
    }

    fn display_command(&self, args: &[&str]) -> String {
        let parts = self.program.iter().map(String::as_str).chain(args.iter().copied());
        shlex::try_join(parts).unwrap_or_else(|_| {
            let mut all = self.program.clone();
            all.extend(args.iter().map(|s| s.to_string()));
            all.join(" ")
        })
    }

    /// Run one p4 command, optionally feeding `input` on stdin. A non-zero
    /// exit status becomes `VcsError::CommandFailed` carrying stderr.
    fn run(&mut self, args: &[&str], input: Option<&str>) -> Result<String, VcsError> {
        let (stdout, stderr, success) = self.exec(args, input)?;
        if !success {
            return Err(VcsError::CommandFailed {
                command: self.display_command(args),
                stderr: stderr.trim().to_string(),
            });
        }
        Ok(stdout.trim().to_string())
    }

    fn exec(&mut self, args: &[&str], input: Option<&str>) -> Result<(String, String, bool), VcsError> {
        let command = self.display_command(args);
        tracing::debug!(%command, "running");

        let mut child = Command::new(&self.program[0])
            .args(&self.program[1..])
            .args(args)
            .stdin(if input.is_some() { Stdio::piped() } else { Stdio::null() })
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|source| VcsError::Spawn {
                command: command.clone(),
                source,
            })?;

        if let Some(text) = input {
            if let Some(mut stdin) = child.stdin.take() {
                stdin.write_all(text.as_bytes()).map_err(|source| VcsError::Spawn {
                    command: command.clone(),
                    source,
                })?;
            }
        }

        let output = child
            .wait_with_output()
            .map_err(|source| VcsError::Spawn { command, source })?;
        Ok((
            String::from_utf8_lossy(&output.stdout).to_string(),
            String::from_utf8_lossy(&output.stderr).to_string(),
            output.status.success(),
        ))
    }
}

impl VersionControl for P4Client {
    fn path_exists(&mut self, depot_path: &str) -> bool {
        match self.exec(&["files", depot_path], None) {
            Ok((_, stderr, success)) => success && !stderr.to_lowercase().contains("no such file"),
            Err(e) => {
                tracing::warn!(error = %e, "p4 files failed");
                false
            }
        }
    }

    fn create_changelist(&mut self, description: &str) -> Result<String, VcsError> {
        let spec = self.run(&["change", "-o"], None)?;
        let filled = fill_change_description(&spec, description);
        let result = self.run(&["change", "-i"], Some(&filled))?;
        parse_change_number(&result).ok_or_else(|| VcsError::UnexpectedOutput {
            command: "p4 change -i".to_string(),
            detail: result.clone(),
        })
    }

    fn map_workspace_paths(&mut self, depot_paths: &[&str]) -> Result<(), VcsError> {
        let workspace = self.configured()?.clone();
        let spec = self.run(&["client", "-o"], None)?;
        let remapped = remap_client_view(&spec, &workspace, depot_paths);
        self.run(&["client", "-i"], Some(&remapped))?;
        Ok(())
    }

    fn sync(&mut self, depot_path: &str) -> Result<(), VcsError> {
        self.run(&["sync", depot_path], None).map(|_| ())
    }

    fn checkout_for_edit(&mut self, depot_path: &str, changelist: &str) -> Result<(), VcsError> {
        self.run(&["edit", "-c", changelist, depot_path], None).map(|_| ())
    }

    fn local_path(&self, depot_path: &str) -> Result<PathBuf, VcsError> {
        self.configured()?.depot_to_local(depot_path)
    }

    fn workspace(&self) -> Option<&WorkspaceConfig> {
        self.workspace.as_ref()
    }
}

/// Put `description` where `p4 change -o` leaves its placeholder.
pub fn fill_change_description(spec: &str, description: &str) -> String {
    spec.replace(DESCRIPTION_PLACEHOLDER, description)
}

/// Changelist number out of `p4 change -i` output (`Change 123 created.`).
pub fn parse_change_number(output: &str) -> Option<String> {
    CHANGE_NUMBER.captures(output).map(|c| c[1].to_string())
}

/// Drop every client spec line mentioning one of `depot_paths`, then append a
/// fresh view line for each of them.
pub fn remap_client_view(spec: &str, workspace: &WorkspaceConfig, depot_paths: &[&str]) -> String {
    let mut lines: Vec<String> = spec
        .lines()
        .filter(|line| !depot_paths.iter().any(|p| line.contains(p)))
        .map(str::to_string)
        .collect();
    lines.extend(depot_paths.iter().map(|p| workspace.view_line(p)));
    lines.join("\n")
}
