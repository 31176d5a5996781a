use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;

use super::backup::create_backup;
use super::EditError;
use crate::props::{locate, split_eol, synthesize, Category, PropertyMap, Section};

/// What to do with a located section.
#[derive(Debug, Clone, PartialEq)]
pub enum SectionChange {
    /// Make the section's properties equal to the mapping, keeping layout.
    Merge(PropertyMap),
    /// Swap the whole section (header included) for these lines.
    Replace(Vec<String>),
}

/// One section edit: candidate headers tried in order, the first one found
/// is rewritten. No candidate found means the update does nothing.
#[derive(Debug, Clone, PartialEq)]
pub struct SectionUpdate {
    pub candidates: Vec<(String, Vec<String>)>,
    pub change: SectionChange,
}

impl SectionUpdate {
    pub fn new(header: &str, terminators: &[&str], change: SectionChange) -> Self {
        Self {
            candidates: vec![(header.to_string(), owned(terminators))],
            change,
        }
    }

    /// Add a synonym header tried when the earlier ones are absent.
    pub fn or_header(mut self, header: &str, terminators: &[&str]) -> Self {
        self.candidates.push((header.to_string(), owned(terminators)));
        self
    }

    /// All header synonyms of a category, preferred first.
    pub fn for_category(category: Category, change: SectionChange) -> Self {
        let candidates = category
            .headers()
            .iter()
            .map(|spec| (spec.header.to_string(), owned(spec.terminators)))
            .collect();
        Self { candidates, change }
    }

    pub fn primary_header(&self) -> &str {
        self.candidates.first().map(|(h, _)| h.as_str()).unwrap_or("")
    }

    fn locate_in(&self, lines: &[String]) -> Option<(&str, Section)> {
        self.candidates.iter().find_map(|(header, terminators)| {
            let terms: Vec<&str> = terminators.iter().map(String::as_str).collect();
            locate(lines, header, &terms).map(|s| (header.as_str(), s))
        })
    }
}

fn owned(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpdateOutcome {
    Applied { header: String },
    Skipped { header: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditReport {
    pub backup: PathBuf,
    /// Headers that were found and rewritten.
    pub applied: Vec<String>,
    /// Primary headers of updates whose section was absent.
    pub skipped: Vec<String>,
}

impl EditReport {
    pub fn changed_anything(&self) -> bool {
        !self.applied.is_empty()
    }
}

/// Break text into lines that keep their own endings.
pub fn split_lines(content: &str) -> Vec<String> {
    content.split_inclusive('\n').map(str::to_string).collect()
}

pub fn read_lines(path: &Path) -> Result<Vec<String>, EditError> {
    let content = fs::read_to_string(path).map_err(|source| EditError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(split_lines(&content))
}

/// Apply updates in order, each one against the output of the previous one.
pub fn rewrite_lines(mut lines: Vec<String>, updates: &[SectionUpdate]) -> (Vec<String>, Vec<UpdateOutcome>) {
    let mut outcomes = Vec::with_capacity(updates.len());

    for update in updates {
        let Some((header, section)) = update.locate_in(&lines) else {
            tracing::debug!(header = update.primary_header(), "section not found, skipping");
            outcomes.push(UpdateOutcome::Skipped {
                header: update.primary_header().to_string(),
            });
            continue;
        };
        let header = header.to_string();

        let mut replacement = match &update.change {
            SectionChange::Merge(mapping) => synthesize(&lines[section.start..section.end], mapping),
            SectionChange::Replace(block) => block.clone(),
        };

        // whatever follows the section must still start on its own line
        if section.end < lines.len() {
            if let Some(last) = replacement.last_mut() {
                if split_eol(last).1.is_empty() {
                    let eol = split_eol(&lines[section.end - 1]).1;
                    last.push_str(if eol.is_empty() { "\n" } else { eol });
                }
            }
        }

        tracing::debug!(
            header = %header,
            start = section.start,
            old_len = section.len(),
            new_len = replacement.len(),
            "rewriting section"
        );
        lines.splice(section.start..section.end, replacement);
        outcomes.push(UpdateOutcome::Applied { header });
    }

    (lines, outcomes)
}

/// Back up `path`, apply `updates` to its content and write it back.
///
/// Nothing is written when the backup cannot be taken. The new content goes
/// to a temporary file in the same directory that is then renamed over the
/// original, so readers see either the old or the new file.
pub fn apply_section_updates(path: &Path, updates: &[SectionUpdate]) -> Result<EditReport, EditError> {
    let backup = create_backup(path)?;
    let lines = read_lines(path)?;
    let (lines, outcomes) = rewrite_lines(lines, updates);
    write_atomic(path, &lines.concat())?;

    let mut report = EditReport {
        backup,
        applied: Vec::new(),
        skipped: Vec::new(),
    };
    for outcome in outcomes {
        match outcome {
            UpdateOutcome::Applied { header } => report.applied.push(header),
            UpdateOutcome::Skipped { header } => report.skipped.push(header),
        }
    }
    Ok(report)
}

pub fn write_atomic(path: &Path, content: &str) -> Result<(), EditError> {
    let write_err = |source: std::io::Error| EditError::Write {
        path: path.to_path_buf(),
        source,
    };

    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    let mut tmp = NamedTempFile::new_in(dir).map_err(write_err)?;
    tmp.write_all(content.as_bytes()).map_err(write_err)?;
    tmp.as_file().sync_all().map_err(write_err)?;
    if let Ok(meta) = fs::metadata(path) {
        fs::set_permissions(tmp.path(), meta.permissions()).map_err(write_err)?;
    }
    tmp.persist(path).map_err(|e| write_err(e.error))?;
    Ok(())
}
