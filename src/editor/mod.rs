mod backup;
mod driver;

use std::io;
use std::path::PathBuf;

use thiserror::Error;

pub use backup::{backup_path, create_backup};
pub use driver::{
    apply_section_updates, read_lines, rewrite_lines, split_lines, write_atomic, EditReport,
    SectionChange, SectionUpdate, UpdateOutcome,
};

#[derive(Debug, Error)]
pub enum EditError {
    #[error("failed to back up {}: {source}", .path.display())]
    Backup { path: PathBuf, source: io::Error },
    #[error("failed to read {}: {source}", .path.display())]
    Read { path: PathBuf, source: io::Error },
    #[error("failed to write {}: {source}", .path.display())]
    Write { path: PathBuf, source: io::Error },
}
