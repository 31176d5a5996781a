use std::fs::{self, File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};

use chrono::Local;

use super::EditError;

const BACKUP_STAMP: &str = "%Y%m%d_%H%M%S";
const MAX_SAME_STAMP: u32 = 1000;

/// `<path>.bak_<YYYYMMDD_HHMMSS>` for the current local time.
pub fn backup_path(path: &Path) -> PathBuf {
    let stamp = Local::now().format(BACKUP_STAMP);
    let mut name = path.as_os_str().to_os_string();
    name.push(format!(".bak_{}", stamp));
    PathBuf::from(name)
}

/// Copy `path` next to itself under a timestamped name. An existing backup
/// is never overwritten: a second backup within the same second gets a
/// `_1`, `_2`, ... suffix.
pub fn create_backup(path: &Path) -> Result<PathBuf, EditError> {
    copy_to_fresh(path).map_err(|source| EditError::Backup {
        path: path.to_path_buf(),
        source,
    })
}

fn copy_to_fresh(path: &Path) -> io::Result<PathBuf> {
    let mut source = File::open(path)?;
    let permissions = source.metadata()?.permissions();
    let (mut target, backup) = create_unique(&backup_path(path))?;
    io::copy(&mut source, &mut target)?;
    target.sync_all()?;
    fs::set_permissions(&backup, permissions)?;
    tracing::debug!(file = %path.display(), backup = %backup.display(), "backup written");
    Ok(backup)
}

fn create_unique(base: &Path) -> io::Result<(File, PathBuf)> {
    for n in 0..MAX_SAME_STAMP {
        let candidate = if n == 0 {
            base.to_path_buf()
        } else {
            let mut name = base.as_os_str().to_os_string();
            name.push(format!("_{}", n));
            PathBuf::from(name)
        };
        match OpenOptions::new().write(true).create_new(true).open(&candidate) {
            Ok(file) => return Ok((file, candidate)),
            Err(err) if err.kind() == io::ErrorKind::AlreadyExists => continue,
            Err(err) => return Err(err),
        }
    }
    Err(io::Error::new(
        io::ErrorKind::AlreadyExists,
        format!("too many backups named {}", base.display()),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backup_name_shape() {
        let p = backup_path(Path::new("/tmp/device.mk"));
        let name = p.file_name().unwrap().to_string_lossy().to_string();
        assert!(name.starts_with("device.mk.bak_"));
        let stamp = &name["device.mk.bak_".len()..];
        assert_eq!(stamp.len(), 15);
        assert_eq!(&stamp[8..9], "_");
        assert!(stamp.chars().filter(|c| *c != '_').all(|c| c.is_ascii_digit()));
    }

    #[test]
    fn test_second_backup_never_overwrites_the_first() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("device.mk");
        fs::write(&path, "a=1\n").unwrap();
        let first = create_backup(&path).unwrap();
        fs::write(&path, "a=2\n").unwrap();
        let second = create_backup(&path).unwrap();

        assert_ne!(first, second);
        assert_eq!(fs::read_to_string(&first).unwrap(), "a=1\n");
        assert_eq!(fs::read_to_string(&second).unwrap(), "a=2\n");
    }

    #[test]
    fn test_taken_name_gets_a_counter() {
        let dir = tempfile::tempdir().unwrap();
        let base = dir.path().join("device.mk.bak_20261017_075903");
        fs::write(&base, "old").unwrap();
        let (_, path) = create_unique(&base).unwrap();
        assert_eq!(path, dir.path().join("device.mk.bak_20261017_075903_1"));
        assert_eq!(fs::read_to_string(&base).unwrap(), "old");
    }

    #[test]
    fn test_backup_of_missing_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        let err = create_backup(&dir.path().join("absent.mk")).unwrap_err();
        assert!(matches!(err, EditError::Backup { .. }));
    }
}
