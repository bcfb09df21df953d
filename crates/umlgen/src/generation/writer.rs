//! Atomic file writes and timestamped backups
//!
//! Every write in the generation pipeline goes through [`FileWriter`]: the
//! content lands in a temporary file in the target directory and is renamed
//! into place on commit, so an interrupted run leaves either the old file or
//! the new one, never a truncated mix.

use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use chrono::{Local, NaiveDateTime};
use tempfile::NamedTempFile;
use tracing::debug;

use crate::core::{Result, UmlGenError};

/// Directory, next to the original, that holds backups
pub const BACKUP_DIR: &str = ".backups";

/// A staged write; dropping it without [`StagedFile::commit`] discards it
#[derive(Debug)]
pub struct StagedFile {
    temp: NamedTempFile,
    path: PathBuf,
}

impl StagedFile {
    pub fn write_all(&mut self, contents: &[u8]) -> Result<()> {
        self.temp
            .write_all(contents)
            .and_then(|_| self.temp.flush())
            .map_err(|err| UmlGenError::io(self.temp.path(), err))
    }

    /// Rename the staged content over the destination
    pub fn commit(self) -> Result<PathBuf> {
        let path = self.path;
        self.temp
            .persist(&path)
            .map_err(|err| UmlGenError::io(&path, err.error))?;
        debug!(path = %path.display(), "Committed file");
        Ok(path)
    }
}

#[derive(Debug, Clone, Default)]
pub struct FileWriter;

impl FileWriter {
    pub fn new() -> Self {
        Self
    }

    /// Start a write to `path`, creating its directory if needed
    pub fn stage(&self, path: &Path) -> Result<StagedFile> {
        let dir = parent_dir(path);
        fs::create_dir_all(dir).map_err(|err| UmlGenError::io(dir, err))?;
        let temp = NamedTempFile::new_in(dir).map_err(|err| UmlGenError::io(dir, err))?;
        Ok(StagedFile {
            temp,
            path: path.to_path_buf(),
        })
    }

    /// Write `contents` to `path` atomically
    pub fn write(&self, path: &Path, contents: &str) -> Result<()> {
        let mut staged = self.stage(path)?;
        staged.write_all(contents.as_bytes())?;
        staged.commit()?;
        Ok(())
    }

    /// Copy `path` into its sibling backup directory, stamped with the
    /// current local time
    pub fn backup(&self, path: &Path) -> Result<PathBuf> {
        self.backup_at(path, Local::now().naive_local())
    }

    /// Copy `path` to `.backups/<name>_<YYYYMMDD_HHMMSS>.bak`, adding `_N`
    /// when that name is already taken
    pub fn backup_at(&self, path: &Path, at: NaiveDateTime) -> Result<PathBuf> {
        let contents = fs::read(path).map_err(|err| UmlGenError::io(path, err))?;
        let dir = parent_dir(path).join(BACKUP_DIR);
        fs::create_dir_all(&dir).map_err(|err| UmlGenError::io(&dir, err))?;

        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "file".to_string());
        let stamp = at.format("%Y%m%d_%H%M%S");

        let mut attempt = 0usize;
        loop {
            let file_name = match attempt {
                0 => format!("{}_{}.bak", name, stamp),
                n => format!("{}_{}_{}.bak", name, stamp, n),
            };
            let backup = dir.join(file_name);
            match OpenOptions::new().write(true).create_new(true).open(&backup) {
                Ok(mut file) => {
                    file.write_all(&contents)
                        .map_err(|err| UmlGenError::io(&backup, err))?;
                    debug!(backup = %backup.display(), "Backed up file");
                    return Ok(backup);
                }
                Err(err) if err.kind() == ErrorKind::AlreadyExists => attempt += 1,
                Err(err) => return Err(UmlGenError::io(&backup, err)),
            }
        }
    }
}

fn parent_dir(path: &Path) -> &Path {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn stamp() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, 9)
            .and_then(|d| d.and_hms_opt(14, 5, 7))
            .unwrap()
    }

    #[test]
    fn test_write_creates_directories() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("src/entity/Order.java");
        FileWriter::new().write(&path, "class Order {}\n").unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "class Order {}\n");
    }

    #[test]
    fn test_dropped_stage_leaves_original() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("Order.java");
        fs::write(&path, "old").unwrap();
        {
            let mut staged = FileWriter::new().stage(&path).unwrap();
            staged.write_all(b"new").unwrap();
        }
        assert_eq!(fs::read_to_string(&path).unwrap(), "old");
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[test]
    fn test_backup_naming_and_collisions() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("Order.java");
        fs::write(&path, "original").unwrap();
        let writer = FileWriter::new();

        let first = writer.backup_at(&path, stamp()).unwrap();
        let second = writer.backup_at(&path, stamp()).unwrap();
        assert_eq!(
            first,
            dir.path().join(".backups/Order.java_20240309_140507.bak")
        );
        assert_eq!(
            second,
            dir.path().join(".backups/Order.java_20240309_140507_1.bak")
        );
        assert_eq!(fs::read_to_string(first).unwrap(), "original");
    }
}
