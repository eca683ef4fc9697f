// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Crash-safe file replacement.
//
// Contents go to a hidden sibling temp file which is fsynced and then renamed
// over the target.  A reader therefore sees either the old file or the
// complete new one, never a truncated write.

use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tracing::debug;

/// A fully written temp file waiting to be renamed over its target.
///
/// Dropping an uncommitted `StagedFile` removes the temp file.
#[derive(Debug)]
pub struct StagedFile {
    temp: PathBuf,
    target: PathBuf,
    committed: bool,
}

impl StagedFile {
    /// Write `contents` next to `target` without touching `target` itself.
    ///
    /// Creates the parent directory if needed.
    pub fn write(target: &Path, contents: &[u8]) -> io::Result<Self> {
        if let Some(dir) = target.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir)?;
        }

        let staged = Self {
            temp: temp_path(target),
            target: target.to_path_buf(),
            committed: false,
        };

        // On error `staged` is dropped and the partial temp file removed.
        let mut file = File::create(&staged.temp)?;
        file.write_all(contents)?;
        file.sync_all()?;

        debug!(target = %target.display(), bytes = contents.len(), "staged file");
        Ok(staged)
    }

    pub fn target(&self) -> &Path {
        &self.target
    }

    /// Where the contents sit until [`commit`](Self::commit).
    pub fn temp(&self) -> &Path {
        &self.temp
    }

    /// Rename the temp file over the target.
    pub fn commit(mut self) -> io::Result<()> {
        fs::rename(&self.temp, &self.target)?;
        self.committed = true;
        Ok(())
    }
}

impl Drop for StagedFile {
    fn drop(&mut self) {
        if !self.committed {
            let _ = fs::remove_file(&self.temp);
        }
    }
}

/// Replace `target` with `contents` in one step.
pub fn write_atomic(target: &Path, contents: &[u8]) -> io::Result<()> {
    StagedFile::write(target, contents)?.commit()
}

fn temp_path(target: &Path) -> PathBuf {
    let name = target
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    target.with_file_name(format!(".{name}.tmp"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn write_atomic_replaces_and_leaves_no_temp() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("nested").join("general.cfg");

        write_atomic(&target, b"{\"a\":1}").unwrap();
        write_atomic(&target, b"{\"a\":2}").unwrap();

        assert_eq!(fs::read(&target).unwrap(), b"{\"a\":2}");
        let names: Vec<_> = fs::read_dir(target.parent().unwrap())
            .unwrap()
            .map(|e| e.unwrap().file_name())
            .collect();
        assert_eq!(names, vec![std::ffi::OsString::from("general.cfg")]);
    }

    #[test]
    fn dropped_stage_keeps_old_contents() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("display.cfg");
        fs::write(&target, b"old").unwrap();

        let staged = StagedFile::write(&target, b"new").unwrap();
        assert_eq!(staged.target(), target.as_path());
        assert_eq!(fs::read(staged.temp()).unwrap(), b"new");
        drop(staged);

        assert_eq!(fs::read(&target).unwrap(), b"old");
        assert!(!temp_path(&target).exists());
    }
}
