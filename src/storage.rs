//! Scratch storage for uploads and rendered stills.
//!
//! [`ScratchSpace`] owns two directories: one for the temporary copy of each
//! uploaded video and one for the images produced from it. Every path it
//! hands out carries a random v4 UUID, so concurrent extractions sharing the
//! same directories never collide and need no coordination.
//!
//! Deletion is always best effort. [`TempFile`] removes its file when
//! dropped, and [`sweep_older_than`] clears out old leftovers; neither ever
//! reports a failure to the caller.

use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use uuid::Uuid;

use crate::error::KeepshotError;
use crate::render::ImageFormat;

/// Directory layout for temporary videos and rendered images.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScratchSpace {
    temp_dir: PathBuf,
    output_dir: PathBuf,
}

impl ScratchSpace {
    pub fn new<T: Into<PathBuf>, O: Into<PathBuf>>(temp_dir: T, output_dir: O) -> Self {
        Self {
            temp_dir: temp_dir.into(),
            output_dir: output_dir.into(),
        }
    }

    /// Use `root/temp` for uploads and `root/screenshots` for images.
    pub fn in_directory<P: AsRef<Path>>(root: P) -> Self {
        let root = root.as_ref();
        Self::new(root.join("temp"), root.join("screenshots"))
    }

    pub fn temp_dir(&self) -> &Path {
        &self.temp_dir
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// A fresh, unused path in the temp directory.
    ///
    /// `extension` is appended when it is a short alphanumeric string;
    /// anything else is dropped.
    pub fn unique_temp_path(&self, extension: Option<&str>) -> PathBuf {
        let mut name = Uuid::new_v4().simple().to_string();
        if let Some(extension) = extension.filter(|ext| is_safe_extension(ext)) {
            name.push('.');
            name.push_str(extension);
        }
        self.temp_dir.join(name)
    }

    /// A fresh path in the output directory, named
    /// `{prefix}_{uuid}.{ext}` or `{prefix}_{uuid}_{ordinal}.{ext}`.
    pub fn unique_output_path(
        &self,
        prefix: &str,
        ordinal: Option<usize>,
        format: ImageFormat,
    ) -> PathBuf {
        let id = Uuid::new_v4().simple();
        let name = match ordinal {
            Some(ordinal) => format!("{prefix}_{id}_{ordinal}.{}", format.extension()),
            None => format!("{prefix}_{id}.{}", format.extension()),
        };
        self.output_dir.join(name)
    }

    /// Create the output directory if it does not exist.
    pub fn ensure_output_dir(&self) -> Result<(), KeepshotError> {
        fs::create_dir_all(&self.output_dir)?;
        Ok(())
    }

    /// Write `bytes` to a new file in the temp directory.
    ///
    /// The returned guard deletes the file when dropped. If writing fails
    /// part-way, the partial file is removed before the error is returned.
    pub fn write_temp(&self, bytes: &[u8], extension: Option<&str>) -> Result<TempFile, KeepshotError> {
        fs::create_dir_all(&self.temp_dir)?;

        let path = self.unique_temp_path(extension);
        let mut file = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)?;
        let guard = TempFile { path };

        file.write_all(bytes)?;
        file.flush()?;

        log::debug!(
            "Stored {} byte upload at {}",
            bytes.len(),
            guard.path.display()
        );
        Ok(guard)
    }
}

/// A temporary file that is deleted, best effort, when dropped.
#[derive(Debug)]
#[must_use]
pub struct TempFile {
    path: PathBuf,
}

impl TempFile {
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for TempFile {
    fn drop(&mut self) {
        remove_quietly(&self.path);
    }
}

/// Delete `path`, logging and ignoring any failure.
///
/// Returns `true` if the file was removed.
pub fn remove_quietly(path: &Path) -> bool {
    match fs::remove_file(path) {
        Ok(()) => true,
        Err(error) if error.kind() == ErrorKind::NotFound => false,
        Err(error) => {
            log::warn!("Could not delete {}: {error}", path.display());
            false
        }
    }
}

/// Delete regular files in `directory` last modified more than `max_age`
/// ago. Subdirectories are left alone.
///
/// Errors are logged and skipped. Returns the number of files removed.
pub fn sweep_older_than<P: AsRef<Path>>(directory: P, max_age: Duration) -> usize {
    let directory = directory.as_ref();
    let entries = match fs::read_dir(directory) {
        Ok(entries) => entries,
        Err(error) => {
            if error.kind() != ErrorKind::NotFound {
                log::warn!("Could not sweep {}: {error}", directory.display());
            }
            return 0;
        }
    };

    let now = SystemTime::now();
    let mut removed = 0;

    for entry in entries.flatten() {
        let Ok(metadata) = entry.metadata() else {
            continue;
        };
        if !metadata.is_file() {
            continue;
        }

        let age = metadata
            .modified()
            .ok()
            .and_then(|modified| now.duration_since(modified).ok());

        if age.is_some_and(|age| age > max_age) && remove_quietly(&entry.path()) {
            removed += 1;
        }
    }

    if removed > 0 {
        log::debug!("Swept {removed} stale file(s) from {}", directory.display());
    }
    removed
}

fn is_safe_extension(extension: &str) -> bool {
    !extension.is_empty()
        && extension.len() <= 10
        && extension.bytes().all(|byte| byte.is_ascii_alphanumeric())
}
