//! Scoped temporary storage.
//!
//! A [`StorageDir`] owns a freshly created directory and removes it with all
//! its content when dropped. Every [`TempFile`] keeps its directory alive and
//! removes its own file when dropped.

use std::fs::{self, File, OpenOptions};
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use tracing::{debug, warn};

use super::errors::EioError;

#[derive(Debug)]
pub struct StorageDir {
    path: PathBuf,
    counter: AtomicU64,
}

impl StorageDir {
    /// Creates a new uniquely named directory inside `parent`.
    ///
    /// # Errors
    ///
    /// Returns `EioError::Io` if `parent` is not a writable directory.
    pub fn create_in(parent: impl AsRef<Path>) -> Result<Arc<Self>, EioError> {
        let parent = parent.as_ref();
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_nanos())
            .unwrap_or_default();

        let mut attempt = 0u32;
        loop {
            let name = format!("mixnet-arithm-{}-{:x}-{}", std::process::id(), nanos, attempt);
            let path = parent.join(name);
            match fs::create_dir(&path) {
                Ok(()) => {
                    debug!(path = %path.display(), "created storage directory");
                    return Ok(Arc::new(StorageDir {
                        path,
                        counter: AtomicU64::new(0),
                    }));
                }
                Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists && attempt < 64 => {
                    attempt += 1;
                }
                Err(e) => return Err(e.into()),
            }
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reserves a new file name. The file is not created.
    pub fn temp_file(self: &Arc<Self>) -> TempFile {
        let n = self.counter.fetch_add(1, Ordering::Relaxed);
        TempFile {
            path: self.path.join(format!("{:08x}.bt", n)),
            _dir: Arc::clone(self),
        }
    }
}

impl Drop for StorageDir {
    fn drop(&mut self) {
        if let Err(e) = fs::remove_dir_all(&self.path) {
            if e.kind() != std::io::ErrorKind::NotFound {
                warn!(path = %self.path.display(), error = %e, "failed to remove storage directory");
            }
        }
    }
}

/// A file inside a [`StorageDir`] that is removed on drop.
#[derive(Debug)]
pub struct TempFile {
    path: PathBuf,
    _dir: Arc<StorageDir>,
}

impl TempFile {
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn create(&self) -> Result<BufWriter<File>, EioError> {
        let file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(&self.path)?;
        Ok(BufWriter::new(file))
    }

    pub fn open(&self) -> Result<BufReader<File>, EioError> {
        Ok(BufReader::new(File::open(&self.path)?))
    }
}

impl Drop for TempFile {
    fn drop(&mut self) {
        if let Err(e) = fs::remove_file(&self.path) {
            if e.kind() != std::io::ErrorKind::NotFound {
                warn!(path = %self.path.display(), error = %e, "failed to remove temporary file");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Read, Write};

    #[test]
    fn test_files_and_directory_are_removed() -> Result<(), EioError> {
        let dir = StorageDir::create_in(std::env::temp_dir())?;
        let dir_path = dir.path().to_path_buf();

        let file = dir.temp_file();
        let file_path = file.path().to_path_buf();
        {
            let mut out = file.create()?;
            out.write_all(b"bytes")?;
        }
        let mut content = String::new();
        file.open()?.read_to_string(&mut content)?;
        assert_eq!(content, "bytes");

        drop(dir);
        assert!(dir_path.exists());
        drop(file);
        assert!(!file_path.exists());
        assert!(!dir_path.exists());
        Ok(())
    }
}
