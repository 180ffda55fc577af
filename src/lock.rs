use log::{debug, warn};
use std::fs::OpenOptions;
use std::io::{Error, ErrorKind};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Held while a command mutates the state file. The lock file is removed on drop.
#[derive(Debug)]
pub struct StateLock {
    path: PathBuf,
}

impl StateLock {
    pub fn acquire(path: impl AsRef<Path>) -> Result<Self, Error> {
        let path = path.as_ref().to_path_buf();
        match OpenOptions::new().write(true).create_new(true).open(&path) {
            Ok(_) => {
                debug!("Acquired lock {}", path.display());
                Ok(Self { path })
            }
            Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                Err(Error::new(ErrorKind::AlreadyExists, format!("Lock file {} already exists", path.display())))
            }
            Err(e) => Err(e),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for StateLock {
    fn drop(&mut self) {
        if let Err(e) = remove_lock_file_at(&self.path) {
            warn!("Failed to remove lock file {}: {}", self.path.display(), e);
        }
    }
}

pub fn check_lock_file_at(path: &Path) -> bool {
    path.exists()
}

pub fn remove_lock_file_at(path: &Path) -> Result<(), Error> {
    if path.exists() {
        std::fs::remove_file(path)
    } else {
        Ok(())
    }
}

/// Blocks until no one holds the lock at `path`.
pub async fn wait_for_release(path: &Path, poll: Duration) {
    while check_lock_file_at(path) {
        debug!("Waiting for lock {} to be released", path.display());
        tokio::time::sleep(poll).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use tempfile::TempDir;

    const LOCK_FILE: &str = "hackhub.lock";

    #[test]
    fn test_acquire_creates_and_drop_removes() {
        let temp_dir = TempDir::new().unwrap();
        let lock_path = temp_dir.path().join(LOCK_FILE);

        {
            let lock = StateLock::acquire(&lock_path).unwrap();
            assert!(lock.path().exists());
        }
        assert!(!lock_path.exists());
    }

    #[test]
    fn test_acquire_fails_when_held() {
        let temp_dir = TempDir::new().unwrap();
        let lock_path = temp_dir.path().join(LOCK_FILE);

        let _held = StateLock::acquire(&lock_path).unwrap();
        let result = StateLock::acquire(&lock_path);
        assert_eq!(result.unwrap_err().kind(), ErrorKind::AlreadyExists);
    }

    #[test]
    fn test_acquire_over_directory_fails() {
        let temp_dir = TempDir::new().unwrap();
        let lock_path = temp_dir.path().join(LOCK_FILE);
        std::fs::create_dir(&lock_path).unwrap();

        let result = StateLock::acquire(&lock_path);
        assert!(matches!(result.unwrap_err().kind(),
            ErrorKind::PermissionDenied | ErrorKind::AlreadyExists
        ));
    }

    #[test]
    fn test_remove_missing_lock_is_ok() {
        let temp_dir = TempDir::new().unwrap();
        let lock_path = temp_dir.path().join(LOCK_FILE);
        assert!(remove_lock_file_at(&lock_path).is_ok());
        assert!(!check_lock_file_at(&lock_path));
    }

    #[tokio::test]
    async fn test_wait_for_release() {
        let temp_dir = TempDir::new().unwrap();
        let lock_path = temp_dir.path().join(LOCK_FILE);
        File::create(&lock_path).unwrap();

        let waiter_path = lock_path.clone();
        let waiter = tokio::spawn(async move {
            wait_for_release(&waiter_path, Duration::from_millis(5)).await;
        });
        tokio::time::sleep(Duration::from_millis(20)).await;
        remove_lock_file_at(&lock_path).unwrap();
        waiter.await.unwrap();
    }
}
