use std::path::PathBuf;

use log::warn;

/// Removes a directory tree on drop unless [`CleanupGuard::keep`] was called.
///
/// Used to make multi-step setup all-or-nothing: create the directory, arm the
/// guard, run the fallible steps, then keep the directory. If any step bails
/// out early the partially-initialized directory is deleted again.
pub struct CleanupGuard {
    path: PathBuf,
    armed: bool,
}

impl CleanupGuard {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            armed: true,
        }
    }

    /// Defuses the guard, keeping the directory.
    pub fn keep(mut self) {
        self.armed = false;
    }
}

impl Drop for CleanupGuard {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        if let Err(error) = std::fs::remove_dir_all(&self.path) {
            if error.kind() != std::io::ErrorKind::NotFound {
                warn!(
                    "failed to clean up {path}: {error}",
                    path = self.path.display()
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dropping_an_armed_guard_removes_the_directory_tree() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("env");
        std::fs::create_dir_all(target.join("nested")).unwrap();
        std::fs::write(target.join("nested").join("state"), "x").unwrap();

        let guard = CleanupGuard::new(&target);
        drop(guard);

        assert!(!target.exists());
    }

    #[test]
    fn keep_preserves_the_directory() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("env");
        std::fs::create_dir(&target).unwrap();

        CleanupGuard::new(&target).keep();

        assert!(target.exists());
    }

    #[test]
    fn dropping_a_guard_for_a_missing_path_is_silent() {
        let dir = tempfile::tempdir().unwrap();
        drop(CleanupGuard::new(dir.path().join("never-created")));
    }
}
