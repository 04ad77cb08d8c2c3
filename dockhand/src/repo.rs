use std::path::{Path, PathBuf};

/// Directory inside a hook repository checkout under which language
/// environments keep their state.
pub const ENVIRONMENTS_DIR: &str = "envs";

/// A hook repository checkout on the local filesystem.
///
/// The checkout is owned by whatever orchestrates dockhand; dockhand reads
/// from it and maintains environment directories underneath it, nothing more.
pub struct RepoCheckout {
    path: PathBuf,
}

impl RepoCheckout {
    pub fn open(path: impl Into<PathBuf>) -> crate::Result<Self> {
        let path = path.into();
        if !path.is_dir() {
            return Err(format!("hook repository {} is not a directory", path.display()).into());
        }
        Ok(Self { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn join(&self, relative: impl AsRef<Path>) -> PathBuf {
        self.path.join(relative)
    }

    pub fn exists(&self, relative: impl AsRef<Path>) -> bool {
        self.join(relative).exists()
    }

    /// Directory whose existence marks the named environment as installed.
    pub fn environment_dir(&self, name: &str) -> PathBuf {
        self.path.join(ENVIRONMENTS_DIR).join(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn open_rejects_paths_that_are_not_directories() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("a-file");
        std::fs::write(&file, "").unwrap();

        assert!(RepoCheckout::open(dir.path()).is_ok());
        assert!(RepoCheckout::open(&file).is_err());
        assert!(RepoCheckout::open(dir.path().join("missing")).is_err());
    }

    #[test]
    fn exists_and_join_resolve_within_the_checkout() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("Dockerfile"), "FROM scratch\n").unwrap();
        let checkout = RepoCheckout::open(dir.path()).unwrap();

        assert!(checkout.exists("Dockerfile"));
        assert!(!checkout.exists("missing-file"));
        assert_eq!(checkout.join("Dockerfile"), dir.path().join("Dockerfile"));
    }

    #[test]
    fn environment_dir_lives_under_the_environments_root() {
        let dir = tempfile::tempdir().unwrap();
        let checkout = RepoCheckout::open(dir.path()).unwrap();

        assert_eq!(
            checkout.environment_dir("docker"),
            dir.path().join("envs").join("docker")
        );
    }
}
