mod docker;

pub use docker::*;

use std::{
    error::Error,
    fmt,
    path::{Path, PathBuf},
};

use clap::ValueEnum;

use crate::{manifest::Hook, repo::RepoCheckout};

/// The only supported runtime version selector. Container hooks pin their
/// runtime through the build file, so selecting a version does not apply.
pub const DEFAULT_VERSION: &str = "default";

pub struct InstallArgs<'a> {
    pub checkout: &'a RepoCheckout,
    pub language_version: &'a str,
}

#[derive(Debug)]
pub struct InstallOutput {
    /// Marker directory whose existence signals the environment is installed.
    pub environment_dir: PathBuf,
    pub image_id: String,
}

pub struct RunArgs<'a> {
    pub checkout: &'a RepoCheckout,
    pub hook: &'a Hook,
    pub files: &'a [String],
    /// Host directory mounted into the container for the hook to operate on.
    pub work_dir: &'a Path,
    pub rebuild: RebuildPolicy,
}

/// Result of running a hook. A non-zero code is the hook's normal way of
/// signaling that it found problems, not an error.
pub struct RunOutput {
    /// Worst exit code across all engine invocations of the batch.
    pub code: i32,
    /// Concatenated stdout and stderr of the invocations, in order.
    pub output: Vec<u8>,
}

/// When `run` (re)builds the hook image.
#[derive(Debug, Default, Clone, Copy, ValueEnum, PartialEq, Eq)]
pub enum RebuildPolicy {
    /// Rebuild before every run. The engine's build cache makes unchanged
    /// rebuilds cheap, and it heals images removed by external cleanup.
    #[default]
    Always,
    /// Only build when the image is absent from the local image store.
    IfMissing,
}

pub trait HookBackend {
    /// One-time preparation of a hook repository's execution environment.
    /// All-or-nothing: on failure no marker directory is left behind.
    fn install_environment(&self, args: InstallArgs) -> Result<InstallOutput, BackendError>;

    /// Runs one hook over a batch of files, splitting the batch across engine
    /// invocations as command-line length demands.
    fn run_hook(&self, args: RunArgs) -> Result<RunOutput, BackendError>;
}

#[derive(Debug)]
pub enum BackendError {
    /// The checkout has no build file to construct the hook image from.
    MissingBuildFile { path: PathBuf },
    /// A runtime version other than [`DEFAULT_VERSION`] was requested.
    UnsupportedVersion { requested: String },
    /// The engine binary works but its daemon did not answer the probe.
    EngineUnavailable { program: String },
    /// The engine's build subcommand failed.
    Build(Box<dyn Error + Send + Sync>),
    /// An engine `run` invocation could not be executed at all.
    Run(Box<dyn Error + Send + Sync>),
    Other(Box<dyn Error + Send + Sync>),
}

impl fmt::Display for BackendError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BackendError::MissingBuildFile { path } => {
                write!(
                    f,
                    "no build file was found in the hook repository (expected {path})",
                    path = path.display()
                )
            }
            BackendError::UnsupportedVersion { requested } => {
                write!(
                    f,
                    "container hooks do not support language_version (requested {requested:?}, only {DEFAULT_VERSION:?} is supported)"
                )
            }
            BackendError::EngineUnavailable { program } => {
                write!(
                    f,
                    "the container engine `{program}` is either not running or not configured in this environment"
                )
            }
            BackendError::Build(e) => write!(f, "failed to build the hook image: {e}"),
            BackendError::Run(e) => write!(f, "failed to run the hook container: {e}"),
            BackendError::Other(e) => e.fmt(f),
        }
    }
}

impl Error for BackendError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            BackendError::Build(e) | BackendError::Run(e) | BackendError::Other(e) => {
                Some(e.as_ref())
            }
            _ => None,
        }
    }
}

impl From<command_partition::ArgumentTooLong> for BackendError {
    fn from(error: command_partition::ArgumentTooLong) -> Self {
        BackendError::Other(Box::new(error))
    }
}
