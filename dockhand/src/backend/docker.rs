use std::ffi::OsStr;

use log::debug;
use sha2::{Digest, Sha256};

use super::{
    BackendError, HookBackend, InstallArgs, InstallOutput, RebuildPolicy, RunArgs, RunOutput,
    DEFAULT_VERSION,
};
use crate::{
    cleanup::CleanupGuard,
    engine::{BuildImageArgs, BuildImageOutput, Engine, RunOptions},
    process,
    repo::RepoCheckout,
};

/// Build file expected at the root of a hook repository checkout.
pub const BUILD_FILE: &str = "Dockerfile";

/// Name of the marker directory under the checkout's environments root.
pub const ENVIRONMENT_DIR: &str = "docker";

/// Label attached to every image dockhand builds, so they can be listed and
/// cleaned up later.
pub const IMAGE_LABEL: &str = "DOCKHAND";

const TAG_PREFIX: &str = "dockhand-";

pub struct DockerBackend<'a> {
    pub engine: &'a Engine<'a>,
}

/// Tag of the image built from `checkout`, derived from the checkout
/// directory's base name. Stable for a given name, distinct between names,
/// and all lowercase as image tags require.
pub fn image_tag(checkout: &RepoCheckout) -> String {
    let path = checkout.path();
    let name = path.file_name().unwrap_or(path.as_os_str());
    let digest = Sha256::digest(name.to_string_lossy().as_bytes());
    format!("{TAG_PREFIX}{digest:x}")
}

fn ensure_running(engine: &Engine) -> Result<(), BackendError> {
    match engine.is_running() {
        Ok(true) => Ok(()),
        Ok(false) => Err(BackendError::EngineUnavailable {
            program: engine.program().to_owned(),
        }),
        Err(error) => Err(BackendError::Other(error.into())),
    }
}

fn build_hook_image(
    engine: &Engine,
    checkout: &RepoCheckout,
) -> Result<BuildImageOutput, BackendError> {
    engine
        .build_image(BuildImageArgs {
            context: checkout.path(),
            tag: &image_tag(checkout),
            label: IMAGE_LABEL,
        })
        .map_err(BackendError::Build)
}

impl HookBackend for DockerBackend<'_> {
    fn install_environment(&self, args: InstallArgs) -> Result<InstallOutput, BackendError> {
        let InstallArgs {
            checkout,
            language_version,
        } = args;

        if !checkout.exists(BUILD_FILE) {
            return Err(BackendError::MissingBuildFile {
                path: checkout.join(BUILD_FILE),
            });
        }
        if language_version != DEFAULT_VERSION {
            return Err(BackendError::UnsupportedVersion {
                requested: language_version.to_owned(),
            });
        }
        ensure_running(self.engine)?;

        let environment_dir = checkout.environment_dir(ENVIRONMENT_DIR);
        std::fs::create_dir_all(&environment_dir).map_err(|error| {
            BackendError::Other(
                format!(
                    "failed to create {path}: {error}",
                    path = environment_dir.display()
                )
                .into(),
            )
        })?;

        // A failed build must not leave a directory claiming the environment
        // is installed.
        let guard = CleanupGuard::new(&environment_dir);
        let build = build_hook_image(self.engine, checkout)?;
        guard.keep();

        Ok(InstallOutput {
            environment_dir,
            image_id: build.image_id,
        })
    }

    fn run_hook(&self, args: RunArgs) -> Result<RunOutput, BackendError> {
        self.run_hook_with_max(args, max_command_length())
    }
}

impl DockerBackend<'_> {
    fn run_hook_with_max(
        &self,
        args: RunArgs,
        max_length: usize,
    ) -> Result<RunOutput, BackendError> {
        let RunArgs {
            checkout,
            hook,
            files,
            work_dir,
            rebuild,
        } = args;

        ensure_running(self.engine)?;

        let tag = image_tag(checkout);
        let build_needed = match rebuild {
            RebuildPolicy::Always => true,
            RebuildPolicy::IfMissing => !self
                .engine
                .image_exists(&tag)
                .map_err(|error| BackendError::Other(error.into()))?,
        };
        if build_needed {
            // Also heals images pruned by external cleanup since the
            // environment was installed.
            build_hook_image(self.engine, checkout)?;
        }

        let mut prefix = self.engine.run_argv(&RunOptions {
            image: &tag,
            entrypoint: &hook.entry,
            work_dir,
            user: current_uid_gid(),
        });
        prefix.extend(hook.args.iter().cloned());

        let prefix: Vec<&str> = prefix.iter().map(String::as_str).collect();
        let files: Vec<&str> = files.iter().map(String::as_str).collect();
        let chunks = command_partition::partition(&prefix, &files, max_length)?;
        debug!(
            "running hook {id:?} across {count} engine invocation(s)",
            id = hook.id,
            count = chunks.len()
        );

        run_chunks(&chunks)
    }
}

fn run_chunks(chunks: &[Vec<&str>]) -> Result<RunOutput, BackendError> {
    let mut code = 0;
    let mut combined = Vec::new();

    for argv in chunks {
        let Some((program, arguments)) = argv.split_first() else {
            unreachable!("partition chunks always start with the command prefix");
        };
        let result = process::Command::new(program)
            .args(arguments.iter().map(|argument| OsStr::new(argument)))
            .try_output()
            .map_err(|error| BackendError::Run(error.into()))?;
        let process::Output { command: _, output } = result;

        // A missing code means the engine process was killed by a signal.
        code = code.max(output.status.code().unwrap_or(1));
        combined.extend_from_slice(&output.stdout);
        combined.extend_from_slice(&output.stderr);
    }

    Ok(RunOutput {
        code,
        output: combined,
    })
}

#[cfg(unix)]
fn current_uid_gid() -> (u32, u32) {
    // SAFETY: getuid and getgid can not fail and have no preconditions.
    unsafe { (libc::getuid(), libc::getgid()) }
}

#[cfg(not(unix))]
fn current_uid_gid() -> (u32, u32) {
    // Containers on non-unix hosts run in a VM whose uids do not map to host
    // users; root inside the container is the convention there.
    (0, 0)
}

/// Upper bound on the byte length of a single engine invocation, leaving
/// headroom below `ARG_MAX` for the environment, which counts against the
/// same limit.
#[cfg(unix)]
fn max_command_length() -> usize {
    // SAFETY: sysconf has no preconditions and _SC_ARG_MAX is a valid name.
    let arg_max = unsafe { libc::sysconf(libc::_SC_ARG_MAX) };
    if arg_max > 0 {
        (arg_max as usize).saturating_sub(2048).clamp(1 << 12, 1 << 17)
    } else {
        1 << 12
    }
}

/// Windows bounds the whole command line at 2^15 UTF-16 units.
#[cfg(not(unix))]
fn max_command_length() -> usize {
    (1 << 15) - 2048
}
