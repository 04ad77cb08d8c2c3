use std::{ffi::OsStr, path::Path};

use log::debug;

use crate::{process, temp_path, Result};

/// In-container path at which the work directory is bind-mounted and which the
/// container starts in.
pub const CONTAINER_WORKDIR: &str = "/src";

/// Wrapper around a Docker-compatible container engine CLI.
///
/// The engine is only ever driven through its command line, never through a
/// daemon API, so hooks behave identically under `docker`, `podman` and
/// friends.
pub struct Engine<'a> {
    program: &'a str,
}

impl<'a> Engine<'a> {
    pub fn new(program: &'a str) -> Self {
        Self { program }
    }

    pub fn program(&self) -> &str {
        self.program
    }

    /// Probes the engine daemon with a container listing. Returns `Ok(false)`
    /// when the daemon does not answer and `Err` when the engine binary itself
    /// can not be invoked.
    pub fn is_running(&self) -> process::Result<bool> {
        Ok(process::command!(self.program, "ps")
            .try_output()?
            .status
            .success())
    }

    /// Whether `image` is present in the engine's local image store.
    pub fn image_exists(&self, image: &str) -> process::Result<bool> {
        Ok(process::command!(self.program, "image", "inspect", image)
            .try_output()?
            .status
            .success())
    }

    /// Builds the image described by `args`, streaming build output to the
    /// terminal. Base images are pulled so builds are not silently stale.
    pub fn build_image(&self, args: BuildImageArgs) -> Result<BuildImageOutput> {
        let BuildImageArgs {
            context,
            tag,
            label,
        } = args;

        let iidfile = temp_path::tmp_iid_path();

        process::command!(
            self.program,
            "build",
            "--pull",
            "--tag",
            tag,
            "--label",
            label,
            "--iidfile",
            &iidfile,
            context,
        )
        .status()?;

        let image_id = std::fs::read_to_string(&iidfile)?.trim().to_owned();
        let _ = std::fs::remove_file(&iidfile);
        debug!("built image {tag} ({image_id})");

        Ok(BuildImageOutput { image_id })
    }

    /// The `run` argument vector up to and including the image name. The
    /// hook's static arguments and the file batch are appended by the caller.
    ///
    /// The container is removed after exit and runs as the given numeric
    /// uid:gid so files it writes into the mount are not root-owned.
    pub fn run_argv(&self, options: &RunOptions) -> Vec<String> {
        let RunOptions {
            image,
            entrypoint,
            work_dir,
            user: (uid, gid),
        } = *options;

        vec![
            self.program.to_owned(),
            "run".to_owned(),
            "--rm".to_owned(),
            "-u".to_owned(),
            format!("{uid}:{gid}"),
            "-v".to_owned(),
            format!("{}:{CONTAINER_WORKDIR}:rw", work_dir.display()),
            "--workdir".to_owned(),
            CONTAINER_WORKDIR.to_owned(),
            "--entrypoint".to_owned(),
            entrypoint.to_owned(),
            image.to_owned(),
        ]
    }

    /// All local images carrying `label`.
    pub fn labeled_images(&self, label: &str) -> Result<Vec<ImageRecord>> {
        let output = process::command!(
            self.program,
            "images",
            "--filter",
            format!("label={label}"),
            "--format",
            "{{json .}}",
        )
        .output()?;

        parse_images(std::str::from_utf8(&output.stdout)?)
    }

    /// Removes images by `repository:tag` reference, streaming engine output
    /// to the terminal. Removing by reference rather than by id unties images
    /// that share layers with other tags.
    pub fn remove_images(&self, references: &[String]) -> Result<()> {
        process::command!(self.program, "rmi")
            .args(references.iter().map(|reference| OsStr::new(reference)))
            .status()?;
        Ok(())
    }
}

pub struct BuildImageArgs<'a> {
    pub context: &'a Path,
    pub tag: &'a str,
    pub label: &'a str,
}

pub struct BuildImageOutput {
    pub image_id: String,
}

pub struct RunOptions<'a> {
    pub image: &'a str,
    pub entrypoint: &'a str,
    pub work_dir: &'a Path,
    pub user: (u32, u32),
}

/// One line of `images --format "{{json .}}"` output.
#[derive(Debug, serde::Deserialize)]
pub struct ImageRecord {
    #[serde(rename = "Repository")]
    pub repository: String,
    #[serde(rename = "Tag")]
    pub tag: String,
    #[serde(rename = "ID")]
    pub id: String,
    #[serde(rename = "CreatedSince")]
    pub created_since: String,
    #[serde(rename = "Size")]
    pub size: String,
}

fn parse_images(stdout: &str) -> Result<Vec<ImageRecord>> {
    stdout
        .lines()
        .filter(|line| !line.trim().is_empty())
        .map(|line| Ok(serde_json::from_str(line)?))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn run_argv_mounts_the_work_dir_and_overrides_the_entrypoint() {
        let engine = Engine::new("docker");
        let argv = engine.run_argv(&RunOptions {
            image: "dockhand-0123abcd",
            entrypoint: "/bin/lint",
            work_dir: Path::new("/home/dev/project"),
            user: (1000, 1000),
        });
        assert_eq!(
            argv,
            vec![
                "docker",
                "run",
                "--rm",
                "-u",
                "1000:1000",
                "-v",
                "/home/dev/project:/src:rw",
                "--workdir",
                "/src",
                "--entrypoint",
                "/bin/lint",
                "dockhand-0123abcd",
            ]
        );
    }

    #[test]
    fn parse_images_reads_one_record_per_line() {
        let stdout = concat!(
            r#"{"Containers":"N/A","CreatedSince":"2 days ago","ID":"f2a9c70b2b93","Repository":"dockhand-8843d7f9","Size":"125MB","Tag":"latest"}"#,
            "\n",
            r#"{"CreatedSince":"5 weeks ago","ID":"0d1aef6e57a0","Repository":"dockhand-a665a459","Size":"1.2GB","Tag":"latest"}"#,
            "\n",
        );
        let images = parse_images(stdout).unwrap();
        assert_eq!(images.len(), 2);
        assert_eq!(images[0].repository, "dockhand-8843d7f9");
        assert_eq!(images[0].id, "f2a9c70b2b93");
        assert_eq!(images[0].created_since, "2 days ago");
        assert_eq!(images[1].size, "1.2GB");
    }

    #[test]
    fn parse_images_ignores_blank_lines_and_rejects_garbage() {
        assert!(parse_images("\n\n").unwrap().is_empty());
        assert!(parse_images("not json\n").is_err());
    }

    #[test]
    fn is_running_reports_daemon_reachability_via_exit_status() {
        // `true` and `false` ignore the `ps` argument and exit 0 / 1.
        assert!(Engine::new("true").is_running().unwrap());
        assert!(!Engine::new("false").is_running().unwrap());
    }

    #[test]
    fn is_running_fails_when_the_engine_binary_is_absent() {
        let error = Engine::new("definitely-not-a-container-engine")
            .is_running()
            .unwrap_err();
        assert!(matches!(error.kind, crate::process::ErrorKind::NotFound));
    }

    #[test]
    fn build_image_reads_and_removes_the_iidfile() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let iid_path_file = dir.path().join("iid-path");
        let program = dir.path().join("engine");
        let script = format!(
            r#"#!/bin/sh
prev=""
for arg in "$@"; do
  if [ "$prev" = "--iidfile" ]; then
    printf 'sha256:abc123' > "$arg"
    printf '%s' "$arg" > "{iid_path_file}"
  fi
  prev="$arg"
done
"#,
            iid_path_file = iid_path_file.display(),
        );
        std::fs::write(&program, script).unwrap();
        std::fs::set_permissions(&program, std::fs::Permissions::from_mode(0o755)).unwrap();

        let output = Engine::new(program.to_str().unwrap())
            .build_image(BuildImageArgs {
                context: dir.path(),
                tag: "dockhand-test",
                label: "DOCKHAND",
            })
            .unwrap();

        assert_eq!(output.image_id, "sha256:abc123");
        let iidfile = std::fs::read_to_string(&iid_path_file).unwrap();
        assert!(!Path::new(iidfile.trim()).exists());
    }
}
