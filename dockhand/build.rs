use std::{env, fs, path::PathBuf, process::Command};

fn git(args: &[&str]) -> Option<String> {
    let output = Command::new("git").args(args).output().ok()?;
    output
        .status
        .success()
        .then(|| String::from_utf8_lossy(&output.stdout).trim().to_owned())
}

fn main() {
    let doing_release = option_env!("DOCKHAND_RELEASE")
        .map(|env| matches!(env, "1" | "true"))
        .unwrap_or_default();

    let mut version = env!("CARGO_PKG_VERSION").to_owned();
    if !doing_release {
        // Source archives have no repository metadata to stamp.
        if let Some(commit_hash) = git(&["rev-parse", "--short", "HEAD"]) {
            version.push('+');
            version.push_str(&commit_hash);
            let is_clean = git(&["status", "--porcelain"]).is_some_and(|status| status.is_empty());
            if !is_clean {
                version.push_str(".dirty");
            }
        }
    }

    let out_dir = PathBuf::from(env::var_os("OUT_DIR").unwrap());
    fs::write(
        out_dir.join("version.rs"),
        format!("pub const VERSION: &str = {version:?};"),
    )
    .unwrap();
}
