use crate::repo::RepoCheckout;

/// Manifest file at the root of a hook repository listing its hooks.
pub const MANIFEST_FILE: &str = ".dockhand-hooks.yaml";

/// One runnable hook from the repository manifest.
///
/// `entry` is the command executed inside the container (it overrides the
/// image entrypoint) and `args` are static arguments inserted between the
/// entry and the file batch. Unknown manifest keys are ignored so manifests
/// can carry orchestrator-specific settings.
#[derive(Debug, Clone, serde::Deserialize)]
pub struct Hook {
    pub id: String,
    pub entry: String,
    #[serde(default)]
    pub args: Vec<String>,
}

pub fn load(checkout: &RepoCheckout) -> crate::Result<Vec<Hook>> {
    if !checkout.exists(MANIFEST_FILE) {
        return Err(format!(
            "hook repository {path} does not contain {MANIFEST_FILE}",
            path = checkout.path().display()
        )
        .into());
    }
    let contents = std::fs::read_to_string(checkout.join(MANIFEST_FILE))?;
    Ok(serde_yaml::from_str(&contents)?)
}

pub fn find<'a>(hooks: &'a [Hook], id: &str) -> Option<&'a Hook> {
    hooks.iter().find(|hook| hook.id == id)
}

#[cfg(test)]
mod tests {
    use super::*;

    const MANIFEST: &str = "\
- id: lint
  entry: /bin/lint
  args: [\"--fix\"]
- id: fmt
  entry: /bin/fmt
  language: docker
";

    #[test]
    fn hooks_parse_with_default_args_and_ignore_unknown_keys() {
        let hooks: Vec<Hook> = serde_yaml::from_str(MANIFEST).unwrap();
        assert_eq!(hooks.len(), 2);
        assert_eq!(hooks[0].id, "lint");
        assert_eq!(hooks[0].entry, "/bin/lint");
        assert_eq!(hooks[0].args, vec!["--fix"]);
        assert_eq!(hooks[1].id, "fmt");
        assert!(hooks[1].args.is_empty());
    }

    #[test]
    fn find_matches_by_id() {
        let hooks: Vec<Hook> = serde_yaml::from_str(MANIFEST).unwrap();
        assert_eq!(find(&hooks, "fmt").unwrap().entry, "/bin/fmt");
        assert!(find(&hooks, "missing").is_none());
    }

    #[test]
    fn load_reads_the_manifest_from_the_checkout_root() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(MANIFEST_FILE), MANIFEST).unwrap();
        let checkout = RepoCheckout::open(dir.path()).unwrap();

        let hooks = load(&checkout).unwrap();
        assert_eq!(hooks.len(), 2);
    }

    #[test]
    fn load_fails_when_the_manifest_is_missing() {
        let dir = tempfile::tempdir().unwrap();
        let checkout = RepoCheckout::open(dir.path()).unwrap();

        let error = load(&checkout).unwrap_err();
        assert!(error.to_string().contains(MANIFEST_FILE));
    }
}
