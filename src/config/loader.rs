// src/config/loader.rs

use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::config::model::{ConfigFile, RawConfigFile};
use crate::errors::Result;

/// File looked up in the project root when `--config` is not given.
pub const DEFAULT_CONFIG_FILE: &str = "Assetpipe.toml";

/// Load a configuration file from a given path and return the raw `RawConfigFile`.
///
/// Kinds missing from `[path]` are filled from the built-in table. No
/// semantic validation happens here; use [`load_and_validate`] for that.
pub fn load_from_path(path: impl AsRef<Path>) -> Result<RawConfigFile> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path)?;

    let mut config: RawConfigFile = toml::from_str(&contents)?;
    config.fill_missing_paths();

    Ok(config)
}

/// Load a configuration file from path and run validation.
pub fn load_and_validate(path: impl AsRef<Path>) -> Result<ConfigFile> {
    let raw_config = load_from_path(&path)?;
    let config = ConfigFile::try_from(raw_config)?;
    Ok(config)
}

/// Resolve the configuration for a project.
///
/// - An explicit path must exist.
/// - Without one, `<root>/Assetpipe.toml` is used when present and the
///   built-in defaults otherwise.
pub fn load_or_default(root: &Path, explicit: Option<&Path>) -> Result<ConfigFile> {
    if let Some(path) = explicit {
        debug!(path = %path.display(), "loading explicit config file");
        return load_and_validate(path);
    }

    let candidate = default_config_path(root);
    if candidate.is_file() {
        debug!(path = %candidate.display(), "loading project config file");
        load_and_validate(&candidate)
    } else {
        debug!(root = %root.display(), "no config file found; using built-in path table");
        ConfigFile::try_from(RawConfigFile::default())
    }
}

pub fn default_config_path(root: &Path) -> PathBuf {
    root.join(DEFAULT_CONFIG_FILE)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::AssetpipeError;
    use crate::types::{AssetKind, TriggerWhileRunningBehaviour};

    #[test]
    fn partial_path_table_keeps_defaults_for_other_kinds() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(DEFAULT_CONFIG_FILE);
        fs::write(
            &path,
            r#"
[config]
triggered_while_running_behaviour = "cancel"

[server]
port = 8081
tunnel = false

[path.html]
src = "pages/*.html"
dest = "build/"
watch = "pages/**/*.html"
"#,
        )
        .unwrap();

        let cfg = load_or_default(dir.path(), None).unwrap();
        assert_eq!(cfg.paths().get(AssetKind::Html).src, "pages/*.html");
        assert_eq!(cfg.paths().get(AssetKind::Js).src, "src/js/main.js");
        assert_eq!(cfg.server().port, 8081);
        assert!(!cfg.server().tunnel);
        assert_eq!(
            cfg.settings().triggered_while_running_behaviour,
            TriggerWhileRunningBehaviour::Cancel
        );
    }

    #[test]
    fn missing_default_file_means_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = load_or_default(dir.path(), None).unwrap();
        assert_eq!(cfg.settings().output_root, "build");
        assert_eq!(cfg.style().browsers, vec!["> 1%".to_string()]);
    }

    #[test]
    fn missing_explicit_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_or_default(dir.path(), Some(&dir.path().join("nope.toml"))).unwrap_err();
        assert!(matches!(err, AssetpipeError::IoError(_)), "{err:?}");
    }

    #[test]
    fn unknown_kind_in_path_table_is_a_toml_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.toml");
        fs::write(&path, "[path.css]\nsrc = \"a\"\ndest = \"build/\"\nwatch = \"a\"\n").unwrap();
        let err = load_and_validate(&path).unwrap_err();
        assert!(matches!(err, AssetpipeError::TomlError(_)), "{err:?}");
    }
}
