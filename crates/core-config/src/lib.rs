//! View-configuration file loading (spec.md §6): `color`, `namespaces`,
//! `k8sContext`, `views`, plus discovery fallback (env var → working
//! directory → home directory).
//!
//! Grounded on `examples/original_source/internal/config/config.go`'s
//! `Config`/`View`/`Transform` structs, field-for-field (the Go struct's
//! `json` tags are vestigial; its `toml` tags are what the file on disk
//! actually uses, and this crate's `serde(rename_all = "camelCase")` mirrors
//! them). Discovery/load control flow follows the teacher's
//! `core-config::discover`/`load_from` shape.

use core_entry::{Theme, View};
use serde::Deserialize;
use std::{env, fs, path::PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

/// On-disk shape of the config file, deserialized directly from TOML.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct ConfigFile {
    color: Option<String>,
    namespaces: Vec<String>,
    k8s_context: String,
    views: Vec<View>,
}

/// The resolved, in-memory configuration the rest of the engine consumes.
/// Unlike [`ConfigFile`], `color` has already been parsed into a [`Theme`]
/// (falling back to the engine's own default, not the config file's, for an
/// absent or unrecognized value).
#[derive(Debug, Clone, Default)]
pub struct Config {
    pub theme: Theme,
    pub namespaces: Vec<String>,
    pub k8s_context: String,
    pub views: Vec<View>,
}

/// Environment variable that overrides config discovery.
pub const CONFIG_ENV_VAR: &str = "TAILVIEW_CONFIG";

/// Locate the config file: `$TAILVIEW_CONFIG` → `./tailview.toml` →
/// `$XDG_CONFIG_HOME/tailview/tailview.toml` (via [`dirs::config_dir`]).
/// Returns `None` only if none of those candidates resolve to a usable path
/// (no config dir on the platform and no env var/cwd file).
pub fn discover() -> Option<PathBuf> {
    if let Ok(path) = env::var(CONFIG_ENV_VAR) {
        return Some(PathBuf::from(path));
    }
    let cwd = PathBuf::from("tailview.toml");
    if cwd.exists() {
        return Some(cwd);
    }
    dirs::config_dir().map(|dir| dir.join("tailview").join("tailview.toml"))
}

/// Load configuration from `path`, or from [`discover`] if `path` is `None`.
///
/// A missing file is not an error — it yields [`Config::default`] (dark
/// theme, no namespaces, no views), matching the original's willingness to
/// run unconfigured. A file that exists but fails to parse *is* a
/// [`ConfigError::Parse`] (spec.md §7's `ConfigError`, "surfaced at
/// startup") — unlike the teacher's own `core-config`, which silently falls
/// back to defaults on any parse error; this crate only defaults when the
/// file is absent (see DESIGN.md's deviations list).
pub fn load_from(path: Option<PathBuf>) -> Result<Config, ConfigError> {
    let Some(path) = path.or_else(discover) else {
        tracing::debug!("no config file found, using defaults");
        return Ok(Config::default());
    };
    if !path.exists() {
        tracing::debug!(path = %path.display(), "config file does not exist, using defaults");
        return Ok(Config::default());
    }

    let content = fs::read_to_string(&path).map_err(|source| ConfigError::Read {
        path: path.clone(),
        source,
    })?;
    let file: ConfigFile = toml::from_str(&content).map_err(|source| ConfigError::Parse {
        path: path.clone(),
        source,
    })?;

    let theme = file
        .color
        .as_deref()
        .and_then(|c| c.parse::<Theme>().ok())
        .unwrap_or_default();

    tracing::info!(
        path = %path.display(),
        views = file.views.len(),
        namespaces = file.namespaces.len(),
        "config loaded"
    );

    Ok(Config {
        theme,
        namespaces: file.namespaces,
        k8s_context: file.k8s_context,
        views: file.views,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn missing_file_yields_defaults() {
        let cfg = load_from(Some(PathBuf::from("__definitely_missing__.toml"))).unwrap();
        assert_eq!(cfg.theme, Theme::Dark);
        assert!(cfg.views.is_empty());
        assert!(cfg.namespaces.is_empty());
    }

    #[test]
    fn parses_top_level_fields_and_one_view() {
        let mut tmp = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            tmp,
            r#"
color = "light"
namespaces = ["default", "staging"]
k8sContext = "prod-cluster"

[[views]]
name = "errors"
filter = "filterLevel(json.level, \"error\")"
filterDefault = false
returnedFields = ["msg", "level"]
"#
        )
        .unwrap();

        let cfg = load_from(Some(tmp.path().to_path_buf())).unwrap();
        assert_eq!(cfg.theme, Theme::Light);
        assert_eq!(cfg.namespaces, vec!["default", "staging"]);
        assert_eq!(cfg.k8s_context, "prod-cluster");
        assert_eq!(cfg.views.len(), 1);
        assert_eq!(cfg.views[0].name, "errors");
        assert_eq!(cfg.views[0].returned_fields, vec!["msg", "level"]);
    }

    #[test]
    fn malformed_file_is_a_parse_error_not_a_silent_default() {
        let mut tmp = tempfile::NamedTempFile::new().unwrap();
        writeln!(tmp, "this is not valid toml [[[").unwrap();
        let err = load_from(Some(tmp.path().to_path_buf())).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn unrecognized_color_falls_back_to_default_theme() {
        let mut tmp = tempfile::NamedTempFile::new().unwrap();
        writeln!(tmp, r#"color = "neon""#).unwrap();
        let cfg = load_from(Some(tmp.path().to_path_buf())).unwrap();
        assert_eq!(cfg.theme, Theme::Dark);
    }

    #[test]
    fn env_var_overrides_discovery() {
        // SAFETY: test-only, single-threaded within this test's scope;
        // no other test in this process reads TAILVIEW_CONFIG concurrently.
        unsafe {
            env::set_var(CONFIG_ENV_VAR, "/tmp/from-env-var.toml");
        }
        let discovered = discover();
        unsafe {
            env::remove_var(CONFIG_ENV_VAR);
        }
        assert_eq!(discovered, Some(PathBuf::from("/tmp/from-env-var.toml")));
    }
}
