//! XDG-compliant path resolution for utility-explorer.
//!
//! Provides `UePaths` following the XDG Base Directory Specification, with two
//! overrides: `UE_DATA_DIR` replaces the data directory, and `UE_DEMO=1`
//! redirects both data and config to a separate demo location.

use std::path::{Path, PathBuf};

use miette::Diagnostic;
use thiserror::Error;

/// Directory name used under every XDG base.
const APP_DIR: &str = "utility-explorer";

/// Store file name inside the data directory.
pub const STORE_FILE: &str = "ue.redb";

/// Errors from path resolution.
#[derive(Debug, Error, Diagnostic)]
pub enum PathError {
    #[error("cannot determine home directory")]
    #[diagnostic(
        code(ue::paths::no_home),
        help("Set the HOME environment variable or pass `--data-dir` explicitly.")
    )]
    NoHome,

    #[error("failed to create directory: {path}")]
    #[diagnostic(
        code(ue::paths::create_dir),
        help("Check that the parent directory exists and you have write permissions.")
    )]
    CreateDir {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

pub type PathResult<T> = std::result::Result<T, PathError>;

/// Resolved directories for one invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UePaths {
    /// `$XDG_CONFIG_HOME/utility-explorer/`
    pub config_dir: PathBuf,
    /// `$XDG_DATA_HOME/utility-explorer/` (or `UE_DATA_DIR`)
    pub data_dir: PathBuf,
    /// `$XDG_STATE_HOME/utility-explorer/`
    pub state_dir: PathBuf,
    /// Whether `UE_DEMO` redirected the layout.
    pub demo: bool,
}

impl UePaths {
    /// Resolve from the process environment.
    pub fn resolve() -> PathResult<Self> {
        Self::resolve_with(|key| std::env::var(key).ok())
    }

    /// Resolve using an arbitrary variable lookup.
    pub fn resolve_with(lookup: impl Fn(&str) -> Option<String>) -> PathResult<Self> {
        let home = lookup("HOME").map(PathBuf::from).ok_or(PathError::NoHome)?;

        let config_dir = lookup("XDG_CONFIG_HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|| home.join(".config"))
            .join(APP_DIR);

        let data_dir = match lookup("UE_DATA_DIR") {
            Some(dir) => PathBuf::from(dir),
            None => lookup("XDG_DATA_HOME")
                .map(PathBuf::from)
                .unwrap_or_else(|| home.join(".local/share"))
                .join(APP_DIR),
        };

        let state_dir = lookup("XDG_STATE_HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|| home.join(".local/state"))
            .join(APP_DIR);

        let demo = lookup("UE_DEMO").is_some_and(|v| v == "1" || v.eq_ignore_ascii_case("true"));
        let paths = Self {
            config_dir,
            data_dir,
            state_dir,
            demo: false,
        };
        Ok(if demo { paths.into_demo() } else { paths })
    }

    /// Redirect data and config into `demo/` subdirectories.
    pub fn into_demo(self) -> Self {
        Self {
            config_dir: self.config_dir.join("demo"),
            data_dir: self.data_dir.join("demo"),
            state_dir: self.state_dir,
            demo: true,
        }
    }

    /// Replace the data directory (`--data-dir` or `data_directory` in config).
    pub fn with_data_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.data_dir = dir.into();
        self
    }

    /// Path to the config file.
    pub fn config_file(&self) -> PathBuf {
        self.config_dir.join("config.toml")
    }

    /// Path to the redb store file.
    pub fn store_file(&self) -> PathBuf {
        self.data_dir.join(STORE_FILE)
    }

    /// Create all base directories. Idempotent.
    pub fn ensure_dirs(&self) -> PathResult<()> {
        for dir in [&self.config_dir, &self.data_dir, &self.state_dir] {
            ensure_dir(dir)?;
        }
        Ok(())
    }
}

fn ensure_dir(dir: &Path) -> PathResult<()> {
    std::fs::create_dir_all(dir).map_err(|e| PathError::CreateDir {
        path: dir.display().to_string(),
        source: e,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn home_defaults() {
        let paths = UePaths::resolve_with(env(&[("HOME", "/home/u")])).unwrap();
        assert_eq!(paths.config_dir, PathBuf::from("/home/u/.config/utility-explorer"));
        assert_eq!(paths.data_dir, PathBuf::from("/home/u/.local/share/utility-explorer"));
        assert_eq!(paths.state_dir, PathBuf::from("/home/u/.local/state/utility-explorer"));
        assert_eq!(
            paths.store_file(),
            PathBuf::from("/home/u/.local/share/utility-explorer/ue.redb")
        );
        assert!(!paths.demo);
    }

    #[test]
    fn xdg_and_override() {
        let paths = UePaths::resolve_with(env(&[
            ("HOME", "/home/u"),
            ("XDG_CONFIG_HOME", "/cfg"),
            ("XDG_DATA_HOME", "/data"),
            ("UE_DATA_DIR", "/elsewhere"),
        ]))
        .unwrap();
        assert_eq!(paths.config_file(), PathBuf::from("/cfg/utility-explorer/config.toml"));
        assert_eq!(paths.data_dir, PathBuf::from("/elsewhere"));
    }

    #[test]
    fn demo_mode_is_isolated() {
        let paths =
            UePaths::resolve_with(env(&[("HOME", "/home/u"), ("UE_DEMO", "1")])).unwrap();
        assert!(paths.demo);
        assert_eq!(
            paths.data_dir,
            PathBuf::from("/home/u/.local/share/utility-explorer/demo")
        );
        assert_eq!(
            paths.config_file(),
            PathBuf::from("/home/u/.config/utility-explorer/demo/config.toml")
        );
    }

    #[test]
    fn missing_home_is_an_error() {
        assert!(matches!(
            UePaths::resolve_with(env(&[])),
            Err(PathError::NoHome)
        ));
    }

    #[test]
    fn ensure_dirs_creates_layout() {
        let dir = tempfile::TempDir::new().unwrap();
        let root = dir.path().to_string_lossy().to_string();
        let paths = UePaths::resolve_with(env(&[("HOME", root.as_str())])).unwrap();
        paths.ensure_dirs().unwrap();
        assert!(paths.config_dir.is_dir());
        assert!(paths.data_dir.is_dir());
        assert!(paths.state_dir.is_dir());
    }
}
