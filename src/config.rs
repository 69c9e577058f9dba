//! User configuration: categories and their priorities.
//!
//! Persisted as TOML in `$XDG_CONFIG_HOME/utility-explorer/config.toml`. The
//! configuration is loaded once per command and passed explicitly to the risk
//! classifier and review builders; nothing reads it from ambient state.

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

use miette::Diagnostic;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors from configuration handling.
#[derive(Debug, Error, Diagnostic)]
pub enum ConfigError {
    #[error("failed to read config: {path}")]
    #[diagnostic(
        code(ue::config::read),
        help("Ensure the config file is readable, or delete it to fall back to defaults.")
    )]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {path}: {message}")]
    #[diagnostic(
        code(ue::config::parse),
        help("Check the TOML syntax. Categories look like `[categories.blog]` with `priority = \"mid\"`.")
    )]
    Parse { path: String, message: String },

    #[error("failed to write config: {path}")]
    #[diagnostic(
        code(ue::config::write),
        help("Ensure you have write permissions to the config directory.")
    )]
    Write {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to serialize config: {message}")]
    #[diagnostic(code(ue::config::serialize), help("This is a bug; please report it."))]
    Serialize { message: String },

    #[error("category \"{name}\" already exists")]
    #[diagnostic(
        code(ue::config::category_exists),
        help("Use `ue category set {name}` to change its priority or color.")
    )]
    CategoryExists { name: String },

    #[error("category \"{name}\" not found")]
    #[diagnostic(
        code(ue::config::category_not_found),
        help("List categories with `ue category list` or add one with `ue category add {name}`.")
    )]
    CategoryNotFound { name: String },

    #[error("unknown priority \"{value}\"")]
    #[diagnostic(code(ue::config::priority), help("Valid priorities: high, mid, low."))]
    UnknownPriority { value: String },
}

pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// ---------------------------------------------------------------------------
// Category priority
// ---------------------------------------------------------------------------

/// How much a category biases risk classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    High,
    #[serde(alias = "medium")]
    Mid,
    Low,
}

impl Priority {
    /// Sort rank: high sorts first. Blocks without a priority use [`Priority::NONE_RANK`].
    pub fn rank(&self) -> u8 {
        match self {
            Self::High => 0,
            Self::Mid => 1,
            Self::Low => 2,
        }
    }

    pub const NONE_RANK: u8 = 3;

    pub fn as_label(&self) -> &'static str {
        match self {
            Self::High => "high",
            Self::Mid => "mid",
            Self::Low => "low",
        }
    }

    pub fn from_label(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "high" => Some(Self::High),
            "mid" | "medium" => Some(Self::Mid),
            "low" => Some(Self::Low),
            _ => None,
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_label())
    }
}

impl std::str::FromStr for Priority {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_label(s).ok_or_else(|| ConfigError::UnknownPriority { value: s.to_string() })
    }
}

/// Rank helper for an optional priority.
pub fn priority_rank(priority: Option<Priority>) -> u8 {
    priority.map_or(Priority::NONE_RANK, |p| p.rank())
}

// ---------------------------------------------------------------------------
// Config
// ---------------------------------------------------------------------------

/// A user-defined tag with a priority and a display color.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryConfig {
    /// Missing in the file means `low`.
    #[serde(default = "default_priority")]
    pub priority: Priority,
    #[serde(default = "default_color")]
    pub color: String,
}

fn default_priority() -> Priority {
    Priority::Low
}
fn default_color() -> String {
    "blue".into()
}

/// Ingestion tracking mode, carried for compatibility with the sync collaborators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecurrenceMode {
    #[default]
    Auto,
    Local,
    Github,
    Both,
}

impl RecurrenceMode {
    pub fn as_label(&self) -> &'static str {
        match self {
            Self::Auto => "auto",
            Self::Local => "local",
            Self::Github => "github",
            Self::Both => "both",
        }
    }
}

/// Top-level configuration object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub recurrence_mode: RecurrenceMode,
    /// Overrides the XDG data directory when set.
    #[serde(default)]
    pub data_directory: Option<PathBuf>,
    #[serde(default)]
    pub categories: BTreeMap<String, CategoryConfig>,
}

impl Default for Config {
    fn default() -> Self {
        let mut categories = BTreeMap::new();
        for (name, priority, color) in [
            ("ai-research", Priority::High, "green"),
            ("terrasol", Priority::Mid, "yellow"),
            ("blog", Priority::Mid, "blue"),
            ("consulting", Priority::Low, "dim"),
        ] {
            categories.insert(
                name.to_string(),
                CategoryConfig {
                    priority,
                    color: color.to_string(),
                },
            );
        }
        Self {
            recurrence_mode: RecurrenceMode::default(),
            data_directory: None,
            categories,
        }
    }
}

impl Config {
    /// Load from `path`, falling back to defaults when the file does not exist.
    pub fn load(path: &Path) -> ConfigResult<Self> {
        if !path.exists() {
            tracing::debug!(path = %path.display(), "no config file, using defaults");
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Read {
            path: path.display().to_string(),
            source: e,
        })?;
        Self::from_toml(&content).map_err(|message| ConfigError::Parse {
            path: path.display().to_string(),
            message,
        })
    }

    /// Parse a TOML document.
    pub fn from_toml(content: &str) -> Result<Self, String> {
        toml::from_str(content).map_err(|e| e.to_string())
    }

    /// Save to `path`, creating parent directories.
    pub fn save(&self, path: &Path) -> ConfigResult<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| ConfigError::Write {
                path: parent.display().to_string(),
                source: e,
            })?;
        }
        let content = toml::to_string_pretty(self).map_err(|e| ConfigError::Serialize {
            message: e.to_string(),
        })?;
        std::fs::write(path, content).map_err(|e| ConfigError::Write {
            path: path.display().to_string(),
            source: e,
        })
    }

    /// Priority of a configured category; `None` for no category or an unknown one.
    pub fn category_priority(&self, category: Option<&str>) -> Option<Priority> {
        category
            .and_then(|name| self.categories.get(name))
            .map(|c| c.priority)
    }

    /// Add a new category. Fails if it already exists.
    pub fn add_category(&mut self, name: &str, priority: Priority, color: &str) -> ConfigResult<()> {
        if self.categories.contains_key(name) {
            return Err(ConfigError::CategoryExists { name: name.to_string() });
        }
        self.categories.insert(
            name.to_string(),
            CategoryConfig {
                priority,
                color: color.to_string(),
            },
        );
        Ok(())
    }

    /// Update an existing category's priority and/or color.
    pub fn set_category(
        &mut self,
        name: &str,
        priority: Option<Priority>,
        color: Option<&str>,
    ) -> ConfigResult<()> {
        let entry = self
            .categories
            .get_mut(name)
            .ok_or_else(|| ConfigError::CategoryNotFound { name: name.to_string() })?;
        if let Some(p) = priority {
            entry.priority = p;
        }
        if let Some(c) = color {
            entry.color = c.to_string();
        }
        Ok(())
    }

    /// Remove a category. Blocks and tasks tagged with it keep the tag.
    pub fn remove_category(&mut self, name: &str) -> ConfigResult<CategoryConfig> {
        self.categories
            .remove(name)
            .ok_or_else(|| ConfigError::CategoryNotFound { name: name.to_string() })
    }

    /// Categories sorted by priority (high first), then name.
    pub fn categories_by_priority(&self) -> Vec<(&str, &CategoryConfig)> {
        let mut list: Vec<_> = self
            .categories
            .iter()
            .map(|(name, cfg)| (name.as_str(), cfg))
            .collect();
        list.sort_by_key(|(name, cfg)| (cfg.priority.rank(), *name));
        list
    }
}
