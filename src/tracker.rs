//! Tracker facade: the configuration and the store for one command.
//!
//! Every CLI command opens a `Tracker`, reads or writes through its
//! repositories, and drops it. The store is either a redb file in the data
//! directory or, when no directory is resolved, an in-memory map.

use std::path::{Path, PathBuf};

use chrono::{NaiveDate, NaiveDateTime};

use crate::config::Config;
use crate::error::{TrackerError, UeResult};
use crate::paths::STORE_FILE;
use crate::risk::{self, BlockRisk};
use crate::store::{ActivityRepo, BlockRepo, Store, TaskRepo};

/// How to open a tracker.
#[derive(Debug, Clone, Default)]
pub struct TrackerOptions {
    /// Config file to load. `None` uses built-in defaults and disables saving.
    pub config_path: Option<PathBuf>,
    /// Explicit data directory; wins over `data_directory` in the config.
    pub data_dir: Option<PathBuf>,
    /// Used when neither the options nor the config name a directory.
    pub default_data_dir: Option<PathBuf>,
    /// Keep everything in memory.
    pub memory: bool,
    /// Demo mode: the config's `data_directory` is ignored.
    pub demo: bool,
}

/// The configuration plus an open store.
pub struct Tracker {
    config: Config,
    config_path: Option<PathBuf>,
    data_dir: Option<PathBuf>,
    store: Store,
    demo: bool,
}

impl Tracker {
    /// Load the config and open the store described by `opts`.
    pub fn open(opts: TrackerOptions) -> UeResult<Self> {
        let config = match &opts.config_path {
            Some(path) => Config::load(path)?,
            None => Config::default(),
        };

        let data_dir = if opts.memory {
            None
        } else {
            let from_config = if opts.demo {
                None
            } else {
                config.data_directory.clone()
            };
            opts.data_dir.or(from_config).or(opts.default_data_dir)
        };

        let store = match &data_dir {
            Some(dir) => {
                std::fs::create_dir_all(dir).map_err(|e| TrackerError::DataDir {
                    path: dir.display().to_string(),
                    source: e,
                })?;
                Store::open(&dir.join(STORE_FILE))?
            }
            None => Store::memory(),
        };

        tracing::info!(
            backend = store.kind(),
            demo = opts.demo,
            data_dir = ?data_dir,
            "opened tracker"
        );

        Ok(Self {
            config,
            config_path: opts.config_path,
            data_dir,
            store,
            demo: opts.demo,
        })
    }

    /// A throwaway tracker over an in-memory store.
    pub fn in_memory(config: Config) -> Self {
        Self {
            config,
            config_path: None,
            data_dir: None,
            store: Store::memory(),
            demo: false,
        }
    }

    /// Mark this tracker as running in demo mode.
    pub fn with_demo(mut self, demo: bool) -> Self {
        self.demo = demo;
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn config_mut(&mut self) -> &mut Config {
        &mut self.config
    }

    pub fn config_path(&self) -> Option<&Path> {
        self.config_path.as_deref()
    }

    /// Persist the config if it was loaded from a file.
    pub fn save_config(&self) -> UeResult<()> {
        if let Some(path) = &self.config_path {
            self.config.save(path)?;
            tracing::info!(path = %path.display(), "saved config");
        }
        Ok(())
    }

    pub fn data_dir(&self) -> Option<&Path> {
        self.data_dir.as_deref()
    }

    pub fn is_demo(&self) -> bool {
        self.demo
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    pub fn blocks(&self) -> BlockRepo<'_> {
        self.store.blocks()
    }

    pub fn tasks(&self) -> TaskRepo<'_> {
        self.store.tasks()
    }

    pub fn activity(&self) -> ActivityRepo<'_> {
        self.store.activity()
    }

    /// Classify active blocks against this week's records.
    pub fn risks(&self, today: NaiveDate) -> UeResult<Vec<BlockRisk>> {
        let blocks = self.blocks();
        let targets = blocks.targets()?;
        let week = blocks.week_completions(today)?;
        Ok(risk::classify(&targets, &week, today, &self.config))
    }

    /// Summary for `ue paths` and diagnostics.
    pub fn info(&self, now: NaiveDateTime) -> TrackerInfo {
        TrackerInfo {
            backend: self.store.kind(),
            data_dir: self.data_dir.clone(),
            config_path: self.config_path.clone(),
            categories: self.config.categories.len(),
            demo: self.demo,
            effective_date: crate::temporal::effective_date(now),
        }
    }
}

impl std::fmt::Debug for Tracker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Tracker")
            .field("store", &self.store)
            .field("data_dir", &self.data_dir)
            .field("demo", &self.demo)
            .finish()
    }
}

/// Where a tracker reads from and writes to.
#[derive(Debug, Clone)]
pub struct TrackerInfo {
    pub backend: &'static str,
    pub data_dir: Option<PathBuf>,
    pub config_path: Option<PathBuf>,
    pub categories: usize,
    pub demo: bool,
    pub effective_date: NaiveDate,
}

impl std::fmt::Display for TrackerInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let show = |p: &Option<PathBuf>| {
            p.as_ref()
                .map(|p| p.display().to_string())
                .unwrap_or_else(|| "(none)".into())
        };
        writeln!(f, "Store:          {}", self.backend)?;
        writeln!(f, "Data dir:       {}", show(&self.data_dir))?;
        writeln!(f, "Config file:    {}", show(&self.config_path))?;
        writeln!(f, "Categories:     {}", self.categories)?;
        writeln!(f, "Demo mode:      {}", if self.demo { "yes" } else { "no" })?;
        write!(f, "Effective date: {}", self.effective_date)
    }
}
