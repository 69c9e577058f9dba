// thiserror's #[error("...{field}...")] format strings reference struct fields,
// but the compiler doesn't see through the derive macro and reports false positives.
#![allow(unused_assignments)]

//! # utility-explorer
//!
//! A personal productivity tracker: recurring commitments ("blocks") with
//! weekly targets, deadline-bearing tasks and an activity log, all kept in a
//! local store, plus the views derived from them.
//!
//! ## Architecture
//!
//! - **Temporal reference** (`temporal`): 2am day boundary, Monday-anchored weeks
//! - **Due dates** (`due`): natural-language tokens with verbatim pass-through
//! - **Records** (`block`, `task`, `activity`): typed domain values
//! - **Storage** (`store`): byte-level backends (redb, in-memory) under typed repositories
//! - **Risk** (`risk`): which blocks need attention this week
//! - **Stats** (`stats`): streaks, rates, deltas, missed days and trends
//! - **Reviews** (`review`): morning, evening, status, dashboard, week and month views
//! - **Tracker** (`tracker`): config plus store, opened once per command
//!
//! ## Library usage
//!
//! ```no_run
//! use utility_explorer::config::Config;
//! use utility_explorer::block::CompletionRecord;
//! use utility_explorer::tracker::Tracker;
//!
//! let tracker = Tracker::in_memory(Config::default());
//! let today = chrono::NaiveDate::from_ymd_opt(2024, 1, 10).unwrap();
//! tracker.blocks().set_target("Deep Work", 5, Some("ai-research".into())).unwrap();
//! tracker
//!     .blocks()
//!     .log_completion(&CompletionRecord::completed("Deep Work", today))
//!     .unwrap();
//! for risk in tracker.risks(today).unwrap() {
//!     println!("{} {}", risk.name, risk.status);
//! }
//! ```

pub mod activity;
pub mod block;
pub mod config;
pub mod demo;
pub mod due;
pub mod error;
pub mod paths;
pub mod review;
pub mod risk;
pub mod stats;
pub mod store;
pub mod task;
pub mod temporal;
pub mod tracker;
