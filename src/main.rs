//! ue CLI: recurring blocks, tasks, activity log and reviews.

use std::path::PathBuf;

use chrono::{Duration, NaiveDate, NaiveDateTime};
use clap::{Parser, Subcommand};
use miette::Result;

use utility_explorer::activity::{ActivityFilter, NewActivity};
use utility_explorer::block::{CompletionRecord, CompletionStatus};
use utility_explorer::config::Priority;
use utility_explorer::demo::seed_demo;
use utility_explorer::due::{DueDate, due_reference, parse_due_date, parse_optional};
use utility_explorer::paths::UePaths;
use utility_explorer::review::{
    self, Dashboard, EveningCheckIn, MonthReview, MorningBrief, WeekReview, WeekStatus,
};
use utility_explorer::task::{NewTask, Task, TaskFilter, TaskPriority, TaskStatus, TaskUpdate};
use utility_explorer::temporal::{days_before, effective_date};
use utility_explorer::tracker::{Tracker, TrackerOptions};

#[derive(Parser)]
#[command(name = "ue", version, about = "Track recurring blocks, deadlines and wins")]
struct Cli {
    /// Data directory for the store (overrides config and XDG defaults).
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Config file to use instead of the XDG location.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Keep everything in memory; nothing is written to disk.
    #[arg(long, global = true)]
    memory: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the config and data directories.
    Init,

    /// Show where config and data live.
    Paths,

    /// Recurring blocks: targets and daily check-ins.
    Block {
        #[command(subcommand)]
        action: BlockAction,
    },

    /// Deadline-bearing tasks.
    Task {
        #[command(subcommand)]
        action: TaskAction,
    },

    /// Categories and their priorities.
    Category {
        #[command(subcommand)]
        action: CategoryAction,
    },

    /// Log an activity by hand.
    Log {
        #[command(subcommand)]
        action: LogAction,
    },

    /// Show recent activity.
    Activity {
        /// Only this kind (win, application, commit, ...).
        #[arg(long)]
        kind: Option<String>,

        /// Only this category.
        #[arg(long)]
        category: Option<String>,

        /// How many days back to look.
        #[arg(long, default_value = "7")]
        days: u32,

        /// Maximum entries to show.
        #[arg(long, default_value = "20")]
        limit: usize,
    },

    /// Blocks that need attention this week.
    Risk,

    /// Morning brief.
    Am,

    /// Evening check-in.
    Pm,

    /// Week-to-date progress.
    Status,

    /// Today's activity and the last seven days.
    Dashboard,

    /// Weekly review.
    Week,

    /// Review of the last four weeks.
    Month,

    /// List days with nothing logged.
    Catchup,

    /// Fill the demo store with sample data (requires UE_DEMO=1).
    DemoSetup,
}

#[derive(Subcommand)]
enum BlockAction {
    /// Mark a block completed.
    Done {
        name: String,
        /// Date to log for (YYYY-MM-DD or "yesterday"); defaults to today.
        #[arg(long)]
        date: Option<String>,
        #[arg(long)]
        note: Option<String>,
        /// Minutes spent.
        #[arg(long)]
        duration: Option<u32>,
    },
    /// Mark a block skipped.
    Skip {
        name: String,
        #[arg(long)]
        reason: Option<String>,
        #[arg(long)]
        date: Option<String>,
    },
    /// Mark a block partially done.
    Partial {
        name: String,
        #[arg(long)]
        note: Option<String>,
        #[arg(long)]
        date: Option<String>,
        #[arg(long)]
        duration: Option<u32>,
    },
    /// Create or update a block's weekly target (0 = daily).
    Target {
        name: String,
        weekly: u32,
        #[arg(long)]
        category: Option<String>,
        /// Reactivate a deactivated block.
        #[arg(long)]
        activate: bool,
    },
    /// Stop tracking a block. History is kept.
    Deactivate { name: String },
    /// List blocks with this week's progress.
    List {
        /// Include deactivated blocks.
        #[arg(long)]
        all: bool,
    },
    /// Recent completion records.
    History {
        /// Only this block.
        name: Option<String>,
        #[arg(long, default_value = "14")]
        days: u32,
        #[arg(long, default_value = "50")]
        limit: usize,
    },
}

#[derive(Subcommand)]
enum TaskAction {
    /// Add a task.
    Add {
        title: String,
        /// today, tomorrow, fri, "next mon" or YYYY-MM-DD.
        #[arg(long)]
        due: Option<String>,
        #[arg(long)]
        category: Option<String>,
        #[arg(long, default_value = "normal")]
        priority: TaskPriority,
        #[arg(long)]
        note: Option<String>,
    },
    /// List tasks (pending by default).
    List {
        /// pending, done, cancelled or all.
        #[arg(long, default_value = "pending")]
        status: String,
        #[arg(long)]
        category: Option<String>,
    },
    /// Mark a task done.
    Done { id: u64 },
    /// Cancel a task.
    Cancel { id: u64 },
    /// Change a pending task. Use "none" to clear the due date or category.
    Edit {
        id: u64,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        due: Option<String>,
        #[arg(long)]
        category: Option<String>,
        #[arg(long)]
        priority: Option<TaskPriority>,
        #[arg(long)]
        note: Option<String>,
    },
    /// Show one task.
    Show { id: u64 },
    /// Pending tasks due soon.
    Upcoming {
        #[arg(long, default_value = "7")]
        days: u32,
    },
    /// Pending tasks past their due date.
    Overdue,
}

#[derive(Subcommand)]
enum CategoryAction {
    /// Add a category.
    Add {
        name: String,
        #[arg(long, default_value = "mid")]
        priority: Priority,
        #[arg(long, default_value = "blue")]
        color: String,
    },
    /// List categories, highest priority first.
    List,
    /// Change a category's priority or color.
    Set {
        name: String,
        #[arg(long)]
        priority: Option<Priority>,
        #[arg(long)]
        color: Option<String>,
    },
    /// Remove a category. Tagged records keep the tag.
    Remove { name: String },
}

#[derive(Subcommand)]
enum LogAction {
    /// Something that went well.
    Win {
        description: String,
        #[arg(long)]
        category: Option<String>,
        #[arg(long)]
        notes: Option<String>,
    },
    /// A job application.
    Application {
        company: String,
        #[arg(long)]
        role: Option<String>,
        #[arg(long)]
        category: Option<String>,
        #[arg(long)]
        notes: Option<String>,
    },
    /// Any other kind of activity.
    Custom {
        kind: String,
        description: String,
        #[arg(long)]
        category: Option<String>,
    },
}

fn main() -> Result<()> {
    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .unicode(true)
                .context_lines(3)
                .build(),
        )
    }))
    .ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let paths = UePaths::resolve()?;
    let now = chrono::Local::now().naive_local();
    let today = effective_date(now);

    let opts = TrackerOptions {
        config_path: Some(cli.config.clone().unwrap_or_else(|| paths.config_file())),
        data_dir: cli.data_dir.clone(),
        default_data_dir: Some(paths.data_dir.clone()),
        memory: cli.memory,
        demo: paths.demo,
    };

    match cli.command {
        Commands::Init => {
            if !cli.memory {
                paths.ensure_dirs()?;
            }
            let tracker = Tracker::open(opts)?;
            if let Some(path) = tracker.config_path() {
                if !path.exists() {
                    tracker.save_config()?;
                }
            }
            println!("Initialized utility-explorer");
            println!("{}", tracker.info(now));
        }

        Commands::Paths => {
            println!("Config dir: {}", paths.config_dir.display());
            println!("Data dir:   {}", paths.data_dir.display());
            println!("State dir:  {}", paths.state_dir.display());
            let tracker = Tracker::open(opts)?;
            println!("\n{}", tracker.info(now));
        }

        Commands::Block { action } => {
            let tracker = Tracker::open(opts)?;
            run_block(&tracker, action, today)?;
        }

        Commands::Task { action } => {
            let tracker = Tracker::open(opts)?;
            run_task(&tracker, action, now)?;
        }

        Commands::Category { action } => {
            let mut tracker = Tracker::open(opts)?;
            run_category(&mut tracker, action)?;
        }

        Commands::Log { action } => {
            let tracker = Tracker::open(opts)?;
            let new = match action {
                LogAction::Win {
                    description,
                    category,
                    notes,
                } => NewActivity::win(&description, category, notes.as_deref()),
                LogAction::Application {
                    company,
                    role,
                    category,
                    notes,
                } => NewActivity::application(&company, role.as_deref(), category, notes.as_deref()),
                LogAction::Custom {
                    kind,
                    description,
                    category,
                } => NewActivity::custom(&kind, &description, category),
            };
            let record = tracker.activity().append(new, now)?;
            println!("Logged {} #{}: {}", record.kind, record.id, record.description);
        }

        Commands::Activity {
            kind,
            category,
            days,
            limit,
        } => {
            let tracker = Tracker::open(opts)?;
            let since = days_before(today, days).and_hms_opt(0, 0, 0).unwrap_or(now);
            let filter = ActivityFilter {
                kind,
                category,
                since: Some(since),
                limit: Some(limit),
            };
            let records = tracker.activity().query(&filter)?;
            if records.is_empty() {
                println!("No activity in the last {days} days.");
            }
            for r in &records {
                let category = r.category.as_deref().map(|c| format!(" ({c})")).unwrap_or_default();
                println!(
                    "  {} [{}] {}{category}",
                    r.timestamp.format("%Y-%m-%d %H:%M"),
                    r.kind,
                    r.description
                );
            }
        }

        Commands::Risk => {
            let tracker = Tracker::open(opts)?;
            let risks = tracker.risks(today)?;
            if risks.is_empty() {
                println!("All blocks on track.");
            }
            for r in &risks {
                println!(
                    "  {:<14} {:<16} {} ({} remaining, {} days left)",
                    r.status.as_label(),
                    r.name,
                    r.progress_label(),
                    r.remaining,
                    r.days_left
                );
            }
        }

        Commands::Am => {
            let tracker = Tracker::open(opts)?;
            print!("{}", MorningBrief::build(&tracker, now)?);
        }

        Commands::Pm => {
            let tracker = Tracker::open(opts)?;
            print!("{}", EveningCheckIn::build(&tracker, now)?);
        }

        Commands::Status => {
            let tracker = Tracker::open(opts)?;
            print!("{}", WeekStatus::build(&tracker, now)?);
        }

        Commands::Dashboard => {
            let tracker = Tracker::open(opts)?;
            print!("{}", Dashboard::build(&tracker, now)?);
        }

        Commands::Week => {
            let tracker = Tracker::open(opts)?;
            print!("{}", WeekReview::build(&tracker, now)?);
        }

        Commands::Month => {
            let tracker = Tracker::open(opts)?;
            print!("{}", MonthReview::build(&tracker, now)?);
        }

        Commands::Catchup => {
            let tracker = Tracker::open(opts)?;
            let missed = review::missed_days(&tracker, today)?;
            if missed.is_empty() {
                println!("Nothing to catch up on.");
                return Ok(());
            }
            let targets = tracker.blocks().targets()?;
            println!("Days with nothing logged ({}):", missed.len());
            for day in &missed {
                let names: Vec<&str> = targets.iter().map(|t| t.name.as_str()).collect();
                println!("  {}  {}", day.format("%a %Y-%m-%d"), names.join(", "));
            }
            if let (Some(day), Some(target)) = (missed.last(), targets.first()) {
                println!(
                    "\nLog them with e.g. `ue block done \"{}\" --date {}` (or skip/partial).",
                    target.name, day
                );
            }
        }

        Commands::DemoSetup => {
            let mut tracker = Tracker::open(opts)?;
            let summary = seed_demo(&mut tracker, today)?;
            println!(
                "Seeded demo data: {} categories, {} blocks, {} completions, {} tasks, {} wins.",
                summary.categories,
                summary.targets,
                summary.completions,
                summary.tasks,
                summary.wins
            );
        }
    }

    Ok(())
}

/// `YYYY-MM-DD`, `today` or `yesterday`; absent means today.
fn log_date(raw: Option<&str>, today: NaiveDate) -> Result<NaiveDate> {
    let Some(raw) = raw else {
        return Ok(today);
    };
    match raw.trim().to_lowercase().as_str() {
        "today" => Ok(today),
        "yesterday" => Ok(today - Duration::days(1)),
        other => match NaiveDate::parse_from_str(other, "%Y-%m-%d") {
            Ok(date) => Ok(date),
            Err(_) => miette::bail!("invalid date \"{raw}\"; expected YYYY-MM-DD or yesterday"),
        },
    }
}

fn run_block(tracker: &Tracker, action: BlockAction, today: NaiveDate) -> Result<()> {
    let blocks = tracker.blocks();
    let log = |record: CompletionRecord| -> Result<()> {
        if blocks.get_target(&record.name)?.is_none() {
            println!(
                "Note: no target named \"{}\"; add one with `ue block target`.",
                record.name
            );
        }
        blocks.log_completion(&record)?;
        println!("{} {} on {}", record.name, record.status, record.date);
        Ok(())
    };

    match action {
        BlockAction::Done {
            name,
            date,
            note,
            duration,
        } => log(
            CompletionRecord::completed(name, log_date(date.as_deref(), today)?)
                .with_note(note)
                .with_duration(duration),
        )?,
        BlockAction::Skip { name, reason, date } => log(
            CompletionRecord::new(name, log_date(date.as_deref(), today)?, CompletionStatus::Skipped)
                .with_reason(reason),
        )?,
        BlockAction::Partial {
            name,
            note,
            date,
            duration,
        } => log(
            CompletionRecord::new(name, log_date(date.as_deref(), today)?, CompletionStatus::Partial)
                .with_note(note)
                .with_duration(duration),
        )?,
        BlockAction::Target {
            name,
            weekly,
            category,
            activate,
        } => {
            let mut target = blocks.set_target(&name, weekly, category)?;
            if activate && !target.active {
                target = blocks.set_active(&name, true)?;
            }
            let state = if target.active { "" } else { " (inactive)" };
            println!("{}: {}{state}", target.name, target.target_label());
        }
        BlockAction::Deactivate { name } => {
            blocks.set_active(&name, false)?;
            println!("Deactivated {name}. History is kept.");
        }
        BlockAction::List { all } => {
            let targets = if all {
                blocks.all_targets()?
            } else {
                blocks.targets()?
            };
            if targets.is_empty() {
                println!("No blocks yet. Add one with `ue block target <name> <weekly>`.");
            }
            for t in &targets {
                let done = blocks.week_completed_count(&t.name, today)?;
                let category = t.category.as_deref().unwrap_or("-");
                let state = if t.active { "" } else { "  inactive" };
                println!(
                    "  {:<16} {:<8} {:<14} {done} this week{state}",
                    t.name,
                    t.target_label(),
                    category
                );
            }
        }
        BlockAction::History { name, days, limit } => {
            let since = days_before(today, days);
            let records = blocks.history(name.as_deref(), Some(since), limit)?;
            if records.is_empty() {
                println!("No records in the last {days} days.");
            }
            for r in &records {
                let mut line = format!("  {}  {:<16} {}", r.date, r.name, r.status);
                if let Some(minutes) = r.duration_minutes {
                    line.push_str(&format!(" {minutes}m"));
                }
                if let Some(reason) = &r.reason {
                    line.push_str(&format!(" - {reason}"));
                }
                if let Some(note) = &r.note {
                    line.push_str(&format!(" ({note})"));
                }
                println!("{line}");
            }
        }
    }
    Ok(())
}

fn print_tasks(tasks: &[Task], today: NaiveDate) {
    if tasks.is_empty() {
        println!("No tasks.");
    }
    for t in tasks {
        let due = t
            .due
            .as_ref()
            .map(|d| format!(" due {d}"))
            .unwrap_or_default();
        let category = t.category.as_deref().map(|c| format!(" ({c})")).unwrap_or_default();
        let flag = if t.is_overdue(today) { " OVERDUE" } else { "" };
        println!(
            "  #{:<4} [{}] {}{category}{due}{flag}",
            t.id,
            t.priority.as_label(),
            t.title
        );
    }
}

/// "none" (or empty) clears an optional field on edit.
fn clearable(raw: Option<String>) -> Option<Option<String>> {
    raw.map(|v| {
        if v.trim().is_empty() || v.eq_ignore_ascii_case("none") {
            None
        } else {
            Some(v)
        }
    })
}

fn run_task(tracker: &Tracker, action: TaskAction, now: NaiveDateTime) -> Result<()> {
    let tasks = tracker.tasks();
    let today = due_reference(now);

    match action {
        TaskAction::Add {
            title,
            due,
            category,
            priority,
            note,
        } => {
            let task = tasks.add(
                NewTask {
                    title,
                    due: parse_optional(due.as_deref(), today),
                    category,
                    priority,
                    note,
                },
                now,
            )?;
            let due = task.due.as_ref().map(|d| format!(" (due {d})")).unwrap_or_default();
            println!("Added task #{}: {}{due}", task.id, task.title);
        }
        TaskAction::List { status, category } => {
            let status = match status.trim().to_lowercase().as_str() {
                "pending" => Some(TaskStatus::Pending),
                "done" => Some(TaskStatus::Done),
                "cancelled" | "canceled" => Some(TaskStatus::Cancelled),
                "all" => None,
                other => miette::bail!("unknown status \"{other}\"; use pending, done, cancelled or all"),
            };
            print_tasks(&tasks.list(&TaskFilter { status, category })?, now.date());
        }
        TaskAction::Done { id } => {
            let task = tasks.complete(id, now)?;
            println!("Completed #{}: {}", task.id, task.title);
        }
        TaskAction::Cancel { id } => {
            let task = tasks.cancel(id)?;
            println!("Cancelled #{}: {}", task.id, task.title);
        }
        TaskAction::Edit {
            id,
            title,
            due,
            category,
            priority,
            note,
        } => {
            let update = TaskUpdate {
                title,
                due: clearable(due).map(|d| d.map(|raw| parse_due_date(&raw, today))),
                category: clearable(category),
                priority,
                note,
            };
            if update.is_empty() {
                println!("Nothing to change.");
                return Ok(());
            }
            let (task, changed) = tasks.update(id, update)?;
            if changed {
                println!("Updated #{}: {}", task.id, task.title);
            }
        }
        TaskAction::Show { id } => {
            let task = tasks.require(id)?;
            println!("Task #{}: {}", task.id, task.title);
            println!("  status:    {}", task.status);
            println!("  priority:  {}", task.priority);
            if let Some(due) = &task.due {
                let resolved = match due {
                    DueDate::Date(_) => String::new(),
                    DueDate::Verbatim(_) if task.due_date().is_none() => " (unrecognized)".into(),
                    DueDate::Verbatim(_) => String::new(),
                };
                println!("  due:       {due}{resolved}");
            }
            if let Some(category) = &task.category {
                println!("  category:  {category}");
            }
            if let Some(note) = &task.note {
                println!("  note:      {note}");
            }
            println!("  created:   {}", task.created_at.format("%Y-%m-%d %H:%M"));
            if let Some(at) = task.completed_at {
                println!("  completed: {}", at.format("%Y-%m-%d %H:%M"));
            }
        }
        TaskAction::Upcoming { days } => {
            print_tasks(&tasks.upcoming(today, days)?, now.date());
        }
        TaskAction::Overdue => {
            // Wall-clock date, not the effective day.
            print_tasks(&tasks.overdue(now.date())?, now.date());
        }
    }
    Ok(())
}

fn run_category(tracker: &mut Tracker, action: CategoryAction) -> Result<()> {
    match action {
        CategoryAction::Add {
            name,
            priority,
            color,
        } => {
            tracker.config_mut().add_category(&name, priority, &color)?;
            tracker.save_config()?;
            println!("Added category {name} ({priority}, {color})");
        }
        CategoryAction::List => {
            for (name, cfg) in tracker.config().categories_by_priority() {
                println!("  {:<16} {:<5} {}", name, cfg.priority.as_label(), cfg.color);
            }
        }
        CategoryAction::Set {
            name,
            priority,
            color,
        } => {
            if priority.is_none() && color.is_none() {
                println!("Nothing to change.");
                return Ok(());
            }
            tracker
                .config_mut()
                .set_category(&name, priority, color.as_deref())?;
            tracker.save_config()?;
            println!("Updated category {name}");
        }
        CategoryAction::Remove { name } => {
            tracker.config_mut().remove_category(&name)?;
            tracker.save_config()?;
            println!("Removed category {name}");
        }
    }
    Ok(())
}
