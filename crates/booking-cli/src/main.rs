//! `booking` — command-line front end for the booking engine.
//!
//! State lives in a JSON snapshot file (owners + bookings) that is loaded
//! at the start of each command and written back after mutations.
//!
//! # Usage
//!
//! ```bash
//! # Register an owner in a new snapshot
//! booking add-owner --snapshot cal.json --username carol --timezone Europe/Berlin
//!
//! # Book a weekly series for that owner
//! booking book --snapshot cal.json --owner carol \
//!     --start 2026-03-16T09:00:00Z --end 2026-03-16T10:00:00Z \
//!     --title Standup --repeat weekly --until 2026-04-30T00:00:00Z
//!
//! # Preview what a rule would produce
//! booking expand --start 2026-01-31T18:00:00Z --end 2026-01-31T19:00:00Z --repeat monthly
//!
//! # Is this window still in the future for a Tokyo owner?
//! booking check --start 2026-03-16T09:00:00Z --end 2026-03-16T10:00:00Z --timezone Asia/Tokyo
//!
//! # Keyword search
//! booking search --snapshot cal.json --keyword standup
//! ```

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use booking_engine::recurrence::Schedule;
use booking_engine::{
    describe_local, expand, validate_window, BookingError, BookingRequest, BookingService, Clock,
    EngineConfig, FixedClock, MemoryStore, OwnerProfile, RecurrenceKind, RecurrenceRule,
    Snapshot, SystemClock,
};
use chrono::{DateTime, Utc};
use clap::{Args, Parser, Subcommand, ValueEnum};
use serde::Serialize;
use serde_json::json;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "booking", version)]
#[command(about = "Validate, expand, and commit calendar bookings", long_about = None)]
struct Cli {
    /// JSON file with engine limits (max_occurrences, default_horizon_months)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the occurrences a recurrence rule produces
    Expand {
        #[command(flatten)]
        window: Window,
        #[command(flatten)]
        repeat: RepeatArgs,
    },
    /// Check whether a window is still in the future for a timezone
    Check {
        #[command(flatten)]
        window: Window,
        /// IANA timezone name (e.g., Europe/Berlin)
        #[arg(long)]
        timezone: String,
        /// Evaluate against this instant instead of the system clock
        #[arg(long)]
        now: Option<DateTime<Utc>>,
    },
    /// Register an owner in a snapshot (created if missing)
    AddOwner {
        #[arg(long)]
        snapshot: PathBuf,
        #[arg(long)]
        username: String,
        /// IANA timezone name
        #[arg(long)]
        timezone: String,
    },
    /// Create a booking (or series) and save the snapshot
    Book {
        #[arg(long)]
        snapshot: PathBuf,
        /// Owner username or id
        #[arg(long)]
        owner: String,
        #[command(flatten)]
        window: Window,
        #[arg(long, default_value = "")]
        title: String,
        #[arg(long)]
        location: Option<String>,
        #[arg(long)]
        category: Option<String>,
        #[command(flatten)]
        repeat: RepeatArgs,
        /// Evaluate against this instant instead of the system clock
        #[arg(long)]
        now: Option<DateTime<Utc>>,
    },
    /// Keyword search over a snapshot
    Search {
        #[arg(long)]
        snapshot: PathBuf,
        #[arg(long)]
        keyword: String,
        /// Restrict to one owner (username or id)
        #[arg(long)]
        owner: Option<String>,
    },
}

/// A `[start, end)` window in RFC 3339.
#[derive(Args)]
struct Window {
    #[arg(long)]
    start: DateTime<Utc>,
    #[arg(long)]
    end: DateTime<Utc>,
}

impl Window {
    fn ensure_ordered(&self) -> Result<()> {
        if self.start >= self.end {
            return Err(BookingError::InvalidTimeRange {
                start: self.start,
                end: self.end,
            }
            .into());
        }
        Ok(())
    }
}

#[derive(Args)]
struct RepeatArgs {
    #[arg(long, value_enum, default_value_t = Repeat::None)]
    repeat: Repeat,
    /// Steps between occurrences (default 1)
    #[arg(long)]
    interval: Option<u32>,
    /// Last instant on whose date an occurrence may start
    #[arg(long)]
    until: Option<DateTime<Utc>>,
}

#[derive(Clone, Copy, ValueEnum)]
enum Repeat {
    None,
    Daily,
    Weekly,
    Monthly,
}

impl RepeatArgs {
    fn rule(&self) -> RecurrenceRule {
        RecurrenceRule {
            kind: match self.repeat {
                Repeat::None => RecurrenceKind::None,
                Repeat::Daily => RecurrenceKind::Daily,
                Repeat::Weekly => RecurrenceKind::Weekly,
                Repeat::Monthly => RecurrenceKind::Monthly,
            },
            interval: self.interval,
            end_date: self.until,
        }
    }
}

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "booking=info,booking_engine=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Expand { window, repeat } => {
            window.ensure_ordered()?;
            let schedule = Schedule::resolve(
                &repeat.rule(),
                window.start,
                config.default_horizon_months,
            )
            .map_err(BookingError::from)?;
            let occurrences: Vec<_> =
                expand(window.start, window.end, schedule, config.max_occurrences).collect();
            print_json(&json!({
                "count": occurrences.len(),
                "occurrences": occurrences,
            }))?;
        }
        Commands::Check {
            window,
            timezone,
            now,
        } => {
            window.ensure_ordered()?;
            let now = now.unwrap_or_else(|| SystemClock.now());
            let verdict = validate_window(window.start, window.end, &timezone, now);
            let local_now = describe_local(now, &timezone)?;
            let local_start = describe_local(window.start, &timezone)?;
            let (error, message) = match &verdict {
                Ok(()) => (None, None),
                Err(violation) => {
                    let err = BookingError::from(violation.clone());
                    (Some(err.kind()), Some(err.to_string()))
                }
            };
            print_json(&json!({
                "valid": verdict.is_ok(),
                "error": error,
                "message": message,
                "now": local_now,
                "start": local_start,
            }))?;
        }
        Commands::AddOwner {
            snapshot,
            username,
            timezone,
        } => {
            // Reject unknown zones up front rather than on first booking.
            describe_local(SystemClock.now(), &timezone)?;
            let store = load_snapshot(&snapshot, true)?;
            let owner = OwnerProfile::new(username, timezone);
            store.insert_owner(owner.clone())?;
            save_snapshot(&snapshot, &store)?;
            info!(owner = %owner.id, username = %owner.username, "owner added");
            print_json(&owner)?;
        }
        Commands::Book {
            snapshot,
            owner,
            window,
            title,
            location,
            category,
            repeat,
            now,
        } => {
            let store = Arc::new(load_snapshot(&snapshot, false)?);
            let owner = resolve_owner(&store, &owner)?;

            let mut request = BookingRequest::new(owner.id, window.start, window.end)
                .with_title(title)
                .with_recurrence(repeat.rule());
            request.details.location = location;
            request.details.category = category;

            let service = service(&store, config);
            let created = match now {
                Some(now) => service.with_clock(FixedClock(now)).create_booking(request),
                None => service.create_booking(request),
            }
            .map_err(rejected)?;

            save_snapshot(&snapshot, &store)?;
            print_json(&created)?;
        }
        Commands::Search {
            snapshot,
            keyword,
            owner,
        } => {
            let store = Arc::new(load_snapshot(&snapshot, false)?);
            let owner_id = match owner {
                Some(name) => Some(resolve_owner(&store, &name)?.id),
                None => None,
            };
            let hits = service(&store, config)
                .search(&keyword, owner_id)
                .map_err(rejected)?;
            print_json(&hits)?;
        }
    }

    Ok(())
}

fn service(
    store: &Arc<MemoryStore>,
    config: EngineConfig,
) -> BookingService<Arc<MemoryStore>, Arc<MemoryStore>> {
    BookingService::new(store.clone(), store.clone()).with_config(config)
}

/// Attach the stable error kind so scripts can branch on it.
fn rejected(err: BookingError) -> anyhow::Error {
    let kind = serde_json::to_value(err.kind())
        .ok()
        .and_then(|v| v.as_str().map(str::to_owned))
        .unwrap_or_default();
    anyhow::Error::new(err).context(format!("booking rejected [{kind}]"))
}

fn load_config(path: Option<&Path>) -> Result<EngineConfig> {
    let Some(path) = path else {
        return Ok(EngineConfig::default());
    };
    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read config {}", path.display()))?;
    let config = EngineConfig::from_json(&raw)
        .with_context(|| format!("invalid config {}", path.display()))?;
    if config.max_occurrences == 0 {
        bail!("max_occurrences must be at least 1");
    }
    Ok(config)
}

fn load_snapshot(path: &Path, create_if_missing: bool) -> Result<MemoryStore> {
    if create_if_missing && !path.exists() {
        return Ok(MemoryStore::new());
    }
    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read snapshot {}", path.display()))?;
    let snapshot: Snapshot = serde_json::from_str(&raw)
        .with_context(|| format!("invalid snapshot {}", path.display()))?;
    Ok(MemoryStore::from_snapshot(snapshot))
}

fn save_snapshot(path: &Path, store: &MemoryStore) -> Result<()> {
    let snapshot = store.snapshot()?;
    let raw = serde_json::to_string_pretty(&snapshot)?;
    fs::write(path, raw).with_context(|| format!("failed to write snapshot {}", path.display()))
}

fn resolve_owner(store: &MemoryStore, name_or_id: &str) -> Result<OwnerProfile> {
    let snapshot = store.snapshot()?;
    snapshot
        .owners
        .into_iter()
        .find(|o| o.username == name_or_id || o.id.to_string() == name_or_id)
        .with_context(|| format!("no owner named '{name_or_id}' in snapshot"))
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
