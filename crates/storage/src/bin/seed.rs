use std::fmt;

use chrono::{DateTime, Duration, Utc};
use prep_core::model::{NewAttempt, UserIdentity};
use prep_core::{Clock, TopicCatalog};
use storage::repository::AttemptRepository;
use storage::sqlite::SqliteRepository;

#[derive(Debug, Clone)]
struct Args {
    db_url: String,
    user: UserIdentity,
    days: u32,
    now: Option<DateTime<Utc>>,
}

#[derive(Debug)]
enum ArgsError {
    MissingValue { flag: &'static str },
    UnknownArg(String),
    InvalidUser { raw: String },
    InvalidDays { raw: String },
    InvalidDbUrl { raw: String },
    InvalidNow { raw: String },
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::InvalidUser { raw } => write!(f, "invalid --user value: {raw:?}"),
            ArgsError::InvalidDays { raw } => write!(f, "invalid --days value: {raw}"),
            ArgsError::InvalidDbUrl { raw } => write!(f, "invalid --db value: {raw}"),
            ArgsError::InvalidNow { raw } => {
                write!(f, "invalid --now value (expected RFC3339): {raw}")
            }
        }
    }
}

impl std::error::Error for ArgsError {}

fn require_value(
    args: &mut impl Iterator<Item = String>,
    flag: &'static str,
) -> Result<String, ArgsError> {
    args.next().ok_or(ArgsError::MissingValue { flag })
}

fn parse_user(raw: String) -> Result<UserIdentity, ArgsError> {
    UserIdentity::new(raw.as_str()).ok_or(ArgsError::InvalidUser { raw })
}

impl Args {
    fn parse() -> Result<Self, ArgsError> {
        let mut db_url =
            std::env::var("PREP_DB_URL").unwrap_or_else(|_| "sqlite:dev.sqlite3?mode=rwc".into());
        let mut user = parse_user(
            std::env::var("PREP_USER").unwrap_or_else(|_| "demo@example.com".into()),
        )?;
        let mut days = std::env::var("PREP_SEED_DAYS")
            .ok()
            .and_then(|value| value.parse::<u32>().ok())
            .unwrap_or(10);
        let mut now: Option<DateTime<Utc>> = None;

        let mut args = std::env::args().skip(1);
        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--db" => {
                    let value = require_value(&mut args, "--db")?;
                    if value.trim().is_empty() {
                        return Err(ArgsError::InvalidDbUrl { raw: value });
                    }
                    db_url = value;
                }
                "--user" => {
                    user = parse_user(require_value(&mut args, "--user")?)?;
                }
                "--days" => {
                    let value = require_value(&mut args, "--days")?;
                    days = value
                        .parse::<u32>()
                        .map_err(|_| ArgsError::InvalidDays { raw: value.clone() })?;
                }
                "--now" => {
                    let value = require_value(&mut args, "--now")?;
                    let parsed = DateTime::parse_from_rfc3339(&value)
                        .map_err(|_| ArgsError::InvalidNow { raw: value.clone() })?
                        .with_timezone(&Utc);
                    now = Some(parsed);
                }
                "--help" | "-h" => {
                    print_usage();
                    std::process::exit(0);
                }
                _ => return Err(ArgsError::UnknownArg(arg)),
            }
        }

        Ok(Self {
            db_url,
            user,
            days,
            now,
        })
    }
}

fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  cargo run -p storage --bin seed -- [options]");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  --db <sqlite_url>         SQLite URL (default: sqlite:dev.sqlite3?mode=rwc)");
    eprintln!("  --user <email>            Owner of the seeded attempts (default: demo@example.com)");
    eprintln!("  --days <n>                Days of history to generate, one quiz per day (default: 10)");
    eprintln!("  --now <rfc3339>           Fixed current time for deterministic seeding");
    eprintln!("  -h, --help                Show this help");
    eprintln!();
    eprintln!("Environment (same as flags):");
    eprintln!("  PREP_DB_URL, PREP_USER, PREP_SEED_DAYS");
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse().map_err(|e| {
        eprintln!("{e}");
        print_usage();
        e
    })?;

    let repo = SqliteRepository::connect(&args.db_url).await?;
    repo.migrate().await?;
    let now = args.now.unwrap_or_else(Utc::now);

    let topics: Vec<String> = TopicCatalog::xm_cloud()
        .categories()
        .iter()
        .flat_map(|c| c.topics().iter().take(2).cloned())
        .collect();
    if topics.is_empty() {
        return Ok(());
    }

    let mut inserted = 0_usize;
    for day in 0..args.days {
        let idx = day as usize;
        let batch = [&topics[idx % topics.len()], &topics[(idx * 3 + 1) % topics.len()]]
            .into_iter()
            .enumerate()
            .map(|(offset, topic)| {
                let total = 3;
                let score = (day + offset as u32) % (total + 1);
                NewAttempt::new(args.user.clone(), topic.as_str(), score, total)
            })
            .collect::<Result<Vec<_>, _>>()?;

        let taken_at = now - Duration::days(i64::from(day)) - Duration::hours(2);
        let stored = repo
            .clone()
            .with_clock(Clock::fixed(taken_at))
            .insert_attempts(&batch)
            .await?;
        inserted += stored.len();
    }

    println!(
        "Seeded {inserted} quiz attempts over {} days for {} into {}",
        args.days, args.user, args.db_url
    );

    Ok(())
}

#[tokio::main]
async fn main() {
    if let Err(err) = run().await {
        eprintln!("{err}");
        std::process::exit(2);
    }
}
