use std::fmt;
use std::time::Duration;

use prep_core::TimeFilter;
use prep_core::model::UserIdentity;
use services::StudyApiConfig;
use services::study_api::{DEFAULT_BASE_URL, DEFAULT_TIMEOUT};

#[derive(Debug)]
pub enum ArgsError {
    MissingValue { flag: &'static str },
    UnknownArg(String),
    UnknownCommand(String),
    InvalidDbUrl { raw: String },
    InvalidApiUrl { raw: String },
    InvalidUser { raw: String },
    InvalidTimeout { raw: String },
    InvalidFilter { raw: String },
    ConflictingFlags { first: &'static str, second: &'static str },
    MissingUser,
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::UnknownCommand(cmd) => write!(f, "unknown subcommand: {cmd}"),
            ArgsError::InvalidDbUrl { raw } => write!(f, "invalid --db value: {raw}"),
            ArgsError::InvalidApiUrl { raw } => write!(f, "invalid --api value: {raw}"),
            ArgsError::InvalidUser { raw } => write!(f, "invalid --user value: {raw:?}"),
            ArgsError::InvalidTimeout { raw } => {
                write!(f, "invalid --timeout value (expected whole seconds > 0): {raw}")
            }
            ArgsError::InvalidFilter { raw } => {
                write!(f, "invalid --filter value (expected all, week or month): {raw}")
            }
            ArgsError::ConflictingFlags { first, second } => {
                write!(f, "{first} cannot be combined with {second}")
            }
            ArgsError::MissingUser => {
                write!(f, "no user configured: set PREP_USER or pass --user <email>")
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

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Dashboard { filter: TimeFilter },
    Study { topics: Vec<String>, categories: Vec<String> },
    Quiz { category: Option<String>, resume: bool },
    Catalog,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub db_url: String,
    pub api: StudyApiConfig,
    pub user: Option<UserIdentity>,
    pub verbose: bool,
    pub command: Command,
}

impl AppConfig {
    pub fn require_user(&self) -> Result<UserIdentity, ArgsError> {
        self.user.clone().ok_or(ArgsError::MissingUser)
    }

    /// Resolve configuration from `env` first, then command-line `args`.
    ///
    /// Returns `Ok(None)` when help was requested.
    pub fn parse(
        args: impl IntoIterator<Item = String>,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<Option<Self>, ArgsError> {
        let mut db_url = env("PREP_DB_URL").map_or_else(
            || "sqlite://dev.sqlite3".to_string(),
            |raw| normalize_sqlite_url(&raw),
        );
        let mut api_url = env("PREP_API_BASE_URL").unwrap_or_else(|| DEFAULT_BASE_URL.into());
        let mut user = env("PREP_USER").map(parse_user).transpose()?;
        let mut timeout = env("PREP_TIMEOUT_SECS")
            .map(parse_timeout)
            .transpose()?
            .unwrap_or(DEFAULT_TIMEOUT);
        let mut verbose = false;

        let mut command_name: Option<String> = None;
        let mut positional: Vec<String> = Vec::new();
        let mut filter = TimeFilter::All;
        let mut categories: Vec<String> = Vec::new();
        let mut resume = false;

        let mut args = args.into_iter();
        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--db" => {
                    let value = require_value(&mut args, "--db")?;
                    if value.trim().is_empty() {
                        return Err(ArgsError::InvalidDbUrl { raw: value });
                    }
                    db_url = normalize_sqlite_url(&value);
                }
                "--api" => api_url = require_value(&mut args, "--api")?,
                "--user" => user = Some(parse_user(require_value(&mut args, "--user")?)?),
                "--timeout" => timeout = parse_timeout(require_value(&mut args, "--timeout")?)?,
                "--filter" => {
                    let value = require_value(&mut args, "--filter")?;
                    filter = value
                        .parse()
                        .map_err(|_| ArgsError::InvalidFilter { raw: value.clone() })?;
                }
                "--category" => categories.push(require_value(&mut args, "--category")?),
                "--resume" => resume = true,
                "--verbose" | "-v" => verbose = true,
                "--help" | "-h" => return Ok(None),
                flag if flag.starts_with("--") => return Err(ArgsError::UnknownArg(arg)),
                _ if command_name.is_none() => command_name = Some(arg),
                _ => positional.push(arg),
            }
        }

        let command = match command_name.as_deref().unwrap_or("dashboard") {
            "dashboard" => {
                if let Some(extra) = positional.into_iter().next() {
                    return Err(ArgsError::UnknownArg(extra));
                }
                Command::Dashboard { filter }
            }
            "study" => Command::Study {
                topics: positional,
                categories,
            },
            "quiz" => {
                if let Some(extra) = positional.into_iter().next() {
                    return Err(ArgsError::UnknownArg(extra));
                }
                if resume && !categories.is_empty() {
                    return Err(ArgsError::ConflictingFlags {
                        first: "--resume",
                        second: "--category",
                    });
                }
                Command::Quiz {
                    category: categories.into_iter().next(),
                    resume,
                }
            }
            "catalog" => Command::Catalog,
            other => return Err(ArgsError::UnknownCommand(other.to_string())),
        };

        let api = StudyApiConfig::new(&api_url, timeout)
            .map_err(|_| ArgsError::InvalidApiUrl { raw: api_url.clone() })?;

        Ok(Some(Self {
            db_url,
            api,
            user,
            verbose,
            command,
        }))
    }
}

fn parse_user(raw: String) -> Result<UserIdentity, ArgsError> {
    UserIdentity::new(raw.as_str()).ok_or(ArgsError::InvalidUser { raw })
}

fn parse_timeout(raw: String) -> Result<Duration, ArgsError> {
    match raw.trim().parse::<u64>() {
        Ok(secs) if secs > 0 => Ok(Duration::from_secs(secs)),
        _ => Err(ArgsError::InvalidTimeout { raw }),
    }
}

pub fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  cargo run -p app -- [options] dashboard [--filter all|week|month]");
    eprintln!("  cargo run -p app -- [options] study <topic>... [--category <title>]...");
    eprintln!("  cargo run -p app -- [options] quiz [--category <title> | --resume]");
    eprintln!("  cargo run -p app -- catalog");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  --db <sqlite_url>         SQLite URL (default: sqlite://dev.sqlite3)");
    eprintln!("  --api <url>               Study API base URL (default: {DEFAULT_BASE_URL})");
    eprintln!("  --user <email>            Identity attempts are recorded for");
    eprintln!("  --timeout <secs>          Content and quiz generation timeout (default: 5)");
    eprintln!("  -v, --verbose             Log service activity to stderr");
    eprintln!("  -h, --help                Show this help");
    eprintln!();
    eprintln!("Environment (same as flags):");
    eprintln!("  PREP_DB_URL, PREP_API_BASE_URL, PREP_USER, PREP_TIMEOUT_SECS, RUST_LOG");
}

#[must_use]
pub fn normalize_sqlite_url(raw: &str) -> String {
    if raw == "sqlite::memory:" || raw.starts_with("sqlite://") {
        return raw.to_string();
    }

    let trimmed = raw.trim();
    let path_str = trimmed.strip_prefix("sqlite:").unwrap_or(trimmed);
    let path = std::path::Path::new(path_str);
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .unwrap_or_else(|_| std::path::PathBuf::from("."))
            .join(path)
    };
    format!("sqlite://{}", absolute.display())
}
