#![forbid(unsafe_code)]

mod commands;
mod config;
mod logging;

use std::io;

use prep_core::TopicCatalog;
use services::{AppServices, Clock};

use crate::config::{AppConfig, ArgsError, Command, print_usage};

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let parsed = AppConfig::parse(std::env::args().skip(1), |key| std::env::var(key).ok())
        .map_err(|e| {
            eprintln!("{e}");
            print_usage();
            e
        })?;
    let Some(config) = parsed else {
        print_usage();
        return Ok(());
    };

    logging::init_tracing(if config.verbose { "info" } else { "warn" });

    let stdout = io::stdout();
    let mut out = stdout.lock();

    if config.command == Command::Catalog {
        return commands::catalog(&TopicCatalog::xm_cloud(), &mut out);
    }

    let user = config.require_user()?;

    // Open + migrate SQLite at startup. Keep this in the binary glue so core/services stay pure.
    prepare_sqlite_file(&config.db_url)?;
    let services =
        AppServices::new_sqlite(&config.db_url, config.api.clone(), user, Clock::default()).await?;
    tracing::info!(db = %config.db_url, api = %config.api.base_url, "services ready");

    match &config.command {
        Command::Dashboard { filter } => commands::dashboard(&services, *filter, &mut out).await,
        Command::Study { topics, categories } => {
            commands::study(&services, topics, categories, &mut out).await
        }
        Command::Quiz { category, resume } => {
            let stdin = io::stdin();
            let mut input = stdin.lock();
            commands::quiz(&services, category.as_deref(), *resume, &mut input, &mut out).await
        }
        Command::Catalog => Ok(()),
    }
}

fn prepare_sqlite_file(db_url: &str) -> Result<(), Box<dyn std::error::Error>> {
    if db_url == "sqlite::memory:" {
        return Ok(());
    }

    let path = db_url
        .strip_prefix("sqlite://")
        .ok_or_else(|| ArgsError::InvalidDbUrl {
            raw: db_url.to_string(),
        })?;
    let path = path.split('?').next().unwrap_or(path);
    if path.is_empty() {
        return Err(ArgsError::InvalidDbUrl {
            raw: db_url.to_string(),
        }
        .into());
    }

    let path = std::path::Path::new(path);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    if !path.exists() {
        std::fs::OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(false)
            .open(path)?;
    }

    Ok(())
}

#[tokio::main]
async fn main() {
    if let Err(err) = run().await {
        eprintln!("{err}");
        std::process::exit(2);
    }
}
