//! # tabkeep
//!
//! Inspect and edit the durable tab lifecycle state: the archive, the
//! activity map, the bookmark exclusion set and the effective settings.

#![deny(unsafe_code)]

mod commands;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tabkeep_core::SystemClock;
use tabkeep_core::constants::{NAME, VERSION};
use tabkeep_store::SqliteKvStore;

use crate::commands::Env;

/// tabkeep state tool.
#[derive(Parser, Debug)]
#[command(name = NAME, version = VERSION, about = "Inspect and edit tabkeep state")]
struct Cli {
    /// Path to the state database (defaults to `storage.dbPath`).
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    /// Path to the settings file (defaults to `~/.tabkeep/settings.json`).
    #[arg(long, global = true)]
    settings: Option<PathBuf>,

    /// Log level (overrides `logging.level`; `RUST_LOG` wins over both).
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
enum Command {
    /// Archived tabs.
    #[command(subcommand)]
    Archive(ArchiveCommand),
    /// Per-tab activity timestamps.
    #[command(subcommand)]
    Activity(ActivityCommand),
    /// URLs never auto-archived because a space bookmarks them.
    Excluded,
    /// Effective settings.
    #[command(subcommand)]
    Settings(SettingsCommand),
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
enum ArchiveCommand {
    /// List archived tabs, newest first.
    List {
        /// Print JSON instead of a table.
        #[arg(long)]
        json: bool,
    },
    /// Remove one archived tab.
    Remove {
        /// Archived URL.
        url: String,
        /// Space id it was archived from.
        space: i64,
    },
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
enum ActivityCommand {
    /// Show the last-active time of every tracked tab.
    Show {
        /// Print JSON instead of a table.
        #[arg(long)]
        json: bool,
    },
    /// Forget one tab's activity.
    Clear {
        /// Tab id.
        tab: i64,
    },
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
enum SettingsCommand {
    /// Print effective settings and the derived sweep period.
    Show,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Cli::parse();

    let settings = match &args.settings {
        Some(path) => tabkeep_settings::load_settings_from_path(path)
            .with_context(|| format!("Failed to load settings from {}", path.display()))?,
        None => tabkeep_settings::load_settings().with_context(|| {
            format!(
                "Failed to load settings from {}",
                tabkeep_settings::settings_path().display()
            )
        })?,
    };

    let level = args.log_level.as_deref().unwrap_or(&settings.logging.level);
    tabkeep_core::logging::init_subscriber(level);

    let db_path = args
        .db
        .clone()
        .unwrap_or_else(|| PathBuf::from(&settings.storage.db_path));
    tracing::debug!(db = %db_path.display(), "opening state database");
    let store = SqliteKvStore::open(&db_path)
        .with_context(|| format!("Failed to open state database {}", db_path.display()))?;

    let env = Env {
        store: Arc::new(store),
        clock: Arc::new(SystemClock),
        settings,
    };
    let mut out = std::io::stdout().lock();
    run(args.command, &env, &mut out).await
}

async fn run(command: Command, env: &Env, out: &mut impl std::io::Write) -> Result<()> {
    match command {
        Command::Archive(ArchiveCommand::List { json }) => {
            commands::archive_list(env, json, out).await
        }
        Command::Archive(ArchiveCommand::Remove { url, space }) => {
            commands::archive_remove(env, &url, space, out).await
        }
        Command::Activity(ActivityCommand::Show { json }) => {
            commands::activity_show(env, json, out).await
        }
        Command::Activity(ActivityCommand::Clear { tab }) => {
            commands::activity_clear(env, tab, out).await
        }
        Command::Excluded => commands::excluded_urls(env, out).await,
        Command::Settings(SettingsCommand::Show) => commands::settings_show(env, out),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_archive_list() {
        let cli = Cli::parse_from(["tabkeep", "archive", "list", "--json"]);
        assert_eq!(cli.command, Command::Archive(ArchiveCommand::List { json: true }));
        assert!(cli.db.is_none());
    }

    #[test]
    fn parses_archive_remove() {
        let cli = Cli::parse_from(["tabkeep", "archive", "remove", "https://a", "5"]);
        assert_eq!(
            cli.command,
            Command::Archive(ArchiveCommand::Remove {
                url: "https://a".into(),
                space: 5
            })
        );
    }

    #[test]
    fn global_flags_after_subcommand() {
        let cli = Cli::parse_from([
            "tabkeep",
            "activity",
            "clear",
            "12",
            "--db",
            "/tmp/x.db",
            "--log-level",
            "debug",
        ]);
        assert_eq!(cli.command, Command::Activity(ActivityCommand::Clear { tab: 12 }));
        assert_eq!(cli.db, Some(PathBuf::from("/tmp/x.db")));
        assert_eq!(cli.log_level.as_deref(), Some("debug"));
    }

    #[test]
    fn rejects_non_numeric_space() {
        assert!(Cli::try_parse_from(["tabkeep", "archive", "remove", "https://a", "work"]).is_err());
    }

    #[test]
    fn name_and_version_come_from_core() {
        use clap::CommandFactory;

        let cmd = Cli::command();
        assert_eq!(cmd.get_name(), NAME);
        assert_eq!(cmd.get_version(), Some(VERSION));
    }

    #[test]
    fn requires_subcommand() {
        assert!(Cli::try_parse_from(["tabkeep"]).is_err());
    }
}
