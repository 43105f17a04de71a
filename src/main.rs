//! seedsweep - Find qBittorrent torrents that only exist for cross-seeding.
//!
//! Usage:
//!   seedsweep                    Single run (dry run by default)
//!   seedsweep run                Single run, ignoring --schedule
//!   seedsweep --schedule '0 */6 * * *'
//!                                Run on a cron schedule until interrupted
//!   seedsweep --schedule 6h      Run every 6 hours until interrupted
//!   seedsweep --help             Show help
//!
//! Every option can also be set through the environment variable named in
//! `--help`.

mod logging;
mod report;
mod run;
mod schedule;

use std::path::PathBuf;

use clap::builder::BoolishValueParser;
use clap::{ArgAction, Args, Parser, Subcommand};
use color_eyre::eyre::{Context, Result};
use tracing::info;

use seedsweep_client::QbitConfig;
use seedsweep_core::{CleanupConfig, DEFAULT_TAG_REMOVABLE, FilterConfig, split_list};

use crate::report::OutputFormat;
use crate::run::Sweeper;
use crate::schedule::Schedule;

#[derive(Parser)]
#[command(
    name = "seedsweep",
    version,
    about = "Find qBittorrent torrents that only exist for cross-seeding",
    long_about = "seedsweep checks the hardlink count of every file of every torrent. \
                  A torrent whose files are linked only by other torrents in the client \
                  is tagged as removable; anything linked from elsewhere (a media \
                  library) is kept.\n\n\
                  Runs are dry by default. Pass `--dry-run false` to apply the tag."
)]
struct Cli {
    #[command(flatten)]
    settings: Settings,

    /// Output format
    #[arg(short, long, default_value = "text", global = true)]
    format: OutputFormat,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Run one cleanup pass and exit
    Run,
}

#[derive(Args, Debug)]
struct Settings {
    /// qBittorrent host, optionally with scheme (http://, https://)
    #[arg(long, env = "QB_HOST", default_value = "localhost")]
    host: String,

    /// qBittorrent WebUI port
    #[arg(long, env = "QB_PORT", default_value_t = 8080)]
    port: u16,

    /// WebUI user name
    #[arg(long, env = "QB_USERNAME", default_value = "admin")]
    username: String,

    /// WebUI password
    #[arg(long, env = "QB_PASSWORD", default_value = "", hide_env_values = true)]
    password: String,

    /// Tag applied to removable torrents
    #[arg(long, env = "TAG_REMOVABLE", default_value = DEFAULT_TAG_REMOVABLE)]
    tag_removable: String,

    /// Comma-separated tags that protect a torrent
    #[arg(long, env = "EXCLUDE_TAGS", default_value = "pinned,keep")]
    exclude_tags: String,

    /// Comma-separated categories to skip
    #[arg(long, env = "EXCLUDE_CATEGORIES", default_value = "")]
    exclude_categories: String,

    /// Comma-separated categories to consider (empty = all)
    #[arg(long, env = "INCLUDE_CATEGORIES", default_value = "")]
    include_categories: String,

    /// Skip torrents added fewer than this many days ago (0 = off)
    #[arg(long, env = "MIN_AGE_DAYS", default_value_t = 0)]
    min_age_days: u32,

    /// Report only, do not tag
    #[arg(
        long,
        env = "DRY_RUN",
        default_value_t = true,
        action = ArgAction::Set,
        value_parser = BoolishValueParser::new()
    )]
    dry_run: bool,

    /// Also append logs to this file
    #[arg(long, env = "LOG_FILE")]
    log_file: Option<PathBuf>,

    /// Repeat the run on a cron expression ("0 */6 * * *", "@daily") or interval ("6h")
    #[arg(long, env = "SCHEDULE")]
    schedule: Option<Schedule>,

    /// With --schedule, run once immediately instead of waiting an interval
    #[arg(
        long,
        env = "RUN_ON_START",
        default_value_t = true,
        action = ArgAction::Set,
        value_parser = BoolishValueParser::new()
    )]
    run_on_start: bool,

    /// Threads for file metadata queries (0 = all cores, 1 = sequential)
    #[arg(long, env = "THREADS", default_value_t = 0)]
    threads: usize,
}

impl Settings {
    fn qbit_config(&self) -> QbitConfig {
        QbitConfig::new(&self.host, self.port, &self.username, &self.password)
    }

    fn cleanup_config(&self) -> Result<CleanupConfig> {
        let filter = FilterConfig::builder()
            .exclude_tags(split_list(&self.exclude_tags))
            .exclude_categories(split_list(&self.exclude_categories))
            .include_categories(split_list(&self.include_categories))
            .min_age_days(self.min_age_days)
            .build()
            .wrap_err("Invalid filter configuration")?;

        CleanupConfig::builder()
            .filter(filter)
            .tag_removable(self.tag_removable.trim())
            .dry_run(self.dry_run)
            .threads(self.threads)
            .build()
            .wrap_err("Invalid cleanup configuration")
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;

    let cli = Cli::parse();
    let _guard = logging::init(cli.settings.log_file.as_deref())?;

    let cleanup = cli.settings.cleanup_config()?;
    info!(
        dry_run = cleanup.dry_run,
        tag = %cleanup.tag_removable,
        exclude_tags = ?cleanup.filter.exclude_tags,
        exclude_categories = ?cleanup.filter.exclude_categories,
        include_categories = ?cleanup.filter.include_categories,
        min_age_days = cleanup.filter.min_age_days,
        "starting seedsweep"
    );

    let sweeper = Sweeper::new(cli.settings.qbit_config(), cleanup, cli.format);

    match (cli.command, cli.settings.schedule) {
        (None, Some(schedule)) => {
            sweeper
                .run_scheduled(&schedule, cli.settings.run_on_start)
                .await?;
        }
        (Some(Command::Run), _) | (None, None) => {
            let outcome = sweeper.run_once().await?;
            info!(
                removable = outcome.summary.removable,
                tagged = outcome.tagged,
                "run complete"
            );
        }
    }

    Ok(())
}
