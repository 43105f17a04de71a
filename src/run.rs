//! One cleanup pass and the scheduler around it.

use std::time::Duration;

use chrono::Utc;
use color_eyre::eyre::{Context, Result, eyre};
use tokio::signal;
use tokio::sync::broadcast::error::RecvError;
use tokio::time::{self, Instant};
use tracing::{debug, error, info, warn};

use seedsweep_analyze::{Classification, ClassificationReport, Classifier, ReportSummary};
use seedsweep_client::{QbitClient, QbitConfig};
use seedsweep_core::CleanupConfig;
use seedsweep_scan::IndexBuilder;

use crate::report::{OutputFormat, TextReport};
use crate::schedule::Schedule;

/// What a single pass did.
#[derive(Debug, Clone, Copy)]
pub struct RunOutcome {
    pub summary: ReportSummary,
    pub tagged: usize,
}

/// Runs cleanup passes against one qBittorrent instance.
pub struct Sweeper {
    qbit: QbitConfig,
    cleanup: CleanupConfig,
    format: OutputFormat,
}

impl Sweeper {
    pub fn new(qbit: QbitConfig, cleanup: CleanupConfig, format: OutputFormat) -> Self {
        Self {
            qbit,
            cleanup,
            format,
        }
    }

    /// Fetch, index, classify, report and (unless dry run) tag.
    pub async fn run_once(&self) -> Result<RunOutcome> {
        let mut client = QbitClient::new(&self.qbit).wrap_err("Failed to create qBittorrent client")?;
        client
            .login()
            .await
            .wrap_err_with(|| format!("Failed to log in to {}", client.base_url()))?;

        match client.app_version().await {
            Ok(version) => info!(%version, url = %client.base_url(), "connected to qBittorrent"),
            Err(err) => warn!(error = %err, "could not read qBittorrent version"),
        }

        let torrents = client
            .inventory()
            .await
            .wrap_err("Failed to fetch torrent list")?;
        info!(torrents = torrents.len(), "fetched torrents");

        let builder = IndexBuilder::new().threads(self.cleanup.threads);
        let progress = tokio::spawn(log_progress(builder.subscribe()));

        let (index, torrents) = tokio::task::spawn_blocking(move || {
            let index = builder.build(&torrents);
            (index, torrents)
        })
        .await
        .wrap_err("Inode index task failed")?;
        let index = index.wrap_err("Failed to build inode index")?;
        progress.await.ok();

        for warning in &index.warnings {
            debug!(
                torrent = %warning.file.torrent,
                index = warning.file.index,
                path = %warning.path.display(),
                kind = ?warning.kind,
                "{}",
                warning.message
            );
        }
        info!(
            files = index.stats.total_files,
            inaccessible = index.stats.inaccessible_files,
            unique_inodes = index.unique_identities(),
            elapsed = ?index.build_duration,
            "inode index built"
        );

        let classifier = Classifier::new(self.cleanup.filter.clone());
        let report = classifier.classify(&index, &torrents, Utc::now());
        log_kept(&report);

        self.print(&report)?;

        let summary = report.summary();
        info!(
            kept = summary.kept,
            removable = summary.removable,
            skipped = summary.skipped,
            excluded = summary.excluded,
            anomalies = summary.anomalies,
            "classification finished"
        );

        let tagged = self.apply_tag(&client, &report).await?;
        Ok(RunOutcome { summary, tagged })
    }

    /// Run on `schedule` until Ctrl-C or SIGTERM.
    ///
    /// Failed passes are logged and the schedule continues.
    pub async fn run_scheduled(&self, schedule: &Schedule, run_on_start: bool) -> Result<()> {
        self.run_scheduled_until(schedule, run_on_start, shutdown_signal())
            .await
    }

    async fn run_scheduled_until(
        &self,
        schedule: &Schedule,
        run_on_start: bool,
        shutdown: impl Future<Output = ()>,
    ) -> Result<()> {
        if schedule.is_zero_interval() {
            return Err(eyre!("Schedule interval must be greater than zero"));
        }

        info!(%schedule, run_on_start, "scheduler started");
        tokio::pin!(shutdown);

        let mut next = if run_on_start {
            Some(Utc::now())
        } else {
            schedule.next_after(Utc::now())
        };

        loop {
            let Some(at) = next else {
                return Err(eyre!("Schedule '{schedule}' has no upcoming run"));
            };
            let wait = (at - Utc::now()).to_std().unwrap_or(Duration::ZERO);
            debug!(next_run = %at, "waiting for next run");

            tokio::select! {
                () = time::sleep_until(Instant::now() + wait) => {
                    info!("scheduled run starting");
                    if let Err(err) = self.run_once().await {
                        error!(error = %format!("{err:#}"), "scheduled run failed");
                    }
                }
                () = &mut shutdown => {
                    info!("received shutdown signal, stopping scheduler");
                    return Ok(());
                }
            }

            next = schedule.next_after(Utc::now());
        }
    }

    fn print(&self, report: &ClassificationReport) -> Result<()> {
        match self.format {
            OutputFormat::Text => {
                println!();
                print!("{}", TextReport::new(report, &self.cleanup.tag_removable));
            }
            OutputFormat::Json => {
                println!("{}", serde_json::to_string_pretty(report)?);
            }
        }
        Ok(())
    }

    async fn apply_tag(&self, client: &QbitClient, report: &ClassificationReport) -> Result<usize> {
        let ids = report.removable_ids();
        let tag = &self.cleanup.tag_removable;

        if self.cleanup.dry_run {
            info!(
                would_tag = ids.len(),
                %tag,
                "dry run, no changes made"
            );
            if self.format == OutputFormat::Text {
                println!();
                println!(" Dry run: no changes made.");
            }
            return Ok(0);
        }

        if ids.is_empty() {
            return Ok(0);
        }

        client
            .add_tags(&ids, tag)
            .await
            .wrap_err_with(|| format!("Failed to tag removable torrents with '{tag}'"))?;
        info!(tagged = ids.len(), %tag, "tagged removable torrents");
        if self.format == OutputFormat::Text {
            println!();
            println!(" Tagged {} torrent(s) with '{}'.", ids.len(), tag);
        }
        Ok(ids.len())
    }
}

async fn log_progress(mut rx: tokio::sync::broadcast::Receiver<seedsweep_scan::IndexProgress>) {
    loop {
        match rx.recv().await {
            Ok(progress) => info!(
                torrents = progress.torrents_indexed,
                total = progress.total_torrents,
                files = progress.files_queried,
                inaccessible = progress.inaccessible_files,
                files_per_sec = progress.files_per_second() as u64,
                "indexing"
            ),
            Err(RecvError::Lagged(_)) => continue,
            Err(RecvError::Closed) => break,
        }
    }
}

fn log_kept(report: &ClassificationReport) {
    for verdict in &report.verdicts {
        if let Classification::Kept { evidence } = &verdict.classification {
            debug!(
                torrent = %verdict.id,
                name = %verdict.name,
                file = %evidence.file_name,
                identity = %evidence.identity,
                hardlinks = evidence.hardlinks,
                torrent_refs = evidence.torrent_refs,
                "kept: external hardlink"
            );
        }
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = signal::ctrl_c().await {
            warn!(error = %err, "failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(err) => {
                warn!(error = %err, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {}
        () = terminate => {}
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use std::fs;
    use std::path::Path;

    use httpmock::prelude::*;
    use serde_json::json;
    use seedsweep_core::FilterConfig;

    /// `a` and `b` cross-seed one file; `c` is also linked from a library.
    fn seed_downloads(root: &Path) {
        for dir in ["a", "b", "c", "library"] {
            fs::create_dir_all(root.join(dir)).unwrap();
        }
        fs::write(root.join("a/movie.mkv"), b"movie").unwrap();
        fs::hard_link(root.join("a/movie.mkv"), root.join("b/movie.mkv")).unwrap();
        fs::write(root.join("c/show.mkv"), b"show").unwrap();
        fs::hard_link(root.join("c/show.mkv"), root.join("library/show.mkv")).unwrap();
    }

    fn mock_webui(server: &MockServer, root: &Path) {
        server.mock(|when, then| {
            when.method(POST).path("/api/v2/auth/login");
            then.status(200)
                .header("set-cookie", "SID=abc123; HttpOnly; path=/")
                .body("Ok.");
        });
        server.mock(|when, then| {
            when.method(GET).path("/api/v2/app/version");
            then.status(200).body("v4.6.2");
        });
        server.mock(|when, then| {
            when.method(GET).path("/api/v2/torrents/info");
            then.status(200)
                .header("content-type", "application/json")
                .json_body(json!([
                    {"hash": "a", "name": "Movie", "save_path": root.join("a"), "size": 5},
                    {"hash": "b", "name": "Movie", "save_path": root.join("b"), "size": 5},
                    {"hash": "c", "name": "Show", "save_path": root.join("c"), "size": 4}
                ]));
        });
        for (hash, file) in [("a", "movie.mkv"), ("b", "movie.mkv"), ("c", "show.mkv")] {
            server.mock(|when, then| {
                when.method(GET)
                    .path("/api/v2/torrents/files")
                    .query_param("hash", hash);
                then.status(200)
                    .header("content-type", "application/json")
                    .json_body(json!([{"index": 0, "name": file, "size": 5}]));
            });
        }
    }

    fn sweeper(server: &MockServer, dry_run: bool) -> Sweeper {
        let cleanup = CleanupConfig::builder()
            .filter(FilterConfig::permissive())
            .dry_run(dry_run)
            .threads(1usize)
            .build()
            .unwrap();
        Sweeper::new(
            QbitConfig::new(server.base_url(), 0, "admin", "secret"),
            cleanup,
            OutputFormat::Json,
        )
    }

    #[tokio::test]
    async fn dry_run_never_tags() {
        let temp = tempfile::tempdir().unwrap();
        seed_downloads(temp.path());
        let server = MockServer::start_async().await;
        mock_webui(&server, temp.path());
        let add_tags = server.mock(|when, then| {
            when.method(POST).path("/api/v2/torrents/addTags");
            then.status(200);
        });

        let outcome = sweeper(&server, true).run_once().await.unwrap();

        assert_eq!(outcome.summary.removable, 2);
        assert_eq!(outcome.summary.kept, 1);
        assert_eq!(outcome.tagged, 0);
        add_tags.assert_calls(0);
    }

    #[tokio::test]
    async fn tagging_sends_every_removable_hash_once() {
        let temp = tempfile::tempdir().unwrap();
        seed_downloads(temp.path());
        let server = MockServer::start_async().await;
        mock_webui(&server, temp.path());
        let add_tags = server.mock(|when, then| {
            when.method(POST)
                .path("/api/v2/torrents/addTags")
                .form_urlencoded_tuple("hashes", "a|b")
                .form_urlencoded_tuple("tags", "cross-seed-only");
            then.status(200);
        });

        let outcome = sweeper(&server, false).run_once().await.unwrap();

        assert_eq!(outcome.tagged, 2);
        add_tags.assert_calls(1);
    }

    #[tokio::test]
    async fn rejected_login_fails_the_run() {
        let server = MockServer::start_async().await;
        server.mock(|when, then| {
            when.method(POST).path("/api/v2/auth/login");
            then.status(200).body("Fails.");
        });

        assert!(sweeper(&server, true).run_once().await.is_err());
    }

    #[tokio::test]
    async fn failed_scheduled_runs_keep_the_scheduler_going() {
        let server = MockServer::start_async().await;
        let login = server.mock(|when, then| {
            when.method(POST).path("/api/v2/auth/login");
            then.status(200).body("Fails.");
        });

        let schedule = Schedule::Every(Duration::from_millis(50));
        sweeper(&server, true)
            .run_scheduled_until(&schedule, true, time::sleep(Duration::from_millis(500)))
            .await
            .unwrap();

        assert!(login.calls() >= 2);
    }

    #[tokio::test]
    async fn zero_interval_is_rejected() {
        let server = MockServer::start_async().await;
        let result = sweeper(&server, true)
            .run_scheduled(&Schedule::Every(Duration::ZERO), true)
            .await;
        assert!(result.is_err());
    }
}
