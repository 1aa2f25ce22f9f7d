//! Library ingestion command.

use std::process::ExitCode;
use tokio::runtime::Runtime;

use super::open_library;
use crate::config::Config;
use crate::ingest::{
    FailurePolicy, IngestOptions, IngestReport, ReconciliationDriver, Selection, plan,
};
use crate::sources::{ManualIndex, SnapshotStore};

/// Ingest the selected collections, then recompute statistics.
///
/// Selection and planning errors surface before the database is touched.
/// Exits non-zero when any collection failed.
pub fn cmd_ingest(
    rt: &Runtime,
    config: &Config,
    ids: &[String],
    clear: bool,
    keep_going: bool,
) -> anyhow::Result<ExitCode> {
    let selection = Selection::parse(ids)?;
    let index = ManualIndex::load(&config.library.manual_dir)?;
    let snapshots = SnapshotStore::new(&config.library.snapshot_dir).load_all()?;
    let planned = plan(&selection, &index, snapshots)?;

    let policy = if keep_going || config.ingest.keep_going {
        FailurePolicy::KeepGoing
    } else {
        FailurePolicy::Abort
    };

    println!("Ingesting {} collection(s)...", planned.len());

    rt.block_on(async {
        let pool = open_library(config).await?;
        let driver = ReconciliationDriver::new(
            pool,
            IngestOptions {
                clear,
                policy,
                library: config.library.scope(),
            },
        );
        let report = driver.run(planned).await?;
        print_report(&report);

        let code = if report.is_success() {
            ExitCode::SUCCESS
        } else {
            ExitCode::FAILURE
        };
        Ok::<_, anyhow::Error>(code)
    })
}

fn print_report(report: &IngestReport) {
    println!();
    for c in &report.ingested {
        println!(
            "  ✓ {} [{}]: {} new tracks, {} reused, {} new artists",
            c.name, c.source, c.tracks_created, c.tracks_reused, c.artists_created
        );
    }
    for failure in &report.failed {
        println!("  ✗ {}: {}", failure.name, failure.error);
    }

    println!();
    println!(
        "{} ingested, {} failed, {} not attempted",
        report.ingested.len(),
        report.failed.len(),
        report.not_attempted
    );
    if let Some(stats) = &report.stats {
        println!(
            "Stats: {} collections, {} artists, {} duplicate tracks",
            stats.collections, stats.artists, stats.duplicates
        );
    }
}
