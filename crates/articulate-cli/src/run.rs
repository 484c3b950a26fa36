//! Batch entry point: launch, process every URL, aggregate, write.

use std::path::PathBuf;
use std::time::{Duration, Instant};

use articulate::renderer::chromium::ChromiumPage;
use articulate::{write_dataset_file, PageHandle, Session};
use tracing::info;

use crate::config::RunOptions;
use crate::error::{CliError, CliResult};

/// Outcome of a successful run.
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub rows: usize,
    pub pages: usize,
    pub failed_pages: usize,
    pub out: PathBuf,
    pub elapsed: Duration,
}

/// Launch Chromium and run the batch.
pub async fn run(options: RunOptions) -> CliResult<RunSummary> {
    let page = ChromiumPage::launch(&options.launch).await?;
    run_with_page(page, options).await
}

/// Run the batch on an already-acquired page handle.
///
/// The handle is closed before the output is written.
pub async fn run_with_page<P: PageHandle>(page: P, options: RunOptions) -> CliResult<RunSummary> {
    let started = Instant::now();
    let session = Session::new(page, options.session.clone());
    let report = session.run(&options.urls).await;
    let triples = report.triples();

    write_dataset_file(&options.out, &triples).map_err(|source| CliError::Output {
        path: options.out.clone(),
        source,
    })?;

    let elapsed = started.elapsed();
    info!(
        "✓ Wrote {} rows to {} in {:.2}s",
        triples.len(),
        options.out.display(),
        elapsed.as_secs_f64()
    );

    Ok(RunSummary {
        rows: triples.len(),
        pages: report.pages.len(),
        failed_pages: report.failed_count(),
        out: options.out,
        elapsed,
    })
}
