//! Session orchestration: one page handle driven through many URLs.
//!
//! For each URL the session navigates, waits for minimal readiness, lets the
//! page converge, then extracts. Failures are contained per URL; the page
//! handle is released exactly once when the batch ends.

use crate::aggregate::Aggregator;
use crate::converge::{stabilize, ConvergenceConfig};
use crate::extract::Extractor;
use crate::renderer::{PageError, PageHandle};
use crate::types::EquivalencyTriple;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Default readiness element.
pub const DEFAULT_READINESS_SELECTOR: &str = "body";

/// Default bound on the readiness wait.
pub const DEFAULT_READINESS_TIMEOUT: Duration = Duration::from_secs(25);

/// Per-URL processing settings.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub readiness_selector: String,
    pub readiness_timeout: Duration,
    pub convergence: ConvergenceConfig,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self::for_intensity(10)
    }
}

impl SessionConfig {
    pub fn for_intensity(scroll_intensity: u32) -> Self {
        Self {
            readiness_selector: DEFAULT_READINESS_SELECTOR.to_string(),
            readiness_timeout: DEFAULT_READINESS_TIMEOUT,
            convergence: ConvergenceConfig::for_intensity(scroll_intensity),
        }
    }

    pub fn with_convergence(mut self, convergence: ConvergenceConfig) -> Self {
        self.convergence = convergence;
        self
    }
}

/// How processing of one URL ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageStatus {
    Complete,
    /// Readiness timed out; extraction still ran on whatever loaded.
    Degraded,
    /// Navigation or extraction failed; no triples.
    Failed(String),
}

/// Result of processing one URL.
#[derive(Debug, Clone)]
pub struct PageReport {
    pub url: String,
    pub institution: String,
    pub triples: Vec<EquivalencyTriple>,
    pub elapsed: Duration,
    pub status: PageStatus,
}

impl PageReport {
    fn failed(url: &str, started: Instant, reason: String) -> Self {
        Self {
            url: url.to_string(),
            institution: String::new(),
            triples: Vec::new(),
            elapsed: started.elapsed(),
            status: PageStatus::Failed(reason),
        }
    }
}

/// Reports for every URL of a batch, in processing order.
#[derive(Debug, Clone, Default)]
pub struct BatchReport {
    pub pages: Vec<PageReport>,
}

impl BatchReport {
    /// Aggregated, deduplicated, sorted triples across all pages.
    pub fn triples(&self) -> Vec<EquivalencyTriple> {
        let mut agg = Aggregator::new();
        for page in &self.pages {
            agg.push_page(page.triples.iter().cloned());
        }
        agg.finish()
    }

    pub fn failed_count(&self) -> usize {
        self.pages
            .iter()
            .filter(|p| matches!(p.status, PageStatus::Failed(_)))
            .count()
    }
}

/// Drives a single page handle through URLs sequentially.
pub struct Session<P: PageHandle> {
    page: P,
    extractor: Extractor,
    config: SessionConfig,
}

impl<P: PageHandle> Session<P> {
    pub fn new(page: P, config: SessionConfig) -> Self {
        Self {
            page,
            extractor: Extractor::default(),
            config,
        }
    }

    /// Replace the default extractor, e.g. to add row filters.
    pub fn with_extractor(mut self, extractor: Extractor) -> Self {
        self.extractor = extractor;
        self
    }

    /// Navigate, converge, and extract one URL.
    ///
    /// Never fails: problems are logged and reported in `PageReport::status`.
    pub async fn process_url(&mut self, url: &str) -> PageReport {
        info!("→ {url}");
        let started = Instant::now();

        if let Err(e) = self.page.navigate(url).await {
            warn!("failed on URL: {url} ({e})");
            return PageReport::failed(url, started, e.to_string());
        }

        let mut status = PageStatus::Complete;
        match self
            .page
            .wait_for_element(&self.config.readiness_selector, self.config.readiness_timeout)
            .await
        {
            Ok(()) => {}
            Err(PageError::Timeout(..)) => {
                warn!(
                    "timed out waiting for <{}> on {url}",
                    self.config.readiness_selector
                );
                status = PageStatus::Degraded;
            }
            Err(e) => {
                warn!("readiness check failed on {url}: {e}");
                status = PageStatus::Degraded;
            }
        }

        let convergence = stabilize(&self.page, &self.config.convergence).await;
        debug!(
            "converged={} after {} readings at height {}",
            convergence.converged, convergence.iterations, convergence.final_height
        );

        let extraction = match self.extractor.extract(&self.page).await {
            Ok(extraction) => extraction,
            Err(e) => {
                warn!("  · extract error: {e}");
                return PageReport::failed(url, started, e.to_string());
            }
        };

        let triples = extraction.triples();
        let elapsed = started.elapsed();
        info!(
            "  + {} mappings from {} (took {:.2}s)",
            triples.len(),
            extraction.institution,
            elapsed.as_secs_f64()
        );
        if extraction.malformed_count() > 0 {
            debug!("{} malformed rows skipped on {url}", extraction.malformed_count());
        }

        PageReport {
            url: url.to_string(),
            institution: extraction.institution,
            triples,
            elapsed,
            status,
        }
    }

    /// Process every URL in order, then release the page handle.
    pub async fn run<I, S>(mut self, urls: I) -> BatchReport
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut report = BatchReport::default();
        for url in urls {
            report.pages.push(self.process_url(url.as_ref()).await);
        }
        self.close().await;
        report
    }

    /// Release the page handle. Errors are logged and dropped.
    pub async fn close(self) {
        if let Err(e) = self.page.close().await {
            debug!("ignoring error while closing page: {e}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::renderer::fixture::{FixtureDocument, FixturePage, FixtureRow};
    use std::sync::atomic::Ordering;

    fn fast_config() -> SessionConfig {
        SessionConfig::for_intensity(1)
            .with_convergence(ConvergenceConfig::for_intensity(1).with_delay(Duration::ZERO))
    }

    fn agreement(institution: &str, rows: &[(&str, &str)]) -> FixtureDocument {
        rows.iter().fold(
            FixtureDocument::new().institution(institution).heights([100, 100, 100]),
            |doc, (r, s)| doc.row(FixtureRow::new().receiving([*r]).sending([*s])),
        )
    }

    #[test]
    fn test_for_intensity_iterations() {
        assert_eq!(SessionConfig::for_intensity(10).convergence.max_iterations, 30);
        assert_eq!(SessionConfig::for_intensity(2).convergence.max_iterations, 20);
        assert_eq!(SessionConfig::default().readiness_timeout, Duration::from_secs(25));
    }

    #[tokio::test]
    async fn test_process_url_builds_triples() {
        let page = FixturePage::new().with_document(
            "https://a",
            agreement("From: CC1", &[("CS 61A", "CIS 22A"), ("CS 61B", "CIS 22B")]),
        );
        let mut session = Session::new(page, fast_config());
        let report = session.process_url("https://a").await;

        assert_eq!(report.status, PageStatus::Complete);
        assert_eq!(report.institution, "CC1");
        assert_eq!(report.triples.len(), 2);
        assert!(report.triples.iter().all(|t| t.sending_institution == "CC1"));
    }

    #[tokio::test]
    async fn test_readiness_timeout_degrades_but_extracts() {
        let page = FixturePage::new().with_document(
            "https://slow",
            agreement("CC1", &[("CS 61A", "CIS 22A")]).never_ready(),
        );
        let mut session = Session::new(page, fast_config());
        let report = session.process_url("https://slow").await;
        assert_eq!(report.status, PageStatus::Degraded);
        assert_eq!(report.triples.len(), 1);
    }

    #[tokio::test]
    async fn test_extraction_failure_yields_empty() {
        let page = FixturePage::new()
            .with_document("https://bad", FixtureDocument::new().rows_fail());
        let mut session = Session::new(page, fast_config());
        let report = session.process_url("https://bad").await;
        assert!(matches!(report.status, PageStatus::Failed(_)));
        assert!(report.triples.is_empty());
    }

    #[tokio::test]
    async fn test_run_isolates_failures_and_closes_once() {
        let page = FixturePage::new()
            .with_document("https://a", agreement("CC1", &[("CS 61A", "CIS 22A")]))
            .with_document("https://b", agreement("CC2", &[("CS 61A", "COMSC 12")]))
            .failing_close();
        let closes = page.close_counter();
        let session = Session::new(page, fast_config());

        let report = session
            .run(["https://a", "https://missing", "https://b"])
            .await;

        assert_eq!(report.pages.len(), 3);
        assert_eq!(report.failed_count(), 1);
        assert_eq!(report.triples().len(), 2);
        assert_eq!(closes.load(Ordering::SeqCst), 1);
    }
}
