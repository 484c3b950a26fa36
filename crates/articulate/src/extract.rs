//! Structural extraction of course-equivalency pairs from a stabilized page.
//!
//! A page carries one institution label and many repeating equivalency rows.
//! Each row runs through an ordered filter chain; survivors have their
//! receiving and sending course tokens joined and become `CoursePair`s.
//! Problems inside a single row never abort the page.

use crate::renderer::{PageError, PageHandle, PageResult};
use crate::types::{CoursePair, ExclusionReason, PageExtraction, RowOutcome, CONJUNCTION};
use indexmap::IndexSet;

/// Text marking a sending side with no equivalent course.
pub const NOT_ARTICULATED_MARKER: &str = "No Course Articulated";

/// Prefix optionally carried by the institution label.
const INSTITUTION_PREFIX: &str = "from:";

/// CSS selectors locating each structural part of an agreement page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selectors {
    /// Page-level label naming the sending institution.
    pub institution: String,
    /// One repeating equivalency row.
    pub row: String,
    /// Present inside a row that is only a category separator.
    pub grouping_marker: String,
    /// Course tokens on the receiving side, relative to the row.
    pub receiving_tokens: String,
    /// Course tokens on the sending side, relative to the row.
    pub sending_tokens: String,
    /// Free-text paragraphs on the sending side, relative to the row.
    pub sending_notes: String,
}

impl Default for Selectors {
    fn default() -> Self {
        Self {
            institution: ".instSending .inst b".to_string(),
            row: ".articRow".to_string(),
            grouping_marker: ".geAreaCode".to_string(),
            receiving_tokens: ".rowReceiving .prefixCourseNumber".to_string(),
            sending_tokens: ".rowSending .prefixCourseNumber".to_string(),
            sending_notes: ".rowSending p".to_string(),
        }
    }
}

/// Marker facts about a row, gathered before any filter runs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RowMarkers {
    pub grouping: bool,
    pub sending_notes: Vec<String>,
}

/// A named exclusion rule applied to every row.
#[derive(Clone, Copy)]
pub struct RowFilter {
    pub name: &'static str,
    pub reason: ExclusionReason,
    pub matches: fn(&RowMarkers) -> bool,
}

impl std::fmt::Debug for RowFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RowFilter")
            .field("name", &self.name)
            .field("reason", &self.reason)
            .finish()
    }
}

fn is_grouping(markers: &RowMarkers) -> bool {
    markers.grouping
}

fn is_not_articulated(markers: &RowMarkers) -> bool {
    markers
        .sending_notes
        .iter()
        .any(|note| note.contains(NOT_ARTICULATED_MARKER))
}

/// Grouping rows first, then "not articulated" rows.
pub fn default_filters() -> Vec<RowFilter> {
    vec![
        RowFilter {
            name: "grouping",
            reason: ExclusionReason::Grouping,
            matches: is_grouping,
        },
        RowFilter {
            name: "not-articulated",
            reason: ExclusionReason::NotArticulated,
            matches: is_not_articulated,
        },
    ]
}

/// First filter in `filters` that rejects the row.
pub fn first_exclusion(filters: &[RowFilter], markers: &RowMarkers) -> Option<ExclusionReason> {
    filters
        .iter()
        .find(|f| (f.matches)(markers))
        .map(|f| f.reason)
}

/// Strip an optional `From:` marker from the institution label.
pub fn parse_institution_label(text: &str) -> String {
    let text = text.trim();
    match text.get(..INSTITUTION_PREFIX.len()) {
        Some(head) if head.eq_ignore_ascii_case(INSTITUTION_PREFIX) => {
            text[INSTITUTION_PREFIX.len()..].trim().to_string()
        }
        _ => text.to_string(),
    }
}

/// Trim tokens, drop empty ones, and join the rest with `" + "`.
pub fn join_tokens<I, S>(tokens: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let parts: Vec<String> = tokens
        .into_iter()
        .map(|t| t.as_ref().trim().to_string())
        .filter(|t| !t.is_empty())
        .collect();
    parts.join(CONJUNCTION)
}

/// Recovers equivalency pairs from an agreement page.
#[derive(Debug, Clone)]
pub struct Extractor {
    selectors: Selectors,
    filters: Vec<RowFilter>,
}

impl Default for Extractor {
    fn default() -> Self {
        Self::new(Selectors::default())
    }
}

impl Extractor {
    pub fn new(selectors: Selectors) -> Self {
        Self {
            selectors,
            filters: default_filters(),
        }
    }

    /// Append an exclusion rule after the existing ones.
    pub fn with_filter(mut self, filter: RowFilter) -> Self {
        self.filters.push(filter);
        self
    }

    /// Institution name, or empty string when the label is missing.
    pub async fn institution<P: PageHandle>(&self, page: &P) -> String {
        let Ok(label) = page.find_element(&self.selectors.institution).await else {
            return String::new();
        };
        match page.text(&label).await {
            Ok(text) => parse_institution_label(&text),
            Err(_) => String::new(),
        }
    }

    async fn texts<P: PageHandle>(
        &self,
        page: &P,
        row: &P::Element,
        selector: &str,
    ) -> PageResult<Vec<String>> {
        let elements = page.find_within(row, selector).await?;
        let mut out = Vec::with_capacity(elements.len());
        for el in &elements {
            out.push(page.text(el).await?);
        }
        Ok(out)
    }

    async fn markers<P: PageHandle>(&self, page: &P, row: &P::Element) -> PageResult<RowMarkers> {
        let grouping = !page
            .find_within(row, &self.selectors.grouping_marker)
            .await?
            .is_empty();
        let sending_notes = if grouping {
            Vec::new()
        } else {
            self.texts(page, row, &self.selectors.sending_notes).await?
        };
        Ok(RowMarkers {
            grouping,
            sending_notes,
        })
    }

    async fn classify<P: PageHandle>(&self, page: &P, row: &P::Element) -> PageResult<RowOutcome> {
        let markers = self.markers(page, row).await?;
        if let Some(reason) = first_exclusion(&self.filters, &markers) {
            return Ok(RowOutcome::Excluded(reason));
        }

        let receiving = join_tokens(self.texts(page, row, &self.selectors.receiving_tokens).await?);
        let sending = join_tokens(self.texts(page, row, &self.selectors.sending_tokens).await?);
        if receiving.is_empty() || sending.is_empty() {
            return Ok(RowOutcome::Excluded(ExclusionReason::EmptySide));
        }
        Ok(RowOutcome::Extracted(CoursePair { receiving, sending }))
    }

    /// Classify every row on the page, in document order.
    ///
    /// Fails only if the rows themselves cannot be enumerated.
    pub async fn extract_rows<P: PageHandle>(&self, page: &P) -> Result<Vec<RowOutcome>, PageError> {
        let rows = page.find_elements(&self.selectors.row).await?;
        let mut outcomes = Vec::with_capacity(rows.len());
        for row in &rows {
            let outcome = self
                .classify(page, row)
                .await
                .unwrap_or_else(|e| RowOutcome::MalformedRow(e.to_string()));
            outcomes.push(outcome);
        }
        Ok(outcomes)
    }

    /// Institution name plus the page's distinct pairs in first-seen order.
    pub async fn extract<P: PageHandle>(&self, page: &P) -> Result<PageExtraction, PageError> {
        let institution = self.institution(page).await;
        let outcomes = self.extract_rows(page).await?;
        let pairs: IndexSet<CoursePair> = outcomes.iter().filter_map(RowOutcome::pair).cloned().collect();
        Ok(PageExtraction {
            institution,
            pairs: pairs.into_iter().collect(),
            outcomes,
        })
    }
}
