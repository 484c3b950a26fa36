//! Core data types for course-equivalency extraction.

use serde::{Deserialize, Serialize};

/// Separator placed between conjoined course tokens on one side of a row.
pub const CONJUNCTION: &str = " + ";

/// One (receiving course, sending institution, sending course) record.
///
/// Uniqueness is defined over all three fields.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EquivalencyTriple {
    pub receiving_course: String,
    pub sending_institution: String,
    pub sending_course: String,
}

impl EquivalencyTriple {
    pub fn new(
        receiving_course: impl Into<String>,
        sending_institution: impl Into<String>,
        sending_course: impl Into<String>,
    ) -> Self {
        Self {
            receiving_course: receiving_course.into(),
            sending_institution: sending_institution.into(),
            sending_course: sending_course.into(),
        }
    }
}

/// A (receiving, sending) pair recovered from a single row.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CoursePair {
    pub receiving: String,
    pub sending: String,
}

impl CoursePair {
    pub fn new(receiving: impl Into<String>, sending: impl Into<String>) -> Self {
        Self {
            receiving: receiving.into(),
            sending: sending.into(),
        }
    }

    /// Attach the page-level institution name.
    pub fn with_institution(&self, institution: &str) -> EquivalencyTriple {
        EquivalencyTriple::new(&self.receiving, institution, &self.sending)
    }
}

/// Why a row was skipped by the filter chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExclusionReason {
    /// The row is a category separator, not an articulation.
    Grouping,
    /// The sending side is explicitly marked as not articulated.
    NotArticulated,
    /// One side joined to an empty string.
    EmptySide,
    /// Rejected by a caller-supplied filter.
    Custom(&'static str),
}

impl std::fmt::Display for ExclusionReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Grouping => write!(f, "grouping row"),
            Self::NotArticulated => write!(f, "no course articulated"),
            Self::EmptySide => write!(f, "empty side"),
            Self::Custom(name) => write!(f, "{name}"),
        }
    }
}

/// The fate of one equivalency row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RowOutcome {
    Extracted(CoursePair),
    Excluded(ExclusionReason),
    /// A sub-element lookup failed; the row contributes nothing.
    MalformedRow(String),
}

impl RowOutcome {
    pub fn pair(&self) -> Option<&CoursePair> {
        match self {
            Self::Extracted(pair) => Some(pair),
            _ => None,
        }
    }
}

/// Everything the extractor recovered from one stabilized page.
#[derive(Debug, Clone, Default)]
pub struct PageExtraction {
    pub institution: String,
    /// Deduplicated, first-seen order.
    pub pairs: Vec<CoursePair>,
    /// One entry per row element, document order.
    pub outcomes: Vec<RowOutcome>,
}

impl PageExtraction {
    /// Combine the pairs with the institution name.
    pub fn triples(&self) -> Vec<EquivalencyTriple> {
        self.pairs
            .iter()
            .map(|p| p.with_institution(&self.institution))
            .collect()
    }

    pub fn excluded_count(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| matches!(o, RowOutcome::Excluded(_)))
            .count()
    }

    pub fn malformed_count(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| matches!(o, RowOutcome::MalformedRow(_)))
            .count()
    }
}

/// Errors from reading a stored dataset.
#[derive(thiserror::Error, Debug)]
pub enum ArticulateError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid dataset: {0}")]
    InvalidInput(String),
}

/// Convenience result type.
pub type ArticulateResult<T> = Result<T, ArticulateError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pair_with_institution() {
        let pair = CoursePair::new("CS 61A", "CIS 22A");
        let triple = pair.with_institution("De Anza College");
        assert_eq!(triple, EquivalencyTriple::new("CS 61A", "De Anza College", "CIS 22A"));
    }

    #[test]
    fn test_page_extraction_counts() {
        let extraction = PageExtraction {
            institution: "CC1".to_string(),
            pairs: vec![CoursePair::new("A", "B")],
            outcomes: vec![
                RowOutcome::Extracted(CoursePair::new("A", "B")),
                RowOutcome::Excluded(ExclusionReason::Grouping),
                RowOutcome::Excluded(ExclusionReason::NotArticulated),
                RowOutcome::MalformedRow("lookup failed".to_string()),
            ],
        };
        assert_eq!(extraction.excluded_count(), 2);
        assert_eq!(extraction.malformed_count(), 1);
        assert_eq!(extraction.triples()[0].sending_institution, "CC1");
    }

    #[test]
    fn test_exclusion_reason_display() {
        assert_eq!(ExclusionReason::Grouping.to_string(), "grouping row");
        assert_eq!(ExclusionReason::Custom("lab-only").to_string(), "lab-only");
    }
}
