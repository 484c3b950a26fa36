//! Cross-page aggregation: dedup by exact triple, then a stable sort on the
//! receiving course.

use crate::types::EquivalencyTriple;
use indexmap::IndexSet;

/// Accumulates triples page by page.
#[derive(Debug, Clone, Default)]
pub struct Aggregator {
    seen: IndexSet<EquivalencyTriple>,
}

impl Aggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one page's triples, in the order the page produced them.
    pub fn push_page<I>(&mut self, triples: I)
    where
        I: IntoIterator<Item = EquivalencyTriple>,
    {
        self.seen.extend(triples);
    }

    /// Distinct triples so far.
    pub fn len(&self) -> usize {
        self.seen.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }

    /// Distinct triples sorted by receiving course; ties keep first-seen order.
    pub fn finish(self) -> Vec<EquivalencyTriple> {
        let mut out: Vec<EquivalencyTriple> = self.seen.into_iter().collect();
        out.sort_by(|a, b| a.receiving_course.cmp(&b.receiving_course));
        out
    }
}

/// Merge per-page triple lists, processed in the given order.
pub fn aggregate<I, P>(pages: I) -> Vec<EquivalencyTriple>
where
    I: IntoIterator<Item = P>,
    P: IntoIterator<Item = EquivalencyTriple>,
{
    let mut agg = Aggregator::new();
    for page in pages {
        agg.push_page(page);
    }
    agg.finish()
}
