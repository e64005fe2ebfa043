//! Accumulating pages until the server runs out of rows.
//!
//! - an empty page ends pagination without adding anything
//! - a short page (fewer rows than `limit`) is the last one; its rows and its
//!   aggregates are recorded
//! - a full page adds rows only and moves the offset forward
//!
//! When the total is an exact multiple of `limit`, the final page is empty,
//! so one extra round trip is needed.

use std::collections::BTreeSet;

use serde::Serialize;
use tracing::debug;

use crate::error::TransportFailure;
use crate::model::{CallRecord, PageSummary, ResultPage};
use crate::query::PageSize;

/// What the collection loop should do after absorbing a page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageDecision {
    Finished,
    Continue { next_offset: u64 },
}

/// Why collection stopped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Completion {
    /// Pagination ran to the end.
    Exhausted,
    /// A poll returned a status outside the protocol.
    Unexpected { status: Option<String> },
    /// A transport failure after some rows had arrived.
    Degraded { failure: TransportFailure },
}

/// Final result handed back to the caller.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CollectedStatistics {
    pub rows: Vec<CallRecord>,
    pub summaries: Vec<PageSummary>,
    pub pages_fetched: usize,
    pub completion: Completion,
}

impl CollectedStatistics {
    /// Union of keys across all rows, sorted.
    pub fn columns(&self) -> Vec<String> {
        self.rows
            .iter()
            .flat_map(|row| row.keys().cloned())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    pub const fn is_complete(&self) -> bool {
        matches!(self.completion, Completion::Exhausted)
    }
}

/// Append-only buffer of rows and final-page aggregates.
#[derive(Debug, Default)]
pub struct Accumulator {
    rows: Vec<CallRecord>,
    summaries: Vec<PageSummary>,
    pages: usize,
}

impl Accumulator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn pages(&self) -> usize {
        self.pages
    }

    /// Absorbs the page fetched at `offset` and decides whether to go on.
    pub fn absorb(&mut self, page: ResultPage, limit: PageSize, offset: u64) -> PageDecision {
        self.pages += 1;
        let received = page.len();

        if page.is_empty() {
            debug!(offset, total = self.rows.len(), "empty page, pagination finished");
            return PageDecision::Finished;
        }

        self.rows.extend(page.rows);

        if received < limit.get() {
            self.summaries.push(page.summary);
            debug!(received, total = self.rows.len(), "short page, pagination finished");
            return PageDecision::Finished;
        }

        let next_offset = offset + received as u64;
        debug!(received, total = self.rows.len(), next_offset, "full page, requesting next");
        PageDecision::Continue { next_offset }
    }

    pub fn finish(self, completion: Completion) -> CollectedStatistics {
        CollectedStatistics {
            rows: self.rows,
            summaries: self.summaries,
            pages_fetched: self.pages,
            completion,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn page(rows: usize, calls: u64) -> ResultPage {
        ResultPage {
            rows: (0..rows)
                .map(|index| match json!({ "entry_id": index }) {
                    serde_json::Value::Object(map) => map,
                    _ => unreachable!(),
                })
                .collect(),
            summary: PageSummary {
                total_calls_count: calls,
                ..PageSummary::default()
            },
        }
    }

    #[test]
    fn empty_first_page_yields_empty_result() {
        let mut accumulator = Accumulator::new();
        assert_eq!(
            accumulator.absorb(page(0, 0), PageSize::Ten, 0),
            PageDecision::Finished
        );

        let result = accumulator.finish(Completion::Exhausted);
        assert!(result.rows.is_empty());
        assert!(result.summaries.is_empty());
        assert_eq!(result.pages_fetched, 1);
    }

    #[test]
    fn full_page_advances_offset_without_summary() {
        let mut accumulator = Accumulator::new();
        assert_eq!(
            accumulator.absorb(page(10, 25), PageSize::Ten, 20),
            PageDecision::Continue { next_offset: 30 }
        );
        let result = accumulator.finish(Completion::Exhausted);
        assert_eq!(result.rows.len(), 10);
        assert!(result.summaries.is_empty());
    }

    #[test]
    fn short_page_records_summary_and_stops() {
        let mut accumulator = Accumulator::new();
        accumulator.absorb(page(10, 14), PageSize::Ten, 0);
        assert_eq!(
            accumulator.absorb(page(4, 14), PageSize::Ten, 10),
            PageDecision::Finished
        );

        let result = accumulator.finish(Completion::Exhausted);
        assert_eq!(result.rows.len(), 14);
        assert_eq!(result.summaries.len(), 1);
        assert_eq!(result.summaries[0].total_calls_count, 14);
    }

    #[test]
    fn exact_multiple_needs_empty_terminator() {
        let mut accumulator = Accumulator::new();
        assert!(matches!(
            accumulator.absorb(page(5, 10), PageSize::Five, 0),
            PageDecision::Continue { next_offset: 5 }
        ));
        assert!(matches!(
            accumulator.absorb(page(5, 10), PageSize::Five, 5),
            PageDecision::Continue { next_offset: 10 }
        ));
        assert_eq!(
            accumulator.absorb(page(0, 0), PageSize::Five, 10),
            PageDecision::Finished
        );
        assert_eq!(accumulator.pages(), 3);
        assert_eq!(accumulator.row_count(), 10);
    }

    #[test]
    fn columns_are_the_union_of_row_keys() {
        let rows = vec![
            match json!({ "from": "100", "to": "200" }) {
                serde_json::Value::Object(map) => map,
                _ => unreachable!(),
            },
            match json!({ "from": "101", "records": ["r1"] }) {
                serde_json::Value::Object(map) => map,
                _ => unreachable!(),
            },
        ];
        let result = CollectedStatistics {
            rows,
            summaries: Vec::new(),
            pages_fetched: 1,
            completion: Completion::Exhausted,
        };
        assert_eq!(result.columns(), vec!["from", "records", "to"]);
        assert!(result.is_complete());
    }
}
