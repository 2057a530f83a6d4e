//! Change tracking between driver reads and report fetches.

use crate::types::GcReport;

/// Holds the latest decoded report and the one last handed to the consumer.
///
/// A driver stores every successful read with [`store`](Self::store); the
/// consumer asks [`changed`](Self::changed) and, when it wants the data,
/// calls [`fetch`](Self::fetch), which also marks the report as seen.
#[derive(Debug, Clone)]
pub struct ReportLatch {
    current: GcReport,
    fetched: Option<GcReport>,
}

impl ReportLatch {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            current: GcReport::NEUTRAL,
            fetched: None,
        }
    }

    /// Record a freshly read report.
    #[inline]
    pub fn store(&mut self, report: GcReport) {
        self.current = report;
    }

    /// True if the latest report differs from the last fetched one.
    ///
    /// Before the first fetch every report counts as changed.
    #[inline]
    #[must_use]
    pub fn changed(&self) -> bool {
        self.fetched != Some(self.current)
    }

    /// Hand out the latest report and remember it as seen.
    #[inline]
    pub fn fetch(&mut self) -> GcReport {
        self.fetched = Some(self.current);
        self.current
    }

    /// Latest report without marking it as seen.
    #[inline]
    #[must_use]
    pub const fn current(&self) -> &GcReport {
        &self.current
    }
}

impl Default for ReportLatch {
    fn default() -> Self {
        Self::new()
    }
}
