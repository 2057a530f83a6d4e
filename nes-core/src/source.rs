//! Source adapter trait and error types.

use gcn64_proto::{DecodeError, GcReport};

/// Error type for source reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SourceError {
    /// The controller did not answer (unplugged, or not powered yet).
    NoResponse,
    /// The reply was truncated or had invalid fixed bits.
    Framing,
}

impl From<DecodeError> for SourceError {
    fn from(err: DecodeError) -> Self {
        match err {
            DecodeError::Framing => SourceError::Framing,
        }
    }
}

/// Blocking controller that feeds the adapter.
///
/// `update` performs one full read cycle and may block for the whole
/// exchange on the wire, so callers must only invoke it when the output bus
/// is known to be quiet.
///
/// # `no_std` Compatibility
///
/// All implementations must be `#![no_std]` compatible with no heap allocation.
pub trait SourceAdapter {
    /// One-time setup after power-on.
    fn init(&mut self);

    /// Read the controller once.
    fn update(&mut self) -> Result<(), SourceError>;

    /// True if the last successful `update` differs from the last report
    /// handed out by `build_report`.
    fn changed(&self) -> bool;

    /// Write the latest state into `report` and mark it as seen.
    fn build_report(&mut self, report: &mut GcReport);
}
