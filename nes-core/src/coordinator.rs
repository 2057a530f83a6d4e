//! Coordinator: source polling, translation and publication.
//!
//! Runs at the lowest priority. It never touches the NES pins; its only
//! output is the byte published through the [`ResponderLink`].

use core::future::poll_fn;
use core::task::Poll;

use gcn64_proto::GcReport;

use crate::mode::MappingMode;
use crate::scheduler::PollScheduler;
use crate::shared::ResponderLink;
use crate::source::{SourceAdapter, SourceError};
use crate::translate::{Translation, Translator};
use crate::types::NesButtons;

/// Result of one [`Coordinator::step`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PollOutcome {
    /// Not the right moment to read the source.
    Idle,
    /// Source read, nothing new.
    Unchanged,
    /// New buttons published.
    Updated(NesButtons),
    /// Source read failed. Nothing-pressed is published once the
    /// controller is gone, see [`Coordinator`].
    SourceFailed(SourceError),
}

/// Consecutive failed reads after which held buttons are released even
/// though the controller still answers.
pub const FAILURE_LIMIT: u8 = 8;

/// Owns the source and keeps the published NES byte current.
///
/// # Error Handling
///
/// A garbled read ([`SourceError::Framing`]) keeps the published byte; the
/// next session brings another poll anyway. A controller that stops
/// answering ([`SourceError::NoResponse`]), or [`FAILURE_LIMIT`] failures in
/// a row, publishes the idle byte so a pulled cable never leaves a button
/// stuck. The next successful read is then translated even if the source
/// reports no change.
pub struct Coordinator<'a, S> {
    source: S,
    translator: Translator,
    scheduler: PollScheduler,
    report: GcReport,
    link: &'a ResponderLink,
    /// The published byte no longer reflects the source.
    stale: bool,
    /// Failed reads since the last good one.
    failures: u8,
}

impl<'a, S: SourceAdapter> Coordinator<'a, S> {
    /// Read the source once, pick the mapping mode from the buttons held and
    /// publish the first translation.
    ///
    /// The source must already be initialised. The mode is fixed from here
    /// on. A failed startup read falls back to [`MappingMode::Default`].
    pub fn boot(mut source: S, link: &'a ResponderLink) -> Self {
        let mut report = GcReport::NEUTRAL;
        let stale = match source.update() {
            Ok(()) => {
                source.build_report(&mut report);
                false
            }
            Err(err) => {
                warn!("no controller at boot: {:?}", err);
                true
            }
        };

        let mode = MappingMode::select(&report);
        info!("mapping mode: {:?}", mode);

        let translator = Translator::new(mode);
        link.publish(&translator.translate(&report));

        let mut scheduler = PollScheduler::new();
        scheduler.on_polled(link);

        Self {
            source,
            translator,
            scheduler,
            report,
            link,
            stale,
            failures: 0,
        }
    }

    /// Run forever: wait for the responder to finish a session, then step.
    pub async fn run(&mut self) -> ! {
        loop {
            self.wait_for_session().await;
            let _ = self.step();
        }
    }

    /// One scheduling round. Reads the source only if a session finished
    /// since the last read, or the responder is saturated.
    pub fn step(&mut self) -> PollOutcome {
        if self.link.take_completed() {
            self.scheduler.on_response();
        }
        if !self.scheduler.may_poll(self.link) {
            return PollOutcome::Idle;
        }

        let result = self.source.update();
        let outcome = self.refresh(result);
        // Re-arm only once the cell holds the fresh byte
        self.scheduler.on_polled(self.link);
        outcome
    }

    /// Publish whatever the read in `result` calls for.
    fn refresh(&mut self, result: Result<(), SourceError>) -> PollOutcome {
        if let Err(err) = result {
            self.failures = self.failures.saturating_add(1);
            let lost = err == SourceError::NoResponse || self.failures >= FAILURE_LIMIT;
            if !lost {
                debug!("controller read failed: {:?}", err);
            } else if !self.stale {
                warn!("controller lost: {:?}", err);
                self.link.publish(&Translation::IDLE);
                self.stale = true;
            }
            return PollOutcome::SourceFailed(err);
        }
        self.failures = 0;

        if !self.stale && !self.source.changed() {
            return PollOutcome::Unchanged;
        }

        if self.stale {
            debug!("controller back");
        }
        self.source.build_report(&mut self.report);
        let translation = self.translator.translate(&self.report);
        self.link.publish(&translation);
        self.stale = false;

        trace!("published {:?}", translation);
        PollOutcome::Updated(translation.buttons)
    }

    async fn wait_for_session(&self) {
        poll_fn(|cx| {
            self.link.register_completion(cx.waker());
            if self.link.completed_pending() || self.link.is_saturated() {
                Poll::Ready(())
            } else {
                Poll::Pending
            }
        })
        .await
    }

    #[inline]
    #[must_use]
    pub fn mode(&self) -> MappingMode {
        self.translator.mode()
    }

    /// Last report fetched from the source.
    #[inline]
    #[must_use]
    pub fn report(&self) -> &GcReport {
        &self.report
    }

    #[inline]
    #[must_use]
    pub fn link(&self) -> &'a ResponderLink {
        self.link
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn source_mut(&mut self) -> &mut S {
        &mut self.source
    }

    pub fn into_source(self) -> S {
        self.source
    }
}
