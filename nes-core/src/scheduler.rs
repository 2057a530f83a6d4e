//! Poll scheduler: decides when a blocking source read is safe.
//!
//! The source read takes hundreds of microseconds with the responder
//! preempting it at any time, so reads are tied to responder activity: right
//! after a session has finished the console is not going to latch again for
//! a while. If the console latches faster than the coordinator can keep up,
//! the responder saturates, goes quiet, and the next read is forced.

use crate::shared::ResponderLink;

/// Edge-triggered poll gate, owned by the coordinator.
#[derive(Debug, Default)]
pub struct PollScheduler {
    /// At least one session finished since the last poll.
    pending: bool,
}

impl PollScheduler {
    #[must_use]
    pub const fn new() -> Self {
        Self { pending: false }
    }

    /// A responder session finished.
    #[inline]
    pub fn on_response(&mut self) {
        self.pending = true;
    }

    /// Whether the coordinator may read the source now.
    #[inline]
    #[must_use]
    pub fn may_poll(&self, link: &ResponderLink) -> bool {
        self.pending || link.is_saturated()
    }

    /// A source read just happened: restart the count and re-enable the
    /// responder if saturation had shut it off.
    pub fn on_polled(&mut self, link: &ResponderLink) {
        self.pending = false;
        link.reset_reuse();
        if !link.is_armed() {
            link.rearm();
        }
    }
}
