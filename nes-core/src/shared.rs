//! State shared between the coordinator and the responder.
//!
//! The responder runs in interrupt context and preempts the coordinator; the
//! coordinator never preempts the responder. Every field has one writer per
//! direction of hand-off and fits in one atomic access, so nothing here takes
//! a lock on the shift path.

use core::future::poll_fn;
use core::task::{Poll, Waker};

use embassy_sync::waitqueue::AtomicWaker;
use portable_atomic::{AtomicBool, AtomicU16, AtomicU8, Ordering};

use crate::translate::Translation;
use crate::types::{NesButtons, WIRE_IDLE};

/// Number of finished sessions without a poll at which the responder gives up.
pub const REUSE_LIMIT: u8 = u8::MAX;

/// One consistent (wire byte, turbo mask) pair, as the responder sees it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PadSnapshot {
    /// Byte for the data line, active low.
    pub wire: u8,
    /// Bits to toggle on turbo phases. Subset of the pressed (cleared) bits.
    pub turbo_mask: u8,
}

/// Lock-free cell holding the byte to shift out.
///
/// Wire byte and turbo mask share one 16-bit word: a single store publishes
/// both, a single load snapshots both.
pub struct PadCell(AtomicU16);

impl PadCell {
    /// Cell with nothing pressed.
    #[must_use]
    pub const fn new() -> Self {
        Self(AtomicU16::new(WIRE_IDLE as u16))
    }

    /// Replace the published state. Called by the translator side only.
    #[inline]
    pub fn publish(&self, translation: &Translation) {
        let word = (translation.turbo_mask().0 as u16) << 8 | translation.buttons.wire_byte() as u16;
        self.0.store(word, Ordering::Release);
    }

    /// Read the published state once.
    #[inline]
    #[must_use]
    pub fn snapshot(&self) -> PadSnapshot {
        let word = self.0.load(Ordering::Acquire);
        PadSnapshot {
            wire: word as u8,
            turbo_mask: (word >> 8) as u8,
        }
    }

    /// Currently published buttons.
    #[inline]
    #[must_use]
    pub fn buttons(&self) -> NesButtons {
        NesButtons::from_wire(self.snapshot().wire)
    }
}

impl Default for PadCell {
    fn default() -> Self {
        Self::new()
    }
}

/// Everything the responder shares with the rest of the firmware.
///
/// Lives in a `static`; the responder only ever gets a reference to this,
/// never to the coordinator's state.
pub struct ResponderLink {
    pad: PadCell,
    /// Sessions finished since the last source poll. Incremented by the
    /// responder, reset by the coordinator.
    reuse: AtomicU8,
    /// Responder trigger enabled. Cleared by the responder on saturation,
    /// set by the coordinator after a poll.
    armed: AtomicBool,
    /// A session finished since the coordinator last looked.
    completed: AtomicBool,
    completed_waker: AtomicWaker,
    armed_waker: AtomicWaker,
}

impl ResponderLink {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            pad: PadCell::new(),
            reuse: AtomicU8::new(0),
            armed: AtomicBool::new(true),
            completed: AtomicBool::new(false),
            completed_waker: AtomicWaker::new(),
            armed_waker: AtomicWaker::new(),
        }
    }

    #[inline]
    #[must_use]
    pub fn pad(&self) -> &PadCell {
        &self.pad
    }

    /// Publish a new translation for the next session.
    #[inline]
    pub fn publish(&self, translation: &Translation) {
        self.pad.publish(translation);
    }

    // --- responder side ---

    /// Record the end of a session. Returns `true` if the responder is now
    /// saturated and has disarmed itself.
    ///
    /// Must only be called from the responder context. The load/store pair is
    /// not a read-modify-write, which is sound because the coordinator cannot
    /// run between the two.
    pub fn finish_session(&self) -> bool {
        let reuse = self.reuse.load(Ordering::Relaxed).saturating_add(1);
        self.reuse.store(reuse, Ordering::Relaxed);

        let saturated = reuse >= REUSE_LIMIT;
        if saturated {
            self.armed.store(false, Ordering::Release);
        }

        self.completed.store(true, Ordering::Release);
        self.completed_waker.wake();
        saturated
    }

    /// Wait until the coordinator re-arms the trigger.
    pub async fn wait_armed(&self) {
        poll_fn(|cx| {
            self.armed_waker.register(cx.waker());
            if self.is_armed() {
                Poll::Ready(())
            } else {
                Poll::Pending
            }
        })
        .await
    }

    // --- coordinator side ---

    /// Clear and return the "session completed" flag.
    #[inline]
    pub fn take_completed(&self) -> bool {
        self.completed.swap(false, Ordering::AcqRel)
    }

    /// Peek at the "session completed" flag without clearing it.
    #[inline]
    #[must_use]
    pub fn completed_pending(&self) -> bool {
        self.completed.load(Ordering::Acquire)
    }

    /// Register the waker woken by [`finish_session`](Self::finish_session).
    #[inline]
    pub fn register_completion(&self, waker: &Waker) {
        self.completed_waker.register(waker);
    }

    /// Reset the reuse counter after a source poll.
    #[inline]
    pub fn reset_reuse(&self) {
        self.reuse.store(0, Ordering::Relaxed);
    }

    /// Re-enable the responder trigger.
    pub fn rearm(&self) {
        if !self.armed.swap(true, Ordering::AcqRel) {
            self.armed_waker.wake();
        }
    }

    // --- either side ---

    #[inline]
    #[must_use]
    pub fn reuse(&self) -> u8 {
        self.reuse.load(Ordering::Relaxed)
    }

    #[inline]
    #[must_use]
    pub fn is_armed(&self) -> bool {
        self.armed.load(Ordering::Acquire)
    }

    /// True once the reuse counter has hit [`REUSE_LIMIT`].
    #[inline]
    #[must_use]
    pub fn is_saturated(&self) -> bool {
        self.reuse() >= REUSE_LIMIT
    }
}

impl Default for ResponderLink {
    fn default() -> Self {
        Self::new()
    }
}
