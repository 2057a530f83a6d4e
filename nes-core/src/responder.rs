//! Latch/clock responder: plays the NES controller's shift register.
//!
//! ```text
//!            __
//! Latch ____|  |________________________________________
//!       _________   _   _   _   _   _   _   _   ________
//! Clock          |_| |_| |_| |_| |_| |_| |_| |_|
//!
//! Data      |       |   |   |   |   |   |   |   |
//!           A       B   Sel St  U   D   L   R   idle
//! ```
//!
//! A session starts on the latch rising edge. Bit 7 (A) goes out at once,
//! since some games sample before the first clock. Each clock falling edge
//! shifts the next bit; one trailing edge returns the line to idle.
//!
//! Games disagree wildly on timing (13 to 25 µs per bit), read partially,
//! and latch twice in a row. Every wait is therefore bounded by a spin
//! budget, and a latch seen while waiting for the clock restarts the session
//! with a fresh byte.

use core::convert::Infallible;

use embedded_hal::digital::{InputPin, OutputPin, PinState};
use embedded_hal_async::digital::Wait;

use crate::shared::ResponderLink;

/// Responder tuning, fixed at build time.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ResponderConfig {
    /// Spin iterations (one latch read and one clock read each) before a
    /// wait gives up.
    pub spin_limit: u32,
    /// Turbo toggles every `1 << turbo_shift` triggers.
    pub turbo_shift: u8,
}

impl ResponderConfig {
    /// Roughly 150 µs per wait at 125 MHz, several clock periods of the
    /// slowest game observed.
    pub const DEFAULT: Self = Self {
        spin_limit: 2_500,
        turbo_shift: 2,
    };
}

impl Default for ResponderConfig {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Where a session was when it ran out of spin budget.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Stage {
    /// Latch never fell.
    LatchHeld,
    /// Waiting for the clock edge that shifts out this bit index.
    Shifting(u8),
    /// All bits out, trailing edge never came.
    Trailing,
}

/// How a session ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SessionOutcome {
    /// All eight bits and the trailing edge were clocked.
    Completed,
    /// The console stopped clocking. Not an error.
    TimedOut(Stage),
}

/// Summary of one [`Responder::respond`] call.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SessionReport {
    pub outcome: SessionOutcome,
    /// Wire byte of the final (non-restarted) pass, turbo applied.
    pub sent: u8,
    /// Latches that preempted a shift in progress.
    pub restarts: u16,
    /// The reuse counter hit its limit and the trigger is now disarmed.
    pub saturated: bool,
}

enum Edge {
    Fell,
    Relatched,
    TimedOut,
}

enum Pass {
    Relatched,
    Finished(SessionOutcome),
}

/// NES controller emulation on three pins.
///
/// `latch` and `clock` are inputs from the console, `data` drives the
/// console's serial input. Pin access must be infallible; GPIO on the
/// supported chips is.
pub struct Responder<L, C, D> {
    latch: L,
    clock: C,
    data: D,
    config: ResponderConfig,
    /// Wrapping count of latch triggers, drives the turbo cadence.
    triggers: u32,
}

impl<L, C, D> Responder<L, C, D>
where
    L: InputPin<Error = Infallible>,
    C: InputPin<Error = Infallible>,
    D: OutputPin<Error = Infallible>,
{
    /// Create a responder with the default config. The data line is set idle.
    pub fn new(latch: L, clock: C, data: D) -> Self {
        Self::with_config(latch, clock, data, ResponderConfig::DEFAULT)
    }

    pub fn with_config(latch: L, clock: C, data: D, config: ResponderConfig) -> Self {
        let mut responder = Self {
            latch,
            clock,
            data,
            config,
            triggers: 0,
        };
        responder.drive(true);
        responder
    }

    #[inline]
    #[must_use]
    pub fn config(&self) -> &ResponderConfig {
        &self.config
    }

    /// Answer one latch. Call right after the latch rising edge.
    ///
    /// Returns once the byte is out, the console stopped clocking, or a wait
    /// timed out; restarts internally on every re-latch. The data line is
    /// idle and the session is recorded on `link` when this returns.
    pub fn respond(&mut self, link: &ResponderLink) -> SessionReport {
        let mut restarts: u16 = 0;
        let (outcome, sent) = loop {
            let byte = self.load(link);
            match self.shift(byte) {
                Pass::Relatched => restarts = restarts.saturating_add(1),
                Pass::Finished(outcome) => break (outcome, byte),
            }
        };

        self.drive(true);
        let saturated = link.finish_session();

        SessionReport {
            outcome,
            sent,
            restarts,
            saturated,
        }
    }

    /// Answer latches forever.
    ///
    /// While the link is disarmed (saturation) the data line is held idle and
    /// latches are ignored until the coordinator re-arms.
    pub async fn serve(&mut self, link: &ResponderLink) -> !
    where
        L: Wait,
    {
        loop {
            if !link.is_armed() {
                self.drive(true);
                link.wait_armed().await;
            }

            let _ = self.latch.wait_for_rising_edge().await;
            let report = self.respond(link);
            if report.saturated {
                warn!("latched {:?} times without a poll, going quiet", link.reuse());
            }
        }
    }

    /// Give back the pins.
    pub fn into_parts(self) -> (L, C, D) {
        (self.latch, self.clock, self.data)
    }

    /// Snapshot the shared byte for a new pass and apply the turbo phase.
    fn load(&mut self, link: &ResponderLink) -> u8 {
        self.triggers = self.triggers.wrapping_add(1);
        let snapshot = link.pad().snapshot();
        if (self.triggers >> self.config.turbo_shift) & 1 != 0 {
            snapshot.wire ^ snapshot.turbo_mask
        } else {
            snapshot.wire
        }
    }

    fn shift(&mut self, byte: u8) -> Pass {
        self.drive(byte & 0x80 != 0);

        // Clock pulses only count once the latch pulse is over; a high latch
        // seen after that is a new latch.
        if !self.wait_latch_low() {
            return Pass::Finished(SessionOutcome::TimedOut(Stage::LatchHeld));
        }

        for bit in (0..7u8).rev() {
            match self.wait_clock_fall() {
                Edge::Fell => self.drive((byte >> bit) & 1 != 0),
                Edge::Relatched => return Pass::Relatched,
                Edge::TimedOut => {
                    return Pass::Finished(SessionOutcome::TimedOut(Stage::Shifting(bit)))
                }
            }
        }

        match self.wait_clock_fall() {
            Edge::Fell => Pass::Finished(SessionOutcome::Completed),
            Edge::Relatched => Pass::Relatched,
            Edge::TimedOut => Pass::Finished(SessionOutcome::TimedOut(Stage::Trailing)),
        }
    }

    #[inline(always)]
    fn wait_latch_low(&mut self) -> bool {
        for _ in 0..self.config.spin_limit {
            if !self.latch_high() {
                return true;
            }
        }
        false
    }

    /// Wait for clock high then low, watching the latch on every spin.
    #[inline(always)]
    fn wait_clock_fall(&mut self) -> Edge {
        let mut seen_high = false;
        for _ in 0..self.config.spin_limit {
            if self.latch_high() {
                return Edge::Relatched;
            }
            if self.clock_high() {
                seen_high = true;
            } else if seen_high {
                return Edge::Fell;
            }
        }
        Edge::TimedOut
    }

    #[inline(always)]
    fn latch_high(&mut self) -> bool {
        matches!(self.latch.is_high(), Ok(true))
    }

    #[inline(always)]
    fn clock_high(&mut self) -> bool {
        matches!(self.clock.is_high(), Ok(true))
    }

    #[inline(always)]
    fn drive(&mut self, high: bool) {
        let _ = self.data.set_state(PinState::from(high));
    }
}

#[cfg(test)]
mod tests {
    extern crate std;

    use super::*;
    use crate::scheduler::PollScheduler;
    use crate::shared::REUSE_LIMIT;
    use crate::translate::Translation;
    use crate::types::{NesButtons, WIRE_IDLE};
    use core::future::{poll_fn, Future};
    use core::pin::{pin, Pin};
    use core::task::{Context, Poll, RawWaker, RawWakerVTable, Waker};
    use embedded_hal::digital::ErrorType;
    use std::cell::RefCell;
    use std::rc::Rc;
    use std::vec;
    use std::vec::Vec;

    const TEST_CONFIG: ResponderConfig = ResponderConfig {
        spin_limit: 100,
        turbo_shift: 2,
    };

    const LATCH_END: u64 = 10;
    const FIRST_CLOCK: u64 = 20;
    const CLOCK_PERIOD: u64 = 10;
    const CLOCK_LOW: u64 = 3;

    /// Simulated console side of the bus. Every pin read advances time by
    /// one tick.
    struct Bus {
        tick: u64,
        /// Latch high intervals, `[start, end)`.
        latch: Vec<(u64, u64)>,
        /// Clock low intervals, `[start, end)`.
        clock_low: Vec<(u64, u64)>,
        /// Every level written to the data line.
        writes: Vec<bool>,
        /// Translation published to `link` once `tick` reaches the time.
        publish: Option<(u64, Translation, Rc<ResponderLink>)>,
        /// Rising edges `wait_for_rising_edge` will still deliver.
        queued_latches: usize,
    }

    impl Bus {
        fn advance(&mut self) -> u64 {
            self.tick += 1;
            let due = matches!(&self.publish, Some((at, _, _)) if self.tick >= *at);
            if due {
                if let Some((_, translation, link)) = self.publish.take() {
                    link.publish(&translation);
                }
            }
            self.tick
        }

        fn latch_level(&self, t: u64) -> bool {
            self.latch.iter().any(|&(s, e)| t >= s && t < e)
        }

        fn clock_level(&self, t: u64) -> bool {
            !self.clock_low.iter().any(|&(s, e)| t >= s && t < e)
        }

        /// Standard read: one latch pulse at tick 0 then `pulses` clocks.
        fn standard(&mut self, pulses: usize) {
            self.tick = 0;
            self.latch = vec![(0, LATCH_END)];
            self.clock_low = clock_train(FIRST_CLOCK, pulses);
        }
    }

    fn clock_train(start: u64, pulses: usize) -> Vec<(u64, u64)> {
        (0..pulses as u64)
            .map(|i| {
                let s = start + i * CLOCK_PERIOD;
                (s, s + CLOCK_LOW)
            })
            .collect()
    }

    struct LatchPin(Rc<RefCell<Bus>>);
    struct ClockPin(Rc<RefCell<Bus>>);
    struct DataPin(Rc<RefCell<Bus>>);

    impl ErrorType for LatchPin {
        type Error = Infallible;
    }

    impl ErrorType for ClockPin {
        type Error = Infallible;
    }

    impl ErrorType for DataPin {
        type Error = Infallible;
    }

    impl InputPin for LatchPin {
        fn is_high(&mut self) -> Result<bool, Infallible> {
            let mut bus = self.0.borrow_mut();
            let t = bus.advance();
            Ok(bus.latch_level(t))
        }

        fn is_low(&mut self) -> Result<bool, Infallible> {
            self.is_high().map(|high| !high)
        }
    }

    impl InputPin for ClockPin {
        fn is_high(&mut self) -> Result<bool, Infallible> {
            let mut bus = self.0.borrow_mut();
            let t = bus.advance();
            Ok(bus.clock_level(t))
        }

        fn is_low(&mut self) -> Result<bool, Infallible> {
            self.is_high().map(|high| !high)
        }
    }

    impl OutputPin for DataPin {
        fn set_low(&mut self) -> Result<(), Infallible> {
            self.0.borrow_mut().writes.push(false);
            Ok(())
        }

        fn set_high(&mut self) -> Result<(), Infallible> {
            self.0.borrow_mut().writes.push(true);
            Ok(())
        }
    }

    async fn never() {
        poll_fn(|_| Poll::<()>::Pending).await
    }

    impl Wait for LatchPin {
        async fn wait_for_rising_edge(&mut self) -> Result<(), Infallible> {
            let queued = self.0.borrow().queued_latches;
            if queued == 0 {
                never().await;
            }
            let mut bus = self.0.borrow_mut();
            bus.queued_latches -= 1;
            bus.standard(8);
            Ok(())
        }

        async fn wait_for_high(&mut self) -> Result<(), Infallible> {
            never().await;
            Ok(())
        }

        async fn wait_for_low(&mut self) -> Result<(), Infallible> {
            never().await;
            Ok(())
        }

        async fn wait_for_falling_edge(&mut self) -> Result<(), Infallible> {
            never().await;
            Ok(())
        }

        async fn wait_for_any_edge(&mut self) -> Result<(), Infallible> {
            never().await;
            Ok(())
        }
    }

    type TestResponder = Responder<LatchPin, ClockPin, DataPin>;

    fn rig() -> (TestResponder, Rc<RefCell<Bus>>) {
        let bus = Rc::new(RefCell::new(Bus {
            tick: 0,
            latch: Vec::new(),
            clock_low: Vec::new(),
            writes: Vec::new(),
            publish: None,
            queued_latches: 0,
        }));
        let responder = Responder::with_config(
            LatchPin(bus.clone()),
            ClockPin(bus.clone()),
            DataPin(bus.clone()),
            TEST_CONFIG,
        );
        bus.borrow_mut().writes.clear();
        (responder, bus)
    }

    fn link_with(buttons: NesButtons, turbo: bool) -> Rc<ResponderLink> {
        let link = Rc::new(ResponderLink::new());
        link.publish(&Translation { buttons, turbo });
        link
    }

    /// Data line levels for a full shift of `byte`, MSB first, then idle.
    fn shifted(byte: u8) -> Vec<bool> {
        let mut levels: Vec<bool> = (0..8).rev().map(|bit| (byte >> bit) & 1 != 0).collect();
        levels.push(true);
        levels
    }

    fn noop_waker() -> Waker {
        fn noop_raw_waker() -> RawWaker {
            fn noop(_: *const ()) {}
            fn clone(_: *const ()) -> RawWaker {
                noop_raw_waker()
            }
            static VTABLE: RawWakerVTable = RawWakerVTable::new(clone, noop, noop, noop);
            RawWaker::new(core::ptr::null(), &VTABLE)
        }

        unsafe { Waker::from_raw(noop_raw_waker()) }
    }

    fn poll_once<F: Future>(f: Pin<&mut F>) -> Poll<F::Output> {
        let waker = noop_waker();
        let mut cx = Context::from_waker(&waker);
        f.poll(&mut cx)
    }

    #[test]
    fn test_full_read_shifts_msb_first() {
        let (mut responder, bus) = rig();
        let buttons = NesButtons::A | NesButtons::START | NesButtons::LEFT;
        let link = link_with(buttons, false);
        bus.borrow_mut().standard(8);

        let report = responder.respond(&link);

        assert_eq!(report.outcome, SessionOutcome::Completed);
        assert_eq!(report.sent, buttons.wire_byte());
        assert_eq!(report.restarts, 0);
        assert!(!report.saturated);
        assert_eq!(bus.borrow().writes, shifted(buttons.wire_byte()));
        assert!(link.take_completed());
        assert_eq!(link.reuse(), 1);
    }

    #[test]
    fn test_idle_pad_shifts_all_ones() {
        let (mut responder, bus) = rig();
        let link = Rc::new(ResponderLink::new());
        bus.borrow_mut().standard(8);

        responder.respond(&link);

        assert_eq!(bus.borrow().writes, shifted(WIRE_IDLE));
    }

    #[test]
    fn test_no_clock_times_out_idle_high() {
        let (mut responder, bus) = rig();
        let link = link_with(NesButtons::A | NesButtons::B, false);
        bus.borrow_mut().standard(0);

        let report = responder.respond(&link);

        assert_eq!(report.outcome, SessionOutcome::TimedOut(Stage::Shifting(6)));
        // Pre-shift A bit (pressed), then idle
        assert_eq!(bus.borrow().writes, vec![false, true]);
        assert!(link.take_completed());
    }

    #[test]
    fn test_partial_read_times_out_mid_byte() {
        let (mut responder, bus) = rig();
        let buttons = NesButtons::B;
        let link = link_with(buttons, false);
        bus.borrow_mut().standard(3);

        let report = responder.respond(&link);

        assert_eq!(report.outcome, SessionOutcome::TimedOut(Stage::Shifting(3)));
        let expected = &shifted(buttons.wire_byte())[..4];
        let writes = bus.borrow().writes.clone();
        assert_eq!(&writes[..4], expected);
        assert_eq!(writes.last(), Some(&true));
    }

    #[test]
    fn test_missing_trailing_edge() {
        let (mut responder, bus) = rig();
        let link = link_with(NesButtons::RIGHT, false);
        bus.borrow_mut().standard(7);

        let report = responder.respond(&link);

        assert_eq!(report.outcome, SessionOutcome::TimedOut(Stage::Trailing));
        assert_eq!(bus.borrow().writes, shifted(NesButtons::RIGHT.wire_byte()));
    }

    #[test]
    fn test_stuck_latch_times_out() {
        let (mut responder, bus) = rig();
        let link = Rc::new(ResponderLink::new());
        {
            let mut bus = bus.borrow_mut();
            bus.latch = vec![(0, u64::MAX)];
            bus.clock_low = clock_train(FIRST_CLOCK, 8);
        }

        let report = responder.respond(&link);

        assert_eq!(report.outcome, SessionOutcome::TimedOut(Stage::LatchHeld));
        assert_eq!(bus.borrow().writes, vec![true, true]);
        assert!(link.take_completed());
    }

    #[test]
    fn test_relatch_restarts_with_fresh_byte_at_every_bit() {
        let old = NesButtons::A | NesButtons::SELECT | NesButtons::DOWN;
        let new = NesButtons::B | NesButtons::START | NesButtons::RIGHT;

        for pulses in 0..=7usize {
            let (mut responder, bus) = rig();
            let link = link_with(old, false);

            let relatch = FIRST_CLOCK + pulses as u64 * CLOCK_PERIOD + 5;
            {
                let mut bus = bus.borrow_mut();
                bus.tick = 0;
                bus.latch = vec![(0, LATCH_END), (relatch, relatch + LATCH_END)];
                let mut clocks = clock_train(FIRST_CLOCK, pulses);
                clocks.extend(clock_train(relatch + 2 * LATCH_END, 8));
                bus.clock_low = clocks;
                // Published mid-shift: must not leak into the first pass
                bus.publish = Some((LATCH_END / 2, Translation { buttons: new, turbo: false }, link.clone()));
            }

            let report = responder.respond(&link);

            let mut expected: Vec<bool> = shifted(old.wire_byte())[..=pulses].to_vec();
            expected.extend(shifted(new.wire_byte()));
            assert_eq!(report.outcome, SessionOutcome::Completed, "pulses {pulses}");
            assert_eq!(report.restarts, 1, "pulses {pulses}");
            assert_eq!(report.sent, new.wire_byte());
            assert_eq!(bus.borrow().writes, expected, "pulses {pulses}");
            // A restart is not a finished session
            assert_eq!(link.reuse(), 1);
        }
    }

    #[test]
    fn test_turbo_blinks_held_buttons_every_four_triggers() {
        let (mut responder, bus) = rig();
        let buttons = NesButtons::A | NesButtons::UP;
        let link = link_with(buttons, true);

        let mut a_levels = Vec::new();
        for _ in 0..8 {
            {
                let mut bus = bus.borrow_mut();
                bus.writes.clear();
                bus.standard(8);
            }
            let report = responder.respond(&link);
            let writes = bus.borrow().writes.clone();
            a_levels.push(writes[0]);
            // Up is not turbo-capable and stays pressed
            assert!(!writes[4]);
            // B was never pressed and never blinks
            assert!(writes[1]);
            assert_eq!(report.outcome, SessionOutcome::Completed);
        }

        // Triggers 1..=8: phase flips at 4 and 8. High = released.
        assert_eq!(
            a_levels,
            vec![false, false, false, true, true, true, true, false]
        );
    }

    #[test]
    fn test_turbo_off_leaves_byte_alone() {
        let (mut responder, bus) = rig();
        let link = link_with(NesButtons::A, false);
        for _ in 0..8 {
            bus.borrow_mut().standard(8);
            let report = responder.respond(&link);
            assert_eq!(report.sent, NesButtons::A.wire_byte());
        }
    }

    #[test]
    fn test_serve_answers_queued_latches() {
        let (mut responder, bus) = rig();
        let link = link_with(NesButtons::START, false);
        bus.borrow_mut().queued_latches = 3;

        {
            let mut serve = pin!(responder.serve(&link));
            assert!(poll_once(serve.as_mut()).is_pending());
        }

        assert_eq!(link.reuse(), 3);
        assert!(link.take_completed());
        assert_eq!(bus.borrow().queued_latches, 0);
    }

    #[test]
    fn test_saturation_goes_quiet_until_polled() {
        let (mut responder, bus) = rig();
        let link = link_with(NesButtons::A, false);
        let mut scheduler = PollScheduler::new();
        let extra = 20;
        bus.borrow_mut().queued_latches = REUSE_LIMIT as usize + extra;

        let mut serve = pin!(responder.serve(&link));
        assert!(poll_once(serve.as_mut()).is_pending());

        // Stopped answering at the limit, line idle, trigger off
        assert_eq!(link.reuse(), REUSE_LIMIT);
        assert!(!link.is_armed());
        assert_eq!(bus.borrow().queued_latches, extra);
        assert_eq!(bus.borrow().writes.last(), Some(&true));

        // Still quiet while nobody polls
        assert!(poll_once(serve.as_mut()).is_pending());
        assert_eq!(bus.borrow().queued_latches, extra);

        assert!(scheduler.may_poll(&link));
        scheduler.on_polled(&link);
        assert!(link.is_armed());
        assert_eq!(link.reuse(), 0);

        assert!(poll_once(serve.as_mut()).is_pending());
        assert_eq!(bus.borrow().queued_latches, 0);
        assert_eq!(link.reuse(), extra as u8);
    }
}
