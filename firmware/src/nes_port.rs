//! NES controller port wiring.
//!
//! # Pins
//!
//! | Function | GPIO | Direction |
//! |----------|------|-----------|
//! | Latch    | 3    | in, from console |
//! | Clock    | 4    | in, from console |
//! | Data     | 5    | out, to console |
//!
//! The console side is 5 V; the lines need level shifting.

use embassy_rp::gpio::{Input, Level, Output, Pin, Pull};
use embassy_rp::Peri;
use nes_core::{Responder, ResponderConfig};

/// Responder bound to RP2040 GPIO.
pub type NesResponder = Responder<Input<'static>, Input<'static>, Output<'static>>;

/// Configure the three port pins and build the responder. Data starts idle.
///
/// Latch is pulled down and clock pulled up, so an unplugged console looks
/// like an idle bus.
#[must_use]
pub fn nes_responder(
    latch: Peri<'static, impl Pin>,
    clock: Peri<'static, impl Pin>,
    data: Peri<'static, impl Pin>,
) -> NesResponder {
    Responder::with_config(
        Input::new(latch, Pull::Down),
        Input::new(clock, Pull::Up),
        Output::new(data, Level::High),
        ResponderConfig::DEFAULT,
    )
}
