//! GameCube controller to NES console adapter for RP2040.
//!
//! # Overview
//!
//! The firmware runs on a Raspberry Pi Pico (RP2040) and:
//! 1. Polls a GameCube controller over joybus whenever the NES bus is quiet
//! 2. Translates the report into the eight NES buttons
//! 3. Answers the console's latch/clock reads from an interrupt-priority task
//!
//! # Hardware Configuration
//!
//! | Function     | GPIO | Description |
//! |--------------|------|-------------|
//! | Joybus       | 2    | GameCube controller data (PIO0 SM0) |
//! | NES latch    | 3    | From console |
//! | NES clock    | 4    | From console |
//! | NES data     | 5    | To console |
//!
//! # Architecture
//!
//! Two executors:
//!
//! - **Thread mode**: the [`Coordinator`] polls the controller after each
//!   NES read and publishes the translated byte
//! - **SWI_IRQ_1**: the responder task, woken by the latch edge, shifts the
//!   published byte out while spinning on the clock line
//!
//! They share a single static [`ResponderLink`]. The joybus bits themselves
//! are clocked by a PIO state machine, so the responder preempting the
//! coordinator mid-poll does not stretch them.
//!
//! # Features
//!
//! - **`dev-panic`** (default): Use `panic-probe` for development (prints panic info via RTT)
//! - **`prod-panic`**: Use `panic-reset` for production (silent watchdog reset)

#![no_std]

#[cfg(all(feature = "dev-panic", feature = "prod-panic"))]
compile_error!("Cannot enable both `dev-panic` and `prod-panic` features");

// Re-export core types for convenience
pub use nes_core::{
    Coordinator, MappingMode, NesButtons, PollOutcome, Responder, ResponderConfig, ResponderLink,
    SourceAdapter, SourceError,
};

pub mod gc_pad;
pub mod nes_port;

pub use gc_pad::{GcPad, JoybusProgram};
pub use nes_port::{nes_responder, NesResponder};

use embassy_time::Duration;

/// Time the controller needs after power-up before its first poll.
pub const SETTLE_TIME: Duration = Duration::from_millis(500);
