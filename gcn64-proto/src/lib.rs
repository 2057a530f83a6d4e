//! GameCube controller report layout and joybus codec.
//!
//! This crate provides everything the adapter needs to know about the
//! GameCube side of the bridge, without any chip-specific dependencies:
//!
//! - **Types**: the fixed 8-byte report the rest of the firmware consumes
//!   - [`GcReport`] - One controller snapshot (axes, triggers, buttons)
//!   - [`GcButtons`] - Digital button bitfield (report bytes 6 and 7)
//!
//! - **Joybus**: the controller's single-wire serial protocol
//!   - [`command_bits()`] / [`command_word()`] - Serialize a command MSB first
//!   - [`ResponseAssembler`] - Collect sampled reply bits into bytes
//!   - [`decode_status()`] - Turn a raw status reply into a [`GcReport`]
//!
//! - **Change tracking**: [`ReportLatch`] remembers what was last handed out
//!   so a driver can answer "did anything change since the last fetch?"
//!
//! # Report Layout
//!
//! ```text
//! [0] stick X   [1] stick Y   [2] C-stick X   [3] C-stick Y
//! [4] L analog  [5] R analog  [6] buttons     [7] d-pad
//! ```
//!
//! Axes are centered at `0x80`. Stick Y grows upwards, as the controller
//! reports it.
//!
//! # Example
//!
//! ```
//! use gcn64_proto::{decode_status, GcButtons};
//!
//! // A held, sticks centered
//! let raw = [0x01, 0x80, 0x80, 0x80, 0x80, 0x80, 0x00, 0x00];
//! let report = decode_status(&raw).unwrap();
//! assert!(report.buttons().is_pressed(GcButtons::A));
//! assert_eq!(report.stick_x(), 0x80);
//! ```
//!
//! # Features
//!
//! - **`std`**: Enable standard library support (for host testing)
//! - **`defmt`**: Enable defmt formatting (for embedded logging)

#![cfg_attr(not(feature = "std"), no_std)]

#[cfg(feature = "std")]
extern crate std;

pub mod joybus;
pub mod latch;
pub mod types;

pub use joybus::{
    command_bits, command_word, decode_status, DecodeError, ResponseAssembler, CMD_IDENTIFY, CMD_POLL,
    CMD_POLL_RUMBLE, IDENTIFY_REPLY_LEN, STATUS_REPLY_LEN,
};
pub use latch::ReportLatch;
pub use types::{GcButtons, GcReport, AXIS_CENTER, REPORT_SIZE};
