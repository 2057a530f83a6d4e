//! Platform-agnostic NES controller emulation fed by a GameCube controller.
//!
//! This crate holds everything between the two buses that does not depend on
//! a particular chip: translating GameCube reports into NES buttons, the
//! lock-free hand-off to the interrupt-level responder, the responder's
//! latch/clock state machine itself, and the poll scheduling that keeps the
//! slow source read out of the console's way.
//!
//! # Overview
//!
//! - [`types`]: NES button set and its active-low wire form ([`NesButtons`])
//! - [`mode`]: Boot-time mapping modes ([`MappingMode`])
//! - [`translate`]: GameCube report to NES buttons ([`Translator`])
//! - [`shared`]: State shared with the responder ([`ResponderLink`], [`PadCell`])
//! - [`responder`]: NES shift register emulation over embedded-hal pins ([`Responder`])
//! - [`scheduler`]: When a source read is allowed ([`PollScheduler`])
//! - [`source`]: Controller trait ([`SourceAdapter`])
//! - [`coordinator`]: Poll, translate, publish ([`Coordinator`])
//!
//! # Example
//!
//! ```rust
//! use gcn64_proto::{GcButtons, GcReport};
//! use nes_core::{MappingMode, NesButtons, Translator};
//!
//! let translator = Translator::new(MappingMode::Default);
//! let report = GcReport::with_buttons(GcButtons::A).with_stick(0x80, 0x20);
//! let out = translator.translate(&report);
//! assert_eq!(out.buttons, NesButtons::A | NesButtons::DOWN);
//! assert_eq!(out.buttons.wire_byte(), 0b0111_1011);
//! ```
//!
//! # Features
//!
//! - **`std`**: Enable standard library support (for host testing)
//! - **`defmt`**: Log through defmt (firmware)
//! - **`log`**: Log through the `log` facade (host tools)
//!
//! # No-std Support
//!
//! This crate is `#![no_std]` by default and uses no heap allocations.

#![cfg_attr(not(feature = "std"), no_std)]

#[cfg(feature = "std")]
extern crate std;

// This mod MUST go first, so that the others see its macros.
pub(crate) mod fmt;

pub mod coordinator;
pub mod mode;
pub mod responder;
pub mod scheduler;
pub mod shared;
pub mod source;
pub mod translate;
pub mod types;

// Re-export main types at crate root
pub use coordinator::{Coordinator, PollOutcome, FAILURE_LIMIT};
pub use mode::{MappingMode, ModeParams};
pub use responder::{Responder, ResponderConfig, SessionOutcome, SessionReport, Stage};
pub use scheduler::PollScheduler;
pub use shared::{PadCell, PadSnapshot, ResponderLink, REUSE_LIMIT};
pub use source::{SourceAdapter, SourceError};
pub use translate::{Translation, Translator};
pub use types::{NesButtons, WIRE_IDLE};
