//! Joybus command encoding and reply decoding.
//!
//! The controller talks over one open-drain line. Every bit occupies a 4 µs
//! cell that starts with a falling edge:
//!
//! ```text
//!        ___     _________
//!  0:       |___________|        3 µs low, 1 µs high
//!        ___   ___________
//!  1:       |_|                  1 µs low, 3 µs high
//! ```
//!
//! Commands and replies are sent MSB first and terminated by a stop bit
//! (a lone 1 µs low pulse). A receiver samples the line 2 µs after each
//! falling edge.

use crate::types::{GcButtons, GcReport, REPORT_SIZE};

/// Identify command; the controller answers with 3 bytes of device info.
pub const CMD_IDENTIFY: [u8; 1] = [0x00];

/// Status poll with rumble off.
pub const CMD_POLL: [u8; 3] = [0x40, 0x03, 0x00];

/// Status poll with rumble on.
pub const CMD_POLL_RUMBLE: [u8; 3] = [0x40, 0x03, 0x01];

/// Reply length of [`CMD_IDENTIFY`].
pub const IDENTIFY_REPLY_LEN: usize = 3;

/// Reply length of [`CMD_POLL`].
pub const STATUS_REPLY_LEN: usize = 8;

/// Length of one bit cell in microseconds.
pub const BIT_CELL_US: u32 = 4;

/// Low time of a `0` bit in microseconds.
pub const ZERO_LOW_US: u32 = 3;

/// Low time of a `1` bit (and of the stop bit) in microseconds.
pub const ONE_LOW_US: u32 = 1;

/// Delay between a falling edge and the sampling point.
pub const SAMPLE_DELAY_US: u32 = 2;

/// Byte 1 bit 7 of a status reply is always set by a real controller.
const STATUS_FIXED_BIT: u8 = 0x80;

/// Error type for reply decoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DecodeError {
    /// A bit that is fixed by the protocol had the wrong value.
    Framing,
}

/// Iterate over the bits of a command, MSB first, without the stop bit.
///
/// # Example
///
/// ```
/// use gcn64_proto::command_bits;
///
/// let bits: [bool; 8] = {
///     let mut out = [false; 8];
///     for (slot, bit) in out.iter_mut().zip(command_bits(&[0x40])) {
///         *slot = bit;
///     }
///     out
/// };
/// assert_eq!(bits, [false, true, false, false, false, false, false, false]);
/// ```
pub fn command_bits(command: &[u8]) -> impl Iterator<Item = bool> + '_ {
    command
        .iter()
        .flat_map(|&byte| (0..8).rev().map(move |shift| (byte >> shift) & 1 != 0))
}

/// Pack a command of at most 4 bytes into one word, first bit in bit 31.
///
/// This is the layout a left-shifting serializer (such as an RP2040 PIO
/// output shift register) consumes MSB first.
///
/// # Panics
///
/// Panics if `command` is longer than 4 bytes.
#[must_use]
pub fn command_word(command: &[u8]) -> u32 {
    assert!(command.len() <= 4, "joybus command longer than one word");
    let mut bytes = [0u8; 4];
    bytes[..command.len()].copy_from_slice(command);
    u32::from_be_bytes(bytes)
}

/// Collects sampled reply bits, MSB first, into an `N`-byte buffer.
#[derive(Debug, Clone)]
pub struct ResponseAssembler<const N: usize> {
    bytes: [u8; N],
    bits: usize,
}

impl<const N: usize> ResponseAssembler<N> {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            bytes: [0; N],
            bits: 0,
        }
    }

    /// Append one sampled bit.
    ///
    /// Returns the completed reply once `N * 8` bits have been pushed. Bits
    /// pushed after that are ignored until [`reset`](Self::reset).
    pub fn push(&mut self, bit: bool) -> Option<[u8; N]> {
        if self.bits >= N * 8 {
            return None;
        }
        let index = self.bits / 8;
        self.bytes[index] = (self.bytes[index] << 1) | bit as u8;
        self.bits += 1;
        if self.bits == N * 8 {
            Some(self.bytes)
        } else {
            None
        }
    }

    /// Append the low `bits` bits of `word`, oldest bit first.
    ///
    /// A left-shifting deserializer delivers full words with the first bit in
    /// bit 31, and a final partial word right-aligned.
    pub fn push_word(&mut self, word: u32, bits: u32) -> Option<[u8; N]> {
        let mut done = None;
        for shift in (0..bits.min(32)).rev() {
            if let Some(bytes) = self.push((word >> shift) & 1 != 0) {
                done = Some(bytes);
            }
        }
        done
    }

    /// Number of bits received so far.
    #[inline]
    #[must_use]
    pub const fn bits_received(&self) -> usize {
        self.bits
    }

    pub fn reset(&mut self) {
        self.bytes = [0; N];
        self.bits = 0;
    }
}

impl<const N: usize> Default for ResponseAssembler<N> {
    fn default() -> Self {
        Self::new()
    }
}

/// Decode an 8-byte status reply into the report layout.
///
/// Reply layout:
///
/// ```text
/// byte 0: 0 0 0 START Y X B A
/// byte 1: 1 L R Z UP DOWN RIGHT LEFT
/// byte 2..8: stick X, stick Y, C-stick X, C-stick Y, L analog, R analog
/// ```
pub fn decode_status(raw: &[u8; STATUS_REPLY_LEN]) -> Result<GcReport, DecodeError> {
    if raw[1] & STATUS_FIXED_BIT == 0 {
        return Err(DecodeError::Framing);
    }

    // (reply byte, reply mask, button)
    const MAP: [(usize, u8, GcButtons); 12] = [
        (0, 0x01, GcButtons::A),
        (0, 0x02, GcButtons::B),
        (0, 0x04, GcButtons::X),
        (0, 0x08, GcButtons::Y),
        (0, 0x10, GcButtons::START),
        (1, 0x01, GcButtons::DPAD_LEFT),
        (1, 0x02, GcButtons::DPAD_RIGHT),
        (1, 0x04, GcButtons::DPAD_DOWN),
        (1, 0x08, GcButtons::DPAD_UP),
        (1, 0x10, GcButtons::Z),
        (1, 0x20, GcButtons::R),
        (1, 0x40, GcButtons::L),
    ];

    let mut buttons = GcButtons::NONE;
    for &(byte, mask, button) in MAP.iter() {
        if raw[byte] & mask != 0 {
            buttons |= button;
        }
    }

    let (low, high) = buttons.to_report_bytes();
    let mut report = [0u8; REPORT_SIZE];
    report[..6].copy_from_slice(&raw[2..8]);
    report[6] = low;
    report[7] = high;
    Ok(GcReport(report))
}
