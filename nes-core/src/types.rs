//! NES button set and the wire byte it serializes to.

use core::ops::{BitAnd, BitOr, BitOrAssign, Not};

/// Data line level that means "no button pressed".
pub const WIRE_IDLE: u8 = 0xFF;

/// Pressed NES buttons, one bit per line in shift-out order (A is shifted first).
///
/// This is the active-high view. The bus carries the complement, see
/// [`NesButtons::wire_byte`].
///
/// # Example
///
/// ```
/// use nes_core::NesButtons;
///
/// let buttons = NesButtons::A | NesButtons::DOWN;
/// assert_eq!(buttons.wire_byte(), 0b0111_1011);
/// ```
#[derive(Clone, Copy, Default, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct NesButtons(pub u8);

impl NesButtons {
    pub const A: Self = Self(1 << 7);
    pub const B: Self = Self(1 << 6);
    pub const SELECT: Self = Self(1 << 5);
    pub const START: Self = Self(1 << 4);
    pub const UP: Self = Self(1 << 3);
    pub const DOWN: Self = Self(1 << 2);
    pub const LEFT: Self = Self(1 << 1);
    pub const RIGHT: Self = Self(1 << 0);

    /// No buttons pressed.
    pub const NONE: Self = Self(0);

    /// Check if the given button(s) are pressed.
    #[inline]
    #[must_use]
    pub const fn contains(self, button: NesButtons) -> bool {
        (self.0 & button.0) == button.0
    }

    /// Check if the given button is pressed (alias for contains).
    #[inline]
    #[must_use]
    pub const fn is_pressed(self, button: NesButtons) -> bool {
        self.contains(button)
    }

    /// Set or clear button(s).
    #[inline]
    pub fn set(&mut self, button: NesButtons, pressed: bool) {
        if pressed {
            self.0 |= button.0;
        } else {
            self.0 &= !button.0;
        }
    }

    /// Byte as seen on the data line: a cleared bit is a pressed button.
    #[inline]
    #[must_use]
    pub const fn wire_byte(self) -> u8 {
        !self.0
    }

    /// Inverse of [`wire_byte`](Self::wire_byte).
    #[inline]
    #[must_use]
    pub const fn from_wire(byte: u8) -> Self {
        Self(!byte)
    }

    #[inline]
    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }
}

impl BitOr for NesButtons {
    type Output = Self;

    #[inline]
    fn bitor(self, rhs: Self) -> Self::Output {
        Self(self.0 | rhs.0)
    }
}

impl BitOrAssign for NesButtons {
    #[inline]
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

impl BitAnd for NesButtons {
    type Output = Self;

    #[inline]
    fn bitand(self, rhs: Self) -> Self::Output {
        Self(self.0 & rhs.0)
    }
}

impl Not for NesButtons {
    type Output = Self;

    #[inline]
    fn not(self) -> Self::Output {
        Self(!self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_byte_is_active_low() {
        assert_eq!(NesButtons::NONE.wire_byte(), WIRE_IDLE);
        assert_eq!(NesButtons::A.wire_byte(), 0x7F);
        assert_eq!(NesButtons::RIGHT.wire_byte(), 0xFE);
    }

    #[test]
    fn test_from_wire() {
        let buttons = NesButtons::from_wire(0b1010_1111);
        assert!(buttons.is_pressed(NesButtons::B));
        assert!(buttons.is_pressed(NesButtons::START));
        assert!(!buttons.is_pressed(NesButtons::A));
        assert_eq!(buttons.wire_byte(), 0b1010_1111);
    }

    #[test]
    fn test_buttons_set_clear() {
        let mut buttons = NesButtons::NONE;
        buttons.set(NesButtons::SELECT, true);
        assert!(buttons.is_pressed(NesButtons::SELECT));
        buttons.set(NesButtons::SELECT, false);
        assert!(buttons.is_empty());
    }
}
