//! Report types: GcButtons, GcReport.

use core::ops::{BitAnd, BitOr, BitOrAssign, Not};

/// Size of a controller report in bytes.
pub const REPORT_SIZE: usize = 8;

/// Resting value of every analog axis.
pub const AXIS_CENTER: u8 = 0x80;

/// Digital buttons as laid out in report bytes 6 (low half) and 7 (high half).
///
/// # Example
///
/// ```
/// use gcn64_proto::GcButtons;
///
/// let buttons = GcButtons::A | GcButtons::DPAD_UP;
/// assert!(buttons.contains(GcButtons::A));
/// assert!(!buttons.contains(GcButtons::B));
/// ```
#[derive(Clone, Copy, Default, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct GcButtons(pub u16);

impl GcButtons {
    // Report byte 6
    pub const START: Self = Self(1 << 0);
    pub const Y: Self = Self(1 << 1);
    pub const X: Self = Self(1 << 2);
    pub const B: Self = Self(1 << 3);
    pub const A: Self = Self(1 << 4);
    pub const L: Self = Self(1 << 5); // digital click
    pub const R: Self = Self(1 << 6); // digital click
    pub const Z: Self = Self(1 << 7);
    // Report byte 7
    pub const DPAD_UP: Self = Self(1 << 8);
    pub const DPAD_DOWN: Self = Self(1 << 9);
    pub const DPAD_RIGHT: Self = Self(1 << 10);
    pub const DPAD_LEFT: Self = Self(1 << 11);

    /// No buttons pressed.
    pub const NONE: Self = Self(0);

    /// Check if the given button(s) are pressed.
    #[inline]
    #[must_use]
    pub const fn contains(self, button: GcButtons) -> bool {
        (self.0 & button.0) == button.0
    }

    /// Check if the given button is pressed (alias for contains).
    #[inline]
    #[must_use]
    pub const fn is_pressed(self, button: GcButtons) -> bool {
        self.contains(button)
    }

    /// Set or clear button(s).
    #[inline]
    pub fn set(&mut self, button: GcButtons, pressed: bool) {
        if pressed {
            self.0 |= button.0;
        } else {
            self.0 &= !button.0;
        }
    }

    /// Split into the (byte 6, byte 7) pair of the report.
    #[inline]
    #[must_use]
    pub const fn to_report_bytes(self) -> (u8, u8) {
        (self.0 as u8, (self.0 >> 8) as u8)
    }

    #[inline]
    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }
}

impl BitOr for GcButtons {
    type Output = Self;

    #[inline]
    fn bitor(self, rhs: Self) -> Self::Output {
        Self(self.0 | rhs.0)
    }
}

impl BitOrAssign for GcButtons {
    #[inline]
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

impl BitAnd for GcButtons {
    type Output = Self;

    #[inline]
    fn bitand(self, rhs: Self) -> Self::Output {
        Self(self.0 & rhs.0)
    }
}

impl Not for GcButtons {
    type Output = Self;

    #[inline]
    fn not(self) -> Self::Output {
        Self(!self.0)
    }
}

/// One controller snapshot in the fixed 8-byte layout.
///
/// Overwritten wholesale on every successful poll; never patched in place.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct GcReport(pub [u8; REPORT_SIZE]);

impl GcReport {
    /// Sticks centered, triggers released, no buttons.
    pub const NEUTRAL: Self = Self([
        AXIS_CENTER,
        AXIS_CENTER,
        AXIS_CENTER,
        AXIS_CENTER,
        0,
        0,
        0,
        0,
    ]);

    /// Neutral report with the given buttons held.
    #[must_use]
    pub const fn with_buttons(buttons: GcButtons) -> Self {
        let (low, high) = buttons.to_report_bytes();
        let mut bytes = Self::NEUTRAL.0;
        bytes[6] = low;
        bytes[7] = high;
        Self(bytes)
    }

    /// Copy of this report with the main stick moved.
    #[must_use]
    pub const fn with_stick(self, x: u8, y: u8) -> Self {
        let mut bytes = self.0;
        bytes[0] = x;
        bytes[1] = y;
        Self(bytes)
    }

    #[inline]
    #[must_use]
    pub const fn stick_x(&self) -> u8 {
        self.0[0]
    }

    #[inline]
    #[must_use]
    pub const fn stick_y(&self) -> u8 {
        self.0[1]
    }

    #[inline]
    #[must_use]
    pub const fn c_stick_x(&self) -> u8 {
        self.0[2]
    }

    #[inline]
    #[must_use]
    pub const fn c_stick_y(&self) -> u8 {
        self.0[3]
    }

    #[inline]
    #[must_use]
    pub const fn l_analog(&self) -> u8 {
        self.0[4]
    }

    #[inline]
    #[must_use]
    pub const fn r_analog(&self) -> u8 {
        self.0[5]
    }

    /// Digital buttons from bytes 6 and 7.
    #[inline]
    #[must_use]
    pub const fn buttons(&self) -> GcButtons {
        GcButtons(self.0[6] as u16 | (self.0[7] as u16) << 8)
    }

    /// Raw report bytes.
    #[inline]
    #[must_use]
    pub const fn as_bytes(&self) -> &[u8; REPORT_SIZE] {
        &self.0
    }
}

impl Default for GcReport {
    fn default() -> Self {
        Self::NEUTRAL
    }
}
