//! State translator: GameCube report to NES buttons.
//!
//! One algorithm serves every [`MappingMode`]; the modes only differ in the
//! [`ModeParams`] they feed it.

use crate::mode::{MappingMode, ModeParams};
use crate::types::NesButtons;
use gcn64_proto::{GcButtons, GcReport, AXIS_CENTER};

/// Digital pass-through, one source button per NES line.
pub const DIGITAL_MAP: [(GcButtons, NesButtons); 8] = [
    (GcButtons::A, NesButtons::A),
    (GcButtons::B, NesButtons::B),
    (GcButtons::Z, NesButtons::SELECT),
    (GcButtons::START, NesButtons::START),
    (GcButtons::DPAD_UP, NesButtons::UP),
    (GcButtons::DPAD_DOWN, NesButtons::DOWN),
    (GcButtons::DPAD_LEFT, NesButtons::LEFT),
    (GcButtons::DPAD_RIGHT, NesButtons::RIGHT),
];

/// Source button that enables turbo while held.
pub const TURBO_BUTTON: GcButtons = GcButtons::X;

/// NES buttons that blink while turbo is enabled.
pub const TURBO_BUTTONS: NesButtons = NesButtons(NesButtons::A.0 | NesButtons::B.0);

/// Button held by the auto-run tier.
pub const RUN_BUTTON: NesButtons = NesButtons::B;

/// Result of one translation cycle.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Translation {
    /// Buttons to present on the bus.
    pub buttons: NesButtons,
    /// Turbo source button held.
    pub turbo: bool,
}

impl Translation {
    /// Nothing pressed, turbo off.
    pub const IDLE: Self = Self {
        buttons: NesButtons::NONE,
        turbo: false,
    };

    /// Bits the responder toggles while turbo is on.
    ///
    /// Only pressed turbo-capable buttons blink; released ones stay released.
    #[inline]
    #[must_use]
    pub const fn turbo_mask(&self) -> NesButtons {
        if self.turbo {
            NesButtons(self.buttons.0 & TURBO_BUTTONS.0)
        } else {
            NesButtons::NONE
        }
    }
}

/// Where one analog axis sits relative to the mode's thresholds.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Deflection {
    Centered,
    Low { run: bool },
    High { run: bool },
}

fn deflection(value: u8, params: &ModeParams) -> Deflection {
    let offset = value as i16 - AXIS_CENTER as i16;
    let beyond = |threshold: u8| offset.unsigned_abs() > threshold as u16;

    if !beyond(params.walk_threshold) {
        return Deflection::Centered;
    }
    let run = params.run_threshold.is_some_and(beyond);
    if offset < 0 {
        Deflection::Low { run }
    } else {
        Deflection::High { run }
    }
}

/// Translates reports under a fixed mapping mode.
#[derive(Clone, Copy, Debug)]
pub struct Translator {
    mode: MappingMode,
    params: ModeParams,
}

impl Translator {
    #[must_use]
    pub const fn new(mode: MappingMode) -> Self {
        Self {
            mode,
            params: mode.params(),
        }
    }

    #[inline]
    #[must_use]
    pub const fn mode(&self) -> MappingMode {
        self.mode
    }

    /// Map one report to the NES button set.
    #[must_use]
    pub fn translate(&self, report: &GcReport) -> Translation {
        let source = report.buttons();
        let mut buttons = NesButtons::NONE;

        for &(from, to) in DIGITAL_MAP.iter() {
            if source.is_pressed(from) {
                buttons |= to;
            }
        }

        // Stick Y grows upwards.
        self.apply_axis(&mut buttons, report.stick_x(), NesButtons::LEFT, NesButtons::RIGHT);
        self.apply_axis(&mut buttons, report.stick_y(), NesButtons::DOWN, NesButtons::UP);

        Translation {
            buttons,
            turbo: source.is_pressed(TURBO_BUTTON),
        }
    }

    fn apply_axis(&self, buttons: &mut NesButtons, value: u8, low: NesButtons, high: NesButtons) {
        let run = match deflection(value, &self.params) {
            Deflection::Centered => return,
            Deflection::Low { run } => {
                *buttons |= low;
                run
            }
            Deflection::High { run } => {
                *buttons |= high;
                run
            }
        };
        if run {
            *buttons |= RUN_BUTTON;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gc_buttons_from_mask(mask: u8) -> GcButtons {
        let mut buttons = GcButtons::NONE;
        for (i, &(from, _)) in DIGITAL_MAP.iter().enumerate() {
            if mask & (1 << i) != 0 {
                buttons |= from;
            }
        }
        buttons
    }

    fn nes_buttons_from_mask(mask: u8) -> NesButtons {
        let mut buttons = NesButtons::NONE;
        for (i, &(_, to)) in DIGITAL_MAP.iter().enumerate() {
            if mask & (1 << i) != 0 {
                buttons |= to;
            }
        }
        buttons
    }

    #[test]
    fn test_every_digital_combination() {
        let translator = Translator::new(MappingMode::Default);
        for mask in 0..=u8::MAX {
            let report = GcReport::with_buttons(gc_buttons_from_mask(mask));
            let expected = nes_buttons_from_mask(mask);
            let out = translator.translate(&report);
            assert_eq!(out.buttons, expected, "mask {mask:#010b}");
            assert_eq!(out.buttons.wire_byte(), !expected.0);
        }
    }

    #[test]
    fn test_unmapped_buttons_are_ignored() {
        let translator = Translator::new(MappingMode::Default);
        let report = GcReport::with_buttons(GcButtons::Y | GcButtons::L | GcButtons::R);
        assert_eq!(translator.translate(&report).buttons, NesButtons::NONE);
    }

    #[test]
    fn test_default_deadzone_is_inclusive() {
        let translator = Translator::new(MappingMode::Default);
        for value in (0x80 - 56)..=(0x80 + 56) {
            let x = translator.translate(&GcReport::NEUTRAL.with_stick(value, 0x80));
            let y = translator.translate(&GcReport::NEUTRAL.with_stick(0x80, value));
            assert_eq!(x.buttons, NesButtons::NONE, "x {value:#04x}");
            assert_eq!(y.buttons, NesButtons::NONE, "y {value:#04x}");
        }
    }

    #[test]
    fn test_default_outside_deadzone_presses_one_direction() {
        let translator = Translator::new(MappingMode::Default);
        for value in 0..(0x80 - 56) {
            let x = translator.translate(&GcReport::NEUTRAL.with_stick(value, 0x80));
            let y = translator.translate(&GcReport::NEUTRAL.with_stick(0x80, value));
            assert_eq!(x.buttons, NesButtons::LEFT);
            assert_eq!(y.buttons, NesButtons::DOWN);
        }
        for value in (0x80 + 57)..=0xFF {
            let x = translator.translate(&GcReport::NEUTRAL.with_stick(value, 0x80));
            let y = translator.translate(&GcReport::NEUTRAL.with_stick(0x80, value));
            assert_eq!(x.buttons, NesButtons::RIGHT);
            assert_eq!(y.buttons, NesButtons::UP);
        }
    }

    #[test]
    fn test_lower_threshold_is_more_sensitive() {
        let default = Translator::new(MappingMode::Default);
        let lower = Translator::new(MappingMode::LowerThreshold);
        let report = GcReport::NEUTRAL.with_stick(0x80 + 40, 0x80);
        assert_eq!(default.translate(&report).buttons, NesButtons::NONE);
        assert_eq!(lower.translate(&report).buttons, NesButtons::RIGHT);

        let edge = GcReport::NEUTRAL.with_stick(0x80 - 32, 0x80);
        assert_eq!(lower.translate(&edge).buttons, NesButtons::NONE);
    }

    #[test]
    fn test_auto_run_two_tiers() {
        let translator = Translator::new(MappingMode::AutoRun);

        let walk = translator.translate(&GcReport::NEUTRAL.with_stick(0x80 - 40, 0x80));
        assert_eq!(walk.buttons, NesButtons::LEFT);

        let run = translator.translate(&GcReport::NEUTRAL.with_stick(0x80 - 70, 0x80));
        assert_eq!(run.buttons, NesButtons::LEFT | NesButtons::B);

        let run_right = translator.translate(&GcReport::NEUTRAL.with_stick(0x80 + 70, 0x80));
        assert_eq!(run_right.buttons, NesButtons::RIGHT | NesButtons::B);
    }

    #[test]
    fn test_auto_run_applies_per_axis() {
        let translator = Translator::new(MappingMode::AutoRun);

        let up_run = translator.translate(&GcReport::NEUTRAL.with_stick(0x80, 0x80 + 70));
        assert_eq!(up_run.buttons, NesButtons::UP | NesButtons::B);

        // Walking diagonally does not run
        let diagonal = translator.translate(&GcReport::NEUTRAL.with_stick(0x80 + 40, 0x80 - 40));
        assert_eq!(diagonal.buttons, NesButtons::RIGHT | NesButtons::DOWN);
    }

    #[test]
    fn test_other_modes_never_run() {
        let translator = Translator::new(MappingMode::LowerThreshold);
        let out = translator.translate(&GcReport::NEUTRAL.with_stick(0x00, 0xFF));
        assert_eq!(out.buttons, NesButtons::LEFT | NesButtons::UP);
    }

    #[test]
    fn test_scenario_a_with_stick_down() {
        let translator = Translator::new(MappingMode::Default);
        let report = GcReport::with_buttons(GcButtons::A).with_stick(0x80, 0x20);
        let out = translator.translate(&report);
        assert_eq!(out.buttons, NesButtons::A | NesButtons::DOWN);
        assert_eq!(out.buttons.wire_byte(), 0b0111_1011);
    }

    #[test]
    fn test_turbo_follows_source_button() {
        let translator = Translator::new(MappingMode::Default);
        let held = translator.translate(&GcReport::with_buttons(TURBO_BUTTON | GcButtons::A));
        assert!(held.turbo);
        assert_eq!(held.turbo_mask(), NesButtons::A);

        let released = translator.translate(&GcReport::with_buttons(GcButtons::A));
        assert!(!released.turbo);
        assert_eq!(released.turbo_mask(), NesButtons::NONE);
    }

    #[test]
    fn test_turbo_mask_only_covers_pressed_turbo_buttons() {
        let out = Translation {
            buttons: NesButtons::A | NesButtons::B | NesButtons::START,
            turbo: true,
        };
        assert_eq!(out.turbo_mask(), NesButtons::A | NesButtons::B);
        assert_eq!(Translation::IDLE.turbo_mask(), NesButtons::NONE);
    }
}
