//! Mapping modes and their threshold table.

use gcn64_proto::{GcButtons, GcReport};

/// How analog stick deflection turns into d-pad presses.
///
/// Chosen once at boot from the buttons held on the first controller read
/// and never changed afterwards.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum MappingMode {
    /// Wide deadzone.
    #[default]
    Default,
    /// Narrow deadzone, more sensitive stick.
    LowerThreshold,
    /// Two-tier stick: light push walks, full push also holds the run button.
    AutoRun,
}

/// Per-mode parameters consumed by the translator.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ModeParams {
    /// Distance from center an axis must exceed to press a direction.
    pub walk_threshold: u8,
    /// Distance from center that also presses the run button, if any.
    pub run_threshold: Option<u8>,
}

/// Threshold table, indexed by mode.
pub const DEFAULT_PARAMS: ModeParams = ModeParams {
    walk_threshold: 56,
    run_threshold: None,
};

pub const LOWER_THRESHOLD_PARAMS: ModeParams = ModeParams {
    walk_threshold: 32,
    run_threshold: None,
};

pub const AUTO_RUN_PARAMS: ModeParams = ModeParams {
    walk_threshold: 32,
    run_threshold: Some(64),
};

/// Button held at boot to select [`MappingMode::AutoRun`].
pub const AUTO_RUN_SELECT: GcButtons = GcButtons::A;

/// Button held at boot to select [`MappingMode::LowerThreshold`].
pub const LOWER_THRESHOLD_SELECT: GcButtons = GcButtons::B;

impl MappingMode {
    /// Pick the mode from the first report read after power-on.
    ///
    /// A wins over B when both are held.
    #[must_use]
    pub fn select(report: &GcReport) -> Self {
        let buttons = report.buttons();
        if buttons.is_pressed(AUTO_RUN_SELECT) {
            Self::AutoRun
        } else if buttons.is_pressed(LOWER_THRESHOLD_SELECT) {
            Self::LowerThreshold
        } else {
            Self::Default
        }
    }

    #[inline]
    #[must_use]
    pub const fn params(self) -> ModeParams {
        match self {
            Self::Default => DEFAULT_PARAMS,
            Self::LowerThreshold => LOWER_THRESHOLD_PARAMS,
            Self::AutoRun => AUTO_RUN_PARAMS,
        }
    }
}
