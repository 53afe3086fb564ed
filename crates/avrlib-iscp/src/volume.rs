//! Mapping between percent volume and the receiver's raw level range.

use avrlib_core::{Error, Result};

/// Default raw level reported for 0 %.
pub const DEFAULT_MIN_RAW: u32 = 0;

/// Default raw level reported for 100 %.
pub const DEFAULT_MAX_RAW: u32 = 70;

// Float error in the raw -> percent -> raw path is far below this; without it
// an exact round trip can floor one step low.
const FLOOR_EPSILON: f64 = 1e-9;

/// Linear mapping between `[0, 100]` percent and `[min_raw, max_raw]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VolumeScaler {
    min_raw: u32,
    max_raw: u32,
}

impl VolumeScaler {
    /// Create a scaler for the given raw range.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidParameter`] unless `min_raw < max_raw`.
    pub fn new(min_raw: u32, max_raw: u32) -> Result<Self> {
        if min_raw >= max_raw {
            return Err(Error::InvalidParameter(format!(
                "volume range {min_raw}..{max_raw} is empty"
            )));
        }
        Ok(VolumeScaler { min_raw, max_raw })
    }

    /// Raw level for 0 %.
    pub fn min_raw(&self) -> u32 {
        self.min_raw
    }

    /// Raw level for 100 %.
    pub fn max_raw(&self) -> u32 {
        self.max_raw
    }

    fn span(&self) -> f64 {
        f64::from(self.max_raw - self.min_raw)
    }

    /// Percent for a reported raw level; out-of-range levels are clamped.
    pub fn raw_to_percent(&self, raw: u32) -> f64 {
        let raw = raw.clamp(self.min_raw, self.max_raw);
        f64::from(raw - self.min_raw) / self.span() * 100.0
    }

    /// Raw level for a percent, floored; the percent is clamped first.
    pub fn percent_to_raw(&self, percent: f64) -> u32 {
        let percent = clamp_percent(percent);
        let offset = (self.span() * percent / 100.0 + FLOOR_EPSILON).floor();
        (self.min_raw + offset as u32).min(self.max_raw)
    }

    /// Raw level for a percent, as unpadded uppercase hex.
    pub fn percent_to_hex(&self, percent: f64) -> String {
        format!("{:X}", self.percent_to_raw(percent))
    }
}

impl Default for VolumeScaler {
    fn default() -> Self {
        VolumeScaler {
            min_raw: DEFAULT_MIN_RAW,
            max_raw: DEFAULT_MAX_RAW,
        }
    }
}

/// Clamp to `[0, 100]`; NaN becomes 0.
pub fn clamp_percent(percent: f64) -> f64 {
    if percent.is_nan() {
        0.0
    } else {
        percent.clamp(0.0, 100.0)
    }
}
