//! Default input catalog.
//!
//! Codes are the `SLI` selector values common to ISCP receivers. Models
//! differ in which of these they expose; callers with a different set pass
//! their own catalog to the builder.

use avrlib_core::{InputCatalog, Result};

/// `(code, name)` pairs preloaded when no catalog is configured.
pub const DEFAULT_INPUTS: &[(&str, &str)] = &[
    ("00", "VCR/DVR"),
    ("01", "CBL/SAT"),
    ("02", "GAME/TV"),
    ("03", "AUX"),
    ("10", "BD/DVD"),
    ("20", "TAPE"),
    ("22", "PHONO"),
    ("23", "CD"),
    ("24", "FM"),
    ("25", "AM"),
    ("26", "TUNER"),
];

/// Build the default catalog.
pub fn default_catalog() -> Result<InputCatalog> {
    InputCatalog::from_pairs(DEFAULT_INPUTS.iter().copied())
}
