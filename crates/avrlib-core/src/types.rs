//! Core types used throughout avrlib.
//!
//! These types describe receiver state in terms the platform layer
//! understands (switches, percentages, named inputs) rather than in wire
//! protocol terms.

use std::fmt;

use crate::error::{Error, Result};

/// State of a two-valued receiver function (power, mute).
///
/// Receivers only report these after being queried or after a change, so
/// the state starts as [`Unknown`](SwitchState::Unknown) until the first
/// report arrives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SwitchState {
    /// No report received yet.
    #[default]
    Unknown,
    /// The function is on (powered, muted).
    On,
    /// The function is off.
    Off,
}

impl SwitchState {
    /// Boolean view for consumers without a tri-state; `Unknown` reads as off.
    pub fn is_on(self) -> bool {
        self == SwitchState::On
    }

    /// Whether a report has been received.
    pub fn is_known(self) -> bool {
        self != SwitchState::Unknown
    }
}

impl From<bool> for SwitchState {
    fn from(on: bool) -> Self {
        if on { SwitchState::On } else { SwitchState::Off }
    }
}

impl fmt::Display for SwitchState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SwitchState::Unknown => "unknown",
            SwitchState::On => "on",
            SwitchState::Off => "off",
        };
        write!(f, "{s}")
    }
}

/// A selectable receiver input.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Input {
    /// Two-character uppercase hex code used on the wire (e.g. `"23"`).
    pub code: String,
    /// Human-readable label (e.g. `"CD"`).
    pub name: String,
    /// Ordinal position in the catalog.
    pub index: usize,
}

impl fmt::Display for Input {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.code)
    }
}

/// Normalize and validate an input code: two hex digits, uppercased.
pub fn normalize_input_code(code: &str) -> Result<String> {
    if code.len() != 2 || !code.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(Error::InvalidParameter(format!(
            "input code must be two hex digits, got {code:?}"
        )));
    }
    Ok(code.to_ascii_uppercase())
}

/// Ordered catalog of inputs, keyed by unique code.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InputCatalog {
    inputs: Vec<Input>,
}

impl InputCatalog {
    /// Create an empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a catalog from `(code, name)` pairs, in order.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidParameter`] for malformed or duplicate codes.
    pub fn from_pairs<'a, I>(pairs: I) -> Result<Self>
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let mut catalog = Self::new();
        for (code, name) in pairs {
            catalog.insert(code, name)?;
        }
        Ok(catalog)
    }

    /// Append an input, assigning the next index.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidParameter`] if the code is malformed or
    /// already present.
    pub fn insert(&mut self, code: &str, name: &str) -> Result<&Input> {
        let code = normalize_input_code(code)?;
        if self.contains(&code) {
            return Err(Error::InvalidParameter(format!(
                "duplicate input code {code}"
            )));
        }
        let index = self.inputs.len();
        self.inputs.push(Input {
            code,
            name: name.to_string(),
            index,
        });
        Ok(&self.inputs[index])
    }

    /// Look up an input by code (case-insensitive).
    pub fn get(&self, code: &str) -> Option<&Input> {
        self.inputs
            .iter()
            .find(|input| input.code.eq_ignore_ascii_case(code))
    }

    /// Whether the catalog has an input with this code.
    pub fn contains(&self, code: &str) -> bool {
        self.get(code).is_some()
    }

    /// Iterate inputs in catalog order.
    pub fn iter(&self) -> impl Iterator<Item = &Input> {
        self.inputs.iter()
    }

    /// Number of inputs.
    pub fn len(&self) -> usize {
        self.inputs.len()
    }

    /// Whether the catalog is empty.
    pub fn is_empty(&self) -> bool {
        self.inputs.is_empty()
    }

    /// Copy the inputs into a `Vec`.
    pub fn to_vec(&self) -> Vec<Input> {
        self.inputs.clone()
    }
}

/// Static identification of a receiver, as shown to the platform layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReceiverInfo {
    /// Name shown to users (e.g. `"Living Room"`).
    pub display_name: String,
    /// Manufacturer string.
    pub manufacturer: String,
    /// Model string.
    pub model: String,
}
