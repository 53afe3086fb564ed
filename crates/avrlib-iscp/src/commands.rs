//! ISCP command builders and argument parsers.
//!
//! Builders produce validated [`Command`] values (the text between the
//! `!1` header and the terminator); [`protocol::encode`](crate::protocol::encode)
//! wraps them for the wire. All functions here are pure.
//!
//! # Command reference
//!
//! | Code  | Meaning          | Set                     | Query     |
//! |-------|------------------|-------------------------|-----------|
//! | `PWR` | System power     | `PL1` / `PL0`           | `PWRQSTN` |
//! | `AMT` | Audio muting     | `AMT01` / `AMT00`       | `AMTQSTN` |
//! | `MVL` | Master volume    | `MVL<hex>`, `MVLUP`...  | `MVLQSTN` |
//! | `SLI` | Input selector   | `SLI<code>`             | `SLIQSTN` |
//! | `AMX` | Identification   | (receiver-initiated)    |           |
//!
//! Power is switched with the short `PL1`/`PL0` forms; the receiver reports
//! the result back as `PWR01`/`PWR00`.

use std::fmt;
use std::str::FromStr;

use avrlib_core::{Error, Result, normalize_input_code};

/// Argument that turns any code into a status query.
pub const QUERY: &str = "QSTN";

/// Command codes the receiver reports and this crate interprets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CommandCode {
    /// `PWR`: system power.
    Power,
    /// `AMT`: audio muting.
    Mute,
    /// `MVL`: master volume.
    MasterVolume,
    /// `SLI`: input selector.
    InputSelector,
    /// `AMX`: receiver identification.
    Identify,
}

impl CommandCode {
    /// Every code that can be queried for state.
    pub const QUERYABLE: [CommandCode; 4] = [
        CommandCode::Power,
        CommandCode::Mute,
        CommandCode::MasterVolume,
        CommandCode::InputSelector,
    ];

    /// Three-letter wire form.
    pub fn as_str(self) -> &'static str {
        match self {
            CommandCode::Power => "PWR",
            CommandCode::Mute => "AMT",
            CommandCode::MasterVolume => "MVL",
            CommandCode::InputSelector => "SLI",
            CommandCode::Identify => "AMX",
        }
    }
}

impl fmt::Display for CommandCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CommandCode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "PWR" => Ok(CommandCode::Power),
            "AMT" => Ok(CommandCode::Mute),
            "MVL" => Ok(CommandCode::MasterVolume),
            "SLI" => Ok(CommandCode::InputSelector),
            "AMX" => Ok(CommandCode::Identify),
            other => Err(Error::Protocol(format!("unknown command code {other:?}"))),
        }
    }
}

/// Text of one outbound command, without envelope.
///
/// Guaranteed non-empty printable ASCII, so it can never contain the
/// terminator or frame delimiter.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Command(String);

impl Command {
    /// Validate arbitrary command text (e.g. from the CLI `raw` command).
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidParameter`] if the text is empty or contains
    /// anything other than printable ASCII.
    pub fn new(text: impl Into<String>) -> Result<Self> {
        let text = text.into();
        if text.is_empty() {
            return Err(Error::InvalidParameter("empty command".into()));
        }
        if !text.bytes().all(|b| b.is_ascii_graphic()) {
            return Err(Error::InvalidParameter(format!(
                "command must be printable ASCII: {text:?}"
            )));
        }
        Ok(Command(text))
    }

    /// The command text.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// If this is a `<code>QSTN` query for a known code, which one.
    pub fn query_code(&self) -> Option<CommandCode> {
        let code = self.0.strip_suffix(QUERY)?;
        code.parse().ok()
    }

    fn query(code: CommandCode) -> Self {
        Command(format!("{code}{QUERY}"))
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ---------------------------------------------------------------
// Command builders
// ---------------------------------------------------------------

/// `PL1` / `PL0`.
pub fn cmd_set_power(on: bool) -> Command {
    Command(if on { "PL1" } else { "PL0" }.into())
}

/// `PWRQSTN`.
pub fn cmd_query_power() -> Command {
    Command::query(CommandCode::Power)
}

/// `AMT01` / `AMT00`.
pub fn cmd_set_mute(muted: bool) -> Command {
    Command(if muted { "AMT01" } else { "AMT00" }.into())
}

/// `AMTQSTN`.
pub fn cmd_query_mute() -> Command {
    Command::query(CommandCode::Mute)
}

/// `MVL<hex>` with the raw level in uppercase hex, unpadded.
pub fn cmd_set_volume(raw: u32) -> Command {
    Command(format!("MVL{raw:X}"))
}

/// `MVLUP`: one step up.
pub fn cmd_volume_up() -> Command {
    Command("MVLUP".into())
}

/// `MVLDOWN`: one step down.
pub fn cmd_volume_down() -> Command {
    Command("MVLDOWN".into())
}

/// `MVLQSTN`.
pub fn cmd_query_volume() -> Command {
    Command::query(CommandCode::MasterVolume)
}

/// `SLI<code>`.
///
/// # Errors
///
/// Returns [`Error::InvalidParameter`] unless `code` is two hex digits.
pub fn cmd_select_input(code: &str) -> Result<Command> {
    Ok(Command(format!("SLI{}", normalize_input_code(code)?)))
}

/// `SLIQSTN`.
pub fn cmd_query_input() -> Command {
    Command::query(CommandCode::InputSelector)
}

/// The four state queries, in the order they are sent on connect.
pub fn refresh_commands() -> Vec<Command> {
    CommandCode::QUERYABLE
        .into_iter()
        .map(Command::query)
        .collect()
}

// ---------------------------------------------------------------
// Argument parsers
// ---------------------------------------------------------------

/// Parse a `PWR`/`AMT` argument: `"01"` is on, `"00"` is off.
pub fn parse_switch(argument: &str) -> Option<bool> {
    match argument {
        "01" => Some(true),
        "00" => Some(false),
        _ => None,
    }
}

/// Parse an `MVL` argument as a hex raw level.
pub fn parse_volume(argument: &str) -> Option<u32> {
    if argument.is_empty() || !argument.bytes().all(|b| b.is_ascii_hexdigit()) {
        return None;
    }
    u32::from_str_radix(argument, 16).ok()
}
