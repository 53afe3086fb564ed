//! IscpBuilder -- fluent builder for constructing [`IscpReceiver`] instances.
//!
//! Separates configuration from construction so that callers can set up
//! the serial port, volume range and input catalog before the transport is
//! opened and the IO task starts.
//!
//! # Example
//!
//! ```no_run
//! use avrlib_iscp::builder::IscpBuilder;
//!
//! # async fn example() -> avrlib_core::Result<()> {
//! let receiver = IscpBuilder::new()
//!     .serial_port("/dev/ttyUSB0")
//!     .volume_range(0, 80)
//!     .display_name("Living Room")
//!     .build()
//!     .await?;
//! # Ok(())
//! # }
//! ```

use std::time::Duration;

use avrlib_core::error::{Error, Result};
use avrlib_core::transport::Transport;
use avrlib_core::types::{InputCatalog, ReceiverInfo};
use avrlib_transport::{SerialConfig, SerialTransport};

use crate::commands;
use crate::inputs::default_catalog;
use crate::io::IoConfig;
use crate::receiver::IscpReceiver;
use crate::state::DeviceState;
use crate::volume::{DEFAULT_MAX_RAW, DEFAULT_MIN_RAW, VolumeScaler};

/// Fluent builder for [`IscpReceiver`].
///
/// Every setting has a default, so the simplest usage is:
///
/// ```ignore
/// let receiver = IscpBuilder::new()
///     .serial_port("/dev/ttyUSB0")
///     .build()
///     .await?;
/// ```
pub struct IscpBuilder {
    serial_port: Option<String>,
    serial_config: SerialConfig,
    volume_min: u32,
    volume_max: u32,
    inputs: Option<InputCatalog>,
    learn_inputs: bool,
    query_on_connect: bool,
    poll_interval: Duration,
    display_name: String,
    manufacturer: String,
    model: String,
}

impl IscpBuilder {
    /// Create a builder with default settings.
    pub fn new() -> Self {
        IscpBuilder {
            serial_port: None,
            serial_config: SerialConfig::default(),
            volume_min: DEFAULT_MIN_RAW,
            volume_max: DEFAULT_MAX_RAW,
            inputs: None,
            learn_inputs: false,
            query_on_connect: true,
            poll_interval: Duration::from_millis(100),
            display_name: "Receiver".into(),
            manufacturer: "Onkyo".into(),
            model: "ISCP receiver".into(),
        }
    }

    /// Set the serial port path (e.g. `/dev/ttyUSB0` or `COM3`).
    pub fn serial_port(mut self, port: &str) -> Self {
        self.serial_port = Some(port.to_string());
        self
    }

    /// Override the baud rate (default: 9600).
    pub fn baud_rate(mut self, baud: u32) -> Self {
        self.serial_config.baud_rate = baud;
        self
    }

    /// Replace all serial port settings.
    pub fn serial_config(mut self, config: SerialConfig) -> Self {
        self.serial_config = config;
        self
    }

    /// Raw `MVL` levels that correspond to 0 % and 100 % (default: 0, 70).
    pub fn volume_range(mut self, min_raw: u32, max_raw: u32) -> Self {
        self.volume_min = min_raw;
        self.volume_max = max_raw;
        self
    }

    /// Replace the default input catalog.
    pub fn inputs(mut self, catalog: InputCatalog) -> Self {
        self.inputs = Some(catalog);
        self
    }

    /// Add inputs the receiver reports that the catalog lacks (default: off).
    pub fn learn_inputs(mut self, enabled: bool) -> Self {
        self.learn_inputs = enabled;
        self
    }

    /// Query power, mute, volume and input when the IO task starts
    /// (default: on).
    pub fn query_on_connect(mut self, enabled: bool) -> Self {
        self.query_on_connect = enabled;
        self
    }

    /// Read timeout for each idle poll of the transport (default: 100ms).
    pub fn poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Name shown to users.
    pub fn display_name(mut self, name: &str) -> Self {
        self.display_name = name.to_string();
        self
    }

    /// Manufacturer string reported in [`ReceiverInfo`].
    pub fn manufacturer(mut self, manufacturer: &str) -> Self {
        self.manufacturer = manufacturer.to_string();
        self
    }

    /// Model string reported in [`ReceiverInfo`].
    pub fn model(mut self, model: &str) -> Self {
        self.model = model.to_string();
        self
    }

    /// Build an [`IscpReceiver`] with a caller-provided transport.
    ///
    /// This is the entry point for testing (pass a `MockTransport` from
    /// `avrlib-test-harness`) and for callers that manage the transport
    /// themselves. Must be called within a tokio runtime.
    pub async fn build_with_transport(self, transport: Box<dyn Transport>) -> Result<IscpReceiver> {
        let scaler = VolumeScaler::new(self.volume_min, self.volume_max)?;
        let catalog = match self.inputs {
            Some(catalog) => catalog,
            None => default_catalog()?,
        };
        if self.poll_interval.is_zero() {
            return Err(Error::InvalidParameter(
                "poll_interval must be non-zero".into(),
            ));
        }

        let config = IoConfig {
            poll_interval: self.poll_interval,
            startup_commands: if self.query_on_connect {
                commands::refresh_commands()
            } else {
                Vec::new()
            },
            ..IoConfig::default()
        };
        let info = ReceiverInfo {
            display_name: self.display_name,
            manufacturer: self.manufacturer,
            model: self.model,
        };

        Ok(IscpReceiver::new(
            transport,
            config,
            DeviceState::with_inputs(catalog),
            scaler,
            self.learn_inputs,
            info,
        ))
    }

    /// Build an [`IscpReceiver`] on a serial port.
    ///
    /// Requires that [`serial_port()`](Self::serial_port) has been called.
    pub async fn build(self) -> Result<IscpReceiver> {
        let port = self
            .serial_port
            .as_ref()
            .ok_or_else(|| Error::InvalidParameter("serial_port is required for build()".into()))?;
        let transport = SerialTransport::open_with_config(port, self.serial_config.clone()).await?;
        self.build_with_transport(Box::new(transport)).await
    }
}

impl Default for IscpBuilder {
    fn default() -> Self {
        Self::new()
    }
}
