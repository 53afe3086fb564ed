// avrlib test application -- CLI tool for exercising the ISCP backend
// against a real receiver or a scripted mock transport.
//
// Usage:
//   avrlib-test-app --port /dev/ttyUSB0 info
//   avrlib-test-app --port /dev/ttyUSB0 power on
//   avrlib-test-app --port /dev/ttyUSB0 volume set 35
//   avrlib-test-app --port /dev/ttyUSB0 --max-volume 80 volume get
//   avrlib-test-app --port /dev/ttyUSB0 input set 23
//   avrlib-test-app --port /dev/ttyUSB0 monitor --duration 60
//   avrlib-test-app --port /dev/ttyUSB0 raw TUNQSTN
//   avrlib-test-app --mock -v input list

mod mock;

use std::time::{Duration, Instant};

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use tracing::debug;
use tracing_subscriber::EnvFilter;

use avrlib::iscp::volume::VolumeScaler;
use avrlib::iscp::{IscpBuilder, IscpReceiver};
use avrlib::{Receiver, ReceiverEvent};

// ---------------------------------------------------------------------------
// CLI argument definitions
// ---------------------------------------------------------------------------

/// avrlib test application -- controls an ISCP receiver from the command line.
#[derive(Parser)]
#[command(name = "avrlib-test-app", version, about)]
pub struct Cli {
    /// Serial port path (e.g. /dev/ttyUSB0, COM3). Required unless --mock.
    #[arg(long)]
    port: Option<String>,

    /// Baud rate.
    #[arg(long, default_value_t = 9600)]
    baud: u32,

    /// Use a scripted mock receiver instead of a serial port.
    #[arg(long)]
    mock: bool,

    /// Raw MVL level for 0 % volume.
    #[arg(long, default_value_t = 0)]
    min_volume: u32,

    /// Raw MVL level for 100 % volume.
    #[arg(long, default_value_t = 70)]
    max_volume: u32,

    /// Add inputs the receiver reports that are not in the catalog.
    #[arg(long)]
    learn_inputs: bool,

    /// How long to wait for the receiver's replies before printing state (ms).
    #[arg(long, default_value_t = 300)]
    settle_ms: u64,

    /// Verbose logging (-v debug, -vv trace). RUST_LOG overrides.
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    pub command: CliCommand,
}

#[derive(Subcommand)]
pub enum CliCommand {
    /// Print receiver info and cached state.
    Info,

    /// Power operations.
    Power {
        #[command(subcommand)]
        action: SwitchAction,
    },

    /// Mute operations.
    Mute {
        #[command(subcommand)]
        action: SwitchAction,
    },

    /// Master volume operations.
    Volume {
        #[command(subcommand)]
        action: VolumeAction,
    },

    /// Input selector operations.
    Input {
        #[command(subcommand)]
        action: InputAction,
    },

    /// Brightness (stored locally, never sent).
    Brightness {
        #[command(subcommand)]
        action: BrightnessAction,
    },

    /// Print receiver events in real time.
    Monitor {
        /// Duration in seconds (0 = run until the link drops).
        #[arg(long, default_value_t = 0)]
        duration: u64,
    },

    /// Send a raw command without the `!1` header or terminator.
    Raw {
        /// Command text, e.g. PWRQSTN.
        command: String,
    },
}

#[derive(Subcommand)]
pub enum SwitchAction {
    /// Query and print the state.
    Get,
    /// Turn on.
    On,
    /// Turn off.
    Off,
}

#[derive(Subcommand)]
pub enum VolumeAction {
    /// Query and print the volume.
    Get,
    /// Set the volume in percent (clamped to 0-100).
    Set {
        #[arg(allow_negative_numbers = true)]
        percent: f64,
    },
    /// One step up.
    Up,
    /// One step down.
    Down,
}

#[derive(Subcommand)]
pub enum InputAction {
    /// Query and print the selected input.
    Get,
    /// Select an input by two-digit hex code.
    Set { code: String },
    /// List the input catalog.
    List,
}

#[derive(Subcommand)]
pub enum BrightnessAction {
    /// Print the stored brightness.
    Get,
    /// Store a brightness value.
    Set { value: u8 },
}

// ---------------------------------------------------------------------------
// Setup
// ---------------------------------------------------------------------------

fn init_logging(verbose: u8) {
    let default = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

async fn create_receiver(cli: &Cli) -> Result<IscpReceiver> {
    let scaler = VolumeScaler::new(cli.min_volume, cli.max_volume)
        .context("invalid --min-volume/--max-volume")?;

    let builder = IscpBuilder::new()
        .baud_rate(cli.baud)
        .volume_range(scaler.min_raw(), scaler.max_raw())
        .learn_inputs(cli.learn_inputs);

    if cli.mock {
        debug!("using scripted mock transport");
        let transport = mock::scripted_transport(cli, &scaler);
        return builder
            .display_name("Mock receiver")
            .build_with_transport(Box::new(transport))
            .await
            .context("failed to start mock receiver");
    }

    let Some(port) = cli.port.as_deref() else {
        bail!("--port is required unless --mock is used");
    };
    builder
        .serial_port(port)
        .display_name(port)
        .build()
        .await
        .with_context(|| format!("failed to open {port}"))
}

// ---------------------------------------------------------------------------
// Commands
// ---------------------------------------------------------------------------

async fn cmd_info(rx: &IscpReceiver) -> Result<()> {
    let info = rx.info();
    let state = rx.state();
    let scaler = rx.scaler();

    println!("Receiver Information");
    println!("  Name:           {}", info.display_name);
    println!("  Manufacturer:   {}", info.manufacturer);
    println!("  Model:          {}", info.model);
    println!("  Volume range:   {}..{} raw", scaler.min_raw(), scaler.max_raw());
    println!();
    println!("Cached State");
    println!("  Power:          {}", state.power);
    println!("  Mute:           {}", state.muted);
    println!("  Volume:         {:.1}%", state.volume_pct);
    match state.input() {
        Some(input) => println!("  Input:          {input}"),
        None => println!("  Input:          unknown"),
    }
    println!("  Brightness:     {}", state.brightness);
    Ok(())
}

async fn cmd_input_list(rx: &IscpReceiver) -> Result<()> {
    let selected = rx.state().input_code;
    for input in rx.inputs().iter() {
        let marker = if selected.as_deref() == Some(input.code.as_str()) {
            "*"
        } else {
            " "
        };
        println!("{marker} {:>2}  {:<4} {}", input.index, input.code, input.name);
    }
    Ok(())
}

async fn cmd_monitor(rx: &IscpReceiver, duration_secs: u64) -> Result<()> {
    let mut events = rx.subscribe();

    println!("Monitoring receiver events...");

    let deadline = (duration_secs > 0).then(|| Instant::now() + Duration::from_secs(duration_secs));

    loop {
        let timeout = match deadline {
            Some(dl) => {
                let remaining = dl.saturating_duration_since(Instant::now());
                if remaining.is_zero() {
                    println!("Monitor duration elapsed.");
                    break;
                }
                remaining
            }
            None => Duration::from_secs(3600),
        };

        match tokio::time::timeout(timeout, events.recv()).await {
            Ok(Ok(ReceiverEvent::Disconnected)) => {
                println!("[event] Disconnected");
                break;
            }
            Ok(Ok(event)) => {
                println!("[event] {event:?}");
            }
            Ok(Err(tokio::sync::broadcast::error::RecvError::Lagged(n))) => {
                println!("[warning] missed {n} events (consumer too slow)");
            }
            Ok(Err(tokio::sync::broadcast::error::RecvError::Closed)) => {
                println!("Event channel closed.");
                break;
            }
            Err(_) => {
                if deadline.is_some() {
                    println!("Monitor duration elapsed.");
                }
                break;
            }
        }
    }

    Ok(())
}

async fn run(rx: &IscpReceiver, command: &CliCommand, settle_time: Duration) -> Result<()> {
    // Replies arrive asynchronously; give them time before printing.
    let settle = || tokio::time::sleep(settle_time);

    match command {
        CliCommand::Info => {
            settle().await;
            cmd_info(rx).await
        }
        CliCommand::Power { action } => {
            match action {
                SwitchAction::Get => {
                    rx.get_power().await;
                }
                SwitchAction::On => rx.set_power(true).await,
                SwitchAction::Off => rx.set_power(false).await,
            }
            settle().await;
            println!("power: {}", rx.state().power);
            Ok(())
        }
        CliCommand::Mute { action } => {
            match action {
                SwitchAction::Get => {
                    rx.get_mute().await;
                }
                SwitchAction::On => rx.set_mute(true).await,
                SwitchAction::Off => rx.set_mute(false).await,
            }
            settle().await;
            println!("mute: {}", rx.state().muted);
            Ok(())
        }
        CliCommand::Volume { action } => {
            match action {
                VolumeAction::Get => {
                    rx.get_volume().await;
                }
                VolumeAction::Set { percent } => rx.set_volume(*percent).await,
                VolumeAction::Up => rx.step_volume(true).await,
                VolumeAction::Down => rx.step_volume(false).await,
            }
            settle().await;
            println!("volume: {:.1}%", rx.state().volume_pct);
            Ok(())
        }
        CliCommand::Input { action } => {
            match action {
                InputAction::Get => {
                    rx.get_input().await;
                }
                InputAction::Set { code } => {
                    if rx.input(code).is_none() {
                        bail!("input {code} is not in the catalog (see `input list`)");
                    }
                    rx.set_input(code).await;
                }
                InputAction::List => {
                    settle().await;
                    return cmd_input_list(rx).await;
                }
            }
            settle().await;
            match rx.state().input() {
                Some(input) => println!("input: {input}"),
                None => println!("input: unknown"),
            }
            Ok(())
        }
        CliCommand::Brightness { action } => {
            if let BrightnessAction::Set { value } = action {
                rx.set_brightness(*value).await;
            }
            println!("brightness: {}", rx.get_brightness().await);
            Ok(())
        }
        CliCommand::Monitor { duration } => cmd_monitor(rx, *duration).await,
        CliCommand::Raw { command } => {
            rx.send_raw(command)
                .await
                .with_context(|| format!("failed to send {command:?}"))?;
            settle().await;
            Ok(())
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let rx = create_receiver(&cli).await?;
    let result = run(&rx, &cli.command, Duration::from_millis(cli.settle_ms)).await;
    rx.shutdown().await.ok();
    result
}
