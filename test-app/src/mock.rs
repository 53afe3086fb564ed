// Scripted mock receiver for `--mock`.
//
// The mock answers the startup queries and the command being run the way a
// powered-on receiver playing a CD at half volume would, so every subcommand
// can be exercised without hardware.

use avrlib::iscp::commands::{self, Command};
use avrlib::iscp::protocol::{DELIMITER, encode};
use avrlib::iscp::volume::VolumeScaler;
use avrlib_test_harness::MockTransport;

use crate::{Cli, CliCommand, InputAction, SwitchAction, VolumeAction};

/// Raw level the mock reports: 35, half of the default range.
const MOCK_VOLUME_RAW: u32 = 0x23;

/// The mock's selected input (CD).
const MOCK_INPUT: &str = "23";

fn frame(text: &str) -> Vec<u8> {
    let mut bytes = b"!1".to_vec();
    bytes.extend_from_slice(text.as_bytes());
    bytes.push(DELIMITER);
    bytes
}

fn expect(mock: &mut MockTransport, command: &Command, reply: &str) {
    mock.expect(&encode(command.as_str()), &frame(reply));
}

/// Build a lenient mock with replies for `cli`'s startup and command.
pub fn scripted_transport(cli: &Cli, scaler: &VolumeScaler) -> MockTransport {
    let mut mock = MockTransport::lenient();

    expect(&mut mock, &commands::cmd_query_power(), "PWR01");
    expect(&mut mock, &commands::cmd_query_mute(), "AMT00");
    expect(&mut mock, &commands::cmd_query_volume(), &format!("MVL{MOCK_VOLUME_RAW:02X}"));
    expect(&mut mock, &commands::cmd_query_input(), &format!("SLI{MOCK_INPUT}"));

    match &cli.command {
        CliCommand::Power { action } => match action {
            SwitchAction::On => expect(&mut mock, &commands::cmd_set_power(true), "PWR01"),
            SwitchAction::Off => expect(&mut mock, &commands::cmd_set_power(false), "PWR00"),
            SwitchAction::Get => expect(&mut mock, &commands::cmd_query_power(), "PWR01"),
        },
        CliCommand::Mute { action } => match action {
            SwitchAction::On => expect(&mut mock, &commands::cmd_set_mute(true), "AMT01"),
            SwitchAction::Off => expect(&mut mock, &commands::cmd_set_mute(false), "AMT00"),
            SwitchAction::Get => expect(&mut mock, &commands::cmd_query_mute(), "AMT00"),
        },
        CliCommand::Volume { action } => match action {
            VolumeAction::Get => expect(
                &mut mock,
                &commands::cmd_query_volume(),
                &format!("MVL{MOCK_VOLUME_RAW:02X}"),
            ),
            VolumeAction::Set { percent } => {
                let raw = scaler.percent_to_raw(*percent);
                // Receivers report the level padded to two digits.
                expect(&mut mock, &commands::cmd_set_volume(raw), &format!("MVL{raw:02X}"));
            }
            VolumeAction::Up => expect(
                &mut mock,
                &commands::cmd_volume_up(),
                &format!("MVL{:02X}", MOCK_VOLUME_RAW + 1),
            ),
            VolumeAction::Down => expect(
                &mut mock,
                &commands::cmd_volume_down(),
                &format!("MVL{:02X}", MOCK_VOLUME_RAW - 1),
            ),
        },
        CliCommand::Input { action } => match action {
            InputAction::Get => expect(
                &mut mock,
                &commands::cmd_query_input(),
                &format!("SLI{MOCK_INPUT}"),
            ),
            InputAction::Set { code } => {
                if let Ok(command) = commands::cmd_select_input(code) {
                    let reply = format!("SLI{}", code.to_ascii_uppercase());
                    expect(&mut mock, &command, &reply);
                }
            }
            InputAction::List => {}
        },
        CliCommand::Monitor { .. } => {
            mock.handle().inject(&frame("AMX1MOCK"));
        }
        CliCommand::Info | CliCommand::Brightness { .. } | CliCommand::Raw { .. } => {}
    }

    mock
}
