//! Bridge commands
//! This module defines the commands the request layer can run against a
//! charger, and how their results and errors are rendered as JSON.

use serde_json::{Value, json};
use tokio_util::sync::CancellationToken;

use crate::core::ChargerService;
use crate::core::bluetooth::GattTransport;
use crate::core::charger::PartialSettings;
use crate::error::{BridgeError, Result};

/// A single request against one charger, addressed by MAC
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Measurements { address: String },
    Settings { address: String },
    State { address: String },
    Enabled { address: String },
    Power { address: String },
    MaxCurrent { address: String },
    Enable { address: String, pin: u16, enabled: bool },
    Current { address: String, pin: u16, amps: i64 },
    Update { address: String, patch: PartialSettings },
}

impl Command {
    /// Parses `<command> <mac> [args...]`
    pub fn parse(args: &[String]) -> Result<Self> {
        let invalid = |msg: &str| BridgeError::InvalidCommand(msg.to_string());
        let (name, rest) = args.split_first().ok_or_else(|| invalid("missing command"))?;
        let (address, rest) = rest.split_first().ok_or_else(|| invalid("missing device address"))?;
        // Platform addresses are reported upper-case.
        let address = address.trim().to_uppercase();

        let command = match (name.as_str(), rest) {
            ("measurements", []) => Command::Measurements { address },
            ("settings", []) => Command::Settings { address },
            ("state", []) => Command::State { address },
            ("enabled", []) => Command::Enabled { address },
            ("power", []) => Command::Power { address },
            ("max-current", []) => Command::MaxCurrent { address },
            ("enable", [pin, enabled]) => Command::Enable {
                address,
                pin: parse_pin(pin)?,
                enabled: enabled.trim() == "true",
            },
            ("current", [pin, amps]) => Command::Current {
                address,
                pin: parse_pin(pin)?,
                amps: amps
                    .trim()
                    .parse()
                    .map_err(|_| invalid("current must be an integer"))?,
            },
            ("update", [patch]) => Command::Update {
                address,
                patch: PartialSettings::from_json(patch)?,
            },
            (other, _) => {
                return Err(BridgeError::InvalidCommand(format!(
                    "unknown command or wrong arguments: {other}"
                )));
            }
        };
        Ok(command)
    }
}

fn parse_pin(pin: &str) -> Result<u16> {
    pin.trim()
        .parse()
        .map_err(|_| BridgeError::InvalidCommand(format!("invalid PIN: {pin}")))
}

/// Runs `command` and renders the result as the JSON body to answer with
pub async fn execute<T: GattTransport>(
    charger: &ChargerService<T>,
    command: Command,
    cancel_token: &CancellationToken,
) -> Result<Value> {
    let body = match command {
        Command::Measurements { address } => {
            serde_json::to_value(charger.get_measurements(&address, cancel_token).await?)?
        }
        Command::Settings { address } => {
            serde_json::to_value(charger.get_settings_snapshot(&address, cancel_token).await?)?
        }
        Command::State { address } => {
            json!({ "state": charger.charger_state(&address, cancel_token).await? })
        }
        Command::Enabled { address } => {
            let enabled = charger.charging_enabled(&address, cancel_token).await?;
            let flag = if enabled { "1" } else { "0" };
            json!({ "enabled": flag })
        }
        Command::Power { address } => {
            json!({ "power": charger.meter_power(&address, cancel_token).await? })
        }
        Command::MaxCurrent { address } => {
            json!({ "maxCurrent": charger.max_current(&address, cancel_token).await? })
        }
        Command::Enable { address, pin, enabled } => {
            charger
                .set_charging_enabled(&address, pin, enabled, cancel_token)
                .await?;
            json!({ "success": true })
        }
        Command::Current { address, pin, amps } => {
            charger
                .set_current_limit(&address, pin, amps, cancel_token)
                .await?;
            json!({ "success": true })
        }
        Command::Update { address, patch } => {
            charger
                .apply_partial_settings(&address, &patch, cancel_token)
                .await?;
            json!({ "success": true })
        }
    };
    Ok(body)
}

/// JSON body for a failed command
pub fn error_body(err: &BridgeError) -> Value {
    json!({ "Message": err.to_string(), "Status": err.status_code() })
}
