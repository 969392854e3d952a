//! Read-modify-write merge of partial settings updates.
//!
//! The charger only accepts a complete settings block, so every update is
//! built from the values currently on the device and then overlaid with the
//! fields the caller asked to change.

use serde::Deserialize;
use serde::de::IgnoredAny;

use crate::core::bluetooth::ENERGY_LIMIT_DISABLED;
use crate::core::charger::records::{InfoRecord, SettingsRecord};
use crate::error::{BridgeError, Result};

/// Requested charging energy limit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnergyLimit {
    Disabled,
    /// Hundredths of kWh
    Limit(u16),
}

impl EnergyLimit {
    pub fn wire_value(self) -> u16 {
        match self {
            EnergyLimit::Disabled => ENERGY_LIMIT_DISABLED,
            EnergyLimit::Limit(v) => v,
        }
    }
}

/// A partial update: absent fields keep their current value
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PartialSettings {
    pub charging_enabled: Option<bool>,
    /// Amps; range-checked before anything is written
    pub current: Option<i64>,
    pub pin: Option<u16>,
    pub energy_limit: Option<EnergyLimit>,
}

/// Which fields the baseline settings block takes from the device
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BaselinePolicy {
    /// Info fields plus the energy limit currently reported in the Energy
    /// record. Used for general partial updates.
    PreserveEnergyLimit,
    /// Info fields only; the energy limit is written as disabled. Used by
    /// the single-purpose on/off and current setters.
    InfoOnly,
}

/// Builds the settings block that writes back what the device reports.
///
/// `energy_limit` is the raw limit from the Energy record and is only
/// consulted under [`BaselinePolicy::PreserveEnergyLimit`].
pub fn build_baseline(
    info: &InfoRecord,
    energy_limit: Option<u16>,
    policy: BaselinePolicy,
) -> SettingsRecord {
    let charging_energy_limit = match policy {
        BaselinePolicy::PreserveEnergyLimit => energy_limit.unwrap_or(ENERGY_LIMIT_DISABLED),
        BaselinePolicy::InfoOnly => ENERGY_LIMIT_DISABLED,
    };
    SettingsRecord {
        pin: 0,
        current: info.current,
        charging_energy_limit,
        kwh_per_100: info.kwh_per_100,
        amount_per_kwh: info.amount_per_kwh,
        efficiency: info.efficiency,
        pause_charging: u8::from(!info.charging_enabled()),
        ble_transmit_power: info.ble_transmit_power,
    }
}

/// Checks a requested current against the settable range
pub fn validate_current(value: i64, min: u8, max: u8) -> Result<u8> {
    if value < i64::from(min) || value > i64::from(max) {
        return Err(BridgeError::InvalidCurrent { value, min, max });
    }
    u8::try_from(value).map_err(|_| BridgeError::InvalidCurrent { value, min, max })
}

/// The settings document shape of the charger's HTTP API:
/// `{"Values": {"ChargingStatus": {"Charging": ..}, "ChargingCurrent": {"Value": ..},
/// "DeviceMetadata": {"Password": ".."}}}`
#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase", deny_unknown_fields)]
struct SettingsDocument {
    values: DocumentValues,
    /// Read-only block emitted alongside `Values` by the settings view
    #[serde(default)]
    #[allow(dead_code)]
    details: Option<IgnoredAny>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase", default, deny_unknown_fields)]
struct DocumentValues {
    charging_status: Option<ChargingStatus>,
    charging_current: Option<ChargingCurrent>,
    device_metadata: Option<DeviceMetadata>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase", deny_unknown_fields)]
struct ChargingStatus {
    charging: Option<bool>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase", deny_unknown_fields)]
struct ChargingCurrent {
    /// Fractional amps are truncated
    value: Option<f64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase", deny_unknown_fields)]
struct DeviceMetadata {
    password: Option<String>,
}

impl TryFrom<SettingsDocument> for PartialSettings {
    type Error = BridgeError;

    fn try_from(document: SettingsDocument) -> Result<Self> {
        let values = document.values;
        let pin = values
            .device_metadata
            .and_then(|m| m.password)
            .map(|password| {
                password.trim().parse::<u16>().map_err(|_| {
                    BridgeError::InvalidCommand(format!("invalid password: {password}"))
                })
            })
            .transpose()?;
        Ok(PartialSettings {
            charging_enabled: values.charging_status.and_then(|s| s.charging),
            current: values
                .charging_current
                .and_then(|c| c.value)
                .map(|amps| amps.trunc() as i64),
            pin,
            energy_limit: None,
        })
    }
}

impl PartialSettings {
    /// Parses a patch given either as the flat form
    /// (`{"charging_enabled": false, "current": 10}`) or as the API's
    /// `Values` document. Unknown keys are an error.
    pub fn from_json(body: &str) -> Result<Self> {
        let value: serde_json::Value = serde_json::from_str(body)
            .map_err(|e| BridgeError::InvalidCommand(format!("invalid JSON: {e}")))?;
        let invalid = |e: serde_json::Error| BridgeError::InvalidCommand(format!("invalid patch: {e}"));

        if value.get("Values").is_some() {
            let document: SettingsDocument = serde_json::from_value(value).map_err(invalid)?;
            PartialSettings::try_from(document)
        } else {
            serde_json::from_value(value).map_err(invalid)
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Rejects empty patches and out-of-range values before any device access
    pub fn validate(&self, min_current: u8, max_current: u8) -> Result<()> {
        if self.is_empty() {
            return Err(BridgeError::InvalidCommand(
                "settings update changes nothing".to_string(),
            ));
        }
        if let Some(current) = self.current {
            validate_current(current, min_current, max_current)?;
        }
        Ok(())
    }

    /// Overlays the requested fields on `baseline`
    pub fn apply_to(
        &self,
        mut baseline: SettingsRecord,
        min_current: u8,
        max_current: u8,
    ) -> Result<SettingsRecord> {
        if let Some(enabled) = self.charging_enabled {
            baseline.pause_charging = u8::from(!enabled);
        }
        if let Some(current) = self.current {
            baseline.current = validate_current(current, min_current, max_current)?;
        }
        if let Some(pin) = self.pin {
            baseline.pin = pin;
        }
        if let Some(limit) = self.energy_limit {
            baseline.charging_energy_limit = limit.wire_value();
        }
        Ok(baseline)
    }
}
