//! Caller-facing views in physical units.

use serde::{Serialize, Serializer};

use crate::core::charger::records::{
    CpState, EnergyRecord, InfoRecord, PowerRecord, VoltageCurrentRecord,
};

/// Live measurements, serialized with the charger API's field names
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct MeasurementsView {
    /// A per phase
    pub charging_current_phase: [f64; 3],
    /// kWh delivered in the last charge
    pub charging_energy: f64,
    /// kWh delivered overall
    pub charging_energy_over_all: f64,
    /// The charger does not meter energy per phase; always zero
    pub charging_energy_phase: [f64; 3],
    /// kWh, `None` when disabled
    pub charging_energy_limit: Option<f64>,
    /// kW
    pub charging_power: f64,
    pub charging_power_phase: [f64; 3],
    /// Hz
    pub frequency: f64,
    /// °C
    pub temperature_main_unit: i16,
    /// V per phase
    pub voltage_phase: [f64; 3],
    pub control_pilot: CpState,
}

impl MeasurementsView {
    pub fn new(energy: &EnergyRecord, power: &PowerRecord, vc: &VoltageCurrentRecord) -> Self {
        Self {
            charging_current_phase: vc.current_a(),
            charging_energy: energy.last_charge_kwh(),
            charging_energy_over_all: energy.total_energy_kwh(),
            charging_energy_phase: [0.0; 3],
            charging_energy_limit: energy.energy_limit_kwh(),
            charging_power: power.total_power_kw(),
            charging_power_phase: power.phase_power_kw(),
            frequency: power.frequency_hz(),
            temperature_main_unit: power.temperature,
            voltage_phase: vc.voltage_v(),
            control_pilot: power.cp_state(),
        }
    }
}

/// Current configuration of the charger.
///
/// Serializes as the API's settings document: the writable values under
/// `Values` (same shape a settings update accepts) and the remaining
/// read-only fields under `Details`.
#[derive(Debug, Clone, PartialEq)]
pub struct SettingsView {
    /// A vehicle is drawing current right now
    pub charging: bool,
    /// Charging is not paused
    pub charging_enabled: bool,
    /// A
    pub charging_current: u8,
    pub charging_current_max: u8,
    /// kWh, `None` when disabled
    pub charging_energy_limit: Option<f64>,
    pub kwh_per_100: f64,
    pub amount_per_kwh: f64,
    /// Percent
    pub efficiency: u8,
    pub ble_transmission_power: u8,
    pub error_code: u8,
}

impl SettingsView {
    pub fn new(info: &InfoRecord, energy: &EnergyRecord) -> Self {
        Self {
            charging: info.is_charging(),
            charging_enabled: info.charging_enabled(),
            charging_current: info.current,
            charging_current_max: info.charging_current_max,
            charging_energy_limit: energy.energy_limit_kwh(),
            kwh_per_100: info.kwh_per_100_value(),
            amount_per_kwh: info.amount_per_kwh_value(),
            efficiency: info.efficiency,
            ble_transmission_power: info.ble_transmit_power,
            error_code: info.error_code,
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "PascalCase")]
struct SettingsDocument {
    values: DocumentValues,
    details: DocumentDetails,
}

#[derive(Serialize)]
#[serde(rename_all = "PascalCase")]
struct DocumentValues {
    charging_status: ChargingStatus,
    charging_current: ChargingCurrent,
}

#[derive(Serialize)]
#[serde(rename_all = "PascalCase")]
struct ChargingStatus {
    charging: bool,
}

#[derive(Serialize)]
#[serde(rename_all = "PascalCase")]
struct ChargingCurrent {
    value: u8,
}

#[derive(Serialize)]
#[serde(rename_all = "PascalCase")]
struct DocumentDetails {
    charging_enabled: bool,
    charging_current_max: u8,
    charging_energy_limit: Option<f64>,
    #[serde(rename = "KWhPer100")]
    kwh_per_100: f64,
    #[serde(rename = "AmountPerKWh")]
    amount_per_kwh: f64,
    efficiency: u8,
    #[serde(rename = "BLETransmissionPower")]
    ble_transmission_power: u8,
    error_code: u8,
}

impl Serialize for SettingsView {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        SettingsDocument {
            values: DocumentValues {
                charging_status: ChargingStatus { charging: self.charging },
                charging_current: ChargingCurrent { value: self.charging_current },
            },
            details: DocumentDetails {
                charging_enabled: self.charging_enabled,
                charging_current_max: self.charging_current_max,
                charging_energy_limit: self.charging_energy_limit,
                kwh_per_100: self.kwh_per_100,
                amount_per_kwh: self.amount_per_kwh,
                efficiency: self.efficiency,
                ble_transmission_power: self.ble_transmission_power,
                error_code: self.error_code,
            },
        }
        .serialize(serializer)
    }
}
