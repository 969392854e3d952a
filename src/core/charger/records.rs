//! Fixed-layout binary records exchanged with the charger.
//!
//! Every multi-byte field is big-endian on the wire. Records hold the raw,
//! unscaled integers; scaling to physical units happens in the accessor
//! methods and in [`crate::core::charger::views`].
//!
//! | Record          | Size | Characteristic                          |
//! |-----------------|------|-----------------------------------------|
//! | Energy          | 19   | `0379e580-ad1b-11e4-8bdd-0002a5d6b15d`  |
//! | Power           | 19   | `fd005380-b065-11e4-9ce2-0002a5d6b15d`  |
//! | Voltage/Current | 14   | `171bad00-b066-11e4-aeda-0002a5d6b15d`  |
//! | Info            | 13   | `8f75bba0-c903-11e4-9fe8-0002a5d6b15d`  |
//! | Settings        | 18   | `14b3afc0-ad1b-11e4-baab-0002a5d6b15d`  |

use serde::Serialize;
use uuid::Uuid;

use crate::core::bluetooth::{
    ENERGY_LIMIT_DISABLED, UUID_ENERGY_CHAR, UUID_INFO_CHAR, UUID_POWER_CHAR,
    UUID_SETTINGS_CHAR, UUID_VOLTAGE_CURRENT_CHAR,
};
use crate::error::{BridgeError, Result};

/// A record with a fixed wire size, bound to one characteristic
pub trait WireRecord: Sized {
    const NAME: &'static str;
    const SIZE: usize;
    const CHARACTERISTIC: Uuid;

    /// Decodes a buffer of exactly [`WireRecord::SIZE`] bytes
    fn decode(bytes: &[u8]) -> Result<Self>;

    fn encode(&self) -> Vec<u8>;
}

/// Big-endian cursor over a length-checked buffer
struct WireReader<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> WireReader<'a> {
    fn new<R: WireRecord>(bytes: &'a [u8]) -> Result<Self> {
        if bytes.len() != R::SIZE {
            return Err(BridgeError::MalformedRecord {
                record: R::NAME,
                expected: R::SIZE,
                actual: bytes.len(),
            });
        }
        Ok(Self { bytes, pos: 0 })
    }

    fn take<const N: usize>(&mut self) -> [u8; N] {
        let mut out = [0u8; N];
        out.copy_from_slice(&self.bytes[self.pos..self.pos + N]);
        self.pos += N;
        out
    }

    fn u8(&mut self) -> u8 {
        self.take::<1>()[0]
    }

    fn i8(&mut self) -> i8 {
        i8::from_be_bytes(self.take())
    }

    fn u16(&mut self) -> u16 {
        u16::from_be_bytes(self.take())
    }

    fn i16(&mut self) -> i16 {
        i16::from_be_bytes(self.take())
    }

    fn u32(&mut self) -> u32 {
        u32::from_be_bytes(self.take())
    }

    fn skip(&mut self, n: usize) {
        self.pos += n;
    }
}

struct WireWriter(Vec<u8>);

impl WireWriter {
    fn new<R: WireRecord>() -> Self {
        Self(Vec::with_capacity(R::SIZE))
    }

    fn u8(mut self, v: u8) -> Self {
        self.0.push(v);
        self
    }

    fn i8(mut self, v: i8) -> Self {
        self.0.extend_from_slice(&v.to_be_bytes());
        self
    }

    fn u16(mut self, v: u16) -> Self {
        self.0.extend_from_slice(&v.to_be_bytes());
        self
    }

    fn i16(mut self, v: i16) -> Self {
        self.0.extend_from_slice(&v.to_be_bytes());
        self
    }

    fn u32(mut self, v: u32) -> Self {
        self.0.extend_from_slice(&v.to_be_bytes());
        self
    }

    /// Reserved bytes are always transmitted as zero
    fn pad(mut self, n: usize) -> Self {
        self.0.resize(self.0.len() + n, 0);
        self
    }

    fn finish(self) -> Vec<u8> {
        self.0
    }
}

/// Control pilot state of the charging port
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum CpState {
    /// No vehicle
    A,
    /// Vehicle connected
    B,
    /// Charging
    C,
}

impl CpState {
    /// Unknown signal levels read as idle
    pub fn from_signal(signal: i8) -> Self {
        match signal {
            3 => CpState::B,
            2 => CpState::C,
            _ => CpState::A,
        }
    }
}

/// Energy counters in Wh, limit in hundredths of kWh
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct EnergyRecord {
    pub total_energy: u32,
    pub energy_last_charge: u32,
    pub energy_2nd_last_charge: u32,
    pub energy_3rd_last_charge: u32,
    pub charging_energy_limit: u16,
}

impl EnergyRecord {
    pub fn total_energy_kwh(&self) -> f64 {
        f64::from(self.total_energy) / 1000.0
    }

    pub fn last_charge_kwh(&self) -> f64 {
        f64::from(self.energy_last_charge) / 1000.0
    }

    /// `None` when the limit is disabled
    pub fn energy_limit_kwh(&self) -> Option<f64> {
        (self.charging_energy_limit != ENERGY_LIMIT_DISABLED)
            .then(|| f64::from(self.charging_energy_limit) / 100.0)
    }
}

impl WireRecord for EnergyRecord {
    const NAME: &'static str = "Energy";
    const SIZE: usize = 19;
    const CHARACTERISTIC: Uuid = UUID_ENERGY_CHAR;

    fn decode(bytes: &[u8]) -> Result<Self> {
        let mut r = WireReader::new::<Self>(bytes)?;
        Ok(Self {
            total_energy: r.u32(),
            energy_last_charge: r.u32(),
            energy_2nd_last_charge: r.u32(),
            energy_3rd_last_charge: r.u32(),
            charging_energy_limit: r.u16(),
        })
    }

    fn encode(&self) -> Vec<u8> {
        WireWriter::new::<Self>()
            .u32(self.total_energy)
            .u32(self.energy_last_charge)
            .u32(self.energy_2nd_last_charge)
            .u32(self.energy_3rd_last_charge)
            .u16(self.charging_energy_limit)
            .pad(1)
            .finish()
    }
}

/// Power in hundredths of kW, frequency in hundredths of Hz
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PowerRecord {
    pub total_power: u16,
    pub l1: u16,
    pub l2: u16,
    pub l3: u16,
    pub peak_power: u16,
    pub frequency: u16,
    /// Degrees Celsius, unscaled
    pub temperature: i16,
    pub remaining_distance: u16,
    pub costs: u16,
    pub cp_signal: i8,
}

impl PowerRecord {
    pub fn total_power_kw(&self) -> f64 {
        f64::from(self.total_power) / 100.0
    }

    pub fn phase_power_kw(&self) -> [f64; 3] {
        [self.l1, self.l2, self.l3].map(|p| f64::from(p) / 100.0)
    }

    pub fn frequency_hz(&self) -> f64 {
        f64::from(self.frequency) / 100.0
    }

    pub fn cp_state(&self) -> CpState {
        CpState::from_signal(self.cp_signal)
    }
}

impl WireRecord for PowerRecord {
    const NAME: &'static str = "Power";
    const SIZE: usize = 19;
    const CHARACTERISTIC: Uuid = UUID_POWER_CHAR;

    fn decode(bytes: &[u8]) -> Result<Self> {
        let mut r = WireReader::new::<Self>(bytes)?;
        Ok(Self {
            total_power: r.u16(),
            l1: r.u16(),
            l2: r.u16(),
            l3: r.u16(),
            peak_power: r.u16(),
            frequency: r.u16(),
            temperature: r.i16(),
            remaining_distance: r.u16(),
            costs: r.u16(),
            cp_signal: r.i8(),
        })
    }

    fn encode(&self) -> Vec<u8> {
        WireWriter::new::<Self>()
            .u16(self.total_power)
            .u16(self.l1)
            .u16(self.l2)
            .u16(self.l3)
            .u16(self.peak_power)
            .u16(self.frequency)
            .i16(self.temperature)
            .u16(self.remaining_distance)
            .u16(self.costs)
            .i8(self.cp_signal)
            .finish()
    }
}

/// Voltage in tenths of V, current in hundredths of A, phases L1..L3
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct VoltageCurrentRecord {
    pub voltage: [u16; 3],
    pub current: [u16; 3],
}

impl VoltageCurrentRecord {
    pub fn voltage_v(&self) -> [f64; 3] {
        self.voltage.map(|v| f64::from(v) / 10.0)
    }

    pub fn current_a(&self) -> [f64; 3] {
        self.current.map(|c| f64::from(c) / 100.0)
    }
}

impl WireRecord for VoltageCurrentRecord {
    const NAME: &'static str = "VoltageCurrent";
    const SIZE: usize = 14;
    const CHARACTERISTIC: Uuid = UUID_VOLTAGE_CURRENT_CHAR;

    fn decode(bytes: &[u8]) -> Result<Self> {
        let mut r = WireReader::new::<Self>(bytes)?;
        let voltage = [r.u16(), r.u16(), r.u16()];
        let current = [r.u16(), r.u16(), r.u16()];
        r.skip(2);
        Ok(Self { voltage, current })
    }

    fn encode(&self) -> Vec<u8> {
        let mut w = WireWriter::new::<Self>();
        for v in self.voltage {
            w = w.u16(v);
        }
        for c in self.current {
            w = w.u16(c);
        }
        w.pad(2).finish()
    }
}

/// Current device configuration and status flags
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct InfoRecord {
    /// Current limit in amps
    pub current: u8,
    /// Tenths of kWh per 100 km
    pub kwh_per_100: u16,
    /// Hundredths of a currency unit per kWh
    pub amount_per_kwh: u8,
    pub fi_enabled: u8,
    pub error_code: u8,
    /// Percent
    pub efficiency: u8,
    pub charging_active: u8,
    pub pause_charging: u8,
    pub charging_current_max: u8,
    pub ble_transmit_power: u8,
}

impl InfoRecord {
    pub fn is_charging(&self) -> bool {
        self.charging_active == 1
    }

    /// Charging is enabled unless it is paused
    pub fn charging_enabled(&self) -> bool {
        self.pause_charging == 0
    }

    pub fn kwh_per_100_value(&self) -> f64 {
        f64::from(self.kwh_per_100) / 10.0
    }

    pub fn amount_per_kwh_value(&self) -> f64 {
        f64::from(self.amount_per_kwh) / 100.0
    }
}

impl WireRecord for InfoRecord {
    const NAME: &'static str = "Info";
    const SIZE: usize = 13;
    const CHARACTERISTIC: Uuid = UUID_INFO_CHAR;

    fn decode(bytes: &[u8]) -> Result<Self> {
        let mut r = WireReader::new::<Self>(bytes)?;
        let info = Self {
            current: r.u8(),
            kwh_per_100: r.u16(),
            amount_per_kwh: r.u8(),
            fi_enabled: r.u8(),
            error_code: r.u8(),
            efficiency: r.u8(),
            charging_active: r.u8(),
            pause_charging: r.u8(),
            charging_current_max: r.u8(),
            ble_transmit_power: r.u8(),
        };
        r.skip(2);
        Ok(info)
    }

    fn encode(&self) -> Vec<u8> {
        WireWriter::new::<Self>()
            .u8(self.current)
            .u16(self.kwh_per_100)
            .u8(self.amount_per_kwh)
            .u8(self.fi_enabled)
            .u8(self.error_code)
            .u8(self.efficiency)
            .u8(self.charging_active)
            .u8(self.pause_charging)
            .u8(self.charging_current_max)
            .u8(self.ble_transmit_power)
            .pad(2)
            .finish()
    }
}

/// The PIN-gated settings block written to the charger
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SettingsRecord {
    pub pin: u16,
    pub current: u8,
    /// Hundredths of kWh, or [`ENERGY_LIMIT_DISABLED`]
    pub charging_energy_limit: u16,
    pub kwh_per_100: u16,
    pub amount_per_kwh: u8,
    pub efficiency: u8,
    pub pause_charging: u8,
    pub ble_transmit_power: u8,
}

impl WireRecord for SettingsRecord {
    const NAME: &'static str = "Settings";
    const SIZE: usize = 18;
    const CHARACTERISTIC: Uuid = UUID_SETTINGS_CHAR;

    fn decode(bytes: &[u8]) -> Result<Self> {
        let mut r = WireReader::new::<Self>(bytes)?;
        let pin = r.u16();
        let current = r.u8();
        let charging_energy_limit = r.u16();
        let kwh_per_100 = r.u16();
        let amount_per_kwh = r.u8();
        r.skip(2);
        Ok(Self {
            pin,
            current,
            charging_energy_limit,
            kwh_per_100,
            amount_per_kwh,
            efficiency: r.u8(),
            pause_charging: r.u8(),
            ble_transmit_power: r.u8(),
        })
    }

    fn encode(&self) -> Vec<u8> {
        WireWriter::new::<Self>()
            .u16(self.pin)
            .u8(self.current)
            .u16(self.charging_energy_limit)
            .u16(self.kwh_per_100)
            .u8(self.amount_per_kwh)
            .pad(2)
            .u8(self.efficiency)
            .u8(self.pause_charging)
            .u8(self.ble_transmit_power)
            .pad(5)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encoded_sizes_match_layout() {
        assert_eq!(EnergyRecord::default().encode().len(), EnergyRecord::SIZE);
        assert_eq!(PowerRecord::default().encode().len(), PowerRecord::SIZE);
        assert_eq!(VoltageCurrentRecord::default().encode().len(), VoltageCurrentRecord::SIZE);
        assert_eq!(InfoRecord::default().encode().len(), InfoRecord::SIZE);
        assert_eq!(SettingsRecord::default().encode().len(), SettingsRecord::SIZE);
    }

    #[test]
    fn test_settings_fixture_bytes() {
        let settings = SettingsRecord {
            pin: 0x04D2,
            current: 16,
            charging_energy_limit: ENERGY_LIMIT_DISABLED,
            kwh_per_100: 0x00B4,
            amount_per_kwh: 30,
            efficiency: 90,
            pause_charging: 1,
            ble_transmit_power: 4,
        };
        assert_eq!(
            settings.encode(),
            vec![
                0x04, 0xD2, // pin
                0x10, // current
                0x4E, 0x1D, // 19997
                0x00, 0xB4, // kwh per 100
                0x1E, // amount per kwh
                0x00, 0x00, // reserved
                0x5A, // efficiency
                0x01, // pause
                0x04, // tx power
                0x00, 0x00, 0x00, 0x00, 0x00,
            ]
        );
    }

    #[test]
    fn test_energy_decode_big_endian() {
        let bytes = [
            0x00, 0x01, 0xE2, 0x40, // 123456
            0x00, 0x00, 0x30, 0x39, // 12345
            0x00, 0x00, 0x00, 0x01, //
            0x00, 0x00, 0x00, 0x02, //
            0x05, 0xDC, // 1500
            0xFF, // padding is ignored
        ];
        let energy = EnergyRecord::decode(&bytes).unwrap();
        assert_eq!(energy.total_energy, 123_456);
        assert_eq!(energy.energy_last_charge, 12_345);
        assert_eq!(energy.energy_2nd_last_charge, 1);
        assert_eq!(energy.energy_3rd_last_charge, 2);
        assert_eq!(energy.charging_energy_limit, 1500);
        assert_eq!(energy.total_energy_kwh(), 123.456);
        assert_eq!(energy.energy_limit_kwh(), Some(15.0));
    }

    #[test]
    fn test_negative_temperature_survives() {
        let power = PowerRecord {
            total_power: 1100,
            l1: 370,
            l2: 365,
            l3: 365,
            peak_power: 1150,
            frequency: 5001,
            temperature: -12,
            remaining_distance: 42,
            costs: 7,
            cp_signal: 2,
        };
        let bytes = power.encode();
        assert_eq!(&bytes[12..14], &[0xFF, 0xF4]);
        let decoded = PowerRecord::decode(&bytes).unwrap();
        assert_eq!(decoded, power);
        assert_eq!(decoded.temperature, -12);
        assert_eq!(decoded.cp_state(), CpState::C);
    }

    #[test]
    fn test_round_trip_all_records() {
        let energy = EnergyRecord {
            total_energy: u32::MAX,
            energy_last_charge: 0x0102_0304,
            energy_2nd_last_charge: 7,
            energy_3rd_last_charge: 0,
            charging_energy_limit: 2500,
        };
        assert_eq!(EnergyRecord::decode(&energy.encode()).unwrap(), energy);

        let vc = VoltageCurrentRecord {
            voltage: [2301, 2298, 2310],
            current: [1598, 1601, 0],
        };
        assert_eq!(VoltageCurrentRecord::decode(&vc.encode()).unwrap(), vc);

        let info = InfoRecord {
            current: 16,
            kwh_per_100: 180,
            amount_per_kwh: 30,
            fi_enabled: 1,
            error_code: 0,
            efficiency: 90,
            charging_active: 1,
            pause_charging: 0,
            charging_current_max: 32,
            ble_transmit_power: 4,
        };
        assert_eq!(InfoRecord::decode(&info.encode()).unwrap(), info);

        let settings = SettingsRecord {
            pin: u16::MAX,
            current: 32,
            charging_energy_limit: 1,
            kwh_per_100: 65535,
            amount_per_kwh: 255,
            efficiency: 100,
            pause_charging: 0,
            ble_transmit_power: 7,
        };
        assert_eq!(SettingsRecord::decode(&settings.encode()).unwrap(), settings);
    }

    #[test]
    fn test_info_kwh_per_100_is_swapped() {
        let mut bytes = InfoRecord::default().encode();
        bytes[1] = 0x01;
        bytes[2] = 0x2C;
        let info = InfoRecord::decode(&bytes).unwrap();
        assert_eq!(info.kwh_per_100, 300);
        assert_eq!(info.kwh_per_100_value(), 30.0);
    }

    #[test]
    fn test_short_buffer_is_malformed() {
        let err = InfoRecord::decode(&[0u8; 4]).unwrap_err();
        assert!(matches!(
            err,
            BridgeError::MalformedRecord { record: "Info", expected: 13, actual: 4 }
        ));
    }

    #[test]
    fn test_long_buffer_is_malformed() {
        assert!(matches!(
            PowerRecord::decode(&[0u8; 20]),
            Err(BridgeError::MalformedRecord { .. })
        ));
    }

    #[test]
    fn test_cp_state_mapping() {
        assert_eq!(CpState::from_signal(4), CpState::A);
        assert_eq!(CpState::from_signal(3), CpState::B);
        assert_eq!(CpState::from_signal(2), CpState::C);
        assert_eq!(CpState::from_signal(-1), CpState::A);
    }

    #[test]
    fn test_disabled_limit_has_no_kwh() {
        let energy = EnergyRecord {
            charging_energy_limit: ENERGY_LIMIT_DISABLED,
            ..Default::default()
        };
        assert_eq!(energy.energy_limit_kwh(), None);
    }
}
