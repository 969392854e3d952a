//! Constants used throughout the bridge
//! This module contains the characteristic UUIDs that make up the wire
//! contract with the charger, and the default timings for acquisition.

use uuid::Uuid;

/// Energy counters and the charging energy limit (read)
pub const UUID_ENERGY_CHAR: Uuid = Uuid::from_u128(0x0379e580_ad1b_11e4_8bdd_0002a5d6b15d);

/// Per-phase power, frequency, temperature and CP signal (read)
pub const UUID_POWER_CHAR: Uuid = Uuid::from_u128(0xfd005380_b065_11e4_9ce2_0002a5d6b15d);

/// Per-phase voltage and current (read)
pub const UUID_VOLTAGE_CURRENT_CHAR: Uuid = Uuid::from_u128(0x171bad00_b066_11e4_aeda_0002a5d6b15d);

/// Current limit, tariff and charging flags (read)
pub const UUID_INFO_CHAR: Uuid = Uuid::from_u128(0x8f75bba0_c903_11e4_9fe8_0002a5d6b15d);

/// PIN-gated settings block (write only)
pub const UUID_SETTINGS_CHAR: Uuid = Uuid::from_u128(0x14b3afc0_ad1b_11e4_baab_0002a5d6b15d);

/// Scan window in milliseconds
pub const DEFAULT_SCAN_WINDOW_MS: u64 = 10_000;

/// Attribute discovery attempts per acquisition
pub const DEFAULT_DISCOVERY_ATTEMPTS: u32 = 3;

/// Delay between discovery attempts in milliseconds
pub const DEFAULT_DISCOVERY_BACKOFF_MS: u64 = 100;

/// Lowest settable charging current in amps
pub const MIN_CURRENT_AMPS: u8 = 6;

/// Highest settable charging current in amps
pub const MAX_CURRENT_AMPS: u8 = 32;

/// Charging energy limit value the charger reads as "no limit"
pub const ENERGY_LIMIT_DISABLED: u16 = 19997;
