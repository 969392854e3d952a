//! Property tests for the characteristic codec: every in-range record
//! survives encode/decode, and any buffer of the wrong length is refused.

use pantabox_bridge_lib::BridgeError;
use pantabox_bridge_lib::core::charger::{
    EnergyRecord, InfoRecord, PowerRecord, SettingsRecord, VoltageCurrentRecord, WireRecord,
};
use proptest::prelude::*;

fn energy() -> impl Strategy<Value = EnergyRecord> {
    (any::<u32>(), any::<u32>(), any::<u32>(), any::<u32>(), any::<u16>()).prop_map(
        |(total, last, second, third, limit)| EnergyRecord {
            total_energy: total,
            energy_last_charge: last,
            energy_2nd_last_charge: second,
            energy_3rd_last_charge: third,
            charging_energy_limit: limit,
        },
    )
}

fn power() -> impl Strategy<Value = PowerRecord> {
    (
        any::<[u16; 6]>(),
        any::<i16>(),
        any::<u16>(),
        any::<u16>(),
        any::<i8>(),
    )
        .prop_map(|(p, temperature, remaining_distance, costs, cp_signal)| PowerRecord {
            total_power: p[0],
            l1: p[1],
            l2: p[2],
            l3: p[3],
            peak_power: p[4],
            frequency: p[5],
            temperature,
            remaining_distance,
            costs,
            cp_signal,
        })
}

fn voltage_current() -> impl Strategy<Value = VoltageCurrentRecord> {
    (any::<[u16; 3]>(), any::<[u16; 3]>())
        .prop_map(|(voltage, current)| VoltageCurrentRecord { voltage, current })
}

fn info() -> impl Strategy<Value = InfoRecord> {
    (any::<u8>(), any::<u16>(), any::<[u8; 8]>()).prop_map(|(current, kwh_per_100, b)| InfoRecord {
        current,
        kwh_per_100,
        amount_per_kwh: b[0],
        fi_enabled: b[1],
        error_code: b[2],
        efficiency: b[3],
        charging_active: b[4],
        pause_charging: b[5],
        charging_current_max: b[6],
        ble_transmit_power: b[7],
    })
}

fn settings() -> impl Strategy<Value = SettingsRecord> {
    (any::<[u16; 3]>(), any::<[u8; 5]>()).prop_map(|(w, b)| SettingsRecord {
        pin: w[0],
        current: b[0],
        charging_energy_limit: w[1],
        kwh_per_100: w[2],
        amount_per_kwh: b[1],
        efficiency: b[2],
        pause_charging: b[3],
        ble_transmit_power: b[4],
    })
}

fn assert_round_trip<R: WireRecord + PartialEq + std::fmt::Debug>(record: R) -> Result<(), TestCaseError> {
    let bytes = record.encode();
    prop_assert_eq!(bytes.len(), R::SIZE);
    prop_assert_eq!(R::decode(&bytes).unwrap(), record);
    Ok(())
}

proptest! {
    #[test]
    fn energy_round_trip(record in energy()) {
        assert_round_trip(record)?;
    }

    /// Temperature covers the whole signed range, including below zero
    #[test]
    fn power_round_trip(record in power()) {
        assert_round_trip(record)?;
    }

    #[test]
    fn voltage_current_round_trip(record in voltage_current()) {
        assert_round_trip(record)?;
    }

    #[test]
    fn info_round_trip(record in info()) {
        assert_round_trip(record)?;
    }

    #[test]
    fn settings_round_trip(record in settings()) {
        assert_round_trip(record)?;
    }

    #[test]
    fn wrong_length_is_malformed(bytes in proptest::collection::vec(any::<u8>(), 0..40)) {
        prop_assume!(bytes.len() != InfoRecord::SIZE);
        let err = InfoRecord::decode(&bytes).unwrap_err();
        let is_malformed = matches!(
            err,
            BridgeError::MalformedRecord { expected: 13, actual, .. } if actual == bytes.len()
        );
        prop_assert!(is_malformed);
    }
}
