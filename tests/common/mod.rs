// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Common utilities for integration tests.

#![allow(dead_code)]

use std::path::PathBuf;

use flightcodec::{
    DataflashWriter, FieldValue, FormatDefinition, MavlinkFraming, MavlinkVersion, MavlinkWriter,
};
use rand::rngs::StdRng;
use rand::Rng;

// ============================================================================
// Dataflash Fixtures
// ============================================================================

/// Type id of the `ALT` message in the altitude log.
pub const ALT_ID: u8 = 1;
/// Type id of the `TIME` message in the altitude log.
pub const TIME_ID: u8 = 2;

/// Create a format definition, panicking on an invalid one.
pub fn fmt(type_id: u8, name: &str, format: &str, columns: &[&str]) -> FormatDefinition {
    FormatDefinition::new(type_id, name, format, columns)
        .unwrap_or_else(|e| panic!("bad test format {name}: {e}"))
}

/// `ALT {alt: float32}` records at the given times, each preceded by a
/// `TIME` record that sets the running clock.
pub fn altitude_log(samples: &[(u64, f32)]) -> Vec<u8> {
    let mut writer = DataflashWriter::with_header().unwrap();
    writer.write_format(&fmt(ALT_ID, "ALT", "f", &["alt"])).unwrap();
    writer
        .write_format(&fmt(TIME_ID, "TIME", "Q", &["TimeUS"]))
        .unwrap();
    for &(t, alt) in samples {
        writer
            .write_record(TIME_ID, &[FieldValue::UInt64(t)])
            .unwrap();
        writer
            .write_record(ALT_ID, &[FieldValue::Float32(alt)])
            .unwrap();
    }
    writer.into_bytes()
}

/// The three-sample altitude scenario: 10.0, 12.5 and 9.0 at 100, 200, 300.
pub fn scenario_log() -> Vec<u8> {
    altitude_log(&[(100, 10.0), (200, 12.5), (300, 9.0)])
}

/// `ALT {TimeUS: uint64, alt: float32}` records carrying their own time.
pub fn timed_altitude_log(samples: &[(u64, f32)]) -> Vec<u8> {
    let mut writer = DataflashWriter::with_header().unwrap();
    writer
        .write_format(&fmt(ALT_ID, "ALT", "Qf", &["TimeUS", "alt"]))
        .unwrap();
    for &(t, alt) in samples {
        writer
            .write_record(ALT_ID, &[FieldValue::UInt64(t), FieldValue::Float32(alt)])
            .unwrap();
    }
    writer.into_bytes()
}

/// Type ids of the two messages that together use every type code.
pub const NUMERIC_ID: u8 = 20;
pub const TEXT_ID: u8 = 21;

/// Two formats covering every dataflash type code between them.
pub fn all_codes_formats() -> [FormatDefinition; 2] {
    [
        fmt(
            NUMERIC_ID,
            "NUMS",
            "QabBhHiIfd",
            &["TimeUS", "Arr", "i8", "u8", "i16", "u16", "i32", "u32", "f32", "f64"],
        ),
        fmt(
            TEXT_ID,
            "MIXD",
            "QnNZcCeELMqg",
            &[
                "TimeUS", "Id", "Label", "Text", "Cs", "CUs", "Es", "EUs", "Lat", "Mode", "Big",
                "Half",
            ],
        ),
    ]
}

/// Random values for a `NUMS` record.
pub fn numeric_values(rng: &mut StdRng, time_us: u64) -> Vec<FieldValue> {
    let array = (0..32)
        .map(|_| FieldValue::Int16(rng.gen()))
        .collect::<Vec<_>>();
    vec![
        FieldValue::UInt64(time_us),
        FieldValue::Array(array),
        FieldValue::Int8(rng.gen()),
        FieldValue::UInt8(rng.gen()),
        FieldValue::Int16(rng.gen()),
        FieldValue::UInt16(rng.gen()),
        FieldValue::Int32(rng.gen()),
        FieldValue::UInt32(rng.gen()),
        FieldValue::Float32(rng.gen_range(-1000.0..1000.0)),
        FieldValue::Float64(rng.gen_range(-1e6..1e6)),
    ]
}

/// Random values for a `MIXD` record.
pub fn text_values(rng: &mut StdRng, time_us: u64) -> Vec<FieldValue> {
    vec![
        FieldValue::UInt64(time_us),
        FieldValue::Chars(b"GPS".to_vec()),
        FieldValue::Chars(b"exactly16bytes!!".to_vec()),
        FieldValue::Chars(format!("record at {time_us}").into_bytes()),
        FieldValue::Int16(rng.gen()),
        FieldValue::UInt16(rng.gen()),
        FieldValue::Int32(rng.gen()),
        FieldValue::UInt32(rng.gen()),
        FieldValue::Int32(rng.gen_range(-900_000_000..900_000_000)),
        FieldValue::UInt8(rng.gen_range(0..30)),
        FieldValue::Int64(rng.gen()),
        FieldValue::Float16(rng.gen_range(0x0000..0x7C00)),
    ]
}

/// A log mixing `NUMS` and `MIXD` records with random contents.
pub fn all_codes_log(rng: &mut StdRng, records: usize) -> Vec<u8> {
    let mut writer = DataflashWriter::with_header().unwrap();
    for def in all_codes_formats() {
        writer.write_format(&def).unwrap();
    }
    for i in 0..records {
        let t = i as u64 * 2_500;
        if rng.gen_bool(0.5) {
            writer
                .write_record(NUMERIC_ID, &numeric_values(rng, t))
                .unwrap();
        } else {
            writer.write_record(TEXT_ID, &text_values(rng, t)).unwrap();
        }
    }
    writer.into_bytes()
}

/// A log with two instances of a `BARO` sensor and an `IMU` stream at
/// irregular, sometimes repeated, timestamps.
pub fn random_sensor_log(rng: &mut StdRng, records: usize) -> Vec<u8> {
    let mut writer = DataflashWriter::with_header().unwrap();
    writer
        .write_format(&fmt(10, "BARO", "QBfe", &["TimeUS", "I", "Alt", "Press"]))
        .unwrap();
    writer
        .write_format(&fmt(11, "IMU", "Qfff", &["TimeUS", "AccX", "AccY", "AccZ"]))
        .unwrap();

    let mut t = 0u64;
    for _ in 0..records {
        // Zero steps produce ties.
        t += rng.gen_range(0..2_000u64);
        if rng.gen_bool(0.4) {
            writer
                .write_record(
                    10,
                    &[
                        FieldValue::UInt64(t),
                        FieldValue::UInt8(rng.gen_range(0..2)),
                        FieldValue::Float32(rng.gen_range(0.0..500.0)),
                        FieldValue::Int32(rng.gen_range(90_000..110_000)),
                    ],
                )
                .unwrap();
        } else {
            writer
                .write_record(
                    11,
                    &[
                        FieldValue::UInt64(t),
                        FieldValue::Float32(rng.gen_range(-20.0..20.0)),
                        FieldValue::Float32(rng.gen_range(-20.0..20.0)),
                        FieldValue::Float32(rng.gen_range(-20.0..20.0)),
                    ],
                )
                .unwrap();
        }
    }
    writer.into_bytes()
}

// ============================================================================
// MAVLink Fixtures
// ============================================================================

/// MAVLink `ATTITUDE` message id.
pub const ATTITUDE_ID: u32 = 30;

/// `ATTITUDE` field values with only time and roll set.
pub fn attitude(time_boot_ms: u32, roll: f32) -> Vec<FieldValue> {
    vec![
        FieldValue::UInt32(time_boot_ms),
        FieldValue::Float32(roll),
        FieldValue::Float32(0.25),
        FieldValue::Float32(1.5),
        FieldValue::Float32(0.0),
        FieldValue::Float32(0.0),
        FieldValue::Float32(0.0),
    ]
}

/// `ATTITUDE` frames from `(system, component, time_boot_ms, roll)` tuples.
pub fn attitude_stream(
    version: MavlinkVersion,
    framing: MavlinkFraming,
    frames: &[(u8, u8, u32, f32)],
) -> MavlinkWriter {
    let mut writer = MavlinkWriter::new(version, framing);
    for &(system, component, time_ms, roll) in frames {
        // Tlog prefix: an arbitrary 2024 wall clock plus the boot time.
        let wall = 1_717_200_000_000_000 + time_ms as u64 * 1_000;
        writer
            .write_message(
                system,
                component,
                ATTITUDE_ID,
                &attitude(time_ms, roll),
                Some(wall),
            )
            .unwrap();
    }
    writer
}

// ============================================================================
// Files
// ============================================================================

/// Write bytes to a unique temp file.
pub fn write_temp(name: &str, bytes: &[u8]) -> PathBuf {
    let path = std::env::temp_dir().join(format!(
        "flightcodec-{}-{}",
        std::process::id(),
        name
    ));
    std::fs::write(&path, bytes).unwrap();
    path
}
