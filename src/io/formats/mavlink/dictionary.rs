// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Compiled-in MAVLink message dictionary.
//!
//! Field order is the wire order generated from the message definitions
//! (fields sorted by type size, descending, extension fields omitted). The
//! CRC extra byte of each message is the seed appended to the frame checksum.

use std::collections::HashMap;
use std::sync::{Arc, OnceLock};

use crate::core::{FieldDef, FieldLayout, FieldRole, PrimitiveType, TimeUnit};

use super::constants::MavlinkVersion;

use PrimitiveType::{
    Float32 as F32, Int16 as I16, Int32 as I32, Int64 as I64, Int8 as I8, UInt16 as U16,
    UInt32 as U32, UInt64 as U64, UInt8 as U8,
};

/// Degrees × 1e7 fields scaled to degrees in channels.
const DEG_E7: f64 = 1e-7;

/// Field spec: name, type, element count, channel scale.
type FieldSpec = (&'static str, PrimitiveType, usize, f64);

const fn f(name: &'static str, ty: PrimitiveType) -> FieldSpec {
    (name, ty, 1, 1.0)
}

const fn deg(name: &'static str) -> FieldSpec {
    (name, I32, 1, DEG_E7)
}

const fn chars(name: &'static str, len: usize) -> FieldSpec {
    (name, PrimitiveType::Char, len, 1.0)
}

/// Static definition of one message.
struct MessageSpec {
    id: u32,
    name: &'static str,
    crc_extra: u8,
    fields: &'static [FieldSpec],
}

const MESSAGES: &[MessageSpec] = &[
    MessageSpec {
        id: 0,
        name: "HEARTBEAT",
        crc_extra: 50,
        fields: &[
            f("custom_mode", U32),
            f("type", U8),
            f("autopilot", U8),
            f("base_mode", U8),
            f("system_status", U8),
            f("mavlink_version", U8),
        ],
    },
    MessageSpec {
        id: 1,
        name: "SYS_STATUS",
        crc_extra: 124,
        fields: &[
            f("onboard_control_sensors_present", U32),
            f("onboard_control_sensors_enabled", U32),
            f("onboard_control_sensors_health", U32),
            f("load", U16),
            f("voltage_battery", U16),
            f("current_battery", I16),
            f("drop_rate_comm", U16),
            f("errors_comm", U16),
            f("errors_count1", U16),
            f("errors_count2", U16),
            f("errors_count3", U16),
            f("errors_count4", U16),
            f("battery_remaining", I8),
        ],
    },
    MessageSpec {
        id: 2,
        name: "SYSTEM_TIME",
        crc_extra: 137,
        fields: &[f("time_unix_usec", U64), f("time_boot_ms", U32)],
    },
    MessageSpec {
        id: 22,
        name: "PARAM_VALUE",
        crc_extra: 220,
        fields: &[
            f("param_value", F32),
            f("param_count", U16),
            f("param_index", U16),
            chars("param_id", 16),
            f("param_type", U8),
        ],
    },
    MessageSpec {
        id: 24,
        name: "GPS_RAW_INT",
        crc_extra: 24,
        fields: &[
            f("time_usec", U64),
            deg("lat"),
            deg("lon"),
            f("alt", I32),
            f("eph", U16),
            f("epv", U16),
            f("vel", U16),
            f("cog", U16),
            f("fix_type", U8),
            f("satellites_visible", U8),
        ],
    },
    MessageSpec {
        id: 26,
        name: "SCALED_IMU",
        crc_extra: 170,
        fields: &[
            f("time_boot_ms", U32),
            f("xacc", I16),
            f("yacc", I16),
            f("zacc", I16),
            f("xgyro", I16),
            f("ygyro", I16),
            f("zgyro", I16),
            f("xmag", I16),
            f("ymag", I16),
            f("zmag", I16),
        ],
    },
    MessageSpec {
        id: 27,
        name: "RAW_IMU",
        crc_extra: 144,
        fields: &[
            f("time_usec", U64),
            f("xacc", I16),
            f("yacc", I16),
            f("zacc", I16),
            f("xgyro", I16),
            f("ygyro", I16),
            f("zgyro", I16),
            f("xmag", I16),
            f("ymag", I16),
            f("zmag", I16),
        ],
    },
    MessageSpec {
        id: 28,
        name: "RAW_PRESSURE",
        crc_extra: 67,
        fields: &[
            f("time_usec", U64),
            f("press_abs", I16),
            f("press_diff1", I16),
            f("press_diff2", I16),
            f("temperature", I16),
        ],
    },
    MessageSpec {
        id: 29,
        name: "SCALED_PRESSURE",
        crc_extra: 115,
        fields: &[
            f("time_boot_ms", U32),
            f("press_abs", F32),
            f("press_diff", F32),
            f("temperature", I16),
        ],
    },
    MessageSpec {
        id: 30,
        name: "ATTITUDE",
        crc_extra: 39,
        fields: &[
            f("time_boot_ms", U32),
            f("roll", F32),
            f("pitch", F32),
            f("yaw", F32),
            f("rollspeed", F32),
            f("pitchspeed", F32),
            f("yawspeed", F32),
        ],
    },
    MessageSpec {
        id: 31,
        name: "ATTITUDE_QUATERNION",
        crc_extra: 246,
        fields: &[
            f("time_boot_ms", U32),
            f("q1", F32),
            f("q2", F32),
            f("q3", F32),
            f("q4", F32),
            f("rollspeed", F32),
            f("pitchspeed", F32),
            f("yawspeed", F32),
        ],
    },
    MessageSpec {
        id: 32,
        name: "LOCAL_POSITION_NED",
        crc_extra: 185,
        fields: &[
            f("time_boot_ms", U32),
            f("x", F32),
            f("y", F32),
            f("z", F32),
            f("vx", F32),
            f("vy", F32),
            f("vz", F32),
        ],
    },
    MessageSpec {
        id: 33,
        name: "GLOBAL_POSITION_INT",
        crc_extra: 104,
        fields: &[
            f("time_boot_ms", U32),
            deg("lat"),
            deg("lon"),
            f("alt", I32),
            f("relative_alt", I32),
            f("vx", I16),
            f("vy", I16),
            f("vz", I16),
            f("hdg", U16),
        ],
    },
    MessageSpec {
        id: 35,
        name: "RC_CHANNELS_RAW",
        crc_extra: 244,
        fields: &[
            f("time_boot_ms", U32),
            f("chan1_raw", U16),
            f("chan2_raw", U16),
            f("chan3_raw", U16),
            f("chan4_raw", U16),
            f("chan5_raw", U16),
            f("chan6_raw", U16),
            f("chan7_raw", U16),
            f("chan8_raw", U16),
            f("port", U8),
            f("rssi", U8),
        ],
    },
    MessageSpec {
        id: 36,
        name: "SERVO_OUTPUT_RAW",
        crc_extra: 222,
        fields: &[
            f("time_usec", U32),
            f("servo1_raw", U16),
            f("servo2_raw", U16),
            f("servo3_raw", U16),
            f("servo4_raw", U16),
            f("servo5_raw", U16),
            f("servo6_raw", U16),
            f("servo7_raw", U16),
            f("servo8_raw", U16),
            f("port", U8),
        ],
    },
    MessageSpec {
        id: 42,
        name: "MISSION_CURRENT",
        crc_extra: 28,
        fields: &[f("seq", U16)],
    },
    MessageSpec {
        id: 46,
        name: "MISSION_ITEM_REACHED",
        crc_extra: 11,
        fields: &[f("seq", U16)],
    },
    MessageSpec {
        id: 62,
        name: "NAV_CONTROLLER_OUTPUT",
        crc_extra: 183,
        fields: &[
            f("nav_roll", F32),
            f("nav_pitch", F32),
            f("alt_error", F32),
            f("aspd_error", F32),
            f("xtrack_error", F32),
            f("nav_bearing", I16),
            f("target_bearing", I16),
            f("wp_dist", U16),
        ],
    },
    MessageSpec {
        id: 65,
        name: "RC_CHANNELS",
        crc_extra: 118,
        fields: &[
            f("time_boot_ms", U32),
            f("chan1_raw", U16),
            f("chan2_raw", U16),
            f("chan3_raw", U16),
            f("chan4_raw", U16),
            f("chan5_raw", U16),
            f("chan6_raw", U16),
            f("chan7_raw", U16),
            f("chan8_raw", U16),
            f("chan9_raw", U16),
            f("chan10_raw", U16),
            f("chan11_raw", U16),
            f("chan12_raw", U16),
            f("chan13_raw", U16),
            f("chan14_raw", U16),
            f("chan15_raw", U16),
            f("chan16_raw", U16),
            f("chan17_raw", U16),
            f("chan18_raw", U16),
            f("chancount", U8),
            f("rssi", U8),
        ],
    },
    MessageSpec {
        id: 74,
        name: "VFR_HUD",
        crc_extra: 20,
        fields: &[
            f("airspeed", F32),
            f("groundspeed", F32),
            f("alt", F32),
            f("climb", F32),
            f("heading", I16),
            f("throttle", U16),
        ],
    },
    MessageSpec {
        id: 77,
        name: "COMMAND_ACK",
        crc_extra: 143,
        fields: &[f("command", U16), f("result", U8)],
    },
    MessageSpec {
        id: 111,
        name: "TIMESYNC",
        crc_extra: 34,
        fields: &[f("tc1", I64), f("ts1", I64)],
    },
    MessageSpec {
        id: 116,
        name: "SCALED_IMU2",
        crc_extra: 76,
        fields: &[
            f("time_boot_ms", U32),
            f("xacc", I16),
            f("yacc", I16),
            f("zacc", I16),
            f("xgyro", I16),
            f("ygyro", I16),
            f("zgyro", I16),
            f("xmag", I16),
            f("ymag", I16),
            f("zmag", I16),
        ],
    },
    MessageSpec {
        id: 125,
        name: "POWER_STATUS",
        crc_extra: 203,
        fields: &[f("Vcc", U16), f("Vservo", U16), f("flags", U16)],
    },
    MessageSpec {
        id: 141,
        name: "ALTITUDE",
        crc_extra: 47,
        fields: &[
            f("time_usec", U64),
            f("altitude_monotonic", F32),
            f("altitude_amsl", F32),
            f("altitude_local", F32),
            f("altitude_relative", F32),
            f("altitude_terrain", F32),
            f("bottom_clearance", F32),
        ],
    },
    MessageSpec {
        id: 168,
        name: "WIND",
        crc_extra: 1,
        fields: &[f("direction", F32), f("speed", F32), f("speed_z", F32)],
    },
    MessageSpec {
        id: 178,
        name: "AHRS2",
        crc_extra: 47,
        fields: &[
            f("roll", F32),
            f("pitch", F32),
            f("yaw", F32),
            f("altitude", F32),
            deg("lat"),
            deg("lng"),
        ],
    },
    MessageSpec {
        id: 241,
        name: "VIBRATION",
        crc_extra: 90,
        fields: &[
            f("time_usec", U64),
            f("vibration_x", F32),
            f("vibration_y", F32),
            f("vibration_z", F32),
            f("clipping_0", U32),
            f("clipping_1", U32),
            f("clipping_2", U32),
        ],
    },
    MessageSpec {
        id: 253,
        name: "STATUSTEXT",
        crc_extra: 83,
        fields: &[f("severity", U8), chars("text", 50)],
    },
];

/// Dictionary entry for one message id.
#[derive(Debug, Clone)]
pub struct MessageEntry {
    /// Checksum seed byte
    pub crc_extra: u8,
    /// Wire layout
    pub layout: Arc<FieldLayout>,
}

impl MessageEntry {
    /// Full (untruncated) payload length.
    pub fn payload_len(&self) -> usize {
        self.layout.payload_size()
    }
}

/// Message id → layout lookup.
#[derive(Debug, Clone, Default)]
pub struct MavlinkDictionary {
    entries: HashMap<u32, MessageEntry>,
}

impl MavlinkDictionary {
    /// Create an empty dictionary.
    pub fn new() -> Self {
        Self::default()
    }

    /// The compiled-in dictionary.
    pub fn builtin() -> &'static MavlinkDictionary {
        static BUILTIN: OnceLock<MavlinkDictionary> = OnceLock::new();
        BUILTIN.get_or_init(|| {
            let mut dict = MavlinkDictionary::new();
            for spec in MESSAGES {
                dict.insert(spec.id, spec.crc_extra, build_layout(spec));
            }
            dict
        })
    }

    /// Add or replace an entry.
    pub fn insert(&mut self, id: u32, crc_extra: u8, layout: FieldLayout) {
        self.entries.insert(
            id,
            MessageEntry {
                crc_extra,
                layout: Arc::new(layout),
            },
        );
    }

    /// Look up a message id for a protocol version.
    ///
    /// MAVLink 1 frames carry an 8-bit id, so ids above 255 only resolve
    /// for MAVLink 2.
    pub fn get(&self, version: MavlinkVersion, id: u32) -> Option<&MessageEntry> {
        if version == MavlinkVersion::V1 && id > u8::MAX as u32 {
            return None;
        }
        self.entries.get(&id)
    }

    /// Number of known messages.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if the dictionary is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn build_layout(spec: &MessageSpec) -> FieldLayout {
    let fields = spec
        .fields
        .iter()
        .map(|&(name, ty, count, scale)| {
            let def = if ty == PrimitiveType::Char {
                FieldDef::chars(name, count)
            } else if count > 1 {
                FieldDef::array(name, ty, count)
            } else {
                FieldDef::scalar(name, ty)
            };
            let def = def.with_scale(scale);
            if name == "time_boot_ms" {
                def.with_role(FieldRole::Timestamp(TimeUnit::Millis))
            } else {
                def
            }
        })
        .collect();
    FieldLayout::new(spec.id, spec.name, fields)
}
