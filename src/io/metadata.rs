// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Shared metadata types for both log formats.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::core::{InstanceKey, PrimitiveType};
use crate::DecodeError;

/// How MAVLink frames are laid out in the file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MavlinkFraming {
    /// Ground-station telemetry log: each frame is preceded by an 8-byte
    /// big-endian Unix timestamp in microseconds
    Tlog,
    /// Bare frame stream
    Raw,
}

/// Log file format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LogFormat {
    /// Self-describing dataflash binary log
    Dataflash,
    /// MAVLink frames
    Mavlink(MavlinkFraming),
    /// Unknown format
    Unknown,
}

impl LogFormat {
    /// Check if this is a known format.
    pub fn is_known(&self) -> bool {
        !matches!(self, LogFormat::Unknown)
    }

    /// Short display name.
    pub fn as_str(&self) -> &'static str {
        match self {
            LogFormat::Dataflash => "dataflash",
            LogFormat::Mavlink(MavlinkFraming::Tlog) => "mavlink-tlog",
            LogFormat::Mavlink(MavlinkFraming::Raw) => "mavlink",
            LogFormat::Unknown => "unknown",
        }
    }
}

impl fmt::Display for LogFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Identity of a channel: message type, optional instance, field.
///
/// Displays as `MSG.field`, `MSG[0].field` (dataflash instance) or
/// `MSG[1:1].field` (MAVLink system:component).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ChannelId {
    /// Message type name
    pub message: String,
    /// Producer instance
    pub instance: Option<InstanceKey>,
    /// Field name
    pub field: String,
}

impl ChannelId {
    /// Create a channel id without an instance.
    pub fn new(message: impl Into<String>, field: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            instance: None,
            field: field.into(),
        }
    }

    /// Set the instance.
    pub fn with_instance(mut self, instance: InstanceKey) -> Self {
        self.instance = Some(instance);
        self
    }
}

impl fmt::Display for ChannelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.instance {
            Some(instance) => write!(f, "{}[{}].{}", self.message, instance, self.field),
            None => write!(f, "{}.{}", self.message, self.field),
        }
    }
}

impl FromStr for ChannelId {
    type Err = DecodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || DecodeError::invalid_config(format!("invalid channel id '{s}'"));

        let (head, field) = s.rsplit_once('.').ok_or_else(invalid)?;
        if field.is_empty() || head.is_empty() {
            return Err(invalid());
        }

        let Some(open) = head.find('[') else {
            return Ok(ChannelId::new(head, field));
        };
        let inner = head[open + 1..].strip_suffix(']').ok_or_else(invalid)?;
        let instance = match inner.split_once(':') {
            Some((system, component)) => InstanceKey::Component {
                system: system.parse().map_err(|_| invalid())?,
                component: component.parse().map_err(|_| invalid())?,
            },
            None => InstanceKey::Index(inner.parse().map_err(|_| invalid())?),
        };
        Ok(ChannelId::new(&head[..open], field).with_instance(instance))
    }
}

/// Channel description handed to the visualization layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChannelMeta {
    /// Channel identity
    pub id: ChannelId,
    /// Wire type of the field
    pub primitive: PrimitiveType,
    /// Scale applied to raw values
    pub scale: f64,
    /// Number of samples
    pub sample_count: usize,
    /// First sample timestamp (µs)
    pub first_us: Option<u64>,
    /// Last sample timestamp (µs)
    pub last_us: Option<u64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_channel_id_display() {
        assert_eq!(ChannelId::new("ALT", "alt").to_string(), "ALT.alt");
        assert_eq!(
            ChannelId::new("GPS", "Lat")
                .with_instance(InstanceKey::Index(1))
                .to_string(),
            "GPS[1].Lat"
        );
        assert_eq!(
            ChannelId::new("ATTITUDE", "roll")
                .with_instance(InstanceKey::Component {
                    system: 1,
                    component: 1
                })
                .to_string(),
            "ATTITUDE[1:1].roll"
        );
    }

    #[test]
    fn test_channel_id_parse() {
        let plain: ChannelId = "BARO.Alt".parse().unwrap();
        assert_eq!(plain, ChannelId::new("BARO", "Alt"));

        let indexed: ChannelId = "GPS[0].Spd".parse().unwrap();
        assert_eq!(indexed.instance, Some(InstanceKey::Index(0)));

        let component: ChannelId = "VFR_HUD[1:191].alt".parse().unwrap();
        assert_eq!(
            component.instance,
            Some(InstanceKey::Component {
                system: 1,
                component: 191
            })
        );
        assert_eq!(component.message, "VFR_HUD");
    }

    #[test]
    fn test_channel_id_parse_errors() {
        assert!("nodot".parse::<ChannelId>().is_err());
        assert!("GPS[x].Lat".parse::<ChannelId>().is_err());
        assert!("GPS[0.Lat".parse::<ChannelId>().is_err());
        assert!("GPS.".parse::<ChannelId>().is_err());
    }

    #[test]
    fn test_format_names() {
        assert_eq!(LogFormat::Dataflash.to_string(), "dataflash");
        assert_eq!(
            LogFormat::Mavlink(MavlinkFraming::Tlog).to_string(),
            "mavlink-tlog"
        );
        assert!(!LogFormat::Unknown.is_known());
    }
}
