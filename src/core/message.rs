// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Decoded messages.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::core::layout::FieldLayout;
use crate::core::value::FieldValue;

/// Distinguishes concurrent producers of the same message type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum InstanceKey {
    /// Dataflash instance column (`I` / `Instance`)
    Index(u8),
    /// MAVLink sender
    Component {
        /// System id
        system: u8,
        /// Component id
        component: u8,
    },
}

impl fmt::Display for InstanceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InstanceKey::Index(i) => write!(f, "{i}"),
            InstanceKey::Component { system, component } => write!(f, "{system}:{component}"),
        }
    }
}

/// One decoded record. Never mutated after the decoder emits it.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedMessage {
    /// Layout the payload was decoded with
    pub layout: Arc<FieldLayout>,
    /// Log-relative timestamp in microseconds
    pub timestamp_us: u64,
    /// Producer instance, if the message type is multi-instance
    pub instance: Option<InstanceKey>,
    /// Byte offset of the record in the raw log
    pub offset: usize,
    /// Field values in layout order
    pub values: Vec<FieldValue>,
}

impl DecodedMessage {
    /// Message type name.
    pub fn name(&self) -> &str {
        &self.layout.name
    }

    /// Look up a field value by name.
    pub fn get(&self, field: &str) -> Option<&FieldValue> {
        self.layout.field_index(field).map(|i| &self.values[i])
    }

    /// Iterate `(field name, value)` pairs in layout order.
    pub fn fields(&self) -> impl Iterator<Item = (&str, &FieldValue)> {
        self.layout
            .fields
            .iter()
            .map(|f| f.name.as_str())
            .zip(self.values.iter())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::layout::FieldDef;
    use crate::core::value::PrimitiveType;

    #[test]
    fn test_field_lookup() {
        let layout = Arc::new(FieldLayout::new(
            1,
            "BARO",
            vec![
                FieldDef::scalar("Alt", PrimitiveType::Float32),
                FieldDef::scalar("Press", PrimitiveType::Float32),
            ],
        ));
        let msg = DecodedMessage {
            layout,
            timestamp_us: 10,
            instance: None,
            offset: 0,
            values: vec![FieldValue::Float32(1.0), FieldValue::Float32(1013.0)],
        };
        assert_eq!(msg.name(), "BARO");
        assert_eq!(msg.get("Press"), Some(&FieldValue::Float32(1013.0)));
        assert_eq!(msg.get("Temp"), None);
        let names: Vec<_> = msg.fields().map(|(n, _)| n).collect();
        assert_eq!(names, vec!["Alt", "Press"]);
    }

    #[test]
    fn test_instance_display() {
        assert_eq!(InstanceKey::Index(1).to_string(), "1");
        assert_eq!(
            InstanceKey::Component {
                system: 1,
                component: 191
            }
            .to_string(),
            "1:191"
        );
    }
}
