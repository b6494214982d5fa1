// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Core error types for flightcodec.
//!
//! Errors fall into two classes:
//! - **Fatal** errors abort a load: the format was not recognized, the buffer
//!   is truncated before any safe resynchronization point, or the load was
//!   superseded by a newer one.
//! - **Recoverable** errors describe a single bad record. Decoders never
//!   return them from a load; they are folded into
//!   [`DecodeWarning`](crate::io::warnings::DecodeWarning)s and decoding
//!   continues.

use thiserror::Error;

/// Errors that can occur while loading, decoding or querying a log.
#[derive(Debug, Clone, Error)]
pub enum DecodeError {
    /// The buffer matched neither the dataflash nor the MAVLink signature.
    #[error("Unrecognized log format (inspected {inspected} bytes)")]
    UnrecognizedFormat {
        /// Number of leading bytes inspected
        inspected: usize,
    },

    /// A read would run past the end of the buffer.
    #[error(
        "Out of bounds: requested {requested} bytes at position {position}, but only {available} bytes available"
    )]
    OutOfBounds {
        /// Requested bytes
        requested: usize,
        /// Available bytes
        available: usize,
        /// Cursor position when the read was attempted
        position: usize,
    },

    /// A MAVLink frame failed checksum verification.
    #[error("Checksum mismatch at offset {offset}: expected {expected:#06x}, got {actual:#06x}")]
    ChecksumFailure {
        /// Frame start offset
        offset: usize,
        /// Checksum carried by the frame
        expected: u16,
        /// Checksum computed over the frame
        actual: u16,
    },

    /// A MAVLink message id with no dictionary entry.
    #[error("Unknown message type id {id}")]
    UnknownMessageType {
        /// Numeric message id
        id: u32,
    },

    /// A dataflash record whose type id has no `FMT` definition yet.
    #[error("No layout for message type id {id} at offset {offset}")]
    MissingLayout {
        /// Message type id
        id: u8,
        /// Record start offset
        offset: usize,
    },

    /// A record did not start with the expected sync marker.
    #[error("Corrupt sync marker at offset {offset}")]
    CorruptSync {
        /// Offset where the marker was expected
        offset: usize,
    },

    /// A format definition that cannot describe a decodable record.
    #[error("Invalid layout for '{name}': {reason}")]
    InvalidLayout {
        /// Message type name
        name: String,
        /// Validation error message
        reason: String,
    },

    /// The load was invalidated by a newer load before it finished.
    #[error("Load generation {generation} was superseded")]
    Superseded {
        /// Generation of the abandoned load
        generation: u64,
    },

    /// A query was issued while no log is loaded.
    #[error("No log loaded")]
    NotLoaded,

    /// A query named a channel the loaded log does not have.
    #[error("Unknown channel '{0}'")]
    UnknownChannel(String),

    /// Rejected session configuration.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// I/O failure while acquiring the log buffer.
    #[error("I/O error: {0}")]
    Io(String),
}

impl DecodeError {
    /// Create an out-of-bounds error.
    pub fn out_of_bounds(requested: usize, available: usize, position: usize) -> Self {
        DecodeError::OutOfBounds {
            requested,
            available,
            position,
        }
    }

    /// Create an invalid layout error.
    pub fn invalid_layout(name: impl Into<String>, reason: impl Into<String>) -> Self {
        DecodeError::InvalidLayout {
            name: name.into(),
            reason: reason.into(),
        }
    }

    /// Create an invalid configuration error.
    pub fn invalid_config(reason: impl Into<String>) -> Self {
        DecodeError::InvalidConfig(reason.into())
    }

    /// Whether decoding can continue past this error.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            DecodeError::ChecksumFailure { .. }
                | DecodeError::UnknownMessageType { .. }
                | DecodeError::MissingLayout { .. }
                | DecodeError::CorruptSync { .. }
                | DecodeError::InvalidLayout { .. }
        )
    }

    /// Get structured fields for logging.
    pub fn log_fields(&self) -> Vec<(&'static str, String)> {
        match self {
            DecodeError::UnrecognizedFormat { inspected } => {
                vec![("inspected", inspected.to_string())]
            }
            DecodeError::OutOfBounds {
                requested,
                available,
                position,
            } => vec![
                ("requested", requested.to_string()),
                ("available", available.to_string()),
                ("position", position.to_string()),
            ],
            DecodeError::ChecksumFailure {
                offset,
                expected,
                actual,
            } => vec![
                ("offset", offset.to_string()),
                ("expected", format!("{expected:#06x}")),
                ("actual", format!("{actual:#06x}")),
            ],
            DecodeError::UnknownMessageType { id } => vec![("id", id.to_string())],
            DecodeError::MissingLayout { id, offset } => {
                vec![("id", id.to_string()), ("offset", offset.to_string())]
            }
            DecodeError::CorruptSync { offset } => vec![("offset", offset.to_string())],
            DecodeError::InvalidLayout { name, reason } => {
                vec![("name", name.clone()), ("reason", reason.clone())]
            }
            DecodeError::Superseded { generation } => {
                vec![("generation", generation.to_string())]
            }
            DecodeError::NotLoaded => Vec::new(),
            DecodeError::UnknownChannel(channel) => vec![("channel", channel.clone())],
            DecodeError::InvalidConfig(reason) => vec![("reason", reason.clone())],
            DecodeError::Io(message) => vec![("message", message.clone())],
        }
    }
}

impl From<std::io::Error> for DecodeError {
    fn from(err: std::io::Error) -> Self {
        DecodeError::Io(err.to_string())
    }
}

/// Result type for flightcodec operations.
pub type Result<T> = std::result::Result<T, DecodeError>;
