// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Core types used throughout flightcodec.
//!
//! This module provides the foundational types for the library:
//! - [`DecodeError`] - Error taxonomy and recoverability
//! - [`FieldValue`] - Unified value representation
//! - [`FieldLayout`] - Runtime message layouts and their payload codec
//! - [`DecodedMessage`] - One decoded record

pub mod error;
pub mod layout;
pub mod message;
pub mod value;

pub use error::{DecodeError, Result};
pub use layout::{FieldDef, FieldLayout, FieldRole, TimeUnit};
pub use message::{DecodedMessage, InstanceKey};
pub use value::{FieldValue, PrimitiveType};
