// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! # trap-core
//!
//! Shared types for the TRAP OPC UA listener.
//!
//! The listener turns server notifications into [`Measurement`]s. This crate
//! holds that model so that sinks and the listener can agree on it without
//! depending on each other.
//!
//! ## Example
//!
//! ```rust
//! use trap_core::{FieldValue, Measurement};
//! use chrono::Utc;
//!
//! let m = Measurement::new("opcua_listener", Utc::now())
//!     .with_tag("id", "ns=3;s=Temperature")
//!     .with_field("temp", 79.0);
//!
//! assert_eq!(m.field("temp"), Some(&FieldValue::Float(79.0)));
//! ```

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]
#![deny(unsafe_code)]

pub mod measurement;

pub use measurement::{FieldValue, Fields, Measurement, Tags};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate name
pub const NAME: &str = env!("CARGO_PKG_NAME");
