// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! # trap-config
//!
//! Configuration file loading for the TRAP OPC UA listener.
//!
//! ## Features
//!
//! - **Multi-Format Support**: YAML, TOML, and JSON configuration files
//! - **Environment Placeholders**: `${VAR}` and `${VAR:default}` in any value
//! - **Validation**: the loaded [`ListenerConfig`](trap_opcua_listener::ListenerConfig)
//!   is validated before it is returned
//!
//! ## Quick Start
//!
//! ```no_run
//! use trap_config::loader::load_config;
//!
//! let config = load_config("listener.toml").unwrap();
//!
//! println!("Endpoint: {}", config.endpoint);
//! println!("Root nodes: {}", config.nodes.len());
//! ```
//!
//! Values in config files can reference environment variables:
//!
//! ```yaml
//! endpoint: "${OPCUA_ENDPOINT:opc.tcp://localhost:4840}"
//! ```

#![warn(missing_docs)]
#![deny(unsafe_code)]

// =============================================================================
// Modules
// =============================================================================

pub mod error;
pub mod loader;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{ConfigError, ConfigResult};
pub use loader::{load_config, load_config_str, ConfigFormat, ConfigLoader};
