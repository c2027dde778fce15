// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! # trap-bin
//!
//! The `trap-listener` command-line tool.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────┐     ┌──────────────┐     ┌─────────────────────┐
//! │   main.rs    │────▶│   cli.rs     │────▶│     commands        │
//! │ (entry point)│     │ (clap args)  │     │ validate │ plan     │
//! └──────┬───────┘     └──────────────┘     └─────────┬───────────┘
//!        │                                            │
//!  ┌─────▼──────┐                          ┌──────────▼──────────┐
//!  │ logging.rs │                          │ trap-config         │
//!  │ (tracing)  │                          │ trap-opcua-listener │
//!  └────────────┘                          └─────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```bash
//! # Validate a configuration
//! trap-listener validate -c listener.toml
//!
//! # Show the monitored items as JSON
//! trap-listener plan -c listener.yaml --format json
//! ```

#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod cli;
pub mod commands;
pub mod error;
pub mod logging;

pub use cli::{Cli, Commands};
pub use error::{BinError, BinResult};
pub use logging::init_logging;

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate name.
pub const NAME: &str = env!("CARGO_PKG_NAME");
