// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! CLI command implementations.
//!
//! Both commands work offline: they load the configuration and build the
//! [`SubscriptionPlan`] the client would register, without connecting.

mod plan;
mod validate;

pub use plan::{plan, render_plan};
pub use validate::{collect_warnings, render_validation, validate};

use std::path::Path;

use trap_opcua_listener::{ListenerConfig, SubscriptionPlan};

use crate::cli::{Cli, Commands};
use crate::error::{BinError, BinResult};

/// Executes the appropriate command based on CLI arguments.
pub fn execute(cli: &Cli) -> BinResult<()> {
    match cli.effective_command() {
        Commands::Validate(args) => validate::validate(cli, &args),
        Commands::Plan(args) => plan::plan(cli, &args),
    }
}

/// Loads a configuration file and builds its subscription plan.
pub fn load_plan(path: &Path) -> BinResult<(ListenerConfig, SubscriptionPlan)> {
    if !path.exists() {
        return Err(BinError::config(format!(
            "Configuration file not found: {}",
            path.display()
        )));
    }

    let config = trap_config::load_config(path)
        .map_err(|e| BinError::from(e).with_context(path.display().to_string()))?;
    let plan = SubscriptionPlan::from_config(&config)?;

    tracing::debug!(
        path = %path.display(),
        endpoint = %config.endpoint,
        "Configuration loaded"
    );

    Ok((config, plan))
}
