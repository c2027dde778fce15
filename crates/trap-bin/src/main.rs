// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Entry point of the `trap-listener` tool.

use trap_bin::cli::Cli;
use trap_bin::error::report_error_and_exit;
use trap_bin::{commands, init_logging};

fn main() {
    let cli = Cli::parse_args();
    init_logging(cli.effective_log_level(), cli.log_format);

    tracing::debug!(version = trap_bin::VERSION, "Starting {}", trap_bin::NAME);

    if let Err(e) = commands::execute(&cli) {
        report_error_and_exit(e);
    }
}
