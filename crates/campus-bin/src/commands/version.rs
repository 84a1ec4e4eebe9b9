// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Implementation of the `version` command.

use crate::cli::Cli;
use crate::error::BinResult;

/// Displays version information.
pub fn version(_cli: &Cli) -> BinResult<()> {
    println!("Campus - University administration API");
    println!();
    println!("Version Information:");
    println!("  campus-bin:    {}", env!("CARGO_PKG_VERSION"));
    println!("  campus-core:   {}", campus_core::VERSION);
    println!("  campus-api:    {}", campus_api::VERSION);
    println!("  campus-config: {}", campus_config::VERSION);
    println!();
    println!("Build Information:");
    println!("  Target:        {}", std::env::consts::ARCH);
    println!("  OS:            {}", std::env::consts::OS);
    println!();
    println!("License: PolyForm Noncommercial License 1.0.0");
    println!("Copyright (c) 2025 Sylvex. All rights reserved.");

    Ok(())
}
