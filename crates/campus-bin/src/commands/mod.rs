// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! CLI command implementations.
//!
//! - `run`: Start the API server
//! - `validate`: Validate the configuration and policy files
//! - `hash-password`: Hash a password for a bootstrap account
//! - `version`: Show version information

mod hash_password;
mod run;
mod validate;
mod version;

pub use hash_password::hash_password;
pub use run::run;
pub use validate::validate;
pub use version::version;

use campus_config::{load_config, CampusConfig};

use crate::cli::{Cli, Commands, LogFormat};
use crate::error::{BinError, BinResult};
use crate::logging::init_logging;

/// Executes the appropriate command based on CLI arguments.
pub async fn execute(cli: Cli) -> BinResult<()> {
    match cli.effective_command() {
        Commands::Run => {
            let config = load(&cli)?;
            init_from_config(&cli, &config);
            run::run(config).await
        }
        Commands::Validate(args) => {
            let config = load(&cli)?;
            init_from_config(&cli, &config);
            validate::validate(&cli, &config, args).await
        }
        Commands::HashPassword(args) => {
            init_logging(cli.effective_log_level("info"), cli.log_format.unwrap_or(LogFormat::Text));
            hash_password::hash_password(args)
        }
        Commands::Version => version::version(&cli),
    }
}

fn load(cli: &Cli) -> BinResult<CampusConfig> {
    if !cli.config.exists() {
        return Err(BinError::config(format!(
            "Configuration file not found: {}",
            cli.config.display()
        )));
    }
    load_config(&cli.config)
        .map_err(|e| BinError::from(e).with_context(format!("loading {}", cli.config.display())))
}

fn init_from_config(cli: &Cli, config: &CampusConfig) {
    let level = cli.effective_log_level(config.logging.level.as_str());
    init_logging(level, cli.effective_log_format(config.logging.format));
}
