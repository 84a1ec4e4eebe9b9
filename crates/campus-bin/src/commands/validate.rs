// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Implementation of the `validate` command.

use campus_config::CampusConfig;
use serde::Serialize;

use crate::cli::{Cli, OutputFormat, ValidateArgs};
use crate::error::{BinError, BinResult};
use crate::runtime::load_policy;

/// Summary of a validated configuration.
#[derive(Debug, Serialize)]
pub struct ValidationReport {
    /// Listen address.
    pub listen: String,
    /// Token issuer.
    pub issuer: String,
    /// Signing algorithm.
    pub algorithm: &'static str,
    /// Access token lifetime in seconds.
    pub access_lifetime_secs: u64,
    /// Refresh token lifetime in seconds.
    pub refresh_lifetime_secs: u64,
    /// Whether the policy engine is enabled.
    pub policy_enabled: bool,
    /// Number of loaded policy rules.
    pub policy_rules: usize,
    /// Number of bootstrap accounts.
    pub accounts: usize,
    /// Non-fatal findings.
    pub warnings: Vec<String>,
}

impl ValidationReport {
    /// Builds a report, loading the policy files when enabled.
    pub async fn from_config(config: &CampusConfig) -> BinResult<Self> {
        let policy = load_policy(config).await?;
        let policy_rules = match &policy {
            Some(engine) => engine.rules().await.len(),
            None => 0,
        };
        let tokens = &config.security.tokens;

        Ok(Self {
            listen: config.server.socket_addr().to_string(),
            issuer: tokens.issuer.clone(),
            algorithm: tokens.algorithm.as_str(),
            access_lifetime_secs: tokens.access_lifetime().as_secs(),
            refresh_lifetime_secs: tokens.refresh_lifetime().as_secs(),
            policy_enabled: policy.is_some(),
            policy_rules,
            accounts: config.accounts.len(),
            warnings: config.warnings(),
        })
    }
}

/// Validates the configuration and prints a summary.
pub async fn validate(cli: &Cli, config: &CampusConfig, args: ValidateArgs) -> BinResult<()> {
    let report = ValidationReport::from_config(config).await?;

    match args.format {
        OutputFormat::Text => {
            println!("Configuration is valid: {}", cli.config.display());
            println!();
            println!("Summary:");
            println!("  Listen:          {}", report.listen);
            println!("  Issuer:          {}", report.issuer);
            println!("  Algorithm:       {}", report.algorithm);
            println!("  Access token:    {}s", report.access_lifetime_secs);
            println!("  Refresh token:   {}s", report.refresh_lifetime_secs);
            if report.policy_enabled {
                println!("  Policy:          enabled ({} rules)", report.policy_rules);
            } else {
                println!("  Policy:          disabled");
            }
            println!("  Accounts:        {}", report.accounts);

            if !report.warnings.is_empty() {
                println!();
                println!("Warnings:");
                for warning in &report.warnings {
                    println!("  - {}", warning);
                }
            }

            if args.show_config {
                println!();
                println!("Parsed configuration:");
                println!("{}", to_json(&config.redacted())?);
            }
        }
        OutputFormat::Json => {
            let output = serde_json::json!({
                "valid": true,
                "config_path": cli.config.display().to_string(),
                "summary": &report,
                "config": if args.show_config { Some(config.redacted()) } else { None },
            });
            println!("{}", to_json(&output)?);
        }
    }

    if args.strict && !report.warnings.is_empty() {
        return Err(BinError::config(format!(
            "Strict mode: {} warning(s) found",
            report.warnings.len()
        )));
    }

    Ok(())
}

fn to_json<T: Serialize>(value: &T) -> BinResult<String> {
    serde_json::to_string_pretty(value)
        .map_err(|e| BinError::runtime(format!("Failed to render output: {}", e)))
}
