// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Implementation of the `hash-password` command.

use std::io::BufRead;

use campus_api::auth::{HasherConfig, PasswordHasher};

use crate::cli::HashPasswordArgs;
use crate::error::{BinError, BinResult};

/// Prints an Argon2id PHC string for the given password.
pub fn hash_password(args: HashPasswordArgs) -> BinResult<()> {
    let password = if args.stdin {
        read_password(std::io::stdin().lock())?
    } else {
        args.password.clone().unwrap_or_default()
    };
    if password.is_empty() {
        return Err(BinError::config("Password must not be empty"));
    }

    let hash = PasswordHasher::new(hasher_config(&args))?.hash(&password)?;

    println!("{}", hash);
    Ok(())
}

fn hasher_config(args: &HashPasswordArgs) -> HasherConfig {
    let defaults = HasherConfig::default();
    HasherConfig {
        memory_kib: args.memory_kib.unwrap_or(defaults.memory_kib),
        iterations: args.iterations.unwrap_or(defaults.iterations),
        parallelism: args.parallelism.unwrap_or(defaults.parallelism),
    }
}

/// Reads the first line, without its line terminator.
fn read_password(mut reader: impl BufRead) -> BinResult<String> {
    let mut line = String::new();
    reader.read_line(&mut line)?;
    Ok(line.trim_end_matches(['\r', '\n']).to_string())
}
