// Dweve Reprise - Re-entrant Test Execution Core
//
// Copyright (c) 2025 Dweve IP B.V. and individual contributors.
//
// SPDX-License-Identifier: Apache-2.0
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License in the LICENSE file at the
// root of this repository or at: http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Reprise Command Line Interface

use clap::Parser;
use reprise_cli::cli::Commands;
use reprise_cli::error::CliError;
use reprise_cli::{init_logging, suite};
use std::process::ExitCode;

/// Reprise - re-entrant test runner
///
/// Runs each test body repeatedly until every section and generated value
/// was explored, and shrinks the values of failing passes.
///
/// # Examples
///
/// ```bash
/// # List tests with their tags
/// reprise list --tags
///
/// # Run every visible test with a fixed seed
/// reprise run --seed 0x2a
///
/// # Run one hidden test and print JSON
/// reprise run "pair shrink demo" --format json
/// ```
#[derive(Parser)]
#[command(name = "reprise")]
#[command(author, version, about = "Reprise - re-entrant test runner", long_about = None)]
struct Cli {
    /// Enable debug logging on stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = suite::builtin_suite()
        .map_err(CliError::from)
        .and_then(|registry| cli.command.execute(&registry));

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}
