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

//! Reprise command-line runner.
//!
//! The `reprise` binary runs a registry of re-entrant tests with the
//! execution core in `reprise_core` and reports the results on the terminal
//! or as JSON.
//!
//! # Commands
//!
//! - **list**: Print registered test names, optionally with tags and hidden tests
//! - **run**: Explore the selected tests, shrink failures, print a summary
//!
//! Tests are selected by exact name or by bracketed tag (`"[pbt]"`). Tests
//! tagged `[!mayfail]` or `[!shouldfail]` count as successes when they fail;
//! a `[!shouldfail]` test that passes fails the run.
//!
//! # Examples
//!
//! ```no_run
//! use reprise_cli::cli::{OutputFormat, RunArgs};
//! use reprise_cli::{commands, suite};
//!
//! # fn main() -> Result<(), reprise_cli::error::CliError> {
//! let registry = suite::builtin_suite()?;
//! let args = RunArgs {
//!     names: vec!["[sections]".to_string()],
//!     seed: Some(42),
//!     random_seed: false,
//!     repetitions: None,
//!     max_passes: None,
//!     no_shrink: false,
//!     include_hidden: false,
//!     format: OutputFormat::Text,
//! };
//! commands::run(&registry, &args)?;
//! # Ok(())
//! # }
//! ```
//!
//! # Logging
//!
//! Diagnostics go to stderr through `tracing`. `RUST_LOG` takes precedence;
//! otherwise `--verbose` enables debug output for both crates and the
//! default shows warnings only.

pub mod cli;
pub mod commands;
pub mod console;
pub mod error;
pub mod suite;

use tracing_subscriber::EnvFilter;

/// Install the stderr log subscriber.
pub fn init_logging(verbose: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(if verbose {
            "reprise_core=debug,reprise_cli=debug"
        } else {
            "warn"
        })
    });
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}
