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

//! CLI command definitions and dispatch.

use crate::commands;
use crate::error::CliError;
use clap::{Args, Subcommand, ValueEnum};
use reprise_core::{RunnerConfig, TestRegistry};

/// Output format of `reprise run`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Colored progress and summary
    Text,
    /// The run summary as pretty-printed JSON
    Json,
}

/// Options of `reprise run`.
#[derive(Debug, Clone, Args)]
pub struct RunArgs {
    /// Test names or bracketed tags such as "[pbt]" (default: every visible test)
    pub names: Vec<String>,

    /// Base seed, decimal or 0x-prefixed hexadecimal
    #[arg(long, value_parser = parse_seed)]
    pub seed: Option<u64>,

    /// Use a random seed instead of the fixed default
    #[arg(long, conflicts_with = "seed")]
    pub random_seed: bool,

    /// Repetitions for generators without their own size
    #[arg(short, long)]
    pub repetitions: Option<usize>,

    /// Passes after which a test is declared stuck
    #[arg(long)]
    pub max_passes: Option<usize>,

    /// Report failing values without shrinking them
    #[arg(long)]
    pub no_shrink: bool,

    /// Also run hidden tests when no names are given
    #[arg(long)]
    pub include_hidden: bool,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,
}

impl RunArgs {
    /// Build the runner configuration from the defaults and the given flags.
    pub fn config(&self) -> RunnerConfig {
        let mut config = if self.random_seed {
            RunnerConfig::with_random_seed()
        } else {
            RunnerConfig::default()
        };
        if let Some(seed) = self.seed {
            config = config.seed(seed);
        }
        if let Some(repetitions) = self.repetitions {
            config = config.repetitions(repetitions);
        }
        if let Some(limit) = self.max_passes {
            config = config.max_passes(limit);
        }
        config.shrinking(!self.no_shrink)
    }
}

/// Parse a seed given as decimal or `0x`-prefixed hexadecimal.
pub fn parse_seed(text: &str) -> Result<u64, String> {
    let parsed = match text.strip_prefix("0x").or_else(|| text.strip_prefix("0X")) {
        Some(hex) => u64::from_str_radix(&hex.replace('_', ""), 16),
        None => text.replace('_', "").parse(),
    };
    parsed.map_err(|e| format!("'{}' is not a valid seed: {}", text, e))
}

/// Subcommands of `reprise`.
#[derive(Debug, Clone, Subcommand)]
pub enum Commands {
    /// List registered tests
    List {
        /// Show each test's tags
        #[arg(long)]
        tags: bool,

        /// Include hidden tests
        #[arg(long)]
        hidden: bool,
    },

    /// Run tests until every section and generator value was explored
    Run(RunArgs),
}

impl Commands {
    /// Execute the command against a registry.
    ///
    /// # Errors
    ///
    /// Returns `Err` when the configuration or selection is invalid, or when
    /// a test did not succeed.
    pub fn execute(self, registry: &TestRegistry) -> Result<(), CliError> {
        match self {
            Commands::List { tags, hidden } => commands::list(registry, tags, hidden),
            Commands::Run(args) => commands::run(registry, &args),
        }
    }
}
