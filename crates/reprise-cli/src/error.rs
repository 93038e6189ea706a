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

//! Error types for the command-line runner.

use reprise_core::RepriseError;
use thiserror::Error;

/// Errors reported by `reprise` subcommands.
///
/// Every variant renders to a single line that `main` prints after
/// `Error: `.
#[derive(Error, Debug, Clone)]
pub enum CliError {
    /// The execution core rejected the configuration or the selection, or a
    /// test violated the node protocol.
    #[error(transparent)]
    Core(#[from] RepriseError),

    /// JSON serialization of the run summary failed.
    #[error("JSON conversion error: {message}")]
    JsonFormat {
        /// Error message from serde_json
        message: String,
    },

    /// One or more selected tests did not succeed.
    ///
    /// The details were already printed by the reporter; this variant only
    /// carries the totals for the final line.
    #[error("{failed} of {total} test(s) did not succeed")]
    TestsFailed {
        /// Tests with an unsuccessful verdict
        failed: usize,
        /// Tests run
        total: usize,
    },

    /// A command-line argument is unusable.
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl CliError {
    /// Create a tests-failed error from run totals.
    pub fn tests_failed(failed: usize, total: usize) -> Self {
        Self::TestsFailed { failed, total }
    }

    /// Create an invalid input error.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use reprise_cli::error::CliError;
    ///
    /// let err = CliError::invalid_input("seed must be hexadecimal");
    /// assert_eq!(err.to_string(), "Invalid input: seed must be hexadecimal");
    /// ```
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }
}

impl From<serde_json::Error> for CliError {
    fn from(source: serde_json::Error) -> Self {
        Self::JsonFormat {
            message: source.to_string(),
        }
    }
}
