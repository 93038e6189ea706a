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

//! Implementations of the `list` and `run` subcommands.

use crate::cli::{OutputFormat, RunArgs};
use crate::console::{plural, ConsoleReporter};
use crate::error::CliError;
use colored::Colorize;
use reprise_core::{run_tests, NullReporter, Runner, TestRegistry};
use tracing::debug;

/// Print registered test names, one per line.
///
/// Hidden tests are listed only when `hidden` is set; `tags` appends each
/// test's tag specification.
pub fn list(registry: &TestRegistry, tags: bool, hidden: bool) -> Result<(), CliError> {
    let mut shown = 0;
    for test in registry.iter().filter(|t| hidden || !t.info.is_hidden()) {
        shown += 1;
        if tags && !test.info.tags.is_empty() {
            println!("{}  {}", test.info.name, test.info.tag_string().dimmed());
        } else {
            println!("{}", test.info.name);
        }
    }
    println!("{} {}", shown, plural(shown, "test", "tests"));
    Ok(())
}

/// Run the selected tests and report them in the requested format.
///
/// # Errors
///
/// Returns `Err` for an invalid configuration, a name or tag that matches no
/// test, or when at least one test did not succeed.
pub fn run(registry: &TestRegistry, args: &RunArgs) -> Result<(), CliError> {
    let runner = Runner::new(args.config())?;
    let tests = registry.select(args.names.as_slice(), args.include_hidden)?;
    debug!(
        "selected {} of {} test(s), seed {:#x}",
        tests.len(),
        registry.len(),
        runner.config().seed
    );

    let summary = match args.format {
        OutputFormat::Text => {
            let mut reporter = ConsoleReporter::new(runner.config().seed);
            run_tests(tests, &runner, &mut reporter)
        }
        OutputFormat::Json => {
            let summary = run_tests(tests, &runner, &mut NullReporter);
            println!("{}", serde_json::to_string_pretty(&summary)?);
            summary
        }
    };

    if summary.all_succeeded() {
        Ok(())
    } else {
        Err(CliError::tests_failed(
            summary.unsuccessful(),
            summary.results.len(),
        ))
    }
}
