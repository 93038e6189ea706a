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

//! Colored terminal reporter.

use colored::Colorize;
use reprise_core::{
    AssertionRecord, Failure, Outcome, Reporter, RepriseError, RunSummary, ShrunkValue, TestInfo,
    Verdict,
};

/// Prints one line per test, failure details, and a closing summary.
#[derive(Debug, Clone)]
pub struct ConsoleReporter {
    seed: u64,
}

impl ConsoleReporter {
    /// Reporter for a run with this base seed.
    pub fn new(seed: u64) -> Self {
        Self { seed }
    }

    fn print_failure(&self, failure: &Failure, remaining: usize) {
        println!("    {} {}", "pass".dimmed(), failure.pass);
        for assertion in &failure.assertions {
            println!("    {}", describe_assertion(assertion));
        }
        if let Some(report) = &failure.shrink {
            if !report.values.is_empty() {
                println!("    {}", shrunk_line(&report.values).cyan());
            }
        }
        if remaining > 0 {
            println!(
                "    ... {} more failing {}",
                remaining,
                plural(remaining, "pass", "passes")
            );
        }
    }
}

impl Reporter for ConsoleReporter {
    fn on_run_start(&mut self, count: usize) {
        println!(
            "Running {} {} (seed {:#x})",
            count,
            plural(count, "test", "tests"),
            self.seed
        );
    }

    fn on_test_end(&mut self, test: &TestInfo, outcome: &Outcome) {
        let verdict = Verdict::decide(test, outcome.passed());
        let mark = match verdict {
            Verdict::Passed => "✓".green().bold(),
            Verdict::FailedAsExpected => "✓".yellow().bold(),
            Verdict::Failed | Verdict::PassedUnexpectedly => "✗".red().bold(),
        };
        let mut line = format!("{} {} ({})", mark, test.name.bold(), describe_outcome(outcome));
        if verdict != Verdict::Passed {
            line.push_str(&format!(" {}", verdict.to_string().yellow()));
        }
        println!("{}", line);

        if let Some((first, rest)) = outcome.failures.split_first() {
            self.print_failure(first, rest.len());
        }
    }

    fn on_test_aborted(&mut self, test: &TestInfo, error: &RepriseError) {
        println!("{} {} {}", "✗".red().bold(), test.name.bold(), "aborted".red());
        println!("    {}", error);
    }

    fn on_run_end(&mut self, summary: &RunSummary) {
        println!();
        let line = summary_line(summary);
        if summary.all_succeeded() {
            println!("{}", line.green());
        } else {
            println!("{}", line.red());
        }
    }
}

/// `"1 pass"` or `"3 passes"`.
pub fn plural(count: usize, one: &'static str, many: &'static str) -> &'static str {
    if count == 1 {
        one
    } else {
        many
    }
}

/// Passes and assertions of an outcome, e.g. `"4 passes, 8 assertions"`.
pub fn describe_outcome(outcome: &Outcome) -> String {
    let assertions = outcome.counters.total();
    format!(
        "{} {}, {} {}",
        outcome.passes,
        plural(outcome.passes, "pass", "passes"),
        assertions,
        plural(assertions, "assertion", "assertions")
    )
}

/// One failed assertion with its location, if known.
pub fn describe_assertion(assertion: &AssertionRecord) -> String {
    match &assertion.location {
        Some(location) => format!(
            "{:?} failed: {} at {}",
            assertion.kind, assertion.message, location
        ),
        None => format!("{:?} failed: {}", assertion.kind, assertion.message),
    }
}

/// `"shrunk: j = 5, i = 3"`.
pub fn shrunk_line(values: &[ShrunkValue]) -> String {
    let rendered: Vec<String> = values.iter().map(ShrunkValue::to_string).collect();
    format!("shrunk: {}", rendered.join(", "))
}

/// Closing line of a run.
pub fn summary_line(summary: &RunSummary) -> String {
    let total = summary.results.len();
    let counters = summary.counters();
    format!(
        "{} {}: {} succeeded, {} did not ({} assertions, {} failed)",
        total,
        plural(total, "test", "tests"),
        summary.succeeded(),
        summary.unsuccessful(),
        counters.total(),
        counters.failed
    )
}
