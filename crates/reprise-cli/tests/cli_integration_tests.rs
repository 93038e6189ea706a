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

//! Integration tests for the `reprise` binary.

use assert_cmd::Command;
use predicates::prelude::*;

/// Test helper to create a reprise command
fn reprise_cmd() -> Command {
    Command::cargo_bin("reprise").expect("Failed to find reprise binary")
}

// ============================================================================
// Help Tests
// ============================================================================

#[test]
fn test_help_lists_subcommands() {
    reprise_cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("list"))
        .stdout(predicate::str::contains("run"));
}

#[test]
fn test_run_help_lists_options() {
    reprise_cmd()
        .args(["run", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("--seed"))
        .stdout(predicate::str::contains("--no-shrink"));
}

// ============================================================================
// List Tests
// ============================================================================

#[test]
fn test_list_hides_hidden_tests() {
    reprise_cmd()
        .arg("list")
        .assert()
        .success()
        .stdout(predicate::str::contains("vector push and clear"))
        .stdout(predicate::str::contains("pair shrink demo").not());
}

#[test]
fn test_list_hidden_with_tags() {
    reprise_cmd()
        .args(["list", "--hidden", "--tags"])
        .assert()
        .success()
        .stdout(predicate::str::contains("pair shrink demo"))
        .stdout(predicate::str::contains("[!shouldfail]"))
        .stdout(predicate::str::contains("8 tests"));
}

// ============================================================================
// Run Tests
// ============================================================================

#[test]
fn test_run_default_selection_succeeds() {
    reprise_cmd()
        .arg("run")
        .assert()
        .success()
        .stdout(predicate::str::contains("Running 6 tests"))
        .stdout(predicate::str::contains("failed as expected"))
        .stdout(predicate::str::contains("6 tests: 6 succeeded, 0 did not"));
}

#[test]
fn test_run_by_tag() {
    reprise_cmd()
        .args(["run", "[sections]"])
        .assert()
        .success()
        .stdout(predicate::str::contains("vector push and clear"))
        .stdout(predicate::str::contains("addition table"))
        .stdout(predicate::str::contains("uppercase round trip").not());
}

#[test]
fn test_run_shrinks_failing_pair() {
    reprise_cmd()
        .args(["run", "pair shrink demo"])
        .assert()
        .failure()
        .stdout(predicate::str::contains("shrunk: j = 5, i = 3"))
        .stderr(predicate::str::contains("1 of 1 test(s) did not succeed"));
}

#[test]
fn test_run_without_shrinking_reports_no_shrunk_values() {
    reprise_cmd()
        .args(["run", "pair shrink demo", "--no-shrink"])
        .assert()
        .failure()
        .stdout(predicate::str::contains("shrunk:").not());
}

#[test]
fn test_run_panic_is_a_failure() {
    reprise_cmd()
        .args(["run", "panic demo"])
        .assert()
        .failure()
        .stdout(predicate::str::contains("the demo body panicked"));
}

#[test]
fn test_run_json_output() {
    let output = reprise_cmd()
        .args(["run", "addition table", "--format", "json"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let summary: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let result = &summary["results"][0];
    assert_eq!(result["info"]["name"], "addition table");
    assert_eq!(result["verdict"], "Passed");
    assert_eq!(result["outcome"]["passes"], 18);
}

// ============================================================================
// Error Tests
// ============================================================================

#[test]
fn test_run_unknown_test() {
    reprise_cmd()
        .args(["run", "no such test"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("no test named 'no such test'"));
}

#[test]
fn test_run_zero_repetitions() {
    reprise_cmd()
        .args(["run", "--repetitions", "0"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid configuration"));
}

#[test]
fn test_run_invalid_seed() {
    reprise_cmd()
        .args(["run", "--seed", "0xnothex"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("not a valid seed"));
}
