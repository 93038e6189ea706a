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

//! Progress events emitted while tests run.
//!
//! Every method has an empty default, so a reporter only implements the
//! events it cares about.

use crate::context::AssertionRecord;
use crate::error::RepriseError;
use crate::node::NodeState;
use crate::outcome::{Outcome, ShrunkValue};
use crate::registry::TestInfo;
use crate::runner::RunSummary;

/// Receiver of runner events.
pub trait Reporter {
    /// A batch of `count` tests is about to run.
    fn on_run_start(&mut self, _count: usize) {}

    /// A test is about to run its first pass.
    fn on_test_start(&mut self, _test: &TestInfo) {}

    /// Pass number `pass` (1-based) is starting.
    fn on_pass_start(&mut self, _test: &TestInfo, _pass: usize) {}

    /// An assertion was evaluated during an exploration pass.
    fn on_assertion(&mut self, _test: &TestInfo, _assertion: &AssertionRecord) {}

    /// A pass finished, leaving the root in `root_state`.
    fn on_pass_end(&mut self, _test: &TestInfo, _pass: usize, _root_state: NodeState) {}

    /// A failure is about to be shrunk.
    fn on_shrink_start(&mut self, _test: &TestInfo) {}

    /// A candidate replay finished; `failed` tells whether it still failed.
    fn on_shrink_result(&mut self, _test: &TestInfo, _failed: bool, _attempts: usize) {}

    /// The shrink search simplified at least one value.
    fn on_shrink_found(&mut self, _test: &TestInfo, _values: &[ShrunkValue], _attempts: usize) {}

    /// The shrink search could not simplify anything.
    fn on_no_shrink_found(&mut self, _test: &TestInfo, _attempts: usize) {}

    /// A test finished.
    fn on_test_end(&mut self, _test: &TestInfo, _outcome: &Outcome) {}

    /// A test was aborted by `error` before it finished; no
    /// [`on_test_end`](Self::on_test_end) follows.
    fn on_test_aborted(&mut self, _test: &TestInfo, _error: &RepriseError) {}

    /// A batch finished.
    fn on_run_end(&mut self, _summary: &RunSummary) {}
}

/// Reporter that ignores everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullReporter;

impl Reporter for NullReporter {}

/// A recorded reporter event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    /// [`Reporter::on_run_start`]
    RunStart(usize),
    /// [`Reporter::on_test_start`]
    TestStart(String),
    /// [`Reporter::on_pass_start`]
    PassStart(usize),
    /// [`Reporter::on_assertion`]
    Assertion {
        /// Whether it held
        passed: bool,
        /// Its message
        message: String,
    },
    /// [`Reporter::on_pass_end`]
    PassEnd(usize, NodeState),
    /// [`Reporter::on_shrink_start`]
    ShrinkStart,
    /// [`Reporter::on_shrink_result`]
    ShrinkResult {
        /// Whether the candidate still failed
        failed: bool,
    },
    /// [`Reporter::on_shrink_found`]
    ShrinkFound(Vec<ShrunkValue>),
    /// [`Reporter::on_no_shrink_found`]
    NoShrinkFound,
    /// [`Reporter::on_test_end`]
    TestEnd {
        /// Test name
        name: String,
        /// Whether it passed
        passed: bool,
    },
    /// [`Reporter::on_test_aborted`]
    TestAborted {
        /// Test name
        name: String,
        /// Rendered error
        error: String,
    },
    /// [`Reporter::on_run_end`]
    RunEnd,
}

/// Reporter that keeps every event, for inspecting runs in tests.
#[derive(Debug, Default, Clone)]
pub struct RecordingReporter {
    events: Vec<Event>,
}

impl RecordingReporter {
    /// Empty recorder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Events in arrival order.
    pub fn events(&self) -> &[Event] {
        &self.events
    }

    /// Number of events matching `predicate`.
    pub fn count(&self, predicate: impl Fn(&Event) -> bool) -> usize {
        self.events.iter().filter(|e| predicate(e)).count()
    }
}

impl Reporter for RecordingReporter {
    fn on_run_start(&mut self, count: usize) {
        self.events.push(Event::RunStart(count));
    }

    fn on_test_start(&mut self, test: &TestInfo) {
        self.events.push(Event::TestStart(test.name.clone()));
    }

    fn on_pass_start(&mut self, _test: &TestInfo, pass: usize) {
        self.events.push(Event::PassStart(pass));
    }

    fn on_assertion(&mut self, _test: &TestInfo, assertion: &AssertionRecord) {
        self.events.push(Event::Assertion {
            passed: assertion.passed,
            message: assertion.message.clone(),
        });
    }

    fn on_pass_end(&mut self, _test: &TestInfo, pass: usize, root_state: NodeState) {
        self.events.push(Event::PassEnd(pass, root_state));
    }

    fn on_shrink_start(&mut self, _test: &TestInfo) {
        self.events.push(Event::ShrinkStart);
    }

    fn on_shrink_result(&mut self, _test: &TestInfo, failed: bool, _attempts: usize) {
        self.events.push(Event::ShrinkResult { failed });
    }

    fn on_shrink_found(&mut self, _test: &TestInfo, values: &[ShrunkValue], _attempts: usize) {
        self.events.push(Event::ShrinkFound(values.to_vec()));
    }

    fn on_no_shrink_found(&mut self, _test: &TestInfo, _attempts: usize) {
        self.events.push(Event::NoShrinkFound);
    }

    fn on_test_end(&mut self, test: &TestInfo, outcome: &Outcome) {
        self.events.push(Event::TestEnd {
            name: test.name.clone(),
            passed: outcome.passed(),
        });
    }

    fn on_test_aborted(&mut self, test: &TestInfo, error: &RepriseError) {
        self.events.push(Event::TestAborted {
            name: test.name.clone(),
            error: error.to_string(),
        });
    }

    fn on_run_end(&mut self, _summary: &RunSummary) {
        self.events.push(Event::RunEnd);
    }
}
