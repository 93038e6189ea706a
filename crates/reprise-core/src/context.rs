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

//! The per-pass context handed to a test body.
//!
//! ```
//! use reprise_core::{generator::from_values, Runner, Step, TestContext};
//!
//! fn body(t: &mut TestContext<'_>) -> Step {
//!     let n = t.generate("n", from_values(vec![1, 2, 3]))?;
//!     t.section("positive", |t| {
//!         t.check(n > 0, "n is positive");
//!         Ok(())
//!     })?;
//!     t.section("small", |t| t.require(n < 10, "n is small"))
//! }
//!
//! let outcome = Runner::default().run("numbers", body).unwrap();
//! assert!(outcome.passed());
//! ```

use crate::config::RunnerConfig;
use crate::error::RepriseError;
use crate::generator::Generator;
use crate::identity::{NodeId, SourceLocation};
use crate::node::NodeIndex;
use crate::nodes::ExecutionNodes;
use std::fmt;

/// Why a test body stopped before reaching its end.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Interrupt {
    /// The body abandoned the rest of this pass, usually after a failed
    /// [`require`](TestContext::require)
    Cancelled,
    /// The execution tree rejected a call; the run is aborted
    Error(RepriseError),
}

impl From<RepriseError> for Interrupt {
    fn from(err: RepriseError) -> Self {
        Interrupt::Error(err)
    }
}

impl fmt::Display for Interrupt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Interrupt::Cancelled => write!(f, "pass cancelled"),
            Interrupt::Error(err) => write!(f, "{}", err),
        }
    }
}

/// Result of a test body or of one of its steps.
pub type Step<T = ()> = Result<T, Interrupt>;

/// Which assertion produced a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum AssertionKind {
    /// Failure is recorded and the pass continues
    Check,
    /// Failure is recorded and the pass is cancelled
    Require,
    /// Unconditional failure
    Fail,
    /// A panic escaped the test body
    Panic,
}

/// One evaluated assertion.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct AssertionRecord {
    /// Assertion flavour
    pub kind: AssertionKind,
    /// Whether it held
    pub passed: bool,
    /// Caller-supplied description, or the panic message
    pub message: String,
    /// Where it was evaluated, if known
    pub location: Option<SourceLocation>,
}

/// Whether a pass explores the tree or replays a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PassMode {
    /// Regular exploration
    Normal,
    /// Shrink-time replay of a frozen failing pass
    Shrinking,
}

/// Everything one invocation of the body recorded.
#[derive(Debug, Default)]
pub(crate) struct PassRecord {
    pub(crate) assertions: Vec<AssertionRecord>,
    pub(crate) failure_site: Option<NodeIndex>,
    pub(crate) interrupted: bool,
    pub(crate) error: Option<RepriseError>,
}

impl PassRecord {
    pub(crate) fn failed(&self) -> bool {
        self.assertions.iter().any(|a| !a.passed)
    }

    pub(crate) fn failures(&self) -> Vec<AssertionRecord> {
        self.assertions.iter().filter(|a| !a.passed).cloned().collect()
    }
}

/// Handle through which a test body declares sections, draws generated values
/// and reports assertions.
pub struct TestContext<'a> {
    nodes: &'a mut ExecutionNodes,
    config: &'a RunnerConfig,
    mode: PassMode,
    record: PassRecord,
}

impl<'a> TestContext<'a> {
    pub(crate) fn new(
        nodes: &'a mut ExecutionNodes,
        config: &'a RunnerConfig,
        mode: PassMode,
    ) -> Self {
        TestContext {
            nodes,
            config,
            mode,
            record: PassRecord::default(),
        }
    }

    pub(crate) fn into_record(self) -> PassRecord {
        self.record
    }

    /// Whether this pass explores or replays.
    pub fn mode(&self) -> PassMode {
        self.mode
    }

    /// True during shrink-time replays.
    pub fn is_shrinking(&self) -> bool {
        self.mode == PassMode::Shrinking
    }

    /// Read-only view of the execution tree.
    pub fn nodes(&self) -> &ExecutionNodes {
        self.nodes
    }

    // ==================== Sections ====================

    /// Run `body` as a section named `name`, identified by this call site.
    ///
    /// Each pass runs at most one not-yet-completed section per level; the
    /// others are skipped and picked up by later passes.
    #[track_caller]
    pub fn section<F>(&mut self, name: &str, body: F) -> Step
    where
        F: FnOnce(&mut Self) -> Step,
    {
        self.section_with_id(NodeId::new(name), body)
    }

    /// Run `body` as a section identified by an explicit key, for call sites
    /// that create differently named sections in a loop.
    pub fn section_keyed<F>(&mut self, key: &str, name: &str, body: F) -> Step
    where
        F: FnOnce(&mut Self) -> Step,
    {
        self.section_with_id(NodeId::keyed(name, key), body)
    }

    fn section_with_id<F>(&mut self, id: NodeId, body: F) -> Step
    where
        F: FnOnce(&mut Self) -> Step,
    {
        let Some(index) = self.nodes.try_enter_section(id)? else {
            return Ok(());
        };
        let result = body(self);
        self.nodes.leave_section(index, result.is_err())?;
        result
    }

    // ==================== Generators ====================

    /// Draw this pass's value from a generator identified by this call site.
    ///
    /// `generator` is only consulted the first time the call site is reached;
    /// the node keeps its own state afterwards.
    #[track_caller]
    pub fn generate<G: Generator>(&mut self, name: &str, generator: G) -> Step<G::Value> {
        let id = NodeId::new(name);
        Ok(self.nodes.acquire(id, generator, self.config)?)
    }

    /// Draw this pass's value from a generator identified by an explicit key.
    pub fn generate_keyed<G: Generator>(
        &mut self,
        key: &str,
        name: &str,
        generator: G,
    ) -> Step<G::Value> {
        let id = NodeId::keyed(name, key);
        Ok(self.nodes.acquire(id, generator, self.config)?)
    }

    // ==================== Assertions ====================

    /// Record `condition`, continuing the pass either way. Returns it.
    #[track_caller]
    pub fn check(&mut self, condition: bool, message: impl Into<String>) -> bool {
        self.record_assertion(
            AssertionKind::Check,
            condition,
            message.into(),
            SourceLocation::caller(),
        );
        condition
    }

    /// Record `condition`, cancelling the pass when it does not hold.
    #[track_caller]
    pub fn require(&mut self, condition: bool, message: impl Into<String>) -> Step {
        self.record_assertion(
            AssertionKind::Require,
            condition,
            message.into(),
            SourceLocation::caller(),
        );
        if condition {
            Ok(())
        } else {
            Err(Interrupt::Cancelled)
        }
    }

    /// Record an unconditional failure and cancel the pass.
    #[track_caller]
    pub fn fail(&mut self, message: impl Into<String>) -> Step {
        self.record_assertion(AssertionKind::Fail, false, message.into(), SourceLocation::caller());
        Err(Interrupt::Cancelled)
    }

    fn record_assertion(
        &mut self,
        kind: AssertionKind,
        passed: bool,
        message: String,
        location: SourceLocation,
    ) {
        if !passed && self.record.failure_site.is_none() {
            self.record.failure_site = Some(self.nodes.current());
        }
        self.record.assertions.push(AssertionRecord {
            kind,
            passed,
            message,
            location: Some(location),
        });
    }

    pub(crate) fn record_panic(&mut self, message: String) {
        if self.record.failure_site.is_none() {
            self.record.failure_site = Some(self.nodes.current());
        }
        self.record.interrupted = true;
        self.record.assertions.push(AssertionRecord {
            kind: AssertionKind::Panic,
            passed: false,
            message,
            location: None,
        });
    }

    pub(crate) fn record_interrupt(&mut self, interrupt: Interrupt) {
        self.record.interrupted = true;
        if let Interrupt::Error(err) = interrupt {
            self.record.error = Some(err);
        }
    }
}
