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

//! Results of running tests.

use crate::context::AssertionRecord;
use std::fmt;

/// Assertion tallies.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Counters {
    /// Assertions that held
    pub passed: usize,
    /// Assertions that failed
    pub failed: usize,
}

impl Counters {
    /// Total assertions evaluated.
    pub fn total(&self) -> usize {
        self.passed + self.failed
    }

    pub(crate) fn record(&mut self, assertion: &AssertionRecord) {
        if assertion.passed {
            self.passed += 1;
        } else {
            self.failed += 1;
        }
    }
}

impl std::ops::AddAssign for Counters {
    fn add_assign(&mut self, other: Self) {
        self.passed += other.passed;
        self.failed += other.failed;
    }
}

/// How much of the execution tree a test had.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum Exploration {
    /// One pass, no sections or generators
    Single,
    /// The tree was fully explored over this many passes
    Explored {
        /// Passes needed
        passes: usize,
    },
}

/// Final value of one generator after shrinking.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct ShrunkValue {
    /// Generator name
    pub name: String,
    /// Debug rendering of the final value
    pub value: String,
    /// Whether the value is simpler than the one that first failed
    pub simplified: bool,
}

impl fmt::Display for ShrunkValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} = {}", self.name, self.value)
    }
}

/// What the shrink search found for one failure.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct ShrinkReport {
    /// Shrunk generators, innermost first
    pub values: Vec<ShrunkValue>,
    /// Candidate replays performed
    pub attempts: usize,
}

impl ShrinkReport {
    /// True when at least one value was simplified.
    pub fn simplified(&self) -> bool {
        self.values.iter().any(|v| v.simplified)
    }
}

/// One failing pass.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Failure {
    /// 1-based pass number
    pub pass: usize,
    /// Failed assertions, from the minimised replay when shrinking ran
    pub assertions: Vec<AssertionRecord>,
    /// Shrink search results, when a shrinkable generator was involved
    pub shrink: Option<ShrinkReport>,
}

/// Result of running one test to full exploration.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Outcome {
    /// Test name
    pub name: String,
    /// Passes executed
    pub passes: usize,
    /// Whether the test had dynamic structure
    pub exploration: Exploration,
    /// Assertions across all exploration passes
    pub counters: Counters,
    /// Failing passes in order
    pub failures: Vec<Failure>,
}

impl Outcome {
    /// True when no pass failed.
    pub fn passed(&self) -> bool {
        self.failures.is_empty()
    }

    /// Shrunk generator values of the first failure that shrank.
    pub fn shrunk_values(&self) -> Option<&[ShrunkValue]> {
        self.failures
            .iter()
            .filter_map(|f| f.shrink.as_ref())
            .find(|s| !s.values.is_empty())
            .map(|s| s.values.as_slice())
    }

    /// True when the body ran once without sections or generators.
    pub fn ran_once(&self) -> bool {
        self.exploration == Exploration::Single
    }
}
