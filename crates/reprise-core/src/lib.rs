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

//! Re-entrant test execution core.
//!
//! A test body is an ordinary function that declares *sections* and draws
//! values from *generators* through a [`TestContext`]. The [`Runner`] calls
//! the body over and over; each call is a *pass*. An execution tree
//! ([`ExecutionNodes`]) records which sections ran and which generator values
//! were used, so that every pass takes a path not taken before, and the run
//! ends once every path was explored.
//!
//! ```
//! use reprise_core::{generator::values_of, Runner, RunnerConfig};
//!
//! let runner = Runner::new(RunnerConfig::default().repetitions(20)).unwrap();
//! let outcome = runner
//!     .run("abs is non-negative", |t| {
//!         let x = t.generate("x", values_of::<i32>().at_least(-1000).up_to(1000))?;
//!         t.section("abs", |t| t.require(x.abs() >= 0, "abs(x) >= 0"))?;
//!         t.section("square", |t| t.require(x * x >= 0, "x * x >= 0"))
//!     })
//!     .unwrap();
//! assert!(outcome.passed());
//! ```
//!
//! When a pass fails, generators on the path to the failing assertion are
//! *shrunk*: the pass is replayed with simpler values until no simpler value
//! still fails, and the minimised values are reported in the [`Outcome`].
//!
//! # Modules
//!
//! - [`generator`]: the [`Generator`] trait and built-in generators
//! - [`ExecutionNodes`] / [`ExecutionNode`]: the tree and its state machine
//! - [`Runner`] and [`run_tests`]: the pass loop, shrinking and batches
//! - [`TestRegistry`]: named, tagged tests
//! - [`Reporter`]: progress events

mod config;
mod context;
mod error;
pub mod generator;
mod identity;
mod node;
mod nodes;
mod outcome;
mod random;
mod registry;
mod reporter;
mod runner;
mod shrink;

pub use config::{RunnerConfig, DEFAULT_REPETITIONS, DEFAULT_SEED};
pub use context::{AssertionKind, AssertionRecord, Interrupt, PassMode, Step, TestContext};
pub use error::{RepriseError, RepriseResult};
pub use generator::{DynGenerator, Generator, GeneratorNode};
pub use identity::{CallSite, NodeId, SourceLocation};
pub use node::{ExecutionNode, NodeIndex, NodeKind, NodeState};
pub use nodes::ExecutionNodes;
pub use outcome::{Counters, Exploration, Failure, Outcome, ShrinkReport, ShrunkValue};
pub use random::RandomNumberGenerator;
pub use registry::{parse_tags, Tag, TagKind, Test, TestInfo, TestRegistry, Verdict};
pub use reporter::{Event, NullReporter, RecordingReporter, Reporter};
pub use runner::{run_tests, RunSummary, Runner, TestResult};
pub use shrink::{IntegerCandidates, Shrinker, TriedCache};
