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

//! Repeated invocation of a test body until its execution tree is explored.
//!
//! Every pass enters the root, runs the body, and exits the root again. The
//! tree remembers how far each section and generator got, so the next pass
//! takes the next unexplored path. A failing pass is shrunk before exploration
//! moves on: the nodes the pass went through are frozen, and the body is
//! replayed with simpler values for each shrinkable generator on the failing
//! path, innermost first.

use crate::config::RunnerConfig;
use crate::context::{AssertionRecord, PassMode, PassRecord, Step, TestContext};
use crate::error::{RepriseError, RepriseResult};
use crate::identity::NodeId;
use crate::node::{NodeIndex, NodeState};
use crate::nodes::ExecutionNodes;
use crate::outcome::{Counters, Exploration, Failure, Outcome, ShrinkReport, ShrunkValue};
use crate::registry::{Test, TestInfo, Verdict};
use crate::reporter::{NullReporter, Reporter};
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use tracing::{debug, info, warn};

/// Drives test bodies to full exploration.
#[derive(Debug, Clone, Default)]
pub struct Runner {
    config: RunnerConfig,
}

impl Runner {
    /// Runner with a validated configuration.
    ///
    /// # Errors
    ///
    /// Returns [`RepriseError::InvalidConfig`] if the configuration is unusable.
    pub fn new(config: RunnerConfig) -> RepriseResult<Self> {
        config.validate()?;
        Ok(Runner { config })
    }

    /// Active configuration.
    pub fn config(&self) -> &RunnerConfig {
        &self.config
    }

    /// Run `body` as a test called `name` until every path was taken.
    ///
    /// Assertion failures are reported in the [`Outcome`].
    ///
    /// # Errors
    ///
    /// Misuse of sections or generators aborts the run with the
    /// corresponding [`RepriseError`], as does a tree that is still not
    /// explored after [`RunnerConfig::max_passes`] passes.
    pub fn run<F>(&self, name: &str, body: F) -> RepriseResult<Outcome>
    where
        F: FnMut(&mut TestContext<'_>) -> Step,
    {
        self.run_with_reporter(&TestInfo::named(name), body, &mut NullReporter)
    }

    /// [`run`](Self::run) with progress events sent to `reporter`.
    ///
    /// Every `on_test_start` is matched by `on_test_end`, or by
    /// `on_test_aborted` when the run returns `Err`.
    pub fn run_with_reporter<F, R>(
        &self,
        test: &TestInfo,
        mut body: F,
        reporter: &mut R,
    ) -> RepriseResult<Outcome>
    where
        F: FnMut(&mut TestContext<'_>) -> Step,
        R: Reporter + ?Sized,
    {
        reporter.on_test_start(test);
        match self.explore(test, &mut body, reporter) {
            Ok(outcome) => {
                info!(
                    "test '{}' {} after {} pass(es): {} assertion(s), {} failing pass(es)",
                    test.name,
                    if outcome.passed() { "passed" } else { "failed" },
                    outcome.passes,
                    outcome.counters.total(),
                    outcome.failures.len()
                );
                reporter.on_test_end(test, &outcome);
                Ok(outcome)
            }
            Err(err) => {
                warn!("test '{}' aborted: {}", test.name, err);
                reporter.on_test_aborted(test, &err);
                Err(err)
            }
        }
    }

    fn explore<F, R>(
        &self,
        test: &TestInfo,
        body: &mut F,
        reporter: &mut R,
    ) -> RepriseResult<Outcome>
    where
        F: FnMut(&mut TestContext<'_>) -> Step,
        R: Reporter + ?Sized,
    {
        let mut nodes = ExecutionNodes::new(NodeId::keyed(test.name.as_str(), test.name.as_str()));
        let root = nodes.root();
        let mut counters = Counters::default();
        let mut failures = Vec::new();
        let mut pass = 0;

        loop {
            if pass == self.config.max_passes {
                warn!("test '{}' still unexplored after {} passes", test.name, pass);
                return Err(RepriseError::PassLimitExceeded {
                    test: test.name.clone(),
                    limit: self.config.max_passes,
                });
            }
            pass += 1;
            debug!("test '{}': pass {} starting", test.name, pass);
            reporter.on_pass_start(test, pass);

            nodes.enter(root)?;
            let record = invoke(&mut nodes, &self.config, PassMode::Normal, body);
            if let Some(err) = record.error.clone() {
                return Err(err);
            }
            for assertion in &record.assertions {
                counters.record(assertion);
                reporter.on_assertion(test, assertion);
            }

            if record.failed() {
                let shrunk = match (self.config.shrink, record.failure_site) {
                    (true, Some(site)) => self.shrink(&mut nodes, site, body, test, reporter)?,
                    _ => None,
                };
                let failure = match shrunk {
                    Some((report, replayed)) if !replayed.is_empty() => Failure {
                        pass,
                        assertions: replayed,
                        shrink: Some(report),
                    },
                    Some((report, _)) => Failure {
                        pass,
                        assertions: record.failures(),
                        shrink: Some(report),
                    },
                    None => Failure {
                        pass,
                        assertions: record.failures(),
                        shrink: None,
                    },
                };
                failures.push(failure);
            }

            if record.interrupted {
                nodes.unwind()?;
            }
            let state = nodes.exit(root, false)?;
            debug!("test '{}': pass {} ended, root {}", test.name, pass, state);
            reporter.on_pass_end(test, pass, state);
            if state == NodeState::Completed {
                break;
            }
        }

        let exploration = if pass == 1 && nodes.node_count() == 1 {
            Exploration::Single
        } else {
            Exploration::Explored { passes: pass }
        };
        Ok(Outcome {
            name: test.name.clone(),
            passes: pass,
            exploration,
            counters,
            failures,
        })
    }

    // ==================== Shrinking ====================

    /// Shrink the generators on the path to `site`, returning the report and
    /// the failed assertions of the minimised replay.
    fn shrink<F, R>(
        &self,
        nodes: &mut ExecutionNodes,
        site: NodeIndex,
        body: &mut F,
        test: &TestInfo,
        reporter: &mut R,
    ) -> RepriseResult<Option<(ShrinkReport, Vec<AssertionRecord>)>>
    where
        F: FnMut(&mut TestContext<'_>) -> Step,
        R: Reporter + ?Sized,
    {
        let chain = nodes.shrinkable_chain(site);
        if chain.is_empty() {
            return Ok(None);
        }

        debug!("test '{}': shrinking {} generator(s)", test.name, chain.len());
        reporter.on_shrink_start(test);
        let frozen = nodes.freeze_pass();
        let searched = self.search_chain(nodes, &chain, body, test, reporter);
        nodes.thaw(frozen);
        let (report, replayed) = searched?;

        if report.simplified() {
            debug!(
                "test '{}': shrunk to {} after {} attempt(s)",
                test.name,
                describe_values(&report.values),
                report.attempts
            );
            reporter.on_shrink_found(test, &report.values, report.attempts);
        } else {
            debug!("test '{}': no simpler failing values found", test.name);
            reporter.on_no_shrink_found(test, report.attempts);
        }
        Ok(Some((report, replayed)))
    }

    fn search_chain<F, R>(
        &self,
        nodes: &mut ExecutionNodes,
        chain: &[NodeIndex],
        body: &mut F,
        test: &TestInfo,
        reporter: &mut R,
    ) -> RepriseResult<(ShrinkReport, Vec<AssertionRecord>)>
    where
        F: FnMut(&mut TestContext<'_>) -> Step,
        R: Reporter + ?Sized,
    {
        let mut report = ShrinkReport::default();
        for &index in chain {
            let name = nodes.node(index)?.name().to_string();
            if !nodes.generator_at(index).map_or(false, |g| g.start_shrinking()) {
                continue;
            }

            let mut attempts = 0;
            while attempts < self.config.max_shrink_attempts {
                if !nodes.generator_at(index).map_or(false, |g| g.next_shrink_candidate()) {
                    break;
                }
                attempts += 1;
                let failed = self.replay(nodes, body)?.failed();
                reporter.on_shrink_result(test, failed, report.attempts + attempts);
                if failed {
                    if let Some(generator) = nodes.generator_at(index) {
                        generator.rebase_shrink();
                    }
                }
            }
            report.attempts += attempts;

            let Some(generator) = nodes.generator_at(index) else {
                return Err(RepriseError::UnknownNode(index.get()));
            };
            let simplified = generator.stop_shrinking();
            let value = generator.describe();
            debug!("generator '{}' settled on {} ({} attempts)", name, value, attempts);
            report.values.push(ShrunkValue { name, value, simplified });
        }

        let minimised = self.replay(nodes, body)?;
        Ok((report, minimised.failures()))
    }

    fn replay<F>(&self, nodes: &mut ExecutionNodes, body: &mut F) -> RepriseResult<PassRecord>
    where
        F: FnMut(&mut TestContext<'_>) -> Step,
    {
        nodes.begin_replay();
        let record = invoke(nodes, &self.config, PassMode::Shrinking, body);
        match record.error {
            Some(err) => Err(err),
            None => Ok(record),
        }
    }
}

/// Run the body once, turning interruptions and panics into record entries.
fn invoke<F>(
    nodes: &mut ExecutionNodes,
    config: &RunnerConfig,
    mode: PassMode,
    body: &mut F,
) -> PassRecord
where
    F: FnMut(&mut TestContext<'_>) -> Step,
{
    let mut context = TestContext::new(nodes, config, mode);
    let result = panic::catch_unwind(AssertUnwindSafe(|| body(&mut context)));
    match result {
        Ok(Ok(())) => {}
        Ok(Err(interrupt)) => context.record_interrupt(interrupt),
        Err(payload) => context.record_panic(panic_message(payload.as_ref())),
    }
    context.into_record()
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "panic with a non-string payload".to_string()
    }
}

fn describe_values(values: &[ShrunkValue]) -> String {
    values
        .iter()
        .map(ShrunkValue::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

// ==================== Batches ====================

/// Result of one test in a batch.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct TestResult {
    /// Test name, tags and location
    pub info: TestInfo,
    /// How the result counts towards the run
    pub verdict: Verdict,
    /// Outcome, absent when the run was aborted
    pub outcome: Option<Outcome>,
    /// Why the run was aborted
    pub error: Option<String>,
}

/// Results of a batch of tests.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct RunSummary {
    /// Per-test results in run order
    pub results: Vec<TestResult>,
}

impl RunSummary {
    /// Number of tests with a successful verdict.
    pub fn succeeded(&self) -> usize {
        self.results.iter().filter(|r| r.verdict.is_success()).count()
    }

    /// Number of tests with an unsuccessful verdict.
    pub fn unsuccessful(&self) -> usize {
        self.results.len() - self.succeeded()
    }

    /// Whether every test has a successful verdict.
    pub fn all_succeeded(&self) -> bool {
        self.results.iter().all(|r| r.verdict.is_success())
    }

    /// Assertion tallies across every test.
    pub fn counters(&self) -> Counters {
        let mut total = Counters::default();
        for outcome in self.results.iter().filter_map(|r| r.outcome.as_ref()) {
            total += outcome.counters;
        }
        total
    }
}

/// Run each test in turn and apply its tags to the result.
///
/// An aborted test counts as failed; the batch continues with the next one.
pub fn run_tests<'t, I, R>(tests: I, runner: &Runner, reporter: &mut R) -> RunSummary
where
    I: IntoIterator<Item = &'t Test>,
    R: Reporter + ?Sized,
{
    let tests: Vec<&Test> = tests.into_iter().collect();
    reporter.on_run_start(tests.len());

    let mut summary = RunSummary::default();
    for test in tests {
        let result = match runner.run_with_reporter(&test.info, |t| test.invoke(t), reporter) {
            Ok(outcome) => TestResult {
                info: test.info.clone(),
                verdict: Verdict::decide(&test.info, outcome.passed()),
                outcome: Some(outcome),
                error: None,
            },
            Err(err) => TestResult {
                info: test.info.clone(),
                verdict: Verdict::Failed,
                outcome: None,
                error: Some(err.to_string()),
            },
        };
        summary.results.push(result);
    }

    info!(
        "{} test(s) run, {} succeeded, {} did not",
        summary.results.len(),
        summary.succeeded(),
        summary.unsuccessful()
    );
    reporter.on_run_end(&summary);
    summary
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::AssertionKind;
    use crate::generator::{from_values, values_of};
    use crate::registry::TestRegistry;
    use crate::reporter::{Event, RecordingReporter};

    // ==================== Pass loop tests ====================

    #[test]
    fn test_plain_body_runs_once() {
        let mut calls = 0;
        let outcome = Runner::default()
            .run("plain", |t| {
                calls += 1;
                t.check(true, "fine");
                Ok(())
            })
            .unwrap();
        assert_eq!(calls, 1);
        assert!(outcome.passed());
        assert!(outcome.ran_once());
        assert_eq!(outcome.counters.passed, 1);
    }

    #[test]
    fn test_generator_drives_passes() {
        let mut seen = Vec::new();
        let outcome = Runner::default()
            .run("values", |t| {
                seen.push(t.generate("n", from_values(vec![1, 2, 3]))?);
                Ok(())
            })
            .unwrap();
        assert_eq!(seen, vec![1, 2, 3]);
        assert_eq!(outcome.exploration, Exploration::Explored { passes: 3 });
    }

    #[test]
    fn test_panic_becomes_failure() {
        let outcome = Runner::default()
            .run("panics", |t| {
                t.section("boom", |_| panic!("exploded"))?;
                Ok(())
            })
            .unwrap();
        assert!(!outcome.passed());
        let assertion = &outcome.failures[0].assertions[0];
        assert_eq!(assertion.kind, AssertionKind::Panic);
        assert_eq!(assertion.message, "exploded");
    }

    #[test]
    fn test_pass_limit() {
        let runner = Runner::new(RunnerConfig::default().max_passes(2)).unwrap();
        let err = runner
            .run("long", |t| t.generate("n", from_values(vec![1, 2, 3])).map(|_| ()))
            .unwrap_err();
        assert_eq!(
            err,
            RepriseError::PassLimitExceeded {
                test: "long".to_string(),
                limit: 2
            }
        );
    }

    #[test]
    fn test_invalid_config_rejected() {
        assert!(Runner::new(RunnerConfig::default().repetitions(0)).is_err());
    }

    // ==================== Shrinking tests ====================

    #[test]
    fn test_shrinks_to_boundary() {
        let runner = Runner::new(RunnerConfig::default().repetitions(5)).unwrap();
        let outcome = runner
            .run("bound", |t| {
                let n = t.generate("n", values_of::<u32>().at_least(100).up_to(10_000))?;
                t.check(n < 100, "n below 100");
                Ok(())
            })
            .unwrap();
        assert_eq!(outcome.failures.len(), 5);
        let values = outcome.shrunk_values().unwrap();
        assert_eq!(values[0].name, "n");
        assert_eq!(values[0].value, "100");
    }

    #[test]
    fn test_shrinking_disabled() {
        let runner = Runner::new(RunnerConfig::default().repetitions(3).shrinking(false)).unwrap();
        let outcome = runner
            .run("noshrink", |t| {
                let n = t.generate("n", values_of::<u8>().at_least(10))?;
                t.require(n < 10, "small")
            })
            .unwrap();
        assert_eq!(outcome.failures.len(), 3);
        assert!(outcome.failures.iter().all(|f| f.shrink.is_none()));
    }

    #[test]
    fn test_reporter_sees_shrink_events() {
        let runner = Runner::new(RunnerConfig::default().repetitions(1)).unwrap();
        let mut reporter = RecordingReporter::new();
        let outcome = runner
            .run_with_reporter(
                &TestInfo::named("events"),
                |t| {
                    let n = t.generate("n", values_of::<u16>().at_least(50))?;
                    t.check(n < 20, "small");
                    Ok(())
                },
                &mut reporter,
            )
            .unwrap();
        assert!(!outcome.passed());
        assert_eq!(reporter.count(|e| matches!(e, Event::ShrinkStart)), 1);
        assert_eq!(reporter.count(|e| matches!(e, Event::ShrinkFound(_))), 1);
        // replays are not reported as assertions
        assert_eq!(reporter.count(|e| matches!(e, Event::Assertion { .. })), 1);
        assert_eq!(
            reporter.events().last(),
            Some(&Event::TestEnd {
                name: "events".to_string(),
                passed: false
            })
        );
    }

    // ==================== Batch tests ====================

    #[test]
    fn test_run_tests_applies_tags() {
        let mut registry = TestRegistry::new();
        registry.register("ok", "", |_| Ok(())).unwrap();
        registry.register("flaky", "[!mayfail]", |t| t.fail("nope")).unwrap();
        registry.register("inverted", "[!shouldfail]", |_| Ok(())).unwrap();
        registry
            .register("broken", "", |t| {
                for i in 0..2 {
                    t.section(&format!("s{}", i), |_| Ok(()))?;
                }
                Ok(())
            })
            .unwrap();

        let mut reporter = RecordingReporter::new();
        let summary = run_tests(registry.iter(), &Runner::default(), &mut reporter);
        let verdicts: Vec<Verdict> = summary.results.iter().map(|r| r.verdict).collect();
        assert_eq!(
            verdicts,
            vec![
                Verdict::Passed,
                Verdict::FailedAsExpected,
                Verdict::PassedUnexpectedly,
                Verdict::Failed
            ]
        );
        assert!(summary.results[3].error.is_some());
        assert_eq!(summary.succeeded(), 2);
        assert!(!summary.all_succeeded());
        assert_eq!(reporter.events().first(), Some(&Event::RunStart(4)));
        assert_eq!(reporter.events().last(), Some(&Event::RunEnd));
    }
}
