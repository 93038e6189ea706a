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

//! Named tests, tags and selection.
//!
//! Tags are written as a bracketed list, `"[parser][slow]"`. A few tags
//! change how a test is treated:
//!
//! | Tag              | Effect                                              |
//! |------------------|-----------------------------------------------------|
//! | `[.]`, `[.name]` | hidden: only runs when selected explicitly          |
//! | `[!mayfail]`     | a failure does not fail the run                     |
//! | `[!shouldfail]`  | a failure is expected; passing fails the run        |

use crate::context::{Step, TestContext};
use crate::error::{RepriseError, RepriseResult};
use crate::identity::SourceLocation;
use std::fmt;

/// What a tag does.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum TagKind {
    /// Plain label
    Normal,
    /// Excludes the test from default selection
    Hidden,
    /// Failures are tolerated
    MayFail,
    /// Failures are expected
    ShouldFail,
}

/// One parsed tag.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Tag {
    /// Label without brackets or markers (`"."` for a bare hidden tag)
    pub name: String,
    /// Effect on the test
    pub kind: TagKind,
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            TagKind::Hidden if self.name == "." => write!(f, "[.]"),
            TagKind::Hidden => write!(f, "[.{}]", self.name),
            TagKind::MayFail | TagKind::ShouldFail => write!(f, "[!{}]", self.name),
            TagKind::Normal => write!(f, "[{}]", self.name),
        }
    }
}

/// Parse a tag specification such as `"[io][.slow][!mayfail]"`.
///
/// # Errors
///
/// Returns [`RepriseError::InvalidTags`] for text outside brackets, empty or
/// unterminated tags, and unknown `!` tags.
pub fn parse_tags(spec: &str) -> RepriseResult<Vec<Tag>> {
    let invalid = |reason: &str| RepriseError::InvalidTags {
        spec: spec.to_string(),
        reason: reason.to_string(),
    };

    let mut tags = Vec::new();
    let mut rest = spec.trim();
    while !rest.is_empty() {
        let Some(body) = rest.strip_prefix('[') else {
            return Err(invalid("tags must be enclosed in brackets"));
        };
        let Some(end) = body.find(']') else {
            return Err(invalid("unterminated tag"));
        };
        let raw = &body[..end];
        if raw.contains('[') {
            return Err(invalid("nested '['"));
        }
        let tag = if raw == "." {
            Tag {
                name: ".".to_string(),
                kind: TagKind::Hidden,
            }
        } else if let Some(name) = raw.strip_prefix('.') {
            Tag {
                name: name.to_string(),
                kind: TagKind::Hidden,
            }
        } else if let Some(special) = raw.strip_prefix('!') {
            let kind = match special {
                "mayfail" => TagKind::MayFail,
                "shouldfail" => TagKind::ShouldFail,
                _ => return Err(invalid(&format!("unknown special tag '!{}'", special))),
            };
            Tag {
                name: special.to_string(),
                kind,
            }
        } else {
            Tag {
                name: raw.to_string(),
                kind: TagKind::Normal,
            }
        };
        if tag.name.trim().is_empty() {
            return Err(invalid("empty tag"));
        }
        if !tags.contains(&tag) {
            tags.push(tag);
        }
        rest = body[end + 1..].trim_start();
    }
    Ok(tags)
}

/// Name, tags and declaration site of a test.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct TestInfo {
    /// Unique test name
    pub name: String,
    /// Parsed tags
    pub tags: Vec<Tag>,
    /// Where the test was registered
    pub location: Option<SourceLocation>,
}

impl TestInfo {
    /// Untagged test without a known location.
    pub fn named(name: impl Into<String>) -> Self {
        TestInfo {
            name: name.into(),
            tags: Vec::new(),
            location: None,
        }
    }

    fn has_kind(&self, kind: TagKind) -> bool {
        self.tags.iter().any(|t| t.kind == kind)
    }

    /// Excluded from default selection.
    pub fn is_hidden(&self) -> bool {
        self.has_kind(TagKind::Hidden)
    }

    /// Failures are tolerated.
    pub fn may_fail(&self) -> bool {
        self.has_kind(TagKind::MayFail)
    }

    /// Failures are expected.
    pub fn should_fail(&self) -> bool {
        self.has_kind(TagKind::ShouldFail)
    }

    /// Whether any tag carries this label.
    pub fn has_tag(&self, name: &str) -> bool {
        self.tags.iter().any(|t| t.name.eq_ignore_ascii_case(name))
    }

    /// Tags rendered back into bracket form.
    pub fn tag_string(&self) -> String {
        self.tags.iter().map(Tag::to_string).collect()
    }
}

/// How a finished test counts towards the run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum Verdict {
    /// Passed as expected
    Passed,
    /// Failed, or aborted with an error
    Failed,
    /// Failed, but tagged `[!mayfail]` or `[!shouldfail]`
    FailedAsExpected,
    /// Passed despite `[!shouldfail]`
    PassedUnexpectedly,
}

impl Verdict {
    /// Apply the test's tags to a raw pass/fail result.
    pub fn decide(info: &TestInfo, passed: bool) -> Self {
        match (passed, info.should_fail(), info.may_fail()) {
            (true, true, _) => Verdict::PassedUnexpectedly,
            (true, false, _) => Verdict::Passed,
            (false, true, _) | (false, _, true) => Verdict::FailedAsExpected,
            (false, false, false) => Verdict::Failed,
        }
    }

    /// Whether this verdict lets the run succeed.
    pub fn is_success(self) -> bool {
        matches!(self, Verdict::Passed | Verdict::FailedAsExpected)
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Verdict::Passed => "passed",
            Verdict::Failed => "failed",
            Verdict::FailedAsExpected => "failed as expected",
            Verdict::PassedUnexpectedly => "passed unexpectedly",
        };
        f.write_str(text)
    }
}

type TestBody = Box<dyn Fn(&mut TestContext<'_>) -> Step>;

/// A registered test.
pub struct Test {
    /// Name, tags and location
    pub info: TestInfo,
    body: TestBody,
}

impl Test {
    /// Run the body against a context.
    pub fn invoke(&self, context: &mut TestContext<'_>) -> Step {
        (self.body)(context)
    }
}

impl fmt::Debug for Test {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Test").field("info", &self.info).finish_non_exhaustive()
    }
}

/// Ordered collection of tests with unique names.
#[derive(Debug, Default)]
pub struct TestRegistry {
    tests: Vec<Test>,
}

impl TestRegistry {
    /// Empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a test under `name` with a tag specification.
    ///
    /// # Errors
    ///
    /// Returns [`RepriseError::DuplicateTest`] when the name is taken, and
    /// [`RepriseError::InvalidTags`] for a malformed tag specification.
    #[track_caller]
    pub fn register<F>(&mut self, name: &str, tags: &str, body: F) -> RepriseResult<()>
    where
        F: Fn(&mut TestContext<'_>) -> Step + 'static,
    {
        let location = SourceLocation::caller();
        if self.find(name).is_some() {
            return Err(RepriseError::DuplicateTest(name.to_string()));
        }
        let tags = parse_tags(tags)?;
        self.tests.push(Test {
            info: TestInfo {
                name: name.to_string(),
                tags,
                location: Some(location),
            },
            body: Box::new(body),
        });
        Ok(())
    }

    /// Test named `name`.
    pub fn find(&self, name: &str) -> Option<&Test> {
        self.tests.iter().find(|t| t.info.name == name)
    }

    /// All tests in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &Test> {
        self.tests.iter()
    }

    /// Number of registered tests.
    pub fn len(&self) -> usize {
        self.tests.len()
    }

    /// True when nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.tests.is_empty()
    }

    /// Pick the tests to run.
    ///
    /// With no filters every visible test is selected, plus hidden ones when
    /// `include_hidden` is set. A filter is either a test name or a bracketed
    /// tag such as `"[slow]"`; explicitly named tests run even when hidden.
    /// The result keeps registration order without duplicates.
    ///
    /// # Errors
    ///
    /// Returns [`RepriseError::UnknownTest`] for a name or tag that matches
    /// nothing.
    pub fn select<S: AsRef<str>>(
        &self,
        filters: &[S],
        include_hidden: bool,
    ) -> RepriseResult<Vec<&Test>> {
        if filters.is_empty() {
            return Ok(self
                .tests
                .iter()
                .filter(|t| include_hidden || !t.info.is_hidden())
                .collect());
        }

        let mut chosen = vec![false; self.tests.len()];
        for filter in filters {
            let filter = filter.as_ref();
            let tag = filter.strip_prefix('[').and_then(|f| f.strip_suffix(']'));
            let matched: Vec<usize> = match tag {
                Some(tag) => {
                    let tag = tag.trim_start_matches(['.', '!']);
                    self.positions(|t| t.info.has_tag(tag))
                }
                None => self.positions(|t| t.info.name == filter),
            };
            if matched.is_empty() {
                return Err(RepriseError::UnknownTest(filter.to_string()));
            }
            for position in matched {
                chosen[position] = true;
            }
        }
        Ok(self
            .tests
            .iter()
            .zip(chosen)
            .filter_map(|(test, keep)| keep.then_some(test))
            .collect())
    }

    fn positions(&self, predicate: impl Fn(&Test) -> bool) -> Vec<usize> {
        self.tests
            .iter()
            .enumerate()
            .filter(|(_, t)| predicate(t))
            .map(|(i, _)| i)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pass(_: &mut TestContext<'_>) -> Step {
        Ok(())
    }

    // ==================== Tag parsing tests ====================

    #[test]
    fn test_parse_plain_tags() {
        let tags = parse_tags("[io] [slow]").unwrap();
        assert_eq!(tags.len(), 2);
        assert_eq!(tags[0].name, "io");
        assert_eq!(tags[1].kind, TagKind::Normal);
    }

    #[test]
    fn test_parse_special_tags() {
        let tags = parse_tags("[.][.db][!mayfail][!shouldfail]").unwrap();
        let kinds: Vec<TagKind> = tags.iter().map(|t| t.kind).collect();
        assert_eq!(
            kinds,
            vec![TagKind::Hidden, TagKind::Hidden, TagKind::MayFail, TagKind::ShouldFail]
        );
        assert_eq!(tags[1].name, "db");
    }

    #[test]
    fn test_parse_empty_spec() {
        assert!(parse_tags("").unwrap().is_empty());
        assert!(parse_tags("   ").unwrap().is_empty());
    }

    #[test]
    fn test_parse_rejects_malformed() {
        for spec in ["io", "[io", "[]", "[a[b]", "[!sometimes]", "[io]x"] {
            let err = parse_tags(spec).unwrap_err();
            assert!(matches!(err, RepriseError::InvalidTags { .. }), "{}", spec);
        }
    }

    #[test]
    fn test_parse_deduplicates() {
        assert_eq!(parse_tags("[a][a]").unwrap().len(), 1);
    }

    #[test]
    fn test_tag_display_round_trips() {
        let spec = "[.][.db][!mayfail][io]";
        let info = TestInfo {
            name: "t".to_string(),
            tags: parse_tags(spec).unwrap(),
            location: None,
        };
        assert_eq!(info.tag_string(), spec);
    }

    // ==================== Verdict tests ====================

    #[test]
    fn test_verdicts() {
        let plain = TestInfo::named("plain");
        let mut may = TestInfo::named("may");
        may.tags = parse_tags("[!mayfail]").unwrap();
        let mut should = TestInfo::named("should");
        should.tags = parse_tags("[!shouldfail]").unwrap();

        assert_eq!(Verdict::decide(&plain, true), Verdict::Passed);
        assert_eq!(Verdict::decide(&plain, false), Verdict::Failed);
        assert_eq!(Verdict::decide(&may, true), Verdict::Passed);
        assert_eq!(Verdict::decide(&may, false), Verdict::FailedAsExpected);
        assert_eq!(Verdict::decide(&should, true), Verdict::PassedUnexpectedly);
        assert_eq!(Verdict::decide(&should, false), Verdict::FailedAsExpected);
        assert!(!Verdict::PassedUnexpectedly.is_success());
        assert!(Verdict::FailedAsExpected.is_success());
    }

    // ==================== Registry tests ====================

    #[test]
    fn test_register_and_find() {
        let mut registry = TestRegistry::new();
        registry.register("a", "[fast]", pass).unwrap();
        let test = registry.find("a").unwrap();
        assert!(test.info.has_tag("FAST"));
        assert!(test.info.location.unwrap().file.ends_with("registry.rs"));
        assert!(registry.find("b").is_none());
    }

    #[test]
    fn test_register_rejects_duplicates_and_bad_tags() {
        let mut registry = TestRegistry::new();
        registry.register("a", "", pass).unwrap();
        assert_eq!(
            registry.register("a", "", pass).unwrap_err(),
            RepriseError::DuplicateTest("a".to_string())
        );
        assert!(registry.register("b", "oops", pass).is_err());
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_select_defaults_skip_hidden() {
        let mut registry = TestRegistry::new();
        registry.register("shown", "", pass).unwrap();
        registry.register("hidden", "[.]", pass).unwrap();
        let names = |tests: Vec<&Test>| -> Vec<String> {
            tests.iter().map(|t| t.info.name.clone()).collect()
        };

        let none: [&str; 0] = [];
        assert_eq!(names(registry.select(&none, false).unwrap()), vec!["shown"]);
        assert_eq!(names(registry.select(&none, true).unwrap()), vec!["shown", "hidden"]);
        assert_eq!(names(registry.select(&["hidden"], false).unwrap()), vec!["hidden"]);
    }

    #[test]
    fn test_select_by_tag_keeps_order() {
        let mut registry = TestRegistry::new();
        registry.register("one", "[db]", pass).unwrap();
        registry.register("two", "", pass).unwrap();
        registry.register("three", "[.db]", pass).unwrap();
        let selected = registry.select(&["three", "[db]"], false).unwrap();
        let names: Vec<&str> = selected.iter().map(|t| t.info.name.as_str()).collect();
        assert_eq!(names, vec!["one", "three"]);
    }

    #[test]
    fn test_select_unknown() {
        let registry = TestRegistry::new();
        assert_eq!(
            registry.select(&["missing"], false).unwrap_err(),
            RepriseError::UnknownTest("missing".to_string())
        );
    }
}
