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

//! Built-in demonstration suite.
//!
//! `reprise run` explores these tests. Everything visible is expected to
//! succeed with the default configuration: `[!mayfail]` and `[!shouldfail]`
//! tests count as successes when they fail. The hidden tests show a failing
//! run and only execute when named.

use reprise_core::generator::{
    charsets, from_values, inclusive_range, strings, values_of, vecs_of, Generator,
};
use reprise_core::{RepriseResult, TestRegistry};

/// Register the built-in tests.
///
/// # Errors
///
/// Returns `Err` only if a name or tag specification below is malformed.
pub fn builtin_suite() -> RepriseResult<TestRegistry> {
    let mut registry = TestRegistry::new();

    registry.register("vector push and clear", "[sections]", |t| {
        let mut v = vec![1, 2, 3];
        t.require(v.len() == 3, "starts with three elements")?;
        t.section("push", |t| {
            v.push(4);
            t.check(v.len() == 4, "push grows the vector");
            t.section("then pop", |t| {
                let last = v.pop();
                t.check(last == Some(4), "pop returns the pushed element");
                Ok(())
            })?;
            t.section("then truncate", |t| {
                v.truncate(1);
                t.check(v == [1], "truncate keeps the prefix");
                Ok(())
            })
        })?;
        t.section("clear", |t| {
            v.clear();
            t.check(v.is_empty(), "clear empties the vector");
            Ok(())
        })
    })?;

    registry.register("reversing twice is identity", "[generators][pbt]", |t| {
        let v = t.generate("v", vecs_of(values_of::<i32>().full_range()).max_size(8))?;
        let mut twice = v.clone();
        twice.reverse();
        twice.reverse();
        t.check(twice == v, "reverse(reverse(v)) == v");
        Ok(())
    })?;

    registry.register("uppercase round trip", "[generators][pbt]", |t| {
        let s = t.generate("s", strings().charset(charsets::LOWERCASE).max_len(12))?;
        t.check(
            s.to_uppercase().to_lowercase() == s,
            "lowercase(uppercase(s)) == s",
        );
        Ok(())
    })?;

    registry.register("addition table", "[generators][sections]", |t| {
        let a = t.generate("a", inclusive_range(1u32, 3))?;
        let b = t.generate("b", from_values(vec![10u32, 20, 30]))?;
        t.section("commutes", |t| {
            t.check(a + b == b + a, "a + b == b + a");
            Ok(())
        })?;
        t.section("subtraction undoes addition", |t| {
            t.check((a + b) - b == a, "(a + b) - b == a");
            Ok(())
        })
    })?;

    registry.register("small sum", "[pbt][!mayfail]", |t| {
        let a = t.generate("a", values_of::<u8>().times(10))?;
        let b = t.generate("b", values_of::<u8>().times(10))?;
        t.check(u16::from(a) + u16::from(b) < 400, "a + b < 400");
        Ok(())
    })?;

    registry.register("known overflow", "[pbt][!shouldfail]", |t| {
        let x = t.generate("x", values_of::<u16>().at_least(2).times(20))?;
        t.check(x.checked_mul(x).is_some(), "x * x fits in u16");
        Ok(())
    })?;

    registry.register("pair shrink demo", "[.][pbt]", |t| {
        let i = t.generate("i", values_of::<u8>().times(10))?;
        let j = t.generate("j", values_of::<u8>().times(10))?;
        t.check(!((i == 3 || i > 11) && j > 4), "no bad (i, j) pair");
        Ok(())
    })?;

    registry.register("panic demo", "[.]", |_t| panic!("the demo body panicked"))?;

    Ok(registry)
}

#[cfg(test)]
mod tests {
    use super::*;
    use reprise_core::{run_tests, NullReporter, Runner, Verdict};

    // ==================== Registration tests ====================

    #[test]
    fn test_suite_registers() {
        let registry = builtin_suite().unwrap();
        assert_eq!(registry.len(), 8);
        assert!(registry.find("pair shrink demo").unwrap().info.is_hidden());
        assert!(registry.find("known overflow").unwrap().info.should_fail());
    }

    #[test]
    fn test_visible_tests_succeed() {
        let registry = builtin_suite().unwrap();
        let tests = registry.select::<&str>(&[], false).unwrap();
        assert_eq!(tests.len(), 6);
        let summary = run_tests(tests, &Runner::default(), &mut NullReporter);
        assert!(summary.all_succeeded(), "{:?}", summary);
    }

    #[test]
    fn test_vector_sections_take_three_passes() {
        let registry = builtin_suite().unwrap();
        let test = registry.find("vector push and clear").unwrap();
        let outcome = Runner::default()
            .run_with_reporter(&test.info, |t| test.invoke(t), &mut NullReporter)
            .unwrap();
        assert_eq!(outcome.passes, 3);
        assert!(outcome.passed());
    }

    #[test]
    fn test_panic_demo_fails() {
        let registry = builtin_suite().unwrap();
        let summary = run_tests(
            registry.select(&["panic demo"], false).unwrap(),
            &Runner::default(),
            &mut NullReporter,
        );
        assert_eq!(summary.results[0].verdict, Verdict::Failed);
    }
}
