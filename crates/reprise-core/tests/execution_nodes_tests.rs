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

//! State machine tests that drive [`ExecutionNodes`] by hand, the way a
//! runner and a test body would between them.

use reprise_core::generator::from_values;
use reprise_core::{ExecutionNodes, NodeId, NodeIndex, NodeState, RepriseError, RunnerConfig};

fn tree() -> ExecutionNodes {
    ExecutionNodes::new(NodeId::keyed("test", "test"))
}

/// Enter and leave a section, returning whether it ran.
fn section(nodes: &mut ExecutionNodes, name: &str, body: impl FnOnce(&mut ExecutionNodes)) -> bool {
    match nodes.try_enter_section(NodeId::keyed(name, name)).unwrap() {
        Some(index) => {
            body(nodes);
            nodes.leave_section(index, false).unwrap();
            true
        }
        None => false,
    }
}

fn find(nodes: &ExecutionNodes, name: &str) -> NodeIndex {
    nodes
        .iter()
        .find(|(_, node)| node.name() == name)
        .map(|(index, _)| index)
        .unwrap()
}

// =============================================================================
// Single node
// =============================================================================

#[test]
fn test_single_node_completes_in_one_pass() {
    let mut nodes = tree();
    let root = nodes.root();
    assert_eq!(nodes.state(root).unwrap(), NodeState::NotEntered);
    nodes.enter(root).unwrap();
    assert_eq!(nodes.state(root).unwrap(), NodeState::Entered);
    assert_eq!(nodes.exit(root, false).unwrap(), NodeState::Completed);
}

// =============================================================================
// Sections
// =============================================================================

#[test]
fn test_peer_sections_take_one_pass_each() {
    let mut nodes = tree();
    let root = nodes.root();
    let mut ran = Vec::new();

    let pass = |nodes: &mut ExecutionNodes, ran: &mut Vec<&'static str>| {
        nodes.enter(root).unwrap();
        for name in ["a", "b"] {
            if section(nodes, name, |_| {}) {
                ran.push(name);
            }
        }
        nodes.exit(root, false).unwrap()
    };

    assert_eq!(pass(&mut nodes, &mut ran), NodeState::HasIncompleteChildren);
    assert_eq!(ran, vec!["a"]);
    assert_eq!(nodes.state(find(&nodes, "b")).unwrap(), NodeState::NotEntered);

    assert_eq!(pass(&mut nodes, &mut ran), NodeState::Completed);
    assert_eq!(ran, vec!["a", "b"]);
}

#[test]
fn test_nested_sections_need_two_passes() {
    let mut nodes = tree();
    let root = nodes.root();
    let pass = |nodes: &mut ExecutionNodes| {
        nodes.enter(root).unwrap();
        section(nodes, "outer", |nodes| {
            section(nodes, "first", |_| {});
            section(nodes, "second", |_| {});
        });
        nodes.exit(root, false).unwrap()
    };

    assert_eq!(pass(&mut nodes), NodeState::HasIncompleteChildren);
    let outer = find(&nodes, "outer");
    assert_eq!(nodes.state(outer).unwrap(), NodeState::HasIncompleteChildren);

    assert_eq!(pass(&mut nodes), NodeState::Completed);
    // completing the root resets everything below it
    assert_eq!(nodes.state(outer).unwrap(), NodeState::NotEntered);
}

#[test]
fn test_early_exit_is_reported() {
    let mut nodes = tree();
    let root = nodes.root();
    nodes.enter(root).unwrap();
    let index = nodes
        .try_enter_section(NodeId::keyed("only", "only"))
        .unwrap()
        .unwrap();
    nodes.leave_section(index, true).unwrap();
    assert_eq!(nodes.state(index).unwrap(), NodeState::ExitedEarly);
    assert_eq!(nodes.current(), root);

    // the early-exited section keeps its parent open for one more pass
    assert_eq!(nodes.exit(root, false).unwrap(), NodeState::HasIncompleteChildren);
    assert_eq!(nodes.state(index).unwrap(), NodeState::Completed);

    nodes.enter(root).unwrap();
    assert!(!section(&mut nodes, "only", |_| {}));
    assert_eq!(nodes.exit(root, false).unwrap(), NodeState::Completed);
    assert_eq!(nodes.state(index).unwrap(), NodeState::NotEntered);
}

#[test]
fn test_early_exit_holds_back_enclosing_generator() {
    let mut nodes = tree();
    let root = nodes.root();
    let config = RunnerConfig::default();
    let mut states = Vec::new();
    let mut ran = Vec::new();

    loop {
        nodes.enter(root).unwrap();
        let value = nodes
            .acquire(NodeId::keyed("n", "n"), from_values(vec![1, 2]), &config)
            .unwrap();
        if let Some(index) = nodes.try_enter_section(NodeId::keyed("inner", "inner")).unwrap() {
            ran.push(value);
            nodes.leave_section(index, value == 2).unwrap();
        }
        nodes.unwind().unwrap();
        let state = nodes.exit(root, false).unwrap();
        states.push(state);
        if state == NodeState::Completed {
            break;
        }
        assert!(states.len() < 10, "exploration did not converge");
    }

    assert_eq!(ran, vec![1, 2]);
    assert_eq!(
        states,
        vec![
            NodeState::HasIncompleteChildren,
            NodeState::HasIncompleteChildren,
            NodeState::Completed
        ]
    );
}

#[test]
fn test_generator_exhausted_by_early_exit_completes() {
    let mut nodes = tree();
    let root = nodes.root();
    let config = RunnerConfig::default();
    let mut passes = 0;

    loop {
        passes += 1;
        nodes.enter(root).unwrap();
        nodes
            .acquire(NodeId::keyed("n", "n"), from_values(vec![1, 2]), &config)
            .unwrap();
        // every pass is interrupted right after the draw
        nodes.unwind().unwrap();
        if nodes.exit(root, false).unwrap() == NodeState::Completed {
            break;
        }
        assert!(passes < 10, "exploration did not converge");
    }
    assert_eq!(passes, 2);
}

#[test]
fn test_exit_closes_open_children() {
    let mut nodes = tree();
    let root = nodes.root();
    nodes.enter(root).unwrap();
    let a = nodes.try_enter_section(NodeId::keyed("a", "a")).unwrap().unwrap();
    let b = nodes.try_enter_section(NodeId::keyed("b", "b")).unwrap().unwrap();
    assert_eq!(nodes.ancestors(b).collect::<Vec<_>>(), vec![b, a, root]);
    assert_eq!(nodes.exit(root, false).unwrap(), NodeState::Completed);
    assert_eq!(nodes.current(), root);
}

#[test]
fn test_exit_requires_open_parent() {
    let mut nodes = tree();
    let root = nodes.root();
    nodes.enter(root).unwrap();
    let a = nodes.try_enter_section(NodeId::keyed("a", "a")).unwrap().unwrap();
    nodes.leave_section(a, false).unwrap();
    nodes.exit(root, false).unwrap();
    nodes.reset(root).unwrap();
    nodes.enter(a).unwrap();
    let err = nodes.exit(a, false).unwrap_err();
    assert!(err.is_protocol_violation());
}

// =============================================================================
// Generators
// =============================================================================

#[test]
fn test_generator_takes_one_pass_per_value() {
    let mut nodes = tree();
    let root = nodes.root();
    let config = RunnerConfig::default();
    let mut values = Vec::new();
    let mut indices = Vec::new();

    let mut passes = 0;
    loop {
        passes += 1;
        nodes.enter(root).unwrap();
        values.push(
            nodes
                .acquire(NodeId::keyed("n", "n"), from_values(vec!['x', 'y', 'z']), &config)
                .unwrap(),
        );
        indices.push(nodes.node(nodes.current()).unwrap().current_index());
        if nodes.exit(root, false).unwrap() == NodeState::Completed {
            break;
        }
    }

    assert_eq!(passes, 3);
    assert_eq!(values, vec!['x', 'y', 'z']);
    assert_eq!(indices, vec![0, 1, 2]);
    let generator = nodes.node(find(&nodes, "n")).unwrap();
    assert_eq!(generator.state(), NodeState::NotEntered);
    assert_eq!(generator.current_index(), 0);
}

#[test]
fn test_generators_in_exclusive_sections() {
    let mut nodes = tree();
    let root = nodes.root();
    let config = RunnerConfig::default();
    let mut seen = Vec::new();

    let mut passes = 0;
    loop {
        passes += 1;
        nodes.enter(root).unwrap();
        for name in ["left", "right"] {
            let index = match nodes.try_enter_section(NodeId::keyed(name, name)).unwrap() {
                Some(index) => index,
                None => continue,
            };
            let key = format!("{}-value", name);
            let value = nodes
                .acquire(NodeId::keyed("v", key), from_values(vec![1, 2]), &config)
                .unwrap();
            seen.push(format!("{}{}", name, value));
            nodes.leave_section(index, false).unwrap();
        }
        if nodes.exit(root, false).unwrap() == NodeState::Completed {
            break;
        }
        assert!(passes < 10, "exploration did not converge");
    }

    assert_eq!(passes, 4);
    assert_eq!(seen, vec!["left1", "left2", "right1", "right2"]);
}

#[test]
fn test_completed_generator_restarts_for_later_sibling() {
    let mut nodes = tree();
    let root = nodes.root();
    let config = RunnerConfig::default();
    let mut served = Vec::new();

    for expected in [NodeState::HasIncompleteChildren, NodeState::Completed] {
        nodes.enter(root).unwrap();
        section(&mut nodes, "a", |_| {});
        section(&mut nodes, "b", |_| {});
        served.push(
            nodes
                .acquire(NodeId::keyed("g", "g"), from_values(vec![42]), &config)
                .unwrap(),
        );
        assert_eq!(nodes.exit(root, false).unwrap(), expected);
    }
    assert_eq!(served, vec![42, 42]);
}

#[test]
fn test_empty_generator_is_an_error() {
    let mut nodes = tree();
    nodes.enter(nodes.root()).unwrap();
    let err = nodes
        .acquire(
            NodeId::keyed("none", "none"),
            from_values(Vec::<u8>::new()),
            &RunnerConfig::default(),
        )
        .unwrap_err();
    assert_eq!(
        err,
        RepriseError::EmptyGenerator {
            name: "none".to_string()
        }
    );
}

#[test]
fn test_same_call_site_nests_generators() {
    let mut nodes = tree();
    let config = RunnerConfig::default();
    nodes.enter(nodes.root()).unwrap();
    for _ in 0..3 {
        nodes
            .acquire(NodeId::keyed("g", "loop"), from_values(vec![1, 2]), &config)
            .unwrap();
    }
    assert_eq!(nodes.node_count(), 4);
    assert_eq!(nodes.ancestors(nodes.current()).count(), 4);
}
