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

//! The execution tree.
//!
//! [`ExecutionNodes`] owns every node of one test in an arena and keeps a
//! cursor on the node the test body is currently inside. Section and
//! generator call sites resolve their node relative to that cursor, so the
//! same call site reached through the same path maps to the same node on
//! every pass.
//!
//! # Exit algorithm
//!
//! Exiting a node marks its parent as done for this level, closes any child
//! still open, then decides how far exploration got:
//!
//! 1. some child still has work left: the node waits on its children
//! 2. a child ran this pass and a sibling has not run yet: the node waits on
//!    its children
//! 3. otherwise the node advances to its next repetition, resetting its
//!    children; once out of repetitions it is completed (or exited early)

use crate::config::RunnerConfig;
use crate::error::{RepriseError, RepriseResult};
use crate::generator::{DynGenerator, Generator, GeneratorNode};
use crate::identity::NodeId;
use crate::node::{ExecutionNode, NodeIndex, NodeKind, NodeState};
use crate::random::RandomNumberGenerator;
use tracing::trace;

const ROOT: NodeIndex = NodeIndex(0);

/// States of the nodes entered during a failing pass, captured while a shrink
/// search replays that pass.
#[derive(Debug)]
pub(crate) struct FrozenPass {
    saved: Vec<(NodeIndex, NodeState)>,
    cursor: NodeIndex,
}

/// Arena of execution nodes with a cursor.
#[derive(Debug)]
pub struct ExecutionNodes {
    nodes: Vec<ExecutionNode>,
    current: NodeIndex,
    trail: Vec<NodeIndex>,
    replaying: bool,
    replayed: Vec<NodeIndex>,
}

impl ExecutionNodes {
    /// Create a tree whose root carries the test's identity.
    pub fn new(root: NodeId) -> Self {
        ExecutionNodes {
            nodes: vec![ExecutionNode::new(root, None, NodeKind::Section)],
            current: ROOT,
            trail: Vec::new(),
            replaying: false,
            replayed: Vec::new(),
        }
    }

    /// The root node.
    pub fn root(&self) -> NodeIndex {
        ROOT
    }

    /// The node the test body is currently inside.
    pub fn current(&self) -> NodeIndex {
        self.current
    }

    /// Number of nodes, root included.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Node at `index`, if it belongs to this tree.
    pub fn get(&self, index: NodeIndex) -> Option<&ExecutionNode> {
        self.nodes.get(index.0)
    }

    /// Node at `index`.
    ///
    /// # Errors
    ///
    /// Returns [`RepriseError::UnknownNode`] for an index outside this tree.
    pub fn node(&self, index: NodeIndex) -> RepriseResult<&ExecutionNode> {
        self.nodes.get(index.0).ok_or(RepriseError::UnknownNode(index.0))
    }

    /// State of the node at `index`.
    pub fn state(&self, index: NodeIndex) -> RepriseResult<NodeState> {
        self.node(index).map(ExecutionNode::state)
    }

    /// All nodes in creation order.
    pub fn iter(&self) -> impl Iterator<Item = (NodeIndex, &ExecutionNode)> {
        self.nodes
            .iter()
            .enumerate()
            .map(|(i, node)| (NodeIndex(i), node))
    }

    /// True while a shrink search replays a frozen pass.
    pub fn is_replaying(&self) -> bool {
        self.replaying
    }

    /// `index` followed by each of its ancestors up to the root.
    pub fn ancestors(&self, index: NodeIndex) -> impl Iterator<Item = NodeIndex> + '_ {
        let start = self.get(index).map(|_| index);
        std::iter::successors(start, move |i| self.nodes[i.0].parent)
    }

    // ==================== Resolution ====================

    /// Find the child of the cursor created by the same call site.
    ///
    /// # Errors
    ///
    /// Returns [`RepriseError::IdentityCollision`] if the call site matches
    /// but reports a different name.
    pub fn find_node(&self, id: &NodeId) -> RepriseResult<Option<NodeIndex>> {
        for &child in &self.nodes[self.current.0].children {
            let node = &self.nodes[child.0];
            if node.id == *id {
                if node.id.name() != id.name() {
                    return Err(collision(node, id, node.kind_label()));
                }
                return Ok(Some(child));
            }
        }
        Ok(None)
    }

    /// Append a new child to the cursor.
    pub fn add_node(&mut self, id: NodeId, kind: NodeKind) -> NodeIndex {
        let index = NodeIndex(self.nodes.len());
        trace!("discovered {:?} {} under node {}", kind, id, self.current.0);
        self.nodes.push(ExecutionNode::new(id, Some(self.current), kind));
        self.nodes[self.current.0].children.push(index);
        index
    }

    /// Resolve `id` against the cursor, creating the node with `make` on
    /// first sight.
    pub fn find_or_create<F>(&mut self, id: NodeId, make: F) -> RepriseResult<NodeIndex>
    where
        F: FnOnce(&NodeId) -> RepriseResult<NodeKind>,
    {
        match self.find_node(&id)? {
            Some(index) => Ok(index),
            None => {
                let kind = make(&id)?;
                Ok(self.add_node(id, kind))
            }
        }
    }

    /// Whether a resolved section should run in this pass: not when it is
    /// already completed, and not when a sibling already ran at this level.
    pub fn should_enter(&self, index: NodeIndex) -> RepriseResult<bool> {
        let node = self.node(index)?;
        if node.state == NodeState::Completed {
            return Ok(false);
        }
        Ok(match node.parent {
            Some(parent) => self.nodes[parent.0].state != NodeState::EnteredButDoneForThisLevel,
            None => true,
        })
    }

    // ==================== State machine ====================

    /// Enter the node and make it the cursor.
    ///
    /// # Errors
    ///
    /// Returns [`RepriseError::InvalidTransition`] if the node is open,
    /// completed or frozen.
    pub fn enter(&mut self, index: NodeIndex) -> RepriseResult<()> {
        let node = self.node(index)?;
        if node.state.is_open() || matches!(node.state, NodeState::Completed | NodeState::Frozen) {
            return Err(RepriseError::invalid_transition(node.name(), "enter", node.state));
        }
        trace!("enter {}", node.id);
        self.nodes[index.0].state = NodeState::Entered;
        self.current = index;
        if index == ROOT {
            self.trail.clear();
        }
        self.trail.push(index);
        Ok(())
    }

    /// Exit the node, closing any child still open, and return its new state.
    ///
    /// `early` marks an exit caused by an interruption; an exhausted node then
    /// ends in [`NodeState::ExitedEarly`] instead of
    /// [`NodeState::Completed`]. The parent folds that back into completed
    /// when it exits, after taking one more pass for an early-exited section
    /// so the rest of its level runs without it.
    ///
    /// # Errors
    ///
    /// Returns [`RepriseError::InvalidTransition`] if the node, or its parent,
    /// is not open.
    pub fn exit(&mut self, index: NodeIndex, early: bool) -> RepriseResult<NodeState> {
        let node = self.node(index)?;
        if !node.state.is_open() {
            return Err(RepriseError::invalid_transition(node.name(), "exit", node.state));
        }
        let parent = node.parent;
        if let Some(parent) = parent {
            let parent_node = &mut self.nodes[parent.0];
            if !parent_node.state.is_open() {
                return Err(RepriseError::invalid_transition(
                    parent_node.name(),
                    "exit a child of",
                    parent_node.state,
                ));
            }
            parent_node.state = NodeState::EnteredButDoneForThisLevel;
        }

        let mut incomplete = false;
        let mut all_complete = true;
        for position in 0..self.nodes[index.0].children.len() {
            let child = self.nodes[index.0].children[position];
            if self.nodes[child.0].state.is_open() {
                self.exit(child, false)?;
            }
            let child_node = &mut self.nodes[child.0];
            match child_node.state {
                NodeState::Completed => {}
                NodeState::NotEntered => all_complete = false,
                // an exhausted generator has no value left to serve another pass
                NodeState::ExitedEarly if child_node.kind.is_generator() => {}
                NodeState::ExitedEarly => incomplete = true,
                _ => {
                    incomplete = true;
                    all_complete = false;
                }
            }
            if child_node.state == NodeState::ExitedEarly {
                child_node.state = NodeState::Completed;
            }
        }
        if let Some(parent) = parent {
            self.current = parent;
        }

        let done_for_level = self.nodes[index.0].state == NodeState::EnteredButDoneForThisLevel;
        let state = if incomplete || (done_for_level && !all_complete) {
            NodeState::HasIncompleteChildren
        } else {
            let exhausted = self.nodes[index.0].move_next();
            self.reset_children_at(index);
            match (exhausted, early) {
                (false, _) => NodeState::Incomplete,
                (true, true) => NodeState::ExitedEarly,
                (true, false) => NodeState::Completed,
            }
        };
        self.nodes[index.0].state = state;
        trace!("exit {} -> {}", self.nodes[index.0].id, state);
        Ok(state)
    }

    /// Return the node and its descendants to their initial state.
    pub fn reset(&mut self, index: NodeIndex) -> RepriseResult<()> {
        self.node(index)?;
        self.reset_at(index);
        Ok(())
    }

    /// Return every descendant of the node to its initial state.
    pub fn reset_children(&mut self, index: NodeIndex) -> RepriseResult<()> {
        self.node(index)?;
        self.reset_children_at(index);
        Ok(())
    }

    fn reset_at(&mut self, index: NodeIndex) {
        let node = &mut self.nodes[index.0];
        if node.state != NodeState::NotEntered {
            node.state = NodeState::NotEntered;
            node.move_first();
            self.reset_children_at(index);
        }
    }

    fn reset_children_at(&mut self, index: NodeIndex) {
        for position in 0..self.nodes[index.0].children.len() {
            let child = self.nodes[index.0].children[position];
            self.reset_at(child);
        }
    }

    /// Pin the node and return the state it had.
    pub fn freeze(&mut self, index: NodeIndex) -> RepriseResult<NodeState> {
        self.node(index)?;
        let node = &mut self.nodes[index.0];
        let previous = node.state;
        node.state = NodeState::Frozen;
        Ok(previous)
    }

    /// Restore a frozen node to the state [`freeze`](Self::freeze) returned.
    ///
    /// # Errors
    ///
    /// Returns [`RepriseError::InvalidTransition`] if the node is not frozen.
    pub fn unfreeze(&mut self, index: NodeIndex, previous: NodeState) -> RepriseResult<()> {
        let node = self.node(index)?;
        if node.state != NodeState::Frozen {
            return Err(RepriseError::invalid_transition(node.name(), "unfreeze", node.state));
        }
        self.nodes[index.0].state = previous;
        Ok(())
    }

    /// Exit every open node from the cursor up to, but not including, the
    /// root, as early exits.
    pub fn unwind(&mut self) -> RepriseResult<()> {
        while self.current != ROOT {
            let index = self.current;
            let node = &self.nodes[index.0];
            if node.state.is_open() {
                self.exit(index, true)?;
            } else {
                self.current = node.parent.unwrap_or(ROOT);
            }
        }
        Ok(())
    }

    // ==================== Call sites ====================

    /// Resolve a section call site and enter it if it should run this pass.
    ///
    /// Returns the entered node, or `None` when the section is skipped.
    ///
    /// # Errors
    ///
    /// Returns [`RepriseError::IdentityCollision`] when the call site belongs
    /// to a generator, reports another name, or resolves to a section that
    /// is already open.
    pub fn try_enter_section(&mut self, id: NodeId) -> RepriseResult<Option<NodeIndex>> {
        let index = match self.find_node(&id)? {
            Some(index) => {
                let node = &self.nodes[index.0];
                if node.kind.is_generator() || node.state.is_open() {
                    return Err(collision(node, &id, "section"));
                }
                index
            }
            None => self.add_node(id, NodeKind::Section),
        };

        if self.replaying {
            // a frozen section runs once per replay, like it did in the failing pass
            if self.nodes[index.0].state == NodeState::Frozen && !self.replayed.contains(&index) {
                self.replayed.push(index);
                self.current = index;
                return Ok(Some(index));
            }
            return Ok(None);
        }

        if !self.should_enter(index)? {
            return Ok(None);
        }
        self.enter(index)?;
        Ok(Some(index))
    }

    /// Leave a section entered by [`try_enter_section`](Self::try_enter_section).
    pub fn leave_section(&mut self, index: NodeIndex, early: bool) -> RepriseResult<()> {
        if self.replaying {
            self.current = self.node(index)?.parent.unwrap_or(ROOT);
            return Ok(());
        }
        self.exit(index, early).map(|_| ())
    }

    /// Resolve a generator call site, enter its node and return its value.
    ///
    /// The generator is only used when the node is created; later passes
    /// keep the state of the first one.
    ///
    /// # Errors
    ///
    /// Returns [`RepriseError::IdentityCollision`] when the call site belongs
    /// to a section or a generator of another type, or is already open, and
    /// [`RepriseError::EmptyGenerator`] for a generator without values.
    pub fn acquire<G: Generator>(
        &mut self,
        id: NodeId,
        generator: G,
        config: &RunnerConfig,
    ) -> RepriseResult<G::Value> {
        let index = match self.find_node(&id)? {
            Some(index) => {
                let node = &self.nodes[index.0];
                if !node.kind.is_generator() || node.state.is_open() {
                    return Err(collision(node, &id, "generator"));
                }
                index
            }
            None => {
                let rng = RandomNumberGenerator::derived(config.seed, id.call_site());
                let node = GeneratorNode::new(
                    id.name(),
                    generator,
                    rng,
                    config.default_repetitions,
                    config.tried_cache_capacity,
                )?;
                self.add_node(id.clone(), NodeKind::Generator(Box::new(node)))
            }
        };

        if self.replaying {
            let frozen = self.nodes[index.0].state == NodeState::Frozen;
            self.current = index;
            let typed = self.typed::<G>(index, &id)?;
            return Ok(if frozen {
                typed.served_value().clone()
            } else {
                typed.current_value().clone()
            });
        }

        self.typed::<G>(index, &id)?;
        if self.nodes[index.0].state == NodeState::Completed {
            self.reset_at(index);
        }
        self.enter(index)?;
        self.typed_mut::<G>(index)
            .map(GeneratorNode::serve)
            .ok_or(RepriseError::UnknownNode(index.0))
    }

    fn typed<G: Generator>(
        &self,
        index: NodeIndex,
        id: &NodeId,
    ) -> RepriseResult<&GeneratorNode<G>> {
        let node = &self.nodes[index.0];
        node.generator()
            .and_then(|g| g.as_any().downcast_ref::<GeneratorNode<G>>())
            .ok_or_else(|| collision(node, id, "generator"))
    }

    fn typed_mut<G: Generator>(&mut self, index: NodeIndex) -> Option<&mut GeneratorNode<G>> {
        self.nodes[index.0]
            .generator_mut()
            .and_then(|g| g.as_any_mut().downcast_mut::<GeneratorNode<G>>())
    }

    // ==================== Shrinking support ====================

    /// Generator nodes on the path from `leaf` to the root that can shrink
    /// their served value, innermost first.
    pub fn shrinkable_chain(&self, leaf: NodeIndex) -> Vec<NodeIndex> {
        self.ancestors(leaf)
            .filter(|i| self.nodes[i.0].is_shrinkable())
            .collect()
    }

    pub(crate) fn generator_at(
        &mut self,
        index: NodeIndex,
    ) -> Option<&mut (dyn DynGenerator + 'static)> {
        self.nodes.get_mut(index.0).and_then(ExecutionNode::generator_mut)
    }

    /// Freeze every node entered in the current pass and switch to replay.
    pub(crate) fn freeze_pass(&mut self) -> FrozenPass {
        let cursor = self.current;
        let trail = std::mem::take(&mut self.trail);
        let mut saved = Vec::with_capacity(trail.len());
        for &index in &trail {
            let node = &mut self.nodes[index.0];
            if node.state != NodeState::Frozen {
                saved.push((index, node.state));
                node.state = NodeState::Frozen;
            }
        }
        self.trail = trail;
        self.replaying = true;
        FrozenPass { saved, cursor }
    }

    /// Position the cursor for another replay of the frozen pass.
    pub(crate) fn begin_replay(&mut self) {
        self.current = ROOT;
        self.replayed.clear();
    }

    /// Restore the states captured by [`freeze_pass`](Self::freeze_pass).
    pub(crate) fn thaw(&mut self, frozen: FrozenPass) {
        for (index, previous) in frozen.saved.into_iter().rev() {
            self.nodes[index.0].state = previous;
        }
        self.current = frozen.cursor;
        self.replaying = false;
        self.replayed.clear();
    }
}

fn collision(node: &ExecutionNode, id: &NodeId, requested_kind: &str) -> RepriseError {
    RepriseError::IdentityCollision {
        call_site: id.call_site().to_string(),
        existing: format!("{} '{}'", node.kind_label(), node.name()),
        requested: format!("{} '{}'", requested_kind, id.name()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generator::from_values;

    fn tree() -> ExecutionNodes {
        ExecutionNodes::new(NodeId::keyed("test", "root"))
    }

    // ==================== Resolution tests ====================

    #[test]
    fn test_find_node_relative_to_cursor() {
        let mut nodes = tree();
        let id = NodeId::keyed("a", "a");
        assert_eq!(nodes.find_node(&id).unwrap(), None);
        let a = nodes.add_node(id.clone(), NodeKind::Section);
        assert_eq!(nodes.find_node(&id).unwrap(), Some(a));
        nodes.enter(nodes.root()).unwrap();
        nodes.enter(a).unwrap();
        assert_eq!(nodes.find_node(&id).unwrap(), None);
    }

    #[test]
    fn test_find_node_detects_renamed_call_site() {
        let mut nodes = tree();
        nodes.add_node(NodeId::keyed("a", "site"), NodeKind::Section);
        let err = nodes.find_node(&NodeId::keyed("b", "site")).unwrap_err();
        assert!(matches!(err, RepriseError::IdentityCollision { .. }));
    }

    #[test]
    fn test_find_or_create_only_makes_once() {
        let mut nodes = tree();
        let mut made = 0;
        for _ in 0..3 {
            nodes
                .find_or_create(NodeId::keyed("s", "s"), |_| {
                    made += 1;
                    Ok(NodeKind::Section)
                })
                .unwrap();
        }
        assert_eq!(made, 1);
        assert_eq!(nodes.node_count(), 2);
    }

    // ==================== Transition tests ====================

    #[test]
    fn test_enter_twice_is_rejected() {
        let mut nodes = tree();
        let root = nodes.root();
        nodes.enter(root).unwrap();
        let err = nodes.enter(root).unwrap_err();
        assert!(matches!(err, RepriseError::InvalidTransition { action: "enter", .. }));
    }

    #[test]
    fn test_exit_without_enter_is_rejected() {
        let mut nodes = tree();
        let err = nodes.exit(nodes.root(), false).unwrap_err();
        assert!(matches!(
            err,
            RepriseError::InvalidTransition {
                state: NodeState::NotEntered,
                ..
            }
        ));
    }

    #[test]
    fn test_enter_completed_is_rejected() {
        let mut nodes = tree();
        let root = nodes.root();
        nodes.enter(root).unwrap();
        assert_eq!(nodes.exit(root, false).unwrap(), NodeState::Completed);
        assert!(nodes.enter(root).is_err());
        nodes.reset(root).unwrap();
        assert!(nodes.enter(root).is_ok());
    }

    #[test]
    fn test_freeze_round_trip() {
        let mut nodes = tree();
        let root = nodes.root();
        nodes.enter(root).unwrap();
        let previous = nodes.freeze(root).unwrap();
        assert_eq!(previous, NodeState::Entered);
        assert_eq!(nodes.state(root).unwrap(), NodeState::Frozen);
        assert!(nodes.enter(root).is_err());
        nodes.unfreeze(root, previous).unwrap();
        assert_eq!(nodes.state(root).unwrap(), NodeState::Entered);
        assert!(nodes.unfreeze(root, previous).is_err());
    }

    #[test]
    fn test_unknown_index() {
        let nodes = tree();
        assert_eq!(
            nodes.state(NodeIndex(9)).unwrap_err(),
            RepriseError::UnknownNode(9)
        );
        assert_eq!(nodes.ancestors(NodeIndex(9)).count(), 0);
    }

    // ==================== Section tests ====================

    #[test]
    fn test_section_kind_collision() {
        let mut nodes = tree();
        let config = RunnerConfig::default();
        nodes.enter(nodes.root()).unwrap();
        nodes
            .acquire(NodeId::keyed("g", "site"), from_values(vec![1]), &config)
            .unwrap();
        nodes.exit(nodes.current(), false).unwrap();
        let err = nodes.try_enter_section(NodeId::keyed("g", "site")).unwrap_err();
        assert!(matches!(err, RepriseError::IdentityCollision { .. }));
    }

    #[test]
    fn test_generator_type_collision() {
        let mut nodes = tree();
        let config = RunnerConfig::default();
        nodes.enter(nodes.root()).unwrap();
        nodes
            .acquire(NodeId::keyed("g", "site"), from_values(vec![1u8]), &config)
            .unwrap();
        nodes.exit(nodes.current(), false).unwrap();
        let err = nodes
            .acquire(NodeId::keyed("g", "site"), from_values(vec!["x"]), &config)
            .unwrap_err();
        assert!(matches!(err, RepriseError::IdentityCollision { .. }));
    }

    #[test]
    fn test_unwind_marks_early_exit() {
        let mut nodes = tree();
        let root = nodes.root();
        nodes.enter(root).unwrap();
        let a = nodes.try_enter_section(NodeId::keyed("a", "a")).unwrap().unwrap();
        let b = nodes.try_enter_section(NodeId::keyed("b", "b")).unwrap().unwrap();
        nodes.unwind().unwrap();
        assert_eq!(nodes.current(), root);
        // b exited early, so a needs one more pass without it
        assert_eq!(nodes.state(b).unwrap(), NodeState::Completed);
        assert_eq!(nodes.state(a).unwrap(), NodeState::HasIncompleteChildren);
        assert_eq!(nodes.exit(root, false).unwrap(), NodeState::HasIncompleteChildren);

        nodes.enter(root).unwrap();
        assert_eq!(nodes.try_enter_section(NodeId::keyed("a", "a")).unwrap(), Some(a));
        assert_eq!(nodes.try_enter_section(NodeId::keyed("b", "b")).unwrap(), None);
        nodes.leave_section(a, false).unwrap();
        assert_eq!(nodes.exit(root, false).unwrap(), NodeState::Completed);
    }
}
