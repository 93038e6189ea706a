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

//! Execution nodes and their states.

use crate::generator::DynGenerator;
use crate::identity::NodeId;
use std::fmt;

/// Exploration state of one execution node.
///
/// ```text
/// NotEntered ──enter──▶ Entered ──child exits──▶ EnteredButDoneForThisLevel
///      ▲                   │                              │
///      │                   └────────────exit──────────────┘
///    reset                               │
///      │            ┌────────────────────┼────────────────────┐
///      │            ▼                    ▼                    ▼
///      └── HasIncompleteChildren     Incomplete      Completed / ExitedEarly
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum NodeState {
    /// Not entered since the last reset
    NotEntered,
    /// Entered in the current pass; the body is inside it
    Entered,
    /// Entered, and one of its children already ran in this pass, so further
    /// siblings must wait for a later pass
    EnteredButDoneForThisLevel,
    /// Exited with descendants still left to explore
    HasIncompleteChildren,
    /// Exited with further repetitions of its own left
    Incomplete,
    /// Exhausted, but the last pass left through an interruption
    ExitedEarly,
    /// Pinned while a shrink search replays the failing pass
    Frozen,
    /// Fully explored
    Completed,
}

impl NodeState {
    /// True for states a node can only be in between `enter` and `exit`.
    pub fn is_open(self) -> bool {
        matches!(self, NodeState::Entered | NodeState::EnteredButDoneForThisLevel)
    }
}

impl fmt::Display for NodeState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NodeState::NotEntered => write!(f, "not entered"),
            NodeState::Entered => write!(f, "entered"),
            NodeState::EnteredButDoneForThisLevel => write!(f, "entered (done for this level)"),
            NodeState::HasIncompleteChildren => write!(f, "waiting on children"),
            NodeState::Incomplete => write!(f, "incomplete"),
            NodeState::ExitedEarly => write!(f, "exited early"),
            NodeState::Frozen => write!(f, "frozen"),
            NodeState::Completed => write!(f, "completed"),
        }
    }
}

/// Position of a node in its [`ExecutionNodes`](crate::ExecutionNodes) arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeIndex(pub(crate) usize);

impl NodeIndex {
    /// Raw arena slot.
    pub fn get(self) -> usize {
        self.0
    }
}

/// What a node does besides tracking its state.
pub enum NodeKind {
    /// A named section: runs once per exploration of its parent
    Section,
    /// A generator: runs once per generated value
    Generator(Box<dyn DynGenerator>),
}

impl NodeKind {
    /// True for generator nodes.
    pub fn is_generator(&self) -> bool {
        matches!(self, NodeKind::Generator(_))
    }

    fn label(&self) -> &'static str {
        match self {
            NodeKind::Section => "section",
            NodeKind::Generator(_) => "generator",
        }
    }
}

impl fmt::Debug for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One node of the execution tree.
#[derive(Debug)]
pub struct ExecutionNode {
    pub(crate) id: NodeId,
    pub(crate) parent: Option<NodeIndex>,
    pub(crate) children: Vec<NodeIndex>,
    pub(crate) state: NodeState,
    pub(crate) current_index: usize,
    pub(crate) size: usize,
    pub(crate) kind: NodeKind,
}

impl ExecutionNode {
    pub(crate) fn new(id: NodeId, parent: Option<NodeIndex>, kind: NodeKind) -> Self {
        let size = match &kind {
            NodeKind::Section => 1,
            NodeKind::Generator(generator) => generator.size(),
        };
        ExecutionNode {
            id,
            parent,
            children: Vec::new(),
            state: NodeState::NotEntered,
            current_index: 0,
            size,
            kind,
        }
    }

    /// Identity of the call site that created this node.
    pub fn id(&self) -> &NodeId {
        &self.id
    }

    /// Declared name.
    pub fn name(&self) -> &str {
        self.id.name()
    }

    /// Parent, `None` for the root.
    pub fn parent(&self) -> Option<NodeIndex> {
        self.parent
    }

    /// Children in discovery order.
    pub fn children(&self) -> &[NodeIndex] {
        &self.children
    }

    /// Current state.
    pub fn state(&self) -> NodeState {
        self.state
    }

    /// Repetition currently being explored.
    pub fn current_index(&self) -> usize {
        self.current_index
    }

    /// Number of repetitions: 1 for sections, the value count for generators.
    pub fn size(&self) -> usize {
        self.size
    }

    /// Section or generator.
    pub fn kind(&self) -> &NodeKind {
        &self.kind
    }

    /// Type-erased generator state, if this is a generator node.
    pub fn generator(&self) -> Option<&dyn DynGenerator> {
        match &self.kind {
            NodeKind::Generator(generator) => Some(generator.as_ref()),
            NodeKind::Section => None,
        }
    }

    pub(crate) fn generator_mut(&mut self) -> Option<&mut (dyn DynGenerator + 'static)> {
        match &mut self.kind {
            NodeKind::Generator(generator) => Some(generator.as_mut()),
            NodeKind::Section => None,
        }
    }

    /// Whether a shrink search could start from this node.
    pub fn is_shrinkable(&self) -> bool {
        self.generator().map_or(false, |g| g.is_shrinkable())
    }

    /// Advance to the next repetition. Returns true when exhausted.
    pub(crate) fn move_next(&mut self) -> bool {
        self.current_index += 1;
        if self.current_index >= self.size {
            self.current_index = self.size;
            return true;
        }
        let index = self.current_index;
        if let Some(generator) = self.generator_mut() {
            generator.move_to(index);
        }
        false
    }

    /// Rewind to the first repetition.
    pub(crate) fn move_first(&mut self) {
        self.current_index = 0;
        if let Some(generator) = self.generator_mut() {
            generator.move_first();
        }
    }

    pub(crate) fn kind_label(&self) -> &'static str {
        self.kind.label()
    }
}
