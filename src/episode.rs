//! Episode tree for attributing hand-level rewards back to decisions.
//!
//! One episode covers everything that follows from a single opening bet.
//! Nodes live in an arena and refer to each other by index:
//!
//!   - a node is created for every call to the policy on behalf of one hand;
//!   - asking again for the same hand appends one child (`Continued`);
//!   - a split gives the acting node two placeholder children (`Split`),
//!     which are claimed in FIFO order, matching the order the table plays
//!     split hands;
//!   - a hand's outcome lands on the hand's current leaf (`Resolved`).
//!
//! A node's credited reward is its own reward plus the credited reward of
//! every descendant, so the decision to split is credited with the sum of
//! both resulting hands. The root may also carry an insurance overlay: the
//! credit owed to the insurance decision, which replaces the subtree sum for
//! the root alone.

use std::collections::VecDeque;

use crate::buffers::TrainingBuffers;
use crate::error::{BlackjackError, BlackjackResult};
use crate::policy::{Decision, StateVector};

pub type NodeId = usize;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeStatus {
    /// Awaiting a decision or an outcome.
    Open,
    /// The hand was asked again; exactly one child holds the next decision.
    Continued,
    /// The hand split; exactly two children hold the resulting hands.
    Split,
    /// Leaf with a terminal reward.
    Resolved,
}

/// What the policy saw and answered at one decision point.
#[derive(Debug, Clone, PartialEq)]
pub struct Recorded {
    pub state: StateVector,
    pub probabilities: Vec<f64>,
    pub action: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    /// `None` for a split placeholder that has not been played yet.
    pub decision: Option<Recorded>,
    pub reward: f64,
    pub insurance: Option<f64>,
    pub parent: Option<NodeId>,
    pub children: Vec<NodeId>,
    pub status: NodeStatus,
}

impl Node {
    fn placeholder(parent: Option<NodeId>) -> Node {
        Node {
            decision: None,
            reward: 0.0,
            insurance: None,
            parent,
            children: Vec::new(),
            status: NodeStatus::Open,
        }
    }

    pub fn is_placeholder(&self) -> bool {
        match &self.decision {
            None => true,
            Some(recorded) => recorded.state.iter().all(|&v| v == 0),
        }
    }
}

const ROOT: NodeId = 0;

#[derive(Debug, Clone)]
pub struct EpisodeTree {
    nodes: Vec<Node>,
    pending: VecDeque<NodeId>,
}

impl Default for EpisodeTree {
    fn default() -> Self {
        EpisodeTree::new()
    }
}

impl EpisodeTree {
    pub fn new() -> EpisodeTree {
        EpisodeTree {
            nodes: vec![Node::placeholder(None)],
            pending: VecDeque::new(),
        }
    }

    pub fn root(&self) -> NodeId {
        ROOT
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// True while nothing has happened in this episode.
    pub fn is_empty(&self) -> bool {
        self.nodes.len() == 1
            && self.nodes[ROOT].decision.is_none()
            && self.nodes[ROOT].status == NodeStatus::Open
            && self.nodes[ROOT].insurance.is_none()
    }

    pub fn node(&self, id: NodeId) -> BlackjackResult<&Node> {
        self.nodes
            .get(id)
            .ok_or_else(|| violation(format!("node {} does not exist", id)))
    }

    fn node_mut(&mut self, id: NodeId) -> BlackjackResult<&mut Node> {
        self.nodes
            .get_mut(id)
            .ok_or_else(|| violation(format!("node {} does not exist", id)))
    }

    /// Split placeholders still waiting to be played, front first.
    pub fn pending(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.pending.iter().copied()
    }

    fn require_open(&self, id: NodeId) -> BlackjackResult<&Node> {
        let node = self.node(id)?;
        if node.status != NodeStatus::Open {
            return Err(violation(format!("node {} is {:?}, not open", id, node.status)));
        }
        Ok(node)
    }

    /// Claim a split placeholder. Placeholders must be claimed in the order
    /// their splits created them.
    fn claim(&mut self, id: NodeId) -> BlackjackResult<()> {
        if !self.pending.contains(&id) {
            return Ok(());
        }
        match self.pending.front() {
            Some(&front) if front == id => {
                self.pending.pop_front();
                Ok(())
            }
            Some(&front) => Err(violation(format!(
                "split hand {} played before pending split hand {}",
                id, front
            ))),
            None => Ok(()),
        }
    }

    /// Record a policy decision for the hand whose current node is `at`.
    ///
    /// Returns the node now holding the decision: `at` itself when it was
    /// still empty, otherwise a new child of `at`.
    pub fn record_decision(
        &mut self,
        at: NodeId,
        state: StateVector,
        decision: &Decision,
    ) -> BlackjackResult<NodeId> {
        let empty = self.require_open(at)?.decision.is_none();
        let recorded = Recorded {
            state,
            probabilities: decision.probabilities.clone(),
            action: decision.index,
        };
        if empty {
            self.claim(at)?;
            self.node_mut(at)?.decision = Some(recorded);
            return Ok(at);
        }
        let child = self.nodes.len();
        let mut node = Node::placeholder(Some(at));
        node.decision = Some(recorded);
        self.nodes.push(node);
        let parent = self.node_mut(at)?;
        parent.children.push(child);
        parent.status = NodeStatus::Continued;
        Ok(child)
    }

    /// Replace the action recorded at `at` with the one the table actually played.
    pub fn amend_action(&mut self, at: NodeId, action: usize) -> BlackjackResult<()> {
        self.require_open(at)?;
        match self.node_mut(at)?.decision.as_mut() {
            Some(recorded) => {
                recorded.action = action;
                Ok(())
            }
            None => Err(violation(format!("node {} amended without a decision", at))),
        }
    }

    /// Fork `at` into two placeholder children, one per split hand.
    pub fn split(&mut self, at: NodeId) -> BlackjackResult<[NodeId; 2]> {
        if self.require_open(at)?.decision.is_none() {
            return Err(violation(format!("node {} split without a decision", at)));
        }
        let left = self.nodes.len();
        let right = left + 1;
        self.nodes.push(Node::placeholder(Some(at)));
        self.nodes.push(Node::placeholder(Some(at)));
        let node = self.node_mut(at)?;
        node.children = vec![left, right];
        node.status = NodeStatus::Split;
        self.pending.push_back(left);
        self.pending.push_back(right);
        Ok([left, right])
    }

    /// Attach a hand's terminal reward to its current leaf.
    pub fn resolve(&mut self, at: NodeId, reward: f64) -> BlackjackResult<()> {
        self.require_open(at)?;
        self.claim(at)?;
        let node = self.node_mut(at)?;
        node.reward = reward;
        node.status = NodeStatus::Resolved;
        Ok(())
    }

    /// Attach the insurance overlay to the root.
    pub fn settle_insurance(&mut self, credit: f64) -> BlackjackResult<()> {
        let root = self.node_mut(ROOT)?;
        if root.insurance.is_some() {
            return Err(violation("insurance settled twice".to_string()));
        }
        root.insurance = Some(credit);
        Ok(())
    }

    pub fn open_leaves(&self) -> Vec<NodeId> {
        (0..self.nodes.len())
            .filter(|&id| self.nodes[id].status == NodeStatus::Open)
            .collect()
    }

    pub fn is_complete(&self) -> bool {
        self.open_leaves().is_empty()
    }

    fn check_shape(&self, id: NodeId, node: &Node) -> BlackjackResult<()> {
        let expected = match node.status {
            NodeStatus::Open | NodeStatus::Resolved => 0,
            NodeStatus::Continued => 1,
            NodeStatus::Split => 2,
        };
        if node.children.len() != expected {
            return Err(violation(format!(
                "{:?} node {} has {} children",
                node.status,
                id,
                node.children.len()
            )));
        }
        Ok(())
    }

    /// Credited reward of `id`: its own reward plus that of every descendant,
    /// or the insurance overlay when one is present.
    pub fn calc_reward(&self, id: NodeId) -> BlackjackResult<f64> {
        let mut total = 0.0;
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            let node = self.node(current)?;
            self.check_shape(current, node)?;
            if let Some(credit) = node.insurance {
                total += credit;
                continue;
            }
            total += node.reward;
            stack.extend(node.children.iter().copied());
        }
        Ok(total)
    }

    /// Drain a finished episode into `buffers` in depth-first order and start
    /// a fresh one. Returns how many decisions were emitted.
    pub fn flush(&mut self, buffers: &mut TrainingBuffers) -> BlackjackResult<usize> {
        if let Some(&open) = self.open_leaves().first() {
            return Err(violation(format!("flush with unresolved node {}", open)));
        }
        let mut emitted = Vec::new();
        let mut stack = vec![ROOT];
        while let Some(current) = stack.pop() {
            let node = self.node(current)?;
            if !node.is_placeholder() {
                if let Some(recorded) = &node.decision {
                    emitted.push((recorded.clone(), self.calc_reward(current)?));
                }
            }
            stack.extend(node.children.iter().rev().copied());
        }
        let count = emitted.len();
        for (recorded, reward) in emitted {
            buffers.push(recorded.state, recorded.probabilities, recorded.action, reward);
        }
        log::debug!("flushed episode: {} nodes, {} decisions", self.nodes.len(), count);
        *self = EpisodeTree::new();
        Ok(count)
    }
}

fn violation(message: String) -> BlackjackError {
    BlackjackError::InvariantViolation(message)
}
