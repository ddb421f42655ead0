//! # Monte-Carlo Tree Search
//!
//! UCB1 selection, one-child-per-iteration expansion, uniform random rollouts
//! and zero-sum backpropagation. The tree is kept between moves: once a move
//! is committed the matching child becomes the new root and everything else
//! is dropped.

pub mod config;
pub mod node;

use std::collections::VecDeque;
use log::{debug, trace, warn};
use rand::rngs::StdRng;
use rand::seq::{IndexedRandom, SliceRandom};
use rand::{Rng, SeedableRng};
use crate::error::{Error, Result};
use crate::utils::*;
pub use config::SearchConfig;
pub use node::{Expansion, Node, NodeId};

/// Search tree over the moves of a `Game`, stored in an arena.
pub struct MoveTree<G: Game> {
    nodes: Vec<Node<G::Action>>,
    root: NodeId,
    config: SearchConfig,
    rng: StdRng,
}

impl<G: Game> MoveTree<G> {
    pub fn new(config: SearchConfig) -> Self {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        MoveTree { nodes: vec![Node::root(None)], root: NodeId(0), config, rng }
    }

    #[inline]
    pub fn root(&self) -> NodeId {
        self.root
    }

    #[inline]
    pub fn get(&self, id: NodeId) -> &Node<G::Action> {
        &self.nodes[id.index()]
    }

    #[inline]
    fn get_mut(&mut self, id: NodeId) -> &mut Node<G::Action> {
        &mut self.nodes[id.index()]
    }

    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    /// Number of live nodes
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn children(&self, id: NodeId) -> impl Iterator<Item = &Node<G::Action>> + '_ {
        self.get(id).children.iter().map(move |&child| self.get(child))
    }

    /// Drop everything and start again from an empty root
    pub fn reset(&mut self) {
        self.nodes = vec![Node::root(None)];
        self.root = NodeId(0);
    }

    /// Run the configured number of simulations from `game`, which must be the root's position
    pub fn search(&mut self, game: &G) -> Result<()> {
        for _ in 0..self.config.iterations {
            self.simulate(game)?;
        }
        let stats = self.stats();
        debug!("Searched {} iterations: {:?}", self.config.iterations, stats);
        Ok(())
    }

    /// One iteration: select, expand, evaluate, backpropagate. `game` is never modified
    pub fn simulate(&mut self, game: &G) -> Result<()> {
        let mut scratch = game.clone();

        // Selection
        let mut leaf = self.root;
        while self.get(leaf).expansion() == Expansion::Full && !self.get(leaf).is_terminal() {
            leaf = self.select_child(leaf);
            if let Some(action) = self.get(leaf).action.clone() {
                scratch.play(&action)?;
            }
        }

        let (evaluated, result) = match self.get(leaf).terminal {
            Some(value) => (leaf, value),
            None => {
                // Expansion
                let (action, legal) = self.untried_action(leaf, &scratch)?;
                scratch.play(&action)?;
                let child = self.attach(leaf, action, legal);

                // Evaluation, from the point of view of whoever just moved
                let mover = scratch.active_player().other();
                let result = match scratch.outcome() {
                    Some(outcome) => {
                        let value = outcome.reward(mover);
                        self.get_mut(child).terminal = Some(value);
                        value
                    }
                    None => self.rollout(&mut scratch)?,
                };
                (child, result)
            }
        };
        trace!("Simulation reached {:?} with result {}", self.get(evaluated).action, result);
        self.backpropagate(evaluated, result);
        Ok(())
    }

    /// Child with the highest UCB1 score. Every child of a fully expanded node has visits
    fn select_child(&mut self, id: NodeId) -> NodeId {
        let MoveTree { nodes, config, rng, .. } = self;
        let parent = &nodes[id.index()];
        let ln_visits = (parent.visits as f64).ln();
        let mut best = (f64::NEG_INFINITY, id);
        for &child in parent.children.iter() {
            let score = nodes[child.index()].ucb1(ln_visits, config.exploration)
                + config.tie_jitter * rng.random::<f64>();
            if score > best.0 {
                best = (score, child);
            }
        }
        best.1
    }

    /// A random legal move with no child yet, plus how many legal moves there are
    fn untried_action(&mut self, id: NodeId, scratch: &G) -> Result<(G::Action, usize)> {
        let mut actions = scratch.available_actions();
        if actions.is_empty() {
            return Err(Error::GameOver);
        }
        actions.shuffle(&mut self.rng);
        let legal = actions.len();
        let action = actions
            .into_iter()
            .find(|a| !self.children(id).any(|c| c.action.as_ref() == Some(a)))
            .ok_or_else(|| Error::TreeMismatch(format!("{} legal moves but every one already has a child", legal)))?;
        Ok((action, legal))
    }

    fn attach(&mut self, parent: NodeId, action: G::Action, legal: usize) -> NodeId {
        let child = NodeId(self.nodes.len() as u32);
        self.nodes.push(Node::child(parent, action));
        let node = self.get_mut(parent);
        node.children.push(child);
        if node.children.len() == legal {
            node.fully_expanded = true;
        }
        child
    }

    /// Uniform random playout to the end. Result is for the player who made the last move before it
    fn rollout(&mut self, scratch: &mut G) -> Result<Reward> {
        let mover = scratch.active_player().other();
        loop {
            if let Some(outcome) = scratch.outcome() {
                return Ok(outcome.reward(mover));
            }
            let actions = scratch.available_actions();
            let action = actions
                .choose(&mut self.rng)
                .ok_or_else(|| Error::IllegalAction("unfinished position with no legal moves".to_string()))?;
            scratch.play(action)?;
        }
    }

    /// Add `result` at `leaf` and walk up, flipping it every ply
    pub fn backpropagate(&mut self, leaf: NodeId, result: Reward) {
        let mut current = Some(leaf);
        let mut value = result;
        while let Some(id) = current {
            let node = self.get_mut(id);
            node.visits += 1;
            node.win_sum += value;
            value = 1.0 - value;
            current = node.parent;
        }
    }

    /// Most visited child of the root; ties go to the child expanded first
    pub fn best_child(&self) -> Result<NodeId> {
        let mut best: Option<NodeId> = None;
        for &child in self.get(self.root).children.iter() {
            if best.map_or(true, |b| self.get(child).visits > self.get(b).visits) {
                best = Some(child);
            }
        }
        best.ok_or(Error::NoSimulations)
    }

    pub fn best_move(&self) -> Result<G::Action> {
        let best = self.best_child()?;
        self.get(best)
            .action
            .clone()
            .ok_or_else(|| Error::TreeMismatch("root child without a move".to_string()))
    }

    /// Follow a committed move. Returns false when the tree had never seen it and had to start fresh
    pub fn reuse_subtree(&mut self, action: &G::Action) -> bool {
        let found = self
            .get(self.root)
            .children
            .iter()
            .copied()
            .find(|&c| self.get(c).action.as_ref() == Some(action));
        match found {
            Some(child) => {
                self.promote(child);
                true
            }
            None => {
                if self.get(self.root).children.is_empty() {
                    debug!("No subtree for {:?}, starting a fresh tree", action);
                } else {
                    warn!("Unexpected move {:?}, starting a fresh tree", action);
                }
                self.nodes = vec![Node::root(Some(action.clone()))];
                self.root = NodeId(0);
                false
            }
        }
    }

    /// Make `new_root` the root and copy its subtree into a fresh arena
    fn promote(&mut self, new_root: NodeId) {
        let mut old: Vec<Option<Node<G::Action>>> = std::mem::take(&mut self.nodes).into_iter().map(Some).collect();
        let mut nodes = Vec::new();
        let mut queue = VecDeque::from([(new_root, None)]);
        while let Some((old_id, parent)) = queue.pop_front() {
            let Some(mut node) = old[old_id.index()].take() else { continue };
            let new_id = NodeId(nodes.len() as u32);
            node.parent = parent;
            for child in std::mem::take(&mut node.children) {
                queue.push_back((child, Some(new_id)));
            }
            nodes.push(node);
            if let Some(p) = parent {
                let parent_node: &mut Node<G::Action> = &mut nodes[p.index()];
                parent_node.children.push(new_id);
            }
        }
        debug!("Kept {} of {} nodes", nodes.len(), old.len());
        self.nodes = nodes;
        self.root = NodeId(0);
    }

    /// Statistics about the tree for debugging.
    pub fn stats(&self) -> TreeStats {
        let root = self.get(self.root);
        let mut max_depth = 0;
        let mut stack = vec![(self.root, 0u32)];
        while let Some((id, depth)) = stack.pop() {
            max_depth = max_depth.max(depth);
            stack.extend(self.get(id).children.iter().map(|&c| (c, depth + 1)));
        }
        TreeStats {
            total_nodes: self.nodes.len(),
            root_visits: root.visits,
            root_children: root.children.len(),
            max_depth,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeStats {
    pub total_nodes: usize,
    pub root_visits: u32,
    pub root_children: usize,
    pub max_depth: u32,
}
