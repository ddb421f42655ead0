//! Search tree node.
//!
//! Nodes live in the tree's arena and refer to each other by `NodeId`, so a
//! parent link never keeps anything alive and dropping a subtree is just a
//! matter of not copying it.

use crate::utils::Reward;

/// Index into the node arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(pub u32);

impl NodeId {
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// How far a node's children have been materialized.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Expansion { Unexpanded, Partial, Full }

#[derive(Debug, Clone)]
pub struct Node<A> {
    /// Move that led here from the parent's position. Only a root nothing led to has none
    pub action: Option<A>,

    /// Back link (None for the root)
    pub parent: Option<NodeId>,

    pub children: Vec<NodeId>,

    pub visits: u32,

    /// Sum of results, each from the point of view of the player who made `action`
    pub win_sum: Reward,

    /// Every legal move from this position has a child with at least one visit
    pub fully_expanded: bool,

    /// Fixed result when `action` ended the game
    pub terminal: Option<Reward>,
}

impl<A> Node<A> {
    pub fn root(action: Option<A>) -> Self {
        Node {
            action,
            parent: None,
            children: vec![],
            visits: 0,
            win_sum: 0.0,
            fully_expanded: false,
            terminal: None,
        }
    }

    pub fn child(parent: NodeId, action: A) -> Self {
        Node { parent: Some(parent), ..Node::root(Some(action)) }
    }

    #[inline]
    pub fn is_terminal(&self) -> bool {
        self.terminal.is_some()
    }

    pub fn expansion(&self) -> Expansion {
        if self.fully_expanded {
            Expansion::Full
        } else if self.children.is_empty() {
            Expansion::Unexpanded
        } else {
            Expansion::Partial
        }
    }

    pub fn win_rate(&self) -> Reward {
        if self.visits == 0 { 0.0 } else { self.win_sum / self.visits as Reward }
    }

    /// UCB1 without the tie-break noise. Only meaningful once the node has been visited
    #[inline]
    pub fn ucb1(&self, ln_parent_visits: f64, exploration: f64) -> f64 {
        debug_assert!(self.visits > 0);
        let n = self.visits as f64;
        self.win_sum / n + exploration * (ln_parent_visits / n).sqrt()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn child_links_to_parent() {
        let node = Node::child(NodeId(3), 'a');
        assert_eq!(node.parent, Some(NodeId(3)));
        assert_eq!(node.action, Some('a'));
        assert_eq!(node.expansion(), Expansion::Unexpanded);
        assert!(!node.is_terminal());
    }

    #[test]
    fn ucb1_rewards_rare_children() {
        let mut often = Node::root(Some(0));
        often.visits = 90;
        often.win_sum = 45.0;
        let mut rarely = Node::root(Some(1));
        rarely.visits = 10;
        rarely.win_sum = 5.0;
        let ln_n = (100f64).ln();
        assert!(rarely.ucb1(ln_n, 1.4) > often.ucb1(ln_n, 1.4));
        assert_eq!(often.ucb1(ln_n, 0.0), 0.5);
        assert_eq!(rarely.win_rate(), 0.5);
    }
}
