//! AST types for the filter language.
//!
//! The parser builds a [`FilterTree`]: an arena of [`Node`]s addressed by
//! [`NodeId`]. Parentheses are kept as nodes, along with any closing
//! parenthesis that had nothing to close, so the tree can be written back out
//! faithfully and checked for balance by [`FilterTree::output`].

use super::value::{BoolCall, CheckOp, Operand, RelOp};
use std::fmt;

/// Index of a node inside its [`FilterTree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(usize);

impl NodeId {
    pub(crate) fn from_index(index: usize) -> Self {
        NodeId(index)
    }

    pub fn index(self) -> usize {
        self.0
    }
}

/// One node of the parsed expression.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    /// `TRUE` / `FALSE` used as a whole condition
    Bool(bool),

    /// `lhs op rhs`
    Compare {
        lhs: Operand,
        op: RelOp,
        rhs: Operand,
    },

    /// `operand IS NULL`, `operand EXISTS`, ...
    Check { operand: Operand, check: CheckOp },

    /// `REGEXP_CONTAINS(field, "pattern")`
    BoolCall(BoolCall),

    /// `NOT node`
    Not(NodeId),

    /// `a AND b AND ...`, at least two members
    And(Vec<NodeId>),

    /// `a OR b OR ...`, at least two members
    Or(Vec<NodeId>),

    /// `( node )`; `closed` is false when input ended before the `)`
    Paren { inner: NodeId, closed: bool },
}

/// A parsed filter expression.
#[derive(Debug, Clone, PartialEq)]
pub struct FilterTree {
    nodes: Vec<Node>,
    root: NodeId,
    /// Unmatched `)` markers, each recorded after the node it followed.
    stray_closers: Vec<NodeId>,
}

impl FilterTree {
    pub(crate) fn new(nodes: Vec<Node>, root: NodeId, stray_closers: Vec<NodeId>) -> Self {
        FilterTree {
            nodes,
            root,
            stray_closers,
        }
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }

    pub fn root_node(&self) -> &Node {
        self.node(self.root)
    }

    /// Every node of the tree, in arena order.
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn stray_closers(&self) -> &[NodeId] {
        &self.stray_closers
    }

    /// Children of a node, in source order.
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        match self.node(id) {
            Node::Not(inner) | Node::Paren { inner, .. } => std::slice::from_ref(inner),
            Node::And(members) | Node::Or(members) => members,
            _ => &[],
        }
    }

    /// Skip through any parentheses wrapping `id`.
    pub fn unparen(&self, mut id: NodeId) -> NodeId {
        while let Node::Paren { inner, .. } = self.node(id) {
            id = *inner;
        }
        id
    }

    fn write_node(&self, f: &mut fmt::Formatter<'_>, id: NodeId) -> fmt::Result {
        match self.node(id) {
            Node::Bool(true) => f.write_str("TRUE")?,
            Node::Bool(false) => f.write_str("FALSE")?,
            Node::Compare { lhs, op, rhs } => write!(f, "{lhs} {op} {rhs}")?,
            Node::Check { operand, check } => write!(f, "{operand} {check}")?,
            Node::BoolCall(call) => write!(f, "{call}")?,
            Node::Not(inner) => {
                f.write_str("NOT ")?;
                self.write_node(f, *inner)?;
            }
            Node::And(members) => self.write_joined(f, members, " AND ")?,
            Node::Or(members) => self.write_joined(f, members, " OR ")?,
            Node::Paren { inner, closed } => {
                f.write_str("(")?;
                self.write_node(f, *inner)?;
                if *closed {
                    f.write_str(")")?;
                }
            }
        }
        for _ in self.stray_closers.iter().filter(|closer| **closer == id) {
            f.write_str(")")?;
        }
        Ok(())
    }

    fn write_joined(&self, f: &mut fmt::Formatter<'_>, members: &[NodeId], sep: &str) -> fmt::Result {
        for (i, member) in members.iter().enumerate() {
            if i > 0 {
                f.write_str(sep)?;
            }
            self.write_node(f, *member)?;
        }
        Ok(())
    }
}

impl fmt::Display for FilterTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.write_node(f, self.root)
    }
}
