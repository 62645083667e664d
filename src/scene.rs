//! Scene tree arena
//!
//! Nodes live in a slot arena addressed by [`NodeRef`] handles; freed slots
//! are recycled through a free-list. Structural edits go through
//! [`SceneTree::append_child`] / [`SceneTree::remove_child`], which enforce
//! arity and acyclicity up front so the arena is never left half-mutated.
//! Every mutation raises a dirty flag that callers consume with
//! [`SceneTree::take_dirty`] to decide when to re-extract; the tree itself
//! never triggers extraction.

use glam::Vec3;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::types::{Node, NodeKind, NodeRef};

/// Errors raised by structural edits on a [`SceneTree`]
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TreeError {
    /// The factory does not know this tag
    #[error("unknown node tag: {0}")]
    UnknownTag(String),

    /// The handle points to no live node
    #[error("node reference {0:?} is not live")]
    DeadRef(NodeRef),

    /// The child is already attached somewhere
    #[error("node {0:?} already has a parent")]
    HasParent(NodeRef),

    /// The edge would make the child its own ancestor
    #[error("appending {child:?} under {parent:?} would create a cycle")]
    Cycle {
        /// Requested parent
        parent: NodeRef,
        /// Requested child
        child: NodeRef,
    },

    /// The parent's child slots are exhausted
    #[error("node {0:?} accepts at most {1} children")]
    ArityExceeded(NodeRef, usize),

    /// The named child is not attached to this parent
    #[error("{child:?} is not a child of {parent:?}")]
    NotAChild {
        /// Parent whose children were searched
        parent: NodeRef,
        /// The handle that was not found
        child: NodeRef,
    },
}

/// Arena of implicit-function nodes forming a forest with one designated root
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SceneTree {
    nodes: Vec<Option<Node>>,
    parents: Vec<Option<NodeRef>>,
    free: Vec<u32>,
    root: Option<NodeRef>,
    #[serde(skip)]
    dirty: bool,
}

impl SceneTree {
    /// Create an empty tree
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a fully-built node, returning its handle
    pub fn add(&mut self, node: Node) -> NodeRef {
        self.dirty = true;
        if let Some(slot) = self.free.pop() {
            self.nodes[slot as usize] = Some(node);
            self.parents[slot as usize] = None;
            NodeRef(slot)
        } else {
            self.nodes.push(Some(node));
            self.parents.push(None);
            NodeRef(self.nodes.len() as u32 - 1)
        }
    }

    /// Create a node from its textual tag with default parameters
    ///
    /// Operator tags accept the source aliases `+`, `*` and `-`. An unknown
    /// tag leaves the tree untouched.
    pub fn create_node(&mut self, tag: &str) -> Result<NodeRef, TreeError> {
        let kind = match tag {
            "sphere" => NodeKind::Sphere { radius: 1.0 },
            "box" => NodeKind::Box3d {
                half_extents: Vec3::splat(1.0),
            },
            "cylinder" => NodeKind::Cylinder {
                radius: 1.0,
                half_height: 1.0,
            },
            "torus" => NodeKind::Torus {
                major_radius: 1.0,
                minor_radius: 0.25,
            },
            "plane" => NodeKind::Plane {
                normal: Vec3::Y,
                distance: 0.0,
            },
            "union" | "+" => NodeKind::Union,
            "intersection" | "*" => NodeKind::Intersection,
            "difference" | "-" => NodeKind::Difference,
            "translate" => NodeKind::Translate { delta: Vec3::ZERO },
            "rotate" => NodeKind::Rotate {
                axis: Vec3::Y,
                angle: 0.0,
            },
            "scale" => NodeKind::Scale {
                factors: Vec3::splat(1.0),
            },
            "scale_uniform" => NodeKind::UniformScale { factor: 1.0 },
            "shear" => NodeKind::Shear {
                h_xy: 0.0,
                h_xz: 0.0,
                h_yz: 0.0,
            },
            "numeric_gradient" => NodeKind::NumericGradient {
                epsilon: 1e-6,
                use_numeric: false,
            },
            _ => return Err(TreeError::UnknownTag(tag.to_string())),
        };
        Ok(self.add(Node::new(kind)))
    }

    /// Borrow a node
    pub fn node(&self, r: NodeRef) -> Result<&Node, TreeError> {
        self.nodes
            .get(r.index())
            .and_then(Option::as_ref)
            .ok_or(TreeError::DeadRef(r))
    }

    /// Mutably borrow a node; raises the dirty flag
    pub fn node_mut(&mut self, r: NodeRef) -> Result<&mut Node, TreeError> {
        self.dirty = true;
        self.nodes
            .get_mut(r.index())
            .and_then(Option::as_mut)
            .ok_or(TreeError::DeadRef(r))
    }

    /// Whether a handle refers to a live node
    pub fn is_live(&self, r: NodeRef) -> bool {
        matches!(self.nodes.get(r.index()), Some(Some(_)))
    }

    /// Parent of a node, if attached
    pub fn parent(&self, r: NodeRef) -> Option<NodeRef> {
        self.parents.get(r.index()).copied().flatten()
    }

    /// Attach `child` as the last child of `parent`
    ///
    /// Fails without mutating when either handle is dead, the child already
    /// has a parent, the edge would close a cycle, or the parent's arity is
    /// exhausted (leaves take none, transforms and the numeric-gradient
    /// wrapper take one, operators are unbounded).
    pub fn append_child(&mut self, parent: NodeRef, child: NodeRef) -> Result<(), TreeError> {
        if !self.is_live(parent) {
            return Err(TreeError::DeadRef(parent));
        }
        if !self.is_live(child) {
            return Err(TreeError::DeadRef(child));
        }
        if self.parent(child).is_some() {
            return Err(TreeError::HasParent(child));
        }
        // A cycle forms exactly when child is an ancestor of parent
        let mut cursor = Some(parent);
        while let Some(n) = cursor {
            if n == child {
                return Err(TreeError::Cycle { parent, child });
            }
            cursor = self.parent(n);
        }
        let p = self.nodes[parent.index()]
            .as_ref()
            .ok_or(TreeError::DeadRef(parent))?;
        if let Some(max) = p.kind.max_children() {
            if p.children.len() >= max {
                return Err(TreeError::ArityExceeded(parent, max));
            }
        }
        self.nodes[parent.index()]
            .as_mut()
            .ok_or(TreeError::DeadRef(parent))?
            .children
            .push(child);
        self.parents[child.index()] = Some(parent);
        self.dirty = true;
        Ok(())
    }

    /// Detach `child` from `parent` and free its whole subtree
    ///
    /// Every handle into the freed subtree becomes dead; the slots return to
    /// the free-list for reuse.
    pub fn remove_child(&mut self, parent: NodeRef, child: NodeRef) -> Result<(), TreeError> {
        if !self.is_live(child) {
            return Err(TreeError::DeadRef(child));
        }
        let p = self.nodes.get_mut(parent.index()).and_then(Option::as_mut);
        let p = p.ok_or(TreeError::DeadRef(parent))?;
        let pos = p
            .children
            .iter()
            .position(|&c| c == child)
            .ok_or(TreeError::NotAChild { parent, child })?;
        p.children.remove(pos);
        self.free_subtree(child);
        self.dirty = true;
        Ok(())
    }

    /// Free a detached subtree, iteratively
    fn free_subtree(&mut self, root: NodeRef) {
        let mut stack = vec![root];
        while let Some(r) = stack.pop() {
            if let Some(node) = self.nodes[r.index()].take() {
                stack.extend(node.children);
            }
            self.parents[r.index()] = None;
            self.free.push(r.0);
            if self.root == Some(r) {
                self.root = None;
            }
        }
    }

    /// Designate the evaluation root
    pub fn set_root(&mut self, r: NodeRef) -> Result<(), TreeError> {
        if !self.is_live(r) {
            return Err(TreeError::DeadRef(r));
        }
        self.root = Some(r);
        self.dirty = true;
        Ok(())
    }

    /// The designated evaluation root, if any
    pub fn root(&self) -> Option<NodeRef> {
        self.root
    }

    /// Number of live nodes
    pub fn node_count(&self) -> usize {
        self.nodes.iter().filter(|n| n.is_some()).count()
    }

    /// Consume the dirty flag
    pub fn take_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }
}
