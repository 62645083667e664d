//! Core types for isofield
//!
//! Defines the node variants of the implicit scene graph and the
//! axis-aligned box used to bound sampling.

use glam::{Vec3, Vec4};
use serde::{Deserialize, Serialize};

/// Stable handle to a node in a [`SceneTree`](crate::scene::SceneTree) arena.
///
/// Handles stay valid across unrelated insertions and deletions; a handle is
/// invalidated only when its own subtree is detached and freed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NodeRef(pub(crate) u32);

impl NodeRef {
    /// Arena slot index
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Category of a node variant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeCategory {
    /// Leaf with a closed-form signed distance
    Primitive,
    /// N-ary CSG combination
    Operator,
    /// Single-child affine warp
    Transform,
    /// Single-child evaluation wrapper
    Modifier,
}

/// How a group node composes its surface color
///
/// `Replace` uses the node's own color, `Compose` averages the children's
/// colors, `Child(i)` forwards the color of child `i` (falling back to the
/// node's own color when out of range).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ColorMode {
    /// The node's own color
    Replace,
    /// Average of the children's colors
    Compose,
    /// Color of child `i`
    Child(u32),
}

/// Implicit scalar field node variant
///
/// Each variant is either a leaf primitive with a closed-form signed
/// distance, a CSG operator combining its children, an affine transform
/// warping the query point into child space, or the numeric-gradient
/// wrapper. Children are stored on the arena [`Node`], not inside the
/// variant, so parameter edits never touch the topology.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum NodeKind {
    // === Primitives (leaves) ===
    /// Sphere centered at the origin
    Sphere {
        /// Sphere radius
        radius: f32,
    },

    /// Axis-aligned box centered at the origin
    Box3d {
        /// Half-extents along each axis
        half_extents: Vec3,
    },

    /// Cylinder along the Y-axis
    Cylinder {
        /// Cylinder radius
        radius: f32,
        /// Half the cylinder height
        half_height: f32,
    },

    /// Torus in the XZ plane
    Torus {
        /// Distance from center to tube center
        major_radius: f32,
        /// Tube radius
        minor_radius: f32,
    },

    /// Infinite plane
    Plane {
        /// Plane normal direction
        normal: Vec3,
        /// Signed distance from origin along the normal
        distance: f32,
    },

    // === CSG operators (n-ary) ===
    /// Pointwise minimum of the children
    Union,
    /// Pointwise maximum of the children
    Intersection,
    /// First child minus the union of the rest: `max(f0, -min(f1..))`
    Difference,

    // === Affine transforms (single child) ===
    /// Translation by `delta`
    Translate {
        /// Forward translation offset
        delta: Vec3,
    },

    /// Rotation about an axis through the origin
    Rotate {
        /// Rotation axis (normalized at evaluation)
        axis: Vec3,
        /// Rotation angle in radians
        angle: f32,
    },

    /// Component-wise scaling
    Scale {
        /// Per-axis scale factors
        factors: Vec3,
    },

    /// Uniform scaling
    UniformScale {
        /// Scale factor
        factor: f32,
    },

    /// Shear with forward map `x' = x + h_xy*y + h_xz*z, y' = y + h_yz*z`
    Shear {
        /// XY shear factor
        h_xy: f32,
        /// XZ shear factor
        h_xz: f32,
        /// YZ shear factor
        h_yz: f32,
    },

    // === Modifiers (single child) ===
    /// Central-difference gradient estimator over the child field
    NumericGradient {
        /// Finite-difference step
        epsilon: f32,
        /// Estimate numerically instead of delegating to the child
        use_numeric: bool,
    },
}

impl NodeKind {
    /// Returns the category of this node variant
    pub fn category(&self) -> NodeCategory {
        match self {
            Self::Sphere { .. }
            | Self::Box3d { .. }
            | Self::Cylinder { .. }
            | Self::Torus { .. }
            | Self::Plane { .. } => NodeCategory::Primitive,

            Self::Union | Self::Intersection | Self::Difference => NodeCategory::Operator,

            Self::Translate { .. }
            | Self::Rotate { .. }
            | Self::Scale { .. }
            | Self::UniformScale { .. }
            | Self::Shear { .. } => NodeCategory::Transform,

            Self::NumericGradient { .. } => NodeCategory::Modifier,
        }
    }

    /// Maximum number of children this variant accepts (`None` = unbounded)
    pub fn max_children(&self) -> Option<usize> {
        match self.category() {
            NodeCategory::Primitive => Some(0),
            NodeCategory::Operator => None,
            NodeCategory::Transform | NodeCategory::Modifier => Some(1),
        }
    }

    /// Whether this variant is a leaf primitive
    #[inline]
    pub fn is_leaf(&self) -> bool {
        self.category() == NodeCategory::Primitive
    }
}

/// Arena entry: a node variant plus the state every node carries
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    /// The tagged variant
    pub kind: NodeKind,
    /// Surface color (RGBA)
    pub color: Vec4,
    /// Color composition policy for group nodes
    pub color_mode: ColorMode,
    /// Ordered children (always empty for leaves)
    pub(crate) children: Vec<NodeRef>,
}

impl Node {
    /// Create a node with the default color and `Replace` color mode
    pub fn new(kind: NodeKind) -> Self {
        Node {
            kind,
            color: Vec4::new(0.5, 0.5, 0.5, 1.0),
            color_mode: ColorMode::Replace,
            children: Vec::new(),
        }
    }

    /// Ordered children of this node
    #[inline]
    pub fn children(&self) -> &[NodeRef] {
        &self.children
    }
}

/// Axis-aligned bounding box
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Aabb {
    /// Minimum corner
    pub min: Vec3,
    /// Maximum corner
    pub max: Vec3,
}

impl Aabb {
    /// Create a new AABB
    pub fn new(min: Vec3, max: Vec3) -> Self {
        Aabb { min, max }
    }

    /// Create from center and half-extents
    pub fn from_center_extents(center: Vec3, half_extents: Vec3) -> Self {
        Aabb {
            min: center - half_extents,
            max: center + half_extents,
        }
    }

    /// Get center point
    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    /// Get size
    pub fn extent(&self) -> Vec3 {
        self.max - self.min
    }

    /// Check if point is inside
    pub fn contains(&self, point: Vec3) -> bool {
        point.x >= self.min.x
            && point.x <= self.max.x
            && point.y >= self.min.y
            && point.y <= self.max.y
            && point.z >= self.min.z
            && point.z <= self.max.z
    }

    /// Whether `min < max` holds on every axis
    pub fn is_valid(&self) -> bool {
        self.min.x < self.max.x && self.min.y < self.max.y && self.min.z < self.max.z
    }
}
