//! Closed-form signed distance primitives
//!
//! Each primitive provides a signed distance function `sdf_*` and the
//! matching analytic gradient `grad_*`. Distances are exact Euclidean
//! where the shape admits it (all shapes here do); gradients are unit
//! length away from the medial axis.

pub mod box3d;
pub mod cylinder;
pub mod plane;
pub mod sphere;
pub mod torus;

pub use box3d::{grad_box3d, sdf_box3d};
pub use cylinder::{grad_cylinder, sdf_cylinder};
pub use plane::{grad_plane, sdf_plane};
pub use sphere::{grad_sphere, sdf_sphere};
pub use torus::{grad_torus, sdf_torus};
