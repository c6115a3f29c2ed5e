pub mod binomial;
pub mod grid;
pub mod homogeneous;

pub use glam::{DVec3, DVec4};
pub use binomial::BinomialCache;
pub use grid::GridIndex;
pub use homogeneous::{from_homogeneous, to_homogeneous};

pub type Point3 = DVec3;
pub type Vector3 = DVec3;
/// Homogeneous control point `(x*w, y*w, z*w, w)`.
pub type HPoint = DVec4;
