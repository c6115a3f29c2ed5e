//! Curve traits and implementations.

mod nurbs;

use isogeo_core::Result;
use isogeo_math::{Point3, Vector3};

pub use nurbs::NurbsCurve;

/// Trait for parametric curves in 3D space.
pub trait Curve: Send + Sync {
    /// Evaluate the curve at parameter `t`.
    fn point_at(&self, t: f64) -> Result<Point3>;

    /// Evaluate the tangent vector at parameter `t`.
    fn tangent_at(&self, t: f64) -> Result<Vector3>;

    /// Return the parameter domain `(t_min, t_max)`.
    fn domain(&self) -> (f64, f64);

    /// Whether the curve is closed (start == end).
    fn is_closed(&self) -> bool {
        let (t0, t1) = self.domain();
        match (self.point_at(t0), self.point_at(t1)) {
            (Ok(a), Ok(b)) => a.distance(b) <= isogeo_core::Tolerance::DEFAULT_LINEAR,
            _ => false,
        }
    }
}
