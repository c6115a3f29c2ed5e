//! Surface traits and implementations.

mod nurbs;

use isogeo_core::Result;
use isogeo_math::{Point3, Vector3};

pub use nurbs::{NurbsSurface, SurfaceDerivativeNets};

/// Trait for parametric surfaces in 3D space.
pub trait Surface: Send + Sync {
    /// Evaluate the surface at parameters `(u, v)`.
    fn point_at(&self, u: f64, v: f64) -> Result<Point3>;

    /// Unit normal at parameters `(u, v)`.
    ///
    /// Fails where the first partials are parallel or vanish.
    fn normal_at(&self, u: f64, v: f64) -> Result<Vector3>;

    /// Return the u-parameter domain `(u_min, u_max)`.
    fn domain_u(&self) -> (f64, f64);

    /// Return the v-parameter domain `(v_min, v_max)`.
    fn domain_v(&self) -> (f64, f64);
}
