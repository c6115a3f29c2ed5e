//! isogeo geometry: NURBS curves, surfaces and volumes with exact
//! derivatives.

pub mod curve;
pub mod nurbs;
pub mod sample;
pub mod spline;
pub mod surface;
pub mod volume;

pub use curve::{Curve, NurbsCurve};
pub use nurbs::ControlNet;
pub use sample::SampleConfig;
pub use spline::Spline;
pub use surface::{NurbsSurface, Surface, SurfaceDerivativeNets};
pub use volume::NurbsVolume;
