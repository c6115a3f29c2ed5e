//! NURBS core algorithms: knot spans and basis functions, De Boor evaluation,
//! derivative nets, the rational correction, refinement and control point
//! editing.

pub mod deboor;
pub mod derivative;
pub mod edit;
pub mod knot;
pub mod net;
pub mod rational;
pub mod refine;

pub use deboor::*;
pub use derivative::{derive_control_points, derive_net, DerivedNet};
pub use edit::{move_points, move_points_in_place, set_weights, set_weights_in_place};
pub use knot::{
    basis_functions, basis_functions_derivs, checked_span, find_span, snap_param, BasisWindow,
};
pub use net::ControlNet;
pub use rational::{rational_curve_derivs, rational_surface_derivs, rational_volume_first_derivs};
pub use refine::{elevate_degree, insert_knot, Refined};
