//! Control nets of derivative B-splines.
//!
//! The first derivative of a degree-p B-spline with points `P` and knots `U`
//! is a degree-(p-1) B-spline with points
//!
//! ```text
//! Q[i] = p / (U[i+p+1] - U[i+1]) * (P[i+1] - P[i])
//! ```
//!
//! over the knot vector `U` with its first and last knot dropped (The NURBS
//! Book, A3.3). Applied to a homogeneous net this differentiates the
//! numerator and the weight function together.

use isogeo_core::{IsogeoError, Result};
use isogeo_math::HPoint;
use tracing::trace;

use super::net::ControlNet;

/// Derivative of a B-spline given by one line of control points.
///
/// Returns the derived points and knots. A degree-0 spline has the zero
/// function as its derivative; it is returned as a degree-0 spline of the
/// same size with all points zero, so the degree never goes negative.
pub fn derive_control_points(
    degree: usize,
    points: &[HPoint],
    knots: &[f64],
) -> (Vec<HPoint>, Vec<f64>) {
    if degree == 0 {
        return (vec![HPoint::ZERO; points.len()], knots.to_vec());
    }

    let p = degree as f64;
    let derived = points
        .windows(2)
        .enumerate()
        .map(|(i, pair)| {
            let span = knots[i + degree + 1] - knots[i + 1];
            if span == 0.0 {
                HPoint::ZERO
            } else {
                (p / span) * (pair[1] - pair[0])
            }
        })
        .collect();

    (derived, knots[1..knots.len() - 1].to_vec())
}

/// A derived net together with its degree and knot vector along the
/// differentiated axis.
#[derive(Debug, Clone, PartialEq)]
pub struct DerivedNet {
    pub degree: usize,
    pub net: ControlNet,
    pub knots: Vec<f64>,
}

/// Differentiate a tensor-product net once along `axis`.
///
/// Every line of points running along `axis` is differentiated with
/// [`derive_control_points`]; the other directions are left untouched.
pub fn derive_net(
    net: &ControlNet,
    knots: &[f64],
    degree: usize,
    axis: usize,
) -> Result<DerivedNet> {
    if axis >= net.directions() {
        return Err(IsogeoError::InvalidOperation(format!(
            "cannot differentiate along axis {axis} of a net with {} directions",
            net.directions()
        )));
    }
    let count = net.count(axis);
    if knots.len() != count + degree + 1 {
        return Err(IsogeoError::DimensionMismatch(format!(
            "axis {axis}: {} knots for {count} points with degree {degree}",
            knots.len()
        )));
    }

    let (new_degree, new_count) = if degree == 0 {
        (0, count)
    } else {
        (degree - 1, count - 1)
    };
    trace!(axis, degree, new_degree, count, new_count, "deriving control net");

    let derived = net.map_lines(axis, new_count, |line| {
        Ok(derive_control_points(degree, line, knots).0)
    })?;
    let new_knots = if degree == 0 {
        knots.to_vec()
    } else {
        knots[1..knots.len() - 1].to_vec()
    };

    Ok(DerivedNet {
        degree: new_degree,
        net: derived,
        knots: new_knots,
    })
}
