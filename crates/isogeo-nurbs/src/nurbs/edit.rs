//! Index-addressed edits of control point positions and weights.
//!
//! Indices are flat positions in the net (u fastest, see
//! [`isogeo_math::GridIndex`]). Positions are stored premultiplied by their
//! weight, so both edits go through the Cartesian position.

use isogeo_core::{IsogeoError, Result};
use isogeo_math::homogeneous::check_weight;
use isogeo_math::Vector3;

use super::net::ControlNet;

fn check_indices(net: &ControlNet, indices: &[usize]) -> Result<()> {
    if let Some(&bad) = indices.iter().find(|&&i| i >= net.len()) {
        return Err(IsogeoError::InvalidOperation(format!(
            "control point index {bad} out of range for {} points",
            net.len()
        )));
    }
    Ok(())
}

/// Translate the Cartesian position of the points at `indices` by
/// `displacement`, leaving their weights unchanged.
pub fn move_points(
    net: &ControlNet,
    displacement: Vector3,
    indices: &[usize],
) -> Result<ControlNet> {
    let mut out = net.clone();
    move_points_in_place(&mut out, displacement, indices)?;
    Ok(out)
}

/// In-place variant of [`move_points`].
pub fn move_points_in_place(
    net: &mut ControlNet,
    displacement: Vector3,
    indices: &[usize],
) -> Result<()> {
    check_indices(net, indices)?;
    let points = net.points_mut();
    for &i in indices {
        let p = points[i];
        points[i] = (p.truncate() + displacement * p.w).extend(p.w);
    }
    Ok(())
}

/// Replace the weights of the points at `indices`, keeping their Cartesian
/// positions.
pub fn set_weights(net: &ControlNet, weights: &[f64], indices: &[usize]) -> Result<ControlNet> {
    let mut out = net.clone();
    set_weights_in_place(&mut out, weights, indices)?;
    Ok(out)
}

/// In-place variant of [`set_weights`]. Nothing is written unless every
/// index and weight is valid.
pub fn set_weights_in_place(
    net: &mut ControlNet,
    weights: &[f64],
    indices: &[usize],
) -> Result<()> {
    if weights.len() != indices.len() {
        return Err(IsogeoError::DimensionMismatch(format!(
            "{} weights for {} indices",
            weights.len(),
            indices.len()
        )));
    }
    check_indices(net, indices)?;
    if let Some(&bad) = weights.iter().find(|w| !(w.is_finite() && **w > 0.0)) {
        return Err(IsogeoError::InvalidOperation(format!(
            "new weights must be positive and finite, got {bad}"
        )));
    }
    for &i in indices {
        check_weight(net.points()[i].w)?;
    }

    let points = net.points_mut();
    for (&i, &w) in indices.iter().zip(weights) {
        let p = points[i];
        points[i] = (p.truncate() / p.w * w).extend(w);
    }
    Ok(())
}
