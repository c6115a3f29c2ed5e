//! Homogeneous (weighted) control points: `(x*w, y*w, z*w, w)`.

use glam::{DVec3, DVec4};
use isogeo_core::{IsogeoError, Result};

/// Lift a Cartesian point with weight `w` into homogeneous space.
pub fn to_homogeneous(point: DVec3, weight: f64) -> DVec4 {
    (point * weight).extend(weight)
}

/// Project a homogeneous point back to Cartesian space.
///
/// Fails with [`IsogeoError::DegenerateWeight`] for a zero or non-finite
/// weight.
pub fn from_homogeneous(h: DVec4) -> Result<DVec3> {
    check_weight(h.w)?;
    Ok(h.truncate() / h.w)
}

pub fn check_weight(weight: f64) -> Result<()> {
    if weight == 0.0 || !weight.is_finite() {
        return Err(IsogeoError::DegenerateWeight { weight });
    }
    Ok(())
}
