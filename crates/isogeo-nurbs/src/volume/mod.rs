//! Trivariate NURBS volumes.
//!
//! Volumes carry the same evaluation, refinement and editing operations as
//! curves and surfaces. The rational correction stops at first order: any
//! request of total derivative order two or more fails with
//! [`IsogeoError::Unsupported`]. Homogeneous partials of any order are
//! still available through [`NurbsVolume::homogeneous_partial_at`].

use isogeo_core::{IsogeoError, Result};
use isogeo_math::{HPoint, Point3, Vector3};
use serde::{Deserialize, Deserializer, Serialize};

use crate::nurbs::deboor;
use crate::nurbs::net::ControlNet;
use crate::nurbs::rational::{check_volume_order, rational_volume_first_derivs};
use crate::spline::{check_positive_weights, Spline, SplineData};

/// A NURBS volume over `(u, v, w)`, net stored u fastest then v then w.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct NurbsVolume {
    data: SplineData,
}

impl<'de> Deserialize<'de> for NurbsVolume {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        SplineData::deserialize_with(deserializer, 3).map(|data| Self { data })
    }
}

impl NurbsVolume {
    pub fn new(degrees: [usize; 3], knots: [Vec<f64>; 3], net: ControlNet) -> Result<Self> {
        Ok(Self {
            data: SplineData::new(degrees.to_vec(), knots.into(), net)?,
        })
    }

    /// Non-rational volume from flat u-fastest points.
    pub fn from_points(
        degrees: [usize; 3],
        knots: [Vec<f64>; 3],
        counts: [usize; 3],
        points: &[Point3],
    ) -> Result<Self> {
        Self::new(degrees, knots, ControlNet::from_points(&counts, points)?)
    }

    /// Rational volume from flat u-fastest points and positive weights.
    pub fn from_weighted(
        degrees: [usize; 3],
        knots: [Vec<f64>; 3],
        counts: [usize; 3],
        points: &[Point3],
        weights: &[f64],
    ) -> Result<Self> {
        check_positive_weights(weights)?;
        Self::new(degrees, knots, ControlNet::from_weighted(&counts, points, weights)?)
    }

    fn from_data(data: SplineData) -> Self {
        Self { data }
    }

    fn degrees3(&self) -> [usize; 3] {
        [self.data.degrees[0], self.data.degrees[1], self.data.degrees[2]]
    }

    fn knots3(&self) -> [&[f64]; 3] {
        [&self.data.knots[0], &self.data.knots[1], &self.data.knots[2]]
    }

    /// Homogeneous partial taken `orders[d]` times along direction `d`.
    pub fn homogeneous_partial_at(
        &self,
        param: (f64, f64, f64),
        orders: [usize; 3],
    ) -> Result<HPoint> {
        deboor::volume_partial(self.degrees3(), self.knots3(), &self.data.net, param, orders)
    }

    /// Position and the three rational first partials `[S, Su, Sv, Sw]`.
    pub fn first_derivatives_at(&self, param: (f64, f64, f64)) -> Result<[Vector3; 4]> {
        let h = [
            self.homogeneous_partial_at(param, [0, 0, 0])?,
            self.homogeneous_partial_at(param, [1, 0, 0])?,
            self.homogeneous_partial_at(param, [0, 1, 0])?,
            self.homogeneous_partial_at(param, [0, 0, 1])?,
        ];
        rational_volume_first_derivs(&h)
    }

    /// One rational partial derivative. Total order must be 0 or 1.
    pub fn derivative_at(&self, param: (f64, f64, f64), orders: [usize; 3]) -> Result<Vector3> {
        check_volume_order(orders)?;
        match orders.iter().position(|&o| o == 1) {
            None => self.position(param),
            Some(axis) => Ok(self.first_derivatives_at(param)?[axis + 1]),
        }
    }

    /// The homogeneous derivative volume along `direction`.
    pub fn derivative(&self, direction: usize) -> Result<Self> {
        Ok(Self::from_data(self.data.derive(direction)?))
    }

    pub fn insert_knot(&self, direction: usize, t: f64, times: usize) -> Result<Self> {
        Ok(Self::from_data(self.data.insert(direction, t, times)?))
    }

    pub fn elevate_degree(&self, direction: usize, times: usize) -> Result<Self> {
        Ok(Self::from_data(self.data.elevate(direction, times)?))
    }

    pub fn move_points(&self, displacement: Vector3, indices: &[usize]) -> Result<Self> {
        Ok(Self::from_data(self.data.moved(displacement, indices)?))
    }

    pub fn set_weights(&self, weights: &[f64], indices: &[usize]) -> Result<Self> {
        Ok(Self::from_data(self.data.reweighted(weights, indices)?))
    }

    /// Parametric ranges along u, v and w.
    pub fn domain(&self) -> [(f64, f64); 3] {
        let mut out = [(0.0, 0.0); 3];
        for (axis, range) in out.iter_mut().enumerate() {
            let p = self.data.degrees[axis];
            let k = &self.data.knots[axis];
            *range = (k[p], k[k.len() - p - 1]);
        }
        out
    }
}

impl Spline for NurbsVolume {
    type Param = (f64, f64, f64);

    fn degrees(&self) -> &[usize] {
        &self.data.degrees
    }

    fn knot_vectors(&self) -> &[Vec<f64>] {
        &self.data.knots
    }

    fn control_net(&self) -> &ControlNet {
        &self.data.net
    }

    fn evaluate(&self, param: (f64, f64, f64)) -> Result<HPoint> {
        deboor::volume_point(self.degrees3(), self.knots3(), &self.data.net, param)
    }

    fn differentiate(&self, direction: usize) -> Result<Self> {
        if direction > 2 {
            return Err(IsogeoError::InvalidOperation(format!(
                "a volume has three parametric directions, got {direction}"
            )));
        }
        self.derivative(direction)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use isogeo_math::DVec3;

    fn unit_knots() -> [Vec<f64>; 3] {
        [
            vec![0.0, 0.0, 1.0, 1.0],
            vec![0.0, 0.0, 1.0, 1.0],
            vec![0.0, 0.0, 1.0, 1.0],
        ]
    }

    /// Box `[0,1] x [0,2] x [0,3]` with a heavier corner.
    fn weighted_box() -> NurbsVolume {
        let mut points = Vec::new();
        for k in 0..2 {
            for j in 0..2 {
                for i in 0..2 {
                    points.push(DVec3::new(i as f64, 2.0 * j as f64, 3.0 * k as f64));
                }
            }
        }
        let mut weights = vec![1.0; 8];
        weights[7] = 2.0;
        NurbsVolume::from_weighted([1, 1, 1], unit_knots(), [2, 2, 2], &points, &weights).unwrap()
    }

    #[test]
    fn test_position_matches_projection() {
        let vol = weighted_box();
        let param = (0.3, 0.6, 0.9);
        let h = vol.evaluate(param).unwrap();
        let p = vol.derivative_at(param, [0, 0, 0]).unwrap();
        assert_relative_eq!(p.x, h.x / h.w, epsilon = 1e-14);
        assert_relative_eq!(p.z, h.z / h.w, epsilon = 1e-14);
    }

    #[test]
    fn test_first_partials_against_central_difference() {
        let vol = weighted_box();
        let (u, v, w) = (0.4, 0.5, 0.3);
        let h = 1e-6;
        let d = vol.first_derivatives_at((u, v, w)).unwrap();
        let at = |u: f64, v: f64, w: f64| vol.position((u, v, w)).unwrap();
        let fd = (at(u, v, w + h) - at(u, v, w - h)) / (2.0 * h);
        assert!((d[3] - fd).length() < 1e-6);
        let fd = (at(u + h, v, w) - at(u - h, v, w)) / (2.0 * h);
        assert!((d[1] - fd).length() < 1e-6);
        assert_eq!(vol.derivative_at((u, v, w), [0, 1, 0]).unwrap(), d[2]);
    }

    #[test]
    fn test_second_order_unsupported() {
        let vol = weighted_box();
        assert!(matches!(
            vol.derivative_at((0.5, 0.5, 0.5), [1, 1, 0]),
            Err(IsogeoError::Unsupported(_))
        ));
        assert!(matches!(
            vol.derivative_at((0.5, 0.5, 0.5), [2, 0, 0]),
            Err(IsogeoError::Unsupported(_))
        ));
        // homogeneous partials have no such limit
        assert!(vol.homogeneous_partial_at((0.5, 0.5, 0.5), [1, 1, 1]).is_ok());
    }

    #[test]
    fn test_refinement_keeps_shape() {
        let vol = weighted_box();
        let refined = vol.insert_knot(1, 0.5, 1).unwrap().elevate_degree(2, 1).unwrap();
        assert_eq!(refined.degrees(), &[1, 1, 2]);
        assert_eq!(refined.control_net().count(1), 3);
        let param = (0.2, 0.7, 0.55);
        let a = vol.position(param).unwrap();
        let b = refined.position(param).unwrap();
        assert!((a - b).length() < 1e-12);
    }

    #[test]
    fn test_domain_and_bad_direction() {
        let vol = weighted_box();
        assert_eq!(vol.domain(), [(0.0, 1.0); 3]);
        assert!(vol.differentiate(3).is_err());
        assert!(vol.evaluate((0.5, 0.5, -1.0)).is_err());
    }
}
