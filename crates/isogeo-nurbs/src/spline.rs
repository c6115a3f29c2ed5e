//! Capabilities shared by NURBS curves, surfaces and volumes.

use isogeo_core::{IsogeoError, Result, Validate};
use isogeo_math::{from_homogeneous, HPoint, Point3};
use rayon::prelude::*;
use serde::{Deserialize, Deserializer, Serialize};

use crate::nurbs::derivative::derive_net;
use crate::nurbs::edit;
use crate::nurbs::knot::validate_knots;
use crate::nurbs::net::ControlNet;
use crate::nurbs::refine::{elevate_degree, insert_knot, refine_net_axis};

pub(crate) const DIRECTION_NAMES: [&str; 3] = ["u", "v", "w"];

/// A tensor-product B-spline in homogeneous space.
///
/// Implemented by [`crate::NurbsCurve`], [`crate::NurbsSurface`] and
/// [`crate::NurbsVolume`]. Evaluation returns homogeneous points; use
/// [`Spline::position`] for the Cartesian point.
pub trait Spline: Sized + Send + Sync {
    /// Parametric coordinates of one query point.
    type Param: Copy + Send + Sync;

    /// Degree along each parametric direction.
    fn degrees(&self) -> &[usize];

    /// Knot vector along each parametric direction.
    fn knot_vectors(&self) -> &[Vec<f64>];

    fn control_net(&self) -> &ControlNet;

    /// Homogeneous point at `param`.
    fn evaluate(&self, param: Self::Param) -> Result<HPoint>;

    /// The derivative along `direction`, as a spline of one lower degree in
    /// that direction.
    fn differentiate(&self, direction: usize) -> Result<Self>;

    /// Cartesian point at `param`.
    fn position(&self, param: Self::Param) -> Result<Point3> {
        from_homogeneous(self.evaluate(param)?)
    }

    /// Evaluate many parameters in parallel; output order matches input.
    fn evaluate_many(&self, params: &[Self::Param]) -> Result<Vec<HPoint>> {
        params.par_iter().map(|&p| self.evaluate(p)).collect()
    }

    /// Cartesian points for many parameters; output order matches input.
    fn positions(&self, params: &[Self::Param]) -> Result<Vec<Point3>> {
        params.par_iter().map(|&p| self.position(p)).collect()
    }

    /// Parametric range `(knots[p], knots[m - p])` along `direction`.
    fn param_range(&self, direction: usize) -> Result<(f64, f64)> {
        let knots = self.knot_vectors().get(direction).ok_or_else(|| {
            IsogeoError::InvalidOperation(format!("no parametric direction {direction}"))
        })?;
        let p = self.degrees()[direction];
        Ok((knots[p], knots[knots.len() - p - 1]))
    }
}

/// Storage shared by the typed spline wrappers: one degree and knot vector
/// per direction plus the homogeneous net.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawSpline")]
pub(crate) struct SplineData {
    pub(crate) degrees: Vec<usize>,
    pub(crate) knots: Vec<Vec<f64>>,
    pub(crate) net: ControlNet,
}

#[derive(Deserialize)]
struct RawSpline {
    degrees: Vec<usize>,
    knots: Vec<Vec<f64>>,
    net: ControlNet,
}

impl TryFrom<RawSpline> for SplineData {
    type Error = IsogeoError;

    fn try_from(raw: RawSpline) -> Result<Self> {
        Self::new(raw.degrees, raw.knots, raw.net)
    }
}

impl Validate for SplineData {
    fn validate(&self) -> Result<()> {
        let directions = self.net.directions();
        if self.degrees.len() != directions || self.knots.len() != directions {
            return Err(IsogeoError::DimensionMismatch(format!(
                "net has {directions} directions but {} degrees and {} knot vectors were given",
                self.degrees.len(),
                self.knots.len()
            )));
        }
        for axis in 0..directions {
            validate_knots(self.degrees[axis], &self.knots[axis], self.net.count(axis)).map_err(
                |e| match e {
                    IsogeoError::DimensionMismatch(msg) => IsogeoError::DimensionMismatch(format!(
                        "direction {}: {msg}",
                        DIRECTION_NAMES[axis]
                    )),
                    other => other,
                },
            )?;
        }
        Ok(())
    }
}

impl SplineData {
    pub(crate) fn new(degrees: Vec<usize>, knots: Vec<Vec<f64>>, net: ControlNet) -> Result<Self> {
        let data = Self {
            degrees,
            knots,
            net,
        };
        data.validate()?;
        Ok(data)
    }

    /// Deserialize a spline that must have exactly `directions` parametric
    /// directions.
    pub(crate) fn deserialize_with<'de, D>(
        deserializer: D,
        directions: usize,
    ) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let data = Self::deserialize(deserializer)?;
        if data.degrees.len() != directions {
            return Err(serde::de::Error::custom(IsogeoError::DimensionMismatch(format!(
                "expected a {directions}-direction spline, got {} directions",
                data.degrees.len()
            ))));
        }
        Ok(data)
    }

    pub(crate) fn check_axis(&self, axis: usize) -> Result<()> {
        if axis >= self.degrees.len() {
            return Err(IsogeoError::InvalidOperation(format!(
                "no parametric direction {axis} on a {}-direction spline",
                self.degrees.len()
            )));
        }
        Ok(())
    }

    pub(crate) fn derive(&self, axis: usize) -> Result<Self> {
        self.check_axis(axis)?;
        let derived = derive_net(&self.net, &self.knots[axis], self.degrees[axis], axis)?;
        let mut degrees = self.degrees.clone();
        let mut knots = self.knots.clone();
        degrees[axis] = derived.degree;
        knots[axis] = derived.knots;
        Self::new(degrees, knots, derived.net)
    }

    pub(crate) fn elevate(&self, axis: usize, times: usize) -> Result<Self> {
        self.check_axis(axis)?;
        let (degree, knots) = (self.degrees[axis], &self.knots[axis]);
        let (net, new_degree, new_knots) =
            refine_net_axis(&self.net, axis, |line| elevate_degree(degree, line, knots, times))?;
        self.replaced(axis, new_degree, new_knots, net)
    }

    pub(crate) fn insert(&self, axis: usize, u: f64, times: usize) -> Result<Self> {
        self.check_axis(axis)?;
        let (degree, knots) = (self.degrees[axis], &self.knots[axis]);
        let (net, new_degree, new_knots) =
            refine_net_axis(&self.net, axis, |line| insert_knot(degree, line, knots, u, times))?;
        self.replaced(axis, new_degree, new_knots, net)
    }

    /// Raise the degree along `axis` to at least `degree`.
    pub(crate) fn elevated_to(&self, axis: usize, degree: usize) -> Result<Self> {
        self.check_axis(axis)?;
        match degree.checked_sub(self.degrees[axis]) {
            Some(times) if times > 0 => self.elevate(axis, times),
            _ => Ok(self.clone()),
        }
    }

    fn replaced(
        &self,
        axis: usize,
        degree: usize,
        knots: Vec<f64>,
        net: ControlNet,
    ) -> Result<Self> {
        let mut degrees = self.degrees.clone();
        let mut all_knots = self.knots.clone();
        degrees[axis] = degree;
        all_knots[axis] = knots;
        Self::new(degrees, all_knots, net)
    }

    pub(crate) fn moved(
        &self,
        displacement: isogeo_math::Vector3,
        indices: &[usize],
    ) -> Result<Self> {
        Ok(Self {
            net: edit::move_points(&self.net, displacement, indices)?,
            ..self.clone()
        })
    }

    pub(crate) fn reweighted(&self, weights: &[f64], indices: &[usize]) -> Result<Self> {
        Ok(Self {
            net: edit::set_weights(&self.net, weights, indices)?,
            ..self.clone()
        })
    }
}

/// Reject non-positive or non-finite weights given to a constructor.
pub(crate) fn check_positive_weights(weights: &[f64]) -> Result<()> {
    if let Some(&w) = weights.iter().find(|w| !(w.is_finite() && **w > 0.0)) {
        return Err(IsogeoError::InvalidOperation(format!(
            "control point weights must be positive and finite, got {w}"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use isogeo_math::DVec4;

    fn data() -> SplineData {
        SplineData::new(
            vec![1, 2],
            vec![vec![0.0, 0.0, 1.0, 1.0], vec![0.0, 0.0, 0.0, 1.0, 1.0, 1.0]],
            ControlNet::new(&[2, 3], vec![DVec4::W; 6]).unwrap(),
        )
        .unwrap()
    }

    #[test]
    fn test_rejects_mismatched_knots() {
        let err = SplineData::new(
            vec![1, 2],
            vec![vec![0.0, 0.0, 1.0, 1.0], vec![0.0, 0.0, 1.0, 1.0]],
            ControlNet::new(&[2, 3], vec![DVec4::W; 6]).unwrap(),
        )
        .unwrap_err();
        match err {
            IsogeoError::DimensionMismatch(msg) => assert!(msg.starts_with("direction v")),
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn test_rejects_wrong_direction_count() {
        assert!(SplineData::new(
            vec![1],
            vec![vec![0.0, 0.0, 1.0, 1.0]],
            ControlNet::new(&[2, 3], vec![DVec4::W; 6]).unwrap(),
        )
        .is_err());
    }

    #[test]
    fn test_derive_updates_one_direction() {
        let d = data().derive(1).unwrap();
        assert_eq!(d.degrees, vec![1, 1]);
        assert_eq!(d.knots[1], vec![0.0, 0.0, 1.0, 1.0]);
        assert_eq!(d.knots[0], data().knots[0]);
        assert!(data().derive(2).is_err());
    }

    #[test]
    fn test_elevated_to_is_noop_when_high_enough() {
        let d = data();
        assert_eq!(d.elevated_to(1, 2).unwrap(), d);
        assert_eq!(d.elevated_to(0, 3).unwrap().degrees, vec![3, 2]);
    }

    #[test]
    fn test_deserialize_validates() {
        let json = serde_json::to_string(&data()).unwrap();
        let back: SplineData = serde_json::from_str(&json).unwrap();
        assert_eq!(back, data());

        let broken = json.replace("[0.0,0.0,1.0,1.0]", "[0.0,1.0,1.0]");
        assert!(serde_json::from_str::<SplineData>(&broken).is_err());
    }

    #[test]
    fn test_positive_weights() {
        assert!(check_positive_weights(&[1.0, 0.5]).is_ok());
        assert!(check_positive_weights(&[1.0, 0.0]).is_err());
    }
}
