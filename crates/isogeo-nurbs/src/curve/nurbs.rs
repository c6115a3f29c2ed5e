//! NURBS curves.

use isogeo_core::{IsogeoError, Result};
use isogeo_math::{BinomialCache, HPoint, Point3, Vector3};
use serde::{Deserialize, Deserializer, Serialize};

use super::Curve;
use crate::nurbs::deboor;
use crate::nurbs::knot::snap_param;
use crate::nurbs::net::ControlNet;
use crate::nurbs::rational::rational_curve_derivs;
use crate::spline::{check_positive_weights, Spline, SplineData};

/// A NURBS (Non-Uniform Rational B-Spline) curve.
///
/// Control points are stored homogeneously, `(x*w, y*w, z*w, w)`. Values are
/// immutable: every edit returns a new curve.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct NurbsCurve {
    data: SplineData,
}

impl<'de> Deserialize<'de> for NurbsCurve {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        SplineData::deserialize_with(deserializer, 1).map(|data| Self { data })
    }
}

impl NurbsCurve {
    /// Build a curve from homogeneous control points.
    ///
    /// Weights are not checked here so derivative curves, whose weight
    /// channel may be zero or negative, are valid curves too.
    pub fn new(degree: usize, knots: Vec<f64>, control_points: Vec<HPoint>) -> Result<Self> {
        let net = ControlNet::new(&[control_points.len()], control_points)?;
        Ok(Self {
            data: SplineData::new(vec![degree], vec![knots], net)?,
        })
    }

    /// Non-rational curve: every weight is 1.
    pub fn from_points(degree: usize, knots: Vec<f64>, points: &[Point3]) -> Result<Self> {
        let net = ControlNet::from_points(&[points.len()], points)?;
        Ok(Self {
            data: SplineData::new(vec![degree], vec![knots], net)?,
        })
    }

    /// Rational curve from Cartesian points and positive weights.
    pub fn from_weighted(
        degree: usize,
        knots: Vec<f64>,
        points: &[Point3],
        weights: &[f64],
    ) -> Result<Self> {
        check_positive_weights(weights)?;
        let net = ControlNet::from_weighted(&[points.len()], points, weights)?;
        Ok(Self {
            data: SplineData::new(vec![degree], vec![knots], net)?,
        })
    }

    fn from_data(data: SplineData) -> Self {
        Self { data }
    }

    pub fn degree(&self) -> usize {
        self.data.degrees[0]
    }

    pub fn knots(&self) -> &[f64] {
        &self.data.knots[0]
    }

    pub fn control_points(&self) -> &[HPoint] {
        self.data.net.points()
    }

    pub fn weights(&self) -> Vec<f64> {
        self.data.net.weights()
    }

    fn check_param(&self, t: f64) -> Result<f64> {
        snap_param(self.knots(), t, "t")
    }

    /// Homogeneous derivatives `A^(k)(t)` for `k = 0..=order`.
    pub fn homogeneous_derivs_at(&self, t: f64, order: usize) -> Result<Vec<HPoint>> {
        let t = self.check_param(t)?;
        let points = self.control_points();
        Ok(deboor::curve_derivs(self.degree(), self.knots(), points, t, order))
    }

    /// Rational derivatives `C^(k)(t)` for `k = 0..=order`.
    ///
    /// Order 0 is just the projected point and never touches `binomials`.
    pub fn derivatives_at(
        &self,
        t: f64,
        order: usize,
        binomials: &BinomialCache,
    ) -> Result<Vec<Vector3>> {
        if order == 0 {
            return Ok(vec![self.position(t)?]);
        }
        let aders = self.homogeneous_derivs_at(t, order)?;
        rational_curve_derivs(&aders, binomials)
    }

    /// The homogeneous derivative curve, one degree lower.
    pub fn derivative(&self) -> Result<Self> {
        Ok(Self::from_data(self.data.derive(0)?))
    }

    /// Successive derivative curves `A', A'', ..., A^(order)`.
    ///
    /// A curve of degree below `order` is first degree-elevated to `order`
    /// so that every derivative up to `order` has its own curve.
    pub fn derivative_nets(&self, order: usize) -> Result<Vec<Self>> {
        let mut current = Self::from_data(self.data.elevated_to(0, order)?);
        let mut nets = Vec::with_capacity(order);
        for _ in 0..order {
            current = current.derivative()?;
            nets.push(current.clone());
        }
        Ok(nets)
    }

    /// Rational derivatives evaluated from precomputed derivative curves.
    ///
    /// `nets[k - 1]` must be the k-th derivative curve, as returned by
    /// [`NurbsCurve::derivative_nets`].
    pub fn derivatives_from_nets(
        &self,
        nets: &[Self],
        t: f64,
        binomials: &BinomialCache,
    ) -> Result<Vec<Vector3>> {
        let mut aders = Vec::with_capacity(nets.len() + 1);
        aders.push(self.evaluate(t)?);
        for net in nets {
            aders.push(net.evaluate(t)?);
        }
        rational_curve_derivs(&aders, binomials)
    }

    /// Insert knot `u` `times` times. The curve shape is unchanged.
    pub fn insert_knot(&self, u: f64, times: usize) -> Result<Self> {
        Ok(Self::from_data(self.data.insert(0, u, times)?))
    }

    /// Raise the degree by `times`. The curve shape is unchanged.
    pub fn elevate_degree(&self, times: usize) -> Result<Self> {
        Ok(Self::from_data(self.data.elevate(0, times)?))
    }

    /// Translate the control points at `indices` by `displacement`.
    pub fn move_points(&self, displacement: Vector3, indices: &[usize]) -> Result<Self> {
        Ok(Self::from_data(self.data.moved(displacement, indices)?))
    }

    /// Replace weights at `indices`, keeping the Cartesian control points.
    pub fn set_weights(&self, weights: &[f64], indices: &[usize]) -> Result<Self> {
        Ok(Self::from_data(self.data.reweighted(weights, indices)?))
    }
}

impl Spline for NurbsCurve {
    type Param = f64;

    fn degrees(&self) -> &[usize] {
        &self.data.degrees
    }

    fn knot_vectors(&self) -> &[Vec<f64>] {
        &self.data.knots
    }

    fn control_net(&self) -> &ControlNet {
        &self.data.net
    }

    fn evaluate(&self, t: f64) -> Result<HPoint> {
        let t = self.check_param(t)?;
        Ok(deboor::curve_point(self.degree(), self.knots(), self.control_points(), t))
    }

    fn differentiate(&self, direction: usize) -> Result<Self> {
        if direction != 0 {
            return Err(IsogeoError::InvalidOperation(format!(
                "a curve has one parametric direction, got {direction}"
            )));
        }
        self.derivative()
    }
}

impl Curve for NurbsCurve {
    fn point_at(&self, t: f64) -> Result<Point3> {
        self.position(t)
    }

    fn tangent_at(&self, t: f64) -> Result<Vector3> {
        // first order only needs C(1, 1), which the cache answers without a table
        let ders = self.derivatives_at(t, 1, &BinomialCache::new())?;
        Ok(ders[1])
    }

    fn domain(&self) -> (f64, f64) {
        let p = self.degree();
        let knots = self.knots();
        (knots[p], knots[knots.len() - p - 1])
    }
}
