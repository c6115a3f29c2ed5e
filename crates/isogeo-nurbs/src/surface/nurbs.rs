//! NURBS surfaces.

use isogeo_core::{IsogeoError, Result, Tolerance};
use isogeo_math::{BinomialCache, HPoint, Point3, Vector3};
use serde::{Deserialize, Deserializer, Serialize};

use super::Surface;
use crate::nurbs::deboor;
use crate::nurbs::net::ControlNet;
use crate::nurbs::rational::rational_surface_derivs;
use crate::spline::{check_positive_weights, Spline, SplineData};

/// A NURBS surface, tensor product of a u and a v direction.
///
/// The control net is stored flat with u varying fastest.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct NurbsSurface {
    data: SplineData,
}

impl<'de> Deserialize<'de> for NurbsSurface {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        SplineData::deserialize_with(deserializer, 2).map(|data| Self { data })
    }
}

/// Homogeneous derivative surfaces of a [`NurbsSurface`] for every
/// `(k, l)` with `k + l <= order`.
///
/// Entry `(0, 0)` is the surface itself, degree-elevated where needed so
/// that no requested derivative runs out of degree.
#[derive(Debug, Clone, PartialEq)]
pub struct SurfaceDerivativeNets {
    order: usize,
    nets: Vec<Vec<NurbsSurface>>,
}

impl SurfaceDerivativeNets {
    pub fn order(&self) -> usize {
        self.order
    }

    /// The surface differentiated `k` times in u and `l` times in v.
    pub fn get(&self, k: usize, l: usize) -> Option<&NurbsSurface> {
        self.nets.get(k).and_then(|row| row.get(l))
    }
}

/// Flatten `points[i][j]` (i along u) into u-fastest order.
fn flatten_grid<T: Copy>(points: &[Vec<T>]) -> Result<(usize, usize, Vec<T>)> {
    let n_u = points.len();
    let n_v = points.first().map_or(0, Vec::len);
    if let Some(row) = points.iter().find(|row| row.len() != n_v) {
        return Err(IsogeoError::DimensionMismatch(format!(
            "ragged control grid: rows of {n_v} and {} points",
            row.len()
        )));
    }
    let mut flat = Vec::with_capacity(n_u * n_v);
    for j in 0..n_v {
        for row in points {
            flat.push(row[j]);
        }
    }
    Ok((n_u, n_v, flat))
}

impl NurbsSurface {
    /// Build a surface from a homogeneous control net with two directions.
    pub fn new(degrees: [usize; 2], knots: [Vec<f64>; 2], net: ControlNet) -> Result<Self> {
        let [knots_u, knots_v] = knots;
        Ok(Self {
            data: SplineData::new(degrees.to_vec(), vec![knots_u, knots_v], net)?,
        })
    }

    /// Non-rational surface from `points[i][j]`, `i` along u and `j` along v.
    pub fn from_grid(
        degrees: [usize; 2],
        knots: [Vec<f64>; 2],
        points: &[Vec<Point3>],
    ) -> Result<Self> {
        let (n_u, n_v, flat) = flatten_grid(points)?;
        Self::new(degrees, knots, ControlNet::from_points(&[n_u, n_v], &flat)?)
    }

    /// Rational surface from a point grid and a matching grid of positive
    /// weights.
    pub fn from_weighted_grid(
        degrees: [usize; 2],
        knots: [Vec<f64>; 2],
        points: &[Vec<Point3>],
        weights: &[Vec<f64>],
    ) -> Result<Self> {
        let (n_u, n_v, flat) = flatten_grid(points)?;
        let (w_u, w_v, flat_weights) = flatten_grid(weights)?;
        if (w_u, w_v) != (n_u, n_v) {
            return Err(IsogeoError::DimensionMismatch(format!(
                "{n_u} x {n_v} points but {w_u} x {w_v} weights"
            )));
        }
        check_positive_weights(&flat_weights)?;
        Self::new(
            degrees,
            knots,
            ControlNet::from_weighted(&[n_u, n_v], &flat, &flat_weights)?,
        )
    }

    fn from_data(data: SplineData) -> Self {
        Self { data }
    }

    pub fn degree_u(&self) -> usize {
        self.data.degrees[0]
    }

    pub fn degree_v(&self) -> usize {
        self.data.degrees[1]
    }

    pub fn knots_u(&self) -> &[f64] {
        &self.data.knots[0]
    }

    pub fn knots_v(&self) -> &[f64] {
        &self.data.knots[1]
    }

    fn degrees2(&self) -> [usize; 2] {
        [self.degree_u(), self.degree_v()]
    }

    /// Homogeneous partials `skl[k][l]` for `k + l <= order`.
    pub fn homogeneous_derivs_at(&self, u: f64, v: f64, order: usize) -> Result<Vec<Vec<HPoint>>> {
        deboor::surface_derivs(
            self.degrees2(),
            [self.knots_u(), self.knots_v()],
            &self.data.net,
            u,
            v,
            order,
        )
    }

    /// Rational partials `S[k][l]` for `k + l <= order`; entries past the
    /// total order are zero.
    pub fn derivatives_at(
        &self,
        u: f64,
        v: f64,
        order: usize,
        binomials: &BinomialCache,
    ) -> Result<Vec<Vec<Vector3>>> {
        if order == 0 {
            return Ok(vec![vec![self.position((u, v))?]]);
        }
        let skl = self.homogeneous_derivs_at(u, v, order)?;
        rational_surface_derivs(&skl, order, binomials)
    }

    /// The homogeneous derivative surface along `direction` (0 = u, 1 = v).
    pub fn derivative(&self, direction: usize) -> Result<Self> {
        Ok(Self::from_data(self.data.derive(direction)?))
    }

    /// Derivative surfaces for every `k + l <= order`.
    ///
    /// Mixed partials are formed by deriving along u first, then along v.
    pub fn derivative_nets(&self, order: usize) -> Result<SurfaceDerivativeNets> {
        let base = self.data.elevated_to(0, order)?.elevated_to(1, order)?;
        let mut nets: Vec<Vec<NurbsSurface>> = Vec::with_capacity(order + 1);
        let mut along_u = Self::from_data(base);
        for k in 0..=order {
            if k > 0 {
                along_u = along_u.derivative(0)?;
            }
            let mut row = Vec::with_capacity(order - k + 1);
            row.push(along_u.clone());
            for l in 1..=order - k {
                let next = row[l - 1].derivative(1)?;
                row.push(next);
            }
            nets.push(row);
        }
        Ok(SurfaceDerivativeNets { order, nets })
    }

    /// Rational partials evaluated from precomputed derivative surfaces.
    pub fn derivatives_from_nets(
        &self,
        nets: &SurfaceDerivativeNets,
        u: f64,
        v: f64,
        binomials: &BinomialCache,
    ) -> Result<Vec<Vec<Vector3>>> {
        let order = nets.order;
        let mut skl = vec![vec![HPoint::ZERO; order + 1]; order + 1];
        for (k, row) in nets.nets.iter().enumerate() {
            for (l, net) in row.iter().enumerate() {
                skl[k][l] = net.evaluate((u, v))?;
            }
        }
        rational_surface_derivs(&skl, order, binomials)
    }

    /// Insert knot `t` `times` times along `direction`.
    pub fn insert_knot(&self, direction: usize, t: f64, times: usize) -> Result<Self> {
        Ok(Self::from_data(self.data.insert(direction, t, times)?))
    }

    /// Raise the degree along `direction` by `times`.
    pub fn elevate_degree(&self, direction: usize, times: usize) -> Result<Self> {
        Ok(Self::from_data(self.data.elevate(direction, times)?))
    }

    pub fn move_points(&self, displacement: Vector3, indices: &[usize]) -> Result<Self> {
        Ok(Self::from_data(self.data.moved(displacement, indices)?))
    }

    pub fn set_weights(&self, weights: &[f64], indices: &[usize]) -> Result<Self> {
        Ok(Self::from_data(self.data.reweighted(weights, indices)?))
    }
}

impl Spline for NurbsSurface {
    type Param = (f64, f64);

    fn degrees(&self) -> &[usize] {
        &self.data.degrees
    }

    fn knot_vectors(&self) -> &[Vec<f64>] {
        &self.data.knots
    }

    fn control_net(&self) -> &ControlNet {
        &self.data.net
    }

    fn evaluate(&self, (u, v): (f64, f64)) -> Result<HPoint> {
        deboor::surface_point(
            self.degrees2(),
            [self.knots_u(), self.knots_v()],
            &self.data.net,
            u,
            v,
        )
    }

    fn differentiate(&self, direction: usize) -> Result<Self> {
        self.derivative(direction)
    }
}

impl Surface for NurbsSurface {
    fn point_at(&self, u: f64, v: f64) -> Result<Point3> {
        self.position((u, v))
    }

    fn normal_at(&self, u: f64, v: f64) -> Result<Vector3> {
        let s = self.derivatives_at(u, v, 1, &BinomialCache::new())?;
        let n = s[1][0].cross(s[0][1]);
        let len = n.length();
        if Tolerance::default().is_zero(len) {
            return Err(IsogeoError::InvalidOperation(format!(
                "surface normal undefined at ({u}, {v}): first partials are parallel"
            )));
        }
        Ok(n / len)
    }

    fn domain_u(&self) -> (f64, f64) {
        let p = self.degree_u();
        let k = self.knots_u();
        (k[p], k[k.len() - p - 1])
    }

    fn domain_v(&self) -> (f64, f64) {
        let p = self.degree_v();
        let k = self.knots_v();
        (k[p], k[k.len() - p - 1])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use isogeo_math::DVec3;

    fn bilinear() -> NurbsSurface {
        NurbsSurface::from_grid(
            [1, 1],
            [vec![0.0, 0.0, 1.0, 1.0], vec![0.0, 0.0, 1.0, 1.0]],
            &[
                vec![DVec3::new(0.0, 0.0, 0.0), DVec3::new(0.0, 1.0, 0.0)],
                vec![DVec3::new(1.0, 0.0, 0.0), DVec3::new(1.0, 1.0, 1.0)],
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_from_grid_is_u_fastest() {
        let s = bilinear();
        let net = s.control_net();
        assert_eq!(net.points()[1].truncate(), DVec3::new(1.0, 0.0, 0.0));
        assert_eq!(net.points()[2].truncate(), DVec3::new(0.0, 1.0, 0.0));
    }

    #[test]
    fn test_bilinear_point_and_partials() {
        let s = bilinear();
        let p = s.point_at(0.5, 0.5).unwrap();
        assert_relative_eq!(p.z, 0.25, epsilon = 1e-15);

        let d = s.derivatives_at(0.0, 0.0, 1, &BinomialCache::new()).unwrap();
        assert_relative_eq!(d[1][0].x, 1.0, epsilon = 1e-15);
        assert_relative_eq!(d[0][1].y, 1.0, epsilon = 1e-15);
    }

    #[test]
    fn test_normal_of_flat_corner() {
        let s = bilinear();
        let n = s.normal_at(0.0, 0.0).unwrap();
        assert_relative_eq!(n.z, 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_ragged_grid_rejected() {
        let err = NurbsSurface::from_grid(
            [1, 1],
            [vec![0.0, 0.0, 1.0, 1.0], vec![0.0, 0.0, 1.0, 1.0]],
            &[vec![DVec3::ZERO, DVec3::Y], vec![DVec3::X]],
        );
        assert!(matches!(err, Err(IsogeoError::DimensionMismatch(_))));
    }

    #[test]
    fn test_domain_error_names_direction() {
        let s = bilinear();
        assert!(matches!(
            s.evaluate((0.5, 2.0)),
            Err(IsogeoError::Domain { parameter: "v", .. })
        ));
    }

    #[test]
    fn test_derivative_nets_shape() {
        let s = bilinear();
        let nets = s.derivative_nets(2).unwrap();
        assert_eq!(nets.order(), 2);
        assert_eq!(nets.get(0, 0).unwrap().degree_u(), 2);
        assert_eq!(nets.get(1, 1).unwrap().degrees(), &[1, 1]);
        assert_eq!(nets.get(0, 2).unwrap().degree_v(), 0);
        assert!(nets.get(2, 1).is_none());
    }
}
