//! Sampling utilities: uniform parameter grids, batch evaluation and
//! adaptive polylines.

use isogeo_core::{IsogeoError, Result, Tolerance};
use isogeo_math::Point3;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::curve::Curve;
use crate::spline::Spline;
use crate::{NurbsCurve, NurbsSurface, NurbsVolume};

/// Configuration for uniform grid sampling.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SampleConfig {
    /// Samples along each parametric direction; directions a spline does
    /// not have are ignored.
    pub counts: [usize; 3],

    /// Whether to evaluate in parallel (via rayon).
    pub parallel: bool,
}

impl Default for SampleConfig {
    fn default() -> Self {
        Self {
            counts: [11, 11, 11],
            parallel: true,
        }
    }
}

impl SampleConfig {
    /// Same number of samples in every direction.
    pub fn uniform(count: usize) -> Self {
        Self {
            counts: [count; 3],
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_counts(mut self, counts: [usize; 3]) -> Self {
        self.counts = counts;
        self
    }

    /// Enable or disable parallel evaluation. Output order is the same
    /// either way.
    #[must_use]
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }
}

/// `count` evenly spaced values from `start` to `end` inclusive.
///
/// The last value is exactly `end`, so sampling never steps past a knot
/// domain through rounding.
pub fn linspace(start: f64, end: f64, count: usize) -> Vec<f64> {
    match count {
        0 => Vec::new(),
        1 => vec![start],
        _ => {
            let step = (end - start) / (count - 1) as f64;
            (0..count)
                .map(|i| if i == count - 1 { end } else { start + step * i as f64 })
                .collect()
        }
    }
}

fn axis_values<S: Spline>(spline: &S, axis: usize, count: usize) -> Result<Vec<f64>> {
    if count == 0 {
        return Err(IsogeoError::InvalidOperation(format!(
            "sample count along direction {axis} must be positive"
        )));
    }
    let (lo, hi) = spline.param_range(axis)?;
    Ok(linspace(lo, hi, count))
}

fn run<S: Spline>(spline: &S, params: &[S::Param], parallel: bool) -> Result<Vec<Point3>> {
    if parallel {
        spline.positions(params)
    } else {
        params.iter().map(|&p| spline.position(p)).collect()
    }
}

/// Points at `config.counts[0]` uniform parameters over the curve domain.
pub fn sample_curve(curve: &NurbsCurve, config: &SampleConfig) -> Result<Vec<Point3>> {
    let us = axis_values(curve, 0, config.counts[0])?;
    run(curve, &us, config.parallel)
}

/// Points over a uniform `(u, v)` grid, u varying fastest.
pub fn sample_surface(surface: &NurbsSurface, config: &SampleConfig) -> Result<Vec<Point3>> {
    let us = axis_values(surface, 0, config.counts[0])?;
    let vs = axis_values(surface, 1, config.counts[1])?;
    let params: Vec<(f64, f64)> = vs
        .iter()
        .flat_map(|&v| us.iter().map(move |&u| (u, v)))
        .collect();
    debug!(count = params.len(), "sampling surface");
    run(surface, &params, config.parallel)
}

/// Points over a uniform `(u, v, w)` grid, u fastest then v.
pub fn sample_volume(volume: &NurbsVolume, config: &SampleConfig) -> Result<Vec<Point3>> {
    let us = axis_values(volume, 0, config.counts[0])?;
    let vs = axis_values(volume, 1, config.counts[1])?;
    let ws = axis_values(volume, 2, config.counts[2])?;
    let mut params = Vec::with_capacity(us.len() * vs.len() * ws.len());
    for &w in &ws {
        for &v in &vs {
            params.extend(us.iter().map(|&u| (u, v, w)));
        }
    }
    debug!(count = params.len(), "sampling volume");
    run(volume, &params, config.parallel)
}

/// Maximum recursion depth for adaptive subdivision.
const MAX_DEPTH: u32 = 12;

/// Convert a curve to a polyline using adaptive subdivision.
///
/// Segments are split while the curve midpoint deviates from the chord
/// midpoint by more than `tolerance.linear`.
pub fn curve_to_polyline(curve: &dyn Curve, tolerance: Tolerance) -> Result<Vec<Point3>> {
    let (t_min, t_max) = curve.domain();
    let mut points = vec![curve.point_at(t_min)?];
    subdivide_curve(curve, t_min, t_max, tolerance.linear, &mut points, 0)?;
    Ok(points)
}

fn subdivide_curve(
    curve: &dyn Curve,
    t0: f64,
    t1: f64,
    tolerance: f64,
    points: &mut Vec<Point3>,
    depth: u32,
) -> Result<()> {
    let p1 = curve.point_at(t1)?;
    if depth >= MAX_DEPTH {
        points.push(p1);
        return Ok(());
    }

    let t_mid = (t0 + t1) * 0.5;
    let p0 = curve.point_at(t0)?;
    let p_mid = curve.point_at(t_mid)?;

    let chord_mid = (p0 + p1) * 0.5;
    if (p_mid - chord_mid).length() > tolerance {
        subdivide_curve(curve, t0, t_mid, tolerance, points, depth + 1)?;
        subdivide_curve(curve, t_mid, t1, tolerance, points, depth + 1)?;
    } else {
        points.push(p1);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use isogeo_math::DVec3;

    fn quarter_circle() -> NurbsCurve {
        NurbsCurve::from_weighted(
            2,
            vec![0.0, 0.0, 0.0, 1.0, 1.0, 1.0],
            &[DVec3::X, DVec3::new(1.0, 1.0, 0.0), DVec3::Y],
            &[1.0, std::f64::consts::FRAC_1_SQRT_2, 1.0],
        )
        .unwrap()
    }

    #[test]
    fn test_linspace() {
        assert!(linspace(0.0, 1.0, 0).is_empty());
        assert_eq!(linspace(2.0, 3.0, 1), vec![2.0]);
        let t = linspace(0.0, 1.0, 10);
        assert_eq!(t.len(), 10);
        assert_eq!(t[9], 1.0);
        assert!((t[2] - 2.0 / 9.0).abs() < 1e-15);
    }

    #[test]
    fn test_parallel_matches_serial() {
        let curve = quarter_circle();
        let config = SampleConfig::uniform(64);
        let par = sample_curve(&curve, &config).unwrap();
        let ser = sample_curve(&curve, &config.with_parallel(false)).unwrap();
        assert_eq!(par, ser);
        assert_eq!(par[0], DVec3::X);
    }

    #[test]
    fn test_surface_grid_is_u_fastest() {
        let surface = NurbsSurface::from_grid(
            [1, 1],
            [vec![0.0, 0.0, 1.0, 1.0], vec![0.0, 0.0, 1.0, 1.0]],
            &[vec![DVec3::ZERO, DVec3::Y], vec![DVec3::X, DVec3::new(1.0, 1.0, 0.0)]],
        )
        .unwrap();
        let config = SampleConfig::default().with_counts([3, 2, 1]);
        let pts = sample_surface(&surface, &config).unwrap();
        assert_eq!(pts.len(), 6);
        assert!((pts[1] - DVec3::new(0.5, 0.0, 0.0)).length() < 1e-15);
        assert!((pts[3] - DVec3::new(0.0, 1.0, 0.0)).length() < 1e-15);
    }

    #[test]
    fn test_zero_count_rejected() {
        let curve = quarter_circle();
        assert!(sample_curve(&curve, &SampleConfig::uniform(0)).is_err());
    }

    #[test]
    fn test_polyline_on_circle() {
        let points = curve_to_polyline(&quarter_circle(), Tolerance::loose()).unwrap();
        assert!(points.len() > 4, "got {} points", points.len());
        for p in &points {
            assert!((p.length() - 1.0).abs() < 1e-12);
        }
        assert!((points[points.len() - 1] - DVec3::Y).length() < 1e-12);
    }

    #[test]
    fn test_polyline_of_line_is_two_points() {
        let line =
            NurbsCurve::from_points(1, vec![0.0, 0.0, 1.0, 1.0], &[DVec3::ZERO, DVec3::X]).unwrap();
        let points = curve_to_polyline(&line, Tolerance::default()).unwrap();
        assert_eq!(points.len(), 2);
    }
}
