//! Tensor-product control nets of homogeneous points.

use isogeo_core::{IsogeoError, Result};
use isogeo_math::{to_homogeneous, GridIndex, HPoint, Point3};
use serde::{Deserialize, Serialize};

/// A rectangular grid of homogeneous control points with 1 to 3 directions.
///
/// Points are stored flat with the u index varying fastest, see
/// [`GridIndex`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawNet")]
pub struct ControlNet {
    grid: GridIndex,
    points: Vec<HPoint>,
}

#[derive(Deserialize)]
struct RawNet {
    grid: GridIndex,
    points: Vec<HPoint>,
}

impl TryFrom<RawNet> for ControlNet {
    type Error = IsogeoError;

    fn try_from(raw: RawNet) -> Result<Self> {
        let counts = raw.grid.counts();
        Self::new(&counts[..raw.grid.directions()], raw.points)
    }
}

impl ControlNet {
    pub fn new(counts: &[usize], points: Vec<HPoint>) -> Result<Self> {
        let grid = GridIndex::new(counts)?;
        if grid.len() != points.len() {
            return Err(IsogeoError::DimensionMismatch(format!(
                "control grid {counts:?} needs {} points, got {}",
                grid.len(),
                points.len()
            )));
        }
        Ok(Self { grid, points })
    }

    /// Net of Cartesian points with unit weights.
    pub fn from_points(counts: &[usize], points: &[Point3]) -> Result<Self> {
        Self::new(counts, points.iter().map(|&p| to_homogeneous(p, 1.0)).collect())
    }

    /// Net of Cartesian points and matching weights.
    pub fn from_weighted(counts: &[usize], points: &[Point3], weights: &[f64]) -> Result<Self> {
        if points.len() != weights.len() {
            return Err(IsogeoError::DimensionMismatch(format!(
                "{} points but {} weights",
                points.len(),
                weights.len()
            )));
        }
        Self::new(
            counts,
            points
                .iter()
                .zip(weights)
                .map(|(&p, &w)| to_homogeneous(p, w))
                .collect(),
        )
    }

    pub fn grid(&self) -> GridIndex {
        self.grid
    }

    pub fn directions(&self) -> usize {
        self.grid.directions()
    }

    pub fn count(&self, axis: usize) -> usize {
        self.grid.count(axis)
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn points(&self) -> &[HPoint] {
        &self.points
    }

    pub fn points_mut(&mut self) -> &mut [HPoint] {
        &mut self.points
    }

    pub fn into_points(self) -> Vec<HPoint> {
        self.points
    }

    pub fn weights(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.w).collect()
    }

    pub fn get(&self, index: [usize; 3]) -> Result<HPoint> {
        Ok(self.points[self.grid.to_flat(index)?])
    }

    /// Rebuild the net by transforming every line of points running along
    /// `axis`. Each call to `f` must return exactly `new_count` points.
    pub fn map_lines<F>(&self, axis: usize, new_count: usize, mut f: F) -> Result<Self>
    where
        F: FnMut(&[HPoint]) -> Result<Vec<HPoint>>,
    {
        if axis >= self.directions() {
            return Err(IsogeoError::InvalidOperation(format!(
                "axis {axis} out of range for a net with {} directions",
                self.directions()
            )));
        }
        let count = self.grid.count(axis);
        let stride = self.grid.stride(axis);
        let out_grid = self.grid.with_count(axis, new_count);
        let new_stride = out_grid.stride(axis);
        let mut out = vec![HPoint::ZERO; out_grid.len()];
        let mut line = Vec::with_capacity(count);

        for start in self.grid.line_starts(axis) {
            line.clear();
            line.extend((0..count).map(|i| self.points[start + i * stride]));
            let mapped = f(&line)?;
            if mapped.len() != new_count {
                return Err(IsogeoError::DimensionMismatch(format!(
                    "line transform returned {} points, expected {new_count}",
                    mapped.len()
                )));
            }
            let out_start = out_grid.to_flat(self.grid.to_multi(start)?)?;
            for (i, p) in mapped.into_iter().enumerate() {
                out[out_start + i * new_stride] = p;
            }
        }

        Ok(Self {
            grid: out_grid,
            points: out,
        })
    }
}
