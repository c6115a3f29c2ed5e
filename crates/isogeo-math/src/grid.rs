//! Flat/multi index conversion for tensor-product control grids.
//!
//! Every control net in isogeo is stored flat with the u index varying
//! fastest, then v, then w:
//!
//! ```text
//! flat = i + n_u * (j + n_v * k)
//! ```
//!
//! Curves and surfaces use the same layout with the unused trailing counts
//! set to 1.

use isogeo_core::{IsogeoError, Result};
use serde::{Deserialize, Serialize};

/// Shape of a control grid with up to three parametric directions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawGrid")]
pub struct GridIndex {
    counts: [usize; 3],
    directions: usize,
}

#[derive(Deserialize)]
struct RawGrid {
    counts: [usize; 3],
    directions: usize,
}

impl TryFrom<RawGrid> for GridIndex {
    type Error = IsogeoError;

    fn try_from(raw: RawGrid) -> Result<Self> {
        let directions = raw.directions;
        if directions == 0 || directions > 3 {
            return Err(IsogeoError::DimensionMismatch(format!(
                "a control grid has 1 to 3 directions, got {directions}"
            )));
        }
        if raw.counts[directions..].iter().any(|&c| c != 1) {
            return Err(IsogeoError::DimensionMismatch(format!(
                "unused grid directions must have count 1, got {:?}",
                raw.counts
            )));
        }
        Self::new(&raw.counts[..directions])
    }
}

impl GridIndex {
    /// Build a grid shape from one count per parametric direction.
    pub fn new(counts: &[usize]) -> Result<Self> {
        if counts.is_empty() || counts.len() > 3 {
            return Err(IsogeoError::DimensionMismatch(format!(
                "a control grid has 1 to 3 directions, got {}",
                counts.len()
            )));
        }
        if counts.iter().any(|&c| c == 0) {
            return Err(IsogeoError::DimensionMismatch(format!(
                "control grid counts must be positive, got {counts:?}"
            )));
        }
        let mut padded = [1; 3];
        padded[..counts.len()].copy_from_slice(counts);
        Ok(Self {
            counts: padded,
            directions: counts.len(),
        })
    }

    /// Number of parametric directions (1 curve, 2 surface, 3 volume).
    pub fn directions(&self) -> usize {
        self.directions
    }

    /// Count along each direction, padded with 1.
    pub fn counts(&self) -> [usize; 3] {
        self.counts
    }

    pub fn count(&self, axis: usize) -> usize {
        self.counts[axis]
    }

    /// Total number of grid entries.
    pub fn len(&self) -> usize {
        self.counts.iter().product()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Distance in the flat array between neighbours along `axis`.
    pub fn stride(&self, axis: usize) -> usize {
        self.counts[..axis].iter().product()
    }

    /// Same grid with the count along `axis` replaced.
    pub fn with_count(&self, axis: usize, count: usize) -> Self {
        let mut counts = self.counts;
        counts[axis] = count;
        Self {
            counts,
            directions: self.directions,
        }
    }

    pub fn to_flat(&self, index: [usize; 3]) -> Result<usize> {
        for axis in 0..3 {
            if index[axis] >= self.counts[axis] {
                return Err(IsogeoError::InvalidOperation(format!(
                    "grid index {index:?} out of bounds for counts {:?}",
                    self.counts
                )));
            }
        }
        Ok(index[0] + self.counts[0] * (index[1] + self.counts[1] * index[2]))
    }

    pub fn to_multi(&self, flat: usize) -> Result<[usize; 3]> {
        if flat >= self.len() {
            return Err(IsogeoError::InvalidOperation(format!(
                "flat index {flat} out of bounds for {} grid entries",
                self.len()
            )));
        }
        let i = flat % self.counts[0];
        let rest = flat / self.counts[0];
        Ok([i, rest % self.counts[1], rest / self.counts[1]])
    }

    /// Flat index of the first entry of every line running along `axis`,
    /// in flat order.
    pub fn line_starts(&self, axis: usize) -> Vec<usize> {
        let stride = self.stride(axis);
        let span = stride * self.counts[axis];
        (0..self.len())
            .filter(|&flat| flat % span < stride)
            .collect()
    }
}
