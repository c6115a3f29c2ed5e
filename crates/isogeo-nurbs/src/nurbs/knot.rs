//! Knot vector utilities: span location and basis functions.

use isogeo_core::{IsogeoError, Result, Tolerance};

/// Find the knot span index for parameter `t` in the knot vector.
///
/// Returns the index `i` such that `knots[i] <= t < knots[i+1]`, with
/// special handling for the upper boundary, where the last non-empty span
/// is returned (`n` unless the end knot has extra copies).
///
/// # Arguments
/// * `degree` - Degree of the B-spline
/// * `knots` - The knot vector
/// * `n` - Number of control points minus 1
/// * `t` - Parameter value, assumed to lie in the knot domain
pub fn find_span(degree: usize, knots: &[f64], n: usize, t: f64) -> usize {
    // Special case: t at upper boundary
    if t >= knots[n + 1] {
        let end = knots[n + 1];
        return (degree..=n).rev().find(|&i| knots[i] < end).unwrap_or(n);
    }
    if t < knots[degree + 1] {
        return degree;
    }

    // Binary search
    let mut low = degree;
    let mut high = n + 1;
    let mut mid = (low + high) / 2;

    while t < knots[mid] || t >= knots[mid + 1] {
        if t < knots[mid] {
            high = mid;
        } else {
            low = mid;
        }
        mid = (low + high) / 2;
    }

    mid
}

/// Check `t` against `[knots[0], knots[last]]`.
///
/// Values within the default parametric tolerance outside an end are
/// snapped onto it, so `1.0 + 1e-13` evaluates as `1.0`.
pub fn snap_param(knots: &[f64], t: f64, parameter: &'static str) -> Result<f64> {
    let (min, max) = match (knots.first(), knots.last()) {
        (Some(&min), Some(&max)) => (min, max),
        _ => {
            return Err(IsogeoError::InvalidKnots("empty knot vector".into()));
        }
    };
    let tol = Tolerance::default();
    if tol.parametric_eq(t, min) && t < min {
        return Ok(min);
    }
    if tol.parametric_eq(t, max) && t > max {
        return Ok(max);
    }
    if !t.is_finite() || t < min || t > max {
        return Err(IsogeoError::Domain {
            parameter,
            value: t,
            min,
            max,
        });
    }
    Ok(t)
}

/// [`find_span`] with the parameter checked by [`snap_param`].
pub fn checked_span(
    degree: usize,
    knots: &[f64],
    n: usize,
    t: f64,
    parameter: &'static str,
) -> Result<usize> {
    let t = snap_param(knots, t, parameter)?;
    Ok(find_span(degree, knots, n, t))
}

/// Check that a knot vector is finite and non-decreasing, and that its
/// length matches `count + degree + 1`.
pub fn validate_knots(degree: usize, knots: &[f64], count: usize) -> Result<()> {
    if knots.len() != count + degree + 1 {
        return Err(IsogeoError::DimensionMismatch(format!(
            "expected {} knots for {count} control points of degree {degree}, got {}",
            count + degree + 1,
            knots.len()
        )));
    }
    if count < degree + 1 {
        return Err(IsogeoError::DimensionMismatch(format!(
            "degree {degree} needs at least {} control points, got {count}",
            degree + 1
        )));
    }
    if knots.iter().any(|k| !k.is_finite()) {
        return Err(IsogeoError::InvalidKnots("knots must be finite".into()));
    }
    if let Some(w) = knots.windows(2).position(|w| w[1] < w[0]) {
        return Err(IsogeoError::InvalidKnots(format!(
            "knots must be non-decreasing, found {} after {} at index {}",
            knots[w + 1],
            knots[w],
            w + 1
        )));
    }
    if knots[degree] >= knots[count] {
        return Err(IsogeoError::InvalidKnots(
            "knot vector has an empty parametric domain".into(),
        ));
    }
    Ok(())
}

/// Number of times `t` occurs in the knot vector.
pub fn multiplicity(knots: &[f64], t: f64) -> usize {
    knots.iter().filter(|&&k| k == t).count()
}

/// Division where a zero-length knot interval contributes nothing.
#[inline]
fn ratio(num: f64, den: f64) -> f64 {
    if den == 0.0 {
        0.0
    } else {
        num / den
    }
}

/// Compute the non-vanishing basis functions at parameter `t`.
///
/// Returns a vector of `degree + 1` basis function values N_{span-degree,degree}(t)
/// through N_{span,degree}(t).
///
/// # Arguments
/// * `degree` - Degree of the B-spline
/// * `knots` - The knot vector
/// * `span` - The knot span index (from `find_span`)
/// * `t` - Parameter value
pub fn basis_functions(degree: usize, knots: &[f64], span: usize, t: f64) -> Vec<f64> {
    let mut n = vec![0.0; degree + 1];
    let mut left = vec![0.0; degree + 1];
    let mut right = vec![0.0; degree + 1];

    n[0] = 1.0;

    for j in 1..=degree {
        left[j] = t - knots[span + 1 - j];
        right[j] = knots[span + j] - t;
        let mut saved = 0.0;

        for r in 0..j {
            let temp = ratio(n[r], right[r + 1] + left[j - r]);
            n[r] = saved + right[r + 1] * temp;
            saved = left[j - r] * temp;
        }

        n[j] = saved;
    }

    n
}

/// Compute basis functions and their derivatives up to `max_order` at `t`.
///
/// Returns `ders` with `ders[k][j]` the k-th derivative of
/// N_{span-degree+j,degree}(t). Rows with `k > degree` are identically zero.
#[allow(clippy::needless_range_loop)]
pub fn basis_functions_derivs(
    degree: usize,
    knots: &[f64],
    span: usize,
    t: f64,
    max_order: usize,
) -> Vec<Vec<f64>> {
    let p = degree;
    let mut ders = vec![vec![0.0; p + 1]; max_order + 1];

    // Triangular table: basis values in the upper triangle, knot differences
    // in the lower one.
    let mut ndu = vec![vec![0.0; p + 1]; p + 1];
    let mut left = vec![0.0; p + 1];
    let mut right = vec![0.0; p + 1];

    ndu[0][0] = 1.0;

    for j in 1..=p {
        left[j] = t - knots[span + 1 - j];
        right[j] = knots[span + j] - t;
        let mut saved = 0.0;

        for r in 0..j {
            // Lower triangle
            ndu[j][r] = right[r + 1] + left[j - r];
            let temp = ratio(ndu[r][j - 1], ndu[j][r]);

            // Upper triangle
            ndu[r][j] = saved + right[r + 1] * temp;
            saved = left[j - r] * temp;
        }
        ndu[j][j] = saved;
    }

    for j in 0..=p {
        ders[0][j] = ndu[j][p];
    }

    let top = max_order.min(p);
    let mut a = vec![vec![0.0; p + 1]; 2];

    for r in 0..=p {
        let mut s1 = 0usize;
        let mut s2 = 1usize;
        a[0][0] = 1.0;

        for k in 1..=top {
            let mut d = 0.0;
            let rk = r as isize - k as isize;
            let pk = p - k;

            if rk >= 0 {
                let rk = rk as usize;
                a[s2][0] = ratio(a[s1][0], ndu[pk + 1][rk]);
                d = a[s2][0] * ndu[rk][pk];
            }

            let j1 = if rk >= -1 { 1 } else { (-rk) as usize };
            let j2 = if r <= pk + 1 { k - 1 } else { p - r };

            for j in j1..=j2 {
                let idx = (rk + j as isize) as usize;
                a[s2][j] = ratio(a[s1][j] - a[s1][j - 1], ndu[pk + 1][idx]);
                d += a[s2][j] * ndu[idx][pk];
            }

            if r <= pk {
                a[s2][k] = ratio(-a[s1][k - 1], ndu[pk + 1][r]);
                d += a[s2][k] * ndu[r][pk];
            }

            ders[k][r] = d;

            std::mem::swap(&mut s1, &mut s2);
        }
    }

    // Multiply through by p! / (p - k)!
    let mut factor = p as f64;
    for k in 1..=top {
        for val in &mut ders[k] {
            *val *= factor;
        }
        factor *= (p - k) as f64;
    }

    ders
}

/// The `degree + 1` nonzero basis values (or one derivative order of them)
/// at a parameter, together with the span they are anchored to.
#[derive(Debug, Clone, PartialEq)]
pub struct BasisWindow {
    pub degree: usize,
    pub span: usize,
    pub values: Vec<f64>,
}

impl BasisWindow {
    /// Basis values at `t`, checked against the knot domain.
    pub fn at(
        degree: usize,
        knots: &[f64],
        count: usize,
        t: f64,
        parameter: &'static str,
    ) -> Result<Self> {
        let t = snap_param(knots, t, parameter)?;
        let span = find_span(degree, knots, count - 1, t);
        Ok(Self {
            degree,
            span,
            values: basis_functions(degree, knots, span, t),
        })
    }

    /// One window per derivative order `0..=max_order`.
    pub fn derivs_at(
        degree: usize,
        knots: &[f64],
        count: usize,
        t: f64,
        max_order: usize,
        parameter: &'static str,
    ) -> Result<Vec<Self>> {
        let t = snap_param(knots, t, parameter)?;
        let span = find_span(degree, knots, count - 1, t);
        Ok(basis_functions_derivs(degree, knots, span, t, max_order)
            .into_iter()
            .map(|values| Self {
                degree,
                span,
                values,
            })
            .collect())
    }

    /// Window for a direction the net does not have.
    pub fn unit() -> Self {
        Self {
            degree: 0,
            span: 0,
            values: vec![1.0],
        }
    }

    /// Index of the first control point the window touches.
    pub fn first(&self) -> usize {
        self.span - self.degree
    }
}
