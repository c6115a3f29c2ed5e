//! Knot insertion and degree elevation.
//!
//! Both operations change the representation without changing the geometry.
//! They work on homogeneous points, so rational splines are refined exactly.

use isogeo_core::{IsogeoError, Result};
use isogeo_math::HPoint;
use tracing::debug;

use super::knot::{find_span, multiplicity};
use super::net::ControlNet;

/// Points and knots of a refined line together with its degree.
#[derive(Debug, Clone, PartialEq)]
pub struct Refined {
    pub degree: usize,
    pub points: Vec<HPoint>,
    pub knots: Vec<f64>,
}

/// Insert the knot `u` once (Boehm's algorithm).
fn insert_once(degree: usize, points: &[HPoint], knots: &[f64], u: f64) -> (Vec<HPoint>, Vec<f64>) {
    let n = points.len() - 1;
    let k = find_span(degree, knots, n, u);

    let new_points = (0..=n + 1)
        .map(|i| {
            if i + degree <= k {
                points[i]
            } else if i > k {
                points[i - 1]
            } else {
                let alpha = (u - knots[i]) / (knots[i + degree] - knots[i]);
                alpha * points[i] + (1.0 - alpha) * points[i - 1]
            }
        })
        .collect();

    let mut new_knots = Vec::with_capacity(knots.len() + 1);
    new_knots.extend_from_slice(&knots[..=k]);
    new_knots.push(u);
    new_knots.extend_from_slice(&knots[k + 1..]);

    (new_points, new_knots)
}

/// Insert `u` into the knot vector `times` times.
///
/// `u` must lie strictly inside the parametric domain and its final
/// multiplicity may not exceed the degree.
pub fn insert_knot(
    degree: usize,
    points: &[HPoint],
    knots: &[f64],
    u: f64,
    times: usize,
) -> Result<Refined> {
    let n = points.len() - 1;
    if !(u > knots[degree] && u < knots[n + 1]) {
        return Err(IsogeoError::Domain {
            parameter: "inserted knot",
            value: u,
            min: knots[degree],
            max: knots[n + 1],
        });
    }
    let existing = multiplicity(knots, u);
    if existing + times > degree {
        return Err(IsogeoError::InvalidOperation(format!(
            "inserting {u} {times} times would raise its multiplicity to {} above degree {degree}",
            existing + times
        )));
    }

    let mut pts = points.to_vec();
    let mut kts = knots.to_vec();
    for _ in 0..times {
        let (p, k) = insert_once(degree, &pts, &kts, u);
        pts = p;
        kts = k;
    }
    Ok(Refined {
        degree,
        points: pts,
        knots: kts,
    })
}

/// Elevate a Bezier segment by one degree.
fn elevate_bezier(segment: &[HPoint]) -> Vec<HPoint> {
    let p = segment.len() - 1;
    let q = (p + 1) as f64;
    (0..=p + 1)
        .map(|i| {
            if i == 0 {
                segment[0]
            } else if i == p + 1 {
                segment[p]
            } else {
                let a = i as f64 / q;
                a * segment[i - 1] + (1.0 - a) * segment[i]
            }
        })
        .collect()
}

fn is_clamped(degree: usize, knots: &[f64]) -> bool {
    let m = knots.len() - 1;
    knots[..=degree].iter().all(|&k| k == knots[0])
        && knots[m - degree..].iter().all(|&k| k == knots[m])
}

/// Raise the degree by `times`.
///
/// The spline is split into Bezier segments by knot insertion, each segment
/// is elevated, and the segments are joined again. Breakpoints keep C0
/// continuity (or stay discontinuous when they were), so the result is exact
/// but not necessarily the minimal representation. Control points under
/// surplus knot copies influence no span and are dropped. Requires clamped
/// ends.
pub fn elevate_degree(
    degree: usize,
    points: &[HPoint],
    knots: &[f64],
    times: usize,
) -> Result<Refined> {
    if times == 0 {
        return Ok(Refined {
            degree,
            points: points.to_vec(),
            knots: knots.to_vec(),
        });
    }
    if !is_clamped(degree, knots) {
        return Err(IsogeoError::InvalidKnots(
            "degree elevation requires a clamped knot vector".into(),
        ));
    }

    let n = points.len() - 1;
    let (start, end) = (knots[degree], knots[n + 1]);

    // distinct interior breakpoints with their multiplicities
    let mut breaks: Vec<(f64, usize)> = Vec::new();
    for &k in knots.iter().filter(|&&k| k > start && k < end) {
        match breaks.last_mut() {
            Some((value, mult)) if *value == k => *mult += 1,
            _ => breaks.push((k, 1)),
        }
    }

    // Bezier extraction
    let mut pts = points.to_vec();
    let mut kts = knots.to_vec();
    for &(u, mult) in &breaks {
        if mult < degree {
            let refined = insert_knot(degree, &pts, &kts, u, degree - mult)?;
            pts = refined.points;
            kts = refined.knots;
        }
    }

    // The segment starting at `a` sits on the `degree + 1` points below the
    // last copy of `a`. Neighbours share a point when `a` has exactly
    // `degree` copies; points under any further copies are dead.
    let new_degree = degree + times;
    let mut new_points = Vec::new();
    let mut new_knots = vec![start; new_degree + 1];
    let mut previous: Option<usize> = None;
    for a in std::iter::once(start).chain(breaks.iter().map(|&(u, _)| u)) {
        let span = kts.partition_point(|&k| k <= a) - 1;
        let first = span - degree;
        let shared = previous == Some(first);
        if previous.is_some() {
            let copies = if shared { new_degree } else { new_degree + 1 };
            new_knots.extend(std::iter::repeat(a).take(copies));
        }

        let mut elevated = pts[first..=span].to_vec();
        for _ in 0..times {
            elevated = elevate_bezier(&elevated);
        }
        new_points.extend_from_slice(&elevated[usize::from(shared)..]);
        previous = Some(span);
    }
    new_knots.extend(std::iter::repeat(end).take(new_degree + 1));

    debug!(
        degree,
        new_degree,
        points = points.len(),
        new_points = new_points.len(),
        "elevated degree"
    );

    Ok(Refined {
        degree: new_degree,
        points: new_points,
        knots: new_knots,
    })
}

/// Apply a line refinement to every line of `net` along `axis`.
///
/// Returns the refined net with the degree and knot vector shared by all
/// lines.
pub fn refine_net_axis<F>(
    net: &ControlNet,
    axis: usize,
    mut refine: F,
) -> Result<(ControlNet, usize, Vec<f64>)>
where
    F: FnMut(&[HPoint]) -> Result<Refined>,
{
    if axis >= net.directions() {
        return Err(IsogeoError::InvalidOperation(format!(
            "cannot refine along axis {axis} of a net with {} directions",
            net.directions()
        )));
    }
    // every line shares the knot vector, so the first one sets the shape
    let stride = net.grid().stride(axis);
    let first_line: Vec<HPoint> = (0..net.count(axis))
        .map(|i| net.points()[i * stride])
        .collect();
    let template = refine(&first_line)?;

    let refined = net.map_lines(axis, template.points.len(), |line| Ok(refine(line)?.points))?;
    Ok((refined, template.degree, template.knots))
}
