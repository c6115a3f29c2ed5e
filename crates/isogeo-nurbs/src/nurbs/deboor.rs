//! De Boor style evaluation of B-spline curves, surfaces and volumes in
//! homogeneous space.
//!
//! Every function here returns homogeneous points; dividing by the weight
//! channel is the job of [`super::rational`].

use isogeo_core::Result;
use isogeo_math::HPoint;

use super::knot::{basis_functions, basis_functions_derivs, find_span, BasisWindow};
use super::net::ControlNet;

/// Evaluate a B-spline curve point at parameter `t` using the De Boor algorithm.
#[allow(clippy::needless_range_loop)]
pub fn curve_point(degree: usize, knots: &[f64], control_points: &[HPoint], t: f64) -> HPoint {
    let n = control_points.len() - 1;
    let span = find_span(degree, knots, n, t);
    let basis = basis_functions(degree, knots, span, t);

    let mut point = HPoint::ZERO;
    for i in 0..=degree {
        point += basis[i] * control_points[span - degree + i];
    }

    point
}

/// Derivatives `C^(k)(t)` for `k = 0..=order` of a B-spline curve.
///
/// Orders above the degree come back as exact zeros.
pub fn curve_derivs(
    degree: usize,
    knots: &[f64],
    control_points: &[HPoint],
    t: f64,
    order: usize,
) -> Vec<HPoint> {
    let n = control_points.len() - 1;
    let span = find_span(degree, knots, n, t);
    let ders = basis_functions_derivs(degree, knots, span, t, order);

    ders.iter()
        .map(|row| {
            row.iter()
                .enumerate()
                .fold(HPoint::ZERO, |acc, (i, &b)| {
                    acc + b * control_points[span - degree + i]
                })
        })
        .collect()
}

/// Contract the net against one basis window per direction.
///
/// The u direction is collapsed first over every active (v, w) line, then v,
/// then w. Directions the net does not have take [`BasisWindow::unit`].
pub fn contract(net: &ControlNet, windows: [&BasisWindow; 3]) -> HPoint {
    let [wu, wv, ww] = windows;
    let points = net.points();
    let n_u = net.count(0);
    let n_v = net.count(1);

    let mut acc_w = HPoint::ZERO;
    for (c, &bw) in ww.values.iter().enumerate() {
        let k = ww.first() + c;
        let mut acc_v = HPoint::ZERO;
        for (b, &bv) in wv.values.iter().enumerate() {
            let j = wv.first() + b;
            let row = n_u * (j + n_v * k) + wu.first();
            let acc_u = wu
                .values
                .iter()
                .enumerate()
                .fold(HPoint::ZERO, |acc, (a, &bu)| acc + bu * points[row + a]);
            acc_v += bv * acc_u;
        }
        acc_w += bw * acc_v;
    }
    acc_w
}

/// Evaluate a B-spline surface point at parameters `(u, v)`.
pub fn surface_point(
    degrees: [usize; 2],
    knots: [&[f64]; 2],
    net: &ControlNet,
    u: f64,
    v: f64,
) -> Result<HPoint> {
    let wu = BasisWindow::at(degrees[0], knots[0], net.count(0), u, "u")?;
    let wv = BasisWindow::at(degrees[1], knots[1], net.count(1), v, "v")?;
    Ok(contract(net, [&wu, &wv, &BasisWindow::unit()]))
}

/// Partial derivatives of a B-spline surface.
///
/// Returns `skl` with `skl[k][l]` the derivative taken `k` times in u and
/// `l` times in v, for `k + l <= order`. Entries with `k + l > order` are
/// left at zero, as are orders above the degree in either direction.
pub fn surface_derivs(
    degrees: [usize; 2],
    knots: [&[f64]; 2],
    net: &ControlNet,
    u: f64,
    v: f64,
    order: usize,
) -> Result<Vec<Vec<HPoint>>> {
    let du = order.min(degrees[0]);
    let dv = order.min(degrees[1]);
    let nu = BasisWindow::derivs_at(degrees[0], knots[0], net.count(0), u, du, "u")?;
    let nv = BasisWindow::derivs_at(degrees[1], knots[1], net.count(1), v, dv, "v")?;
    let unit = BasisWindow::unit();

    let mut skl = vec![vec![HPoint::ZERO; order + 1]; order + 1];
    for (k, wu) in nu.iter().enumerate() {
        for (l, wv) in nv.iter().enumerate().take(order - k + 1) {
            skl[k][l] = contract(net, [wu, wv, &unit]);
        }
    }
    Ok(skl)
}

/// Evaluate a B-spline volume point at parameters `(u, v, w)`.
pub fn volume_point(
    degrees: [usize; 3],
    knots: [&[f64]; 3],
    net: &ControlNet,
    param: (f64, f64, f64),
) -> Result<HPoint> {
    volume_partial(degrees, knots, net, param, [0, 0, 0])
}

/// One partial derivative of a B-spline volume, `orders[d]` times along
/// direction `d`.
pub fn volume_partial(
    degrees: [usize; 3],
    knots: [&[f64]; 3],
    net: &ControlNet,
    param: (f64, f64, f64),
    orders: [usize; 3],
) -> Result<HPoint> {
    let (u, v, w) = param;
    let mut windows = Vec::with_capacity(3);
    for (axis, (t, name)) in [(u, "u"), (v, "v"), (w, "w")].into_iter().enumerate() {
        let mut ders = BasisWindow::derivs_at(
            degrees[axis],
            knots[axis],
            net.count(axis),
            t,
            orders[axis],
            name,
        )?;
        // derivs_at always yields orders[axis] + 1 rows
        windows.push(ders.swap_remove(orders[axis]));
    }
    Ok(contract(net, [&windows[0], &windows[1], &windows[2]]))
}
