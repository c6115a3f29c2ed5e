//! Property-based tests for span location, basis functions and refinement.
//!
//! Run with: cargo test -p isogeo-nurbs -- proptest

use isogeo_math::DVec3;
use isogeo_nurbs::nurbs::{basis_functions, basis_functions_derivs, find_span};
use isogeo_nurbs::{Curve, NurbsCurve};
use proptest::prelude::*;

// =============================================================================
// Strategies
// =============================================================================

/// A clamped knot vector on `[0, 1]` for the given degree, with between 0 and
/// 5 sorted interior knots.
fn arb_clamped_knots(degree: usize) -> impl Strategy<Value = Vec<f64>> {
    prop::collection::vec(0.01..0.99f64, 0..=5).prop_map(move |mut interior| {
        interior.sort_by(|a, b| a.total_cmp(b));
        let mut knots = vec![0.0; degree + 1];
        knots.extend(interior);
        knots.extend(std::iter::repeat(1.0).take(degree + 1));
        knots
    })
}

fn arb_degree_and_knots() -> impl Strategy<Value = (usize, Vec<f64>)> {
    (1usize..=4).prop_flat_map(|degree| (Just(degree), arb_clamped_knots(degree)))
}

fn arb_curve() -> impl Strategy<Value = NurbsCurve> {
    arb_degree_and_knots().prop_flat_map(|(degree, knots)| {
        let count = knots.len() - degree - 1;
        (
            prop::collection::vec(prop::array::uniform3(-10.0..10.0f64), count),
            prop::collection::vec(0.2..5.0f64, count),
        )
            .prop_map(move |(coords, weights)| {
                let points: Vec<DVec3> = coords.iter().map(|&c| DVec3::from_array(c)).collect();
                NurbsCurve::from_weighted(degree, knots.clone(), &points, &weights)
                    .expect("strategy builds valid curves")
            })
    })
}

// =============================================================================
// Properties
// =============================================================================

proptest! {
    #[test]
    fn proptest_partition_of_unity((degree, knots) in arb_degree_and_knots(), t in 0.0..=1.0f64) {
        let n = knots.len() - degree - 2;
        let span = find_span(degree, &knots, n, t);
        let basis = basis_functions(degree, &knots, span, t);
        prop_assert_eq!(basis.len(), degree + 1);
        let sum: f64 = basis.iter().sum();
        prop_assert!((sum - 1.0).abs() < 1e-12, "sum = {}", sum);
        prop_assert!(basis.iter().all(|&b| b >= -1e-15));
    }

    #[test]
    fn proptest_span_contains_parameter(
        (degree, knots) in arb_degree_and_knots(),
        t in 0.0..=1.0f64
    ) {
        let n = knots.len() - degree - 2;
        let span = find_span(degree, &knots, n, t);
        prop_assert!(span >= degree && span <= n);
        if t == 1.0 {
            prop_assert_eq!(span, n);
        } else {
            prop_assert!(knots[span] <= t && t < knots[span + 1]);
        }
    }

    #[test]
    fn proptest_derivative_rows_sum_to_zero(
        (degree, knots) in arb_degree_and_knots(),
        t in 0.0..=1.0f64
    ) {
        let n = knots.len() - degree - 2;
        let span = find_span(degree, &knots, n, t);
        let ders = basis_functions_derivs(degree, &knots, span, t, degree + 1);
        for row in ders.iter().skip(1) {
            let sum: f64 = row.iter().sum();
            let scale: f64 = row.iter().map(|v| v.abs()).sum::<f64>().max(1.0);
            prop_assert!(sum.abs() < 1e-9 * scale, "row sum = {}", sum);
        }
        prop_assert!(ders[degree + 1].iter().all(|&v| v == 0.0));
    }

    #[test]
    fn proptest_knot_insertion_keeps_shape(
        curve in arb_curve(),
        u in 0.05..0.95f64,
        t in 0.0..=1.0f64
    ) {
        let Ok(refined) = curve.insert_knot(u, 1) else {
            // multiplicity already at the degree
            return Ok(());
        };
        let a = curve.point_at(t).unwrap();
        let b = refined.point_at(t).unwrap();
        prop_assert!((a - b).length() < 1e-9 * (1.0 + a.length()));
    }

    #[test]
    fn proptest_degree_elevation_keeps_shape(curve in arb_curve(), t in 0.0..=1.0f64) {
        let elevated = curve.elevate_degree(1).unwrap();
        prop_assert_eq!(elevated.degree(), curve.degree() + 1);
        let a = curve.point_at(t).unwrap();
        let b = elevated.point_at(t).unwrap();
        prop_assert!((a - b).length() < 1e-9 * (1.0 + a.length()));
    }
}
