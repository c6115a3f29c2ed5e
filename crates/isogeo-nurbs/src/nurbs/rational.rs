//! Rational correction: true NURBS derivatives from homogeneous ones.
//!
//! A NURBS entity is `S = A / W` where `A` is the xyz part of the homogeneous
//! B-spline and `W` its weight channel. Differentiating `A = W * S` with the
//! Leibniz rule and solving for the highest-order term gives, for surfaces,
//!
//! ```text
//! S[k][l] = ( A[k][l] - sum_{j=1..l} C(l,j) W[0][j] S[k][l-j]
//!                     - sum_{i=1..k} C(k,i) ( W[i][0] S[k-i][l]
//!                                           + sum_{j=1..l} C(l,j) W[i][j] S[k-i][l-j] ) )
//!           / W[0][0]
//! ```
//!
//! evaluated in increasing total order `k + l` (The NURBS Book, A4.2 and
//! A4.4). Curves use the single-index version.
//!
//! Volumes only get first derivatives: the three-index recursion is not
//! provided and higher requests fail with [`IsogeoError::Unsupported`].

use isogeo_core::{IsogeoError, Result};
use isogeo_math::homogeneous::check_weight;
use isogeo_math::{BinomialCache, HPoint, Vector3};

/// Rational curve derivatives `C^(k)` for `k = 0..aders.len()`.
///
/// `aders[k]` is the k-th derivative of the homogeneous curve.
pub fn rational_curve_derivs(aders: &[HPoint], binomials: &BinomialCache) -> Result<Vec<Vector3>> {
    let Some(first) = aders.first() else {
        return Ok(Vec::new());
    };
    let w0 = first.w;
    check_weight(w0)?;

    let mut ck: Vec<Vector3> = Vec::with_capacity(aders.len());
    ck.push(first.truncate() / w0);
    for k in 1..aders.len() {
        let mut v = aders[k].truncate();
        for i in 1..=k {
            v -= binomials.binomial(k, i) * aders[i].w * ck[k - i];
        }
        ck.push(v / w0);
    }
    Ok(ck)
}

/// Rational surface derivatives `S[k][l]` for `k + l <= order`.
///
/// `skl[k][l]` is the homogeneous derivative taken `k` times in u and `l`
/// times in v; it must cover every `k + l <= order`. Entries of the result
/// with `k + l > order` are zero.
pub fn rational_surface_derivs(
    skl: &[Vec<HPoint>],
    order: usize,
    binomials: &BinomialCache,
) -> Result<Vec<Vec<Vector3>>> {
    if skl.len() <= order || skl.iter().take(order + 1).any(|row| row.len() <= order) {
        return Err(IsogeoError::DimensionMismatch(format!(
            "derivative table must be at least {0} x {0}",
            order + 1
        )));
    }
    let w00 = skl[0][0].w;
    check_weight(w00)?;

    let a = |k: usize, l: usize| skl[k][l].truncate();
    let w = |k: usize, l: usize| skl[k][l].w;

    let mut s = vec![vec![Vector3::ZERO; order + 1]; order + 1];
    if order == 0 {
        s[0][0] = a(0, 0) / w00;
        return Ok(s);
    }

    for total in 0..=order {
        for k in 0..=total {
            let l = total - k;
            let mut v = a(k, l);
            for j in 1..=l {
                v -= binomials.binomial(l, j) * w(0, j) * s[k][l - j];
            }
            for i in 1..=k {
                let mut v2 = w(i, 0) * s[k - i][l];
                for j in 1..=l {
                    v2 += binomials.binomial(l, j) * w(i, j) * s[k - i][l - j];
                }
                v -= binomials.binomial(k, i) * v2;
            }
            s[k][l] = v / w00;
        }
    }
    Ok(s)
}

/// Reject volume derivative requests the rational correction cannot serve.
pub fn check_volume_order(orders: [usize; 3]) -> Result<()> {
    let total: usize = orders.iter().sum();
    if total > 1 {
        return Err(IsogeoError::Unsupported(format!(
            "rational volume derivatives of total order {total} ({orders:?}) are not available"
        )));
    }
    Ok(())
}

/// Position and first partials of a rational volume.
///
/// `h[0]` is the homogeneous point, `h[1..4]` its partials along u, v, w.
pub fn rational_volume_first_derivs(h: &[HPoint; 4]) -> Result<[Vector3; 4]> {
    let w0 = h[0].w;
    check_weight(w0)?;
    let s = h[0].truncate() / w0;
    let d = |p: HPoint| (p.truncate() - p.w * s) / w0;
    Ok([s, d(h[1]), d(h[2]), d(h[3])])
}

#[cfg(test)]
mod tests {
    use super::*;
    use isogeo_math::{DVec3, DVec4};

    #[test]
    fn test_curve_order_zero_divides_weight() {
        let cache = BinomialCache::new();
        let ck = rational_curve_derivs(&[DVec4::new(2.0, 4.0, 6.0, 2.0)], &cache).unwrap();
        assert_eq!(ck, vec![DVec3::new(1.0, 2.0, 3.0)]);
    }

    #[test]
    fn test_curve_quotient_rule() {
        // A(t) = (t, 0, 0), W(t) = 1 + t  =>  C = t / (1 + t)
        // C' = 1 / (1 + t)^2, C'' = -2 / (1 + t)^3
        let t: f64 = 0.5;
        let aders = [
            DVec4::new(t, 0.0, 0.0, 1.0 + t),
            DVec4::new(1.0, 0.0, 0.0, 1.0),
            DVec4::new(0.0, 0.0, 0.0, 0.0),
        ];
        let cache = BinomialCache::new();
        let ck = rational_curve_derivs(&aders, &cache).unwrap();
        assert!((ck[0].x - t / (1.0 + t)).abs() < 1e-15);
        assert!((ck[1].x - 1.0 / (1.0 + t).powi(2)).abs() < 1e-15);
        assert!((ck[2].x + 2.0 / (1.0 + t).powi(3)).abs() < 1e-14);
    }

    #[test]
    fn test_curve_zero_weight_rejected() {
        let cache = BinomialCache::new();
        let err = rational_curve_derivs(&[DVec4::new(1.0, 0.0, 0.0, 0.0)], &cache).unwrap_err();
        assert_eq!(err, IsogeoError::DegenerateWeight { weight: 0.0 });
    }

    #[test]
    fn test_surface_mixed_quotient_rule() {
        // A = (u v, 0, 0), W = 1 + u + v  =>  S = u v / (1 + u + v)
        let (u, v): (f64, f64) = (0.3, 0.7);
        let w = 1.0 + u + v;
        let mut skl = vec![vec![DVec4::ZERO; 3]; 3];
        skl[0][0] = DVec4::new(u * v, 0.0, 0.0, w);
        skl[1][0] = DVec4::new(v, 0.0, 0.0, 1.0);
        skl[0][1] = DVec4::new(u, 0.0, 0.0, 1.0);
        skl[1][1] = DVec4::new(1.0, 0.0, 0.0, 0.0);
        let cache = BinomialCache::new();
        let s = rational_surface_derivs(&skl, 2, &cache).unwrap();

        let su = v * (1.0 + v) / (w * w);
        let sv = u * (1.0 + u) / (w * w);
        // d/dv of v (1 + v) / w^2
        let suv = ((1.0 + 2.0 * v) * w - 2.0 * v * (1.0 + v)) / (w * w * w);
        let suu = -2.0 * v * (1.0 + v) / (w * w * w);
        assert!((s[0][0].x - u * v / w).abs() < 1e-15);
        assert!((s[1][0].x - su).abs() < 1e-14);
        assert!((s[0][1].x - sv).abs() < 1e-14);
        assert!((s[1][1].x - suv).abs() < 1e-14);
        assert!((s[2][0].x - suu).abs() < 1e-14);
    }

    #[test]
    fn test_surface_table_too_small() {
        let cache = BinomialCache::new();
        let skl = vec![vec![DVec4::W; 2]; 2];
        assert!(matches!(
            rational_surface_derivs(&skl, 2, &cache),
            Err(IsogeoError::DimensionMismatch(_))
        ));
    }

    #[test]
    fn test_volume_order_gate() {
        assert!(check_volume_order([0, 0, 0]).is_ok());
        assert!(check_volume_order([0, 1, 0]).is_ok());
        assert!(matches!(check_volume_order([1, 1, 0]), Err(IsogeoError::Unsupported(_))));
        assert!(matches!(check_volume_order([0, 0, 2]), Err(IsogeoError::Unsupported(_))));
    }

    #[test]
    fn test_volume_first_derivs() {
        // A = (u, 0, 0), W = 2 (constant)
        let h = [
            DVec4::new(0.5, 0.0, 0.0, 2.0),
            DVec4::new(1.0, 0.0, 0.0, 0.0),
            DVec4::ZERO,
            DVec4::ZERO,
        ];
        let d = rational_volume_first_derivs(&h).unwrap();
        assert_eq!(d[0], DVec3::new(0.25, 0.0, 0.0));
        assert_eq!(d[1], DVec3::new(0.5, 0.0, 0.0));
        assert_eq!(d[2], DVec3::ZERO);
    }
}
