//! Binomial coefficients from a cached log-factorial table.
//!
//! The table stores `ln(n!)` computed with a Lanczos-style log-gamma
//! approximation (relative error below 2e-10). `C(n, k)` is recovered as
//! `floor(0.5 + exp(ln n! - ln k! - ln (n-k)!))`, which rounds to the exact
//! integer for every `n <= EXACT_CEILING`. Past that the log-gamma error is
//! amplified by the size of the coefficient and the rounding can land on a
//! neighbouring integer; beyond `n ~ 60` the coefficients no longer fit the
//! f64 integer range at all. Derivative orders used by the evaluators are
//! small (at most the spline degree), far below the ceiling.
//!
//! The cache only grows. It is safe to share between threads; call
//! [`BinomialCache::with_capacity`] to pre-populate it before a parallel
//! batch so workers never take the write lock.

use std::sync::{PoisonError, RwLock};

use tracing::{trace, warn};

/// Lanczos coefficients for [`ln_gamma`].
const LANCZOS: [f64; 6] = [
    76.180_091_729_471_46,
    -86.505_320_329_416_77,
    24.014_098_240_830_91,
    -1.231_739_572_450_155,
    0.120_865_097_386_617_9e-2,
    -0.539_523_938_495_3e-5,
];

/// Natural logarithm of the gamma function for `x > 0`.
pub fn ln_gamma(x: f64) -> f64 {
    let mut y = x;
    let tmp = x + 5.5;
    let tmp = tmp - (x + 0.5) * tmp.ln();
    let mut ser = 1.000_000_000_190_015;
    for c in LANCZOS {
        y += 1.0;
        ser += c / y;
    }
    -tmp + (2.506_628_274_631_000_5 * ser / x).ln()
}

/// Append-only table of `ln(n!)` used to compute binomial coefficients.
#[derive(Debug)]
pub struct BinomialCache {
    ln_factorials: RwLock<Vec<f64>>,
}

impl BinomialCache {
    /// Largest `n` for which `binomial(n, k)` is guaranteed exact.
    pub const EXACT_CEILING: usize = 30;

    pub fn new() -> Self {
        Self {
            ln_factorials: RwLock::new(vec![0.0, 0.0]),
        }
    }

    /// Create a cache already holding `ln(k!)` for every `k <= n`.
    pub fn with_capacity(n: usize) -> Self {
        let cache = Self::new();
        cache.ensure(n);
        cache
    }

    /// Number of cached entries (`ln(0!)` through `ln((len-1)!)`).
    pub fn len(&self) -> usize {
        self.ln_factorials
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Grow the table so it covers `ln(n!)`.
    pub fn ensure(&self, n: usize) {
        if n < self.len() {
            return;
        }
        let mut table = self
            .ln_factorials
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        // another writer may have grown it in between
        let start = table.len();
        if n < start {
            return;
        }
        trace!(from = start, to = n, "growing log-factorial table");
        table.extend((start..=n).map(|k| ln_gamma(k as f64 + 1.0)));
    }

    /// `ln(n!)`.
    pub fn ln_factorial(&self, n: usize) -> f64 {
        if n <= 1 {
            return 0.0;
        }
        self.ensure(n);
        self.ln_factorials
            .read()
            .unwrap_or_else(PoisonError::into_inner)[n]
    }

    /// The binomial coefficient `C(n, k)`; zero when `k > n`.
    pub fn binomial(&self, n: usize, k: usize) -> f64 {
        if k > n {
            return 0.0;
        }
        if k == 0 || k == n {
            return 1.0;
        }
        if n > Self::EXACT_CEILING {
            warn!(n, k, "binomial coefficient above exact ceiling");
        }
        let ln = self.ln_factorial(n) - self.ln_factorial(k) - self.ln_factorial(n - k);
        (0.5 + ln.exp()).floor()
    }
}

impl Default for BinomialCache {
    fn default() -> Self {
        Self::new()
    }
}
