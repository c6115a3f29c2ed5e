/// Tolerances for geometric comparisons.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Tolerance {
    /// Linear tolerance for distance comparisons (in model units)
    pub linear: f64,
    /// Tolerance for parametric comparisons (knot values, parameters)
    pub parametric: f64,
}

impl Tolerance {
    pub const DEFAULT_LINEAR: f64 = 1e-7;
    pub const DEFAULT_PARAMETRIC: f64 = 1e-12;

    pub fn new(linear: f64, parametric: f64) -> Self {
        Self { linear, parametric }
    }

    pub fn default_precision() -> Self {
        Self {
            linear: Self::DEFAULT_LINEAR,
            parametric: Self::DEFAULT_PARAMETRIC,
        }
    }

    pub fn loose() -> Self {
        Self {
            linear: 1e-4,
            parametric: 1e-9,
        }
    }

    pub fn tight() -> Self {
        Self {
            linear: 1e-10,
            parametric: 1e-14,
        }
    }

    /// Check if two values are equal within linear tolerance
    pub fn linear_eq(self, a: f64, b: f64) -> bool {
        (a - b).abs() < self.linear
    }

    /// Check if a value is zero within linear tolerance
    pub fn is_zero(self, v: f64) -> bool {
        v.abs() < self.linear
    }

    /// Check if two parameter values coincide
    pub fn parametric_eq(self, a: f64, b: f64) -> bool {
        (a - b).abs() <= self.parametric
    }
}

impl Default for Tolerance {
    fn default() -> Self {
        Self::default_precision()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_presets_are_ordered() {
        let loose = Tolerance::loose();
        let default = Tolerance::default();
        let tight = Tolerance::tight();
        assert!(loose.linear > default.linear && default.linear > tight.linear);
        assert!(loose.parametric > default.parametric && default.parametric > tight.parametric);
    }

    #[test]
    fn test_comparisons() {
        let tol = Tolerance::default();
        assert!(tol.linear_eq(1.0, 1.0 + 1e-9));
        assert!(!tol.linear_eq(1.0, 1.001));
        assert!(tol.is_zero(-1e-9));
        assert!(tol.parametric_eq(0.5, 0.5));
        assert!(!tol.parametric_eq(0.5, 0.5 + 1e-6));
    }

    #[test]
    fn test_serde_round_trip() {
        let tol = Tolerance::new(1e-3, 1e-8);
        let json = serde_json::to_string(&tol).unwrap();
        let back: Tolerance = serde_json::from_str(&json).unwrap();
        assert_eq!(back, tol);
    }
}
