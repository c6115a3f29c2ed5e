use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum IsogeoError {
    #[error("{parameter} = {value} is outside the knot domain [{min}, {max}]")]
    Domain {
        parameter: &'static str,
        value: f64,
        min: f64,
        max: f64,
    },

    #[error("Dimension mismatch: {0}")]
    DimensionMismatch(String),

    #[error("Invalid knot vector: {0}")]
    InvalidKnots(String),

    #[error("Degenerate weight {weight}: point at infinity")]
    DegenerateWeight { weight: f64 },

    #[error("Unsupported: {0}")]
    Unsupported(String),

    #[error("Invalid operation: {0}")]
    InvalidOperation(String),
}

pub type Result<T> = std::result::Result<T, IsogeoError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_domain_message() {
        let err = IsogeoError::Domain {
            parameter: "u",
            value: 1.5,
            min: 0.0,
            max: 1.0,
        };
        assert_eq!(
            err.to_string(),
            "u = 1.5 is outside the knot domain [0, 1]"
        );
    }

    #[test]
    fn test_degenerate_weight_message() {
        let err = IsogeoError::DegenerateWeight { weight: 0.0 };
        assert!(err.to_string().contains("point at infinity"));
    }
}
