use crate::error::{ConfigError, Result};

/// Implemented by every config type; `Config::validate` fans out.
pub trait Validate {
    fn validate(&self) -> Result<()>;
}

pub fn validate_positive(field: &str, value: usize) -> Result<()> {
    if value == 0 {
        return Err(ConfigError::ValidationError {
            field: field.to_string(),
            message: "must be > 0".to_string(),
        });
    }
    Ok(())
}

pub fn validate_unit_range(field: &str, value: f32) -> Result<()> {
    if !(0.0..=1.0).contains(&value) {
        return Err(ConfigError::ValidationError {
            field: field.to_string(),
            message: format!("must be within [0.0, 1.0], got {value}"),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn positive_rejects_zero() {
        assert!(validate_positive("x", 0).is_err());
        assert!(validate_positive("x", 1).is_ok());
    }

    #[test]
    fn unit_range_bounds() {
        assert!(validate_unit_range("score", 0.0).is_ok());
        assert!(validate_unit_range("score", 1.0).is_ok());
        assert!(validate_unit_range("score", 1.01).is_err());
        assert!(validate_unit_range("score", -0.1).is_err());
    }
}
