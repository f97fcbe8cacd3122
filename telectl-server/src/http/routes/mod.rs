//! Route handlers organized by resource

pub mod agent_config;
pub mod health;
pub mod ingestion_rules;
pub mod pipelines;

use telectl_core::ValidationError;

/// Parse a numeric path segment, reporting failures as validation errors.
pub(crate) fn parse_positive(field: &'static str, raw: &str) -> Result<i32, ValidationError> {
    let value = raw.trim().parse::<i32>().map_err(|_| ValidationError::InvalidFormat {
        field,
        reason: "expected an integer",
    })?;
    if value < 1 {
        return Err(ValidationError::OutOfRange {
            field,
            min: 1,
            max: i32::MAX as i64,
        });
    }
    Ok(value)
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn positive_integers_only() {
        assert_eq!(parse_positive("version", "3").unwrap(), 3);
        assert!(matches!(
            parse_positive("version", "0"),
            Err(ValidationError::OutOfRange { .. })
        ));
        assert!(matches!(
            parse_positive("version", "latest"),
            Err(ValidationError::InvalidFormat { .. })
        ));
    }
}
