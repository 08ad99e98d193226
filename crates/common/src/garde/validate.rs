//! Garde validation utilities.

use crate::domain::DomainError;
use garde::{Report, Validate};

/// Validate a value, rendering any garde report as `DomainError::ValidationError`
pub fn validate_struct<T>(value: &T) -> Result<(), DomainError>
where
    T: Validate,
    T::Context: Default,
{
    value
        .validate()
        .map_err(|report| DomainError::ValidationError(render_report(&report)))
}

/// Render a garde report as `path: message` pairs joined by `, `
fn render_report(report: &Report) -> String {
    report
        .iter()
        .map(|(path, error)| {
            let path = path.to_string();
            if path.is_empty() {
                error.message().to_string()
            } else {
                format!("{}: {}", path, error.message())
            }
        })
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use garde::Validate;

    #[derive(Validate)]
    struct Reading {
        #[garde(range(min = 0.0, max = 100.0))]
        humidity: f64,
        #[garde(range(min = 0.0))]
        wind_speed: f64,
    }

    #[test]
    fn test_validate_success() {
        let reading = Reading {
            humidity: 55.0,
            wind_speed: 3.0,
        };
        assert!(validate_struct(&reading).is_ok());
    }

    #[test]
    fn test_every_failing_field_is_reported() {
        let reading = Reading {
            humidity: 120.0,
            wind_speed: -1.0,
        };
        match validate_struct(&reading) {
            Err(DomainError::ValidationError(msg)) => {
                assert!(msg.contains("humidity"));
                assert!(msg.contains("wind_speed"));
                assert!(msg.contains(", "));
            }
            other => panic!("Expected ValidationError, got {:?}", other),
        }
    }
}
