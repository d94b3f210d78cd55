use crate::config::PageSizeLimits;
use crate::error::FieldViolation;

fn validate_length(value: &str, min: usize, max: usize) -> Result<(), String> {
    let n = value.chars().count();
    if n < min || n > max {
        return Err(format!("must contain from {min}-{max} characters"));
    }
    Ok(())
}

pub fn validate_name(value: &str) -> Result<(), String> {
    validate_length(value, 3, 100)?;
    if !value.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
        return Err("must contain only letters, digits, or underscore".to_string());
    }
    Ok(())
}

pub fn validate_password(value: &str) -> Result<(), String> {
    validate_length(value, 6, 100)
}

pub fn validate_email(value: &str) -> Result<(), String> {
    validate_length(value, 3, 200)?;
    match value.split_once('@') {
        Some((local, domain))
            if !local.is_empty()
                && !domain.is_empty()
                && !domain.contains('@')
                && !value.chars().any(char::is_whitespace) =>
        {
            Ok(())
        }
        _ => Err("is not a valid email address".to_string()),
    }
}

pub fn validate_author(value: &str) -> Result<(), String> {
    if value.is_empty() || !value.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Err("must be a non-empty alphanumeric string".to_string());
    }
    Ok(())
}

pub fn validate_not_blank(value: &str) -> Result<(), String> {
    if value.trim().is_empty() {
        return Err("must not be empty".to_string());
    }
    Ok(())
}

pub fn validate_price(value: i64) -> Result<(), String> {
    if value <= 0 {
        return Err("must be a positive amount".to_string());
    }
    Ok(())
}

/// Checks paging input and returns `(limit, offset)`. Out-of-range values
/// are an error, never clamped.
pub fn validate_page(
    page_no: i64,
    page_size: i64,
    limits: PageSizeLimits,
) -> Result<(i64, i64), Vec<FieldViolation>> {
    let mut violations = Vec::new();
    if page_no < 1 {
        violations.push(FieldViolation {
            field: "page_no",
            description: "must be at least 1".to_string(),
        });
    }
    if page_size < limits.min || page_size > limits.max {
        violations.push(FieldViolation {
            field: "page_size",
            description: format!("must be between {} and {}", limits.min, limits.max),
        });
    }
    if !violations.is_empty() {
        return Err(violations);
    }

    let offset = (page_no - 1)
        .checked_mul(page_size)
        .ok_or_else(|| {
            vec![FieldViolation {
                field: "page_no",
                description: "is too large".to_string(),
            }]
        })?;
    Ok((page_size, offset))
}

/// Collects a violation for `field` if `check` fails.
pub fn check_field(
    violations: &mut Vec<FieldViolation>,
    field: &'static str,
    check: Result<(), String>,
) {
    if let Err(description) = check {
        violations.push(FieldViolation { field, description });
    }
}
