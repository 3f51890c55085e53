use crate::utils::error::{ReplaceError, Result};
use url::Url;

pub trait Validate {
    fn validate(&self) -> Result<()>;
}

pub fn validate_url(field_name: &str, url_str: &str) -> Result<()> {
    if url_str.is_empty() {
        return Err(ReplaceError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: url_str.to_string(),
            reason: "URL cannot be empty".to_string(),
        });
    }

    match Url::parse(url_str) {
        Ok(url) => match url.scheme() {
            "http" | "https" => Ok(()),
            scheme => Err(ReplaceError::InvalidConfigValueError {
                field: field_name.to_string(),
                value: url_str.to_string(),
                reason: format!("Unsupported URL scheme: {}", scheme),
            }),
        },
        Err(e) => Err(ReplaceError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: url_str.to_string(),
            reason: format!("Invalid URL format: {}", e),
        }),
    }
}

/// 表單欄位：缺值時回傳 ValidationError（不是設定錯誤）
pub fn validate_required_field<'a, T>(field_name: &str, value: &'a Option<T>) -> Result<&'a T> {
    value
        .as_ref()
        .ok_or_else(|| ReplaceError::validation(format!("Missing required field: {}", field_name)))
}

pub fn validate_non_empty_string(field_name: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(ReplaceError::validation(format!(
            "Field '{}' cannot be empty or whitespace-only",
            field_name
        )));
    }
    Ok(())
}

pub fn validate_range<T: PartialOrd + std::fmt::Display + Copy>(
    field_name: &str,
    value: T,
    min: T,
    max: T,
) -> Result<()> {
    if value < min || value > max {
        return Err(ReplaceError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: format!("Value must be between {} and {}", min, max),
        });
    }
    Ok(())
}

pub fn validate_one_of<T: PartialEq + std::fmt::Display>(
    field_name: &str,
    value: T,
    allowed: &[T],
) -> Result<()> {
    if !allowed.contains(&value) {
        let allowed_list = allowed
            .iter()
            .map(|v| v.to_string())
            .collect::<Vec<_>>()
            .join(", ");
        return Err(ReplaceError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: format!("Allowed values: {}", allowed_list),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_url() {
        assert!(validate_url("server.base_url", "https://example.com/api").is_ok());
        assert!(validate_url("server.base_url", "http://localhost:5000").is_ok());
        assert!(validate_url("server.base_url", "").is_err());
        assert!(validate_url("server.base_url", "invalid-url").is_err());
        assert!(validate_url("server.base_url", "ftp://example.com").is_err());
    }

    #[test]
    fn test_validate_required_field_is_a_form_error() {
        let missing: Option<String> = None;
        let err = validate_required_field("class", &missing).unwrap_err();
        assert!(matches!(err, ReplaceError::ValidationError { .. }));
        assert_eq!(
            validate_required_field("class", &Some("D1".to_string())).unwrap(),
            "D1"
        );
    }

    #[test]
    fn test_validate_range_and_one_of() {
        assert!(validate_range("server.timeout_seconds", 30u64, 1, 300).is_ok());
        assert!(validate_range("server.timeout_seconds", 0u64, 1, 300).is_err());
        assert!(validate_one_of("defaults.slots_per_day", 8usize, &[5, 8]).is_ok());
        assert!(validate_one_of("defaults.slots_per_day", 6usize, &[5, 8]).is_err());
    }

    #[test]
    fn test_validate_non_empty_string() {
        assert!(validate_non_empty_string("branch", "CSE").is_ok());
        assert!(validate_non_empty_string("branch", "   ").is_err());
    }
}
