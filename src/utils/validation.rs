use crate::utils::error::{EtlError, Result};
use url::Url;

pub trait Validate {
    fn validate(&self) -> Result<()>;
}

pub fn validate_url(field_name: &str, url_str: &str) -> Result<()> {
    if url_str.is_empty() {
        return Err(EtlError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: url_str.to_string(),
            reason: "URL cannot be empty".to_string(),
        });
    }

    match Url::parse(url_str) {
        Ok(url) => match url.scheme() {
            "http" | "https" => Ok(()),
            scheme => Err(EtlError::InvalidConfigValueError {
                field: field_name.to_string(),
                value: url_str.to_string(),
                reason: format!("Unsupported URL scheme: {}", scheme),
            }),
        },
        Err(e) => Err(EtlError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: url_str.to_string(),
            reason: format!("Invalid URL format: {}", e),
        }),
    }
}

pub fn validate_database_url(field_name: &str, url_str: &str) -> Result<()> {
    let url = Url::parse(url_str).map_err(|e| EtlError::InvalidConfigValueError {
        field: field_name.to_string(),
        value: mask_password(url_str),
        reason: format!("Invalid URL format: {}", e),
    })?;

    match url.scheme() {
        "postgres" | "postgresql" => Ok(()),
        scheme => Err(EtlError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: mask_password(url_str),
            reason: format!("Expected a postgres:// URL, got scheme {}", scheme),
        }),
    }
}

/// Replaces the password component of a connection URL so it can be logged.
pub fn mask_password(url_str: &str) -> String {
    match Url::parse(url_str) {
        Ok(mut url) if url.password().is_some() => {
            let _ = url.set_password(Some("****"));
            url.to_string()
        }
        Ok(url) => url.to_string(),
        Err(_) => "<unparseable url>".to_string(),
    }
}

pub fn validate_required_field<'a, T>(field_name: &str, value: &'a Option<T>) -> Result<&'a T> {
    value.as_ref().ok_or_else(|| EtlError::MissingConfigError {
        field: field_name.to_string(),
    })
}

pub fn validate_non_empty_string(field_name: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(EtlError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: "Value cannot be empty or whitespace-only".to_string(),
        });
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
        return Err(EtlError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: format!("Value must be between {} and {}", min, max),
        });
    }
    Ok(())
}
