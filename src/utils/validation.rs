use crate::utils::error::{KitError, Result};
use url::Url;

pub trait Validate {
    fn validate(&self) -> Result<()>;
}

pub fn validate_url(field_name: &str, url_str: &str) -> Result<()> {
    if url_str.is_empty() {
        return Err(KitError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: url_str.to_string(),
            reason: "URL cannot be empty".to_string(),
        });
    }

    match Url::parse(url_str) {
        Ok(url) => match url.scheme() {
            "http" | "https" => Ok(()),
            scheme => Err(KitError::InvalidConfigValueError {
                field: field_name.to_string(),
                value: url_str.to_string(),
                reason: format!("Unsupported URL scheme: {}", scheme),
            }),
        },
        Err(e) => Err(KitError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: url_str.to_string(),
            reason: format!("Invalid URL format: {}", e),
        }),
    }
}

pub fn validate_path(field_name: &str, path: &str) -> Result<()> {
    if path.is_empty() {
        return Err(KitError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: path.to_string(),
            reason: "Path cannot be empty".to_string(),
        });
    }

    if path.contains('\0') {
        return Err(KitError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: path.to_string(),
            reason: "Path contains null bytes".to_string(),
        });
    }

    Ok(())
}

pub fn validate_non_empty_string(field_name: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(KitError::InvalidConfigValueError {
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
        return Err(KitError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: format!("Value must be between {} and {}", min, max),
        });
    }
    Ok(())
}

/// Accepts `owner/repo` where both parts use GitHub's name alphabet.
pub fn validate_repo_slug(field_name: &str, slug: &str) -> Result<()> {
    let valid_part =
        |p: &str| !p.is_empty() && p.chars().all(|c| c.is_ascii_alphanumeric() || "._-".contains(c));

    match slug.split_once('/') {
        Some((owner, repo)) if valid_part(owner) && valid_part(repo) => Ok(()),
        _ => Err(KitError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: slug.to_string(),
            reason: "Expected OWNER/REPO".to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_url() {
        assert!(validate_url("github.api_base", "https://api.github.com").is_ok());
        assert!(validate_url("github.api_base", "http://localhost:8080").is_ok());
        assert!(validate_url("github.api_base", "").is_err());
        assert!(validate_url("github.api_base", "invalid-url").is_err());
        assert!(validate_url("github.api_base", "ftp://example.com").is_err());
    }

    #[test]
    fn test_validate_path() {
        assert!(validate_path("paths.changelog", "CHANGELOG.md").is_ok());
        assert!(validate_path("paths.changelog", "").is_err());
        assert!(validate_path("paths.changelog", "bad\0path").is_err());
    }

    #[test]
    fn test_validate_range() {
        assert!(validate_range("github.timeout_seconds", 15, 1, 300).is_ok());
        assert!(validate_range("github.timeout_seconds", 0, 1, 300).is_err());
        assert!(validate_range("github.timeout_seconds", 301, 1, 300).is_err());
    }

    #[test]
    fn test_validate_repo_slug() {
        assert!(validate_repo_slug("repo", "octo-org/hello.world").is_ok());
        assert!(validate_repo_slug("repo", "octo-org").is_err());
        assert!(validate_repo_slug("repo", "octo/hello/world").is_err());
        assert!(validate_repo_slug("repo", "/repo").is_err());
    }

    #[test]
    fn test_validate_non_empty_string() {
        assert!(validate_non_empty_string("todos.pattern", "TODO").is_ok());
        assert!(validate_non_empty_string("todos.pattern", "   ").is_err());
    }
}
