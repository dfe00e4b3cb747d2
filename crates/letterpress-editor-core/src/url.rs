use crate::error::UrlError;

/// Validate and normalize a user-entered URL.
///
/// The input is trimmed; it must contain at least one dot. A missing
/// `http://`/`https://` scheme is replaced by `http://`.
pub fn validate_url(input: &str) -> Result<String, UrlError> {
    let url = input.trim();
    if url.is_empty() {
        return Err(UrlError::Empty);
    }
    if !url.contains('.') {
        return Err(UrlError::MissingDot);
    }
    if url.starts_with("http://") || url.starts_with("https://") {
        Ok(url.to_string())
    } else {
        Ok(format!("http://{url}"))
    }
}

/// Whether `url` is something `validate_url` could have produced.
pub fn is_valid_link_target(url: &str) -> bool {
    (url.starts_with("http://") || url.starts_with("https://")) && url.contains('.')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prepends_scheme() {
        assert_eq!(
            validate_url("studiesabroad.com").as_deref(),
            Ok("http://studiesabroad.com")
        );
    }

    #[test]
    fn test_keeps_existing_scheme() {
        assert_eq!(
            validate_url("https://example.com/x.jpg").as_deref(),
            Ok("https://example.com/x.jpg")
        );
        assert_eq!(
            validate_url("  http://example.com ").as_deref(),
            Ok("http://example.com")
        );
    }

    #[test]
    fn test_rejects_without_dot() {
        assert_eq!(validate_url("localhost"), Err(UrlError::MissingDot));
        assert_eq!(validate_url("https://intranet"), Err(UrlError::MissingDot));
        assert_eq!(validate_url("   "), Err(UrlError::Empty));
    }

    #[test]
    fn test_valid_link_target() {
        assert!(is_valid_link_target("http://a.b"));
        assert!(!is_valid_link_target("ftp://a.b"));
        assert!(!is_valid_link_target("https://ab"));
    }
}
