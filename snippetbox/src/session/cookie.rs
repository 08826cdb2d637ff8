use headers::HeaderMapExt;
use http::HeaderMap;

/// Returns the session token carried by the request's `Cookie` header(s).
///
/// Empty values are treated as absent so that a cleared cookie starts a fresh session.
pub(crate) fn token_from_headers(headers: &HeaderMap, cookie_name: &str) -> Option<String> {
    let Some(cookie) = headers.typed_get::<headers::Cookie>() else {
        tracing::debug!("No cookie header found");
        return None;
    };

    match cookie.get(cookie_name) {
        Some(token) if !token.is_empty() => Some(token.to_string()),
        _ => {
            tracing::debug!("No session cookie '{}' found in cookies", cookie_name);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::HeaderValue;
    use http::header::COOKIE;

    fn headers_with(cookie: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(COOKIE, HeaderValue::from_str(cookie).unwrap());
        headers
    }

    #[test]
    fn test_token_found_among_other_cookies() {
        let headers = headers_with("theme=dark; session=abc123; lang=en");
        assert_eq!(
            token_from_headers(&headers, "session"),
            Some("abc123".to_string())
        );
    }

    #[test]
    fn test_token_missing() {
        assert_eq!(token_from_headers(&HeaderMap::new(), "session"), None);
        assert_eq!(
            token_from_headers(&headers_with("theme=dark"), "session"),
            None
        );
    }

    #[test]
    fn test_empty_token_is_absent() {
        assert_eq!(
            token_from_headers(&headers_with("session="), "session"),
            None
        );
    }

    #[test]
    fn test_name_must_match_exactly() {
        let headers = headers_with("my_session=abc");
        assert_eq!(token_from_headers(&headers, "session"), None);
    }
}
