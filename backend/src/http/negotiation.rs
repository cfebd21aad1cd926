//! `Accept` header matching for the JSON routes.

use axum::{
    extract::Request,
    http::{header, HeaderMap},
    middleware::Next,
    response::Response,
};

use super::error::AppError;

/// Media ranges that admit an `application/json` response.
const JSON_RANGES: [&str; 3] = ["application/json", "application/*", "*/*"];

/// Returns true when the `Accept` header is absent or admits JSON.
pub fn accepts_json(headers: &HeaderMap) -> bool {
    let values: Vec<_> = headers.get_all(header::ACCEPT).iter().collect();
    if values.is_empty() {
        return true;
    }

    values
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(','))
        .map(|range| range.split(';').next().unwrap_or("").trim().to_ascii_lowercase())
        .any(|range| range.is_empty() || JSON_RANGES.contains(&range.as_str()))
}

/// Route layer that lets non-JSON requests fall through to not-found.
pub async fn require_json_accept(request: Request, next: Next) -> Result<Response, AppError> {
    if !accepts_json(request.headers()) {
        return Err(AppError::NotFound(format!(
            "{} does not accept application/json",
            request.uri()
        )));
    }
    Ok(next.run(request).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn with_accept(value: &'static str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(header::ACCEPT, HeaderValue::from_static(value));
        headers
    }

    #[test]
    fn test_absent_accept_is_json() {
        assert!(accepts_json(&HeaderMap::new()));
    }

    #[test]
    fn test_json_ranges() {
        assert!(accepts_json(&with_accept("application/json")));
        assert!(accepts_json(&with_accept("application/json;charset=UTF-8")));
        assert!(accepts_json(&with_accept("text/html, application/*;q=0.8")));
        assert!(accepts_json(&with_accept("*/*")));
    }

    #[test]
    fn test_non_json_ranges() {
        assert!(!accepts_json(&with_accept("text/html")));
        assert!(!accepts_json(&with_accept("application/xml, text/plain")));
    }
}
