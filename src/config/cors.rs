use axum::http::{header, HeaderName, HeaderValue, Method};
use std::env;
use std::time::Duration;
use tower_http::cors::{AllowOrigin, CorsLayer};

const PREFLIGHT_MAX_AGE: Duration = Duration::from_secs(60 * 60 * 24);

/// CORS for the web front end. Origins come from `CORS_ALLOWED_ORIGINS`
/// (comma separated) and fall back to the site URL.
pub fn create_cors_layer(site_url: &str) -> CorsLayer {
    let configured = env::var("CORS_ALLOWED_ORIGINS").unwrap_or_else(|_| site_url.to_string());

    CorsLayer::new()
        .allow_origin(allowed_origins(&configured))
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([
            header::CONTENT_TYPE,
            header::AUTHORIZATION,
            header::ACCEPT,
            header::COOKIE,
        ])
        .expose_headers([header::LOCATION, HeaderName::from_static("x-request-id")])
        .allow_credentials(true)
        .max_age(PREFLIGHT_MAX_AGE)
}

fn allowed_origins(raw: &str) -> AllowOrigin {
    let origins = parse_origins(raw);

    if origins.is_empty() {
        // Credentials cannot be combined with a wildcard, so mirror the caller instead.
        tracing::warn!("CORS: no valid origins configured, mirroring request origin");
        AllowOrigin::mirror_request()
    } else {
        tracing::info!(count = origins.len(), "CORS: allowed origins configured");
        AllowOrigin::list(origins)
    }
}

fn parse_origins(raw: &str) -> Vec<HeaderValue> {
    raw.split(',')
        .map(str::trim)
        .filter(|origin| !origin.is_empty())
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::warn!("CORS: invalid origin '{}': {}", origin, e);
                None
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_origins_skips_blanks() {
        let origins = parse_origins("http://localhost:3000, ,https://streetpulse.example");
        assert_eq!(origins.len(), 2);
        assert_eq!(origins[1], "https://streetpulse.example");
    }

    #[test]
    fn test_parse_origins_rejects_control_characters() {
        assert!(parse_origins("http://bad\norigin").is_empty());
    }
}
