//! Inbound endpoint metrics
//!
//! `oicp_inbound_requests_total` counts every hub call reaching an endpoint,
//! `oicp_inbound_duration_seconds` records how long the backend took to answer.

use std::time::Instant;

use axum::{
    body::Body,
    extract::MatchedPath,
    http::{header, Request},
    middleware::Next,
    response::Response,
};

/// Wire dialect of an inbound call, judged by its content type.
fn dialect(request: &Request<Body>) -> &'static str {
    let content_type = request
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();
    if content_type.contains("json") {
        "json"
    } else if content_type.contains("xml") {
        "soap"
    } else {
        "unknown"
    }
}

/// Labels: `route` (the matched pattern, so party ids stay out of the
/// label set), `dialect` and `status`.
pub async fn http_metrics_middleware(request: Request<Body>, next: Next) -> Response {
    let route = request
        .extensions()
        .get::<MatchedPath>()
        .map(|matched| matched.as_str().to_string())
        .unwrap_or_else(|| "unmatched".to_string());
    let dialect = dialect(&request);

    let start = Instant::now();
    let response = next.run(request).await;

    let status = response.status().as_u16().to_string();
    metrics::counter!(
        "oicp_inbound_requests_total",
        "route" => route.clone(),
        "dialect" => dialect,
        "status" => status
    )
    .increment(1);
    metrics::histogram!("oicp_inbound_duration_seconds", "route" => route, "dialect" => dialect)
        .record(start.elapsed().as_secs_f64());

    response
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(content_type: &str) -> Request<Body> {
        Request::builder()
            .header(header::CONTENT_TYPE, content_type)
            .body(Body::empty())
            .unwrap()
    }

    #[test]
    fn dialect_follows_content_type() {
        assert_eq!(dialect(&request("text/xml; charset=utf-8")), "soap");
        assert_eq!(dialect(&request("application/json")), "json");
        assert_eq!(dialect(&request("text/plain")), "unknown");
    }
}
