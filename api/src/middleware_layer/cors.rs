use axum::http::{HeaderValue, Method, header};
use tower_http::cors::CorsLayer;

/// Methods the browser client may use against the relay.
pub const ALLOWED_METHODS: [Method; 6] = [
    Method::GET,
    Method::POST,
    Method::HEAD,
    Method::PUT,
    Method::DELETE,
    Method::PATCH,
];

/// CORS for a single allowed origin with a minimal header allow-list.
///
/// The origin is matched, not echoed: requests from any other origin get no
/// `Access-Control-Allow-Origin` header at all.
pub fn cors_layer(origin: HeaderValue) -> CorsLayer {
    CorsLayer::new()
        .allow_origin([origin])
        .allow_methods(ALLOWED_METHODS)
        .allow_headers([header::ORIGIN, header::CONTENT_TYPE, header::ACCEPT])
}
