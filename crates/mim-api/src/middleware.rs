//! Request correlation middleware

use axum::{
    extract::Request,
    http::HeaderValue,
    middleware::Next,
    response::Response,
};
use mim_core::RequestContext;
use tracing::{debug, error};

pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Attach a fresh `RequestContext` to every request and log its lifecycle
pub async fn request_context(mut request: Request, next: Next) -> Response {
    let ctx = RequestContext::new();
    request.extensions_mut().insert(ctx);

    debug!(
        request_id = %ctx.request_id,
        method = %request.method(),
        url = %request.uri(),
        "Request received"
    );

    let mut response = next.run(request).await;
    let status = response.status();

    if status.is_server_error() {
        error!(request_id = %ctx.request_id, status_code = status.as_u16(), "Request failed");
    } else {
        debug!(request_id = %ctx.request_id, status_code = status.as_u16(), "Response sent");
    }

    if let Ok(value) = HeaderValue::from_str(&ctx.request_id.to_string()) {
        response.headers_mut().insert(REQUEST_ID_HEADER, value);
    }

    response
}
