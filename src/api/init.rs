use crate::errors::ApiError;
use crate::monitoring::track_requests;
use crate::state::AppState;
use axum::{
    error_handling::HandleErrorLayer,
    extract::DefaultBodyLimit,
    http::{header, HeaderValue, Method},
    middleware,
    response::{IntoResponse, Response},
    routing::{get, patch, post, put},
    BoxError, Router,
};
use std::time::Duration;
use tower::{buffer::BufferLayer, limit::RateLimitLayer, ServiceBuilder};
use tower_governor::{
    errors::GovernorError, governor::GovernorConfigBuilder, key_extractor::SmartIpKeyExtractor,
    GovernorLayer,
};
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

use super::{handlers::*, index::index};

/// Multipart framing allowance on top of the file size cap
const MULTIPART_OVERHEAD_BYTES: usize = 64 * 1024;

/// Converts errors raised by the middleware stack into the API error body.
/// Rate limiter rejections become 429 with their rate limit headers.
pub(crate) async fn handle_middleware_error(err: BoxError) -> Response {
    match err.downcast_ref::<GovernorError>() {
        Some(GovernorError::TooManyRequests { wait_time, headers }) => {
            let mut response = ApiError::TooManyRequests(format!(
                "Too many requests, retry in {} seconds",
                wait_time
            ))
            .into_response();
            if let Some(headers) = headers {
                response.headers_mut().extend(headers.clone());
            }
            response
                .headers_mut()
                .entry(header::RETRY_AFTER)
                .or_insert_with(|| HeaderValue::from(*wait_time));
            response
        }
        Some(GovernorError::Other { code, msg, headers }) => {
            let message = msg.clone().unwrap_or_else(|| code.to_string());
            let mut response = ApiError::Custom(message).into_response();
            *response.status_mut() = *code;
            if let Some(headers) = headers {
                response.headers_mut().extend(headers.clone());
            }
            response
        }
        Some(GovernorError::UnableToExtractKey) => {
            tracing::warn!("Rate limiter could not determine the client address");
            ApiError::Custom("Unable to determine client address".to_string()).into_response()
        }
        None => ApiError::Custom(format!("Unhandled error: {}", err)).into_response(),
    }
}

pub fn initialize_router(state: AppState) -> Router {
    let error_handler =
        || ServiceBuilder::new().layer(HandleErrorLayer::new(handle_middleware_error));

    let global_rate_limit = |req_per_sec: u64| {
        ServiceBuilder::new()
            .layer(error_handler())
            .layer(BufferLayer::new(1024))
            .layer(RateLimitLayer::new(req_per_sec, Duration::from_secs(1)))
    };

    // One token is replenished every `period_secs`, up to `burst` tokens per client IP
    let rate_limit_per_ip = |period_secs: u64, burst: u32| {
        let config = Box::new(
            GovernorConfigBuilder::default()
                .per_second(period_secs)
                .burst_size(burst)
                .use_headers()
                .key_extractor(SmartIpKeyExtractor)
                .finish()
                .expect("rate limit period and burst must be non-zero"),
        );

        ServiceBuilder::new()
            .layer(error_handler())
            .layer(GovernorLayer {
                config: Box::leak(config),
            })
    };

    let cors = {
        let layer = CorsLayer::new()
            .allow_methods([
                Method::GET,
                Method::POST,
                Method::PUT,
                Method::PATCH,
                Method::DELETE,
            ])
            .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION]);

        if state.cors_origins.iter().any(|origin| origin.trim() == "*") {
            layer.allow_origin(Any)
        } else {
            let origins: Vec<HeaderValue> = state
                .cors_origins
                .iter()
                .filter_map(|origin| match HeaderValue::from_str(origin.trim()) {
                    Ok(value) => Some(value),
                    Err(_) => {
                        tracing::warn!("Ignoring invalid CORS origin: {}", origin);
                        None
                    }
                })
                .collect();
            layer.allow_origin(origins)
        }
    };

    let trace_layer = TraceLayer::new_for_http()
        .make_span_with(DefaultMakeSpan::new().include_headers(false))
        .on_request(DefaultOnRequest::new().level(Level::INFO))
        .on_response(DefaultOnResponse::new().level(Level::INFO));

    // Registration: 3 per hour
    let register_routes = Router::<AppState>::new()
        .route("/api/auth/register", post(register))
        .layer(global_rate_limit(100).layer(rate_limit_per_ip(1200, 3)));

    // Login: 5 per minute
    let login_routes = Router::<AppState>::new()
        .route("/api/auth/login", post(login))
        .layer(global_rate_limit(100).layer(rate_limit_per_ip(12, 5)));

    // Password resets: 5 per minute
    let password_routes = Router::<AppState>::new()
        .route("/api/auth/forgot-password", post(forgot_password))
        .route("/api/auth/reset-password", post(reset_password))
        .layer(global_rate_limit(100).layer(rate_limit_per_ip(12, 5)));

    // Uploads: 10 per hour, body sized for the file cap
    let upload_routes = Router::<AppState>::new()
        .route("/api/documents/upload", post(upload_document))
        .layer(DefaultBodyLimit::max(
            state.storage.max_bytes() + MULTIPART_OVERHEAD_BYTES,
        ))
        .layer(global_rate_limit(100).layer(rate_limit_per_ip(360, 10)));

    let api_routes = Router::<AppState>::new()
        .route("/api/auth/me", get(me))
        .route("/api/auth/verify", get(verify_token))
        .route("/api/users", get(list_users))
        .route("/api/users/:id", put(update_user))
        .route(
            "/api/documents",
            get(list_documents).post(create_document),
        )
        .route("/api/documents/user/me", get(list_my_documents))
        .route(
            "/api/documents/:id",
            get(get_document).delete(delete_document),
        )
        .route("/api/documents/:id/download", get(download_document))
        .route("/api/documents/:id/status", patch(update_document_status))
        .route("/api/verifications", post(create_verification))
        .route(
            "/api/verifications/document/:documentId",
            get(list_document_verifications),
        )
        .route(
            "/api/verifications/verifier/:verifierId",
            get(list_verifier_verifications),
        )
        .route(
            "/api/verifications/status/:documentId",
            get(get_document_status),
        )
        .route("/metrics", get(render_metrics))
        .layer(global_rate_limit(10000).layer(rate_limit_per_ip(1, 100)));

    Router::<AppState>::new()
        // Base routes
        .route("/", get(|| async { index() }))
        .route("/health", get(health_check))
        .route("/api/test", get(api_test))
        .merge(register_routes)
        .merge(login_routes)
        .merge(password_routes)
        .merge(upload_routes)
        .merge(api_routes)
        // Apply common middleware
        .layer(middleware::from_fn(track_requests))
        .layer(CompressionLayer::new().zstd(true))
        .layer(cors)
        .layer(trace_layer)
        .with_state(state)
}
