use crate::auth::AdminClaims;
use crate::db::DbClient;
use crate::monitoring::Exposition;
use axum::{extract::State, http::StatusCode, Json};
use metrics_exporter_prometheus::PrometheusHandle;
use serde_json::{json, Value};

/// Health check endpoint that includes cache connectivity
pub async fn health_check(State(db): State<DbClient>) -> (StatusCode, Json<Value>) {
    let cache_status = match db.get_async_redis_conn().await {
        Err(e) => json!({
            "status": "error",
            "message": e.to_string()
        }),
        Ok(_) => json!("connected"),
    };

    let health_status = json!({
        "status": "healthy",
        "cache": cache_status,
        "timestamp": chrono::Utc::now()
    });

    (StatusCode::OK, Json(health_status))
}

/// # Endpoint: GET /api/test
pub async fn api_test() -> Json<Value> {
    Json(json!({ "message": "API is working!" }))
}

/// # Endpoint: GET /metrics
pub async fn render_metrics(
    AdminClaims(_admin): AdminClaims,
    State(handle): State<PrometheusHandle>,
) -> Exposition {
    Exposition(handle.render())
}

#[cfg(test)]
mod tests {
    use super::super::tests::{bearer, request, send, test_router};
    use crate::db::models::Role;
    use crate::monitoring::{install_recorder, tests::sample, REQUESTS_TOTAL};
    use axum::http::{header, StatusCode};
    use tower::ServiceExt;

    #[tokio::test]
    async fn test_health_reports_healthy_without_cache() {
        let (router, _dir) = test_router();
        let (status, body) = send(router, request("GET", "/health", None, None)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "healthy");
        assert_eq!(body["cache"]["status"], "error");
    }

    #[tokio::test]
    async fn test_api_test_route() {
        let (router, _dir) = test_router();
        let (status, body) = send(router, request("GET", "/api/test", None, None)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], "API is working!");
    }

    #[tokio::test]
    async fn test_metrics_requires_admin() {
        let (router, _dir) = test_router();
        let (status, _) = send(router.clone(), request("GET", "/metrics", None, None)).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let token = bearer(Role::User);
        let (status, body) = send(router, request("GET", "/metrics", Some(&token), None)).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body["error"], "Admin privileges required");
    }

    #[tokio::test]
    async fn test_request_counter_moves() {
        let labels = [("method", "GET"), ("endpoint", "/api/test"), ("status", "200")];
        let before = sample(&install_recorder().render(), REQUESTS_TOTAL, &labels);

        let (router, _dir) = test_router();
        let (status, _) = send(router.clone(), request("GET", "/api/test", None, None)).await;
        assert_eq!(status, StatusCode::OK);

        let token = bearer(Role::Admin);
        let response = router
            .oneshot(request("GET", "/metrics", Some(&token), None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers()[header::CONTENT_TYPE]
            .to_str()
            .unwrap()
            .starts_with("text/plain"));

        let bytes = hyper::body::to_bytes(response.into_body()).await.unwrap();
        let rendered = String::from_utf8(bytes.to_vec()).unwrap();
        assert!(sample(&rendered, REQUESTS_TOTAL, &labels) >= before + 1.0);
        assert!(rendered.contains("api_request_duration_seconds"));
    }

    #[tokio::test]
    async fn test_unmatched_routes_are_counted() {
        let labels = [("endpoint", "unmatched"), ("status", "404")];
        let before = sample(&install_recorder().render(), REQUESTS_TOTAL, &labels);

        let (router, _dir) = test_router();
        let (status, _) = send(router, request("GET", "/api/nowhere", None, None)).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let after = sample(&install_recorder().render(), REQUESTS_TOTAL, &labels);
        assert!(after >= before + 1.0);
    }
}
