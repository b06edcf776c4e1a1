//! API request handlers.
//! Each module corresponds to a group of endpoints under `/api`.

pub mod auth; // Registration, login and password resets
pub mod documents; // Document upload, metadata and status
pub mod health;
pub mod users; // Admin user management
pub mod verifications; // Verification records and status lookups

pub(crate) use auth::{forgot_password, login, me, register, reset_password, verify_token};
pub(crate) use documents::{
    create_document, delete_document, download_document, get_document, list_documents,
    list_my_documents, update_document_status, upload_document,
};
pub(crate) use health::{api_test, health_check, render_metrics};
pub(crate) use users::{list_users, update_user};
pub(crate) use verifications::{
    create_verification, get_document_status, list_document_verifications,
    list_verifier_verifications,
};

use crate::errors::{ApiError, ErrorMessages};

/// Replaces a bare "record not found" with a message naming the missing record
pub(crate) fn not_found_as(message: ErrorMessages) -> impl FnOnce(ApiError) -> ApiError {
    move |err| match err {
        ApiError::Diesel(diesel::result::Error::NotFound) => ApiError::NotFound(message.to_string()),
        other => other,
    }
}

/// Runs CPU-bound work such as password hashing off the async workers
pub(crate) async fn run_blocking<T, F>(f: F) -> crate::Result<T>
where
    F: FnOnce() -> crate::Result<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| ApiError::Custom(format!("Blocking task failed: {e}")))?
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::api::initialize_router;
    use crate::auth::JwtKeys;
    use crate::db::models::{Role, User};
    use crate::state::tests::{offline_state, TEST_SECRET};
    use axum::{
        body::Body,
        http::{header, Request, StatusCode},
        Router,
    };
    use serde_json::Value;
    use tower::ServiceExt;

    /// Router over an offline state plus the temp dir backing its storage
    pub(crate) fn test_router() -> (Router, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let router = initialize_router(offline_state(dir.path()));
        (router, dir)
    }

    pub(crate) fn bearer(role: Role) -> String {
        let user = User::new("tester@veritrust.ai", "hash".into(), "Tester", role);
        let token = JwtKeys::new(TEST_SECRET, 3600).issue(&user).unwrap();
        format!("Bearer {token}")
    }

    pub(crate) fn request(method: &str, uri: &str, auth: Option<&str>, body: Option<Value>) -> Request<Body> {
        let mut builder = Request::builder()
            .method(method)
            .uri(uri)
            .header("x-forwarded-for", "203.0.113.7");
        if let Some(auth) = auth {
            builder = builder.header(header::AUTHORIZATION, auth);
        }
        match body {
            Some(json) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        }
    }

    /// Sends one request and returns the status with the JSON body (Null if not JSON)
    pub(crate) async fn send(router: Router, req: Request<Body>) -> (StatusCode, Value) {
        let response = router.oneshot(req).await.unwrap();
        let status = response.status();
        let bytes = hyper::body::to_bytes(response.into_body()).await.unwrap();
        let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, body)
    }

    #[test]
    fn test_not_found_as_rewrites_diesel_not_found() {
        let err = not_found_as(ErrorMessages::DocumentNotFound)(diesel::result::Error::NotFound.into());
        assert!(matches!(err, ApiError::NotFound(ref m) if m == "Document not found"));

        let err = not_found_as(ErrorMessages::DocumentNotFound)(ApiError::Forbidden("no".into()));
        assert!(matches!(err, ApiError::Forbidden(_)));
    }

    #[tokio::test]
    async fn test_run_blocking_propagates_result() {
        assert_eq!(run_blocking(|| Ok(2 + 2)).await.unwrap(), 4);
        assert!(run_blocking::<(), _>(|| Err(ApiError::BadRequest("x".into())))
            .await
            .is_err());
    }
}
