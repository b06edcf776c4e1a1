use axum::Json;
use serde_json::{json, Value};
use std::sync::OnceLock;

static INDEX_JSON: OnceLock<Value> = OnceLock::new();

fn endpoint(method: &str, path: &str, auth: &str, description: &str) -> Value {
    json!({
        "method": method,
        "path": path,
        "auth": auth,
        "description": description
    })
}

/// Handler for the index endpoint listing every route
///
/// # Endpoint: GET /
pub fn index() -> Json<Value> {
    let value = INDEX_JSON.get_or_init(|| {
        json!({
            "name": "VeriTrust API",
            "version": env!("CARGO_PKG_VERSION"),
            "endpoints": [
                endpoint("GET", "/", "none", "API endpoint documentation"),
                endpoint("GET", "/health", "none", "Service health and cache connectivity"),
                endpoint("GET", "/api/test", "none", "Connectivity check"),
                endpoint("GET", "/metrics", "admin", "Prometheus metrics"),
                endpoint("POST", "/api/auth/register", "none", "Create an account from email, password and name"),
                endpoint("POST", "/api/auth/login", "none", "Exchange credentials for a bearer token"),
                endpoint("GET", "/api/auth/me", "user", "Profile of the authenticated user"),
                endpoint("GET", "/api/auth/verify", "user", "Validate the bearer token"),
                endpoint("POST", "/api/auth/forgot-password", "none", "Request a password reset token"),
                endpoint("POST", "/api/auth/reset-password", "none", "Set a new password with a reset token"),
                endpoint("GET", "/api/users", "admin", "Paginated list of users"),
                endpoint("PUT", "/api/users/:id", "admin", "Update a user's name, role or active flag"),
                endpoint("POST", "/api/documents/upload", "user", "Upload a pdf, png or jpg file (multipart field `file`)"),
                endpoint("POST", "/api/documents", "user", "Register a document hashed client-side"),
                endpoint("GET", "/api/documents", "admin", "Paginated list of all documents, filterable by status"),
                endpoint("GET", "/api/documents/user/me", "user", "Documents owned by the caller"),
                endpoint("GET", "/api/documents/:id", "owner or admin", "Document details with owner"),
                endpoint("GET", "/api/documents/:id/download", "owner or admin", "Download the stored file"),
                endpoint("PATCH", "/api/documents/:id/status", "admin", "Set a document's status"),
                endpoint("DELETE", "/api/documents/:id", "owner or admin", "Delete a document and its verifications"),
                endpoint("POST", "/api/verifications", "admin", "Record a verification and update the document status"),
                endpoint("GET", "/api/verifications/document/:documentId", "owner or admin", "Verification history of a document"),
                endpoint("GET", "/api/verifications/verifier/:verifierId", "admin", "Verifications recorded by an admin"),
                endpoint("GET", "/api/verifications/status/:documentId", "owner or admin", "Current status and latest verification")
            ]
        })
    });

    Json(value.clone())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_index_lists_routes() {
        let Json(value) = index();
        let endpoints = value["endpoints"].as_array().unwrap();
        assert!(endpoints
            .iter()
            .any(|e| e["path"] == "/api/verifications" && e["method"] == "POST"));
        assert!(endpoints.iter().all(|e| e["auth"].is_string()));
    }
}
