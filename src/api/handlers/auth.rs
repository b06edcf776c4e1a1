use super::{not_found_as, run_blocking};
use crate::api::extract::Json;
use crate::auth::password::{
    generate_reset_token, hash_password, validate_password_strength, verify_password,
};
use crate::auth::{Claims, JwtKeys};
use crate::db::models::{
    ForgotPasswordParams, LoginParams, LoginResponse, MessageResponse, RegisterParams,
    ResetPasswordParams, Role, TokenStatusResponse, User, UserEnvelope, UserResponse,
};
use crate::db::DbClient;
use crate::errors::{ApiError, ErrorMessages};
use crate::logging::audit;
use crate::state::AccountSettings;
use crate::validation::validate_email;
use crate::Result;
use axum::{extract::State, http::StatusCode};
use chrono::{Duration, Utc};
use serde_json::json;

const RESET_REQUESTED_MESSAGE: &str =
    "If an account exists for that email, password reset instructions have been sent";

/// Handler for user registration
///
/// # Endpoint: POST /api/auth/register
///
/// The role is never taken from the request: emails listed in the admin
/// bootstrap configuration become admins, everyone else is a regular user.
pub(crate) async fn register(
    State(db): State<DbClient>,
    State(accounts): State<AccountSettings>,
    Json(payload): Json<RegisterParams>,
) -> Result<(StatusCode, Json<UserEnvelope>)> {
    if payload.email.trim().is_empty()
        || payload.password.is_empty()
        || payload.name.trim().is_empty()
    {
        return Err(ApiError::BadRequest(
            "Email, password and name are required".to_string(),
        ));
    }
    validate_email(&payload.email).map_err(ApiError::BadRequest)?;
    validate_password_strength(&payload.password).map_err(ApiError::BadRequest)?;

    if db.find_user_by_email(&payload.email).await?.is_some() {
        return Err(ApiError::Conflict(
            "User with this email already exists".to_string(),
        ));
    }

    let role = if accounts.is_admin_email(&payload.email) {
        Role::Admin
    } else {
        Role::User
    };

    let password = payload.password;
    let password_hash = run_blocking(move || hash_password(&password)).await?;
    let user = User::new(&payload.email, password_hash, &payload.name, role);
    db.insert_user(&user).await?;

    tracing::info!("Registered user {} with role {}", user.id, user.role);
    audit(
        &user.id,
        "register",
        &user.email,
        Some(&json!({ "role": user.role })),
    );

    Ok((
        StatusCode::CREATED,
        Json(UserEnvelope {
            message: Some("User registered successfully".to_string()),
            user: UserResponse::from(&user),
        }),
    ))
}

/// Handler for login
///
/// # Endpoint: POST /api/auth/login
pub(crate) async fn login(
    State(db): State<DbClient>,
    State(keys): State<JwtKeys>,
    Json(payload): Json<LoginParams>,
) -> Result<Json<LoginResponse>> {
    if payload.email.trim().is_empty() || payload.password.is_empty() {
        return Err(ApiError::BadRequest(
            "Email and password are required".to_string(),
        ));
    }

    let Some(user) = db.find_user_by_email(&payload.email).await? else {
        audit("anonymous", "login_failed", payload.email.trim(), None);
        return Err(ApiError::Unauthorized(
            ErrorMessages::InvalidCredentials.to_string(),
        ));
    };

    let password = payload.password;
    let stored_hash = user.password_hash.clone();
    let matches = run_blocking(move || Ok(verify_password(&password, &stored_hash))).await?;
    if !matches {
        audit(&user.id, "login_failed", &user.email, None);
        return Err(ApiError::Unauthorized(
            ErrorMessages::InvalidCredentials.to_string(),
        ));
    }

    if !user.is_active {
        audit(&user.id, "login_rejected_inactive", &user.email, None);
        return Err(ApiError::Forbidden("Account is deactivated".to_string()));
    }

    let access_token = keys.issue(&user)?;
    tracing::info!("User {} logged in", user.id);

    Ok(Json(LoginResponse {
        access_token,
        token_type: "Bearer".to_string(),
        expires_in: keys.expires_in(),
        user: UserResponse::from(&user),
    }))
}

/// Handler returning the caller's profile
///
/// # Endpoint: GET /api/auth/me
pub(crate) async fn me(claims: Claims, State(db): State<DbClient>) -> Result<Json<UserEnvelope>> {
    let user = db
        .get_user(&claims.sub)
        .await
        .map_err(not_found_as(ErrorMessages::UserNotFound))?;

    Ok(Json(UserEnvelope {
        message: None,
        user: UserResponse::from(&user),
    }))
}

/// # Endpoint: GET /api/auth/verify
pub(crate) async fn verify_token(claims: Claims) -> Json<TokenStatusResponse> {
    Json(TokenStatusResponse {
        valid: true,
        user_id: claims.sub,
        role: claims.role,
        expires_at: claims.exp,
    })
}

/// Handler for password reset requests
///
/// # Endpoint: POST /api/auth/forgot-password
///
/// Responds identically whether or not the account exists.
pub(crate) async fn forgot_password(
    State(db): State<DbClient>,
    State(accounts): State<AccountSettings>,
    Json(payload): Json<ForgotPasswordParams>,
) -> Result<Json<MessageResponse>> {
    if payload.email.trim().is_empty() {
        return Err(ApiError::BadRequest("Email is required".to_string()));
    }

    match db.find_user_by_email(&payload.email).await? {
        Some(user) if user.is_active => {
            let token = generate_reset_token();
            let expires =
                Utc::now().naive_utc() + Duration::hours(accounts.reset_token_ttl_hours);
            db.set_reset_token(&user.id, &token, expires).await?;

            // No mail transport; the audit log is the delivery channel
            audit(
                "system",
                "password_reset_requested",
                &user.email,
                Some(&json!({ "user_id": user.id, "reset_token": token, "expires": expires })),
            );
        }
        Some(user) => {
            tracing::info!("Ignoring reset request for inactive user {}", user.id);
        }
        None => {
            tracing::debug!("Reset requested for unknown email");
        }
    }

    Ok(Json(MessageResponse::new(RESET_REQUESTED_MESSAGE)))
}

/// Handler consuming a reset token
///
/// # Endpoint: POST /api/auth/reset-password
pub(crate) async fn reset_password(
    State(db): State<DbClient>,
    Json(payload): Json<ResetPasswordParams>,
) -> Result<Json<MessageResponse>> {
    if payload.token.trim().is_empty() || payload.new_password.is_empty() {
        return Err(ApiError::BadRequest(
            "Token and new password are required".to_string(),
        ));
    }
    validate_password_strength(&payload.new_password).map_err(ApiError::BadRequest)?;

    let invalid_token = || ApiError::BadRequest("Invalid or expired reset token".to_string());

    let user = db
        .find_user_by_reset_token(payload.token.trim())
        .await?
        .ok_or_else(invalid_token)?;
    if !user.is_reset_token_valid(payload.token.trim(), Utc::now().naive_utc()) {
        return Err(invalid_token());
    }

    let password = payload.new_password;
    let new_hash = run_blocking(move || hash_password(&password)).await?;

    // The token condition makes a concurrent second use update nothing
    let updated = db
        .reset_password_with_token(
            &user.id,
            payload.token.trim(),
            &new_hash,
            Utc::now().naive_utc(),
        )
        .await?;
    if updated == 0 {
        return Err(invalid_token());
    }

    audit(&user.id, "password_reset", &user.email, None);

    Ok(Json(MessageResponse::new(
        "Password has been reset successfully",
    )))
}

#[cfg(test)]
mod tests {
    use super::super::tests::{bearer, request, send, test_router};
    use axum::http::StatusCode;
    use serde_json::json;

    #[tokio::test]
    async fn test_register_requires_fields() {
        let (router, _dir) = test_router();
        let req = request(
            "POST",
            "/api/auth/register",
            None,
            Some(json!({ "email": "ada@veritrust.ai" })),
        );
        let (status, body) = send(router, req).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["status"], "error");
        assert_eq!(body["error"], "Email, password and name are required");
    }

    #[tokio::test]
    async fn test_register_rejects_invalid_email() {
        let (router, _dir) = test_router();
        let req = request(
            "POST",
            "/api/auth/register",
            None,
            Some(json!({ "email": "not-an-email", "password": "Str0ng!pass", "name": "Ada" })),
        );
        let (status, body) = send(router, req).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Invalid email format");
    }

    #[tokio::test]
    async fn test_register_rejects_weak_password() {
        let (router, _dir) = test_router();
        let req = request(
            "POST",
            "/api/auth/register",
            None,
            Some(json!({ "email": "ada@veritrust.ai", "password": "password", "name": "Ada" })),
        );
        let (status, body) = send(router, req).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(
            body["error"],
            "Password must contain at least one uppercase letter"
        );
    }

    #[tokio::test]
    async fn test_login_requires_fields() {
        let (router, _dir) = test_router();
        let req = request("POST", "/api/auth/login", None, Some(json!({ "email": "" })));
        let (status, _) = send(router, req).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_forgot_password_requires_email() {
        let (router, _dir) = test_router();
        let req = request("POST", "/api/auth/forgot-password", None, Some(json!({})));
        let (status, body) = send(router, req).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Email is required");
    }

    #[tokio::test]
    async fn test_reset_password_rejects_weak_password() {
        let (router, _dir) = test_router();
        let req = request(
            "POST",
            "/api/auth/reset-password",
            None,
            Some(json!({ "token": "abc", "new_password": "short" })),
        );
        let (status, _) = send(router, req).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_me_requires_token() {
        let (router, _dir) = test_router();
        let (status, body) = send(router, request("GET", "/api/auth/me", None, None)).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"], "Missing or invalid authorization header");
    }

    #[tokio::test]
    async fn test_verify_rejects_tampered_token() {
        let (router, _dir) = test_router();
        let tampered = format!("{}x", bearer(crate::db::models::Role::User));
        let req = request("GET", "/api/auth/verify", Some(&tampered), None);
        let (status, _) = send(router, req).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_verify_reports_claims() {
        let (router, _dir) = test_router();
        let token = bearer(crate::db::models::Role::Admin);
        let req = request("GET", "/api/auth/verify", Some(&token), None);
        let (status, body) = send(router, req).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["valid"], true);
        assert_eq!(body["role"], "admin");
        assert!(body["expires_at"].as_i64().unwrap() > 0);
    }
}
