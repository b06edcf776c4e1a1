//! Authentication and authorization.
//!
//! Access tokens are stateless HS256 JWTs; the `Claims` and `AdminClaims`
//! extractors reject requests before any handler or database work runs.

pub mod jwt;
pub mod password;

pub use jwt::{AdminClaims, Claims, JwtKeys};

use crate::errors::{ApiError, ErrorMessages};

/// Owners may access their own records, admins may access any
pub fn ensure_owner_or_admin(owner_id: &str, claims: &Claims) -> Result<(), ApiError> {
    if owner_id == claims.sub || claims.is_admin() {
        Ok(())
    } else {
        tracing::warn!(
            "User {} denied access to a record owned by {}",
            claims.sub,
            owner_id
        );
        Err(ApiError::Forbidden(ErrorMessages::NotOwner.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn claims(sub: &str, role: &str) -> Claims {
        Claims {
            sub: sub.into(),
            email: format!("{sub}@veritrust.ai"),
            role: role.into(),
            iat: 0,
            exp: 0,
        }
    }

    #[test]
    fn test_owner_allowed() {
        assert!(ensure_owner_or_admin("alice", &claims("alice", "user")).is_ok());
    }

    #[test]
    fn test_admin_allowed_on_any_record() {
        assert!(ensure_owner_or_admin("alice", &claims("root", "admin")).is_ok());
    }

    #[test]
    fn test_other_user_forbidden() {
        let err = ensure_owner_or_admin("alice", &claims("mallory", "user")).unwrap_err();
        assert_eq!(err.status_code(), axum::http::StatusCode::FORBIDDEN);
    }
}
