use super::not_found_as;
use crate::api::extract::{Json, Path, Query};
use crate::auth::AdminClaims;
use crate::db::models::{
    ListParams, PaginatedResponse, PaginationMeta, Role, UpdateUserParams, UserEnvelope,
    UserResponse,
};
use crate::db::DbClient;
use crate::errors::{ApiError, ErrorMessages};
use crate::logging::audit;
use crate::Result;
use axum::extract::State;

/// # Endpoint: GET /api/users
pub(crate) async fn list_users(
    AdminClaims(_admin): AdminClaims,
    State(db): State<DbClient>,
    Query(params): Query<ListParams>,
) -> Result<Json<PaginatedResponse<UserResponse>>> {
    let (page, per_page) = params.normalized();
    let (users, total) = db.list_users(per_page, params.offset()).await?;

    Ok(Json(PaginatedResponse {
        meta: PaginationMeta::new(total, page, per_page),
        data: users.iter().map(UserResponse::from).collect(),
    }))
}

/// Handler for admin edits of a user's name, role or active flag
///
/// # Endpoint: PUT /api/users/:id
pub(crate) async fn update_user(
    AdminClaims(admin): AdminClaims,
    State(db): State<DbClient>,
    Path(user_id): Path<String>,
    Json(changes): Json<UpdateUserParams>,
) -> Result<Json<UserEnvelope>> {
    if let Some(role) = &changes.role {
        role.parse::<Role>()?;
    }
    if changes.name.as_deref().is_some_and(|n| n.trim().is_empty()) {
        return Err(ApiError::BadRequest("Name cannot be empty".to_string()));
    }

    let user = db
        .update_user(&user_id, &changes)
        .await
        .map_err(not_found_as(ErrorMessages::UserNotFound))?;

    audit(
        &admin.sub,
        "update_user",
        &user.id,
        Some(&serde_json::to_value(&changes).unwrap_or_default()),
    );

    Ok(Json(UserEnvelope {
        message: Some("User updated successfully".to_string()),
        user: UserResponse::from(&user),
    }))
}
