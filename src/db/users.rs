use super::DbClient;
use crate::db::models::{UpdateUserParams, User};
use crate::Result;
use chrono::NaiveDateTime;
use diesel::{expression_methods::ExpressionMethods, query_dsl::QueryDsl, OptionalExtension};
use diesel_async::RunQueryDsl;
use tracing::{error, info};

/// DbClient helper functions for the users table
impl DbClient {
    pub async fn insert_user(&self, user: &User) -> Result<usize> {
        use crate::schema::users::dsl::*;

        let conn = &mut self.get_db_conn().await?;

        info!("Inserting user: {}", user.id);
        diesel::insert_into(users)
            .values(user)
            .execute(conn)
            .await
            .map_err(|e| {
                error!("Failed to insert user: {}", e);
                e.into()
            })
    }

    pub async fn get_user(&self, user_id: &str) -> Result<User> {
        use crate::schema::users::dsl::*;

        let conn = &mut self.get_db_conn().await?;
        users
            .filter(id.eq(user_id))
            .first::<User>(conn)
            .await
            .map_err(Into::into)
    }

    pub async fn find_user_by_email(&self, user_email: &str) -> Result<Option<User>> {
        use crate::schema::users::dsl::*;

        let conn = &mut self.get_db_conn().await?;
        users
            .filter(email.eq(user_email.trim().to_lowercase()))
            .first::<User>(conn)
            .await
            .optional()
            .map_err(Into::into)
    }

    pub async fn find_user_by_reset_token(&self, token: &str) -> Result<Option<User>> {
        use crate::schema::users::dsl::*;

        let conn = &mut self.get_db_conn().await?;
        users
            .filter(reset_token.eq(token))
            .first::<User>(conn)
            .await
            .optional()
            .map_err(Into::into)
    }

    /// Returns one page of users ordered by creation time, plus the total count
    pub async fn list_users(&self, limit: i64, skip: i64) -> Result<(Vec<User>, i64)> {
        use crate::schema::users::dsl::*;

        let conn = &mut self.get_db_conn().await?;

        let total = users.count().get_result::<i64>(conn).await?;
        let page = users
            .order(created_at.desc())
            .limit(limit)
            .offset(skip)
            .load::<User>(conn)
            .await?;

        Ok((page, total))
    }

    pub async fn update_user(&self, user_id: &str, changes: &UpdateUserParams) -> Result<User> {
        use crate::schema::users::dsl::*;

        let conn = &mut self.get_db_conn().await?;
        let now = chrono::Utc::now().naive_utc();

        info!("Updating user: {}", user_id);
        diesel::update(users.filter(id.eq(user_id)))
            .set((
                changes.name.as_ref().map(|n| name.eq(n.trim().to_string())),
                changes.role.as_ref().map(|r| role.eq(r.clone())),
                changes.is_active.map(|active| is_active.eq(active)),
                updated_at.eq(now),
            ))
            .get_result::<User>(conn)
            .await
            .map_err(|e| {
                error!("Failed to update user {}: {}", user_id, e);
                e.into()
            })
    }

    pub async fn set_reset_token(
        &self,
        user_id: &str,
        token: &str,
        expires: NaiveDateTime,
    ) -> Result<usize> {
        use crate::schema::users::dsl::*;

        let conn = &mut self.get_db_conn().await?;
        diesel::update(users.filter(id.eq(user_id)))
            .set((
                reset_token.eq(Some(token)),
                reset_token_expires.eq(Some(expires)),
            ))
            .execute(conn)
            .await
            .map_err(Into::into)
    }

    /// Stores a new password hash if `token` is still the user's unexpired reset token,
    /// consuming it; returns the number of rows updated
    pub async fn reset_password_with_token(
        &self,
        user_id: &str,
        token: &str,
        new_hash: &str,
        now: NaiveDateTime,
    ) -> Result<usize> {
        use crate::schema::users::dsl::*;

        let conn = &mut self.get_db_conn().await?;
        diesel::update(
            users
                .filter(id.eq(user_id))
                .filter(reset_token.eq(token))
                .filter(reset_token_expires.ge(now)),
        )
        .set((
            password_hash.eq(new_hash),
            reset_token.eq(None::<String>),
            reset_token_expires.eq(None::<NaiveDateTime>),
            updated_at.eq(now),
        ))
        .execute(conn)
        .await
        .map_err(Into::into)
    }
}
