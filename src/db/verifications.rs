use super::DbClient;
use crate::db::models::{Document, DocumentStatus, Verification, VerificationWithDocument};
use crate::errors::ApiError;
use crate::Result;
use diesel::{expression_methods::ExpressionMethods, query_dsl::QueryDsl, OptionalExtension};
use diesel_async::scoped_futures::ScopedFutureExt;
use diesel_async::{AsyncConnection, AsyncPgConnection, RunQueryDsl};
use tracing::{error, info};

/// DbClient helper functions for the verifications table
impl DbClient {
    /// Records a verification and applies its outcome to the document atomically
    pub async fn record_verification(&self, verification: Verification) -> Result<Verification> {
        use crate::schema::{documents, verifications};

        let mut pooled = self.get_db_conn().await?;
        let conn: &mut AsyncPgConnection = &mut pooled;

        info!(
            "Recording {} verification for document {} by {}",
            verification.status, verification.document_id, verification.verified_by
        );

        conn.transaction::<_, ApiError, _>(|conn| {
            async move {
                let new_status: DocumentStatus = verification.status.parse()?;
                let new_status: String = new_status.into();

                let updated = diesel::update(
                    documents::table.filter(documents::id.eq(&verification.document_id)),
                )
                .set((
                    documents::status.eq(new_status),
                    documents::updated_at.eq(verification.verification_date),
                ))
                .execute(conn)
                .await?;

                if updated == 0 {
                    return Err(ApiError::NotFound("Document not found".to_string()));
                }

                diesel::insert_into(verifications::table)
                    .values(&verification)
                    .execute(conn)
                    .await?;

                Ok(verification)
            }
            .scope_boxed()
        })
        .await
        .map_err(|e| {
            error!("Failed to record verification: {}", e);
            e
        })
    }

    /// Verifications for a document newest first, with the verifier's name and email
    pub async fn list_verifications_for_document(
        &self,
        document: &str,
    ) -> Result<Vec<(Verification, String, String)>> {
        use crate::schema::{users, verifications};

        let conn = &mut self.get_db_conn().await?;
        verifications::table
            .inner_join(users::table)
            .filter(verifications::document_id.eq(document))
            .select((verifications::all_columns, users::name, users::email))
            .order(verifications::verification_date.desc())
            .load::<(Verification, String, String)>(conn)
            .await
            .map_err(Into::into)
    }

    /// Verifications recorded by one admin newest first, with their documents
    pub async fn list_verifications_by_verifier(
        &self,
        verifier: &str,
    ) -> Result<Vec<VerificationWithDocument>> {
        use crate::schema::{documents, verifications};

        let conn = &mut self.get_db_conn().await?;
        let rows = verifications::table
            .inner_join(documents::table)
            .filter(verifications::verified_by.eq(verifier))
            .select((verifications::all_columns, documents::all_columns))
            .order(verifications::verification_date.desc())
            .load::<(Verification, Document)>(conn)
            .await?;

        Ok(rows
            .into_iter()
            .map(|(verification, document)| VerificationWithDocument {
                verification,
                document,
            })
            .collect())
    }

    pub async fn latest_verification(&self, document: &str) -> Result<Option<Verification>> {
        use crate::schema::verifications::dsl::*;

        let conn = &mut self.get_db_conn().await?;
        verifications
            .filter(document_id.eq(document))
            .order(verification_date.desc())
            .first::<Verification>(conn)
            .await
            .optional()
            .map_err(Into::into)
    }
}
