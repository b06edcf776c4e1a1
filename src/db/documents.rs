use super::DbClient;
use crate::db::models::{Document, DocumentStatus};
use crate::Result;
use diesel::{expression_methods::ExpressionMethods, query_dsl::QueryDsl};
use diesel_async::RunQueryDsl;
use tracing::{error, info};

/// DbClient helper functions for the documents table
impl DbClient {
    pub async fn insert_document(&self, document: &Document) -> Result<usize> {
        use crate::schema::documents::dsl::*;

        let conn = &mut self.get_db_conn().await?;

        info!(
            "Inserting document {} for user {}",
            document.id, document.user_id
        );
        diesel::insert_into(documents)
            .values(document)
            .execute(conn)
            .await
            .map_err(|e| {
                error!("Failed to insert document: {}", e);
                e.into()
            })
    }

    pub async fn get_document(&self, document_id: &str) -> Result<Document> {
        use crate::schema::documents::dsl::*;

        let conn = &mut self.get_db_conn().await?;
        documents
            .filter(id.eq(document_id))
            .first::<Document>(conn)
            .await
            .map_err(Into::into)
    }

    /// Document joined with its owner's name and email
    pub async fn get_document_with_owner(
        &self,
        document_id: &str,
    ) -> Result<(Document, String, String)> {
        use crate::schema::{documents, users};

        let conn = &mut self.get_db_conn().await?;
        documents::table
            .inner_join(users::table)
            .filter(documents::id.eq(document_id))
            .select((documents::all_columns, users::name, users::email))
            .first::<(Document, String, String)>(conn)
            .await
            .map_err(Into::into)
    }

    /// All documents newest first, optionally filtered by status
    pub async fn list_documents(
        &self,
        status_filter: Option<DocumentStatus>,
        limit: i64,
        skip: i64,
    ) -> Result<(Vec<(Document, String, String)>, i64)> {
        use crate::schema::{documents, users};

        let conn = &mut self.get_db_conn().await?;

        let mut count_query = documents::table.into_boxed();
        let mut page_query = documents::table
            .inner_join(users::table)
            .select((documents::all_columns, users::name, users::email))
            .into_boxed();

        if let Some(wanted) = status_filter {
            let wanted: String = wanted.into();
            count_query = count_query.filter(documents::status.eq(wanted.clone()));
            page_query = page_query.filter(documents::status.eq(wanted));
        }

        let total = count_query.count().get_result::<i64>(conn).await?;
        let page = page_query
            .order(documents::created_at.desc())
            .limit(limit)
            .offset(skip)
            .load::<(Document, String, String)>(conn)
            .await?;

        Ok((page, total))
    }

    pub async fn list_documents_for_user(&self, owner_id: &str) -> Result<Vec<Document>> {
        use crate::schema::documents::dsl::*;

        let conn = &mut self.get_db_conn().await?;
        documents
            .filter(user_id.eq(owner_id))
            .order(created_at.desc())
            .load::<Document>(conn)
            .await
            .map_err(Into::into)
    }

    pub async fn update_document_status(
        &self,
        document_id: &str,
        new_status: DocumentStatus,
    ) -> Result<Document> {
        use crate::schema::documents::dsl::*;

        let conn = &mut self.get_db_conn().await?;
        let new_status: String = new_status.into();

        info!("Setting document {} status to {}", document_id, new_status);
        diesel::update(documents.filter(id.eq(document_id)))
            .set((status.eq(new_status), updated_at.eq(chrono::Utc::now().naive_utc())))
            .get_result::<Document>(conn)
            .await
            .map_err(Into::into)
    }

    /// Deletes a document; its verifications cascade
    pub async fn delete_document(&self, document_id: &str) -> Result<usize> {
        use crate::schema::documents::dsl::*;

        let conn = &mut self.get_db_conn().await?;

        info!("Deleting document {}", document_id);
        diesel::delete(documents.filter(id.eq(document_id)))
            .execute(conn)
            .await
            .map_err(|e| {
                error!("Failed to delete document {}: {}", document_id, e);
                e.into()
            })
    }
}
