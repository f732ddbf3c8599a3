//! Report removal. Deleting a report also removes its sources and their documents,
//! which the generic delete-by-id cannot do.

use crate::error::AppError;
use crate::registry::EntityKind;
use crate::sql::quoted;
use crate::store::RecordId;
use async_trait::async_trait;
use sqlx::PgPool;

#[async_trait]
pub trait ReportService: Send + Sync {
    async fn remove(&self, id: RecordId) -> Result<(), AppError>;
}

#[derive(Clone)]
pub struct PgReportService {
    pool: PgPool,
}

impl PgReportService {
    pub fn new(pool: PgPool) -> Self {
        PgReportService { pool }
    }
}

fn remove_documents_sql() -> String {
    format!(
        "DELETE FROM {} WHERE {} IN (SELECT {} FROM {} WHERE {} = $1)",
        quoted(EntityKind::ReportSourceDocuments.schema().table),
        quoted("reportSourceId"),
        quoted("id"),
        quoted(EntityKind::ReportSource.schema().table),
        quoted("reportId"),
    )
}

fn remove_sources_sql() -> String {
    format!(
        "DELETE FROM {} WHERE {} = $1",
        quoted(EntityKind::ReportSource.schema().table),
        quoted("reportId"),
    )
}

fn remove_report_sql() -> String {
    format!("DELETE FROM {} WHERE {} = $1", quoted(EntityKind::Report.schema().table), quoted("id"))
}

#[async_trait]
impl ReportService for PgReportService {
    async fn remove(&self, id: RecordId) -> Result<(), AppError> {
        let id = id.get()?;
        let mut tx = self.pool.begin().await?;
        let documents = sqlx::query(&remove_documents_sql())
            .bind(id)
            .execute(&mut *tx)
            .await?
            .rows_affected();
        let sources = sqlx::query(&remove_sources_sql())
            .bind(id)
            .execute(&mut *tx)
            .await?
            .rows_affected();
        let reports = sqlx::query(&remove_report_sql())
            .bind(id)
            .execute(&mut *tx)
            .await?
            .rows_affected();
        tx.commit().await?;
        tracing::info!(report_id = id, reports, sources, documents, "report removed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cleanup_statements_target_dependents_first() {
        assert_eq!(
            remove_documents_sql(),
            "DELETE FROM \"report_source_document\" WHERE \"reportSourceId\" IN \
             (SELECT \"id\" FROM \"report_source\" WHERE \"reportId\" = $1)"
        );
        assert_eq!(remove_sources_sql(), "DELETE FROM \"report_source\" WHERE \"reportId\" = $1");
        assert_eq!(remove_report_sql(), "DELETE FROM \"report\" WHERE \"id\" = $1");
    }

    #[test]
    fn referenced_columns_exist() {
        assert!(EntityKind::ReportSourceDocuments.schema().has_column("reportSourceId"));
        assert!(EntityKind::ReportSource.schema().has_column("reportId"));
    }
}
