//! Generic CRUD execution: resolve the entity kind, translate the request, call the store.

use crate::error::AppError;
use crate::query::{translate, ListParams};
use crate::registry::{DeleteOverride, EntityKind, CREATED_AT_COLUMN, ID_COLUMN};
use crate::report::ReportService;
use crate::store::{EntityStore, Record, RecordId, UpdateResult};
use serde_json::Value;

fn body_to_map(value: Value) -> Result<Record, AppError> {
    match value {
        Value::Object(m) => Ok(m),
        _ => Err(AppError::BadRequest("body must be a JSON object".into())),
    }
}

pub struct CrudService;

impl CrudService {
    /// One page of records and the total number of matches.
    pub async fn list(
        store: &dyn EntityStore,
        token: &str,
        params: &ListParams,
    ) -> Result<(Vec<Value>, u64), AppError> {
        let kind = EntityKind::resolve(token)?;
        let query = translate(kind, params);
        tracing::debug!(entity = %kind, query = ?query, "list");
        store.find_and_count(kind, &query).await
    }

    /// Record by id, or `None` when it does not exist.
    pub async fn read(store: &dyn EntityStore, token: &str, id: &str) -> Result<Option<Value>, AppError> {
        let kind = EntityKind::resolve(token)?;
        store.find_one_by_id(kind, RecordId::parse(id)).await
    }

    /// Save a new record. `id` and `createdAt` are server-assigned and dropped from the body.
    pub async fn create(store: &dyn EntityStore, token: &str, body: Value) -> Result<Value, AppError> {
        let kind = EntityKind::resolve(token)?;
        let mut record = body_to_map(body)?;
        record.remove(ID_COLUMN);
        record.remove(CREATED_AT_COLUMN);
        store.save(kind, &record).await
    }

    /// Apply the body as-is to the record with `id`.
    pub async fn update(
        store: &dyn EntityStore,
        token: &str,
        id: &str,
        body: Value,
    ) -> Result<UpdateResult, AppError> {
        let kind = EntityKind::resolve(token)?;
        let patch = body_to_map(body)?;
        store.update_by_id(kind, RecordId::parse(id), &patch).await
    }

    /// Delete by id, routed through the kind's delete override when it has one.
    pub async fn delete(
        store: &dyn EntityStore,
        reports: &dyn ReportService,
        token: &str,
        id: &str,
    ) -> Result<(), AppError> {
        let kind = EntityKind::resolve(token)?;
        let id = RecordId::parse(id);
        match kind.delete_override() {
            Some(DeleteOverride::ReportService) => reports.remove(id).await,
            None => store.delete_by_id(kind, id).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingReports {
        removed: Mutex<Vec<RecordId>>,
    }

    #[async_trait]
    impl ReportService for RecordingReports {
        async fn remove(&self, id: RecordId) -> Result<(), AppError> {
            self.removed.lock().unwrap().push(id);
            Ok(())
        }
    }

    #[tokio::test]
    async fn unknown_token_fails_every_operation() {
        let store = MemoryStore::new();
        let reports = RecordingReports::default();
        assert!(matches!(
            CrudService::list(&store, "nope", &ListParams::default()).await,
            Err(AppError::UnknownEntity(_))
        ));
        assert!(matches!(CrudService::read(&store, "nope", "1").await, Err(AppError::UnknownEntity(_))));
        assert!(matches!(
            CrudService::create(&store, "nope", json!({})).await,
            Err(AppError::UnknownEntity(_))
        ));
        assert!(matches!(
            CrudService::update(&store, "nope", "1", json!({ "title": "x" })).await,
            Err(AppError::UnknownEntity(_))
        ));
        assert!(matches!(
            CrudService::delete(&store, &reports, "nope", "1").await,
            Err(AppError::UnknownEntity(_))
        ));
    }

    #[tokio::test]
    async fn create_strips_server_assigned_fields() {
        let store = MemoryStore::new();
        let saved = CrudService::create(
            &store,
            "report-topic",
            json!({ "id": 77, "createdAt": "1999-01-01T00:00:00Z", "title": "t" }),
        )
        .await
        .unwrap();
        assert_eq!(saved["id"], 1);
        assert_ne!(saved["createdAt"], "1999-01-01T00:00:00Z");
        assert_eq!(saved["title"], "t");

        let plain = CrudService::create(&store, "report-topic", json!({ "title": "u" })).await.unwrap();
        assert_eq!(plain["id"], 2);
    }

    #[tokio::test]
    async fn create_rejects_non_object_bodies() {
        let store = MemoryStore::new();
        let err = CrudService::create(&store, "report-topic", json!([1, 2])).await.unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
    }

    #[tokio::test]
    async fn read_missing_record_is_none() {
        let store = MemoryStore::new();
        assert_eq!(CrudService::read(&store, "report", "12").await.unwrap(), None);
    }

    #[tokio::test]
    async fn update_returns_store_result() {
        let store = MemoryStore::new();
        CrudService::create(&store, "report-topic", json!({ "title": "t" })).await.unwrap();
        let res = CrudService::update(&store, "report-topic", "1", json!({ "title": "u" })).await.unwrap();
        assert_eq!(res.affected, 1);
        let row = CrudService::read(&store, "report-topic", "1").await.unwrap().unwrap();
        assert_eq!(row["title"], "u");
    }

    #[tokio::test]
    async fn report_delete_goes_through_report_service() {
        let store = MemoryStore::new();
        let reports = RecordingReports::default();
        CrudService::create(&store, "report", json!({ "title": "r" })).await.unwrap();
        CrudService::delete(&store, &reports, "report", "1").await.unwrap();
        assert_eq!(*reports.removed.lock().unwrap(), vec![RecordId::Int(1)]);
        assert_eq!(store.len(EntityKind::Report), 1);
    }

    #[tokio::test]
    async fn other_kinds_delete_by_id() {
        let store = MemoryStore::new();
        let reports = RecordingReports::default();
        CrudService::create(&store, "report-topic", json!({ "title": "t" })).await.unwrap();
        CrudService::delete(&store, &reports, "report-topic", "1").await.unwrap();
        assert!(reports.removed.lock().unwrap().is_empty());
        assert!(store.is_empty(EntityKind::ReportTopic));
    }

    #[tokio::test]
    async fn non_numeric_id_reaches_the_store() {
        let store = MemoryStore::new();
        let err = CrudService::read(&store, "report", "abc").await.unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
    }
}
