//! Persistence layer: generic record operations over the registered entity schemas.

mod memory;
mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

use crate::error::AppError;
use crate::query::QueryRequest;
use crate::registry::{EntityKind, ID_COLUMN};
use async_trait::async_trait;
use serde::Serialize;
use serde_json::{Map, Value};
use std::fmt;

/// Numeric id taken from a path segment. Text that is not an integral number becomes
/// `NotANumber` and is rejected by the store, not by the caller.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RecordId {
    Int(i64),
    NotANumber,
}

impl RecordId {
    pub fn parse(raw: &str) -> Self {
        let raw = raw.trim();
        if let Ok(n) = raw.parse::<i64>() {
            return RecordId::Int(n);
        }
        match raw.parse::<f64>() {
            Ok(f) if f.is_finite() && f.fract() == 0.0 && f.abs() < i64::MAX as f64 => RecordId::Int(f as i64),
            _ => RecordId::NotANumber,
        }
    }

    pub fn get(self) -> Result<i64, AppError> {
        match self {
            RecordId::Int(n) => Ok(n),
            RecordId::NotANumber => Err(AppError::BadRequest("id is not a number".into())),
        }
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordId::Int(n) => write!(f, "{}", n),
            RecordId::NotANumber => f.write_str("NaN"),
        }
    }
}

/// Outcome of an update-by-id.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateResult {
    pub generated_maps: Vec<Value>,
    pub raw: Vec<Value>,
    pub affected: u64,
}

impl UpdateResult {
    pub fn affected(affected: u64) -> Self {
        UpdateResult {
            affected,
            ..UpdateResult::default()
        }
    }
}

pub type Record = Map<String, Value>;

#[async_trait]
pub trait EntityStore: Send + Sync {
    /// Matching rows for one page plus the total number of matches.
    async fn find_and_count(&self, kind: EntityKind, query: &QueryRequest) -> Result<(Vec<Value>, u64), AppError>;

    async fn find_one_by_id(&self, kind: EntityKind, id: RecordId) -> Result<Option<Value>, AppError>;

    /// Insert, or upsert on `id` when the record carries one. Keys outside the schema are ignored.
    async fn save(&self, kind: EntityKind, record: &Record) -> Result<Value, AppError>;

    async fn update_by_id(&self, kind: EntityKind, id: RecordId, patch: &Record) -> Result<UpdateResult, AppError>;

    async fn delete_by_id(&self, kind: EntityKind, id: RecordId) -> Result<(), AppError>;

    /// Create whatever tables are missing.
    async fn synchronize(&self) -> Result<(), AppError>;

    /// Drop every table and synchronize again.
    async fn reset(&self) -> Result<(), AppError>;

    async fn ping(&self) -> Result<(), AppError>;
}

/// Rejects patch keys that are not columns of `kind`, `id`, and empty patches.
pub(crate) fn check_patch(kind: EntityKind, patch: &Record) -> Result<(), AppError> {
    if patch.is_empty() {
        return Err(AppError::BadRequest("update values are not defined".into()));
    }
    if patch.contains_key(ID_COLUMN) {
        return Err(AppError::BadRequest(format!("id of {} cannot be updated", kind)));
    }
    let schema = kind.schema();
    if let Some(unknown) = patch.keys().find(|k| !schema.has_column(k)) {
        return Err(AppError::BadRequest(format!("property '{}' not found in {}", unknown, kind)));
    }
    Ok(())
}

/// Rejects order directions other than ASC/DESC and fields the schema does not have.
pub(crate) fn check_query(kind: EntityKind, query: &QueryRequest) -> Result<(), AppError> {
    let schema = kind.schema();
    if let Some(order) = &query.order {
        for (field, direction) in order.iter() {
            if !schema.has_column(field) {
                return Err(AppError::BadRequest(format!("cannot order {} by unknown field '{}'", kind, field)));
            }
            if direction != "ASC" && direction != "DESC" {
                return Err(AppError::BadRequest(format!("invalid order direction '{}'", direction)));
            }
        }
    }
    if let Some(select) = &query.select {
        if let Some(unknown) = select.iter().find(|f| !schema.has_column(f)) {
            return Err(AppError::BadRequest(format!("cannot select unknown field '{}' of {}", unknown, kind)));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::OrderSpec;

    #[test]
    fn record_id_coerces_numeric_text() {
        assert_eq!(RecordId::parse("5"), RecordId::Int(5));
        assert_eq!(RecordId::parse(" 42 "), RecordId::Int(42));
        assert_eq!(RecordId::parse("7.0"), RecordId::Int(7));
        assert_eq!(RecordId::parse("-3"), RecordId::Int(-3));
        assert_eq!(RecordId::parse("7.5"), RecordId::NotANumber);
        assert_eq!(RecordId::parse("abc"), RecordId::NotANumber);
        assert_eq!(RecordId::parse("NaN"), RecordId::NotANumber);
        assert_eq!(RecordId::parse("inf"), RecordId::NotANumber);
    }

    #[test]
    fn not_a_number_fails_when_used() {
        assert!(matches!(RecordId::NotANumber.get(), Err(AppError::BadRequest(_))));
        assert_eq!(RecordId::Int(9).get().unwrap(), 9);
    }

    #[test]
    fn update_result_serializes_camel_case() {
        let v = serde_json::to_value(UpdateResult::affected(1)).unwrap();
        assert_eq!(v, serde_json::json!({ "generatedMaps": [], "raw": [], "affected": 1 }));
    }

    #[test]
    fn query_check_rejects_bad_direction_and_unknown_fields() {
        let mut order = OrderSpec::default();
        order.set("title".into(), "UP".into());
        let q = QueryRequest { order: Some(order), ..QueryRequest::default() };
        assert!(matches!(check_query(EntityKind::ReportTopic, &q), Err(AppError::BadRequest(_))));

        let q = QueryRequest { select: Some(vec!["nope".into()]), ..QueryRequest::default() };
        assert!(matches!(check_query(EntityKind::ReportTopic, &q), Err(AppError::BadRequest(_))));

        let mut order = OrderSpec::default();
        order.set("title".into(), "DESC".into());
        let q = QueryRequest { order: Some(order), select: Some(vec!["id".into()]), ..QueryRequest::default() };
        assert!(check_query(EntityKind::ReportTopic, &q).is_ok());
    }

    #[test]
    fn patch_check_rejects_empty_and_unknown() {
        assert!(check_patch(EntityKind::Report, &Record::new()).is_err());
        let mut patch = Record::new();
        patch.insert("colour".into(), Value::from("red"));
        assert!(check_patch(EntityKind::Report, &patch).is_err());
        let mut patch = Record::new();
        patch.insert("id".into(), Value::from(7));
        assert!(check_patch(EntityKind::Report, &patch).is_err());
        let mut patch = Record::new();
        patch.insert("title".into(), Value::from("x"));
        assert!(check_patch(EntityKind::Report, &patch).is_ok());
    }
}
