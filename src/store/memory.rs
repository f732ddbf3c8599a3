//! In-memory implementation of EntityStore for tests and local experiments.
//!
//! Mirrors the PostgreSQL store's observable behavior: id sequence, column defaults,
//! NOT NULL and foreign key constraints (including ON DELETE SET NULL), case-insensitive
//! substring search, NULLS LAST ordering with id as tie-breaker.

use super::{check_patch, check_query, EntityStore, Record, RecordId, UpdateResult};
use crate::error::AppError;
use crate::query::{QueryRequest, SearchClause};
use crate::registry::{ColumnDef, EntityKind, EntitySchema, OnDelete, ID_COLUMN, UPDATED_AT_COLUMN};
use async_trait::async_trait;
use serde_json::Value;
use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, RwLock};

#[derive(Default)]
struct Table {
    next_id: i64,
    rows: BTreeMap<i64, Record>,
}

#[derive(Clone, Default)]
pub struct MemoryStore {
    tables: Arc<RwLock<HashMap<EntityKind, Table>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored rows of `kind`.
    pub fn len(&self, kind: EntityKind) -> usize {
        self.tables
            .read()
            .map(|t| t.get(&kind).map_or(0, |t| t.rows.len()))
            .unwrap_or(0)
    }

    pub fn is_empty(&self, kind: EntityKind) -> bool {
        self.len(kind) == 0
    }

    fn read(&self) -> Result<std::sync::RwLockReadGuard<'_, HashMap<EntityKind, Table>>, AppError> {
        self.tables
            .read()
            .map_err(|e| AppError::Internal(format!("failed to acquire read lock: {}", e)))
    }

    fn write(&self) -> Result<std::sync::RwLockWriteGuard<'_, HashMap<EntityKind, Table>>, AppError> {
        self.tables
            .write()
            .map_err(|e| AppError::Internal(format!("failed to acquire write lock: {}", e)))
    }
}

fn now() -> Value {
    Value::String(chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true))
}

/// Value a column takes when the record does not provide one.
fn column_default(default: Option<&str>) -> Value {
    match default {
        Some("NOW()") => now(),
        Some(d) if d.starts_with('\'') && d.ends_with('\'') && d.len() >= 2 => {
            Value::String(d[1..d.len() - 1].to_string())
        }
        _ => Value::Null,
    }
}

fn matches_search(row: &Record, clauses: &[SearchClause]) -> bool {
    clauses.iter().any(|c| match row.get(&c.field) {
        Some(Value::String(s)) => s.to_lowercase().contains(&c.needle.to_lowercase()),
        _ => false,
    })
}

/// Ascending comparison with NULL sorting after every other value.
fn compare_values(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    let a = a.filter(|v| !v.is_null());
    let b = b.filter(|v| !v.is_null());
    match (a, b) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Greater,
        (Some(_), None) => Ordering::Less,
        (Some(Value::Number(x)), Some(Value::Number(y))) => {
            let (x, y) = (x.as_f64().unwrap_or(0.0), y.as_f64().unwrap_or(0.0));
            x.partial_cmp(&y).unwrap_or(Ordering::Equal)
        }
        (Some(Value::String(x)), Some(Value::String(y))) => x.cmp(y),
        (Some(Value::Bool(x)), Some(Value::Bool(y))) => x.cmp(y),
        (Some(x), Some(y)) => x.to_string().cmp(&y.to_string()),
    }
}

fn sort_rows(rows: &mut [&Record], query: &QueryRequest) {
    rows.sort_by(|a, b| {
        if let Some(order) = &query.order {
            for (field, direction) in order.iter() {
                let ord = compare_values(a.get(field), b.get(field));
                let ord = if direction == "DESC" { ord.reverse() } else { ord };
                if ord != Ordering::Equal {
                    return ord;
                }
            }
        }
        compare_values(a.get(ID_COLUMN), b.get(ID_COLUMN))
    });
}

fn project(row: &Record, schema: &EntitySchema, select: Option<&[String]>) -> Value {
    let mut out = Record::new();
    match select {
        Some(fields) => {
            for f in fields {
                out.insert(f.clone(), row.get(f).cloned().unwrap_or(Value::Null));
            }
        }
        None => {
            for c in schema.columns {
                out.insert(c.name.to_string(), row.get(c.name).cloned().unwrap_or(Value::Null));
            }
        }
    }
    Value::Object(out)
}

type Tables = HashMap<EntityKind, Table>;

/// Id held by a reference cell; numeric text counts, as PostgreSQL casts it.
fn reference_id(v: Option<&Value>) -> Option<i64> {
    match v? {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn check_not_null(kind: EntityKind, row: &Record) -> Result<(), AppError> {
    for c in kind.schema().columns {
        if c.nullable || c.name == ID_COLUMN {
            continue;
        }
        if row.get(c.name).map_or(true, Value::is_null) {
            return Err(AppError::BadRequest(format!(
                "null value in column \"{}\" of {} violates not-null constraint",
                c.name, kind
            )));
        }
    }
    Ok(())
}

/// Every non-null reference in `row` must name an existing parent row.
fn check_references(tables: &Tables, kind: EntityKind, row: &Record) -> Result<(), AppError> {
    for c in kind.schema().columns {
        let Some(fk) = c.references else { continue };
        let value = match row.get(c.name) {
            None | Some(Value::Null) => continue,
            Some(v) => v,
        };
        let Some(id) = reference_id(Some(value)) else {
            return Err(AppError::BadRequest(format!("invalid reference {} in {}.{}", value, kind, c.name)));
        };
        let exists = EntityKind::ALL
            .into_iter()
            .find(|k| k.schema().table == fk.table)
            .and_then(|parent| tables.get(&parent))
            .map_or(false, |t| t.rows.contains_key(&id));
        if !exists {
            return Err(AppError::BadRequest(format!(
                "{}.{} = {} violates foreign key constraint on {}",
                kind, c.name, id, fk.table
            )));
        }
    }
    Ok(())
}

/// Columns of any kind that reference the table of `kind`.
fn dependents(kind: EntityKind) -> Vec<(EntityKind, &'static ColumnDef)> {
    let table = kind.schema().table;
    EntityKind::ALL
        .into_iter()
        .flat_map(|k| {
            k.schema()
                .columns
                .iter()
                .filter(move |c| c.references.map_or(false, |fk| fk.table == table))
                .map(move |c| (k, c))
        })
        .collect()
}

fn is_referenced(tables: &Tables, dependent: EntityKind, column: &str, id: i64) -> bool {
    tables
        .get(&dependent)
        .map_or(false, |t| t.rows.values().any(|row| reference_id(row.get(column)) == Some(id)))
}

#[async_trait]
impl EntityStore for MemoryStore {
    async fn find_and_count(&self, kind: EntityKind, query: &QueryRequest) -> Result<(Vec<Value>, u64), AppError> {
        check_query(kind, query)?;
        let tables = self.read()?;
        let Some(table) = tables.get(&kind) else {
            return Ok((Vec::new(), 0));
        };
        let mut rows: Vec<&Record> = table
            .rows
            .values()
            .filter(|row| query.search_filter().map_or(true, |clauses| matches_search(row, clauses)))
            .collect();
        let total = rows.len() as u64;
        sort_rows(&mut rows, query);
        let skip = query.skip.unwrap_or(0) as usize;
        let take = query.take.map_or(usize::MAX, |n| n as usize);
        let schema = kind.schema();
        let items = rows
            .into_iter()
            .skip(skip)
            .take(take)
            .map(|row| project(row, schema, query.select.as_deref()))
            .collect();
        Ok((items, total))
    }

    async fn find_one_by_id(&self, kind: EntityKind, id: RecordId) -> Result<Option<Value>, AppError> {
        let id = id.get()?;
        let tables = self.read()?;
        Ok(tables
            .get(&kind)
            .and_then(|t| t.rows.get(&id))
            .map(|row| project(row, kind.schema(), None)))
    }

    async fn save(&self, kind: EntityKind, record: &Record) -> Result<Value, AppError> {
        let schema = kind.schema();
        let mut tables = self.write()?;
        let explicit_id = match record.get(ID_COLUMN) {
            Some(v) => Some(
                v.as_i64()
                    .ok_or_else(|| AppError::BadRequest(format!("invalid id {} for {}", v, kind)))?,
            ),
            None => None,
        };
        let existing = explicit_id.and_then(|id| tables.get(&kind).and_then(|t| t.rows.get(&id)));
        let mut row = Record::new();
        for c in schema.columns {
            let value = match record.get(c.name) {
                Some(v) => v.clone(),
                None => match existing.and_then(|e| e.get(c.name)) {
                    Some(v) => v.clone(),
                    None => column_default(c.default),
                },
            };
            row.insert(c.name.to_string(), value);
        }
        check_not_null(kind, &row)?;
        check_references(&tables, kind, &row)?;

        let table = tables.entry(kind).or_default();
        let id = match explicit_id {
            Some(id) => {
                table.next_id = table.next_id.max(id);
                id
            }
            None => {
                table.next_id += 1;
                table.next_id
            }
        };
        row.insert(ID_COLUMN.to_string(), Value::from(id));
        table.rows.insert(id, row.clone());
        Ok(Value::Object(row))
    }

    async fn update_by_id(&self, kind: EntityKind, id: RecordId, patch: &Record) -> Result<UpdateResult, AppError> {
        check_patch(kind, patch)?;
        let id = id.get()?;
        let mut tables = self.write()?;
        let Some(current) = tables.get(&kind).and_then(|t| t.rows.get(&id)) else {
            return Ok(UpdateResult::affected(0));
        };
        let mut row = current.clone();
        for (k, v) in patch {
            row.insert(k.clone(), v.clone());
        }
        if kind.schema().has_column(UPDATED_AT_COLUMN) && !patch.contains_key(UPDATED_AT_COLUMN) {
            row.insert(UPDATED_AT_COLUMN.to_string(), now());
        }
        check_not_null(kind, &row)?;
        check_references(&tables, kind, &row)?;
        if let Some(table) = tables.get_mut(&kind) {
            table.rows.insert(id, row);
        }
        Ok(UpdateResult::affected(1))
    }

    /// Fails while a restricting reference points at the row; SET NULL references are cleared.
    async fn delete_by_id(&self, kind: EntityKind, id: RecordId) -> Result<(), AppError> {
        let id = id.get()?;
        let mut tables = self.write()?;
        if !tables.get(&kind).map_or(false, |t| t.rows.contains_key(&id)) {
            return Ok(());
        }
        let dependents = dependents(kind);
        for (dependent, column) in &dependents {
            let restrict = column.references.map_or(false, |fk| fk.on_delete == OnDelete::Restrict);
            if restrict && is_referenced(&tables, *dependent, column.name, id) {
                return Err(AppError::BadRequest(format!(
                    "{} {} is still referenced from {}.{} (foreign key constraint)",
                    kind, id, dependent, column.name
                )));
            }
        }
        for (dependent, column) in &dependents {
            if column.references.map_or(true, |fk| fk.on_delete != OnDelete::SetNull) {
                continue;
            }
            let Some(table) = tables.get_mut(dependent) else { continue };
            for row in table.rows.values_mut() {
                if reference_id(row.get(column.name)) == Some(id) {
                    row.insert(column.name.to_string(), Value::Null);
                }
            }
        }
        if let Some(table) = tables.get_mut(&kind) {
            table.rows.remove(&id);
        }
        Ok(())
    }

    async fn synchronize(&self) -> Result<(), AppError> {
        let mut tables = self.write()?;
        for kind in EntityKind::ALL {
            tables.entry(kind).or_default();
        }
        Ok(())
    }

    async fn reset(&self) -> Result<(), AppError> {
        self.write()?.clear();
        self.synchronize().await
    }

    async fn ping(&self) -> Result<(), AppError> {
        self.read().map(|_| ())
    }
}
