//! Builds parameterized SELECT, COUNT, INSERT, UPDATE, DELETE from an entity schema and a query.

use crate::query::QueryRequest;
use crate::registry::{EntitySchema, ID_COLUMN, UPDATED_AT_COLUMN};
use serde_json::{Map, Value};

/// Quote identifier for PostgreSQL (safe: only from the static schemas or checked against them).
pub fn quoted(s: &str) -> String {
    format!("\"{}\"", s.replace('"', "\"\""))
}

#[derive(Debug)]
pub struct QueryBuf {
    pub sql: String,
    pub params: Vec<Value>,
}

impl QueryBuf {
    fn new() -> Self {
        QueryBuf {
            sql: String::new(),
            params: Vec::new(),
        }
    }

    fn push_param(&mut self, v: Value) -> u32 {
        let n = self.params.len() as u32 + 1;
        self.params.push(v);
        n
    }
}

/// Placeholder with a cast to the column type when the column is known.
fn placeholder(schema: &EntitySchema, column: &str, param_num: u32) -> String {
    schema
        .column(column)
        .map(|c| format!("${}::{}", param_num, c.pg_type))
        .unwrap_or_else(|| format!("${}", param_num))
}

/// SELECT list: every column, or the projected subset in request order.
fn column_list(schema: &EntitySchema, select: Option<&[String]>) -> String {
    match select {
        Some(fields) => fields.iter().map(|f| quoted(f)).collect::<Vec<_>>().join(", "),
        None => schema.columns.iter().map(|c| quoted(c.name)).collect::<Vec<_>>().join(", "),
    }
}

/// Escape LIKE wildcards so the needle matches literally.
pub fn escape_like(needle: &str) -> String {
    let mut out = String::with_capacity(needle.len() + 2);
    for ch in needle.chars() {
        if matches!(ch, '\\' | '%' | '_') {
            out.push('\\');
        }
        out.push(ch);
    }
    out
}

fn where_clause(q: &mut QueryBuf, query: &QueryRequest) -> String {
    match query.search_filter() {
        Some(clauses) => {
            let needle = clauses[0].needle.as_str();
            let param_num = q.push_param(Value::String(format!("%{}%", escape_like(needle))));
            let ors: Vec<String> = clauses
                .iter()
                .map(|c| format!("{} ILIKE ${}", quoted(&c.field), param_num))
                .collect();
            format!(" WHERE ({})", ors.join(" OR "))
        }
        None => String::new(),
    }
}

fn order_clause(query: &QueryRequest) -> String {
    let mut parts = Vec::new();
    let mut has_id = false;
    if let Some(order) = &query.order {
        for (field, direction) in order.iter() {
            has_id |= field == ID_COLUMN;
            let direction = if direction == "DESC" { "DESC" } else { "ASC" };
            parts.push(format!("{} {}", quoted(field), direction));
        }
    }
    if !has_id {
        parts.push(format!("{} ASC", quoted(ID_COLUMN)));
    }
    format!(" ORDER BY {}", parts.join(", "))
}

/// One page of rows: projection, search, order (id as tie-breaker), LIMIT/OFFSET.
pub fn select_page(schema: &EntitySchema, query: &QueryRequest) -> QueryBuf {
    let mut q = QueryBuf::new();
    let where_sql = where_clause(&mut q, query);
    let limit = query.take.map(|n| format!(" LIMIT {}", n)).unwrap_or_default();
    let offset = query.skip.map(|n| format!(" OFFSET {}", n)).unwrap_or_default();
    q.sql = format!(
        "SELECT {} FROM {}{}{}{}{}",
        column_list(schema, query.select.as_deref()),
        quoted(schema.table),
        where_sql,
        order_clause(query),
        limit,
        offset
    );
    q
}

/// Total rows matching the search, ignoring pagination.
pub fn count(schema: &EntitySchema, query: &QueryRequest) -> QueryBuf {
    let mut q = QueryBuf::new();
    let where_sql = where_clause(&mut q, query);
    q.sql = format!("SELECT COUNT(*) FROM {}{}", quoted(schema.table), where_sql);
    q
}

/// SELECT by primary key.
pub fn select_by_id(schema: &EntitySchema, id: i64) -> QueryBuf {
    let mut q = QueryBuf::new();
    let n = q.push_param(Value::from(id));
    q.sql = format!(
        "SELECT {} FROM {} WHERE {} = {}",
        column_list(schema, None),
        quoted(schema.table),
        quoted(ID_COLUMN),
        placeholder(schema, ID_COLUMN, n)
    );
    q
}

/// INSERT of the schema columns present in `record`; keys outside the schema are skipped.
/// With an `id` in the record this becomes an upsert on `id`.
pub fn insert(schema: &EntitySchema, record: &Map<String, Value>) -> QueryBuf {
    let mut q = QueryBuf::new();
    let table = quoted(schema.table);
    let mut cols = Vec::new();
    let mut placeholders = Vec::new();
    for c in schema.columns {
        let Some(val) = record.get(c.name) else { continue };
        let n = q.push_param(val.clone());
        cols.push(quoted(c.name));
        placeholders.push(placeholder(schema, c.name, n));
    }
    let returning = column_list(schema, None);
    if cols.is_empty() {
        q.sql = format!("INSERT INTO {} DEFAULT VALUES RETURNING {}", table, returning);
        return q;
    }
    let conflict = if record.contains_key(ID_COLUMN) {
        let mut sets: Vec<String> = cols
            .iter()
            .filter(|c| **c != quoted(ID_COLUMN))
            .map(|c| format!("{} = EXCLUDED.{}", c, c))
            .collect();
        if sets.is_empty() {
            sets.push(format!("{} = EXCLUDED.{}", quoted(ID_COLUMN), quoted(ID_COLUMN)));
        }
        format!(" ON CONFLICT ({}) DO UPDATE SET {}", quoted(ID_COLUMN), sets.join(", "))
    } else {
        String::new()
    };
    q.sql = format!(
        "INSERT INTO {} ({}) VALUES ({}){} RETURNING {}",
        table,
        cols.join(", "),
        placeholders.join(", "),
        conflict,
        returning
    );
    q
}

/// Move the id sequence past the highest stored id, after inserts with explicit ids.
pub fn sync_id_sequence(schema: &EntitySchema) -> String {
    let table = quoted(schema.table);
    format!(
        "SELECT setval(pg_get_serial_sequence('{}', '{}'), GREATEST((SELECT MAX({}) FROM {}), 1))",
        table.replace('\'', "''"),
        ID_COLUMN,
        quoted(ID_COLUMN),
        table
    )
}

/// UPDATE by id. Call with a patch already checked against the schema.
/// `updatedAt` is refreshed unless the patch sets it.
pub fn update(schema: &EntitySchema, id: i64, patch: &Map<String, Value>) -> QueryBuf {
    let mut q = QueryBuf::new();
    let mut sets = Vec::new();
    for (k, v) in patch {
        let n = q.push_param(v.clone());
        sets.push(format!("{} = {}", quoted(k), placeholder(schema, k, n)));
    }
    if schema.has_column(UPDATED_AT_COLUMN) && !patch.contains_key(UPDATED_AT_COLUMN) {
        sets.push(format!("{} = NOW()", quoted(UPDATED_AT_COLUMN)));
    }
    let n = q.push_param(Value::from(id));
    q.sql = format!(
        "UPDATE {} SET {} WHERE {} = {}",
        quoted(schema.table),
        sets.join(", "),
        quoted(ID_COLUMN),
        placeholder(schema, ID_COLUMN, n)
    );
    q
}

/// DELETE by id.
pub fn delete(schema: &EntitySchema, id: i64) -> QueryBuf {
    let mut q = QueryBuf::new();
    let n = q.push_param(Value::from(id));
    q.sql = format!(
        "DELETE FROM {} WHERE {} = {}",
        quoted(schema.table),
        quoted(ID_COLUMN),
        placeholder(schema, ID_COLUMN, n)
    );
    q
}
