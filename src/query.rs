//! Translation of list query parameters (`page`, `perPage`, `sorting`, `search`, `fields`)
//! into a structured [`QueryRequest`].
//!
//! Malformed input never fails here: it disables the corresponding feature for the request.
//! Anything that needs the schema (unknown fields, invalid directions) is left to the store.

use crate::registry::EntityKind;
use serde::Deserialize;
use utoipa::IntoParams;

/// Raw list query as received on `GET /v1/generic/:entity`.
#[derive(Debug, Default, Clone, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ListParams {
    /// 1-based page number; requires `perPage`.
    pub page: Option<String>,
    /// Page size.
    #[serde(rename = "perPage")]
    pub per_page: Option<String>,
    /// Comma-separated `field:direction` pairs, e.g. `title:asc,createdAt:desc`.
    pub sorting: Option<String>,
    /// Free-text needle matched against the entity's search fields.
    pub search: Option<String>,
    /// Comma-separated list of fields to return.
    pub fields: Option<String>,
}

/// Ordered `field -> DIRECTION` mapping. A repeated field keeps its first position
/// and takes the last direction.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct OrderSpec(Vec<(String, String)>);

impl OrderSpec {
    pub fn set(&mut self, field: String, direction: String) {
        match self.0.iter_mut().find(|(f, _)| *f == field) {
            Some(entry) => entry.1 = direction,
            None => self.0.push((field, direction)),
        }
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.0.iter().find(|(f, _)| f == field).map(|(_, d)| d.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(f, d)| (f.as_str(), d.as_str()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// One case-insensitive "contains" match. Clauses of a request are OR-combined.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchClause {
    pub field: String,
    pub needle: String,
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct QueryRequest {
    pub take: Option<u64>,
    /// `None` also stands for an offset of zero.
    pub skip: Option<u64>,
    pub order: Option<OrderSpec>,
    pub search: Option<Vec<SearchClause>>,
    /// Projected fields (`field -> true`); `None` returns every column.
    pub select: Option<Vec<String>>,
}

impl QueryRequest {
    /// Search clauses that actually filter. An empty clause list (entity without search
    /// fields) filters nothing, the same as an absent `search`.
    pub fn search_filter(&self) -> Option<&[SearchClause]> {
        self.search.as_deref().filter(|clauses| !clauses.is_empty())
    }
}

/// LIMIT and OFFSET are bigint in PostgreSQL.
const MAX_ROWS: u64 = i64::MAX as u64;

/// Positive integer that fits a bigint; anything else is malformed.
fn positive(raw: Option<&str>) -> Option<u64> {
    raw.and_then(|s| s.trim().parse::<u64>().ok())
        .filter(|n| (1..=MAX_ROWS).contains(n))
}

fn comma_list(raw: &str) -> impl Iterator<Item = &str> {
    raw.split(',').map(str::trim).filter(|s| !s.is_empty())
}

fn translate_pagination(page: Option<&str>, per_page: Option<&str>) -> (Option<u64>, Option<u64>) {
    let take = positive(per_page);
    let skip = match (positive(page), take) {
        (Some(page), Some(per_page)) => Some((page - 1).saturating_mul(per_page).min(MAX_ROWS)).filter(|s| *s > 0),
        _ => None,
    };
    (take, skip)
}

fn translate_sorting(sorting: &str) -> Option<OrderSpec> {
    let mut order = OrderSpec::default();
    for pair in comma_list(sorting) {
        let (field, direction) = match pair.split_once(':') {
            Some((f, d)) => (f.trim(), d.trim()),
            None => (pair, "asc"),
        };
        if field.is_empty() {
            continue;
        }
        order.set(field.to_string(), direction.to_uppercase());
    }
    Some(order).filter(|o| !o.is_empty())
}

fn translate_search(kind: EntityKind, needle: &str) -> Vec<SearchClause> {
    kind.search_fields()
        .iter()
        .map(|field| SearchClause {
            field: (*field).to_string(),
            needle: needle.to_string(),
        })
        .collect()
}

fn translate_fields(fields: &str) -> Option<Vec<String>> {
    let mut out: Vec<String> = Vec::new();
    for field in comma_list(fields) {
        if !out.iter().any(|f| f == field) {
            out.push(field.to_string());
        }
    }
    Some(out).filter(|o| !o.is_empty())
}

/// Build the query for one list request against `kind`.
pub fn translate(kind: EntityKind, params: &ListParams) -> QueryRequest {
    let (take, skip) = translate_pagination(params.page.as_deref(), params.per_page.as_deref());
    QueryRequest {
        take,
        skip,
        order: params.sorting.as_deref().and_then(translate_sorting),
        search: params
            .search
            .as_deref()
            .filter(|s| !s.is_empty())
            .map(|needle| translate_search(kind, needle)),
        select: params.fields.as_deref().and_then(translate_fields),
    }
}
