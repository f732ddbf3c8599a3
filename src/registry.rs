//! Closed registry of manageable entity kinds: token, table schema and searchable fields.

use crate::error::AppError;
use std::fmt;
use std::str::FromStr;

/// What happens to dependents when the referenced row is deleted.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OnDelete {
    /// Plain reference; deleting a referenced row fails while dependents exist.
    Restrict,
    SetNull,
}

#[derive(Clone, Copy, Debug)]
pub struct ForeignKey {
    pub table: &'static str,
    pub on_delete: OnDelete,
}

#[derive(Clone, Copy, Debug)]
pub struct ColumnDef {
    pub name: &'static str,
    /// PostgreSQL type name, also used for parameter casts.
    pub pg_type: &'static str,
    pub nullable: bool,
    /// SQL default expression, e.g. `NOW()`.
    pub default: Option<&'static str>,
    pub references: Option<ForeignKey>,
}

impl ColumnDef {
    const fn text(name: &'static str) -> Self {
        ColumnDef { name, pg_type: "text", nullable: true, default: None, references: None }
    }

    const fn required_text(name: &'static str) -> Self {
        ColumnDef { name, pg_type: "text", nullable: false, default: None, references: None }
    }

    const fn timestamp(name: &'static str) -> Self {
        ColumnDef { name, pg_type: "timestamptz", nullable: false, default: Some("NOW()"), references: None }
    }

    const fn reference(name: &'static str, table: &'static str, on_delete: OnDelete) -> Self {
        ColumnDef {
            name,
            pg_type: "bigint",
            nullable: true,
            default: None,
            references: Some(ForeignKey { table, on_delete }),
        }
    }
}

/// Primary key column shared by every entity.
pub const ID_COLUMN: &str = "id";
pub const CREATED_AT_COLUMN: &str = "createdAt";
pub const UPDATED_AT_COLUMN: &str = "updatedAt";

const ID: ColumnDef = ColumnDef { name: ID_COLUMN, pg_type: "bigint", nullable: false, default: None, references: None };

/// Record shape handed to the store. The `id` column is always first.
#[derive(Debug)]
pub struct EntitySchema {
    pub table: &'static str,
    pub columns: &'static [ColumnDef],
}

impl EntitySchema {
    pub fn column(&self, name: &str) -> Option<&ColumnDef> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column(name).is_some()
    }
}

static REPORT_TOPIC: EntitySchema = EntitySchema {
    table: "report_topic",
    columns: &[
        ID,
        ColumnDef::required_text("title"),
        ColumnDef::text("description"),
        ColumnDef::timestamp(CREATED_AT_COLUMN),
        ColumnDef::timestamp(UPDATED_AT_COLUMN),
    ],
};

static REPORT_TEMPLATE: EntitySchema = EntitySchema {
    table: "report_template",
    columns: &[
        ID,
        ColumnDef::required_text("title"),
        ColumnDef::text("content"),
        ColumnDef::reference("topicId", "report_topic", OnDelete::SetNull),
        ColumnDef::timestamp(CREATED_AT_COLUMN),
        ColumnDef::timestamp(UPDATED_AT_COLUMN),
    ],
};

static REPORT: EntitySchema = EntitySchema {
    table: "report",
    columns: &[
        ID,
        ColumnDef::required_text("title"),
        ColumnDef::text("content"),
        ColumnDef { name: "status", pg_type: "text", nullable: false, default: Some("'draft'"), references: None },
        ColumnDef::reference("templateId", "report_template", OnDelete::SetNull),
        ColumnDef::reference("topicId", "report_topic", OnDelete::SetNull),
        ColumnDef::timestamp(CREATED_AT_COLUMN),
        ColumnDef::timestamp(UPDATED_AT_COLUMN),
    ],
};

static REPORT_SOURCE: EntitySchema = EntitySchema {
    table: "report_source",
    columns: &[
        ID,
        ColumnDef::required_text("title"),
        ColumnDef::text("url"),
        ColumnDef::text("description"),
        ColumnDef::reference("reportId", "report", OnDelete::Restrict),
        ColumnDef::timestamp(CREATED_AT_COLUMN),
    ],
};

static REPORT_SOURCE_DOCUMENT: EntitySchema = EntitySchema {
    table: "report_source_document",
    columns: &[
        ID,
        ColumnDef::text("title"),
        ColumnDef::text("name"),
        ColumnDef::text("mime"),
        ColumnDef::text("content"),
        ColumnDef::reference("reportSourceId", "report_source", OnDelete::Restrict),
        ColumnDef::timestamp(CREATED_AT_COLUMN),
    ],
};

/// Deletion path a kind takes instead of plain delete-by-id.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DeleteOverride {
    /// Removal goes through the report service, which cleans up dependents first.
    ReportService,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EntityKind {
    Report,
    ReportTemplate,
    ReportSource,
    ReportSourceDocuments,
    ReportTopic,
}

impl EntityKind {
    /// Every kind, referenced tables before the tables that point at them.
    pub const ALL: [EntityKind; 5] = [
        EntityKind::ReportTopic,
        EntityKind::ReportTemplate,
        EntityKind::Report,
        EntityKind::ReportSource,
        EntityKind::ReportSourceDocuments,
    ];

    pub fn token(self) -> &'static str {
        match self {
            EntityKind::Report => "report",
            EntityKind::ReportTemplate => "report-template",
            EntityKind::ReportSource => "report-source",
            EntityKind::ReportSourceDocuments => "report-source-documents",
            EntityKind::ReportTopic => "report-topic",
        }
    }

    /// The single validation gate for every generic route.
    pub fn resolve(token: &str) -> Result<Self, AppError> {
        EntityKind::ALL
            .into_iter()
            .find(|k| k.token() == token)
            .ok_or_else(|| AppError::UnknownEntity(token.to_string()))
    }

    pub fn schema(self) -> &'static EntitySchema {
        match self {
            EntityKind::Report => &REPORT,
            EntityKind::ReportTemplate => &REPORT_TEMPLATE,
            EntityKind::ReportSource => &REPORT_SOURCE,
            EntityKind::ReportSourceDocuments => &REPORT_SOURCE_DOCUMENT,
            EntityKind::ReportTopic => &REPORT_TOPIC,
        }
    }

    /// Fields matched case-insensitively by `?search=`. May be empty.
    pub fn search_fields(self) -> &'static [&'static str] {
        match self {
            EntityKind::Report => &["title"],
            EntityKind::ReportTemplate => &["title"],
            EntityKind::ReportSource => &["title", "url", "description"],
            EntityKind::ReportSourceDocuments => &["title", "name", "mime"],
            EntityKind::ReportTopic => &["title"],
        }
    }

    pub fn delete_override(self) -> Option<DeleteOverride> {
        match self {
            EntityKind::Report => Some(DeleteOverride::ReportService),
            _ => None,
        }
    }
}

impl FromStr for EntityKind {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        EntityKind::resolve(s)
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.token())
    }
}
