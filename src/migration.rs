//! Apply the static entity schemas to the database: CREATE TABLE with foreign keys, and DROP.
//! Order follows the registry's dependency order (referenced tables first).

use crate::error::AppError;
use crate::registry::{ColumnDef, EntityKind, EntitySchema, OnDelete, ID_COLUMN};
use crate::sql::quoted;
use sqlx::PgPool;

fn column_ddl(c: &ColumnDef) -> String {
    if c.name == ID_COLUMN {
        return format!("{} BIGSERIAL PRIMARY KEY", quoted(c.name));
    }
    let mut def = format!("{} {}", quoted(c.name), c.pg_type.to_uppercase());
    if !c.nullable {
        def.push_str(" NOT NULL");
    }
    if let Some(d) = c.default {
        def.push_str(" DEFAULT ");
        def.push_str(d);
    }
    if let Some(fk) = c.references {
        def.push_str(&format!(" REFERENCES {} ({})", quoted(fk.table), quoted(ID_COLUMN)));
        if fk.on_delete == OnDelete::SetNull {
            def.push_str(" ON DELETE SET NULL");
        }
    }
    def
}

pub fn create_table_sql(schema: &EntitySchema) -> String {
    let cols: Vec<String> = schema.columns.iter().map(column_ddl).collect();
    format!("CREATE TABLE IF NOT EXISTS {} ({})", quoted(schema.table), cols.join(", "))
}

pub fn drop_table_sql(schema: &EntitySchema) -> String {
    format!("DROP TABLE IF EXISTS {} CASCADE", quoted(schema.table))
}

/// Create every missing entity table. Idempotent.
pub async fn synchronize(pool: &PgPool) -> Result<(), AppError> {
    for kind in EntityKind::ALL {
        let sql = create_table_sql(kind.schema());
        tracing::debug!(sql = %sql, "synchronize");
        sqlx::query(&sql).execute(pool).await?;
    }
    Ok(())
}

/// Drop every entity table, dependents first.
pub async fn drop_all(pool: &PgPool) -> Result<(), AppError> {
    for kind in EntityKind::ALL.iter().rev() {
        let sql = drop_table_sql(kind.schema());
        tracing::debug!(sql = %sql, "drop");
        sqlx::query(&sql).execute(pool).await?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn report_source_table_ddl() {
        assert_eq!(
            create_table_sql(EntityKind::ReportSource.schema()),
            "CREATE TABLE IF NOT EXISTS \"report_source\" (\
             \"id\" BIGSERIAL PRIMARY KEY, \
             \"title\" TEXT NOT NULL, \
             \"url\" TEXT, \
             \"description\" TEXT, \
             \"reportId\" BIGINT REFERENCES \"report\" (\"id\"), \
             \"createdAt\" TIMESTAMPTZ NOT NULL DEFAULT NOW())"
        );
    }

    #[test]
    fn set_null_references_and_defaults() {
        let ddl = create_table_sql(EntityKind::Report.schema());
        assert!(ddl.contains("\"status\" TEXT NOT NULL DEFAULT 'draft'"));
        assert!(ddl.contains("\"templateId\" BIGINT REFERENCES \"report_template\" (\"id\") ON DELETE SET NULL"));
    }

    #[test]
    fn drop_cascades() {
        assert_eq!(
            drop_table_sql(EntityKind::ReportTopic.schema()),
            "DROP TABLE IF EXISTS \"report_topic\" CASCADE"
        );
    }
}
