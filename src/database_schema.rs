use crate::config::Settings;
use crate::database::Session;
use crate::error::{QueryError, ReportError};
use crate::types::{ColumnMeta, ForeignKeyMeta, SchemaModel, TableMeta};
use tracing::info;

const COLUMNS_SQL: &str = "
    SELECT
        c.table_name::text,
        c.column_name::text,
        COALESCE(
            CASE
                WHEN c.data_type = 'USER-DEFINED' THEN c.udt_name::text
                WHEN c.data_type = 'character varying'
                    THEN 'VARCHAR(' || c.character_maximum_length || ')'
                WHEN c.data_type = 'numeric'
                    THEN 'DECIMAL(' || c.numeric_precision || ',' || c.numeric_scale || ')'
            END,
            UPPER(c.data_type::text)
        ) AS column_type,
        c.is_nullable = 'YES' AS nullable,
        pk.column_name IS NOT NULL AS is_primary_key
    FROM information_schema.tables t
    JOIN information_schema.columns c
        ON t.table_schema = c.table_schema AND t.table_name = c.table_name
    LEFT JOIN (
        SELECT ku.table_name, ku.column_name
        FROM information_schema.table_constraints tc
        JOIN information_schema.key_column_usage ku
            ON tc.constraint_schema = ku.constraint_schema
            AND tc.constraint_name = ku.constraint_name
        WHERE tc.constraint_type = 'PRIMARY KEY' AND tc.table_schema = 'public'
    ) pk ON c.table_name = pk.table_name AND c.column_name = pk.column_name
    WHERE t.table_schema = 'public'
        AND t.table_type = 'BASE TABLE'
        AND t.table_name NOT LIKE 'pg_%'
    ORDER BY c.table_name, c.ordinal_position";

const FOREIGN_KEYS_SQL: &str = "
    SELECT DISTINCT
        tc.table_name::text,
        kcu.column_name::text,
        ccu.table_name::text,
        ccu.column_name::text
    FROM information_schema.table_constraints tc
    JOIN information_schema.key_column_usage kcu
        ON tc.constraint_schema = kcu.constraint_schema
        AND tc.constraint_name = kcu.constraint_name
    JOIN information_schema.constraint_column_usage ccu
        ON tc.constraint_schema = ccu.constraint_schema
        AND tc.constraint_name = ccu.constraint_name
    WHERE tc.constraint_type = 'FOREIGN KEY' AND tc.table_schema = 'public'
    ORDER BY 1, 2";

type ColumnRecord = (String, String, String, bool, bool);
type ForeignKeyRecord = (String, String, String, String);

/// Groups `(table, column, ...)` records, already ordered by table and
/// ordinal position, into tables.
fn build_tables(records: Vec<ColumnRecord>) -> Vec<TableMeta> {
    let mut tables: Vec<TableMeta> = Vec::new();

    for (table_name, column_name, column_type, nullable, is_primary_key) in records {
        let column = ColumnMeta {
            column_name,
            column_type,
            nullable,
            is_primary_key,
        };

        match tables.last_mut() {
            Some(table) if table.table_name == table_name => table.columns.push(column),
            _ => tables.push(TableMeta::new(&table_name, vec![column])),
        }
    }

    tables
}

fn build_relationships(records: Vec<ForeignKeyRecord>) -> Vec<ForeignKeyMeta> {
    records
        .iter()
        .map(|(source_table, source_column, destination_table, destination_column)| {
            ForeignKeyMeta::new(
                (source_table.as_str(), source_column.as_str()),
                (destination_table.as_str(), destination_column.as_str()),
            )
        })
        .collect()
}

/// Reads the `public` schema of the connected database into a model.
pub async fn get_database_schema(session: &mut Session) -> Result<SchemaModel, QueryError> {
    let columns: Vec<ColumnRecord> = sqlx::query_as(COLUMNS_SQL)
        .fetch_all(session.connection())
        .await?;

    let foreign_keys: Vec<ForeignKeyRecord> = sqlx::query_as(FOREIGN_KEYS_SQL)
        .fetch_all(session.connection())
        .await?;

    let schema = SchemaModel {
        tables: build_tables(columns),
        relationships: build_relationships(foreign_keys),
    };

    info!(
        tables = schema.tables.len(),
        relationships = schema.relationships.len(),
        "introspected database schema"
    );

    Ok(schema)
}

/// Connects with `settings`, introspects and releases the connection.
pub async fn load_database_schema(settings: &Settings) -> Result<SchemaModel, ReportError> {
    let mut session = Session::connect(&settings.database).await?;

    let schema = get_database_schema(&mut session)
        .await
        .map_err(ReportError::Introspect);
    session.close().await;

    schema
}
