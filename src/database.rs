use crate::config::DatabaseConfig;
use crate::error::{QueryError, ReportError};
use crate::query_catalog::QueryExecutor;
use crate::types::{Row, Scalar};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use sqlx::postgres::{PgRow, PgTypeKind};
use sqlx::{Column, Connection, PgConnection, Row as _, TypeInfo, ValueRef};
use tracing::{debug, info, warn};

/// The single connection a report run holds.
///
/// Dropping a `Session` closes the socket; `close` additionally performs the
/// protocol-level goodbye and is what the normal path calls.
pub struct Session {
    conn: PgConnection,
}

impl Session {
    pub async fn connect(cfg: &DatabaseConfig) -> Result<Self, ReportError> {
        info!(
            host = %cfg.host,
            port = cfg.port,
            database = %cfg.database,
            user = %cfg.user,
            "connecting to database"
        );

        let conn = PgConnection::connect_with(&cfg.connect_options())
            .await
            .map_err(ReportError::Connect)?;

        Ok(Self { conn })
    }

    pub fn from_connection(conn: PgConnection) -> Self {
        Self { conn }
    }

    pub fn connection(&mut self) -> &mut PgConnection {
        &mut self.conn
    }

    pub async fn close(self) {
        match self.conn.close().await {
            Ok(()) => debug!("database connection closed"),
            Err(err) => warn!(error = %err, "error while closing database connection"),
        }
    }
}

#[async_trait]
impl QueryExecutor for Session {
    async fn fetch_rows(&mut self, sql: &str) -> Result<Vec<Row>, QueryError> {
        let rows = sqlx::query(sql).fetch_all(&mut self.conn).await?;

        rows.iter().map(decode_row).collect()
    }
}

/// NUMERIC values are reported as floats, like every other money column.
fn decimal_scalar(column: &str, value: Decimal) -> Result<Scalar, QueryError> {
    value
        .to_f64()
        .map(Scalar::Decimal)
        .ok_or_else(|| QueryError::OutOfRange {
            column: column.into(),
            value: value.to_string(),
        })
}

/// Converts a result row into label -> scalar pairs based on the
/// PostgreSQL type of each column. User-defined enums come back as their
/// label text.
pub fn decode_row(row: &PgRow) -> Result<Row, QueryError> {
    let mut decoded = Row::new();

    for column in row.columns() {
        let ordinal = column.ordinal();
        let type_info = column.type_info();

        let value = if row.try_get_raw(ordinal)?.is_null() {
            Scalar::Null
        } else if let PgTypeKind::Enum(_) = type_info.kind() {
            Scalar::Text(row.try_get_unchecked::<String, _>(ordinal)?)
        } else {
            match type_info.name() {
                "INT2" => Scalar::Integer(row.try_get::<i16, _>(ordinal)?.into()),
                "INT4" => Scalar::Integer(row.try_get::<i32, _>(ordinal)?.into()),
                "INT8" => Scalar::Integer(row.try_get::<i64, _>(ordinal)?),
                "FLOAT4" => Scalar::Decimal(row.try_get::<f32, _>(ordinal)?.into()),
                "FLOAT8" => Scalar::Decimal(row.try_get::<f64, _>(ordinal)?),
                "NUMERIC" => decimal_scalar(column.name(), row.try_get::<Decimal, _>(ordinal)?)?,
                "TEXT" | "VARCHAR" | "BPCHAR" | "NAME" => {
                    Scalar::Text(row.try_get::<String, _>(ordinal)?)
                }
                "TIMESTAMP" => Scalar::Timestamp(row.try_get::<NaiveDateTime, _>(ordinal)?),
                // Absolute instants are reported in UTC; month buckets are
                // cast to `timestamp` in SQL so they keep the session's zone.
                "TIMESTAMPTZ" => {
                    Scalar::Timestamp(row.try_get::<DateTime<Utc>, _>(ordinal)?.naive_utc())
                }
                "DATE" => Scalar::Timestamp(
                    row.try_get::<NaiveDate, _>(ordinal)?
                        .and_time(NaiveTime::MIN),
                ),
                other => {
                    return Err(QueryError::UnsupportedType {
                        column: column.name().into(),
                        type_name: other.into(),
                    })
                }
            }
        };

        decoded.insert(column.name().to_string(), value);
    }

    Ok(decoded)
}
