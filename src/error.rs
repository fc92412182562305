use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SchemaError {
    #[error("table `{0}` is declared more than once")]
    DuplicateTable(String),

    #[error("relationship {relationship} references unknown table `{table}`")]
    UnknownTable { relationship: String, table: String },

    #[error("relationship {relationship} references unknown column `{table}.{column}`")]
    UnknownColumn {
        relationship: String,
        table: String,
        column: String,
    },
}

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("Graphviz not found (`{program}` is not runnable)")]
    RendererMissing { program: String },

    #[error("{step} failed: {reason}")]
    RenderFailed { step: String, reason: String },

    #[error("failed to write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Schema(#[from] SchemaError),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid port `{value}`")]
    InvalidPort { value: String },

    #[error("failed to read config file {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config file: {0}")]
    Parse(#[from] toml::de::Error),
}

#[derive(Debug, Error)]
pub enum QueryError {
    #[error(transparent)]
    Database(#[from] sqlx::Error),

    #[error("column `{column}` has unsupported type `{type_name}`")]
    UnsupportedType { column: String, type_name: String },

    #[error("column `{column}` holds `{value}`, which does not fit a float")]
    OutOfRange { column: String, value: String },
}

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("Database connection failed: {0}")]
    Connect(#[source] sqlx::Error),

    #[error("Schema introspection failed: {0}")]
    Introspect(#[source] QueryError),

    #[error("{failed} of {total} report sections failed")]
    SectionsFailed { failed: usize, total: usize },

    #[error("failed to write report: {0}")]
    Output(#[from] std::io::Error),

    #[error(transparent)]
    Config(#[from] ConfigError),
}
