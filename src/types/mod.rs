pub mod column_meta;
pub mod table_meta;
pub mod foreign_key_meta;
pub mod schema_model;
pub mod scalar;

pub use column_meta::ColumnMeta;
pub use table_meta::TableMeta;
pub use foreign_key_meta::ForeignKeyMeta;
pub use schema_model::SchemaModel;
pub use scalar::{Row, Scalar};
