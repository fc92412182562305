use super::column_meta::ColumnMeta;
use serde_derive::Serialize;

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct TableMeta {
    pub table_name: String, // snake_case, doubles as the graph node identifier
    pub columns: Vec<ColumnMeta>,
}

impl TableMeta {
    pub fn new(table_name: &str, columns: Vec<ColumnMeta>) -> Self {
        Self {
            table_name: table_name.into(),
            columns,
        }
    }

    pub fn has_column(self: &Self, column_name: &str) -> bool {
        self.columns
            .iter()
            .any(|column: &ColumnMeta| column.column_name.eq(column_name))
    }
}
