use serde_derive::Serialize;

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ColumnMeta {
    pub column_name: String, // snake_case
    pub column_type: String, // type label as shown in the diagram, e.g. VARCHAR(255)
    pub nullable: bool,
    pub is_primary_key: bool,
}

impl ColumnMeta {
    pub fn new(column_name: &str, column_type: &str) -> Self {
        Self {
            column_name: column_name.into(),
            column_type: column_type.into(),
            nullable: true,
            is_primary_key: false,
        }
    }

    /// Primary keys are implicitly NOT NULL.
    pub fn primary_key(mut self) -> Self {
        self.is_primary_key = true;
        self.nullable = false;
        self
    }

    pub fn not_null(mut self) -> Self {
        self.nullable = false;
        self
    }

    /// One line of a table node label: `name TYPE[ NOT NULL][ PK]`.
    pub fn label(self: &Self) -> String {
        let mut label = format!("{} {}", self.column_name, self.column_type);

        if !self.nullable {
            label.push_str(" NOT NULL");
        }
        if self.is_primary_key {
            label.push_str(" PK");
        }

        label
    }
}
