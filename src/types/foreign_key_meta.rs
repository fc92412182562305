use serde_derive::Serialize;

/// A foreign key pointing from `source_table.source_column` to
/// `destination_table.destination_column`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ForeignKeyMeta {
    pub source_table: String,
    pub source_column: String,

    pub destination_table: String,
    pub destination_column: String,
}

impl ForeignKeyMeta {
    pub fn new(source: (&str, &str), destination: (&str, &str)) -> Self {
        Self {
            source_table: source.0.into(),
            source_column: source.1.into(),
            destination_table: destination.0.into(),
            destination_column: destination.1.into(),
        }
    }

    pub fn is_self_reference(self: &Self) -> bool {
        self.source_table.eq(&self.destination_table)
    }
}
