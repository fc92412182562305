use crate::error::{RenderError, SchemaError};
use crate::types::{ColumnMeta, ForeignKeyMeta, SchemaModel, TableMeta};
use std::{fs, path::Path};

/// Graph-wide presentation settings.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DotStyle {
    pub rankdir: String,
    pub font: String,
    pub fill_color: String,
}

impl Default for DotStyle {
    fn default() -> Self {
        Self {
            rankdir: "TB".into(),
            font: "Arial".into(),
            fill_color: "lightblue".into(),
        }
    }
}

/// `users|id UUID NOT NULL PK\lemail ...\l` with Graphviz left-justified
/// line breaks in place of newlines.
fn node_label(table: &TableMeta) -> String {
    if table.columns.is_empty() {
        return table.table_name.clone();
    }

    let columns: Vec<String> = table.columns.iter().map(ColumnMeta::label).collect();
    let label = format!("{}|{}\n", table.table_name, columns.join("\n"));

    label.replace('\n', "\\l")
}

fn node_declaration(table: &TableMeta) -> String {
    format!(
        "  {} [label=\"{}\", shape=record];",
        table.table_name,
        node_label(table)
    )
}

fn edge_declaration(fk: &ForeignKeyMeta) -> String {
    format!(
        "  {} -> {} [label=\"{}\"];",
        fk.source_table, fk.destination_table, fk.source_column
    )
}

pub fn generate_dot(schema: &SchemaModel, style: &DotStyle) -> Result<String, SchemaError> {
    schema.validate()?;

    let nodes: Vec<String> = schema.tables.iter().map(node_declaration).collect();
    let edges: Vec<String> = schema.relationships.iter().map(edge_declaration).collect();

    Ok(format!(
        "digraph ERD {{
  rankdir={rankdir};
  node [fontname=\"{font}\", fontsize=10];
  edge [fontname=\"{font}\", fontsize=8];

  // Define table styling
  node [shape=record, style=filled, fillcolor={fill}];

{nodes}

  // Define relationships
  edge [arrowhead=crow];

{edges}
}}
",
        rankdir = style.rankdir,
        font = style.font,
        fill = style.fill_color,
        nodes = nodes.join("\n"),
        edges = edges.join("\n"),
    ))
}

pub fn write_dot(path: &Path, content: &str) -> Result<(), RenderError> {
    fs::write(path, content.as_bytes()).map_err(|source| RenderError::Write {
        path: path.to_path_buf(),
        source,
    })
}
