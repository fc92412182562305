use crate::dot_generator::{generate_dot, write_dot, DotStyle};
use crate::error::RenderError;
use crate::renderer::{ImageFormat, Renderer};
use crate::types::SchemaModel;
use std::path::{Path, PathBuf};
use tracing::info;

pub const DOT_FILE: &str = "schema_diagram.dot";
pub const PNG_FILE: &str = "schema_diagram.png";
pub const SVG_FILE: &str = "schema_diagram.svg";

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DiagramArtifacts {
    pub dot: PathBuf,
    pub png: PathBuf,
    pub svg: PathBuf,
}

impl DiagramArtifacts {
    pub fn in_dir(dir: &Path) -> Self {
        Self {
            dot: dir.join(DOT_FILE),
            png: dir.join(PNG_FILE),
            svg: dir.join(SVG_FILE),
        }
    }
}

/// Writes the DOT source and renders it to PNG and SVG. Files produced
/// before a failing step are left in place. Callers run
/// [`Renderer::check`] first so nothing is written without Graphviz.
pub fn render_diagram(
    renderer: &Renderer,
    schema: &SchemaModel,
    style: &DotStyle,
    out_dir: &Path,
) -> Result<DiagramArtifacts, RenderError> {
    let artifacts = DiagramArtifacts::in_dir(out_dir);

    let dot = generate_dot(schema, style)?;
    write_dot(&artifacts.dot, &dot)?;
    info!(path = %artifacts.dot.display(), "wrote graph description");

    renderer.render(&artifacts.dot, ImageFormat::Png, &artifacts.png)?;
    renderer.render(&artifacts.dot, ImageFormat::Svg, &artifacts.svg)?;

    Ok(artifacts)
}
