use crate::error::RenderError;
use std::io::ErrorKind;
use std::path::Path;
use std::process::{Command, Output};
use tracing::{debug, info};

pub const INSTALL_HINT: &str =
    "Install with: apt-get install graphviz (Ubuntu) or brew install graphviz (Mac)";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ImageFormat {
    Png,
    Svg,
}

impl ImageFormat {
    pub fn extension(self: &Self) -> &'static str {
        match self {
            ImageFormat::Png => "png",
            ImageFormat::Svg => "svg",
        }
    }

    fn flag(self: &Self) -> String {
        format!("-T{}", self.extension())
    }
}

/// Thin wrapper around the Graphviz `dot` executable.
#[derive(Clone, Debug)]
pub struct Renderer {
    program: String,
}

impl Default for Renderer {
    fn default() -> Self {
        Self::new("dot")
    }
}

fn stderr_reason(output: &Output) -> String {
    let stderr = String::from_utf8_lossy(&output.stderr);
    let stderr = stderr.trim();

    if stderr.is_empty() {
        format!("exited with {}", output.status)
    } else {
        format!("exited with {}: {}", output.status, stderr)
    }
}

impl Renderer {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }

    pub fn program(self: &Self) -> &str {
        &self.program
    }

    /// Runs `dot -V`. Returns the version banner, which Graphviz prints to
    /// stderr.
    pub fn check(self: &Self) -> Result<String, RenderError> {
        let missing = || RenderError::RendererMissing {
            program: self.program.clone(),
        };

        let output = Command::new(&self.program).arg("-V").output().map_err(|err| {
            debug!(program = %self.program, error = %err, "renderer not runnable");
            missing()
        })?;

        if !output.status.success() {
            debug!(
                program = %self.program,
                status = %output.status,
                "renderer version check failed"
            );
            return Err(missing());
        }

        let banner = String::from_utf8_lossy(&output.stderr).trim().to_string();
        info!(program = %self.program, version = %banner, "renderer found");

        Ok(banner)
    }

    /// `dot -T<format> <input> -o <output>`
    pub fn render(
        self: &Self,
        input: &Path,
        format: ImageFormat,
        output: &Path,
    ) -> Result<(), RenderError> {
        let step = format!("Generating {}", output.display());

        let result = Command::new(&self.program)
            .arg(format.flag())
            .arg(input)
            .arg("-o")
            .arg(output)
            .output()
            .map_err(|err| RenderError::RenderFailed {
                step: step.clone(),
                reason: match err.kind() {
                    ErrorKind::NotFound => format!("'{}' command not found", self.program),
                    _ => err.to_string(),
                },
            })?;

        if !result.status.success() {
            return Err(RenderError::RenderFailed {
                step,
                reason: stderr_reason(&result),
            });
        }

        info!(output = %output.display(), "rendered {}", format.extension());
        Ok(())
    }
}
