use std::path::{Path, PathBuf};

use crate::data::image::Image;
use crate::foundation::error::{MedflowError, MedflowResult};
use crate::io::{metaimage, raster};
use crate::nodes::importer::{filename_param, set_filename};
use crate::process::context::ExecContext;
use crate::process::node::{ParamValue, ProcessObject, Produced};

/// Writes a 2D image to a raster file. Its output is the exported image.
#[derive(Clone, Debug, Default)]
pub struct ImageExporter {
    filename: Option<PathBuf>,
}

impl ImageExporter {
    pub fn new(filename: impl Into<PathBuf>) -> Self {
        Self {
            filename: Some(filename.into()),
        }
    }
}

impl ProcessObject for ImageExporter {
    fn kind(&self) -> &'static str {
        "image_exporter"
    }

    fn input_slots(&self) -> &'static [&'static str] {
        &["input"]
    }

    fn set_parameter(&mut self, name: &str, value: &ParamValue) -> MedflowResult<()> {
        let kind = self.kind();
        set_filename(&mut self.filename, kind, name, value)
    }

    fn parameter(&self, name: &str) -> Option<ParamValue> {
        filename_param(self.filename.as_deref(), name)
    }

    fn execute(&mut self, ctx: &mut ExecContext<'_>) -> MedflowResult<Produced> {
        export(ctx, self.kind(), self.filename.as_deref(), |path, image| {
            image.require_rank(2, "image_exporter")?;
            raster::write_raster(path, image)
        })
    }
}

/// Writes a 2D or 3D image as MetaImage header plus raw data.
#[derive(Clone, Debug, Default)]
pub struct MetaImageExporter {
    filename: Option<PathBuf>,
}

impl MetaImageExporter {
    pub fn new(filename: impl Into<PathBuf>) -> Self {
        Self {
            filename: Some(filename.into()),
        }
    }
}

impl ProcessObject for MetaImageExporter {
    fn kind(&self) -> &'static str {
        "metaimage_exporter"
    }

    fn input_slots(&self) -> &'static [&'static str] {
        &["input"]
    }

    fn set_parameter(&mut self, name: &str, value: &ParamValue) -> MedflowResult<()> {
        let kind = self.kind();
        set_filename(&mut self.filename, kind, name, value)
    }

    fn parameter(&self, name: &str) -> Option<ParamValue> {
        filename_param(self.filename.as_deref(), name)
    }

    fn execute(&mut self, ctx: &mut ExecContext<'_>) -> MedflowResult<Produced> {
        export(
            ctx,
            self.kind(),
            self.filename.as_deref(),
            metaimage::write_metaimage,
        )
    }
}

fn export(
    ctx: &mut ExecContext<'_>,
    kind: &str,
    filename: Option<&Path>,
    write: impl FnOnce(&Path, &Image) -> MedflowResult<()>,
) -> MedflowResult<Produced> {
    let path =
        filename.ok_or_else(|| MedflowError::config(format!("{kind} needs a filename")))?;
    let image = ctx.input_image("input")?;
    write(path, &image)?;
    tracing::info!(kind, path = %path.display(), "exported image");
    Ok(image.into())
}

#[cfg(test)]
#[path = "../../tests/unit/nodes/exporter.rs"]
mod tests;
