use std::path::{Path, PathBuf};

use crate::data::image::Image;
use crate::foundation::error::{MedflowError, MedflowResult};
use crate::io::{metaimage, raster};
use crate::nodes::text_param;
use crate::process::context::ExecContext;
use crate::process::node::{ParamValue, ProcessObject, Produced, unknown_parameter};

/// Imports a 2D raster file (PNG, JPEG, ...).
#[derive(Clone, Debug, Default)]
pub struct ImageImporter {
    filename: Option<PathBuf>,
}

impl ImageImporter {
    pub fn new(filename: impl Into<PathBuf>) -> Self {
        Self {
            filename: Some(filename.into()),
        }
    }
}

impl ProcessObject for ImageImporter {
    fn kind(&self) -> &'static str {
        "image_importer"
    }

    fn set_parameter(&mut self, name: &str, value: &ParamValue) -> MedflowResult<()> {
        let kind = self.kind();
        set_filename(&mut self.filename, kind, name, value)
    }

    fn parameter(&self, name: &str) -> Option<ParamValue> {
        filename_param(self.filename.as_deref(), name)
    }

    fn execute(&mut self, _ctx: &mut ExecContext<'_>) -> MedflowResult<Produced> {
        import(self.kind(), self.filename.as_deref(), raster::read_raster)
    }
}

/// Imports a 2D or 3D MetaImage (`.mhd`/`.mha`) with spacing and orientation.
#[derive(Clone, Debug, Default)]
pub struct MetaImageImporter {
    filename: Option<PathBuf>,
}

impl MetaImageImporter {
    pub fn new(filename: impl Into<PathBuf>) -> Self {
        Self {
            filename: Some(filename.into()),
        }
    }
}

impl ProcessObject for MetaImageImporter {
    fn kind(&self) -> &'static str {
        "metaimage_importer"
    }

    fn set_parameter(&mut self, name: &str, value: &ParamValue) -> MedflowResult<()> {
        let kind = self.kind();
        set_filename(&mut self.filename, kind, name, value)
    }

    fn parameter(&self, name: &str) -> Option<ParamValue> {
        filename_param(self.filename.as_deref(), name)
    }

    fn execute(&mut self, _ctx: &mut ExecContext<'_>) -> MedflowResult<Produced> {
        import(self.kind(), self.filename.as_deref(), metaimage::read_metaimage)
    }
}

pub(crate) fn set_filename(
    slot: &mut Option<PathBuf>,
    kind: &str,
    name: &str,
    value: &ParamValue,
) -> MedflowResult<()> {
    match name {
        "filename" => {
            *slot = Some(PathBuf::from(text_param(kind, name, value)?));
            Ok(())
        }
        _ => Err(unknown_parameter(kind, name)),
    }
}

pub(crate) fn filename_param(filename: Option<&Path>, name: &str) -> Option<ParamValue> {
    match name {
        "filename" => filename.map(|p| ParamValue::Text(p.to_string_lossy().into_owned())),
        _ => None,
    }
}

fn import(
    kind: &str,
    filename: Option<&Path>,
    read: fn(&Path) -> MedflowResult<Image>,
) -> MedflowResult<Produced> {
    let path =
        filename.ok_or_else(|| MedflowError::config(format!("{kind} needs a filename")))?;
    let image = read(path)?;
    tracing::debug!(kind, path = %path.display(), rank = image.rank(), "imported");
    Ok(image.into())
}
