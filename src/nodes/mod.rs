//! Built-in process objects: sources, file importers and exporters, the file streamer, Gaussian
//! smoothing, renderers and the [`View`] that groups renderers.

use std::collections::BTreeMap;

use crate::foundation::error::{MedflowError, MedflowResult};
use crate::process::node::{ParamValue, ProcessObject, bad_parameter};

pub mod exporter;
pub mod gaussian;
pub mod importer;
pub mod renderer;
pub mod source;
pub mod streamer;
pub mod view;

pub use exporter::{ImageExporter, MetaImageExporter};
pub use gaussian::GaussianSmoothingFilter;
pub use importer::{ImageImporter, MetaImageImporter};
pub use renderer::{ImageRenderer, SliceRenderer};
pub use source::{ImageSequenceSource, ImageSource};
pub use streamer::ImageFileStreamer;
pub use view::{View, ViewMode};

/// Kinds [`create_node`] can build.
pub const NODE_KINDS: &[&str] = &[
    "image_importer",
    "metaimage_importer",
    "image_file_streamer",
    "gaussian_smoothing",
    "image_exporter",
    "metaimage_exporter",
    "slice_renderer",
    "image_renderer",
];

/// Build a node by kind name and apply `params` in key order.
///
/// In-memory sources are not constructible here; they need image data.
pub fn create_node(
    kind: &str,
    params: &BTreeMap<String, ParamValue>,
) -> MedflowResult<Box<dyn ProcessObject>> {
    let mut node: Box<dyn ProcessObject> = match kind {
        "image_importer" => Box::new(ImageImporter::default()),
        "metaimage_importer" => Box::new(MetaImageImporter::default()),
        "image_file_streamer" => Box::new(ImageFileStreamer::default()),
        "gaussian_smoothing" => Box::new(GaussianSmoothingFilter::default()),
        "image_exporter" => Box::new(ImageExporter::default()),
        "metaimage_exporter" => Box::new(MetaImageExporter::default()),
        "slice_renderer" => Box::new(SliceRenderer::default()),
        "image_renderer" => Box::new(ImageRenderer::default()),
        other => {
            return Err(MedflowError::config(format!(
                "unknown node kind '{other}' (known: {})",
                NODE_KINDS.join(", ")
            )));
        }
    };
    for (name, value) in params {
        node.set_parameter(name, value)?;
    }
    Ok(node)
}

pub(crate) fn text_param(kind: &str, name: &str, value: &ParamValue) -> MedflowResult<String> {
    value
        .as_str()
        .map(str::to_owned)
        .ok_or_else(|| bad_parameter(kind, name, "a string", value))
}

pub(crate) fn int_param(kind: &str, name: &str, value: &ParamValue) -> MedflowResult<i64> {
    value
        .as_i64()
        .ok_or_else(|| bad_parameter(kind, name, "an integer", value))
}

pub(crate) fn float_param(kind: &str, name: &str, value: &ParamValue) -> MedflowResult<f32> {
    value
        .as_f64()
        .map(|v| v as f32)
        .ok_or_else(|| bad_parameter(kind, name, "a number", value))
}

#[cfg(test)]
#[path = "../../tests/unit/nodes/factory.rs"]
mod tests;
