//! File formats: raster images through `image`, MetaImage volumes, numbered file sequences.

pub mod metaimage;
pub mod raster;
pub mod sequence;

use std::path::Path;

use crate::data::image::Image;
use crate::foundation::error::MedflowResult;

/// Read any supported image file, picking the reader from the extension.
pub fn read_image(path: &Path) -> MedflowResult<Image> {
    if metaimage::is_metaimage(path) {
        metaimage::read_metaimage(path)
    } else {
        raster::read_raster(path)
    }
}
