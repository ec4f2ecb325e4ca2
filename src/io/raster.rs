use std::path::Path;

use anyhow::Context;
use image::{DynamicImage, ImageBuffer, ImageFormat};

use crate::data::image::{DataType, Image};
use crate::foundation::error::{MedflowError, MedflowResult};

/// Decode a 2D raster file (PNG, JPEG, TIFF, ...) into an image.
///
/// 8-bit files become `Uint8`, 16-bit files `Uint16` and float files `Float`, keeping the
/// file's channel layout.
pub fn read_raster(path: &Path) -> MedflowResult<Image> {
    let decoded = image::open(path).with_context(|| format!("open raster '{}'", path.display()))?;
    from_dynamic(decoded)
}

/// Decode raster bytes of any format the `image` crate can guess.
pub fn decode_raster(bytes: &[u8]) -> MedflowResult<Image> {
    let decoded = image::load_from_memory(bytes).context("decode raster from memory")?;
    from_dynamic(decoded)
}

fn from_dynamic(decoded: DynamicImage) -> MedflowResult<Image> {
    let (width, height) = (decoded.width(), decoded.height());
    let (channels, data_type, samples): (u8, DataType, Vec<f32>) = match decoded {
        DynamicImage::ImageLuma8(b) => (1, DataType::Uint8, widen(b.into_raw())),
        DynamicImage::ImageLumaA8(b) => (2, DataType::Uint8, widen(b.into_raw())),
        DynamicImage::ImageRgb8(b) => (3, DataType::Uint8, widen(b.into_raw())),
        DynamicImage::ImageRgba8(b) => (4, DataType::Uint8, widen(b.into_raw())),
        DynamicImage::ImageLuma16(b) => (1, DataType::Uint16, widen(b.into_raw())),
        DynamicImage::ImageLumaA16(b) => (2, DataType::Uint16, widen(b.into_raw())),
        DynamicImage::ImageRgb16(b) => (3, DataType::Uint16, widen(b.into_raw())),
        DynamicImage::ImageRgba16(b) => (4, DataType::Uint16, widen(b.into_raw())),
        DynamicImage::ImageRgb32F(b) => (3, DataType::Float, b.into_raw()),
        DynamicImage::ImageRgba32F(b) => (4, DataType::Float, b.into_raw()),
        other => (4, DataType::Uint8, widen(other.to_rgba8().into_raw())),
    };
    Image::new_2d(width, height, channels, data_type, samples)
}

fn widen<T: Copy + Into<f32>>(raw: Vec<T>) -> Vec<f32> {
    raw.into_iter().map(Into::into).collect()
}

/// Encode a 2D image to the format implied by `path`'s extension.
///
/// 16-bit types are written as 16-bit where the format allows it, everything else as 8-bit with
/// samples clamped to the type's range (`Float` maps `0..=1` to `0..=255`). Formats without an
/// alpha channel drop it.
pub fn write_raster(path: &Path, image: &Image) -> MedflowResult<()> {
    image.require_rank(2, "raster export")?;
    let format = ImageFormat::from_path(path)
        .with_context(|| format!("unknown raster format for '{}'", path.display()))?;
    let encoded = to_dynamic(image, format)?;
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create output dir '{}'", parent.display()))?;
    }
    encoded
        .save_with_format(path, format)
        .with_context(|| format!("write raster '{}'", path.display()))?;
    Ok(())
}

fn to_dynamic(image: &Image, format: ImageFormat) -> MedflowResult<DynamicImage> {
    let (w, h) = (image.width(), image.height());
    let wide = matches!(image.data_type(), DataType::Uint16 | DataType::Int16)
        && matches!(format, ImageFormat::Png | ImageFormat::Tiff);
    let alpha_ok = !matches!(format, ImageFormat::Jpeg | ImageFormat::Bmp);

    let out = if wide {
        let raw: Vec<u16> = image
            .samples()
            .iter()
            .map(|v| v.round().clamp(0.0, 65535.0) as u16)
            .collect();
        match image.channels() {
            1 => DynamicImage::ImageLuma16(buffer(w, h, raw)?),
            2 => DynamicImage::ImageLumaA16(buffer(w, h, raw)?),
            3 => DynamicImage::ImageRgb16(buffer(w, h, raw)?),
            4 => DynamicImage::ImageRgba16(buffer(w, h, raw)?),
            n => return Err(unsupported_channels(n)),
        }
    } else {
        let scale = if image.data_type() == DataType::Float {
            255.0
        } else {
            1.0
        };
        let raw: Vec<u8> = image
            .samples()
            .iter()
            .map(|v| (v * scale).round().clamp(0.0, 255.0) as u8)
            .collect();
        match image.channels() {
            1 => DynamicImage::ImageLuma8(buffer(w, h, raw)?),
            2 => DynamicImage::ImageLumaA8(buffer(w, h, raw)?),
            3 => DynamicImage::ImageRgb8(buffer(w, h, raw)?),
            4 => DynamicImage::ImageRgba8(buffer(w, h, raw)?),
            n => return Err(unsupported_channels(n)),
        }
    };

    Ok(match (alpha_ok, image.channels()) {
        (false, 2) => DynamicImage::ImageLuma8(out.to_luma8()),
        (false, 4) => DynamicImage::ImageRgb8(out.to_rgb8()),
        _ => out,
    })
}

fn buffer<P: image::Pixel>(
    w: u32,
    h: u32,
    raw: Vec<P::Subpixel>,
) -> MedflowResult<ImageBuffer<P, Vec<P::Subpixel>>> {
    ImageBuffer::from_raw(w, h, raw)
        .ok_or_else(|| MedflowError::dimension_mismatch("raster buffer does not match extent"))
}

fn unsupported_channels(n: u8) -> MedflowError {
    MedflowError::unsupported(format!("raster export supports 1-4 channels, got {n}"))
}

/// Write RGBA8 pixels (e.g. a rendered texture) as a raster file.
pub fn write_rgba8(path: &Path, width: u32, height: u32, rgba8: &[u8]) -> MedflowResult<()> {
    let buf = image::RgbaImage::from_raw(width, height, rgba8.to_vec())
        .ok_or_else(|| MedflowError::dimension_mismatch("rgba8 buffer does not match extent"))?;
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create output dir '{}'", parent.display()))?;
    }
    buf.save(path)
        .with_context(|| format!("write png '{}'", path.display()))?;
    Ok(())
}

#[cfg(test)]
#[path = "../../tests/unit/io/raster.rs"]
mod tests;
