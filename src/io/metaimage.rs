use std::path::{Path, PathBuf};

use anyhow::Context;

use crate::data::image::{DataType, Image};
use crate::foundation::core::{Affine3A, Mat3, Vec3};
use crate::foundation::error::{MedflowError, MedflowResult};

/// Parsed `.mhd` header.
#[derive(Clone, Debug, PartialEq)]
pub struct MetaHeader {
    pub dims: Vec<u32>,
    pub element_type: DataType,
    pub channels: u8,
    pub spacing: Vec3,
    pub offset: Vec3,
    /// Direction cosines, read column by column.
    pub matrix: Mat3,
    /// `None` for `LOCAL` (data follows the header in the same file).
    pub data_file: Option<String>,
    pub msb: bool,
}

impl MetaHeader {
    pub fn transform(&self) -> Affine3A {
        Affine3A::from_mat3_translation(self.matrix, self.offset)
    }

    fn element_count(&self) -> usize {
        self.dims.iter().map(|&d| d as usize).product::<usize>() * self.channels as usize
    }
}

fn header_err(msg: impl Into<String>) -> MedflowError {
    MedflowError::invalid_input(format!("metaimage header: {}", msg.into()))
}

fn element_type(tag: &str) -> MedflowResult<DataType> {
    Ok(match tag {
        "MET_UCHAR" => DataType::Uint8,
        "MET_CHAR" => DataType::Int8,
        "MET_USHORT" => DataType::Uint16,
        "MET_SHORT" => DataType::Int16,
        "MET_FLOAT" => DataType::Float,
        other => {
            return Err(MedflowError::unsupported(format!(
                "metaimage element type {other} is not supported"
            )));
        }
    })
}

fn element_tag(data_type: DataType) -> &'static str {
    match data_type {
        DataType::Uint8 => "MET_UCHAR",
        DataType::Int8 => "MET_CHAR",
        DataType::Uint16 => "MET_USHORT",
        DataType::Int16 => "MET_SHORT",
        DataType::Float => "MET_FLOAT",
    }
}

fn element_size(data_type: DataType) -> usize {
    match data_type {
        DataType::Uint8 | DataType::Int8 => 1,
        DataType::Uint16 | DataType::Int16 => 2,
        DataType::Float => 4,
    }
}

fn floats(key: &str, value: &str) -> MedflowResult<Vec<f32>> {
    value
        .split_whitespace()
        .map(|t| {
            t.parse::<f32>()
                .map_err(|_| header_err(format!("{key}: '{t}' is not a number")))
        })
        .collect()
}

fn vec3(key: &str, value: &str, fill: f32) -> MedflowResult<Vec3> {
    let v = floats(key, value)?;
    if v.is_empty() || v.len() > 3 {
        return Err(header_err(format!("{key} needs 1 to 3 values")));
    }
    Ok(Vec3::new(
        v[0],
        v.get(1).copied().unwrap_or(fill),
        v.get(2).copied().unwrap_or(fill),
    ))
}

/// Parse header text up to and including `ElementDataFile`.
pub fn parse_header(text: &str) -> MedflowResult<MetaHeader> {
    let mut ndims: Option<usize> = None;
    let mut dims = None;
    let mut element = None;
    let mut channels = 1u8;
    let mut spacing = Vec3::ONE;
    let mut offset = Vec3::ZERO;
    let mut matrix = Mat3::IDENTITY;
    let mut data_file = None;
    let mut msb = false;

    for line in text.lines() {
        let Some((key, value)) = line.split_once('=') else {
            continue;
        };
        let (key, value) = (key.trim(), value.trim());
        match key {
            "ObjectType" if value != "Image" => {
                return Err(header_err(format!("ObjectType {value} is not an image")));
            }
            "NDims" => {
                ndims = Some(
                    value
                        .parse()
                        .map_err(|_| header_err(format!("NDims '{value}'")))?,
                )
            }
            "DimSize" => {
                dims = Some(
                    value
                        .split_whitespace()
                        .map(|t| t.parse::<u32>())
                        .collect::<Result<Vec<_>, _>>()
                        .map_err(|_| header_err(format!("DimSize '{value}'")))?,
                )
            }
            "ElementType" => element = Some(element_type(value)?),
            "ElementNumberOfChannels" => {
                channels = value
                    .parse()
                    .map_err(|_| header_err(format!("ElementNumberOfChannels '{value}'")))?
            }
            "ElementSpacing" | "ElementSize" => spacing = vec3(key, value, 1.0)?,
            "Offset" | "Origin" | "Position" => offset = vec3(key, value, 0.0)?,
            "TransformMatrix" | "Orientation" | "Rotation" => {
                let m = floats(key, value)?;
                matrix = match m.len() {
                    9 => Mat3::from_cols_slice(&m),
                    4 => Mat3::from_cols(
                        Vec3::new(m[0], m[1], 0.0),
                        Vec3::new(m[2], m[3], 0.0),
                        Vec3::Z,
                    ),
                    n => return Err(header_err(format!("{key} has {n} values"))),
                };
            }
            "BinaryDataByteOrderMSB" | "ElementByteOrderMSB" => {
                msb = value.eq_ignore_ascii_case("true")
            }
            "CompressedData" if value.eq_ignore_ascii_case("true") => {
                return Err(MedflowError::unsupported(
                    "compressed metaimage data is not supported",
                ));
            }
            "ElementDataFile" => {
                data_file = Some(value.to_string());
                break;
            }
            _ => {}
        }
    }

    let dims: Vec<u32> = dims.ok_or_else(|| header_err("missing DimSize"))?;
    let ndims = ndims.unwrap_or(dims.len());
    if !(2..=3).contains(&ndims) || dims.len() != ndims {
        return Err(MedflowError::dimension_mismatch(format!(
            "metaimage must be 2D or 3D with matching DimSize, got NDims={ndims} DimSize={dims:?}"
        )));
    }
    let data_file = data_file.ok_or_else(|| header_err("missing ElementDataFile"))?;
    Ok(MetaHeader {
        dims,
        element_type: element.ok_or_else(|| header_err("missing ElementType"))?,
        channels,
        spacing,
        offset,
        matrix,
        data_file: (!data_file.eq_ignore_ascii_case("LOCAL")).then_some(data_file),
        msb,
    })
}

/// Read a MetaImage (`.mhd` header with a raw data file, or a single `.mha` with `LOCAL`
/// data).
#[tracing::instrument]
pub fn read_metaimage(path: &Path) -> MedflowResult<Image> {
    let bytes =
        std::fs::read(path).with_context(|| format!("open metaimage '{}'", path.display()))?;
    let header_end = local_data_start(&bytes);
    let header = parse_header(&String::from_utf8_lossy(&bytes[..header_end]))?;

    let raw: Vec<u8> = match &header.data_file {
        None => bytes[header_end..].to_vec(),
        Some(name) => {
            let data_path = path.parent().unwrap_or(Path::new("")).join(name);
            std::fs::read(&data_path)
                .with_context(|| format!("open metaimage data '{}'", data_path.display()))?
        }
    };
    decode(&header, &raw)
}

/// Byte offset just past the `ElementDataFile` line, or the whole buffer when absent.
fn local_data_start(bytes: &[u8]) -> usize {
    let mut start = 0;
    for line in bytes.split_inclusive(|&b| b == b'\n') {
        start += line.len();
        if line.starts_with(b"ElementDataFile") {
            return start;
        }
    }
    bytes.len()
}

/// Build an image from a parsed header and its raw element bytes.
pub fn decode(header: &MetaHeader, raw: &[u8]) -> MedflowResult<Image> {
    let count = header.element_count();
    let size = element_size(header.element_type);
    if raw.len() < count * size {
        return Err(MedflowError::dimension_mismatch(format!(
            "metaimage data holds {} bytes, header needs {}",
            raw.len(),
            count * size
        )));
    }
    let msb = header.msb;
    let samples: Vec<f32> = raw[..count * size]
        .chunks_exact(size)
        .map(|c| match header.element_type {
            DataType::Uint8 => f32::from(c[0]),
            DataType::Int8 => f32::from(c[0] as i8),
            DataType::Uint16 => {
                let b = [c[0], c[1]];
                f32::from(if msb { u16::from_be_bytes(b) } else { u16::from_le_bytes(b) })
            }
            DataType::Int16 => {
                let b = [c[0], c[1]];
                f32::from(if msb { i16::from_be_bytes(b) } else { i16::from_le_bytes(b) })
            }
            DataType::Float => {
                let b = [c[0], c[1], c[2], c[3]];
                if msb { f32::from_be_bytes(b) } else { f32::from_le_bytes(b) }
            }
        })
        .collect();

    let d = &header.dims;
    let image = if d.len() == 3 {
        Image::new_3d(d[0], d[1], d[2], header.channels, header.element_type, samples)?
    } else {
        Image::new_2d(d[0], d[1], header.channels, header.element_type, samples)?
    };
    Ok(image
        .with_spacing(header.spacing)
        .with_transform(header.transform()))
}

/// Write `image` as `<path>` (header) plus a sibling `.raw` data file, little-endian.
#[tracing::instrument(skip(image))]
pub fn write_metaimage(path: &Path, image: &Image) -> MedflowResult<()> {
    let data_path: PathBuf = path.with_extension("raw");
    let data_name = data_path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .ok_or_else(|| MedflowError::invalid_input(format!("bad output path '{}'", path.display())))?;

    let (lo, hi) = image.data_type().value_range();
    let mut raw = Vec::with_capacity(image.samples().len() * element_size(image.data_type()));
    for &v in image.samples() {
        let v = v.clamp(lo, hi);
        match image.data_type() {
            DataType::Uint8 => raw.push(v.round() as u8),
            DataType::Int8 => raw.push((v.round() as i8) as u8),
            DataType::Uint16 => raw.extend_from_slice(&(v.round() as u16).to_le_bytes()),
            DataType::Int16 => raw.extend_from_slice(&(v.round() as i16).to_le_bytes()),
            DataType::Float => raw.extend_from_slice(&v.to_le_bytes()),
        }
    }

    let ndims = image.rank();
    let take = |v: Vec3| -> String {
        v.to_array()[..ndims as usize]
            .iter()
            .map(|x| x.to_string())
            .collect::<Vec<_>>()
            .join(" ")
    };
    let t = image.transform();
    let dims: Vec<String> = (0..ndims as usize)
        .map(|a| image.extent(a).to_string())
        .collect();
    let m = Mat3::from(t.matrix3);
    let cols: Vec<f32> = if ndims == 3 {
        m.to_cols_array().to_vec()
    } else {
        vec![m.x_axis.x, m.x_axis.y, m.y_axis.x, m.y_axis.y]
    };
    let matrix = cols
        .iter()
        .map(|x| x.to_string())
        .collect::<Vec<_>>()
        .join(" ");

    let mut header = String::new();
    header.push_str("ObjectType = Image\n");
    header.push_str(&format!("NDims = {ndims}\n"));
    header.push_str("BinaryData = True\n");
    header.push_str("BinaryDataByteOrderMSB = False\n");
    header.push_str("CompressedData = False\n");
    header.push_str(&format!("TransformMatrix = {matrix}\n"));
    header.push_str(&format!("Offset = {}\n", take(Vec3::from(t.translation))));
    header.push_str(&format!("ElementSpacing = {}\n", take(image.spacing())));
    header.push_str(&format!("DimSize = {}\n", dims.join(" ")));
    if image.channels() > 1 {
        header.push_str(&format!("ElementNumberOfChannels = {}\n", image.channels()));
    }
    header.push_str(&format!("ElementType = {}\n", element_tag(image.data_type())));
    header.push_str(&format!("ElementDataFile = {data_name}\n"));

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create output dir '{}'", parent.display()))?;
    }
    std::fs::write(&data_path, &raw)
        .with_context(|| format!("write metaimage data '{}'", data_path.display()))?;
    std::fs::write(path, header)
        .with_context(|| format!("write metaimage header '{}'", path.display()))?;
    Ok(())
}

/// Whether `path` names a MetaImage file.
pub fn is_metaimage(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("mhd") || e.eq_ignore_ascii_case("mha"))
}

#[cfg(test)]
#[path = "../../tests/unit/io/metaimage.rs"]
mod tests;
