use rayon::prelude::*;

use crate::data::image::Image;
use crate::foundation::error::{MedflowError, MedflowResult};

/// Axis a slice is taken perpendicular to.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum SlicePlane {
    X,
    Y,
    #[default]
    Z,
}

impl SlicePlane {
    /// Image axis index the plane is perpendicular to.
    pub fn axis(self) -> usize {
        match self {
            SlicePlane::X => 0,
            SlicePlane::Y => 1,
            SlicePlane::Z => 2,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            SlicePlane::X => "x",
            SlicePlane::Y => "y",
            SlicePlane::Z => "z",
        }
    }

    /// Texture width and height for a slice of `image` in this plane.
    pub fn texture_extent(self, image: &Image) -> (u32, u32) {
        match self {
            SlicePlane::X => (image.height(), image.depth()),
            SlicePlane::Y => (image.width(), image.depth()),
            SlicePlane::Z => (image.width(), image.height()),
        }
    }
}

impl std::str::FromStr for SlicePlane {
    type Err = MedflowError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "x" => Ok(SlicePlane::X),
            "y" => Ok(SlicePlane::Y),
            "z" => Ok(SlicePlane::Z),
            other => Err(MedflowError::config(format!(
                "slice plane must be x, y or z, got '{other}'"
            ))),
        }
    }
}

/// Effective slice for a requested index: `-1` selects the centre, indices past the end clamp
/// to the last slice, anything below `-1` is out of range.
pub fn resolve_slice_index(requested: i64, extent: u32) -> MedflowResult<u32> {
    match requested {
        -1 => Ok(extent / 2),
        i if i < -1 => Err(MedflowError::index_out_of_range(format!(
            "slice index {i} is below 0"
        ))),
        i => Ok(u32::try_from(i)
            .unwrap_or(u32::MAX)
            .min(extent.saturating_sub(1))),
    }
}

/// Samples of one slice, row-major in texture coordinates, channels interleaved.
pub fn extract_slice(image: &Image, plane: SlicePlane, index: u32) -> MedflowResult<Vec<f32>> {
    let extent = image.extent(plane.axis());
    if index >= extent {
        return Err(MedflowError::index_out_of_range(format!(
            "slice {index} outside {} extent {extent}",
            plane.as_str()
        )));
    }
    let (tw, th) = plane.texture_extent(image);
    let channels = image.channels();
    let mut out = vec![0.0f32; tw as usize * th as usize * channels as usize];
    out.par_chunks_mut(tw as usize * channels as usize)
        .enumerate()
        .for_each(|(v, row)| {
            let v = v as u32;
            for u in 0..tw {
                let (x, y, z) = match plane {
                    SlicePlane::X => (index, u, v),
                    SlicePlane::Y => (u, index, v),
                    SlicePlane::Z => (u, v, index),
                };
                for c in 0..channels {
                    row[(u * channels as u32 + c as u32) as usize] = image.sample(x, y, z, c);
                }
            }
        });
    Ok(out)
}

/// Map samples through an intensity window to straight-alpha RGBA8.
///
/// One channel is gray, two are gray plus alpha, three are RGB, four are RGBA. Alpha channels
/// are windowed like color.
pub fn window_level_rgba8(samples: &[f32], channels: u8, window: f32, level: f32) -> Vec<u8> {
    let window = window.max(f32::EPSILON);
    let low = level - window / 2.0;
    let map = |v: f32| (((v - low) / window).clamp(0.0, 1.0) * 255.0).round() as u8;

    samples
        .chunks_exact(channels.max(1) as usize)
        .flat_map(|px| match px {
            [g] => {
                let g = map(*g);
                [g, g, g, 255]
            }
            [g, a] => {
                let g = map(*g);
                [g, g, g, map(*a)]
            }
            [r, g, b] => [map(*r), map(*g), map(*b), 255],
            [r, g, b, a, ..] => [map(*r), map(*g), map(*b), map(*a)],
            [] => [0, 0, 0, 0],
        })
        .collect()
}

#[cfg(test)]
#[path = "../../tests/unit/kernels/slice.rs"]
mod tests;
