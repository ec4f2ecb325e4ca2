use std::sync::Arc;

use crate::foundation::core::{Affine3A, DeviceId, Rect, Vec3};
use crate::foundation::error::{MedflowError, MedflowResult};
use crate::foundation::math::BoundingBox;

/// Storage type of the samples as they were acquired.
///
/// Samples are always held as `f32`; the type drives default intensity windows and kernel build
/// options.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataType {
    Uint8,
    Int8,
    Uint16,
    Int16,
    Float,
}

impl DataType {
    /// Intensity window used when a renderer is left on its default.
    pub fn default_window(self) -> f32 {
        match self {
            DataType::Float => 1.0,
            DataType::Uint8 | DataType::Int8 => 255.0,
            DataType::Uint16 | DataType::Int16 => 65535.0,
        }
    }

    /// Intensity level used when a renderer is left on its default.
    pub fn default_level(self) -> f32 {
        match self {
            DataType::Float => 0.5,
            DataType::Uint8 => 127.5,
            DataType::Uint16 => 32767.5,
            DataType::Int8 | DataType::Int16 => 0.0,
        }
    }

    /// Preprocessor define selecting the kernel variant for this type.
    pub fn build_option(self) -> &'static str {
        match self {
            DataType::Float => "-DTYPE_FLOAT",
            DataType::Int8 | DataType::Int16 => "-DTYPE_INT",
            DataType::Uint8 | DataType::Uint16 => "-DTYPE_UINT",
        }
    }

    /// Inclusive value range representable by the type.
    pub fn value_range(self) -> (f32, f32) {
        match self {
            DataType::Uint8 => (0.0, 255.0),
            DataType::Int8 => (-128.0, 127.0),
            DataType::Uint16 => (0.0, 65535.0),
            DataType::Int16 => (-32768.0, 32767.0),
            DataType::Float => (f32::MIN, f32::MAX),
        }
    }
}

/// A 2D or 3D image with interleaved channels.
///
/// 2D images have `depth == 1` and `rank == 2`. Samples are row-major, slice-major:
/// `((z * height + y) * width + x) * channels + c`.
#[derive(Clone, Debug, PartialEq)]
pub struct Image {
    width: u32,
    height: u32,
    depth: u32,
    rank: u8,
    channels: u8,
    data_type: DataType,
    spacing: Vec3,
    transform: Affine3A,
    samples: Arc<Vec<f32>>,
    location: Option<DeviceId>,
}

impl Image {
    /// Build a 2D image. `samples.len()` must equal `width * height * channels`.
    pub fn new_2d(
        width: u32,
        height: u32,
        channels: u8,
        data_type: DataType,
        samples: Vec<f32>,
    ) -> MedflowResult<Self> {
        Self::build(width, height, 1, 2, channels, data_type, samples)
    }

    /// Build a 3D image. `samples.len()` must equal `width * height * depth * channels`.
    pub fn new_3d(
        width: u32,
        height: u32,
        depth: u32,
        channels: u8,
        data_type: DataType,
        samples: Vec<f32>,
    ) -> MedflowResult<Self> {
        Self::build(width, height, depth, 3, channels, data_type, samples)
    }

    fn build(
        width: u32,
        height: u32,
        depth: u32,
        rank: u8,
        channels: u8,
        data_type: DataType,
        samples: Vec<f32>,
    ) -> MedflowResult<Self> {
        if width == 0 || height == 0 || depth == 0 {
            return Err(MedflowError::dimension_mismatch(format!(
                "image extent must be non-zero, got {width}x{height}x{depth}"
            )));
        }
        if channels == 0 {
            return Err(MedflowError::dimension_mismatch(
                "image must have at least one channel",
            ));
        }
        let expected = (width as usize)
            .checked_mul(height as usize)
            .and_then(|v| v.checked_mul(depth as usize))
            .and_then(|v| v.checked_mul(channels as usize))
            .ok_or_else(|| MedflowError::dimension_mismatch("image size overflow"))?;
        if samples.len() != expected {
            return Err(MedflowError::dimension_mismatch(format!(
                "expected {expected} samples for {width}x{height}x{depth}x{channels}, got {}",
                samples.len()
            )));
        }
        Ok(Self {
            width,
            height,
            depth,
            rank,
            channels,
            data_type,
            spacing: Vec3::ONE,
            transform: Affine3A::IDENTITY,
            samples: Arc::new(samples),
            location: None,
        })
    }

    /// New image with the same geometry, metadata and location but different samples.
    pub fn with_samples(&self, samples: Vec<f32>) -> MedflowResult<Self> {
        let mut out = Self::build(
            self.width,
            self.height,
            self.depth,
            self.rank,
            self.channels,
            self.data_type,
            samples,
        )?;
        out.spacing = self.spacing;
        out.transform = self.transform;
        out.location = self.location;
        Ok(out)
    }

    pub fn with_spacing(mut self, spacing: Vec3) -> Self {
        self.spacing = spacing;
        self
    }

    pub fn with_transform(mut self, transform: Affine3A) -> Self {
        self.transform = transform;
        self
    }

    pub fn with_data_type(mut self, data_type: DataType) -> Self {
        self.data_type = data_type;
        self
    }

    pub(crate) fn located_on(mut self, device: DeviceId) -> Self {
        self.location = Some(device);
        self
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn depth(&self) -> u32 {
        self.depth
    }

    /// 2 or 3.
    pub fn rank(&self) -> u8 {
        self.rank
    }

    pub fn channels(&self) -> u8 {
        self.channels
    }

    pub fn data_type(&self) -> DataType {
        self.data_type
    }

    /// Physical size of one voxel.
    pub fn spacing(&self) -> Vec3 {
        self.spacing
    }

    /// Image-to-world transform read from file headers (identity otherwise).
    pub fn transform(&self) -> Affine3A {
        self.transform
    }

    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    /// Device the samples currently live on; `None` until a node publishes the image.
    pub fn location(&self) -> Option<DeviceId> {
        self.location
    }

    /// Extent along axis 0 (x), 1 (y) or 2 (z).
    pub fn extent(&self, axis: usize) -> u32 {
        match axis {
            0 => self.width,
            1 => self.height,
            _ => self.depth,
        }
    }

    pub fn voxel_count(&self) -> usize {
        self.width as usize * self.height as usize * self.depth as usize
    }

    /// Sample at `(x, y, z, c)`; no bounds clamping.
    pub fn sample(&self, x: u32, y: u32, z: u32, c: u8) -> f32 {
        let idx = ((z as usize * self.height as usize + y as usize) * self.width as usize
            + x as usize)
            * self.channels as usize
            + c as usize;
        self.samples[idx]
    }

    /// Bounding box in image-header world space: extent times spacing, mapped by `transform`.
    pub fn bounding_box(&self) -> BoundingBox {
        let size = Vec3::new(
            self.width as f32 * self.spacing.x,
            self.height as f32 * self.spacing.y,
            if self.rank == 3 {
                self.depth as f32 * self.spacing.z
            } else {
                0.0
            },
        );
        BoundingBox::new(Vec3::ZERO, size).transformed(&self.transform)
    }

    /// Fail with [`MedflowError::DimensionMismatch`] unless the image has `rank`.
    pub fn require_rank(&self, rank: u8, who: &str) -> MedflowResult<()> {
        if self.rank != rank {
            return Err(MedflowError::dimension_mismatch(format!(
                "{who} requires a {rank}D image, got {}D",
                self.rank
            )));
        }
        Ok(())
    }
}

/// RGBA8 pixels produced by a renderer, with their placement in the image plane.
#[derive(Clone, Debug, PartialEq)]
pub struct Texture {
    pub width: u32,
    pub height: u32,
    /// Straight-alpha RGBA8, row-major.
    pub rgba8: Vec<u8>,
    /// Quad covered by the texture, in physical units of the source image plane.
    pub quad: Rect,
    /// Plane and effective slice index when produced by a slice renderer.
    pub slice: Option<SliceInfo>,
}

/// Which slice a texture shows.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SliceInfo {
    pub plane: crate::kernels::slice::SlicePlane,
    /// Index actually rendered, after clamping.
    pub index: u32,
}

#[cfg(test)]
#[path = "../../tests/unit/data/image.rs"]
mod tests;
