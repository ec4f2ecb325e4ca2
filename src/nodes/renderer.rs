use std::sync::Arc;

use crate::data::image::{Image, SliceInfo, Texture};
use crate::device::device::{CompiledProgram, ProgramSource};
use crate::foundation::core::Rect;
use crate::foundation::error::{MedflowError, MedflowResult};
use crate::kernels::slice::{self, SlicePlane};
use crate::nodes::{float_param, int_param, text_param};
use crate::process::context::ExecContext;
use crate::process::node::{DeviceRole, ParamValue, ProcessObject, Produced, unknown_parameter};

pub const RENDER_PROGRAM: ProgramSource = ProgramSource::host("slice_renderer");

/// Intensity window shared by both renderers. Negative values fall back to the data type.
#[derive(Clone, Copy, Debug, PartialEq)]
struct WindowLevel {
    window: f32,
    level: f32,
}

impl Default for WindowLevel {
    fn default() -> Self {
        Self {
            window: -1.0,
            level: -1.0,
        }
    }
}

impl WindowLevel {
    fn resolve(self, image: &Image) -> (f32, f32) {
        let ty = image.data_type();
        let window = if self.window < 0.0 {
            ty.default_window()
        } else {
            self.window
        };
        let level = if self.level < 0.0 {
            ty.default_level()
        } else {
            self.level
        };
        (window, level)
    }

    /// Handles `window`/`level`; `Ok(false)` when `name` is neither.
    fn set(&mut self, kind: &str, name: &str, value: &ParamValue) -> MedflowResult<bool> {
        match name {
            "window" => self.window = float_param(kind, name, value)?,
            "level" => self.level = float_param(kind, name, value)?,
            _ => return Ok(false),
        }
        Ok(true)
    }

    fn get(&self, name: &str) -> Option<ParamValue> {
        match name {
            "window" => Some(ParamValue::Float(self.window.into())),
            "level" => Some(ParamValue::Float(self.level.into())),
            _ => None,
        }
    }
}

/// Renders one axis-aligned slice of a 3D image to an RGBA8 texture.
#[derive(Clone, Debug)]
pub struct SliceRenderer {
    plane: SlicePlane,
    slice_index: i64,
    window_level: WindowLevel,
}

impl Default for SliceRenderer {
    fn default() -> Self {
        Self {
            plane: SlicePlane::Z,
            slice_index: -1,
            window_level: WindowLevel::default(),
        }
    }
}

impl SliceRenderer {
    /// Centre slice in the Z plane.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_plane(mut self, plane: SlicePlane) -> Self {
        self.plane = plane;
        self
    }

    /// `-1` selects the centre slice. Indices past the end render the last slice.
    pub fn with_slice_index(mut self, index: i64) -> Self {
        self.slice_index = index;
        self
    }

    pub fn with_window_level(mut self, window: f32, level: f32) -> Self {
        self.window_level = WindowLevel { window, level };
        self
    }

    pub fn plane(&self) -> SlicePlane {
        self.plane
    }

    pub fn slice_index(&self) -> i64 {
        self.slice_index
    }
}

impl ProcessObject for SliceRenderer {
    fn kind(&self) -> &'static str {
        "slice_renderer"
    }

    fn input_slots(&self) -> &'static [&'static str] {
        &["input"]
    }

    fn device_role(&self) -> DeviceRole {
        DeviceRole::Visualization
    }

    fn set_parameter(&mut self, name: &str, value: &ParamValue) -> MedflowResult<()> {
        let kind = self.kind();
        match name {
            "slice_plane" => self.plane = text_param(kind, name, value)?.parse()?,
            "slice_index" => self.slice_index = int_param(kind, name, value)?,
            _ => {
                if !self.window_level.set(kind, name, value)? {
                    return Err(unknown_parameter(kind, name));
                }
            }
        }
        Ok(())
    }

    fn parameter(&self, name: &str) -> Option<ParamValue> {
        match name {
            "slice_plane" => Some(ParamValue::Text(self.plane.as_str().to_string())),
            "slice_index" => Some(ParamValue::Int(self.slice_index)),
            _ => self.window_level.get(name),
        }
    }

    #[tracing::instrument(skip(self, ctx), fields(node = %ctx.node(), plane = self.plane.as_str()))]
    fn execute(&mut self, ctx: &mut ExecContext<'_>) -> MedflowResult<Produced> {
        let image = ctx.input_image("input")?;
        image.require_rank(3, self.kind())?;

        let plane = self.plane;
        let index = slice::resolve_slice_index(self.slice_index, image.extent(plane.axis()))?;
        if i64::from(index) != self.slice_index && self.slice_index >= 0 {
            tracing::debug!(requested = self.slice_index, index, "slice index clamped");
        }
        let (width, height) = plane.texture_extent(&image);
        let spacing = image.spacing();
        let (sw, sh) = match plane {
            SlicePlane::X => (spacing.y, spacing.z),
            SlicePlane::Y => (spacing.x, spacing.z),
            SlicePlane::Z => (spacing.x, spacing.y),
        };

        let rgba8 = render(ctx, &image, self.window_level, |img| {
            slice::extract_slice(img, plane, index)
        })?;
        Ok(Texture {
            width,
            height,
            rgba8,
            quad: quad(width, height, sw, sh),
            slice: Some(SliceInfo { plane, index }),
        }
        .into())
    }
}

/// Renders a 2D image to an RGBA8 texture.
#[derive(Clone, Debug, Default)]
pub struct ImageRenderer {
    window_level: WindowLevel,
}

impl ImageRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_window_level(mut self, window: f32, level: f32) -> Self {
        self.window_level = WindowLevel { window, level };
        self
    }
}

impl ProcessObject for ImageRenderer {
    fn kind(&self) -> &'static str {
        "image_renderer"
    }

    fn input_slots(&self) -> &'static [&'static str] {
        &["input"]
    }

    fn device_role(&self) -> DeviceRole {
        DeviceRole::Visualization
    }

    fn set_parameter(&mut self, name: &str, value: &ParamValue) -> MedflowResult<()> {
        let kind = self.kind();
        if self.window_level.set(kind, name, value)? {
            return Ok(());
        }
        Err(unknown_parameter(kind, name))
    }

    fn parameter(&self, name: &str) -> Option<ParamValue> {
        self.window_level.get(name)
    }

    fn execute(&mut self, ctx: &mut ExecContext<'_>) -> MedflowResult<Produced> {
        let image = ctx.input_image("input")?;
        image.require_rank(2, self.kind())?;

        let (width, height) = (image.width(), image.height());
        let spacing = image.spacing();
        let rgba8 = render(ctx, &image, self.window_level, |img| Ok(img.samples().to_vec()))?;
        Ok(Texture {
            width,
            height,
            rgba8,
            quad: quad(width, height, spacing.x, spacing.y),
            slice: None,
        }
        .into())
    }
}

fn quad(width: u32, height: u32, sx: f32, sy: f32) -> Rect {
    Rect::new(
        0.0,
        0.0,
        f64::from(width) * f64::from(sx),
        f64::from(height) * f64::from(sy),
    )
}

fn render(
    ctx: &ExecContext<'_>,
    image: &Arc<Image>,
    window_level: WindowLevel,
    samples: impl FnOnce(&Image) -> MedflowResult<Vec<f32>>,
) -> MedflowResult<Vec<u8>> {
    let program = ctx.program(&RENDER_PROGRAM, image.data_type().build_option())?;
    let (window, level) = window_level.resolve(image);
    let channels = image.channels();
    ctx.submit("render", |_dev| match &program.compiled {
        CompiledProgram::Host => Ok(slice::window_level_rgba8(
            &samples(image)?,
            channels,
            window,
            level,
        )),
        #[allow(unreachable_patterns)]
        _ => Err(MedflowError::unsupported(
            "renderers have no device kernel for this backend",
        )),
    })
}

#[cfg(test)]
#[path = "../../tests/unit/nodes/renderer.rs"]
mod tests;
