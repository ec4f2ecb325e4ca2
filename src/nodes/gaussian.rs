use crate::device::device::{CompiledProgram, ProgramSource};
use crate::foundation::error::{MedflowError, MedflowResult};
use crate::kernels::gaussian;
use crate::nodes::{float_param, int_param};
use crate::process::context::ExecContext;
use crate::process::node::{OutputMode, ParamValue, ProcessObject, Produced, unknown_parameter};

/// Program compiled once per device, data type and mask size.
pub const GAUSSIAN_PROGRAM: ProgramSource = ProgramSource::host("gaussian_smoothing");

/// Separable Gaussian smoothing of 2D and 3D images, per channel.
///
/// Streams pass through frame by frame: the output is dynamic whenever the input is.
#[derive(Clone, Debug)]
pub struct GaussianSmoothingFilter {
    mask_size: u32,
    standard_deviation: f32,
}

impl Default for GaussianSmoothingFilter {
    fn default() -> Self {
        Self {
            mask_size: 3,
            standard_deviation: 0.5,
        }
    }
}

impl GaussianSmoothingFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_mask_size(mut self, mask_size: u32) -> MedflowResult<Self> {
        self.set_mask_size(mask_size)?;
        Ok(self)
    }

    pub fn with_standard_deviation(mut self, sigma: f32) -> MedflowResult<Self> {
        self.set_standard_deviation(sigma)?;
        Ok(self)
    }

    /// Odd and at least 1.
    pub fn set_mask_size(&mut self, mask_size: u32) -> MedflowResult<()> {
        if mask_size == 0 || mask_size % 2 == 0 {
            return Err(MedflowError::config(format!(
                "mask_size must be odd and >= 1, got {mask_size}"
            )));
        }
        self.mask_size = mask_size;
        Ok(())
    }

    pub fn set_standard_deviation(&mut self, sigma: f32) -> MedflowResult<()> {
        if !sigma.is_finite() || sigma <= 0.0 {
            return Err(MedflowError::config(format!(
                "standard_deviation must be > 0, got {sigma}"
            )));
        }
        self.standard_deviation = sigma;
        Ok(())
    }

    pub fn mask_size(&self) -> u32 {
        self.mask_size
    }

    pub fn standard_deviation(&self) -> f32 {
        self.standard_deviation
    }
}

impl ProcessObject for GaussianSmoothingFilter {
    fn kind(&self) -> &'static str {
        "gaussian_smoothing"
    }

    fn input_slots(&self) -> &'static [&'static str] {
        &["input"]
    }

    fn output_mode(&self) -> OutputMode {
        OutputMode::FollowInputs
    }

    fn set_parameter(&mut self, name: &str, value: &ParamValue) -> MedflowResult<()> {
        match name {
            "mask_size" => {
                let v = int_param(self.kind(), name, value)?;
                let v = u32::try_from(v)
                    .map_err(|_| MedflowError::config(format!("mask_size {v} is out of range")))?;
                self.set_mask_size(v)
            }
            "standard_deviation" => {
                self.set_standard_deviation(float_param(self.kind(), name, value)?)
            }
            _ => Err(unknown_parameter(self.kind(), name)),
        }
    }

    fn parameter(&self, name: &str) -> Option<ParamValue> {
        match name {
            "mask_size" => Some(ParamValue::Int(self.mask_size.into())),
            "standard_deviation" => Some(ParamValue::Float(self.standard_deviation.into())),
            _ => None,
        }
    }

    #[tracing::instrument(skip(self, ctx), fields(node = %ctx.node()))]
    fn execute(&mut self, ctx: &mut ExecContext<'_>) -> MedflowResult<Produced> {
        let input = ctx.input_image("input")?;
        let options = format!(
            "{} -DMASK_SIZE={}",
            input.data_type().build_option(),
            self.mask_size
        );
        let program = ctx.program(&GAUSSIAN_PROGRAM, &options)?;
        let (mask, sigma) = (self.mask_size, self.standard_deviation);

        let samples = ctx.submit("gaussian_smoothing", |_dev| match &program.compiled {
            CompiledProgram::Host => gaussian::smooth(&input, mask, sigma),
            #[allow(unreachable_patterns)]
            _ => Err(MedflowError::unsupported(
                "gaussian_smoothing has no device kernel for this backend",
            )),
        })?;
        Ok(input.with_samples(samples)?.into())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/nodes/gaussian.rs"]
mod tests;
