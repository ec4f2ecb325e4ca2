use std::sync::Arc;

use crate::data::image::{Image, Texture};
use crate::data::object::Data;
use crate::foundation::error::{MedflowError, MedflowResult};
use crate::process::context::ExecContext;

/// How a node kind publishes its output.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OutputMode {
    /// One cached value, replaced on every execution.
    Static,
    /// A source of frames; executes on every update until it reports end of stream.
    Stream,
    /// Dynamic whenever a connected input is dynamic, static otherwise.
    FollowInputs,
}

impl OutputMode {
    pub fn is_dynamic(self) -> bool {
        !matches!(self, OutputMode::Static)
    }
}

/// Which registry device a node binds to when none is given explicitly.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum DeviceRole {
    #[default]
    Compute,
    /// Needs display interop; renderers use this.
    Visualization,
}

/// Result of one successful execution.
#[derive(Clone, Debug)]
pub enum Produced {
    Data(Data),
    /// A stream source has no further frames.
    EndOfStream,
}

impl From<Data> for Produced {
    fn from(value: Data) -> Self {
        Produced::Data(value)
    }
}

impl From<Image> for Produced {
    fn from(value: Image) -> Self {
        Produced::Data(value.into())
    }
}

impl From<Arc<Image>> for Produced {
    fn from(value: Arc<Image>) -> Self {
        Produced::Data(Data::Image(value))
    }
}

impl From<Texture> for Produced {
    fn from(value: Texture) -> Self {
        Produced::Data(value.into())
    }
}

/// Loosely typed parameter value, set by name on a node.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(untagged)]
pub enum ParamValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

impl ParamValue {
    pub fn as_f64(&self) -> Option<f64> {
        match *self {
            ParamValue::Int(v) => Some(v as f64),
            ParamValue::Float(v) => Some(v),
            _ => None,
        }
    }

    /// Integers, and floats with no fractional part.
    pub fn as_i64(&self) -> Option<i64> {
        match *self {
            ParamValue::Int(v) => Some(v),
            ParamValue::Float(v) if v.fract() == 0.0 && v.is_finite() => Some(v as i64),
            _ => None,
        }
    }

    pub fn as_u32(&self) -> Option<u32> {
        self.as_i64().and_then(|v| u32::try_from(v).ok())
    }

    pub fn as_bool(&self) -> Option<bool> {
        match *self {
            ParamValue::Bool(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            ParamValue::Text(v) => Some(v),
            _ => None,
        }
    }
}

impl From<bool> for ParamValue {
    fn from(v: bool) -> Self {
        ParamValue::Bool(v)
    }
}

impl From<i64> for ParamValue {
    fn from(v: i64) -> Self {
        ParamValue::Int(v)
    }
}

impl From<i32> for ParamValue {
    fn from(v: i32) -> Self {
        ParamValue::Int(v.into())
    }
}

impl From<u32> for ParamValue {
    fn from(v: u32) -> Self {
        ParamValue::Int(v.into())
    }
}

impl From<f64> for ParamValue {
    fn from(v: f64) -> Self {
        ParamValue::Float(v)
    }
}

impl From<&str> for ParamValue {
    fn from(v: &str) -> Self {
        ParamValue::Text(v.to_string())
    }
}

impl From<String> for ParamValue {
    fn from(v: String) -> Self {
        ParamValue::Text(v)
    }
}

/// Error for a parameter a node kind does not know.
pub fn unknown_parameter(kind: &str, name: &str) -> MedflowError {
    MedflowError::config(format!("{kind} has no parameter '{name}'"))
}

/// Error for a parameter value of the wrong type or range.
pub fn bad_parameter(kind: &str, name: &str, expected: &str, got: &ParamValue) -> MedflowError {
    MedflowError::config(format!("{kind}.{name} expects {expected}, got {got:?}"))
}

/// A processing step in a [`Pipeline`](crate::process::pipeline::Pipeline).
///
/// The pipeline owns wiring, caching and versioning; implementors only declare their input
/// slots and compute an output from the inputs they read through [`ExecContext`].
pub trait ProcessObject: Send {
    /// Stable kind name, also used by pipeline descriptions.
    fn kind(&self) -> &'static str;

    /// Input slot names, in declaration order.
    fn input_slots(&self) -> &'static [&'static str] {
        &[]
    }

    fn output_mode(&self) -> OutputMode {
        OutputMode::Static
    }

    fn device_role(&self) -> DeviceRole {
        DeviceRole::Compute
    }

    /// Validate and store a parameter. Never executes.
    fn set_parameter(&mut self, name: &str, value: &ParamValue) -> MedflowResult<()> {
        let _ = value;
        Err(unknown_parameter(self.kind(), name))
    }

    fn parameter(&self, name: &str) -> Option<ParamValue> {
        let _ = name;
        None
    }

    /// Compute the output from the current inputs and parameters.
    fn execute(&mut self, ctx: &mut ExecContext<'_>) -> MedflowResult<Produced>;
}

#[cfg(test)]
#[path = "../../tests/unit/process/node.rs"]
mod tests;
