//! Medflow is a demand-driven data-flow engine for medical image processing.
//!
//! A [`Pipeline`] owns process nodes and the data objects they produce. Nothing runs until a
//! consumer asks for data:
//!
//! - Wire nodes with [`Pipeline::set_input`] and tune them with [`Pipeline::set_parameter`]
//! - Pull results with [`Pipeline::update`]; up-to-date nodes are cache hits
//! - Stream sources fill bounded buffers read one frame at a time with [`Pipeline::next_frame`]
//! - Renderers produce textures placed in world space by the pipeline's [`SceneGraph`]
//!
//! Nodes run on devices from a shared [`DeviceRegistry`] (the host CPU, plus wgpu adapters with
//! the `gpu` feature).
#![forbid(unsafe_code)]

pub mod config;
pub mod data;
pub mod device;
pub mod foundation;
pub mod io;
pub mod kernels;
pub mod nodes;
pub mod process;
pub mod scene;

pub use crate::config::{BuiltPipeline, PipelineConfig, RunReport};
pub use crate::data::image::{DataType, Image, SliceInfo, Texture};
pub use crate::data::object::{Data, DataContent, DataObject};
pub use crate::data::stream::StreamingBuffer;
pub use crate::device::device::{Device, DeviceKind, ProgramSource};
pub use crate::device::registry::DeviceRegistry;
pub use crate::foundation::core::{Affine3A, DataId, DeviceId, NodeId, Vec3, Version};
pub use crate::foundation::error::{MedflowError, MedflowResult};
pub use crate::foundation::math::BoundingBox;
pub use crate::kernels::slice::SlicePlane;
pub use crate::nodes::{View, ViewMode, create_node};
pub use crate::process::context::ExecContext;
pub use crate::process::node::{DeviceRole, OutputMode, ParamValue, ProcessObject, Produced};
pub use crate::process::pipeline::{DrawCommand, NodeStats, Pipeline};
pub use crate::scene::graph::{SceneGraph, SceneNode};
