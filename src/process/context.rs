use std::sync::Arc;

use crate::data::image::Image;
use crate::data::object::{Data, DataContent};
use crate::device::device::{Device, DeviceContext, Program, ProgramSource};
use crate::device::registry::DeviceRegistry;
use crate::foundation::core::{DataId, NodeId};
use crate::foundation::error::{MedflowError, MedflowResult};
use crate::process::pipeline::Pipeline;

/// What a node sees while it executes: its inputs, its device and the registry.
pub struct ExecContext<'p> {
    pipeline: &'p mut Pipeline,
    node: NodeId,
    device: Arc<Device>,
}

impl<'p> ExecContext<'p> {
    pub(crate) fn new(pipeline: &'p mut Pipeline, node: NodeId, device: Arc<Device>) -> Self {
        Self {
            pipeline,
            node,
            device,
        }
    }

    pub fn node(&self) -> NodeId {
        self.node
    }

    /// Device the node is bound to.
    pub fn device(&self) -> &Arc<Device> {
        &self.device
    }

    pub fn devices(&self) -> &Arc<DeviceRegistry> {
        self.pipeline.devices()
    }

    pub fn is_connected(&self, slot: &str) -> bool {
        self.source(slot).ok().flatten().is_some()
    }

    fn source(&self, slot: &str) -> MedflowResult<Option<DataId>> {
        self.pipeline.node_input(self.node, slot)
    }

    /// Read an input. Static inputs return the cached value; dynamic inputs deliver their next
    /// frame.
    pub fn input(&mut self, slot: &str) -> MedflowResult<Data> {
        let data = self.source(slot)?.ok_or_else(|| {
            MedflowError::invalid_input(format!("{}: input '{slot}' is not connected", self.node))
        })?;
        let cached = match self.pipeline.data_object(data)?.content() {
            DataContent::Static(value) => Some(value.clone()),
            DataContent::Dynamic(_) => None,
            DataContent::Empty => {
                return Err(MedflowError::invalid_input(format!(
                    "{}: input '{slot}' ({data}) has not been produced",
                    self.node
                )));
            }
        };
        match cached {
            Some(value) => Ok(value),
            None => Ok(Data::Image(self.pipeline.read_frame(data)?)),
        }
    }

    /// Read an image input, transferring it to this node's device when it lives elsewhere.
    pub fn input_image(&mut self, slot: &str) -> MedflowResult<Arc<Image>> {
        let image = match self.input(slot)? {
            Data::Image(img) => img,
            other => {
                return Err(MedflowError::invalid_input(format!(
                    "{}: input '{slot}' holds a {}, expected an image",
                    self.node,
                    other.kind_name()
                )));
            }
        };
        let target = self.device.id();
        match image.location() {
            Some(from) if from != target => {
                let moved = self
                    .device
                    .command_queue()
                    .submit("transfer", |_ctx| Ok((*image).clone().located_on(target)))?;
                self.pipeline.note_transfer(self.node);
                tracing::debug!(node = %self.node, ?from, to = ?target, "transferred input image");
                Ok(Arc::new(moved))
            }
            _ => Ok(image),
        }
    }

    /// Compile-or-fetch a program on this node's device.
    pub fn program(
        &self,
        source: &ProgramSource,
        build_options: &str,
    ) -> MedflowResult<Arc<Program>> {
        let id = self
            .pipeline
            .devices()
            .create_program_from_source(&self.device, source, build_options)?;
        self.device.get_program(id)
    }

    /// Run `work` on this node's command queue and wait for it.
    pub fn submit<R>(
        &self,
        label: &str,
        work: impl FnOnce(DeviceContext<'_>) -> MedflowResult<R>,
    ) -> MedflowResult<R> {
        self.device.command_queue().submit(label, work)
    }
}
