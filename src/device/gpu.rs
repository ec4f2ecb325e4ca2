use std::sync::Arc;

use crate::device::device::{
    CompiledProgram, Device, DeviceBackend, DeviceCapabilities, DeviceContext, DeviceKind,
    ProgramBody, ProgramSource,
};
use crate::foundation::error::{MedflowError, MedflowResult};

/// wgpu-backed GPU device.
///
/// WGSL programs compile to shader modules. Built-in host kernels run through host staging on
/// this device's queue, which then waits for the GPU queue to drain.
#[derive(Debug)]
pub struct WgpuBackend {
    device: wgpu::Device,
    queue: wgpu::Queue,
}

/// Request one high-performance adapter. `None` when no GPU is usable.
pub(crate) fn discover() -> Option<Device> {
    match request() {
        Ok(dev) => Some(dev),
        Err(err) => {
            tracing::info!(%err, "no gpu device");
            None
        }
    }
}

fn request() -> MedflowResult<Device> {
    let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor::default());
    let adapter = pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
        power_preference: wgpu::PowerPreference::HighPerformance,
        compatible_surface: None,
        force_fallback_adapter: false,
    }))
    .map_err(|e| match e {
        wgpu::RequestAdapterError::NotFound { .. } => {
            MedflowError::no_device("no gpu adapter available")
        }
        other => MedflowError::no_device(format!("wgpu request_adapter failed: {other:?}")),
    })?;

    let info = adapter.get_info();
    if info.device_type == wgpu::DeviceType::Cpu {
        return Err(MedflowError::no_device(format!(
            "adapter '{}' is a software rasterizer",
            info.name
        )));
    }

    let (device, queue) = pollster::block_on(adapter.request_device(&wgpu::DeviceDescriptor {
        label: Some("medflow"),
        required_features: wgpu::Features::empty(),
        required_limits: wgpu::Limits::default(),
        experimental_features: wgpu::ExperimentalFeatures::default(),
        memory_hints: wgpu::MemoryHints::Performance,
        trace: wgpu::Trace::Off,
    }))
    .map_err(|e| MedflowError::no_device(format!("wgpu request_device failed: {e:?}")))?;

    Ok(Device::new(
        DeviceKind::Gpu,
        format!("{} ({:?})", info.name, info.backend),
        DeviceCapabilities {
            host_kernels: true,
            display_interop: true,
        },
        Arc::new(WgpuBackend { device, queue }),
    ))
}

impl DeviceBackend for WgpuBackend {
    fn compile(
        &self,
        source: &ProgramSource,
        build_options: &str,
    ) -> MedflowResult<CompiledProgram> {
        let text = match &source.body {
            ProgramBody::Host => return Ok(CompiledProgram::Host),
            ProgramBody::Wgsl(text) => text,
        };
        self.device.push_error_scope(wgpu::ErrorFilter::Validation);
        let module = self
            .device
            .create_shader_module(wgpu::ShaderModuleDescriptor {
                label: Some(source.id.as_ref()),
                source: wgpu::ShaderSource::Wgsl(text.clone()),
            });
        if let Some(err) = pollster::block_on(self.device.pop_error_scope()) {
            return Err(MedflowError::invalid_input(format!(
                "program '{}' ({build_options}) failed to compile: {err}",
                source.id
            )));
        }
        Ok(CompiledProgram::Wgsl(module))
    }

    fn finish(&self) -> MedflowResult<()> {
        self.device
            .poll(wgpu::PollType::wait_indefinitely())
            .map_err(|e| MedflowError::unsupported(format!("wgpu poll failed: {e:?}")))?;
        Ok(())
    }

    fn context(&self) -> DeviceContext<'_> {
        DeviceContext::Wgpu {
            device: &self.device,
            queue: &self.queue,
        }
    }
}
