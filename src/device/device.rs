use std::borrow::Cow;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use crate::foundation::core::DeviceId;
use crate::foundation::error::{MedflowError, MedflowResult};

/// Broad class of a compute device.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeviceKind {
    Cpu,
    Gpu,
}

/// What a device can do beyond plain command submission.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub struct DeviceCapabilities {
    /// Can run built-in host kernels (natively or through host staging).
    pub host_kernels: bool,
    /// Can share its context with a display surface.
    pub display_interop: bool,
}

/// Language of a program's source payload.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum ProgramBody {
    /// Built-in kernel implemented in Rust; the id selects it.
    Host,
    /// WGSL text compiled by GPU backends.
    Wgsl(Cow<'static, str>),
}

/// Identity plus payload of a kernel program. Treated as opaque by the core.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ProgramSource {
    pub id: Cow<'static, str>,
    pub body: ProgramBody,
}

impl ProgramSource {
    pub const fn host(id: &'static str) -> Self {
        Self {
            id: Cow::Borrowed(id),
            body: ProgramBody::Host,
        }
    }

    pub fn wgsl(id: impl Into<Cow<'static, str>>, text: impl Into<Cow<'static, str>>) -> Self {
        Self {
            id: id.into(),
            body: ProgramBody::Wgsl(text.into()),
        }
    }
}

/// Index of a compiled program within one device's cache.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ProgramId(pub(crate) u32);

/// Backend-specific compiled program handle.
#[derive(Debug)]
pub enum CompiledProgram {
    Host,
    #[cfg(feature = "gpu")]
    Wgsl(wgpu::ShaderModule),
}

/// A program compiled for one device and one set of build options.
#[derive(Debug)]
pub struct Program {
    pub id: ProgramId,
    pub source_id: String,
    pub build_options: String,
    pub compiled: CompiledProgram,
}

/// Borrowed backend context handed to queued work.
#[derive(Clone, Copy, Debug)]
pub enum DeviceContext<'a> {
    Host,
    #[cfg(feature = "gpu")]
    Wgpu {
        device: &'a wgpu::Device,
        queue: &'a wgpu::Queue,
    },
    #[doc(hidden)]
    _Lifetime(std::marker::PhantomData<&'a ()>),
}

/// Implemented per compute backend. Asynchronous submission and waiting stay behind this trait.
pub trait DeviceBackend: Send + Sync + std::fmt::Debug {
    /// Compile `source` with `build_options`.
    fn compile(&self, source: &ProgramSource, build_options: &str)
    -> MedflowResult<CompiledProgram>;

    /// Block until all submitted work has completed.
    fn finish(&self) -> MedflowResult<()>;

    fn context(&self) -> DeviceContext<'_>;
}

/// Serialized command-submission channel of one device.
///
/// Work runs in submission order, one item at a time; `submit` returns only after the backend
/// reports completion.
#[derive(Debug)]
pub struct CommandQueue {
    backend: Arc<dyn DeviceBackend>,
    submitted: Mutex<u64>,
}

impl CommandQueue {
    /// Run `work` on the queue and wait for the device to finish it.
    pub fn submit<R>(
        &self,
        label: &str,
        work: impl FnOnce(DeviceContext<'_>) -> MedflowResult<R>,
    ) -> MedflowResult<R> {
        let mut submitted = self
            .submitted
            .lock()
            .map_err(|_| anyhow::anyhow!("command queue lock poisoned"))?;
        let out = work(self.backend.context())?;
        self.backend.finish()?;
        *submitted += 1;
        tracing::trace!(label, submitted = *submitted, "queue work finished");
        Ok(out)
    }

    /// Number of completed submissions.
    pub fn submitted(&self) -> u64 {
        self.submitted.lock().map(|n| *n).unwrap_or(0)
    }
}

#[derive(Debug, Default)]
struct ProgramCache {
    ids_by_key: HashMap<(String, String), ProgramId>,
    programs: Vec<Arc<Program>>,
}

/// An addressable compute backend with a serialized queue and a program cache.
///
/// The id is assigned by the [`DeviceRegistry`](crate::device::registry::DeviceRegistry) that
/// enumerates the device; it is `DeviceId(0)` until then.
#[derive(Debug)]
pub struct Device {
    id: DeviceId,
    kind: DeviceKind,
    name: String,
    capabilities: DeviceCapabilities,
    backend: Arc<dyn DeviceBackend>,
    queue: CommandQueue,
    programs: Mutex<ProgramCache>,
}

impl Device {
    pub fn new(
        kind: DeviceKind,
        name: impl Into<String>,
        capabilities: DeviceCapabilities,
        backend: Arc<dyn DeviceBackend>,
    ) -> Self {
        Self {
            id: DeviceId(0),
            kind,
            name: name.into(),
            capabilities,
            queue: CommandQueue {
                backend: Arc::clone(&backend),
                submitted: Mutex::new(0),
            },
            backend,
            programs: Mutex::new(ProgramCache::default()),
        }
    }

    /// The host CPU device backed by [`HostBackend`](crate::device::host::HostBackend).
    pub fn host(name: impl Into<String>) -> Self {
        Self::new(
            DeviceKind::Cpu,
            name,
            DeviceCapabilities {
                host_kernels: true,
                display_interop: true,
            },
            Arc::new(crate::device::host::HostBackend),
        )
    }

    pub(crate) fn with_id(mut self, id: DeviceId) -> Self {
        self.id = id;
        self
    }

    pub fn id(&self) -> DeviceId {
        self.id
    }

    pub fn kind(&self) -> DeviceKind {
        self.kind
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn capabilities(&self) -> DeviceCapabilities {
        self.capabilities
    }

    pub fn context(&self) -> DeviceContext<'_> {
        self.backend.context()
    }

    pub fn command_queue(&self) -> &CommandQueue {
        &self.queue
    }

    /// Compile `source` unless this `(source id, build options)` pair is already cached.
    pub fn create_program_from_source(
        &self,
        source: &ProgramSource,
        build_options: &str,
    ) -> MedflowResult<ProgramId> {
        let mut cache = self
            .programs
            .lock()
            .map_err(|_| anyhow::anyhow!("program cache lock poisoned"))?;
        let key = (source.id.to_string(), build_options.to_string());
        if let Some(&id) = cache.ids_by_key.get(&key) {
            return Ok(id);
        }

        if matches!(source.body, ProgramBody::Host) && !self.capabilities.host_kernels {
            return Err(MedflowError::unsupported(format!(
                "device '{}' cannot run host kernel '{}'",
                self.name, source.id
            )));
        }

        let compiled = self.backend.compile(source, build_options)?;
        let id = ProgramId(
            cache
                .programs
                .len()
                .try_into()
                .map_err(|_| MedflowError::config("program id overflow"))?,
        );
        tracing::debug!(
            device = %self.name,
            source = %source.id,
            build_options,
            "compiled program"
        );
        cache.programs.push(Arc::new(Program {
            id,
            source_id: key.0.clone(),
            build_options: key.1.clone(),
            compiled,
        }));
        cache.ids_by_key.insert(key, id);
        Ok(id)
    }

    pub fn get_program(&self, id: ProgramId) -> MedflowResult<Arc<Program>> {
        let cache = self
            .programs
            .lock()
            .map_err(|_| anyhow::anyhow!("program cache lock poisoned"))?;
        cache
            .programs
            .get(id.0 as usize)
            .cloned()
            .ok_or_else(|| MedflowError::invalid_input(format!("unknown program {:?}", id)))
    }

    /// Compile-or-fetch in one call.
    pub fn program(
        &self,
        source: &ProgramSource,
        build_options: &str,
    ) -> MedflowResult<Arc<Program>> {
        let id = self.create_program_from_source(source, build_options)?;
        self.get_program(id)
    }

    pub fn program_count(&self) -> usize {
        self.programs.lock().map(|c| c.programs.len()).unwrap_or(0)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/device/device.rs"]
mod tests;
