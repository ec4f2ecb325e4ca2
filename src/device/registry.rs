use std::sync::{Arc, Mutex, OnceLock, RwLock};

use crate::device::device::{Device, DeviceKind, ProgramId, ProgramSource};
use crate::foundation::core::DeviceId;
use crate::foundation::error::{MedflowError, MedflowResult};

type Discovery = Box<dyn FnOnce() -> Vec<Device> + Send>;

/// Explicit, shareable registry of compute devices.
///
/// Devices are discovered once, on first access, and numbered in discovery order. The default device and each device's program
/// cache are guarded so reads are serialized against mutation when shared across threads.
pub struct DeviceRegistry {
    discovery: Mutex<Option<Discovery>>,
    devices: OnceLock<Vec<Arc<Device>>>,
    default: RwLock<Option<Arc<Device>>>,
}

impl std::fmt::Debug for DeviceRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeviceRegistry")
            .field("devices", &self.devices.get())
            .finish_non_exhaustive()
    }
}

impl Default for DeviceRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl DeviceRegistry {
    /// Registry using built-in discovery: the host CPU, plus a wgpu adapter with `gpu`.
    pub fn new() -> Self {
        Self::with_discovery(discover_builtin)
    }

    /// Registry whose devices come from `discover`, run on first access.
    pub fn with_discovery(discover: impl FnOnce() -> Vec<Device> + Send + 'static) -> Self {
        Self {
            discovery: Mutex::new(Some(Box::new(discover))),
            devices: OnceLock::new(),
            default: RwLock::new(None),
        }
    }

    /// Registry over a fixed device list.
    pub fn from_devices(devices: Vec<Device>) -> Self {
        Self::with_discovery(move || devices)
    }

    /// All devices. Discovery runs on the first call only.
    pub fn enumerate_devices(&self) -> &[Arc<Device>] {
        self.devices.get_or_init(|| {
            let discover = self.discovery.lock().ok().and_then(|mut d| d.take());
            let found: Vec<Arc<Device>> = discover
                .map(|f| {
                    f().into_iter()
                        .zip(0u32..)
                        .map(|(d, i)| Arc::new(d.with_id(DeviceId(i))))
                        .collect()
                })
                .unwrap_or_default();
            if found.is_empty() {
                tracing::warn!("device discovery found no compute devices");
            }
            for d in &found {
                tracing::debug!(name = d.name(), kind = ?d.kind(), "registered device");
            }
            found
        })
    }

    pub fn device(&self, id: DeviceId) -> Option<Arc<Device>> {
        self.enumerate_devices()
            .iter()
            .find(|d| d.id() == id)
            .cloned()
    }

    /// First GPU when `prefer_gpu` and one exists, else the first CPU, else any device.
    pub fn get_one_gpu_device(&self, prefer_gpu: bool) -> MedflowResult<Arc<Device>> {
        let devices = self.enumerate_devices();
        let first_of = |kind: DeviceKind| devices.iter().find(|d| d.kind() == kind).cloned();
        let picked = if prefer_gpu {
            first_of(DeviceKind::Gpu).or_else(|| first_of(DeviceKind::Cpu))
        } else {
            first_of(DeviceKind::Cpu)
        };
        picked
            .or_else(|| devices.first().cloned())
            .ok_or_else(|| MedflowError::no_device("no compute devices were discovered"))
    }

    /// Used by nodes constructed without an explicit device.
    pub fn set_default_device(&self, device: Arc<Device>) {
        tracing::debug!(name = device.name(), "default device set");
        match self.default.write() {
            Ok(mut d) => *d = Some(device),
            Err(poisoned) => *poisoned.into_inner() = Some(device),
        }
    }

    /// The explicit default, or `get_one_gpu_device(false)` when none was set.
    pub fn default_device(&self) -> MedflowResult<Arc<Device>> {
        let current = match self.default.read() {
            Ok(d) => d.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        };
        match current {
            Some(d) => Ok(d),
            None => self.get_one_gpu_device(false),
        }
    }

    /// A device able to share its context with a display surface, GPUs first.
    pub fn default_visualization_device(&self) -> MedflowResult<Arc<Device>> {
        let devices = self.enumerate_devices();
        if devices.is_empty() {
            return Err(MedflowError::no_device("no compute devices were discovered"));
        }
        let interop = |kind: DeviceKind| {
            devices
                .iter()
                .find(|d| d.kind() == kind && d.capabilities().display_interop)
                .cloned()
        };
        interop(DeviceKind::Gpu)
            .or_else(|| interop(DeviceKind::Cpu))
            .ok_or_else(|| {
                MedflowError::unsupported("no device supports display interop for visualization")
            })
    }

    /// Compile `source` for `device` unless the `(source, options)` pair is cached there.
    pub fn create_program_from_source(
        &self,
        device: &Device,
        source: &ProgramSource,
        build_options: &str,
    ) -> MedflowResult<ProgramId> {
        device.create_program_from_source(source, build_options)
    }
}

fn discover_builtin() -> Vec<Device> {
    #[allow(unused_mut)]
    let mut out = vec![Device::host("host-cpu")];
    #[cfg(feature = "gpu")]
    if let Some(gpu) = crate::device::gpu::discover() {
        out.push(gpu);
    }
    out
}

#[cfg(test)]
#[path = "../../tests/unit/device/registry.rs"]
mod tests;
