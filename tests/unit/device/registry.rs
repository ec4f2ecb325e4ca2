use super::*;
use crate::device::device::{DeviceCapabilities, ProgramSource};
use crate::device::host::HostBackend;
use std::sync::atomic::{AtomicUsize, Ordering};

fn gpu(name: &str, display_interop: bool) -> Device {
    Device::new(
        DeviceKind::Gpu,
        name,
        DeviceCapabilities {
            host_kernels: true,
            display_interop,
        },
        Arc::new(HostBackend),
    )
}

fn headless_cpu(name: &str) -> Device {
    Device::new(
        DeviceKind::Cpu,
        name,
        DeviceCapabilities {
            host_kernels: true,
            display_interop: false,
        },
        Arc::new(HostBackend),
    )
}

#[test]
fn enumeration_runs_discovery_once() {
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = calls.clone();
    let reg = DeviceRegistry::with_discovery(move || {
        counter.fetch_add(1, Ordering::SeqCst);
        vec![Device::host("cpu")]
    });
    let first = reg.enumerate_devices().as_ptr();
    let second = reg.enumerate_devices().as_ptr();
    assert_eq!(first, second);
    assert_eq!(reg.enumerate_devices().len(), 1);
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[test]
fn builtin_discovery_always_has_a_host_cpu() {
    let reg = DeviceRegistry::new();
    assert!(
        reg.enumerate_devices()
            .iter()
            .any(|d| d.kind() == DeviceKind::Cpu)
    );
}

#[test]
fn gpu_preference_policy() {
    let reg = DeviceRegistry::from_devices(vec![
        Device::host("cpu0"),
        gpu("gpu0", true),
        gpu("gpu1", true),
    ]);
    assert_eq!(reg.get_one_gpu_device(true).unwrap().name(), "gpu0");
    assert_eq!(reg.get_one_gpu_device(false).unwrap().name(), "cpu0");

    let cpu_only = DeviceRegistry::from_devices(vec![Device::host("cpu0")]);
    assert_eq!(cpu_only.get_one_gpu_device(true).unwrap().name(), "cpu0");

    let gpu_only = DeviceRegistry::from_devices(vec![gpu("gpu0", true)]);
    assert_eq!(gpu_only.get_one_gpu_device(false).unwrap().name(), "gpu0");
}

#[test]
fn empty_registry_reports_no_device() {
    let reg = DeviceRegistry::from_devices(vec![]);
    assert!(reg.enumerate_devices().is_empty());
    assert!(matches!(
        reg.get_one_gpu_device(true),
        Err(MedflowError::NoDeviceAvailable(_))
    ));
    assert!(matches!(
        reg.default_device(),
        Err(MedflowError::NoDeviceAvailable(_))
    ));
    assert!(matches!(
        reg.default_visualization_device(),
        Err(MedflowError::NoDeviceAvailable(_))
    ));
}

#[test]
fn default_device_falls_back_then_follows_setter() {
    let reg = DeviceRegistry::from_devices(vec![Device::host("cpu0"), gpu("gpu0", true)]);
    assert_eq!(reg.default_device().unwrap().name(), "cpu0");
    let g = reg.get_one_gpu_device(true).unwrap();
    reg.set_default_device(g.clone());
    assert!(Arc::ptr_eq(&reg.default_device().unwrap(), &g));
}

#[test]
fn visualization_device_needs_interop() {
    let reg = DeviceRegistry::from_devices(vec![
        headless_cpu("cpu0"),
        gpu("gpu-headless", false),
        gpu("gpu-display", true),
    ]);
    assert_eq!(
        reg.default_visualization_device().unwrap().name(),
        "gpu-display"
    );

    let none = DeviceRegistry::from_devices(vec![headless_cpu("cpu0")]);
    assert!(matches!(
        none.default_visualization_device(),
        Err(MedflowError::UnsupportedOperation(_))
    ));
}

#[test]
fn registry_program_creation_delegates_to_device_cache() {
    let reg = DeviceRegistry::from_devices(vec![Device::host("cpu0")]);
    let dev = reg.default_device().unwrap();
    let src = ProgramSource::host("k");
    let a = reg.create_program_from_source(&dev, &src, "-DX").unwrap();
    let b = reg.create_program_from_source(&dev, &src, "-DX").unwrap();
    assert_eq!(a, b);
    assert_eq!(dev.program_count(), 1);
    assert!(reg.device(dev.id()).is_some());
}

#[test]
fn ids_follow_discovery_order_per_registry() {
    let first = DeviceRegistry::from_devices(vec![Device::host("cpu0"), gpu("gpu0", true)]);
    let second = DeviceRegistry::from_devices(vec![Device::host("cpu1")]);
    let ids: Vec<DeviceId> = first.enumerate_devices().iter().map(|d| d.id()).collect();
    assert_eq!(ids, vec![DeviceId(0), DeviceId(1)]);
    assert_eq!(second.enumerate_devices()[0].id(), DeviceId(0));
    assert_eq!(first.device(DeviceId(1)).unwrap().name(), "gpu0");
}

#[test]
fn without_a_cpu_selection_falls_back_to_any_device() {
    let gpu_only = DeviceRegistry::from_devices(vec![gpu("gpu0", false), gpu("gpu1", true)]);
    assert_eq!(gpu_only.get_one_gpu_device(false).unwrap().name(), "gpu0");
    assert_eq!(gpu_only.get_one_gpu_device(true).unwrap().name(), "gpu0");
    assert_eq!(gpu_only.default_device().unwrap().name(), "gpu0");
}
