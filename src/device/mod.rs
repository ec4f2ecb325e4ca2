#[allow(clippy::module_inception)]
pub mod device;
#[cfg(feature = "gpu")]
pub mod gpu;
pub mod host;
pub mod registry;
