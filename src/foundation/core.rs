pub use glam::{Affine3A, Mat3, Vec3};
pub use kurbo::Rect;

/// Stable arena index of a process node. Never reused within a pipeline.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
pub struct NodeId(pub(crate) u32);

impl NodeId {
    /// Raw arena index.
    pub fn index(self) -> u32 {
        self.0
    }
}

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "node#{}", self.0)
    }
}

/// Stable arena index of a data object. Never reused within a pipeline.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
pub struct DataId(pub(crate) u32);

impl DataId {
    /// Raw arena index.
    pub fn index(self) -> u32 {
        self.0
    }
}

impl std::fmt::Display for DataId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "data#{}", self.0)
    }
}

/// Process-unique device identifier.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
pub struct DeviceId(pub(crate) u32);

impl DeviceId {
    /// Raw identifier.
    pub fn as_u32(self) -> u32 {
        self.0
    }
}

/// Modification timestamp of a data object.
///
/// `Version(0)` means "never produced". Each publish advances by exactly one.
#[derive(
    Clone,
    Copy,
    Debug,
    Default,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    serde::Serialize,
    serde::Deserialize,
)]
pub struct Version(pub u64);

impl Version {
    /// The version of an object nothing has been published to.
    pub const INITIAL: Version = Version(0);

    /// The next version.
    pub fn next(self) -> Self {
        Self(self.0.saturating_add(1))
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/core.rs"]
mod tests;
