//! Built-in host kernels. Nodes run them through their device's command queue.

pub mod gaussian;
pub mod slice;
