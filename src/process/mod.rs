pub mod context;
pub mod node;
pub mod pipeline;
