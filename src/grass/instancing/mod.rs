//! Per-tile instance data: flat SoA buffers in the renderer's layout, and the
//! CPU merge that turns a buffer plus a blade mesh into one drawable mesh.

pub mod buffer;
pub mod merge;

pub use buffer::{InstanceBuffer, InstanceBufferBuilder};
pub use merge::merge_blade_instances;
