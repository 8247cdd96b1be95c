//! Small wgpu helpers shared by the GPU backend.

pub mod binding_types;
pub mod uniform_buffer;

pub use uniform_buffer::UniformBuffer;
