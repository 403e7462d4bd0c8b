//! wgpu implementation of the compute backend, sharing the device egui renders with.

mod backend;
mod blit;
mod interface;
mod program;

pub use backend::{GpuBuffer, GpuTexture, KernelId, WgpuBackend};
pub use blit::BlitResources;
pub use interface::{Access, Binding, KernelInterface, KERNEL_INTERFACES};
pub use program::{ComputeProgram, ProgramSource, PROGRAM_ENV_VAR};
