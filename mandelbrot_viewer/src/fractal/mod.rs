//! Host-independent part of the viewer: view tracking, GPU resource lifetimes and the
//! per-frame dispatch sequence, all behind [`ComputeBackend`].

mod backend;
mod config;
mod driver;
mod error;
mod resources;
mod slot;
mod view;

#[cfg(test)]
mod testing;

pub use backend::{
    ComputeBackend, ShaderParam, CALCULATE_ESCAPE_TIME_KERNEL_NAME, CLEAR_KERNEL_NAME,
    COLOUR_ESCAPE_TIME_KERNEL_NAME, COLOUR_GRAYSCALE_KERNEL_NAME,
};
pub use config::{ViewerConfig, MAX_SCROLL_SENSITIVITY};
pub use driver::{FractalDriver, FrameDriver, FrameInput, FrameOutput};
pub use error::StartupError;
pub use resources::{KernelSet, RenderResources};
pub use slot::ResourceSlot;
pub use view::{pan_delta, update, PointerState, ViewState, ViewTracker};
