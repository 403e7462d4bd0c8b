//! The seam between the frame driver and whatever executes the compute program.

use shared::Rgba;
use spirv_std::glam::Vec2;

/// Named kernels of the compute program.
pub const CLEAR_KERNEL_NAME: &str = "Clear";
pub const CALCULATE_ESCAPE_TIME_KERNEL_NAME: &str = "CalculateEscapeTime";
pub const COLOUR_ESCAPE_TIME_KERNEL_NAME: &str = "ColourByEscapeTime";
pub const COLOUR_GRAYSCALE_KERNEL_NAME: &str = "ColourByGrayscale";

/// Named parameters read by the compute program.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ShaderParam {
    ResultTexture,
    EscapeTimeBuffer,
    MaxIterations,
    LowerLeft,
    Scale,
    Colors,
    ColorLevels,
}

impl ShaderParam {
    pub fn name(self) -> &'static str {
        match self {
            Self::ResultTexture => "ResultTexture",
            Self::EscapeTimeBuffer => "EscapeTimeBuffer",
            Self::MaxIterations => "MaxIterations",
            Self::LowerLeft => "LowerLeft",
            Self::Scale => "Scale",
            Self::Colors => "Colors",
            Self::ColorLevels => "ColorLevels",
        }
    }
}

/// Operations the frame driver needs from a compute backend.
///
/// Handles are owned by the caller. Bindings are per kernel and have to be redone whenever a
/// bound resource is replaced.
pub trait ComputeBackend {
    type Kernel: Copy + std::fmt::Debug;
    type Texture;
    type Buffer;

    fn find_kernel(&mut self, name: &str) -> Option<Self::Kernel>;

    /// Float RGBA target of `width x height` that kernels can write to.
    fn create_texture(&mut self, width: u32, height: u32) -> Self::Texture;
    /// One `u32` per pixel.
    fn create_escape_buffer(&mut self, len: usize) -> Self::Buffer;
    fn create_color_buffer(&mut self, len: usize) -> Self::Buffer;
    fn write_colors(&mut self, buffer: &Self::Buffer, colors: &[Rgba]);

    fn release_texture(&mut self, texture: Self::Texture);
    fn release_buffer(&mut self, buffer: Self::Buffer);

    fn set_float(&mut self, param: ShaderParam, value: f32);
    fn set_vector(&mut self, param: ShaderParam, value: Vec2);
    fn set_int(&mut self, param: ShaderParam, value: u32);
    fn set_texture(&mut self, kernel: Self::Kernel, param: ShaderParam, texture: &Self::Texture);
    fn set_buffer(&mut self, kernel: Self::Kernel, param: ShaderParam, buffer: &Self::Buffer);

    fn dispatch(&mut self, kernel: Self::Kernel, groups_x: u32, groups_y: u32, groups_z: u32);

    /// Copies `source` onto the presentation surface.
    fn blit(&mut self, source: &Self::Texture);
}
