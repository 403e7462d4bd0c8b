#![cfg_attr(target_arch = "spirv", no_std)]

use bytemuck::{Pod, Zeroable};

// The `threads(..)` attribute on the kernels has to spell the same numbers.
pub const GROUP_SIZE_X: u32 = 8;
pub const GROUP_SIZE_Y: u32 = 8;

/// Push-constant block read by the compute kernels.
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
#[repr(C)]
pub struct FractalConstants {
    pub lower_left_x: f32,
    pub lower_left_y: f32,
    pub scale: f32,
    pub max_iterations: u32,
    pub color_levels: u32,
    pub color_count: u32,
    pub width: u32,
    pub height: u32,
}

impl Default for FractalConstants {
    fn default() -> Self {
        Self {
            lower_left_x: -2.5,
            lower_left_y: -1.5,
            scale: 1.0,
            max_iterations: 10,
            color_levels: 100,
            color_count: 0,
            width: 0,
            height: 0,
        }
    }
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Pod, Zeroable)]
#[repr(C)]
pub struct BlitConstants {
    pub width: u32,
    pub height: u32,
}

/// One entry of the colour table, laid out as a `vec4<f32>`.
#[derive(Copy, Clone, Debug, Default, PartialEq, Pod, Zeroable)]
#[repr(C)]
pub struct Rgba {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl From<[f32; 4]> for Rgba {
    fn from([r, g, b, a]: [f32; 4]) -> Self {
        Self { r, g, b, a }
    }
}

/// Number of work-groups needed to cover `pixels` with groups of `group_size`.
pub const fn group_count(pixels: u32, group_size: u32) -> u32 {
    // Same as `div_ceil`, which the shader toolchain does not have yet.
    pixels / group_size + (pixels % group_size != 0) as u32
}
