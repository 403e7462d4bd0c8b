//! Resources each kernel of the compute program binds, and how it accesses them.
//!
//! wgpu rejects a pipeline whose layout disagrees with the shader's own view of a binding, so
//! every kernel gets a layout built from its row in [`KERNEL_INTERFACES`].

use eframe::egui_wgpu::wgpu;

use crate::fractal::{
    ShaderParam, CALCULATE_ESCAPE_TIME_KERNEL_NAME, CLEAR_KERNEL_NAME,
    COLOUR_ESCAPE_TIME_KERNEL_NAME, COLOUR_GRAYSCALE_KERNEL_NAME,
};

pub const RESULT_TEXTURE_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba32Float;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Access {
    Read,
    ReadWrite,
}

/// A resource parameter and the access the entry point declares for it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Binding {
    pub param: ShaderParam,
    pub access: Access,
}

const fn read(param: ShaderParam) -> Binding {
    Binding {
        param,
        access: Access::Read,
    }
}

const fn read_write(param: ShaderParam) -> Binding {
    Binding {
        param,
        access: Access::ReadWrite,
    }
}

#[derive(Debug)]
pub struct KernelInterface {
    pub kernel: &'static str,
    pub entry_point: &'static str,
    pub bindings: &'static [Binding],
}

// Storage images always come out of rust-gpu readable and writable. Slices are read-only unless
// the entry point takes them `&mut`.
pub static KERNEL_INTERFACES: [KernelInterface; 4] = [
    KernelInterface {
        kernel: CLEAR_KERNEL_NAME,
        entry_point: "clear",
        bindings: &[
            read_write(ShaderParam::ResultTexture),
            read_write(ShaderParam::EscapeTimeBuffer),
        ],
    },
    KernelInterface {
        kernel: CALCULATE_ESCAPE_TIME_KERNEL_NAME,
        entry_point: "calculate_escape_time",
        bindings: &[read_write(ShaderParam::EscapeTimeBuffer)],
    },
    KernelInterface {
        kernel: COLOUR_ESCAPE_TIME_KERNEL_NAME,
        entry_point: "colour_by_escape_time",
        bindings: &[
            read_write(ShaderParam::ResultTexture),
            read(ShaderParam::EscapeTimeBuffer),
            read(ShaderParam::Colors),
        ],
    },
    KernelInterface {
        kernel: COLOUR_GRAYSCALE_KERNEL_NAME,
        entry_point: "colour_by_grayscale",
        bindings: &[
            read_write(ShaderParam::ResultTexture),
            read(ShaderParam::EscapeTimeBuffer),
        ],
    },
];

/// Descriptor binding of a resource parameter in set 0.
pub fn binding_index(param: ShaderParam) -> Option<u32> {
    match param {
        ShaderParam::ResultTexture => Some(0),
        ShaderParam::EscapeTimeBuffer => Some(1),
        ShaderParam::Colors => Some(2),
        ShaderParam::MaxIterations
        | ShaderParam::LowerLeft
        | ShaderParam::Scale
        | ShaderParam::ColorLevels => None,
    }
}

impl KernelInterface {
    pub fn find(kernel: &str) -> Option<&'static KernelInterface> {
        KERNEL_INTERFACES
            .iter()
            .find(|interface| interface.kernel == kernel)
    }

    pub fn layout_entries(&self) -> Vec<wgpu::BindGroupLayoutEntry> {
        self.bindings
            .iter()
            .filter_map(|binding| {
                let ty = match binding.param {
                    ShaderParam::ResultTexture => wgpu::BindingType::StorageTexture {
                        access: match binding.access {
                            Access::Read => wgpu::StorageTextureAccess::ReadOnly,
                            Access::ReadWrite => wgpu::StorageTextureAccess::ReadWrite,
                        },
                        format: RESULT_TEXTURE_FORMAT,
                        view_dimension: wgpu::TextureViewDimension::D2,
                    },
                    _ => wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Storage {
                            read_only: binding.access == Access::Read,
                        },
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                };
                Some(wgpu::BindGroupLayoutEntry {
                    binding: binding_index(binding.param)?,
                    visibility: wgpu::ShaderStages::COMPUTE,
                    ty,
                    count: None,
                })
            })
            .collect()
    }
}
