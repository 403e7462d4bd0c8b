use shared::{group_count, GROUP_SIZE_X, GROUP_SIZE_Y};

use super::backend::{ComputeBackend, ShaderParam};
use super::slot::ResourceSlot;

/// Kernel handles resolved once at startup.
#[derive(Clone, Copy, Debug)]
pub struct KernelSet<K> {
    pub clear: K,
    pub calculate_escape_time: K,
    pub colour_escape_time: K,
    pub colour_grayscale: K,
}

impl<K: Copy> KernelSet<K> {
    /// Every kernel. Per-resolution resources are bound to all of them; a backend ignores the
    /// ones a kernel does not declare.
    pub fn all(&self) -> [K; 4] {
        [
            self.clear,
            self.calculate_escape_time,
            self.colour_escape_time,
            self.colour_grayscale,
        ]
    }
}

/// Per-resolution GPU resources: the colour target and the escape-time buffer.
pub struct RenderResources<B: ComputeBackend> {
    width: u32,
    height: u32,
    groups: (u32, u32),
    color_target: ResourceSlot<B::Texture>,
    escape_buffer: ResourceSlot<B::Buffer>,
}

impl<B: ComputeBackend> Default for RenderResources<B> {
    fn default() -> Self {
        Self {
            width: 0,
            height: 0,
            groups: (0, 0),
            color_target: ResourceSlot::Empty,
            escape_buffer: ResourceSlot::Empty,
        }
    }
}

impl<B: ComputeBackend> RenderResources<B> {
    pub fn needs_resize(&self, width: u32, height: u32) -> bool {
        !self.color_target.is_allocated() || self.width != width || self.height != height
    }

    /// Reallocates for `width x height` when the size differs from the current allocation and
    /// rebinds the new resources to every kernel. Returns whether anything was reallocated.
    pub fn ensure(
        &mut self,
        backend: &mut B,
        kernels: &KernelSet<B::Kernel>,
        width: u32,
        height: u32,
    ) -> bool {
        if !self.needs_resize(width, height) {
            return false;
        }
        tracing::debug!("allocating render resources for {width}x{height}");
        self.release(backend);

        let target = self.color_target.replace(
            backend,
            |backend, texture| backend.release_texture(texture),
            |backend| backend.create_texture(width, height),
        );
        for kernel in kernels.all() {
            backend.set_texture(kernel, ShaderParam::ResultTexture, target);
        }

        let len = width as usize * height as usize;
        let buffer = self.escape_buffer.replace(
            backend,
            |backend, buffer| backend.release_buffer(buffer),
            |backend| backend.create_escape_buffer(len),
        );
        for kernel in kernels.all() {
            backend.set_buffer(kernel, ShaderParam::EscapeTimeBuffer, buffer);
        }

        self.width = width;
        self.height = height;
        self.groups = (
            group_count(width, GROUP_SIZE_X),
            group_count(height, GROUP_SIZE_Y),
        );
        true
    }

    /// Work-groups covering the current allocation.
    pub fn groups(&self) -> (u32, u32) {
        self.groups
    }

    pub fn color_target(&self) -> Option<&B::Texture> {
        self.color_target.get()
    }

    pub fn release(&mut self, backend: &mut B) {
        self.color_target
            .release(backend, |backend, texture| backend.release_texture(texture));
        self.escape_buffer
            .release(backend, |backend, buffer| backend.release_buffer(buffer));
        self.width = 0;
        self.height = 0;
        self.groups = (0, 0);
    }
}
