use std::sync::Arc;

use eframe::egui_wgpu::{self, wgpu};
use shared::{FractalConstants, Rgba};
use spirv_std::glam::Vec2;

use super::blit::BlitResources;
use super::interface::{binding_index, KernelInterface, RESULT_TEXTURE_FORMAT};
use super::program::ComputeProgram;
use crate::fractal::{ComputeBackend, ShaderParam, StartupError};

const BLIT_ENTRY_POINTS: [&str; 2] = ["main_vs", "blit_fs"];

pub struct GpuTexture {
    texture: wgpu::Texture,
    view: wgpu::TextureView,
    width: u32,
    height: u32,
}

pub struct GpuBuffer {
    buffer: wgpu::Buffer,
    len: usize,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct KernelId(usize);

struct Kernel {
    interface: &'static KernelInterface,
    pipeline: wgpu::ComputePipeline,
    bind_group_layout: wgpu::BindGroupLayout,
    result_texture: Option<Arc<GpuTexture>>,
    escape_times: Option<Arc<GpuBuffer>>,
    colors: Option<Arc<GpuBuffer>>,
    bind_group: Option<wgpu::BindGroup>,
}

impl Kernel {
    fn forget_texture(&mut self, texture: &Arc<GpuTexture>) {
        if matches!(&self.result_texture, Some(bound) if Arc::ptr_eq(bound, texture)) {
            self.result_texture = None;
            self.bind_group = None;
        }
    }

    fn forget_buffer(&mut self, buffer: &Arc<GpuBuffer>) {
        for slot in [&mut self.escape_times, &mut self.colors] {
            if matches!(slot, Some(bound) if Arc::ptr_eq(bound, buffer)) {
                *slot = None;
                self.bind_group = None;
            }
        }
    }
}

/// Stand-ins bound to slots a kernel has no resource for yet.
struct Placeholders {
    _texture: wgpu::Texture,
    view: wgpu::TextureView,
    buffer: wgpu::Buffer,
}

/// Runs `create` inside a validation error scope, so a rejected descriptor comes back as an
/// error instead of reaching wgpu's uncaptured error handler.
fn validated<T>(device: &wgpu::Device, create: impl FnOnce() -> T) -> Result<T, wgpu::Error> {
    device.push_error_scope(wgpu::ErrorFilter::Validation);
    let value = create();
    match pollster::block_on(device.pop_error_scope()) {
        Some(err) => Err(err),
        None => Ok(value),
    }
}

/// [`ComputeBackend`] on the wgpu device egui renders with.
pub struct WgpuBackend {
    render_state: egui_wgpu::RenderState,
    module: wgpu::ShaderModule,
    placeholders: Placeholders,
    kernels: Vec<Kernel>,
    constants: FractalConstants,
    encoder: Option<wgpu::CommandEncoder>,
    presented: Option<Arc<GpuTexture>>,
}

impl WgpuBackend {
    pub fn new(
        render_state: &egui_wgpu::RenderState,
        program: &ComputeProgram,
    ) -> Result<Self, StartupError> {
        let device = &render_state.device;
        let module = validated(device, || {
            device.create_shader_module(program.shader_module_descriptor())
        })
        .map_err(|err| StartupError::ProgramBuild(err.to_string()))?;

        let placeholder_texture = create_result_texture(device, 1, 1, "placeholder");
        let placeholders = Placeholders {
            view: placeholder_texture.create_view(&wgpu::TextureViewDescriptor::default()),
            _texture: placeholder_texture,
            buffer: device.create_buffer(&wgpu::BufferDescriptor {
                label: Some("placeholder"),
                size: std::mem::size_of::<Rgba>() as u64,
                usage: wgpu::BufferUsages::STORAGE,
                mapped_at_creation: false,
            }),
        };

        match validated(device, || {
            BlitResources::new(device, &module, render_state.target_format)
        }) {
            Ok(blit) => {
                render_state
                    .renderer
                    .write()
                    .paint_callback_resources
                    .insert(blit);
            }
            Err(err) => tracing::warn!(
                "{} has no usable {BLIT_ENTRY_POINTS:?}, nothing will be presented: {err}",
                program.label
            ),
        }

        Ok(Self {
            render_state: render_state.clone(),
            module,
            placeholders,
            kernels: Vec::new(),
            constants: FractalConstants::default(),
            encoder: None,
            presented: None,
        })
    }

    fn device(&self) -> &wgpu::Device {
        &self.render_state.device
    }

    fn kernel_mut(&mut self, kernel: KernelId) -> &mut Kernel {
        &mut self.kernels[kernel.0]
    }

    fn create_kernel(&self, interface: &'static KernelInterface) -> Result<Kernel, wgpu::Error> {
        let device = self.device();
        validated(device, || {
            let bind_group_layout =
                device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                    label: Some(interface.kernel),
                    entries: &interface.layout_entries(),
                });
            let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                label: Some(interface.kernel),
                bind_group_layouts: &[&bind_group_layout],
                push_constant_ranges: &[wgpu::PushConstantRange {
                    stages: wgpu::ShaderStages::COMPUTE,
                    range: 0..std::mem::size_of::<FractalConstants>() as u32,
                }],
            });
            let pipeline = device.create_compute_pipeline(&wgpu::ComputePipelineDescriptor {
                label: Some(interface.kernel),
                layout: Some(&pipeline_layout),
                module: &self.module,
                entry_point: interface.entry_point,
            });
            Kernel {
                interface,
                pipeline,
                bind_group_layout,
                result_texture: None,
                escape_times: None,
                colors: None,
                bind_group: None,
            }
        })
    }

    fn ensure_bind_group(&mut self, id: KernelId) {
        if self.kernels[id.0].bind_group.is_some() {
            return;
        }
        let bind_group = {
            let kernel = &self.kernels[id.0];
            let entries: Vec<_> = kernel
                .interface
                .bindings
                .iter()
                .filter_map(|binding| {
                    let resource = match binding.param {
                        ShaderParam::ResultTexture => wgpu::BindingResource::TextureView(
                            kernel
                                .result_texture
                                .as_ref()
                                .map_or(&self.placeholders.view, |texture| &texture.view),
                        ),
                        ShaderParam::EscapeTimeBuffer => kernel
                            .escape_times
                            .as_ref()
                            .map_or(&self.placeholders.buffer, |buffer| &buffer.buffer)
                            .as_entire_binding(),
                        ShaderParam::Colors => kernel
                            .colors
                            .as_ref()
                            .map_or(&self.placeholders.buffer, |buffer| &buffer.buffer)
                            .as_entire_binding(),
                        _ => return None,
                    };
                    Some(wgpu::BindGroupEntry {
                        binding: binding_index(binding.param)?,
                        resource,
                    })
                })
                .collect();
            self.device().create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some(kernel.interface.kernel),
                layout: &kernel.bind_group_layout,
                entries: &entries,
            })
        };
        self.kernels[id.0].bind_group = Some(bind_group);
    }

    fn submit_pending(&mut self) {
        if let Some(encoder) = self.encoder.take() {
            self.render_state.queue.submit(Some(encoder.finish()));
        }
    }

    fn update_blit_source(&self, source: Option<&GpuTexture>) {
        let mut renderer = self.render_state.renderer.write();
        let Some(blit) = renderer.paint_callback_resources.get_mut::<BlitResources>() else {
            return;
        };
        match source {
            Some(texture) => {
                blit.set_source(self.device(), &texture.view, texture.width, texture.height)
            }
            None => blit.clear_source(),
        }
    }
}

fn create_result_texture(
    device: &wgpu::Device,
    width: u32,
    height: u32,
    label: &str,
) -> wgpu::Texture {
    device.create_texture(&wgpu::TextureDescriptor {
        label: Some(label),
        size: wgpu::Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: RESULT_TEXTURE_FORMAT,
        usage: wgpu::TextureUsages::STORAGE_BINDING | wgpu::TextureUsages::TEXTURE_BINDING,
        view_formats: &[],
    })
}

impl ComputeBackend for WgpuBackend {
    type Kernel = KernelId;
    type Texture = Arc<GpuTexture>;
    type Buffer = Arc<GpuBuffer>;

    fn find_kernel(&mut self, name: &str) -> Option<KernelId> {
        if let Some(index) = self
            .kernels
            .iter()
            .position(|kernel| kernel.interface.kernel == name)
        {
            return Some(KernelId(index));
        }
        let interface = KernelInterface::find(name)?;
        match self.create_kernel(interface) {
            Ok(kernel) => {
                tracing::debug!(
                    "created compute pipeline {name} ({})",
                    interface.entry_point
                );
                self.kernels.push(kernel);
                Some(KernelId(self.kernels.len() - 1))
            }
            Err(err) => {
                tracing::error!(
                    "compute program rejected {name} ({}): {err}",
                    interface.entry_point
                );
                None
            }
        }
    }

    fn create_texture(&mut self, width: u32, height: u32) -> Arc<GpuTexture> {
        let texture = create_result_texture(self.device(), width, height, "result texture");
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        Arc::new(GpuTexture {
            texture,
            view,
            width,
            height,
        })
    }

    fn create_escape_buffer(&mut self, len: usize) -> Arc<GpuBuffer> {
        let buffer = self.device().create_buffer(&wgpu::BufferDescriptor {
            label: Some("escape times"),
            size: (len.max(1) * std::mem::size_of::<u32>()) as u64,
            usage: wgpu::BufferUsages::STORAGE,
            mapped_at_creation: false,
        });
        Arc::new(GpuBuffer { buffer, len })
    }

    fn create_color_buffer(&mut self, len: usize) -> Arc<GpuBuffer> {
        let buffer = self.device().create_buffer(&wgpu::BufferDescriptor {
            label: Some("colors"),
            size: (len.max(1) * std::mem::size_of::<Rgba>()) as u64,
            usage: wgpu::BufferUsages::STORAGE | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        Arc::new(GpuBuffer { buffer, len })
    }

    fn write_colors(&mut self, buffer: &Arc<GpuBuffer>, colors: &[Rgba]) {
        let colors = &colors[..colors.len().min(buffer.len)];
        self.render_state
            .queue
            .write_buffer(&buffer.buffer, 0, bytemuck::cast_slice(colors));
        self.constants.color_count = colors.len() as u32;
    }

    fn release_texture(&mut self, texture: Arc<GpuTexture>) {
        for kernel in &mut self.kernels {
            kernel.forget_texture(&texture);
        }
        if matches!(&self.presented, Some(presented) if Arc::ptr_eq(presented, &texture)) {
            self.presented = None;
            self.update_blit_source(None);
        }
        texture.texture.destroy();
    }

    fn release_buffer(&mut self, buffer: Arc<GpuBuffer>) {
        for kernel in &mut self.kernels {
            kernel.forget_buffer(&buffer);
        }
        buffer.buffer.destroy();
    }

    fn set_float(&mut self, param: ShaderParam, value: f32) {
        match param {
            ShaderParam::Scale => self.constants.scale = value,
            _ => tracing::warn!("{} is not a float parameter", param.name()),
        }
    }

    fn set_vector(&mut self, param: ShaderParam, value: Vec2) {
        match param {
            ShaderParam::LowerLeft => {
                self.constants.lower_left_x = value.x;
                self.constants.lower_left_y = value.y;
            }
            _ => tracing::warn!("{} is not a vector parameter", param.name()),
        }
    }

    fn set_int(&mut self, param: ShaderParam, value: u32) {
        match param {
            ShaderParam::MaxIterations => self.constants.max_iterations = value,
            ShaderParam::ColorLevels => self.constants.color_levels = value,
            _ => tracing::warn!("{} is not an integer parameter", param.name()),
        }
    }

    fn set_texture(&mut self, kernel: KernelId, param: ShaderParam, texture: &Arc<GpuTexture>) {
        let kernel = self.kernel_mut(kernel);
        match param {
            ShaderParam::ResultTexture => kernel.result_texture = Some(Arc::clone(texture)),
            _ => {
                tracing::warn!("{} is not a texture parameter", param.name());
                return;
            }
        }
        kernel.bind_group = None;
    }

    fn set_buffer(&mut self, kernel: KernelId, param: ShaderParam, buffer: &Arc<GpuBuffer>) {
        let kernel = self.kernel_mut(kernel);
        match param {
            ShaderParam::EscapeTimeBuffer => kernel.escape_times = Some(Arc::clone(buffer)),
            ShaderParam::Colors => kernel.colors = Some(Arc::clone(buffer)),
            _ => {
                tracing::warn!("{} is not a buffer parameter", param.name());
                return;
            }
        }
        kernel.bind_group = None;
    }

    fn dispatch(&mut self, kernel: KernelId, groups_x: u32, groups_y: u32, groups_z: u32) {
        self.ensure_bind_group(kernel);

        let kernel = &self.kernels[kernel.0];
        if let Some(texture) = &kernel.result_texture {
            self.constants.width = texture.width;
            self.constants.height = texture.height;
        }
        let Some(bind_group) = &kernel.bind_group else {
            return;
        };
        let device = &self.render_state.device;
        let encoder = self.encoder.get_or_insert_with(|| {
            device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("fractal"),
            })
        });

        let mut pass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
            label: Some(kernel.interface.kernel),
        });
        pass.set_pipeline(&kernel.pipeline);
        pass.set_bind_group(0, bind_group, &[]);
        pass.set_push_constants(0, bytemuck::bytes_of(&self.constants));
        pass.dispatch_workgroups(groups_x, groups_y, groups_z);
    }

    fn blit(&mut self, source: &Arc<GpuTexture>) {
        self.submit_pending();
        if matches!(&self.presented, Some(presented) if Arc::ptr_eq(presented, source)) {
            return;
        }
        self.update_blit_source(Some(source));
        self.presented = Some(Arc::clone(source));
    }
}
