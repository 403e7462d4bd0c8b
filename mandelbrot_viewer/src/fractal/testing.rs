//! A [`ComputeBackend`] that records every call.

use shared::Rgba;
use spirv_std::glam::Vec2;

use super::backend::{
    ComputeBackend, ShaderParam, CALCULATE_ESCAPE_TIME_KERNEL_NAME, CLEAR_KERNEL_NAME,
    COLOUR_ESCAPE_TIME_KERNEL_NAME, COLOUR_GRAYSCALE_KERNEL_NAME,
};

const KERNELS: [&str; 4] = [
    CLEAR_KERNEL_NAME,
    CALCULATE_ESCAPE_TIME_KERNEL_NAME,
    COLOUR_ESCAPE_TIME_KERNEL_NAME,
    COLOUR_GRAYSCALE_KERNEL_NAME,
];

#[derive(Clone, Debug, PartialEq)]
pub enum Call {
    CreateTexture { id: u32, width: u32, height: u32 },
    CreateEscapeBuffer { id: u32, len: usize },
    CreateColorBuffer { id: u32, len: usize },
    WriteColors { id: u32, colors: Vec<Rgba> },
    ReleaseTexture(u32),
    ReleaseBuffer(u32),
    SetFloat(ShaderParam, f32),
    SetVector(ShaderParam, Vec2),
    SetInt(ShaderParam, u32),
    SetTexture(&'static str, ShaderParam, u32),
    SetBuffer(&'static str, ShaderParam, u32),
    Dispatch(&'static str, u32, u32, u32),
    Blit(u32),
}

#[derive(Debug)]
pub struct TestTexture(pub u32);

#[derive(Debug)]
pub struct TestBuffer(pub u32);

#[derive(Default)]
pub struct RecordingBackend {
    pub calls: Vec<Call>,
    /// Kernel names `find_kernel` pretends not to know.
    pub missing: Vec<&'static str>,
    pub(crate) next_id: u32,
}

impl RecordingBackend {
    fn next_id(&mut self) -> u32 {
        self.next_id += 1;
        self.next_id
    }

    pub fn take_calls(&mut self) -> Vec<Call> {
        std::mem::take(&mut self.calls)
    }

    pub fn dispatched(calls: &[Call]) -> Vec<&'static str> {
        calls
            .iter()
            .filter_map(|call| match call {
                Call::Dispatch(kernel, ..) => Some(*kernel),
                _ => None,
            })
            .collect()
    }
}

impl ComputeBackend for RecordingBackend {
    type Kernel = &'static str;
    type Texture = TestTexture;
    type Buffer = TestBuffer;

    fn find_kernel(&mut self, name: &str) -> Option<Self::Kernel> {
        KERNELS
            .into_iter()
            .find(|kernel| *kernel == name && !self.missing.contains(kernel))
    }

    fn create_texture(&mut self, width: u32, height: u32) -> TestTexture {
        let id = self.next_id();
        self.calls.push(Call::CreateTexture { id, width, height });
        TestTexture(id)
    }

    fn create_escape_buffer(&mut self, len: usize) -> TestBuffer {
        let id = self.next_id();
        self.calls.push(Call::CreateEscapeBuffer { id, len });
        TestBuffer(id)
    }

    fn create_color_buffer(&mut self, len: usize) -> TestBuffer {
        let id = self.next_id();
        self.calls.push(Call::CreateColorBuffer { id, len });
        TestBuffer(id)
    }

    fn write_colors(&mut self, buffer: &TestBuffer, colors: &[Rgba]) {
        self.calls.push(Call::WriteColors {
            id: buffer.0,
            colors: colors.to_vec(),
        });
    }

    fn release_texture(&mut self, texture: TestTexture) {
        self.calls.push(Call::ReleaseTexture(texture.0));
    }

    fn release_buffer(&mut self, buffer: TestBuffer) {
        self.calls.push(Call::ReleaseBuffer(buffer.0));
    }

    fn set_float(&mut self, param: ShaderParam, value: f32) {
        self.calls.push(Call::SetFloat(param, value));
    }

    fn set_vector(&mut self, param: ShaderParam, value: Vec2) {
        self.calls.push(Call::SetVector(param, value));
    }

    fn set_int(&mut self, param: ShaderParam, value: u32) {
        self.calls.push(Call::SetInt(param, value));
    }

    fn set_texture(&mut self, kernel: &'static str, param: ShaderParam, texture: &TestTexture) {
        self.calls.push(Call::SetTexture(kernel, param, texture.0));
    }

    fn set_buffer(&mut self, kernel: &'static str, param: ShaderParam, buffer: &TestBuffer) {
        self.calls.push(Call::SetBuffer(kernel, param, buffer.0));
    }

    fn dispatch(&mut self, kernel: &'static str, groups_x: u32, groups_y: u32, groups_z: u32) {
        self.calls
            .push(Call::Dispatch(kernel, groups_x, groups_y, groups_z));
    }

    fn blit(&mut self, source: &TestTexture) {
        self.calls.push(Call::Blit(source.0));
    }
}
