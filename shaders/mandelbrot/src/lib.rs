#![cfg_attr(target_arch = "spirv", no_std)]

use shared::*;
use spirv_std::glam::{ivec2, vec2, vec4, UVec3, Vec2, Vec4};
#[cfg_attr(not(target_arch = "spirv"), allow(unused_imports))]
use spirv_std::num_traits::Float;
use spirv_std::{spirv, Image};

type ResultTexture = Image!(2D, format = rgba32f, sampled = false);

fn in_bounds(id: UVec3, constants: &FractalConstants) -> bool {
    id.x < constants.width && id.y < constants.height
}

fn pixel_index(id: UVec3, constants: &FractalConstants) -> usize {
    (id.y * constants.width + id.x) as usize
}

#[spirv(compute(threads(8, 8)))]
pub fn clear(
    #[spirv(global_invocation_id)] id: UVec3,
    #[spirv(push_constant)] constants: &FractalConstants,
    #[spirv(descriptor_set = 0, binding = 0)] result: &ResultTexture,
    #[spirv(storage_buffer, descriptor_set = 0, binding = 1)] escape_times: &mut [u32],
) {
    if !in_bounds(id, constants) {
        return;
    }
    escape_times[pixel_index(id, constants)] = 0;
    unsafe {
        result.write(id.truncate(), Vec4::ZERO);
    }
}

#[spirv(compute(threads(8, 8)))]
pub fn calculate_escape_time(
    #[spirv(global_invocation_id)] id: UVec3,
    #[spirv(push_constant)] constants: &FractalConstants,
    #[spirv(storage_buffer, descriptor_set = 0, binding = 1)] escape_times: &mut [u32],
) {
    if !in_bounds(id, constants) {
        return;
    }
    let c = vec2(constants.lower_left_x, constants.lower_left_y)
        + constants.scale * vec2(id.x as f32, id.y as f32);

    let mut z = Vec2::ZERO;
    let mut n = 0;
    while n < constants.max_iterations && z.length_squared() <= 4.0 {
        z = vec2(z.x * z.x - z.y * z.y, 2.0 * z.x * z.y) + c;
        n += 1;
    }
    escape_times[pixel_index(id, constants)] = n;
}

#[spirv(compute(threads(8, 8)))]
pub fn colour_by_escape_time(
    #[spirv(global_invocation_id)] id: UVec3,
    #[spirv(push_constant)] constants: &FractalConstants,
    #[spirv(descriptor_set = 0, binding = 0)] result: &ResultTexture,
    #[spirv(storage_buffer, descriptor_set = 0, binding = 1)] escape_times: &[u32],
    #[spirv(storage_buffer, descriptor_set = 0, binding = 2)] colors: &[Vec4],
) {
    if !in_bounds(id, constants) {
        return;
    }
    let n = escape_times[pixel_index(id, constants)];
    let count = constants.color_count as usize;

    let colour = if n >= constants.max_iterations || count == 0 {
        vec4(0.0, 0.0, 0.0, 1.0)
    } else {
        let levels = constants.color_levels.max(1);
        let t = (n % levels) as f32 / levels as f32 * count as f32;
        let lower = t.floor();
        let from = colors[lower as usize % count];
        let to = colors[(lower as usize + 1) % count];
        from.lerp(to, t - lower)
    };
    unsafe {
        result.write(id.truncate(), colour);
    }
}

#[spirv(compute(threads(8, 8)))]
pub fn colour_by_grayscale(
    #[spirv(global_invocation_id)] id: UVec3,
    #[spirv(push_constant)] constants: &FractalConstants,
    #[spirv(descriptor_set = 0, binding = 0)] result: &ResultTexture,
    #[spirv(storage_buffer, descriptor_set = 0, binding = 1)] escape_times: &[u32],
) {
    if !in_bounds(id, constants) {
        return;
    }
    let n = escape_times[pixel_index(id, constants)];
    let v = n as f32 / constants.max_iterations.max(1) as f32;
    unsafe {
        result.write(id.truncate(), vec4(v, v, v, 1.0));
    }
}

#[spirv(fragment)]
pub fn blit_fs(
    #[spirv(push_constant)] constants: &BlitConstants,
    #[spirv(descriptor_set = 0, binding = 0)] image: &Image!(2D, type = f32, sampled),
    uv: Vec2,
    output: &mut Vec4,
) {
    // uv.y grows upwards, same as the rows written by the kernels.
    let texel = ivec2(
        ((uv.x * constants.width as f32) as i32).min(constants.width as i32 - 1),
        ((uv.y * constants.height as f32) as i32).min(constants.height as i32 - 1),
    );
    *output = image.fetch(texel);
}

#[spirv(vertex)]
pub fn main_vs(
    #[spirv(vertex_index)] vert_id: i32,
    #[spirv(position, invariant)] out_pos: &mut Vec4,
    out_uv: &mut Vec2,
) {
    let uv = vec2(((vert_id << 1) & 2) as f32, (vert_id & 2) as f32);
    let pos = 2.0 * uv - Vec2::ONE;

    *out_uv = uv;
    *out_pos = pos.extend(0.0).extend(1.0);
}
