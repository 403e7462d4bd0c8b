//! Interactive Mandelbrot viewer: egui canvas, wgpu compute backend and the host-independent
//! frame driver that ties them together.

#![warn(clippy::all, rust_2018_idioms)]

mod apps;
pub mod fractal;
mod frame_history;
pub mod gpu;
mod wrap_app;

pub use wrap_app::WrapApp;
