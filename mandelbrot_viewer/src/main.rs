//! Mandelbrot viewer

#![cfg_attr(not(debug_assertions), windows_subsystem = "windows")] // hide console window on Windows in release

use mandelbrot_viewer::gpu::ProgramSource;

// When compiling natively:
fn main() -> Result<(), eframe::Error> {
    {
        // Silence wgpu log spam (https://github.com/gfx-rs/wgpu/issues/3206)
        let mut rust_log = std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_owned());
        for loud_crate in ["naga", "wgpu_core", "wgpu_hal"] {
            if !rust_log.contains(&format!("{loud_crate}=")) {
                rust_log += &format!(",{loud_crate}=warn");
            }
        }
        std::env::set_var("RUST_LOG", rust_log);
    }

    // Log to stdout (if you run with `RUST_LOG=debug`).
    tracing_subscriber::fmt::init();

    let program = ProgramSource::from_env();
    tracing::info!("compute program source: {program:?}");

    let options = eframe::NativeOptions {
        drag_and_drop_support: false,

        initial_window_size: Some([1280.0, 1024.0].into()),

        renderer: eframe::Renderer::Wgpu,

        wgpu_options: egui_wgpu::WgpuConfiguration {
            device_descriptor: wgpu::DeviceDescriptor {
                label: None,
                // Kernel parameters and the blit size travel as push constants. Kernels read and
                // write the float result texture, which needs adapter specific format features.
                features: wgpu::Features::PUSH_CONSTANTS
                    | wgpu::Features::TEXTURE_ADAPTER_SPECIFIC_FORMAT_FEATURES,
                limits: wgpu::Limits {
                    max_push_constant_size: 128,
                    ..Default::default()
                },
            },
            ..Default::default()
        },

        ..Default::default()
    };
    eframe::run_native(
        "Mandelbrot viewer",
        options,
        Box::new(move |cc| Box::new(mandelbrot_viewer::WrapApp::new(cc, program))),
    )
}
