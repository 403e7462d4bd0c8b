use std::sync::Arc;

use eframe::egui_wgpu;
use spirv_std::glam::{vec2, Vec2};

use crate::fractal::{
    FractalDriver, FrameDriver, FrameInput, PointerState, StartupError, ViewState, ViewerConfig,
};
use crate::gpu::{BlitResources, ComputeProgram, ProgramSource, WgpuBackend};

/// egui reports wheel scrolling in points. One notch of a typical wheel is this many.
const POINTS_PER_SCROLL_NOTCH: f32 = 50.0;
/// Per-frame scroll cap. With the largest sensitivity the settings panel allows, the zoom
/// factor `1 + notches * sensitivity` stays positive.
const MAX_SCROLL_NOTCHES: f32 = 3.0;

enum Viewer {
    Running {
        driver: FractalDriver<WgpuBackend>,
        backend: WgpuBackend,
    },
    Disabled(StartupError),
}

/// The fractal canvas: feeds egui input to the frame driver and paints the colour target.
pub struct FractalView {
    viewer: Viewer,
    view: Option<ViewState>,
}

impl FractalView {
    pub fn new(
        cc: &eframe::CreationContext<'_>,
        config: &ViewerConfig,
        program: Option<&ProgramSource>,
    ) -> Self {
        let viewer = match start(cc, config, program) {
            Ok((driver, backend)) => Viewer::Running { driver, backend },
            Err(err) => {
                tracing::error!("fractal viewer disabled: {err}");
                Viewer::Disabled(err)
            }
        };
        Self { viewer, view: None }
    }

    pub fn startup_error(&self) -> Option<&StartupError> {
        match &self.viewer {
            Viewer::Running { .. } => None,
            Viewer::Disabled(err) => Some(err),
        }
    }

    /// View shown on the last painted frame.
    pub fn view(&self) -> Option<ViewState> {
        self.view
    }

    pub fn reset_view(&mut self) {
        if let Viewer::Running { driver, .. } = &mut self.viewer {
            driver.reset_view();
        }
    }

    pub fn ui(&mut self, ui: &mut egui::Ui, config: &ViewerConfig) {
        match &mut self.viewer {
            Viewer::Running { driver, backend } => {
                driver.set_config(config);
                self.view = egui::Frame::canvas(ui.style())
                    .show(ui, |ui| custom_painting(ui, driver, backend))
                    .inner;
            }
            Viewer::Disabled(err) => {
                let message = format!("Fractal viewer disabled: {err}");
                ui.centered_and_justified(|ui| {
                    ui.colored_label(ui.visuals().error_fg_color, message);
                });
            }
        }
    }

    /// Releases every GPU resource. The view paints nothing afterwards.
    pub fn shutdown(&mut self) {
        if let Viewer::Running { driver, backend } = &mut self.viewer {
            driver.shutdown(backend);
        }
    }
}

fn start(
    cc: &eframe::CreationContext<'_>,
    config: &ViewerConfig,
    program: Option<&ProgramSource>,
) -> Result<(FractalDriver<WgpuBackend>, WgpuBackend), StartupError> {
    // Get the WGPU render state from the eframe creation context. This can also be retrieved
    // from `eframe::Frame` when you don't have a `CreationContext` available.
    let render_state = cc
        .wgpu_render_state
        .as_ref()
        .ok_or(StartupError::NoRenderState)?;
    let program = ComputeProgram::load(program)?;
    let mut backend = WgpuBackend::new(render_state, &program)?;
    let mut driver = FractalDriver::new(config.clone());
    driver.initialize(&mut backend)?;
    Ok((driver, backend))
}

fn custom_painting(
    ui: &mut egui::Ui,
    driver: &mut FractalDriver<WgpuBackend>,
    backend: &mut WgpuBackend,
) -> Option<ViewState> {
    let available_size = ui.available_size();
    let (rect, response) = ui.allocate_exact_size(available_size, egui::Sense::drag());

    let input = frame_input(ui, &response, rect);
    let output = driver.step(backend, &input);
    if output.resized {
        tracing::debug!("canvas is now {}x{}", input.width, input.height);
    }
    let view = output.view?;

    // The compute work was submitted by `step`, before egui submits its own frame, so the
    // paint callback only has to draw the finished target.
    let cb = egui_wgpu::CallbackFn::new().paint(
        move |_info, render_pass, paint_callback_resources| {
            if let Some(resources) = paint_callback_resources.get::<BlitResources>() {
                resources.paint(render_pass);
            }
        },
    );

    let callback = egui::PaintCallback {
        rect,
        callback: Arc::new(cb),
    };

    ui.painter().add(callback);
    Some(view)
}

fn frame_input(ui: &egui::Ui, response: &egui::Response, rect: egui::Rect) -> FrameInput {
    let pixels_per_point = ui.ctx().pixels_per_point();
    let (hover_pos, primary_down, primary_pressed, scroll_y) = ui.input(|i| {
        (
            i.pointer.hover_pos(),
            i.pointer.primary_down(),
            i.pointer.primary_pressed(),
            i.scroll_delta.y,
        )
    });

    let down = primary_down && response.is_pointer_button_down_on() && hover_pos.is_some();
    let position = hover_pos.map_or(Vec2::ZERO, |pos| to_pixels(pos, rect, pixels_per_point));
    let scroll_delta = if response.hovered() {
        scroll_notches(scroll_y)
    } else {
        0.0
    };

    FrameInput {
        width: (rect.width() * pixels_per_point).round() as u32,
        height: (rect.height() * pixels_per_point).round() as u32,
        pointer: PointerState {
            down,
            just_pressed: down && primary_pressed,
            position,
        },
        scroll_delta,
    }
}

/// egui points, top-left origin, to physical pixels of `rect`, bottom-left origin.
fn to_pixels(pos: egui::Pos2, rect: egui::Rect, pixels_per_point: f32) -> Vec2 {
    vec2(pos.x - rect.left(), rect.bottom() - pos.y) * pixels_per_point
}

fn scroll_notches(points: f32) -> f32 {
    (points / POINTS_PER_SCROLL_NOTCH).clamp(-MAX_SCROLL_NOTCHES, MAX_SCROLL_NOTCHES)
}
