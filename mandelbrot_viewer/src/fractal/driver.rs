use shared::Rgba;

use super::backend::{
    ComputeBackend, ShaderParam, CALCULATE_ESCAPE_TIME_KERNEL_NAME, CLEAR_KERNEL_NAME,
    COLOUR_ESCAPE_TIME_KERNEL_NAME, COLOUR_GRAYSCALE_KERNEL_NAME,
};
use super::config::ViewerConfig;
use super::error::StartupError;
use super::resources::{KernelSet, RenderResources};
use super::slot::ResourceSlot;
use super::view::{PointerState, ViewState, ViewTracker};

/// Everything the driver reads from the host for one frame. Sizes are physical pixels and
/// `scroll_delta` counts notches, positive away from the user.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct FrameInput {
    pub width: u32,
    pub height: u32,
    pub pointer: PointerState,
    pub scroll_delta: f32,
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct FrameOutput {
    pub resized: bool,
    pub rendered: bool,
    pub view: Option<ViewState>,
}

/// Host lifecycle of a per-frame driver. A host adapter calls `initialize` once, `step` once
/// per displayed frame and `shutdown` before dropping the driver.
pub trait FrameDriver<B: ComputeBackend> {
    fn initialize(&mut self, backend: &mut B) -> Result<(), StartupError>;
    fn step(&mut self, backend: &mut B, input: &FrameInput) -> FrameOutput;
    fn shutdown(&mut self, backend: &mut B);
}

/// Keeps the view, the GPU resources and the re-render flag between frames.
pub struct FractalDriver<B: ComputeBackend> {
    config: ViewerConfig,
    kernels: Option<KernelSet<B::Kernel>>,
    tracker: Option<ViewTracker>,
    reset_requested: bool,
    resources: RenderResources<B>,
    colors: ResourceSlot<B::Buffer>,
    color_count: usize,
    needs_render: bool,
}

impl<B: ComputeBackend> FractalDriver<B> {
    pub fn new(config: ViewerConfig) -> Self {
        Self {
            config: config.clamped(),
            kernels: None,
            tracker: None,
            reset_requested: false,
            resources: RenderResources::default(),
            colors: ResourceSlot::Empty,
            color_count: 0,
            needs_render: true,
        }
    }

    pub fn config(&self) -> &ViewerConfig {
        &self.config
    }

    /// Replaces the config, clamped. Only an actual change triggers a re-render.
    pub fn set_config(&mut self, config: &ViewerConfig) {
        let config = config.clone().clamped();
        if self.config != config {
            self.config = config;
            self.needs_render = true;
        }
    }

    pub fn view(&self) -> Option<ViewState> {
        self.tracker.as_ref().map(ViewTracker::view)
    }

    /// Goes back to the initial view on the next frame.
    pub fn reset_view(&mut self) {
        self.reset_requested = true;
    }

    fn colour_kernel(&self, kernels: &KernelSet<B::Kernel>) -> B::Kernel {
        if self.config.colors.is_empty() {
            kernels.colour_grayscale
        } else {
            kernels.colour_escape_time
        }
    }

    fn upload_parameters(
        &mut self,
        backend: &mut B,
        kernels: &KernelSet<B::Kernel>,
        view: ViewState,
    ) {
        backend.set_float(ShaderParam::Scale, view.scale);
        backend.set_vector(ShaderParam::LowerLeft, view.lower_left);
        backend.set_int(ShaderParam::MaxIterations, self.config.max_iterations);
        backend.set_int(ShaderParam::ColorLevels, self.config.color_levels);
        self.upload_colors(backend, kernels);
    }

    /// The colour buffer is only reallocated when the table changes length.
    fn upload_colors(&mut self, backend: &mut B, kernels: &KernelSet<B::Kernel>) {
        if self.config.colors.is_empty() {
            if self
                .colors
                .release(backend, |backend, buffer| backend.release_buffer(buffer))
            {
                tracing::debug!("colour table emptied, colouring by grayscale");
            }
            self.color_count = 0;
            return;
        }

        let colors: Vec<Rgba> = self.config.colors.iter().copied().map(Rgba::from).collect();
        if colors.len() != self.color_count || !self.colors.is_allocated() {
            tracing::debug!("allocating colour table of {} entries", colors.len());
            let buffer = self.colors.replace(
                backend,
                |backend, buffer| backend.release_buffer(buffer),
                |backend| backend.create_color_buffer(colors.len()),
            );
            backend.set_buffer(kernels.colour_escape_time, ShaderParam::Colors, buffer);
            self.color_count = colors.len();
        }
        if let Some(buffer) = self.colors.get() {
            backend.write_colors(buffer, &colors);
        }
    }
}

impl<B: ComputeBackend> FrameDriver<B> for FractalDriver<B> {
    fn initialize(&mut self, backend: &mut B) -> Result<(), StartupError> {
        let mut find = |name: &'static str| {
            backend
                .find_kernel(name)
                .ok_or(StartupError::MissingKernel(name))
        };
        let kernels = KernelSet {
            clear: find(CLEAR_KERNEL_NAME)?,
            calculate_escape_time: find(CALCULATE_ESCAPE_TIME_KERNEL_NAME)?,
            colour_escape_time: find(COLOUR_ESCAPE_TIME_KERNEL_NAME)?,
            colour_grayscale: find(COLOUR_GRAYSCALE_KERNEL_NAME)?,
        };
        tracing::info!("resolved compute kernels: {kernels:?}");

        self.kernels = Some(kernels);
        self.needs_render = true;
        Ok(())
    }

    fn step(&mut self, backend: &mut B, input: &FrameInput) -> FrameOutput {
        let Some(kernels) = self.kernels else {
            return FrameOutput::default();
        };
        if input.width == 0 || input.height == 0 {
            return FrameOutput::default();
        }

        if self.tracker.is_none() {
            self.needs_render = true;
        }
        if std::mem::take(&mut self.reset_requested) {
            if let Some(tracker) = &mut self.tracker {
                tracker.reset(ViewState::initial(input.width, input.height));
                self.needs_render = true;
            }
        }
        let tracker = self
            .tracker
            .get_or_insert_with(|| ViewTracker::new(ViewState::initial(input.width, input.height)));
        if tracker.step(
            &input.pointer,
            input.scroll_delta,
            self.config.scroll_sensitivity,
        ) {
            self.needs_render = true;
        }
        let view = tracker.view();

        let mut output = FrameOutput {
            view: Some(view),
            ..Default::default()
        };

        if self
            .resources
            .ensure(backend, &kernels, input.width, input.height)
        {
            self.needs_render = true;
            output.resized = true;
        }

        if self.needs_render {
            self.upload_parameters(backend, &kernels, view);

            let (groups_x, groups_y) = self.resources.groups();
            backend.dispatch(kernels.clear, groups_x, groups_y, 1);
            backend.dispatch(kernels.calculate_escape_time, groups_x, groups_y, 1);
            backend.dispatch(self.colour_kernel(&kernels), groups_x, groups_y, 1);

            self.needs_render = false;
            output.rendered = true;
        }

        if let Some(target) = self.resources.color_target() {
            backend.blit(target);
        }
        output
    }

    fn shutdown(&mut self, backend: &mut B) {
        self.resources.release(backend);
        self.colors
            .release(backend, |backend, buffer| backend.release_buffer(buffer));
        self.color_count = 0;
        self.kernels = None;
        self.tracker = None;
        self.reset_requested = false;
        tracing::info!("released render resources");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fractal::MAX_SCROLL_SENSITIVITY;
    use crate::fractal::testing::{Call, RecordingBackend};
    use spirv_std::glam::vec2;

    fn frame(width: u32, height: u32) -> FrameInput {
        FrameInput {
            width,
            height,
            ..Default::default()
        }
    }

    fn started(config: ViewerConfig) -> (FractalDriver<RecordingBackend>, RecordingBackend) {
        let mut backend = RecordingBackend::default();
        let mut driver = FractalDriver::new(config);
        driver.initialize(&mut backend).unwrap();
        (driver, backend)
    }

    const RENDER_ORDER: [&str; 3] = ["Clear", "CalculateEscapeTime", "ColourByEscapeTime"];

    #[test]
    fn first_frame_allocates_renders_and_blits() {
        let (mut driver, mut backend) = started(ViewerConfig::default());

        let output = driver.step(&mut backend, &frame(800, 600));
        assert!(output.resized && output.rendered);
        let view = output.view.unwrap();
        assert!((view.scale - 0.005).abs() < 1e-7);
        assert_eq!(view.lower_left, vec2(-2.5, -1.5));

        let calls = backend.take_calls();
        assert_eq!(RecordingBackend::dispatched(&calls), RENDER_ORDER);
        assert!(calls.contains(&Call::Dispatch("Clear", 100, 75, 1)));
        assert!(calls.contains(&Call::SetFloat(ShaderParam::Scale, view.scale)));
        assert!(calls.contains(&Call::SetVector(ShaderParam::LowerLeft, view.lower_left)));
        assert!(calls.contains(&Call::SetInt(ShaderParam::MaxIterations, 10)));
        assert!(calls.contains(&Call::SetInt(ShaderParam::ColorLevels, 100)));
        assert_eq!(calls.last(), Some(&Call::Blit(1)));
    }

    #[test]
    fn parameters_are_uploaded_before_dispatch() {
        let (mut driver, mut backend) = started(ViewerConfig::default());
        driver.step(&mut backend, &frame(64, 64));

        let calls = backend.take_calls();
        let first_dispatch = calls
            .iter()
            .position(|call| matches!(call, Call::Dispatch(..)))
            .unwrap();
        let last_upload = calls
            .iter()
            .rposition(|call| {
                matches!(
                    call,
                    Call::SetFloat(..) | Call::SetVector(..) | Call::SetInt(..) | Call::WriteColors { .. }
                )
            })
            .unwrap();
        assert!(last_upload < first_dispatch);
    }

    #[test]
    fn idle_frames_only_blit() {
        let (mut driver, mut backend) = started(ViewerConfig::default());
        driver.step(&mut backend, &frame(320, 240));
        backend.take_calls();

        for _ in 0..3 {
            let output = driver.step(&mut backend, &frame(320, 240));
            assert!(!output.rendered && !output.resized);
            assert_eq!(backend.take_calls(), [Call::Blit(1)]);
        }
    }

    #[test]
    fn every_rerender_keeps_dispatch_order() {
        let (mut driver, mut backend) = started(ViewerConfig::default());
        driver.step(&mut backend, &frame(320, 240));

        let scrolls = [1.0, 0.0, -1.0, 2.0];
        for (i, scroll_delta) in scrolls.into_iter().enumerate() {
            let input = FrameInput {
                scroll_delta,
                pointer: PointerState {
                    position: vec2(10.0 * i as f32, 5.0),
                    ..Default::default()
                },
                ..frame(320, 240)
            };
            backend.take_calls();
            let output = driver.step(&mut backend, &input);
            let dispatched = RecordingBackend::dispatched(&backend.calls);
            if scroll_delta == 0.0 {
                assert!(!output.rendered);
                assert!(dispatched.is_empty());
            } else {
                assert!(output.rendered);
                assert_eq!(dispatched, RENDER_ORDER);
            }
        }
    }

    #[test]
    fn drag_pans_and_rerenders() {
        let (mut driver, mut backend) = started(ViewerConfig::default());
        driver.step(&mut backend, &frame(800, 600));
        let start = driver.view().unwrap();

        let press = FrameInput {
            pointer: PointerState {
                down: true,
                just_pressed: true,
                position: vec2(100.0, 100.0),
            },
            ..frame(800, 600)
        };
        assert!(!driver.step(&mut backend, &press).rendered);

        let drag = FrameInput {
            pointer: PointerState {
                down: true,
                just_pressed: false,
                position: vec2(110.0, 115.0),
            },
            ..frame(800, 600)
        };
        let output = driver.step(&mut backend, &drag);
        assert!(output.rendered);
        let moved = output.view.unwrap();
        assert_eq!(moved.scale, start.scale);
        let expected = start.lower_left - vec2(10.0, 15.0) * start.scale;
        assert!((moved.lower_left - expected).abs().max_element() < 1e-6);
    }

    #[test]
    fn resize_reallocates_and_rerenders() {
        let (mut driver, mut backend) = started(ViewerConfig::default());
        driver.step(&mut backend, &frame(320, 240));
        backend.take_calls();

        let output = driver.step(&mut backend, &frame(640, 480));
        assert!(output.resized && output.rendered);

        let calls = backend.take_calls();
        assert!(calls.contains(&Call::ReleaseTexture(1)));
        assert!(calls.contains(&Call::ReleaseBuffer(2)));
        assert!(calls.contains(&Call::Dispatch("Clear", 80, 60, 1)));
        assert_eq!(RecordingBackend::dispatched(&calls), RENDER_ORDER);
        // The view is kept across resizes.
        assert!((output.view.unwrap().scale - 3.0 / 240.0).abs() < 1e-7);
    }

    #[test]
    fn color_table_is_reallocated_only_when_its_length_changes() {
        let (mut driver, mut backend) = started(ViewerConfig::default());
        driver.step(&mut backend, &frame(16, 16));
        let calls = backend.take_calls();
        let color_buffer = calls
            .iter()
            .find_map(|call| match call {
                Call::CreateColorBuffer { id, len } => Some((*id, *len)),
                _ => None,
            })
            .unwrap();
        assert_eq!(color_buffer.1, ViewerConfig::default().colors.len());
        assert!(calls.contains(&Call::SetBuffer(
            "ColourByEscapeTime",
            ShaderParam::Colors,
            color_buffer.0
        )));

        let mut config = driver.config().clone();
        config.colors[0] = [1.0, 0.0, 0.0, 1.0];
        driver.set_config(&config);
        assert!(driver.step(&mut backend, &frame(16, 16)).rendered);
        let calls = backend.take_calls();
        assert!(!calls
            .iter()
            .any(|call| matches!(call, Call::CreateColorBuffer { .. } | Call::ReleaseBuffer(_))));
        let written = calls
            .iter()
            .find_map(|call| match call {
                Call::WriteColors { id, colors } => Some((*id, colors.clone())),
                _ => None,
            })
            .unwrap();
        assert_eq!(written.0, color_buffer.0);
        assert_eq!(written.1[0], Rgba::from([1.0, 0.0, 0.0, 1.0]));

        config.colors.push([0.5, 0.5, 0.5, 1.0]);
        driver.set_config(&config);
        driver.step(&mut backend, &frame(16, 16));
        let calls = backend.take_calls();
        let released = calls
            .iter()
            .position(|call| *call == Call::ReleaseBuffer(color_buffer.0))
            .unwrap();
        let created = calls
            .iter()
            .position(|call| matches!(call, Call::CreateColorBuffer { len, .. } if *len == config.colors.len()))
            .unwrap();
        assert!(released < created);
    }

    #[test]
    fn unchanged_config_does_not_rerender() {
        let (mut driver, mut backend) = started(ViewerConfig::default());
        driver.step(&mut backend, &frame(16, 16));

        driver.set_config(&ViewerConfig::default());
        assert!(!driver.step(&mut backend, &frame(16, 16)).rendered);

        let config = ViewerConfig {
            max_iterations: 50,
            ..Default::default()
        };
        driver.set_config(&config);
        backend.take_calls();
        assert!(driver.step(&mut backend, &frame(16, 16)).rendered);
        assert!(backend
            .calls
            .contains(&Call::SetInt(ShaderParam::MaxIterations, 50)));
    }

    #[test]
    fn empty_color_table_colours_by_grayscale() {
        let config = ViewerConfig {
            colors: Vec::new(),
            ..Default::default()
        };
        let (mut driver, mut backend) = started(config);
        driver.step(&mut backend, &frame(16, 16));

        let calls = backend.take_calls();
        assert_eq!(
            RecordingBackend::dispatched(&calls),
            ["Clear", "CalculateEscapeTime", "ColourByGrayscale"]
        );
        assert!(!calls
            .iter()
            .any(|call| matches!(call, Call::CreateColorBuffer { .. } | Call::WriteColors { .. })));
    }

    #[test]
    fn emptying_the_color_table_releases_its_buffer() {
        let (mut driver, mut backend) = started(ViewerConfig::default());
        driver.step(&mut backend, &frame(16, 16));
        let color_buffer = backend
            .take_calls()
            .iter()
            .find_map(|call| match call {
                Call::CreateColorBuffer { id, .. } => Some(*id),
                _ => None,
            })
            .unwrap();

        let config = ViewerConfig {
            colors: Vec::new(),
            ..Default::default()
        };
        driver.set_config(&config);
        driver.step(&mut backend, &frame(16, 16));
        assert!(backend.calls.contains(&Call::ReleaseBuffer(color_buffer)));
    }

    #[test]
    fn zero_sized_frames_are_skipped() {
        let (mut driver, mut backend) = started(ViewerConfig::default());

        assert_eq!(driver.step(&mut backend, &frame(0, 600)), FrameOutput::default());
        assert_eq!(driver.step(&mut backend, &frame(800, 0)), FrameOutput::default());
        assert!(backend.calls.is_empty());
        assert!(driver.view().is_none());

        assert!(driver.step(&mut backend, &frame(800, 600)).rendered);
    }

    #[test]
    fn missing_kernel_fails_startup() {
        let mut backend = RecordingBackend {
            missing: vec!["ColourByGrayscale"],
            ..Default::default()
        };
        let mut driver = FractalDriver::new(ViewerConfig::default());

        let err = driver.initialize(&mut backend).unwrap_err();
        assert!(matches!(err, StartupError::MissingKernel("ColourByGrayscale")));

        // A driver that never started does nothing.
        assert_eq!(driver.step(&mut backend, &frame(800, 600)), FrameOutput::default());
        assert!(backend.calls.is_empty());
    }

    #[test]
    fn shutdown_releases_everything_once() {
        let (mut driver, mut backend) = started(ViewerConfig::default());
        driver.step(&mut backend, &frame(16, 16));
        backend.take_calls();

        driver.shutdown(&mut backend);
        let calls = backend.take_calls();
        assert_eq!(
            calls,
            [
                Call::ReleaseTexture(1),
                Call::ReleaseBuffer(2),
                Call::ReleaseBuffer(3)
            ]
        );

        assert_eq!(driver.step(&mut backend, &frame(16, 16)), FrameOutput::default());
        driver.shutdown(&mut backend);
        assert!(backend.calls.is_empty());
    }

    #[test]
    fn reset_view_restores_the_initial_view() {
        let (mut driver, mut backend) = started(ViewerConfig::default());
        driver.step(&mut backend, &frame(800, 600));
        let scroll = FrameInput {
            scroll_delta: 3.0,
            ..frame(800, 600)
        };
        driver.step(&mut backend, &scroll);
        assert_ne!(driver.view(), Some(ViewState::initial(800, 600)));

        driver.reset_view();
        let output = driver.step(&mut backend, &frame(800, 600));
        assert!(output.rendered);
        assert_eq!(output.view, Some(ViewState::initial(800, 600)));
    }

    #[test]
    fn reset_during_a_drag_does_not_jump() {
        let (mut driver, mut backend) = started(ViewerConfig::default());
        driver.step(&mut backend, &frame(800, 600));
        let held = |just_pressed| FrameInput {
            pointer: PointerState {
                down: true,
                just_pressed,
                position: vec2(400.0, 300.0),
            },
            ..frame(800, 600)
        };
        driver.step(&mut backend, &held(true));

        driver.reset_view();
        let output = driver.step(&mut backend, &held(false));
        assert!(output.rendered);
        assert_eq!(output.view, Some(ViewState::initial(800, 600)));
    }

    #[test]
    fn oversized_scroll_sensitivity_is_clamped() {
        let config = ViewerConfig {
            scroll_sensitivity: 5.0,
            ..Default::default()
        };
        let (mut driver, mut backend) = started(config.clone());
        assert_eq!(driver.config().scroll_sensitivity, MAX_SCROLL_SENSITIVITY);
        driver.step(&mut backend, &frame(800, 600));

        let zoom_out = FrameInput {
            scroll_delta: -3.0,
            ..frame(800, 600)
        };
        let view = driver.step(&mut backend, &zoom_out).view.unwrap();
        assert!(view.scale > 0.0, "scale went to {}", view.scale);

        // Handing the same out-of-range config back is not a change.
        driver.set_config(&config);
        assert!(!driver.step(&mut backend, &frame(800, 600)).rendered);
    }
}
