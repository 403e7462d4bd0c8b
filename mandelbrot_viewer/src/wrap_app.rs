use crate::fractal::ViewerConfig;
use crate::gpu::ProgramSource;

/// The state that we persist (serialize).
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct State {
    config: ViewerConfig,
    show_settings: bool,
}

impl Default for State {
    fn default() -> Self {
        Self {
            config: ViewerConfig::default(),
            show_settings: true,
        }
    }
}

/// Top bar, settings panel and the fractal canvas.
pub struct WrapApp {
    state: State,

    fractal: crate::apps::FractalView,

    frame_history: crate::frame_history::FrameHistory,
}

impl WrapApp {
    pub fn new(cc: &eframe::CreationContext<'_>, program: Option<ProgramSource>) -> Self {
        #[allow(unused_mut)]
        let mut state = State::default();

        #[cfg(feature = "persistence")]
        if let Some(storage) = cc.storage {
            if let Some(stored) = eframe::get_value::<State>(storage, eframe::APP_KEY) {
                state = State {
                    config: stored.config.clamped(),
                    ..stored
                };
            }
        }

        Self {
            fractal: crate::apps::FractalView::new(cc, &state.config, program.as_ref()),
            state,
            frame_history: Default::default(),
        }
    }
}

impl eframe::App for WrapApp {
    #[cfg(feature = "persistence")]
    fn save(&mut self, storage: &mut dyn eframe::Storage) {
        eframe::set_value(storage, eframe::APP_KEY, &self.state);
    }

    fn on_exit(&mut self) {
        self.fractal.shutdown();
    }

    fn clear_color(&self, visuals: &egui::Visuals) -> [f32; 4] {
        visuals.panel_fill.to_normalized_gamma_f32()
    }

    fn update(&mut self, ctx: &egui::Context, frame: &mut eframe::Frame) {
        self.frame_history
            .on_new_frame(ctx.input(|i| i.time), frame.info().cpu_usage);

        #[cfg(not(target_arch = "wasm32"))]
        if ctx.input_mut(|i| i.consume_key(egui::Modifiers::NONE, egui::Key::F11)) {
            frame.set_fullscreen(!frame.info().window_info.fullscreen);
        }

        egui::TopBottomPanel::top("wrap_app_top_bar").show(ctx, |ui| {
            egui::trace!(ui);
            ui.horizontal_wrapped(|ui| {
                ui.visuals_mut().button_frame = false;
                self.bar_contents(ui);
            });
        });

        if self.state.show_settings {
            egui::SidePanel::right("settings")
                .resizable(false)
                .show(ctx, |ui| crate::apps::settings_ui(ui, &mut self.state.config));
        }

        egui::CentralPanel::default()
            .frame(egui::Frame::none())
            .show(ctx, |ui| self.fractal.ui(ui, &self.state.config));

        ctx.request_repaint();

        egui::gui_zoom::zoom_with_keyboard_shortcuts(ctx, frame.info().native_pixels_per_point);
    }
}

impl WrapApp {
    fn bar_contents(&mut self, ui: &mut egui::Ui) {
        if ui
            .selectable_label(self.state.show_settings, "⚙ Settings")
            .clicked()
        {
            self.state.show_settings = !self.state.show_settings;
        }
        if ui.button("⟲ Reset view").clicked() {
            self.fractal.reset_view();
        }

        ui.separator();

        if let Some(err) = self.fractal.startup_error() {
            ui.colored_label(ui.visuals().error_fg_color, err.to_string());
        } else if let Some(view) = self.fractal.view() {
            ui.label(format!(
                "scale {:.3e}  lower left ({:.6}, {:.6})",
                view.scale, view.lower_left.x, view.lower_left.y
            ));
        }

        ui.separator();

        ui.label(format!("FPS: {:.1}", self.frame_history.fps()));
    }
}
