use crate::fractal::{ViewerConfig, MAX_SCROLL_SENSITIVITY};

/// Edits `config` in place. The frame driver picks up any change on its next step.
pub fn settings_ui(ui: &mut egui::Ui, config: &mut ViewerConfig) {
    egui::Grid::new("viewer_settings")
        .num_columns(2)
        .spacing([12.0, 6.0])
        .show(ui, |ui| {
            ui.label("Max iterations");
            ui.add(egui::DragValue::new(&mut config.max_iterations).clamp_range(1..=100_000));
            ui.end_row();

            ui.label("Scroll sensitivity");
            ui.add(egui::Slider::new(
                &mut config.scroll_sensitivity,
                0.01..=MAX_SCROLL_SENSITIVITY,
            ));
            ui.end_row();

            ui.label("Colour levels");
            ui.add(egui::DragValue::new(&mut config.color_levels).clamp_range(1..=10_000));
            ui.end_row();
        });

    ui.separator();
    ui.label("Colour table");

    let mut remove = None;
    for (index, color) in config.colors.iter_mut().enumerate() {
        ui.horizontal(|ui| {
            ui.color_edit_button_rgba_unmultiplied(color);
            if ui.small_button("🗑").on_hover_text("Remove").clicked() {
                remove = Some(index);
            }
        });
    }
    if let Some(index) = remove {
        config.colors.remove(index);
    }
    if config.colors.is_empty() {
        ui.weak("Empty: colouring by grayscale");
    }

    ui.horizontal(|ui| {
        if ui.button("➕ Add").clicked() {
            let color = config.colors.last().copied().unwrap_or([1.0; 4]);
            config.colors.push(color);
        }
        if ui.button("Grayscale").clicked() {
            config.colors.clear();
        }
    });

    ui.separator();
    if ui.button("Restore defaults").clicked() {
        *config = ViewerConfig::default();
    }
}
