/// Largest zoom per scroll-wheel notch. Hosts feed at most three notches a frame, so the zoom
/// factor `1 - notches * sensitivity` stays positive.
pub const MAX_SCROLL_SENSITIVITY: f32 = 0.3;

/// Settings read by the frame driver. Edited from the settings panel and persisted with the
/// rest of the app state.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct ViewerConfig {
    pub max_iterations: u32,
    pub scroll_sensitivity: f32,
    /// Colour table, unmultiplied RGBA. Empty means grayscale.
    pub colors: Vec<[f32; 4]>,
    /// Escape times per trip through the colour table.
    pub color_levels: u32,
}

impl ViewerConfig {
    /// Pulls `scroll_sensitivity` into `0..=MAX_SCROLL_SENSITIVITY`. Stored settings are not
    /// trusted to respect the slider range.
    pub fn clamped(mut self) -> Self {
        self.scroll_sensitivity = if self.scroll_sensitivity.is_finite() {
            self.scroll_sensitivity.clamp(0.0, MAX_SCROLL_SENSITIVITY)
        } else {
            Self::default().scroll_sensitivity
        };
        self
    }
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            max_iterations: 10,
            scroll_sensitivity: 0.1,
            colors: default_palette(),
            color_levels: 100,
        }
    }
}

fn default_palette() -> Vec<[f32; 4]> {
    vec![
        [0.0, 0.03, 0.39, 1.0],
        [0.13, 0.42, 0.8, 1.0],
        [0.93, 1.0, 1.0, 1.0],
        [1.0, 0.67, 0.0, 1.0],
        [0.0, 0.01, 0.0, 1.0],
    ]
}
