mod fractal_view;
mod settings;

pub use fractal_view::FractalView;
pub use settings::settings_ui;
