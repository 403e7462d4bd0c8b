use std::path::PathBuf;

/// Conditions that keep the viewer from starting. None of them is retried: the viewer stays
/// disabled for the rest of the session.
#[derive(thiserror::Error, Debug)]
pub enum StartupError {
    #[error("the viewer needs the wgpu renderer")]
    NoRenderState,

    #[error("no compute program: pass a SPIR-V file as the first argument or set MANDELBROT_SPIRV")]
    MissingComputeProgram,

    #[error("failed to read compute program {}: {source}", path.display())]
    ProgramLoad {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to build compute program: {0}")]
    ProgramBuild(String),

    #[error("compute program has no usable kernel named {0:?}")]
    MissingKernel(&'static str),
}
