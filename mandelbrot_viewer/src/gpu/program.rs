use std::borrow::Cow;
use std::path::{Path, PathBuf};

use eframe::egui_wgpu::wgpu;

use crate::fractal::StartupError;

/// Names a prebuilt SPIR-V compute program when no command line argument does.
pub const PROGRAM_ENV_VAR: &str = "MANDELBROT_SPIRV";

const SPIRV_MAGIC: u32 = 0x0723_0203;
const SPIRV_HEADER_BYTES: usize = 20;

/// Where the compute program comes from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ProgramSource {
    /// A SPIR-V module on disk.
    File(PathBuf),
    /// The `shaders/mandelbrot` crate, built with `spirv-builder` at startup.
    #[cfg(feature = "rust-gpu")]
    ShaderCrate,
}

impl ProgramSource {
    /// First command line argument, then [`PROGRAM_ENV_VAR`]. Builds the shader crate when
    /// neither is set and the `rust-gpu` feature is on.
    pub fn from_env() -> Option<Self> {
        let path = std::env::args_os()
            .nth(1)
            .or_else(|| std::env::var_os(PROGRAM_ENV_VAR))
            .map(PathBuf::from);
        match path {
            Some(path) => Some(Self::File(path)),
            #[cfg(feature = "rust-gpu")]
            None => Some(Self::ShaderCrate),
            #[cfg(not(feature = "rust-gpu"))]
            None => None,
        }
    }
}

/// A loaded SPIR-V module. Its entry points are only checked when the device builds pipelines
/// from it.
pub struct ComputeProgram {
    pub label: String,
    pub spirv: Cow<'static, [u32]>,
}

impl ComputeProgram {
    pub fn load(source: Option<&ProgramSource>) -> Result<Self, StartupError> {
        let path = match source {
            Some(ProgramSource::File(path)) => path.clone(),
            #[cfg(feature = "rust-gpu")]
            Some(ProgramSource::ShaderCrate) => build_shader_crate()?,
            None => return Err(StartupError::MissingComputeProgram),
        };
        let program = Self::read(&path)?;
        tracing::info!(
            "loaded compute program {} ({} words)",
            program.label,
            program.spirv.len()
        );
        Ok(program)
    }

    pub fn read(path: &Path) -> Result<Self, StartupError> {
        let load_error = |source| StartupError::ProgramLoad {
            path: path.to_owned(),
            source,
        };
        let data = std::fs::read(path).map_err(load_error)?;
        if !is_spirv(&data) {
            return Err(load_error(std::io::Error::new(
                std::io::ErrorKind::InvalidData,
                "not a SPIR-V module",
            )));
        }
        // make_spirv_raw asserts on the header, so only hand it data that passed is_spirv.
        Ok(Self {
            label: path.display().to_string(),
            spirv: Cow::Owned(wgpu::util::make_spirv_raw(&data).into_owned()),
        })
    }

    pub fn shader_module_descriptor(&self) -> wgpu::ShaderModuleDescriptor<'_> {
        wgpu::ShaderModuleDescriptor {
            label: Some(&self.label),
            source: wgpu::ShaderSource::SpirV(Cow::Borrowed(&*self.spirv)),
        }
    }
}

fn is_spirv(data: &[u8]) -> bool {
    data.len() % 4 == 0
        && data.len() >= SPIRV_HEADER_BYTES
        && u32::from_le_bytes([data[0], data[1], data[2], data[3]]) == SPIRV_MAGIC
}

#[cfg(all(
    feature = "rust-gpu",
    not(any(target_os = "android", target_arch = "wasm32"))
))]
fn build_shader_crate() -> Result<PathBuf, StartupError> {
    use spirv_builder::{MetadataPrintout, ModuleResult, SpirvBuilder};

    // Hack: spirv_builder builds into a custom directory if running under cargo, to not
    // deadlock, and the default target directory if not. Pretend we're running under cargo so
    // the shader crate graph is not rebuilt on every start.
    std::env::set_var("OUT_DIR", env!("OUT_DIR"));
    std::env::set_var("PROFILE", env!("PROFILE"));
    let crate_path = [env!("CARGO_MANIFEST_DIR"), "..", "shaders", "mandelbrot"]
        .iter()
        .copied()
        .collect::<PathBuf>();

    let result = SpirvBuilder::new(crate_path, "spirv-unknown-vulkan1.1")
        .print_metadata(MetadataPrintout::None)
        .shader_panic_strategy(spirv_builder::ShaderPanicStrategy::SilentExit)
        .build()
        .map_err(|err| StartupError::ProgramBuild(err.to_string()))?;
    match result.module {
        ModuleResult::SingleModule(path) => Ok(path),
        ModuleResult::MultiModule(_) => Err(StartupError::ProgramBuild(
            "expected a single SPIR-V module".to_owned(),
        )),
    }
}

#[cfg(all(feature = "rust-gpu", any(target_os = "android", target_arch = "wasm32")))]
fn build_shader_crate() -> Result<PathBuf, StartupError> {
    Err(StartupError::MissingComputeProgram)
}
