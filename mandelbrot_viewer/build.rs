use std::env;
use std::error::Error;

fn main() -> Result<(), Box<dyn Error>> {
    // Read by `spirv-builder` when the shader crate is built at startup.
    println!("cargo:rustc-env=PROFILE={}", env::var("PROFILE")?);
    Ok(())
}
