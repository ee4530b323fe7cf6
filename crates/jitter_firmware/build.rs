/// Build script for the jitter_firmware crate.
///
/// Passes the linker script that places the entry section at the start of
/// RAM and reserves the boot stack, and registers the assembly entry file so
/// edits to it trigger a rebuild.
use std::env;
use std::path::PathBuf;

fn main() {
    let manifest_dir = PathBuf::from(env::var("CARGO_MANIFEST_DIR").unwrap());
    let script = manifest_dir.join("link.ld");

    println!("cargo:rustc-link-arg-bins=-T{}", script.display());
    println!("cargo:rerun-if-changed={}", script.display());
    println!("cargo:rerun-if-changed=src/entry.S");
}
