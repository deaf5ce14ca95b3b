// Build script for Vulkan shader compilation
//
// Compiles the GLSL sources under ../shaders into SPIR-V with glslc when it
// is available. Missing glslc is not an error: the binaries may already be
// present, and library builds and tests do not need them.

use std::path::{Path, PathBuf};
use std::process::Command;

fn main() {
    let manifest_dir = PathBuf::from(std::env::var("CARGO_MANIFEST_DIR").unwrap());
    let shader_dir = manifest_dir.join("../shaders");
    let out_dir = shader_dir.join("spv");

    println!("cargo:rerun-if-changed=../shaders");

    if !shader_dir.is_dir() {
        return;
    }

    if Command::new("glslc").arg("--version").output().is_err() {
        println!("cargo:warning=glslc not found; skipping shader compilation");
        return;
    }

    if let Err(e) = std::fs::create_dir_all(&out_dir) {
        println!("cargo:warning=could not create {:?}: {}", out_dir, e);
        return;
    }

    let entries = match std::fs::read_dir(&shader_dir) {
        Ok(entries) => entries,
        Err(e) => {
            println!("cargo:warning=could not read {:?}: {}", shader_dir, e);
            return;
        }
    };

    for entry in entries.flatten() {
        let path = entry.path();
        let Some(ext) = path.extension().and_then(|e| e.to_str()) else {
            continue;
        };
        if ext != "vert" && ext != "frag" {
            continue;
        }

        let out_file = out_dir.join(format!(
            "{}.spv",
            path.file_name().unwrap().to_string_lossy()
        ));

        if !needs_compile(&path, &out_file) {
            continue;
        }

        let status = Command::new("glslc").arg(&path).arg("-o").arg(&out_file).status();
        match status {
            Ok(status) if status.success() => {}
            Ok(status) => panic!("glslc failed for {:?} with exit code {:?}", path, status.code()),
            Err(e) => panic!("failed to run glslc for {:?}: {}", path, e),
        }
    }
}

fn needs_compile(source: &Path, output: &Path) -> bool {
    match (std::fs::metadata(source), std::fs::metadata(output)) {
        (Ok(src), Ok(dst)) => match (src.modified(), dst.modified()) {
            (Ok(src_time), Ok(dst_time)) => src_time > dst_time,
            _ => true,
        },
        _ => true,
    }
}
