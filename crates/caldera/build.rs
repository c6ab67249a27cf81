// Build script for Vulkan shader compilation

use std::env;
use std::path::{Path, PathBuf};
use std::process::Command;

fn main() {
    println!("cargo:rerun-if-changed=resources/shaders");
    println!("cargo:rerun-if-env-changed=VULKAN_SDK");

    // Allow skipping shader compilation with an env var
    if env::var("SKIP_SHADERS").is_ok() {
        eprintln!("info: skipping shader compilation (SKIP_SHADERS set)");
        return;
    }

    // Check for Vulkan SDK
    let vulkan_sdk = match env::var("VULKAN_SDK") {
        Ok(sdk) => sdk,
        Err(_) => {
            eprintln!("warning: VULKAN_SDK not set, shader compilation skipped");
            eprintln!("hint: install the Vulkan SDK and set VULKAN_SDK to compile shaders");
            return;
        }
    };

    let glslc = if cfg!(target_os = "windows") {
        format!("{}\\Bin\\glslc.exe", vulkan_sdk)
    } else {
        format!("{}/bin/glslc", vulkan_sdk)
    };
    if !Path::new(&glslc).exists() {
        eprintln!("error: glslc not found at: {}", glslc);
        panic!("shader compiler not found");
    }

    let shader_dir = PathBuf::from("resources/shaders");
    let target_dir = PathBuf::from("shaders");
    if let Err(e) = std::fs::create_dir_all(&target_dir) {
        eprintln!("warning: failed to create {:?}: {}", target_dir, e);
        return;
    }

    let entries = match std::fs::read_dir(&shader_dir) {
        Ok(entries) => entries,
        Err(_) => {
            eprintln!("info: no shader directory at {:?}", shader_dir);
            return;
        }
    };

    let mut compiled = 0;
    for entry in entries.flatten() {
        let path = entry.path();
        let Some(ext) = path.extension() else {
            continue;
        };
        if ext != "vert" && ext != "frag" && ext != "comp" {
            continue;
        }

        // shadow.vert compiles to shadow.vert.spv so a vert/frag pair never
        // collides on the output name.
        let file_name = match path.file_name().and_then(|name| name.to_str()) {
            Some(name) => name,
            None => continue,
        };
        let out_file = target_dir.join(format!("{}.spv", file_name));

        let up_to_date = match (std::fs::metadata(&path), std::fs::metadata(&out_file)) {
            (Ok(src), Ok(dst)) => match (src.modified(), dst.modified()) {
                (Ok(src_time), Ok(dst_time)) => src_time <= dst_time,
                _ => false,
            },
            _ => false,
        };
        if up_to_date {
            continue;
        }

        let status = Command::new(&glslc).arg(&path).arg("-o").arg(&out_file).status();
        match status {
            Ok(s) if s.success() => {
                eprintln!("info: compiled {:?}", out_file.file_name().unwrap_or_default());
                compiled += 1;
            }
            Ok(s) => {
                eprintln!("error: glslc failed for {:?} (exit {})", path, s.code().unwrap_or(-1));
                panic!("shader compilation failed");
            }
            Err(e) => {
                eprintln!("error: could not run glslc for {:?}: {}", path, e);
                panic!("failed to execute shader compiler");
            }
        }
    }

    if compiled > 0 {
        eprintln!("info: compiled {} shader(s)", compiled);
    }
}
