//! Build script to generate the scene manifest
//!
//! Scans assets/scenes/ and lists every scene name (file stem of each .ron
//! file), sorted, one per line. The list backs the default number key
//! bindings, since WASM can't enumerate directories at runtime. Scene files
//! carry a numeric prefix so the sort puts them on their number key.

use std::env;
use std::fs;
use std::io::Write;
use std::path::Path;

fn main() {
    println!("cargo:rerun-if-changed=assets/scenes");

    let scenes_dir = Path::new("assets/scenes");
    let out_dir = env::var("OUT_DIR").unwrap();
    let manifest_path = Path::new(&out_dir).join("scene_manifest.txt");

    let mut scenes: Vec<String> = Vec::new();

    if scenes_dir.exists() {
        scenes = fs::read_dir(scenes_dir)
            .unwrap()
            .filter_map(|e| e.ok())
            .map(|e| e.path())
            .filter(|p| {
                p.extension()
                    .map(|ext| ext.to_ascii_lowercase() == "ron")
                    .unwrap_or(false)
            })
            .filter_map(|p| p.file_stem().map(|s| s.to_string_lossy().to_string()))
            .collect();
        scenes.sort();
    }

    let mut manifest = String::new();
    for scene in scenes {
        manifest.push_str(&format!("{}\n", scene));
    }

    let mut file = fs::File::create(manifest_path).unwrap();
    file.write_all(manifest.as_bytes()).unwrap();
}
