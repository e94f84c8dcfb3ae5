use std::env;
use std::fs;
use std::path::{Path, PathBuf};

/// Files copied from the workspace root next to the built binary, where the
/// config loader and a `path` export source look for them.
const SHIPPED_FILES: &[&str] = &["config.toml", "data/inventory_export.csv"];

fn main() {
    let workspace_root = Path::new(env!("CARGO_MANIFEST_DIR"))
        .parent()
        .and_then(|p| p.parent())
        .expect("Could not find workspace root");

    // OUT_DIR is typically target/<profile>/build/backend-xxx/out
    let out_dir = PathBuf::from(env::var("OUT_DIR").expect("OUT_DIR is set by cargo"));
    let profile = env::var("PROFILE").expect("PROFILE is set by cargo");
    let target_dir = out_dir
        .ancestors()
        .find(|p| p.ends_with(&profile))
        .expect("Could not find target profile directory");

    for file in SHIPPED_FILES {
        let source = workspace_root.join(file);
        println!("cargo:rerun-if-changed={}", source.display());

        if !source.exists() {
            println!("cargo:warning={} not found, skipping", source.display());
            continue;
        }

        let dest = target_dir.join(file);
        if let Some(parent) = dest.parent() {
            fs::create_dir_all(parent)
                .unwrap_or_else(|e| panic!("Failed to create {}: {}", parent.display(), e));
        }
        fs::copy(&source, &dest)
            .unwrap_or_else(|e| panic!("Failed to copy {}: {}", source.display(), e));
    }
}
