use anyhow::{Context, Result};
use fs_extra::{copy_items, dir::CopyOptions};
use std::{env, path::PathBuf};

/// Bundles `assets/` (the avatar model and friends) into `OUT_DIR` so a
/// binary started from another directory still finds them.
fn main() -> Result<()> {
    println!("cargo:rerun-if-changed=assets");

    let out_dir = PathBuf::from(env::var("OUT_DIR")?);
    let manifest_dir = PathBuf::from(env::var("CARGO_MANIFEST_DIR")?);
    let assets = manifest_dir.join("assets");
    if assets.exists() {
        let mut options = CopyOptions::new();
        options.overwrite = true;
        copy_items(&[&assets], &out_dir, &options)
            .with_context(|| format!("copying {} into {}", assets.display(), out_dir.display()))?;
    }
    println!(
        "cargo:rustc-env=FLOW_AVATAR_BUNDLED_ASSETS={}",
        out_dir.join("assets").display()
    );
    Ok(())
}
