//! `reflex list`: device documents known to the project.

use std::path::Path;

use anyhow::Result;

use crate::manifest::ReflexManifest;

pub fn run(project_dir: &Path, manifest: &ReflexManifest) -> Result<()> {
    let files = manifest.device_files(project_dir)?;
    if files.is_empty() {
        println!(
            "No device documents in {}.",
            project_dir.join(&manifest.device.dir).display()
        );
        return Ok(());
    }

    println!("Device documents:");
    println!();
    for (name, path) in files {
        let shown = path.strip_prefix(project_dir).unwrap_or(&path);
        println!("  {name:<25} {}", shown.display());
    }
    Ok(())
}
