//! CLI command implementations.

pub mod check;
pub mod inspect;
pub mod list;
pub mod xref;

use std::path::Path;

use anyhow::{Context, Result};
use reflex_schema::{load_device, DeviceModel};

use crate::manifest::ReflexManifest;

/// Resolve the input document and build its model with the manifest's options.
pub fn load_model(
    project_dir: &Path,
    manifest: &ReflexManifest,
    input: Option<&str>,
) -> Result<DeviceModel> {
    let path = manifest.resolve_input(project_dir, input)?;
    load_device(&path, &manifest.build.options())
        .with_context(|| format!("building {}", path.display()))
}
