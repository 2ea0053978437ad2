//! Reading device documents from JSON or TOML, and discovering them on disk.
//!
//! Device documents are stored as `<name>.device.json` or `<name>.device.toml`.
//! Both formats are read into a `serde_json::Value` with key order preserved,
//! since definition order decides which mask definition wins.

use std::path::{Path, PathBuf};

use serde_json::Value;

use crate::device::{BuildOptions, DeviceModel};
use crate::error::LoadError;

const DEVICE_SUFFIXES: &[&str] = &[".device.json", ".device.toml"];

/// Result type for loading operations.
pub type LoadResult<T> = std::result::Result<T, LoadError>;

/// Parse a JSON device document.
pub fn parse_device_json(json_str: &str) -> LoadResult<Value> {
    Ok(serde_json::from_str(json_str)?)
}

/// Parse a TOML device document.
pub fn parse_device_toml(toml_str: &str) -> LoadResult<Value> {
    Ok(toml::from_str(toml_str)?)
}

/// Read a device document, choosing the format from the file extension.
pub fn load_document(path: &Path) -> LoadResult<Value> {
    if !path.exists() {
        return Err(LoadError::NotFound {
            path: path.to_path_buf(),
        });
    }
    let content = std::fs::read_to_string(path)?;
    match path.extension().and_then(|ext| ext.to_str()) {
        Some("json") => parse_device_json(&content),
        Some("toml") => parse_device_toml(&content),
        _ => Err(LoadError::UnsupportedFormat {
            path: path.to_path_buf(),
        }),
    }
}

/// Read and build a device model in one step.
pub fn load_device(path: &Path, options: &BuildOptions) -> LoadResult<DeviceModel> {
    let document = load_document(path)?;
    log::debug!("loaded device document {}", path.display());
    Ok(DeviceModel::build(&document, options)?)
}

/// Discover all device documents directly inside `dir`.
///
/// Returns `(device_name, file_path)` pairs sorted by name.
pub fn discover_devices(dir: &Path) -> LoadResult<Vec<(String, PathBuf)>> {
    if !dir.is_dir() {
        return Ok(Vec::new());
    }

    let mut devices = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        let Some(file_name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        if let Some(name) = DEVICE_SUFFIXES
            .iter()
            .find_map(|suffix| file_name.strip_suffix(suffix))
        {
            devices.push((name.to_string(), path.clone()));
        }
    }
    devices.sort_by(|a, b| a.0.cmp(&b.0));
    Ok(devices)
}
