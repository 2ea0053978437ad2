//! `reflex.toml` project manifest parsing.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use reflex_schema::{discover_devices, BuildOptions};
use serde::{Deserialize, Serialize};

pub const MANIFEST_FILE: &str = "reflex.toml";

/// Top-level `reflex.toml` manifest. Every section is optional.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReflexManifest {
    /// Project metadata.
    #[serde(default)]
    pub project: Option<ProjectSection>,
    /// Where device documents are found.
    #[serde(default)]
    pub device: DeviceSection,
    /// Model build switches.
    #[serde(default)]
    pub build: BuildSection,
}

/// `[project]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectSection {
    /// Project name.
    pub name: String,
    /// Short description.
    #[serde(default)]
    pub description: Option<String>,
}

/// `[device]` section: where device documents live.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeviceSection {
    /// Directory scanned for `*.device.json` / `*.device.toml`.
    #[serde(default = "default_device_dir")]
    pub dir: PathBuf,
    /// Explicit device documents, relative to the project directory.
    #[serde(default)]
    pub sources: Vec<PathBuf>,
}

impl Default for DeviceSection {
    fn default() -> Self {
        Self {
            dir: default_device_dir(),
            sources: Vec::new(),
        }
    }
}

fn default_device_dir() -> PathBuf {
    PathBuf::from("devices")
}

/// `[build]` section: model assembly switches.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct BuildSection {
    /// Infer the category of `masks` entries from their `bits`/`values` key.
    #[serde(default = "default_true")]
    pub infer_mask_category: bool,
    /// Let a later mask definition replace an earlier one of the same name.
    #[serde(default = "default_true")]
    pub allow_mask_redefinition: bool,
}

impl Default for BuildSection {
    fn default() -> Self {
        Self {
            infer_mask_category: true,
            allow_mask_redefinition: true,
        }
    }
}

fn default_true() -> bool {
    true
}

impl BuildSection {
    pub fn options(&self) -> BuildOptions {
        BuildOptions {
            infer_mask_category: self.infer_mask_category,
            allow_mask_redefinition: self.allow_mask_redefinition,
        }
    }
}

impl ReflexManifest {
    /// Search upward from `start_dir` for a `reflex.toml` file, parse and
    /// return it along with the directory it was found in.
    pub fn find_and_load(start_dir: &Path) -> Result<Option<(Self, PathBuf)>> {
        let mut dir = start_dir.to_path_buf();
        loop {
            let candidate = dir.join(MANIFEST_FILE);
            if candidate.is_file() {
                let manifest = Self::load(&candidate)?;
                return Ok(Some((manifest, dir)));
            }
            if !dir.pop() {
                break;
            }
        }
        Ok(None)
    }

    /// Parse the manifest at `path`.
    pub fn load(path: &Path) -> Result<Self> {
        let content =
            std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
        toml::from_str(&content).with_context(|| format!("parsing {}", path.display()))
    }

    /// Resolve the manifest and project directory for this invocation.
    ///
    /// An explicit `--config` path must exist; otherwise a missing manifest
    /// falls back to defaults rooted at `cwd`.
    pub fn resolve(cwd: &Path, config: Option<&Path>) -> Result<(Self, PathBuf)> {
        if let Some(path) = config {
            let manifest = Self::load(path)?;
            let dir = path
                .parent()
                .filter(|p| !p.as_os_str().is_empty())
                .map_or_else(|| cwd.to_path_buf(), Path::to_path_buf);
            return Ok((manifest, dir));
        }
        match Self::find_and_load(cwd)? {
            Some(found) => Ok(found),
            None => {
                log::debug!("no {MANIFEST_FILE} found, using defaults");
                Ok((Self::default(), cwd.to_path_buf()))
            }
        }
    }

    pub fn project_name(&self) -> Option<&str> {
        self.project.as_ref().map(|p| p.name.as_str())
    }

    /// Every device document known to the project: explicit sources first,
    /// then those discovered in the device directory.
    pub fn device_files(&self, project_dir: &Path) -> Result<Vec<(String, PathBuf)>> {
        let mut files: Vec<(String, PathBuf)> = self
            .device
            .sources
            .iter()
            .map(|source| (device_name(source), project_dir.join(source)))
            .collect();

        let dir = project_dir.join(&self.device.dir);
        let discovered =
            discover_devices(&dir).with_context(|| format!("scanning {}", dir.display()))?;
        for (name, path) in discovered {
            if !files.iter().any(|(_, known)| *known == path) {
                files.push((name, path));
            }
        }
        Ok(files)
    }

    /// Pick the device document to operate on.
    ///
    /// An explicit path wins. Otherwise the project must know exactly one
    /// device, or name it first in `[device] sources`.
    pub fn resolve_input(&self, project_dir: &Path, input: Option<&str>) -> Result<PathBuf> {
        if let Some(path) = input {
            return Ok(PathBuf::from(path));
        }
        if let Some(first) = self.device.sources.first() {
            return Ok(project_dir.join(first));
        }
        let mut files = self.device_files(project_dir)?;
        match files.len() {
            0 => bail!(
                "no device documents found in {}; pass a file or set [device] sources in {MANIFEST_FILE}",
                project_dir.join(&self.device.dir).display()
            ),
            1 => Ok(files.remove(0).1),
            n => bail!("{n} device documents found; pass the one to use"),
        }
    }
}

fn device_name(path: &Path) -> String {
    let file_name = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or_default();
    [".device.json", ".device.toml", ".json", ".toml"]
        .iter()
        .find_map(|suffix| file_name.strip_suffix(suffix))
        .unwrap_or(file_name)
        .to_string()
}
