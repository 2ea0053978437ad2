//! `reflex xref`: print the cross-reference token for an entity.

use std::path::Path;

use anyhow::{Context, Result};
use reflex_schema::DeviceModel;

use crate::manifest::ReflexManifest;

pub fn run(
    project_dir: &Path,
    manifest: &ReflexManifest,
    input: Option<&str>,
    name: &str,
    label: Option<&str>,
    pointer: bool,
) -> Result<()> {
    let model = super::load_model(project_dir, manifest, input)?;
    println!("{}", token(&model, name, label, pointer)?);
    Ok(())
}

/// The reference link, or with `pointer` the anchor, for the entity `name`.
fn token(model: &DeviceModel, name: &str, label: Option<&str>, pointer: bool) -> Result<String> {
    let reference = model
        .find_reference(name)
        .with_context(|| format!("no entity named '{name}'"))?;

    Ok(if pointer {
        reference.render_pointer(label)
    } else {
        reference.render_reference(label)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const DEVICE: &str = r#"
device = "Foo"
whoAmI = 42

[masks.Mode]
values = { Idle = 0, Run = 1 }

[registers.Config]
address = 32
payloadType = "U8"
maskType = "Mode"
"#;

    fn project() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        let devices = dir.path().join("devices");
        std::fs::create_dir_all(&devices).unwrap();
        std::fs::write(devices.join("foo.device.toml"), DEVICE).unwrap();
        dir
    }

    #[test]
    fn reference_and_pointer_share_the_anchor() {
        let dir = project();
        let model = crate::commands::load_model(dir.path(), &ReflexManifest::default(), None).unwrap();
        let anchor = model.find_reference("Config").unwrap().anchor();

        let link = token(&model, "Config", None, false).unwrap();
        assert_eq!(link, format!("[Config](#{anchor})"));

        let pointer = token(&model, "Config", Some("config register"), true).unwrap();
        assert_eq!(pointer, format!("<a id=\"{anchor}\">config register</a>"));
    }

    #[test]
    fn unknown_name_is_an_error() {
        let dir = project();
        let err = run(dir.path(), &ReflexManifest::default(), None, "Nope", None, false)
            .unwrap_err();
        assert!(err.to_string().contains("Nope"));
    }

    #[test]
    fn run_with_explicit_file() {
        let dir = project();
        let file = dir.path().join("devices").join("foo.device.toml");
        run(
            dir.path(),
            &ReflexManifest::default(),
            file.to_str(),
            "Mode",
            None,
            true,
        )
        .unwrap();
    }
}
