//! `reflex check`: build a device document and report its contents.

use std::path::Path;

use anyhow::Result;

use crate::manifest::ReflexManifest;

pub fn run(
    project_dir: &Path,
    manifest: &ReflexManifest,
    input: Option<&str>,
    json: bool,
) -> Result<()> {
    let model = super::load_model(project_dir, manifest, input)?;
    let summary = model.summary();

    if json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
        return Ok(());
    }

    println!("=== Device: {} ===", summary.device);
    println!("  Masks:           {}", summary.masks);
    println!("  Registers:       {}", summary.registers);
    println!("  Payload members: {}", summary.payload_members);
    println!("  Pins:            {}", summary.pins);
    println!("  References:      {}", summary.references);
    println!();
    println!("ok");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_device(dir: &Path, name: &str, content: &str) {
        let devices = dir.join("devices");
        std::fs::create_dir_all(&devices).unwrap();
        std::fs::write(devices.join(name), content).unwrap();
    }

    #[test]
    fn check_valid_device() {
        let dir = tempfile::tempdir().unwrap();
        write_device(
            dir.path(),
            "foo.device.json",
            r#"{ "device": "Foo", "whoAmI": 1, "registers": { "R": { "address": 1, "payloadType": "U8" } } }"#,
        );
        run(dir.path(), &ReflexManifest::default(), None, false).unwrap();
        run(dir.path(), &ReflexManifest::default(), None, true).unwrap();
    }

    #[test]
    fn check_reports_schema_error_with_path() {
        let dir = tempfile::tempdir().unwrap();
        write_device(dir.path(), "bad.device.json", r#"{ "device": "Foo" }"#);
        let err = run(dir.path(), &ReflexManifest::default(), None, false).unwrap_err();
        let text = format!("{err:#}");
        assert!(text.contains("bad.device.json"));
        assert!(text.contains("whoAmI"));
    }

    #[test]
    fn check_honors_build_switches() {
        let dir = tempfile::tempdir().unwrap();
        write_device(
            dir.path(),
            "dup.device.json",
            r#"{ "device": "Foo", "whoAmI": 1,
                 "bitMasks": { "M": { "bits": { "A": 1 } } },
                 "groupMasks": { "M": { "values": { "B": 0 } } } }"#,
        );
        run(dir.path(), &ReflexManifest::default(), None, false).unwrap();

        let strict: ReflexManifest =
            toml::from_str("[build]\nallow-mask-redefinition = false\n").unwrap();
        assert!(run(dir.path(), &strict, None, false).is_err());
    }

    #[test]
    fn check_without_devices_fails() {
        let dir = tempfile::tempdir().unwrap();
        assert!(run(dir.path(), &ReflexManifest::default(), None, false).is_err());
    }
}
