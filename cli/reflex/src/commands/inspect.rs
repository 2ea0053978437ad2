//! `reflex inspect`: print entity dictionaries of a device model.

use std::path::Path;

use anyhow::{bail, Result};
use reflex_schema::{DeviceModel, Entity};
use serde_json::{Map, Value};

use crate::manifest::ReflexManifest;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Kind {
    Metadata,
    Masks,
    Registers,
    Pins,
}

impl Kind {
    const ALL: [Kind; 4] = [Kind::Metadata, Kind::Masks, Kind::Registers, Kind::Pins];

    fn parse(s: &str) -> Result<Self> {
        Ok(match s {
            "metadata" => Kind::Metadata,
            "masks" => Kind::Masks,
            "registers" => Kind::Registers,
            "pins" => Kind::Pins,
            other => bail!("unknown kind: '{other}' (expected metadata, masks, registers, pins)"),
        })
    }

    fn key(self) -> &'static str {
        match self {
            Kind::Metadata => "metadata",
            Kind::Masks => "masks",
            Kind::Registers => "registers",
            Kind::Pins => "pins",
        }
    }
}

pub fn run(
    project_dir: &Path,
    manifest: &ReflexManifest,
    input: Option<&str>,
    kind: Option<&str>,
    format: Option<&str>,
) -> Result<()> {
    let kinds = match kind {
        Some(k) => vec![Kind::parse(k)?],
        None => Kind::ALL.to_vec(),
    };
    let json = match format.unwrap_or("text") {
        "text" => false,
        "json" => true,
        other => bail!("unknown format: '{other}' (expected text, json)"),
    };

    let model = super::load_model(project_dir, manifest, input)?;
    let sections = collect(&model, &kinds);

    if json {
        println!("{}", serde_json::to_string_pretty(&Value::Object(sections))?);
    } else {
        print_text(&sections)?;
    }
    Ok(())
}

/// Entity dictionaries per requested kind, keyed by entity name, each
/// carrying its anchor under `uid`.
fn collect(model: &DeviceModel, kinds: &[Kind]) -> Map<String, Value> {
    let mut sections = Map::new();
    for &kind in kinds {
        let mut entities = Map::new();
        match kind {
            Kind::Metadata => add(&mut entities, model.metadata()),
            Kind::Masks => model.masks().iter().for_each(|m| add(&mut entities, m)),
            Kind::Registers => model
                .registers()
                .into_iter()
                .flatten()
                .for_each(|r| add(&mut entities, r)),
            Kind::Pins => model
                .pins()
                .into_iter()
                .flatten()
                .for_each(|p| add(&mut entities, p)),
        }
        sections.insert(kind.key().to_string(), Value::Object(entities));
    }
    sections
}

fn add(entities: &mut Map<String, Value>, entity: &impl Entity) {
    let mut dict = entity.to_dict();
    dict.insert("uid".to_string(), Value::from(entity.reference().anchor()));
    entities.insert(entity.name().into_owned(), Value::Object(dict));
}

fn print_text(sections: &Map<String, Value>) -> Result<()> {
    for (section, entities) in sections {
        println!("--- {section} ---");
        let Value::Object(entities) = entities else {
            continue;
        };
        if entities.is_empty() {
            println!("  (none)");
        }
        for (name, dict) in entities {
            println!("  {name}");
            if let Value::Object(fields) = dict {
                for (key, value) in fields {
                    println!("    {key:<20} {}", serde_json::to_string(value)?);
                }
            }
        }
        println!();
    }
    Ok(())
}
