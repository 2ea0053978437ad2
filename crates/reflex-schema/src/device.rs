//! Assembly of a complete device model from a parsed document.
//!
//! A build runs in phases: metadata, then every mask section, then
//! registers, then pins. All masks are registered before the first register
//! resolves a reference, so a mask section may appear anywhere in the
//! document. Mask sections are read in document order, and the last
//! definition of a repeated name wins.

use std::borrow::Cow;

use serde::Serialize;
use serde_json::Value;

use crate::collection::Collection;
use crate::convert::MaskCategory;
use crate::entity::{Attributes, Entity};
use crate::error::{Result, SchemaError};
use crate::mask::{Mask, MaskRegistry};
use crate::metadata::Metadata;
use crate::pin::{dispatch_pin_from, PinMap};
use crate::register::Register;
use crate::xref::{UidReference, XrefTable};

/// Document key of the section holding masks whose category is inferred.
pub const MASKS_SECTION: &str = "masks";
/// Document key of the section holding bitmasks.
pub const BIT_MASKS_SECTION: &str = "bitMasks";
/// Document key of the section holding group masks.
pub const GROUP_MASKS_SECTION: &str = "groupMasks";
/// Document key of the register section.
pub const REGISTERS_SECTION: &str = "registers";
/// Document key of the pin section.
pub const PINS_SECTION: &str = "pins";

const SECTIONS: &[&str] = &[
    MASKS_SECTION,
    BIT_MASKS_SECTION,
    GROUP_MASKS_SECTION,
    REGISTERS_SECTION,
    PINS_SECTION,
];

/// Options controlling how a document is turned into a model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildOptions {
    /// Infer the category of entries in the `masks` section from their keys.
    pub infer_mask_category: bool,
    /// Let a later mask definition replace an earlier one of the same name.
    pub allow_mask_redefinition: bool,
}

impl Default for BuildOptions {
    fn default() -> Self {
        Self {
            infer_mask_category: true,
            allow_mask_redefinition: true,
        }
    }
}

/// Entity counts for a built model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceSummary {
    pub device: String,
    pub masks: usize,
    pub registers: usize,
    pub payload_members: usize,
    pub pins: usize,
    pub references: usize,
}

/// A validated, cross-referenced device model.
#[derive(Debug, Clone)]
pub struct DeviceModel {
    metadata: Metadata,
    masks: MaskRegistry,
    registers: Option<Collection<Register>>,
    pins: Option<Collection<PinMap>>,
    xref: XrefTable,
}

impl DeviceModel {
    /// Build a model from a device document.
    pub fn build(document: &Value, options: &BuildOptions) -> Result<Self> {
        let document = document.as_object().ok_or_else(|| SchemaError::UnexpectedShape {
            entity: "device".into(),
            field: "document",
            expected: "a mapping of metadata keys and entity sections",
        })?;

        let top_level: Attributes = document
            .iter()
            .filter(|(key, _)| !SECTIONS.contains(&key.as_str()))
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect();
        let metadata = Metadata::parse_from(&top_level)?;
        log::debug!("building device model for '{}'", metadata.name());

        let mut masks = MaskRegistry::new();
        for section_key in document.keys() {
            let (section_key, infer, category) = match section_key.as_str() {
                MASKS_SECTION => (MASKS_SECTION, options.infer_mask_category, None),
                BIT_MASKS_SECTION => (BIT_MASKS_SECTION, false, Some(MaskCategory::BitMask)),
                GROUP_MASKS_SECTION => (GROUP_MASKS_SECTION, false, Some(MaskCategory::GroupMask)),
                _ => continue,
            };
            for (name, attrs) in section(document, section_key)? {
                let mask = Mask::parse_from(name, &attrs, infer, category)?;
                if options.allow_mask_redefinition {
                    if masks.contains(name) {
                        log::warn!("mask '{name}' redefined; later references resolve to the new definition");
                    }
                    masks.register(mask);
                } else {
                    masks.try_register(mask)?;
                }
            }
        }
        log::debug!("registered {} masks", masks.len());

        let registers = section(document, REGISTERS_SECTION)?
            .into_iter()
            .map(|(name, attrs)| Register::parse_from(name, &attrs, &masks))
            .collect::<Result<Vec<_>>>()?;
        log::debug!("parsed {} registers", registers.len());

        let pins = section(document, PINS_SECTION)?
            .into_iter()
            .map(|(name, attrs)| dispatch_pin_from(name, &attrs))
            .collect::<Result<Vec<_>>>()?;
        log::debug!("parsed {} pins", pins.len());

        Self::from_parts(metadata, masks, registers, pins)
    }

    /// Assemble a model from already-built entities and index their handles.
    pub fn from_parts(
        metadata: Metadata,
        masks: MaskRegistry,
        registers: Vec<Register>,
        pins: Vec<PinMap>,
    ) -> Result<Self> {
        let mut xref = XrefTable::new();
        xref.insert(metadata.reference())?;
        for mask in masks.iter() {
            xref.insert(mask.reference())?;
            for entry in mask.entries() {
                xref.insert(entry.reference())?;
            }
        }
        for register in &registers {
            xref.insert(register.reference())?;
            for member in register.payload_spec().unwrap_or_default() {
                xref.insert(member.reference())?;
            }
        }
        for pin in &pins {
            xref.insert(pin.reference())?;
        }

        Ok(Self {
            metadata,
            masks,
            registers: non_empty(registers),
            pins: non_empty(pins),
            xref,
        })
    }

    pub fn metadata(&self) -> &Metadata {
        &self.metadata
    }

    /// The mask registry, holding the current definition of every mask.
    pub fn masks(&self) -> &MaskRegistry {
        &self.masks
    }

    /// Registers in document order, or `None` when the document defines none.
    pub fn registers(&self) -> Option<&Collection<Register>> {
        self.registers.as_ref()
    }

    /// Pins in document order, or `None` when the document defines none.
    pub fn pins(&self) -> Option<&Collection<PinMap>> {
        self.pins.as_ref()
    }

    pub fn xref(&self) -> &XrefTable {
        &self.xref
    }

    /// Handle of the first entity named `name`.
    ///
    /// Registers are searched first, then masks, payload members, pins, and
    /// finally the metadata.
    pub fn find_reference(&self, name: &str) -> Option<&UidReference> {
        let registers = self.registers.iter().flatten();
        registers
            .clone()
            .find(|r| r.name() == name)
            .map(Entity::reference)
            .or_else(|| self.masks.get(name).map(|m| m.reference()))
            .or_else(|| {
                registers
                    .filter_map(|r| r.member(name))
                    .next()
                    .map(Entity::reference)
            })
            .or_else(|| {
                self.pins
                    .iter()
                    .flatten()
                    .find(|p| p.name() == name)
                    .map(Entity::reference)
            })
            .or_else(|| (self.metadata.name() == name).then(|| self.metadata.reference()))
    }

    pub fn summary(&self) -> DeviceSummary {
        DeviceSummary {
            device: self.metadata.name().into_owned(),
            masks: self.masks.len(),
            registers: self.registers.as_ref().map_or(0, Collection::len),
            payload_members: self
                .registers
                .iter()
                .flatten()
                .map(|r| r.payload_spec().map_or(0, <[_]>::len))
                .sum(),
            pins: self.pins.as_ref().map_or(0, Collection::len),
            references: self.xref.len(),
        }
    }
}

fn non_empty<T>(elements: Vec<T>) -> Option<Collection<T>> {
    Collection::new(elements).ok()
}

/// The `(name, attributes)` pairs of one section, in document order.
fn section<'a>(
    document: &'a Attributes,
    key: &'static str,
) -> Result<Vec<(&'a str, Cow<'a, Attributes>)>> {
    let entries = match document.get(key) {
        None | Some(Value::Null) => return Ok(Vec::new()),
        Some(Value::Object(entries)) => entries,
        Some(_) => {
            return Err(SchemaError::UnexpectedShape {
                entity: "device".into(),
                field: key,
                expected: "a mapping of entity names to attributes",
            })
        }
    };
    entries
        .iter()
        .map(|(name, raw)| match raw {
            Value::Object(attrs) => Ok((name.as_str(), Cow::Borrowed(attrs))),
            Value::Null => Ok((name.as_str(), Cow::Owned(Attributes::new()))),
            _ => Err(SchemaError::UnexpectedShape {
                entity: name.clone(),
                field: key,
                expected: "a mapping of attributes",
            }),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use serde_json::json;

    use super::*;

    fn document() -> Value {
        json!({
            "device": "Behavior",
            "whoAmI": 1216,
            "firmwareVersion": "1.0",
            "registers": {
                "DigitalInputState": {
                    "address": 32,
                    "payloadType": "U8",
                    "registerType": "Event",
                    "maskType": "DigitalInputs",
                },
                "Config": {
                    "address": 33,
                    "payloadType": "U8",
                    "registerType": ["Command", "Event"],
                    "payloadSpec": {
                        "Mode": { "mask": 3, "maskType": "Mode" },
                    },
                },
            },
            "masks": {
                "DigitalInputs": { "bits": { "DI0": 1, "DI1": 2 } },
            },
            "groupMasks": {
                "Mode": { "values": { "Idle": 0, "Run": 1 } },
            },
            "pins": {
                "DI0": {
                    "port": "PORTA",
                    "pinNumber": 0,
                    "direction": "input",
                    "pinMode": "tristate",
                    "triggerMode": "toggle",
                    "interruptPriority": "low",
                    "interruptNumber": 0,
                },
            },
        })
    }

    #[test]
    fn builds_every_section() {
        let model = DeviceModel::build(&document(), &BuildOptions::default()).unwrap();
        assert_eq!(model.metadata().name(), "Behavior_1216");
        assert_eq!(model.masks().len(), 2);
        assert_eq!(model.registers().unwrap().len(), 2);
        assert_eq!(model.pins().unwrap().len(), 1);

        let summary = model.summary();
        assert_eq!(summary.payload_members, 1);
        // metadata + 2 masks + 4 entries + 2 registers + 1 member + 1 pin
        assert_eq!(summary.references, 11);
    }

    #[test]
    fn masks_are_registered_before_registers_resolve() {
        let model = DeviceModel::build(&document(), &BuildOptions::default()).unwrap();
        let reg = model.registers().unwrap().find("DigitalInputState").unwrap();
        assert!(Arc::ptr_eq(
            &reg.masks()[0],
            model.masks().get("DigitalInputs").unwrap()
        ));
    }

    #[test]
    fn missing_sections_yield_no_collection() {
        let model = DeviceModel::build(
            &json!({ "device": "Empty", "whoAmI": 1 }),
            &BuildOptions::default(),
        )
        .unwrap();
        assert!(model.registers().is_none());
        assert!(model.pins().is_none());
        assert!(model.masks().is_empty());
    }

    #[test]
    fn unknown_mask_reference_stops_the_build() {
        let mut doc = document();
        doc["registers"]["Config"]["maskType"] = json!("Nope");
        let err = DeviceModel::build(&doc, &BuildOptions::default()).unwrap_err();
        assert!(matches!(err, SchemaError::UnknownMask { name } if name == "Nope"));
    }

    #[test]
    fn inference_can_be_disabled() {
        let options = BuildOptions {
            infer_mask_category: false,
            ..BuildOptions::default()
        };
        let err = DeviceModel::build(&document(), &options).unwrap_err();
        assert!(matches!(err, SchemaError::MissingCategory { .. }));
    }

    #[test]
    fn redefinition_policy() {
        let mut doc = document();
        doc["bitMasks"] = json!({ "Mode": { "bits": { "A": 1 } } });

        let model = DeviceModel::build(&doc, &BuildOptions::default()).unwrap();
        // bitMasks comes after groupMasks in the document, so the bitmask wins
        assert_eq!(
            model.masks().get("Mode").unwrap().category(),
            MaskCategory::BitMask
        );

        let strict = BuildOptions {
            allow_mask_redefinition: false,
            ..BuildOptions::default()
        };
        let err = DeviceModel::build(&doc, &strict).unwrap_err();
        assert!(matches!(err, SchemaError::MaskRedefined { name } if name == "Mode"));
    }

    #[test]
    fn mask_sections_follow_document_order() {
        let group_first = json!({
            "device": "Foo",
            "whoAmI": 1,
            "groupMasks": { "Mode": { "values": { "Idle": 0 } } },
            "bitMasks": { "Mode": { "bits": { "A": 1 } } },
        });
        let model = DeviceModel::build(&group_first, &BuildOptions::default()).unwrap();
        assert_eq!(model.masks().get("Mode").unwrap().category(), MaskCategory::BitMask);

        let bits_first = json!({
            "device": "Foo",
            "whoAmI": 1,
            "bitMasks": { "Mode": { "bits": { "A": 1 } } },
            "groupMasks": { "Mode": { "values": { "Idle": 0 } } },
        });
        let model = DeviceModel::build(&bits_first, &BuildOptions::default()).unwrap();
        assert_eq!(model.masks().get("Mode").unwrap().category(), MaskCategory::GroupMask);
    }

    #[test]
    fn find_reference_by_name() {
        let model = DeviceModel::build(&document(), &BuildOptions::default()).unwrap();
        let config = model.find_reference("Config").unwrap();
        assert_eq!(config.label(), "Config");
        assert!(model.xref().contains(&config.uid()));
        assert!(model.find_reference("Mode").is_some());
        assert!(model.find_reference("DI0").is_some());
        assert!(model.find_reference("Behavior_1216").is_some());
        assert!(model.find_reference("Missing").is_none());
    }

    #[test]
    fn non_mapping_section_is_rejected() {
        let mut doc = document();
        doc["registers"] = json!(["Config"]);
        let err = DeviceModel::build(&doc, &BuildOptions::default()).unwrap_err();
        assert!(matches!(err, SchemaError::UnexpectedShape { field: "registers", .. }));
    }

    #[test]
    fn unknown_top_level_key_is_rejected() {
        let mut doc = document();
        doc["vendor"] = json!("acme");
        let err = DeviceModel::build(&doc, &BuildOptions::default()).unwrap_err();
        assert!(matches!(err, SchemaError::UnknownField { field, .. } if field == "vendor"));
    }
}
