//! Masks, their bit/value entries, and the name registry they publish into.
//!
//! Parsing a [`Mask`] has no side effects. Publishing it is an explicit
//! second step, [`MaskRegistry::register`], after which registers and payload
//! members defined later can resolve it by name.

use std::borrow::Cow;
use std::collections::HashMap;
use std::sync::Arc;

use serde_json::Value;

use crate::convert::MaskCategory;
use crate::entity::{put, Attributes, Entity};
use crate::error::{Result, SchemaError};
use crate::fields::{coerce_int, parse_int_text, Fields};
use crate::xref::{EntityKind, UidReference};

const MASK_FIELDS: &[&str] = &["description", "bits", "values", "value"];

/// One named bit or discrete value of a mask.
#[derive(Debug, Clone)]
pub struct BitOrValue {
    name: String,
    value: i128,
    description: Option<String>,
    reference: UidReference,
}

impl BitOrValue {
    pub fn new(name: impl Into<String>, value: i128, description: Option<String>) -> Self {
        let name = name.into();
        Self {
            reference: UidReference::acquire(EntityKind::BitOrValue, name.clone()),
            name,
            value,
            description,
        }
    }

    /// Parse one entry of a mask's `bits` or `values` mapping.
    ///
    /// The entry is a bare integer, a mapping with a `value` key, or a
    /// mapping whose first key (other than `description`) is the value itself.
    pub fn parse_from(name: &str, raw: &Value) -> Result<Self> {
        match raw {
            Value::Number(_) | Value::String(_) => {
                Ok(Self::new(name, coerce_int(name, raw)?, None))
            }
            Value::Object(entry) if entry.contains_key("value") => {
                let value = coerce_int(name, &entry["value"])?;
                Ok(Self::new(name, value, entry_description(entry)))
            }
            Value::Object(entry) => {
                let key = entry
                    .keys()
                    .find(|key| key.as_str() != "description")
                    .ok_or_else(|| SchemaError::MissingField {
                        entity: name.to_string(),
                        field: "value",
                    })?;
                let value = parse_int_text(key).ok_or_else(|| SchemaError::NumericConversion {
                    field: name.to_string(),
                    value: format!("{key:?}"),
                })?;
                Ok(Self::new(name, value, entry_description(entry)))
            }
            _ => Err(SchemaError::UnexpectedShape {
                entity: name.to_string(),
                field: "value",
                expected: "an integer or a mapping keyed by the value",
            }),
        }
    }

    pub fn value(&self) -> i128 {
        self.value
    }

    /// The value in `0x`-prefixed lowercase hexadecimal.
    pub fn value_hex(&self) -> String {
        if self.value < 0 {
            format!("-{:#x}", self.value.unsigned_abs())
        } else {
            format!("{:#x}", self.value)
        }
    }

    /// Replace the acquired handle with a caller-supplied one.
    pub fn with_reference(mut self, reference: UidReference) -> Self {
        self.reference = reference;
        self
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }
}

fn entry_description(entry: &serde_json::Map<String, Value>) -> Option<String> {
    match entry.get("description") {
        None | Some(Value::Null) => None,
        Some(Value::String(text)) => Some(text.clone()),
        Some(other) => Some(other.to_string()),
    }
}

impl Entity for BitOrValue {
    fn name(&self) -> Cow<'_, str> {
        Cow::Borrowed(&self.name)
    }

    fn reference(&self) -> &UidReference {
        &self.reference
    }

    fn to_dict(&self) -> Attributes {
        let mut dict = Attributes::new();
        dict.insert("name".into(), self.name.clone().into());
        dict.insert("value".into(), self.value_hex().into());
        put(&mut dict, "description", self.description.clone());
        dict
    }
}

/// A named bitmask or named group of discrete values.
#[derive(Debug, Clone)]
pub struct Mask {
    name: String,
    description: Option<String>,
    values: Option<Vec<BitOrValue>>,
    bits: Option<Vec<BitOrValue>>,
    category: MaskCategory,
    reference: UidReference,
}

impl Mask {
    /// Build a mask from already-typed parts.
    ///
    /// `entries` land in `bits` for a bitmask and in `values` for a group mask.
    pub fn new(
        name: impl Into<String>,
        category: MaskCategory,
        description: Option<String>,
        entries: Vec<BitOrValue>,
    ) -> Self {
        let name = name.into();
        let (bits, values) = match category {
            MaskCategory::BitMask => (Some(entries), None),
            MaskCategory::GroupMask => (None, Some(entries)),
        };
        Self {
            reference: UidReference::acquire(EntityKind::Mask, name.clone()),
            name,
            description,
            values,
            bits,
            category,
        }
    }

    /// Parse a mask from its document attributes.
    ///
    /// With `infer_category`, a `bits` key makes a bitmask and a `values` key
    /// a group mask; `category` is ignored. Without it, `category` is required.
    pub fn parse_from(
        name: &str,
        attrs: &Attributes,
        infer_category: bool,
        category: Option<MaskCategory>,
    ) -> Result<Self> {
        let fields = Fields::new(name, attrs, MASK_FIELDS)?;
        let category = if infer_category {
            if attrs.contains_key("bits") {
                MaskCategory::BitMask
            } else if attrs.contains_key("values") {
                MaskCategory::GroupMask
            } else {
                return Err(SchemaError::CategoryInference {
                    mask: name.to_string(),
                });
            }
        } else {
            category.ok_or_else(|| SchemaError::MissingCategory {
                mask: name.to_string(),
            })?
        };

        let bits = parse_entries(&fields, "bits")?;
        let values = match parse_entries(&fields, "values")? {
            Some(values) => Some(values),
            None => parse_entries(&fields, "value")?,
        };

        Ok(Self {
            reference: UidReference::acquire(EntityKind::Mask, name),
            name: name.to_string(),
            description: fields.text("description")?,
            values,
            bits,
            category,
        })
    }

    pub fn category(&self) -> MaskCategory {
        self.category
    }

    /// Replace the acquired handle with a caller-supplied one.
    pub fn with_reference(mut self, reference: UidReference) -> Self {
        self.reference = reference;
        self
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn bits(&self) -> Option<&[BitOrValue]> {
        self.bits.as_deref()
    }

    pub fn values(&self) -> Option<&[BitOrValue]> {
        self.values.as_deref()
    }

    /// All entries, bits first.
    pub fn entries(&self) -> impl Iterator<Item = &BitOrValue> {
        self.bits
            .iter()
            .chain(self.values.iter())
            .flat_map(|entries| entries.iter())
    }
}

fn parse_entries(fields: &Fields<'_>, key: &'static str) -> Result<Option<Vec<BitOrValue>>> {
    match fields.get(key) {
        None => Ok(None),
        Some(Value::Object(entries)) => entries
            .iter()
            .map(|(name, raw)| BitOrValue::parse_from(name, raw))
            .collect::<Result<Vec<_>>>()
            .map(Some),
        Some(_) => Err(SchemaError::UnexpectedShape {
            entity: fields.entity().to_string(),
            field: key,
            expected: "a mapping of entry names to values",
        }),
    }
}

fn entries_to_value(entries: &Option<Vec<BitOrValue>>) -> Value {
    match entries {
        Some(entries) => entries
            .iter()
            .map(|entry| Value::Object(entry.to_dict()))
            .collect(),
        None => Value::Null,
    }
}

impl Entity for Mask {
    fn name(&self) -> Cow<'_, str> {
        Cow::Borrowed(&self.name)
    }

    fn reference(&self) -> &UidReference {
        &self.reference
    }

    fn to_dict(&self) -> Attributes {
        let mut dict = Attributes::new();
        dict.insert("name".into(), self.name.clone().into());
        put(&mut dict, "description", self.description.clone());
        dict.insert("value".into(), entries_to_value(&self.values));
        dict.insert("bits".into(), entries_to_value(&self.bits));
        dict.insert("maskCategory".into(), self.category.into());
        dict
    }
}

/// Caller-owned registry of masks by name.
///
/// Definitions live in an append-only arena; the name index always points at
/// the latest definition. Resolved references are `Arc` snapshots, so a
/// redefinition is visible to later lookups only, never to references that
/// were already resolved.
#[derive(Debug, Clone, Default)]
pub struct MaskRegistry {
    arena: Vec<Arc<Mask>>,
    index: HashMap<String, usize>,
    names: Vec<String>,
}

impl MaskRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Publish a mask. A previous definition under the same name is replaced.
    pub fn register(&mut self, mask: Mask) -> Arc<Mask> {
        let mask = Arc::new(mask);
        let slot = self.arena.len();
        self.arena.push(Arc::clone(&mask));
        match self.index.insert(mask.name.clone(), slot) {
            Some(_) => log::debug!("mask '{}' redefined", mask.name),
            None => self.names.push(mask.name.clone()),
        }
        mask
    }

    /// Publish a mask, failing if the name is already taken.
    pub fn try_register(&mut self, mask: Mask) -> Result<Arc<Mask>> {
        if self.contains(&mask.name) {
            return Err(SchemaError::MaskRedefined { name: mask.name });
        }
        Ok(self.register(mask))
    }

    /// The current definition of `name`.
    pub fn get(&self, name: &str) -> Option<&Arc<Mask>> {
        self.index.get(name).map(|&slot| &self.arena[slot])
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// Resolve one mask name.
    pub fn resolve(&self, name: &str) -> Result<Arc<Mask>> {
        self.get(name)
            .cloned()
            .ok_or_else(|| SchemaError::UnknownMask {
                name: name.to_string(),
            })
    }

    /// Resolve a `maskType` attribute: absent, one name, or a list of names.
    pub fn resolve_masks(&self, entity: &str, raw: Option<&Value>) -> Result<Vec<Arc<Mask>>> {
        let shape_error = || SchemaError::UnexpectedShape {
            entity: entity.to_string(),
            field: "maskType",
            expected: "a mask name or a list of mask names",
        };
        match raw {
            None | Some(Value::Null) => Ok(Vec::new()),
            Some(Value::String(name)) => Ok(vec![self.resolve(name)?]),
            Some(Value::Array(names)) => names
                .iter()
                .map(|name| name.as_str().ok_or_else(shape_error).and_then(|n| self.resolve(n)))
                .collect(),
            Some(_) => Err(shape_error()),
        }
    }

    /// Current definitions in order of first definition.
    pub fn iter(&self) -> impl Iterator<Item = &Arc<Mask>> {
        self.names.iter().filter_map(|name| self.get(name))
    }

    /// Number of distinct mask names.
    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn attrs(value: Value) -> Attributes {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn infers_bitmask_from_bits() {
        let mask = Mask::parse_from("m", &attrs(json!({ "bits": { "B0": 1 } })), true, None)
            .unwrap();
        assert_eq!(mask.category(), MaskCategory::BitMask);
        assert_eq!(mask.bits().unwrap()[0].value(), 1);
    }

    #[test]
    fn infers_group_mask_from_values() {
        let mask = Mask::parse_from(
            "m",
            &attrs(json!({ "values": { "Off": 0, "On": 1 } })),
            true,
            None,
        )
        .unwrap();
        assert_eq!(mask.category(), MaskCategory::GroupMask);
        assert_eq!(mask.values().unwrap().len(), 2);
        assert!(mask.bits().is_none());
    }

    #[test]
    fn inference_fails_without_bits_or_values() {
        let err = Mask::parse_from("m", &Attributes::new(), true, None).unwrap_err();
        assert!(matches!(err, SchemaError::CategoryInference { mask } if mask == "m"));
    }

    #[test]
    fn inference_ignores_explicit_category() {
        let mask = Mask::parse_from(
            "m",
            &attrs(json!({ "bits": {} })),
            true,
            Some(MaskCategory::GroupMask),
        )
        .unwrap();
        assert_eq!(mask.category(), MaskCategory::BitMask);
    }

    #[test]
    fn explicit_category_required_without_inference() {
        let raw = attrs(json!({ "bits": { "B0": 1 } }));
        let err = Mask::parse_from("m", &raw, false, None).unwrap_err();
        assert!(matches!(err, SchemaError::MissingCategory { .. }));

        let mask = Mask::parse_from("m", &raw, false, Some(MaskCategory::GroupMask)).unwrap();
        assert_eq!(mask.category(), MaskCategory::GroupMask);
    }

    #[test]
    fn bit_or_value_from_mapping() {
        let entry =
            BitOrValue::parse_from("Enable", &json!({ "0x10": null, "description": "on" })).unwrap();
        assert_eq!(entry.value(), 16);
        assert_eq!(entry.value_hex(), "0x10");
        assert_eq!(entry.description(), Some("on"));
    }

    #[test]
    fn bit_or_value_from_value_key() {
        let entry =
            BitOrValue::parse_from("Port0", &json!({ "value": "0x2", "description": "p0" })).unwrap();
        assert_eq!(entry.value(), 2);
        assert_eq!(entry.description(), Some("p0"));
    }

    #[test]
    fn bit_or_value_description_may_come_first() {
        let entry =
            BitOrValue::parse_from("Enable", &json!({ "description": "on", "4": null })).unwrap();
        assert_eq!(entry.value(), 4);
    }

    #[test]
    fn bit_or_value_needs_a_value_key() {
        let err = BitOrValue::parse_from("Empty", &json!({})).unwrap_err();
        assert!(matches!(err, SchemaError::MissingField { field: "value", .. }));
        let err = BitOrValue::parse_from("Desc", &json!({ "description": "x" })).unwrap_err();
        assert!(matches!(err, SchemaError::MissingField { .. }));
    }

    #[test]
    fn bit_or_value_rejects_non_integer_key() {
        let err = BitOrValue::parse_from("Bad", &json!({ "one": null })).unwrap_err();
        assert!(matches!(err, SchemaError::NumericConversion { .. }));
    }

    #[test]
    fn high_bit_of_a_64_bit_register() {
        let entry = BitOrValue::parse_from("B63", &json!("0x8000000000000000")).unwrap();
        assert_eq!(entry.value(), 1i128 << 63);
        assert_eq!(entry.value_hex(), "0x8000000000000000");

        let entry = BitOrValue::parse_from("All", &json!(u64::MAX)).unwrap();
        assert_eq!(entry.value_hex(), "0xffffffffffffffff");
    }

    #[test]
    fn negative_values_render_like_hex() {
        assert_eq!(BitOrValue::new("n", -1, None).value_hex(), "-0x1");
        assert_eq!(BitOrValue::new("z", 0, None).value_hex(), "0x0");
    }

    #[test]
    fn unknown_mask_field_is_rejected() {
        let err = Mask::parse_from("m", &attrs(json!({ "bits": {}, "colour": "red" })), true, None)
            .unwrap_err();
        assert!(matches!(err, SchemaError::UnknownField { .. }));
    }

    #[test]
    fn registry_last_write_wins() {
        let mut registry = MaskRegistry::new();
        let first = registry.register(Mask::new("M", MaskCategory::BitMask, None, vec![]));
        let second = registry.register(Mask::new("M", MaskCategory::GroupMask, None, vec![]));
        let current = registry.resolve("M").unwrap();
        assert!(Arc::ptr_eq(&current, &second));
        assert!(!Arc::ptr_eq(&current, &first));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn try_register_refuses_redefinition() {
        let mut registry = MaskRegistry::new();
        registry
            .try_register(Mask::new("M", MaskCategory::BitMask, None, vec![]))
            .unwrap();
        let err = registry
            .try_register(Mask::new("M", MaskCategory::BitMask, None, vec![]))
            .unwrap_err();
        assert!(matches!(err, SchemaError::MaskRedefined { .. }));
    }

    #[test]
    fn resolve_unknown_mask_fails() {
        let registry = MaskRegistry::new();
        let err = registry.resolve("Missing").unwrap_err();
        assert!(matches!(err, SchemaError::UnknownMask { name } if name == "Missing"));
    }

    #[test]
    fn resolve_masks_accepts_all_shapes() {
        let mut registry = MaskRegistry::new();
        let a = registry.register(Mask::new("A", MaskCategory::BitMask, None, vec![]));
        let b = registry.register(Mask::new("B", MaskCategory::BitMask, None, vec![]));

        assert!(registry.resolve_masks("R", None).unwrap().is_empty());
        let one = registry.resolve_masks("R", Some(&json!("A"))).unwrap();
        assert!(Arc::ptr_eq(&one[0], &a));
        let many = registry.resolve_masks("R", Some(&json!(["B", "A"]))).unwrap();
        assert!(Arc::ptr_eq(&many[0], &b));
        assert!(Arc::ptr_eq(&many[1], &a));

        let err = registry.resolve_masks("R", Some(&json!(7))).unwrap_err();
        assert!(matches!(err, SchemaError::UnexpectedShape { field: "maskType", .. }));
    }

    #[test]
    fn registry_iterates_in_definition_order() {
        let mut registry = MaskRegistry::new();
        registry.register(Mask::new("B", MaskCategory::BitMask, None, vec![]));
        registry.register(Mask::new("A", MaskCategory::BitMask, None, vec![]));
        registry.register(Mask::new("B", MaskCategory::GroupMask, None, vec![]));
        let names: Vec<_> = registry.iter().map(|m| m.name().into_owned()).collect();
        assert_eq!(names, vec!["B", "A"]);
        assert_eq!(registry.get("B").unwrap().category(), MaskCategory::GroupMask);
    }

    #[test]
    fn to_dict_renders_entries_as_hex() {
        let mask = Mask::parse_from(
            "m",
            &attrs(json!({ "description": "mode", "bits": { "B0": 1, "B3": 8 } })),
            true,
            None,
        )
        .unwrap();
        let dict = mask.to_dict();
        assert_eq!(dict["maskCategory"], json!("BitMask"));
        assert_eq!(dict["bits"][1]["value"], json!("0x8"));
        assert_eq!(dict["value"], Value::Null);
        assert!(!dict.contains_key("uid"));
    }
}
