//! Registers and the named members of their payloads.

use std::borrow::Cow;
use std::sync::Arc;

use serde_json::{Number, Value};

use crate::convert::{PayloadType, RegisterRole, Visibility};
use crate::entity::{put, Attributes, Entity};
use crate::error::{Result, SchemaError};
use crate::fields::Fields;
use crate::mask::{Mask, MaskRegistry};
use crate::xref::{EntityKind, UidReference};

const MEMBER_FIELDS: &[&str] = &[
    "mask",
    "offset",
    "maskType",
    "description",
    "converter",
    "defaultValue",
    "maxValue",
    "minValue",
    "interfaceType",
];

const REGISTER_FIELDS: &[&str] = &[
    "address",
    "payloadType",
    "payloadLength",
    "registerType",
    "payloadSpec",
    "maskType",
    "description",
    "converter",
    "defaultValue",
    "maxValue",
    "minValue",
    "interfaceType",
    "visibility",
    "group",
];

/// Value bounds and default shared by registers and payload members.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Bounds {
    pub default_value: Option<Number>,
    pub max_value: Option<Number>,
    pub min_value: Option<Number>,
}

impl Bounds {
    fn parse(fields: &Fields<'_>) -> Result<Self> {
        Ok(Self {
            default_value: fields.number("defaultValue")?,
            max_value: fields.number("maxValue")?,
            min_value: fields.number("minValue")?,
        })
    }

    fn write(&self, dict: &mut Attributes) {
        put(dict, "defaultValue", self.default_value.clone());
        put(dict, "maxValue", self.max_value.clone());
        put(dict, "minValue", self.min_value.clone());
    }
}

fn mask_handles(masks: &[Arc<Mask>]) -> Value {
    masks
        .iter()
        .map(|mask| Value::String(mask.reference().anchor()))
        .collect()
}

/// A named sub-field of a register payload.
#[derive(Debug, Clone)]
pub struct PayloadMember {
    name: String,
    mask: Option<u64>,
    offset: u32,
    masks: Vec<Arc<Mask>>,
    description: Option<String>,
    converter: Option<bool>,
    bounds: Bounds,
    interface_type: Option<String>,
    reference: UidReference,
}

impl PayloadMember {
    /// A member with no mask bits, offset 1, and no mask references.
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            reference: UidReference::acquire(EntityKind::PayloadMember, name.clone()),
            name,
            mask: None,
            offset: 1,
            masks: Vec::new(),
            description: None,
            converter: None,
            bounds: Bounds::default(),
            interface_type: None,
        }
    }

    /// Parse a member, resolving its `maskType` references against `registry`.
    pub fn parse_from(name: &str, attrs: &Attributes, registry: &MaskRegistry) -> Result<Self> {
        let fields = Fields::new(name, attrs, MEMBER_FIELDS)?;
        Ok(Self {
            reference: UidReference::acquire(EntityKind::PayloadMember, name),
            name: name.to_string(),
            mask: fields.int("mask")?,
            offset: fields.int("offset")?.unwrap_or(1),
            masks: registry.resolve_masks(name, fields.get("maskType"))?,
            description: fields.text("description")?,
            converter: fields.flag("converter")?,
            bounds: Bounds::parse(&fields)?,
            interface_type: fields.text("interfaceType")?,
        })
    }

    pub fn with_mask_bits(mut self, mask: u64) -> Self {
        self.mask = Some(mask);
        self
    }

    pub fn with_offset(mut self, offset: u32) -> Self {
        self.offset = offset;
        self
    }

    pub fn with_masks(mut self, masks: Vec<Arc<Mask>>) -> Self {
        self.masks = masks;
        self
    }

    /// Replace the acquired handle with a caller-supplied one.
    pub fn with_reference(mut self, reference: UidReference) -> Self {
        self.reference = reference;
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Bit mask selecting this member within the payload element.
    pub fn mask_bits(&self) -> Option<u64> {
        self.mask
    }

    /// Index of the payload element holding this member.
    pub fn offset(&self) -> u32 {
        self.offset
    }

    pub fn masks(&self) -> &[Arc<Mask>] {
        &self.masks
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn converter(&self) -> Option<bool> {
        self.converter
    }

    pub fn bounds(&self) -> &Bounds {
        &self.bounds
    }

    pub fn interface_type(&self) -> Option<&str> {
        self.interface_type.as_deref()
    }
}

impl Entity for PayloadMember {
    fn name(&self) -> Cow<'_, str> {
        Cow::Borrowed(&self.name)
    }

    fn reference(&self) -> &UidReference {
        &self.reference
    }

    fn to_dict(&self) -> Attributes {
        let mut dict = Attributes::new();
        dict.insert("name".into(), self.name.clone().into());
        put(&mut dict, "mask", self.mask);
        dict.insert("offset".into(), self.offset.into());
        dict.insert("maskType".into(), mask_handles(&self.masks));
        put(&mut dict, "description", self.description.clone());
        put(&mut dict, "converter", self.converter);
        self.bounds.write(&mut dict);
        put(&mut dict, "interfaceType", self.interface_type.clone());
        dict
    }
}

/// The accepted shapes of a register's payload specification.
#[derive(Debug, Clone)]
pub enum PayloadSpec {
    /// A single already-built member.
    One(PayloadMember),
    /// Already-built members, in order.
    Many(Vec<PayloadMember>),
    /// A raw mapping of member names to attributes.
    Raw(Value),
}

impl PayloadSpec {
    /// Expand into members, parsing raw attributes against `registry`.
    pub fn into_members(self, register: &str, registry: &MaskRegistry) -> Result<Vec<PayloadMember>> {
        match self {
            PayloadSpec::One(member) => Ok(vec![member]),
            PayloadSpec::Many(members) => Ok(members),
            PayloadSpec::Raw(Value::Object(members)) => members
                .iter()
                .map(|(name, raw)| match raw {
                    Value::Object(attrs) => PayloadMember::parse_from(name, attrs, registry),
                    Value::Null => PayloadMember::parse_from(name, &Attributes::new(), registry),
                    _ => Err(SchemaError::UnexpectedShape {
                        entity: name.clone(),
                        field: "payloadSpec",
                        expected: "a mapping of member attributes",
                    }),
                })
                .collect(),
            PayloadSpec::Raw(_) => Err(SchemaError::UnexpectedShape {
                entity: register.to_string(),
                field: "payloadSpec",
                expected: "a member, a list of members, or a mapping of member names to attributes",
            }),
        }
    }
}

impl From<PayloadMember> for PayloadSpec {
    fn from(member: PayloadMember) -> Self {
        PayloadSpec::One(member)
    }
}

impl From<Vec<PayloadMember>> for PayloadSpec {
    fn from(members: Vec<PayloadMember>) -> Self {
        PayloadSpec::Many(members)
    }
}

/// A single addressable device register.
#[derive(Debug, Clone)]
pub struct Register {
    name: String,
    address: u32,
    payload_type: PayloadType,
    payload_length: u32,
    roles: Vec<RegisterRole>,
    payload_spec: Option<Vec<PayloadMember>>,
    masks: Vec<Arc<Mask>>,
    description: Option<String>,
    converter: Option<bool>,
    bounds: Bounds,
    interface_type: Option<String>,
    visibility: Visibility,
    group: Option<String>,
    reference: UidReference,
}

impl Register {
    /// A public, single-element register with role `NONE`.
    pub fn new(name: impl Into<String>, address: u32, payload_type: PayloadType) -> Self {
        let name = name.into();
        Self {
            reference: UidReference::acquire(EntityKind::Register, name.clone()),
            name,
            address,
            payload_type,
            payload_length: 1,
            roles: vec![RegisterRole::None],
            payload_spec: None,
            masks: Vec::new(),
            description: None,
            converter: None,
            bounds: Bounds::default(),
            interface_type: None,
            visibility: Visibility::Public,
            group: None,
        }
    }

    /// Parse a register, resolving every mask reference against `registry`.
    pub fn parse_from(name: &str, attrs: &Attributes, registry: &MaskRegistry) -> Result<Self> {
        let fields = Fields::new(name, attrs, REGISTER_FIELDS)?;
        let address = fields.required_int("address")?;
        let payload_type = fields.required_symbol("payloadType")?;
        let roles = match fields.get("registerType") {
            Some(raw) => RegisterRole::list_from_value(raw)?,
            None => vec![RegisterRole::None],
        };
        let payload_spec = fields
            .get("payloadSpec")
            .map(|raw| PayloadSpec::Raw(raw.clone()).into_members(name, registry))
            .transpose()?;

        Ok(Self {
            reference: UidReference::acquire(EntityKind::Register, name),
            name: name.to_string(),
            address,
            payload_type,
            payload_length: fields.int("payloadLength")?.unwrap_or(1),
            roles,
            payload_spec,
            masks: registry.resolve_masks(name, fields.get("maskType"))?,
            description: fields.text("description")?,
            converter: fields.flag("converter")?,
            bounds: Bounds::parse(&fields)?,
            interface_type: fields.text("interfaceType")?,
            visibility: fields.symbol("visibility")?.unwrap_or_default(),
            group: fields.text("group")?,
        })
    }

    pub fn with_payload_length(mut self, length: u32) -> Self {
        self.payload_length = length;
        self
    }

    pub fn with_roles(mut self, roles: Vec<RegisterRole>) -> Self {
        self.roles = roles;
        self
    }

    pub fn with_payload_spec(
        mut self,
        spec: impl Into<PayloadSpec>,
        registry: &MaskRegistry,
    ) -> Result<Self> {
        self.payload_spec = Some(spec.into().into_members(&self.name, registry)?);
        Ok(self)
    }

    pub fn with_masks(mut self, masks: Vec<Arc<Mask>>) -> Self {
        self.masks = masks;
        self
    }

    pub fn with_visibility(mut self, visibility: Visibility) -> Self {
        self.visibility = visibility;
        self
    }

    /// Replace the acquired handle with a caller-supplied one.
    pub fn with_reference(mut self, reference: UidReference) -> Self {
        self.reference = reference;
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_group(mut self, group: impl Into<String>) -> Self {
        self.group = Some(group.into());
        self
    }

    pub fn address(&self) -> u32 {
        self.address
    }

    pub fn payload_type(&self) -> PayloadType {
        self.payload_type
    }

    pub fn payload_length(&self) -> u32 {
        self.payload_length
    }

    pub fn roles(&self) -> &[RegisterRole] {
        &self.roles
    }

    pub fn has_role(&self, role: RegisterRole) -> bool {
        self.roles.contains(&role)
    }

    pub fn payload_spec(&self) -> Option<&[PayloadMember]> {
        self.payload_spec.as_deref()
    }

    /// Look up a payload member by name.
    pub fn member(&self, name: &str) -> Option<&PayloadMember> {
        self.payload_spec
            .as_deref()
            .and_then(|members| members.iter().find(|m| m.name == name))
    }

    pub fn masks(&self) -> &[Arc<Mask>] {
        &self.masks
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn converter(&self) -> Option<bool> {
        self.converter
    }

    pub fn bounds(&self) -> &Bounds {
        &self.bounds
    }

    pub fn interface_type(&self) -> Option<&str> {
        self.interface_type.as_deref()
    }

    pub fn visibility(&self) -> Visibility {
        self.visibility
    }

    pub fn group(&self) -> Option<&str> {
        self.group.as_deref()
    }

    /// Whether the payload holds more than one element.
    pub fn is_array(&self) -> bool {
        self.payload_length > 1
    }

    /// Total payload size in bytes.
    pub fn payload_size_bytes(&self) -> u64 {
        u64::from(self.payload_type.size_bytes()) * u64::from(self.payload_length)
    }
}

impl Entity for Register {
    fn name(&self) -> Cow<'_, str> {
        Cow::Borrowed(&self.name)
    }

    fn reference(&self) -> &UidReference {
        &self.reference
    }

    fn to_dict(&self) -> Attributes {
        let mut dict = Attributes::new();
        dict.insert("name".into(), self.name.clone().into());
        dict.insert("address".into(), self.address.into());
        dict.insert("payloadType".into(), self.payload_type.into());
        dict.insert("payloadLength".into(), self.payload_length.into());
        dict.insert(
            "registerType".into(),
            self.roles.iter().map(|&role| Value::from(role)).collect(),
        );
        put(
            &mut dict,
            "payloadSpec",
            self.payload_spec.as_ref().map(|members| {
                members
                    .iter()
                    .map(|member| Value::Object(member.to_dict()))
                    .collect::<Vec<_>>()
            }),
        );
        dict.insert("maskType".into(), mask_handles(&self.masks));
        put(&mut dict, "description", self.description.clone());
        put(&mut dict, "converter", self.converter);
        self.bounds.write(&mut dict);
        put(&mut dict, "interfaceType", self.interface_type.clone());
        dict.insert("visibility".into(), self.visibility.into());
        put(&mut dict, "group", self.group.clone());
        dict
    }
}
