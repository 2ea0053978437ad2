//! Device-level descriptive metadata.

use std::borrow::Cow;

use crate::entity::{put, Attributes, Entity};
use crate::error::Result;
use crate::fields::Fields;
use crate::xref::{EntityKind, UidReference};

const METADATA_FIELDS: &[&str] = &[
    "device",
    "whoAmI",
    "firmwareVersion",
    "hardwareTargets",
    "architecture",
];

/// Identity and version information for a device.
#[derive(Debug, Clone)]
pub struct Metadata {
    device: String,
    who_am_i: u32,
    firmware_version: Option<String>,
    hardware_targets: Option<String>,
    architecture: Option<String>,
    reference: UidReference,
}

impl Metadata {
    pub fn new(device: impl Into<String>, who_am_i: u32) -> Self {
        let device = device.into();
        Self {
            reference: UidReference::acquire(EntityKind::Metadata, format!("{device}_{who_am_i}")),
            device,
            who_am_i,
            firmware_version: None,
            hardware_targets: None,
            architecture: None,
        }
    }

    /// Parse metadata from the device document's top-level attributes.
    pub fn parse_from(attrs: &Attributes) -> Result<Self> {
        let entity = attrs
            .get("device")
            .and_then(|device| device.as_str())
            .unwrap_or("metadata");
        let fields = Fields::new(entity, attrs, METADATA_FIELDS)?;
        let mut metadata = Self::new(
            fields.required_text("device")?,
            fields.required_int("whoAmI")?,
        );
        metadata.firmware_version = fields.text("firmwareVersion")?;
        metadata.hardware_targets = fields.text("hardwareTargets")?;
        metadata.architecture = fields.text("architecture")?;
        Ok(metadata)
    }

    pub fn with_firmware_version(mut self, version: impl Into<String>) -> Self {
        self.firmware_version = Some(version.into());
        self
    }

    pub fn with_hardware_targets(mut self, targets: impl Into<String>) -> Self {
        self.hardware_targets = Some(targets.into());
        self
    }

    /// Replace the acquired handle with a caller-supplied one.
    pub fn with_reference(mut self, reference: UidReference) -> Self {
        self.reference = reference;
        self
    }

    pub fn with_architecture(mut self, architecture: impl Into<String>) -> Self {
        self.architecture = Some(architecture.into());
        self
    }

    pub fn device(&self) -> &str {
        &self.device
    }

    pub fn who_am_i(&self) -> u32 {
        self.who_am_i
    }

    pub fn firmware_version(&self) -> Option<&str> {
        self.firmware_version.as_deref()
    }

    pub fn hardware_targets(&self) -> Option<&str> {
        self.hardware_targets.as_deref()
    }

    pub fn architecture(&self) -> Option<&str> {
        self.architecture.as_deref()
    }
}

impl Entity for Metadata {
    /// Derived as `{device}_{whoAmI}`.
    fn name(&self) -> Cow<'_, str> {
        Cow::Owned(format!("{}_{}", self.device, self.who_am_i))
    }

    fn reference(&self) -> &UidReference {
        &self.reference
    }

    fn to_dict(&self) -> Attributes {
        let mut dict = Attributes::new();
        dict.insert("device".into(), self.device.clone().into());
        dict.insert("whoAmI".into(), self.who_am_i.into());
        put(&mut dict, "firmwareVersion", self.firmware_version.clone());
        put(&mut dict, "hardwareTargets", self.hardware_targets.clone());
        put(&mut dict, "architecture", self.architecture.clone());
        dict
    }
}
