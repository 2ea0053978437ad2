//! Physical I/O pins, discriminated by direction.
//!
//! The `direction` attribute is validated once, in [`dispatch_pin_from`],
//! and the result is a closed [`PinMap`] that callers match exhaustively.

use std::borrow::Cow;

use serde_json::Value;

use crate::convert::{
    InitialState, InputPinMode, InterruptPriority, OutputPinMode, PinDirection, Symbolic,
    TriggerMode,
};
use crate::entity::{put, Attributes, Entity};
use crate::error::{Result, SchemaError};
use crate::fields::Fields;
use crate::xref::{EntityKind, UidReference};

const INPUT_FIELDS: &[&str] = &[
    "name",
    "port",
    "pinNumber",
    "direction",
    "pinMode",
    "triggerMode",
    "interruptPriority",
    "interruptNumber",
    "description",
];

const OUTPUT_FIELDS: &[&str] = &[
    "name",
    "port",
    "pinNumber",
    "direction",
    "allowRead",
    "pinMode",
    "initialState",
    "invert",
    "description",
];

/// Validate the pin's identity attributes before its fields are read.
///
/// `direction` must be present and equal `expected`. A `name` attribute, if
/// present, must agree with the name the pin is built under.
fn check_identity(name: &str, attrs: &Attributes, expected: PinDirection) -> Result<()> {
    match attrs.get("name") {
        None | Some(Value::Null) => {}
        Some(Value::String(given)) if given == name => {}
        Some(other) => {
            return Err(SchemaError::NameMismatch {
                entity: name.to_string(),
                found: other.to_string(),
            })
        }
    }

    let raw = match attrs.get("direction") {
        None | Some(Value::Null) => {
            return Err(SchemaError::MissingField {
                entity: name.to_string(),
                field: "direction",
            })
        }
        Some(raw) => raw,
    };
    let found = PinDirection::from_value(raw).map_err(|_| SchemaError::InvalidDirection {
        pin: name.to_string(),
        value: raw.to_string(),
    })?;
    if found != expected {
        return Err(SchemaError::DirectionMismatch {
            pin: name.to_string(),
            expected: expected.label(),
            found: found.label(),
        });
    }
    Ok(())
}

/// An input pin and its interrupt configuration.
#[derive(Debug, Clone)]
pub struct InputPin {
    name: String,
    port: String,
    pin_number: u32,
    pin_mode: InputPinMode,
    trigger_mode: TriggerMode,
    interrupt_priority: InterruptPriority,
    interrupt_number: u32,
    description: Option<String>,
    reference: UidReference,
}

impl InputPin {
    pub fn new(
        name: impl Into<String>,
        port: impl Into<String>,
        pin_number: u32,
        pin_mode: InputPinMode,
        trigger_mode: TriggerMode,
        interrupt_priority: InterruptPriority,
        interrupt_number: u32,
    ) -> Self {
        let name = name.into();
        Self {
            reference: UidReference::acquire(EntityKind::InputPin, name.clone()),
            name,
            port: port.into(),
            pin_number,
            pin_mode,
            trigger_mode,
            interrupt_priority,
            interrupt_number,
            description: None,
        }
    }

    pub fn parse_from(name: &str, attrs: &Attributes) -> Result<Self> {
        check_identity(name, attrs, PinDirection::Input)?;
        let fields = Fields::new(name, attrs, INPUT_FIELDS)?;
        Ok(Self {
            reference: UidReference::acquire(EntityKind::InputPin, name),
            name: name.to_string(),
            port: fields.required_text("port")?,
            pin_number: fields.required_int("pinNumber")?,
            pin_mode: fields.required_symbol("pinMode")?,
            trigger_mode: fields.required_symbol("triggerMode")?,
            interrupt_priority: fields.required_symbol("interruptPriority")?,
            interrupt_number: fields.required_int("interruptNumber")?,
            description: fields.text("description")?,
        })
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

    pub fn port(&self) -> &str {
        &self.port
    }

    pub fn pin_number(&self) -> u32 {
        self.pin_number
    }

    pub fn pin_mode(&self) -> InputPinMode {
        self.pin_mode
    }

    pub fn trigger_mode(&self) -> TriggerMode {
        self.trigger_mode
    }

    pub fn interrupt_priority(&self) -> InterruptPriority {
        self.interrupt_priority
    }

    pub fn interrupt_number(&self) -> u32 {
        self.interrupt_number
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }
}

impl Entity for InputPin {
    fn name(&self) -> Cow<'_, str> {
        Cow::Borrowed(&self.name)
    }

    fn reference(&self) -> &UidReference {
        &self.reference
    }

    fn to_dict(&self) -> Attributes {
        let mut dict = Attributes::new();
        dict.insert("name".into(), self.name.clone().into());
        dict.insert("port".into(), self.port.clone().into());
        dict.insert("pinNumber".into(), self.pin_number.into());
        dict.insert("direction".into(), PinDirection::Input.into());
        dict.insert("pinMode".into(), self.pin_mode.into());
        dict.insert("triggerMode".into(), self.trigger_mode.into());
        dict.insert("interruptPriority".into(), self.interrupt_priority.into());
        dict.insert("interruptNumber".into(), self.interrupt_number.into());
        put(&mut dict, "description", self.description.clone());
        dict
    }
}

/// An output pin and its drive configuration.
#[derive(Debug, Clone)]
pub struct OutputPin {
    name: String,
    port: String,
    pin_number: u32,
    allow_read: bool,
    pin_mode: OutputPinMode,
    initial_state: InitialState,
    invert: bool,
    description: Option<String>,
    reference: UidReference,
}

impl OutputPin {
    pub fn new(
        name: impl Into<String>,
        port: impl Into<String>,
        pin_number: u32,
        pin_mode: OutputPinMode,
        initial_state: InitialState,
    ) -> Self {
        let name = name.into();
        Self {
            reference: UidReference::acquire(EntityKind::OutputPin, name.clone()),
            name,
            port: port.into(),
            pin_number,
            allow_read: false,
            pin_mode,
            initial_state,
            invert: false,
            description: None,
        }
    }

    pub fn parse_from(name: &str, attrs: &Attributes) -> Result<Self> {
        check_identity(name, attrs, PinDirection::Output)?;
        let fields = Fields::new(name, attrs, OUTPUT_FIELDS)?;
        Ok(Self {
            reference: UidReference::acquire(EntityKind::OutputPin, name),
            name: name.to_string(),
            port: fields.required_text("port")?,
            pin_number: fields.required_int("pinNumber")?,
            allow_read: fields.required_flag("allowRead")?,
            pin_mode: fields.required_symbol("pinMode")?,
            initial_state: fields.required_symbol("initialState")?,
            invert: fields.required_flag("invert")?,
            description: fields.text("description")?,
        })
    }

    pub fn with_allow_read(mut self, allow_read: bool) -> Self {
        self.allow_read = allow_read;
        self
    }

    pub fn with_invert(mut self, invert: bool) -> Self {
        self.invert = invert;
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

    pub fn port(&self) -> &str {
        &self.port
    }

    pub fn pin_number(&self) -> u32 {
        self.pin_number
    }

    pub fn allow_read(&self) -> bool {
        self.allow_read
    }

    pub fn pin_mode(&self) -> OutputPinMode {
        self.pin_mode
    }

    pub fn initial_state(&self) -> InitialState {
        self.initial_state
    }

    pub fn invert(&self) -> bool {
        self.invert
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }
}

impl Entity for OutputPin {
    fn name(&self) -> Cow<'_, str> {
        Cow::Borrowed(&self.name)
    }

    fn reference(&self) -> &UidReference {
        &self.reference
    }

    fn to_dict(&self) -> Attributes {
        let mut dict = Attributes::new();
        dict.insert("name".into(), self.name.clone().into());
        dict.insert("port".into(), self.port.clone().into());
        dict.insert("pinNumber".into(), self.pin_number.into());
        dict.insert("direction".into(), PinDirection::Output.into());
        dict.insert("allowRead".into(), self.allow_read.into());
        dict.insert("pinMode".into(), self.pin_mode.into());
        dict.insert("initialState".into(), self.initial_state.into());
        dict.insert("invert".into(), self.invert.into());
        put(&mut dict, "description", self.description.clone());
        dict
    }
}

/// A pin of either direction.
#[derive(Debug, Clone)]
pub enum PinMap {
    Input(InputPin),
    Output(OutputPin),
}

impl PinMap {
    pub fn direction(&self) -> PinDirection {
        match self {
            PinMap::Input(_) => PinDirection::Input,
            PinMap::Output(_) => PinDirection::Output,
        }
    }

    pub fn port(&self) -> &str {
        match self {
            PinMap::Input(pin) => pin.port(),
            PinMap::Output(pin) => pin.port(),
        }
    }

    pub fn pin_number(&self) -> u32 {
        match self {
            PinMap::Input(pin) => pin.pin_number(),
            PinMap::Output(pin) => pin.pin_number(),
        }
    }

    pub fn as_input(&self) -> Option<&InputPin> {
        match self {
            PinMap::Input(pin) => Some(pin),
            PinMap::Output(_) => None,
        }
    }

    pub fn as_output(&self) -> Option<&OutputPin> {
        match self {
            PinMap::Input(_) => None,
            PinMap::Output(pin) => Some(pin),
        }
    }
}

impl From<InputPin> for PinMap {
    fn from(pin: InputPin) -> Self {
        PinMap::Input(pin)
    }
}

impl From<OutputPin> for PinMap {
    fn from(pin: OutputPin) -> Self {
        PinMap::Output(pin)
    }
}

impl Entity for PinMap {
    fn name(&self) -> Cow<'_, str> {
        match self {
            PinMap::Input(pin) => pin.name(),
            PinMap::Output(pin) => pin.name(),
        }
    }

    fn reference(&self) -> &UidReference {
        match self {
            PinMap::Input(pin) => pin.reference(),
            PinMap::Output(pin) => pin.reference(),
        }
    }

    fn to_dict(&self) -> Attributes {
        match self {
            PinMap::Input(pin) => pin.to_dict(),
            PinMap::Output(pin) => pin.to_dict(),
        }
    }
}

/// Build a pin whose name is carried in the `name` attribute.
pub fn dispatch_pin(attrs: &Attributes) -> Result<PinMap> {
    let name = match attrs.get("name") {
        Some(Value::String(name)) => name.clone(),
        Some(Value::Null) | None => {
            return Err(SchemaError::MissingField {
                entity: "pin".into(),
                field: "name",
            })
        }
        Some(_) => {
            return Err(SchemaError::UnexpectedShape {
                entity: "pin".into(),
                field: "name",
                expected: "text",
            })
        }
    };
    dispatch_pin_from(&name, attrs)
}

/// Build the pin variant selected by the `direction` attribute.
pub fn dispatch_pin_from(name: &str, attrs: &Attributes) -> Result<PinMap> {
    let raw = match attrs.get("direction") {
        Some(Value::Null) | None => {
            return Err(SchemaError::MissingField {
                entity: name.to_string(),
                field: "direction",
            })
        }
        Some(raw) => raw,
    };
    let direction = PinDirection::from_value(raw).map_err(|_| SchemaError::InvalidDirection {
        pin: name.to_string(),
        value: raw.to_string(),
    })?;
    match direction {
        PinDirection::Input => InputPin::parse_from(name, attrs).map(PinMap::Input),
        PinDirection::Output => OutputPin::parse_from(name, attrs).map(PinMap::Output),
    }
}
