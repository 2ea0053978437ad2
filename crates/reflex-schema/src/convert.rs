//! Enumerated value types and their converters.
//!
//! Each enum is a closed set of symbolic values. Typed values pass through
//! unchanged; textual labels are matched exactly (case-sensitive) against the
//! symbolic names. Anything else fails with [`SchemaError::TypeConversion`],
//! and an unknown label is never coerced to a default.

use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use strum::{Display, EnumString, IntoStaticStr, VariantNames};

use crate::error::{Result, SchemaError};

/// Common converter contract for the symbolic enums.
pub trait Symbolic: Copy + FromStr + Into<&'static str> + 'static {
    /// Type name reported in conversion errors.
    const KIND: &'static str;

    /// Look up a textual label by exact symbolic name.
    fn parse_label(label: &str) -> Result<Self> {
        label.parse().map_err(|_| SchemaError::TypeConversion {
            kind: Self::KIND,
            value: format!("{label:?}"),
        })
    }

    /// Convert a raw attribute value. Only strings are accepted.
    fn from_value(value: &Value) -> Result<Self> {
        match value {
            Value::String(label) => Self::parse_label(label),
            other => Err(SchemaError::TypeConversion {
                kind: Self::KIND,
                value: other.to_string(),
            }),
        }
    }

    /// The symbolic name of this value.
    fn label(self) -> &'static str {
        self.into()
    }
}

macro_rules! symbolic {
    ($ty:ident, $kind:literal) => {
        impl Symbolic for $ty {
            const KIND: &'static str = $kind;
        }

        impl From<$ty> for Value {
            fn from(value: $ty) -> Self {
                Value::String(value.label().to_string())
            }
        }
    };
}

/// Element type of a register payload.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize,
    Display, EnumString, IntoStaticStr, VariantNames,
)]
pub enum PayloadType {
    U8,
    U16,
    U32,
    U64,
    S8,
    S16,
    S32,
    S64,
    Float,
}

impl PayloadType {
    /// Width of one payload element in bytes.
    pub fn size_bytes(self) -> u32 {
        match self {
            PayloadType::U8 | PayloadType::S8 => 1,
            PayloadType::U16 | PayloadType::S16 => 2,
            PayloadType::U32 | PayloadType::S32 | PayloadType::Float => 4,
            PayloadType::U64 | PayloadType::S64 => 8,
        }
    }

    /// Whether the element type carries a sign.
    pub fn is_signed(self) -> bool {
        matches!(
            self,
            PayloadType::S8
                | PayloadType::S16
                | PayloadType::S32
                | PayloadType::S64
                | PayloadType::Float
        )
    }
}

symbolic!(PayloadType, "PayloadType");

/// Role a register plays in the device protocol.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize,
    Display, EnumString, IntoStaticStr, VariantNames,
)]
pub enum RegisterRole {
    #[serde(rename = "NONE")]
    #[strum(serialize = "NONE")]
    None,
    Command,
    Event,
    Both,
}

impl RegisterRole {
    /// Normalize a single label or a list of labels into a role list.
    ///
    /// Order is preserved. A bare label yields a one-element list.
    pub fn list_from_value(value: &Value) -> Result<Vec<RegisterRole>> {
        match value {
            Value::Array(items) => items.iter().map(Self::from_value).collect(),
            other => Ok(vec![Self::from_value(other)?]),
        }
    }
}

symbolic!(RegisterRole, "RegisterType");

/// Whether a register is part of the public device interface.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize,
    Display, EnumString, IntoStaticStr, VariantNames,
)]
pub enum Visibility {
    #[default]
    Public,
    Private,
}

symbolic!(Visibility, "VisibilityType");

/// Whether a mask names individual bits or a group of discrete values.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize,
    Display, EnumString, IntoStaticStr, VariantNames,
)]
pub enum MaskCategory {
    BitMask,
    GroupMask,
}

symbolic!(MaskCategory, "MaskCategory");

/// Direction of a physical I/O pin.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize,
    Display, EnumString, IntoStaticStr, VariantNames,
)]
#[serde(rename_all = "camelCase")]
#[strum(serialize_all = "camelCase")]
pub enum PinDirection {
    Input,
    Output,
}

symbolic!(PinDirection, "DirectionType");

/// Electrical mode of an input pin.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize,
    Display, EnumString, IntoStaticStr, VariantNames,
)]
#[serde(rename_all = "camelCase")]
#[strum(serialize_all = "camelCase")]
pub enum InputPinMode {
    Pullup,
    Pulldown,
    Tristate,
    Busholder,
}

symbolic!(InputPinMode, "InputPinModeType");

/// Electrical mode of an output pin.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize,
    Display, EnumString, IntoStaticStr, VariantNames,
)]
#[serde(rename_all = "camelCase")]
#[strum(serialize_all = "camelCase")]
pub enum OutputPinMode {
    WiredOr,
    WiredAnd,
    WiredOrPull,
    WiredAndPull,
}

symbolic!(OutputPinMode, "OutputPinModeType");

/// Edge or level that raises an input pin interrupt.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize,
    Display, EnumString, IntoStaticStr, VariantNames,
)]
#[serde(rename_all = "camelCase")]
#[strum(serialize_all = "camelCase")]
pub enum TriggerMode {
    None,
    Rising,
    Falling,
    Toggle,
    Low,
}

symbolic!(TriggerMode, "TriggerModeType");

/// Priority of an input pin interrupt.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize,
    Display, EnumString, IntoStaticStr, VariantNames,
)]
#[serde(rename_all = "camelCase")]
#[strum(serialize_all = "camelCase")]
pub enum InterruptPriority {
    Off,
    Low,
    Medium,
    High,
}

symbolic!(InterruptPriority, "InterruptPriorityType");

/// Level an output pin drives after reset.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize,
    Display, EnumString, IntoStaticStr, VariantNames,
)]
#[serde(rename_all = "camelCase")]
#[strum(serialize_all = "camelCase")]
pub enum InitialState {
    Low,
    High,
}

symbolic!(InitialState, "InitialStateType");

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn labels_match_exactly() {
        assert_eq!(PayloadType::parse_label("U16").unwrap(), PayloadType::U16);
        assert_eq!(RegisterRole::parse_label("NONE").unwrap(), RegisterRole::None);
        assert_eq!(
            OutputPinMode::parse_label("wiredAndPull").unwrap(),
            OutputPinMode::WiredAndPull
        );
        assert_eq!(TriggerMode::parse_label("none").unwrap(), TriggerMode::None);
        assert!(PayloadType::parse_label("u16").is_err());
        assert!(Visibility::parse_label("public").is_err());
    }

    #[test]
    fn unknown_label_is_not_defaulted() {
        let err = InterruptPriority::parse_label("urgent").unwrap_err();
        assert!(matches!(
            err,
            SchemaError::TypeConversion { kind: "InterruptPriorityType", .. }
        ));
    }

    #[test]
    fn non_string_input_is_rejected() {
        assert!(PayloadType::from_value(&json!(3)).is_err());
        assert!(MaskCategory::from_value(&json!(null)).is_err());
        assert!(InitialState::from_value(&json!(["low"])).is_err());
    }

    #[test]
    fn role_label_normalizes_to_list() {
        assert_eq!(
            RegisterRole::list_from_value(&json!("Command")).unwrap(),
            vec![RegisterRole::Command]
        );
        assert_eq!(
            RegisterRole::list_from_value(&json!(["Command", "Event"])).unwrap(),
            vec![RegisterRole::Command, RegisterRole::Event]
        );
        assert!(RegisterRole::list_from_value(&json!(["Command", 2])).is_err());
    }

    #[test]
    fn typed_value_round_trips_through_label() {
        let raw: Value = InputPinMode::Busholder.into();
        assert_eq!(raw, json!("busholder"));
        assert_eq!(InputPinMode::from_value(&raw).unwrap(), InputPinMode::Busholder);
    }

    #[test]
    fn mode_sets_are_disjoint_per_direction() {
        assert!(OutputPinMode::parse_label("pullup").is_err());
        assert!(InputPinMode::parse_label("wiredOr").is_err());
    }

    #[test]
    fn payload_widths() {
        assert_eq!(PayloadType::U8.size_bytes(), 1);
        assert_eq!(PayloadType::S64.size_bytes(), 8);
        assert_eq!(PayloadType::Float.size_bytes(), 4);
        assert!(PayloadType::Float.is_signed());
        assert!(!PayloadType::U32.is_signed());
    }

    #[test]
    fn display_uses_symbolic_name() {
        assert_eq!(RegisterRole::None.to_string(), "NONE");
        assert_eq!(PinDirection::Output.to_string(), "output");
        assert!(PayloadType::VARIANTS.contains(&"Float"));
    }
}
