//! Typed access to a loosely-typed attribute map.
//!
//! `null` values are treated the same as absent keys.

use serde_json::{Number, Value};

use crate::convert::Symbolic;
use crate::entity::Attributes;
use crate::error::{Result, SchemaError};

/// Read-only view over one entity's attributes.
pub(crate) struct Fields<'a> {
    entity: &'a str,
    attrs: &'a Attributes,
}

impl<'a> Fields<'a> {
    /// Wrap `attrs`, rejecting any key outside `accepted`.
    pub(crate) fn new(entity: &'a str, attrs: &'a Attributes, accepted: &[&str]) -> Result<Self> {
        if let Some(key) = attrs.keys().find(|key| !accepted.contains(&key.as_str())) {
            return Err(SchemaError::UnknownField {
                entity: entity.to_string(),
                field: key.clone(),
            });
        }
        Ok(Self { entity, attrs })
    }

    pub(crate) fn entity(&self) -> &'a str {
        self.entity
    }

    pub(crate) fn get(&self, key: &str) -> Option<&'a Value> {
        self.attrs.get(key).filter(|value| !value.is_null())
    }

    pub(crate) fn require(&self, key: &'static str) -> Result<&'a Value> {
        self.get(key).ok_or_else(|| SchemaError::MissingField {
            entity: self.entity.to_string(),
            field: key,
        })
    }

    pub(crate) fn int<T: TryFrom<i128>>(&self, key: &str) -> Result<Option<T>> {
        self.get(key).map(|value| coerce_int(key, value)).transpose()
    }

    pub(crate) fn required_int<T: TryFrom<i128>>(&self, key: &'static str) -> Result<T> {
        coerce_int(key, self.require(key)?)
    }

    pub(crate) fn number(&self, key: &str) -> Result<Option<Number>> {
        self.get(key).map(|value| coerce_number(key, value)).transpose()
    }

    pub(crate) fn flag(&self, key: &str) -> Result<Option<bool>> {
        self.get(key).map(|value| coerce_bool(key, value)).transpose()
    }

    pub(crate) fn required_flag(&self, key: &'static str) -> Result<bool> {
        coerce_bool(key, self.require(key)?)
    }

    pub(crate) fn text(&self, key: &'static str) -> Result<Option<String>> {
        self.get(key)
            .map(|value| coerce_text(self.entity, key, value))
            .transpose()
    }

    pub(crate) fn required_text(&self, key: &'static str) -> Result<String> {
        coerce_text(self.entity, key, self.require(key)?)
    }

    pub(crate) fn symbol<E: Symbolic>(&self, key: &str) -> Result<Option<E>> {
        self.get(key).map(E::from_value).transpose()
    }

    pub(crate) fn required_symbol<E: Symbolic>(&self, key: &'static str) -> Result<E> {
        E::from_value(self.require(key)?)
    }
}

/// Coerce a raw value to an integer.
///
/// Accepts JSON integers, integral floats, and decimal or `0x`-prefixed
/// hexadecimal text. Values that do not fit `T` are rejected.
pub fn coerce_int<T: TryFrom<i128>>(field: &str, value: &Value) -> Result<T> {
    let wide = match value {
        Value::Number(n) => number_to_i128(n),
        Value::String(text) => parse_int_text(text),
        _ => None,
    };
    wide.and_then(|wide| T::try_from(wide).ok())
        .ok_or_else(|| SchemaError::NumericConversion {
            field: field.to_string(),
            value: value.to_string(),
        })
}

/// Parse integer text, decimal or `0x`-prefixed hexadecimal, with an optional sign.
pub fn parse_int_text(text: &str) -> Option<i128> {
    let text = text.trim();
    let (negative, digits) = match text.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, text.strip_prefix('+').unwrap_or(text)),
    };
    let (radix, digits) = match digits
        .strip_prefix("0x")
        .or_else(|| digits.strip_prefix("0X"))
    {
        Some(hex) => (16, hex),
        None => (10, digits),
    };
    let digits = digits.replace('_', "");
    // One sign only, and only ahead of the radix prefix.
    if digits.starts_with(|c: char| c == '+' || c == '-') {
        return None;
    }
    let magnitude = i128::from_str_radix(&digits, radix).ok()?;
    Some(if negative { -magnitude } else { magnitude })
}

fn number_to_i128(n: &Number) -> Option<i128> {
    if let Some(v) = n.as_i64() {
        return Some(v.into());
    }
    if let Some(v) = n.as_u64() {
        return Some(v.into());
    }
    n.as_f64()
        .filter(|f| f.is_finite() && f.fract() == 0.0 && f.abs() < 1e38)
        .map(|f| f as i128)
}

fn coerce_number(field: &str, value: &Value) -> Result<Number> {
    match value {
        Value::Number(n) => Ok(n.clone()),
        other => Err(SchemaError::NumericConversion {
            field: field.to_string(),
            value: other.to_string(),
        }),
    }
}

fn coerce_bool(field: &str, value: &Value) -> Result<bool> {
    match value {
        Value::Bool(b) => Ok(*b),
        other => Err(SchemaError::TypeConversion {
            kind: "bool",
            value: format!("{other} (field '{field}')"),
        }),
    }
}

fn coerce_text(entity: &str, field: &'static str, value: &Value) -> Result<String> {
    match value {
        Value::String(s) => Ok(s.clone()),
        Value::Number(n) => Ok(n.to_string()),
        Value::Bool(b) => Ok(b.to_string()),
        _ => Err(SchemaError::UnexpectedShape {
            entity: entity.to_string(),
            field,
            expected: "text",
        }),
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
    fn integers_from_numbers_and_text() {
        assert_eq!(coerce_int::<u32>("address", &json!(32)).unwrap(), 32);
        assert_eq!(coerce_int::<u32>("address", &json!("0x20")).unwrap(), 32);
        assert_eq!(coerce_int::<u32>("address", &json!(" 42 ")).unwrap(), 42);
        assert_eq!(coerce_int::<i64>("offset", &json!("-0x10")).unwrap(), -16);
        assert_eq!(coerce_int::<u32>("length", &json!(4.0)).unwrap(), 4);
        assert_eq!(
            coerce_int::<u64>("mask", &json!(u64::MAX)).unwrap(),
            u64::MAX
        );
    }

    #[test]
    fn non_numeric_is_rejected() {
        for bad in [json!("abc"), json!(true), json!([1]), json!(2.5)] {
            let err = coerce_int::<u32>("address", &bad).unwrap_err();
            assert!(matches!(err, SchemaError::NumericConversion { .. }), "{bad}");
        }
    }

    #[test]
    fn repeated_or_misplaced_sign_is_rejected() {
        for bad in ["0x-5", "--5", "+-5", "-+5", "0x+5", "0x_-5", "-", "0x"] {
            let err = coerce_int::<i64>("offset", &json!(bad)).unwrap_err();
            assert!(matches!(err, SchemaError::NumericConversion { .. }), "{bad}");
        }
        assert_eq!(coerce_int::<i64>("offset", &json!("+5")).unwrap(), 5);
    }

    #[test]
    fn out_of_range_is_rejected() {
        assert!(coerce_int::<u8>("port", &json!(256)).is_err());
        assert!(coerce_int::<u32>("address", &json!(-1)).is_err());
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let raw = attrs(json!({ "address": 1, "adress": 2 }));
        let err = Fields::new("R", &raw, &["address"]).err().unwrap();
        assert!(matches!(err, SchemaError::UnknownField { field, .. } if field == "adress"));
    }

    #[test]
    fn null_reads_as_absent() {
        let raw = attrs(json!({ "description": null }));
        let fields = Fields::new("R", &raw, &["description"]).unwrap();
        assert_eq!(fields.text("description").unwrap(), None);
        assert!(matches!(
            fields.required_text("description"),
            Err(SchemaError::MissingField { field: "description", .. })
        ));
    }

    #[test]
    fn text_accepts_scalars() {
        let raw = attrs(json!({ "port": 3, "group": "io" }));
        let fields = Fields::new("P", &raw, &["port", "group"]).unwrap();
        assert_eq!(fields.required_text("port").unwrap(), "3");
        assert_eq!(fields.text("group").unwrap().as_deref(), Some("io"));
    }
}
