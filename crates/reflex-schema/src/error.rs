//! Error types for schema construction and document loading.

use std::path::PathBuf;

use uuid::Uuid;

/// Errors raised while building schema entities from raw attributes.
///
/// Every variant names the entity or field at fault so a driver can report
/// which entity failed, on which field, and why.
#[derive(Debug, thiserror::Error)]
pub enum SchemaError {
    /// A label could not be converted to an enumerated value.
    #[error("cannot convert {value} to {kind}")]
    TypeConversion {
        /// Name of the target enumerated type.
        kind: &'static str,
        /// The offending input, rendered as text.
        value: String,
    },

    /// A non-numeric value was given where an integer or number was required.
    #[error("field '{field}' expects a number, got {value}")]
    NumericConversion {
        /// Attribute name.
        field: String,
        /// The offending input, rendered as text.
        value: String,
    },

    /// Neither `bits` nor `values` was present, so the mask category is unknown.
    #[error("could not infer category of mask '{mask}': expected a 'bits' or 'values' key, assign the category explicitly")]
    CategoryInference {
        /// Mask name.
        mask: String,
    },

    /// Category inference was disabled and no category was supplied.
    #[error("mask '{mask}' needs an explicit category when inference is disabled")]
    MissingCategory {
        /// Mask name.
        mask: String,
    },

    /// A mask was referenced by name before (or without) being defined.
    #[error("mask '{name}' has not been defined")]
    UnknownMask {
        /// Referenced mask name.
        name: String,
    },

    /// A mask was redefined while redefinition is disallowed.
    #[error("mask '{name}' is already defined")]
    MaskRedefined {
        /// Mask name.
        name: String,
    },

    /// A required field or discriminator is absent.
    #[error("{entity}: missing required field '{field}'")]
    MissingField {
        /// Entity name (or kind when the name itself is missing).
        entity: String,
        /// Attribute name.
        field: &'static str,
    },

    /// A `name` attribute disagrees with the name the entity is built under.
    #[error("{entity}: 'name' attribute {found} does not match")]
    NameMismatch {
        /// Name the entity is built under.
        entity: String,
        /// The conflicting attribute, rendered as text.
        found: String,
    },

    /// An attribute key the entity does not accept.
    #[error("{entity}: unknown field '{field}'")]
    UnknownField {
        /// Entity name.
        entity: String,
        /// Attribute name.
        field: String,
    },

    /// Pin direction outside the closed `input`/`output` set.
    #[error("pin '{pin}': invalid direction {value}, expected \"input\" or \"output\"")]
    InvalidDirection {
        /// Pin name.
        pin: String,
        /// The offending input, rendered as text.
        value: String,
    },

    /// A variant-specific pin constructor was handed the other direction.
    #[error("pin '{pin}': direction is {found}, expected {expected}")]
    DirectionMismatch {
        /// Pin name.
        pin: String,
        /// Direction the constructor builds.
        expected: &'static str,
        /// Direction found in the attributes.
        found: &'static str,
    },

    /// A value was given in a form the field does not support.
    #[error("{entity}: field '{field}' has an unexpected shape, expected {expected}")]
    UnexpectedShape {
        /// Entity name.
        entity: String,
        /// Attribute name.
        field: &'static str,
        /// Description of the accepted forms.
        expected: &'static str,
    },

    /// A collection was built from, or reduced to, zero elements.
    #[error("collection cannot be empty")]
    EmptyCollection,

    /// Positional access past the end of a collection.
    #[error("index {index} out of range for collection of length {len}")]
    IndexOutOfRange {
        /// Requested index.
        index: usize,
        /// Collection length.
        len: usize,
    },

    /// Two distinct entities carry the same reference handle.
    #[error("reference {uid} is already assigned to another entity")]
    DuplicateReference {
        /// The colliding handle.
        uid: Uuid,
    },
}

/// Result type for schema operations.
pub type Result<T> = std::result::Result<T, SchemaError>;

/// Errors raised while reading a device document from disk or text.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    /// JSON deserialization error.
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML deserialization error.
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    /// I/O error reading device files.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Device file not found.
    #[error("device file not found: {}", path.display())]
    NotFound {
        /// The path that was not found.
        path: PathBuf,
    },

    /// File extension is neither `.json` nor `.toml`.
    #[error("unsupported device file format: {}", path.display())]
    UnsupportedFormat {
        /// The offending path.
        path: PathBuf,
    },

    /// The document parsed but does not describe a valid device.
    #[error(transparent)]
    Schema(#[from] SchemaError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_names_the_entity() {
        let err = SchemaError::MissingField {
            entity: "REG_CONFIG".into(),
            field: "address",
        };
        let text = err.to_string();
        assert!(text.contains("REG_CONFIG"));
        assert!(text.contains("address"));
    }

    #[test]
    fn load_error_wraps_schema_error() {
        let err: LoadError = SchemaError::UnknownMask { name: "M".into() }.into();
        assert!(matches!(err, LoadError::Schema(SchemaError::UnknownMask { .. })));
        assert!(err.to_string().contains("'M'"));
    }
}
