//! The capability shared by every schema entity.

use std::borrow::Cow;
use std::sync::Arc;

use serde_json::{Map, Value};

use crate::xref::{EntityKind, UidReference};

/// Loosely-typed attribute map: the raw input of every constructor and the
/// output of [`Entity::to_dict`].
pub type Attributes = Map<String, Value>;

/// A named, referenceable, serializable schema entity.
pub trait Entity {
    /// Entity name.
    fn name(&self) -> Cow<'_, str>;

    /// The handle acquired when the entity was constructed.
    fn reference(&self) -> &UidReference;

    fn kind(&self) -> EntityKind {
        self.reference().kind()
    }

    /// Attribute view for downstream templates.
    ///
    /// Keys use the document's attribute names. The entity's own handle is
    /// not included, owned children appear as their own dictionaries, and
    /// masks resolved from a registry appear as their handle identifier.
    fn to_dict(&self) -> Attributes;

    fn render_reference(&self, label: Option<&str>) -> String {
        self.reference().render_reference(label)
    }

    fn render_pointer(&self, label: Option<&str>) -> String {
        self.reference().render_pointer(label)
    }
}

impl<T: Entity + ?Sized> Entity for Arc<T> {
    fn name(&self) -> Cow<'_, str> {
        (**self).name()
    }

    fn reference(&self) -> &UidReference {
        (**self).reference()
    }

    fn to_dict(&self) -> Attributes {
        (**self).to_dict()
    }
}

/// Insert `value` under `key` when present, `null` otherwise.
pub(crate) fn put<V: Into<Value>>(dict: &mut Attributes, key: &str, value: Option<V>) {
    dict.insert(key.to_string(), value.map_or(Value::Null, Into::into));
}
