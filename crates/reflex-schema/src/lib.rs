//! Schema object model for device register specifications.
//!
//! A device document describes a device's metadata, registers, masks, and
//! I/O pins as loosely-typed attributes. This crate turns it into a strict,
//! cross-referenced model for documentation and code generators:
//!
//! - **Converters** ([`convert`]): closed enums parsed from exact labels.
//! - **Identity** ([`xref`]): every entity owns a unique [`UidReference`]
//!   that renders as a cross-reference link or an anchor token.
//! - **Masks** ([`mask`]): bitmasks and value groups, published into a
//!   caller-owned [`MaskRegistry`] so registers can reference them by name.
//! - **Registers** ([`register`]): addressable registers and their payload
//!   members.
//! - **Pins** ([`pin`]): input/output pins, dispatched on `direction`.
//! - **Assembly** ([`device`], [`load`]): phased build of a whole document.

pub mod collection;
pub mod convert;
pub mod device;
pub mod entity;
pub mod error;
pub mod load;
pub mod mask;
pub mod metadata;
pub mod pin;
pub mod register;
pub mod xref;

mod fields;

pub use collection::Collection;
pub use convert::{
    InitialState, InputPinMode, InterruptPriority, MaskCategory, OutputPinMode, PayloadType,
    PinDirection, RegisterRole, Symbolic, TriggerMode, Visibility,
};
pub use device::{BuildOptions, DeviceModel, DeviceSummary};
pub use entity::{Attributes, Entity};
pub use error::{LoadError, SchemaError};
pub use fields::coerce_int;
pub use load::{discover_devices, load_device, load_document, parse_device_json, parse_device_toml};
pub use mask::{BitOrValue, Mask, MaskRegistry};
pub use metadata::Metadata;
pub use pin::{dispatch_pin, dispatch_pin_from, InputPin, OutputPin, PinMap};
pub use register::{Bounds, PayloadMember, PayloadSpec, Register};
pub use xref::{EntityKind, UidReference, XrefEntry, XrefTable};
