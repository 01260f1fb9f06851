//! Compile-time schema descriptors and the object-safe [`Model`] accessor trait.
//!
//! `#[derive(Model)]` generates both traits. The descriptor is a static table
//! of [`FieldDef`]s carrying the raw tag strings; tags are interpreted at
//! reflection time by [`crate::reflect`].

use crate::error::OrmResult;
use crate::value::{FieldType, Kind, Value};

/// One declared struct field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldDef {
    /// Rust field identifier.
    pub key: &'static str,
    /// `#[orm(column = "...")]`
    pub column: Option<&'static str>,
    /// `#[orm(model = "...")]`, the attribute mini-language.
    pub tag: &'static str,
    pub kind: Kind,
}

impl FieldDef {
    pub const fn new(key: &'static str, kind: Kind) -> Self {
        Self {
            key,
            column: None,
            tag: "",
            kind,
        }
    }

    pub const fn column(mut self, column: &'static str) -> Self {
        self.column = Some(column);
        self
    }

    pub const fn tag(mut self, tag: &'static str) -> Self {
        self.tag = tag;
        self
    }
}

/// Static description of a model type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Schema {
    /// Rust struct identifier.
    pub name: &'static str,
    /// Fields in declaration order.
    pub fields: &'static [FieldDef],
}

impl Schema {
    pub fn field(&self, key: &str) -> Option<&'static FieldDef> {
        self.fields.iter().find(|f| f.key == key)
    }
}

/// Runtime access to a model instance.
///
/// Object safe, so nested relations and registered targets can be handled as
/// `&dyn Model` / `Box<dyn Model>`.
pub trait Model: Send + Sync {
    fn schema(&self) -> &'static Schema;

    /// Current field values, one per [`Schema::fields`] entry in the same order.
    /// Relation and metadata fields report [`Value::Null`].
    fn values(&self) -> Vec<Value>;

    /// Store `value` into the field named `key`.
    fn assign(&mut self, key: &str, value: Value) -> OrmResult<()>;

    /// Nested models held by the relation field `key`.
    fn relations(&self, key: &str) -> Vec<&dyn Model>;
}

/// A [`Model`] that can be created from nothing, for fetching into.
pub trait Entity: Model + Default + 'static {
    fn descriptor() -> &'static Schema;
}

/// Marker field type carrying table-level attributes such as `table:users`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct MetaData;

impl FieldType for MetaData {
    const KIND: Kind = Kind::Metadata;

    fn to_value(&self) -> Value {
        Value::Null
    }

    fn from_value(_: Value) -> OrmResult<Self> {
        Ok(MetaData)
    }
}
