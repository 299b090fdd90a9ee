//! The traversable capability for configuration records.
//!
//! A configuration type opts into overlaying by implementing [`Record`]:
//! it hands each of its fields to a [`FieldVisitor`] under the field's
//! serialized name. This mirrors how `serde::Serialize` hands fields to a
//! `Serializer`, and the same visitor drives both the overlay pass and
//! variable discovery.
//!
//! How a field absorbs an override follows from its type through [`Field`]:
//! maps merge, `Vec`s and scalars are replaced, records are traversed.
//! Structs get both traits from `#[derive(Record)]`, which reads the field
//! names from the serde attributes:
//!
//! ```
//! use std::collections::HashMap;
//! use serde::Deserialize;
//! use envoverlay::Record;
//!
//! #[derive(Debug, Default, Deserialize, Record)]
//! struct Server {
//!     host: String,
//!     #[serde(rename = "listen-port")]
//!     port: u16,
//!     labels: HashMap<String, String>,
//!     peers: Vec<String>,
//! }
//! ```

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::hash::{BuildHasher, Hash};

use serde::de::DeserializeOwned;
use serde_json::{Number, Value};

use crate::error::{Error, Result};

/// The kind of a field, which decides how an override is applied to it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldKind {
    /// A nested record; traversed, never overridden as a whole.
    Record,
    /// A single value; an override replaces it.
    Scalar,
    /// An associative container; an override is merged into it.
    Map,
    /// An ordered list; an override replaces it.
    Sequence,
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Record => write!(f, "record"),
            Self::Scalar => write!(f, "scalar"),
            Self::Map => write!(f, "map"),
            Self::Sequence => write!(f, "sequence"),
        }
    }
}

/// A configuration node made of named, ordered fields.
pub trait Record {
    /// Hands every field to `visitor`, in declaration order.
    ///
    /// Field names are the names the serialization layer uses (the serde
    /// rename, if any).
    ///
    /// # Errors
    ///
    /// Propagates the first error returned by the visitor.
    fn visit_fields<V: FieldVisitor>(&mut self, visitor: &mut V) -> Result<()>;

    /// An empty instance, created when a variable targets a field beneath
    /// an absent optional section. `None` keeps such sections absent.
    #[must_use]
    fn empty() -> Option<Self>
    where
        Self: Sized,
    {
        None
    }
}

/// A value that can sit in a record field.
///
/// The implementation picks the [`FieldVisitor`] method, and with it the
/// override rule, for the type. Scalars are declared with
/// [`impl_scalar!`](crate::impl_scalar); records get this trait from
/// `#[derive(Record)]`.
pub trait Field {
    /// Hands this field to the visitor method matching its kind.
    ///
    /// # Errors
    ///
    /// Propagates the visitor's error.
    fn visit_field<V: FieldVisitor>(&mut self, name: &str, visitor: &mut V) -> Result<()>;

    /// Same as [`visit_field`](Self::visit_field) for an `Option<Self>`
    /// field. By default an absent value is skipped.
    ///
    /// # Errors
    ///
    /// Propagates the visitor's error.
    fn visit_optional<V: FieldVisitor>(
        value: &mut Option<Self>,
        name: &str,
        visitor: &mut V,
    ) -> Result<()>
    where
        Self: Sized,
    {
        match value {
            Some(inner) => inner.visit_field(name, visitor),
            None => Ok(()),
        }
    }
}

/// Receives the fields of a [`Record`], one call per field.
pub trait FieldVisitor {
    /// Visit a nested record.
    ///
    /// # Errors
    ///
    /// Returns an error if any field beneath the record fails.
    fn record<R: Record>(&mut self, name: &str, value: &mut R) -> Result<()>;

    /// Visit an optional nested record.
    ///
    /// # Errors
    ///
    /// Returns an error if any field beneath the record fails.
    fn optional_record<R: Record>(&mut self, name: &str, value: &mut Option<R>) -> Result<()>;

    /// Visit a single value.
    ///
    /// # Errors
    ///
    /// Returns an error if the field's override cannot be applied.
    fn scalar<T: DeserializeOwned>(&mut self, name: &str, value: &mut T) -> Result<()>;

    /// Visit an associative container.
    ///
    /// # Errors
    ///
    /// Returns an error if the field's override cannot be applied.
    fn map<M: MapField>(&mut self, name: &str, value: &mut M) -> Result<()>;

    /// Visit an ordered list.
    ///
    /// # Errors
    ///
    /// Returns an error if the field's override cannot be applied.
    fn sequence<S: DeserializeOwned>(&mut self, name: &str, value: &mut S) -> Result<()>;
}

/// An associative container that absorbs overrides by merging.
///
/// Keys present in the override are inserted or replaced; keys only present
/// in the original container are kept.
pub trait MapField: DeserializeOwned {
    /// Merge `overrides` into `self`, the override winning on shared keys.
    fn merge(&mut self, overrides: Self);
}

impl<K, V, S> MapField for HashMap<K, V, S>
where
    K: DeserializeOwned + Eq + Hash,
    V: DeserializeOwned,
    S: BuildHasher + Default,
{
    fn merge(&mut self, overrides: Self) {
        self.extend(overrides);
    }
}

impl<K, V> MapField for BTreeMap<K, V>
where
    K: DeserializeOwned + Ord,
    V: DeserializeOwned,
{
    fn merge(&mut self, overrides: Self) {
        self.extend(overrides);
    }
}

impl MapField for serde_json::Map<String, Value> {
    fn merge(&mut self, overrides: Self) {
        self.extend(overrides);
    }
}

/// An absent map takes the override as-is; a null override changes nothing.
impl<M: MapField> MapField for Option<M> {
    fn merge(&mut self, overrides: Self) {
        let Some(overrides) = overrides else {
            return;
        };
        match self {
            Some(existing) => existing.merge(overrides),
            None => *self = Some(overrides),
        }
    }
}

impl<T: Field> Field for Option<T> {
    fn visit_field<V: FieldVisitor>(&mut self, name: &str, visitor: &mut V) -> Result<()> {
        T::visit_optional(self, name, visitor)
    }
}

impl<T: DeserializeOwned> Field for Vec<T> {
    fn visit_field<V: FieldVisitor>(&mut self, name: &str, visitor: &mut V) -> Result<()> {
        visitor.sequence(name, self)
    }

    fn visit_optional<V: FieldVisitor>(
        value: &mut Option<Self>,
        name: &str,
        visitor: &mut V,
    ) -> Result<()> {
        visitor.sequence(name, value)
    }
}

impl<K, V, S> Field for HashMap<K, V, S>
where
    K: DeserializeOwned + Eq + Hash,
    V: DeserializeOwned,
    S: BuildHasher + Default,
{
    fn visit_field<W: FieldVisitor>(&mut self, name: &str, visitor: &mut W) -> Result<()> {
        visitor.map(name, self)
    }

    fn visit_optional<W: FieldVisitor>(
        value: &mut Option<Self>,
        name: &str,
        visitor: &mut W,
    ) -> Result<()> {
        visitor.map(name, value)
    }
}

impl<K, V> Field for BTreeMap<K, V>
where
    K: DeserializeOwned + Ord,
    V: DeserializeOwned,
{
    fn visit_field<W: FieldVisitor>(&mut self, name: &str, visitor: &mut W) -> Result<()> {
        visitor.map(name, self)
    }

    fn visit_optional<W: FieldVisitor>(
        value: &mut Option<Self>,
        name: &str,
        visitor: &mut W,
    ) -> Result<()> {
        visitor.map(name, value)
    }
}

impl Field for serde_json::Map<String, Value> {
    fn visit_field<V: FieldVisitor>(&mut self, name: &str, visitor: &mut V) -> Result<()> {
        visitor.map(name, self)
    }

    fn visit_optional<V: FieldVisitor>(
        value: &mut Option<Self>,
        name: &str,
        visitor: &mut V,
    ) -> Result<()> {
        visitor.map(name, value)
    }
}

/// Implements [`Field`] for types overridden as a single value.
///
/// Use it for enums and newtypes that deserialize from one scalar: an
/// override decodes into the type and replaces the field.
///
/// # Examples
///
/// ```
/// use serde::Deserialize;
/// use envoverlay::Record;
///
/// #[derive(Debug, Default, Deserialize, PartialEq)]
/// #[serde(rename_all = "lowercase")]
/// enum Level {
///     #[default]
///     Info,
///     Debug,
/// }
///
/// envoverlay::impl_scalar!(Level);
///
/// #[derive(Debug, Default, Deserialize, Record)]
/// struct Logging {
///     level: Level,
/// }
/// ```
#[macro_export]
macro_rules! impl_scalar {
    ($($ty:ty),+ $(,)?) => {
        $(
            impl $crate::Field for $ty {
                fn visit_field<V: $crate::FieldVisitor>(
                    &mut self,
                    name: &str,
                    visitor: &mut V,
                ) -> $crate::Result<()> {
                    visitor.scalar(name, self)
                }

                fn visit_optional<V: $crate::FieldVisitor>(
                    value: &mut ::core::option::Option<Self>,
                    name: &str,
                    visitor: &mut V,
                ) -> $crate::Result<()> {
                    visitor.scalar(name, value)
                }
            }
        )+
    };
}

impl_scalar!(
    bool,
    char,
    i8,
    i16,
    i32,
    i64,
    i128,
    isize,
    u8,
    u16,
    u32,
    u64,
    u128,
    usize,
    f32,
    f64,
    String,
    Number,
    std::path::PathBuf,
    std::net::IpAddr,
    std::net::Ipv4Addr,
    std::net::Ipv6Addr,
    std::net::SocketAddr,
);

/// Dynamically typed trees: objects are records, arrays are sequences and
/// everything else is a scalar.
///
/// Because every object is a record, maps inside a dynamic tree are
/// addressed key by key rather than merged from a single variable.
impl Record for Value {
    fn visit_fields<V: FieldVisitor>(&mut self, visitor: &mut V) -> Result<()> {
        let found = value_kind(self);
        let Value::Object(fields) = self else {
            return Err(Error::InvalidRootKind { found });
        };

        for (name, value) in fields.iter_mut() {
            value.visit_field(name, visitor)?;
        }
        Ok(())
    }

    fn empty() -> Option<Self> {
        Some(Value::Object(serde_json::Map::new()))
    }
}

/// A dynamic leaf keeps the kind it was loaded with: strings decode as
/// strings, booleans as booleans and numbers as numbers. Only a null leaf
/// accepts any value.
impl Field for Value {
    fn visit_field<V: FieldVisitor>(&mut self, name: &str, visitor: &mut V) -> Result<()> {
        match self {
            Value::Object(_) => visitor.record(name, self),
            Value::Array(items) => visitor.sequence(name, items),
            Value::String(text) => visitor.scalar(name, text),
            Value::Bool(flag) => visitor.scalar(name, flag),
            Value::Number(number) => visitor.scalar(name, number),
            Value::Null => visitor.scalar(name, self),
        }
    }
}

fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
