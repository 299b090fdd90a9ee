//! Pluggable decoding of override values.
//!
//! An override value is the raw text of an environment variable. A
//! [`Decoder`] turns that text into the concrete type of the field it
//! overrides, so the same traversal works for any serialization format.

use serde::de::DeserializeOwned;

use crate::error::BoxError;

/// Converts the raw text of an environment variable into a typed value.
///
/// Implementations must not depend on the field being overridden; the
/// traversal decides how the decoded value is written back (replace or
/// merge).
///
/// # Examples
///
/// ```
/// use envoverlay::{Decoder, YamlDecoder};
///
/// let port: u16 = YamlDecoder.decode(b"8080").unwrap();
/// assert_eq!(port, 8080);
///
/// let hosts: Vec<String> = YamlDecoder.decode(b"[a, b]").unwrap();
/// assert_eq!(hosts, vec!["a", "b"]);
/// ```
pub trait Decoder {
    /// Short name of the format, used in errors and log lines.
    fn format(&self) -> &'static str;

    /// Decode `raw` into a value of type `T`.
    ///
    /// # Errors
    ///
    /// Returns the format library's error if `raw` is not valid input for `T`.
    fn decode<T: DeserializeOwned>(&self, raw: &[u8]) -> Result<T, BoxError>;
}

impl<D: Decoder> Decoder for &D {
    fn format(&self) -> &'static str {
        (**self).format()
    }

    fn decode<T: DeserializeOwned>(&self, raw: &[u8]) -> Result<T, BoxError> {
        (**self).decode(raw)
    }
}

/// Decodes override values as YAML.
///
/// Plain scalars decode into any string field unquoted, so
/// `APP_NAME=hello world` works for a `String`. Maps use flow style
/// (`{a: 1, b: 2}`) and sequences use brackets (`[a, b, c]`).
#[derive(Debug, Clone, Copy, Default)]
pub struct YamlDecoder;

impl Decoder for YamlDecoder {
    fn format(&self) -> &'static str {
        "yaml"
    }

    fn decode<T: DeserializeOwned>(&self, raw: &[u8]) -> Result<T, BoxError> {
        Ok(serde_yaml::from_slice(raw)?)
    }
}

/// Decodes override values as JSON.
///
/// Strings must be quoted (`"\"hello\""`); numbers, booleans, arrays and
/// objects use their JSON literal forms.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonDecoder;

impl Decoder for JsonDecoder {
    fn format(&self) -> &'static str {
        "json"
    }

    fn decode<T: DeserializeOwned>(&self, raw: &[u8]) -> Result<T, BoxError> {
        Ok(serde_json::from_slice(raw)?)
    }
}
