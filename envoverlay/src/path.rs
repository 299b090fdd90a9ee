//! Field paths and environment variable name derivation.
//!
//! A field's variable name is the upper-cased prefix followed by the
//! upper-cased names of every field from the root down to it, all joined
//! with [`SEPARATOR`]:
//!
//! ```text
//! prefix "yamlconfig", path astruct.asubstruct.astring
//!     => YAMLCONFIG_ASTRUCT_ASUBSTRUCT_ASTRING
//! ```

use std::fmt;

/// Separator between the prefix and path segments in a variable name.
pub const SEPARATOR: char = '_';

/// The sequence of field names from the root record to a field.
///
/// # Examples
///
/// ```
/// use envoverlay::FieldPath;
///
/// let mut path = FieldPath::new();
/// path.push("bstruct");
/// path.push("bint");
///
/// assert_eq!(path.to_string(), "bstruct.bint");
/// assert_eq!(path.variable_name("app"), "APP_BSTRUCT_BINT");
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldPath {
    segments: Vec<String>,
}

impl FieldPath {
    /// Creates an empty path pointing at the root record.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            segments: Vec::new(),
        }
    }

    /// Descends into the field `segment`.
    pub fn push(&mut self, segment: &str) {
        self.segments.push(segment.to_string());
    }

    /// Returns to the parent record.
    pub fn pop(&mut self) -> Option<String> {
        self.segments.pop()
    }

    /// The field names making up this path, root first.
    #[must_use]
    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// Number of fields between the root and the end of this path.
    #[must_use]
    pub fn depth(&self) -> usize {
        self.segments.len()
    }

    /// Returns true if this path points at the root record.
    #[must_use]
    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    /// Derives the environment variable name for this path under `prefix`.
    #[must_use]
    pub fn variable_name(&self, prefix: &str) -> String {
        variable_name(prefix, self.segments.as_slice())
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.segments.join("."))
    }
}

/// Derives an environment variable name from a prefix and path segments.
///
/// An empty prefix contributes nothing, so the name starts at the first
/// segment.
///
/// # Examples
///
/// ```
/// use envoverlay::path::variable_name;
///
/// assert_eq!(
///     variable_name("yamlconfig", &["astruct", "asubstruct", "astring"]),
///     "YAMLCONFIG_ASTRUCT_ASUBSTRUCT_ASTRING"
/// );
/// assert_eq!(variable_name("", &["cstring"]), "CSTRING");
/// ```
#[must_use]
pub fn variable_name<S: AsRef<str>>(prefix: &str, segments: &[S]) -> String {
    let mut name = prefix.to_uppercase();
    for segment in segments {
        if !name.is_empty() {
            name.push(SEPARATOR);
        }
        name.push_str(&segment.as_ref().to_uppercase());
    }
    name
}
