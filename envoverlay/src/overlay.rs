//! The overlay engine.
//!
//! [`EnvOverlay`] walks a [`Record`] depth-first and, for every scalar, map
//! and sequence field, looks up the environment variable derived from the
//! field's path. Present variables are decoded into the field's type:
//!
//! - scalars and sequences are replaced by the decoded value
//! - maps have the decoded entries merged in, the override winning on
//!   shared keys
//!
//! Absent variables leave the field untouched. The first decode failure
//! stops the pass; fields overridden before it keep their new values.

use serde::de::DeserializeOwned;

use crate::decode::Decoder;
use crate::env::{Environment, ProcessEnv};
use crate::error::{Error, Result};
use crate::path::{self, FieldPath};
use crate::record::{FieldKind, FieldVisitor, MapField, Record};

/// Overlays environment variables onto configuration records.
///
/// # Examples
///
/// ```
/// use std::collections::HashMap;
/// use serde::Deserialize;
/// use envoverlay::{EnvOverlay, Record, YamlDecoder};
///
/// #[derive(Debug, Default, Deserialize, Record)]
/// struct Database {
///     port: u16,
///     replicas: Vec<String>,
/// }
///
/// #[derive(Debug, Default, Deserialize, Record)]
/// struct Config {
///     name: String,
///     database: Database,
/// }
///
/// let env: HashMap<String, String> = [
///     ("APP_DATABASE_PORT".to_string(), "5433".to_string()),
///     ("APP_DATABASE_REPLICAS".to_string(), "[db1, db2]".to_string()),
/// ]
/// .into();
///
/// let mut config: Config = serde_yaml::from_str("name: svc\ndatabase: {port: 5432, replicas: []}").unwrap();
/// EnvOverlay::new("app", YamlDecoder)
///     .with_environment(env)
///     .parse(&mut config)
///     .unwrap();
///
/// assert_eq!(config.name, "svc");
/// assert_eq!(config.database.port, 5433);
/// assert_eq!(config.database.replicas, vec!["db1", "db2"]);
/// ```
#[derive(Debug, Clone)]
pub struct EnvOverlay<D, E = ProcessEnv> {
    prefix: String,
    decoder: D,
    env: E,
}

impl<D: Decoder> EnvOverlay<D> {
    /// Creates an overlay reading the process environment.
    ///
    /// The prefix is upper-cased when names are derived. It is not checked
    /// for the `_` separator; a prefix containing one is used as-is.
    #[must_use]
    pub fn new(prefix: impl Into<String>, decoder: D) -> Self {
        Self {
            prefix: prefix.into(),
            decoder,
            env: ProcessEnv,
        }
    }
}

impl<D: Decoder, E: Environment> EnvOverlay<D, E> {
    /// Replaces the environment the overlay reads variables from.
    #[must_use]
    pub fn with_environment<F: Environment>(self, env: F) -> EnvOverlay<D, F> {
        EnvOverlay {
            prefix: self.prefix,
            decoder: self.decoder,
            env,
        }
    }

    /// The prefix prepended to every derived variable name.
    #[must_use]
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// The decoder used for override values.
    #[must_use]
    pub const fn decoder(&self) -> &D {
        &self.decoder
    }

    /// Derives the variable name for the field at `segments`.
    ///
    /// # Examples
    ///
    /// ```
    /// use envoverlay::{EnvOverlay, JsonDecoder};
    ///
    /// let overlay = EnvOverlay::new("jsonconfig", JsonDecoder);
    /// assert_eq!(
    ///     overlay.variable_name(&["bstruct", "bslice"]),
    ///     "JSONCONFIG_BSTRUCT_BSLICE"
    /// );
    /// ```
    #[must_use]
    pub fn variable_name(&self, segments: &[&str]) -> String {
        path::variable_name(&self.prefix, segments)
    }

    /// Applies environment overrides to `root` in place.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidRootKind`] if `root` is a dynamic value that
    /// is not an object, and [`Error::Decode`] for the first variable whose
    /// value the decoder rejects.
    pub fn parse<R: Record>(&self, root: &mut R) -> Result<()> {
        self.overlay(root).map(|_| ())
    }

    /// Applies environment overrides to `root` in place and reports which
    /// variables were applied.
    ///
    /// # Errors
    ///
    /// Same as [`parse`](Self::parse).
    pub fn overlay<R: Record>(&self, root: &mut R) -> Result<OverlayReport> {
        let mut pass = OverlayPass {
            prefix: &self.prefix,
            decoder: &self.decoder,
            env: &self.env,
            path: FieldPath::new(),
            applied: Vec::new(),
        };
        root.visit_fields(&mut pass)?;

        log::debug!(
            "applied {} environment override(s) with prefix {}",
            pass.applied.len(),
            self.prefix.to_uppercase()
        );
        Ok(OverlayReport {
            applied: pass.applied,
        })
    }

    /// Lists every variable that can override a field of `R`.
    ///
    /// The environment is not consulted. Absent optional sub-records are
    /// listed when their type provides [`Record::empty`].
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidRootKind`] if `R::default()` is a dynamic
    /// value that is not an object.
    pub fn variables<R: Record + Default>(&self) -> Result<Vec<Variable>> {
        self.variables_in(&mut R::default())
    }

    /// Lists every variable that can override a field of an already loaded
    /// `root`, which is left unchanged.
    ///
    /// Unlike [`variables`](Self::variables) this sees the keys of a
    /// dynamic tree.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidRootKind`] if `root` is a dynamic value that
    /// is not an object.
    pub fn variables_in<R: Record>(&self, root: &mut R) -> Result<Vec<Variable>> {
        let mut collector = VariableCollector {
            prefix: &self.prefix,
            path: FieldPath::new(),
            variables: Vec::new(),
        };
        root.visit_fields(&mut collector)?;
        Ok(collector.variables)
    }
}

/// An override that was applied during a pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppliedOverride {
    /// The environment variable that supplied the value.
    pub variable: String,
    /// Dotted path of the overridden field.
    pub path: String,
    /// How the value was applied.
    pub kind: FieldKind,
}

/// The overrides applied by [`EnvOverlay::overlay`], in traversal order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OverlayReport {
    applied: Vec<AppliedOverride>,
}

impl OverlayReport {
    /// The applied overrides.
    #[must_use]
    pub fn applied(&self) -> &[AppliedOverride] {
        &self.applied
    }

    /// Number of overrides applied.
    #[must_use]
    pub fn len(&self) -> usize {
        self.applied.len()
    }

    /// Returns true if no variable was applied.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.applied.is_empty()
    }

    /// Returns true if `variable` was applied.
    #[must_use]
    pub fn contains(&self, variable: &str) -> bool {
        self.applied.iter().any(|o| o.variable == variable)
    }
}

/// A variable that can override a field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Variable {
    /// The environment variable name.
    pub name: String,
    /// Dotted path of the field it overrides.
    pub path: String,
    /// Kind of the field, which decides the expected value syntax.
    pub kind: FieldKind,
}

struct OverlayPass<'a, D, E> {
    prefix: &'a str,
    decoder: &'a D,
    env: &'a E,
    path: FieldPath,
    applied: Vec<AppliedOverride>,
}

impl<D: Decoder, E: Environment> OverlayPass<'_, D, E> {
    /// Looks up and decodes the override for field `name`, if one is set.
    ///
    /// Empty values count as unset.
    fn fetch<T: DeserializeOwned>(&mut self, name: &str, kind: FieldKind) -> Result<Option<T>> {
        self.path.push(name);
        let variable = self.path.variable_name(self.prefix);
        let field = self.path.to_string();
        self.path.pop();

        let Some(raw) = self.env.var(&variable).filter(|raw| !raw.is_empty()) else {
            log::trace!("{variable} not set, keeping {field}");
            return Ok(None);
        };

        let value = self
            .decoder
            .decode(raw.as_bytes())
            .map_err(|source| Error::Decode {
                variable: variable.clone(),
                format: self.decoder.format(),
                source,
            })?;

        log::debug!("overriding {kind} {field} from {variable}");
        self.applied.push(AppliedOverride {
            variable,
            path: field,
            kind,
        });
        Ok(Some(value))
    }
}

impl<D: Decoder, E: Environment> FieldVisitor for OverlayPass<'_, D, E> {
    fn record<R: Record>(&mut self, name: &str, value: &mut R) -> Result<()> {
        self.path.push(name);
        let result = value.visit_fields(self);
        self.path.pop();
        result
    }

    fn optional_record<R: Record>(&mut self, name: &str, value: &mut Option<R>) -> Result<()> {
        if let Some(inner) = value {
            return self.record(name, inner);
        }
        let Some(mut section) = R::empty() else {
            return Ok(());
        };

        // Materialize the section only if something beneath it is overridden
        let before = self.applied.len();
        self.record(name, &mut section)?;
        if self.applied.len() > before {
            *value = Some(section);
        }
        Ok(())
    }

    fn scalar<T: DeserializeOwned>(&mut self, name: &str, value: &mut T) -> Result<()> {
        if let Some(decoded) = self.fetch(name, FieldKind::Scalar)? {
            *value = decoded;
        }
        Ok(())
    }

    fn map<M: MapField>(&mut self, name: &str, value: &mut M) -> Result<()> {
        if let Some(decoded) = self.fetch(name, FieldKind::Map)? {
            value.merge(decoded);
        }
        Ok(())
    }

    fn sequence<S: DeserializeOwned>(&mut self, name: &str, value: &mut S) -> Result<()> {
        if let Some(decoded) = self.fetch(name, FieldKind::Sequence)? {
            *value = decoded;
        }
        Ok(())
    }
}

struct VariableCollector<'a> {
    prefix: &'a str,
    path: FieldPath,
    variables: Vec<Variable>,
}

impl VariableCollector<'_> {
    fn leaf(&mut self, name: &str, kind: FieldKind) {
        self.path.push(name);
        self.variables.push(Variable {
            name: self.path.variable_name(self.prefix),
            path: self.path.to_string(),
            kind,
        });
        self.path.pop();
    }
}

impl FieldVisitor for VariableCollector<'_> {
    fn record<R: Record>(&mut self, name: &str, value: &mut R) -> Result<()> {
        self.path.push(name);
        let result = value.visit_fields(self);
        self.path.pop();
        result
    }

    fn optional_record<R: Record>(&mut self, name: &str, value: &mut Option<R>) -> Result<()> {
        match value {
            Some(inner) => self.record(name, inner),
            None => match R::empty() {
                Some(mut section) => self.record(name, &mut section),
                None => Ok(()),
            },
        }
    }

    fn scalar<T: DeserializeOwned>(&mut self, name: &str, _value: &mut T) -> Result<()> {
        self.leaf(name, FieldKind::Scalar);
        Ok(())
    }

    fn map<M: MapField>(&mut self, name: &str, _value: &mut M) -> Result<()> {
        self.leaf(name, FieldKind::Map);
        Ok(())
    }

    fn sequence<S: DeserializeOwned>(&mut self, name: &str, _value: &mut S) -> Result<()> {
        self.leaf(name, FieldKind::Sequence);
        Ok(())
    }
}
