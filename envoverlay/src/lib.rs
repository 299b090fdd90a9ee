#![deny(missing_docs, unsafe_code)]
#![warn(clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

//! # envoverlay
//!
//! Overlay environment variables onto already-loaded configuration.
//!
//! A configuration tree is loaded the usual way (from YAML, JSON, ...) and
//! then handed to an [`EnvOverlay`], which derives a variable name for every
//! field and replaces the field with the decoded variable value when one is
//! set. Deployment environments can thus change any single value without
//! touching the configuration file.
//!
//! ## Core Types
//!
//! - [`EnvOverlay`]: the overlay engine
//! - [`Record`](trait@Record) (trait and derive), [`Field`] and
//!   [`FieldVisitor`]: how configuration types expose their fields
//! - [`impl_scalar!`]: declares custom types overridden as a single value
//! - [`Decoder`], [`YamlDecoder`] and [`JsonDecoder`]: override value formats
//! - [`Environment`] and [`ProcessEnv`]: where variables are read from
//! - [`Error`] and [`Result`]: Error handling types
//!
//! ## Naming
//!
//! Variable names are the upper-cased prefix and field path joined with `_`:
//! prefix `yamlconfig` and field `astruct.asubstruct.astring` give
//! `YAMLCONFIG_ASTRUCT_ASUBSTRUCT_ASTRING`.
//!
//! ## Examples
//!
//! ```
//! use std::collections::HashMap;
//! use serde::Deserialize;
//! use envoverlay::{EnvOverlay, Record, YamlDecoder};
//!
//! #[derive(Debug, Default, Deserialize, Record)]
//! struct Config {
//!     workers: u32,
//!     labels: HashMap<String, String>,
//! }
//!
//! let mut config: Config = serde_yaml::from_str("workers: 4\nlabels: {team: core}").unwrap();
//!
//! let env: HashMap<String, String> = [
//!     ("APP_WORKERS".to_string(), "16".to_string()),
//!     ("APP_LABELS".to_string(), "{tier: gold}".to_string()),
//! ]
//! .into();
//! EnvOverlay::new("app", YamlDecoder)
//!     .with_environment(env)
//!     .parse(&mut config)
//!     .unwrap();
//!
//! assert_eq!(config.workers, 16);
//! assert_eq!(config.labels["team"], "core");
//! assert_eq!(config.labels["tier"], "gold");
//! ```

// Lets `#[derive(Record)]` output resolve `::envoverlay` inside this crate
extern crate self as envoverlay;

pub mod decode;
pub mod env;
pub mod error;
pub mod overlay;
pub mod path;
pub mod record;

// Re-export key types at crate root for convenience
pub use decode::{Decoder, JsonDecoder, YamlDecoder};
pub use env::{Environment, ProcessEnv};
pub use error::{BoxError, Error, Result};
pub use overlay::{AppliedOverride, EnvOverlay, OverlayReport, Variable};
pub use path::FieldPath;
pub use envoverlay_derive::Record;
pub use record::{Field, FieldKind, FieldVisitor, MapField, Record};
