//! Environment variable sources.
//!
//! The overlay pass never touches `std::env` directly; it asks an
//! [`Environment`] for the variables it derives names for. [`ProcessEnv`]
//! is the real process environment, and plain maps stand in for it in tests.

use std::collections::{BTreeMap, HashMap};
use std::env;
use std::hash::BuildHasher;

/// Read-only lookup of environment variables by name.
#[cfg_attr(test, mockall::automock)]
pub trait Environment {
    /// Get the value of `name`, or `None` if it is not set.
    fn var(&self, name: &str) -> Option<String>;
}

/// The environment of the current process.
///
/// Variables whose value is not valid unicode are reported as absent.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessEnv;

impl Environment for ProcessEnv {
    fn var(&self, name: &str) -> Option<String> {
        match env::var(name) {
            Ok(value) => Some(value),
            Err(env::VarError::NotPresent) => None,
            Err(env::VarError::NotUnicode(_)) => {
                log::warn!("ignoring {name}: value is not valid unicode");
                None
            }
        }
    }
}

impl<S: BuildHasher> Environment for HashMap<String, String, S> {
    fn var(&self, name: &str) -> Option<String> {
        self.get(name).cloned()
    }
}

impl Environment for BTreeMap<String, String> {
    fn var(&self, name: &str) -> Option<String> {
        self.get(name).cloned()
    }
}

impl<E: Environment + ?Sized> Environment for &E {
    fn var(&self, name: &str) -> Option<String> {
        (**self).var(name)
    }
}
