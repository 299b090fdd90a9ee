//! Common test utilities for integration tests.
//!
//! Provides the configuration fixture shared by the format tests, a guard
//! for process environment variables, and helpers for writing configuration
//! files to temporary directories.

use std::collections::HashMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use envoverlay::Record;
use serde::Deserialize;

/// Innermost record of the fixture configuration.
#[derive(Debug, Default, Deserialize, PartialEq, Record)]
pub struct SubStruct {
    pub astring: String,
    pub amap: HashMap<String, String>,
}

/// Record nesting [`SubStruct`] one level down.
#[derive(Debug, Default, Deserialize, PartialEq, Record)]
pub struct AStruct {
    pub asubstruct: SubStruct,
}

/// Record holding one field of every leaf kind except maps.
#[derive(Debug, Default, Deserialize, PartialEq, Record)]
pub struct BStruct {
    pub bint: i64,
    pub bbool: bool,
    pub bslice: Vec<String>,
}

/// Fixture configuration: two nested records and a top-level string.
#[derive(Debug, Default, Deserialize, PartialEq, Record)]
pub struct FixtureConfig {
    pub astruct: AStruct,
    pub bstruct: BStruct,
    pub cstring: String,
}

/// YAML rendition of the fixture configuration.
pub const YAML_CONFIG: &str = "
astruct:
  asubstruct:
    amap:
      oriKey1: oriValue1
      oriKey2: oriValue2
    astring: originstring
bstruct:
  bbool: true
  bint: 666
  bslice:
    - oriA
    - oriB
    - oriC
cstring: oriCstring
";

/// JSON rendition of the fixture configuration.
#[allow(dead_code)]
pub const JSON_CONFIG: &str = r#"
{
    "astruct": {
        "asubstruct": {
            "amap": {
                "oriKey1": "oriValue1",
                "oriKey2": "oriValue2"
            },
            "astring": "originstring"
        }
    },
    "bstruct": {
        "bbool": true,
        "bint": 666,
        "bslice": ["oriA", "oriB", "oriC"]
    },
    "cstring": "oriCString"
}
"#;

/// Writes `content` to `dir/filename` and returns the path.
#[allow(dead_code)]
pub fn create_temp_config(dir: &Path, filename: &str, content: &str) -> PathBuf {
    let path = dir.join(filename);
    fs::write(&path, content).unwrap();
    path
}

/// RAII guard for setting and restoring environment variables.
///
/// Tests using environment variables must not run in parallel; mark them
/// with `#[serial]`.
pub struct EnvGuard {
    key: String,
    old_value: Option<String>,
}

impl EnvGuard {
    /// Sets `key` to `value` until the guard is dropped.
    pub fn new(key: &str, value: &str) -> Self {
        let old_value = env::var(key).ok();
        env::set_var(key, value);
        Self {
            key: key.to_string(),
            old_value,
        }
    }

    /// Removes `key` until the guard is dropped.
    #[allow(dead_code)]
    pub fn remove(key: &str) -> Self {
        let old_value = env::var(key).ok();
        env::remove_var(key);
        Self {
            key: key.to_string(),
            old_value,
        }
    }
}

impl Drop for EnvGuard {
    fn drop(&mut self) {
        match &self.old_value {
            Some(val) => env::set_var(&self.key, val),
            None => env::remove_var(&self.key),
        }
    }
}

/// Removes every variable the fixture configuration responds to under
/// `prefix` for the lifetime of the returned guards.
#[allow(dead_code)]
pub fn clear_fixture_env_vars(prefix: &str) -> Vec<EnvGuard> {
    let overlay = envoverlay::EnvOverlay::new(prefix, envoverlay::YamlDecoder);
    overlay
        .variables::<FixtureConfig>()
        .unwrap()
        .iter()
        .map(|v| EnvGuard::remove(&v.name))
        .collect()
}

/// Removes every variable that can override a field of the loaded `root`
/// under `prefix` for the lifetime of the returned guards.
#[allow(dead_code)]
pub fn clear_env_vars_in<R: envoverlay::Record>(prefix: &str, root: &mut R) -> Vec<EnvGuard> {
    let overlay = envoverlay::EnvOverlay::new(prefix, envoverlay::YamlDecoder);
    overlay
        .variables_in(root)
        .unwrap()
        .iter()
        .map(|v| EnvGuard::remove(&v.name))
        .collect()
}
