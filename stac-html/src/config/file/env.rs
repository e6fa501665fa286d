//! Variables available to `${VAR}` substitution in config files.

use std::collections::HashMap;
use std::env::var_os;
use std::ffi::OsString;

use subst::VariableMap;
use tracing::warn;

/// Lossy conversion, warning when a variable is not valid unicode.
fn to_value(key: &str, value: OsString) -> String {
    value.into_string().unwrap_or_else(|v| {
        let v = v.to_string_lossy().into_owned();
        warn!("Environment variable {key} has invalid unicode, substituting {v}");
        v
    })
}

/// The process environment.
#[derive(Debug, Default, Clone, Copy)]
pub struct OsEnv;

impl<'a> VariableMap<'a> for OsEnv {
    type Value = String;

    fn get(&'a self, key: &str) -> Option<Self::Value> {
        var_os(key).map(|v| to_value(key, v))
    }
}

/// A fixed set of variables, used by tests.
#[derive(Debug, Default)]
pub struct FauxEnv(pub HashMap<&'static str, OsString>);

impl<'a> VariableMap<'a> for FauxEnv {
    type Value = String;

    fn get(&'a self, key: &str) -> Option<Self::Value> {
        self.0.get(key).cloned().map(|v| to_value(key, v))
    }
}
