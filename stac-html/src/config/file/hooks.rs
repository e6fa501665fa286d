use std::collections::{BTreeSet, HashMap};
use std::fmt::Debug;

use crate::config::file::ConfigFileResult;

pub type UnrecognizedValues = HashMap<String, serde_yaml::Value>;
pub type UnrecognizedKeys = BTreeSet<String>;

/// Lifecycle hooks of a configuration section.
///
/// `finalize` is always called before `get_unrecognized_keys`.
pub trait ConfigurationLivecycleHooks: Clone + Debug + Default + PartialEq + Send {
    /// Validate and normalize values
    fn finalize(&mut self) -> ConfigFileResult<()> {
        Ok(())
    }

    /// Keys that were present in the config file, but are not known
    fn get_unrecognized_keys(&self) -> UnrecognizedKeys;

    fn get_unrecognized_keys_with_prefix(&self, prefix: &str) -> UnrecognizedKeys {
        self.get_unrecognized_keys()
            .into_iter()
            .map(|key| format!("{prefix}{key}"))
            .collect()
    }
}

pub fn copy_unrecognized_keys_from_config(
    result: &mut UnrecognizedKeys,
    prefix: &str,
    unrecognized: &UnrecognizedValues,
) {
    result.extend(unrecognized.keys().map(|k| format!("{prefix}{k}")));
}
