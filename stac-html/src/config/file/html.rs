use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::config::file::{
    ConfigFileError, ConfigFileResult, ConfigurationLivecycleHooks, UnrecognizedKeys,
    UnrecognizedValues,
};
use crate::endpoints::EndpointTemplates;

/// HTML rendering settings.
#[serde_with::skip_serializing_none]
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Default)]
pub struct HtmlConfig {
    /// Directory with `*.html` templates overriding or extending the built-in ones.
    pub templates: Option<PathBuf>,

    /// Template used for each STAC operation. Operations missing here are never rendered.
    /// Uses the built-in binding when not set.
    pub endpoints: Option<EndpointTemplates>,

    #[serde(flatten, skip_serializing)]
    pub unrecognized: UnrecognizedValues,
}

impl HtmlConfig {
    #[must_use]
    pub fn is_default(&self) -> bool {
        self == &Self::default()
    }

    #[must_use]
    pub fn endpoint_templates(&self) -> EndpointTemplates {
        self.endpoints.clone().unwrap_or_default()
    }
}

impl ConfigurationLivecycleHooks for HtmlConfig {
    fn finalize(&mut self) -> ConfigFileResult<()> {
        if let Some(dir) = &self.templates {
            if !dir.is_dir() {
                return Err(ConfigFileError::InvalidTemplatesPath(dir.clone()));
            }
            info!("Using templates from {}", dir.display());
        }
        Ok(())
    }

    fn get_unrecognized_keys(&self) -> UnrecognizedKeys {
        self.unrecognized.keys().cloned().collect()
    }
}
