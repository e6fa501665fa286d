use serde::{Deserialize, Serialize};

use crate::config::file::{ConfigurationLivecycleHooks, UnrecognizedKeys};

pub const KEEP_ALIVE_DEFAULT: u64 = 75;
pub const LISTEN_ADDRESSES_DEFAULT: &str = "0.0.0.0:3000";

#[serde_with::skip_serializing_none]
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct SrvConfig {
    pub keep_alive: Option<u64>,
    pub listen_addresses: Option<String>,
    /// Path under which a reverse proxy exposes the whole server, e.g. `/stac`.
    pub base_path: Option<String>,
    /// Path under which the STAC API routes are registered, e.g. `/api/v1`.
    pub route_prefix: Option<String>,
    pub worker_processes: Option<usize>,
}

impl ConfigurationLivecycleHooks for SrvConfig {
    fn get_unrecognized_keys(&self) -> UnrecognizedKeys {
        // flattened into the root config, so unknown keys are reported there
        UnrecognizedKeys::new()
    }
}
