use std::ffi::OsStr;
use std::fs::File;
use std::io::prelude::*;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use subst::VariableMap;
use tracing::{info, warn};

use crate::config::file::html::HtmlConfig;
use crate::config::file::srv::SrvConfig;
use crate::config::file::{
    ConfigFileError, ConfigFileResult, ConfigurationLivecycleHooks, UnrecognizedKeys,
    UnrecognizedValues, copy_unrecognized_keys_from_config,
};
use crate::srv::PathPrefixes;
use crate::{StacHtmlError, StacHtmlResult};

#[serde_with::skip_serializing_none]
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(flatten)]
    pub srv: SrvConfig,

    /// Directory with the JSON documents of the served STAC API.
    pub catalog: Option<PathBuf>,

    #[serde(default, skip_serializing_if = "HtmlConfig::is_default")]
    pub html: HtmlConfig,

    #[serde(flatten, skip_serializing)]
    pub unrecognized: UnrecognizedValues,
}

impl Config {
    /// Validate and normalize the config, warning about any unrecognized keys.
    pub fn finalize(&mut self) -> StacHtmlResult<UnrecognizedKeys> {
        if let Some(path) = &self.srv.base_path {
            self.srv.base_path = Some(parse_base_path(path)?);
        }
        if let Some(path) = &self.srv.route_prefix {
            let prefix = parse_base_path(path)
                .map_err(|_| StacHtmlError::RoutePrefixError(path.clone()))?;
            self.srv.route_prefix = Some(prefix);
        }
        self.html.finalize()?;

        let mut res = self.srv.get_unrecognized_keys();
        copy_unrecognized_keys_from_config(&mut res, "", &self.unrecognized);
        res.extend(self.html.get_unrecognized_keys_with_prefix("html."));

        for key in &res {
            warn!(
                "Ignoring unrecognized configuration key '{key}'. Please check your configuration file for typos."
            );
        }

        Ok(res)
    }

    /// The catalog directory, which must be set either in the config file or on the command line.
    pub fn catalog_dir(&self) -> StacHtmlResult<&Path> {
        self.catalog.as_deref().ok_or(StacHtmlError::NoCatalog)
    }

    #[must_use]
    pub fn path_prefixes(&self) -> PathPrefixes {
        PathPrefixes::new(self.srv.base_path.clone(), self.srv.route_prefix.clone())
    }

    pub fn save_to_file(&self, file_name: &Path) -> ConfigFileResult<()> {
        let yaml = serde_yaml::to_string(&self).map_err(ConfigFileError::ConfigSerializeError)?;
        if file_name.as_os_str() == OsStr::new("-") {
            info!("Current system configuration:");
            println!("\n\n{yaml}\n");
            Ok(())
        } else {
            info!(
                "Saving config to {}, use --config to load it",
                file_name.display()
            );
            File::create(file_name)
                .map_err(|e| ConfigFileError::ConfigWriteError(e, file_name.to_path_buf()))?
                .write_all(yaml.as_bytes())
                .map_err(|e| ConfigFileError::ConfigWriteError(e, file_name.to_path_buf()))?;
            Ok(())
        }
    }
}

/// Read config from a file
pub fn read_config<'a, M>(file_name: &Path, env: &'a M) -> ConfigFileResult<Config>
where
    M: VariableMap<'a>,
    M::Value: AsRef<str>,
{
    let mut file =
        File::open(file_name).map_err(|e| ConfigFileError::ConfigLoadError(e, file_name.into()))?;
    let mut contents = String::new();
    file.read_to_string(&mut contents)
        .map_err(|e| ConfigFileError::ConfigLoadError(e, file_name.into()))?;
    parse_config(&contents, env, file_name)
}

pub fn parse_config<'a, M>(contents: &str, env: &'a M, file_name: &Path) -> ConfigFileResult<Config>
where
    M: VariableMap<'a>,
    M::Value: AsRef<str>,
{
    subst::yaml::from_str(contents, env)
        .map_err(|e| ConfigFileError::ConfigParseError(e, file_name.into()))
}

/// Normalize a path prefix: it must start with `/`, and loses any trailing `/`.
pub fn parse_base_path(path: &str) -> StacHtmlResult<String> {
    if !path.starts_with('/') {
        return Err(StacHtmlError::BasePathError(path.to_string()));
    }
    if let Ok(uri) = path.parse::<actix_web::http::Uri>() {
        return Ok(uri.path().trim_end_matches('/').to_string());
    }
    Err(StacHtmlError::BasePathError(path.to_string()))
}

#[cfg(test)]
mod tests {
    use std::ffi::OsString;

    use indoc::indoc;

    use super::*;
    use crate::config::file::env::FauxEnv;
    use crate::endpoints::{EndpointTemplates, StacOperation};

    fn parse(yaml: &str, env: &FauxEnv) -> Config {
        parse_config(yaml, env, Path::new("test.yaml")).unwrap()
    }

    #[test]
    fn parse_base_path_accepts_valid_paths() {
        assert_eq!("", parse_base_path("/").unwrap());
        assert_eq!("", parse_base_path("//").unwrap());
        assert_eq!("/foo/bar", parse_base_path("/foo/bar").unwrap());
        assert_eq!("/foo/bar", parse_base_path("/foo/bar/").unwrap());
    }

    #[test]
    fn parse_base_path_rejects_invalid_paths() {
        assert!(parse_base_path("").is_err());
        assert!(parse_base_path("foo/bar").is_err());
    }

    #[test]
    fn parse_full_config() {
        let env = FauxEnv([("CATALOG", OsString::from("/data/stac"))].into_iter().collect());
        let mut config = parse(
            indoc! {"
                listen_addresses: '127.0.0.1:8080'
                base_path: /stac/
                route_prefix: /api/v1
                catalog: ${CATALOG}
                html:
                  endpoints:
                    landing_page: landing
                    search: items
            "},
            &env,
        );
        assert!(config.finalize().unwrap().is_empty());

        assert_eq!(config.srv.base_path.as_deref(), Some("/stac"));
        assert_eq!(config.catalog_dir().unwrap(), Path::new("/data/stac"));
        assert_eq!(
            config.html.endpoint_templates(),
            EndpointTemplates::empty()
                .with(StacOperation::LandingPage, "landing")
                .with(StacOperation::Search, "items")
        );
        assert_eq!(config.path_prefixes().joined(), "/stac/api/v1");
    }

    #[test]
    fn unrecognized_keys() {
        let mut config = parse(
            indoc! {"
                keep_alive: 10
                cors: true
                html:
                  theme: dark
            "},
            &FauxEnv::default(),
        );
        let keys = config.finalize().unwrap();
        assert_eq!(
            keys,
            UnrecognizedKeys::from(["cors".to_string(), "html.theme".to_string()])
        );
    }

    #[test]
    fn invalid_route_prefix() {
        let mut config = parse("route_prefix: api", &FauxEnv::default());
        assert!(matches!(
            config.finalize(),
            Err(StacHtmlError::RoutePrefixError(p)) if p == "api"
        ));
    }

    #[test]
    fn missing_catalog() {
        let config = Config::default();
        assert!(matches!(config.catalog_dir(), Err(StacHtmlError::NoCatalog)));
    }

    #[test]
    fn save_and_read_back() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("config.yaml");
        let mut config = parse(
            indoc! {"
                keep_alive: 30
                catalog: /data
                html:
                  endpoints:
                    get_item: item
            "},
            &FauxEnv::default(),
        );
        config.finalize().unwrap();
        config.save_to_file(&file).unwrap();

        let read = read_config(&file, &FauxEnv::default()).unwrap();
        assert_eq!(read, config);
    }

    #[test]
    fn serialized_config() {
        let config = parse(
            indoc! {"
                listen_addresses: '0.0.0.0:3000'
                catalog: /data
            "},
            &FauxEnv::default(),
        );
        let yaml = serde_yaml::to_string(&config).unwrap();
        assert!(!yaml.contains("html"));
        assert!(!yaml.contains("keep_alive"));

        let value: serde_yaml::Value = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(value["catalog"].as_str(), Some("/data"));
        assert_eq!(value["listen_addresses"].as_str(), Some("0.0.0.0:3000"));
    }
}
