use std::io;
use std::path::PathBuf;

use crate::config::file::ConfigFileError;
use crate::srv::CatalogError;
use crate::templates::TemplateError;

/// A convenience [`Result`] for the stac-html crate.
pub type StacHtmlResult<T> = Result<T, StacHtmlError>;

#[derive(thiserror::Error, Debug)]
pub enum StacHtmlError {
    #[error("The --config and the catalog directory argument cannot be used together. Please remove '{}'", .0.display())]
    ConfigAndCatalogError(PathBuf),

    #[error("Unable to bind to {1}: {0}")]
    BindingError(#[source] io::Error, String),

    #[error("Base path must be a valid URL path, and must begin with a '/' symbol, but is '{0}'")]
    BasePathError(String),

    #[error("Route prefix must be a valid URL path, and must begin with a '/' symbol, but is '{0}'")]
    RoutePrefixError(String),

    #[error("No catalog directory was given. Set it on the command line or with `catalog` in the config file.")]
    NoCatalog,

    #[error("Template {1} bound to {0} is not defined")]
    UnboundTemplate(String, String),

    #[error("Unable to initialize logging: {0}")]
    LoggingError(String),

    #[error(transparent)]
    ConfigFileError(#[from] ConfigFileError),

    #[error(transparent)]
    CatalogError(#[from] CatalogError),

    #[error(transparent)]
    TemplateError(#[from] TemplateError),

    #[error(transparent)]
    IoError(#[from] io::Error),
}
