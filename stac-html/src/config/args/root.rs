use std::path::PathBuf;

use clap::Parser;
use clap::builder::Styles;
use clap::builder::styling::AnsiColor;

use crate::config::args::srv::SrvArgs;
use crate::config::file::Config;
use crate::{StacHtmlError, StacHtmlResult};

/// Defines the styles used for the CLI help output.
const HELP_STYLES: Styles = Styles::styled()
    .header(AnsiColor::Blue.on_default().bold())
    .usage(AnsiColor::Blue.on_default().bold())
    .literal(AnsiColor::White.on_default())
    .placeholder(AnsiColor::Green.on_default());

#[derive(Parser, Debug, PartialEq, Default)]
#[command(
    about,
    version,
    after_help = "Use RUST_LOG environment variable to control logging level, e.g. RUST_LOG=debug or RUST_LOG=stac_html=debug. Use STAC_HTML_FORMAT to pick the log format: full, compact, bare, pretty or json.",
    styles = HELP_STYLES
)]
pub struct Args {
    #[command(flatten)]
    pub meta: MetaArgs,
    #[command(flatten)]
    pub srv: SrvArgs,
    #[command(flatten)]
    pub html: HtmlArgs,
}

// None of these params will be transferred to the config
#[derive(Parser, Debug, Clone, PartialEq, Default)]
#[command(about, version)]
pub struct MetaArgs {
    /// Path to config file. If set, the catalog directory must be given in the config file.
    #[arg(short, long)]
    pub config: Option<PathBuf>,
    /// Save resulting config to a file or use "-" to print to stdout.
    #[arg(long)]
    pub save_config: Option<PathBuf>,
    /// Directory with the JSON documents of the STAC API to serve.
    pub catalog: Option<PathBuf>,
}

#[derive(Parser, Debug, Clone, PartialEq, Default)]
#[command()]
pub struct HtmlArgs {
    /// Directory with `*.html` templates overriding or extending the built-in ones.
    #[arg(short, long)]
    pub templates: Option<PathBuf>,
}

impl Args {
    pub fn merge_into_config(self, config: &mut Config) -> StacHtmlResult<()> {
        if let (Some(_), Some(catalog)) = (&self.meta.config, &self.meta.catalog) {
            return Err(StacHtmlError::ConfigAndCatalogError(catalog.clone()));
        }

        self.srv.merge_into_config(&mut config.srv);

        if self.meta.catalog.is_some() {
            config.catalog = self.meta.catalog;
        }
        if self.html.templates.is_some() {
            config.html.templates = self.html.templates;
        }
        Ok(())
    }
}
