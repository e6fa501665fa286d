use std::env;

use clap::Parser;
use stac_html::StacHtmlResult;
use stac_html::config::args::Args;
use stac_html::config::file::env::OsEnv;
use stac_html::config::file::{Config, read_config};
use stac_html::logging::init_tracing;
use stac_html::srv::{StaticCatalog, html_render, new_server};
use tracing::{error, info};

const VERSION: &str = env!("CARGO_PKG_VERSION");

async fn start(args: Args) -> StacHtmlResult<()> {
    info!("Starting stac-html v{VERSION}");

    let env = OsEnv;
    let save_config = args.meta.save_config.clone();
    let mut config = if let Some(ref cfg_filename) = args.meta.config {
        info!("Using {}", cfg_filename.display());
        read_config(cfg_filename, &env)?
    } else {
        Config::default()
    };

    args.merge_into_config(&mut config)?;
    config.finalize()?;

    let catalog = StaticCatalog::from_dir(config.catalog_dir()?)?;
    let html = html_render(&config)?;

    if let Some(file_name) = save_config {
        config.save_to_file(file_name.as_path())?;
    } else {
        info!("Use --save-config to save or print the configuration.");
    }

    let route_prefix = config.srv.route_prefix.clone().unwrap_or_default();
    let (server, listen_addresses) = new_server(config.srv, catalog, html)?;
    info!("stac-html has been started on {listen_addresses}.");
    info!("Use http://{listen_addresses}{route_prefix}/?f=html to browse the catalog.");

    server.await
}

#[tokio::main]
async fn main() {
    let filter = env::var("RUST_LOG").ok();
    let format = env::var("STAC_HTML_FORMAT").ok();
    if let Err(e) = init_tracing(filter.as_deref(), format.as_deref()) {
        eprintln!("{e}");
    }

    let args = Args::parse();
    if let Err(e) = start(args).await {
        // Ensure the message is printed, even if the logging is disabled
        if log::log_enabled!(log::Level::Error) {
            error!("{e}");
        } else {
            eprintln!("{e}");
        }
        std::process::exit(1);
    }
}
