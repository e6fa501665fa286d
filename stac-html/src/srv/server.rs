use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use actix_web::error::ErrorInternalServerError;
use actix_web::middleware::{NormalizePath, TrailingSlash};
use actix_web::web::{self, Data};
use actix_web::{App, HttpServer};
use futures::TryFutureExt;
use tracing::{error, info};
use tracing_actix_web::TracingLogger;

use crate::config::file::Config;
use crate::config::file::srv::{KEEP_ALIVE_DEFAULT, LISTEN_ADDRESSES_DEFAULT, SrvConfig};
use crate::srv::catalog::{self, OpenApiDocument, StaticCatalog, openapi_document};
use crate::srv::html::HtmlRender;
use crate::templates::{TemplateRenderer, TeraRenderer};
use crate::{StacHtmlError, StacHtmlResult};

pub fn map_internal_error<T: std::fmt::Display>(e: T) -> actix_web::Error {
    error!("{e}");
    ErrorInternalServerError(e.to_string())
}

pub fn router(cfg: &mut web::ServiceConfig, usr_cfg: &SrvConfig) {
    catalog::service_routes(cfg);
    catalog::stac_routes(cfg, usr_cfg.route_prefix.as_deref().unwrap_or_default());
}

/// Create the HTML middleware for a finalized config.
///
/// Fails if an operation is bound to a template that does not exist.
pub fn html_render(config: &Config) -> StacHtmlResult<HtmlRender> {
    let renderer = TeraRenderer::from_dir(config.html.templates.as_deref())?;
    let endpoints = config.html.endpoint_templates();
    for (operation, template) in endpoints.iter() {
        if !renderer.has_template(template) {
            return Err(StacHtmlError::UnboundTemplate(
                operation.to_string(),
                template.to_string(),
            ));
        }
    }
    info!(
        "Rendering {} STAC operations as HTML",
        endpoints.iter().count()
    );

    Ok(HtmlRender::new(Arc::new(renderer))
        .with_endpoints(endpoints)
        .with_prefixes(config.path_prefixes()))
}

type Server = Pin<Box<dyn Future<Output = StacHtmlResult<()>>>>;

/// Create a future for an Actix web server together with the listening address.
pub fn new_server(
    config: SrvConfig,
    catalog: StaticCatalog,
    html: HtmlRender,
) -> StacHtmlResult<(Server, String)> {
    let keep_alive = Duration::from_secs(config.keep_alive.unwrap_or(KEEP_ALIVE_DEFAULT));
    let worker_processes = config.worker_processes.unwrap_or_else(num_cpus::get);
    let listen_addresses = config
        .listen_addresses
        .clone()
        .unwrap_or_else(|| LISTEN_ADDRESSES_DEFAULT.to_string());

    let openapi = Data::new(OpenApiDocument(openapi_document(
        config.route_prefix.as_deref().unwrap_or_default(),
    )));
    let catalog = Data::new(catalog);

    let factory = move || {
        App::new()
            .app_data(catalog.clone())
            .app_data(openapi.clone())
            .wrap(html.clone())
            .wrap(TracingLogger::default())
            .wrap(NormalizePath::new(TrailingSlash::MergeOnly))
            .configure(|c| router(c, &config))
    };

    let server = HttpServer::new(factory)
        .bind(listen_addresses.clone())
        .map_err(|e| StacHtmlError::BindingError(e, listen_addresses.clone()))?
        .keep_alive(keep_alive)
        .shutdown_timeout(0)
        .workers(worker_processes)
        .run()
        .err_into();

    Ok((Box::pin(server), listen_addresses))
}
