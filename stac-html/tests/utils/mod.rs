#![allow(clippy::missing_panics_doc)]
#![allow(dead_code)]

use std::ffi::OsString;

use actix_web::body::MessageBody;
use actix_web::dev::ServiceResponse;
use actix_web::http::header::CONTENT_TYPE;
use actix_web::test::read_body;
use stac_html::config::file::Config;
use stac_html::config::file::env::FauxEnv;

pub const FIXTURES: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/tests/fixtures");

/// Parse and finalize a config, with `${FIXTURES}` pointing to the test fixtures.
#[must_use]
pub fn mock_cfg(yaml: &str) -> Config {
    let env = FauxEnv([("FIXTURES", OsString::from(FIXTURES))].into_iter().collect());
    let mut cfg: Config = subst::yaml::from_str(yaml, &env).expect("config can be parsed as yaml");
    let res = cfg.finalize().expect("config can be finalized");
    assert!(res.is_empty(), "unrecognized config: {res:?}");
    cfg
}

pub async fn assert_response<B: MessageBody>(response: ServiceResponse<B>) -> ServiceResponse<B> {
    if !response.status().is_success() {
        let status = response.status();
        let headers = response.headers().clone();
        let bytes = read_body(response).await;
        let body = String::from_utf8_lossy(&bytes);
        panic!("response status: {status}\nresponse headers: {headers:?}\nresponse body: {body}");
    }
    response
}

#[must_use]
pub fn content_type<B>(response: &ServiceResponse<B>) -> &str {
    response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
}

/// Build a test service serving the fixture catalog through the HTML middleware.
#[macro_export]
macro_rules! create_app {
    ($yaml:expr) => {{
        let cfg = $crate::utils::mock_cfg($yaml);
        let catalog = ::stac_html::srv::StaticCatalog::from_dir(cfg.catalog_dir().unwrap()).unwrap();
        let html = ::stac_html::srv::html_render(&cfg).unwrap();
        let openapi = ::stac_html::srv::openapi_document(
            cfg.srv.route_prefix.as_deref().unwrap_or_default(),
        );
        ::actix_web::test::init_service(
            ::actix_web::App::new()
                .app_data(::actix_web::web::Data::new(catalog))
                .app_data(::actix_web::web::Data::new(
                    ::stac_html::srv::OpenApiDocument(openapi),
                ))
                .wrap(html)
                .configure(|c| ::stac_html::srv::router(c, &cfg.srv)),
        )
        .await
    }};
}
