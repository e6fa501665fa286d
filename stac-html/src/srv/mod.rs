mod catalog;
pub use catalog::{
    CatalogError, CatalogResult, GEO_JSON, JSON, OpenApiDocument, SCHEMA_JSON, StaticCatalog,
    openapi_document,
};

mod context;
pub use context::{Crumb, PathPrefixes, TemplateContext, TemplateInfo, breadcrumbs};

mod html;
pub use html::{HtmlRender, HtmlRenderError, HtmlRenderMiddleware, ResponseEnvelope};

mod openapi;
pub use openapi::{OPENAPI_MEDIA_TYPE, is_openapi_media_type, patch_openapi};

mod server;
pub use server::{html_render, map_internal_error, new_server, router};
