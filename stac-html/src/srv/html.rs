//! Middleware rendering STAC API JSON responses as HTML documents.
//!
//! For GET requests the whole response body is collected before anything is decided.
//! The response is then either forwarded unchanged, rendered with the template bound
//! to the served operation, or, for the OpenAPI document, patched to advertise HTML responses.

use std::error::Error as StdError;
use std::future::poll_fn;
use std::pin::pin;
use std::rc::Rc;
use std::sync::Arc;

use actix_web::body::{EitherBody, MessageBody};
use actix_web::dev::{Service, ServiceRequest, ServiceResponse, Transform, forward_ready};
use actix_web::http::header::{ACCEPT, CONTENT_LENGTH, CONTENT_TYPE, HeaderValue};
use actix_web::http::{Method, StatusCode};
use actix_web::web::Query;
use actix_web::{Error, HttpRequest, HttpResponse};
use bytes::{Bytes, BytesMut};
use futures::future::{LocalBoxFuture, Ready, ready};
use serde_json::Value;
use tracing::{debug, trace};

use crate::endpoints::EndpointTemplates;
use crate::negotiate::OutputFormat;
use crate::srv::context::{PathPrefixes, TemplateContext};
use crate::srv::openapi::{is_openapi_media_type, patch_openapi};
use crate::srv::server::map_internal_error;
use crate::templates::{TemplateError, TemplateRenderer};

#[derive(thiserror::Error, Debug)]
pub enum HtmlRenderError {
    #[error("Unable to read the response body of {0}: {1}")]
    BodyError(String, String),

    #[error("Response body of {0} is not valid JSON: {1}")]
    InvalidJson(String, #[source] serde_json::Error),

    #[error("Unable to serialize {0}: {1}")]
    SerializeError(&'static str, #[source] serde_json::Error),

    #[error(transparent)]
    TemplateError(#[from] TemplateError),
}

/// Response whose body is still being collected.
struct ResponseAccumulator {
    head: HttpResponse<()>,
    body: BytesMut,
}

impl ResponseAccumulator {
    fn new(head: HttpResponse<()>) -> Self {
        Self {
            head,
            body: BytesMut::new(),
        }
    }

    fn push(&mut self, chunk: &[u8]) {
        self.body.extend_from_slice(chunk);
    }

    fn finish(self) -> ResponseEnvelope {
        ResponseEnvelope {
            head: self.head,
            body: self.body.freeze(),
        }
    }
}

/// Fully collected response. Only in this state can it be inspected or modified.
#[derive(Debug)]
pub struct ResponseEnvelope {
    head: HttpResponse<()>,
    body: Bytes,
}

impl ResponseEnvelope {
    #[must_use]
    pub fn status(&self) -> StatusCode {
        self.head.status()
    }

    #[must_use]
    pub fn content_type(&self) -> Option<&str> {
        self.head
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
    }

    #[must_use]
    pub fn body(&self) -> &Bytes {
        &self.body
    }

    /// Replace the body, optionally its content type, and recompute the content length.
    pub fn replace_body(&mut self, body: impl Into<Bytes>, content_type: Option<HeaderValue>) {
        self.body = body.into();
        let headers = self.head.headers_mut();
        if let Some(content_type) = content_type {
            headers.insert(CONTENT_TYPE, content_type);
        }
        headers.insert(CONTENT_LENGTH, HeaderValue::from(self.body.len()));
    }

    fn into_response(self) -> HttpResponse<Bytes> {
        self.head.set_body(self.body)
    }
}

/// Read the whole body stream before any decision is taken.
async fn collect_body<B: MessageBody>(
    path: &str,
    head: HttpResponse<()>,
    body: B,
) -> Result<ResponseEnvelope, HtmlRenderError> {
    let mut acc = ResponseAccumulator::new(head);
    let mut body = pin!(body);
    while let Some(chunk) = poll_fn(|cx| body.as_mut().poll_next(cx)).await {
        let chunk = chunk.map_err(|e| {
            let e: Box<dyn StdError> = e.into();
            HtmlRenderError::BodyError(path.to_string(), e.to_string())
        })?;
        acc.push(&chunk);
    }
    Ok(acc.finish())
}

/// The `f` query parameter. The last one wins when it is repeated.
fn format_param(req: &HttpRequest) -> Option<String> {
    Query::<Vec<(String, String)>>::from_query(req.query_string())
        .ok()?
        .into_inner()
        .into_iter()
        .rev()
        .find_map(|(key, value)| (key == "f").then_some(value))
}

fn accept_header(req: &HttpRequest) -> Option<String> {
    let values: Vec<&str> = req
        .headers()
        .get_all(ACCEPT)
        .filter_map(|v| v.to_str().ok())
        .collect();
    if values.is_empty() {
        None
    } else {
        Some(values.join(","))
    }
}

/// Middleware that renders JSON responses of STAC API operations as HTML.
///
/// ```no_run
/// use std::sync::Arc;
///
/// use actix_web::App;
/// use stac_html::srv::HtmlRender;
/// use stac_html::templates::TeraRenderer;
///
/// let renderer = Arc::new(TeraRenderer::new().unwrap());
/// let app = App::new().wrap(HtmlRender::new(renderer));
/// ```
#[derive(Debug, Clone)]
pub struct HtmlRender {
    renderer: Arc<dyn TemplateRenderer>,
    endpoints: EndpointTemplates,
    prefixes: PathPrefixes,
}

impl HtmlRender {
    /// Create the middleware with the default [`EndpointTemplates`] and no path prefixes.
    #[must_use]
    pub fn new(renderer: Arc<dyn TemplateRenderer>) -> Self {
        Self {
            renderer,
            endpoints: EndpointTemplates::default(),
            prefixes: PathPrefixes::default(),
        }
    }

    #[must_use]
    pub fn with_endpoints(mut self, endpoints: EndpointTemplates) -> Self {
        self.endpoints = endpoints;
        self
    }

    #[must_use]
    pub fn with_prefixes(mut self, prefixes: PathPrefixes) -> Self {
        self.prefixes = prefixes;
        self
    }

    /// Decide what to do with a fully collected response of a GET request, and do it.
    pub fn rewrite(
        &self,
        req: &HttpRequest,
        mut envelope: ResponseEnvelope,
    ) -> Result<ResponseEnvelope, HtmlRenderError> {
        let format = OutputFormat::negotiate(
            format_param(req).as_deref(),
            accept_header(req).as_deref(),
        );

        if envelope.content_type().is_some_and(is_openapi_media_type) {
            let mut doc: Value = serde_json::from_slice(envelope.body())
                .map_err(|e| HtmlRenderError::InvalidJson(req.path().to_string(), e))?;
            let patched = patch_openapi(&mut doc, &self.endpoints);
            debug!(
                "Advertising HTML responses for {patched} operations in the OpenAPI document at {}",
                req.path()
            );
            let body = serde_json::to_vec(&doc)
                .map_err(|e| HtmlRenderError::SerializeError("OpenAPI document", e))?;
            envelope.replace_body(body, None);
        } else if envelope.status() == StatusCode::OK && format.is_html() {
            let Some(route_name) = req.match_name() else {
                trace!("No named route matches {}, not rendering HTML", req.path());
                return Ok(envelope);
            };
            let Some(template) = self.endpoints.for_route_name(route_name) else {
                trace!("Route {route_name} has no template, not rendering HTML");
                return Ok(envelope);
            };

            let data: Value = serde_json::from_slice(envelope.body())
                .map_err(|e| HtmlRenderError::InvalidJson(req.path().to_string(), e))?;
            let context = TemplateContext::new(req, &self.prefixes, data, route_name.to_string());
            let context = serde_json::to_value(context)
                .map_err(|e| HtmlRenderError::SerializeError("template context", e))?;
            let html = self.renderer.render(template, &context)?;

            debug!("Rendered {} as HTML with template {template}", req.path());
            envelope.replace_body(html, Some(HeaderValue::from_static("text/html")));
        }

        Ok(envelope)
    }
}

impl<S, B> Transform<S, ServiceRequest> for HtmlRender
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: MessageBody + 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Transform = HtmlRenderMiddleware<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(HtmlRenderMiddleware {
            service,
            render: Rc::new(self.clone()),
        }))
    }
}

pub struct HtmlRenderMiddleware<S> {
    service: S,
    render: Rc<HtmlRender>,
}

impl<S, B> Service<ServiceRequest> for HtmlRenderMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: MessageBody + 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        if req.method() != Method::GET {
            trace!("Passing {} {} through", req.method(), req.path());
            let fut = self.service.call(req);
            return Box::pin(async move { Ok(fut.await?.map_into_left_body()) });
        }

        let render = Rc::clone(&self.render);
        let fut = self.service.call(req);
        Box::pin(async move {
            let (req, res) = fut.await?.into_parts();
            let (head, body) = res.into_parts();

            let envelope = collect_body(req.path(), head, body)
                .await
                .map_err(map_internal_error)?;
            let envelope = render
                .rewrite(&req, envelope)
                .map_err(map_internal_error)?;

            Ok(ServiceResponse::new(req, envelope.into_response())
                .map_into_boxed_body()
                .map_into_right_body())
        })
    }
}

#[cfg(test)]
mod tests {
    use actix_web::test::TestRequest;
    use rstest::rstest;
    use serde_json::json;

    use super::*;
    use crate::templates::TeraRenderer;

    fn envelope(content_type: &str, body: &'static str) -> ResponseEnvelope {
        let mut acc = ResponseAccumulator::new(
            HttpResponse::Ok()
                .insert_header((CONTENT_TYPE, content_type))
                .finish()
                .drop_body(),
        );
        for chunk in body.as_bytes().chunks(3) {
            acc.push(chunk);
        }
        acc.finish()
    }

    fn render() -> HtmlRender {
        HtmlRender::new(Arc::new(TeraRenderer::new().unwrap()))
    }

    #[test]
    fn accumulator_joins_chunks() {
        let env = envelope("application/json", r#"{"id": "abc"}"#);
        assert_eq!(env.body(), &Bytes::from_static(br#"{"id": "abc"}"#));
        assert_eq!(env.content_type(), Some("application/json"));
        assert_eq!(env.status(), StatusCode::OK);
    }

    #[test]
    fn replace_body_updates_headers() {
        let mut env = envelope("application/json", "{}");
        env.replace_body("<p>hi</p>", Some(HeaderValue::from_static("text/html")));
        let res = env.into_response();
        assert_eq!(res.headers().get(CONTENT_TYPE).unwrap(), "text/html");
        assert_eq!(res.headers().get(CONTENT_LENGTH).unwrap(), "9");
    }

    #[test]
    fn accept_headers_are_joined() {
        let req = TestRequest::get()
            .append_header((ACCEPT, "application/json;q=0.5"))
            .append_header((ACCEPT, "text/html"))
            .to_http_request();
        assert_eq!(
            accept_header(&req).as_deref(),
            Some("application/json;q=0.5,text/html")
        );
        assert_eq!(accept_header(&TestRequest::get().to_http_request()), None);
    }

    #[test]
    fn format_param_is_read_from_query() {
        let req = TestRequest::get().uri("/?limit=1&f=html").to_http_request();
        assert_eq!(format_param(&req).as_deref(), Some("html"));
        let req = TestRequest::get().uri("/?f=").to_http_request();
        assert_eq!(format_param(&req).as_deref(), Some(""));
        let req = TestRequest::get().uri("/").to_http_request();
        assert_eq!(format_param(&req), None);
    }

    #[rstest]
    #[case::repeated_json("/?f=json&f=json", Some("text/html"), OutputFormat::Passthrough)]
    #[case::repeated_html("/?f=html&f=html", None, OutputFormat::Html)]
    #[case::last_wins("/?f=html&limit=2&f=json", Some("text/html"), OutputFormat::Passthrough)]
    #[case::last_html_wins("/?f=json&f=html", Some("application/json"), OutputFormat::Html)]
    fn repeated_format_param(
        #[case] uri: &str,
        #[case] accept: Option<&str>,
        #[case] expected: OutputFormat,
    ) {
        let mut req = TestRequest::get().uri(uri);
        if let Some(accept) = accept {
            req = req.insert_header((ACCEPT, accept));
        }
        let req = req.to_http_request();
        let format = OutputFormat::negotiate(
            format_param(&req).as_deref(),
            accept_header(&req).as_deref(),
        );
        assert_eq!(format, expected);
    }

    #[test]
    #[tracing_test::traced_test]
    fn unnamed_route_is_not_rendered() {
        let req = TestRequest::get()
            .uri("/")
            .insert_header((ACCEPT, "text/html"))
            .to_http_request();
        let env = render()
            .rewrite(&req, envelope("application/json", r#"{"title": "x"}"#))
            .unwrap();
        assert_eq!(env.content_type(), Some("application/json"));
        assert_eq!(env.body(), &Bytes::from_static(br#"{"title": "x"}"#));
        assert!(logs_contain("No named route matches /"));
    }

    #[test]
    fn openapi_document_is_patched_without_html() {
        let req = TestRequest::get().uri("/api").to_http_request();
        let doc = r#"{"paths": {"/": {"get": {"summary": "Landing Page", "responses": {"200": {"content": {}}}}}}}"#;
        let env = render()
            .rewrite(&req, envelope(crate::srv::OPENAPI_MEDIA_TYPE, doc))
            .unwrap();
        assert_eq!(env.content_type(), Some(crate::srv::OPENAPI_MEDIA_TYPE));

        let patched: Value = serde_json::from_slice(env.body()).unwrap();
        let get = &patched["paths"]["/"]["get"];
        assert_eq!(get["parameters"][0]["name"], json!("f"));
        assert_eq!(get["responses"]["200"]["content"]["text/html"], json!({}));

        let res = env.into_response();
        let expected_len = serde_json::to_vec(&patched).unwrap().len().to_string();
        assert_eq!(res.headers().get(CONTENT_LENGTH).unwrap(), expected_len.as_str());
    }

    #[test]
    fn malformed_openapi_document_is_an_error() {
        let req = TestRequest::get().uri("/api").to_http_request();
        let err = render()
            .rewrite(&req, envelope(crate::srv::OPENAPI_MEDIA_TYPE, "{not json"))
            .unwrap_err();
        assert!(matches!(err, HtmlRenderError::InvalidJson(path, _) if path == "/api"));
    }
}
