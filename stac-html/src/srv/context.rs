use std::collections::BTreeMap;

use actix_web::HttpRequest;
use actix_web::web::Query;
use serde::Serialize;
use serde_json::Value;

/// Path prefixes that are not part of the STAC API paths.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PathPrefixes {
    /// Prefix of the whole server, e.g. when it is mounted under a sub-path by a reverse proxy.
    pub mount: Option<String>,
    /// Prefix of the STAC API routes within the server.
    pub route: Option<String>,
}

impl PathPrefixes {
    #[must_use]
    pub fn new(mount: Option<String>, route: Option<String>) -> Self {
        Self { mount, route }
    }

    /// Remove the mount prefix, then the route prefix, from a request path.
    #[must_use]
    pub fn strip<'a>(&self, path: &'a str) -> &'a str {
        let path = strip_path_prefix(path, self.mount.as_deref());
        strip_path_prefix(path, self.route.as_deref())
    }

    /// Both prefixes joined, as they appear in front of any STAC API path.
    #[must_use]
    pub fn joined(&self) -> String {
        format!(
            "{}{}",
            self.mount.as_deref().unwrap_or_default(),
            self.route.as_deref().unwrap_or_default()
        )
    }
}

fn strip_path_prefix<'a>(path: &'a str, prefix: Option<&str>) -> &'a str {
    match prefix.filter(|p| !p.is_empty()) {
        Some(prefix) => match path.strip_prefix(prefix) {
            Some(rest) if rest.is_empty() || rest.starts_with('/') => rest,
            _ => path,
        },
        None => path,
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Crumb {
    pub url: String,
    pub part: String,
}

/// Uppercase the first character and lowercase the rest.
fn capitalize(value: &str) -> String {
    let mut chars = value.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
        None => String::new(),
    }
}

/// Label of a path segment: percent-decoded, then capitalized.
fn crumb_label(segment: &str) -> String {
    if segment.is_empty() {
        return "Home".to_string();
    }
    match urlencoding::decode(segment) {
        Ok(decoded) => capitalize(&decoded),
        Err(_) => capitalize(segment),
    }
}

/// Build the breadcrumb trail of a path relative to the API root.
///
/// Every segment adds a crumb pointing to the path up to and including that segment.
/// Crumb URLs keep the segments as requested, labels are decoded.
/// Empty segments are labeled `Home`.
#[must_use]
pub fn breadcrumbs(api_root: &str, path: &str) -> Vec<Crumb> {
    let path = if path == "/" { "" } else { path };
    let mut crumb_path = api_root.to_string();

    path.split('/')
        .map(|segment| {
            crumb_path.truncate(crumb_path.trim_end_matches('/').len());
            crumb_path.push('/');
            crumb_path.push_str(segment);
            Crumb {
                url: crumb_path.trim_end_matches('/').to_string(),
                part: crumb_label(segment),
            }
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TemplateInfo {
    pub api_root: String,
    pub params: BTreeMap<String, String>,
    pub title: String,
}

/// Everything a template gets to see when rendering a response.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TemplateContext {
    pub response: Value,
    pub template: TemplateInfo,
    pub crumbs: Vec<Crumb>,
    pub url: String,
    pub params: String,
}

impl TemplateContext {
    #[must_use]
    pub fn new(req: &HttpRequest, prefixes: &PathPrefixes, response: Value, title: String) -> Self {
        let info = req.connection_info();
        let api_root = format!(
            "{}://{}{}",
            info.scheme(),
            info.host(),
            prefixes.joined()
        );

        let path = match prefixes.strip(req.path()) {
            "/" => "",
            path => path,
        };

        let params = Query::<BTreeMap<String, String>>::from_query(req.query_string())
            .map(Query::into_inner)
            .unwrap_or_default();

        Self {
            response,
            crumbs: breadcrumbs(&api_root, path),
            url: format!("{api_root}{path}"),
            params: req.query_string().to_string(),
            template: TemplateInfo {
                api_root,
                params,
                title,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use actix_web::test::TestRequest;
    use serde_json::json;

    use super::*;

    fn crumb(url: &str, part: &str) -> Crumb {
        Crumb {
            url: url.to_string(),
            part: part.to_string(),
        }
    }

    #[test]
    fn test_capitalize() {
        assert_eq!(capitalize("collections"), "Collections");
        assert_eq!(capitalize("my_COLLECTION"), "My_collection");
        assert_eq!(capitalize(""), "");
    }

    #[test]
    fn test_strip_prefixes() {
        let prefixes = PathPrefixes::new(Some("/stac".to_string()), Some("/api/v1".to_string()));
        assert_eq!(prefixes.strip("/stac/api/v1/collections"), "/collections");
        assert_eq!(prefixes.strip("/api/v1/collections"), "/collections");
        assert_eq!(prefixes.strip("/stac/api/v1"), "");
        assert_eq!(prefixes.strip("/stacks/api/v1"), "/stacks/api/v1");
        assert_eq!(prefixes.joined(), "/stac/api/v1");

        let prefixes = PathPrefixes::default();
        assert_eq!(prefixes.strip("/collections"), "/collections");
        assert_eq!(prefixes.joined(), "");
    }

    #[test]
    fn test_breadcrumbs_root() {
        assert_eq!(
            breadcrumbs("http://localhost:8080", ""),
            vec![crumb("http://localhost:8080", "Home")]
        );
        assert_eq!(
            breadcrumbs("http://localhost:8080", "/"),
            vec![crumb("http://localhost:8080", "Home")]
        );
    }

    #[test]
    fn test_breadcrumbs_nested() {
        assert_eq!(
            breadcrumbs(
                "http://localhost:8080/api",
                "/collections/my_collection/items/item_1"
            ),
            vec![
                crumb("http://localhost:8080/api", "Home"),
                crumb("http://localhost:8080/api/collections", "Collections"),
                crumb(
                    "http://localhost:8080/api/collections/my_collection",
                    "My_collection"
                ),
                crumb(
                    "http://localhost:8080/api/collections/my_collection/items",
                    "Items"
                ),
                crumb(
                    "http://localhost:8080/api/collections/my_collection/items/item_1",
                    "Item_1"
                ),
            ]
        );
    }

    #[test]
    fn test_breadcrumbs_decode_labels() {
        assert_eq!(
            breadcrumbs("http://localhost:8080", "/collections/my%20coll"),
            vec![
                crumb("http://localhost:8080", "Home"),
                crumb("http://localhost:8080/collections", "Collections"),
                crumb("http://localhost:8080/collections/my%20coll", "My coll"),
            ]
        );
        // invalid utf-8 once decoded
        assert_eq!(
            breadcrumbs("http://localhost:8080", "/%FF").last(),
            Some(&crumb("http://localhost:8080/%FF", "%ff"))
        );
    }

    #[test]
    fn test_template_context() {
        let req = TestRequest::get()
            .uri("/stac/collections/sentinel?f=html&limit=10")
            .insert_header(("host", "example.com"))
            .to_http_request();
        let prefixes = PathPrefixes::new(Some("/stac".to_string()), None);

        let ctx = TemplateContext::new(&req, &prefixes, json!({"id": "sentinel"}), "Get Collection".to_string());

        assert_eq!(ctx.template.api_root, "http://example.com/stac");
        assert_eq!(ctx.template.title, "Get Collection");
        assert_eq!(ctx.template.params.get("f").map(String::as_str), Some("html"));
        assert_eq!(ctx.template.params.get("limit").map(String::as_str), Some("10"));
        assert_eq!(ctx.url, "http://example.com/stac/collections/sentinel");
        assert_eq!(ctx.params, "f=html&limit=10");
        assert_eq!(
            ctx.crumbs.last(),
            Some(&crumb("http://example.com/stac/collections/sentinel", "Sentinel"))
        );

        let value = serde_json::to_value(&ctx).unwrap();
        assert_eq!(value["response"]["id"], "sentinel");
        assert_eq!(value["template"]["api_root"], "http://example.com/stac");
        assert_eq!(value["crumbs"][0]["part"], "Home");
    }
}
