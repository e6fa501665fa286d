//! A static STAC API served from a directory of JSON documents.
//!
//! Every STAC route is registered under the route name of the [`StacOperation`] it serves,
//! which is how the HTML middleware finds the template to render it with.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use actix_web::error::ErrorNotFound;
use actix_web::http::header::CACHE_CONTROL;
use actix_web::web::{self, Data, Path as UrlPath, ServiceConfig};
use actix_web::{HttpResponse, Responder, route};
use serde_json::{Map, Value, json};
use tracing::{debug, info};

use crate::endpoints::StacOperation;
use crate::srv::OPENAPI_MEDIA_TYPE;

pub const JSON: &str = "application/json";
pub const GEO_JSON: &str = "application/geo+json";
pub const SCHEMA_JSON: &str = "application/schema+json";

#[derive(thiserror::Error, Debug)]
pub enum CatalogError {
    #[error("Catalog directory {0} does not exist or is not a directory")]
    MissingDirectory(PathBuf),

    #[error("Unable to read {1}: {0}")]
    ReadError(#[source] io::Error, PathBuf),

    #[error("Unable to parse {1}: {0}")]
    ParseError(#[source] serde_json::Error, PathBuf),

    #[error("{1} must contain a JSON object with a '{0}' array")]
    InvalidDocument(&'static str, PathBuf),
}

pub type CatalogResult<T> = Result<T, CatalogError>;

/// Documents of a static STAC API.
#[derive(Debug, Clone, PartialEq)]
pub struct StaticCatalog {
    pub landing: Value,
    pub conformances: Value,
    pub collections: Value,
    pub items: Value,
    pub search: Value,
    pub queryables: Value,
    pub collection_queryables: Value,
}

fn empty_feature_collection() -> Value {
    json!({"type": "FeatureCollection", "features": [], "links": []})
}

fn empty_queryables() -> Value {
    json!({
        "$schema": "https://json-schema.org/draft/2019-09/schema",
        "type": "object",
        "title": "Queryables",
        "properties": {},
    })
}

fn read_document(dir: &Path, file: &str) -> CatalogResult<Option<Value>> {
    let path = dir.join(file);
    if !path.is_file() {
        return Ok(None);
    }
    let contents = fs::read(&path).map_err(|e| CatalogError::ReadError(e, path.clone()))?;
    let value = serde_json::from_slice(&contents).map_err(|e| CatalogError::ParseError(e, path))?;
    debug!("Loaded {file} from {}", dir.display());
    Ok(Some(value))
}

fn require_array(doc: &Value, key: &'static str, path: PathBuf) -> CatalogResult<()> {
    if doc.get(key).is_some_and(Value::is_array) {
        Ok(())
    } else {
        Err(CatalogError::InvalidDocument(key, path))
    }
}

impl StaticCatalog {
    /// Load the catalog documents from a directory.
    ///
    /// `landing.json` and `collections.json` are required, the other documents
    /// default to empty feature collections and empty queryables.
    pub fn from_dir(dir: &Path) -> CatalogResult<Self> {
        if !dir.is_dir() {
            return Err(CatalogError::MissingDirectory(dir.to_path_buf()));
        }

        let missing = |file: &str| {
            CatalogError::ReadError(io::ErrorKind::NotFound.into(), dir.join(file))
        };
        let landing = read_document(dir, "landing.json")?.ok_or_else(|| missing("landing.json"))?;
        let collections =
            read_document(dir, "collections.json")?.ok_or_else(|| missing("collections.json"))?;
        require_array(&collections, "collections", dir.join("collections.json"))?;

        let items = read_document(dir, "items.json")?.unwrap_or_else(empty_feature_collection);
        require_array(&items, "features", dir.join("items.json"))?;

        let catalog = Self {
            landing,
            conformances: read_document(dir, "conformances.json")?
                .unwrap_or_else(|| json!({"conformsTo": []})),
            collections,
            items,
            search: read_document(dir, "search.json")?.unwrap_or_else(empty_feature_collection),
            queryables: read_document(dir, "queryables.json")?.unwrap_or_else(empty_queryables),
            collection_queryables: read_document(dir, "collection_queryables.json")?
                .unwrap_or_else(empty_queryables),
        };

        info!(
            "Serving {} collections and {} items from {}",
            catalog.collection_list().len(),
            catalog.features().len(),
            dir.display()
        );
        Ok(catalog)
    }

    fn collection_list(&self) -> &[Value] {
        self.collections["collections"]
            .as_array()
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    fn features(&self) -> &[Value] {
        self.items["features"]
            .as_array()
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    #[must_use]
    pub fn collection(&self, collection_id: &str) -> Option<&Value> {
        self.collection_list()
            .iter()
            .find(|c| c["id"].as_str() == Some(collection_id))
    }

    /// Features belonging to a collection. Features without a `collection` belong to all of them.
    fn collection_features<'a, 'b>(
        &'a self,
        collection_id: &'b str,
    ) -> impl Iterator<Item = &'a Value> + use<'a, 'b> {
        self.features().iter().filter(move |f| {
            f.get("collection")
                .and_then(Value::as_str)
                .is_none_or(|c| c == collection_id)
        })
    }

    /// The item collection of a collection, or `None` if the collection is unknown.
    #[must_use]
    pub fn item_collection(&self, collection_id: &str) -> Option<Value> {
        self.collection(collection_id)?;
        let features: Vec<Value> = self.collection_features(collection_id).cloned().collect();
        let mut doc = self.items.clone();
        if let Some(obj) = doc.as_object_mut() {
            if obj.contains_key("numberReturned") {
                obj.insert("numberReturned".to_string(), json!(features.len()));
            }
            obj.insert("features".to_string(), Value::Array(features));
        }
        Some(doc)
    }

    #[must_use]
    pub fn item(&self, collection_id: &str, item_id: &str) -> Option<&Value> {
        self.collection(collection_id)?;
        self.collection_features(collection_id)
            .find(|f| f["id"].as_str() == Some(item_id))
    }
}

/// Routes served by [`StaticCatalog`], relative to the route prefix.
const ROUTES: &[(&str, StacOperation)] = &[
    ("/", StacOperation::LandingPage),
    ("/conformance", StacOperation::ConformanceClasses),
    ("/collections", StacOperation::GetCollections),
    ("/collections/{collection_id}", StacOperation::GetCollection),
    ("/collections/{collection_id}/items", StacOperation::GetItemCollection),
    ("/collections/{collection_id}/items/{item_id}", StacOperation::GetItem),
    ("/search", StacOperation::Search),
    ("/queryables", StacOperation::Queryables),
    ("/collections/{collection_id}/queryables", StacOperation::CollectionQueryables),
];

/// The landing page is served at the bare prefix, without a trailing `/`.
fn prefixed_path(route_prefix: &str, path: &str) -> String {
    if route_prefix.is_empty() {
        path.to_string()
    } else if path == "/" {
        route_prefix.to_string()
    } else {
        format!("{route_prefix}{path}")
    }
}

fn path_parameters(path: &str) -> Vec<Value> {
    path.split('/')
        .filter_map(|s| s.strip_prefix('{')?.strip_suffix('}'))
        .map(|name| json!({"name": name, "in": "path", "required": true, "schema": {"type": "string"}}))
        .collect()
}

fn media_type(operation: StacOperation) -> &'static str {
    match operation {
        StacOperation::GetItemCollection | StacOperation::GetItem | StacOperation::Search => {
            GEO_JSON
        }
        StacOperation::Queryables | StacOperation::CollectionQueryables => SCHEMA_JSON,
        _ => JSON,
    }
}

/// Generate the OpenAPI 3.0 document of the catalog routes.
#[must_use]
pub fn openapi_document(route_prefix: &str) -> Value {
    let mut paths = Map::new();
    for (path, operation) in ROUTES {
        let mut get = json!({
            "summary": operation.route_name(),
            "operationId": operation.to_string().to_lowercase().replace(' ', "_"),
            "responses": {"200": {
                "description": "Successful Response",
                "content": {media_type(*operation): {"schema": {}}},
            }},
        });
        let parameters = path_parameters(path);
        if !parameters.is_empty() {
            get["parameters"] = Value::Array(parameters);
        }
        let mut item = json!({"get": get});
        if *operation == StacOperation::Search {
            let mut post = item["get"].clone();
            post["operationId"] = json!("post_search");
            item["post"] = post;
        }
        paths.insert(prefixed_path(route_prefix, path), item);
    }

    json!({
        "openapi": "3.0.2",
        "info": {
            "title": "stac-html",
            "version": env!("CARGO_PKG_VERSION"),
        },
        "paths": paths,
    })
}

fn json_response(content_type: &'static str, value: &Value) -> HttpResponse {
    HttpResponse::Ok()
        .content_type(content_type)
        .body(value.to_string())
}

fn collection_not_found(collection_id: &str) -> actix_web::Error {
    ErrorNotFound(format!("Collection {collection_id} does not exist"))
}

#[allow(clippy::unused_async)]
async fn get_landing(catalog: Data<StaticCatalog>) -> HttpResponse {
    json_response(JSON, &catalog.landing)
}

#[allow(clippy::unused_async)]
async fn get_conformance(catalog: Data<StaticCatalog>) -> HttpResponse {
    json_response(JSON, &catalog.conformances)
}

#[allow(clippy::unused_async)]
async fn get_collections(catalog: Data<StaticCatalog>) -> HttpResponse {
    json_response(JSON, &catalog.collections)
}

#[allow(clippy::unused_async)]
async fn get_collection(
    path: UrlPath<String>,
    catalog: Data<StaticCatalog>,
) -> actix_web::Result<HttpResponse> {
    let collection_id = path.into_inner();
    catalog
        .collection(&collection_id)
        .map(|c| json_response(JSON, c))
        .ok_or_else(|| collection_not_found(&collection_id))
}

#[allow(clippy::unused_async)]
async fn get_item_collection(
    path: UrlPath<String>,
    catalog: Data<StaticCatalog>,
) -> actix_web::Result<HttpResponse> {
    let collection_id = path.into_inner();
    catalog
        .item_collection(&collection_id)
        .map(|items| json_response(GEO_JSON, &items))
        .ok_or_else(|| collection_not_found(&collection_id))
}

#[allow(clippy::unused_async)]
async fn get_item(
    path: UrlPath<(String, String)>,
    catalog: Data<StaticCatalog>,
) -> actix_web::Result<HttpResponse> {
    let (collection_id, item_id) = path.into_inner();
    catalog
        .item(&collection_id, &item_id)
        .map(|item| json_response(GEO_JSON, item))
        .ok_or_else(|| {
            ErrorNotFound(format!(
                "Item {item_id} does not exist in collection {collection_id}"
            ))
        })
}

#[allow(clippy::unused_async)]
async fn get_search(catalog: Data<StaticCatalog>) -> HttpResponse {
    json_response(GEO_JSON, &catalog.search)
}

#[allow(clippy::unused_async)]
async fn get_queryables(catalog: Data<StaticCatalog>) -> HttpResponse {
    json_response(SCHEMA_JSON, &catalog.queryables)
}

#[allow(clippy::unused_async)]
async fn get_collection_queryables(
    path: UrlPath<String>,
    catalog: Data<StaticCatalog>,
) -> actix_web::Result<HttpResponse> {
    let collection_id = path.into_inner();
    catalog
        .collection(&collection_id)
        .map(|_| json_response(SCHEMA_JSON, &catalog.collection_queryables))
        .ok_or_else(|| collection_not_found(&collection_id))
}

/// Register the STAC routes under `route_prefix`, each named after the operation it serves.
pub fn stac_routes(cfg: &mut ServiceConfig, route_prefix: &str) {
    for (path, operation) in ROUTES {
        let resource = web::resource(prefixed_path(route_prefix, path)).name(operation.route_name());
        let resource = match operation {
            StacOperation::LandingPage => resource.route(web::get().to(get_landing)),
            StacOperation::ConformanceClasses => resource.route(web::get().to(get_conformance)),
            StacOperation::GetCollections => resource.route(web::get().to(get_collections)),
            StacOperation::GetCollection => resource.route(web::get().to(get_collection)),
            StacOperation::GetItemCollection => {
                resource.route(web::get().to(get_item_collection))
            }
            StacOperation::GetItem => resource.route(web::get().to(get_item)),
            StacOperation::Search => resource
                .route(web::get().to(get_search))
                .route(web::post().to(get_search)),
            StacOperation::Queryables => resource.route(web::get().to(get_queryables)),
            StacOperation::CollectionQueryables => {
                resource.route(web::get().to(get_collection_queryables))
            }
        };
        cfg.service(resource);
    }
}

/// Generated OpenAPI document, stored as application data when the server is built.
#[derive(Debug, Clone)]
pub struct OpenApiDocument(pub Value);

#[route("/api", method = "GET", method = "HEAD", name = "Openapi")]
#[allow(clippy::unused_async)]
async fn get_openapi(doc: Data<OpenApiDocument>) -> impl Responder {
    json_response(OPENAPI_MEDIA_TYPE, &doc.0)
}

/// Return 200 OK if healthy. Used for readiness and liveness probes.
#[route("/health", method = "GET", method = "HEAD")]
#[allow(clippy::unused_async)]
async fn get_health() -> impl Responder {
    HttpResponse::Ok()
        .insert_header((CACHE_CONTROL, "no-cache"))
        .message_body("OK")
}

/// Register the routes living outside the STAC routes.
pub fn service_routes(cfg: &mut ServiceConfig) {
    cfg.service(get_openapi).service(get_health);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write(dir: &Path, file: &str, value: &Value) {
        fs::write(dir.join(file), value.to_string()).unwrap();
    }

    fn catalog_dir() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "landing.json", &json!({"type": "Catalog", "id": "test"}));
        write(
            dir.path(),
            "collections.json",
            &json!({"collections": [{"id": "a"}, {"id": "b"}], "links": []}),
        );
        write(
            dir.path(),
            "items.json",
            &json!({
                "type": "FeatureCollection",
                "numberReturned": 3,
                "features": [
                    {"id": "a1", "collection": "a"},
                    {"id": "b1", "collection": "b"},
                    {"id": "any"},
                ],
            }),
        );
        dir
    }

    #[test]
    fn load_with_defaults() {
        let dir = catalog_dir();
        let catalog = StaticCatalog::from_dir(dir.path()).unwrap();
        assert_eq!(catalog.conformances, json!({"conformsTo": []}));
        assert_eq!(catalog.search["features"], json!([]));
        assert_eq!(catalog.queryables["title"], "Queryables");
    }

    #[test]
    fn items_are_filtered_by_collection() {
        let dir = catalog_dir();
        let catalog = StaticCatalog::from_dir(dir.path()).unwrap();

        let items = catalog.item_collection("a").unwrap();
        assert_eq!(items["numberReturned"], 2);
        assert_eq!(items["features"][0]["id"], "a1");
        assert_eq!(items["features"][1]["id"], "any");

        assert!(catalog.item_collection("missing").is_none());
        assert!(catalog.item("a", "a1").is_some());
        assert!(catalog.item("a", "b1").is_none());
        assert!(catalog.item("b", "any").is_some());
    }

    #[test]
    fn item_outlives_the_requested_id() {
        let dir = catalog_dir();
        let catalog = StaticCatalog::from_dir(dir.path()).unwrap();

        let item = {
            let collection_id = String::from("a");
            catalog.item(&collection_id, "a1")
        };
        assert_eq!(item.map(|i| &i["id"]), Some(&json!("a1")));
    }

    #[test]
    fn missing_required_documents() {
        let dir = tempfile::tempdir().unwrap();
        let err = StaticCatalog::from_dir(dir.path()).unwrap_err();
        assert!(matches!(err, CatalogError::ReadError(_, path) if path.ends_with("landing.json")));

        write(dir.path(), "landing.json", &json!({}));
        write(dir.path(), "collections.json", &json!({"links": []}));
        let err = StaticCatalog::from_dir(dir.path()).unwrap_err();
        assert!(matches!(err, CatalogError::InvalidDocument("collections", _)));

        fs::write(dir.path().join("collections.json"), "{oops").unwrap();
        let err = StaticCatalog::from_dir(dir.path()).unwrap_err();
        assert!(matches!(err, CatalogError::ParseError(..)));

        let err = StaticCatalog::from_dir(&dir.path().join("nope")).unwrap_err();
        assert!(matches!(err, CatalogError::MissingDirectory(_)));
    }

    #[test]
    fn generated_openapi_document() {
        let doc = openapi_document("/stac");
        let paths = doc["paths"].as_object().unwrap();
        assert_eq!(paths.len(), ROUTES.len());
        assert_eq!(paths["/stac"]["get"]["summary"], "Landing Page");
        assert_eq!(
            paths["/stac/collections/{collection_id}/items/{item_id}"]["get"]["parameters"][1]["name"],
            "item_id"
        );
        assert_eq!(paths["/stac/search"]["post"]["operationId"], "post_search");
        assert!(
            paths["/stac/queryables"]["get"]["responses"]["200"]["content"][SCHEMA_JSON].is_object()
        );

        assert_eq!(prefixed_path("/stac", "/"), "/stac");
        assert_eq!(prefixed_path("", "/"), "/");

        let doc = openapi_document("");
        assert_eq!(doc["paths"]["/"]["get"]["operationId"], "landing_page");
    }
}
