//! Advertise HTML responses in the OpenAPI document of a STAC API.

use serde_json::{Map, Value, json};

use crate::endpoints::{EndpointTemplates, StacOperation};

/// Media type used by STAC APIs for their OpenAPI document.
pub const OPENAPI_MEDIA_TYPE: &str = "application/vnd.oai.openapi+json;version=3.0";

/// Check if a `Content-Type` value is the OpenAPI document media type.
///
/// Whitespace and ASCII case are ignored.
#[must_use]
pub fn is_openapi_media_type(content_type: &str) -> bool {
    let content_type: String = content_type
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect();
    content_type.eq_ignore_ascii_case(OPENAPI_MEDIA_TYPE)
}

fn format_parameter() -> Value {
    json!({
        "name": "f",
        "in": "query",
        "required": false,
        "schema": {
            "anyOf": [
                {"enum": ["html"], "type": "string"},
                {"type": "null"}
            ],
            "description": "Response MediaType.",
            "title": "F"
        },
        "description": "Response MediaType."
    })
}

/// Get the object at `key`, inserting an empty one if missing or not an object.
fn object_entry<'a>(
    map: &'a mut Map<String, Value>,
    key: &str,
) -> Option<&'a mut Map<String, Value>> {
    let entry = map
        .entry(key)
        .or_insert_with(|| Value::Object(Map::new()));
    if !entry.is_object() {
        *entry = Value::Object(Map::new());
    }
    entry.as_object_mut()
}

/// Add the `f` query parameter and a `text/html` response to every GET operation
/// whose `summary` names a STAC operation bound to a template.
///
/// Applying the patch more than once does not duplicate anything.
/// Returns the number of patched operations.
pub fn patch_openapi(doc: &mut Value, endpoints: &EndpointTemplates) -> usize {
    let Some(paths) = doc.get_mut("paths").and_then(Value::as_object_mut) else {
        return 0;
    };

    let mut patched = 0;
    for path in paths.values_mut() {
        let Some(get) = path.get_mut("get").and_then(Value::as_object_mut) else {
            continue;
        };
        let recognized = get
            .get("summary")
            .and_then(Value::as_str)
            .and_then(StacOperation::from_route_name)
            .is_some_and(|op| endpoints.contains(op));
        if !recognized {
            continue;
        }

        let parameters = get
            .entry("parameters")
            .or_insert_with(|| Value::Array(Vec::new()));
        if !parameters.is_array() {
            *parameters = Value::Array(Vec::new());
        }
        if let Some(parameters) = parameters.as_array_mut() {
            let has_format = parameters
                .iter()
                .any(|p| p["name"].as_str() == Some("f") && p["in"].as_str() == Some("query"));
            if !has_format {
                parameters.push(format_parameter());
            }
        }

        if let Some(content) = object_entry(get, "responses")
            .and_then(|responses| object_entry(responses, "200"))
            .and_then(|ok| object_entry(ok, "content"))
        {
            content
                .entry("text/html")
                .or_insert_with(|| Value::Object(Map::new()));
        }

        patched += 1;
    }
    patched
}
