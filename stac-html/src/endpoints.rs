use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Logical STAC API operations that can be rendered as HTML.
///
/// The route name of every operation is used both as the actix resource name of its route,
/// and to recognize the operation in the `summary` of an OpenAPI document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StacOperation {
    LandingPage,
    ConformanceClasses,
    GetCollections,
    GetCollection,
    GetItemCollection,
    GetItem,
    Search,
    // Extensions
    Queryables,
    CollectionQueryables,
}

impl StacOperation {
    pub const ALL: [Self; 9] = [
        Self::LandingPage,
        Self::ConformanceClasses,
        Self::GetCollections,
        Self::GetCollection,
        Self::GetItemCollection,
        Self::GetItem,
        Self::Search,
        Self::Queryables,
        Self::CollectionQueryables,
    ];

    /// Human-readable route name, e.g. `Get ItemCollection`
    #[must_use]
    pub fn route_name(self) -> &'static str {
        match self {
            Self::LandingPage => "Landing Page",
            Self::ConformanceClasses => "Conformance Classes",
            Self::GetCollections => "Get Collections",
            Self::GetCollection => "Get Collection",
            Self::GetItemCollection => "Get ItemCollection",
            Self::GetItem => "Get Item",
            Self::Search => "Search",
            Self::Queryables => "Queryables",
            Self::CollectionQueryables => "Collection Queryables",
        }
    }

    /// Find the operation served by a route, ignoring ASCII case.
    #[must_use]
    pub fn from_route_name(name: &str) -> Option<Self> {
        let name = name.trim();
        Self::ALL
            .into_iter()
            .find(|op| op.route_name().eq_ignore_ascii_case(name))
    }
}

impl fmt::Display for StacOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.route_name())
    }
}

/// Binding of STAC operations to the template used to render them.
///
/// Operations without a binding are never rendered as HTML.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EndpointTemplates(BTreeMap<StacOperation, String>);

impl Default for EndpointTemplates {
    fn default() -> Self {
        [
            (StacOperation::LandingPage, "landing"),
            (StacOperation::ConformanceClasses, "conformances"),
            (StacOperation::GetCollections, "collections"),
            (StacOperation::GetCollection, "collection"),
            (StacOperation::GetItemCollection, "items"),
            (StacOperation::GetItem, "item"),
            (StacOperation::Search, "search"),
            (StacOperation::Queryables, "queryables"),
            (StacOperation::CollectionQueryables, "queryables"),
        ]
        .into_iter()
        .collect()
    }
}

impl<T: Into<String>> FromIterator<(StacOperation, T)> for EndpointTemplates {
    fn from_iter<I: IntoIterator<Item = (StacOperation, T)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(op, tpl)| (op, tpl.into())).collect())
    }
}

impl EndpointTemplates {
    /// A binding without any operation, i.e. nothing is ever rendered.
    #[must_use]
    pub fn empty() -> Self {
        Self(BTreeMap::new())
    }

    /// Bind (or re-bind) an operation to a template.
    #[must_use]
    pub fn with(mut self, operation: StacOperation, template: impl Into<String>) -> Self {
        self.0.insert(operation, template.into());
        self
    }

    /// Remove the binding of an operation.
    #[must_use]
    pub fn without(mut self, operation: StacOperation) -> Self {
        self.0.remove(&operation);
        self
    }

    #[must_use]
    pub fn get(&self, operation: StacOperation) -> Option<&str> {
        self.0.get(&operation).map(String::as_str)
    }

    #[must_use]
    pub fn contains(&self, operation: StacOperation) -> bool {
        self.0.contains_key(&operation)
    }

    /// Resolve the template bound to the operation with the given route name.
    #[must_use]
    pub fn for_route_name(&self, route_name: &str) -> Option<&str> {
        StacOperation::from_route_name(route_name).and_then(|op| self.get(op))
    }

    pub fn iter(&self) -> impl Iterator<Item = (StacOperation, &str)> {
        self.0.iter().map(|(op, tpl)| (*op, tpl.as_str()))
    }

    /// Template ids referenced by at least one operation, without duplicates.
    pub fn template_ids(&self) -> impl Iterator<Item = &str> {
        let mut ids: Vec<&str> = self.0.values().map(String::as_str).collect();
        ids.sort_unstable();
        ids.dedup();
        ids.into_iter()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}
