//! The frozen route table.
//!
//! # Responsibilities
//! - File every compiled route under each of its methods (plus ANY/ERROR)
//! - Build the name → routes reverse index
//! - Sort every list by specificity so a linear first-match scan finds the
//!   most specific route
//! - Hold the filter and controller registries consulted at dispatch time
//!
//! # Design Decisions
//! - Immutable after construction; share it behind `Arc` across dispatchers
//! - Sorting is stable, so equally specific routes keep registration order

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::Arc;

use serde::Serialize;

use crate::routing::definition::{RouteDefinition, RouteInfo};
use crate::routing::handler::{Controller, Handler};
use crate::routing::method::Method;

/// Routes, reverse index and registries produced by the build phase.
#[derive(Clone)]
pub struct RouteTable {
    base_uri: String,
    routes: HashMap<Method, Vec<Arc<RouteDefinition>>>,
    names: HashMap<String, Vec<Arc<RouteDefinition>>>,
    filters: HashMap<String, Handler>,
    controllers: HashMap<String, Arc<dyn Controller>>,
    prefixes: Vec<String>,
}

impl RouteTable {
    pub(crate) fn assemble(
        base_uri: String,
        definitions: Vec<RouteDefinition>,
        filters: HashMap<String, Handler>,
        controllers: HashMap<String, Arc<dyn Controller>>,
    ) -> Self {
        let mut routes: HashMap<Method, Vec<Arc<RouteDefinition>>> = HashMap::new();
        let mut names: HashMap<String, Vec<Arc<RouteDefinition>>> = HashMap::new();
        let mut prefixes: Vec<String> = Vec::new();

        for definition in definitions {
            let definition = Arc::new(definition);

            let mut methods = definition.methods().to_vec();
            methods.sort();
            methods.dedup();
            for method in methods {
                routes.entry(method).or_default().push(Arc::clone(&definition));
            }

            if let Some(name) = definition.name() {
                names
                    .entry(name.to_string())
                    .or_default()
                    .push(Arc::clone(&definition));
            }

            let prefix = definition.prefix();
            if !prefix.is_empty() && !prefixes.iter().any(|p| p == prefix) {
                prefixes.push(prefix.to_string());
            }
        }

        for list in routes.values_mut().chain(names.values_mut()) {
            list.sort_by_key(|route| route.specificity());
        }
        prefixes.sort_by(|a, b| b.len().cmp(&a.len()));

        Self {
            base_uri,
            routes,
            names,
            filters,
            controllers,
            prefixes,
        }
    }

    pub fn base_uri(&self) -> &str {
        &self.base_uri
    }

    /// Routes filed under exactly `method`, in probe order.
    pub fn routes(&self, method: Method) -> &[Arc<RouteDefinition>] {
        self.routes.get(&method).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Probe order for a request: the ANY bucket, then the method bucket.
    pub fn candidates(&self, method: Method) -> impl Iterator<Item = &Arc<RouteDefinition>> {
        self.routes(Method::Any).iter().chain(self.routes(method))
    }

    pub fn error_routes(&self) -> &[Arc<RouteDefinition>] {
        self.routes(Method::Error)
    }

    /// Every route declared under `name`, most specific first.
    pub fn named(&self, name: &str) -> &[Arc<RouteDefinition>] {
        self.names.get(name).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn filter(&self, name: &str) -> Option<&Handler> {
        self.filters.get(name)
    }

    pub fn controller(&self, class: &str) -> Option<&Arc<dyn Controller>> {
        self.controllers.get(class)
    }

    /// Distinct static prefixes, longest first.
    pub fn prefixes(&self) -> &[String] {
        &self.prefixes
    }

    /// Number of distinct compiled routes.
    pub fn len(&self) -> usize {
        let mut seen: Vec<*const RouteDefinition> = self
            .routes
            .values()
            .flatten()
            .map(Arc::as_ptr)
            .collect();
        seen.sort();
        seen.dedup();
        seen.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.values().all(Vec::is_empty)
    }

    /// Serializable view of the whole table.
    pub fn manifest(&self) -> Manifest {
        let describe = |list: &Vec<Arc<RouteDefinition>>| -> Vec<RouteInfo> {
            list.iter().map(|route| route.info()).collect()
        };

        let mut controllers: Vec<String> = self.controllers.keys().cloned().collect();
        controllers.sort();

        Manifest {
            base_uri: self.base_uri.clone(),
            prefixes: self.prefixes.clone(),
            routes: self.routes.iter().map(|(m, list)| (*m, describe(list))).collect(),
            reverse: self.names.iter().map(|(n, list)| (n.clone(), describe(list))).collect(),
            filters: self
                .filters
                .iter()
                .map(|(name, handler)| (name.clone(), handler.describe()))
                .collect(),
            controllers,
        }
    }
}

impl fmt::Debug for RouteTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut buckets: Vec<(Method, usize)> = self.routes.iter().map(|(m, l)| (*m, l.len())).collect();
        buckets.sort();
        f.debug_struct("RouteTable")
            .field("base_uri", &self.base_uri)
            .field("buckets", &buckets)
            .field("names", &self.names.len())
            .field("filters", &self.filters.len())
            .field("controllers", &self.controllers.len())
            .finish()
    }
}

/// Exported description of a [`RouteTable`].
#[derive(Debug, Clone, Serialize)]
pub struct Manifest {
    pub base_uri: String,
    pub prefixes: Vec<String>,
    pub routes: BTreeMap<Method, Vec<RouteInfo>>,
    pub reverse: BTreeMap<String, Vec<RouteInfo>>,
    pub filters: BTreeMap<String, String>,
    pub controllers: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routing::definition::RouteDraft;
    use crate::routing::group::RouteOptions;
    use serde_json::Value;

    fn def(methods: &[Method], path: &str, options: RouteOptions, name: Option<&str>) -> RouteDefinition {
        RouteDefinition::compile(
            RouteDraft {
                methods: methods.to_vec(),
                path: path.to_string(),
                options,
                handler: Handler::func(|_| Value::Null),
                name: name.map(str::to_string),
                grouped: false,
            },
            "",
            &BTreeMap::new(),
        )
        .unwrap()
    }

    #[test]
    fn test_specificity_beats_registration_order() {
        let table = RouteTable::assemble(
            String::new(),
            vec![
                def(&[Method::Get], "/itemsr/", RouteOptions::new(), None),
                def(&[Method::Get], "/itemsr/", RouteOptions::new().host("routes2.dev"), None),
            ],
            HashMap::new(),
            HashMap::new(),
        );

        let routes = table.routes(Method::Get);
        assert_eq!(routes[0].hosts(), ["routes2.dev".to_string()]);
        assert!(routes[1].hosts().is_empty());
    }

    #[test]
    fn test_shared_route_across_methods() {
        let table = RouteTable::assemble(
            String::new(),
            vec![def(&[Method::Get, Method::Post, Method::Get], "/map/", RouteOptions::new(), Some("map"))],
            HashMap::new(),
            HashMap::new(),
        );

        assert_eq!(table.routes(Method::Get).len(), 1);
        assert_eq!(table.routes(Method::Post).len(), 1);
        assert_eq!(table.named("map").len(), 1);
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn test_candidates_probe_any_first() {
        let table = RouteTable::assemble(
            String::new(),
            vec![
                def(&[Method::Get], "/a", RouteOptions::new(), None),
                def(&[Method::Any], "/b", RouteOptions::new(), None),
            ],
            HashMap::new(),
            HashMap::new(),
        );

        let order: Vec<&str> = table.candidates(Method::Get).map(|r| r.pattern()).collect();
        assert_eq!(order, vec!["/b", "/a"]);
        assert_eq!(table.candidates(Method::Put).count(), 1);
    }

    #[test]
    fn test_prefixes_longest_first() {
        let table = RouteTable::assemble(
            String::new(),
            vec![
                def(&[Method::Get], "/", RouteOptions::new().prefix("en"), None),
                def(&[Method::Get], "/", RouteOptions::new().prefix("name-prefix"), None),
                def(&[Method::Get], "/x", RouteOptions::new().prefix("en"), None),
            ],
            HashMap::new(),
            HashMap::new(),
        );

        assert_eq!(table.prefixes(), ["name-prefix".to_string(), "en".to_string()]);
    }

    #[test]
    fn test_manifest_serializes() {
        let table = RouteTable::assemble(
            String::new(),
            vec![def(&[Method::Get], "/item/{id:[0-9]+}", RouteOptions::new(), Some("item"))],
            HashMap::new(),
            HashMap::new(),
        );

        let json = serde_json::to_value(table.manifest()).unwrap();
        assert_eq!(json["reverse"]["item"][0]["reverse"], "{_scheme}://{_host}/item/{id}");
        assert_eq!(json["routes"]["GET"][0]["parameters"][0]["name"], "id");
    }
}
