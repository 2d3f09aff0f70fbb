//! Route manifest for the client runtime
//!
//! Serializes a table snapshot into nested route records in vue-router
//! syntax. Pages are nested under their layout pages, with paths relative
//! to the parent, and an `index` page under a layout gets the path `""`.

use std::collections::{HashMap, HashSet};
use std::path::PathBuf;
use std::sync::Arc;

use serde::Serialize;

use crate::config::ImportMode;
use crate::entry::RouteEntry;
use crate::route::compare_precedence;
use crate::table::RouteTable;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ManifestRoute {
    /// Omitted for a layout whose index child carries the name
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub path: String,
    pub component: String,
    pub import_mode: ImportMode,
    /// Whether params are passed to the component as props
    pub props: bool,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<ManifestRoute>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct RouteManifest {
    pub routes: Vec<ManifestRoute>,
}

impl RouteManifest {
    /// Builds the manifest from routed entries and their layouts
    pub fn from_table(table: &RouteTable) -> Self {
        let mut nodes: Vec<Arc<RouteEntry>> = Vec::new();
        let mut seen: HashSet<PathBuf> = HashSet::new();

        for entry in table.routes() {
            for node in table.layouts_for(entry).iter().chain(Some(entry)) {
                if seen.insert(node.file.clone()) {
                    nodes.push(Arc::clone(node));
                }
            }
        }

        nodes.sort_by(|a, b| {
            compare_precedence(&a.path, &b.path).then_with(|| a.file.cmp(&b.file))
        });

        let mut top = Vec::new();
        let mut children_of: HashMap<PathBuf, Vec<Arc<RouteEntry>>> = HashMap::new();
        for node in nodes {
            match table.layouts_for(&node).pop() {
                Some(parent) => children_of.entry(parent.file.clone()).or_default().push(node),
                None => top.push(node),
            }
        }

        Self {
            routes: top
                .iter()
                .map(|node| build(node, None, &children_of))
                .collect(),
        }
    }

    pub fn to_json(&self, pretty: bool) -> serde_json::Result<String> {
        if pretty {
            serde_json::to_string_pretty(self)
        } else {
            serde_json::to_string(self)
        }
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}

fn build(
    entry: &RouteEntry,
    parent: Option<&RouteEntry>,
    children_of: &HashMap<PathBuf, Vec<Arc<RouteEntry>>>,
) -> ManifestRoute {
    let path = match parent {
        Some(parent) if entry.path.starts_with(&parent.path) => {
            entry.path.to_vue_router(parent.path.depth())
        }
        _ => entry.path.to_vue_router(0),
    };

    let children: Vec<ManifestRoute> = children_of
        .get(&entry.file)
        .map(|children| {
            children
                .iter()
                .map(|child| build(child, Some(entry), children_of))
                .collect()
        })
        .unwrap_or_default();

    let has_index_child = children.iter().any(|child| child.path.is_empty());

    ManifestRoute {
        name: (!has_index_child).then(|| entry.name.clone()),
        path,
        component: entry.component.clone(),
        import_mode: entry.import_mode,
        props: entry.path.params().next().is_some(),
        children,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConflictPolicy;
    use crate::route::{compile_stem, route_name};
    use crate::scan::ScanOutcome;
    use pretty_assertions::assert_eq;

    fn entry(stem: &str) -> RouteEntry {
        let path = compile_stem(stem, "").unwrap();
        RouteEntry {
            import_mode: if path.is_root() {
                ImportMode::Sync
            } else {
                ImportMode::Async
            },
            path,
            name: route_name(stem, ""),
            file: PathBuf::from(format!("/p/src/pages/{}.vue", stem)),
            root_dir: PathBuf::from("/p/src/pages"),
            stem: stem.to_string(),
            component: format!("/src/pages/{}.vue", stem),
        }
    }

    fn manifest(stems: &[&str]) -> RouteManifest {
        let table = RouteTable::from_outcome(
            ScanOutcome {
                entries: stems.iter().map(|stem| entry(stem)).collect(),
                errors: Vec::new(),
            },
            false,
            ConflictPolicy::KeepFirst,
        );
        RouteManifest::from_table(&table)
    }

    #[test]
    fn test_flat_routes() {
        let manifest = manifest(&["index", "markdown", "[...all]"]);
        let paths: Vec<&str> = manifest.routes.iter().map(|r| r.path.as_str()).collect();
        assert_eq!(paths, vec!["/markdown", "/:all(.*)*", "/"]);
        assert!(manifest.routes.iter().all(|r| r.children.is_empty()));
    }

    #[test]
    fn test_children_nest_under_layout() {
        let manifest = manifest(&["about", "about/index", "about/[id]", "about/[id]/more"]);
        assert_eq!(manifest.len(), 1);

        let about = &manifest.routes[0];
        assert_eq!(about.path, "/about");
        assert_eq!(about.name, None);
        assert_eq!(about.component, "/src/pages/about.vue");

        let children: Vec<(&str, Option<&str>)> = about
            .children
            .iter()
            .map(|c| (c.path.as_str(), c.name.as_deref()))
            .collect();
        assert_eq!(children, vec![(":id", Some("about-id")), ("", Some("about"))]);
        assert!(about.children[0].props);
        assert!(!about.children[1].props);

        // about/[id].vue is itself the layout of about/[id]/more.vue
        let more = &about.children[0].children;
        assert_eq!(more.len(), 1);
        assert_eq!(more[0].path, "more");
        assert_eq!(more[0].name.as_deref(), Some("about-id-more"));
    }

    #[test]
    fn test_json_shape() {
        let manifest = manifest(&["index"]);
        let json: serde_json::Value =
            serde_json::from_str(&manifest.to_json(false).unwrap()).unwrap();
        assert_eq!(
            json,
            serde_json::json!([{
                "name": "index",
                "path": "/",
                "component": "/src/pages/index.vue",
                "import_mode": "sync",
                "props": false
            }])
        );
    }
}
