//! Request matching against a route table snapshot

use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;
use std::sync::Arc;

use serde::Serialize;

use crate::entry::RouteEntry;
use crate::error::RouteError;
use crate::path::{normalize_path, request_components, strip_query};
use crate::route::Segment;
use crate::table::RouteTable;

/// A captured parameter value
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum ParamValue {
    /// One path component, from a dynamic segment
    Single(String),
    /// One or more path components, from a catch-all segment
    Multi(Vec<String>),
}

impl ParamValue {
    pub fn as_single(&self) -> Option<&str> {
        match self {
            ParamValue::Single(value) => Some(value),
            ParamValue::Multi(_) => None,
        }
    }

    pub fn as_multi(&self) -> Option<&[String]> {
        match self {
            ParamValue::Single(_) => None,
            ParamValue::Multi(values) => Some(values),
        }
    }
}

/// Single values print as-is, catch-all values joined with `/`
impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamValue::Single(value) => f.write_str(value),
            ParamValue::Multi(values) => f.write_str(&values.join("/")),
        }
    }
}

pub type RouteParams = BTreeMap<String, ParamValue>;

/// A resolved request
#[derive(Debug, Clone)]
pub struct MatchResult {
    pub entry: Arc<RouteEntry>,
    pub params: RouteParams,
    /// Layout pages wrapping the matched page, outermost first
    pub layouts: Vec<Arc<RouteEntry>>,
}

impl MatchResult {
    pub fn param(&self, name: &str) -> Option<&ParamValue> {
        self.params.get(name)
    }

    pub fn file(&self) -> &Path {
        &self.entry.file
    }
}

/// Resolves `request` to the highest-precedence route in `table`
///
/// Routes are tried in table order and the first that binds wins. Query
/// strings and fragments are ignored and components are percent-decoded
/// before comparison.
pub fn match_route(table: &RouteTable, request: &str) -> Result<MatchResult, RouteError> {
    let components = request_components(request);

    table
        .routes()
        .iter()
        .find_map(|entry| {
            bind(entry.path.segments(), &components, table.case_sensitive()).map(|params| {
                MatchResult {
                    entry: Arc::clone(entry),
                    params,
                    layouts: table.layouts_for(entry),
                }
            })
        })
        .ok_or_else(|| RouteError::NoRouteMatched {
            path: normalize_path(strip_query(request)).into_owned(),
        })
}

/// Binds request components to route segments
///
/// A catch-all takes every remaining component and needs at least one.
fn bind(segments: &[Segment], components: &[String], case_sensitive: bool) -> Option<RouteParams> {
    let mut params = RouteParams::new();

    for (index, segment) in segments.iter().enumerate() {
        match segment {
            Segment::Static(expected) => {
                let actual = components.get(index)?;
                let equal = if case_sensitive {
                    expected == actual
                } else {
                    expected.eq_ignore_ascii_case(actual)
                };
                if !equal {
                    return None;
                }
            }
            Segment::Dynamic(name) => {
                let actual = components.get(index)?;
                params.insert(name.clone(), ParamValue::Single(actual.clone()));
            }
            Segment::CatchAll(name) => {
                let rest = components.get(index..).filter(|rest| !rest.is_empty())?;
                params.insert(name.clone(), ParamValue::Multi(rest.to_vec()));
                return Some(params);
            }
        }
    }

    (segments.len() == components.len()).then_some(params)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ConflictPolicy, ImportMode};
    use crate::route::compile_stem;
    use crate::scan::ScanOutcome;
    use std::path::PathBuf;

    fn entry(stem: &str) -> RouteEntry {
        RouteEntry {
            path: compile_stem(stem, "").unwrap(),
            name: stem.to_string(),
            file: PathBuf::from(format!("/pages/{}.vue", stem)),
            root_dir: PathBuf::from("/pages"),
            stem: stem.to_string(),
            component: format!("/pages/{}.vue", stem),
            import_mode: ImportMode::Async,
        }
    }

    fn table(stems: &[&str], case_sensitive: bool) -> RouteTable {
        RouteTable::from_outcome(
            ScanOutcome {
                entries: stems.iter().map(|stem| entry(stem)).collect(),
                errors: Vec::new(),
            },
            case_sensitive,
            ConflictPolicy::KeepFirst,
        )
    }

    fn segs(stem: &str) -> Vec<Segment> {
        compile_stem(stem, "").unwrap().segments().to_vec()
    }

    fn comps(parts: &[&str]) -> Vec<String> {
        parts.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_bind_static() {
        assert_eq!(bind(&segs("about"), &comps(&["about"]), true), Some(RouteParams::new()));
        assert_eq!(bind(&segs("about"), &comps(&["about", "x"]), true), None);
        assert_eq!(bind(&segs("about"), &comps(&[]), true), None);
    }

    #[test]
    fn test_bind_dynamic_then_static() {
        let params = bind(&segs("about/[id]/more"), &comps(&["about", "1b234bk12b3", "more"]), true)
            .unwrap();
        assert_eq!(params["id"], ParamValue::Single("1b234bk12b3".to_string()));

        assert_eq!(
            bind(&segs("about/[id]/more"), &comps(&["about", "1", "less"]), true),
            None
        );
    }

    #[test]
    fn test_bind_catch_all_needs_one_component() {
        assert_eq!(bind(&segs("blog/[...all]"), &comps(&["blog"]), true), None);

        let params = bind(&segs("blog/[...all]"), &comps(&["blog", "a", "b"]), true).unwrap();
        assert_eq!(params["all"], ParamValue::Multi(comps(&["a", "b"])));
    }

    #[test]
    fn test_match_static_has_empty_params() {
        let table = table(&["about", "[...all]"], false);
        let result = table.match_route("/about").unwrap();
        assert_eq!(result.file(), Path::new("/pages/about.vue"));
        assert!(result.params.is_empty());
    }

    #[test]
    fn test_match_static_beats_dynamic() {
        let table = table(&["users/[id]", "users/new"], false);
        assert_eq!(table.match_route("/users/new").unwrap().entry.stem, "users/new");
        assert_eq!(table.match_route("/users/42").unwrap().entry.stem, "users/[id]");
    }

    #[test]
    fn test_match_case_insensitive() {
        let table = table(&["about"], false);
        assert!(table.match_route("/ABOUT").is_ok());

        let table = self::table(&["about"], true);
        assert!(table.match_route("/ABOUT").is_err());
    }

    #[test]
    fn test_match_normalizes_request() {
        let table = table(&["blog/today/index"], false);
        for request in ["/blog/today/", "/blog//today", "/blog/today?page=2", "/blog/today#top"] {
            assert_eq!(table.match_route(request).unwrap().entry.stem, "blog/today/index");
        }
    }

    #[test]
    fn test_match_percent_decodes_captures() {
        let table = table(&["users/[name]"], false);
        let result = table.match_route("/users/j%C3%BCrgen").unwrap();
        assert_eq!(result.param("name").and_then(ParamValue::as_single), Some("jürgen"));
    }

    #[test]
    fn test_no_route_matched() {
        let table = table(&["about"], false);
        assert_eq!(
            table.match_route("/missing/?q=1").unwrap_err(),
            RouteError::NoRouteMatched {
                path: "/missing".to_string()
            }
        );
    }

    #[test]
    fn test_match_includes_layouts() {
        let table = table(&["about", "about/[id]", "about/[id]/more"], false);
        let result = table.match_route("/about/7/more").unwrap();
        let layouts: Vec<&str> = result.layouts.iter().map(|e| e.stem.as_str()).collect();
        assert_eq!(layouts, vec!["about", "about/[id]"]);
    }

    #[test]
    fn test_param_value_display() {
        assert_eq!(ParamValue::Single("x".into()).to_string(), "x");
        assert_eq!(ParamValue::Multi(comps(&["a", "b"])).to_string(), "a/b");
    }
}
