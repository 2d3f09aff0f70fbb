/// Stem parsing and precedence ordering for routes
///
/// Pure functional parsers that transform a page file's stem (its path
/// relative to a scan root, extension stripped) into a `RoutePath`.

use std::cmp::Ordering;
use std::collections::HashSet;

use super::pattern::{classify_segment, Segment};
use super::RoutePath;
use crate::error::ShapeError;

/// Accumulator for fold-based validation
///
/// Enforces the `RoutePath` invariants while segments stream in:
/// nothing may follow a catch-all, and parameter names are unique.
#[derive(Default)]
pub(crate) struct ParseState {
    segments: Vec<Segment>,
    params: HashSet<String>,
}

impl ParseState {
    /// Appends one segment, rejecting shapes that break the invariants
    pub(crate) fn push(mut self, segment: Segment) -> Result<Self, ShapeError> {
        if let Some(Segment::CatchAll(name)) = self.segments.last() {
            return Err(ShapeError::CatchAllNotLast(format!("[...{}]", name)));
        }

        if let Some(name) = segment.param_name() {
            if !self.params.insert(name.to_string()) {
                return Err(ShapeError::DuplicateParam(name.to_string()));
            }
        }

        self.segments.push(segment);
        Ok(self)
    }

    pub(crate) fn finish(self) -> RoutePath {
        RoutePath {
            segments: self.segments,
        }
    }
}

/// Splits a stem into components, dropping a trailing `index`
fn stem_parts(stem: &str) -> Vec<&str> {
    let mut parts: Vec<&str> = stem.split('/').filter(|s| !s.is_empty()).collect();
    if parts.last() == Some(&"index") {
        parts.pop();
    }
    parts
}

/// Compiles a page stem into a route path (pure function)
///
/// `base_route` components are prepended; they follow the same bracket
/// rules as file components.
///
/// # Examples
///
/// ```
/// use pagemap_router::route::parser::compile_stem;
///
/// assert_eq!(compile_stem("about/[id]/more", "").unwrap().to_string(), "/about/:id/more");
/// assert_eq!(compile_stem("blog/today/index", "").unwrap().to_string(), "/blog/today");
/// assert_eq!(compile_stem("index", "").unwrap().to_string(), "/");
/// assert_eq!(compile_stem("dashboard", "features").unwrap().to_string(), "/features/dashboard");
/// assert!(compile_stem("[...all]/more", "").is_err());
/// ```
pub fn compile_stem(stem: &str, base_route: &str) -> Result<RoutePath, ShapeError> {
    if stem.trim_matches('/').is_empty() {
        return Err(ShapeError::Empty);
    }

    base_route
        .split('/')
        .filter(|s| !s.is_empty())
        .chain(stem_parts(stem))
        .map(classify_segment)
        .try_fold(ParseState::default(), |state, segment| state.push(segment?))
        .map(ParseState::finish)
}

/// Derives the route name from a stem (pure function)
///
/// Components are joined with `-` after removing brackets and the
/// catch-all ellipsis; a trailing `index` is dropped and the root index
/// is named `index`.
///
/// ```
/// use pagemap_router::route::parser::route_name;
///
/// assert_eq!(route_name("about/[id]/more", ""), "about-id-more");
/// assert_eq!(route_name("blog/today/[...all]", ""), "blog-today-all");
/// assert_eq!(route_name("index", ""), "index");
/// assert_eq!(route_name("dashboard", "features"), "features-dashboard");
/// ```
pub fn route_name(stem: &str, base_route: &str) -> String {
    let name = base_route
        .split('/')
        .filter(|s| !s.is_empty())
        .chain(stem_parts(stem))
        .map(|part| {
            part.trim_start_matches('[')
                .trim_end_matches(']')
                .trim_start_matches("...")
        })
        .collect::<Vec<_>>()
        .join("-");

    if name.is_empty() {
        "index".to_string()
    } else {
        name
    }
}

/// Orders two routes by matching precedence (pure function)
///
/// `Less` means `a` is tried first.
///
/// # Order
///
/// 1. Position by position from the root: Static < Dynamic < CatchAll
/// 2. When one rank sequence is a prefix of the other, the longer route
///    goes first (the more specific one)
/// 3. Static text, case-folded then raw, for a stable total order
///
/// A nested catch-all such as `/blog/today/*all` therefore precedes the
/// root `/*all`: the first position is Static against CatchAll.
pub fn compare_precedence(a: &RoutePath, b: &RoutePath) -> Ordering {
    let ranks = a
        .segments
        .iter()
        .zip(&b.segments)
        .map(|(x, y)| x.rank().cmp(&y.rank()))
        .find(|ord| ord.is_ne());

    ranks
        .unwrap_or_else(|| b.segments.len().cmp(&a.segments.len()))
        .then_with(|| compare_static_text(a, b))
}

fn compare_static_text(a: &RoutePath, b: &RoutePath) -> Ordering {
    let text = |path: &RoutePath| -> Vec<String> {
        path.segments
            .iter()
            .map(|segment| match segment {
                Segment::Static(s) => s.clone(),
                Segment::Dynamic(_) | Segment::CatchAll(_) => String::new(),
            })
            .collect()
    };

    let (ta, tb) = (text(a), text(b));
    let folded = |v: &[String]| v.iter().map(|s| s.to_ascii_lowercase()).collect::<Vec<_>>();
    folded(&ta).cmp(&folded(&tb)).then_with(|| ta.cmp(&tb))
}
