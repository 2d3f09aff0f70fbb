/// Route module for file-based routing
///
/// Contains the compiled route representation and the pure parsers that
/// produce it from page file stems.

use std::fmt;

pub mod parser;
pub mod pattern;

use crate::error::ShapeError;
use parser::ParseState;
pub use parser::{compare_precedence, compile_stem, route_name};
pub use pattern::{classify_segment, Segment};

/// Compiled, matchable form of a page file's location
///
/// Invariants (enforced by every constructor):
/// - at most one `CatchAll`, and only as the last segment
/// - parameter names are unique
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RoutePath {
    pub(crate) segments: Vec<Segment>,
}

impl RoutePath {
    /// Builds a route path from raw segments, validating the invariants
    pub fn new(segments: impl IntoIterator<Item = Segment>) -> Result<Self, ShapeError> {
        segments
            .into_iter()
            .try_fold(ParseState::default(), ParseState::push)
            .map(ParseState::finish)
    }

    /// The root path `/`
    pub fn root() -> Self {
        Self {
            segments: Vec::new(),
        }
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn depth(&self) -> usize {
        self.segments.len()
    }

    pub fn has_catch_all(&self) -> bool {
        matches!(self.segments.last(), Some(Segment::CatchAll(_)))
    }

    /// Parameter names in path order
    pub fn params(&self) -> impl Iterator<Item = &str> {
        self.segments.iter().filter_map(Segment::param_name)
    }

    /// Identity used for uniqueness in the route table
    ///
    /// Parameter names are erased, so `/users/:id` and `/users/:uid` share
    /// a signature. Static text is ASCII-lowercased unless `case_sensitive`.
    pub fn signature(&self, case_sensitive: bool) -> String {
        if self.segments.is_empty() {
            return "/".to_string();
        }

        self.segments
            .iter()
            .map(|segment| match segment {
                Segment::Static(s) if case_sensitive => format!("/{}", s),
                Segment::Static(s) => format!("/{}", s.to_ascii_lowercase()),
                Segment::Dynamic(_) => "/:".to_string(),
                Segment::CatchAll(_) => "/*".to_string(),
            })
            .collect()
    }

    /// Renders segments in vue-router syntax
    ///
    /// `Dynamic` becomes `:name` and `CatchAll` becomes `:name(.*)*`.
    /// `skip` leading segments are omitted and no leading slash is written
    /// when `skip > 0`; this yields paths relative to a parent route.
    pub fn to_vue_router(&self, skip: usize) -> String {
        let rendered: Vec<String> = self
            .segments
            .iter()
            .skip(skip)
            .map(|segment| match segment {
                Segment::Static(s) => s.clone(),
                Segment::Dynamic(name) => format!(":{}", name),
                Segment::CatchAll(name) => format!(":{}(.*)*", name),
            })
            .collect();

        if skip == 0 {
            format!("/{}", rendered.join("/"))
        } else {
            rendered.join("/")
        }
    }

    /// Whether `self` begins with all of `other`'s segments
    pub fn starts_with(&self, other: &RoutePath) -> bool {
        self.segments.starts_with(&other.segments)
    }
}

/// Renders in pattern syntax: `/about/:id/more`, `/docs/*slug`
impl fmt::Display for RoutePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.segments.is_empty() {
            return f.write_str("/");
        }

        for segment in &self.segments {
            match segment {
                Segment::Static(s) => write!(f, "/{}", s)?,
                Segment::Dynamic(name) => write!(f, "/:{}", name)?,
                Segment::CatchAll(name) => write!(f, "/*{}", name)?,
            }
        }
        Ok(())
    }
}
