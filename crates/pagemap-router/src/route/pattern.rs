/// Segment classification for file-based route patterns
///
/// Pure functional parsing of one path component into a typed segment.
/// Same input → same output, no side effects.

use crate::error::ShapeError;

/// One compiled component of a route path
///
/// Closed sum type: the matcher and the precedence ordering match on it
/// exhaustively.
///
/// # Examples
///
/// ```
/// use pagemap_router::route::pattern::{classify_segment, Segment};
///
/// assert_eq!(classify_segment("about"), Ok(Segment::Static("about".into())));
/// assert_eq!(classify_segment("[id]"), Ok(Segment::Dynamic("id".into())));
/// assert_eq!(classify_segment("[...all]"), Ok(Segment::CatchAll("all".into())));
/// assert!(classify_segment("[id").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Segment {
    /// Matched verbatim
    Static(String),
    /// `[name]` - binds exactly one path component
    Dynamic(String),
    /// `[...name]` - binds one or more trailing components
    CatchAll(String),
}

impl Segment {
    /// Matching rank at one position: lower is tried first
    pub fn rank(&self) -> u8 {
        match self {
            Segment::Static(_) => 0,
            Segment::Dynamic(_) => 1,
            Segment::CatchAll(_) => 2,
        }
    }

    /// Parameter name bound by this segment
    pub fn param_name(&self) -> Option<&str> {
        match self {
            Segment::Static(_) => None,
            Segment::Dynamic(name) | Segment::CatchAll(name) => Some(name),
        }
    }
}

/// Classifies a file path component into a segment (pure function)
///
/// # Parsing Rules (evaluated in order)
///
/// 1. No brackets at all → **Static**
/// 2. `[...name]` → **CatchAll**
/// 3. `[name]` → **Dynamic**
/// 4. Anything else containing a bracket → `MalformedBracket`
///
/// Parameter names are restricted to `[A-Za-z0-9_-]`.
pub fn classify_segment(segment: &str) -> Result<Segment, ShapeError> {
    if !segment.contains(['[', ']']) {
        return Ok(Segment::Static(segment.to_string()));
    }

    let inner = segment
        .strip_prefix('[')
        .and_then(|s| s.strip_suffix(']'))
        .filter(|inner| !inner.contains(['[', ']']))
        .ok_or_else(|| ShapeError::MalformedBracket(segment.to_string()))?;

    match inner.strip_prefix("...") {
        Some(name) => parse_param_name(name, segment).map(Segment::CatchAll),
        None => parse_param_name(inner, segment).map(Segment::Dynamic),
    }
}

/// Validates a bracket parameter name (pure function)
fn parse_param_name(name: &str, segment: &str) -> Result<String, ShapeError> {
    if name.is_empty() {
        return Err(ShapeError::MalformedBracket(segment.to_string()));
    }

    if name
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
    {
        Ok(name.to_string())
    } else {
        Err(ShapeError::InvalidParamName(segment.to_string()))
    }
}
