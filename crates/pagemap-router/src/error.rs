//! Error types for route compilation, table maintenance and matching
//!
//! Every error here is local to one file or one request: a bad file never
//! aborts a scan, and a failed match never touches the table.

use std::path::PathBuf;
use thiserror::Error;

/// Why a file's relative path could not be compiled into a route
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ShapeError {
    #[error("catch-all segment '{0}' must be the last segment")]
    CatchAllNotLast(String),

    #[error("malformed bracket segment '{0}'")]
    MalformedBracket(String),

    #[error("invalid parameter name in segment '{0}'")]
    InvalidParamName(String),

    #[error("parameter '{0}' is declared more than once")]
    DuplicateParam(String),

    #[error("empty route path")]
    Empty,
}

/// Errors surfaced by the router core
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RouteError {
    /// A route file whose path does not form a valid route
    #[error("invalid route shape in {}: {reason}", file.display())]
    InvalidRouteShape {
        file: PathBuf,
        #[source]
        reason: ShapeError,
    },

    /// No route in the table matches the request path
    #[error("no route matched '{path}'")]
    NoRouteMatched { path: String },

    /// Two files compile to the same route; `kept` holds the route
    #[error(
        "route '{path}' from {} conflicts with {}",
        rejected.display(),
        kept.display()
    )]
    DuplicateRoutePath {
        path: String,
        kept: PathBuf,
        rejected: PathBuf,
    },

    /// A configured scan directory that cannot be used
    #[error("invalid scan root '{dir}': {reason}")]
    ScanRoot { dir: String, reason: String },
}

impl RouteError {
    /// Source file this error is attached to, if any
    pub fn file(&self) -> Option<&PathBuf> {
        match self {
            RouteError::InvalidRouteShape { file, .. } => Some(file),
            RouteError::DuplicateRoutePath { rejected, .. } => Some(rejected),
            RouteError::NoRouteMatched { .. } | RouteError::ScanRoot { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_shape_message_names_file_and_reason() {
        let err = RouteError::InvalidRouteShape {
            file: PathBuf::from("src/pages/[...all]/x.vue"),
            reason: ShapeError::CatchAllNotLast("[...all]".to_string()),
        };
        let message = err.to_string();
        assert!(message.contains("src/pages/[...all]/x.vue"));
        assert!(message.contains("must be the last segment"));
    }

    #[test]
    fn test_file_accessor() {
        let err = RouteError::DuplicateRoutePath {
            path: "/about".to_string(),
            kept: PathBuf::from("a.vue"),
            rejected: PathBuf::from("b.vue"),
        };
        assert_eq!(err.file(), Some(&PathBuf::from("b.vue")));

        let err = RouteError::NoRouteMatched {
            path: "/nope".to_string(),
        };
        assert_eq!(err.file(), None);
    }
}
