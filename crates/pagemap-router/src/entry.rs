//! Compiled page routes

use std::path::{Path, PathBuf};

use crate::config::ImportMode;
use crate::path::StemHierarchy;
use crate::route::RoutePath;

/// A page file compiled into a route
///
/// Entries are immutable: a file change that alters the route produces a
/// new entry, never an in-place update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteEntry {
    /// Matchable route path
    pub path: RoutePath,
    /// Route name, e.g. `about-id-more`
    pub name: String,
    /// Source file as discovered on disk
    pub file: PathBuf,
    /// Scan root directory this file was found under
    pub root_dir: PathBuf,
    /// Path relative to `root_dir`, `/`-separated, extension stripped
    pub stem: String,
    /// Component reference emitted for the client runtime,
    /// e.g. `/src/pages/about/[id]/more.vue`
    pub component: String,
    pub import_mode: ImportMode,
}

impl RouteEntry {
    /// Stems of the directories enclosing this page, innermost first
    pub fn ancestor_stems(&self) -> StemHierarchy<'_> {
        StemHierarchy::new(&self.stem)
    }

    /// Whether `self` is the layout page of `other`
    ///
    /// True when both come from the same scan root and `other` lives
    /// under the directory named after `self`'s stem.
    pub fn is_layout_of(&self, other: &RouteEntry) -> bool {
        self.root_dir == other.root_dir
            && other.ancestor_stems().any(|stem| stem == self.stem)
    }

    /// Whether the entry's source file lives at or under `path`
    pub fn is_under(&self, path: &Path) -> bool {
        self.file.starts_with(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::route::compile_stem;

    fn entry(root: &str, stem: &str) -> RouteEntry {
        RouteEntry {
            path: compile_stem(stem, "").unwrap(),
            name: stem.to_string(),
            file: PathBuf::from(format!("{}/{}.vue", root, stem)),
            root_dir: PathBuf::from(root),
            stem: stem.to_string(),
            component: format!("/{}/{}.vue", root, stem),
            import_mode: ImportMode::Async,
        }
    }

    #[test]
    fn test_layout_relation() {
        let about = entry("src/pages", "about");
        let index = entry("src/pages", "about/index");
        let more = entry("src/pages", "about/[id]/more");

        assert!(about.is_layout_of(&index));
        assert!(about.is_layout_of(&more));
        assert!(!index.is_layout_of(&about));
        assert!(!about.is_layout_of(&about));
    }

    #[test]
    fn test_layout_relation_requires_same_root() {
        let about = entry("src/pages", "about");
        let other = entry("src/other", "about/index");
        assert!(!about.is_layout_of(&other));
    }

    #[test]
    fn test_layout_relation_is_not_a_string_prefix() {
        let about = entry("src/pages", "about");
        let aboutus = entry("src/pages", "aboutus/team");
        assert!(!about.is_layout_of(&aboutus));
    }

    #[test]
    fn test_is_under() {
        let more = entry("src/pages", "about/[id]/more");
        assert!(more.is_under(Path::new("src/pages/about")));
        assert!(!more.is_under(Path::new("src/pages/blog")));
    }
}
