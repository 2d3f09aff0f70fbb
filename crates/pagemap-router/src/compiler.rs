//! Route compiler: page file → `RouteEntry`

use std::path::{Component, Path, PathBuf};

use tracing::warn;

use crate::config::{Config, RoutingConfig};
use crate::entry::RouteEntry;
use crate::error::RouteError;
use crate::route::{compile_stem, route_name};
use crate::scan::{has_hidden_component, ScanRoot, MATCH_OPTIONS};

/// Compiles page files under a scan root into route entries
///
/// Holds the file-qualification rules (extensions, excludes, hidden files)
/// shared by the startup scan and the watcher.
#[derive(Debug, Clone)]
pub struct RouteCompiler {
    project_root: PathBuf,
    routing: RoutingConfig,
    exclude: Vec<glob::Pattern>,
}

impl RouteCompiler {
    /// Creates a compiler for a configuration
    ///
    /// The project root is canonicalized when it exists so that paths from
    /// file-system events compare equal to scanned paths.
    pub fn new(config: &Config) -> Self {
        let project_root = std::fs::canonicalize(&config.project.root)
            .unwrap_or_else(|_| config.project.root.clone());

        let exclude = config
            .routing
            .exclude
            .iter()
            .filter_map(|pattern| match glob::Pattern::new(pattern) {
                Ok(p) => Some(p),
                Err(e) => {
                    warn!("Ignoring invalid exclude pattern '{}': {}", pattern, e);
                    None
                }
            })
            .collect();

        Self {
            project_root,
            routing: config.routing.clone(),
            exclude,
        }
    }

    pub fn project_root(&self) -> &Path {
        &self.project_root
    }

    /// Whether a file under `root` qualifies as a page
    ///
    /// A page has a configured extension, no hidden component in its path
    /// relative to the root, and matches no exclude pattern.
    pub fn accepts(&self, root: &ScanRoot, file: &Path) -> bool {
        let Ok(relative) = file.strip_prefix(&root.dir) else {
            return false;
        };

        let has_extension = file
            .extension()
            .and_then(|ext| ext.to_str())
            .map_or(false, |ext| {
                self.routing
                    .extensions
                    .iter()
                    .any(|allowed| allowed.eq_ignore_ascii_case(ext))
            });

        let hidden = has_hidden_component(&root.dir, file);

        has_extension
            && !hidden
            && !self
                .exclude
                .iter()
                .any(|pattern| pattern.matches_path_with(relative, MATCH_OPTIONS))
    }

    /// Compiles one page file found under `root`
    ///
    /// Fails with `InvalidRouteShape` when the relative path is not a valid
    /// route; the caller decides whether to keep going.
    pub fn compile(&self, root: &ScanRoot, file: &Path) -> Result<RouteEntry, RouteError> {
        let stem = stem_of(&root.dir, file);

        let path = compile_stem(&stem, &root.base_route).map_err(|reason| {
            RouteError::InvalidRouteShape {
                file: file.to_path_buf(),
                reason,
            }
        })?;

        let import_mode = self.routing.import_mode_for(path.is_root());

        Ok(RouteEntry {
            name: route_name(&stem, &root.base_route),
            component: self.component_ref(file),
            file: file.to_path_buf(),
            root_dir: root.dir.clone(),
            stem,
            path,
            import_mode,
        })
    }

    /// Project-relative, `/`-separated reference with a leading slash
    fn component_ref(&self, file: &Path) -> String {
        let relative = file.strip_prefix(&self.project_root).unwrap_or(file);
        let parts: Vec<String> = relative
            .components()
            .filter_map(|component| match component {
                Component::Normal(name) => Some(name.to_string_lossy().into_owned()),
                _ => None,
            })
            .collect();
        format!("/{}", parts.join("/"))
    }
}

/// Root-relative stem: `/`-separated with the final extension removed
fn stem_of(root_dir: &Path, file: &Path) -> String {
    let relative = file.strip_prefix(root_dir).unwrap_or(file);
    let mut parts: Vec<String> = relative
        .components()
        .filter_map(|component| match component {
            Component::Normal(name) => Some(name.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect();

    if let (Some(last), Some(stem)) = (parts.last_mut(), file.file_stem()) {
        *last = stem.to_string_lossy().into_owned();
    }

    parts.join("/")
}
