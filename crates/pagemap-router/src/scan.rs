//! Path scanner: resolves configured page directories and enumerates page files

use std::collections::HashSet;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, error, info, warn};
use walkdir::WalkDir;

use crate::compiler::RouteCompiler;
use crate::config::DirConfig;
use crate::entry::RouteEntry;
use crate::error::RouteError;

/// Glob options shared by directory patterns and exclude patterns:
/// `*` stays within one path component, `**` spans any number.
pub(crate) const MATCH_OPTIONS: glob::MatchOptions = glob::MatchOptions {
    case_sensitive: true,
    require_literal_separator: true,
    require_literal_leading_dot: false,
};

/// A concrete page directory and the route prefix for its files
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ScanRoot {
    pub dir: PathBuf,
    pub base_route: String,
}

/// A configured page directory, possibly a glob pattern
///
/// A glob spec such as `src/features/**/pages` expands to one `ScanRoot`
/// per matching directory, and keeps matching directories created later.
#[derive(Debug, Clone)]
pub struct RootSpec {
    base_route: String,
    /// Directory itself, or the non-glob prefix of the pattern
    base: PathBuf,
    glob: Option<glob::Pattern>,
}

fn is_glob(part: &str) -> bool {
    part.contains(['*', '?', '['])
}

impl RootSpec {
    /// Resolves configured directories against the project root
    pub fn resolve(project_root: &Path, dirs: &[DirConfig]) -> Result<Vec<RootSpec>, RouteError> {
        dirs.iter()
            .map(|dir| Self::from_config(project_root, dir))
            .collect()
    }

    fn from_config(project_root: &Path, config: &DirConfig) -> Result<RootSpec, RouteError> {
        let relative = config.dir.trim_start_matches("./");

        if !is_glob(relative) {
            return Ok(RootSpec {
                base_route: config.base_route.clone(),
                base: project_root.join(relative),
                glob: None,
            });
        }

        let static_prefix: PathBuf = Path::new(relative)
            .components()
            .take_while(|c| !is_glob(&c.as_os_str().to_string_lossy()))
            .collect();

        let pattern = format!(
            "{}/{}",
            glob::Pattern::escape(&project_root.to_string_lossy()),
            relative
        );
        let glob = glob::Pattern::new(&pattern).map_err(|e| RouteError::ScanRoot {
            dir: config.dir.clone(),
            reason: e.to_string(),
        })?;

        Ok(RootSpec {
            base_route: config.base_route.clone(),
            base: project_root.join(static_prefix),
            glob: Some(glob),
        })
    }

    /// Directory to watch recursively for this spec
    pub fn watch_base(&self) -> &Path {
        &self.base
    }

    /// Existing directories this spec currently names
    pub fn expand(&self) -> Vec<ScanRoot> {
        let Some(pattern) = &self.glob else {
            if self.base.is_dir() {
                return vec![self.root_at(self.base.clone())];
            }
            warn!("Page directory does not exist: {:?}", self.base);
            return Vec::new();
        };

        let mut dirs: Vec<PathBuf> = match glob::glob_with(pattern.as_str(), MATCH_OPTIONS) {
            Ok(paths) => paths
                .filter_map(|entry| match entry {
                    Ok(path) => Some(path),
                    Err(e) => {
                        warn!("Skipping unreadable path: {}", e);
                        None
                    }
                })
                .filter(|path| path.is_dir())
                .collect(),
            Err(e) => {
                error!("Invalid page directory pattern {}: {}", pattern, e);
                Vec::new()
            }
        };
        dirs.sort();

        debug!("Pattern {} matched {} directories", pattern, dirs.len());
        dirs.into_iter().map(|dir| self.root_at(dir)).collect()
    }

    /// The scan root that owns `path`, if any
    ///
    /// For glob specs the shallowest ancestor of `path` (or `path` itself)
    /// matching the pattern is the root, so directories created after
    /// startup are picked up.
    pub fn root_for(&self, path: &Path) -> Option<ScanRoot> {
        if !path.starts_with(&self.base) {
            return None;
        }

        match &self.glob {
            None => Some(self.root_at(self.base.clone())),
            Some(pattern) => path
                .ancestors()
                .take_while(|ancestor| ancestor.starts_with(&self.base))
                .filter(|ancestor| pattern.matches_path_with(ancestor, MATCH_OPTIONS))
                .last()
                .map(|dir| self.root_at(dir.to_path_buf())),
        }
    }

    fn root_at(&self, dir: PathBuf) -> ScanRoot {
        ScanRoot {
            dir,
            base_route: self.base_route.clone(),
        }
    }
}

/// Pages found by a scan, plus the files that failed to compile
#[derive(Debug, Default)]
pub struct ScanOutcome {
    pub entries: Vec<RouteEntry>,
    pub errors: Vec<RouteError>,
}

impl ScanOutcome {
    /// Appends a later scan's results
    ///
    /// A file reached through more than one root belongs to the root that
    /// was merged first; later results for it are dropped.
    pub fn merge(&mut self, other: ScanOutcome) {
        let owned: HashSet<PathBuf> = self
            .entries
            .iter()
            .map(|entry| entry.file.clone())
            .chain(self.errors.iter().filter_map(|e| e.file().cloned()))
            .collect();
        let is_new = |file: Option<&PathBuf>| file.map_or(true, |file| !owned.contains(file));

        for entry in other.entries {
            if is_new(Some(&entry.file)) {
                self.entries.push(entry);
            } else {
                debug!("{:?} already belongs to an earlier page directory", entry.file);
            }
        }
        self.errors
            .extend(other.errors.into_iter().filter(|e| is_new(e.file())));
    }
}

/// Walks page directories and compiles every qualifying file
#[derive(Debug, Clone)]
pub struct Scanner {
    compiler: RouteCompiler,
}

impl Scanner {
    pub fn new(compiler: RouteCompiler) -> Self {
        Self { compiler }
    }

    pub fn compiler(&self) -> &RouteCompiler {
        &self.compiler
    }

    /// Scans a whole root
    pub fn scan_root(&self, root: &ScanRoot) -> ScanOutcome {
        self.scan_dir(root, &root.dir)
    }

    /// Scans the subtree at `dir`, which must lie under `root`
    ///
    /// Files are visited in file-name order so results are deterministic.
    /// Unreadable entries are logged and skipped; a file that fails to
    /// compile is recorded and the walk continues.
    pub fn scan_dir(&self, root: &ScanRoot, dir: &Path) -> ScanOutcome {
        let mut outcome = ScanOutcome::default();

        let walker = WalkDir::new(dir)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|entry| entry.depth() == 0 || !is_hidden(entry.file_name()));

        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    warn!("Skipping unreadable entry under {:?}: {}", dir, e);
                    continue;
                }
            };

            let path = entry.path();
            if !entry.file_type().is_file() || !self.compiler.accepts(root, path) {
                continue;
            }

            match self.compiler.compile(root, path) {
                Ok(route) => {
                    debug!("Discovered route {} -> {:?}", route.path, path);
                    outcome.entries.push(route);
                }
                Err(e) => {
                    warn!("{}", e);
                    outcome.errors.push(e);
                }
            }
        }

        outcome
    }

    /// Scans all roots concurrently, one blocking task per root
    ///
    /// Results are merged in root order, independent of completion order.
    pub async fn scan_all(self: Arc<Self>, roots: Vec<ScanRoot>) -> ScanOutcome {
        let handles: Vec<_> = roots
            .into_iter()
            .map(|root| {
                let scanner = Arc::clone(&self);
                tokio::task::spawn_blocking(move || {
                    let outcome = scanner.scan_root(&root);
                    info!(
                        "Scanned {:?}: {} routes, {} errors",
                        root.dir,
                        outcome.entries.len(),
                        outcome.errors.len()
                    );
                    outcome
                })
            })
            .collect();

        let mut merged = ScanOutcome::default();
        for handle in handles {
            match handle.await {
                Ok(outcome) => merged.merge(outcome),
                Err(e) => error!("Scan task failed: {}", e),
            }
        }
        merged
    }
}

fn is_hidden(name: &std::ffi::OsStr) -> bool {
    name.to_string_lossy().starts_with('.')
}

/// Whether any component of `path` below `base` is hidden
pub(crate) fn has_hidden_component(base: &Path, path: &Path) -> bool {
    path.strip_prefix(base).map_or(false, |relative| {
        relative.components().any(|c| match c {
            Component::Normal(name) => is_hidden(name),
            _ => false,
        })
    })
}
