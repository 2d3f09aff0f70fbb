//! Route store: owns the live table and publishes snapshots
//!
//! `RouteStore` is the single writer. It applies batches of file-system
//! events to a copy of the current table and swaps the new snapshot into
//! a `watch` channel; readers hold a [`RouteHandle`] and never block it.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::sync::{broadcast, watch};
use tracing::{debug, info, warn};

use crate::compiler::RouteCompiler;
use crate::config::Config;
use crate::entry::RouteEntry;
use crate::error::RouteError;
use crate::matcher::MatchResult;
use crate::scan::{RootSpec, ScanOutcome, Scanner};
use crate::table::RouteTable;

const CHANGE_CHANNEL_CAPACITY: usize = 256;

/// A file-system change relevant to routing
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FsEvent {
    Added(PathBuf),
    Removed(PathBuf),
}

/// A change applied to the route table
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteChange {
    /// A page file was compiled into the table
    Added { file: PathBuf, pattern: String },
    /// A page file left the table
    Removed { file: PathBuf, pattern: String },
    /// A page file failed to compile or lost a route conflict
    Rejected { file: PathBuf, error: RouteError },
}

/// Writer side of the route table
pub struct RouteStore {
    scanner: Arc<Scanner>,
    specs: Vec<RootSpec>,
    table_tx: watch::Sender<Arc<RouteTable>>,
    changes_tx: broadcast::Sender<RouteChange>,
}

impl RouteStore {
    /// Scans every configured directory and builds the first snapshot
    pub async fn from_config(config: &Config) -> Result<Self> {
        let compiler = RouteCompiler::new(config);
        let specs = RootSpec::resolve(compiler.project_root(), &config.routing.dirs)
            .context("Failed to resolve page directories")?;

        let roots = specs.iter().flat_map(RootSpec::expand).collect();
        let scanner = Arc::new(Scanner::new(compiler));
        let outcome = Arc::clone(&scanner).scan_all(roots).await;

        let table = RouteTable::from_outcome(
            outcome,
            config.routing.case_sensitive,
            config.routing.conflict_policy,
        );

        info!(
            "Loaded {} routes ({} conflicts, {} invalid files)",
            table.len(),
            table.conflicts().len(),
            table.invalid().count()
        );
        for conflict in table.conflicts() {
            warn!("{}", conflict);
        }

        let (table_tx, _) = watch::channel(Arc::new(table));
        let (changes_tx, _) = broadcast::channel(CHANGE_CHANNEL_CAPACITY);

        Ok(Self {
            scanner,
            specs,
            table_tx,
            changes_tx,
        })
    }

    /// Directories the watcher should observe
    pub fn watch_bases(&self) -> impl Iterator<Item = &Path> {
        self.specs.iter().map(RootSpec::watch_base)
    }

    /// Current table snapshot
    pub fn snapshot(&self) -> Arc<RouteTable> {
        self.table_tx.borrow().clone()
    }

    /// Subscribe to route changes
    pub fn subscribe(&self) -> broadcast::Receiver<RouteChange> {
        self.changes_tx.subscribe()
    }

    /// Receiver that always holds the latest snapshot
    pub fn watch_table(&self) -> watch::Receiver<Arc<RouteTable>> {
        self.table_tx.subscribe()
    }

    /// Cloneable read handle
    pub fn handle(&self) -> RouteHandle {
        RouteHandle {
            table_rx: self.table_tx.subscribe(),
            changes_tx: self.changes_tx.clone(),
        }
    }

    /// Applies a batch of events and publishes one new snapshot
    ///
    /// Returns the changes applied, which are also broadcast to
    /// subscribers. Nothing is published when the batch changes nothing.
    pub fn apply_batch(&mut self, events: Vec<FsEvent>) -> Vec<RouteChange> {
        let current = self.snapshot();
        let mut next = (*current).clone();
        let mut changes = Vec::new();

        for event in events {
            match event {
                FsEvent::Added(path) => self.apply_added(&mut next, &path, &mut changes),
                FsEvent::Removed(path) => apply_removed(&mut next, &path, &mut changes),
            }
        }

        // a removed broken file changes nothing but the invalid list
        if changes.is_empty() && next.invalid().count() == current.invalid().count() {
            return changes;
        }

        let next = next.commit();

        // files that already existed and now hold a route, e.g. a parked
        // conflict loser whose winner was removed
        let routed_before: HashSet<&Path> =
            current.routes().iter().map(|e| e.file.as_path()).collect();
        let promoted: Vec<RouteChange> = next
            .routes()
            .iter()
            .filter(|entry| {
                current.get(&entry.file).is_some()
                    && !routed_before.contains(entry.file.as_path())
                    && !changes.iter().any(|change| {
                        matches!(change, RouteChange::Added { file, .. } if *file == entry.file)
                    })
            })
            .map(|entry| {
                info!("Route promoted: {} -> {:?}", entry.path, entry.file);
                RouteChange::Added {
                    file: entry.file.clone(),
                    pattern: entry.path.to_string(),
                }
            })
            .collect();
        changes.extend(promoted);

        // conflicts that appeared with this batch
        for conflict in next.conflicts() {
            if current.conflicts().contains(conflict) {
                continue;
            }
            if let Some(file) = conflict.file() {
                warn!("{}", conflict);
                changes.push(RouteChange::Rejected {
                    file: file.clone(),
                    error: conflict.clone(),
                });
            }
        }

        info!(
            "Route table updated: {} routes (generation {})",
            next.len(),
            next.generation()
        );
        self.table_tx.send_replace(Arc::new(next));

        for change in &changes {
            // no receivers is fine
            let _ = self.changes_tx.send(change.clone());
        }
        changes
    }

    fn apply_added(&self, table: &mut RouteTable, path: &Path, changes: &mut Vec<RouteChange>) {
        if path.is_dir() {
            self.apply_added_dir(table, path, changes);
            return;
        }
        if !path.is_file() {
            debug!("Ignoring add for vanished path {:?}", path);
            return;
        }

        let Some(root) = self.specs.iter().find_map(|spec| spec.root_for(path)) else {
            return;
        };

        let compiler = self.scanner.compiler();
        if !compiler.accepts(&root, path) {
            return;
        }

        match compiler.compile(&root, path) {
            Ok(entry) => record_entry(table, entry, changes),
            Err(error) => record_error(table, error, changes),
        }
    }

    /// A directory copied or created under a root, or one that brings new
    /// roots with it
    fn apply_added_dir(&self, table: &mut RouteTable, dir: &Path, changes: &mut Vec<RouteChange>) {
        let mut outcome = ScanOutcome::default();

        if let Some(root) = self.specs.iter().find_map(|spec| spec.root_for(dir)) {
            debug!("Scanning added directory {:?}", dir);
            outcome.merge(self.scanner.scan_dir(&root, dir));
        } else {
            // a new glob root, or a directory holding a page directory
            for root in self
                .specs
                .iter()
                .filter(|spec| {
                    dir.starts_with(spec.watch_base()) || spec.watch_base().starts_with(dir)
                })
                .flat_map(RootSpec::expand)
                .filter(|root| root.dir.starts_with(dir))
            {
                info!("New page directory {:?}", root.dir);
                outcome.merge(self.scanner.scan_root(&root));
            }
        }

        for entry in outcome.entries {
            record_entry(table, entry, changes);
        }
        for error in outcome.errors {
            record_error(table, error, changes);
        }
    }
}

fn record_entry(table: &mut RouteTable, entry: RouteEntry, changes: &mut Vec<RouteChange>) {
    let file = entry.file.clone();
    let pattern = entry.path.to_string();
    if table.insert(entry) {
        info!("Route added: {} -> {:?}", pattern, file);
        changes.push(RouteChange::Added { file, pattern });
    }
}

fn record_error(table: &mut RouteTable, error: RouteError, changes: &mut Vec<RouteChange>) {
    warn!("{}", error);
    let Some(file) = error.file().cloned() else {
        return;
    };
    if let Some(previous) = table.mark_invalid(error.clone()) {
        changes.push(RouteChange::Removed {
            file: previous.file.clone(),
            pattern: previous.path.to_string(),
        });
    }
    changes.push(RouteChange::Rejected { file, error });
}

fn apply_removed(table: &mut RouteTable, path: &Path, changes: &mut Vec<RouteChange>) {
    for entry in table.remove_path(path) {
        info!("Route removed: {} ({:?})", entry.path, entry.file);
        changes.push(RouteChange::Removed {
            file: entry.file.clone(),
            pattern: entry.path.to_string(),
        });
    }
}

/// Read side of the route table, cheap to clone
#[derive(Debug, Clone)]
pub struct RouteHandle {
    table_rx: watch::Receiver<Arc<RouteTable>>,
    changes_tx: broadcast::Sender<RouteChange>,
}

impl RouteHandle {
    pub fn snapshot(&self) -> Arc<RouteTable> {
        self.table_rx.borrow().clone()
    }

    /// Matches against the latest snapshot
    pub fn match_route(&self, request: &str) -> Result<MatchResult, RouteError> {
        self.snapshot().match_route(request)
    }

    pub fn subscribe(&self) -> broadcast::Receiver<RouteChange> {
        self.changes_tx.subscribe()
    }

    pub fn watch_table(&self) -> watch::Receiver<Arc<RouteTable>> {
        self.table_rx.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn touch(root: &Path, relative: &str) -> PathBuf {
        let path = root.join(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, "<template><div /></template>").unwrap();
        path
    }

    async fn store(project: &Path) -> RouteStore {
        let config = Config::for_project(project)
            .with_dirs([("src/pages", ""), ("src/features/**/pages", "features")]);
        RouteStore::from_config(&config).await.unwrap()
    }

    fn project() -> (tempfile::TempDir, PathBuf) {
        let tmp = tempfile::tempdir().unwrap();
        let project = fs::canonicalize(tmp.path()).unwrap();
        touch(&project, "src/pages/index.vue");
        touch(&project, "src/pages/[...all].vue");
        (tmp, project)
    }

    #[tokio::test]
    async fn test_add_file_becomes_matchable() {
        let (_tmp, project) = project();
        let mut store = store(&project).await;
        let handle = store.handle();

        assert_eq!(handle.match_route("/test").unwrap().entry.stem, "[...all]");

        let file = touch(&project, "src/pages/test.vue");
        let changes = store.apply_batch(vec![FsEvent::Added(file.clone())]);

        assert_eq!(
            changes,
            vec![RouteChange::Added {
                file: file.clone(),
                pattern: "/test".to_string()
            }]
        );
        assert_eq!(handle.match_route("/test").unwrap().file(), file);
        assert_eq!(handle.snapshot().generation(), 1);
    }

    #[tokio::test]
    async fn test_remove_file() {
        let (_tmp, project) = project();
        let file = touch(&project, "src/pages/test.vue");
        let mut store = store(&project).await;

        fs::remove_file(&file).unwrap();
        let changes = store.apply_batch(vec![FsEvent::Removed(file)]);
        assert_eq!(changes.len(), 1);
        assert_eq!(store.snapshot().match_route("/test").unwrap().entry.stem, "[...all]");
    }

    #[tokio::test]
    async fn test_unrelated_events_publish_nothing() {
        let (_tmp, project) = project();
        let mut store = store(&project).await;
        let rx = store.watch_table();

        let other = touch(&project, "src/components/button.vue");
        let note = touch(&project, "src/pages/notes.txt");
        let changes = store.apply_batch(vec![
            FsEvent::Added(other),
            FsEvent::Added(note.clone()),
            FsEvent::Removed(note),
        ]);

        assert!(changes.is_empty());
        assert!(!rx.has_changed().unwrap());
    }

    #[tokio::test]
    async fn test_invalid_file_is_rejected() {
        let (_tmp, project) = project();
        let mut store = store(&project).await;
        let mut changes_rx = store.subscribe();

        let file = touch(&project, "src/pages/[...rest]/more.vue");
        store.apply_batch(vec![FsEvent::Added(file.clone())]);

        match changes_rx.try_recv().unwrap() {
            RouteChange::Rejected { file: rejected, error } => {
                assert_eq!(rejected, file);
                assert!(matches!(error, RouteError::InvalidRouteShape { .. }));
            }
            other => panic!("unexpected change: {:?}", other),
        }
        assert_eq!(store.snapshot().invalid().count(), 1);
    }

    #[tokio::test]
    async fn test_new_glob_root_directory() {
        let (_tmp, project) = project();
        fs::create_dir_all(project.join("src/features")).unwrap();
        let mut store = store(&project).await;

        touch(&project, "src/features/billing/pages/invoices.vue");
        let changes =
            store.apply_batch(vec![FsEvent::Added(project.join("src/features/billing"))]);

        assert_eq!(changes.len(), 1);
        let result = store.snapshot().match_route("/features/invoices").unwrap();
        assert_eq!(result.entry.name, "features-invoices");
    }

    #[tokio::test]
    async fn test_conflict_is_broadcast() {
        let (_tmp, project) = project();
        touch(&project, "src/pages/users/[id].vue");
        let mut store = store(&project).await;

        let file = touch(&project, "src/pages/users/[uid].vue");
        let changes = store.apply_batch(vec![FsEvent::Added(file.clone())]);

        assert!(changes.contains(&RouteChange::Rejected {
            file: file.clone(),
            error: RouteError::DuplicateRoutePath {
                path: "/users/:id".to_string(),
                kept: project.join("src/pages/users/[id].vue"),
                rejected: file,
            },
        }));
    }

    #[tokio::test]
    async fn test_added_directory_is_scanned() {
        let (_tmp, project) = project();
        let mut store = store(&project).await;

        let a = touch(&project, "src/pages/docs/a.vue");
        let id = touch(&project, "src/pages/docs/[id].vue");
        let changes = store.apply_batch(vec![FsEvent::Added(project.join("src/pages/docs"))]);

        assert_eq!(
            changes,
            vec![
                RouteChange::Added {
                    file: id.clone(),
                    pattern: "/docs/:id".to_string()
                },
                RouteChange::Added {
                    file: a.clone(),
                    pattern: "/docs/a".to_string()
                },
            ]
        );
        let table = store.snapshot();
        assert_eq!(table.match_route("/docs/a").unwrap().file(), a);
        assert_eq!(table.match_route("/docs/42").unwrap().file(), id);
    }

    #[tokio::test]
    async fn test_created_pages_dir_is_scanned() {
        let tmp = tempfile::tempdir().unwrap();
        let project = fs::canonicalize(tmp.path()).unwrap();
        let mut store = store(&project).await;
        assert!(store.snapshot().is_empty());

        let file = touch(&project, "src/pages/index.vue");
        let changes = store.apply_batch(vec![FsEvent::Added(project.join("src"))]);

        assert_eq!(
            changes,
            vec![RouteChange::Added {
                file: file.clone(),
                pattern: "/".to_string()
            }]
        );
    }

    #[tokio::test]
    async fn test_overlapping_dirs_first_owns_file() {
        let (_tmp, project) = project();
        let users = touch(&project, "src/pages/admin/users.vue");
        let config = Config::for_project(&project)
            .with_dirs([("src/pages", ""), ("src/pages/admin", "console")]);
        let mut store = RouteStore::from_config(&config).await.unwrap();

        let table = store.snapshot();
        assert!(table.conflicts().is_empty());
        assert_eq!(table.match_route("/admin/users").unwrap().file(), users);
        assert_eq!(table.match_route("/console/users").unwrap().entry.stem, "[...all]");

        // a live add resolves ownership the same way
        let posts = touch(&project, "src/pages/admin/posts.vue");
        let changes = store.apply_batch(vec![FsEvent::Added(posts.clone())]);
        assert_eq!(
            changes,
            vec![RouteChange::Added {
                file: posts,
                pattern: "/admin/posts".to_string()
            }]
        );
    }

    #[tokio::test]
    async fn test_removing_winner_announces_promotion() {
        let (_tmp, project) = project();
        let id = touch(&project, "src/pages/users/[id].vue");
        let uid = touch(&project, "src/pages/users/[uid].vue");
        let mut store = store(&project).await;
        assert_eq!(store.snapshot().conflicts().len(), 1);

        fs::remove_file(&id).unwrap();
        let changes = store.apply_batch(vec![FsEvent::Removed(id.clone())]);

        assert_eq!(
            changes,
            vec![
                RouteChange::Removed {
                    file: id,
                    pattern: "/users/:id".to_string()
                },
                RouteChange::Added {
                    file: uid.clone(),
                    pattern: "/users/:uid".to_string()
                },
            ]
        );
        assert_eq!(store.snapshot().match_route("/users/7").unwrap().file(), uid);
    }
}
