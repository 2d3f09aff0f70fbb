//! Route table: every compiled page, ordered by matching precedence
//!
//! A published table is never mutated. The store clones the current
//! snapshot, applies a batch of edits, calls [`RouteTable::commit`] and
//! publishes the result as a new `Arc<RouteTable>`.

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::config::ConflictPolicy;
use crate::entry::RouteEntry;
use crate::error::RouteError;
use crate::matcher::{self, MatchResult};
use crate::route::compare_precedence;
use crate::scan::ScanOutcome;

/// A compiled file and the order in which it was registered
#[derive(Debug, Clone)]
struct Slot {
    entry: Arc<RouteEntry>,
    seq: u64,
}

#[derive(Debug, Clone)]
pub struct RouteTable {
    /// Every compiled file, routed or not
    files: BTreeMap<PathBuf, Slot>,
    /// Routed entries in precedence order (derived)
    routes: Vec<Arc<RouteEntry>>,
    /// (root dir, stem) -> entry, for layout lookups (derived)
    by_stem: HashMap<(PathBuf, String), Arc<RouteEntry>>,
    /// Signature conflicts in the current file set (derived)
    conflicts: Vec<RouteError>,
    /// Files that failed to compile
    invalid: BTreeMap<PathBuf, RouteError>,
    case_sensitive: bool,
    policy: ConflictPolicy,
    next_seq: u64,
    generation: u64,
}

impl RouteTable {
    pub fn new(case_sensitive: bool, policy: ConflictPolicy) -> Self {
        Self {
            files: BTreeMap::new(),
            routes: Vec::new(),
            by_stem: HashMap::new(),
            conflicts: Vec::new(),
            invalid: BTreeMap::new(),
            case_sensitive,
            policy,
            next_seq: 0,
            generation: 0,
        }
    }

    /// Builds a table from a scan, registering entries in scan order
    pub fn from_outcome(outcome: ScanOutcome, case_sensitive: bool, policy: ConflictPolicy) -> Self {
        let mut table = Self::new(case_sensitive, policy);
        for entry in outcome.entries {
            table.insert(entry);
        }
        for error in outcome.errors {
            table.mark_invalid(error);
        }
        table.reindex();
        table
    }

    /// Inserts or replaces the entry for a file
    ///
    /// A replaced entry keeps its registration order. Returns `false` when
    /// the file is already registered with an identical entry.
    pub(crate) fn insert(&mut self, entry: RouteEntry) -> bool {
        self.invalid.remove(&entry.file);

        if let Some(slot) = self.files.get_mut(&entry.file) {
            if *slot.entry == entry {
                return false;
            }
            slot.entry = Arc::new(entry);
            return true;
        }

        let seq = self.next_seq;
        self.next_seq += 1;
        self.files.insert(
            entry.file.clone(),
            Slot {
                entry: Arc::new(entry),
                seq,
            },
        );
        true
    }

    /// Records a compile failure, dropping any entry the file had
    pub(crate) fn mark_invalid(&mut self, error: RouteError) -> Option<Arc<RouteEntry>> {
        let file = error.file()?.clone();
        let removed = self.files.remove(&file).map(|slot| slot.entry);
        self.invalid.insert(file, error);
        removed
    }

    /// Removes the file at `path`, or every file beneath it
    pub(crate) fn remove_path(&mut self, path: &Path) -> Vec<Arc<RouteEntry>> {
        self.invalid.retain(|file, _| !file.starts_with(path));

        let doomed: Vec<PathBuf> = self
            .files
            .range(path.to_path_buf()..)
            .take_while(|(file, _)| file.starts_with(path))
            .map(|(file, _)| file.clone())
            .collect();

        doomed
            .into_iter()
            .filter_map(|file| self.files.remove(&file))
            .map(|slot| slot.entry)
            .collect()
    }

    /// Recomputes derived state and advances the generation
    pub(crate) fn commit(mut self) -> Self {
        self.reindex();
        self.generation += 1;
        self
    }

    /// Rebuilds routed entries, conflicts and the stem index from `files`
    fn reindex(&mut self) {
        let mut slots: Vec<&Slot> = self.files.values().collect();
        slots.sort_by_key(|slot| slot.seq);

        self.by_stem.clear();
        for slot in &slots {
            let entry = &slot.entry;
            self.by_stem
                .entry((entry.root_dir.clone(), entry.stem.clone()))
                .or_insert_with(|| Arc::clone(entry));
        }

        let mut groups: BTreeMap<String, Vec<&Slot>> = BTreeMap::new();
        for slot in slots {
            groups
                .entry(slot.entry.path.signature(self.case_sensitive))
                .or_default()
                .push(slot);
        }

        let mut routed: Vec<&Slot> = Vec::new();
        let mut conflicts = Vec::new();

        for group in groups.into_values() {
            // a layout sharing its path with a page beneath it gives way
            let contenders: Vec<&Slot> = group
                .iter()
                .filter(|slot| {
                    !group
                        .iter()
                        .any(|other| slot.entry.is_layout_of(&other.entry))
                })
                .copied()
                .collect();

            let winner = match self.policy {
                ConflictPolicy::KeepFirst => contenders.first(),
                ConflictPolicy::KeepLast => contenders.last(),
            };
            let Some(&winner) = winner else {
                continue;
            };

            for loser in contenders.iter().filter(|slot| slot.seq != winner.seq) {
                conflicts.push(RouteError::DuplicateRoutePath {
                    path: winner.entry.path.to_string(),
                    kept: winner.entry.file.clone(),
                    rejected: loser.entry.file.clone(),
                });
            }
            routed.push(winner);
        }

        routed.sort_by(|a, b| {
            compare_precedence(&a.entry.path, &b.entry.path).then(a.seq.cmp(&b.seq))
        });

        self.routes = routed.into_iter().map(|slot| Arc::clone(&slot.entry)).collect();
        self.conflicts = conflicts;
    }

    /// Resolves a request path against this snapshot
    pub fn match_route(&self, request: &str) -> Result<MatchResult, RouteError> {
        matcher::match_route(self, request)
    }

    /// Routed entries, highest precedence first
    pub fn routes(&self) -> &[Arc<RouteEntry>] {
        &self.routes
    }

    /// Every compiled file in path order, including layouts and parked
    /// conflict losers
    pub fn entries(&self) -> impl Iterator<Item = &Arc<RouteEntry>> {
        self.files.values().map(|slot| &slot.entry)
    }

    pub fn get(&self, file: &Path) -> Option<&Arc<RouteEntry>> {
        self.files.get(file).map(|slot| &slot.entry)
    }

    /// Whether `file` currently holds a route
    pub fn is_routed(&self, file: &Path) -> bool {
        self.routes.iter().any(|entry| entry.file == file)
    }

    pub fn conflicts(&self) -> &[RouteError] {
        &self.conflicts
    }

    /// Compile failures, in file path order
    pub fn invalid(&self) -> impl Iterator<Item = &RouteError> {
        self.invalid.values()
    }

    /// Layout pages enclosing `entry`, outermost first
    pub fn layouts_for(&self, entry: &RouteEntry) -> Vec<Arc<RouteEntry>> {
        let mut layouts: Vec<Arc<RouteEntry>> = entry
            .ancestor_stems()
            .filter_map(|stem| {
                self.by_stem
                    .get(&(entry.root_dir.clone(), stem.to_string()))
                    .cloned()
            })
            .collect();
        layouts.reverse();
        layouts
    }

    pub fn case_sensitive(&self) -> bool {
        self.case_sensitive
    }

    /// Number of publishes this table has gone through; 0 for a fresh table
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Number of routed entries
    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}
