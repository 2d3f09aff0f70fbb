use std::collections::BTreeSet;
use std::time::Duration;

use anyhow::{Context, Result};
use notify::event::{ModifyKind, RenameMode};
use notify::{Event, EventKind, RecursiveMode, Watcher};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::store::{FsEvent, RouteHandle, RouteStore};

/// Keeps a route store in sync with the page directories
///
/// Raw notify events are translated into add/remove events and sent over
/// an unbounded channel to one update task, which batches them for the
/// debounce window and applies each batch to the store. Dropping the
/// watcher stops both.
pub struct RouteWatcher {
    handle: RouteHandle,
    task: JoinHandle<()>,
    _watcher: notify::RecommendedWatcher,
}

impl RouteWatcher {
    /// Starts watching; must be called inside a tokio runtime
    pub fn spawn(store: RouteStore, debounce: Duration) -> Result<Self> {
        let (tx, rx) = mpsc::unbounded_channel();

        let mut watcher = notify::recommended_watcher(move |res: Result<Event, notify::Error>| {
            match res {
                Ok(event) => {
                    for fs_event in translate(event) {
                        // receiver gone means the watcher is shutting down
                        let _ = tx.send(fs_event);
                    }
                }
                Err(e) => error!("Watch error: {:?}", e),
            }
        })
        .context("Failed to create file watcher")?;

        let mut watched = BTreeSet::new();
        for base in store.watch_bases() {
            // a missing page directory is picked up once it is created
            let Some(target) = base.ancestors().find(|path| path.exists()) else {
                warn!("Path does not exist: {:?}", base);
                continue;
            };
            if target != base {
                warn!("{:?} does not exist yet, watching {:?}", base, target);
            }
            if !watched.insert(target.to_path_buf()) {
                continue;
            }
            watcher
                .watch(target, RecursiveMode::Recursive)
                .with_context(|| format!("Failed to watch {:?}", target))?;
            info!("Watching: {:?}", target);
        }

        let handle = store.handle();
        let task = tokio::spawn(run_updates(store, rx, debounce));

        Ok(Self {
            handle,
            task,
            _watcher: watcher,
        })
    }

    pub fn handle(&self) -> RouteHandle {
        self.handle.clone()
    }
}

impl Drop for RouteWatcher {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// Maps a notify event onto add/remove events; content edits map to none
fn translate(event: Event) -> Vec<FsEvent> {
    match event.kind {
        EventKind::Create(_) | EventKind::Modify(ModifyKind::Name(RenameMode::To)) => {
            event.paths.into_iter().map(FsEvent::Added).collect()
        }
        EventKind::Remove(_) | EventKind::Modify(ModifyKind::Name(RenameMode::From)) => {
            event.paths.into_iter().map(FsEvent::Removed).collect()
        }
        // paths are [from, to]
        EventKind::Modify(ModifyKind::Name(RenameMode::Both)) => {
            let mut paths = event.paths.into_iter();
            paths
                .next()
                .map(FsEvent::Removed)
                .into_iter()
                .chain(paths.map(FsEvent::Added))
                .collect()
        }
        // backends that cannot tell which side of a rename this is
        EventKind::Modify(ModifyKind::Name(_)) => event
            .paths
            .into_iter()
            .map(|path| {
                if path.exists() {
                    FsEvent::Added(path)
                } else {
                    FsEvent::Removed(path)
                }
            })
            .collect(),
        _ => Vec::new(),
    }
}

async fn run_updates(
    mut store: RouteStore,
    mut rx: mpsc::UnboundedReceiver<FsEvent>,
    debounce: Duration,
) {
    while let Some(first) = rx.recv().await {
        let mut batch = vec![first];

        if debounce.is_zero() {
            while let Ok(event) = rx.try_recv() {
                batch.push(event);
            }
        } else {
            let deadline = tokio::time::sleep(debounce);
            tokio::pin!(deadline);

            loop {
                tokio::select! {
                    _ = &mut deadline => break,
                    event = rx.recv() => match event {
                        Some(event) => batch.push(event),
                        None => break,
                    },
                }
            }
        }

        debug!("Applying {} file events", batch.len());
        let changes = store.apply_batch(batch);
        debug!("{} route changes", changes.len());
    }

    debug!("Event channel closed, stopping route updates");
}

#[cfg(test)]
mod tests {
    use super::*;
    use notify::event::{CreateKind, DataChange, RemoveKind};
    use std::path::PathBuf;

    fn event(kind: EventKind, paths: &[&str]) -> Event {
        paths
            .iter()
            .fold(Event::new(kind), |event, path| event.add_path(PathBuf::from(path)))
    }

    #[test]
    fn test_translate_create_and_remove() {
        assert_eq!(
            translate(event(EventKind::Create(CreateKind::File), &["/p/a.vue"])),
            vec![FsEvent::Added(PathBuf::from("/p/a.vue"))]
        );
        assert_eq!(
            translate(event(EventKind::Remove(RemoveKind::Folder), &["/p/blog"])),
            vec![FsEvent::Removed(PathBuf::from("/p/blog"))]
        );
    }

    #[test]
    fn test_translate_rename_both() {
        let kind = EventKind::Modify(ModifyKind::Name(RenameMode::Both));
        assert_eq!(
            translate(event(kind, &["/p/old.vue", "/p/new.vue"])),
            vec![
                FsEvent::Removed(PathBuf::from("/p/old.vue")),
                FsEvent::Added(PathBuf::from("/p/new.vue")),
            ]
        );
    }

    #[test]
    fn test_translate_ambiguous_rename_checks_disk() {
        let kind = EventKind::Modify(ModifyKind::Name(RenameMode::Any));
        assert_eq!(
            translate(event(kind, &["/definitely/not/here.vue"])),
            vec![FsEvent::Removed(PathBuf::from("/definitely/not/here.vue"))]
        );
    }

    #[test]
    fn test_translate_ignores_content_edits() {
        let kind = EventKind::Modify(ModifyKind::Data(DataChange::Content));
        assert!(translate(event(kind, &["/p/a.vue"])).is_empty());
    }
}
