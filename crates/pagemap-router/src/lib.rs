//! # pagemap router
//!
//! A file-system page router. Page files under configured directories are
//! compiled into routes, matched against request paths and kept live as
//! files are added or removed.
//!
//! - Static routes (`about.vue` → `/about`)
//! - Dynamic parameters (`users/[id].vue` → `/users/:id`)
//! - Catch-all routes (`[...all].vue` → `/*all`, one or more components)
//! - Index pages (`blog/today/index.vue` → `/blog/today`)
//! - Nested layouts (`about.vue` wraps everything under `about/`)
//! - Extra page directories with glob patterns and a base route
//!
//! ## Matching order
//!
//! Static beats Dynamic beats CatchAll, position by position from the root,
//! so a nested catch-all such as `blog/today/[...all]` always wins over the
//! root `[...all]` for requests under `/blog/today/`.
//!
//! ## Snapshots
//!
//! A [`RouteTable`] is immutable once published. [`RouteStore`] applies file
//! events to a copy and swaps it in; readers match against whatever
//! `Arc<RouteTable>` they hold, without locking.
//!
//! ## Example
//!
//! ```no_run
//! use pagemap_router::{Config, RouteStore};
//!
//! # async fn run() -> anyhow::Result<()> {
//! let config = Config::load("pagemap.toml")?;
//! let store = RouteStore::from_config(&config).await?;
//!
//! let result = store.snapshot().match_route("/about/1b234bk12b3/more")?;
//! assert_eq!(result.param("id").map(|v| v.to_string()), Some("1b234bk12b3".into()));
//! # Ok(())
//! # }
//! ```

// ============================================================================
// Module Declarations
// ============================================================================

pub mod compiler;
pub mod config;
pub mod entry;
pub mod error;
pub mod manifest;
pub mod matcher;
pub mod path;
pub mod route;
pub mod scan;
pub mod store;
pub mod table;
pub mod watcher;

pub use compiler::RouteCompiler;
pub use config::{Config, ConflictPolicy, DirConfig, ImportMode};
pub use entry::RouteEntry;
pub use error::{RouteError, ShapeError};
pub use manifest::{ManifestRoute, RouteManifest};
pub use matcher::{match_route, MatchResult, ParamValue, RouteParams};
pub use path::{is_valid_path, normalize_path, StemHierarchy};
pub use route::{classify_segment, compare_precedence, compile_stem, RoutePath, Segment};
pub use scan::{RootSpec, ScanOutcome, ScanRoot, Scanner};
pub use store::{FsEvent, RouteChange, RouteHandle, RouteStore};
pub use table::RouteTable;
pub use watcher::RouteWatcher;
