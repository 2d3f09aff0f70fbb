// File: src/config.rs
// Purpose: Configuration parsing from pagemap.toml

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Router configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub project: ProjectConfig,

    #[serde(default)]
    pub routing: RoutingConfig,

    #[serde(default)]
    pub dev: DevConfig,
}

/// Project layout
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectConfig {
    /// Root that scan directories and component references are relative to.
    /// A relative root is resolved against the config file's directory.
    #[serde(default = "default_root")]
    pub root: PathBuf,
}

/// One page directory to scan
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirConfig {
    /// Directory relative to the project root; glob patterns allowed
    /// (e.g. "src/features/**/pages")
    pub dir: String,

    /// Path prefix for every route found under this directory
    #[serde(default)]
    pub base_route: String,
}

/// Which file wins when two pages compile to the same route
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ConflictPolicy {
    /// The file registered first keeps the route
    #[default]
    KeepFirst,
    /// The file registered last takes the route over
    KeepLast,
}

/// How the client runtime should load a page component
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImportMode {
    #[default]
    Async,
    Sync,
}

/// Routing configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoutingConfig {
    /// Page directories, merged into one route table in this order
    #[serde(default = "default_dirs")]
    pub dirs: Vec<DirConfig>,

    /// File extensions treated as pages
    #[serde(default = "default_extensions")]
    pub extensions: Vec<String>,

    /// Glob patterns (relative to a page directory) for files to skip
    #[serde(default)]
    pub exclude: Vec<String>,

    /// Whether static segments match case-sensitively (default: false)
    #[serde(default = "default_false")]
    pub case_sensitive: bool,

    #[serde(default)]
    pub conflict_policy: ConflictPolicy,

    #[serde(default)]
    pub import_mode: ImportMode,

    /// Load the root index page synchronously regardless of `import_mode`
    #[serde(default = "default_true")]
    pub sync_index: bool,
}

/// Development configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DevConfig {
    #[serde(default = "default_true")]
    pub hot_reload: bool,

    /// Quiet period used to batch file-system events
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,
}

// Default values
fn default_root() -> PathBuf {
    PathBuf::from(".")
}

fn default_dirs() -> Vec<DirConfig> {
    vec![DirConfig {
        dir: "src/pages".to_string(),
        base_route: String::new(),
    }]
}

fn default_extensions() -> Vec<String> {
    vec!["vue".to_string(), "md".to_string()]
}

fn default_debounce_ms() -> u64 {
    50
}

fn default_true() -> bool {
    true
}

fn default_false() -> bool {
    false
}

// Default implementations
impl Default for ProjectConfig {
    fn default() -> Self {
        Self {
            root: default_root(),
        }
    }
}

impl Default for RoutingConfig {
    fn default() -> Self {
        Self {
            dirs: default_dirs(),
            extensions: default_extensions(),
            exclude: Vec::new(),
            case_sensitive: false,
            conflict_policy: ConflictPolicy::default(),
            import_mode: ImportMode::default(),
            sync_index: true,
        }
    }
}

impl RoutingConfig {
    /// Import mode for a page, honoring `sync_index` for the root index
    pub fn import_mode_for(&self, is_root_index: bool) -> ImportMode {
        if is_root_index && self.sync_index {
            ImportMode::Sync
        } else {
            self.import_mode
        }
    }
}

impl Default for DevConfig {
    fn default() -> Self {
        Self {
            hot_reload: true,
            debounce_ms: default_debounce_ms(),
        }
    }
}

impl Config {
    /// Load configuration from a pagemap.toml file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        // If file doesn't exist or is empty, return default config
        let mut config = if !path.exists() {
            Self::default()
        } else {
            let content = fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file: {:?}", path))?;

            if content.trim().is_empty() {
                Self::default()
            } else {
                toml::from_str::<Config>(&content)
                    .with_context(|| format!("Failed to parse config file: {:?}", path))?
            }
        };

        if config.project.root.is_relative() {
            let base = path.parent().unwrap_or_else(|| Path::new(""));
            config.project.root = base.join(&config.project.root);
        }

        Ok(config)
    }

    /// Load configuration from default path (./pagemap.toml)
    pub fn load_default() -> Result<Self> {
        Self::load("pagemap.toml")
    }

    /// Default configuration rooted at `root`
    pub fn for_project(root: impl Into<PathBuf>) -> Self {
        Self {
            project: ProjectConfig { root: root.into() },
            ..Self::default()
        }
    }

    /// Replaces the scan directories (builder)
    pub fn with_dirs<I, S>(mut self, dirs: I) -> Self
    where
        I: IntoIterator<Item = (S, S)>,
        S: Into<String>,
    {
        self.routing.dirs = dirs
            .into_iter()
            .map(|(dir, base_route)| DirConfig {
                dir: dir.into(),
                base_route: base_route.into(),
            })
            .collect();
        self
    }
}
