// src/config/model.rs

use std::collections::BTreeMap;

use serde::Deserialize;

use crate::types::{AssetKind, TriggerWhileRunningBehaviour};

/// Top-level configuration as read from a TOML file.
///
/// ```toml
/// [config]
/// output_root = "build"
/// triggered_while_running_behaviour = "queue"
///
/// [server]
/// port = 3000
/// tunnel = false
///
/// [path.style]
/// src = "src/style/main.sass"
/// dest = "build/style/"
/// watch = "src/style/**/*.sass"
/// source_maps = "map"
/// ```
///
/// Every section is optional. Path Table entries left out of the file keep
/// their built-in defaults.
#[derive(Debug, Clone, Deserialize)]
pub struct RawConfigFile {
    #[serde(default)]
    pub config: ConfigSection,

    #[serde(default)]
    pub server: ServerSection,

    #[serde(default)]
    pub style: StyleSection,

    /// Path Table entries from `[path.<kind>]`.
    #[serde(default)]
    pub path: BTreeMap<AssetKind, PathEntry>,
}

impl Default for RawConfigFile {
    fn default() -> Self {
        Self {
            config: ConfigSection::default(),
            server: ServerSection::default(),
            style: StyleSection::default(),
            path: default_path_table(),
        }
    }
}

impl RawConfigFile {
    /// Fill in the built-in entry for every kind the file did not mention.
    pub fn fill_missing_paths(&mut self) {
        for (kind, entry) in default_path_table() {
            self.path.entry(kind).or_insert(entry);
        }
    }
}

/// `[config]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct ConfigSection {
    /// Directory that `clean` empties. Every `dest` must live inside it.
    #[serde(default = "default_output_root")]
    pub output_root: String,

    /// Directory of the persistent image cache, relative to the project root.
    #[serde(default = "default_cache_dir")]
    pub cache_dir: String,

    /// `"queue"` or `"cancel"`; see [`TriggerWhileRunningBehaviour`].
    #[serde(default)]
    pub triggered_while_running_behaviour: TriggerWhileRunningBehaviour,

    /// Quiet period before a burst of filesystem events is delivered.
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,
}

fn default_output_root() -> String {
    "build".to_string()
}

fn default_cache_dir() -> String {
    ".assetpipe/cache".to_string()
}

fn default_debounce_ms() -> u64 {
    100
}

impl Default for ConfigSection {
    fn default() -> Self {
        Self {
            output_root: default_output_root(),
            cache_dir: default_cache_dir(),
            triggered_while_running_behaviour: TriggerWhileRunningBehaviour::default(),
            debounce_ms: default_debounce_ms(),
        }
    }
}

/// `[server]` section: the dev server started by `watch`.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerSection {
    #[serde(default = "default_host")]
    pub host: String,

    /// `0` asks the OS for a free port.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Request a public URL from the tunnel service.
    #[serde(default = "default_tunnel")]
    pub tunnel: bool,

    #[serde(default = "default_tunnel_host")]
    pub tunnel_host: String,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_tunnel() -> bool {
    true
}

fn default_tunnel_host() -> String {
    "https://localtunnel.me".to_string()
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            tunnel: default_tunnel(),
            tunnel_host: default_tunnel_host(),
        }
    }
}

/// `[style]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct StyleSection {
    /// Browserslist queries used for vendor prefixing.
    #[serde(default = "default_browsers")]
    pub browsers: Vec<String>,
}

fn default_browsers() -> Vec<String> {
    vec!["> 1%".to_string()]
}

impl Default for StyleSection {
    fn default() -> Self {
        Self {
            browsers: default_browsers(),
        }
    }
}

/// One Path Table entry: where sources come from, where outputs go, and
/// which files count as a change for the kind.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PathEntry {
    pub src: String,
    pub dest: String,
    pub watch: String,

    /// Sidecar directory for source maps, relative to `dest`.
    ///
    /// Only meaningful for `style` and `js`.
    #[serde(default)]
    pub source_maps: Option<String>,
}

impl PathEntry {
    pub fn new(src: &str, dest: &str, watch: &str) -> Self {
        Self {
            src: src.to_string(),
            dest: dest.to_string(),
            watch: watch.to_string(),
            source_maps: None,
        }
    }

    pub fn with_source_maps(mut self, dir: &str) -> Self {
        self.source_maps = Some(dir.to_string());
        self
    }
}

/// Built-in Path Table.
pub fn default_path_table() -> BTreeMap<AssetKind, PathEntry> {
    BTreeMap::from([
        (
            AssetKind::Html,
            PathEntry::new("src/index.html", "build/", "src/**/*.html"),
        ),
        (
            AssetKind::Style,
            PathEntry::new("src/style/main.sass", "build/style/", "src/style/**/*.sass")
                .with_source_maps("map"),
        ),
        (
            AssetKind::Js,
            PathEntry::new("src/js/main.js", "build/js/", "src/js/**/*.js")
                .with_source_maps("map"),
        ),
        (
            AssetKind::Img,
            PathEntry::new("src/img/**/*.*", "build/img/", "src/img/**/*.*"),
        ),
        (
            AssetKind::Static,
            PathEntry::new("src/static/**/*.*", "build/static/", "src/static/**/*.*"),
        ),
        (
            AssetKind::Fonts,
            PathEntry::new("src/fonts/**/*.*", "build/fonts/", "src/fonts/**/*.*"),
        ),
    ])
}

/// Validated Path Table: exactly one entry per [`AssetKind`].
#[derive(Debug, Clone)]
pub struct PathTable {
    entries: [PathEntry; 6],
}

impl PathTable {
    pub(crate) fn new_unchecked(entries: [PathEntry; 6]) -> Self {
        Self { entries }
    }

    pub fn get(&self, kind: AssetKind) -> &PathEntry {
        &self.entries[kind.index()]
    }

    pub fn iter(&self) -> impl Iterator<Item = (AssetKind, &PathEntry)> {
        AssetKind::ALL.into_iter().map(|kind| (kind, self.get(kind)))
    }
}

/// Validated configuration.
///
/// Only constructed through `TryFrom<RawConfigFile>`, so every invariant in
/// `validate.rs` holds for any value of this type.
#[derive(Debug, Clone)]
pub struct ConfigFile {
    config: ConfigSection,
    server: ServerSection,
    style: StyleSection,
    paths: PathTable,
}

impl ConfigFile {
    pub(crate) fn new_unchecked(
        config: ConfigSection,
        server: ServerSection,
        style: StyleSection,
        paths: PathTable,
    ) -> Self {
        Self {
            config,
            server,
            style,
            paths,
        }
    }

    pub fn settings(&self) -> &ConfigSection {
        &self.config
    }

    pub fn server(&self) -> &ServerSection {
        &self.server
    }

    pub fn style(&self) -> &StyleSection {
        &self.style
    }

    pub fn paths(&self) -> &PathTable {
        &self.paths
    }

    /// Apply command-line overrides for the dev server.
    pub fn with_server_overrides(mut self, port: Option<u16>, no_tunnel: bool) -> Self {
        if let Some(port) = port {
            self.server.port = port;
        }
        if no_tunnel {
            self.server.tunnel = false;
        }
        self
    }
}
