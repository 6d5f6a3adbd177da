#![allow(dead_code)]

use assetpipe::config::{ConfigFile, PathEntry, RawConfigFile};
use assetpipe::types::{AssetKind, TriggerWhileRunningBehaviour};

/// Builder for `ConfigFile` to simplify test setup.
///
/// Starts from the built-in Path Table with the dev server on an ephemeral
/// port and the tunnel disabled.
pub struct ConfigFileBuilder {
    config: RawConfigFile,
}

impl ConfigFileBuilder {
    pub fn new() -> Self {
        let mut config = RawConfigFile::default();
        config.server.port = 0;
        config.server.tunnel = false;
        config.config.debounce_ms = 50;
        Self { config }
    }

    pub fn with_path(mut self, kind: AssetKind, entry: PathEntry) -> Self {
        self.config.path.insert(kind, entry);
        self
    }

    pub fn without_path(mut self, kind: AssetKind) -> Self {
        self.config.path.remove(&kind);
        self
    }

    pub fn with_output_root(mut self, output_root: &str) -> Self {
        self.config.config.output_root = output_root.to_string();
        self
    }

    pub fn with_cache_dir(mut self, cache_dir: &str) -> Self {
        self.config.config.cache_dir = cache_dir.to_string();
        self
    }

    pub fn with_behaviour(mut self, behaviour: TriggerWhileRunningBehaviour) -> Self {
        self.config.config.triggered_while_running_behaviour = behaviour;
        self
    }

    pub fn with_debounce_ms(mut self, ms: u64) -> Self {
        self.config.config.debounce_ms = ms;
        self
    }

    pub fn with_tunnel(mut self, host: &str) -> Self {
        self.config.server.tunnel = true;
        self.config.server.tunnel_host = host.to_string();
        self
    }

    pub fn raw(self) -> RawConfigFile {
        self.config
    }

    pub fn build(self) -> ConfigFile {
        ConfigFile::try_from(self.config).expect("Failed to build valid config from builder")
    }
}

impl Default for ConfigFileBuilder {
    fn default() -> Self {
        Self::new()
    }
}
