// src/project.rs

use std::path::PathBuf;
use std::sync::Arc;

use crate::cache::ImageCache;
use crate::config::model::ConfigFile;
use crate::dag::{run_graph, ProjectRunner, TaskGraph, TaskName};
use crate::errors::Result;
use crate::fs::{FileSystem, RealFileSystem};
use crate::optimize::{DefaultOptimizer, ImageOptimizer};
use crate::pipeline::StageContext;
use crate::server::ReloadHub;

/// A site on disk plus everything needed to run tasks on it.
#[derive(Debug, Clone)]
pub struct Project {
    ctx: Arc<StageContext>,
}

impl Project {
    /// Project over the real filesystem with the persistent image cache.
    pub fn new(root: impl Into<PathBuf>, config: ConfigFile) -> Self {
        Self::builder(root, config).build()
    }

    pub fn builder(root: impl Into<PathBuf>, config: ConfigFile) -> ProjectBuilder {
        ProjectBuilder {
            root: root.into(),
            config,
            fs: None,
            cache: None,
            optimizer: None,
            reload: None,
        }
    }

    pub fn context(&self) -> &Arc<StageContext> {
        &self.ctx
    }

    /// Expand `task` into its graph and run it to completion.
    pub async fn run(&self, task: TaskName) -> Result<()> {
        let graph = TaskGraph::for_task(task);
        run_graph(&graph, Arc::new(ProjectRunner::new(Arc::clone(&self.ctx)))).await
    }
}

/// Overrides for the collaborators a [`Project`] uses.
pub struct ProjectBuilder {
    root: PathBuf,
    config: ConfigFile,
    fs: Option<Arc<dyn FileSystem>>,
    cache: Option<Arc<ImageCache>>,
    optimizer: Option<Arc<dyn ImageOptimizer>>,
    reload: Option<ReloadHub>,
}

impl ProjectBuilder {
    pub fn fs(mut self, fs: Arc<dyn FileSystem>) -> Self {
        self.fs = Some(fs);
        self
    }

    pub fn cache(mut self, cache: Arc<ImageCache>) -> Self {
        self.cache = Some(cache);
        self
    }

    pub fn optimizer(mut self, optimizer: Arc<dyn ImageOptimizer>) -> Self {
        self.optimizer = Some(optimizer);
        self
    }

    pub fn reload(mut self, reload: ReloadHub) -> Self {
        self.reload = Some(reload);
        self
    }

    pub fn build(self) -> Project {
        let fs = self.fs.unwrap_or_else(|| Arc::new(RealFileSystem));
        let cache = self.cache.unwrap_or_else(|| {
            let dir = self.root.join(&self.config.settings().cache_dir);
            Arc::new(ImageCache::persistent(Arc::clone(&fs), dir))
        });

        Project {
            ctx: Arc::new(StageContext {
                root: self.root,
                config: self.config,
                fs,
                cache,
                optimizer: self.optimizer.unwrap_or_else(|| Arc::new(DefaultOptimizer)),
                reload: self.reload.unwrap_or_default(),
            }),
        }
    }
}
