//! Shared per-session context every built-in tool resolves paths against.

use std::path::PathBuf;
use std::sync::Arc;

use crate::path::PathResolverConfig;

#[derive(Clone)]
pub struct ToolContext {
    pub working_dir: Arc<PathBuf>,
    pub path_config: Arc<PathResolverConfig>,
}

impl ToolContext {
    pub fn new(working_dir: PathBuf) -> Self {
        Self {
            working_dir: Arc::new(working_dir),
            path_config: Arc::new(PathResolverConfig::default()),
        }
    }

    pub fn with_path_config(mut self, config: PathResolverConfig) -> Self {
        self.path_config = Arc::new(config);
        self
    }
}
