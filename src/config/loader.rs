//! Recursive configuration tree loader.
//!
//! Starting from one init file, every key is resolved through its
//! [`Directive`](super::directive::Directive): either the target file's
//! parsed contents are attached verbatim, or (`extend: true`) the target is
//! itself treated as an init file and expanded one level deeper.
//!
//! All keys of one level are loaded concurrently; the level completes only
//! when every key has, and the first failure fails the whole load.

use super::cache::FileCache;
use super::directive::ConfigNode;
use super::types::LoaderSettings;
use crate::error::{InitError, InitResult};
use crate::paths;
use futures::FutureExt;
use futures::future::{BoxFuture, try_join_all};
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};

/// Loader for one root directory.
///
/// Holds no per-load state, so concurrent `load` calls on the same tree
/// are independent.
#[derive(Debug, Clone)]
pub struct ConfigTree {
    root: PathBuf,
    cache: Option<Arc<FileCache>>,
    detect_cycles: bool,
}

impl ConfigTree {
    /// Loader rooted at `root`, without caching, with cycle detection.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            cache: None,
            detect_cycles: true,
        }
    }

    /// Loader configured from settings.
    pub fn from_settings(settings: &LoaderSettings) -> Self {
        let tree = Self::new(&settings.root).detect_cycles(settings.detect_cycles);
        if settings.cache_capacity > 0 {
            tree.with_cache(FileCache::new(settings.cache_capacity))
        } else {
            tree
        }
    }

    pub fn with_cache(self, cache: FileCache) -> Self {
        self.with_shared_cache(Arc::new(cache))
    }

    /// Share one cache between several trees.
    pub fn with_shared_cache(mut self, cache: Arc<FileCache>) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Toggle detection of `extend` chains that re-enter a file already
    /// being expanded. With detection off such a tree recurses forever.
    pub fn detect_cycles(mut self, enabled: bool) -> Self {
        self.detect_cycles = enabled;
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn cache(&self) -> Option<&FileCache> {
        self.cache.as_deref()
    }

    /// Load the tree whose init file is `start_file` in the folder
    /// `relative_start` under the root.
    pub async fn load(
        &self,
        relative_start: impl AsRef<Path>,
        start_file: &str,
    ) -> InitResult<Value> {
        let mut target = Map::new();
        self.load_into(relative_start, start_file, &mut target).await?;
        Ok(Value::Object(target))
    }

    /// Like [`ConfigTree::load`], writing each loaded key into `target`.
    ///
    /// `target` is only touched once the whole tree has loaded.
    pub async fn load_into(
        &self,
        relative_start: impl AsRef<Path>,
        start_file: &str,
        target: &mut Map<String, Value>,
    ) -> InitResult<()> {
        if !paths::is_directory(&self.root).await {
            return Err(InitError::directory_not_found(&self.root));
        }

        let folder = paths::normalize(paths::join(PathBuf::new(), relative_start));
        let file = paths::with_yaml_extension(start_file);
        let loaded = self.load_level(folder.clone(), file.clone(), Vec::new()).await?;

        info!(
            root = %paths::to_forward_slashes(&self.root),
            init = %paths::to_forward_slashes(paths::join(&folder, &file)),
            keys = loaded.len(),
            "configuration loaded"
        );
        target.extend(loaded);
        Ok(())
    }

    /// Resolve one init file and everything it references.
    ///
    /// `chain` holds the init files currently being expanded above this one.
    fn load_level(
        &self,
        folder: PathBuf,
        file: String,
        mut chain: Vec<PathBuf>,
    ) -> BoxFuture<'_, InitResult<Map<String, Value>>> {
        async move {
            let location = paths::normalize(paths::join(&folder, &file));
            if self.detect_cycles && chain.contains(&location) {
                return Err(InitError::circular(&location));
            }

            let init = match self.read(&location).await? {
                Value::Object(init) => init,
                Value::Null => Map::new(),
                _ => return Err(InitError::invalid_init_file(&location)),
            };

            // Every directive is checked before any target file is read.
            let nodes = init
                .iter()
                .map(|(key, value)| ConfigNode::from_yaml(key, value, &folder))
                .collect::<InitResult<Vec<_>>>()?;

            chain.push(location);
            let entries = try_join_all(nodes.into_iter().map(|node| self.load_node(node, &chain)))
                .await?;
            Ok(entries.into_iter().collect())
        }
        .boxed()
    }

    async fn load_node(&self, node: ConfigNode, chain: &[PathBuf]) -> InitResult<(String, Value)> {
        debug!(
            key = %node.key,
            location = %paths::to_forward_slashes(node.location()),
            extend = node.extend,
            "resolving entry"
        );

        let value = if node.extend {
            Value::Object(
                self.load_level(node.folder.clone(), node.file.clone(), chain.to_vec())
                    .await?,
            )
        } else {
            self.read(&node.location()).await?
        };
        Ok((node.key, value))
    }

    /// Read a file addressed relative to the root; nothing above the root
    /// is reachable.
    async fn read(&self, relative: &Path) -> InitResult<Value> {
        if paths::escapes_base(relative) {
            return Err(InitError::outside_root(relative));
        }
        let full = paths::join(&self.root, relative);
        match &self.cache {
            Some(cache) => cache.read_yaml(&full).await,
            None => paths::read_yaml(&full).await,
        }
    }
}
