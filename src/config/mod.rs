//! Directory-driven configuration trees.
//!
//! A tree is described by an init file whose keys carry directives; see
//! [`directive`] for their shapes and [`ConfigTree`] for the loading rules.
//!
//! ## Environment Variables
//! - `INITTREE_SETTINGS` - Explicit settings file
//! - `INITTREE_ROOT` - Root directory of the configuration tree
//! - `INITTREE_INIT_PATH` - Folder of the init file, relative to the root
//! - `INITTREE_INIT_FILE` - Init file name
//! - `INITTREE_BUS_CAPACITY` - Behavior bus identifier limit

mod cache;
pub mod directive;
mod loader;
mod types;

pub use cache::{CacheStats, DEFAULT_CACHE_CAPACITY, FileCache};
pub use directive::{ConfigNode, Directive, PathMode};
pub use loader::ConfigTree;
pub use types::*;
