//! inittree library
//!
//! Directory-driven YAML configuration trees, a first-come-first-served
//! async lock, a named behavior bus and a subsystem registry, wired
//! together by [`bootstrap::Bootstrap`].

pub mod behaviors;
pub mod bootstrap;
pub mod catalog;
pub mod cli;
pub mod config;
pub mod error;
pub mod format;
pub mod lock;
pub mod logging;
pub mod paths;
pub mod subsystems;
