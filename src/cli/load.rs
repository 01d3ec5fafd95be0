//! Arguments shared by the `load` and `check` subcommands.

use crate::config::LoaderSettings;
use crate::format::OutputFormat;
use clap::Args;
use std::path::PathBuf;

/// Where to find the configuration tree
#[derive(Args, Debug, Clone, Default)]
pub struct LoadArgs {
    /// Root directory of the configuration tree
    #[arg(short, long, value_name = "DIR")]
    pub root: Option<PathBuf>,

    /// Folder of the init file, relative to the root
    #[arg(short, long, value_name = "PATH")]
    pub path: Option<String>,

    /// Init file name (.yml is appended when missing)
    #[arg(short, long, value_name = "FILE")]
    pub file: Option<String>,

    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Json)]
    pub format: OutputFormat,

    /// Do not detect extend chains that lead back into themselves
    #[arg(long)]
    pub no_cycle_check: bool,

    /// Disable the parsed-file cache
    #[arg(long)]
    pub no_cache: bool,
}

impl LoadArgs {
    /// Overlay the command-line values onto loader settings.
    pub fn apply(&self, settings: &mut LoaderSettings) {
        if let Some(ref root) = self.root {
            settings.root = root.clone();
        }
        if let Some(ref path) = self.path {
            settings.init_path = path.clone();
        }
        if let Some(ref file) = self.file {
            settings.init_file = file.clone();
        }
        if self.no_cycle_check {
            settings.detect_cycles = false;
        }
        if self.no_cache {
            settings.cache_capacity = 0;
        }
    }
}
