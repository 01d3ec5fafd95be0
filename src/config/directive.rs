//! Per-key loading directives.
//!
//! Each key of an init file carries a directive telling the loader where
//! its value comes from:
//!
//! ```yaml
//! plain:                  # file `plain.yml` in the current folder
//! empty: ""               # same as above
//! named: "other"          # file `other.yml` in the current folder
//! detailed:
//!   folder: cfg           # default: the current folder
//!   file: settings        # default: the key
//!   path: relative        # `relative` joins folder onto the current folder
//!   extend: true          # recurse: the file is itself an init file
//! ```
//!
//! An unset `folder` always means the current folder, whether or not the
//! key extends.

use crate::error::{InitError, InitResult};
use crate::paths;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};

/// How a directive's `folder` is anchored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PathMode {
    /// `folder` is taken from the root directory.
    #[default]
    Absolute,
    /// `folder` is joined onto the folder of the file being read.
    Relative,
}

impl PathMode {
    /// `"relative"` selects [`PathMode::Relative`]; anything else is absolute.
    pub fn parse(s: &str) -> Self {
        if s == "relative" {
            PathMode::Relative
        } else {
            PathMode::Absolute
        }
    }
}

/// A directive as written in YAML, before it is anchored to a folder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Directive {
    /// `null` or `""`: every field takes its default.
    Default,
    /// A non-empty string naming the file to read.
    File(String),
    /// A mapping with any of `folder`, `file`, `path` and `extend`.
    Detailed {
        folder: Option<String>,
        file: Option<String>,
        path: PathMode,
        extend: bool,
    },
}

impl Directive {
    /// Interpret the raw YAML value attached to `key`.
    ///
    /// Anything other than null, a string or a mapping of the known
    /// fields is rejected as a malformed directive naming `key`.
    pub fn parse(key: &str, value: &Value) -> InitResult<Self> {
        match value {
            Value::Null => Ok(Directive::Default),
            Value::String(s) if s.is_empty() => Ok(Directive::Default),
            Value::String(s) => Ok(Directive::File(s.clone())),
            Value::Object(fields) => Self::parse_fields(key, fields),
            _ => Err(InitError::malformed_directive(key)),
        }
    }

    fn parse_fields(key: &str, fields: &Map<String, Value>) -> InitResult<Self> {
        let text = |name: &str| -> InitResult<Option<String>> {
            match fields.get(name) {
                None | Some(Value::Null) => Ok(None),
                Some(Value::String(s)) if s.is_empty() => Ok(None),
                Some(Value::String(s)) => Ok(Some(s.clone())),
                Some(_) => Err(InitError::malformed_directive(key)),
            }
        };

        let extend = match fields.get("extend") {
            None | Some(Value::Null) => false,
            Some(Value::Bool(b)) => *b,
            Some(_) => return Err(InitError::malformed_directive(key)),
        };

        // Any `path` other than the string "relative" is absolute.
        let path = match fields.get("path") {
            Some(Value::String(mode)) => PathMode::parse(mode),
            _ => PathMode::Absolute,
        };

        Ok(Directive::Detailed {
            folder: text("folder")?,
            file: text("file")?,
            path,
            extend,
        })
    }
}

/// A directive resolved against the folder of the file that declared it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigNode {
    /// Property name the loaded value is attached under.
    pub key: String,
    /// Folder of the target file, relative to the loader root.
    pub folder: PathBuf,
    /// Target file name, YAML extension included.
    pub file: String,
    pub path_mode: PathMode,
    pub extend: bool,
}

impl ConfigNode {
    /// Anchor `directive` for `key` declared in the folder `current`.
    pub fn resolve(key: &str, directive: Directive, current: &Path) -> Self {
        let (folder, file, path_mode, extend) = match directive {
            Directive::Default => (None, None, PathMode::Absolute, false),
            Directive::File(file) => (None, Some(file), PathMode::Absolute, false),
            Directive::Detailed {
                folder,
                file,
                path,
                extend,
            } => (folder, file, path, extend),
        };

        let folder = match (folder, path_mode) {
            (None, _) => current.to_path_buf(),
            (Some(folder), PathMode::Absolute) => paths::join(PathBuf::new(), folder),
            (Some(folder), PathMode::Relative) => paths::join(current, folder),
        };

        Self {
            key: key.to_string(),
            folder: paths::normalize(folder),
            file: paths::with_yaml_extension(file.as_deref().unwrap_or(key)),
            path_mode,
            extend,
        }
    }

    /// Parse and resolve in one step.
    pub fn from_yaml(key: &str, value: &Value, current: &Path) -> InitResult<Self> {
        Directive::parse(key, value).map(|d| Self::resolve(key, d, current))
    }

    /// Target file relative to the loader root.
    ///
    /// A rooted `file` is still placed inside `folder`.
    pub fn location(&self) -> PathBuf {
        paths::normalize(paths::join(&self.folder, &self.file))
    }
}
