//! Error-code and behavior-name tables declared by a configuration tree.
//!
//! A [`Catalog`] is built from a loaded tree and handed explicitly to the
//! components that need it; nothing here is global.
//!
//! ```yaml
//! errors:
//!   E_DB: "Database unavailable"
//!   E_AUTH:
//!     message: "Not authorized"
//! behaviors:
//!   - started
//!   - stopped
//! ```

use crate::error::{InitError, InitResult};
use serde::Serialize;
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// An application error declared in the `errors` section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeclaredError {
    pub code: String,
    pub message: String,
}

impl fmt::Display for DeclaredError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}

impl std::error::Error for DeclaredError {}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Catalog {
    errors: BTreeMap<String, String>,
    behaviors: BTreeSet<String>,
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Read the `errors` and `behaviors` sections of a loaded tree.
    ///
    /// Both sections are optional.
    pub fn from_tree(tree: &Value) -> InitResult<Self> {
        let mut catalog = Self::new();

        match tree.get("errors") {
            None | Some(Value::Null) => {}
            Some(Value::Object(errors)) => {
                for (code, entry) in errors {
                    let message = match entry {
                        Value::String(message) => message.clone(),
                        Value::Object(fields) => match fields.get("message") {
                            Some(Value::String(message)) => message.clone(),
                            _ => return Err(invalid_section("errors", code)),
                        },
                        _ => return Err(invalid_section("errors", code)),
                    };
                    catalog.errors.insert(code.clone(), message);
                }
            }
            Some(_) => {
                return Err(InitError::invalid_settings(
                    "errors section must be a mapping",
                ));
            }
        }

        match tree.get("behaviors") {
            None | Some(Value::Null) => {}
            Some(Value::Array(names)) => {
                for name in names {
                    match name {
                        Value::String(name) if !name.is_empty() => {
                            catalog.behaviors.insert(name.clone());
                        }
                        other => return Err(invalid_section("behaviors", &other.to_string())),
                    }
                }
            }
            Some(Value::Object(names)) => {
                catalog.behaviors.extend(names.keys().cloned());
            }
            Some(_) => {
                return Err(InitError::invalid_settings(
                    "behaviors section must be a sequence or a mapping",
                ));
            }
        }

        Ok(catalog)
    }

    pub fn with_error(mut self, code: impl Into<String>, message: impl Into<String>) -> Self {
        self.errors.insert(code.into(), message.into());
        self
    }

    pub fn with_behavior(mut self, name: impl Into<String>) -> Self {
        self.behaviors.insert(name.into());
        self
    }

    /// The declared error for `code`, if any.
    pub fn error(&self, code: &str) -> Option<DeclaredError> {
        self.errors.get(code).map(|message| DeclaredError {
            code: code.to_string(),
            message: message.clone(),
        })
    }

    pub fn error_codes(&self) -> impl Iterator<Item = &str> {
        self.errors.keys().map(String::as_str)
    }

    pub fn declares_behavior(&self, name: &str) -> bool {
        self.behaviors.contains(name)
    }

    pub fn behaviors(&self) -> impl Iterator<Item = &str> {
        self.behaviors.iter().map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty() && self.behaviors.is_empty()
    }
}

fn invalid_section(section: &str, entry: &str) -> InitError {
    InitError::invalid_settings(format!("Invalid {} entry: {}", section, entry)).with_key(entry)
}
