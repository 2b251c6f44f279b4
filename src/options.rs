//! Parse configuration.
//!
//! [`ParseOptions`] can be built in code or deserialized from any serde
//! format; missing fields take their defaults.

use serde::{Deserialize, Serialize};

fn default_max_nesting() -> usize {
    256
}

fn default_source_name() -> String {
    "<fragment>".to_string()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParseOptions {
    /// Deepest parenthesis nesting accepted (default: 256). Checked before
    /// the grammar runs, so pathological input fails fast instead of
    /// recursing.
    #[serde(default = "default_max_nesting")]
    pub max_nesting: usize,

    /// Reject matches that leave anything but noise and line breaks behind
    /// (default: false).
    #[serde(default)]
    pub require_complete: bool,

    /// Name shown for the input in diagnostics (default: `<fragment>`)
    #[serde(default = "default_source_name")]
    pub source_name: String,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            max_nesting: default_max_nesting(),
            require_complete: false,
            source_name: default_source_name(),
        }
    }
}

impl ParseOptions {
    pub fn complete(mut self) -> Self {
        self.require_complete = true;
        self
    }

    pub fn with_max_nesting(mut self, limit: usize) -> Self {
        self.max_nesting = limit;
        self
    }

    pub fn named(mut self, source_name: impl Into<String>) -> Self {
        self.source_name = source_name.into();
        self
    }
}
