//! CLI output settings.

use serde::{Deserialize, Serialize};

const fn default_pretty() -> bool {
    true
}

const fn default_indent() -> usize {
    2
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct OutputConfig {
    /// Pretty-print JSON output.
    #[serde(default = "default_pretty")]
    pub pretty: bool,

    /// Spaces per level when pretty-printing.
    #[serde(default = "default_indent")]
    pub indent: usize,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            pretty: default_pretty(),
            indent: default_indent(),
        }
    }
}
