//! # Code Generation
//!
//! Target backends and the registry that selects one by target identifier.

pub mod arduino;
mod compress;

pub use arduino::ArduinoTranspiler;
pub use compress::compress;

use crate::error::{JbgcError, Result};
use crate::graph::Project;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Default ceiling for statement and expression nesting, counted together.
///
/// Low enough that a breach is reported before a 2 MiB thread stack runs out
/// in an unoptimized build.
pub const DEFAULT_MAX_DEPTH: usize = 64;

/// Output formatting.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CodeStyle {
    /// Indented, with explanatory comments
    #[default]
    Natural,
    /// The natural output with comments and insignificant whitespace removed
    Compressed,
}

impl fmt::Display for CodeStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CodeStyle::Natural => f.write_str("natural"),
            CodeStyle::Compressed => f.write_str("compressed"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TranspileOptions {
    pub style: CodeStyle,
    /// Timestamp written to the header. Falls back to the project's last save time.
    pub exported_at: Option<String>,
    pub max_depth: usize,
}

impl Default for TranspileOptions {
    fn default() -> Self {
        Self {
            style: CodeStyle::Natural,
            exported_at: None,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

impl TranspileOptions {
    pub fn with_style(mut self, style: CodeStyle) -> Self {
        self.style = style;
        self
    }

    pub fn with_exported_at(mut self, exported_at: impl Into<String>) -> Self {
        self.exported_at = Some(exported_at.into());
        self
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }
}

/// A code generation backend for one target language.
///
/// Implementations hold no state between calls and may be shared across threads.
pub trait Transpiler: Send + Sync {
    /// Canonical target identifier, e.g. `.ino`
    fn target(&self) -> &str;

    /// Other identifiers that select this backend
    fn aliases(&self) -> &[&str] {
        &[]
    }

    fn transpile(&self, project: &Project, options: &TranspileOptions) -> Result<String>;
}

/// Backends keyed by target identifier
#[derive(Clone)]
pub struct TranspilerRegistry {
    transpilers: HashMap<String, Arc<dyn Transpiler>>,
}

impl TranspilerRegistry {
    /// An empty registry
    pub fn new() -> Self {
        Self {
            transpilers: HashMap::new(),
        }
    }

    /// Registry with every built-in backend
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(ArduinoTranspiler);
        registry
    }

    /// Register a backend under its target and aliases, replacing any previous owner
    pub fn register<T: Transpiler + 'static>(&mut self, transpiler: T) {
        let transpiler: Arc<dyn Transpiler> = Arc::new(transpiler);
        let mut keys = vec![transpiler.target().to_string()];
        keys.extend(transpiler.aliases().iter().map(|alias| alias.to_string()));

        for key in keys {
            tracing::debug!("[JBGC] Registered transpiler for '{}'", key);
            self.transpilers.insert(key, Arc::clone(&transpiler));
        }
    }

    pub fn get(&self, target: &str) -> Result<Arc<dyn Transpiler>> {
        self.transpilers
            .get(target)
            .cloned()
            .ok_or_else(|| JbgcError::UnknownTarget(target.to_string()))
    }

    /// Every registered identifier, sorted
    pub fn targets(&self) -> Vec<&str> {
        let mut targets: Vec<&str> = self.transpilers.keys().map(String::as_str).collect();
        targets.sort_unstable();
        targets
    }

    pub fn transpile(&self, target: &str, project: &Project, options: &TranspileOptions) -> Result<String> {
        self.get(target)?.transpile(project, options)
    }
}

impl Default for TranspilerRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}
