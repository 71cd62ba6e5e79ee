//! Extension composition.
//!
//! An extension bundles element kinds and render overrides. Extensions are
//! registered in user order; later registrations shadow earlier ones for
//! the same (kind, renderer) pair. A loader resolves logical names through
//! an instance-owned factory table, so nothing global participates in a
//! parse.

use crate::error::{MarkdownError, Result};
use crate::registry::{BlockRule, InlineRule};
use crate::render::RenderOverride;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::sync::Arc;

/// Options passed to an extension factory.
pub type ExtensionOptions = Map<String, Value>;

/// A factory producing a configured extension, the `make_extension`
/// convention.
pub type ExtensionFactory = fn(&ExtensionOptions) -> Result<Extension>;

/// A bundle of element kinds and render overrides.
#[derive(Clone, Default, Debug)]
pub struct Extension {
    pub name: String,
    pub block_rules: Vec<Arc<dyn BlockRule>>,
    pub inline_rules: Vec<Arc<dyn InlineRule>>,
    pub render_overrides: Vec<RenderOverride>,
}

impl Extension {
    pub fn new(name: &str) -> Self {
        Extension {
            name: name.to_string(),
            ..Extension::default()
        }
    }

    pub fn with_block_rule(mut self, rule: Arc<dyn BlockRule>) -> Self {
        self.block_rules.push(rule);
        self
    }

    pub fn with_inline_rule(mut self, rule: Arc<dyn InlineRule>) -> Self {
        self.inline_rules.push(rule);
        self
    }

    pub fn with_render_override(mut self, entry: RenderOverride) -> Self {
        self.render_overrides.push(entry);
        self
    }
}

/// Resolves logical extension names to extension bundles.
#[derive(Clone, Default)]
pub struct ExtensionLoader {
    factories: HashMap<String, ExtensionFactory>,
}

impl ExtensionLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, name: &str, factory: ExtensionFactory) {
        self.factories.insert(name.to_string(), factory);
    }

    /// Load an extension by logical name. Dotted names resolve by their
    /// last segment.
    pub fn load(&self, name: &str, options: &ExtensionOptions) -> Result<Extension> {
        let key = name.rsplit('.').next().unwrap_or(name);
        match self.factories.get(key) {
            Some(factory) => factory(options),
            None => Err(MarkdownError::Extension {
                message: format!("extension '{}' cannot be found", name),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn empty_factory(_options: &ExtensionOptions) -> Result<Extension> {
        Ok(Extension::new("noop"))
    }

    #[test]
    fn loader_resolves_registered_names() {
        let mut loader = ExtensionLoader::new();
        loader.register("noop", empty_factory);
        assert!(loader.load("noop", &ExtensionOptions::new()).is_ok());
        assert!(loader.load("ext.path.noop", &ExtensionOptions::new()).is_ok());
    }

    #[test]
    fn loader_reports_unknown_names() {
        let loader = ExtensionLoader::new();
        let error = loader
            .load("missing", &ExtensionOptions::new())
            .expect_err("unknown extension");
        assert!(format!("{}", error).contains("missing"));
    }
}
