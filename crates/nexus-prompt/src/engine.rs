//! Prompt rendering

use crate::{Metadata, PromptDocument, PromptError, PromptStore, Result};
use minijinja::Environment;
use minijinja::value::Value;
use tracing::{debug, info};

/// Version used when none is requested
pub const LATEST: &str = "latest";

/// Renders versioned prompt documents from a [`PromptStore`]
///
/// Templates are rendered with `trim_blocks` and `lstrip_blocks` enabled, so
/// block tags on their own line leave no blank lines behind. Undefined
/// variables render as empty strings.
pub struct PromptEngine {
    store: Box<dyn PromptStore>,
    env: Environment<'static>,
}

impl PromptEngine {
    /// Create an engine over `store`
    pub fn new(store: impl PromptStore + 'static) -> Self {
        let mut env = Environment::new();
        env.set_trim_blocks(true);
        env.set_lstrip_blocks(true);

        Self {
            store: Box::new(store),
            env,
        }
    }

    /// Fetch a document and split it into `(body, metadata)`
    pub fn get(&self, name: &str, version: &str) -> Result<(String, Metadata)> {
        let raw = self.store.load(name, version)?;
        let document = PromptDocument::parse(&raw);
        Ok((document.body, document.metadata))
    }

    /// Render the `latest` version of `name`
    pub fn render(&self, name: &str, vars: &serde_json::Value) -> Result<String> {
        self.render_version(name, LATEST, vars)
    }

    /// Render a specific version of `name`
    ///
    /// Either the whole rendered text is returned or an error; a template that
    /// fails halfway never yields partial output.
    pub fn render_version(
        &self,
        name: &str,
        version: &str,
        vars: &serde_json::Value,
    ) -> Result<String> {
        let (body, metadata) = self.get(name, version)?;

        let resolved_version = metadata
            .get("version")
            .map_or_else(|| version.to_string(), display_value);
        info!(template = name, version = %resolved_version, "Rendering prompt");

        let rendered = self
            .env
            .render_str(&body, Value::from_serialize(vars))
            .map_err(|e| PromptError::RenderError {
                name: name.to_string(),
                detail: e.to_string(),
            })?;

        debug!(template = name, chars = rendered.chars().count(), "Prompt rendered");
        Ok(rendered)
    }
}

impl std::fmt::Debug for PromptEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PromptEngine").finish_non_exhaustive()
    }
}

fn display_value(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
