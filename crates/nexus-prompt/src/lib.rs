//! Versioned prompt templates for the Nexus bot
//!
//! Prompts are Markdown documents addressed by `{name}/{version}`. A document
//! may open with a YAML front matter block holding metadata; the rest is a
//! Jinja2 template rendered with MiniJinja.
//!
//! # Quick Start
//!
//! ```
//! use nexus_prompt::{MemoryStore, PromptEngine};
//! use serde_json::json;
//!
//! let store = MemoryStore::new().with_document(
//!     "greeting",
//!     "latest",
//!     "---\nversion: \"1.0\"\n---\nHello, {{ name }}!",
//! );
//! let engine = PromptEngine::new(store);
//!
//! let prompt = engine.render("greeting", &json!({ "name": "World" })).unwrap();
//! assert_eq!(prompt, "Hello, World!");
//!
//! let (_, metadata) = engine.get("greeting", "latest").unwrap();
//! assert_eq!(metadata["version"], "1.0");
//! ```

mod document;
mod engine;
mod error;
mod store;

pub use document::{Metadata, PromptDocument};
pub use engine::{LATEST, PromptEngine};
pub use error::{PromptError, Result};
pub use store::{FileStore, MemoryStore, PromptStore};
