//! Prompt documents and front matter parsing

use serde_json::{Map, Value};
use tracing::warn;

/// Front matter key/values
pub type Metadata = Map<String, Value>;

const DELIMITER: &str = "---";

/// A prompt split into its metadata and template body
#[derive(Debug, Clone, PartialEq)]
pub struct PromptDocument {
    /// Front matter, empty when the document has none
    pub metadata: Metadata,
    /// Jinja2 template source
    pub body: String,
}

impl PromptDocument {
    /// Split `raw` into front matter and body
    ///
    /// Front matter is recognised only when the first line is `---` and a later
    /// line closes it with `---`. The body after the closing delimiter is
    /// trimmed. A document without front matter, or whose front matter is not
    /// a YAML mapping, is used whole as the body.
    pub fn parse(raw: &str) -> Self {
        let Some((yaml, body)) = split_front_matter(raw) else {
            return Self::plain(raw);
        };

        match serde_yaml::from_str::<Value>(yaml) {
            Ok(Value::Object(metadata)) => Self {
                metadata,
                body: body.trim().to_string(),
            },
            Ok(Value::Null) => Self {
                metadata: Metadata::new(),
                body: body.trim().to_string(),
            },
            Ok(other) => {
                warn!("Front matter is not a mapping ({other}), using whole document");
                Self::plain(raw)
            }
            Err(e) => {
                warn!(error = %e, "Malformed front matter, using whole document");
                Self::plain(raw)
            }
        }
    }

    fn plain(raw: &str) -> Self {
        Self {
            metadata: Metadata::new(),
            body: raw.to_string(),
        }
    }
}

/// Returns `(yaml, body)` when `raw` carries a closed front matter block
fn split_front_matter(raw: &str) -> Option<(&str, &str)> {
    let rest = raw.strip_prefix('\u{feff}').unwrap_or(raw);
    let (first, mut rest) = rest.split_once('\n')?;
    if first.trim_end() != DELIMITER {
        return None;
    }

    let yaml_start = rest;
    let mut yaml_len = 0;
    loop {
        let (line, tail) = match rest.split_once('\n') {
            Some((line, tail)) => (line, tail),
            None => (rest, ""),
        };
        if line.trim_end() == DELIMITER {
            return Some((&yaml_start[..yaml_len], tail));
        }
        if tail.is_empty() && line.len() == rest.len() {
            return None;
        }
        yaml_len += line.len() + 1;
        rest = tail;
    }
}
