//! YAML front matter codec.
//!
//! Decoding goes through serde_yaml so we accept any scalar metadata value
//! (numbers, booleans) and normalize it to a string. Encoding is done by
//! hand so the output layout is stable: `references` first, then `metadata`
//! in insertion order, two-space indentation, values quoted only when YAML
//! requires it.

use indexmap::IndexMap;
use serde::Deserialize;
use serde_yaml::Value;

use crate::model::FrontMatter;
use crate::parse::ParseError;

#[derive(Deserialize)]
struct RawFrontMatter {
    #[serde(default)]
    references: Vec<String>,
    #[serde(default)]
    metadata: IndexMap<String, Value>,
}

/// Split front matter off the top of a document.
///
/// Returns the decoded block (None if the document has no front matter)
/// and the remaining markdown body.
pub fn decode(content: &str) -> Result<(Option<FrontMatter>, &str), ParseError> {
    let Some(rest) = content.strip_prefix("---\n") else {
        return Ok((None, content));
    };

    let (yaml, body) = if let Some(body) = rest.strip_prefix("---\n") {
        ("", body)
    } else if let Some(end) = rest.find("\n---\n") {
        (&rest[..end + 1], &rest[end + 5..])
    } else if let Some(yaml) = rest.strip_suffix("\n---") {
        (yaml, "")
    } else {
        return Err(ParseError::UnclosedFrontMatter);
    };

    if yaml.trim().is_empty() {
        return Ok((Some(FrontMatter::default()), body));
    }

    let raw: RawFrontMatter = serde_yaml::from_str(yaml)?;
    let mut metadata = IndexMap::new();
    for (key, value) in raw.metadata {
        let scalar = match value {
            Value::String(s) => s,
            Value::Number(n) => n.to_string(),
            Value::Bool(b) => b.to_string(),
            _ => return Err(ParseError::MetadataNotScalar { key }),
        };
        metadata.insert(key, scalar);
    }

    Ok((
        Some(FrontMatter {
            references: raw.references,
            metadata,
        }),
        body,
    ))
}

/// Render front matter as a self-contained block ending with the closing
/// `---` line. Empty or absent front matter renders as nothing.
pub fn encode(front_matter: Option<&FrontMatter>) -> String {
    let Some(fm) = front_matter else {
        return String::new();
    };
    if fm.is_empty() {
        return String::new();
    }

    let mut out = String::from("---\n");
    if !fm.references.is_empty() {
        out.push_str("references:\n");
        for reference in &fm.references {
            out.push_str("  - ");
            out.push_str(&yaml_scalar(reference));
            out.push('\n');
        }
    }
    if !fm.metadata.is_empty() {
        out.push_str("metadata:\n");
        for (key, value) in &fm.metadata {
            out.push_str("  ");
            out.push_str(key);
            out.push_str(": ");
            out.push_str(&yaml_scalar(value));
            out.push('\n');
        }
    }
    out.push_str("---\n");
    out
}

// Quote a scalar only when bare YAML would misread it.
fn yaml_scalar(value: &str) -> String {
    if !needs_quotes(value) {
        return value.to_string();
    }
    let mut quoted = String::with_capacity(value.len() + 2);
    quoted.push('"');
    for ch in value.chars() {
        match ch {
            '"' => quoted.push_str("\\\""),
            '\\' => quoted.push_str("\\\\"),
            '\n' => quoted.push_str("\\n"),
            '\r' => quoted.push_str("\\r"),
            '\t' => quoted.push_str("\\t"),
            c if c.is_control() => {
                quoted.push_str(&format!("\\u{:04x}", c as u32));
            }
            _ => quoted.push(ch),
        }
    }
    quoted.push('"');
    quoted
}

fn needs_quotes(value: &str) -> bool {
    if value.is_empty() {
        return true;
    }
    if value.chars().any(|c| c.is_control()) {
        return true;
    }
    if value.starts_with(char::is_whitespace) || value.ends_with(char::is_whitespace) {
        return true;
    }
    if value.contains(": ") || value.ends_with(':') || value.contains(" #") {
        return true;
    }
    if matches!(
        value.chars().next(),
        Some('#' | '&' | '*' | '!' | '|' | '>' | '\'' | '"' | '%' | '@' | '`' | '-' | '?' | '[' | ']' | '{' | '}')
    ) {
        return true;
    }
    matches!(
        value,
        "true" | "false" | "null" | "~" | "yes" | "no" | "on" | "off"
    ) || value.parse::<f64>().is_ok()
}
