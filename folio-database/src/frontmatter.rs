//! Markdown front matter codec
//!
//! A markdown document is a YAML mapping between `---` lines followed by the
//! body:
//!
//! ```markdown
//! ---
//! title: Hi
//! ---
//! Hello
//! ```
//!
//! The body is everything after the closing delimiter, byte for byte.
//! Delimiter lines may end in `\r\n`, and the closing one may end the file.

use serde_json::{Map, Value};

use crate::error::{DatabaseError, Result};

const DELIMITER: &str = "---";
const NEWLINE: &str = "\n";

/// Parsed front matter and body
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Frontmatter {
    /// Front matter keys in file order; empty if the file has none
    pub metadata: Map<String, Value>,
    /// Text after the closing delimiter (or the whole file without front matter)
    pub body: String,
}

/// Parse a markdown document.
///
/// Content without an opening delimiter is all body. An opening delimiter
/// without a closing one is an error.
pub fn parse_frontmatter(path: &str, content: &str) -> Result<Frontmatter> {
    let Some(rest) = opening_delimiter(content) else {
        return Ok(Frontmatter {
            metadata: Map::new(),
            body: content.to_string(),
        });
    };

    let (end, body_start) = find_closing_delimiter(rest)
        .ok_or_else(|| DatabaseError::frontmatter(path, "missing closing '---'"))?;
    let yaml = &rest[..end];
    let body = &rest[body_start..];

    let metadata = if yaml.trim().is_empty() {
        Map::new()
    } else {
        let value: serde_yaml_ng::Value = serde_yaml_ng::from_str(yaml)
            .map_err(|e| DatabaseError::frontmatter(path, e.to_string()))?;
        match serde_json::to_value(value)? {
            Value::Object(map) => map,
            Value::Null => Map::new(),
            other => {
                return Err(DatabaseError::frontmatter(
                    path,
                    format!("expected a mapping, found {}", json_kind(&other)),
                ))
            }
        }
    };

    Ok(Frontmatter {
        metadata,
        body: body.to_string(),
    })
}

/// Render front matter and body as a markdown document.
pub fn serialize_frontmatter(metadata: &Map<String, Value>, body: &str) -> Result<String> {
    let mut out = format!("{DELIMITER}{NEWLINE}");
    if !metadata.is_empty() {
        out.push_str(&serde_yaml_ng::to_string(metadata)?);
    }
    out.push_str(DELIMITER);
    out.push_str(NEWLINE);
    out.push_str(body);
    Ok(out)
}

/// Text after an opening `---` line, if the content starts with one.
fn opening_delimiter(content: &str) -> Option<&str> {
    let rest = content.strip_prefix(DELIMITER)?;
    rest.strip_prefix(NEWLINE)
        .or_else(|| rest.strip_prefix("\r\n"))
}

/// Start of the closing `---` line and start of the body after it.
fn find_closing_delimiter(rest: &str) -> Option<(usize, usize)> {
    let mut start = 0;
    loop {
        let newline = rest[start..].find('\n').map(|i| start + i);
        let line = &rest[start..newline.unwrap_or(rest.len())];
        if line.strip_suffix('\r').unwrap_or(line) == DELIMITER {
            return Some((start, newline.map_or(rest.len(), |i| i + 1)));
        }
        start = newline? + 1;
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "sequence",
        Value::Object(_) => "mapping",
    }
}
