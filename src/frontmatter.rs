//! Front-matter extraction.
//!
//! A content file is a YAML header fenced by `---` lines followed by the body:
//!
//! ```text
//! ---
//! title: Morning Light
//! publishedAt: 2024-06-01
//! tags: [oil, studies]
//! ---
//! The body starts here.
//! ```
//!
//! Files without an opening fence have no metadata; the whole text is body.
//! An opening fence with no closing fence is an error, since silently
//! treating the header as body would publish it.

use serde_yaml::{Mapping, Value};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum FrontMatterError {
    #[error("front matter opened with `---` but never closed")]
    Unterminated,
    #[error("front matter is not valid YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("front matter must be a mapping of keys to values")]
    NotAMapping,
}

/// A content file split into its metadata header and body text.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Document {
    pub data: Mapping,
    pub body: String,
}

const FENCE: &str = "---";

/// Split `source` into front matter and body.
pub fn parse(source: &str) -> Result<Document, FrontMatterError> {
    let source = source.strip_prefix('\u{feff}').unwrap_or(source);

    let mut lines = source.split_inclusive('\n');
    let Some(first) = lines.next() else {
        return Ok(Document::default());
    };
    if first.trim_end() != FENCE {
        return Ok(Document {
            data: Mapping::new(),
            body: source.to_string(),
        });
    }

    let mut yaml = String::new();
    let mut consumed = first.len();
    let mut closed = false;
    for line in lines {
        consumed += line.len();
        if line.trim_end() == FENCE {
            closed = true;
            break;
        }
        yaml.push_str(line);
    }
    if !closed {
        return Err(FrontMatterError::Unterminated);
    }

    if yaml.trim().is_empty() {
        return Ok(Document {
            data: Mapping::new(),
            body: source[consumed..].to_string(),
        });
    }

    let data = match serde_yaml::from_str::<Value>(&yaml)? {
        Value::Mapping(map) => map,
        Value::Null => Mapping::new(),
        _ => return Err(FrontMatterError::NotAMapping),
    };

    Ok(Document {
        data,
        body: source[consumed..].to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn get<'a>(doc: &'a Document, key: &str) -> Option<&'a Value> {
        doc.data.get(key)
    }

    #[test]
    fn splits_header_and_body() {
        let doc = parse("---\ntitle: Hello\n---\nBody text\n").unwrap();
        assert_eq!(get(&doc, "title").and_then(Value::as_str), Some("Hello"));
        assert_eq!(doc.body, "Body text\n");
    }

    #[test]
    fn no_fence_means_no_metadata() {
        let doc = parse("# Just markdown\n\nText.").unwrap();
        assert!(doc.data.is_empty());
        assert_eq!(doc.body, "# Just markdown\n\nText.");
    }

    #[test]
    fn empty_header_is_allowed() {
        let doc = parse("---\n---\nBody").unwrap();
        assert!(doc.data.is_empty());
        assert_eq!(doc.body, "Body");
    }

    #[test]
    fn crlf_line_endings() {
        let doc = parse("---\r\ntitle: Win\r\n---\r\nBody\r\n").unwrap();
        assert_eq!(get(&doc, "title").and_then(Value::as_str), Some("Win"));
        assert_eq!(doc.body, "Body\r\n");
    }

    #[test]
    fn byte_order_mark_ignored() {
        let doc = parse("\u{feff}---\ntitle: BOM\n---\n").unwrap();
        assert_eq!(get(&doc, "title").and_then(Value::as_str), Some("BOM"));
    }

    #[test]
    fn nested_values_survive() {
        let doc = parse("---\nimages:\n  main: /a.jpg\n  gallery: [/b.jpg]\n---\n").unwrap();
        let images = get(&doc, "images").unwrap();
        assert_eq!(images.get("main").and_then(Value::as_str), Some("/a.jpg"));
    }

    #[test]
    fn unterminated_header_is_error() {
        let err = parse("---\ntitle: Oops\nno closing fence").unwrap_err();
        assert!(matches!(err, FrontMatterError::Unterminated));
    }

    #[test]
    fn scalar_header_is_error() {
        let err = parse("---\njust a string\n---\n").unwrap_err();
        assert!(matches!(err, FrontMatterError::NotAMapping));
    }

    #[test]
    fn invalid_yaml_is_error() {
        let err = parse("---\ntitle: [unclosed\n---\n").unwrap_err();
        assert!(matches!(err, FrontMatterError::Yaml(_)));
    }

    #[test]
    fn horizontal_rule_in_body_untouched() {
        let doc = parse("---\ntitle: T\n---\nabove\n---\nbelow\n").unwrap();
        assert_eq!(doc.body, "above\n---\nbelow\n");
    }
}
