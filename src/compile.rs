//! Content body compilation: Markdown with MDX-style components → HTML.
//!
//! Bodies are CommonMark (plus tables, footnotes, strikethrough and task
//! lists) with a small set of capitalised component tags layered on top:
//!
//! ```text
//! <Callout type="note">
//!
//! Varnish needs **two weeks** before it can be moved.
//!
//! </Callout>
//!
//! <Artwork src="/images/portfolio/harbour.jpg" alt="Harbour at dusk" />
//! ```
//!
//! Lowercase HTML passes through untouched. Component tags are checked and
//! lowered to ordinary elements carrying a `data-component` attribute, so the
//! stylesheet can target them without any client-side runtime.
//!
//! Component tags are lowered before the Markdown parser runs, so attribute
//! values written as expressions (`id={"abc123"}`) work even though
//! CommonMark would not read such a tag as HTML. Tags inside fenced code
//! blocks and code spans are left as text.
//!
//! Compilation fails when a component is unknown, left open, closed out of
//! order, or when a tag never reaches its `>`.
//!
//! The repository only knows the [`Compiler`] trait; [`MdxCompiler`] is the
//! implementation the site runs with.

use maud::html;
use pulldown_cmark::{Options, Parser, html as md_html};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum CompileError {
    #[error("line {line}: unknown component <{name}>")]
    UnknownComponent { name: String, line: usize },
    #[error("line {line}: <{name}> is never closed")]
    UnclosedComponent { name: String, line: usize },
    #[error("line {line}: found </{found}> but the innermost open component is {expected}")]
    MismatchedClosingTag {
        expected: String,
        found: String,
        line: usize,
    },
    #[error("line {line}: <{name}> cannot have children, write <{name} />")]
    VoidComponentNotSelfClosed { name: String, line: usize },
    #[error("line {line}: component tag is missing its closing `>`")]
    UnterminatedTag { line: usize },
    #[error("line {line}: malformed attribute in <{name}>")]
    MalformedAttribute { name: String, line: usize },
}

/// Output of a successful compilation.
#[derive(Debug, Clone, PartialEq)]
pub struct Compiled {
    /// Rendered HTML, safe to embed as-is.
    pub html: String,
    /// Components used by the body, in order of first appearance.
    pub components: Vec<String>,
}

/// Turns a content body into renderable output.
pub trait Compiler {
    fn compile(&self, body: &str) -> Result<Compiled, CompileError>;
}

/// Markdown + component compiler used by the site.
#[derive(Debug, Clone, Default)]
pub struct MdxCompiler;

impl Compiler for MdxCompiler {
    fn compile(&self, body: &str) -> Result<Compiled, CompileError> {
        let mut lowering = Lowering::new(body);
        let source = lowering.lower_document(body)?;
        lowering.finish()?;

        let mut out = String::with_capacity(source.len() * 3 / 2);
        md_html::push_html(&mut out, Parser::new_ext(&source, markdown_options()));

        Ok(Compiled {
            html: out,
            components: lowering.used,
        })
    }
}

fn markdown_options() -> Options {
    Options::ENABLE_TABLES
        | Options::ENABLE_FOOTNOTES
        | Options::ENABLE_STRIKETHROUGH
        | Options::ENABLE_TASKLISTS
}

fn line_starts(text: &str) -> Vec<usize> {
    std::iter::once(0)
        .chain(text.match_indices('\n').map(|(i, _)| i + 1))
        .collect()
}

// ============================================================================
// Component table
// ============================================================================

#[derive(Debug)]
struct ComponentDef {
    name: &'static str,
    element: &'static str,
    class: &'static str,
    void: bool,
}

const COMPONENTS: &[ComponentDef] = &[
    ComponentDef {
        name: "Callout",
        element: "aside",
        class: "callout",
        void: false,
    },
    ComponentDef {
        name: "Figure",
        element: "figure",
        class: "figure",
        void: false,
    },
    ComponentDef {
        name: "Gallery",
        element: "div",
        class: "gallery",
        void: false,
    },
    ComponentDef {
        name: "Artwork",
        element: "img",
        class: "artwork",
        void: true,
    },
    ComponentDef {
        name: "YouTube",
        element: "iframe",
        class: "video",
        void: true,
    },
];

fn lookup(name: &str) -> Option<&'static ComponentDef> {
    COMPONENTS.iter().find(|c| c.name == name)
}

// ============================================================================
// Tag scanning
// ============================================================================

#[derive(Debug, PartialEq)]
struct Tag {
    name: String,
    closing: bool,
    self_closing: bool,
    attrs: Vec<(String, Option<String>)>,
}

#[derive(Debug, PartialEq)]
enum Scan {
    Complete { tag: Tag, len: usize },
    Incomplete,
    Malformed { name: String },
}

/// Scan one tag starting at the `<` at the beginning of `s`.
fn scan_tag(s: &str) -> Scan {
    let bytes = s.as_bytes();
    let mut i = 1;
    let closing = bytes.get(i) == Some(&b'/');
    if closing {
        i += 1;
    }

    let name_start = i;
    while i < bytes.len() && (bytes[i].is_ascii_alphanumeric() || bytes[i] == b'_' || bytes[i] == b'.') {
        i += 1;
    }
    let name = s[name_start..i].to_string();

    let mut attrs = Vec::new();
    loop {
        while i < bytes.len() && bytes[i].is_ascii_whitespace() {
            i += 1;
        }
        match bytes.get(i) {
            None => return Scan::Incomplete,
            Some(b'>') => {
                let tag = Tag {
                    name,
                    closing,
                    self_closing: false,
                    attrs,
                };
                return Scan::Complete { tag, len: i + 1 };
            }
            Some(b'/') => match bytes.get(i + 1) {
                None => return Scan::Incomplete,
                Some(b'>') => {
                    let tag = Tag {
                        name,
                        closing,
                        self_closing: true,
                        attrs,
                    };
                    return Scan::Complete { tag, len: i + 2 };
                }
                Some(_) => return Scan::Malformed { name },
            },
            Some(_) if closing => return Scan::Malformed { name },
            Some(_) => {}
        }

        let attr_start = i;
        while i < bytes.len() && !matches!(bytes[i], b'=' | b'>' | b'/') && !bytes[i].is_ascii_whitespace() {
            i += 1;
        }
        let attr = s[attr_start..i].to_string();
        if attr.is_empty() {
            return Scan::Malformed { name };
        }

        while i < bytes.len() && bytes[i].is_ascii_whitespace() {
            i += 1;
        }
        if bytes.get(i) != Some(&b'=') {
            attrs.push((attr, None));
            continue;
        }
        i += 1;
        while i < bytes.len() && bytes[i].is_ascii_whitespace() {
            i += 1;
        }

        let value = match bytes.get(i) {
            None => return Scan::Incomplete,
            Some(&quote @ (b'"' | b'\'')) => {
                let Some(end) = s[i + 1..].find(quote as char) else {
                    return Scan::Incomplete;
                };
                let v = s[i + 1..i + 1 + end].to_string();
                i += end + 2;
                v
            }
            Some(b'{') => {
                let mut depth = 0usize;
                let mut end = None;
                for (j, b) in bytes.iter().enumerate().skip(i) {
                    match b {
                        b'{' => depth += 1,
                        b'}' => {
                            depth -= 1;
                            if depth == 0 {
                                end = Some(j);
                                break;
                            }
                        }
                        _ => {}
                    }
                }
                let Some(end) = end else {
                    return Scan::Incomplete;
                };
                let v = expression_value(&s[i + 1..end]);
                i = end + 1;
                v
            }
            Some(_) => {
                let start = i;
                while i < bytes.len() && bytes[i] != b'>' && !bytes[i].is_ascii_whitespace() {
                    i += 1;
                }
                s[start..i].to_string()
            }
        };
        attrs.push((attr, Some(value)));
    }
}

/// `{"text"}` → `text`, `{42}` → `42`, anything else verbatim.
fn expression_value(expr: &str) -> String {
    let expr = expr.trim();
    for quote in ['"', '\'', '`'] {
        if let Some(inner) = expr
            .strip_prefix(quote)
            .and_then(|rest| rest.strip_suffix(quote))
        {
            return inner.to_string();
        }
    }
    expr.to_string()
}

/// Whether the bytes after a `<` start a component tag (`<Name` or `</Name`).
fn opens_component(rest: &[u8]) -> bool {
    match rest {
        [b'/', c, ..] => c.is_ascii_uppercase(),
        [c, ..] => c.is_ascii_uppercase(),
        [] => false,
    }
}

/// Opening run of a fenced code block, if `line` starts one.
fn fence_marker(line: &str) -> Option<&str> {
    ['`', '~'].into_iter().find_map(|c| {
        let n = line.chars().take_while(|&x| x == c).count();
        (n >= 3).then(|| &line[..n])
    })
}

/// Offset of the backtick run closing a code span of `run` backticks.
/// Code spans never cross a blank line.
fn closing_ticks(rest: &str, run: usize) -> Option<usize> {
    let limit = rest.find("\n\n").unwrap_or(rest.len());
    let bytes = &rest.as_bytes()[..limit];
    let mut j = 0;
    while j < bytes.len() {
        if bytes[j] == b'`' {
            let n = bytes[j..].iter().take_while(|&&b| b == b'`').count();
            if n == run {
                return Some(j);
            }
            j += n;
        } else {
            j += 1;
        }
    }
    None
}

// ============================================================================
// Lowering
// ============================================================================

struct Lowering {
    line_starts: Vec<usize>,
    stack: Vec<(&'static ComponentDef, usize)>,
    used: Vec<String>,
}

impl Lowering {
    fn new(body: &str) -> Self {
        Self {
            line_starts: line_starts(body),
            stack: Vec::new(),
            used: Vec::new(),
        }
    }

    fn line_at(&self, offset: usize) -> usize {
        self.line_starts.partition_point(|&s| s <= offset)
    }

    /// Replace every component tag outside code with its HTML element.
    fn lower_document(&mut self, body: &str) -> Result<String, CompileError> {
        let bytes = body.as_bytes();
        let mut out = String::with_capacity(body.len());
        let mut copied = 0;
        let mut fence: Option<&str> = None;
        let mut i = 0;
        let mut line_start = true;

        while i < bytes.len() {
            if line_start {
                let line_end = body[i..].find('\n').map_or(body.len(), |n| i + n + 1);
                let trimmed = body[i..line_end].trim_start_matches(' ');
                match fence {
                    Some(open) => {
                        if trimmed.starts_with(open) {
                            fence = None;
                        }
                        i = line_end;
                        continue;
                    }
                    None => {
                        if let Some(marker) = fence_marker(trimmed) {
                            fence = Some(marker);
                            i = line_end;
                            continue;
                        }
                    }
                }
                line_start = false;
            }

            match bytes[i] {
                b'\n' => {
                    line_start = true;
                    i += 1;
                }
                b'`' => {
                    let run = bytes[i..].iter().take_while(|&&b| b == b'`').count();
                    i += match closing_ticks(&body[i + run..], run) {
                        Some(end) => run + end + run,
                        None => run,
                    };
                }
                b'<' if opens_component(&bytes[i + 1..]) => {
                    let line = self.line_at(i);
                    match scan_tag(&body[i..]) {
                        Scan::Incomplete => return Err(CompileError::UnterminatedTag { line }),
                        Scan::Malformed { name } => {
                            return Err(CompileError::MalformedAttribute { name, line });
                        }
                        Scan::Complete { tag, len } => {
                            out.push_str(&body[copied..i]);
                            out.push_str(&self.emit(tag, line)?);
                            i += len;
                            copied = i;
                        }
                    }
                }
                _ => i += 1,
            }
        }
        out.push_str(&body[copied..]);
        Ok(out)
    }

    fn emit(&mut self, tag: Tag, line: usize) -> Result<String, CompileError> {
        let spec = lookup(&tag.name).ok_or_else(|| CompileError::UnknownComponent {
            name: tag.name.clone(),
            line,
        })?;

        if tag.closing {
            return match self.stack.pop() {
                Some((open, _)) if open.name == spec.name => Ok(format!("</{}>", spec.element)),
                Some((open, _)) => Err(CompileError::MismatchedClosingTag {
                    expected: format!("<{}>", open.name),
                    found: tag.name,
                    line,
                }),
                None => Err(CompileError::MismatchedClosingTag {
                    expected: "none".to_string(),
                    found: tag.name,
                    line,
                }),
            };
        }

        if !self.used.iter().any(|n| n == spec.name) {
            self.used.push(spec.name.to_string());
        }

        if spec.void {
            if !tag.self_closing {
                return Err(CompileError::VoidComponentNotSelfClosed {
                    name: tag.name,
                    line,
                });
            }
            return Ok(render_void(spec, &tag.attrs));
        }

        let open = render_open(spec, &tag.attrs);
        if tag.self_closing {
            return Ok(format!("{open}</{}>", spec.element));
        }
        self.stack.push((spec, line));
        Ok(open)
    }

    fn finish(&mut self) -> Result<(), CompileError> {
        if let Some((spec, line)) = self.stack.pop() {
            return Err(CompileError::UnclosedComponent {
                name: spec.name.to_string(),
                line,
            });
        }
        Ok(())
    }
}

fn attr<'a>(attrs: &'a [(String, Option<String>)], key: &str) -> Option<&'a str> {
    attrs
        .iter()
        .find(|(k, _)| k == key)
        .and_then(|(_, v)| v.as_deref())
}

fn escape(value: &str) -> String {
    html! { (value) }.into_string()
}

fn render_open(spec: &ComponentDef, attrs: &[(String, Option<String>)]) -> String {
    let mut class = spec.class.to_string();
    if let Some(kind) = attr(attrs, "type") {
        class.push_str(&format!(" {}-{}", spec.class, escape(kind)));
    }

    let mut open = format!(
        r#"<{} class="{}" data-component="{}""#,
        spec.element, class, spec.name
    );
    for (key, value) in attrs.iter().filter(|(k, _)| k != "type") {
        let key: String = key
            .chars()
            .filter(|c| c.is_ascii_alphanumeric() || *c == '-')
            .collect::<String>()
            .to_ascii_lowercase();
        match value {
            Some(v) => open.push_str(&format!(r#" data-{key}="{}""#, escape(v))),
            None => open.push_str(&format!(" data-{key}")),
        }
    }
    open.push('>');
    open
}

fn render_void(spec: &ComponentDef, attrs: &[(String, Option<String>)]) -> String {
    match spec.name {
        "YouTube" => {
            let id = attr(attrs, "id").unwrap_or_default();
            let src = format!("https://www.youtube-nocookie.com/embed/{id}");
            let title = attr(attrs, "title").unwrap_or("Video");
            html! {
                iframe class=(spec.class) data-component=(spec.name) src=(src) title=(title)
                    loading="lazy" allowfullscreen {}
            }
            .into_string()
        }
        _ => {
            let src = attr(attrs, "src").unwrap_or_default();
            let alt = attr(attrs, "alt").unwrap_or_default();
            html! {
                img class=(spec.class) data-component=(spec.name) src=(src) alt=(alt) loading="lazy";
            }
            .into_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn compile(body: &str) -> Result<Compiled, CompileError> {
        MdxCompiler.compile(body)
    }

    #[test]
    fn plain_markdown_renders() {
        let out = compile("# Title\n\nSome **bold** and *italic*.").unwrap();
        assert!(out.html.contains("<h1>Title</h1>"));
        assert!(out.html.contains("<strong>bold</strong>"));
        assert!(out.html.contains("<em>italic</em>"));
        assert!(out.components.is_empty());
    }

    #[test]
    fn tables_enabled() {
        let out = compile("| a | b |\n|---|---|\n| 1 | 2 |\n").unwrap();
        assert!(out.html.contains("<table>"));
    }

    #[test]
    fn callout_lowered_with_markdown_inside() {
        let body = "<Callout type=\"note\">\n\nVarnish **later**.\n\n</Callout>\n";
        let out = compile(body).unwrap();
        assert!(out.html.contains(r#"<aside class="callout callout-note" data-component="Callout">"#));
        assert!(out.html.contains("<strong>later</strong>"));
        assert!(out.html.contains("</aside>"));
        assert_eq!(out.components, vec!["Callout"]);
    }

    #[test]
    fn void_component_renders_image() {
        let out = compile("<Artwork src=\"/img/a.jpg\" alt=\"Harbour\" />\n").unwrap();
        assert!(out.html.contains(r#"src="/img/a.jpg""#));
        assert!(out.html.contains(r#"alt="Harbour""#));
        assert!(out.html.contains(r#"data-component="Artwork""#));
    }

    #[test]
    fn expression_attribute_values() {
        let out = compile("<YouTube id={\"abc123\"} />\n").unwrap();
        assert!(out.html.contains("youtube-nocookie.com/embed/abc123"));
    }

    #[test]
    fn lowercase_html_passes_through() {
        let out = compile("<div class=\"x\">raw</div>\n").unwrap();
        assert!(out.html.contains(r#"<div class="x">raw</div>"#));
    }

    #[test]
    fn components_in_code_are_text() {
        let out = compile("```\n<Unknown>\n```\n\nand `<Nope />` inline").unwrap();
        assert!(out.html.contains("&lt;Unknown&gt;"));
        assert!(out.html.contains("&lt;Nope /&gt;"));
    }

    #[test]
    fn unknown_component_fails() {
        let err = compile("Intro\n\n<Carousel />\n").unwrap_err();
        assert_eq!(
            err,
            CompileError::UnknownComponent {
                name: "Carousel".into(),
                line: 3
            }
        );
    }

    #[test]
    fn unclosed_component_fails() {
        let err = compile("<Callout>\n\nNever closed.\n").unwrap_err();
        assert!(matches!(err, CompileError::UnclosedComponent { ref name, line: 1 } if name == "Callout"));
    }

    #[test]
    fn mismatched_closing_fails() {
        let err = compile("<Callout>\n\n<Figure>\n\ntext\n\n</Callout>\n\n</Figure>\n").unwrap_err();
        assert!(matches!(err, CompileError::MismatchedClosingTag { ref found, .. } if found == "Callout"));
    }

    #[test]
    fn stray_closing_fails() {
        let err = compile("text\n\n</Gallery>\n").unwrap_err();
        assert!(matches!(err, CompileError::MismatchedClosingTag { .. }));
    }

    #[test]
    fn void_component_with_children_fails() {
        let err = compile("<Artwork src=\"a.jpg\">\n").unwrap_err();
        assert!(matches!(err, CompileError::VoidComponentNotSelfClosed { .. }));
    }

    #[test]
    fn attribute_values_escaped() {
        let out = compile("<Figure caption=\"a &quot;b&quot; <c>\">\n\nx\n\n</Figure>\n").unwrap();
        assert!(!out.html.contains("<c>"));
        assert!(out.html.contains("data-caption="));
    }

    #[test]
    fn scan_tag_reads_attributes() {
        let scan = scan_tag("<Callout type=\"warn\" open>rest");
        let Scan::Complete { tag, len } = scan else {
            panic!("expected complete tag, got {scan:?}");
        };
        assert_eq!(tag.name, "Callout");
        assert_eq!(len, "<Callout type=\"warn\" open>".len());
        assert_eq!(
            tag.attrs,
            vec![
                ("type".to_string(), Some("warn".to_string())),
                ("open".to_string(), None)
            ]
        );
    }

    #[test]
    fn scan_tag_incomplete_at_end() {
        assert_eq!(scan_tag("<Callout type=\"warn"), Scan::Incomplete);
        assert_eq!(scan_tag("<Figure"), Scan::Incomplete);
    }

    #[test]
    fn tag_spanning_lines() {
        let out = compile("<Gallery\n  columns=\"3\">\n\nx\n\n</Gallery>\n").unwrap();
        assert!(out.html.contains(r#"data-columns="3""#));
        assert!(out.html.contains("</div>"));
    }

    #[test]
    fn expression_props_with_backticks() {
        let out = compile("Watch:\n\n<YouTube id={\"abc123\"} title={`Studio tour`} />\n").unwrap();
        assert!(out.html.contains("youtube-nocookie.com/embed/abc123"));
        assert!(out.html.contains(r#"title="Studio tour""#));
        assert!(!out.html.contains("&lt;YouTube"));
    }

    #[test]
    fn unknown_component_with_expression_prop_fails() {
        let err = compile("<Nope x={\"y\"} />\n").unwrap_err();
        assert_eq!(
            err,
            CompileError::UnknownComponent {
                name: "Nope".into(),
                line: 1
            }
        );
    }

    #[test]
    fn unterminated_tag_fails() {
        let err = compile("Intro\n\n<Artwork src={\"a.jpg\"\n").unwrap_err();
        assert_eq!(err, CompileError::UnterminatedTag { line: 3 });
    }

    #[test]
    fn tilde_fence_and_double_backtick_span_are_text() {
        let out = compile("~~~\n<Nope />\n~~~\n\nsee ``<Nope />`` here\n").unwrap();
        assert!(out.components.is_empty());
        assert!(out.html.contains("&lt;Nope /&gt;"));
    }
}
