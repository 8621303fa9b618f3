//! Theme source: the HTML subset theme files are written in.
//!
//! A theme is body content, optionally wrapped in `<body style="...">` to
//! carry the document-wide default style. Any element with a `component`
//! attribute becomes an atomic [`Component`]; its text content is the
//! rendered value, unless `attribute="name"` redirects the value to that
//! attribute.

mod cursor;

use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::Regex;

use crate::editing::{Component, ComponentOptions, Container, Document, NodeId, NodeKind, StyleMap};
use cursor::Cursor;

/// Elements that never have content or a closing tag
const VOID_ELEMENTS: &[&str] = &["br", "hr", "img", "input", "link", "meta", "wbr"];

static ATTRIBUTE_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"([A-Za-z_:][-A-Za-z0-9_:.]*)(?:\s*=\s*(?:"([^"]*)"|'([^']*)'|([^\s"'=<>`]+)))?"#)
        .expect("attribute pattern is valid")
});

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MarkupError {
    #[error("unexpected closing tag </{tag}> at byte {at}")]
    UnexpectedClose { tag: String, at: usize },
    #[error("<{tag}> opened at byte {at} is never closed")]
    Unclosed { tag: String, at: usize },
    #[error("component <{tag}> at byte {at} contains elements")]
    ComponentWithChildren { tag: String, at: usize },
    #[error("malformed attributes in <{tag}> at byte {at}")]
    BadAttributes { tag: String, at: usize },
    #[error("unterminated tag or comment at byte {0}")]
    Unterminated(usize),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MarkupOptions {
    /// Write component `title` attributes (display-only hover text)
    pub include_titles: bool,
}

impl Default for MarkupOptions {
    fn default() -> Self {
        Self {
            include_titles: true,
        }
    }
}

/// Parse theme source into a fresh document
pub fn parse(source: &str) -> Result<Document, MarkupError> {
    Parser::new(source).run()
}

/// Write a document back as theme source
pub fn serialize(doc: &Document, options: &MarkupOptions) -> String {
    let mut out = String::new();
    let root = doc.root();
    let body_style = doc.style(root).filter(|style| !style.is_empty());

    if let Some(style) = body_style {
        out.push_str("<body");
        push_attribute(&mut out, "style", &format_style(style));
        out.push('>');
    }
    for &child in doc.children(root) {
        write_node(doc, child, options, &mut out);
    }
    if body_style.is_some() {
        out.push_str("</body>");
    }
    out
}

/// `color: red; font-size: 12px` → map; declarations without a value are skipped
pub fn parse_style(source: &str) -> StyleMap {
    source
        .split(';')
        .filter_map(|declaration| {
            let (property, value) = declaration.split_once(':')?;
            let (property, value) = (property.trim(), value.trim());
            (!property.is_empty() && !value.is_empty())
                .then(|| (property.to_ascii_lowercase(), value.to_string()))
        })
        .collect()
}

pub fn format_style(style: &StyleMap) -> String {
    style
        .iter()
        .map(|(property, value)| format!("{property}: {value};"))
        .collect::<Vec<_>>()
        .join(" ")
}

enum Frame {
    Body { at: usize },
    Container { node: NodeId, tag: String, at: usize },
    Component { node: NodeId, tag: String, at: usize, value: String },
}

struct Parser<'a> {
    cur: Cursor<'a>,
    doc: Document,
    stack: Vec<Frame>,
    saw_body: bool,
    /// Top-level text found outside an explicit `<body>`
    loose_text: Vec<NodeId>,
}

impl<'a> Parser<'a> {
    fn new(source: &'a str) -> Self {
        Self {
            cur: Cursor::new(source),
            doc: Document::new(),
            stack: Vec::new(),
            saw_body: false,
            loose_text: Vec::new(),
        }
    }

    fn run(mut self) -> Result<Document, MarkupError> {
        while !self.cur.eof() {
            if self.cur.starts_with(b"<!--") {
                let at = self.cur.i;
                self.cur
                    .take_until("-->")
                    .ok_or(MarkupError::Unterminated(at))?;
                self.cur.bump_n(3);
            } else if self.cur.starts_with(b"<!") || self.cur.starts_with(b"<?") {
                let at = self.cur.i;
                self.cur.take_tag_body().ok_or(MarkupError::Unterminated(at))?;
            } else if self.cur.starts_with(b"</") {
                self.close_tag()?;
            } else if self.cur.starts_with(b"<") {
                if self.cur.peek_next().is_some_and(|b| b.is_ascii_alphabetic()) {
                    self.open_tag()?;
                } else {
                    self.cur.bump_n(1);
                    self.text("<");
                }
            } else {
                let raw = self.cur.take_text();
                self.text(raw);
            }
        }

        if let Some(frame) = self.stack.pop() {
            let (tag, at) = match frame {
                Frame::Body { at } => ("body".to_string(), at),
                Frame::Container { tag, at, .. } | Frame::Component { tag, at, .. } => (tag, at),
            };
            return Err(MarkupError::Unclosed { tag, at });
        }

        if self.saw_body {
            for node in self.loose_text {
                if self.doc.text(node).is_some_and(|t| t.trim().is_empty()) {
                    self.doc.detach(node);
                }
            }
        }

        log::debug!(
            "parsed theme source: {} components",
            self.doc.components().len()
        );
        Ok(self.doc)
    }

    fn current_parent(&self) -> NodeId {
        match self.stack.last() {
            Some(Frame::Container { node, .. }) => *node,
            _ => self.doc.root(),
        }
    }

    fn text(&mut self, raw: &str) {
        if raw.is_empty() {
            return;
        }
        let decoded = html_escape::decode_html_entities(raw);
        if let Some(Frame::Component { value, .. }) = self.stack.last_mut() {
            value.push_str(&decoded);
            return;
        }

        let top_level = self.stack.is_empty();
        let parent = self.current_parent();
        let node = self.doc.create_text(decoded.into_owned());
        self.doc.append_child(parent, node);
        if top_level {
            self.loose_text.push(node);
        }
    }

    fn open_tag(&mut self) -> Result<(), MarkupError> {
        let at = self.cur.i;
        self.cur.bump_n(1);
        let body = self.cur.take_tag_body().ok_or(MarkupError::Unterminated(at))?;
        let (body, self_closing) = match body.trim_end().strip_suffix('/') {
            Some(inner) => (inner, true),
            None => (body, false),
        };
        let name_end = body.find(char::is_whitespace).unwrap_or(body.len());
        let tag = body[..name_end].to_ascii_lowercase();
        let mut attributes = parse_attributes(&body[name_end..]).ok_or_else(|| {
            MarkupError::BadAttributes {
                tag: tag.clone(),
                at,
            }
        })?;

        if let Some(Frame::Component { tag, at, .. }) = self.stack.last() {
            return Err(MarkupError::ComponentWithChildren {
                tag: tag.clone(),
                at: *at,
            });
        }

        let has_content = !self_closing && !VOID_ELEMENTS.contains(&tag.as_str());

        if tag == "body" && self.stack.is_empty() && !self.saw_body {
            self.saw_body = true;
            let root = self.doc.root();
            if let Some(style) = attributes.get("style") {
                for (property, value) in parse_style(style) {
                    self.doc.set_style_property(root, &property, &value);
                }
            }
            if has_content {
                self.stack.push(Frame::Body { at });
            }
            return Ok(());
        }

        let parent = self.current_parent();
        let style = attributes
            .remove("style")
            .map(|s| parse_style(&s))
            .unwrap_or_default();

        if let Some(kind) = attributes.remove("component") {
            let mut component = Component::new(
                kind,
                ComponentOptions::parse(&attributes.remove("options").unwrap_or_default()),
                attributes.remove("title").unwrap_or_default(),
                "",
            );
            component.tag = tag.clone();
            component.style = style;
            if let Some(target) = attributes.remove("attribute") {
                component.value = attributes.remove(&target).unwrap_or_default();
                component.attribute = Some(target);
            }
            component.attributes = attributes;
            let node = self.doc.create_component(component);
            self.doc.append_child(parent, node);
            if has_content {
                self.stack.push(Frame::Component {
                    node,
                    tag,
                    at,
                    value: String::new(),
                });
            }
            return Ok(());
        }

        let node = self.doc.create_container(Container {
            tag: tag.clone(),
            style,
            attributes,
        });
        self.doc.append_child(parent, node);
        if has_content {
            self.stack.push(Frame::Container { node, tag, at });
        }
        Ok(())
    }

    fn close_tag(&mut self) -> Result<(), MarkupError> {
        let at = self.cur.i;
        self.cur.bump_n(2);
        let name = self
            .cur
            .take_tag_body()
            .ok_or(MarkupError::Unterminated(at))?
            .trim()
            .to_ascii_lowercase();

        match self.stack.pop() {
            Some(Frame::Body { .. }) if name == "body" => {}
            Some(Frame::Container { tag, .. }) if tag == name => {}
            Some(Frame::Component {
                node, tag, value, ..
            }) if tag == name => {
                if let Some(component) = self.doc.component_mut(node)
                    && component.attribute.is_none()
                {
                    component.value = value;
                }
            }
            _ => return Err(MarkupError::UnexpectedClose { tag: name, at }),
        }
        Ok(())
    }
}

/// Attribute list of a start tag; `None` when something other than
/// attributes and whitespace is present
fn parse_attributes(source: &str) -> Option<BTreeMap<String, String>> {
    let mut attributes = BTreeMap::new();
    let mut last = 0;
    for caps in ATTRIBUTE_PATTERN.captures_iter(source) {
        let whole = caps.get(0)?;
        if !source[last..whole.start()].trim().is_empty() {
            return None;
        }
        last = whole.end();

        let value = caps
            .get(2)
            .or_else(|| caps.get(3))
            .or_else(|| caps.get(4))
            .map_or("", |m| m.as_str());
        attributes.insert(
            caps[1].to_ascii_lowercase(),
            html_escape::decode_html_entities(value).into_owned(),
        );
    }
    source[last..].trim().is_empty().then_some(attributes)
}

fn push_attribute(out: &mut String, name: &str, value: &str) {
    out.push(' ');
    out.push_str(name);
    out.push_str("=\"");
    out.push_str(&html_escape::encode_double_quoted_attribute(value));
    out.push('"');
}

fn write_node(doc: &Document, id: NodeId, options: &MarkupOptions, out: &mut String) {
    match doc.kind(id) {
        NodeKind::Text(text) => out.push_str(&html_escape::encode_text(text)),
        NodeKind::Container(container) => {
            out.push('<');
            out.push_str(&container.tag);
            for (name, value) in &container.attributes {
                push_attribute(out, name, value);
            }
            if !container.style.is_empty() {
                push_attribute(out, "style", &format_style(&container.style));
            }
            out.push('>');
            if VOID_ELEMENTS.contains(&container.tag.as_str()) {
                return;
            }
            for &child in doc.children(id) {
                write_node(doc, child, options, out);
            }
            out.push_str(&format!("</{}>", container.tag));
        }
        NodeKind::Component(component) => {
            out.push('<');
            out.push_str(&component.tag);
            push_attribute(out, "component", &component.kind);
            if !component.options.is_empty() {
                push_attribute(out, "options", &component.options.to_source());
            }
            if options.include_titles && !component.title.is_empty() {
                push_attribute(out, "title", &component.title);
            }
            if let Some(target) = &component.attribute {
                push_attribute(out, "attribute", target);
                push_attribute(out, target, &component.value);
            }
            for (name, value) in &component.attributes {
                push_attribute(out, name, value);
            }
            if !component.style.is_empty() {
                push_attribute(out, "style", &format_style(&component.style));
            }
            out.push('>');
            if VOID_ELEMENTS.contains(&component.tag.as_str()) {
                return;
            }
            if component.attribute.is_none() {
                out.push_str(&html_escape::encode_text(&component.value));
            }
            out.push_str(&format!("</{}>", component.tag));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use insta::assert_snapshot;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    const THEME: &str = r#"<body style="font-family: Sans; font-size: 12px;">
<div class="time" style="text-align: center;"><span component="Hour" options="'alternative': true" title="Hour">21</span>:<span component="Minute" title="Minute">07</span></div>
<img component="Timezone" attribute="alt" alt="UTC" src="flag.png">
</body>"#;

    #[test]
    fn test_parse_theme() {
        let doc = parse(THEME).unwrap();

        assert_snapshot!(doc.format_tree(), @r#"
        body [font-family: Sans; font-size: 12px]
          text "\n"
          div [text-align: center]
            component Hour "21"
            text ":"
            component Minute "07"
          text "\n"
          component Timezone "UTC"
          text "\n"
        "#);
    }

    #[test]
    fn test_parse_component_fields() {
        let doc = parse(THEME).unwrap();
        let components = doc.components();
        let hour = doc.component(components[0]).unwrap();
        assert_eq!(hour.options.get("alternative"), Some("true"));
        assert_eq!(hour.title, "Hour");

        let zone = doc.component(components[2]).unwrap();
        assert_eq!(zone.tag, "img");
        assert_eq!(zone.attribute.as_deref(), Some("alt"));
        assert_eq!(zone.value, "UTC");
        assert_eq!(zone.attributes.get("src").map(String::as_str), Some("flag.png"));
    }

    #[test]
    fn test_serialize_round_trips() {
        let doc = parse(THEME).unwrap();
        let source = serialize(&doc, &MarkupOptions::default());
        let again = parse(&source).unwrap();

        assert_eq!(again.format_tree(), doc.format_tree());
        assert_eq!(serialize(&again, &MarkupOptions::default()), source);
    }

    #[test]
    fn test_serialize_output() {
        let mut doc = Document::new();
        let root = doc.root();
        let text = doc.create_text("Now: <soon> & ");
        let clock = doc.create_component(Component::new(
            "Time",
            "'short': true",
            "Time",
            "9:41",
        ));
        doc.append_child(root, text);
        doc.append_child(root, clock);

        assert_snapshot!(
            serialize(&doc, &MarkupOptions::default()),
            @r#"Now: &lt;soon&gt; &amp; <span component="Time" options="'short': true" title="Time">9:41</span>"#
        );
        assert_snapshot!(
            serialize(&doc, &MarkupOptions { include_titles: false }),
            @r#"Now: &lt;soon&gt; &amp; <span component="Time" options="'short': true">9:41</span>"#
        );
    }

    #[test]
    fn test_empty_options_are_omitted() {
        let doc = parse(r#"<span component="clock">12:00</span>"#).unwrap();
        let source = serialize(&doc, &MarkupOptions::default());
        assert_eq!(source, r#"<span component="clock">12:00</span>"#);
    }

    #[test]
    fn test_body_wrapper_only_with_default_style() {
        let doc = parse("<body>\n<b>x</b>\n</body>").unwrap();
        assert_eq!(serialize(&doc, &MarkupOptions::default()), "\n<b>x</b>\n");
    }

    #[test]
    fn test_stray_angle_bracket_is_text() {
        let doc = parse("a < b").unwrap();
        assert_eq!(doc.text_content(doc.root()), "a < b");
    }

    #[rstest]
    #[case::unexpected_close("x</span>", MarkupError::UnexpectedClose { tag: "span".into(), at: 1 })]
    #[case::mismatched("<b>x</i>", MarkupError::UnexpectedClose { tag: "i".into(), at: 4 })]
    #[case::unclosed("<span>x", MarkupError::Unclosed { tag: "span".into(), at: 0 })]
    #[case::nested_in_component(
        r#"<span component="Hour"><b>1</b></span>"#,
        MarkupError::ComponentWithChildren { tag: "span".into(), at: 0 }
    )]
    #[case::bad_attributes(r#"<span ="x">y</span>"#, MarkupError::BadAttributes { tag: "span".into(), at: 0 })]
    #[case::unterminated_tag(r#"<span title="a>"#, MarkupError::Unterminated(0))]
    #[case::unterminated_comment("<!-- x", MarkupError::Unterminated(0))]
    fn test_parse_errors(#[case] source: &str, #[case] expected: MarkupError) {
        assert_eq!(parse(source).unwrap_err(), expected);
    }

    #[rstest]
    #[case("color: red", &[("color", "red")])]
    #[case(" COLOR : red ; font-size:12px;", &[("color", "red"), ("font-size", "12px")])]
    #[case("broken; : x; y:", &[])]
    fn test_parse_style(#[case] source: &str, #[case] expected: &[(&str, &str)]) {
        let style = parse_style(source);
        let pairs: Vec<(&str, &str)> = style.iter().map(|(p, v)| (p.as_str(), v.as_str())).collect();
        assert_eq!(pairs, expected);
    }
}
