//! Markdown AST consumed by the renderers.
//!
//! The schema mirrors the JSON emitted by native markdown parsers: every node has a `type` tag,
//! optional leaf `content`, ordered `children`, and a handful of per-kind attributes. Nodes own
//! their children exclusively, so a tree can never contain cycles.
use serde::Deserialize;
use serde::Serialize;
use std::fmt;

/// Semantic role of a [`MarkdownNode`].
///
/// Unknown tags are preserved verbatim in [`NodeType::Other`] so that custom renderers can be
/// registered for experimental node kinds.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum NodeType {
    Document,
    Paragraph,
    Heading,
    Text,
    Strong,
    Emphasis,
    Strikethrough,
    Link,
    Image,
    CodeBlock,
    CodeInline,
    Blockquote,
    List,
    ListItem,
    TaskListItem,
    Table,
    TableHead,
    TableBody,
    TableRow,
    TableCell,
    MathInline,
    MathBlock,
    ThematicBreak,
    Softbreak,
    Hardbreak,
    WikiLink,
    HtmlBlock,
    HtmlInline,
    Underline,
    Other(String),
}

impl NodeType {
    pub fn parse(tag: &str) -> Self {
        match tag {
            "document" => Self::Document,
            "paragraph" => Self::Paragraph,
            "heading" => Self::Heading,
            "text" => Self::Text,
            "strong" => Self::Strong,
            "emphasis" => Self::Emphasis,
            "strikethrough" => Self::Strikethrough,
            "link" => Self::Link,
            "image" => Self::Image,
            "code_block" => Self::CodeBlock,
            "code_inline" => Self::CodeInline,
            "blockquote" => Self::Blockquote,
            "list" => Self::List,
            "list_item" => Self::ListItem,
            "task_list_item" => Self::TaskListItem,
            "table" => Self::Table,
            "table_head" => Self::TableHead,
            "table_body" => Self::TableBody,
            "table_row" => Self::TableRow,
            "table_cell" => Self::TableCell,
            "math_inline" => Self::MathInline,
            "math_block" => Self::MathBlock,
            "thematic_break" => Self::ThematicBreak,
            "softbreak" => Self::Softbreak,
            "hardbreak" => Self::Hardbreak,
            "wiki_link" => Self::WikiLink,
            "html_block" => Self::HtmlBlock,
            "html_inline" => Self::HtmlInline,
            "underline" => Self::Underline,
            other => Self::Other(other.to_string()),
        }
    }

    /// Wire name of this node type (`"code_block"`, `"table_cell"`, ...).
    pub fn as_str(&self) -> &str {
        match self {
            Self::Document => "document",
            Self::Paragraph => "paragraph",
            Self::Heading => "heading",
            Self::Text => "text",
            Self::Strong => "strong",
            Self::Emphasis => "emphasis",
            Self::Strikethrough => "strikethrough",
            Self::Link => "link",
            Self::Image => "image",
            Self::CodeBlock => "code_block",
            Self::CodeInline => "code_inline",
            Self::Blockquote => "blockquote",
            Self::List => "list",
            Self::ListItem => "list_item",
            Self::TaskListItem => "task_list_item",
            Self::Table => "table",
            Self::TableHead => "table_head",
            Self::TableBody => "table_body",
            Self::TableRow => "table_row",
            Self::TableCell => "table_cell",
            Self::MathInline => "math_inline",
            Self::MathBlock => "math_block",
            Self::ThematicBreak => "thematic_break",
            Self::Softbreak => "softbreak",
            Self::Hardbreak => "hardbreak",
            Self::WikiLink => "wiki_link",
            Self::HtmlBlock => "html_block",
            Self::HtmlInline => "html_inline",
            Self::Underline => "underline",
            Self::Other(tag) => tag.as_str(),
        }
    }
}

impl From<String> for NodeType {
    fn from(value: String) -> Self {
        match Self::parse(&value) {
            Self::Other(_) => Self::Other(value),
            known => known,
        }
    }
}

impl From<&str> for NodeType {
    fn from(value: &str) -> Self {
        Self::parse(value)
    }
}

impl From<NodeType> for String {
    fn from(value: NodeType) -> Self {
        match value {
            NodeType::Other(tag) => tag,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for NodeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TableCellAlign {
    Left,
    Center,
    Right,
    #[default]
    Default,
}

impl TableCellAlign {
    /// The host `textAlign` value, or `None` for [`TableCellAlign::Default`].
    pub fn text_align(self) -> Option<&'static str> {
        match self {
            Self::Left => Some("left"),
            Self::Center => Some("center"),
            Self::Right => Some("right"),
            Self::Default => None,
        }
    }
}

/// A node of the markdown tree.
///
/// Attributes are only meaningful for certain kinds: `level` for headings, `href`/`title` for
/// links, `src`/`alt`/`title` for images, `language` for code blocks, `ordered`/`start` for
/// lists, `checked` for task items and `align`/`is_header` for table cells.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarkdownNode {
    #[serde(rename = "type")]
    pub kind: NodeType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<MarkdownNode>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub level: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub href: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub src: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alt: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ordered: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub checked: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub align: Option<TableCellAlign>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_header: Option<bool>,
}

impl MarkdownNode {
    pub fn new(kind: impl Into<NodeType>) -> Self {
        Self {
            kind: kind.into(),
            content: None,
            children: Vec::new(),
            level: None,
            href: None,
            src: None,
            alt: None,
            title: None,
            language: None,
            ordered: None,
            start: None,
            checked: None,
            align: None,
            is_header: None,
        }
    }

    pub fn text(content: impl Into<String>) -> Self {
        Self::new(NodeType::Text).with_content(content)
    }

    pub fn with_content(mut self, content: impl Into<String>) -> Self {
        self.content = Some(content.into());
        self
    }

    pub fn with_children(mut self, children: impl IntoIterator<Item = MarkdownNode>) -> Self {
        self.children = children.into_iter().collect();
        self
    }

    pub fn with_child(mut self, child: MarkdownNode) -> Self {
        self.children.push(child);
        self
    }

    pub fn with_level(mut self, level: u8) -> Self {
        self.level = Some(level);
        self
    }

    pub fn with_href(mut self, href: impl Into<String>) -> Self {
        self.href = Some(href.into());
        self
    }

    pub fn with_src(mut self, src: impl Into<String>) -> Self {
        self.src = Some(src.into());
        self
    }

    pub fn with_alt(mut self, alt: impl Into<String>) -> Self {
        self.alt = Some(alt.into());
        self
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = Some(language.into());
        self
    }

    pub fn with_checked(mut self, checked: bool) -> Self {
        self.checked = Some(checked);
        self
    }

    pub fn with_align(mut self, align: TableCellAlign) -> Self {
        self.align = Some(align);
        self
    }

    pub fn with_header(mut self, is_header: bool) -> Self {
        self.is_header = Some(is_header);
        self
    }

    pub fn is(&self, kind: &NodeType) -> bool {
        &self.kind == kind
    }

    pub fn has_children(&self) -> bool {
        !self.children.is_empty()
    }

    /// Concatenated `content` of the direct children (used for code blocks that arrive as text
    /// children instead of a single `content` string).
    pub fn children_content(&self) -> String {
        self.children
            .iter()
            .filter_map(|c| c.content.as_deref())
            .collect()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum AstError {
    #[error("invalid AST JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Failure descriptor reported by a parser.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
#[error("{message}")]
pub struct ParseError {
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub column: Option<u32>,
}

impl ParseError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            line: None,
            column: None,
        }
    }

    pub fn at(message: impl Into<String>, line: u32, column: u32) -> Self {
        Self {
            message: message.into(),
            line: Some(line),
            column: Some(column),
        }
    }
}

/// Outcome of parsing markdown: either a node sequence or an error descriptor.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ParseResult {
    pub success: bool,
    #[serde(default)]
    pub nodes: Vec<MarkdownNode>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<ParseError>,
}

impl ParseResult {
    pub fn ok(nodes: Vec<MarkdownNode>) -> Self {
        Self {
            success: true,
            nodes,
            error: None,
        }
    }

    pub fn failure(error: ParseError) -> Self {
        Self {
            success: false,
            nodes: Vec::new(),
            error: Some(error),
        }
    }

    /// Decodes a JSON node array (the AST wire format) into a successful result.
    pub fn from_json(ast: &str) -> Result<Self, AstError> {
        let nodes: Vec<MarkdownNode> = serde_json::from_str(ast)?;
        Ok(Self::ok(nodes))
    }

    pub fn error_message(&self) -> Option<&str> {
        self.error.as_ref().map(|e| e.message.as_str())
    }

    pub fn into_result(self) -> Result<Vec<MarkdownNode>, ParseError> {
        if self.success {
            Ok(self.nodes)
        } else {
            Err(self
                .error
                .unwrap_or_else(|| ParseError::new("Unknown parse error")))
        }
    }
}

/// Raw result envelope returned by a native parser bridge: the AST travels as a JSON string.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NativeParseResult {
    pub success: bool,
    #[serde(default)]
    pub ast: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_line: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_column: Option<u32>,
}

impl NativeParseResult {
    pub fn into_parse_result(self) -> ParseResult {
        if !self.success {
            return ParseResult::failure(ParseError {
                message: self
                    .error_message
                    .unwrap_or_else(|| "Unknown parse error".to_string()),
                line: self.error_line,
                column: self.error_column,
            });
        }
        match ParseResult::from_json(&self.ast) {
            Ok(result) => result,
            Err(err) => ParseResult::failure(ParseError::new(err.to_string())),
        }
    }
}

/// Options forwarded verbatim to the parser.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ParserOptions {
    pub gfm: bool,
    pub enable_tables: bool,
    pub enable_task_lists: bool,
    pub enable_strikethrough: bool,
    pub enable_autolink: bool,
    pub math: bool,
    pub wiki: bool,
    /// Maximum input size in bytes.
    pub max_input_size: usize,
    /// Parse timeout in milliseconds.
    pub timeout: u64,
}

impl Default for ParserOptions {
    fn default() -> Self {
        Self {
            gfm: true,
            enable_tables: true,
            enable_task_lists: true,
            enable_strikethrough: true,
            enable_autolink: true,
            math: false,
            wiki: false,
            max_input_size: 10 * 1024 * 1024,
            timeout: 5000,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn decodes_wire_format() {
        let json = r#"[{"type":"document","children":[
            {"type":"heading","level":2,"children":[{"type":"text","content":"Hi"}]},
            {"type":"table_cell","isHeader":true,"align":"center"},
            {"type":"mermaid","content":"graph TD"}
        ]}]"#;
        let result = ParseResult::from_json(json).unwrap();
        assert!(result.success);
        let doc = &result.nodes[0];
        assert_eq!(doc.kind, NodeType::Document);
        assert_eq!(doc.children[0].level, Some(2));
        assert_eq!(doc.children[0].children[0].content.as_deref(), Some("Hi"));
        assert_eq!(doc.children[1].is_header, Some(true));
        assert_eq!(doc.children[1].align, Some(TableCellAlign::Center));
        assert_eq!(doc.children[2].kind, NodeType::Other("mermaid".to_string()));
    }

    #[test]
    fn encodes_only_present_attributes() {
        let node = MarkdownNode::new(NodeType::TaskListItem).with_checked(false);
        let json = serde_json::to_string(&node).unwrap();
        assert_eq!(json, r#"{"type":"task_list_item","checked":false}"#);
    }

    #[test]
    fn native_failure_keeps_position() {
        let native = NativeParseResult {
            success: false,
            ast: "[]".to_string(),
            error_message: Some("boom".to_string()),
            error_line: Some(3),
            error_column: Some(7),
        };
        let result = native.into_parse_result();
        assert!(!result.success);
        assert_eq!(result.error, Some(ParseError::at("boom", 3, 7)));
    }

    #[test]
    fn native_success_with_bad_json_becomes_failure() {
        let native = NativeParseResult {
            success: true,
            ast: "{not json".to_string(),
            ..NativeParseResult::default()
        };
        let result = native.into_parse_result();
        assert!(!result.success);
        assert!(result.error_message().unwrap().starts_with("invalid AST JSON"));
    }

    #[test]
    fn parser_options_default_from_partial_json() {
        let opts: ParserOptions = serde_json::from_str(r#"{"math":true}"#).unwrap();
        assert!(opts.math);
        assert!(opts.gfm);
        assert_eq!(opts.max_input_size, 10 * 1024 * 1024);
        assert_eq!(opts.timeout, 5000);
    }
}
