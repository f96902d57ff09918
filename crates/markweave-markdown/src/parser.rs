//! Markdown source to [`MarkdownNode`] trees.
//!
//! Rendering only depends on the [`MarkdownParser`] seam; [`CmarkParser`] is the bundled
//! implementation on top of `pulldown-cmark`.
use markweave_core::ast::MarkdownNode;
use markweave_core::ast::NodeType;
use markweave_core::ast::ParseError;
use markweave_core::ast::ParseResult;
use markweave_core::ast::ParserOptions;
use markweave_core::ast::TableCellAlign;
use pulldown_cmark::Alignment;
use pulldown_cmark::CodeBlockKind;
use pulldown_cmark::CowStr;
use pulldown_cmark::Event;
use pulldown_cmark::HeadingLevel;
use pulldown_cmark::Options;
use pulldown_cmark::Parser;
use pulldown_cmark::Tag;
use pulldown_cmark::TagEnd;
use std::time::Duration;
use std::time::Instant;
use tracing::debug;
use tracing::warn;

const TIMEOUT_CHECK_INTERVAL: usize = 256;

/// Anything that turns markdown source into a [`ParseResult`].
pub trait MarkdownParser: Send + Sync {
    fn parse(&self, content: &str, options: &ParserOptions) -> ParseResult;
}

impl<F> MarkdownParser for F
where
    F: Fn(&str, &ParserOptions) -> ParseResult + Send + Sync,
{
    fn parse(&self, content: &str, options: &ParserOptions) -> ParseResult {
        self(content, options)
    }
}

/// CommonMark/GFM parser producing a single `document` root.
#[derive(Clone, Copy, Debug, Default)]
pub struct CmarkParser;

impl MarkdownParser for CmarkParser {
    fn parse(&self, content: &str, options: &ParserOptions) -> ParseResult {
        match parse_document(content, options) {
            Ok(document) => ParseResult::ok(vec![document]),
            Err(err) => ParseResult::failure(err),
        }
    }
}

/// Convenience wrapper around [`CmarkParser`].
pub fn parse_markdown(content: &str, options: &ParserOptions) -> ParseResult {
    CmarkParser.parse(content, options)
}

/// Parsed nodes, or an empty list when parsing fails.
pub fn parse_nodes(content: &str, options: &ParserOptions) -> Vec<MarkdownNode> {
    match parse_markdown(content, options).into_result() {
        Ok(nodes) => nodes,
        Err(err) => {
            warn!(error = %err.message, "markdown parse failed");
            Vec::new()
        }
    }
}

fn cmark_options(options: &ParserOptions) -> Options {
    let mut out = Options::empty();
    if options.gfm {
        out.insert(Options::ENABLE_GFM);
    }
    if options.gfm || options.enable_tables {
        out.insert(Options::ENABLE_TABLES);
    }
    if options.gfm || options.enable_task_lists {
        out.insert(Options::ENABLE_TASKLISTS);
    }
    if options.gfm || options.enable_strikethrough {
        out.insert(Options::ENABLE_STRIKETHROUGH);
    }
    if options.math {
        out.insert(Options::ENABLE_MATH);
    }
    if options.wiki || options.enable_autolink {
        debug!(
            wiki = options.wiki,
            autolink = options.enable_autolink,
            "parser options without a pulldown-cmark counterpart are ignored"
        );
    }
    out
}

fn parse_document(content: &str, options: &ParserOptions) -> Result<MarkdownNode, ParseError> {
    if content.len() > options.max_input_size {
        return Err(ParseError::new("Input exceeds maximum size limit"));
    }

    let started = Instant::now();
    let timeout = Duration::from_millis(options.timeout);
    let mut tree = TreeBuilder::new();
    for (i, event) in Parser::new_ext(content, cmark_options(options)).enumerate() {
        if i % TIMEOUT_CHECK_INTERVAL == 0 && i > 0 && started.elapsed() > timeout {
            return Err(ParseError::new("Parse timeout exceeded"));
        }
        tree.event(event);
    }
    Ok(tree.finish())
}

struct TreeBuilder {
    /// Open nodes; index 0 is the document root.
    stack: Vec<MarkdownNode>,
    table_aligns: Vec<Alignment>,
    in_table_head: bool,
    cell_index: usize,
}

impl TreeBuilder {
    fn new() -> Self {
        Self {
            stack: vec![MarkdownNode::new(NodeType::Document)],
            table_aligns: Vec::new(),
            in_table_head: false,
            cell_index: 0,
        }
    }

    fn top(&mut self) -> &mut MarkdownNode {
        let last = self.stack.len() - 1;
        &mut self.stack[last]
    }

    fn top_is(&self, kind: &NodeType) -> bool {
        self.stack.last().is_some_and(|n| n.is(kind))
    }

    fn open(&mut self, node: MarkdownNode) {
        self.stack.push(node);
    }

    fn close(&mut self) {
        if self.stack.len() <= 1 {
            return;
        }
        let Some(mut node) = self.stack.pop() else {
            return;
        };
        if node.is(&NodeType::Image) {
            let alt = plain_text(&node);
            if !alt.is_empty() {
                node.alt = Some(alt);
                node.children.clear();
            }
        }
        self.top().children.push(node);
    }

    fn leaf(&mut self, node: MarkdownNode) {
        self.top().children.push(node);
    }

    fn text(&mut self, text: &str) {
        let top = self.top();
        if top.is(&NodeType::CodeBlock) || top.is(&NodeType::HtmlBlock) {
            top.content.get_or_insert_with(String::new).push_str(text);
            return;
        }
        if let Some(last) = top.children.last_mut()
            && last.is(&NodeType::Text)
        {
            last.content.get_or_insert_with(String::new).push_str(text);
            return;
        }
        top.children.push(MarkdownNode::text(text));
    }

    fn event(&mut self, event: Event<'_>) {
        match event {
            Event::Start(tag) => self.start(tag),
            Event::End(tag) => self.end(tag),
            Event::Text(text) => self.text(&text),
            Event::Code(code) => self.leaf(wrapped(NodeType::CodeInline, &code)),
            Event::InlineMath(math) => self.leaf(wrapped(NodeType::MathInline, &math)),
            Event::DisplayMath(math) => self.leaf(wrapped(NodeType::MathBlock, &math)),
            Event::Html(html) => {
                if self.top_is(&NodeType::HtmlBlock) {
                    self.text(&html);
                } else {
                    self.leaf(MarkdownNode::new(NodeType::HtmlBlock).with_content(html.to_string()));
                }
            }
            Event::InlineHtml(html) => {
                self.leaf(MarkdownNode::new(NodeType::HtmlInline).with_content(html.to_string()));
            }
            Event::SoftBreak => self.leaf(MarkdownNode::new(NodeType::Softbreak)),
            Event::HardBreak => self.leaf(MarkdownNode::new(NodeType::Hardbreak)),
            Event::Rule => self.leaf(MarkdownNode::new(NodeType::ThematicBreak)),
            Event::TaskListMarker(checked) => {
                if let Some(item) = self
                    .stack
                    .iter_mut()
                    .rev()
                    .find(|n| n.is(&NodeType::ListItem))
                {
                    item.kind = NodeType::TaskListItem;
                    item.checked = Some(checked);
                }
            }
            Event::FootnoteReference(label) => self.text(&format!("[^{label}]")),
        }
    }

    fn start(&mut self, tag: Tag<'_>) {
        let node = match tag {
            Tag::Paragraph => MarkdownNode::new(NodeType::Paragraph),
            Tag::Heading { level, .. } => {
                MarkdownNode::new(NodeType::Heading).with_level(heading_level(level))
            }
            Tag::BlockQuote(_) => MarkdownNode::new(NodeType::Blockquote),
            Tag::CodeBlock(kind) => {
                let mut node = MarkdownNode::new(NodeType::CodeBlock);
                if let CodeBlockKind::Fenced(info) = kind
                    && let Some(language) = fence_language(&info)
                {
                    node.language = Some(language);
                }
                node
            }
            Tag::HtmlBlock => MarkdownNode::new(NodeType::HtmlBlock),
            Tag::List(start) => {
                let mut node = MarkdownNode::new(NodeType::List);
                node.ordered = Some(start.is_some());
                node.start = start;
                node
            }
            Tag::Item => MarkdownNode::new(NodeType::ListItem),
            Tag::Table(aligns) => {
                self.table_aligns = aligns;
                MarkdownNode::new(NodeType::Table)
            }
            Tag::TableHead => {
                self.in_table_head = true;
                self.cell_index = 0;
                self.open(MarkdownNode::new(NodeType::TableHead));
                MarkdownNode::new(NodeType::TableRow)
            }
            Tag::TableRow => {
                if self.top_is(&NodeType::Table) {
                    self.open(MarkdownNode::new(NodeType::TableBody));
                }
                self.cell_index = 0;
                MarkdownNode::new(NodeType::TableRow)
            }
            Tag::TableCell => {
                let align = self
                    .table_aligns
                    .get(self.cell_index)
                    .copied()
                    .map(cell_align)
                    .unwrap_or_default();
                MarkdownNode::new(NodeType::TableCell)
                    .with_header(self.in_table_head)
                    .with_align(align)
            }
            Tag::Emphasis => MarkdownNode::new(NodeType::Emphasis),
            Tag::Strong => MarkdownNode::new(NodeType::Strong),
            Tag::Strikethrough => MarkdownNode::new(NodeType::Strikethrough),
            Tag::Link {
                dest_url, title, ..
            } => {
                let mut node = MarkdownNode::new(NodeType::Link).with_href(dest_url.to_string());
                node.title = non_empty(&title);
                node
            }
            Tag::Image {
                dest_url, title, ..
            } => {
                let mut node = MarkdownNode::new(NodeType::Image).with_src(dest_url.to_string());
                node.title = non_empty(&title);
                node
            }
            other => {
                debug!(tag = ?other, "unsupported markdown construct; keeping its children");
                MarkdownNode::new(NodeType::Other(tag_name(&other).to_string()))
            }
        };
        self.open(node);
    }

    fn end(&mut self, tag: TagEnd) {
        match tag {
            TagEnd::TableHead => {
                self.close();
                self.close();
                self.in_table_head = false;
            }
            TagEnd::Table => {
                if self.top_is(&NodeType::TableBody) {
                    self.close();
                }
                self.close();
                self.table_aligns.clear();
            }
            TagEnd::TableCell => {
                self.close();
                self.cell_index += 1;
            }
            _ => self.close(),
        }
    }

    fn finish(mut self) -> MarkdownNode {
        while self.stack.len() > 1 {
            self.close();
        }
        self.stack
            .pop()
            .unwrap_or_else(|| MarkdownNode::new(NodeType::Document))
    }
}

fn wrapped(kind: NodeType, text: &CowStr<'_>) -> MarkdownNode {
    MarkdownNode::new(kind).with_child(MarkdownNode::text(text.to_string()))
}

fn plain_text(node: &MarkdownNode) -> String {
    let mut out = node.content.clone().unwrap_or_default();
    for child in &node.children {
        out.push_str(&plain_text(child));
    }
    out
}

fn non_empty(s: &CowStr<'_>) -> Option<String> {
    (!s.is_empty()).then(|| s.to_string())
}

fn heading_level(level: HeadingLevel) -> u8 {
    match level {
        HeadingLevel::H1 => 1,
        HeadingLevel::H2 => 2,
        HeadingLevel::H3 => 3,
        HeadingLevel::H4 => 4,
        HeadingLevel::H5 => 5,
        HeadingLevel::H6 => 6,
    }
}

fn cell_align(align: Alignment) -> TableCellAlign {
    match align {
        Alignment::None => TableCellAlign::Default,
        Alignment::Left => TableCellAlign::Left,
        Alignment::Center => TableCellAlign::Center,
        Alignment::Right => TableCellAlign::Right,
    }
}

fn fence_language(info: &CowStr<'_>) -> Option<String> {
    let first = info.split_whitespace().next().unwrap_or("");
    let first = first.split(',').next().unwrap_or("").trim();
    let first = first.strip_prefix("language-").unwrap_or(first);
    let first = first.trim_start_matches('{').trim_end_matches('}').trim();
    (!first.is_empty()).then(|| first.to_string())
}

fn tag_name(tag: &Tag<'_>) -> &'static str {
    match tag {
        Tag::FootnoteDefinition(_) => "footnote_definition",
        Tag::MetadataBlock(_) => "metadata_block",
        _ => "unknown",
    }
}
