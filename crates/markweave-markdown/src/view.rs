//! Top-level orchestration: markdown source (or a ready AST) in, one fragment tree out.
//!
//! ```
//! use markweave_markdown::view::MarkdownView;
//!
//! let view = MarkdownView::new();
//! let fragment = view.render_markdown("# Title\n\nBody", None);
//! assert_eq!(fragment.plain_text(), "TitleBody");
//! ```
use markweave_core::ast::MarkdownNode;
use markweave_core::ast::NodeType;
use markweave_core::ast::ParseResult;
use markweave_core::ast::ParserOptions;
use markweave_core::fragment::Fragment;
use markweave_core::fragment::TextRun;
use markweave_core::fragment::ViewBox;
use markweave_core::render::RenderedText;
use markweave_core::render::lower;
use markweave_core::style::Style;
use markweave_core::theme::Theme;
use markweave_core::theme::ThemeProvider;
use markweave_core::theme::resolve_theme;
use markweave_syntax::HighlightRuntime;
use std::fmt;
use std::sync::Arc;
use tracing::warn;

use crate::context::EventHandlers;
use crate::context::RenderContext;
use crate::parser::CmarkParser;
use crate::parser::MarkdownParser;
use crate::renderers::CustomRenderers;

pub const ERROR_COLOR: &str = "#ff0000";

#[derive(Clone, Debug, Default, PartialEq)]
pub struct MarkdownViewOptions {
    /// Forwarded to the parser untouched.
    pub parser_options: ParserOptions,
    /// Render the parse error message instead of an empty container.
    pub show_errors: bool,
    /// Layered over the theme's document container style.
    pub style: Option<Style>,
}

impl MarkdownViewOptions {
    pub fn with_parser_options(mut self, parser_options: ParserOptions) -> Self {
        self.parser_options = parser_options;
        self
    }

    pub fn with_show_errors(mut self, show_errors: bool) -> Self {
        self.show_errors = show_errors;
        self
    }

    pub fn with_style(mut self, style: Style) -> Self {
        self.style = Some(style);
        self
    }
}

/// What to render: markdown source, or nodes that were parsed elsewhere.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum MarkdownInput<'a> {
    Source(&'a str),
    Ast(&'a [MarkdownNode]),
}

impl<'a> From<&'a str> for MarkdownInput<'a> {
    fn from(source: &'a str) -> Self {
        Self::Source(source)
    }
}

impl<'a> From<&'a [MarkdownNode]> for MarkdownInput<'a> {
    fn from(nodes: &'a [MarkdownNode]) -> Self {
        Self::Ast(nodes)
    }
}

impl<'a> From<&'a Vec<MarkdownNode>> for MarkdownInput<'a> {
    fn from(nodes: &'a Vec<MarkdownNode>) -> Self {
        Self::Ast(nodes.as_slice())
    }
}

/// Renders markdown into a [`Fragment`] tree.
///
/// Theme resolution per render: the view's own theme, else the ambient [`ThemeProvider`] passed
/// to [`MarkdownView::render`], else [`Theme::light`].
#[derive(Clone)]
pub struct MarkdownView {
    options: MarkdownViewOptions,
    theme: Option<Theme>,
    handlers: EventHandlers,
    renderers: CustomRenderers,
    parser: Arc<dyn MarkdownParser>,
    highlight: Arc<HighlightRuntime>,
}

impl fmt::Debug for MarkdownView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MarkdownView")
            .field("options", &self.options)
            .field("has_theme", &self.theme.is_some())
            .field("handlers", &self.handlers)
            .field("renderers", &self.renderers)
            .finish_non_exhaustive()
    }
}

impl Default for MarkdownView {
    fn default() -> Self {
        Self::new()
    }
}

impl MarkdownView {
    pub fn new() -> Self {
        Self {
            options: MarkdownViewOptions::default(),
            theme: None,
            handlers: EventHandlers::default(),
            renderers: CustomRenderers::default(),
            parser: Arc::new(CmarkParser),
            highlight: HighlightRuntime::shared(),
        }
    }

    pub fn with_options(mut self, options: MarkdownViewOptions) -> Self {
        self.options = options;
        self
    }

    pub fn with_theme(mut self, theme: Theme) -> Self {
        self.theme = Some(theme);
        self
    }

    pub fn with_handlers(mut self, handlers: EventHandlers) -> Self {
        self.handlers = handlers;
        self
    }

    pub fn with_renderers(mut self, renderers: CustomRenderers) -> Self {
        self.renderers = renderers;
        self
    }

    /// Adds or replaces a single override.
    pub fn with_renderer(
        mut self,
        node_type: impl Into<String>,
        renderer: impl Fn(&MarkdownNode, &str, &RenderContext<'_>) -> Fragment + Send + Sync + 'static,
    ) -> Self {
        self.renderers.insert(node_type, renderer);
        self
    }

    pub fn with_parser(mut self, parser: impl MarkdownParser + 'static) -> Self {
        self.parser = Arc::new(parser);
        self
    }

    pub fn with_highlight_runtime(mut self, highlight: Arc<HighlightRuntime>) -> Self {
        self.highlight = highlight;
        self
    }

    pub fn options(&self) -> &MarkdownViewOptions {
        &self.options
    }

    pub fn handlers(&self) -> &EventHandlers {
        &self.handlers
    }

    pub fn renderers(&self) -> &CustomRenderers {
        &self.renderers
    }

    pub fn parse(&self, source: &str) -> ParseResult {
        self.parser.parse(source, &self.options.parser_options)
    }

    pub fn render<'a>(
        &self,
        input: impl Into<MarkdownInput<'a>>,
        ambient: Option<&ThemeProvider>,
    ) -> Fragment {
        let theme = resolve_theme(self.theme.as_ref(), ambient);
        match input.into() {
            MarkdownInput::Ast(nodes) => self.render_nodes(nodes, theme),
            MarkdownInput::Source(source) => match self.parse(source).into_result() {
                Ok(nodes) => self.render_nodes(&nodes, theme),
                Err(err) => {
                    warn!(
                        error = %err.message,
                        line = ?err.line,
                        column = ?err.column,
                        "markdown parse failed"
                    );
                    self.render_error(Some(err.message.as_str()), theme)
                }
            },
        }
    }

    pub fn render_markdown(&self, source: &str, ambient: Option<&ThemeProvider>) -> Fragment {
        self.render(MarkdownInput::Source(source), ambient)
    }

    /// Skips parsing entirely.
    pub fn render_ast(&self, nodes: &[MarkdownNode], ambient: Option<&ThemeProvider>) -> Fragment {
        self.render(MarkdownInput::Ast(nodes), ambient)
    }

    /// Renders and lowers the result for a terminal.
    pub fn render_text<'a>(
        &self,
        input: impl Into<MarkdownInput<'a>>,
        ambient: Option<&ThemeProvider>,
    ) -> RenderedText {
        lower(&self.render(input, ambient))
    }

    fn container(&self, theme: &Theme) -> ViewBox {
        let mut style = theme.container_styles.document.clone().unwrap_or_default();
        if let Some(extra) = &self.options.style {
            style.patch(extra);
        }
        ViewBox::new().key("markdown").style(style)
    }

    fn render_nodes(&self, nodes: &[MarkdownNode], theme: &Theme) -> Fragment {
        let ctx = RenderContext::new(theme, &self.handlers, &self.renderers, &self.highlight);
        let children = splice_documents(nodes)
            .enumerate()
            .map(|(i, node)| ctx.render_node(node, &format!("node-{i}")))
            .collect();
        self.container(theme).children(children).into()
    }

    fn render_error(&self, message: Option<&str>, theme: &Theme) -> Fragment {
        let container = self.container(theme);
        if !self.options.show_errors {
            return container.into();
        }
        let text = format!(
            "Error parsing markdown: {}",
            message.unwrap_or("Unknown error")
        );
        container
            .child(
                TextRun::new()
                    .key("markdown-error")
                    .style(Style::new().with("color", ERROR_COLOR))
                    .child(text),
            )
            .into()
    }
}

/// Root `document` nodes are transparent: their children take their place.
fn splice_documents(nodes: &[MarkdownNode]) -> impl Iterator<Item = &MarkdownNode> {
    nodes.iter().flat_map(|node| {
        if node.is(&NodeType::Document) {
            node.children.iter()
        } else {
            std::slice::from_ref(node).iter()
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use markweave_core::ast::ParseError;
    use pretty_assertions::assert_eq;

    fn keys(frag: &Fragment) -> Vec<String> {
        frag.children()
            .iter()
            .filter_map(|c| c.key().map(str::to_string))
            .collect()
    }

    #[test]
    fn document_children_are_spliced_into_the_root() {
        let a = MarkdownNode::new(NodeType::Paragraph).with_child(MarkdownNode::text("a"));
        let b = MarkdownNode::new(NodeType::Paragraph).with_child(MarkdownNode::text("b"));
        let document = MarkdownNode::new(NodeType::Document).with_children([a.clone(), b.clone()]);

        let view = MarkdownView::new().with_highlight_runtime(Arc::new(HighlightRuntime::unavailable()));
        let wrapped = view.render_ast(&[document], None);
        let direct = view.render_ast(&[a, b], None);
        assert_eq!(wrapped, direct);
        assert_eq!(keys(&wrapped), vec!["node-0", "node-1"]);
    }

    #[test]
    fn failure_renders_empty_container_unless_errors_shown() {
        let failing = |_: &str, _: &ParserOptions| ParseResult::failure(ParseError::at("bad", 1, 2));
        let quiet = MarkdownView::new().with_parser(failing);
        let frag = quiet.render_markdown("x", None);
        assert!(frag.children().is_empty());
        assert_eq!(frag.style().and_then(|s| s.number("padding")), Some(16.0));

        let loud = quiet.with_options(MarkdownViewOptions::default().with_show_errors(true));
        let frag = loud.render_markdown("x", None);
        assert_eq!(frag.plain_text(), "Error parsing markdown: bad");
        let error = frag.find_by_key("markdown-error").unwrap();
        assert_eq!(error.style().and_then(|s| s.color()), Some(ERROR_COLOR));
    }

    #[test]
    fn failure_without_message_says_unknown_error() {
        let failing = |_: &str, _: &ParserOptions| ParseResult {
            success: false,
            nodes: Vec::new(),
            error: None,
        };
        let view = MarkdownView::new()
            .with_parser(failing)
            .with_options(MarkdownViewOptions::default().with_show_errors(true));
        assert_eq!(
            view.render_markdown("x", None).plain_text(),
            "Error parsing markdown: Unknown parse error"
        );
        assert_eq!(
            view.render_error(None, Theme::fallback()).plain_text(),
            "Error parsing markdown: Unknown error"
        );
    }

    #[test]
    fn explicit_theme_beats_ambient() {
        let ambient = ThemeProvider::new(Theme::dark());
        let view = MarkdownView::new();
        let frag = view.render_markdown("", Some(&ambient));
        assert_eq!(
            frag.style().and_then(|s| s.text("backgroundColor")),
            Some("#0d1117")
        );

        let frag = view.clone().with_theme(Theme::light()).render_markdown("", Some(&ambient));
        assert_eq!(frag.style().and_then(|s| s.text("backgroundColor")), None);
    }

    #[test]
    fn caller_style_layers_over_document_style() {
        let view = MarkdownView::new().with_options(
            MarkdownViewOptions::default().with_style(Style::new().with("padding", 4)),
        );
        let frag = view.render_markdown("", None);
        assert_eq!(frag.style().and_then(|s| s.number("padding")), Some(4.0));
    }
}
