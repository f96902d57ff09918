//! Renderer registry and the built-in renderers.
//!
//! Lookup order for a node type: the caller's [`CustomRenderers`] map (any string key, including
//! types this crate does not know), then the built-in table in [`default_renderer`], whose
//! default arm is [`render_default`].
//!
//! Built-in renderers are plain functions so overrides can wrap them:
//!
//! ```
//! use markweave_markdown::renderers::CustomRenderers;
//! use markweave_markdown::renderers::render_heading;
//!
//! let renderers = CustomRenderers::new().with("heading", |node, key, ctx| {
//!     // Decorate the default heading instead of re-implementing it.
//!     render_heading(node, key, ctx)
//! });
//! assert!(renderers.contains("heading"));
//! ```
use markweave_core::ast::MarkdownNode;
use markweave_core::ast::NodeType;
use markweave_core::fragment::AccessibilityRole;
use markweave_core::fragment::Fragment;
use markweave_core::fragment::ImageBox;
use markweave_core::fragment::PressAction;
use markweave_core::fragment::PressableBox;
use markweave_core::fragment::TextRun;
use markweave_core::fragment::ViewBox;
use markweave_core::style;
use markweave_core::style::Style;
use markweave_syntax::HighlightOptions;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::context::RenderContext;
use crate::context::child_key;

/// Caller-supplied renderer.
pub type RendererFn = Arc<dyn Fn(&MarkdownNode, &str, &RenderContext<'_>) -> Fragment + Send + Sync>;

/// Signature of the built-in renderers.
pub type BuiltinRenderer = fn(&MarkdownNode, &str, &RenderContext<'_>) -> Fragment;

/// Open, string-keyed override map.
#[derive(Clone, Default)]
pub struct CustomRenderers {
    map: HashMap<String, RendererFn>,
}

impl fmt::Debug for CustomRenderers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut keys: Vec<_> = self.map.keys().collect();
        keys.sort();
        f.debug_struct("CustomRenderers").field("types", &keys).finish()
    }
}

impl CustomRenderers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(
        mut self,
        node_type: impl Into<String>,
        renderer: impl Fn(&MarkdownNode, &str, &RenderContext<'_>) -> Fragment + Send + Sync + 'static,
    ) -> Self {
        self.insert(node_type, renderer);
        self
    }

    pub fn insert(
        &mut self,
        node_type: impl Into<String>,
        renderer: impl Fn(&MarkdownNode, &str, &RenderContext<'_>) -> Fragment + Send + Sync + 'static,
    ) {
        self.map.insert(node_type.into(), Arc::new(renderer));
    }

    pub fn remove(&mut self, node_type: &str) -> Option<RendererFn> {
        self.map.remove(node_type)
    }

    pub fn get(&self, node_type: &str) -> Option<&RendererFn> {
        self.map.get(node_type)
    }

    pub fn contains(&self, node_type: &str) -> bool {
        self.map.contains_key(node_type)
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }
}

/// A resolved renderer.
#[derive(Clone)]
pub enum Renderer<'a> {
    Custom(&'a RendererFn),
    Builtin(BuiltinRenderer),
}

impl Renderer<'_> {
    pub fn render(&self, node: &MarkdownNode, key: &str, ctx: &RenderContext<'_>) -> Fragment {
        match self {
            Self::Custom(f) => f(node, key, ctx),
            Self::Builtin(f) => f(node, key, ctx),
        }
    }

    pub fn is_custom(&self) -> bool {
        matches!(self, Self::Custom(_))
    }
}

pub fn resolve<'a>(node_type: &NodeType, custom: &'a CustomRenderers) -> Renderer<'a> {
    match custom.get(node_type.as_str()) {
        Some(f) => Renderer::Custom(f),
        None => Renderer::Builtin(default_renderer(node_type)),
    }
}

pub fn default_renderer(node_type: &NodeType) -> BuiltinRenderer {
    match node_type {
        NodeType::Text => render_text,
        NodeType::Strong => render_strong,
        NodeType::Emphasis => render_emphasis,
        NodeType::Strikethrough => render_strikethrough,
        NodeType::Underline => render_underline,
        NodeType::Heading => render_heading,
        NodeType::Paragraph => render_paragraph,
        NodeType::Link => render_link,
        NodeType::WikiLink => render_wiki_link,
        NodeType::Image => render_image,
        NodeType::CodeInline => render_code_inline,
        NodeType::CodeBlock => render_code_block,
        NodeType::MathInline => render_math_inline,
        NodeType::MathBlock => render_math_block,
        NodeType::Blockquote => render_blockquote,
        NodeType::List => render_list,
        NodeType::ListItem => render_list_item,
        NodeType::TaskListItem => render_task_list_item,
        NodeType::Table => render_table,
        NodeType::TableRow => render_table_row,
        NodeType::TableCell => render_table_cell,
        NodeType::ThematicBreak => render_thematic_break,
        NodeType::Softbreak => render_softbreak,
        NodeType::Hardbreak => render_hardbreak,
        _ => render_default,
    }
}

fn themed(style: &Option<Style>) -> Style {
    style.clone().unwrap_or_default()
}

fn run(key: &str, style: Style, children: Vec<Fragment>) -> Fragment {
    TextRun::new().key(key).style(style).children(children).into()
}

pub fn render_text(node: &MarkdownNode, _key: &str, _ctx: &RenderContext<'_>) -> Fragment {
    Fragment::raw(node.content.clone().unwrap_or_default())
}

pub fn render_strong(node: &MarkdownNode, key: &str, ctx: &RenderContext<'_>) -> Fragment {
    let style = themed(&ctx.theme().text_styles.strong);
    run(key, style, ctx.render_children(node, key))
}

pub fn render_emphasis(node: &MarkdownNode, key: &str, ctx: &RenderContext<'_>) -> Fragment {
    let style = themed(&ctx.theme().text_styles.emphasis);
    run(key, style, ctx.render_children(node, key))
}

pub fn render_strikethrough(node: &MarkdownNode, key: &str, ctx: &RenderContext<'_>) -> Fragment {
    let style = themed(&ctx.theme().text_styles.strikethrough);
    run(key, style, ctx.render_children(node, key))
}

pub fn render_underline(node: &MarkdownNode, key: &str, ctx: &RenderContext<'_>) -> Fragment {
    run(
        key,
        style! { "textDecorationLine" => "underline" },
        ctx.render_children(node, key),
    )
}

pub fn render_heading(node: &MarkdownNode, key: &str, ctx: &RenderContext<'_>) -> Fragment {
    let level = node.level.unwrap_or(1);
    let style = ctx
        .theme()
        .text_styles
        .heading(level)
        .cloned()
        .unwrap_or_default();
    TextRun::new()
        .key(key)
        .style(style)
        .role(AccessibilityRole::Header)
        .label(format!("Heading level {level}"))
        .children(ctx.render_children(node, key))
        .into()
}

/// Paragraphs holding images become block containers: images render as blocks and every other
/// child gets its own text run. Otherwise the paragraph is one text run.
pub fn render_paragraph(node: &MarkdownNode, key: &str, ctx: &RenderContext<'_>) -> Fragment {
    let theme = ctx.theme();
    let has_block_children = node.children.iter().any(|c| c.is(&NodeType::Image));

    if !has_block_children {
        let style = Style::layered([
            theme.text_styles.text.as_ref(),
            theme.container_styles.paragraph.as_ref(),
        ]);
        return run(key, style, ctx.render_children(node, key));
    }

    let children = node
        .children
        .iter()
        .enumerate()
        .map(|(i, child)| {
            let child_key = child_key(key, i);
            if child.is(&NodeType::Image) {
                return ctx.render_node(child, &child_key);
            }
            let inner = ctx.render_node(child, &format!("{child_key}-inner"));
            run(&child_key, themed(&theme.text_styles.text), vec![inner])
        })
        .collect();
    ViewBox::new()
        .key(key)
        .style(themed(&theme.container_styles.paragraph))
        .children(children)
        .into()
}

pub fn render_link(node: &MarkdownNode, key: &str, ctx: &RenderContext<'_>) -> Fragment {
    let href = node.href.as_deref().unwrap_or_default();
    let on_press = node.href.as_ref().map(|href| PressAction::OpenLink {
        href: href.clone(),
        title: node.title.clone(),
    });
    TextRun::new()
        .key(key)
        .style(themed(&ctx.theme().text_styles.link))
        .role(AccessibilityRole::Link)
        .label(format!("Link to {href}"))
        .on_press(on_press)
        .children(ctx.render_children(node, key))
        .into()
}

/// Wiki links render like links; a link without children shows its target.
pub fn render_wiki_link(node: &MarkdownNode, key: &str, ctx: &RenderContext<'_>) -> Fragment {
    if node.has_children() {
        return render_link(node, key, ctx);
    }
    let mut labelled = node.clone();
    let target = node.content.clone().or_else(|| node.href.clone()).unwrap_or_default();
    labelled.children.push(MarkdownNode::text(target));
    render_link(&labelled, key, ctx)
}

pub fn render_image(node: &MarkdownNode, key: &str, ctx: &RenderContext<'_>) -> Fragment {
    let Some(src) = node.src.as_ref() else {
        return Fragment::Empty;
    };
    let theme = ctx.theme();

    let on_press = ctx
        .handlers()
        .on_image_press
        .as_ref()
        .map(|_| PressAction::OpenImage {
            src: src.clone(),
            alt: node.alt.clone(),
            title: node.title.clone(),
        });
    let image = ImageBox::new(src.as_str())
        .style(style! {
            "width" => "100%",
            "height" => 200,
            "resizeMode" => "cover",
            "borderRadius" => 8,
        })
        .label(node.alt.clone());
    let pressable = PressableBox::new()
        .on_press(on_press)
        .role(AccessibilityRole::Image)
        .label(node.alt.clone().unwrap_or_else(|| "Image".to_string()))
        .children(vec![image.into()]);

    let mut children = vec![Fragment::from(pressable)];
    if let Some(alt) = node.alt.as_deref().filter(|a| !a.is_empty()) {
        let caption = TextRun::new()
            .style(style! {
                "fontSize" => 12,
                "color" => theme.colors.text.as_str(),
                "opacity" => 0.7,
                "textAlign" => "center",
                "marginTop" => 4,
            })
            .child(alt);
        children.push(caption.into());
    }

    ViewBox::new()
        .key(key)
        .style(themed(&theme.container_styles.image_container))
        .children(children)
        .into()
}

fn inline_code_run(node: &MarkdownNode, key: &str, ctx: &RenderContext<'_>, label: &str) -> Fragment {
    let children = match &node.content {
        Some(content) => vec![Fragment::raw(content.as_str())],
        None => ctx.render_children(node, key),
    };
    TextRun::new()
        .key(key)
        .style(themed(&ctx.theme().text_styles.code_inline))
        .label(label)
        .children(children)
        .into()
}

pub fn render_code_inline(node: &MarkdownNode, key: &str, ctx: &RenderContext<'_>) -> Fragment {
    inline_code_run(node, key, ctx, "Code")
}

pub fn render_math_inline(node: &MarkdownNode, key: &str, ctx: &RenderContext<'_>) -> Fragment {
    inline_code_run(node, key, ctx, "Math")
}

fn code_source(node: &MarkdownNode) -> String {
    node.content
        .clone()
        .unwrap_or_else(|| node.children_content())
}

fn plain_code_block(code: String, key: &str, ctx: &RenderContext<'_>) -> Fragment {
    let theme = ctx.theme();
    ViewBox::new()
        .key(key)
        .style(themed(&theme.container_styles.code_block_container))
        .label("Code block")
        .child(
            TextRun::new()
                .style(themed(&theme.text_styles.code_block))
                .child(code),
        )
        .into()
}

/// Highlighted when the theme allows it and a tokenizer is available; plain otherwise.
pub fn render_code_block(node: &MarkdownNode, key: &str, ctx: &RenderContext<'_>) -> Fragment {
    let code = code_source(node);
    let theme = ctx.theme();
    let settings = theme.syntax_highlighting.as_ref();
    let enabled = settings.is_none_or(|s| s.is_enabled());

    if !enabled || !ctx.highlight().is_available() {
        return plain_code_block(code, key, ctx);
    }

    let options = HighlightOptions::from_theme(settings)
        .with_language(node.language.as_deref().unwrap_or("text"));
    ViewBox::new()
        .key(key)
        .style(themed(&theme.container_styles.code_block_container))
        .label("Code block")
        .child(ctx.highlight().render(&code, &options))
        .into()
}

/// Display math arrives as a span inside a paragraph, so it stays an inline run.
pub fn render_math_block(node: &MarkdownNode, key: &str, ctx: &RenderContext<'_>) -> Fragment {
    TextRun::new()
        .key(key)
        .style(themed(&ctx.theme().text_styles.code_block))
        .label("Math")
        .child(code_source(node))
        .into()
}

pub fn render_blockquote(node: &MarkdownNode, key: &str, ctx: &RenderContext<'_>) -> Fragment {
    let theme = ctx.theme();
    ViewBox::new()
        .key(key)
        .style(themed(&theme.container_styles.blockquote_container))
        .label("Quote")
        .child(
            TextRun::new()
                .style(themed(&theme.text_styles.blockquote))
                .children(ctx.render_children(node, key)),
        )
        .into()
}

pub fn render_list(node: &MarkdownNode, key: &str, ctx: &RenderContext<'_>) -> Fragment {
    let label = if node.ordered == Some(true) {
        "Numbered list"
    } else {
        "Bullet list"
    };
    ViewBox::new()
        .key(key)
        .style(themed(&ctx.theme().container_styles.list))
        .label(label)
        .children(ctx.render_children(node, key))
        .into()
}

fn list_item_body(node: &MarkdownNode, key: &str, ctx: &RenderContext<'_>) -> TextRun {
    TextRun::new()
        .style(themed(&ctx.theme().text_styles.list_item).with("flex", 1))
        .children(ctx.render_children(node, key))
}

pub fn render_list_item(node: &MarkdownNode, key: &str, ctx: &RenderContext<'_>) -> Fragment {
    let theme = ctx.theme();
    ViewBox::new()
        .key(key)
        .style(themed(&theme.container_styles.list_item_container))
        .child(
            TextRun::new()
                .style(themed(&theme.text_styles.list_item))
                .child("• "),
        )
        .child(list_item_body(node, key, ctx))
        .into()
}

/// The checkbox proposes the negated state; persisting it is up to the caller.
pub fn render_task_list_item(node: &MarkdownNode, key: &str, ctx: &RenderContext<'_>) -> Fragment {
    let theme = ctx.theme();
    let checked = node.checked.unwrap_or(false);

    let mut checkbox = PressableBox::new()
        .style(Style::layered([
            theme.container_styles.checkbox.as_ref(),
            checked
                .then_some(theme.container_styles.checkbox_checked.as_ref())
                .flatten(),
        ]))
        .role(AccessibilityRole::Checkbox)
        .checked(checked)
        .on_press(Some(PressAction::ToggleCheckbox {
            checked: !checked,
            node: Box::new(node.clone()),
        }));
    if checked {
        checkbox = checkbox.children(vec![
            TextRun::new()
                .style(style! { "color" => "#fff", "fontSize" => 12 })
                .child("✓")
                .into(),
        ]);
    }

    ViewBox::new()
        .key(key)
        .style(themed(&theme.container_styles.list_item_container))
        .child(checkbox)
        .child(list_item_body(node, key, ctx))
        .into()
}

pub fn render_table(node: &MarkdownNode, key: &str, ctx: &RenderContext<'_>) -> Fragment {
    ViewBox::new()
        .key(key)
        .style(themed(&ctx.theme().container_styles.table))
        .label("Table")
        .children(ctx.render_children(node, key))
        .into()
}

pub fn render_table_row(node: &MarkdownNode, key: &str, ctx: &RenderContext<'_>) -> Fragment {
    ViewBox::new()
        .key(key)
        .style(themed(&ctx.theme().container_styles.table_row))
        .children(ctx.render_children(node, key))
        .into()
}

pub fn render_table_cell(node: &MarkdownNode, key: &str, ctx: &RenderContext<'_>) -> Fragment {
    let theme = ctx.theme();
    let mut text_style = if node.is_header == Some(true) {
        themed(&theme.text_styles.table_header)
    } else {
        themed(&theme.text_styles.table_cell)
    };
    if let Some(align) = node.align.and_then(|a| a.text_align()) {
        text_style.set("textAlign", align);
    }

    ViewBox::new()
        .key(key)
        .style(themed(&theme.container_styles.table_cell_container))
        .child(
            TextRun::new()
                .style(text_style)
                .children(ctx.render_children(node, key)),
        )
        .into()
}

pub fn render_thematic_break(_node: &MarkdownNode, key: &str, ctx: &RenderContext<'_>) -> Fragment {
    ViewBox::new()
        .key(key)
        .style(themed(&ctx.theme().container_styles.thematic_break))
        .into()
}

pub fn render_softbreak(_node: &MarkdownNode, key: &str, _ctx: &RenderContext<'_>) -> Fragment {
    TextRun::new().key(key).child(" ").into()
}

pub fn render_hardbreak(_node: &MarkdownNode, key: &str, _ctx: &RenderContext<'_>) -> Fragment {
    TextRun::new().key(key).child("\n").into()
}

/// Children if any, else the raw content, else nothing.
pub fn render_default(node: &MarkdownNode, key: &str, ctx: &RenderContext<'_>) -> Fragment {
    if node.has_children() {
        return run(key, Style::new(), ctx.render_children(node, key));
    }
    match node.content.as_deref() {
        Some(content) if !content.is_empty() => run(key, Style::new(), vec![Fragment::raw(content)]),
        _ => Fragment::Empty,
    }
}
