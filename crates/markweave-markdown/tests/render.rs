use markweave_core::ast::MarkdownNode;
use markweave_core::ast::NodeType;
use markweave_core::ast::ParserOptions;
use markweave_core::fragment::Fragment;
use markweave_core::fragment::PressAction;
use markweave_core::fragment::TextRun;
use markweave_core::text::NoHighlight;
use markweave_core::theme::Theme;
use markweave_core::theme::ThemeProvider;
use markweave_markdown::context::EventHandlers;
use markweave_markdown::renderers::CustomRenderers;
use markweave_markdown::renderers::render_heading;
use markweave_markdown::view::MarkdownView;
use markweave_markdown::view::MarkdownViewOptions;
use markweave_syntax::HighlightRuntime;
use pretty_assertions::assert_eq;
use serde_json::json;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::AtomicUsize;
use std::sync::atomic::Ordering;

fn plain_view() -> MarkdownView {
    MarkdownView::new().with_highlight_runtime(Arc::new(HighlightRuntime::unavailable()))
}

fn presses(frag: &Fragment) -> Vec<PressAction> {
    let mut out = Vec::new();
    frag.walk(&mut |f| {
        if let Some(action) = f.on_press() {
            out.push(action.clone());
        }
    });
    out
}

#[test]
fn heading_override_leaves_paragraph_alone() {
    let md = "# T\n\nBody";
    let base = plain_view().render_markdown(md, None);
    let custom = plain_view()
        .with_renderer("heading", |_, key, _| {
            TextRun::new().key(key).child("custom heading").into()
        })
        .render_markdown(md, None);

    assert_eq!(custom.children()[0].plain_text(), "custom heading");
    assert_ne!(custom.children()[0], base.children()[0]);
    assert_eq!(custom.children()[1], base.children()[1]);
}

#[test]
fn override_children_still_use_overrides() {
    let md = "**a *b***";
    let frag = plain_view()
        .with_renderer("emphasis", |node, key, ctx| {
            let mut children = vec![Fragment::raw("_")];
            children.extend(ctx.render_children(node, key));
            children.push(Fragment::raw("_"));
            TextRun::new().key(key).children(children).into()
        })
        .render_markdown(md, None);
    assert_eq!(frag.plain_text(), "a _b_");

    let frag = plain_view()
        .with_renderer("text", |node, key, _| {
            let upper = node.content.clone().unwrap_or_default().to_uppercase();
            TextRun::new().key(key).child(upper).into()
        })
        .render_markdown(md, None);
    assert_eq!(frag.plain_text(), "A B");
}

#[test]
fn overrides_can_wrap_builtins() {
    let seen = Arc::new(AtomicUsize::new(0));
    let count = Arc::clone(&seen);
    let renderers = CustomRenderers::new().with("heading", move |node, key, ctx| {
        count.fetch_add(1, Ordering::SeqCst);
        render_heading(node, key, ctx)
    });
    let frag = plain_view()
        .with_renderers(renderers)
        .render_markdown("# A\n\n## B", None);
    assert_eq!(seen.load(Ordering::SeqCst), 2);
    assert_eq!(frag.plain_text(), "AB");
}

#[test]
fn unknown_types_render_through_the_fallback() {
    let nodes = vec![
        MarkdownNode::new("mermaid").with_content("graph TD"),
        MarkdownNode::new("callout").with_child(MarkdownNode::text("note")),
    ];
    let view = plain_view();
    assert_eq!(view.render_ast(&nodes, None).plain_text(), "graph TDnote");

    let view = view.with_renderer("mermaid", |_, key, _| TextRun::new().key(key).child("[diagram]").into());
    assert_eq!(view.render_ast(&nodes, None).plain_text(), "[diagram]note");
}

#[test]
fn document_root_is_transparent() {
    let view = plain_view();
    let parsed = view.parse("a\n\nb").into_result().unwrap();
    assert_eq!(parsed.len(), 1);
    let children = parsed[0].children.clone();

    assert_eq!(view.render_ast(&parsed, None), view.render_ast(&children, None));
    assert_eq!(view.render_markdown("a\n\nb", None), view.render_ast(&children, None));
}

#[test]
fn rendering_is_deterministic() {
    let md = "# Title\n\n- [ ] todo\n- [x] done\n\n| a | b |\n|:-|-:|\n| 1 | 2 |\n\n```rust\nfn x() {}\n```\n";
    let view = plain_view();
    assert_eq!(view.render_markdown(md, None), view.render_markdown(md, None));

    let highlighted = MarkdownView::new()
        .with_highlight_runtime(Arc::new(HighlightRuntime::with_highlighter(NoHighlight)));
    assert_eq!(
        highlighted.render_markdown(md, None),
        highlighted.render_markdown(md, None)
    );
}

#[test]
fn paragraph_with_image_becomes_a_block() {
    let view = plain_view();
    let frag = view.render_markdown("see ![logo](logo.png \"Logo\")", None);
    let paragraph = &frag.children()[0];
    assert!(matches!(paragraph, Fragment::View(_)));
    assert_eq!(paragraph.plain_text(), "see logo");

    let frag = view.render_markdown("plain **bold**", None);
    assert!(matches!(&frag.children()[0], Fragment::Text(_)));
}

#[test]
fn code_blocks_degrade_without_a_highlighter() {
    let loads = Arc::new(AtomicUsize::new(0));
    let count = Arc::clone(&loads);
    let runtime = Arc::new(HighlightRuntime::with_loader(move || {
        count.fetch_add(1, Ordering::SeqCst);
        None
    }));
    let view = MarkdownView::new().with_highlight_runtime(runtime);

    for _ in 0..3 {
        let frag = view.render_markdown("```rust\nlet x = 1;\n```", None);
        let block = &frag.children()[0];
        assert_eq!(block.plain_text().trim_end(), "let x = 1;");
        assert!(matches!(&block.children()[0], Fragment::Text(_)));
    }
    assert_eq!(loads.load(Ordering::SeqCst), 1);
}

#[test]
fn highlighted_code_uses_the_theme_stylesheet() {
    let sheet = json!({
        "hljs": { "color": "#abcdef", "background": "#282c34", "textAlign": "left" },
    });
    let theme = Theme::light()
        .merged(&json!({ "syntaxHighlighting": { "theme": sheet } }))
        .unwrap();
    let runtime = Arc::new(HighlightRuntime::with_highlighter(NoHighlight));
    let view = MarkdownView::new()
        .with_theme(theme)
        .with_highlight_runtime(Arc::clone(&runtime));

    let frag = view.render_markdown("```\na\nb\n```", None);
    let scroll = &frag.children()[0].children()[0];
    let root = scroll.style().unwrap();
    assert_eq!(root.text("backgroundColor"), Some("#282c34"));
    assert!(!root.contains("textAlign"));
    assert!(frag.find_by_key("code-segment-1").is_some());

    view.render_markdown("```\nc\n```", None);
    assert_eq!(runtime.styles().len(), 1);
}

#[test]
fn task_toggle_round_trips_through_handlers() {
    let proposed = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&proposed);
    let handlers = EventHandlers::new().with_checkbox_toggle(move |checked, node| {
        if let Ok(mut v) = sink.lock() {
            v.push((checked, node.checked));
        }
    });
    let view = plain_view().with_handlers(handlers);
    let frag = view.render_markdown("- [ ] todo\n- [x] done", None);

    for action in presses(&frag) {
        assert!(view.handlers().dispatch(&action));
    }
    assert_eq!(
        *proposed.lock().unwrap(),
        vec![(true, Some(false)), (false, Some(true))]
    );
}

#[test]
fn task_toggle_carries_the_rendered_node() {
    let view = plain_view();
    let frag = view.render_markdown("- [x] done", None);
    let actions = presses(&frag);
    let [PressAction::ToggleCheckbox { checked, node }] = actions.as_slice() else {
        panic!("expected one toggle, got {actions:?}");
    };
    assert!(!checked);
    assert_eq!(node.kind, NodeType::TaskListItem);
    assert_eq!(node.checked, Some(true));
}

#[test]
fn links_dispatch_href_and_title() {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    let handlers = EventHandlers::new().with_link_press(move |href, title| {
        if let Ok(mut v) = sink.lock() {
            v.push((href.to_string(), title.map(str::to_string)));
        }
    });
    let view = plain_view().with_handlers(handlers);
    let frag = view.render_markdown("[a](https://a.dev \"A\") and [b](https://b.dev)", None);
    for action in presses(&frag) {
        view.handlers().dispatch(&action);
    }
    assert_eq!(
        *seen.lock().unwrap(),
        vec![
            ("https://a.dev".to_string(), Some("A".to_string())),
            ("https://b.dev".to_string(), None),
        ]
    );
}

#[test]
fn ambient_theme_applies_without_explicit_theme() {
    let provider = ThemeProvider::with_overrides(
        &Theme::light(),
        &json!({ "textStyles": { "strong": { "color": "#ff00ff" } } }),
    )
    .unwrap();
    let frag = plain_view().render_markdown("**x**", Some(&provider));
    let strong = frag.find_by_key("node-0-0").unwrap();
    assert_eq!(strong.style().and_then(|s| s.color()), Some("#ff00ff"));
    assert_eq!(strong.style().and_then(|s| s.text("fontWeight")), Some("bold"));
}

#[test]
fn terminal_lowering_keeps_block_structure() {
    let view = plain_view();
    let text = view.render_text("# Title\n\n- [x] done\n\n---\n\nend", None);
    let lines = text.plain_lines();
    assert_eq!(lines.first().map(String::as_str), Some("Title"));
    assert!(lines.iter().any(|l| l.contains("[x]") && l.contains("done")));
    assert!(lines.iter().any(|l| l == "end"));
}

#[test]
fn display_math_inside_a_paragraph_stays_inline() {
    let options = MarkdownViewOptions::default().with_parser_options(ParserOptions {
        math: true,
        ..ParserOptions::default()
    });
    let frag = plain_view()
        .with_options(options)
        .render_markdown("before $$x^2$$ after", None);
    let paragraph = frag.find_by_key("node-0").unwrap();
    assert!(matches!(paragraph, Fragment::Text(_)));
    assert!(
        paragraph
            .children()
            .iter()
            .all(|c| matches!(c, Fragment::Raw(_) | Fragment::Text(_)))
    );
    assert_eq!(paragraph.plain_text(), "before x^2 after");
}
