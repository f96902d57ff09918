use markweave_core::fragment::Fragment;
use markweave_core::theme::HighlighterBackend;
use markweave_core::theme::Stylesheet;
use markweave_syntax::HighlightOptions;
use markweave_syntax::HighlightRuntime;
use markweave_syntax::StyleCache;
use markweave_syntax::transform_stylesheet;
use pretty_assertions::assert_eq;
use serde_json::json;
use std::sync::Arc;

#[test]
fn root_keeps_color_and_nested_em_values_become_numbers() {
    let sheet = json!({
        "hljs": { "color": "#abc", "textAlign": "center", "lineHeight": "1.5em" },
        "hljs-comment": { "lineHeight": "1.5em", "fontStyle": "italic" },
    });
    let t = transform_stylesheet(&sheet, HighlighterBackend::Hljs);

    let root = t.get("hljs").unwrap();
    assert_eq!(root.color(), Some("#abc"));
    assert!(!root.contains("textAlign"));
    assert!(!root.contains("lineHeight"));

    let comment = t.get("hljs-comment").unwrap();
    assert_eq!(comment.number("lineHeight"), Some(24.0));
    assert_eq!(t.default_color, "#abc");
}

#[test]
fn clones_share_a_cache_entry_and_equal_copies_do_not() {
    let value = json!({ "hljs": { "color": "#fff" } });
    let sheet = Stylesheet::new(value.clone());
    let clone = sheet.clone();
    let copy = Stylesheet::new(value);

    let cache = StyleCache::new();
    let a = cache.get_or_transform(&sheet, HighlighterBackend::Hljs);
    let b = cache.get_or_transform(&clone, HighlighterBackend::Hljs);
    let c = cache.get_or_transform(&copy, HighlighterBackend::Hljs);
    assert!(Arc::ptr_eq(&a, &b));
    assert!(!Arc::ptr_eq(&a, &c));
    assert_eq!(a, c);
    assert_eq!(cache.len(), 2);
}

#[test]
fn unavailable_runtime_stays_plain() {
    let runtime = HighlightRuntime::unavailable();
    let options = HighlightOptions::default().with_language("rust");
    for _ in 0..2 {
        let frag = runtime.render("fn main() {}", &options);
        let Fragment::Scroll(scroll) = &frag else {
            panic!("expected a scroll container");
        };
        assert_eq!(scroll.children.len(), 1);
        assert_eq!(frag.plain_text(), "fn main() {}");
        assert_eq!(
            scroll.children[0].style().and_then(|s| s.text("fontFamily")),
            Some("monospace")
        );
    }
    assert!(runtime.styles().is_empty());
}

#[cfg(feature = "syntect")]
#[test]
fn syntect_rows_resolve_stylesheet_colors() {
    use markweave_syntax::syntect::SyntectTokenizer;

    let sheet = Stylesheet::new(json!({
        "hljs": { "color": "#abb2bf", "background": "#282c34" },
        "hljs-keyword": { "color": "#c678dd" },
        "hljs-storage": { "color": "#c678dd" },
    }));
    let runtime = HighlightRuntime::with_highlighter(SyntectTokenizer::new());
    let options = HighlightOptions::default()
        .with_language("rs")
        .with_stylesheet(sheet);
    let frag = runtime.render("let x = 1;\nlet y = 2;", &options);

    assert_eq!(frag.plain_text(), "let x = 1;let y = 2;");
    assert!(frag.find_by_key("code-segment-1").is_some());

    let mut keyword_colors = Vec::new();
    frag.walk(&mut |f| {
        if let Fragment::Text(run) = f
            && run.children.iter().any(|c| matches!(c, Fragment::Raw(s) if s == "let"))
        {
            keyword_colors.push(run.style.color().map(str::to_string));
        }
    });
    assert_eq!(keyword_colors, vec![Some("#c678dd".to_string()); 2]);
}
