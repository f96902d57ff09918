//! Token tree to text-run conversion with explicit color inheritance.
//!
//! Text runs on the target host do not cascade, so every run produced here carries the full
//! style it needs. Foreground color is threaded down the recursion by hand: an element resolves
//! its own style on top of the inherited color, then passes its resolved color to its children.
use markweave_core::fragment::Fragment;
use markweave_core::fragment::TextRun;
use markweave_core::style;
use markweave_core::style::Style;
use markweave_core::text::TokenNode;
use std::collections::HashMap;

const CLASS_PREFIX: &str = "hljs-";

/// Font settings every code run starts from.
#[derive(Clone, Debug, PartialEq)]
pub struct CodeTextOptions {
    pub font_family: String,
    pub font_size: f64,
}

impl Default for CodeTextOptions {
    fn default() -> Self {
        Self {
            font_family: "monospace".to_string(),
            font_size: 14.0,
        }
    }
}

impl CodeTextOptions {
    pub fn starting_style(&self) -> Style {
        style! {
            "fontFamily" => self.font_family.as_str(),
            "fontSize" => self.font_size,
            "lineHeight" => self.font_size + 5.0,
        }
    }
}

/// Resolves `class_names` against `styles`, layering matches over `base` in order.
///
/// Each class is looked up as-is, then without the `hljs-` prefix, then as a `.class` selector,
/// then with the first `hljs-` occurrence removed. Only the first hit per class is used.
pub fn create_style_object(
    class_names: &[String],
    base: &Style,
    styles: &HashMap<String, Style>,
) -> Style {
    let mut result = base.clone();
    for class in class_names {
        if let Some(style) = lookup_class(class, styles) {
            result.patch(style);
        }
    }
    result
}

fn lookup_class<'a>(class: &str, styles: &'a HashMap<String, Style>) -> Option<&'a Style> {
    styles
        .get(class)
        .or_else(|| class.strip_prefix(CLASS_PREFIX).and_then(|c| styles.get(c)))
        .or_else(|| styles.get(&format!(".{class}")))
        .or_else(|| styles.get(&class.replacen(CLASS_PREFIX, "", 1)))
}

pub fn create_native_element(
    node: &TokenNode,
    styles: &HashMap<String, Style>,
    key: String,
    default_color: &str,
    options: &CodeTextOptions,
) -> Fragment {
    let base = style! { "color" => default_color }.patched(&options.starting_style());
    match node {
        TokenNode::Text { value } => TextRun::new()
            .key(key)
            .style(base)
            .child(value.as_str())
            .into(),
        TokenNode::Element {
            class_names,
            children,
            ..
        } => {
            let style = create_style_object(class_names, &base, styles);
            let color = style.color().unwrap_or(default_color);
            let children = children
                .iter()
                .enumerate()
                .map(|(i, child)| {
                    create_native_element(child, styles, format!("{key}-{i}"), color, options)
                })
                .collect();
            TextRun::new().key(key).style(style).children(children).into()
        }
    }
}

/// One fragment per row, keyed `code-segment-{i}`.
pub fn render_rows(
    rows: &[TokenNode],
    styles: &HashMap<String, Style>,
    default_color: &str,
    options: &CodeTextOptions,
) -> Vec<Fragment> {
    rows.iter()
        .enumerate()
        .map(|(i, row)| {
            create_native_element(row, styles, format!("code-segment-{i}"), default_color, options)
        })
        .collect()
}
