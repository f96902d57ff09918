//! Transformation of CSS-class-keyed highlighting stylesheets into flat style snapshots.
use markweave_core::style::Style;
use markweave_core::style::StyleValue;
use markweave_core::theme::HighlighterBackend;
use markweave_core::theme::Stylesheet;
use serde_json::Map;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::PoisonError;
use tracing::debug;

/// Foreground used when the stylesheet's root selector has no color.
pub const DEFAULT_CODE_COLOR: &str = "#abb2bf";

pub const HLJS_ROOT_SELECTOR: &str = "hljs";
pub const PRISM_ROOT_SELECTOR: &str = "pre[class*=\"language-\"]";
pub const PRISM_CODE_SELECTOR: &str = "code[class*=\"language-\"]";

/// Declarations the root selectors may not carry on a non-cascading text primitive.
const ROOT_UNSUPPORTED: &[&str] = &[
    "textShadow",
    "textAlign",
    "whiteSpace",
    "wordSpacing",
    "wordBreak",
    "wordWrap",
    "lineHeight",
    "MozTabSize",
    "OTabSize",
    "tabSize",
    "WebkitHyphens",
    "MozHyphens",
    "msHyphens",
    "hyphens",
    "fontFamily",
];

const EM_PX: f64 = 16.0;

pub fn root_selector(backend: HighlighterBackend) -> &'static str {
    match backend {
        HighlighterBackend::Hljs => HLJS_ROOT_SELECTOR,
        HighlighterBackend::Prism => PRISM_ROOT_SELECTOR,
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct TransformedStylesheet {
    pub styles: HashMap<String, Style>,
    pub default_color: String,
}

impl Default for TransformedStylesheet {
    fn default() -> Self {
        Self {
            styles: HashMap::new(),
            default_color: DEFAULT_CODE_COLOR.to_string(),
        }
    }
}

impl TransformedStylesheet {
    pub fn get(&self, selector: &str) -> Option<&Style> {
        self.styles.get(selector)
    }

    /// Style of the outer (pre-level) container.
    pub fn root_style(&self, backend: HighlighterBackend) -> Option<&Style> {
        self.get(root_selector(backend))
    }

    /// Style of the inner (code-level) container.
    pub fn code_style(&self) -> Option<&Style> {
        self.get(PRISM_CODE_SELECTOR)
    }
}

/// Transforms `sheet` for `backend`. Never fails: malformed entries are skipped.
pub fn transform_stylesheet(sheet: &Value, backend: HighlighterBackend) -> TransformedStylesheet {
    let normalized = match sheet {
        Value::Array(items) => items.first().unwrap_or(&Value::Null),
        other => other,
    };
    let Value::Object(selectors) = normalized else {
        debug!("highlight stylesheet is not an object; ignoring it");
        return TransformedStylesheet::default();
    };

    let mut styles = HashMap::with_capacity(selectors.len());
    for (selector, declarations) in selectors {
        let Value::Object(declarations) = declarations else {
            debug!(selector = %selector, "skipping non-object stylesheet entry");
            continue;
        };
        styles.insert(selector.clone(), transform_declarations(selector, declarations));
    }

    let root = root_selector(backend);
    let default_color = styles
        .get(root)
        .and_then(Style::color)
        .unwrap_or(DEFAULT_CODE_COLOR)
        .to_string();

    if let Some(style) = styles.get_mut(root) {
        strip_unsupported(style);
    }
    if backend == HighlighterBackend::Prism
        && let Some(style) = styles.get_mut(PRISM_CODE_SELECTOR)
    {
        strip_unsupported(style);
    }

    TransformedStylesheet {
        styles,
        default_color,
    }
}

fn transform_declarations(selector: &str, declarations: &Map<String, Value>) -> Style {
    let mut style = Style::new();
    for (key, value) in declarations {
        let Some(value) = style_value(value) else {
            debug!(selector = %selector, property = %key, "skipping non-scalar declaration");
            continue;
        };
        match key.as_str() {
            "overflow" | "overflowX" => {
                let value = if value.as_str() == Some("auto") {
                    StyleValue::from("scroll")
                } else {
                    value
                };
                style.set("overflow", value);
            }
            "background" => style.set("backgroundColor", value),
            "display" => {}
            _ => style.set(key.as_str(), value),
        }
    }
    style
}

fn style_value(value: &Value) -> Option<StyleValue> {
    match value {
        Value::String(s) => Some(convert_units(s)),
        Value::Number(n) => n.as_f64().map(StyleValue::Number),
        Value::Bool(b) => Some(StyleValue::Bool(*b)),
        _ => None,
    }
}

/// `"1.5em"` becomes `24`; strings without a numeric prefix are kept.
fn convert_units(raw: &str) -> StyleValue {
    if !raw.contains("em") {
        return StyleValue::from(raw);
    }
    let number = raw.split("em").next().unwrap_or_default().trim();
    match number.parse::<f64>() {
        Ok(n) => StyleValue::Number(n * EM_PX),
        Err(_) => StyleValue::from(raw),
    }
}

fn strip_unsupported(style: &mut Style) {
    for property in ROOT_UNSUPPORTED {
        style.remove(property);
    }
    if style.text("backgroundColor") == Some("none") {
        style.remove("backgroundColor");
    }
}

struct CacheEntry {
    // Holding the source keeps its allocation (and thus its identity) alive.
    _source: Stylesheet,
    transformed: Arc<TransformedStylesheet>,
}

/// Identity-keyed memo of [`transform_stylesheet`]. Entries are never evicted.
#[derive(Default)]
pub struct StyleCache {
    entries: Mutex<HashMap<(usize, HighlighterBackend), CacheEntry>>,
}

impl StyleCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_or_transform(
        &self,
        sheet: &Stylesheet,
        backend: HighlighterBackend,
    ) -> Arc<TransformedStylesheet> {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        let entry = entries.entry((sheet.id(), backend)).or_insert_with(|| CacheEntry {
            _source: sheet.clone(),
            transformed: Arc::new(transform_stylesheet(sheet.value(), backend)),
        });
        Arc::clone(&entry.transformed)
    }

    pub fn len(&self) -> usize {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
