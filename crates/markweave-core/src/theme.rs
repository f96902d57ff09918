//! Theme model, deep merge and ambient theme resolution.
use crate::style;
use crate::style::Style;
use serde::Deserialize;
use serde::Deserializer;
use serde::Serialize;
use serde::Serializer;
use serde_json::Map;
use serde_json::Value;
use std::sync::Arc;
use std::sync::LazyLock;

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextStyles {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<Style>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub heading1: Option<Style>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub heading2: Option<Style>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub heading3: Option<Style>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub heading4: Option<Style>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub heading5: Option<Style>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub heading6: Option<Style>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub strong: Option<Style>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub emphasis: Option<Style>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub strikethrough: Option<Style>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link: Option<Style>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code_inline: Option<Style>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code_block: Option<Style>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub blockquote: Option<Style>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub list_item: Option<Style>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub table_cell: Option<Style>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub table_header: Option<Style>,
}

impl TextStyles {
    /// Style for a heading `level`, falling back to the level-1 style when the level has none.
    pub fn heading(&self, level: u8) -> Option<&Style> {
        let specific = match level {
            1 => self.heading1.as_ref(),
            2 => self.heading2.as_ref(),
            3 => self.heading3.as_ref(),
            4 => self.heading4.as_ref(),
            5 => self.heading5.as_ref(),
            6 => self.heading6.as_ref(),
            _ => None,
        };
        specific.or(self.heading1.as_ref())
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContainerStyles {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub document: Option<Style>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub paragraph: Option<Style>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub blockquote_container: Option<Style>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code_block_container: Option<Style>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub list: Option<Style>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub list_item_container: Option<Style>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub table: Option<Style>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub table_row: Option<Style>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub table_cell_container: Option<Style>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_container: Option<Style>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thematic_break: Option<Style>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub checkbox: Option<Style>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub checkbox_checked: Option<Style>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageStyles {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<Style>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Colors {
    pub text: String,
    pub background: String,
    pub link: String,
    pub code_background: String,
    pub blockquote_border: String,
    pub table_border: String,
    pub hr: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Spacing {
    pub paragraph: f64,
    pub list_indent: f64,
    pub code_block_padding: f64,
    pub blockquote_padding: f64,
    pub table_cell_padding: f64,
}

/// Selector convention of the external highlighting stylesheet.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HighlighterBackend {
    #[default]
    Hljs,
    Prism,
}

/// Externally authored, CSS-class-keyed stylesheet (e.g. `{"hljs-keyword": {"color": "#c678dd"}}`).
///
/// Clones share one allocation; the allocation is the stylesheet's identity for caching.
#[derive(Clone, Debug)]
pub struct Stylesheet(Arc<Value>);

impl Stylesheet {
    pub fn new(value: Value) -> Self {
        Self(Arc::new(value))
    }

    pub fn value(&self) -> &Value {
        &self.0
    }

    /// Identity of the underlying allocation.
    pub fn id(&self) -> usize {
        Arc::as_ptr(&self.0) as usize
    }

    pub fn ptr_eq(&self, other: &Stylesheet) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl PartialEq for Stylesheet {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other) || self.0 == other.0
    }
}

impl From<Value> for Stylesheet {
    fn from(value: Value) -> Self {
        Self::new(value)
    }
}

impl Serialize for Stylesheet {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.0.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Stylesheet {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Value::deserialize(deserializer).map(Self::new)
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyntaxHighlighting {
    /// Absent means enabled.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub theme: Option<Stylesheet>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub highlighter: Option<HighlighterBackend>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font_size: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font_family: Option<String>,
}

impl SyntaxHighlighting {
    pub fn is_enabled(&self) -> bool {
        self.enabled != Some(false)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Theme {
    pub text_styles: TextStyles,
    pub container_styles: ContainerStyles,
    pub image_styles: ImageStyles,
    pub colors: Colors,
    pub spacing: Spacing,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub syntax_highlighting: Option<SyntaxHighlighting>,
}

#[derive(Debug, thiserror::Error)]
pub enum ThemeError {
    #[error("theme override does not produce a valid theme: {0}")]
    Invalid(#[from] serde_json::Error),
}

static LIGHT: LazyLock<Theme> = LazyLock::new(Theme::light);

impl Default for Theme {
    fn default() -> Self {
        Self::light()
    }
}

impl Theme {
    pub fn light() -> Self {
        let text = "#1a1a1a";
        let border = "#d0d7de";
        let accent = "#0969da";
        let code_bg = "#f6f8fa";

        Self {
            text_styles: text_styles(text, "#656d76", accent, code_bg, false),
            container_styles: container_styles(border, accent, code_bg, None),
            image_styles: image_styles(),
            colors: Colors {
                text: text.to_string(),
                background: "#ffffff".to_string(),
                link: accent.to_string(),
                code_background: code_bg.to_string(),
                blockquote_border: border.to_string(),
                table_border: border.to_string(),
                hr: border.to_string(),
            },
            spacing: spacing(),
            syntax_highlighting: None,
        }
    }

    pub fn dark() -> Self {
        let text = "#e6edf3";
        let border = "#3d444d";
        let accent = "#58a6ff";
        let code_bg = "#161b22";
        let background = "#0d1117";

        Self {
            text_styles: text_styles(text, "#8b949e", accent, "#343942", true),
            container_styles: container_styles(border, accent, code_bg, Some(background)),
            image_styles: image_styles(),
            colors: Colors {
                text: text.to_string(),
                background: background.to_string(),
                link: accent.to_string(),
                code_background: code_bg.to_string(),
                blockquote_border: border.to_string(),
                table_border: border.to_string(),
                hr: border.to_string(),
            },
            spacing: spacing(),
            syntax_highlighting: None,
        }
    }

    /// Shared light theme used when nothing else is configured.
    pub fn fallback() -> &'static Theme {
        &LIGHT
    }

    pub fn with_syntax_highlighting(mut self, options: SyntaxHighlighting) -> Self {
        self.syntax_highlighting = Some(options);
        self
    }

    /// Applies a partial override (JSON-shaped) on top of this theme with [`deep_merge`].
    ///
    /// A stylesheet the override does not mention keeps its identity.
    pub fn merged(&self, overrides: &Value) -> Result<Theme, ThemeError> {
        let base = serde_json::to_value(self)?;
        let merged = deep_merge(&base, overrides);
        let mut theme: Theme = serde_json::from_value(merged)?;

        let touches_stylesheet = overrides
            .pointer("/syntaxHighlighting/theme")
            .is_some_and(|v| !v.is_null());
        if !touches_stylesheet
            && let (Some(old), Some(new)) = (
                self.syntax_highlighting.as_ref(),
                theme.syntax_highlighting.as_mut(),
            )
        {
            new.theme = old.theme.clone();
        }
        Ok(theme)
    }
}

fn text_styles(text: &str, quote: &str, link: &str, inline_bg: &str, dark: bool) -> TextStyles {
    let heading = |size: i32, line_height: i32, margin: i32| {
        style! {
            "fontSize" => size,
            "fontWeight" => "bold",
            "lineHeight" => line_height,
            "color" => text,
            "marginBottom" => margin,
        }
    };
    let mut code_inline = style! {
        "fontFamily" => "monospace",
        "backgroundColor" => inline_bg,
        "paddingHorizontal" => 6,
        "paddingVertical" => 2,
        "borderRadius" => 4,
        "fontSize" => 14,
    };
    if dark {
        code_inline.set("color", text);
    }

    TextStyles {
        text: Some(style! { "fontSize" => 16, "lineHeight" => 24, "color" => text }),
        heading1: Some(heading(32, 40, 16)),
        heading2: Some(heading(28, 36, 14)),
        heading3: Some(heading(24, 32, 12)),
        heading4: Some(heading(20, 28, 10)),
        heading5: Some(heading(18, 26, 8)),
        heading6: Some(heading(16, 24, 6)),
        strong: Some(style! { "fontWeight" => "bold" }),
        emphasis: Some(style! { "fontStyle" => "italic" }),
        strikethrough: Some(style! { "textDecorationLine" => "line-through" }),
        link: Some(style! { "color" => link, "textDecorationLine" => "underline" }),
        code_inline: Some(code_inline),
        code_block: Some(style! {
            "fontFamily" => "monospace",
            "fontSize" => 14,
            "lineHeight" => 20,
            "color" => text,
        }),
        blockquote: Some(style! { "color" => quote, "fontStyle" => "italic" }),
        list_item: Some(style! { "fontSize" => 16, "lineHeight" => 24, "color" => text }),
        table_cell: Some(style! { "fontSize" => 14, "color" => text }),
        table_header: Some(style! { "fontSize" => 14, "fontWeight" => "bold", "color" => text }),
    }
}

fn container_styles(
    border: &str,
    accent: &str,
    code_bg: &str,
    background: Option<&str>,
) -> ContainerStyles {
    let mut document = style! { "padding" => 16 };
    if let Some(bg) = background {
        document.set("backgroundColor", bg);
    }

    ContainerStyles {
        document: Some(document),
        paragraph: Some(style! { "marginBottom" => 16 }),
        blockquote_container: Some(style! {
            "borderLeftWidth" => 4,
            "borderLeftColor" => border,
            "paddingLeft" => 16,
            "marginBottom" => 16,
        }),
        code_block_container: Some(style! {
            "backgroundColor" => code_bg,
            "padding" => 16,
            "borderRadius" => 6,
            "marginBottom" => 16,
            "overflow" => "hidden",
        }),
        list: Some(style! { "marginBottom" => 16 }),
        list_item_container: Some(style! { "flexDirection" => "row", "marginBottom" => 4 }),
        table: Some(style! {
            "borderWidth" => 1,
            "borderColor" => border,
            "borderRadius" => 6,
            "marginBottom" => 16,
            "overflow" => "hidden",
        }),
        table_row: Some(style! {
            "flexDirection" => "row",
            "borderBottomWidth" => 1,
            "borderBottomColor" => border,
        }),
        table_cell_container: Some(style! {
            "padding" => 8,
            "borderRightWidth" => 1,
            "borderRightColor" => border,
            "flex" => 1,
        }),
        image_container: Some(style! { "marginBottom" => 16 }),
        thematic_break: Some(style! {
            "height" => 1,
            "backgroundColor" => border,
            "marginVertical" => 24,
        }),
        checkbox: Some(style! {
            "width" => 16,
            "height" => 16,
            "borderWidth" => 1,
            "borderColor" => border,
            "borderRadius" => 3,
            "marginRight" => 8,
            "justifyContent" => "center",
            "alignItems" => "center",
        }),
        checkbox_checked: Some(style! { "backgroundColor" => accent, "borderColor" => accent }),
    }
}

fn image_styles() -> ImageStyles {
    ImageStyles {
        image: Some(style! { "maxWidth" => "100%", "height" => "auto" }),
    }
}

fn spacing() -> Spacing {
    Spacing {
        paragraph: 16.0,
        list_indent: 24.0,
        code_block_padding: 16.0,
        blockquote_padding: 16.0,
        table_cell_padding: 8.0,
    }
}

/// Recursively merges `overrides` into `base`.
///
/// Objects present on both sides are merged key by key; any other override value (including
/// arrays) replaces the base value wholesale. `null` in the override leaves the base untouched.
pub fn deep_merge(base: &Value, overrides: &Value) -> Value {
    match (base, overrides) {
        (_, Value::Null) => base.clone(),
        (Value::Object(b), Value::Object(o)) => Value::Object(merge_maps(b, o)),
        (_, o) => o.clone(),
    }
}

fn merge_maps(base: &Map<String, Value>, overrides: &Map<String, Value>) -> Map<String, Value> {
    let mut out = base.clone();
    for (key, value) in overrides {
        if value.is_null() {
            continue;
        }
        let merged = match out.get(key) {
            Some(existing) => deep_merge(existing, value),
            None => value.clone(),
        };
        out.insert(key.clone(), merged);
    }
    out
}

/// Explicit ambient-theme scope, passed to renders that have no theme of their own.
#[derive(Clone, Debug)]
pub struct ThemeProvider {
    theme: Arc<Theme>,
}

impl Default for ThemeProvider {
    fn default() -> Self {
        Self::new(Theme::light())
    }
}

impl ThemeProvider {
    pub fn new(theme: Theme) -> Self {
        Self {
            theme: Arc::new(theme),
        }
    }

    pub fn with_overrides(theme: &Theme, overrides: &Value) -> Result<Self, ThemeError> {
        Ok(Self::new(theme.merged(overrides)?))
    }

    pub fn theme(&self) -> &Theme {
        &self.theme
    }
}

/// Effective theme: the explicit per-render theme, else the ambient provider's, else light.
pub fn resolve_theme<'a>(explicit: Option<&'a Theme>, ambient: Option<&'a ThemeProvider>) -> &'a Theme {
    explicit
        .or_else(|| ambient.map(ThemeProvider::theme))
        .unwrap_or_else(|| Theme::fallback())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn merges_nested_maps_key_by_key() {
        let base = json!({"colors": {"text": "#000", "background": "#fff"}});
        let over = json!({"colors": {"text": "#111"}});
        assert_eq!(
            deep_merge(&base, &over),
            json!({"colors": {"text": "#111", "background": "#fff"}})
        );
    }

    #[test]
    fn arrays_replace_and_null_is_unset() {
        let base = json!({"a": [1, 2, 3], "b": {"c": 1}, "d": "keep"});
        let over = json!({"a": [9], "b": {"c": null}, "d": null});
        assert_eq!(
            deep_merge(&base, &over),
            json!({"a": [9], "b": {"c": 1}, "d": "keep"})
        );
    }

    #[test]
    fn scalar_override_replaces_map() {
        let base = json!({"a": {"b": 1}});
        assert_eq!(deep_merge(&base, &json!({"a": 5})), json!({"a": 5}));
    }

    #[test]
    fn theme_merge_keeps_untouched_sections() {
        let merged = Theme::light()
            .merged(&json!({"colors": {"link": "#ff00ff"}, "spacing": {"paragraph": 8}}))
            .unwrap();
        assert_eq!(merged.colors.link, "#ff00ff");
        assert_eq!(merged.colors.text, "#1a1a1a");
        assert_eq!(merged.spacing.paragraph, 8.0);
        assert_eq!(merged.text_styles, Theme::light().text_styles);
    }

    #[test]
    fn theme_merge_preserves_stylesheet_identity() {
        let sheet = Stylesheet::new(json!({"hljs": {"color": "#abb2bf"}}));
        let theme = Theme::dark().with_syntax_highlighting(SyntaxHighlighting {
            theme: Some(sheet.clone()),
            ..SyntaxHighlighting::default()
        });
        let merged = theme
            .merged(&json!({"syntaxHighlighting": {"fontSize": 12}}))
            .unwrap();
        let options = merged.syntax_highlighting.unwrap();
        assert_eq!(options.font_size, Some(12.0));
        assert!(options.theme.unwrap().ptr_eq(&sheet));
    }

    #[test]
    fn invalid_override_is_an_error() {
        let err = Theme::light().merged(&json!({"colors": {"text": 42}}));
        assert!(err.is_err());
    }

    #[test]
    fn heading_falls_back_to_level_one() {
        let mut styles = Theme::light().text_styles;
        styles.heading3 = None;
        assert_eq!(styles.heading(3), styles.heading1.as_ref());
        assert_eq!(styles.heading(9), styles.heading1.as_ref());
        assert_eq!(styles.heading(2), styles.heading2.as_ref());
    }

    #[test]
    fn resolution_prefers_explicit_then_ambient_then_light() {
        let dark = Theme::dark();
        let provider = ThemeProvider::new(Theme::dark());
        assert_eq!(resolve_theme(Some(&dark), None).colors.background, "#0d1117");
        assert_eq!(
            resolve_theme(None, Some(&provider)).colors.background,
            "#0d1117"
        );
        assert_eq!(resolve_theme(None, None).colors.background, "#ffffff");
    }
}
