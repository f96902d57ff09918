//! CSS-like style snapshots.
//!
//! A [`Style`] is a flat, ordered map of camelCase declarations (`fontSize`, `color`, ...). Host
//! primitives do not cascade, so every fragment carries a fully resolved snapshot; layering is
//! done eagerly with [`Style::patch`].
use serde::Deserialize;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StyleValue {
    Bool(bool),
    Number(f64),
    Text(String),
}

impl StyleValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s.as_str()),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }
}

impl fmt::Display for StyleValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(b) => write!(f, "{b}"),
            Self::Number(n) => write!(f, "{n}"),
            Self::Text(s) => f.write_str(s),
        }
    }
}

impl From<bool> for StyleValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<f64> for StyleValue {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl From<i32> for StyleValue {
    fn from(value: i32) -> Self {
        Self::Number(f64::from(value))
    }
}

impl From<&str> for StyleValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for StyleValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Style(BTreeMap<String, StyleValue>);

/// Builds a [`Style`] from `"key" => value` pairs.
///
/// ```
/// use markweave_core::style;
///
/// let s = style! { "fontSize" => 16, "color" => "#1a1a1a" };
/// assert_eq!(s.number("fontSize"), Some(16.0));
/// ```
#[macro_export]
macro_rules! style {
    () => {
        $crate::style::Style::new()
    };
    ($($key:literal => $value:expr),+ $(,)?) => {{
        let mut s = $crate::style::Style::new();
        $( s.set($key, $value); )+
        s
    }};
}

impl Style {
    pub fn new() -> Self {
        Self(BTreeMap::new())
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<StyleValue>) -> Self {
        self.set(key, value);
        self
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<StyleValue>) {
        self.0.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&StyleValue> {
        self.0.get(key)
    }

    pub fn remove(&mut self, key: &str) -> Option<StyleValue> {
        self.0.remove(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &StyleValue)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn text(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(StyleValue::as_str)
    }

    pub fn number(&self, key: &str) -> Option<f64> {
        self.get(key).and_then(StyleValue::as_f64)
    }

    pub fn color(&self) -> Option<&str> {
        self.text("color")
    }

    /// Layers `other` on top of `self`; declarations present in `other` win.
    pub fn patch(&mut self, other: &Style) {
        for (k, v) in &other.0 {
            self.0.insert(k.clone(), v.clone());
        }
    }

    pub fn patched(mut self, other: &Style) -> Self {
        self.patch(other);
        self
    }

    /// Flattens an optional style stack, later entries winning.
    pub fn layered<'a>(layers: impl IntoIterator<Item = Option<&'a Style>>) -> Self {
        let mut out = Self::new();
        for layer in layers.into_iter().flatten() {
            out.patch(layer);
        }
        out
    }
}

impl FromIterator<(String, StyleValue)> for Style {
    fn from_iter<T: IntoIterator<Item = (String, StyleValue)>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a Style {
    type Item = (&'a String, &'a StyleValue);
    type IntoIter = std::collections::btree_map::Iter<'a, String, StyleValue>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn later_layers_win() {
        let base = style! { "color" => "#000", "fontSize" => 16 };
        let top = style! { "color" => "#111" };
        let merged = Style::layered([Some(&base), None, Some(&top)]);
        assert_eq!(merged.color(), Some("#111"));
        assert_eq!(merged.number("fontSize"), Some(16.0));
    }

    #[test]
    fn deserializes_scalar_values() {
        let s: Style =
            serde_json::from_str(r#"{"flex":1,"fontWeight":"bold","includeFontPadding":false}"#)
                .unwrap();
        assert_eq!(s.get("flex"), Some(&StyleValue::Number(1.0)));
        assert_eq!(s.text("fontWeight"), Some("bold"));
        assert_eq!(s.get("includeFontPadding"), Some(&StyleValue::Bool(false)));
    }
}
