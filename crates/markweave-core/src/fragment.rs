//! Host-neutral UI fragment tree.
//!
//! Renderers produce [`Fragment`]s: a small set of primitives (inline text runs, block views,
//! images, pressables and scroll containers) that an embedding UI layer maps onto its own
//! components. Interactions are carried as data ([`PressAction`]) so rendering stays pure.
use crate::ast::MarkdownNode;
use crate::style::Style;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AccessibilityRole {
    Header,
    Link,
    Image,
    Checkbox,
}

/// Intent raised when a pressable fragment is activated.
#[derive(Clone, Debug, PartialEq)]
pub enum PressAction {
    OpenLink {
        href: String,
        title: Option<String>,
    },
    OpenImage {
        src: String,
        alt: Option<String>,
        title: Option<String>,
    },
    /// `checked` is the proposed new state; `node` is the task item as rendered.
    ToggleCheckbox {
        checked: bool,
        node: Box<MarkdownNode>,
    },
}

/// Inline text run. May nest other runs; cannot host block content in most hosts.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TextRun {
    pub key: Option<String>,
    pub style: Style,
    pub children: Vec<Fragment>,
    pub on_press: Option<PressAction>,
    pub role: Option<AccessibilityRole>,
    pub label: Option<String>,
}

/// Block container.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ViewBox {
    pub key: Option<String>,
    pub style: Style,
    pub children: Vec<Fragment>,
    pub label: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct ImageBox {
    pub key: Option<String>,
    pub source: String,
    pub style: Style,
    pub label: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct PressableBox {
    pub key: Option<String>,
    pub style: Style,
    pub children: Vec<Fragment>,
    pub on_press: Option<PressAction>,
    pub role: Option<AccessibilityRole>,
    pub label: Option<String>,
    pub checked: Option<bool>,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct ScrollBox {
    pub key: Option<String>,
    pub style: Style,
    pub horizontal: bool,
    pub children: Vec<Fragment>,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub enum Fragment {
    #[default]
    Empty,
    /// Bare string content (only meaningful inside a [`TextRun`]).
    Raw(String),
    Text(TextRun),
    View(ViewBox),
    Image(ImageBox),
    Pressable(PressableBox),
    Scroll(ScrollBox),
}

macro_rules! keyed_builders {
    ($ty:ty) => {
        impl $ty {
            pub fn key(mut self, key: impl Into<String>) -> Self {
                self.key = Some(key.into());
                self
            }

            pub fn style(mut self, style: Style) -> Self {
                self.style = style;
                self
            }
        }
    };
}

keyed_builders!(TextRun);
keyed_builders!(ViewBox);
keyed_builders!(ImageBox);
keyed_builders!(PressableBox);
keyed_builders!(ScrollBox);

impl TextRun {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn children(mut self, children: Vec<Fragment>) -> Self {
        self.children = children;
        self
    }

    pub fn child(mut self, child: impl Into<Fragment>) -> Self {
        self.children.push(child.into());
        self
    }

    pub fn on_press(mut self, action: Option<PressAction>) -> Self {
        self.on_press = action;
        self
    }

    pub fn role(mut self, role: AccessibilityRole) -> Self {
        self.role = Some(role);
        self
    }

    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }
}

impl ViewBox {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn children(mut self, children: Vec<Fragment>) -> Self {
        self.children = children;
        self
    }

    pub fn child(mut self, child: impl Into<Fragment>) -> Self {
        self.children.push(child.into());
        self
    }

    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }
}

impl ImageBox {
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            ..Self::default()
        }
    }

    pub fn label(mut self, label: Option<String>) -> Self {
        self.label = label;
        self
    }
}

impl PressableBox {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn children(mut self, children: Vec<Fragment>) -> Self {
        self.children = children;
        self
    }

    pub fn on_press(mut self, action: Option<PressAction>) -> Self {
        self.on_press = action;
        self
    }

    pub fn role(mut self, role: AccessibilityRole) -> Self {
        self.role = Some(role);
        self
    }

    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn checked(mut self, checked: bool) -> Self {
        self.checked = Some(checked);
        self
    }
}

impl ScrollBox {
    pub fn horizontal() -> Self {
        Self {
            horizontal: true,
            ..Self::default()
        }
    }

    pub fn children(mut self, children: Vec<Fragment>) -> Self {
        self.children = children;
        self
    }
}

impl From<TextRun> for Fragment {
    fn from(value: TextRun) -> Self {
        Self::Text(value)
    }
}

impl From<ViewBox> for Fragment {
    fn from(value: ViewBox) -> Self {
        Self::View(value)
    }
}

impl From<ImageBox> for Fragment {
    fn from(value: ImageBox) -> Self {
        Self::Image(value)
    }
}

impl From<PressableBox> for Fragment {
    fn from(value: PressableBox) -> Self {
        Self::Pressable(value)
    }
}

impl From<ScrollBox> for Fragment {
    fn from(value: ScrollBox) -> Self {
        Self::Scroll(value)
    }
}

impl From<String> for Fragment {
    fn from(value: String) -> Self {
        Self::Raw(value)
    }
}

impl From<&str> for Fragment {
    fn from(value: &str) -> Self {
        Self::Raw(value.to_string())
    }
}

impl Fragment {
    pub fn raw(text: impl Into<String>) -> Self {
        Self::Raw(text.into())
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Empty)
    }

    pub fn key(&self) -> Option<&str> {
        match self {
            Self::Empty | Self::Raw(_) => None,
            Self::Text(t) => t.key.as_deref(),
            Self::View(v) => v.key.as_deref(),
            Self::Image(i) => i.key.as_deref(),
            Self::Pressable(p) => p.key.as_deref(),
            Self::Scroll(s) => s.key.as_deref(),
        }
    }

    pub fn style(&self) -> Option<&Style> {
        match self {
            Self::Empty | Self::Raw(_) => None,
            Self::Text(t) => Some(&t.style),
            Self::View(v) => Some(&v.style),
            Self::Image(i) => Some(&i.style),
            Self::Pressable(p) => Some(&p.style),
            Self::Scroll(s) => Some(&s.style),
        }
    }

    pub fn children(&self) -> &[Fragment] {
        match self {
            Self::Empty | Self::Raw(_) | Self::Image(_) => &[],
            Self::Text(t) => &t.children,
            Self::View(v) => &v.children,
            Self::Pressable(p) => &p.children,
            Self::Scroll(s) => &s.children,
        }
    }

    pub fn on_press(&self) -> Option<&PressAction> {
        match self {
            Self::Text(t) => t.on_press.as_ref(),
            Self::Pressable(p) => p.on_press.as_ref(),
            _ => None,
        }
    }

    /// All visible text in document order.
    pub fn plain_text(&self) -> String {
        let mut out = String::new();
        self.collect_text(&mut out);
        out
    }

    fn collect_text(&self, out: &mut String) {
        if let Self::Raw(s) = self {
            out.push_str(s);
        }
        for child in self.children() {
            child.collect_text(out);
        }
    }

    /// Depth-first search for a fragment by key.
    pub fn find_by_key(&self, key: &str) -> Option<&Fragment> {
        if self.key() == Some(key) {
            return Some(self);
        }
        self.children().iter().find_map(|c| c.find_by_key(key))
    }

    /// Depth-first pre-order walk.
    pub fn walk<'a>(&'a self, f: &mut impl FnMut(&'a Fragment)) {
        f(self);
        for child in self.children() {
            child.walk(f);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::style;
    use pretty_assertions::assert_eq;

    #[test]
    fn collects_plain_text_in_order() {
        let frag: Fragment = ViewBox::new()
            .key("root")
            .child(TextRun::new().key("a").child("Hello, "))
            .child(
                TextRun::new()
                    .key("b")
                    .style(style! { "fontWeight" => "bold" })
                    .child("world"),
            )
            .into();
        assert_eq!(frag.plain_text(), "Hello, world");
        assert_eq!(frag.find_by_key("b").map(|f| f.plain_text()), Some("world".into()));
        assert!(frag.find_by_key("missing").is_none());
    }
}
