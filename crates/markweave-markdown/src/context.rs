use markweave_core::ast::MarkdownNode;
use markweave_core::fragment::Fragment;
use markweave_core::fragment::PressAction;
use markweave_core::theme::Theme;
use markweave_syntax::HighlightRuntime;
use std::fmt;
use std::sync::Arc;

use crate::renderers::CustomRenderers;
use crate::renderers::resolve;

pub type LinkPressFn = Arc<dyn Fn(&str, Option<&str>) + Send + Sync>;
pub type ImagePressFn = Arc<dyn Fn(&str, Option<&str>, Option<&str>) + Send + Sync>;
/// Receives the proposed checked state and the task item as rendered.
pub type CheckboxToggleFn = Arc<dyn Fn(bool, &MarkdownNode) + Send + Sync>;

/// Caller callbacks for the interactions renderers attach as [`PressAction`]s.
#[derive(Clone, Default)]
pub struct EventHandlers {
    pub on_link_press: Option<LinkPressFn>,
    pub on_image_press: Option<ImagePressFn>,
    pub on_checkbox_toggle: Option<CheckboxToggleFn>,
}

impl fmt::Debug for EventHandlers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventHandlers")
            .field("on_link_press", &self.on_link_press.is_some())
            .field("on_image_press", &self.on_image_press.is_some())
            .field("on_checkbox_toggle", &self.on_checkbox_toggle.is_some())
            .finish()
    }
}

impl EventHandlers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_link_press(mut self, f: impl Fn(&str, Option<&str>) + Send + Sync + 'static) -> Self {
        self.on_link_press = Some(Arc::new(f));
        self
    }

    pub fn with_image_press(
        mut self,
        f: impl Fn(&str, Option<&str>, Option<&str>) + Send + Sync + 'static,
    ) -> Self {
        self.on_image_press = Some(Arc::new(f));
        self
    }

    pub fn with_checkbox_toggle(
        mut self,
        f: impl Fn(bool, &MarkdownNode) + Send + Sync + 'static,
    ) -> Self {
        self.on_checkbox_toggle = Some(Arc::new(f));
        self
    }

    /// Runs the callback matching `action`. Returns `false` when none is registered.
    pub fn dispatch(&self, action: &PressAction) -> bool {
        match action {
            PressAction::OpenLink { href, title } => match &self.on_link_press {
                Some(f) => {
                    f(href.as_str(), title.as_deref());
                    true
                }
                None => false,
            },
            PressAction::OpenImage { src, alt, title } => match &self.on_image_press {
                Some(f) => {
                    f(src.as_str(), alt.as_deref(), title.as_deref());
                    true
                }
                None => false,
            },
            PressAction::ToggleCheckbox { checked, node } => match &self.on_checkbox_toggle {
                Some(f) => {
                    f(*checked, node.as_ref());
                    true
                }
                None => false,
            },
        }
    }
}

/// Per-render state handed to every renderer.
///
/// Renderers must recurse through [`RenderContext::render_node`] so that caller overrides apply
/// at every depth.
#[derive(Clone, Copy)]
pub struct RenderContext<'a> {
    theme: &'a Theme,
    handlers: &'a EventHandlers,
    renderers: &'a CustomRenderers,
    highlight: &'a HighlightRuntime,
}

impl<'a> RenderContext<'a> {
    pub fn new(
        theme: &'a Theme,
        handlers: &'a EventHandlers,
        renderers: &'a CustomRenderers,
        highlight: &'a HighlightRuntime,
    ) -> Self {
        Self {
            theme,
            handlers,
            renderers,
            highlight,
        }
    }

    pub fn theme(&self) -> &'a Theme {
        self.theme
    }

    pub fn handlers(&self) -> &'a EventHandlers {
        self.handlers
    }

    pub fn highlight(&self) -> &'a HighlightRuntime {
        self.highlight
    }

    pub fn render_node(&self, node: &MarkdownNode, key: &str) -> Fragment {
        resolve(&node.kind, self.renderers).render(node, key, self)
    }

    /// Renders `node`'s children keyed `{key}-{index}`.
    pub fn render_children(&self, node: &MarkdownNode, key: &str) -> Vec<Fragment> {
        node.children
            .iter()
            .enumerate()
            .map(|(i, child)| self.render_node(child, &child_key(key, i)))
            .collect()
    }
}

impl fmt::Debug for RenderContext<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RenderContext")
            .field("handlers", self.handlers)
            .field("renderers", self.renderers)
            .finish_non_exhaustive()
    }
}

pub fn child_key(parent: &str, index: usize) -> String {
    format!("{parent}-{index}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use markweave_core::ast::NodeType;
    use std::sync::Mutex;
    use std::sync::atomic::AtomicUsize;
    use std::sync::atomic::Ordering;

    #[test]
    fn dispatch_reports_missing_handlers() {
        let handlers = EventHandlers::new();
        let action = PressAction::OpenLink {
            href: "https://example.com".to_string(),
            title: None,
        };
        assert!(!handlers.dispatch(&action));
    }

    #[test]
    fn dispatch_forwards_arguments() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let toggles = Arc::new(AtomicUsize::new(0));
        let links = Arc::clone(&seen);
        let count = Arc::clone(&toggles);
        let handlers = EventHandlers::new()
            .with_link_press(move |href, title| {
                if let Ok(mut v) = links.lock() {
                    v.push(format!("{href}|{}", title.unwrap_or("-")));
                }
            })
            .with_checkbox_toggle(move |checked, node| {
                assert!(checked);
                assert_eq!(node.kind, NodeType::TaskListItem);
                count.fetch_add(1, Ordering::SeqCst);
            });

        assert!(handlers.dispatch(&PressAction::OpenLink {
            href: "a".to_string(),
            title: Some("t".to_string()),
        }));
        assert!(handlers.dispatch(&PressAction::ToggleCheckbox {
            checked: true,
            node: Box::new(MarkdownNode::new(NodeType::TaskListItem).with_checked(false)),
        }));
        assert!(!handlers.dispatch(&PressAction::OpenImage {
            src: "x.png".to_string(),
            alt: None,
            title: None,
        }));

        assert_eq!(*seen.lock().unwrap(), vec!["a|t".to_string()]);
        assert_eq!(toggles.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn child_keys_are_hierarchical() {
        assert_eq!(child_key("node-0", 3), "node-0-3");
        assert_eq!(child_key(&child_key("node-1", 0), 2), "node-1-0-2");
    }
}
