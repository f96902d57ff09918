//! Render markdown into themed UI fragment trees.
//!
//! This crate re-exports the workspace crates:
//!
//! - [`markweave_core`]: AST, styles, themes, the fragment tree and its terminal lowering.
//! - [`markweave_syntax`]: stylesheet transformation and the highlight runtime.
//! - [`markweave_markdown`]: parser adapter, renderer registry, [`MarkdownView`] and debounced
//!   parsing.
//!
//! Enable the `syntect` feature for highlighted code blocks.
//!
//! ```
//! use markweave::prelude::*;
//!
//! let view = MarkdownView::new().with_theme(Theme::dark());
//! let fragment = view.render_markdown("Hello **world**", None);
//! assert_eq!(fragment.plain_text(), "Hello world");
//! ```
pub use markweave_core;
pub use markweave_markdown;
pub use markweave_syntax;

pub use markweave_core::ast::MarkdownNode;
pub use markweave_core::ast::NodeType;
pub use markweave_core::ast::ParseResult;
pub use markweave_core::ast::ParserOptions;
pub use markweave_core::fragment::Fragment;
pub use markweave_core::fragment::PressAction;
pub use markweave_core::style::Style;
pub use markweave_core::theme::Theme;
pub use markweave_core::theme::ThemeProvider;
pub use markweave_core::theme::deep_merge;
pub use markweave_markdown::CustomRenderers;
pub use markweave_markdown::DebouncedParsing;
pub use markweave_markdown::EventHandlers;
pub use markweave_markdown::MarkdownView;
pub use markweave_markdown::MarkdownViewOptions;
pub use markweave_markdown::RenderContext;
pub use markweave_markdown::parse_markdown;
pub use markweave_syntax::HighlightRuntime;

pub mod prelude {
    pub use markweave_core::ast::MarkdownNode;
    pub use markweave_core::ast::NodeType;
    pub use markweave_core::ast::ParserOptions;
    pub use markweave_core::fragment::Fragment;
    pub use markweave_core::fragment::PressAction;
    pub use markweave_core::style;
    pub use markweave_core::style::Style;
    pub use markweave_core::theme::Theme;
    pub use markweave_core::theme::ThemeProvider;
    pub use markweave_markdown::CustomRenderers;
    pub use markweave_markdown::EventHandlers;
    pub use markweave_markdown::MarkdownInput;
    pub use markweave_markdown::MarkdownView;
    pub use markweave_markdown::MarkdownViewOptions;
    pub use markweave_markdown::RenderContext;
}
