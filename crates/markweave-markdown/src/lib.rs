//! Markdown rendering for markweave.
//!
//! Markdown goes through three stages here:
//!
//! - [`parser`]: source text to a [`markweave_core::ast::MarkdownNode`] tree (`pulldown-cmark`
//!   by default, any [`parser::MarkdownParser`] otherwise).
//! - [`renderers`]: per-node-type renderers producing [`markweave_core::fragment::Fragment`]s,
//!   with caller overrides consulted before the built-ins at every depth.
//! - [`view::MarkdownView`]: ties parser, theme, handlers and renderers together.
//!
//! [`debounce::DebouncedParsing`] keeps a parse result in step with content that changes often
//! (live previews) without re-parsing on every keystroke.
pub mod context;
pub mod debounce;
pub mod parser;
pub mod renderers;
pub mod view;

pub use context::EventHandlers;
pub use context::RenderContext;
pub use debounce::DebouncedParsing;
pub use parser::CmarkParser;
pub use parser::MarkdownParser;
pub use parser::parse_markdown;
pub use renderers::CustomRenderers;
pub use view::MarkdownInput;
pub use view::MarkdownView;
pub use view::MarkdownViewOptions;
