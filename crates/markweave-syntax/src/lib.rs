//! Syntax highlighting for markweave code blocks.
//!
//! Highlighting stylesheets are authored for the web: CSS-class-keyed objects in the hljs or
//! prism convention (`{"hljs-keyword": {"color": "#c678dd"}}`). This crate turns them into flat
//! [`markweave_core::style::Style`] snapshots ([`stylesheet`]), walks token trees into styled
//! text runs with hand-threaded color inheritance ([`element`]), and ties both to a lazily detected
//! tokenizer ([`runtime::HighlightRuntime`]).
//!
//! Backends:
//! - `syntect` (feature: `syntect`)
//!
//! Without a backend every code block renders as plain monospaced text.
#[cfg(feature = "syntect")]
pub mod syntect;

pub mod element;
pub mod runtime;
pub mod stylesheet;

pub use runtime::HighlightOptions;
pub use runtime::HighlightRuntime;
pub use stylesheet::StyleCache;
pub use stylesheet::TransformedStylesheet;
pub use stylesheet::transform_stylesheet;
