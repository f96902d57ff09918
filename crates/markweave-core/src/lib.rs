//! `markweave-core` holds the data model shared by every markweave crate.
//!
//! Nothing in here parses markdown or tokenizes code. It defines what flows between those stages:
//!
//! - [`ast::MarkdownNode`]: the markdown tree (JSON wire format compatible).
//! - [`style::Style`]: flat camelCase style snapshots.
//! - [`theme::Theme`]: light/dark themes, deep-merge overrides and ambient resolution.
//! - [`fragment::Fragment`]: the host-neutral UI tree renderers produce.
//! - [`text::TokenHighlighter`]: the seam syntax highlighting backends plug into.
//! - [`render::lower`]: lowering a fragment tree into `ratatui` text for terminal hosts.
//!
//! ## Design goals
//!
//! - Rendering is pure: the same tree and theme always produce the same fragments.
//! - No async runtime; interactions are data ([`fragment::PressAction`]) that the caller
//!   dispatches.
//!
//! Most users should depend on the facade crate `markweave`.
pub mod ast;
pub mod fragment;
pub mod render;
pub mod style;
pub mod text;
pub mod theme;
