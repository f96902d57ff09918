use markweave_core::fragment::Fragment;
use markweave_core::fragment::ScrollBox;
use markweave_core::fragment::TextRun;
use markweave_core::fragment::ViewBox;
use markweave_core::style;
use markweave_core::text::TokenHighlighter;
use markweave_core::theme::HighlighterBackend;
use markweave_core::theme::Stylesheet;
use markweave_core::theme::SyntaxHighlighting;
use std::sync::Arc;
use std::sync::LazyLock;
use std::sync::OnceLock;
use tracing::debug;

use crate::element::CodeTextOptions;
use crate::element::render_rows;
use crate::stylesheet::DEFAULT_CODE_COLOR;
use crate::stylesheet::StyleCache;
use crate::stylesheet::TransformedStylesheet;

pub type SharedHighlighter = Arc<dyn TokenHighlighter + Send + Sync>;

type Loader = Box<dyn Fn() -> Option<SharedHighlighter> + Send + Sync>;

#[derive(Clone, Debug, PartialEq)]
pub struct HighlightOptions {
    pub language: Option<String>,
    pub stylesheet: Option<Stylesheet>,
    pub backend: HighlighterBackend,
    pub font_size: f64,
    pub font_family: String,
}

impl Default for HighlightOptions {
    fn default() -> Self {
        let text = CodeTextOptions::default();
        Self {
            language: None,
            stylesheet: None,
            backend: HighlighterBackend::default(),
            font_size: text.font_size,
            font_family: text.font_family,
        }
    }
}

impl HighlightOptions {
    /// Options taken from a theme's syntax highlighting section, defaults filling the gaps.
    pub fn from_theme(settings: Option<&SyntaxHighlighting>) -> Self {
        let mut out = Self::default();
        if let Some(settings) = settings {
            out.stylesheet = settings.theme.clone();
            out.backend = settings.highlighter.unwrap_or_default();
            if let Some(size) = settings.font_size {
                out.font_size = size;
            }
            if let Some(family) = &settings.font_family {
                out.font_family = family.clone();
            }
        }
        out
    }

    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = Some(language.into());
        self
    }

    pub fn with_stylesheet(mut self, stylesheet: Stylesheet) -> Self {
        self.stylesheet = Some(stylesheet);
        self
    }

    pub fn with_backend(mut self, backend: HighlighterBackend) -> Self {
        self.backend = backend;
        self
    }

    pub fn with_font_size(mut self, font_size: f64) -> Self {
        self.font_size = font_size;
        self
    }

    pub fn with_font_family(mut self, font_family: impl Into<String>) -> Self {
        self.font_family = font_family.into();
        self
    }

    fn text_options(&self) -> CodeTextOptions {
        CodeTextOptions {
            font_family: self.font_family.clone(),
            font_size: self.font_size,
        }
    }
}

/// Owns the lazily detected tokenizer and the stylesheet cache.
///
/// The loader runs at most once per runtime; its answer (including "nothing available") is kept
/// for the runtime's lifetime.
pub struct HighlightRuntime {
    loader: Loader,
    detected: OnceLock<Option<SharedHighlighter>>,
    styles: StyleCache,
}

impl Default for HighlightRuntime {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for HighlightRuntime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HighlightRuntime")
            .field("detected", &self.detected.get().map(Option::is_some))
            .field("cached_stylesheets", &self.styles.len())
            .finish()
    }
}

static SHARED: LazyLock<Arc<HighlightRuntime>> = LazyLock::new(|| Arc::new(HighlightRuntime::new()));

impl HighlightRuntime {
    /// Runtime backed by the compiled-in tokenizer (syntect with the `syntect` feature).
    pub fn new() -> Self {
        Self::with_loader(default_loader)
    }

    pub fn with_loader(
        loader: impl Fn() -> Option<SharedHighlighter> + Send + Sync + 'static,
    ) -> Self {
        Self {
            loader: Box::new(loader),
            detected: OnceLock::new(),
            styles: StyleCache::new(),
        }
    }

    pub fn with_highlighter(highlighter: impl TokenHighlighter + Send + Sync + 'static) -> Self {
        let shared: SharedHighlighter = Arc::new(highlighter);
        Self::with_loader(move || Some(Arc::clone(&shared)))
    }

    pub fn unavailable() -> Self {
        Self::with_loader(|| None)
    }

    /// Process-wide runtime.
    pub fn shared() -> Arc<HighlightRuntime> {
        Arc::clone(&SHARED)
    }

    fn highlighter(&self) -> Option<&SharedHighlighter> {
        self.detected
            .get_or_init(|| {
                let found = (self.loader)();
                debug!(available = found.is_some(), "detected syntax highlighting backend");
                found
            })
            .as_ref()
    }

    pub fn is_available(&self) -> bool {
        self.highlighter().is_some()
    }

    pub fn styles(&self) -> &StyleCache {
        &self.styles
    }

    pub fn transformed(
        &self,
        stylesheet: Option<&Stylesheet>,
        backend: HighlighterBackend,
    ) -> Arc<TransformedStylesheet> {
        match stylesheet {
            Some(sheet) => self.styles.get_or_transform(sheet, backend),
            None => Arc::new(TransformedStylesheet::default()),
        }
    }

    /// Highlighted code as `scroll(horizontal) > view > row*`.
    ///
    /// Without a tokenizer, or when tokenizing fails, returns [`plain_code`].
    pub fn render(&self, code: &str, options: &HighlightOptions) -> Fragment {
        let Some(highlighter) = self.highlighter() else {
            return plain_code(code, options);
        };
        let rows = match highlighter.tokenize(code, options.language.as_deref(), options.backend) {
            Ok(rows) => rows,
            Err(err) => {
                debug!(error = %err, "highlighting failed; rendering plain code");
                return plain_code(code, options);
            }
        };

        let sheet = self.transformed(options.stylesheet.as_ref(), options.backend);
        let segments = render_rows(&rows, &sheet.styles, &sheet.default_color, &options.text_options());
        let code_view = ViewBox::new()
            .style(sheet.code_style().cloned().unwrap_or_default())
            .children(segments);

        ScrollBox::horizontal()
            .style(sheet.root_style(options.backend).cloned().unwrap_or_default())
            .children(vec![code_view.into()])
            .into()
    }
}

/// Unhighlighted, monospaced code in a horizontal scroll container.
pub fn plain_code(code: &str, options: &HighlightOptions) -> Fragment {
    let run = TextRun::new()
        .style(style! {
            "fontFamily" => options.font_family.as_str(),
            "fontSize" => options.font_size,
            "color" => DEFAULT_CODE_COLOR,
        })
        .child(code);
    ScrollBox::horizontal().children(vec![run.into()]).into()
}

#[cfg(feature = "syntect")]
fn default_loader() -> Option<SharedHighlighter> {
    Some(Arc::new(crate::syntect::SyntectTokenizer::new()))
}

#[cfg(not(feature = "syntect"))]
fn default_loader() -> Option<SharedHighlighter> {
    None
}
