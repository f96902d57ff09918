use crate::theme::HighlighterBackend;

/// Tokenized code, shaped like the element trees emitted by class-based highlighters.
#[derive(Clone, Debug, PartialEq)]
pub enum TokenNode {
    Text {
        value: String,
    },
    Element {
        tag: String,
        class_names: Vec<String>,
        children: Vec<TokenNode>,
    },
}

impl TokenNode {
    pub fn text(value: impl Into<String>) -> Self {
        Self::Text {
            value: value.into(),
        }
    }

    pub fn span(class_names: &[&str], children: Vec<TokenNode>) -> Self {
        Self::Element {
            tag: "span".to_string(),
            class_names: class_names.iter().map(|c| (*c).to_string()).collect(),
            children,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum HighlightError {
    #[error("failed to tokenize code: {0}")]
    Tokenize(String),
}

/// A highlighting backend: turns source code into one token tree per line.
pub trait TokenHighlighter {
    fn tokenize(
        &self,
        code: &str,
        language: Option<&str>,
        backend: HighlighterBackend,
    ) -> Result<Vec<TokenNode>, HighlightError>;
}

/// Emits every line as a single unstyled text token.
pub struct NoHighlight;

impl TokenHighlighter for NoHighlight {
    fn tokenize(
        &self,
        code: &str,
        _language: Option<&str>,
        _backend: HighlighterBackend,
    ) -> Result<Vec<TokenNode>, HighlightError> {
        Ok(code.lines().map(TokenNode::text).collect())
    }
}
