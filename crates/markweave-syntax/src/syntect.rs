use markweave_core::text::HighlightError;
use markweave_core::text::TokenHighlighter;
use markweave_core::text::TokenNode;
use markweave_core::theme::HighlighterBackend;
use syntect::parsing::BasicScopeStackOp;
use syntect::parsing::ParseState;
use syntect::parsing::Scope;
use syntect::parsing::ScopeStack;
use syntect::parsing::SyntaxReference;
use syntect::parsing::SyntaxSet;
use syntect::util::LinesWithEndings;

/// Tokenizes code with syntect grammars and emits class-named token trees.
///
/// Each scope becomes a `span` whose classes are the scope's atoms (`hljs-keyword`,
/// `hljs-control`, ... for hljs; `token keyword control ...` for prism). Scopes still open at the
/// end of a line are reopened on the next one, so every row stands alone.
pub struct SyntectTokenizer {
    syntax_set: SyntaxSet,
}

impl SyntectTokenizer {
    pub fn new() -> Self {
        Self {
            syntax_set: SyntaxSet::load_defaults_newlines(),
        }
    }

    fn syntax_for(&self, language: Option<&str>) -> &SyntaxReference {
        if let Some(lang) = language {
            if let Some(syntax) = self.syntax_set.find_syntax_by_extension(lang) {
                return syntax;
            }
            if let Some(syntax) = self.syntax_set.find_syntax_by_token(lang) {
                return syntax;
            }
        }
        self.syntax_set.find_syntax_plain_text()
    }
}

impl Default for SyntectTokenizer {
    fn default() -> Self {
        Self::new()
    }
}

impl TokenHighlighter for SyntectTokenizer {
    fn tokenize(
        &self,
        code: &str,
        language: Option<&str>,
        backend: HighlighterBackend,
    ) -> Result<Vec<TokenNode>, HighlightError> {
        let syntax = self.syntax_for(language);
        let mut state = ParseState::new(syntax);
        let mut stack = ScopeStack::new();

        let mut rows = Vec::new();
        for line in LinesWithEndings::from(code) {
            let ops = state
                .parse_line(line, &self.syntax_set)
                .map_err(|e| HighlightError::Tokenize(e.to_string()))?;
            let content_len = line.trim_end_matches(['\n', '\r']).len();

            let mut row = RowBuilder::new(backend);
            for scope in stack.as_slice() {
                row.push(*scope);
            }

            let mut pos = 0;
            for (index, op) in ops {
                row.text(line, pos, index.min(content_len));
                pos = pos.max(index);
                stack
                    .apply_with_hook(&op, |basic, _| match basic {
                        BasicScopeStackOp::Push(scope) => row.push(scope),
                        BasicScopeStackOp::Pop => row.pop(),
                    })
                    .map_err(|e| HighlightError::Tokenize(format!("{e:?}")))?;
            }
            row.text(line, pos, content_len);
            rows.push(row.finish());
        }
        Ok(rows)
    }
}

struct RowBuilder {
    backend: HighlighterBackend,
    root: Vec<TokenNode>,
    open: Vec<(Vec<String>, Vec<TokenNode>)>,
}

impl RowBuilder {
    fn new(backend: HighlighterBackend) -> Self {
        Self {
            backend,
            root: Vec::new(),
            open: Vec::new(),
        }
    }

    fn current(&mut self) -> &mut Vec<TokenNode> {
        match self.open.last_mut() {
            Some((_, children)) => children,
            None => &mut self.root,
        }
    }

    fn text(&mut self, line: &str, start: usize, end: usize) {
        if start >= end {
            return;
        }
        if let Some(s) = line.get(start..end) {
            self.current().push(TokenNode::text(s));
        }
    }

    fn push(&mut self, scope: Scope) {
        let classes = class_names(scope, self.backend);
        self.open.push((classes, Vec::new()));
    }

    fn pop(&mut self) {
        if let Some((class_names, children)) = self.open.pop() {
            self.current().push(TokenNode::Element {
                tag: "span".to_string(),
                class_names,
                children,
            });
        }
    }

    fn finish(mut self) -> TokenNode {
        while !self.open.is_empty() {
            self.pop();
        }
        TokenNode::span(&[], self.root)
    }
}

fn class_names(scope: Scope, backend: HighlighterBackend) -> Vec<String> {
    let name = scope.build_string();
    let atoms = name.split('.').filter(|a| !a.is_empty());
    match backend {
        HighlighterBackend::Hljs => atoms.map(|a| format!("hljs-{a}")).collect(),
        HighlighterBackend::Prism => std::iter::once("token".to_string())
            .chain(atoms.map(str::to_string))
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn classes(node: &TokenNode, out: &mut Vec<String>) {
        if let TokenNode::Element {
            class_names,
            children,
            ..
        } = node
        {
            out.extend(class_names.iter().cloned());
            for child in children {
                classes(child, out);
            }
        }
    }

    fn text(node: &TokenNode) -> String {
        match node {
            TokenNode::Text { value } => value.clone(),
            TokenNode::Element { children, .. } => children.iter().map(text).collect(),
        }
    }

    #[test]
    fn one_row_per_line_without_newlines() {
        let t = SyntectTokenizer::new();
        let rows = t
            .tokenize("fn main() {\n    let x = 1;\n}\n", Some("rs"), HighlighterBackend::Hljs)
            .unwrap();
        assert_eq!(rows.len(), 3);
        assert_eq!(text(&rows[0]), "fn main() {");
        assert_eq!(text(&rows[1]), "    let x = 1;");
    }

    #[test]
    fn emits_backend_specific_class_names() {
        let t = SyntectTokenizer::new();
        let hljs = t.tokenize("let x = 1;", Some("rs"), HighlighterBackend::Hljs).unwrap();
        let mut names = Vec::new();
        classes(&hljs[0], &mut names);
        assert!(names.iter().any(|c| c == "hljs-source"));
        assert!(names.iter().all(|c| c.starts_with("hljs-")));

        let prism = t.tokenize("let x = 1;", Some("rs"), HighlighterBackend::Prism).unwrap();
        let mut names = Vec::new();
        classes(&prism[0], &mut names);
        assert!(names.iter().any(|c| c == "token"));
    }

    #[test]
    fn unknown_language_falls_back_to_plain_text() {
        let t = SyntectTokenizer::new();
        let rows = t
            .tokenize("whatever", Some("unknown-lang"), HighlighterBackend::Hljs)
            .unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(text(&rows[0]), "whatever");
    }
}
