use crate::parse::{FileParser, ParseError, QueryIncompatible};
use crate::path::PathExpression;
use crate::pool::with_parser;
use crate::tree::{SourceText, TreeNode};
use crate::ts::errors::TreeSitterError;
use crate::ts::lang::language_for_path;
use ast_grep_language::{LanguageExt, SupportLang};
use std::path::Path;
use std::sync::Arc;

/// [`FileParser`] backed by a tree-sitter grammar.
///
/// Every tree-sitter node, named or anonymous, becomes a [`TreeNode`] named
/// after its kind, so `:` and `=` tokens are addressable alongside
/// `type_annotation` and friends.
#[derive(Debug, Clone)]
pub struct TreeSitterParser {
    lang: SupportLang,
    root_name: String,
}

impl TreeSitterParser {
    /// Create a parser for one of the bundled grammars.
    pub fn for_language(lang: SupportLang) -> Result<Self, TreeSitterError> {
        let root_name = with_parser(lang, |parser| {
            parser.parse("", None).map(|tree| tree.root_node().kind().to_string())
        })?
        .ok_or_else(|| TreeSitterError::ParseFailed {
            language: format!("{lang:?}"),
        })?;

        Ok(Self { lang, root_name })
    }

    /// Create a parser for the grammar matching a file's extension.
    pub fn for_path(path: &Path) -> Result<Self, TreeSitterError> {
        let lang = language_for_path(path)
            .ok_or_else(|| TreeSitterError::UnknownLanguage(path.display().to_string()))?;
        Self::for_language(lang)
    }

    /// The grammar this parser uses.
    pub fn language(&self) -> SupportLang {
        self.lang
    }
}

impl FileParser for TreeSitterParser {
    fn root_name(&self) -> &str {
        &self.root_name
    }

    fn to_ast(&self, path: &Path, content: &str) -> Result<Arc<TreeNode>, ParseError> {
        with_parser(self.lang, |parser| {
            let tree = parser
                .parse(content, None)
                .ok_or_else(|| ParseError::new(path, "parser produced no tree"))?;
            let root = tree.root_node();

            if let Some(error) = first_error(root) {
                let at = error.start_position();
                let what = if error.is_missing() {
                    format!("missing '{}'", error.kind())
                } else {
                    "syntax error".to_string()
                };
                return Err(ParseError::new(
                    path,
                    format!("{what} at {}:{}", at.row + 1, at.column + 1),
                ));
            }

            Ok(Arc::new(convert(root, content)))
        })
        .map_err(|e| ParseError::new(path, e.to_string()))?
    }

    fn validate(&self, query: &PathExpression) -> Result<(), QueryIncompatible> {
        let language = self.lang.get_ts_language();
        for name in query.name_tests() {
            let known = language.id_for_node_kind(name, true) != 0
                || language.id_for_node_kind(name, false) != 0;
            if !known {
                return Err(QueryIncompatible {
                    query: query.to_string(),
                    root_name: self.root_name.clone(),
                    name: name.to_string(),
                });
            }
        }
        Ok(())
    }
}

// Pre-order walk with a cursor. `open` holds the nodes whose children are
// still being collected; a node is attached to its parent once the cursor
// leaves it.
fn convert(root: tree_sitter::Node<'_>, source: &str) -> TreeNode {
    let text: Arc<str> = Arc::from(source);
    let located = |node: tree_sitter::Node<'_>| TreeNode {
        name: node.kind().to_string(),
        value: SourceText::slice(&text, node.byte_range()),
        children: Vec::with_capacity(node.child_count()),
        offset: Some(node.start_byte()),
    };

    let mut cursor = root.walk();
    let mut open = vec![located(root)];
    loop {
        if cursor.goto_first_child() {
            open.push(located(cursor.node()));
            continue;
        }

        while let Some(done) = open.pop() {
            let Some(parent) = open.last_mut() else {
                return done;
            };
            parent.children.push(Arc::new(done));
            if cursor.goto_next_sibling() {
                open.push(located(cursor.node()));
                break;
            }
            cursor.goto_parent();
        }
    }
}

fn first_error(root: tree_sitter::Node<'_>) -> Option<tree_sitter::Node<'_>> {
    let mut pending = vec![root];
    while let Some(node) = pending.pop() {
        if node.is_error() || node.is_missing() {
            return Some(node);
        }
        if node.has_error() {
            let mut cursor = node.walk();
            let children: Vec<_> = node.children(&mut cursor).collect();
            pending.extend(children.into_iter().rev());
        }
    }
    None
}
