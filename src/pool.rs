//! Thread-local tree-sitter parser pooling.
//!
//! A `tree_sitter::Parser` is configured for one language and needs `&mut`
//! access to parse, so each thread keeps one parser per language and hands
//! it out on demand. Parsers are created on first use.

use crate::ts::TreeSitterError;
use ast_grep_language::{LanguageExt, SupportLang};
use std::cell::RefCell;
use std::collections::HashMap;
use tree_sitter::Parser;

thread_local! {
    static PARSERS: RefCell<HashMap<String, Parser>> = RefCell::new(HashMap::new());
}

/// Execute `f` with this thread's parser for `lang`.
///
/// # Example
///
/// ```no_run
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// use ast_grep_language::SupportLang;
/// use tree_patcher::pool::with_parser;
///
/// let kind = with_parser(SupportLang::Rust, |parser| {
///     parser.parse("fn main() {}", None).map(|t| t.root_node().kind().to_string())
/// })?;
/// # Ok(())
/// # }
/// ```
pub fn with_parser<F, R>(lang: SupportLang, f: F) -> Result<R, TreeSitterError>
where
    F: FnOnce(&mut Parser) -> R,
{
    let key = format!("{lang:?}");
    PARSERS.with(|cell| {
        let mut parsers = cell.borrow_mut();
        let parser = match parsers.entry(key) {
            std::collections::hash_map::Entry::Occupied(slot) => slot.into_mut(),
            std::collections::hash_map::Entry::Vacant(slot) => {
                let mut parser = Parser::new();
                parser
                    .set_language(&lang.get_ts_language())
                    .map_err(|_| TreeSitterError::LanguageSet {
                        language: slot.key().clone(),
                    })?;
                slot.insert(parser)
            }
        };
        Ok(f(parser))
    })
}

/// Number of parsers cached on this thread.
pub fn pooled_parsers() -> usize {
    PARSERS.with(|cell| cell.borrow().len())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reuses_parser_per_language() {
        with_parser(SupportLang::Rust, |p| p.parse("fn a() {}", None)).unwrap();
        let before = pooled_parsers();
        with_parser(SupportLang::Rust, |p| p.parse("fn b() {}", None)).unwrap();
        assert_eq!(pooled_parsers(), before);

        with_parser(SupportLang::Python, |p| p.parse("x = 1", None)).unwrap();
        assert_eq!(pooled_parsers(), before + 1);
    }
}
