//! Thread-local cache of compiled ast-grep patterns.
//!
//! A batch edit evaluates the same pattern once per file, so compiling it
//! once per thread saves a tree-sitter parse of the pattern for every file.
//! Capped at 256 entries; the whole cache is dropped when full.

use ast_grep_core::Pattern;
use ast_grep_language::SupportLang;
use std::cell::RefCell;
use std::collections::HashMap;

const MAX_CACHE_ENTRIES: usize = 256;

thread_local! {
    // Keyed by "<lang>:<pattern>": `$A.b` is a different tree per grammar.
    static PATTERN_CACHE: RefCell<HashMap<String, Pattern>> =
        RefCell::new(HashMap::new());
}

/// Compile `pattern` for `lang`, reusing an earlier compilation when possible.
///
/// Returns the compiler's message when the pattern is not valid for the grammar.
/// Failures are not cached.
pub fn compile_pattern(pattern: &str, lang: SupportLang) -> Result<Pattern, String> {
    let key = format!("{lang:?}:{pattern}");

    PATTERN_CACHE.with(|cache| {
        let mut cache = cache.borrow_mut();
        if let Some(compiled) = cache.get(&key) {
            return Ok(compiled.clone());
        }

        let compiled = Pattern::try_new(pattern, lang).map_err(|e| e.to_string())?;
        if cache.len() >= MAX_CACHE_ENTRIES {
            cache.clear();
        }
        cache.insert(key, compiled.clone());
        Ok(compiled)
    })
}

pub fn cached_patterns() -> usize {
    PATTERN_CACHE.with(|cache| cache.borrow().len())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_pattern_compiles_once_per_language() {
        let before = cached_patterns();
        compile_pattern("let $A = $B", SupportLang::TypeScript).unwrap();
        compile_pattern("let $A = $B", SupportLang::TypeScript).unwrap();
        compile_pattern("let $A = $B", SupportLang::Rust).unwrap();
        assert_eq!(cached_patterns(), before + 2);
    }
}
