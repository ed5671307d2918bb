//! Language lookup for the bundled grammars.

use ast_grep_language::SupportLang;
use std::path::Path;

/// Pick a grammar from a file's extension.
pub fn language_for_path(path: &Path) -> Option<SupportLang> {
    let ext = path.extension()?.to_str()?;
    language_for_extension(ext)
}

fn language_for_extension(ext: &str) -> Option<SupportLang> {
    match ext {
        "rs" => Some(SupportLang::Rust),
        "ts" | "mts" | "cts" => Some(SupportLang::TypeScript),
        "tsx" => Some(SupportLang::Tsx),
        "js" | "jsx" | "mjs" | "cjs" => Some(SupportLang::JavaScript),
        "py" => Some(SupportLang::Python),
        "go" => Some(SupportLang::Go),
        "json" => Some(SupportLang::Json),
        _ => None,
    }
}

/// Pick a grammar by name, as written in edit plans and on the command line.
///
/// Accepts the language name or one of its file extensions.
pub fn language_named(name: &str) -> Option<SupportLang> {
    match name.to_ascii_lowercase().as_str() {
        "rust" => Some(SupportLang::Rust),
        "typescript" => Some(SupportLang::TypeScript),
        "javascript" => Some(SupportLang::JavaScript),
        "python" => Some(SupportLang::Python),
        "golang" => Some(SupportLang::Go),
        other => language_for_extension(other),
    }
}

/// Infer a grammar from the extension a glob pattern ends with, e.g. `src/**/*.ts`.
pub fn language_for_glob(glob: &str) -> Option<SupportLang> {
    let (_, ext) = glob.rsplit_once('.')?;
    if ext.contains(['*', '?', '/', '{', '[']) {
        return None;
    }
    language_for_extension(ext)
}
