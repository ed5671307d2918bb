use thiserror::Error;

#[derive(Error, Debug)]
pub enum TreeSitterError {
    #[error("failed to set language {language} for parser")]
    LanguageSet { language: String },

    #[error("tree-sitter returned no tree for {language} source")]
    ParseFailed { language: String },

    #[error("no grammar registered for {0}")]
    UnknownLanguage(String),
}
