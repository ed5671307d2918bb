use std::fmt;
use std::ops::{Deref, Range};
use std::sync::Arc;

/// Source text spanned by a node.
///
/// Parsed nodes share one copy of the file and keep only their byte range,
/// so a tree costs the same whatever its depth.
#[derive(Clone)]
pub struct SourceText {
    source: Arc<str>,
    range: Range<usize>,
}

impl SourceText {
    /// A slice of `source`. `range` must fall on char boundaries.
    pub(crate) fn slice(source: &Arc<str>, range: Range<usize>) -> Self {
        debug_assert!(source.get(range.clone()).is_some(), "span {range:?} is not a str slice");
        Self {
            source: Arc::clone(source),
            range,
        }
    }

    pub fn as_str(&self) -> &str {
        &self.source[self.range.clone()]
    }
}

impl Deref for SourceText {
    type Target = str;

    fn deref(&self) -> &str {
        self.as_str()
    }
}

impl AsRef<str> for SourceText {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl From<String> for SourceText {
    fn from(text: String) -> Self {
        let range = 0..text.len();
        Self {
            source: Arc::from(text),
            range,
        }
    }
}

impl From<&str> for SourceText {
    fn from(text: &str) -> Self {
        Self {
            source: Arc::from(text),
            range: 0..text.len(),
        }
    }
}

impl fmt::Debug for SourceText {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self.as_str(), f)
    }
}

impl fmt::Display for SourceText {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl PartialEq for SourceText {
    fn eq(&self, other: &Self) -> bool {
        self.as_str() == other.as_str()
    }
}

impl Eq for SourceText {}

impl PartialEq<str> for SourceText {
    fn eq(&self, other: &str) -> bool {
        self.as_str() == other
    }
}

impl PartialEq<&str> for SourceText {
    fn eq(&self, other: &&str) -> bool {
        self.as_str() == *other
    }
}

impl PartialEq<String> for SourceText {
    fn eq(&self, other: &String) -> bool {
        self.as_str() == other
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slices_share_the_source() {
        let source: Arc<str> = Arc::from("const x = 10;");
        let name = SourceText::slice(&source, 6..7);
        let number = SourceText::slice(&source, 10..12);

        assert_eq!(name, "x");
        assert_eq!(number.len(), 2);
        assert_eq!(Arc::strong_count(&source), 3);
    }

    #[test]
    fn owned_text_compares_by_content() {
        let source: Arc<str> = Arc::from("let y = 1;");
        assert_eq!(SourceText::slice(&source, 4..5), SourceText::from("y"));
        assert_eq!(format!("{:?}", SourceText::from("y")), "\"y\"");
    }
}
