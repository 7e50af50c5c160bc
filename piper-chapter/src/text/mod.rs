//! Text processing for TTS: sentence boundaries and chunking.

mod boundaries;
pub mod chunker;

pub use chunker::{DEFAULT_MAX_CHARS, split_text};

/// A chunk of text ready for one synthesis call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextChunk {
    /// 1-based position of this chunk within its request
    pub index: usize,
    /// The text content, a slice of the original with no edge whitespace
    pub text: String,
}

impl TextChunk {
    /// Create a new text chunk.
    pub fn new(index: usize, text: impl Into<String>) -> Self {
        Self {
            index,
            text: text.into(),
        }
    }

    /// Length in characters, the unit the chunk bound is expressed in.
    pub fn char_count(&self) -> usize {
        self.text.chars().count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_chunk_creation() {
        let chunk = TextChunk::new(1, "Hello world");
        assert_eq!(chunk.index, 1);
        assert_eq!(chunk.text, "Hello world");
    }

    #[test]
    fn test_char_count_is_not_byte_length() {
        let chunk = TextChunk::new(1, "héllo 世界");
        assert_eq!(chunk.char_count(), 8);
        assert!(chunk.text.len() > 8);
    }
}
