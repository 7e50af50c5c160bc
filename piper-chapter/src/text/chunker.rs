//! Text chunking for TTS processing.

use super::boundaries::{Span, char_len, is_unspaced_language, sentence_spans, word_spans};
use super::TextChunk;

/// Default maximum chunk size in characters.
pub const DEFAULT_MAX_CHARS: usize = 1000;

/// Split text into TTS-friendly chunks.
///
/// Sentences are packed greedily into chunks of at most `max_chars`
/// characters. A sentence that does not fit on its own is split on word
/// boundaries, and a single word longer than `max_chars` becomes its own
/// oversized chunk rather than being cut.
///
/// # Arguments
/// * `text` - The text to chunk
/// * `max_chars` - Maximum chunk size in characters (0 is treated as 1)
/// * `language` - Language code; `zh*` and `ja*` allow breaks between characters
///
/// # Returns
/// Chunks numbered from 1, each a whitespace-trimmed slice of `text`.
pub fn split_text(text: &str, max_chars: usize, language: &str) -> Vec<TextChunk> {
    let unspaced = is_unspaced_language(language);
    let mut packer = Packer::new(text, max_chars.max(1));

    for sentence in sentence_spans(text) {
        if char_len(text, sentence) <= packer.max {
            packer.push(sentence);
            continue;
        }

        // Long sentences get chunks of their own
        packer.flush();
        for word in word_spans(text, sentence, unspaced) {
            packer.push(word);
        }
        packer.flush();
    }

    packer
        .finish()
        .into_iter()
        .enumerate()
        .map(|(i, (start, end))| TextChunk::new(i + 1, &text[start..end]))
        .collect()
}

/// Greedy accumulator of spans into chunk spans.
struct Packer<'a> {
    text: &'a str,
    max: usize,
    /// Span of the chunk being built and its length in characters
    current: Option<(Span, usize)>,
    done: Vec<Span>,
}

impl<'a> Packer<'a> {
    fn new(text: &'a str, max: usize) -> Self {
        Self {
            text,
            max,
            current: None,
            done: Vec::new(),
        }
    }

    fn push(&mut self, unit: Span) {
        match self.current {
            Some(((start, end), len)) => {
                // Includes the whitespace between the current chunk and the unit
                let joined = len + char_len(self.text, (end, unit.1));
                if joined <= self.max {
                    self.current = Some(((start, unit.1), joined));
                } else {
                    self.done.push((start, end));
                    self.current = Some((unit, char_len(self.text, unit)));
                }
            }
            None => self.current = Some((unit, char_len(self.text, unit))),
        }
    }

    fn flush(&mut self) {
        if let Some((span, _)) = self.current.take() {
            self.done.push(span);
        }
    }

    fn finish(mut self) -> Vec<Span> {
        self.flush();
        self.done
    }
}
