//! Sentence and word boundary detection over byte spans of the source text.
//!
//! Every span returned here starts and ends on a non-whitespace character, and
//! only whitespace lies between consecutive spans.

use once_cell::sync::Lazy;
use regex::Regex;

/// Byte range `[start, end)` into the source text.
pub type Span = (usize, usize);

/// Sentence terminators. Latin punctuation needs trailing whitespace to count,
/// full-width terminators end a sentence on their own.
static SENTENCE_END: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"[.!?…]+["'”’»)\]]*\s+|[。！？]+[」』”’）]*\s*"#)
        .expect("sentence boundary pattern should compile")
});

/// Languages written without spaces between words.
pub fn is_unspaced_language(language: &str) -> bool {
    let lang = language.trim().to_ascii_lowercase();
    lang.starts_with("zh") || lang.starts_with("ja")
}

/// Character count of a span.
pub fn char_len(text: &str, span: Span) -> usize {
    text[span.0..span.1].chars().count()
}

/// Split text into trimmed sentence spans.
pub fn sentence_spans(text: &str) -> Vec<Span> {
    let mut spans = Vec::new();
    let mut start = 0;

    for m in SENTENCE_END.find_iter(text) {
        push_trimmed(text, start, m.end(), &mut spans);
        start = m.end();
    }
    push_trimmed(text, start, text.len(), &mut spans);

    spans
}

/// Split a span into word spans.
///
/// With `unspaced` set, each CJK character is a word of its own while runs of
/// other characters (Latin words, digits) stay together.
pub fn word_spans(text: &str, span: Span, unspaced: bool) -> Vec<Span> {
    let mut spans = Vec::new();
    let mut word_start: Option<usize> = None;

    for (offset, c) in text[span.0..span.1].char_indices() {
        let at = span.0 + offset;
        if c.is_whitespace() {
            if let Some(start) = word_start.take() {
                spans.push((start, at));
            }
        } else if unspaced && is_cjk(c) {
            if let Some(start) = word_start.take() {
                spans.push((start, at));
            }
            spans.push((at, at + c.len_utf8()));
        } else if word_start.is_none() {
            word_start = Some(at);
        }
    }

    if let Some(start) = word_start {
        spans.push((start, span.1));
    }

    spans
}

fn push_trimmed(text: &str, start: usize, end: usize, spans: &mut Vec<Span>) {
    let slice = &text[start..end];
    let trimmed = slice.trim();
    if trimmed.is_empty() {
        return;
    }
    let lead = slice.len() - slice.trim_start().len();
    spans.push((start + lead, start + lead + trimmed.len()));
}

fn is_cjk(c: char) -> bool {
    matches!(c as u32,
        0x3000..=0x303F // CJK symbols and punctuation
        | 0x3040..=0x30FF // Hiragana, Katakana
        | 0x3400..=0x4DBF
        | 0x4E00..=0x9FFF
        | 0xF900..=0xFAFF
        | 0xFF00..=0xFFEF // Full-width forms
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn slices<'a>(text: &'a str, spans: &[Span]) -> Vec<&'a str> {
        spans.iter().map(|&(s, e)| &text[s..e]).collect()
    }

    #[test]
    fn test_sentence_spans() {
        let text = "Hello world.  How are you?\nFine!";
        let spans = sentence_spans(text);
        assert_eq!(slices(text, &spans), vec!["Hello world.", "How are you?", "Fine!"]);
    }

    #[test]
    fn test_sentence_keeps_closing_quote() {
        let text = "\"Stop.\" She left.";
        let spans = sentence_spans(text);
        assert_eq!(slices(text, &spans), vec!["\"Stop.\"", "She left."]);
    }

    #[test]
    fn test_abbreviation_without_space_is_not_a_boundary() {
        let text = "Version 1.2 shipped.";
        assert_eq!(sentence_spans(text).len(), 1);
    }

    #[test]
    fn test_full_width_terminators() {
        let text = "你好。今天很好！";
        let spans = sentence_spans(text);
        assert_eq!(slices(text, &spans), vec!["你好。", "今天很好！"]);
    }

    #[test]
    fn test_whitespace_only() {
        assert!(sentence_spans("  \n\t ").is_empty());
    }

    #[test]
    fn test_word_spans() {
        let text = "  one two\tthree ";
        let spans = word_spans(text, (0, text.len()), false);
        assert_eq!(slices(text, &spans), vec!["one", "two", "three"]);
    }

    #[test]
    fn test_word_spans_unspaced() {
        let text = "我爱Rust语言";
        let spans = word_spans(text, (0, text.len()), true);
        assert_eq!(slices(text, &spans), vec!["我", "爱", "Rust", "语", "言"]);
    }

    #[test]
    fn test_is_unspaced_language() {
        assert!(is_unspaced_language("zh-CN"));
        assert!(is_unspaced_language("ja"));
        assert!(!is_unspaced_language("en-US"));
    }
}
