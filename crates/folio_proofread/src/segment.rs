//! Sentence segmentation and indexing.
//!
//! Sentences end at terminal punctuation followed by whitespace, or at a line
//! break. The abbreviation-aware mode additionally refuses to split after
//! common abbreviations, single initials and ellipses.

use serde::{Deserialize, Serialize};
use std::ops::Range;

/// Abbreviations that do not end a sentence, compared without the final dot.
const ABBREVIATIONS: &[&str] = &[
    "mr", "mrs", "ms", "dr", "prof", "sr", "jr", "st", "vs", "etc", "e.g", "i.e", "mt", "lt",
    "col", "gen", "capt", "sgt", "rev", "fig",
];

/// Capitalised words that usually start a sentence rather than continue a name.
const SENTENCE_OPENERS: &[&str] = &[
    "a", "after", "an", "and", "at", "before", "but", "he", "her", "his", "how", "in", "it",
    "its", "my", "no", "on", "our", "she", "so", "that", "the", "their", "then", "there",
    "they", "this", "we", "what", "when", "why", "yes", "you",
];

/// Characters that may trail terminal punctuation inside the same sentence.
const CLOSERS: &[char] = &['"', '\'', '\u{201D}', '\u{2019}', ')', ']', '*', '_'];

/// Characters that may open a word before an abbreviation.
const OPENERS: &[char] = &['"', '\'', '\u{201C}', '\u{2018}', '(', '[', '*', '_'];

/// How to split chapter text into sentences.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Segmentation {
    /// Skip abbreviations, initials and ellipses
    #[default]
    AbbreviationAware,
    /// Split after every terminal punctuation run
    Plain,
}

fn is_terminal(ch: char) -> bool {
    matches!(ch, '.' | '!' | '?' | '\u{2026}')
}

/// Split `text` into trimmed, non-empty sentences.
///
/// # Examples
///
/// ```
/// use folio_proofread::{Segmentation, segment};
///
/// let text = "Mr. Holt waited... Then he left. Why?";
/// let sentences = segment(text, Segmentation::AbbreviationAware);
/// assert_eq!(sentences, vec!["Mr. Holt waited... Then he left.", "Why?"]);
///
/// let plain = segment("Mr. Holt left.", Segmentation::Plain);
/// assert_eq!(plain, vec!["Mr.", "Holt left."]);
/// ```
pub fn segment(text: &str, mode: Segmentation) -> Vec<String> {
    spans(text, mode)
        .into_iter()
        .map(|span| text[span].to_string())
        .collect()
}

fn spans(text: &str, mode: Segmentation) -> Vec<Range<usize>> {
    let chars: Vec<(usize, char)> = text.char_indices().collect();
    let offset = |i: usize| chars.get(i).map_or(text.len(), |(pos, _)| *pos);
    let mut out = Vec::new();
    let mut start = 0;
    let mut i = 0;

    while i < chars.len() {
        let (pos, ch) = chars[i];
        if ch == '\n' {
            push_trimmed(&mut out, text, start, pos);
            start = pos + 1;
            i += 1;
            continue;
        }
        if !is_terminal(ch) {
            i += 1;
            continue;
        }

        let mut j = i;
        while j < chars.len() && is_terminal(chars[j].1) {
            j += 1;
        }
        let run = &text[pos..offset(j)];
        while j < chars.len() && CLOSERS.contains(&chars[j].1) {
            j += 1;
        }
        let at_break = chars.get(j).is_none_or(|(_, c)| c.is_whitespace());

        if at_break
            && (mode == Segmentation::Plain || !suppressed(text, start, pos, run, offset(j)))
        {
            push_trimmed(&mut out, text, start, offset(j));
            start = offset(j);
        }
        i = j;
    }
    push_trimmed(&mut out, text, start, text.len());
    out
}

/// Whether a terminal run does not end the sentence in abbreviation-aware mode.
fn suppressed(text: &str, start: usize, run_start: usize, run: &str, after: usize) -> bool {
    if run.contains("...") || run.contains('\u{2026}') {
        return true;
    }
    if run != "." {
        return false;
    }

    let word = text[start..run_start]
        .rsplit(char::is_whitespace)
        .next()
        .unwrap_or_default()
        .trim_start_matches(OPENERS);
    let lower = word.to_lowercase();

    if ABBREVIATIONS.contains(&lower.as_str()) {
        return true;
    }
    // Single initial, as in "J. R. Tolkien"
    if is_initial(word) && continues_name(text, start, run_start, after) {
        return true;
    }
    // Dotted abbreviation such as "U.S" or "a.m"
    if word.contains('.') && word.chars().all(|c| c == '.' || c.is_alphabetic()) {
        return true;
    }
    // "No. 5" but not "She said no."
    lower == "no"
        && text[after..]
            .trim_start()
            .starts_with(|c: char| c.is_ascii_digit())
}

/// One capital letter other than the pronoun "I".
fn is_initial(word: &str) -> bool {
    let mut letters = word.chars();
    matches!((letters.next(), letters.next()), (Some(c), None) if c.is_uppercase() && c != 'I')
}

/// Whether the words around an initial read as part of a name.
///
/// The next word must be another initial, or a capitalised surname-like word
/// when the initial opens the sentence or follows a capitalised word.
fn continues_name(text: &str, start: usize, run_start: usize, after: usize) -> bool {
    let Some(next) = text[after..].split_whitespace().next() else {
        return false;
    };
    let next = next.trim_start_matches(OPENERS);
    if next.strip_suffix('.').is_some_and(is_initial) {
        return true;
    }

    let name = next.trim_end_matches(|c: char| !c.is_alphabetic());
    let surname_like = name.chars().count() > 1
        && name.starts_with(|c: char| c.is_uppercase())
        && name.chars().all(char::is_alphabetic)
        && !SENTENCE_OPENERS.contains(&name.to_lowercase().as_str());
    if !surname_like {
        return false;
    }

    let mut before = text[start..run_start].split_whitespace().rev().skip(1);
    match before.next() {
        None => true,
        Some(prev) => prev
            .trim_start_matches(OPENERS)
            .starts_with(|c: char| c.is_uppercase()),
    }
}

fn push_trimmed(out: &mut Vec<Range<usize>>, text: &str, start: usize, end: usize) {
    let slice = &text[start..end];
    let lead = slice.len() - slice.trim_start().len();
    let trail = slice.len() - slice.trim_end().len();
    if lead + trail < slice.len() {
        out.push(start + lead..end - trail);
    }
}

/// Chapter text with sentence positions fixed for one proofreading pass.
///
/// Indices are 1-based and refer to the text as it was when the pass began.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexedChapter {
    text: String,
    spans: Vec<Range<usize>>,
    mode: Segmentation,
}

impl IndexedChapter {
    /// Segment `text` once.
    pub fn new(text: impl Into<String>, mode: Segmentation) -> Self {
        let text = text.into();
        let spans = spans(&text, mode);
        Self { text, spans, mode }
    }

    /// The text that was segmented.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Segmentation used.
    pub fn mode(&self) -> Segmentation {
        self.mode
    }

    /// Number of sentences.
    pub fn len(&self) -> usize {
        self.spans.len()
    }

    /// Whether the chapter has no sentences.
    pub fn is_empty(&self) -> bool {
        self.spans.is_empty()
    }

    /// Sentence at a 1-based index.
    pub fn sentence(&self, index: usize) -> Option<&str> {
        index
            .checked_sub(1)
            .and_then(|i| self.spans.get(i))
            .map(|span| &self.text[span.clone()])
    }

    /// Byte range of the sentence at a 1-based index.
    pub fn span(&self, index: usize) -> Option<Range<usize>> {
        index.checked_sub(1).and_then(|i| self.spans.get(i)).cloned()
    }

    /// Sentences in order.
    pub fn sentences(&self) -> impl Iterator<Item = &str> {
        self.spans.iter().map(|span| &self.text[span.clone()])
    }

    /// One sentence per line, each prefixed with `[n] `.
    pub fn render(&self) -> String {
        self.sentences()
            .enumerate()
            .map(|(i, sentence)| format!("[{}] {}", i + 1, sentence))
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Whether `index` names a sentence of this chapter.
    pub fn contains_index(&self, index: usize) -> bool {
        (1..=self.len()).contains(&index)
    }
}
