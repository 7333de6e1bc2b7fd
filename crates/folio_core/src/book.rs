//! Book, chapter and fragment types.

use serde::{Deserialize, Serialize};

/// Count whitespace-separated words.
///
/// # Examples
///
/// ```
/// use folio_core::count_words;
///
/// assert_eq!(count_words("The cave  was\ndark."), 4);
/// assert_eq!(count_words(""), 0);
/// ```
pub fn count_words(text: &str) -> usize {
    text.split_whitespace().count()
}

/// One generation call's normalized output.
///
/// # Examples
///
/// ```
/// use folio_core::Fragment;
///
/// let fragment = Fragment::new("The cave was dark.", "A dark cave.");
/// assert_eq!(fragment.text(), "The cave was dark.");
/// assert!(!fragment.echoed());
/// ```
#[derive(
    Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, derive_getters::Getters,
)]
pub struct Fragment {
    /// Narrative text after the rule chain ran
    text: String,
    /// Text following the summary delimiter, empty when absent
    summary: String,
    /// Set when the provider kept echoing the prompt and the fragment was left empty
    #[getter(copy)]
    echoed: bool,
}

impl Fragment {
    /// Create a fragment from parsed content and summary.
    pub fn new(text: impl Into<String>, summary: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            summary: summary.into(),
            echoed: false,
        }
    }

    /// Empty fragment recorded after repeated echoes.
    pub fn echoed_placeholder() -> Self {
        Self {
            echoed: true,
            ..Self::default()
        }
    }

    /// Replace the fragment text, keeping the summary and flag.
    pub fn set_text(&mut self, text: impl Into<String>) {
        self.text = text.into();
    }
}

/// An ordered run of fragments.
#[derive(
    Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, derive_getters::Getters,
)]
pub struct Chapter {
    /// 1-based chapter number
    #[getter(copy)]
    number: usize,
    /// Fragments in generation order
    fragments: Vec<Fragment>,
}

impl Chapter {
    /// Create an empty chapter.
    pub fn new(number: usize) -> Self {
        Self {
            number,
            fragments: Vec::new(),
        }
    }

    /// Build a chapter holding one fragment of already-finished text.
    ///
    /// Used when proofreading text that was not generated in this run.
    pub fn from_text(number: usize, text: impl Into<String>) -> Self {
        Self {
            number,
            fragments: vec![Fragment::new(text, "")],
        }
    }

    /// Append a fragment.
    pub fn push(&mut self, fragment: Fragment) {
        self.fragments.push(fragment);
    }

    /// Chapter text with fragments separated by blank lines.
    ///
    /// Empty fragments are skipped so echoed placeholders leave no gap.
    pub fn text(&self) -> String {
        self.fragments
            .iter()
            .map(|f| f.text().as_str())
            .filter(|t| !t.is_empty())
            .collect::<Vec<_>>()
            .join("\n\n")
    }

    /// Replace the chapter contents with revised text.
    pub fn replace_text(&mut self, text: impl Into<String>) {
        self.fragments = vec![Fragment::new(text, "")];
    }

    /// Total words across fragments.
    pub fn word_count(&self) -> usize {
        self.fragments.iter().map(|f| count_words(f.text())).sum()
    }

    /// Number of fragments flagged as echoed.
    pub fn echoed_count(&self) -> usize {
        self.fragments.iter().filter(|f| f.echoed()).count()
    }
}

/// A book: reference material plus generated chapters.
///
/// Outline and instructions are fixed once the book is built.
///
/// # Examples
///
/// ```
/// use folio_core::BookBuilder;
///
/// let book = BookBuilder::default()
///     .outline("A miner finds a cave.")
///     .genre("mystery")
///     .build()
///     .unwrap();
/// assert!(book.instructions().is_empty());
/// assert!(book.chapters().is_empty());
/// ```
#[derive(
    Debug,
    Clone,
    Default,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    derive_getters::Getters,
    derive_builder::Builder,
)]
#[builder(setter(into))]
pub struct Book {
    /// Outline text
    outline: String,
    /// Writing instructions, possibly empty
    #[builder(default)]
    instructions: String,
    /// Genre label used in prompts
    #[builder(default)]
    genre: String,
    /// Chapters generated so far
    #[builder(default)]
    chapters: Vec<Chapter>,
}

impl Book {
    /// Reference material handed to providers at session start.
    pub fn reference_material(&self) -> String {
        if self.instructions.trim().is_empty() {
            format!("Outline:\n{}", self.outline.trim())
        } else {
            format!(
                "Outline:\n{}\n\nInstructions:\n{}",
                self.outline.trim(),
                self.instructions.trim()
            )
        }
    }

    /// Append a finished chapter.
    pub fn push_chapter(&mut self, chapter: Chapter) {
        self.chapters.push(chapter);
    }

    /// Mutable access to chapters, for revision.
    pub fn chapters_mut(&mut self) -> &mut Vec<Chapter> {
        &mut self.chapters
    }

    /// Render the book as Markdown, chapters separated by blank lines.
    pub fn to_markdown(&self) -> String {
        let mut out = self
            .chapters
            .iter()
            .map(Chapter::text)
            .collect::<Vec<_>>()
            .join("\n\n");
        out.push('\n');
        out
    }
}
