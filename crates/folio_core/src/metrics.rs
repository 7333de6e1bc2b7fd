//! Run-wide tallies.

use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

/// Word and fragment counts for one finished chapter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, derive_getters::Getters)]
pub struct ChapterMetrics {
    /// 1-based chapter number
    #[getter(copy)]
    chapter: usize,
    /// Words in the chapter text
    #[getter(copy)]
    words: usize,
    /// Fragments generated
    #[getter(copy)]
    fragments: usize,
    /// Fragments left empty after repeated echoes
    #[getter(copy)]
    echoed: usize,
}

/// Append-only tallies across a run.
///
/// # Examples
///
/// ```
/// use folio_core::RunMetrics;
///
/// let mut metrics = RunMetrics::new();
/// metrics.record_chapter(1, 1200, 3, 0);
/// metrics.record_tokens(50, 400);
/// assert_eq!(metrics.total_words(), 1200);
/// assert_eq!(*metrics.completion_tokens(), 400);
/// ```
#[derive(Debug, Clone, derive_getters::Getters)]
pub struct RunMetrics {
    /// Per-chapter counts in completion order
    chapters: Vec<ChapterMetrics>,
    /// Prompt tokens sent
    prompt_tokens: u64,
    /// Completion tokens received
    completion_tokens: u64,
    /// Provider calls issued
    calls: u64,
    /// Run start
    started: Instant,
}

impl Default for RunMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl RunMetrics {
    /// Start tallying now.
    pub fn new() -> Self {
        Self {
            chapters: Vec::new(),
            prompt_tokens: 0,
            completion_tokens: 0,
            calls: 0,
            started: Instant::now(),
        }
    }

    /// Record a sealed chapter.
    pub fn record_chapter(
        &mut self,
        chapter: usize,
        words: usize,
        fragments: usize,
        echoed: usize,
    ) {
        self.chapters.push(ChapterMetrics {
            chapter,
            words,
            fragments,
            echoed,
        });
    }

    /// Record one provider call's token usage.
    pub fn record_tokens(&mut self, prompt: u64, completion: u64) {
        self.prompt_tokens += prompt;
        self.completion_tokens += completion;
        self.calls += 1;
    }

    /// Words across all recorded chapters.
    pub fn total_words(&self) -> usize {
        self.chapters.iter().map(|c| c.words).sum()
    }

    /// Time since the run started.
    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    /// Snapshot for reporting.
    pub fn summary(&self) -> RunSummary {
        RunSummary {
            chapters: self.chapters.clone(),
            total_words: self.total_words(),
            prompt_tokens: self.prompt_tokens,
            completion_tokens: self.completion_tokens,
            calls: self.calls,
            elapsed_secs: self.elapsed().as_secs_f64(),
        }
    }
}

/// Serializable end-of-run report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, derive_getters::Getters)]
pub struct RunSummary {
    /// Per-chapter counts
    chapters: Vec<ChapterMetrics>,
    /// Sum of chapter words
    #[getter(copy)]
    total_words: usize,
    /// Prompt tokens sent
    #[getter(copy)]
    prompt_tokens: u64,
    /// Completion tokens received
    #[getter(copy)]
    completion_tokens: u64,
    /// Provider calls issued
    #[getter(copy)]
    calls: u64,
    /// Wall-clock seconds
    #[getter(copy)]
    elapsed_secs: f64,
}

impl std::fmt::Display for RunSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for chapter in &self.chapters {
            write!(f, "Chapter {}: {} words", chapter.chapter, chapter.words)?;
            if chapter.echoed > 0 {
                write!(f, " ({} echoed fragments)", chapter.echoed)?;
            }
            writeln!(f)?;
        }
        writeln!(f, "Total words: {}", self.total_words)?;
        writeln!(
            f,
            "Tokens: {} prompt, {} completion over {} calls",
            self.prompt_tokens, self.completion_tokens, self.calls
        )?;
        write!(f, "Elapsed: {:.1}s", self.elapsed_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summary_totals() {
        let mut metrics = RunMetrics::new();
        metrics.record_chapter(1, 100, 3, 0);
        metrics.record_chapter(2, 50, 3, 1);
        metrics.record_tokens(10, 20);
        metrics.record_tokens(5, 5);

        let summary = metrics.summary();
        assert_eq!(summary.total_words(), 150);
        assert_eq!(summary.prompt_tokens(), 15);
        assert_eq!(summary.completion_tokens(), 25);
        assert_eq!(summary.calls(), 2);

        let text = summary.to_string();
        assert!(text.contains("Chapter 2: 50 words (1 echoed fragments)"));
        assert!(text.contains("Total words: 150"));
    }
}
