//! Applying keep, change and delete decisions to merged findings.

use crate::{IndexedChapter, ProofreadConfig, normalize};
use folio_core::{
    ChangeSpec, DecisionRequest, DecisionScope, Match, MatchGroup, RevisionDecision,
    RevisionOperation, RewriteProposal, RewriteVerdict,
};
use folio_error::{
    FolioResult, GenerationError, GenerationErrorKind, RevisionError, RevisionErrorKind,
};
use folio_interface::{DecisionSource, ProviderAdapter};
use std::ops::Range;
use tracing::{debug, info, instrument, warn};

/// One pending text change at a sentence index.
#[derive(Debug, Clone)]
struct Edit {
    index: usize,
    sentence: String,
    /// `None` deletes the sentence
    replacement: Option<String>,
}

/// Result of a revision pass over one chapter.
#[derive(Debug, Clone, derive_getters::Getters)]
pub struct RevisionOutcome {
    /// Revised text, re-segmented for any later pass
    chapter: IndexedChapter,
    /// Edits that changed the text
    #[getter(copy)]
    applied: usize,
    /// Matches left as they were
    #[getter(copy)]
    kept: usize,
    /// Edits whose sentence was no longer in the text
    #[getter(copy)]
    skipped: usize,
}

impl RevisionOutcome {
    /// Revised chapter text.
    pub fn text(&self) -> &str {
        self.chapter.text()
    }
}

/// Drives decisions over a merged match set and edits the chapter.
///
/// The first question covers the whole pass. A global answer settles every
/// match; otherwise each group is asked in turn, and a single-match answer
/// for a group asks about each of its matches. An answer at a narrower level
/// may widen again: a group-scoped answer to a match question covers the rest
/// of that group, a global one everything still undecided.
///
/// Edits are applied in ascending sentence order against the text as it was
/// indexed. A decision whose sentence can no longer be found is skipped with
/// a warning.
pub struct RevisionEngine<'a> {
    config: &'a ProofreadConfig,
    rewriter: Option<&'a dyn ProviderAdapter>,
}

impl<'a> RevisionEngine<'a> {
    /// Create an engine without a rewrite provider.
    pub fn new(config: &'a ProofreadConfig) -> Self {
        Self {
            config,
            rewriter: None,
        }
    }

    /// Use `provider` for rewrite decisions.
    pub fn with_rewriter(mut self, provider: &'a dyn ProviderAdapter) -> Self {
        self.rewriter = Some(provider);
        self
    }

    /// Decide and apply revisions for `groups` found in `chapter`.
    ///
    /// # Errors
    ///
    /// Propagates decision source failures, gives up after too many invalid
    /// answers to one question, and fails when a rewrite is requested without
    /// a rewrite provider or the provider call cannot be recovered.
    #[instrument(skip_all, fields(groups = groups.len(), sentences = chapter.len()))]
    pub async fn revise(
        &self,
        chapter: &IndexedChapter,
        groups: &[MatchGroup],
        source: &mut dyn DecisionSource,
    ) -> FolioResult<RevisionOutcome> {
        let plan = self.collect(groups, source).await?;

        let mut edits = Vec::new();
        let mut kept = 0;
        for (found, operation) in plan {
            let replacement = match operation {
                RevisionOperation::Keep => None,
                RevisionOperation::Delete => Some(None),
                RevisionOperation::Change(ChangeSpec::Literal { text }) => Some(Some(text)),
                RevisionOperation::Change(ChangeSpec::Rewrite { instruction }) => self
                    .rewrite(found, &instruction, chapter, source)
                    .await?
                    .map(Some),
            };
            match replacement {
                Some(replacement) => edits.push(Edit {
                    index: found.sentence_index(),
                    sentence: found.sentence().clone(),
                    replacement,
                }),
                None => kept += 1,
            }
        }

        let (text, applied, skipped) = apply_edits(chapter, edits);
        info!(applied, kept, skipped, "Revision complete");
        Ok(RevisionOutcome {
            chapter: IndexedChapter::new(text, chapter.mode()),
            applied,
            kept,
            skipped,
        })
    }

    async fn collect<'g>(
        &self,
        groups: &'g [MatchGroup],
        source: &mut dyn DecisionSource,
    ) -> FolioResult<Vec<(&'g Match, RevisionOperation)>> {
        let mut plan = Vec::new();
        if groups.is_empty() {
            return Ok(plan);
        }

        let (operation, scope) = self
            .ask(source, &DecisionRequest::Run { groups })
            .await?
            .into_parts();
        if scope == DecisionScope::Global {
            debug!(%operation, "Global decision");
            plan.extend(groups.iter().flat_map(|g| g.matches()).map(|m| (m, operation.clone())));
            return Ok(plan);
        }

        let mut global: Option<RevisionOperation> = None;
        for group in groups {
            if let Some(operation) = &global {
                plan.extend(group.matches().iter().map(|m| (m, operation.clone())));
                continue;
            }

            let (operation, scope) = self
                .ask(source, &DecisionRequest::Group { group })
                .await?
                .into_parts();
            match scope {
                DecisionScope::Global | DecisionScope::Group => {
                    debug!(pattern = %group.pattern(), %operation, %scope, "Group decision");
                    plan.extend(group.matches().iter().map(|m| (m, operation.clone())));
                    if scope == DecisionScope::Global {
                        global = Some(operation);
                    }
                }
                DecisionScope::SingleMatch => {
                    let mut rest: Option<RevisionOperation> = None;
                    for (i, found) in group.matches().iter().enumerate() {
                        if let Some(operation) = global.as_ref().or(rest.as_ref()) {
                            plan.push((found, operation.clone()));
                            continue;
                        }
                        let request = DecisionRequest::Match {
                            found,
                            position: i + 1,
                            of: group.len(),
                        };
                        let (operation, scope) = self.ask(source, &request).await?.into_parts();
                        match scope {
                            DecisionScope::Global => global = Some(operation.clone()),
                            DecisionScope::Group => rest = Some(operation.clone()),
                            DecisionScope::SingleMatch => {}
                        }
                        plan.push((found, operation));
                    }
                }
            }
        }
        Ok(plan)
    }

    /// Ask until the source gives a valid answer.
    async fn ask(
        &self,
        source: &mut dyn DecisionSource,
        request: &DecisionRequest<'_>,
    ) -> FolioResult<RevisionDecision> {
        let mut invalid = 0;
        loop {
            match source.next_decision(request).await {
                Err(e) if e.as_revision().is_some_and(RevisionError::is_invalid_decision) => {
                    invalid += 1;
                    warn!(invalid, error = %e, "Invalid decision, asking again");
                    self.check_invalid(invalid)?;
                }
                other => return other,
            }
        }
    }

    async fn review(
        &self,
        source: &mut dyn DecisionSource,
        proposal: &RewriteProposal,
    ) -> FolioResult<RewriteVerdict> {
        let mut invalid = 0;
        loop {
            match source.review_rewrite(proposal).await {
                Err(e) if e.as_revision().is_some_and(RevisionError::is_invalid_decision) => {
                    invalid += 1;
                    warn!(invalid, error = %e, "Invalid verdict, asking again");
                    self.check_invalid(invalid)?;
                }
                other => return other,
            }
        }
    }

    fn check_invalid(&self, invalid: u32) -> FolioResult<()> {
        if invalid >= self.config.max_invalid_decisions() {
            Err(RevisionError::new(RevisionErrorKind::TooManyInvalidDecisions(invalid)).into())
        } else {
            Ok(())
        }
    }

    /// Proposal loop: `Proposed -> Accepted | Regenerate -> Proposed | KeptOriginal`,
    /// bounded by the configured attempt count. `None` keeps the original.
    async fn rewrite(
        &self,
        found: &Match,
        instruction: &str,
        chapter: &IndexedChapter,
        source: &mut dyn DecisionSource,
    ) -> FolioResult<Option<String>> {
        let provider = self.rewriter.ok_or_else(|| {
            GenerationError::new(GenerationErrorKind::InvalidConfiguration(
                "a rewrite was requested but no rewrite provider is configured".to_string(),
            ))
        })?;
        let index = found.sentence_index();
        let base = self.rewrite_prompt(found, instruction, chapter);
        let mut rejected: Option<String> = None;

        for attempt in 1..=self.config.max_rewrite_attempts() {
            let prompt = match &rejected {
                Some(previous) => format!(
                    "{}\n\nDo not repeat this rejected version: {}",
                    base, previous
                ),
                None => base.clone(),
            };
            let proposed = provider
                .generate(&prompt, attempt as usize)
                .await
                .map_err(|e| {
                    GenerationError::fatal(
                        format!("rewrite sentence {}", index),
                        provider.provider_name(),
                        e.to_string(),
                    )
                })?
                .trim()
                .to_string();

            let proposal =
                RewriteProposal::new(found.pattern(), found.sentence(), &proposed, attempt);
            match self.review(source, &proposal).await? {
                RewriteVerdict::Accept => {
                    debug!(index, attempt, "Rewrite accepted");
                    return Ok(Some(proposed));
                }
                RewriteVerdict::KeepOriginal => {
                    debug!(index, attempt, "Rewrite abandoned");
                    return Ok(None);
                }
                RewriteVerdict::Regenerate => rejected = Some(proposed),
            }
        }

        warn!(
            index,
            attempts = self.config.max_rewrite_attempts(),
            "No rewrite accepted, keeping original"
        );
        Ok(None)
    }

    fn rewrite_prompt(&self, found: &Match, instruction: &str, chapter: &IndexedChapter) -> String {
        let index = found.sentence_index();
        let description = self
            .config
            .pattern(found.pattern())
            .map(|p| p.description().as_str())
            .unwrap_or_default();
        let sentence = chapter.sentence(index).unwrap_or(found.sentence());

        let mut prompt = format!(
            "Rewrite the sentence below so it no longer shows the pattern \"{}\"",
            found.pattern()
        );
        if !description.is_empty() {
            prompt.push_str(&format!(" ({})", description));
        }
        prompt.push_str(
            ". Keep its meaning and make it fit the surrounding text. \
             Reply with the rewritten sentence only.",
        );
        if !instruction.trim().is_empty() {
            prompt.push_str(&format!("\n\nGuidance: {}", instruction.trim()));
        }
        if let Some(before) = index.checked_sub(1).and_then(|i| chapter.sentence(i)) {
            prompt.push_str(&format!("\n\nPreceding sentence: {}", before));
        }
        prompt.push_str(&format!("\n\nSentence: {}", sentence));
        if let Some(after) = chapter.sentence(index + 1) {
            prompt.push_str(&format!("\n\nFollowing sentence: {}", after));
        }
        prompt
    }
}

/// Apply edits in ascending index order, returning `(text, applied, skipped)`.
fn apply_edits(chapter: &IndexedChapter, mut edits: Vec<Edit>) -> (String, usize, usize) {
    edits.sort_by_key(|e| e.index);
    let text = chapter.text();
    let mut out = String::with_capacity(text.len());
    let mut cursor = 0;
    let (mut applied, mut skipped) = (0, 0);

    for edit in edits {
        let Some(range) = locate(chapter, &edit, cursor) else {
            warn!(
                index = edit.index,
                "Sentence no longer present in the text, leaving it"
            );
            skipped += 1;
            continue;
        };

        out.push_str(&text[cursor..range.start]);
        match &edit.replacement {
            Some(replacement) => {
                out.push_str(replacement);
                cursor = range.end;
            }
            None => {
                // Take one side's horizontal space with the sentence, or
                // one line break when it stood on a line of its own
                let rest = &text[range.end..];
                let trailing = rest.len() - rest.trim_start_matches([' ', '\t']).len();
                let leading = out.len() - out.trim_end_matches([' ', '\t']).len();
                cursor = range.end;
                if trailing > 0 {
                    cursor += trailing;
                } else if leading > 0 {
                    out.truncate(out.len() - leading);
                } else if rest.starts_with('\n') {
                    cursor += 1;
                } else if rest.is_empty() && out.ends_with('\n') {
                    out.pop();
                }
            }
        }
        applied += 1;
    }
    out.push_str(&text[cursor..]);
    (out, applied, skipped)
}

/// Where an edit's sentence sits, at or after `cursor`.
fn locate(chapter: &IndexedChapter, edit: &Edit, cursor: usize) -> Option<Range<usize>> {
    let span = chapter.span(edit.index)?;
    if span.start < cursor {
        // An earlier edit already consumed this sentence
        return None;
    }
    if normalize(&chapter.text()[span.clone()]) == normalize(&edit.sentence) {
        return Some(span);
    }
    let needle = edit.sentence.trim();
    if needle.is_empty() {
        return None;
    }
    chapter.text()[cursor..]
        .find(needle)
        .map(|at| cursor + at..cursor + at + needle.len())
}
